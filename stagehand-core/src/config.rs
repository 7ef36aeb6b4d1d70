//! YAML configuration for a stagehand run.
//!
//! # Storage layout
//!
//! ```text
//! ~/.stagehand/
//!   config.yaml
//! ```
//!
//! # API pattern
//!
//! Like the rest of the crate, every lookup has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Environment variables override file values after loading; see
//! [`Config::apply_env`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_REPO_ROOT: &str = "STAGEHAND_REPO_ROOT";
pub const ENV_HTML_POSTS_ROOT: &str = "STAGEHAND_HTML_POSTS_ROOT";
pub const ENV_DESTINATION_ROOT: &str = "STAGEHAND_DESTINATION_ROOT";
pub const ENV_NOTIFY_RECIPIENT: &str = "STAGEHAND_NOTIFY_RECIPIENT";

/// Directory depth the site generator writes XML at, plus slack.
pub const DEFAULT_SWEEP_DEPTH: usize = 5;

fn default_posts_prefix() -> PathBuf {
    PathBuf::from("_posts")
}

fn default_sweep_depth() -> usize {
    DEFAULT_SWEEP_DEPTH
}

/// Generated-image mirroring, both ends relative to `repo_root` unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Who the external notifier should alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub recipient: String,
}

/// On-disk configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Local working copy of the site repository.
    #[serde(default)]
    pub repo_root: PathBuf,
    /// Where the site build writes per-post HTML/XML (`_site/blog-posts`).
    #[serde(default)]
    pub html_posts_root: PathBuf,
    /// CMS staging tree that receives `<date>/<date>-<slug>.xml`.
    #[serde(default)]
    pub destination_root: PathBuf,
    /// Repository-relative directory holding source posts.
    #[serde(default = "default_posts_prefix")]
    pub posts_prefix: PathBuf,
    #[serde(default = "default_sweep_depth")]
    pub sweep_depth: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<ImageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<NotifyConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::new(),
            html_posts_root: PathBuf::new(),
            destination_root: PathBuf::new(),
            posts_prefix: default_posts_prefix(),
            sweep_depth: DEFAULT_SWEEP_DEPTH,
            images: None,
            notify: None,
        }
    }
}

/// Resolved, absolute-where-possible roots for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub repo_root: PathBuf,
    pub html_posts_root: PathBuf,
    pub destination_root: PathBuf,
    pub posts_prefix: PathBuf,
    pub sweep_depth: usize,
    pub images: Option<ImageConfig>,
}

impl Config {
    /// Override file values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Override file values from `lookup`; empty values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_REPO_ROOT) {
            self.repo_root = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_HTML_POSTS_ROOT) {
            self.html_posts_root = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_DESTINATION_ROOT) {
            self.destination_root = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_NOTIFY_RECIPIENT) {
            self.notify = Some(NotifyConfig { recipient: v });
        }
    }

    pub fn recipient(&self) -> Option<&str> {
        self.notify.as_ref().map(|n| n.recipient.as_str())
    }

    /// Resolve relative roots against `repo_root`.
    ///
    /// Fails with [`ConfigError::Invalid`] when either required root is empty.
    pub fn layout(&self) -> Result<Layout, ConfigError> {
        if self.html_posts_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("html_posts_root is not set".into()));
        }
        if self.destination_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("destination_root is not set".into()));
        }
        if self.sweep_depth == 0 {
            return Err(ConfigError::Invalid("sweep_depth must be at least 1".into()));
        }

        let images = self.images.as_ref().map(|img| ImageConfig {
            source: self.resolve(&img.source),
            destination: self.resolve(&img.destination),
        });

        Ok(Layout {
            repo_root: self.repo_root.clone(),
            html_posts_root: self.resolve(&self.html_posts_root),
            destination_root: self.resolve(&self.destination_root),
            posts_prefix: self.posts_prefix.clone(),
            sweep_depth: self.sweep_depth,
            images,
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || self.repo_root.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            self.repo_root.join(path)
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// `<home>/.stagehand/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".stagehand").join("config.yaml")
}

/// Load a config document from an explicit path.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load `<home>/.stagehand/config.yaml`.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
