pub mod classify;
pub mod sweep;
pub mod sync;

use std::path::Path;

use anyhow::{Context, Result};

use stagehand_core::{
    config::{self, Config},
    Layout,
};

/// Load the config file (explicit path or `~/.stagehand/config.yaml`),
/// apply `STAGEHAND_*` overrides, and resolve the layout.
pub fn load_config(path: Option<&Path>) -> Result<(Config, Layout)> {
    let mut config = match path {
        Some(path) => config::load_from(path),
        None => config::load(),
    }
    .context("failed to load configuration")?;
    config.apply_env();
    let layout = config.layout().context("invalid configuration")?;
    tracing::debug!(
        html_posts_root = %layout.html_posts_root.display(),
        destination_root = %layout.destination_root.display(),
        "configuration loaded"
    );
    Ok((config, layout))
}
