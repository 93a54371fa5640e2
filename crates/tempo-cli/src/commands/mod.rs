//! CLI command implementations

pub mod config;
pub mod run;

use anyhow::{Context, Result};
use std::path::Path;
use tempo_core::StatsConfig;

/// Load the overlay configuration, or the defaults when no path is given
pub fn load_config(path: Option<&str>) -> Result<StatsConfig> {
    match path {
        Some(path) => StatsConfig::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path)),
        None => Ok(StatsConfig::default()),
    }
}
