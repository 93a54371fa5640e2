//! Overlay configuration

use crate::error::{Result, TempoError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Display thresholds and overlay options, fixed once the engine is built
///
/// Every field is optional in TOML:
/// ```toml
/// logs_per_second = 20
/// samples_log = 100
/// samples_graph = 10
/// precision = 2
/// minimal = false
/// horizontal = true
/// mode = 0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// How often the CPU/GPU panels refresh, per second
    pub logs_per_second: f64,
    /// Length of the averaging window
    pub samples_log: usize,
    /// Length of the graph window
    pub samples_graph: usize,
    /// Decimal places for the CPU/GPU readouts
    pub precision: u32,
    /// Compact mode: one panel at a time, cycled by clicking
    pub minimal: bool,
    /// Lay panels out left-to-right instead of top-to-bottom
    pub horizontal: bool,
    /// Index of the initially visible panel in minimal mode
    pub mode: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            logs_per_second: 20.0,
            samples_log: 100,
            samples_graph: 10,
            precision: 2,
            minimal: false,
            horizontal: true,
            mode: 0,
        }
    }
}

impl StatsConfig {
    /// Minimum interval between CPU/GPU panel pushes
    pub fn display_interval_ms(&self) -> f64 {
        1000.0 / self.logs_per_second
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.logs_per_second.is_finite() && self.logs_per_second > 0.0) {
            return Err(invalid("logs_per_second", "must be a positive number"));
        }
        if self.samples_log == 0 {
            return Err(invalid("samples_log", "must be at least 1"));
        }
        if self.samples_graph == 0 {
            return Err(invalid("samples_graph", "must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StatsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}

fn invalid(field: &str, reason: &str) -> TempoError {
    TempoError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
