//! Error types for Tempo

use thiserror::Error;

/// The main error type for Tempo operations
#[derive(Debug, Error)]
pub enum TempoError {
    #[error("No context target was provided")]
    MissingTarget,

    #[error("Unable to obtain a timer-query context: {0}")]
    ContextUnavailable(String),

    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

/// Result type alias for Tempo operations
pub type Result<T> = std::result::Result<T, TempoError>;

impl From<toml::de::Error> for TempoError {
    fn from(err: toml::de::Error) -> Self {
        TempoError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for TempoError {
    fn from(err: toml::ser::Error) -> Self {
        TempoError::TomlSerError(err.to_string())
    }
}
