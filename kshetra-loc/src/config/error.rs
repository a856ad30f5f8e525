//! Configuration loading errors.

use thiserror::Error;

/// Config load error.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML was malformed or had the wrong shape.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A parameter is out of range; names the field.
    #[error("Invalid value for {0}")]
    Validation(String),
}
