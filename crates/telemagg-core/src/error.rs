//! Error types for parsing and configuration.

use thiserror::Error;

use crate::types::ErrorKind;

/// Result type alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Structural validation failures of an upstream payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("header is missing identifier column (expected one of: {})", .expected.join(", "))]
    Schema { expected: Vec<String> },

    #[error("row {row} has {found} fields, header has {expected}")]
    RowShape {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row} is not valid delimited text: {reason}")]
    Malformed { row: usize, reason: String },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Schema { .. } => ErrorKind::Schema,
            ParseError::RowShape { .. } | ParseError::Malformed { .. } => ErrorKind::RowShape,
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
