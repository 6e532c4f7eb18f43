//! Ingestion error types.

use std::time::Duration;

use thiserror::Error;

use telemagg_core::{ErrorKind, ParseError};

/// Result type alias for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Everything that can go wrong in one ingestion attempt.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("connect to {address} failed: {reason}")]
    Connect { address: String, reason: String },

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream payload is not valid UTF-8")]
    Encoding,

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Connect { .. }
            | IngestError::Timeout(_)
            | IngestError::Status { .. }
            | IngestError::Transport(_) => ErrorKind::Network,
            IngestError::Encoding => ErrorKind::Schema,
            IngestError::Parse(e) => e.kind(),
        }
    }
}

impl From<hyper::Error> for IngestError {
    fn from(e: hyper::Error) -> Self {
        IngestError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_class_errors() {
        assert_eq!(IngestError::Timeout(Duration::from_secs(8)).kind(), ErrorKind::Network);
        assert_eq!(IngestError::Status { status: 500 }.kind(), ErrorKind::Network);
        assert_eq!(IngestError::Status { status: 404 }.kind(), ErrorKind::Network);
        assert_eq!(
            IngestError::Connect {
                address: "127.0.0.1:1".into(),
                reason: "refused".into()
            }
            .kind(),
            ErrorKind::Network
        );
    }

    #[test]
    fn payload_errors_keep_parser_kind() {
        let schema = IngestError::from(ParseError::Schema {
            expected: vec!["entity_id".into()],
        });
        assert_eq!(schema.kind(), ErrorKind::Schema);

        let shape = IngestError::from(ParseError::RowShape {
            row: 2,
            expected: 3,
            found: 2,
        });
        assert_eq!(shape.kind(), ErrorKind::RowShape);
        assert_eq!(shape.to_string(), "row 2 has 2 fields, header has 3");
    }
}
