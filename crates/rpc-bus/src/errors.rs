//! Errors returned by the session API and raised by handlers.

use crate::lifecycle::LifecycleError;
use crate::transport::TransportError;
use rpc_types::{EncodeError, ResultCode};
use std::time::Duration;
use thiserror::Error;

/// Failure of a session operation or of an outstanding request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The envelope could not be serialized; nothing was sent.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The peer answered with `success = false`.
    #[error("request rejected ({}): {}", display_code(.result_code), .info.as_deref().unwrap_or("no info"))]
    Rejected {
        result_code: Option<ResultCode>,
        info: Option<String>,
    },

    /// The session stopped before the response arrived.
    #[error("request cancelled")]
    Cancelled,

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

fn display_code(code: &Option<ResultCode>) -> &'static str {
    code.map_or("unknown result", |c| c.as_str())
}

/// A notification handler failed.
///
/// Caught by the dispatch loop and logged; the remaining handlers still run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = SessionError::Rejected {
            result_code: Some(ResultCode::Disallowed),
            info: Some("not in FULL".to_string()),
        };
        assert_eq!(err.to_string(), "request rejected (DISALLOWED): not in FULL");

        let err = SessionError::Rejected {
            result_code: None,
            info: None,
        };
        assert_eq!(err.to_string(), "request rejected (unknown result): no info");
    }
}
