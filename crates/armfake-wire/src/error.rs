//! Error bodies and wire decoding errors.

use serde::{Deserialize, Serialize};

/// Error detail as carried in ARM error bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. `NotFound`).
    pub code: String,
    /// Human-readable, single-line message.
    pub message: String,
}

impl ErrorDetail {
    /// Create a new error detail.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Top-level error body: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

impl From<ErrorDetail> for ErrorBody {
    fn from(error: ErrorDetail) -> Self {
        Self { error }
    }
}

/// Errors raised while decoding wire values.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("skip token is not valid base64: {0}")]
    SkipTokenEncoding(String),

    #[error("skip token does not hold a cursor: {0}")]
    SkipTokenCursor(String),

    #[error("malformed request: {0}")]
    MalformedRequest(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody::from(ErrorDetail::new("NotFound", "VM not existed"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"]["code"], "NotFound");
        assert_eq!(json["error"]["message"], "VM not existed");
    }
}
