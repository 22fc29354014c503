//! Fake Backend Error Registry
//!
//! Structured errors raised by the simulators and the dispatch table.

use serde::{Deserialize, Serialize};

use super::poller::PollerState;
use super::server::HandlerKind;

/// Structured failure returned by a simulated backend.
///
/// Carries exactly the HTTP status and error code set by the test author so
/// callers can branch on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[error("{error_code} (HTTP {http_status})")]
pub struct ResponseError {
    pub http_status: u16,
    pub error_code: String,
}

impl ResponseError {
    /// Create a new response error.
    pub fn new(http_status: u16, error_code: impl Into<String>) -> Self {
        Self {
            http_status,
            error_code: error_code.into(),
        }
    }
}

/// Errors raised by the fake backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FakeError {
    #[error("response queue is empty")]
    EmptyQueue,

    #[error("poller already reached terminal state {0}")]
    AlreadyTerminal(PollerState),

    #[error("a terminal response is already set; nothing may follow it")]
    TerminalAlreadySet,

    #[error("poller has not reached a terminal state")]
    NotDone,

    #[error("polling budget of {max_polls} polls exhausted")]
    Timeout { max_polls: u32 },

    #[error("cancelled after consuming {polls} responses")]
    Cancelled { polls: u32 },

    #[error("operation failed: {0}")]
    OperationFailed(ResponseError),

    #[error("transient page error: {0}")]
    TransientPageError(ResponseError),

    #[error("pager has no more pages")]
    PagesExhausted,

    #[error("no handler registered for operation '{0}'")]
    UnknownOperation(String),

    #[error("operation '{operation}' is a {actual} handler, expected {expected}")]
    KindMismatch {
        operation: String,
        expected: HandlerKind,
        actual: HandlerKind,
    },
}

impl FakeError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            FakeError::EmptyQueue => "EMPTY_QUEUE",
            FakeError::AlreadyTerminal(_) => "ALREADY_TERMINAL",
            FakeError::TerminalAlreadySet => "TERMINAL_ALREADY_SET",
            FakeError::NotDone => "NOT_DONE",
            FakeError::Timeout { .. } => "TIMEOUT",
            FakeError::Cancelled { .. } => "CANCELLED",
            FakeError::OperationFailed(_) => "OPERATION_FAILED",
            FakeError::TransientPageError(_) => "TRANSIENT_PAGE_ERROR",
            FakeError::PagesExhausted => "PAGES_EXHAUSTED",
            FakeError::UnknownOperation(_) => "UNKNOWN_OPERATION",
            FakeError::KindMismatch { .. } => "KIND_MISMATCH",
        }
    }

    /// Returns true for misuse of the harness itself (a bug in the test,
    /// not a simulated backend outcome).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FakeError::EmptyQueue
                | FakeError::AlreadyTerminal(_)
                | FakeError::TerminalAlreadySet
                | FakeError::NotDone
                | FakeError::PagesExhausted
                | FakeError::UnknownOperation(_)
                | FakeError::KindMismatch { .. }
        )
    }

    /// The simulated backend error, if this is one.
    pub fn response_error(&self) -> Option<&ResponseError> {
        match self {
            FakeError::OperationFailed(err) | FakeError::TransientPageError(err) => Some(err),
            _ => None,
        }
    }
}
