//! Long-running operation status bodies.

use serde::{Deserialize, Serialize};

use crate::error::ErrorDetail;

/// Status reported by the async-operation polling endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl OperationStatus {
    /// Returns true if polling should stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Body returned by `GET /operations/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncOperationBody {
    /// Operation ID assigned by the transport.
    pub id: String,
    pub status: OperationStatus,
    /// Final (or intermediate) resource payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
    /// Failure detail when `status` is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl AsyncOperationBody {
    pub fn in_progress(id: impl Into<String>, properties: Option<serde_json::Value>) -> Self {
        Self {
            id: id.into(),
            status: OperationStatus::InProgress,
            properties,
            error: None,
        }
    }

    pub fn succeeded(id: impl Into<String>, properties: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            status: OperationStatus::Succeeded,
            properties: Some(properties),
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: ErrorDetail) -> Self {
        Self {
            id: id.into(),
            status: OperationStatus::Failed,
            properties: None,
            error: Some(error),
        }
    }
}
