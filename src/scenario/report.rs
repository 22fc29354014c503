//! Run report and exit codes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fake::{PollerState, Resource, ResponseError};

/// Schema identifier for `run --json` output
pub const REPORT_SCHEMA_ID: &str = "armfake/run_report@1";

/// Stable process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitCode {
    Success,
    ExpectationFailed,
    Usage,
    Cancelled,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::ExpectationFailed => 1,
            ExitCode::Usage => 2,
            ExitCode::Cancelled => crate::signal::EXIT_CODE_CANCELLED,
        }
    }
}

/// What an operation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Sync {
        #[serde(skip_serializing_if = "Option::is_none")]
        resource: Option<Resource>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<ResponseError>,
    },
    Poller {
        polls: u32,
        state: PollerState,
        #[serde(skip_serializing_if = "Option::is_none")]
        resource: Option<Resource>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<ResponseError>,
        timed_out: bool,
    },
    Pager {
        items: Vec<Resource>,
        pages: usize,
        errors: Vec<ResponseError>,
    },
}

impl Outcome {
    /// Every resource the operation returned.
    pub fn resources(&self) -> Vec<&Resource> {
        match self {
            Outcome::Sync { resource, .. } | Outcome::Poller { resource, .. } => {
                resource.iter().collect()
            }
            Outcome::Pager { items, .. } => items.iter().collect(),
        }
    }

    /// Terminal error of a sync or poller operation.
    pub fn error(&self) -> Option<&ResponseError> {
        match self {
            Outcome::Sync { error, .. } | Outcome::Poller { error, .. } => error.as_ref(),
            Outcome::Pager { .. } => None,
        }
    }
}

/// Result of one `[[operation]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationReport {
    pub operation: String,
    pub outcome: Outcome,
    /// Unmet expectations, empty when the operation passed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

impl OperationReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a whole scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_id: String,
    pub scenario: String,
    pub created_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub passed: bool,
    pub operations: Vec<OperationReport>,
    pub human_summary: String,
}

impl RunReport {
    pub fn new(scenario: impl Into<String>, operations: Vec<OperationReport>, duration_ms: u64) -> Self {
        let failed = operations.iter().filter(|op| !op.passed()).count();
        let human_summary = if failed == 0 {
            format!("{} operations passed", operations.len())
        } else {
            format!("{} of {} operations failed", failed, operations.len())
        };

        Self {
            schema_id: REPORT_SCHEMA_ID.to_string(),
            scenario: scenario.into(),
            created_at: Utc::now(),
            duration_ms,
            passed: failed == 0,
            operations,
            human_summary,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.passed {
            ExitCode::Success
        } else {
            ExitCode::ExpectationFailed
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync_report(failures: Vec<String>) -> OperationReport {
        OperationReport {
            operation: "Get".to_string(),
            outcome: Outcome::Sync {
                resource: None,
                error: Some(ResponseError::new(404, "NotFound")),
            },
            failures,
        }
    }

    #[test]
    fn test_summary_counts() {
        let report = RunReport::new("vm", vec![sync_report(vec![]), sync_report(vec![])], 3);
        assert!(report.passed);
        assert_eq!(report.human_summary, "2 operations passed");
        assert_eq!(report.exit_code().as_i32(), 0);

        let report = RunReport::new("vm", vec![sync_report(vec!["bad".to_string()])], 3);
        assert!(!report.passed);
        assert_eq!(report.human_summary, "1 of 1 operations failed");
        assert_eq!(report.exit_code(), ExitCode::ExpectationFailed);
    }

    #[test]
    fn test_outcome_tagged_json() {
        let json = serde_json::to_value(sync_report(vec![])).unwrap();
        assert_eq!(json["outcome"]["kind"], "sync");
        assert_eq!(json["outcome"]["error"]["http_status"], 404);
        assert!(json.get("failures").is_none());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::Usage.as_i32(), 2);
        assert_eq!(ExitCode::Cancelled.as_i32(), 130);
    }
}
