//! Wire response envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ErrorDetail;

/// A response produced by the fake transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResponse {
    /// HTTP status code.
    pub status: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl WireResponse {
    /// Create a response with a JSON body.
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Some(body),
        }
    }

    /// Create a response without a body.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Create an error response with an ARM error body.
    pub fn error(status: u16, detail: ErrorDetail) -> Self {
        Self::json(
            status,
            serde_json::json!({ "error": { "code": detail.code, "message": detail.message } }),
        )
    }

    /// Attach a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the error body, if this response carries one.
    pub fn error_detail(&self) -> Option<ErrorDetail> {
        let body = self.body.as_ref()?.get("error")?;
        serde_json::from_value(body.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_ignores_case() {
        let resp = WireResponse::json(202, json!({})).with_header("Retry-After", "1");
        assert_eq!(resp.header("retry-after"), Some("1"));
        assert_eq!(resp.header("Location"), None);
    }

    #[test]
    fn test_error_response() {
        let resp = WireResponse::error(404, ErrorDetail::new("NotFound", "gone"));
        assert!(!resp.is_success());
        assert_eq!(resp.error_detail().unwrap().code, "NotFound");
    }
}
