//! Wire request envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// HTTP method of a wire request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Put,
    Patch,
    Delete,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Put => write!(f, "PUT"),
            Self::Patch => write!(f, "PATCH"),
            Self::Delete => write!(f, "DELETE"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// A request as seen by the fake transport.
///
/// The path never includes the scheme or host; `WireRequest::new` strips
/// them from absolute URLs so polling and next links can be fed back as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    pub method: Method,
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl WireRequest {
    /// Build a request from a path or absolute URL, splitting off the query.
    pub fn new(method: Method, url: &str) -> Self {
        let without_scheme = match url.find("://") {
            Some(idx) => {
                let rest = &url[idx + 3..];
                rest.find('/').map(|slash| &rest[slash..]).unwrap_or("/")
            }
            None => url,
        };

        let (path, query) = match without_scheme.split_once('?') {
            Some((path, raw)) => (path, parse_query(raw)),
            None => (without_scheme, BTreeMap::new()),
        };

        Self {
            method,
            path: path.to_string(),
            query,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Shorthand for a GET request.
    pub fn get(url: &str) -> Self {
        Self::new(Method::Get, url)
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Look up a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

fn parse_query(raw: &str) -> BTreeMap<String, String> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_is_reduced_to_path() {
        let req = WireRequest::get("https://fake.local/pages/abc?$skiptoken=MQ&api-version=2023-03-01");
        assert_eq!(req.path, "/pages/abc");
        assert_eq!(req.query_param("$skiptoken"), Some("MQ"));
        assert_eq!(req.query_param("api-version"), Some("2023-03-01"));
    }

    #[test]
    fn test_plain_path() {
        let req = WireRequest::new(Method::Delete, "/subscriptions/s/resourceGroups/rg");
        assert_eq!(req.method, Method::Delete);
        assert_eq!(req.path, "/subscriptions/s/resourceGroups/rg");
        assert!(req.query.is_empty());
    }

    #[test]
    fn test_request_parsing() {
        let json = r#"{"method": "PUT", "path": "/x", "body": {"location": "westus"}}"#;
        let req: WireRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.method, Method::Put);
        assert_eq!(req.body.unwrap()["location"], "westus");
    }
}
