//! Built-in harness defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Subscription used when neither the config nor a scenario names one.
pub const DEFAULT_SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Polling budget (default: 100)
    pub max_polls: u32,

    /// Sleep between polls in milliseconds (default: 0)
    pub poll_frequency_ms: u64,

    /// Prefix for polling and next links (default: "https://fake.local")
    pub base_url: String,

    /// Retry-After header value (default: 0)
    pub retry_after_seconds: u32,

    /// Default subscription (default: zero GUID)
    pub subscription_id: String,

    /// Log filter (default: "info")
    pub log_level: String,

    /// Log output format (default: "text")
    pub log_format: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            max_polls: 100,
            poll_frequency_ms: 0,
            base_url: armfake_wire::DEFAULT_BASE_URL.to_string(),
            retry_after_seconds: 0,
            subscription_id: DEFAULT_SUBSCRIPTION_ID.to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Nested layout shared by every config layer
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "poll": {
                "max_polls": self.max_polls,
                "frequency_ms": self.poll_frequency_ms
            },
            "transport": {
                "base_url": self.base_url,
                "retry_after_seconds": self.retry_after_seconds
            },
            "subscription_id": self.subscription_id,
            "log": {
                "level": self.log_level,
                "format": self.log_format
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.max_polls, 100);
        assert_eq!(defaults.poll_frequency_ms, 0);
        assert_eq!(defaults.base_url, "https://fake.local");
        assert_eq!(defaults.log_format, "text");
    }

    #[test]
    fn test_to_value_layout() {
        let value = BuiltinDefaults::default().to_value();
        assert_eq!(value["poll"]["max_polls"], 100);
        assert_eq!(value["transport"]["retry_after_seconds"], 0);
        assert_eq!(value["subscription_id"], DEFAULT_SUBSCRIPTION_ID);
        assert_eq!(value["log"]["level"], "info");
    }
}
