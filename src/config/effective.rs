//! Resolved harness settings with provenance
//!
//! [`EffectiveConfig`] keeps the merged JSON tree plus the list of sources
//! that produced it. [`Settings`] is the typed view consumed by the runner,
//! the transport and the logger.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::poll::{PollOptions, PollOptionsError};

/// Schema identifier written alongside `--json` reports
pub const SCHEMA_ID: &str = "armfake/effective_config@1";

/// Where a layer came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Merged configuration tree with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_id: String,
    pub created_at: DateTime<Utc>,
    pub config: Value,
    /// Layers in precedence order, lowest first
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Merge built-in defaults, an optional TOML file and CLI overrides.
    ///
    /// An explicitly named file must exist.
    pub fn build(config_path: Option<&Path>, cli_overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = config_path {
            let (value, digest) = load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.display().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let config = merge_layers(layers);
        // Fail at build time rather than on first use
        Settings::from_value(&config)?;

        Ok(Self {
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config,
            sources,
        })
    }

    /// Typed settings view.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        Settings::from_value(&self.config)
    }

    /// Look up a dotted key path, e.g. `poll.max_polls`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.config, |node, key| node.get(key))
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(Value::as_u64)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }
}

fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let digest = hex::encode(Sha256::digest(&bytes));

    let text = String::from_utf8_lossy(&bytes);
    let value: Value = toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok((value, digest))
}

/// Polling section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    pub max_polls: u32,
    pub frequency_ms: u64,
}

impl PollSettings {
    pub fn to_options(&self) -> PollOptions {
        PollOptions::default()
            .with_max_polls(self.max_polls)
            .with_frequency(Duration::from_millis(self.frequency_ms))
    }
}

/// Wire transport section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSettings {
    /// Prefix for `Azure-AsyncOperation`, `Location` and `nextLink` URLs
    pub base_url: String,
    pub retry_after_seconds: u32,
}

impl Default for TransportSettings {
    fn default() -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            base_url: defaults.base_url,
            retry_after_seconds: defaults.retry_after_seconds,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// `tracing` filter directive, e.g. `info` or `armfake=debug`
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: BuiltinDefaults::default().log_level,
            format: LogFormat::Text,
        }
    }
}

/// Typed view over the merged configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub poll: PollSettings,
    pub transport: TransportSettings,
    pub subscription_id: String,
    pub log: LogSettings,
}

impl Settings {
    fn from_value(config: &Value) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_value(config.clone())
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.poll.to_options().validate()?;

        let base_url = &self.transport.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "transport.base_url must be an http(s) URL, got '{}'",
                base_url
            )));
        }
        if base_url.ends_with('/') {
            return Err(ConfigError::Validation(
                "transport.base_url must not end with '/'".to_string(),
            ));
        }

        if self.subscription_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "subscription_id must not be empty".to_string(),
            ));
        }

        if self.log.level.trim().is_empty() {
            return Err(ConfigError::Validation("log.level must not be empty".to_string()));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            poll: PollSettings {
                max_polls: defaults.max_polls,
                frequency_ms: defaults.poll_frequency_ms,
            },
            transport: TransportSettings::default(),
            subscription_id: defaults.subscription_id,
            log: LogSettings::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid config: {0}")]
    Validation(String),

    #[error("invalid poll options: {0}")]
    Poll(#[from] PollOptionsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_only() {
        let config = EffectiveConfig::build(None, None).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);

        let settings = config.settings().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.poll.to_options(), PollOptions::default());
    }

    #[test]
    fn test_file_then_cli_precedence() {
        let file = toml_file(
            r#"
subscription_id = "sub-from-file"

[poll]
max_polls = 20
frequency_ms = 5

[log]
format = "json"
"#,
        );

        let config = EffectiveConfig::build(
            Some(file.path()),
            Some(json!({"poll": {"max_polls": 3}})),
        )
        .unwrap();

        let origins: Vec<_> = config.sources.iter().map(|s| s.origin).collect();
        assert_eq!(origins, vec![ConfigOrigin::Builtin, ConfigOrigin::File, ConfigOrigin::Cli]);
        assert_eq!(config.sources[1].digest.as_ref().map(String::len), Some(64));

        let settings = config.settings().unwrap();
        assert_eq!(settings.poll.max_polls, 3);
        assert_eq!(settings.poll.frequency_ms, 5);
        assert_eq!(settings.subscription_id, "sub-from-file");
        assert_eq!(settings.log.format, LogFormat::Json);
        assert_eq!(settings.log.level, "info");
        assert_eq!(settings.transport.base_url, "https://fake.local");
    }

    #[test]
    fn test_dotted_lookup() {
        let config = EffectiveConfig::build(None, None).unwrap();
        assert_eq!(config.get_u64("poll.max_polls"), Some(100));
        assert_eq!(config.get_str("transport.base_url"), Some("https://fake.local"));
        assert!(config.get("poll.nope").is_none());
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = EffectiveConfig::build(Some(Path::new("/nonexistent/armfake.toml")), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let file = toml_file("[poll\nmax_polls = 1");
        let err = EffectiveConfig::build(Some(file.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_zero_max_polls_rejected() {
        let err = EffectiveConfig::build(None, Some(json!({"poll": {"max_polls": 0}}))).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Poll(PollOptionsError::MaxPollsOutOfBounds { value: 0 })
        ));
    }

    #[test]
    fn test_base_url_validation() {
        let err = EffectiveConfig::build(
            None,
            Some(json!({"transport": {"base_url": "fake.local"}})),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = EffectiveConfig::build(
            None,
            Some(json!({"transport": {"base_url": "https://fake.local/"}})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must not end with"));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let err = EffectiveConfig::build(None, Some(json!({"log": {"format": "xml"}}))).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
