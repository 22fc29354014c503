//! Harness configuration
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file passed with `--config`
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::{BuiltinDefaults, DEFAULT_SUBSCRIPTION_ID};
pub use effective::{
    ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, LogFormat, LogSettings,
    PollSettings, Settings, TransportSettings, SCHEMA_ID,
};
pub use merge::{merge_into, merge_layers};
