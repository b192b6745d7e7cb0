//! Dynamic configuration for the matching subsystem
//!
//! A concurrency-safe, in-memory typed key store. Values are resolved at
//! call time with a caller-supplied default, so operators can flip tunables
//! on a running process and the next scaler tick observes the new value.
//! A flat TOML table can seed the store; durations are written as strings
//! (`"500ms"`, `"1s"`, `"2m"`).

pub mod scaler;

pub use scaler::{ResolvedTunables, ScalerTunables};

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::error::{MatchingError, Result};

/// A typed dynamic-config value
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Duration(Duration),
}

/// In-memory dynamic configuration store
#[derive(Debug, Default)]
pub struct DynamicConfig {
    values: RwLock<HashMap<String, ConfigValue>>,
}

impl DynamicConfig {
    /// Create an empty store; every read resolves to its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from a flat TOML table.
    ///
    /// Booleans, integers, and floats map directly; strings are parsed as
    /// durations. Nested tables and other value types are rejected.
    pub fn from_toml(content: &str) -> Result<Self> {
        let table: toml::Table = content
            .parse()
            .map_err(|e| MatchingError::Config(format!("Failed to parse TOML config: {}", e)))?;

        let store = Self::new();
        for (key, value) in table {
            let parsed = match value {
                toml::Value::Boolean(b) => ConfigValue::Bool(b),
                toml::Value::Integer(i) => ConfigValue::Int(i),
                toml::Value::Float(f) => ConfigValue::Float(f),
                toml::Value::String(s) => ConfigValue::Duration(parse_duration(&s).ok_or_else(
                    || {
                        MatchingError::Config(format!(
                            "Key '{}': cannot parse '{}' as a duration",
                            key, s
                        ))
                    },
                )?),
                other => {
                    return Err(MatchingError::Config(format!(
                        "Key '{}': unsupported value type '{}'",
                        key,
                        other.type_str()
                    )))
                }
            };
            store.update(&key, parsed);
        }
        Ok(store)
    }

    /// Set or replace a value; visible to all subsequent reads
    pub fn update(&self, key: &str, value: ConfigValue) {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value);
    }

    /// Set a boolean value
    pub fn update_bool(&self, key: &str, value: bool) {
        self.update(key, ConfigValue::Bool(value));
    }

    /// Set an integer value
    pub fn update_int(&self, key: &str, value: i64) {
        self.update(key, ConfigValue::Int(value));
    }

    /// Set a float value
    pub fn update_float(&self, key: &str, value: f64) {
        self.update(key, ConfigValue::Float(value));
    }

    /// Set a duration value
    pub fn update_duration(&self, key: &str, value: Duration) {
        self.update(key, ConfigValue::Duration(value));
    }

    /// Remove a value, restoring the default at the read sites
    pub fn remove(&self, key: &str) {
        self.values.write().unwrap().remove(key);
    }

    /// Resolve a boolean; mismatched or missing keys yield the default
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.read().unwrap().get(key) {
            Some(ConfigValue::Bool(b)) => *b,
            _ => default,
        }
    }

    /// Resolve an integer; mismatched or missing keys yield the default
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.read().unwrap().get(key) {
            Some(ConfigValue::Int(i)) => *i,
            _ => default,
        }
    }

    /// Resolve a float. Integers widen to float; anything else yields the default.
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        match self.values.read().unwrap().get(key) {
            Some(ConfigValue::Float(f)) => *f,
            Some(ConfigValue::Int(i)) => *i as f64,
            _ => default,
        }
    }

    /// Resolve a duration; mismatched or missing keys yield the default
    pub fn get_duration(&self, key: &str, default: Duration) -> Duration {
        match self.values.read().unwrap().get(key) {
            Some(ConfigValue::Duration(d)) => *d,
            _ => default,
        }
    }
}

/// Parse a duration string like "500ms", "10s", "2m", "1h"
pub(crate) fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse().ok().map(Duration::from_millis)
    } else if let Some(hours) = s.strip_suffix('h') {
        hours.parse::<u64>().ok().map(|h| Duration::from_secs(h * 3600))
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse().ok().map(Duration::from_secs)
    } else {
        s.parse().ok().map(Duration::from_secs)
    }
}
