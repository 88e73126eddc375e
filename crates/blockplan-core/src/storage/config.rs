//! TOML-based planner configuration.
//!
//! Stores:
//! - Default minimum block size and buffer applied to goals without overrides
//! - Reservation and runtime validation switches
//! - The preferred tie-break order for goals sharing a priority rank
//! - Draft rendering settings
//!
//! Configuration is stored at `~/.config/blockplan/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};

const MIN_BLOCK_RANGE: std::ops::RangeInclusive<u32> = 5..=240;
const BUFFER_RANGE: std::ops::RangeInclusive<u32> = 0..=60;

/// Planner-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Minimum block size for goals that do not set their own (minutes)
    #[serde(default = "default_min_block_minutes")]
    pub default_min_block_minutes: u32,
    /// Gap after a block for goals that do not set their own (minutes)
    #[serde(default = "default_buffer_minutes")]
    pub default_buffer_minutes: u32,
    /// Reserve the next goal's buffer in addition to its minimum block
    #[serde(default = "default_true")]
    pub reserve_follower_buffer: bool,
    /// Run the schedule validator before returning a plan
    #[serde(default = "default_true")]
    pub validate_output: bool,
    /// Goal ids served first among goals sharing a priority rank.
    /// Empty keeps caller order.
    #[serde(default)]
    pub preferred_order: Vec<String>,
}

/// Draft rendering configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftsConfig {
    /// IANA time zone name attached to drafted events
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_description")]
    pub description: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/blockplan/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub drafts: DraftsConfig,
}

fn default_min_block_minutes() -> u32 {
    30
}
fn default_buffer_minutes() -> u32 {
    10
}
fn default_true() -> bool {
    true
}
fn default_time_zone() -> String {
    "UTC".into()
}
fn default_description() -> String {
    "Drafted by blockplan (not created yet).".into()
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_min_block_minutes: default_min_block_minutes(),
            default_buffer_minutes: default_buffer_minutes(),
            reserve_follower_buffer: true,
            validate_output: true,
            preferred_order: Vec::new(),
        }
    }
}

impl PlannerConfig {
    /// Check the guardrails on default durations.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !MIN_BLOCK_RANGE.contains(&self.default_min_block_minutes) {
            return Err(ValidationError::InvalidValue {
                field: "planner.default_min_block_minutes".into(),
                message: format!(
                    "must be between {} and {}",
                    MIN_BLOCK_RANGE.start(),
                    MIN_BLOCK_RANGE.end()
                ),
            });
        }
        if !BUFFER_RANGE.contains(&self.default_buffer_minutes) {
            return Err(ValidationError::InvalidValue {
                field: "planner.default_buffer_minutes".into(),
                message: format!("must be between {} and {}", BUFFER_RANGE.start(), BUFFER_RANGE.end()),
            });
        }
        Ok(())
    }
}

impl Default for DraftsConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            description: default_description(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u32>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as minutes")))?
                            .into(),
                    ),
                    serde_json::Value::Array(_) => serde_json::Value::Array(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(|s| serde_json::Value::String(s.to_string()))
                            .collect(),
                    ),
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        cfg.planner.validate().map_err(|e| load_failed(e.to_string()))?;
        Ok(cfg)
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default configuration");
                Self::default()
            }
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result breaks a guardrail. `self` is left untouched on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.planner.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }
}
