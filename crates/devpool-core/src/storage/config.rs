//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Focus session timing and sampling policy
//! - Notification preferences
//! - AI coach endpoint
//!
//! Configuration is stored at `~/.config/devpool/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::session::{AveragePolicy, MAX_FOCUS};

/// Focus session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Countdown length. One second is removed per tick.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Samples kept on the live chart.
    #[serde(default = "default_display_window")]
    pub display_window: usize,
    #[serde(default = "default_initial_focus_level")]
    pub initial_focus_level: f64,
    /// Largest change of the focus level per tick.
    #[serde(default = "default_max_step")]
    pub max_step: f64,
    /// End the session when the countdown reaches zero instead of waiting for stop.
    #[serde(default)]
    pub auto_stop_at_zero: bool,
    #[serde(default)]
    pub average_over: AveragePolicy,
    /// Fixed seed for the focus sampler. Entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// AI coach configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Text generation endpoint accepting `{system, prompt}`.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable checked for the API key before the OS keyring.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/devpool/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub coach: CoachConfig,
}

// Default functions
fn default_duration_secs() -> u32 {
    1500
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_display_window() -> usize {
    20
}
fn default_initial_focus_level() -> f64 {
    85.0
}
fn default_max_step() -> f64 {
    5.0
}
fn default_true() -> bool {
    true
}
fn default_api_key_env() -> String {
    "DEVPOOL_AI_KEY".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            tick_interval_ms: default_tick_interval_ms(),
            display_window: default_display_window(),
            initial_focus_level: default_initial_focus_level(),
            max_step: default_max_step(),
            auto_stop_at_zero: false,
            average_over: AveragePolicy::AllSamples,
            seed: None,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SessionConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_secs == 0 {
            return Err(invalid("session.duration_secs", "must be greater than 0"));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("session.tick_interval_ms", "must be greater than 0"));
        }
        if self.display_window == 0 {
            return Err(invalid("session.display_window", "must be greater than 0"));
        }
        if !(0.0..=100.0).contains(&self.initial_focus_level) {
            return Err(invalid(
                "session.initial_focus_level",
                "must be between 0 and 100",
            ));
        }
        if !(0.0..=MAX_FOCUS).contains(&self.max_step) {
            return Err(invalid("session.max_step", "must be between 0 and 100"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
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
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => {
                        serde_json::Value::Bool(value.parse::<bool>().map_err(|e| {
                            invalid(key, &e.to_string())
                        })?)
                    }
                    serde_json::Value::Number(_) => parse_number(key, value)?,
                    // Optional values: keep numbers as numbers, anything else as text.
                    serde_json::Value::Null => match value {
                        "" | "none" | "null" => serde_json::Value::Null,
                        _ => parse_number(key, value)
                            .unwrap_or_else(|_| serde_json::Value::String(value.into())),
                    },
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(key, &e.to_string()))?
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.session.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    /// Update a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the field's type or fails validation.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| invalid(key, &e.to_string()))?;
        updated.session.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }
}

fn parse_number(key: &str, value: &str) -> Result<serde_json::Value, ConfigError> {
    if let Ok(n) = value.parse::<u64>() {
        Ok(serde_json::Value::Number(n.into()))
    } else if let Ok(n) = value.parse::<f64>() {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| invalid(key, &format!("cannot parse '{value}' as number")))
    } else {
        Err(invalid(key, &format!("cannot parse '{value}' as number")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.session.duration_secs, 1500);
        assert_eq!(cfg.session.tick_interval_ms, 1000);
        assert_eq!(cfg.session.display_window, 20);
        assert_eq!(cfg.session.initial_focus_level, 85.0);
        assert_eq!(cfg.session.max_step, 5.0);
        assert!(!cfg.session.auto_stop_at_zero);
        assert_eq!(cfg.session.average_over, AveragePolicy::AllSamples);
        assert!(cfg.notifications.enabled);
        assert!(!cfg.coach.enabled);
        assert_eq!(cfg.coach.api_key_env, "DEVPOOL_AI_KEY");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[session]\nduration_secs = 600\n").unwrap();
        assert_eq!(parsed.session.duration_secs, 600);
        assert_eq!(parsed.session.display_window, 20);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("session.duration_secs").as_deref(), Some("1500"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("session.average_over").as_deref(), Some("all_samples"));
        assert!(cfg.get("session.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("session.duration_secs", "600").unwrap();
        cfg.apply("notifications.enabled", "false").unwrap();
        cfg.apply("session.average_over", "display_window").unwrap();
        cfg.apply("session.initial_focus_level", "72.5").unwrap();
        assert_eq!(cfg.session.duration_secs, 600);
        assert!(!cfg.notifications.enabled);
        assert_eq!(cfg.session.average_over, AveragePolicy::DisplayWindow);
        assert_eq!(cfg.session.initial_focus_level, 72.5);
    }

    #[test]
    fn apply_sets_and_clears_optional_values() {
        let mut cfg = Config::default();
        cfg.apply("session.seed", "7").unwrap();
        cfg.apply("coach.endpoint", "https://ai.example.com/v1/text").unwrap();
        assert_eq!(cfg.session.seed, Some(7));
        assert_eq!(
            cfg.coach.endpoint.as_deref(),
            Some("https://ai.example.com/v1/text")
        );
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(cfg.apply("session.nonexistent_key", "1").is_err());
        assert!(cfg.apply("", "1").is_err());
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("notifications.enabled", "not_a_bool").is_err());
        assert!(cfg.apply("session.average_over", "median").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn apply_rejects_out_of_range_values() {
        let mut cfg = Config::default();
        assert!(cfg.apply("session.duration_secs", "0").is_err());
        assert!(cfg.apply("session.initial_focus_level", "120").is_err());
        assert_eq!(cfg.session.duration_secs, 1500);
    }

    #[test]
    fn validate_caps_max_step_at_focus_scale() {
        let mut session = SessionConfig::default();
        session.max_step = 100.0;
        assert!(session.validate().is_ok());
        for bad in [1e308, 100.5, -1.0, f64::NAN, f64::INFINITY] {
            session.max_step = bad;
            assert!(session.validate().is_err(), "accepted max_step {bad}");
        }

        let mut cfg = Config::default();
        assert!(cfg.apply("session.max_step", "1e308").is_err());
        assert_eq!(cfg.session.max_step, 5.0);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.apply("session.auto_stop_at_zero", "true").unwrap();
        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.session.auto_stop_at_zero);
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\ndisplay_window = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
