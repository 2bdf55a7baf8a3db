//! Form-session configuration.
//!
//! Resolved once when a session is opened and passed in; sessions never read
//! process-wide settings while the user is editing.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default logical table for IV sedation flow charts.
pub const DEFAULT_TABLE: &str = "iv_sedation_flow_charts";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for one form session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    table: String,
    autosave_debounce_ms: u64,
    save_error_display_ms: u64,
    info_toast_ms: u64,
    error_toast_ms: u64,
    placeholder_name_prefix: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            autosave_debounce_ms: 0,
            save_error_display_ms: 3_000,
            info_toast_ms: 3_000,
            error_toast_ms: 5_000,
            placeholder_name_prefix: "Patient".to_string(),
        }
    }
}

impl FormConfig {
    /// Create a config for `table` with default timings.
    pub fn new(table: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            table: table.into(),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Coalesce edits until this much inactivity has passed (0 saves every edit).
    pub fn with_autosave_debounce_ms(mut self, ms: u64) -> Self {
        self.autosave_debounce_ms = ms;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.table.trim().is_empty() {
            return Err(ConfigError::Invalid("table cannot be empty".into()));
        }
        if self.info_toast_ms == 0 || self.error_toast_ms == 0 || self.save_error_display_ms == 0 {
            return Err(ConfigError::Invalid(
                "notification durations must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::milliseconds(self.autosave_debounce_ms as i64)
    }

    /// How long the "Failed to save" badge stays before reverting to idle.
    pub fn save_error_display(&self) -> Duration {
        Duration::milliseconds(self.save_error_display_ms as i64)
    }

    pub fn info_toast(&self) -> Duration {
        Duration::milliseconds(self.info_toast_ms as i64)
    }

    pub fn error_toast(&self) -> Duration {
        Duration::milliseconds(self.error_toast_ms as i64)
    }

    /// Name stored when the patient context has no usable name.
    pub fn placeholder_name(&self, patient_id: &str) -> String {
        format!("{} {}", self.placeholder_name_prefix, patient_id)
    }
}
