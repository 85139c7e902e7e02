//! File-backed settings, overridable per key from the environment.
//!
//! Settings are read from `casecraft.toml` in the working directory when it
//! exists; every field has a default so a partial file is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

pub const DEFAULT_SETTINGS_FILE: &str = "casecraft.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub views: ViewSettings,
    pub billing: BillingSettings,
    pub calendar: CalendarSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Fail on records that produce no group key instead of bucketing them.
    pub strict_grouping: bool,
    pub uncategorized_label: String,
    /// Third grouping level of the documents view: "case" or "client".
    pub document_grouping: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            strict_grouping: cfg!(debug_assertions),
            uncategorized_label: "Uncategorized".to_string(),
            document_grouping: "case".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSettings {
    pub invoice_due_days: i64,
    pub invoice_prefix: String,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            invoice_due_days: 30,
            invoice_prefix: "INV".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    pub upcoming_days: i64,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self { upcoming_days: 7 }
    }
}

impl Settings {
    pub fn from_toml(raw: &str, path: &str) -> Result<Self, SettingsError> {
        toml::from_str(raw).map_err(|e| SettingsError::Parse {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&raw, &display)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            Ok(Self::default())
        }
    }
}
