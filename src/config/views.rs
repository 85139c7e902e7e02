use crate::config::helpers::{parse_bool_env, parse_env, parse_string_env};
use crate::error::ConfigError;
use crate::settings::Settings;

const MAX_INVOICE_DUE_DAYS: i64 = 365;
const MAX_UPCOMING_DAYS: i64 = 90;

/// What the grouping engine does with a record whose key extractor yields nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKeyPolicy {
    Fail,
    Uncategorized,
}

impl MalformedKeyPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Self::Fail
        } else {
            Self::Uncategorized
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Uncategorized => "uncategorized",
        }
    }
}

/// Innermost grouping level of the documents view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentGrouping {
    Case,
    Client,
}

impl DocumentGrouping {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "case" | "matter" => Ok(Self::Case),
            "client" => Ok(Self::Client),
            other => Err(ConfigError::InvalidValue {
                key: "CASECRAFT_DOCUMENT_GROUPING".to_string(),
                message: format!("unsupported grouping '{other}'"),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::Client => "client",
        }
    }
}

/// View, billing and calendar behavior resolved from settings and env.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub malformed_keys: MalformedKeyPolicy,
    pub uncategorized_label: String,
    pub document_grouping: DocumentGrouping,
    pub invoice_due_days: i64,
    pub invoice_prefix: String,
    pub upcoming_days: i64,
}

fn validate_label(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "CASECRAFT_UNCATEGORIZED_LABEL".to_string(),
            message: "label must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn validate_invoice_prefix(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::InvalidValue {
            key: "CASECRAFT_INVOICE_PREFIX".to_string(),
            message: format!("prefix must be non-empty ASCII alphanumerics, got '{trimmed}'"),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

fn validate_range(key: &str, value: i64, min: i64, max: i64) -> Result<i64, ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("must be between {min} and {max}, got {value}"),
        });
    }
    Ok(value)
}

impl ViewConfig {
    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let strict = parse_bool_env(
            "CASECRAFT_STRICT_GROUPING",
            settings.views.strict_grouping,
        )?;
        let grouping_raw = parse_string_env(
            "CASECRAFT_DOCUMENT_GROUPING",
            settings.views.document_grouping.clone(),
        )?;

        Ok(Self {
            malformed_keys: MalformedKeyPolicy::from_strict(strict),
            uncategorized_label: validate_label(&parse_string_env(
                "CASECRAFT_UNCATEGORIZED_LABEL",
                settings.views.uncategorized_label.clone(),
            )?)?,
            document_grouping: DocumentGrouping::parse(&grouping_raw)?,
            invoice_due_days: validate_range(
                "CASECRAFT_INVOICE_DUE_DAYS",
                parse_env(
                    "CASECRAFT_INVOICE_DUE_DAYS",
                    settings.billing.invoice_due_days,
                )?,
                0,
                MAX_INVOICE_DUE_DAYS,
            )?,
            invoice_prefix: validate_invoice_prefix(&parse_string_env(
                "CASECRAFT_INVOICE_PREFIX",
                settings.billing.invoice_prefix.clone(),
            )?)?,
            upcoming_days: validate_range(
                "CASECRAFT_UPCOMING_DAYS",
                parse_env("CASECRAFT_UPCOMING_DAYS", settings.calendar.upcoming_days)?,
                1,
                MAX_UPCOMING_DAYS,
            )?,
        })
    }
}

/// Settings defaults without environment overrides. Strict grouping follows
/// the build profile, like `ViewSettings::default`.
impl Default for ViewConfig {
    fn default() -> Self {
        let Settings {
            views,
            billing,
            calendar,
        } = Settings::default();
        Self {
            malformed_keys: MalformedKeyPolicy::from_strict(views.strict_grouping),
            uncategorized_label: views.uncategorized_label,
            document_grouping: DocumentGrouping::parse(&views.document_grouping)
                .unwrap_or(DocumentGrouping::Case),
            invoice_due_days: billing.invoice_due_days,
            invoice_prefix: billing.invoice_prefix,
            upcoming_days: calendar.upcoming_days,
        }
    }
}
