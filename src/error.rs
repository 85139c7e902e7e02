//! Error types for the store, view pipeline, forms and configuration.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read environment variable {key}: {message}")]
    Env { key: String, message: String },
}

/// Settings file errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid settings file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Entity store mutation errors. A failed mutation leaves the snapshot intact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id '{id}' already exists")]
    DuplicateId { entity: &'static str, id: String },

    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} update changed id from '{id}' to '{new_id}'")]
    IdChanged {
        entity: &'static str,
        id: String,
        new_id: String,
    },
}

/// Grouping configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupingError {
    #[error("group level '{level}' produced no key for record '{record_id}'")]
    MalformedGroupKey { level: String, record_id: String },

    #[error("unknown group order '{0}'")]
    UnknownOrder(String),
}

/// Form schema construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("invalid field pattern '{0}'")]
    InvalidPattern(String),

    #[error("dependent field '{target}' reads '{input}', which is computed later")]
    DependencyOrder { target: String, input: String },

    #[error("unknown form field '{0}'")]
    UnknownField(String),

    #[error("form field '{0}' is computed and cannot be set directly")]
    ComputedField(String),

    #[error("form session already submitted")]
    AlreadySubmitted,

    #[error("form has validation errors: {0}")]
    Invalid(ValidationErrors),
}

/// Errors from submitting a form into an entity store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Invoice, payment and retainer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BillingError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{entity} '{id}' cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("amount must be greater than 0, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("retainer '{id}' holds {balance}, cannot draw {requested}")]
    InsufficientBalance {
        id: String,
        balance: Decimal,
        requested: Decimal,
    },
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Accumulated validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new(errors: BTreeMap<String, String>) -> Self {
        Self { errors }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.into(), message.into());
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = ValidationError> + '_ {
        self.errors.iter().map(|(field, message)| ValidationError {
            field: field.clone(),
            message: message.clone(),
        })
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
