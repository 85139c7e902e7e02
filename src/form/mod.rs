//! Form sessions: field values, dependent fields, validation and submission.
//!
//! A [`FormSchema`] declares the fields of a form, the rules that validate
//! them and the dependent fields computed from other fields. Every update
//! produces a new immutable [`FormState`]; dependents are recomputed in
//! declaration order before anything is validated, and the schema rejects a
//! declaration order in which a dependent would read a value that has not
//! been computed yet.

pub mod appointment;
pub mod interaction;
pub mod invoice;
pub mod matter;
mod pattern;
pub mod task;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::{EntityStore, Record};
use crate::error::{FormError, SubmitError, ValidationErrors};

pub use pattern::FieldPattern;

/// Value held by one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Empty,
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    Flag(bool),
}

static EMPTY: FieldValue = FieldValue::Empty;

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Blank text counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed, non-blank text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) if !text.trim().is_empty() => Some(text.trim()),
            _ => None,
        }
    }

    /// Numbers, or text that parses as one.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Dates, or `YYYY-MM-DD` text.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, Self::Flag(true))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Field values keyed by concrete field name (`items.0.rate`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, FieldValue>);

impl FormValues {
    /// Missing fields read as empty.
    pub fn get(&self, name: &str) -> &FieldValue {
        self.0.get(name).unwrap_or(&EMPTY)
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.0.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Row indices present under `prefix` (`items` -> {0, 1, ...}).
    pub fn indices(&self, prefix: &str) -> BTreeSet<usize> {
        let lead = format!("{prefix}.");
        self.0
            .keys()
            .filter_map(|key| key.strip_prefix(&lead))
            .filter_map(|rest| rest.split('.').next())
            .filter_map(|index| index.parse().ok())
            .collect()
    }

    /// Sum of the numeric values of `prefix.N.field` over all rows.
    pub fn sum_rows(&self, prefix: &str, field: &str) -> Decimal {
        self.indices(prefix)
            .into_iter()
            .filter_map(|i| self.get(&format!("{prefix}.{i}.{field}")).as_number())
            .fold(Decimal::ZERO, |acc, n| acc + n)
    }
}

/// A choice offered by a select field. `parent` links a case to its client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: Option<String>) -> Self {
        self.parent = parent;
        self
    }
}

fn option_values(options: &[SelectOption]) -> Vec<String> {
    options.iter().map(|o| o.value.clone()).collect()
}

fn find_option<'a>(options: &'a [SelectOption], value: &str) -> Option<&'a SelectOption> {
    options.iter().find(|o| o.value == value)
}

/// Whether `case` may be selected together with `client`. Cases without a
/// known client are allowed with any client.
fn case_belongs_to(cases: &[SelectOption], case: &str, client: &str) -> bool {
    find_option(cases, case).is_some_and(|c| c.parent.as_deref().is_none_or(|p| p == client))
}

/// Short upper-case suffix for minted record ids.
fn short_id() -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    simple.chars().take(8).collect::<String>().to_ascii_uppercase()
}

/// Lifecycle of a form session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    Pristine,
    DirtyInvalid,
    DirtyValid,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub values: FormValues,
    /// Current error per field. Only fields that have been validated appear.
    pub errors: BTreeMap<String, String>,
    pub touched: BTreeSet<String>,
    pub status: FormStatus,
}

impl FormState {
    pub fn value(&self, name: &str) -> &FieldValue {
        self.values.get(name)
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }
}

/// A validation rule attached to a field pattern.
#[derive(Debug, Clone)]
pub enum Rule {
    Required { message: String },
    /// Inclusive minimum. Empty values pass; pair with `Required`.
    MinNumber { min: Decimal, message: String },
    /// Minimum character count of the trimmed text. Empty values fail.
    MinLength { min: usize, message: String },
    /// Date must be on or after the date in `other`. Skipped while either is empty.
    NotBefore { other: String, message: String },
    /// Required while the flag field `flag` is set.
    RequiredIf { flag: String, message: String },
    /// At least `min` rows under `prefix`.
    MinItems {
        prefix: String,
        min: usize,
        message: String,
    },
    /// Value must be one of `allowed`. Empty values pass.
    OneOf {
        allowed: Vec<String>,
        message: String,
    },
    /// Custom check on a non-empty value.
    Predicate {
        check: fn(&FieldValue) -> bool,
        message: String,
    },
}

impl Rule {
    pub fn required(message: impl Into<String>) -> Self {
        Self::Required {
            message: message.into(),
        }
    }

    pub fn min_number(min: Decimal, message: impl Into<String>) -> Self {
        Self::MinNumber {
            min,
            message: message.into(),
        }
    }

    pub fn min_length(min: usize, message: impl Into<String>) -> Self {
        Self::MinLength {
            min,
            message: message.into(),
        }
    }

    pub fn not_before(other: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotBefore {
            other: other.into(),
            message: message.into(),
        }
    }

    pub fn required_if(flag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RequiredIf {
            flag: flag.into(),
            message: message.into(),
        }
    }

    pub fn min_items(prefix: impl Into<String>, min: usize, message: impl Into<String>) -> Self {
        Self::MinItems {
            prefix: prefix.into(),
            min,
            message: message.into(),
        }
    }

    pub fn one_of(allowed: Vec<String>, message: impl Into<String>) -> Self {
        Self::OneOf {
            allowed,
            message: message.into(),
        }
    }

    pub fn predicate(check: fn(&FieldValue) -> bool, message: impl Into<String>) -> Self {
        Self::Predicate {
            check,
            message: message.into(),
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Required { message }
            | Self::MinNumber { message, .. }
            | Self::MinLength { message, .. }
            | Self::NotBefore { message, .. }
            | Self::RequiredIf { message, .. }
            | Self::MinItems { message, .. }
            | Self::OneOf { message, .. }
            | Self::Predicate { message, .. } => message,
        }
    }

    /// Other fields this rule reads, by literal name.
    fn references(&self) -> Option<&str> {
        match self {
            Self::NotBefore { other, .. } => Some(other),
            Self::RequiredIf { flag, .. } => Some(flag),
            _ => None,
        }
    }

    fn passes(&self, values: &FormValues, name: &str) -> bool {
        let value = values.get(name);
        match self {
            Self::Required { .. } => !value.is_empty(),
            Self::MinNumber { min, .. } => {
                value.is_empty() || value.as_number().is_some_and(|n| n >= *min)
            }
            Self::MinLength { min, .. } => value
                .as_text()
                .is_some_and(|text| text.chars().count() >= *min),
            Self::NotBefore { other, .. } => {
                match (value.as_date(), values.get(other).as_date()) {
                    (Some(date), Some(floor)) => date >= floor,
                    _ => true,
                }
            }
            Self::RequiredIf { flag, .. } => !values.get(flag).as_flag() || !value.is_empty(),
            Self::MinItems { prefix, min, .. } => values.indices(prefix).len() >= *min,
            Self::OneOf { allowed, .. } => {
                value.is_empty() || value.as_text().is_some_and(|v| allowed.iter().any(|a| a == v))
            }
            Self::Predicate { check, .. } => value.is_empty() || check(value),
        }
    }
}

type Compute = Arc<dyn Fn(&FormValues, Option<usize>) -> FieldValue + Send + Sync>;
type Build<R> = Arc<dyn Fn(&FormValues) -> Result<R, ValidationErrors> + Send + Sync>;

/// A field computed from other fields.
#[derive(Clone)]
struct Dependent {
    target: FieldPattern,
    inputs: Vec<FieldPattern>,
    compute: Compute,
}

impl fmt::Debug for Dependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependent")
            .field("target", &self.target)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

/// Declarative description of a form producing records of type `R`.
pub struct FormSchema<R> {
    name: &'static str,
    fields: Vec<FieldPattern>,
    defaults: FormValues,
    row_defaults: Vec<(FieldPattern, FieldValue)>,
    dependents: Vec<Dependent>,
    /// Dependent targets callers may not write directly.
    computed: Vec<FieldPattern>,
    rules: Vec<(FieldPattern, Rule)>,
    build: Build<R>,
}

impl<R> fmt::Debug for FormSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("dependents", &self.dependents)
            .finish_non_exhaustive()
    }
}

pub struct FormSchemaBuilder<R> {
    name: &'static str,
    fields: Vec<(String, FieldValue)>,
    rows: Vec<(String, usize)>,
    dependents: Vec<(String, Vec<String>, Compute)>,
    editable: Vec<String>,
    rules: Vec<(String, Rule)>,
    record: PhantomData<fn() -> R>,
}

impl<R> FormSchemaBuilder<R> {
    /// Register a field with its initial value. Wildcard fields take the
    /// value in every new row.
    pub fn field(mut self, pattern: &str, default: FieldValue) -> Self {
        self.fields.push((pattern.to_string(), default));
        self
    }

    /// Number of rows under `prefix` in a fresh form.
    pub fn rows(mut self, prefix: &str, count: usize) -> Self {
        self.rows.push((prefix.to_string(), count));
        self
    }

    pub fn rule(mut self, pattern: &str, rule: Rule) -> Self {
        self.rules.push((pattern.to_string(), rule));
        self
    }

    /// Declare `target` as computed from `inputs`. Dependents run in
    /// declaration order, so an input may only be the target of an earlier
    /// dependent.
    pub fn dependent<F>(mut self, target: &str, inputs: &[&str], compute: F) -> Self
    where
        F: Fn(&FormValues, Option<usize>) -> FieldValue + Send + Sync + 'static,
    {
        self.dependents.push((
            target.to_string(),
            inputs.iter().map(|s| s.to_string()).collect(),
            Arc::new(compute),
        ));
        self
    }

    /// Let callers also write the dependent `target`, e.g. a selection
    /// that is cleared when the field it is scoped to changes.
    pub fn editable(mut self, target: &str) -> Self {
        self.editable.push(target.to_string());
        self
    }

    pub fn build<F>(self, build: F) -> Result<FormSchema<R>, FormError>
    where
        F: Fn(&FormValues) -> Result<R, ValidationErrors> + Send + Sync + 'static,
    {
        let mut fields = Vec::with_capacity(self.fields.len());
        let mut defaults = FormValues::default();
        let mut row_defaults = Vec::new();
        for (raw, value) in self.fields {
            let pattern = FieldPattern::parse(&raw)?;
            if pattern.is_wildcard() {
                row_defaults.push((pattern.clone(), value));
            } else {
                defaults.set(raw, value);
            }
            fields.push(pattern);
        }

        let mut dependents = Vec::with_capacity(self.dependents.len());
        for (target, inputs, compute) in self.dependents {
            dependents.push(Dependent {
                target: FieldPattern::parse(&target)?,
                inputs: inputs
                    .iter()
                    .map(|raw| FieldPattern::parse(raw))
                    .collect::<Result<_, _>>()?,
                compute,
            });
        }
        for (position, dependent) in dependents.iter().enumerate() {
            for input in &dependent.inputs {
                if let Some(later) = dependents[position..]
                    .iter()
                    .find(|d| d.target.overlaps(input))
                {
                    return Err(FormError::DependencyOrder {
                        target: dependent.target.to_string(),
                        input: later.target.to_string(),
                    });
                }
            }
        }

        let editable = self
            .editable
            .iter()
            .map(|raw| FieldPattern::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
        let computed = dependents
            .iter()
            .map(|d| d.target.clone())
            .filter(|target| !editable.contains(target))
            .collect();

        let rules = self
            .rules
            .into_iter()
            .map(|(raw, rule)| Ok((FieldPattern::parse(&raw)?, rule)))
            .collect::<Result<Vec<_>, FormError>>()?;

        let mut schema = FormSchema {
            name: self.name,
            fields,
            defaults,
            row_defaults,
            dependents,
            computed,
            rules,
            build: Arc::new(build),
        };
        let mut values = std::mem::take(&mut schema.defaults);
        for (prefix, count) in &self.rows {
            for index in 0..*count {
                schema.fill_row(&mut values, prefix, index);
            }
        }
        schema.defaults = values;
        Ok(schema)
    }
}

impl<R> FormSchema<R> {
    pub fn builder(name: &'static str) -> FormSchemaBuilder<R> {
        FormSchemaBuilder {
            name,
            fields: Vec::new(),
            rows: Vec::new(),
            dependents: Vec::new(),
            editable: Vec::new(),
            rules: Vec::new(),
            record: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn fill_row(&self, values: &mut FormValues, prefix: &str, index: usize) {
        for (pattern, value) in &self.row_defaults {
            if pattern.row_prefix().as_deref() == Some(prefix)
                && let Some(name) = pattern.resolve(Some(index))
            {
                values.set(name, value.clone());
            }
        }
    }

    /// Whether callers may write `name`: a registered field, on an existing
    /// row for wildcard fields, that is not computed.
    fn check_writable(&self, values: &FormValues, name: &str) -> Result<(), FormError> {
        let known = self.fields.iter().any(|pattern| match pattern.capture(name) {
            Some(Some(row)) => pattern
                .row_prefix()
                .is_some_and(|prefix| values.indices(&prefix).contains(&row)),
            Some(None) => true,
            None => false,
        });
        if !known {
            return Err(FormError::UnknownField(name.to_string()));
        }
        if self.computed.iter().any(|p| p.matches(name)) {
            return Err(FormError::ComputedField(name.to_string()));
        }
        Ok(())
    }

    /// A fresh state: defaults with every dependent computed.
    pub fn initial_state(&self) -> FormState {
        let mut values = self.defaults.clone();
        self.recompute_all(&mut values);
        FormState {
            values,
            errors: BTreeMap::new(),
            touched: BTreeSet::new(),
            status: FormStatus::Pristine,
        }
    }

    /// Recompute every dependent, in declaration order, for every row.
    pub fn recompute_all(&self, values: &mut FormValues) {
        for dependent in &self.dependents {
            match dependent.target.row_prefix() {
                Some(prefix) => {
                    for index in values.indices(&prefix) {
                        let value = (dependent.compute)(values, Some(index));
                        if let Some(name) = dependent.target.resolve(Some(index)) {
                            values.set(name, value);
                        }
                    }
                }
                None => {
                    let value = (dependent.compute)(values, None);
                    if let Some(name) = dependent.target.resolve(None) {
                        values.set(name, value);
                    }
                }
            }
        }
    }

    /// Recompute dependents reachable from `changed`, appending every
    /// recomputed field to it.
    fn propagate(&self, values: &mut FormValues, changed: &mut Vec<String>) {
        for dependent in &self.dependents {
            let mut rows: BTreeSet<Option<usize>> = BTreeSet::new();
            for input in &dependent.inputs {
                for name in changed.iter() {
                    let Some(captured) = input.capture(name) else {
                        continue;
                    };
                    match (dependent.target.row_prefix(), captured) {
                        (None, _) => {
                            rows.insert(None);
                        }
                        (Some(_), Some(row)) if input.is_wildcard() => {
                            rows.insert(Some(row));
                        }
                        (Some(prefix), _) => {
                            rows.extend(values.indices(&prefix).into_iter().map(Some));
                        }
                    }
                }
            }
            for row in rows {
                let Some(name) = dependent.target.resolve(row) else {
                    continue;
                };
                let value = (dependent.compute)(values, row);
                values.set(name.clone(), value);
                if !changed.contains(&name) {
                    changed.push(name);
                }
            }
        }
    }

    /// First failing rule for a concrete field.
    pub fn validate_field(&self, values: &FormValues, name: &str) -> Option<String> {
        self.rules
            .iter()
            .filter(|(pattern, _)| pattern.matches(name))
            .find(|(_, rule)| !rule.passes(values, name))
            .map(|(_, rule)| rule.message().to_string())
    }

    /// Validate every registered rule against every concrete field it covers.
    pub fn validate_all(&self, values: &FormValues) -> ValidationErrors {
        let mut errors = BTreeMap::new();
        for name in self.rule_targets(values) {
            if let Some(message) = self.validate_field(values, &name) {
                errors.insert(name, message);
            }
        }
        ValidationErrors::new(errors)
    }

    fn rule_targets(&self, values: &FormValues) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for (pattern, _) in &self.rules {
            match pattern.row_prefix() {
                Some(prefix) => names.extend(
                    values
                        .indices(&prefix)
                        .into_iter()
                        .filter_map(|i| pattern.resolve(Some(i))),
                ),
                None => names.extend(pattern.resolve(None)),
            }
        }
        names
    }

    /// Fields whose rules read any of `changed`.
    fn cross_field_targets(&self, changed: &[String]) -> Vec<String> {
        self.rules
            .iter()
            .filter(|(pattern, rule)| {
                !pattern.is_wildcard()
                    && rule
                        .references()
                        .is_some_and(|other| changed.iter().any(|c| c == other))
            })
            .filter_map(|(pattern, _)| pattern.resolve(None))
            .collect()
    }

    fn status_for(&self, values: &FormValues) -> FormStatus {
        if self.validate_all(values).is_empty() {
            FormStatus::DirtyValid
        } else {
            FormStatus::DirtyInvalid
        }
    }

    fn revalidate(
        &self,
        values: &FormValues,
        errors: &mut BTreeMap<String, String>,
        names: &[String],
    ) {
        for name in names {
            match self.validate_field(values, name) {
                Some(message) => {
                    errors.insert(name.clone(), message);
                }
                None => {
                    errors.remove(name);
                }
            }
        }
    }

    /// Set one field and return the resulting state.
    ///
    /// Dependents are recomputed first; then the field, the recomputed
    /// dependents and every field with a cross-field rule reading them are
    /// validated. Errors of other fields are left as they were. Setting a
    /// field to its current value returns an identical state.
    pub fn update(
        &self,
        state: &FormState,
        field: &str,
        value: FieldValue,
    ) -> Result<FormState, FormError> {
        if state.status == FormStatus::Submitted {
            return Err(FormError::AlreadySubmitted);
        }
        self.check_writable(&state.values, field)?;
        if state.values.contains(field) && *state.values.get(field) == value {
            return Ok(state.clone());
        }

        let mut values = state.values.clone();
        values.set(field, value);
        let mut changed = vec![field.to_string()];
        self.propagate(&mut values, &mut changed);

        let mut to_validate = changed.clone();
        for name in self.cross_field_targets(&changed) {
            if !to_validate.contains(&name) {
                to_validate.push(name);
            }
        }
        let mut errors = state.errors.clone();
        self.revalidate(&values, &mut errors, &to_validate);

        let mut touched = state.touched.clone();
        touched.insert(field.to_string());
        let status = self.status_for(&values);
        tracing::debug!(form = self.name, field, ?status, "Form field updated");

        Ok(FormState {
            values,
            errors,
            touched,
            status,
        })
    }

    /// Add an empty row under `prefix` at the next index.
    pub fn append_row(&self, state: &FormState, prefix: &str) -> Result<FormState, FormError> {
        if state.status == FormStatus::Submitted {
            return Err(FormError::AlreadySubmitted);
        }
        let index = state
            .values
            .indices(prefix)
            .last()
            .map_or(0, |last| last + 1);
        let mut values = state.values.clone();
        self.fill_row(&mut values, prefix, index);
        Ok(self.after_row_change(state, values, state.touched.clone(), prefix))
    }

    /// Remove row `index` under `prefix`, shifting later rows down.
    pub fn remove_row(
        &self,
        state: &FormState,
        prefix: &str,
        index: usize,
    ) -> Result<FormState, FormError> {
        if state.status == FormStatus::Submitted {
            return Err(FormError::AlreadySubmitted);
        }
        if !state.values.indices(prefix).contains(&index) {
            return Err(FormError::UnknownField(format!("{prefix}.{index}")));
        }
        let lead = format!("{prefix}.");
        let shift = |name: &str| -> Option<String> {
            let Some(rest) = name.strip_prefix(&lead) else {
                return Some(name.to_string());
            };
            let (row, tail) = match rest.split_once('.') {
                Some((row, tail)) => (row, Some(tail)),
                None => (rest, None),
            };
            match (row.parse::<usize>(), tail) {
                (Ok(row), _) if row == index => None,
                (Ok(row), Some(tail)) if row > index => Some(format!("{lead}{}.{tail}", row - 1)),
                (Ok(row), None) if row > index => Some(format!("{lead}{}", row - 1)),
                _ => Some(name.to_string()),
            }
        };

        let mut values = FormValues::default();
        for (name, value) in state.values.iter() {
            if let Some(renamed) = shift(name) {
                values.set(renamed, value.clone());
            }
        }
        let touched = state.touched.iter().filter_map(|n| shift(n.as_str())).collect();
        Ok(self.after_row_change(state, values, touched, prefix))
    }

    fn after_row_change(
        &self,
        state: &FormState,
        mut values: FormValues,
        mut touched: BTreeSet<String>,
        prefix: &str,
    ) -> FormState {
        self.recompute_all(&mut values);
        touched.insert(prefix.to_string());

        let mut errors = BTreeMap::new();
        let names: Vec<String> = self
            .rule_targets(&values)
            .into_iter()
            .filter(|name| touched.contains(name) || state.errors.contains_key(name))
            .collect();
        self.revalidate(&values, &mut errors, &names);

        let status = self.status_for(&values);
        tracing::debug!(
            form = self.name,
            prefix,
            rows = values.indices(prefix).len(),
            "Form rows changed"
        );
        FormState {
            values,
            errors,
            touched,
            status,
        }
    }

    /// Validate every field and build the record.
    pub fn submit(&self, state: &FormState) -> Result<R, ValidationErrors> {
        let errors = self.validate_all(&state.values);
        if !errors.is_empty() {
            return Err(errors);
        }
        (self.build)(&state.values)
    }
}

/// Stateful wrapper around a schema: current state plus undo history.
pub struct FormSession<R> {
    schema: Arc<FormSchema<R>>,
    state: FormState,
    history: Vec<FormState>,
}

impl<R> FormSession<R> {
    pub fn new(schema: Arc<FormSchema<R>>) -> Self {
        let state = schema.initial_state();
        Self {
            schema,
            state,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn schema(&self) -> &FormSchema<R> {
        &self.schema
    }

    fn advance(&mut self, next: FormState) -> &FormState {
        if next != self.state {
            let previous = std::mem::replace(&mut self.state, next);
            self.history.push(previous);
        }
        &self.state
    }

    pub fn update(
        &mut self,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<&FormState, FormError> {
        let next = self.schema.update(&self.state, field, value.into())?;
        Ok(self.advance(next))
    }

    pub fn append_row(&mut self, prefix: &str) -> Result<&FormState, FormError> {
        let next = self.schema.append_row(&self.state, prefix)?;
        Ok(self.advance(next))
    }

    pub fn remove_row(&mut self, prefix: &str, index: usize) -> Result<&FormState, FormError> {
        let next = self.schema.remove_row(&self.state, prefix, index)?;
        Ok(self.advance(next))
    }

    /// Step back one change. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.state.status == FormStatus::Submitted {
            return false;
        }
        match self.history.pop() {
            Some(previous) => {
                self.state = previous;
                true
            }
            None => false,
        }
    }

    /// Back to a pristine form. The only way errors are cleared wholesale.
    pub fn reset(&mut self) {
        self.state = self.schema.initial_state();
        self.history.clear();
    }

    fn prepare(&mut self) -> Result<R, FormError> {
        if self.state.status == FormStatus::Submitted {
            return Err(FormError::AlreadySubmitted);
        }
        match self.schema.submit(&self.state) {
            Ok(record) => Ok(record),
            Err(errors) => {
                let mut state = self.state.clone();
                state.errors = errors.as_map().clone();
                state.touched.extend(errors.as_map().keys().cloned());
                state.status = FormStatus::DirtyInvalid;
                self.advance(state);
                tracing::debug!(
                    form = self.schema.name,
                    errors = errors.len(),
                    "Form submit rejected"
                );
                Err(FormError::Invalid(errors))
            }
        }
    }

    fn mark_submitted(&mut self) {
        self.state.status = FormStatus::Submitted;
        tracing::debug!(form = self.schema.name, "Form submitted");
    }

    /// Validate and build the record, ending the session.
    pub fn submit(&mut self) -> Result<R, FormError> {
        let record = self.prepare()?;
        self.mark_submitted();
        Ok(record)
    }
}

impl<R: Record> FormSession<R> {
    /// Validate, build and insert into `store`. The store is touched only
    /// when the form is valid; on a store error the session stays open.
    pub fn submit_into(&mut self, store: &mut EntityStore<R>) -> Result<Arc<[R]>, SubmitError> {
        let record = self.prepare()?;
        let snapshot = store.insert(record)?;
        self.mark_submitted();
        Ok(snapshot)
    }
}
