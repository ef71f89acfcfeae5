//! Pluggable checks and the checklist that runs them.
//!
//! A [`Check`] is driven through three lifecycle hooks: once before the
//! first row, once per row, and once after the last row. Built-in checks
//! are described by [`CheckDescriptor`] and can be loaded from
//! `{"type": "<code>", ...}` descriptors; user checks implement [`Check`]
//! and are registered on a [`Checklist`] through a factory.

mod ascii_value;
mod deviated_value;
mod duplicate_row;
pub mod expr;
mod forbidden_value;
mod row_constraint;
mod sequential_value;
mod table_dimensions;
mod truncated_value;

pub use ascii_value::AsciiValue;
pub use deviated_value::DeviatedValue;
pub use duplicate_row::DuplicateRow;
pub use forbidden_value::ForbiddenValue;
pub use row_constraint::RowConstraint;
pub use sequential_value::SequentialValue;
pub use table_dimensions::TableDimensions;
pub use truncated_value::TruncatedValue;

use crate::error::{ErrorCategory, ErrorKind, ValidationError};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tables_core::Schema;

/// A validation rule with start, row and end hooks.
///
/// Errors returned from any hook are attributed to the current task;
/// errors from [`validate_row`](Check::validate_row) are merged into that
/// row's errors. Returning a `check-error` from
/// [`validate_start`](Check::validate_start) removes the check from the run.
pub trait Check: Send {
    /// Code of the check, usually the error type it emits.
    fn code(&self) -> &'static str;

    fn validate_start(&mut self, _schema: &Schema) -> Vec<ValidationError> {
        Vec::new()
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError>;

    fn validate_end(&mut self) -> Vec<ValidationError> {
        Vec::new()
    }
}

/// Builds a fresh instance of a user check for each task.
pub type CheckFactory = Arc<dyn Fn() -> Box<dyn Check> + Send + Sync>;

/// Descriptor of a built-in check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CheckDescriptor {
    DuplicateRow(DuplicateRow),
    TableDimensions(TableDimensions),
    DeviatedValue(DeviatedValue),
    ForbiddenValue(ForbiddenValue),
    SequentialValue(SequentialValue),
    AsciiValue(AsciiValue),
    TruncatedValue(TruncatedValue),
    RowConstraint(RowConstraint),
}

impl CheckDescriptor {
    pub fn code(&self) -> &'static str {
        match self {
            CheckDescriptor::DuplicateRow(_) => "duplicate-row",
            CheckDescriptor::TableDimensions(_) => "table-dimensions",
            CheckDescriptor::DeviatedValue(_) => "deviated-value",
            CheckDescriptor::ForbiddenValue(_) => "forbidden-value",
            CheckDescriptor::SequentialValue(_) => "sequential-value",
            CheckDescriptor::AsciiValue(_) => "ascii-value",
            CheckDescriptor::TruncatedValue(_) => "truncated-value",
            CheckDescriptor::RowConstraint(_) => "row-constraint",
        }
    }

    /// A new check instance with fresh state.
    pub fn build(&self) -> Box<dyn Check> {
        match self.clone() {
            CheckDescriptor::DuplicateRow(check) => Box::new(check),
            CheckDescriptor::TableDimensions(check) => Box::new(check),
            CheckDescriptor::DeviatedValue(check) => Box::new(check),
            CheckDescriptor::ForbiddenValue(check) => Box::new(check),
            CheckDescriptor::SequentialValue(check) => Box::new(check),
            CheckDescriptor::AsciiValue(check) => Box::new(check),
            CheckDescriptor::TruncatedValue(check) => Box::new(check),
            CheckDescriptor::RowConstraint(check) => Box::new(check),
        }
    }
}

/// Ordered checks plus error filters.
///
/// `pick_errors` keeps only errors matching one of its selectors;
/// `skip_errors` drops matching errors. Selectors are type codes, category
/// codes such as `cell-error`, or `#tags`. Filters apply when errors enter a
/// report, so every check still runs and emits.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    #[serde(default)]
    pub checks: Vec<CheckDescriptor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pick_errors: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_errors: Vec<String>,

    #[serde(skip)]
    custom: Vec<CheckFactory>,
}

impl Checklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check(mut self, check: CheckDescriptor) -> Self {
        self.checks.push(check);
        self
    }

    /// Registers a user check; `factory` runs once per validated table.
    pub fn with_custom_check<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Check> + Send + Sync + 'static,
    {
        self.custom.push(Arc::new(factory));
        self
    }

    pub fn with_pick_errors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pick_errors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skip_errors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_errors = selectors.into_iter().map(Into::into).collect();
        self
    }

    /// Fresh instances of every check, built-ins first.
    pub fn connect(&self) -> Vec<Box<dyn Check>> {
        self.checks
            .iter()
            .map(CheckDescriptor::build)
            .chain(self.custom.iter().map(|factory| factory()))
            .collect()
    }

    /// Whether an error passes the pick/skip filters.
    pub fn accepts(&self, error: &ValidationError) -> bool {
        let picked = self.pick_errors.is_empty() || self.pick_errors.iter().any(|s| error.matches(s));
        picked && !self.skip_errors.iter().any(|s| error.matches(s))
    }

    /// Errors in the selectors that name no known type code, category or tag.
    pub fn metadata_validate(&self) -> Vec<ValidationError> {
        self.pick_errors
            .iter()
            .chain(&self.skip_errors)
            .filter(|selector| !known_selector(selector))
            .map(|selector| {
                ValidationError::general(ErrorKind::Check, format!("error selector \"{selector}\" is not known"))
            })
            .collect()
    }
}

impl fmt::Debug for Checklist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checklist")
            .field("checks", &self.checks)
            .field("custom", &self.custom.len())
            .field("pick_errors", &self.pick_errors)
            .field("skip_errors", &self.skip_errors)
            .finish()
    }
}

fn known_selector(selector: &str) -> bool {
    if selector.starts_with('#') {
        return ErrorCategory::ALL
            .iter()
            .any(|category| category.tags().contains(&selector));
    }
    ErrorKind::from_code(selector).is_some() || ErrorCategory::ALL.iter().any(|category| category.code() == selector)
}

/// A `check-error` raised while starting a check.
pub(crate) fn check_error(note: impl Into<String>) -> ValidationError {
    ValidationError::general(ErrorKind::Check, note)
}

/// A `check-error` unless `schema` has the field.
pub(crate) fn require_field(schema: &Schema, code: &str, field_name: &str) -> Option<ValidationError> {
    (!schema.has_field(field_name))
        .then(|| check_error(format!("{code} check requires field \"{field_name}\" to exist")))
}

#[cfg(test)]
pub(crate) mod tests_support {
    use crate::header::Header;
    use crate::row::{Row, RowEngine};
    use tables_core::{FieldBuilder, Schema, SchemaBuilder, TypeRegistry, Value};

    pub fn schema(fields: &[(&str, &str)]) -> Schema {
        fields
            .iter()
            .fold(SchemaBuilder::new(), |builder, (name, field_type)| {
                builder.field(FieldBuilder::new(*name, *field_type).build())
            })
            .build()
    }

    /// Rows of a headerless table; the first row sits at position 2.
    pub fn rows(fields: &[(&str, &str)], data: &[&[&str]]) -> Vec<Row> {
        let schema = schema(fields);
        let engine = RowEngine::new(&schema, &Header::headerless(&schema), &TypeRegistry::new()).unwrap();
        data.iter()
            .enumerate()
            .map(|(index, cells)| {
                let raw: Vec<Option<Value>> = cells.iter().map(|cell| Some(Value::from(*cell))).collect();
                engine.build_row(&raw, index + 1, index + 2)
            })
            .collect()
    }
}
