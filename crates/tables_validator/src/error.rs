//! Error types for validation operations.
//!
//! Validation problems are *data*: a [`ValidationError`] carries a stable
//! type code, the tags of its category and the positional context needed to
//! address it (row, field, label). Every kind belongs to one category whose
//! tags are used for pick/skip filtering:
//!
//! | category | tags                           |
//! |----------|--------------------------------|
//! | general  | none                           |
//! | table    | `#table`                       |
//! | header   | `#table #header`               |
//! | label    | `#table #header #label`        |
//! | row      | `#table #row`                  |
//! | cell     | `#table #row #cell`            |

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;
use tables_core::TableError;

/// Category of an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    General,
    Table,
    Header,
    Label,
    Row,
    Cell,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 6] = [
        ErrorCategory::General,
        ErrorCategory::Table,
        ErrorCategory::Header,
        ErrorCategory::Label,
        ErrorCategory::Row,
        ErrorCategory::Cell,
    ];

    /// Stable code of the category itself.
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::General => "general-error",
            ErrorCategory::Table => "table-error",
            ErrorCategory::Header => "header-error",
            ErrorCategory::Label => "label-error",
            ErrorCategory::Row => "row-error",
            ErrorCategory::Cell => "cell-error",
        }
    }

    pub fn tags(self) -> &'static [&'static str] {
        match self {
            ErrorCategory::General => &[],
            ErrorCategory::Table => &["#table"],
            ErrorCategory::Header => &["#table", "#header"],
            ErrorCategory::Label => &["#table", "#header", "#label"],
            ErrorCategory::Row => &["#table", "#row"],
            ErrorCategory::Cell => &["#table", "#row", "#cell"],
        }
    }
}

/// Concrete error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    General,
    Task,
    Check,
    Schema,
    Field,
    Source,
    Resource,
    TableDimensions,
    DeviatedValue,
    BlankHeader,
    ExtraLabel,
    MissingLabel,
    BlankLabel,
    DuplicateLabel,
    IncorrectLabel,
    BlankRow,
    PrimaryKey,
    ForeignKey,
    DuplicateRow,
    RowConstraint,
    ExtraCell,
    MissingCell,
    TypeError,
    ConstraintError,
    UniqueError,
    TruncatedValue,
    ForbiddenValue,
    SequentialValue,
    AsciiValue,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 29] = [
        ErrorKind::General,
        ErrorKind::Task,
        ErrorKind::Check,
        ErrorKind::Schema,
        ErrorKind::Field,
        ErrorKind::Source,
        ErrorKind::Resource,
        ErrorKind::TableDimensions,
        ErrorKind::DeviatedValue,
        ErrorKind::BlankHeader,
        ErrorKind::ExtraLabel,
        ErrorKind::MissingLabel,
        ErrorKind::BlankLabel,
        ErrorKind::DuplicateLabel,
        ErrorKind::IncorrectLabel,
        ErrorKind::BlankRow,
        ErrorKind::PrimaryKey,
        ErrorKind::ForeignKey,
        ErrorKind::DuplicateRow,
        ErrorKind::RowConstraint,
        ErrorKind::ExtraCell,
        ErrorKind::MissingCell,
        ErrorKind::TypeError,
        ErrorKind::ConstraintError,
        ErrorKind::UniqueError,
        ErrorKind::TruncatedValue,
        ErrorKind::ForbiddenValue,
        ErrorKind::SequentialValue,
        ErrorKind::AsciiValue,
    ];

    /// Stable type code.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::General => "general-error",
            ErrorKind::Task => "task-error",
            ErrorKind::Check => "check-error",
            ErrorKind::Schema => "schema-error",
            ErrorKind::Field => "field-error",
            ErrorKind::Source => "source-error",
            ErrorKind::Resource => "resource-error",
            ErrorKind::TableDimensions => "table-dimensions",
            ErrorKind::DeviatedValue => "deviated-value",
            ErrorKind::BlankHeader => "blank-header",
            ErrorKind::ExtraLabel => "extra-label",
            ErrorKind::MissingLabel => "missing-label",
            ErrorKind::BlankLabel => "blank-label",
            ErrorKind::DuplicateLabel => "duplicate-label",
            ErrorKind::IncorrectLabel => "incorrect-label",
            ErrorKind::BlankRow => "blank-row",
            ErrorKind::PrimaryKey => "primary-key",
            ErrorKind::ForeignKey => "foreign-key",
            ErrorKind::DuplicateRow => "duplicate-row",
            ErrorKind::RowConstraint => "row-constraint",
            ErrorKind::ExtraCell => "extra-cell",
            ErrorKind::MissingCell => "missing-cell",
            ErrorKind::TypeError => "type-error",
            ErrorKind::ConstraintError => "constraint-error",
            ErrorKind::UniqueError => "unique-error",
            ErrorKind::TruncatedValue => "truncated-value",
            ErrorKind::ForbiddenValue => "forbidden-value",
            ErrorKind::SequentialValue => "sequential-value",
            ErrorKind::AsciiValue => "ascii-value",
        }
    }

    /// Looks a kind up by its type code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorKind::General
            | ErrorKind::Task
            | ErrorKind::Check
            | ErrorKind::Schema
            | ErrorKind::Field
            | ErrorKind::Source
            | ErrorKind::Resource => ErrorCategory::General,
            ErrorKind::TableDimensions | ErrorKind::DeviatedValue => ErrorCategory::Table,
            ErrorKind::BlankHeader => ErrorCategory::Header,
            ErrorKind::ExtraLabel
            | ErrorKind::MissingLabel
            | ErrorKind::BlankLabel
            | ErrorKind::DuplicateLabel
            | ErrorKind::IncorrectLabel => ErrorCategory::Label,
            ErrorKind::BlankRow
            | ErrorKind::PrimaryKey
            | ErrorKind::ForeignKey
            | ErrorKind::DuplicateRow
            | ErrorKind::RowConstraint => ErrorCategory::Row,
            ErrorKind::ExtraCell
            | ErrorKind::MissingCell
            | ErrorKind::TypeError
            | ErrorKind::ConstraintError
            | ErrorKind::UniqueError
            | ErrorKind::TruncatedValue
            | ErrorKind::ForbiddenValue
            | ErrorKind::SequentialValue
            | ErrorKind::AsciiValue => ErrorCategory::Cell,
        }
    }

    pub fn tags(self) -> &'static [&'static str] {
        self.category().tags()
    }

    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::General => "General Error",
            ErrorKind::Task => "Task Error",
            ErrorKind::Check => "Check Error",
            ErrorKind::Schema => "Schema Error",
            ErrorKind::Field => "Field Error",
            ErrorKind::Source => "Source Error",
            ErrorKind::Resource => "Resource Error",
            ErrorKind::TableDimensions => "Table dimensions error",
            ErrorKind::DeviatedValue => "Deviated Value",
            ErrorKind::BlankHeader => "Blank Header",
            ErrorKind::ExtraLabel => "Extra Label",
            ErrorKind::MissingLabel => "Missing Label",
            ErrorKind::BlankLabel => "Blank Label",
            ErrorKind::DuplicateLabel => "Duplicate Label",
            ErrorKind::IncorrectLabel => "Incorrect Label",
            ErrorKind::BlankRow => "Blank Row",
            ErrorKind::PrimaryKey => "PrimaryKey Error",
            ErrorKind::ForeignKey => "ForeignKey Error",
            ErrorKind::DuplicateRow => "Duplicate Row",
            ErrorKind::RowConstraint => "Row Constraint",
            ErrorKind::ExtraCell => "Extra Cell",
            ErrorKind::MissingCell => "Missing Cell",
            ErrorKind::TypeError => "Type Error",
            ErrorKind::ConstraintError => "Constraint Error",
            ErrorKind::UniqueError => "Unique Error",
            ErrorKind::TruncatedValue => "Truncated Value",
            ErrorKind::ForbiddenValue => "Forbidden Value",
            ErrorKind::SequentialValue => "Sequential Value",
            ErrorKind::AsciiValue => "Ascii Value",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::General => "There is an error.",
            ErrorKind::Task => "General task-level error.",
            ErrorKind::Check => "Provided check is not valid.",
            ErrorKind::Schema => "Provided schema is not valid.",
            ErrorKind::Field => "Provided field is not valid.",
            ErrorKind::Source => "Data reading error because of not supported or inconsistent contents.",
            ErrorKind::Resource => "A validation cannot be processed.",
            ErrorKind::TableDimensions => "This delimitation does not conform to the table dimensions constraint.",
            ErrorKind::DeviatedValue => "The value is deviated.",
            ErrorKind::BlankHeader => "This header is empty. A header should contain at least one value.",
            ErrorKind::ExtraLabel => {
                "The header of the data source contains label that does not exist in the provided schema."
            }
            ErrorKind::MissingLabel => {
                "Based on the schema there should be a label that is missing in the data's header."
            }
            ErrorKind::BlankLabel => {
                "A label in the header row is missing a value. Label should be provided and not be blank."
            }
            ErrorKind::DuplicateLabel => {
                "Two columns in the header row have the same value. Column names should be unique."
            }
            ErrorKind::IncorrectLabel => "One of the data source header does not match the field name defined in the schema.",
            ErrorKind::BlankRow => "This row is empty. A row should contain at least one value.",
            ErrorKind::PrimaryKey => "Values in the primary key fields should be unique for every row",
            ErrorKind::ForeignKey => "Values in the foreign key fields should exist in the reference table",
            ErrorKind::DuplicateRow => "The row is duplicated.",
            ErrorKind::RowConstraint => "The value does not conform to the row constraint.",
            ErrorKind::ExtraCell => {
                "This row has more values compared to the header row (the first row in the data source). \
                 A key concept is that all the rows in tabular data must have the same number of columns."
            }
            ErrorKind::MissingCell => {
                "This row has less values compared to the header row (the first row in the data source). \
                 A key concept is that all the rows in tabular data must have the same number of columns."
            }
            ErrorKind::TypeError => "The value does not match the schema type and format for this field.",
            ErrorKind::ConstraintError => "A field value does not conform to a constraint.",
            ErrorKind::UniqueError => {
                "This field is a unique field but it contains a value that has been used in another row."
            }
            ErrorKind::TruncatedValue => "The value is possible truncated.",
            ErrorKind::ForbiddenValue => "The value is forbidden.",
            ErrorKind::SequentialValue => "The value is not sequential.",
            ErrorKind::AsciiValue => "The cell contains non-ascii characters.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Row addressing shared by row and cell errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowContext {
    /// Raw cells of the row rendered as text
    pub cells: Vec<String>,
    pub row_number: usize,
    pub row_position: usize,
}

/// Field addressing of a cell error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellContext {
    pub cell: String,
    pub field_name: String,
    pub field_number: usize,
    pub field_position: usize,
}

/// Foreign key details of a `foreign-key` error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyContext {
    /// Reference resource name, empty for a self-reference
    pub source_name: String,
    pub source_keys: Vec<String>,
    pub target_keys: Vec<String>,
    /// Offending row values projected on the local key fields
    pub target_cells: Vec<String>,
}

/// A single validation error with its positional context.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub note: String,

    /// Header labels (header and label errors)
    pub labels: Option<Vec<String>>,
    /// Header row positions (header and label errors)
    pub row_numbers: Option<Vec<usize>>,
    pub label: Option<String>,

    pub row: Option<RowContext>,
    pub cell: Option<CellContext>,

    /// Field addressing of label errors
    pub field_name: Option<String>,
    pub field_number: Option<usize>,

    pub foreign_key: Option<ForeignKeyContext>,

    /// Configured limits of a `table-dimensions` error
    pub limits: Option<BTreeMap<String, usize>>,
}

impl ValidationError {
    fn bare(kind: ErrorKind, note: impl Into<String>) -> Self {
        Self {
            kind,
            note: note.into(),
            labels: None,
            row_numbers: None,
            label: None,
            row: None,
            cell: None,
            field_name: None,
            field_number: None,
            foreign_key: None,
            limits: None,
        }
    }

    /// A general or table-level error without row context.
    pub fn general(kind: ErrorKind, note: impl Into<String>) -> Self {
        Self::bare(kind, note)
    }

    /// Converts a fatal error into a reportable one.
    pub fn from_table_error(error: &TableError) -> Self {
        let kind = match error {
            TableError::Schema(_) => ErrorKind::Schema,
            TableError::Field(_) => ErrorKind::Field,
            TableError::Check(_) => ErrorKind::Check,
            TableError::Source(_) => ErrorKind::Source,
            TableError::Resource(_) => ErrorKind::Resource,
            TableError::Serialization(_) | TableError::General(_) => ErrorKind::General,
        };
        Self::bare(kind, error.note())
    }

    /// An error about the header as a whole.
    pub fn header(kind: ErrorKind, note: impl Into<String>, labels: &[String], row_numbers: &[usize]) -> Self {
        let mut error = Self::bare(kind, note);
        error.labels = Some(labels.to_vec());
        error.row_numbers = Some(row_numbers.to_vec());
        error
    }

    /// An error about one header label.
    pub fn label(
        kind: ErrorKind,
        note: impl Into<String>,
        labels: &[String],
        row_numbers: &[usize],
        label: impl Into<String>,
        field_name: impl Into<String>,
        field_number: usize,
    ) -> Self {
        let mut error = Self::header(kind, note, labels, row_numbers);
        error.label = Some(label.into());
        error.field_name = Some(field_name.into());
        error.field_number = Some(field_number);
        error
    }

    /// An error about a whole row.
    pub fn row(kind: ErrorKind, note: impl Into<String>, row: &RowContext) -> Self {
        let mut error = Self::bare(kind, note);
        error.row = Some(row.clone());
        error
    }

    /// An error about one cell of a row.
    pub fn cell(kind: ErrorKind, note: impl Into<String>, row: &RowContext, cell: CellContext) -> Self {
        let mut error = Self::row(kind, note, row);
        error.cell = Some(cell);
        error
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyContext) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }

    pub fn with_limits(mut self, limits: BTreeMap<String, usize>) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn tags(&self) -> &'static [&'static str] {
        self.kind.tags()
    }

    pub fn row_number(&self) -> Option<usize> {
        self.row.as_ref().map(|row| row.row_number)
    }

    pub fn row_position(&self) -> Option<usize> {
        self.row.as_ref().map(|row| row.row_position)
    }

    pub fn field_name(&self) -> Option<&str> {
        self.cell
            .as_ref()
            .map(|cell| cell.field_name.as_str())
            .or(self.field_name.as_deref())
    }

    pub fn field_number(&self) -> Option<usize> {
        self.cell.as_ref().map(|cell| cell.field_number).or(self.field_number)
    }

    /// Whether the error matches a type code or a `#tag`.
    pub fn matches(&self, selector: &str) -> bool {
        if selector.starts_with('#') {
            self.tags().contains(&selector)
        } else {
            self.code() == selector || self.kind.category().code() == selector
        }
    }

    /// Human-readable message rendered from the kind's template.
    pub fn message(&self) -> String {
        let row_number = opt(self.row_number());
        let field_name = self.field_name().unwrap_or_default();
        let field_number = opt(self.field_number());
        let cell = self.cell.as_ref().map(|c| c.cell.as_str()).unwrap_or_default();
        let label = self.label.as_deref().unwrap_or_default();
        let note = &self.note;
        match self.kind {
            ErrorKind::General => format!("General error: {note}"),
            ErrorKind::Task => format!("The task has an error: {note}"),
            ErrorKind::Check => format!("Check is not valid: {note}"),
            ErrorKind::Schema => format!("Schema is not valid: {note}"),
            ErrorKind::Field => format!("Field is not valid: {note}"),
            ErrorKind::Source => {
                format!("The data source has not supported or has inconsistent contents: {note}")
            }
            ErrorKind::Resource => format!("The data resource has an error: {note}"),
            ErrorKind::TableDimensions => format!("The data source does not have the required dimensions: {note}"),
            ErrorKind::DeviatedValue => format!("There is a possible error because the value is deviated: {note}"),
            ErrorKind::BlankHeader => "Header is completely blank".to_string(),
            ErrorKind::ExtraLabel => {
                format!("There is an extra label \"{label}\" in header at position \"{field_number}\"")
            }
            ErrorKind::MissingLabel => format!(
                "There is a missing label in the header's field \"{field_name}\" at position \"{field_number}\""
            ),
            ErrorKind::BlankLabel => {
                format!("Label in the header in field at position \"{field_number}\" is blank")
            }
            ErrorKind::DuplicateLabel => format!(
                "Label \"{label}\" in the header at position \"{field_number}\" is duplicated to a label: {note}"
            ),
            ErrorKind::IncorrectLabel => format!(
                "Label \"{label}\" in field {field_name} at position \"{field_number}\" does not match the field name in the schema"
            ),
            ErrorKind::BlankRow => format!("Row at position \"{row_number}\" is completely blank"),
            ErrorKind::PrimaryKey => {
                format!("Row at position \"{row_number}\" violates the primary key: {note}")
            }
            ErrorKind::ForeignKey => {
                format!("Row at position \"{row_number}\" violates the foreign key: {note}")
            }
            ErrorKind::DuplicateRow => format!("Row at position {row_number} is duplicated: {note}"),
            ErrorKind::RowConstraint => {
                format!("The row at position {row_number} has an error: {note}")
            }
            ErrorKind::ExtraCell => format!(
                "Row at position \"{row_number}\" has an extra value in field at position \"{field_number}\""
            ),
            ErrorKind::MissingCell => format!(
                "Row at position \"{row_number}\" has a missing cell in field \"{field_name}\" at position \"{field_number}\""
            ),
            ErrorKind::TypeError => format!(
                "Type error in the cell \"{cell}\" in row \"{row_number}\" and field \"{field_name}\" at position \"{field_number}\": {note}"
            ),
            ErrorKind::ConstraintError => format!(
                "The cell \"{cell}\" in row at position \"{row_number}\" and field \"{field_name}\" at position \"{field_number}\" does not conform to a constraint: {note}"
            ),
            ErrorKind::UniqueError => format!(
                "Row at position \"{row_number}\" has unique constraint violation in field \"{field_name}\" at position \"{field_number}\": {note}"
            ),
            ErrorKind::TruncatedValue
            | ErrorKind::ForbiddenValue
            | ErrorKind::SequentialValue
            | ErrorKind::AsciiValue => format!(
                "The cell {cell} in row at position {row_number} and field {field_name} at position {field_number} has an error: {note}"
            ),
        }
    }

    /// Value of a context property addressed by its camelCase name, or
    /// `null` when the error does not carry it.
    pub fn get(&self, property: &str) -> JsonValue {
        match property {
            "type" => json!(self.code()),
            "title" => json!(self.kind.title()),
            "description" => json!(self.kind.description()),
            "message" => json!(self.message()),
            "tags" => json!(self.tags()),
            "note" => json!(self.note),
            "labels" => json!(self.labels),
            "rowNumbers" => json!(self.row_numbers),
            "label" => json!(self.label),
            "cells" => json!(self.row.as_ref().map(|row| &row.cells)),
            "rowNumber" => json!(self.row_number()),
            "rowPosition" => json!(self.row_position()),
            "cell" => json!(self.cell.as_ref().map(|cell| &cell.cell)),
            "fieldName" => json!(self.field_name()),
            "fieldNumber" => json!(self.field_number()),
            "fieldPosition" => json!(self.cell.as_ref().map(|cell| cell.field_position)),
            "sourceName" => json!(self.foreign_key.as_ref().map(|fk| &fk.source_name)),
            "sourceKeys" => json!(self.foreign_key.as_ref().map(|fk| &fk.source_keys)),
            "targetKeys" => json!(self.foreign_key.as_ref().map(|fk| &fk.target_keys)),
            "targetCells" => json!(self.foreign_key.as_ref().map(|fk| &fk.target_cells)),
            "limits" => json!(self.limits),
            _ => JsonValue::Null,
        }
    }

    /// Serializable descriptor with only the properties this error carries.
    pub fn to_descriptor(&self) -> serde_json::Map<String, JsonValue> {
        const PROPERTIES: [&str; 21] = [
            "type",
            "title",
            "description",
            "message",
            "tags",
            "note",
            "labels",
            "rowNumbers",
            "label",
            "cells",
            "rowNumber",
            "rowPosition",
            "cell",
            "fieldName",
            "fieldNumber",
            "fieldPosition",
            "sourceName",
            "sourceKeys",
            "targetKeys",
            "targetCells",
            "limits",
        ];
        PROPERTIES
            .into_iter()
            .filter_map(|name| {
                let value = self.get(name);
                (!value.is_null()).then(|| (name.to_string(), value))
            })
            .collect()
    }
}

fn opt(value: Option<usize>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let descriptor = self.to_descriptor();
        let mut map = serializer.serialize_map(Some(descriptor.len()))?;
        for (key, value) in &descriptor {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
