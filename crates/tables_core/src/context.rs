//! Configuration for reading and validating tables.
//!
//! [`Dialect`] describes how a source lays out its rows (where the header
//! is, how multi-row headers are joined, which rows are comments).
//! [`Detector`] controls how the header is reconciled with the schema.
//! [`ValidationContext`] carries run-wide options such as error and row
//! limits and the field type registry.

use crate::types::TypeRegistry;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error limit applied when none is configured.
pub const DEFAULT_LIMIT_ERRORS: usize = 1000;

fn default_header_rows() -> Vec<usize> {
    vec![1]
}

fn default_header_join() -> String {
    " ".to_string()
}

fn default_true() -> bool {
    true
}

/// Row layout of a tabular source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialect {
    /// 1-based row positions holding header labels; empty means no header
    #[serde(default = "default_header_rows")]
    pub header_rows: Vec<usize>,

    /// Separator used to join labels of multi-row headers
    #[serde(default = "default_header_join")]
    pub header_join: String,

    /// Whether label comparison is case-sensitive
    #[serde(default = "default_true")]
    pub header_case: bool,

    /// Rows whose first cell starts with this prefix are skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_char: Option<String>,

    /// 1-based row positions that are skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment_rows: Vec<usize>,
}

impl Dialect {
    pub fn new() -> Self {
        Self {
            header_rows: default_header_rows(),
            header_join: default_header_join(),
            header_case: true,
            comment_char: None,
            comment_rows: Vec::new(),
        }
    }

    /// A dialect for sources without a header row.
    pub fn headerless() -> Self {
        Self {
            header_rows: Vec::new(),
            ..Self::new()
        }
    }

    pub fn with_header_rows(mut self, header_rows: Vec<usize>) -> Self {
        self.header_rows = header_rows;
        self
    }

    pub fn with_header_join(mut self, header_join: impl Into<String>) -> Self {
        self.header_join = header_join.into();
        self
    }

    pub fn with_header_case(mut self, header_case: bool) -> Self {
        self.header_case = header_case;
        self
    }

    pub fn with_comment_char(mut self, comment_char: impl Into<String>) -> Self {
        self.comment_char = Some(comment_char.into());
        self
    }

    pub fn with_comment_rows(mut self, comment_rows: Vec<usize>) -> Self {
        self.comment_rows = comment_rows;
        self
    }

    /// Whether the source has a header at all.
    pub fn has_header(&self) -> bool {
        !self.header_rows.is_empty()
    }

    /// Position of the last header row, or 0 without a header.
    pub fn last_header_row(&self) -> usize {
        self.header_rows.iter().copied().max().unwrap_or(0)
    }

    /// Whether a data row at `position` should be skipped as a comment.
    pub fn is_comment(&self, position: usize, cells: &[Option<Value>]) -> bool {
        if self.comment_rows.contains(&position) {
            return true;
        }
        match (&self.comment_char, cells.first()) {
            (Some(prefix), Some(Some(Value::String(first)))) => first.starts_with(prefix.as_str()),
            _ => false,
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::new()
    }
}

/// Header reconciliation options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detector {
    /// Match schema fields to labels by name instead of by position
    #[serde(default)]
    pub schema_sync: bool,
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema_sync(mut self, schema_sync: bool) -> Self {
        self.schema_sync = schema_sync;
        self
    }
}

/// Context for validation operations.
///
/// Provides run-wide options shared by every table of a validation run.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Maximum number of errors per table; 0 disables the limit
    pub limit_errors: usize,

    /// Maximum number of data rows read per table
    pub limit_rows: Option<usize>,

    pub detector: Detector,

    /// Field types available to schemas
    pub registry: Arc<TypeRegistry>,
}

impl ValidationContext {
    /// Creates a new validation context with default settings.
    pub fn new() -> Self {
        Self {
            limit_errors: DEFAULT_LIMIT_ERRORS,
            limit_rows: None,
            detector: Detector::default(),
            registry: Arc::new(TypeRegistry::new()),
        }
    }

    /// Sets the per-table error limit.
    pub fn with_limit_errors(mut self, limit_errors: usize) -> Self {
        self.limit_errors = limit_errors;
        self
    }

    /// Sets the per-table row limit.
    pub fn with_limit_rows(mut self, limit_rows: usize) -> Self {
        self.limit_rows = Some(limit_rows);
        self
    }

    /// Sets the header detector options.
    pub fn with_detector(mut self, detector: Detector) -> Self {
        self.detector = detector;
        self
    }

    /// Replaces the field type registry.
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new()
    }
}
