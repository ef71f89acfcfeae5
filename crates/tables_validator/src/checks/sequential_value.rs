use super::{require_field, Check};
use crate::error::{ErrorKind, ValidationError};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use tables_core::Schema;

/// Reports the first cell of an integer field that does not continue the
/// sequence started by the first row. Stops after one error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequentialValue {
    pub field_name: String,

    /// Next expected value; `None` once started means the sequence ran
    /// past `i64::MAX`.
    #[serde(skip)]
    cursor: Option<i64>,

    #[serde(skip)]
    started: bool,

    #[serde(skip)]
    exited: bool,
}

impl SequentialValue {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            cursor: None,
            started: false,
            exited: false,
        }
    }
}

impl Check for SequentialValue {
    fn code(&self) -> &'static str {
        "sequential-value"
    }

    fn validate_start(&mut self, schema: &Schema) -> Vec<ValidationError> {
        require_field(schema, "sequential value", &self.field_name).into_iter().collect()
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        if self.exited {
            return Vec::new();
        }
        let cell = row.get(&self.field_name).and_then(|cell| cell.as_i64());
        let expected = if self.started { self.cursor } else { cell };
        match (cell, expected) {
            (Some(cell), Some(expected)) if cell == expected => {
                self.started = true;
                self.cursor = cell.checked_add(1);
                Vec::new()
            }
            _ => {
                self.exited = true;
                vec![row.cell_error(ErrorKind::SequentialValue, "the value is not sequential", &self.field_name)]
            }
        }
    }
}
