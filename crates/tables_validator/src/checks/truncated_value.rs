use super::Check;
use crate::error::{ErrorKind, ValidationError};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use tables_core::Value;

const TRUNCATED_STRING_LENGTHS: [usize; 1] = [255];

const TRUNCATED_INTEGER_VALUES: [i64; 6] = [
    // bigint
    9_223_372_036_854_775_807,
    // int
    4_294_967_295,
    2_147_483_647,
    // summed int
    2_097_152,
    // smallint
    65_535,
    32_767,
];

/// Reports values that look cut off at a storage limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TruncatedValue {}

impl TruncatedValue {
    pub fn new() -> Self {
        Self::default()
    }
}

fn truncated(cell: &Value) -> bool {
    match cell {
        Value::String(text) => TRUNCATED_STRING_LENGTHS.contains(&text.chars().count()),
        Value::Integer(value) => TRUNCATED_INTEGER_VALUES.contains(value),
        _ => false,
    }
}

impl Check for TruncatedValue {
    fn code(&self) -> &'static str {
        "truncated-value"
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        row.field_names()
            .iter()
            .zip(row.cells())
            .filter(|(_, cell)| cell.as_ref().is_some_and(truncated))
            .map(|(name, _)| row.cell_error(ErrorKind::TruncatedValue, "value is probably truncated", name))
            .collect()
    }
}
