use super::Check;
use crate::error::{ErrorKind, ValidationError};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use tables_core::Value;

/// Reports string cells with non-ASCII characters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsciiValue {}

impl AsciiValue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Check for AsciiValue {
    fn code(&self) -> &'static str {
        "ascii-value"
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        row.field_names()
            .iter()
            .zip(row.cells())
            .filter(|(_, cell)| matches!(cell, Some(Value::String(text)) if !text.is_ascii()))
            .map(|(name, _)| row.cell_error(ErrorKind::AsciiValue, "the cell contains non-ascii characters", name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::tests_support::rows;

    #[test]
    fn test_ascii_value() {
        let rows = rows(&[("id", "integer"), ("name", "string")], &[&["1", "english"], &["2", "中国人"]]);
        let mut check = AsciiValue::new();
        assert!(check.validate_row(&rows[0]).is_empty());
        let errors = check.validate_row(&rows[1]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_name(), Some("name"));
        assert_eq!(errors[0].code(), "ascii-value");
    }
}
