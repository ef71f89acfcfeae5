use super::{require_field, Check};
use crate::error::{ErrorKind, ValidationError};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tables_core::{CellKey, Schema, Value};

/// Reports cells of one field holding a forbidden value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForbiddenValue {
    pub field_name: String,
    pub values: Vec<JsonValue>,

    #[serde(skip)]
    keys: Vec<CellKey>,
}

impl ForbiddenValue {
    pub fn new(field_name: impl Into<String>, values: Vec<JsonValue>) -> Self {
        Self {
            field_name: field_name.into(),
            values,
            keys: Vec::new(),
        }
    }
}

impl Check for ForbiddenValue {
    fn code(&self) -> &'static str {
        "forbidden-value"
    }

    fn validate_start(&mut self, schema: &Schema) -> Vec<ValidationError> {
        self.keys = self.values.iter().filter_map(Value::from_json).map(|value| value.key()).collect();
        require_field(schema, "forbidden value", &self.field_name).into_iter().collect()
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        let Some(cell) = row.get(&self.field_name) else {
            return Vec::new();
        };
        if !self.keys.contains(&cell.key()) {
            return Vec::new();
        }
        let note = format!("forbidden values are \"{}\"", JsonValue::Array(self.values.clone()));
        vec![row.cell_error(ErrorKind::ForbiddenValue, note, &self.field_name)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::tests_support::{rows, schema};
    use serde_json::json;

    #[test]
    fn test_forbidden_value() {
        let fields = [("id", "integer"), ("name", "string")];
        let rows = rows(&fields, &[&["1", "ok"], &["2", "bad"]]);
        let mut check = ForbiddenValue::new("name", vec![json!("bad"), json!(3)]);
        assert!(check.validate_start(&schema(&fields)).is_empty());
        assert!(check.validate_row(&rows[0]).is_empty());
        let errors = check.validate_row(&rows[1]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].note, "forbidden values are \"[\"bad\",3]\"");
    }

    #[test]
    fn test_forbidden_integer() {
        let fields = [("id", "integer")];
        let rows = rows(&fields, &[&["3"]]);
        let mut check = ForbiddenValue::new("id", vec![json!(3)]);
        check.validate_start(&schema(&fields));
        assert_eq!(check.validate_row(&rows[0]).len(), 1);
    }

    #[test]
    fn test_missing_field() {
        let mut check = ForbiddenValue::new("nope", vec![]);
        let errors = check.validate_start(&schema(&[("id", "integer")]));
        assert_eq!(errors[0].code(), "check-error");
        assert_eq!(errors[0].note, "forbidden value check requires field \"nope\" to exist");
    }
}
