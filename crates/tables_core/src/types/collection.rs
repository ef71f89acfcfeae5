use super::geo::json_cell;
use super::{FieldType, SIZED};
use crate::constraints::ConstraintKind;
use crate::value::Value;

/// JSON arrays, native or encoded as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayType;

impl FieldType for ArrayType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        json_cell(cell).filter(|json| json.is_array()).map(Value::Json)
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        match value {
            Value::Json(json) if json.is_array() => Some(json.to_string()),
            _ => None,
        }
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        SIZED
    }
}

/// JSON objects, native or encoded as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectType;

impl FieldType for ObjectType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        json_cell(cell).filter(|json| json.is_object()).map(Value::Json)
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        match value {
            Value::Json(json) if json.is_object() => Some(json.to_string()),
            _ => None,
        }
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        SIZED
    }
}
