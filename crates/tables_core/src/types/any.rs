use super::{FieldType, BASE};
use crate::constraints::ConstraintKind;
use crate::value::Value;

/// Accepts every cell unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyType;

impl FieldType for AnyType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        Some(cell.clone())
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        Some(value.to_string())
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        BASE
    }
}
