use super::{FieldType, BASE};
use crate::constraints::ConstraintKind;
use crate::field::Field;
use crate::value::Value;

pub(crate) const DEFAULT_TRUE_VALUES: [&str; 4] = ["true", "True", "TRUE", "1"];
pub(crate) const DEFAULT_FALSE_VALUES: [&str; 4] = ["false", "False", "FALSE", "0"];

/// Booleans spelled by configurable true/false vocabularies.
#[derive(Debug, Clone)]
pub struct BooleanType {
    true_values: Vec<String>,
    false_values: Vec<String>,
}

impl BooleanType {
    pub fn from_field(field: &Field) -> Self {
        let vocabulary = |configured: &Option<Vec<String>>, default: &[&str]| {
            configured
                .clone()
                .unwrap_or_else(|| default.iter().map(|v| v.to_string()).collect())
        };
        Self {
            true_values: vocabulary(&field.true_values, &DEFAULT_TRUE_VALUES),
            false_values: vocabulary(&field.false_values, &DEFAULT_FALSE_VALUES),
        }
    }
}

impl FieldType for BooleanType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        match cell {
            Value::Boolean(b) => Some(Value::Boolean(*b)),
            Value::String(text) => {
                if self.true_values.iter().any(|v| v == text) {
                    Some(Value::Boolean(true))
                } else if self.false_values.iter().any(|v| v == text) {
                    Some(Value::Boolean(false))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        let vocabulary = if value.as_bool()? {
            &self.true_values
        } else {
            &self.false_values
        };
        vocabulary.first().cloned()
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        BASE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary() {
        let ty = BooleanType::from_field(&Field::new("flag", "boolean"));
        assert_eq!(ty.read_value(&Value::from("TRUE")), Some(Value::Boolean(true)));
        assert_eq!(ty.read_value(&Value::from("0")), Some(Value::Boolean(false)));
        assert_eq!(ty.read_value(&Value::from("yes")), None);
        assert_eq!(ty.read_value(&Value::Integer(1)), None);
        assert_eq!(ty.write_value(&Value::Boolean(false)), Some("false".to_string()));
    }

    #[test]
    fn test_custom_vocabulary() {
        let mut field = Field::new("flag", "boolean");
        field.true_values = Some(vec!["yes".to_string()]);
        field.false_values = Some(vec!["no".to_string()]);
        let ty = BooleanType::from_field(&field);
        assert_eq!(ty.read_value(&Value::from("yes")), Some(Value::Boolean(true)));
        assert_eq!(ty.read_value(&Value::from("true")), None);
        assert_eq!(ty.write_value(&Value::Boolean(true)), Some("yes".to_string()));
    }
}
