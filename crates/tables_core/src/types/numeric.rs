use super::{FieldType, ORDERED};
use crate::constraints::ConstraintKind;
use crate::field::Field;
use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;

/// Leading and trailing non-digits around a number; a `-` directly before
/// the first digit is kept as its sign.
static NON_BARE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\D*?(-?\d(?:.*\d)?)\D*$").expect("Invalid bare number regex"));

fn strip_non_bare(text: &str) -> String {
    NON_BARE_REGEX
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map_or_else(|| text.to_string(), |number| number.as_str().to_string())
}

/// Integral floats inside the `i64` range.
fn integral(n: f64) -> Option<i64> {
    // `i64::MAX as f64` is 2^63, one past the range.
    (n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64).then_some(n as i64)
}

/// Whole numbers.
#[derive(Debug, Clone)]
pub struct IntegerType {
    bare_number: bool,
}

impl IntegerType {
    pub fn from_field(field: &Field) -> Self {
        Self {
            bare_number: field.bare_number.unwrap_or(true),
        }
    }
}

impl FieldType for IntegerType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        match cell {
            Value::Integer(i) => Some(Value::Integer(*i)),
            Value::Number(n) => integral(*n).map(Value::Integer),
            Value::String(text) => {
                let text = if self.bare_number {
                    text.trim().to_string()
                } else {
                    strip_non_bare(text.trim())
                };
                text.parse::<i64>().ok().map(Value::Integer)
            }
            _ => None,
        }
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        value.as_i64().map(|i| i.to_string())
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        ORDERED
    }
}

/// Decimal numbers with configurable decimal and grouping characters.
#[derive(Debug, Clone)]
pub struct NumberType {
    bare_number: bool,
    decimal_char: String,
    group_char: String,
}

impl NumberType {
    pub fn from_field(field: &Field) -> Self {
        Self {
            bare_number: field.bare_number.unwrap_or(true),
            decimal_char: field.decimal_char.clone().unwrap_or_else(|| ".".to_string()),
            group_char: field.group_char.clone().unwrap_or_default(),
        }
    }

    fn normalize(&self, text: &str) -> Option<String> {
        let mut text = text.trim().to_string();
        if !self.group_char.is_empty() {
            text = text.replace(&self.group_char, "");
        }
        if self.decimal_char != "." {
            if text.contains('.') {
                return None;
            }
            text = text.replace(&self.decimal_char, ".");
        }
        if !self.bare_number {
            text = strip_non_bare(&text);
        }
        Some(text)
    }
}

impl FieldType for NumberType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        match cell {
            Value::Integer(i) => Some(Value::Number(*i as f64)),
            Value::Number(n) => Some(Value::Number(*n)),
            Value::String(text) => self.normalize(text)?.parse::<f64>().ok().map(Value::Number),
            _ => None,
        }
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        let text = value.as_f64()?.to_string();
        let (sign, unsigned) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text.as_str()),
        };
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (unsigned, None),
        };
        let mut out = String::from(sign);
        if self.group_char.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            out.push_str(int_part);
        } else {
            for (i, digit) in int_part.chars().enumerate() {
                if i > 0 && (int_part.len() - i) % 3 == 0 {
                    out.push_str(&self.group_char);
                }
                out.push(digit);
            }
        }
        if let Some(frac_part) = frac_part {
            out.push_str(&self.decimal_char);
            out.push_str(frac_part);
        }
        Some(out)
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        ORDERED
    }
}
