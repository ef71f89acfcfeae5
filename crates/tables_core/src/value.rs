//! Logical cell values.
//!
//! Raw cells arriving from a source and typed cells produced by a field
//! reader share the same [`Value`] representation. A missing cell is
//! represented by `None` at the `Option<Value>` level, never by a variant.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;

/// A single cell value, either raw or typed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Time of day with an explicit UTC offset
    TimeTz(NaiveTime, FixedOffset),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
    Year(i32),
    YearMonth {
        year: i32,
        month: u32,
    },
    Duration(IsoDuration),
    GeoPoint {
        lon: f64,
        lat: f64,
    },
    /// Arrays, objects and GeoJSON geometries
    Json(JsonValue),
}

impl Value {
    /// Converts a native JSON value into a cell. JSON `null` maps to `None`.
    pub fn from_json(value: &JsonValue) -> Option<Value> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(b) => Some(Value::Boolean(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Integer(i)),
                None => n.as_f64().map(Value::Number),
            },
            JsonValue::String(s) => Some(Value::String(s.clone())),
            other => Some(Value::Json(other.clone())),
        }
    }

    /// Short name of the value's variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::Time(_) | Value::TimeTz(..) => "time",
            Value::DateTime(_) | Value::DateTimeTz(_) => "datetime",
            Value::Year(_) => "year",
            Value::YearMonth { .. } => "yearmonth",
            Value::Duration(_) => "duration",
            Value::GeoPoint { .. } => "geopoint",
            Value::Json(JsonValue::Array(_)) => "array",
            Value::Json(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of integers and numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether the value is numeric (integer or number).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Number(_))
    }

    /// Length for values that have one: characters of a string, items of an
    /// array or keys of an object.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Json(JsonValue::Array(items)) => Some(items.len()),
            Value::Json(JsonValue::Object(map)) => Some(map.len()),
            _ => None,
        }
    }

    /// Orders two values of compatible kinds. Integers and numbers compare
    /// with each other; everything else only compares within its own kind.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64()?.partial_cmp(&b.as_f64()?),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (Value::TimeTz(a, oa), Value::TimeTz(b, ob)) => {
                let a = *a - chrono::Duration::seconds(i64::from(oa.local_minus_utc()));
                let b = *b - chrono::Duration::seconds(i64::from(ob.local_minus_utc()));
                Some(a.cmp(&b))
            }
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::DateTimeTz(a), Value::DateTimeTz(b)) => Some(a.cmp(b)),
            (Value::Year(a), Value::Year(b)) => Some(a.cmp(b)),
            (
                Value::YearMonth { year, month },
                Value::YearMonth {
                    year: other_year,
                    month: other_month,
                },
            ) => Some((year, month).cmp(&(other_year, other_month))),
            (Value::Duration(a), Value::Duration(b)) => a.total_seconds().partial_cmp(&b.total_seconds()),
            _ => None,
        }
    }

    /// Canonical key used for equality in uniqueness and lookup sets.
    ///
    /// Integral numbers share a key with the equal integer so that `1` and
    /// `1.0` collide.
    pub fn key(&self) -> CellKey {
        let key = match self {
            Value::Integer(i) => format!("n:{i}"),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => format!("n:{}", *n as i64),
            Value::Number(n) => format!("n:{n}"),
            Value::String(s) => format!("s:{s}"),
            other => format!("{}:{}", other.kind(), other),
        };
        CellKey(key)
    }

    /// JSON rendering of the value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Integer(i) => JsonValue::from(*i),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(n.to_string())),
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Year(y) => JsonValue::from(*y),
            Value::GeoPoint { lon, lat } => serde_json::json!([lon, lat]),
            Value::Json(json) => json.clone(),
            other => JsonValue::String(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::TimeTz(t, offset) => write!(f, "{}{}", t.format("%H:%M:%S%.f"), offset),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::DateTimeTz(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f%:z")),
            Value::Year(y) => write!(f, "{y}"),
            Value::YearMonth { year, month } => write!(f, "{year:04}-{month:02}"),
            Value::Duration(d) => write!(f, "{d}"),
            Value::GeoPoint { lon, lat } => write!(f, "{lon},{lat}"),
            Value::Json(json) => write!(f, "{json}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

/// Hashable, totally ordered identity of a typed cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey(String);

/// An ISO 8601 duration such as `P1Y2M3DT4H5M6.5S`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IsoDuration {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: f64,
}

impl IsoDuration {
    /// Approximate length in seconds, counting a year as 365 days and a
    /// month as 30 days.
    pub fn total_seconds(&self) -> f64 {
        let days = f64::from(self.years) * 365.0 + f64::from(self.months) * 30.0 + f64::from(self.days);
        days * 86_400.0 + f64::from(self.hours) * 3_600.0 + f64::from(self.minutes) * 60.0 + self.seconds
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("P")?;
        if self.years > 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0.0 {
            f.write_str("T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0.0 {
                write!(f, "{}S", self.seconds)?;
            }
        } else if self.years == 0 && self.months == 0 && self.days == 0 {
            f.write_str("T0S")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from_json(&json!(null)), None);
        assert_eq!(Value::from_json(&json!(3)), Some(Value::Integer(3)));
        assert_eq!(Value::from_json(&json!(1.5)), Some(Value::Number(1.5)));
        assert_eq!(Value::from_json(&json!("a")), Some(Value::from("a")));
        assert_eq!(Value::from_json(&json!([1, 2])), Some(Value::Json(json!([1, 2]))));
    }

    #[test]
    fn test_numeric_keys_collide() {
        assert_eq!(Value::Integer(1).key(), Value::Number(1.0).key());
        assert_ne!(Value::Integer(1).key(), Value::from("1").key());
        assert_ne!(Value::Number(1.5).key(), Value::Integer(1).key());
    }

    #[test]
    fn test_compare() {
        assert_eq!(Value::Integer(2).compare(&Value::Number(2.5)), Some(Ordering::Less));
        assert_eq!(Value::from("b").compare(&Value::from("a")), Some(Ordering::Greater));
        assert_eq!(Value::Integer(1).compare(&Value::from("1")), None);
        let a = Value::YearMonth { year: 2020, month: 12 };
        let b = Value::YearMonth { year: 2021, month: 1 };
        assert_eq!(a.compare(&b), Some(Ordering::Less));
    }

    #[test]
    fn test_len() {
        assert_eq!(Value::from("héllo").len(), Some(5));
        assert_eq!(Value::Json(json!([1, 2, 3])).len(), Some(3));
        assert_eq!(Value::Integer(10).len(), None);
    }

    #[test]
    fn test_display() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-02-29");
        assert_eq!(Value::YearMonth { year: 2024, month: 3 }.to_string(), "2024-03");
        let duration = IsoDuration {
            days: 1,
            hours: 2,
            ..Default::default()
        };
        assert_eq!(Value::Duration(duration).to_string(), "P1DT2H");
        assert_eq!(IsoDuration::default().to_string(), "PT0S");
    }
}
