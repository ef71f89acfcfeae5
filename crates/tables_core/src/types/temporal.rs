use super::{FieldType, ORDERED};
use crate::constraints::ConstraintKind;
use crate::field::Field;
use crate::value::{IsoDuration, Value};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

const ANY_DATE_PATTERNS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y", "%d-%m-%Y", "%Y%m%d", "%d %B %Y",
    "%B %d, %Y", "%d %b %Y", "%b %d, %Y",
];

const ANY_TIME_PATTERNS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p", "%H%M%S"];

const ANY_DATETIME_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y%m%dT%H%M%S",
];

/// How a temporal field spells its values.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TemporalFormat {
    /// ISO 8601
    Default,
    /// Any recognizable spelling
    Any,
    /// An strftime-style pattern
    Pattern(String),
}

impl TemporalFormat {
    fn from_field(field: &Field) -> Self {
        match field.format.as_str() {
            "" | "default" => TemporalFormat::Default,
            "any" => TemporalFormat::Any,
            pattern => TemporalFormat::Pattern(pattern.strip_prefix("fmt:").unwrap_or(pattern).to_string()),
        }
    }
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, digits) = match text.chars().next()? {
        '+' => (1, &text[1..]),
        '-' => (-1, &text[1..]),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Splits a trailing `Z`, `+HH:MM` or `+HHMM` from a time.
fn split_offset(text: &str) -> (&str, Option<FixedOffset>) {
    if let Some(head) = text.strip_suffix('Z') {
        return (head, FixedOffset::east_opt(0));
    }
    for width in [6, 5] {
        if text.len() > width && text.is_char_boundary(text.len() - width) {
            let (head, tail) = text.split_at(text.len() - width);
            if let Some(offset) = parse_offset(tail) {
                return (head, Some(offset));
            }
        }
    }
    (text, None)
}

fn with_offset(naive: NaiveDateTime, offset: Option<FixedOffset>) -> Option<Value> {
    match offset {
        Some(offset) => offset.from_local_datetime(&naive).single().map(Value::DateTimeTz),
        None => Some(Value::DateTime(naive)),
    }
}

/// Calendar dates.
#[derive(Debug, Clone)]
pub struct DateType {
    format: TemporalFormat,
}

impl DateType {
    pub fn from_field(field: &Field) -> Self {
        Self {
            format: TemporalFormat::from_field(field),
        }
    }
}

impl FieldType for DateType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        let text = match cell {
            Value::Date(date) => return Some(Value::Date(*date)),
            Value::DateTime(dt) if dt.time() == NaiveTime::MIN => return Some(Value::Date(dt.date())),
            Value::String(text) => text.trim(),
            _ => return None,
        };
        let date = match &self.format {
            TemporalFormat::Default => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok(),
            TemporalFormat::Any => ANY_DATE_PATTERNS
                .iter()
                .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok()),
            TemporalFormat::Pattern(pattern) => NaiveDate::parse_from_str(text, pattern).ok(),
        };
        date.map(Value::Date)
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        let Value::Date(date) = value else {
            return None;
        };
        Some(match &self.format {
            TemporalFormat::Pattern(pattern) => date.format(pattern).to_string(),
            _ => date.format("%Y-%m-%d").to_string(),
        })
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        ORDERED
    }
}

/// Times of day, optionally with a UTC offset.
#[derive(Debug, Clone)]
pub struct TimeType {
    format: TemporalFormat,
}

impl TimeType {
    pub fn from_field(field: &Field) -> Self {
        Self {
            format: TemporalFormat::from_field(field),
        }
    }
}

impl FieldType for TimeType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        let text = match cell {
            Value::Time(_) | Value::TimeTz(..) => return Some(cell.clone()),
            Value::String(text) => text.trim(),
            _ => return None,
        };
        match &self.format {
            TemporalFormat::Default => {
                let (body, offset) = split_offset(text);
                let time = NaiveTime::parse_from_str(body, "%H:%M:%S%.f").ok()?;
                Some(match offset {
                    Some(offset) => Value::TimeTz(time, offset),
                    None => Value::Time(time),
                })
            }
            TemporalFormat::Any => ANY_TIME_PATTERNS
                .iter()
                .find_map(|pattern| NaiveTime::parse_from_str(text, pattern).ok())
                .map(Value::Time),
            TemporalFormat::Pattern(pattern) => NaiveTime::parse_from_str(text, pattern).ok().map(Value::Time),
        }
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        let pattern = match &self.format {
            TemporalFormat::Pattern(pattern) => pattern.as_str(),
            _ => "%H:%M:%S",
        };
        match value {
            Value::Time(time) => Some(time.format(pattern).to_string()),
            Value::TimeTz(time, offset) => Some(format!("{}{}", time.format(pattern), offset)),
            _ => None,
        }
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        ORDERED
    }
}

/// Date and time, optionally with a UTC offset.
#[derive(Debug, Clone)]
pub struct DateTimeType {
    format: TemporalFormat,
}

impl DateTimeType {
    pub fn from_field(field: &Field) -> Self {
        Self {
            format: TemporalFormat::from_field(field),
        }
    }

    fn read_default(text: &str) -> Option<Value> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(Value::DateTimeTz(dt));
        }
        let (body, offset) = split_offset(text);
        let naive = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        with_offset(naive, offset)
    }

    fn read_any(text: &str) -> Option<Value> {
        if let Some(value) = Self::read_default(text) {
            return Some(value);
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
            return Some(Value::DateTimeTz(dt));
        }
        let (body, offset) = split_offset(text);
        if let Some(naive) = ANY_DATETIME_PATTERNS
            .iter()
            .find_map(|pattern| NaiveDateTime::parse_from_str(body, pattern).ok())
        {
            return with_offset(naive, offset);
        }
        ANY_DATE_PATTERNS
            .iter()
            .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
            .map(|date| Value::DateTime(date.and_time(NaiveTime::MIN)))
    }
}

impl FieldType for DateTimeType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        let text = match cell {
            Value::DateTime(_) | Value::DateTimeTz(_) => return Some(cell.clone()),
            Value::String(text) => text.trim(),
            _ => return None,
        };
        match &self.format {
            TemporalFormat::Default => Self::read_default(text),
            TemporalFormat::Any => Self::read_any(text),
            TemporalFormat::Pattern(pattern) if pattern.contains("%z") || pattern.contains("%:z") => {
                DateTime::parse_from_str(text, pattern).ok().map(Value::DateTimeTz)
            }
            TemporalFormat::Pattern(pattern) => NaiveDateTime::parse_from_str(text, pattern)
                .ok()
                .map(Value::DateTime),
        }
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        match (value, &self.format) {
            (Value::DateTime(dt), TemporalFormat::Pattern(pattern)) => Some(dt.format(pattern).to_string()),
            (Value::DateTimeTz(dt), TemporalFormat::Pattern(pattern)) => Some(dt.format(pattern).to_string()),
            (Value::DateTime(dt), _) => Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            (Value::DateTimeTz(dt), _) if dt.offset().local_minus_utc() == 0 => {
                Some(dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            }
            (Value::DateTimeTz(dt), _) => Some(dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()),
            _ => None,
        }
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        ORDERED
    }
}

/// Four-digit years.
#[derive(Debug, Clone, Copy, Default)]
pub struct YearType;

impl FieldType for YearType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        let year = match cell {
            Value::Year(year) => *year,
            Value::Integer(year) => i32::try_from(*year).ok()?,
            Value::String(text) if text.len() == 4 => text.parse::<i32>().ok()?,
            _ => return None,
        };
        (0..=9999).contains(&year).then_some(Value::Year(year))
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        match value {
            Value::Year(year) => Some(year.to_string()),
            _ => None,
        }
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        ORDERED
    }
}

/// Year and month pairs such as `2024-03`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YearMonthType;

impl FieldType for YearMonthType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        let (year, month) = match cell {
            Value::YearMonth { year, month } => (*year, i64::from(*month)),
            Value::String(text) => {
                let (year, month) = text.trim().split_once('-')?;
                (year.parse::<i32>().ok()?, month.parse::<i64>().ok()?)
            }
            Value::Json(serde_json::Value::Array(items)) if items.len() == 2 => {
                (i32::try_from(items[0].as_i64()?).ok()?, items[1].as_i64()?)
            }
            _ => return None,
        };
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Value::YearMonth {
            year,
            month: month as u32,
        })
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        matches!(value, Value::YearMonth { .. }).then(|| value.to_string())
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        ORDERED
    }
}

/// ISO 8601 durations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationType;

fn components(text: &str) -> Option<Vec<(String, char)>> {
    let mut parts = Vec::new();
    let mut number = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
        } else if number.is_empty() {
            return None;
        } else {
            parts.push((std::mem::take(&mut number), c));
        }
    }
    number.is_empty().then_some(parts)
}

fn parse_duration(text: &str) -> Option<IsoDuration> {
    let body = text.strip_prefix('P')?;
    let (date, time) = match body.split_once('T') {
        Some((_, "")) => return None,
        Some((date, time)) => (date, time),
        None => (body, ""),
    };
    if date.is_empty() && time.is_empty() {
        return None;
    }

    let mut duration = IsoDuration::default();
    let mut last = 0;
    for (number, unit) in components(date)? {
        let rank = "YMWD".find(unit)? + 1;
        if rank <= last {
            return None;
        }
        last = rank;
        let value: u32 = number.parse().ok()?;
        match unit {
            'Y' => duration.years = value,
            'M' => duration.months = value,
            'W' => duration.days = duration.days.checked_add(value.checked_mul(7)?)?,
            _ => duration.days = duration.days.checked_add(value)?,
        }
    }
    let mut last = 0;
    for (number, unit) in components(time)? {
        let rank = "HMS".find(unit)? + 1;
        if rank <= last {
            return None;
        }
        last = rank;
        match unit {
            'H' => duration.hours = number.parse().ok()?,
            'M' => duration.minutes = number.parse().ok()?,
            _ => duration.seconds = number.parse().ok()?,
        }
    }
    Some(duration)
}

impl FieldType for DurationType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        match cell {
            Value::Duration(duration) => Some(Value::Duration(*duration)),
            Value::String(text) => parse_duration(text.trim()).map(Value::Duration),
            _ => None,
        }
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        match value {
            Value::Duration(duration) => Some(duration.to_string()),
            _ => None,
        }
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        ORDERED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(field_type: &str, format: &str) -> Field {
        let mut field = Field::new("value", field_type);
        field.format = format.to_string();
        field
    }

    #[test]
    fn test_date_formats() {
        let ty = DateType::from_field(&field("date", "default"));
        let expected = Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(ty.read_value(&Value::from("2024-02-29")), Some(expected.clone()));
        assert_eq!(ty.read_value(&Value::from("2023-02-29")), None);
        assert_eq!(ty.read_value(&Value::from("29/02/2024")), None);

        let ty = DateType::from_field(&field("date", "%d/%m/%Y"));
        assert_eq!(ty.read_value(&Value::from("29/02/2024")), Some(expected.clone()));
        assert_eq!(ty.write_value(&expected), Some("29/02/2024".to_string()));

        let ty = DateType::from_field(&field("date", "any"));
        assert_eq!(ty.read_value(&Value::from("29 February 2024")), Some(expected));
    }

    #[test]
    fn test_time_with_offset() {
        let ty = TimeType::from_field(&field("time", "default"));
        let time = NaiveTime::from_hms_opt(10, 30, 0).unwrap();
        assert_eq!(ty.read_value(&Value::from("10:30:00")), Some(Value::Time(time)));
        assert_eq!(
            ty.read_value(&Value::from("10:30:00+02:00")),
            Some(Value::TimeTz(time, FixedOffset::east_opt(7200).unwrap()))
        );
        assert_eq!(ty.read_value(&Value::from("25:00:00")), None);
    }

    #[test]
    fn test_datetime() {
        let ty = DateTimeType::from_field(&field("datetime", "default"));
        let value = ty.read_value(&Value::from("2024-01-01T10:00:00Z")).unwrap();
        assert!(matches!(value, Value::DateTimeTz(_)));
        assert_eq!(ty.write_value(&value), Some("2024-01-01T10:00:00Z".to_string()));
        let naive = ty.read_value(&Value::from("2024-01-01T10:00:00")).unwrap();
        assert!(matches!(naive, Value::DateTime(_)));
        assert_eq!(ty.read_value(&Value::from("2024-01-01")), None);
    }

    #[test]
    fn test_year_and_yearmonth() {
        assert_eq!(YearType.read_value(&Value::from("2024")), Some(Value::Year(2024)));
        assert_eq!(YearType.read_value(&Value::from("24")), None);
        assert_eq!(YearType.read_value(&Value::Integer(1999)), Some(Value::Year(1999)));
        assert_eq!(
            YearMonthType.read_value(&Value::from("2024-03")),
            Some(Value::YearMonth { year: 2024, month: 3 })
        );
        assert_eq!(YearMonthType.read_value(&Value::from("2024-13")), None);
    }

    #[test]
    fn test_duration() {
        let value = DurationType.read_value(&Value::from("P1Y2M3DT4H5M6.5S")).unwrap();
        let Value::Duration(duration) = value else {
            panic!("expected a duration");
        };
        assert_eq!(duration.years, 1);
        assert_eq!(duration.days, 3);
        assert_eq!(duration.seconds, 6.5);
        assert_eq!(DurationType.read_value(&Value::from("P")), None);
        assert_eq!(DurationType.read_value(&Value::from("PT")), None);
        assert_eq!(DurationType.read_value(&Value::from("P1D2Y")), None);
        assert_eq!(DurationType.read_value(&Value::from("1D")), None);
        assert!(DurationType.read_value(&Value::from("P2W")).is_some());
    }

    #[test]
    fn test_duration_overflow() {
        assert_eq!(DurationType.read_value(&Value::from("P999999999W")), None);
        assert_eq!(DurationType.read_value(&Value::from("P4294967295W")), None);
        assert_eq!(DurationType.read_value(&Value::from("P1W4294967295D")), None);
        assert_eq!(DurationType.read_value(&Value::from("P99999999999D")), None);
    }
}
