use super::{wkt, FieldType, TEXT};
use crate::constraints::ConstraintKind;
use crate::field::Field;
use crate::value::Value;
use base64::Engine;
use validator::{ValidateEmail, ValidateUrl};

/// Formats a string field can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Default,
    Email,
    Uri,
    Binary,
    Uuid,
    Wkt,
}

impl StringFormat {
    /// Unknown formats fall back to plain strings.
    pub fn parse(format: &str) -> Self {
        match format {
            "email" => StringFormat::Email,
            "uri" => StringFormat::Uri,
            "binary" => StringFormat::Binary,
            "uuid" => StringFormat::Uuid,
            "wkt" => StringFormat::Wkt,
            _ => StringFormat::Default,
        }
    }

    fn accepts(self, text: &str) -> bool {
        match self {
            StringFormat::Default => true,
            StringFormat::Email => text.validate_email(),
            StringFormat::Uri => text.validate_url(),
            StringFormat::Binary => base64::engine::general_purpose::STANDARD.decode(text).is_ok(),
            StringFormat::Uuid => uuid::Uuid::parse_str(text).is_ok(),
            StringFormat::Wkt => wkt::is_valid(text),
        }
    }
}

/// Text, optionally restricted to a format.
#[derive(Debug, Clone)]
pub struct StringType {
    format: StringFormat,
}

impl StringType {
    pub fn from_field(field: &Field) -> Self {
        Self {
            format: StringFormat::parse(&field.format),
        }
    }
}

impl FieldType for StringType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        let text = cell.as_str()?;
        self.format.accepts(text).then(|| Value::String(text.to_string()))
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        value.as_str().map(str::to_string)
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        TEXT
    }
}
