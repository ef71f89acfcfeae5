//! Field constraints and their compiled checker.

use crate::error::{Result, TableError};
use crate::types::FieldType;
use crate::value::Value;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;

/// Constraints declared on a field descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Lower bound, expressed in the field's own logical type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<JsonValue>,

    /// Upper bound, expressed in the field's own logical type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<JsonValue>,

    /// Regular expression the whole cell must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<JsonValue>>,
}

impl Constraints {
    /// Constraint kinds set on this descriptor, in evaluation order.
    pub fn declared(&self) -> Vec<ConstraintKind> {
        let mut kinds = Vec::new();
        if self.required.is_some() {
            kinds.push(ConstraintKind::Required);
        }
        if self.unique.is_some() {
            kinds.push(ConstraintKind::Unique);
        }
        if self.min_length.is_some() {
            kinds.push(ConstraintKind::MinLength);
        }
        if self.max_length.is_some() {
            kinds.push(ConstraintKind::MaxLength);
        }
        if self.minimum.is_some() {
            kinds.push(ConstraintKind::Minimum);
        }
        if self.maximum.is_some() {
            kinds.push(ConstraintKind::Maximum);
        }
        if self.pattern.is_some() {
            kinds.push(ConstraintKind::Pattern);
        }
        if self.enum_values.is_some() {
            kinds.push(ConstraintKind::Enum);
        }
        kinds
    }
}

/// Kinds of field constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Required,
    Unique,
    MinLength,
    MaxLength,
    Minimum,
    Maximum,
    Pattern,
    Enum,
}

impl ConstraintKind {
    /// Descriptor name of the constraint.
    pub fn name(self) -> &'static str {
        match self {
            ConstraintKind::Required => "required",
            ConstraintKind::Unique => "unique",
            ConstraintKind::MinLength => "minLength",
            ConstraintKind::MaxLength => "maxLength",
            ConstraintKind::Minimum => "minimum",
            ConstraintKind::Maximum => "maximum",
            ConstraintKind::Pattern => "pattern",
            ConstraintKind::Enum => "enum",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Constraints compiled against a field type.
///
/// Bounds and enum members are cast through the field's reader once, and
/// the pattern is compiled anchored at both ends. Constraints the type does
/// not support are ignored here; schema validation reports them.
#[derive(Debug, Clone)]
pub struct ConstraintChecker {
    required: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    minimum: Option<(Value, String)>,
    maximum: Option<(Value, String)>,
    pattern: Option<(Regex, String)>,
    enum_values: Option<(Vec<Value>, String)>,
}

impl ConstraintChecker {
    /// Compiles the constraints of a field.
    ///
    /// `implicit_required` marks fields that are part of the primary key.
    pub fn compile(
        field_name: &str,
        constraints: &Constraints,
        field_type: &dyn FieldType,
        implicit_required: bool,
    ) -> Result<Self> {
        let supported = field_type.supported_constraints();
        let allowed = |kind: ConstraintKind| supported.contains(&kind);

        let cast_bound = |kind: ConstraintKind, bound: &Option<JsonValue>| -> Result<Option<(Value, String)>> {
            match bound {
                Some(raw) if allowed(kind) => {
                    let value = Value::from_json(raw)
                        .and_then(|cell| field_type.read_value(&cell))
                        .ok_or_else(|| {
                            TableError::field(format!(
                                "constraint \"{kind}\" of field \"{field_name}\" is not a valid value: {raw}"
                            ))
                        })?;
                    Ok(Some((value, display_json(raw))))
                }
                _ => Ok(None),
            }
        };

        let pattern = match &constraints.pattern {
            Some(pattern) if allowed(ConstraintKind::Pattern) => {
                let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
                    TableError::field(format!(
                        "constraint \"pattern\" of field \"{field_name}\" is not a valid regex: {e}"
                    ))
                })?;
                Some((regex, pattern.clone()))
            }
            _ => None,
        };

        let enum_values = match &constraints.enum_values {
            Some(members) if allowed(ConstraintKind::Enum) => {
                let mut values = Vec::with_capacity(members.len());
                for member in members {
                    let value = Value::from_json(member)
                        .and_then(|cell| field_type.read_value(&cell))
                        .ok_or_else(|| {
                            TableError::field(format!(
                                "constraint \"enum\" of field \"{field_name}\" has an invalid member: {member}"
                            ))
                        })?;
                    values.push(value);
                }
                Some((values, display_json(&JsonValue::Array(members.clone()))))
            }
            _ => None,
        };

        Ok(Self {
            required: implicit_required || constraints.required.unwrap_or(false),
            min_length: constraints.min_length.filter(|_| allowed(ConstraintKind::MinLength)),
            max_length: constraints.max_length.filter(|_| allowed(ConstraintKind::MaxLength)),
            minimum: cast_bound(ConstraintKind::Minimum, &constraints.minimum)?,
            maximum: cast_bound(ConstraintKind::Maximum, &constraints.maximum)?,
            pattern,
            enum_values,
        })
    }

    /// Whether a value is required.
    pub fn required(&self) -> bool {
        self.required
    }

    /// Checks a typed value, returning the violated constraints with their
    /// notes in evaluation order.
    ///
    /// A missing value only violates `required`.
    pub fn check(&self, value: Option<&Value>) -> Vec<(ConstraintKind, String)> {
        let mut violations = Vec::new();
        let Some(value) = value else {
            if self.required {
                violations.push((ConstraintKind::Required, note(ConstraintKind::Required, "true")));
            }
            return violations;
        };

        if let (Some(min), Some(len)) = (self.min_length, value.len()) {
            if len < min {
                violations.push((ConstraintKind::MinLength, note(ConstraintKind::MinLength, min)));
            }
        }
        if let (Some(max), Some(len)) = (self.max_length, value.len()) {
            if len > max {
                violations.push((ConstraintKind::MaxLength, note(ConstraintKind::MaxLength, max)));
            }
        }
        if let Some((minimum, raw)) = &self.minimum {
            if !matches!(value.compare(minimum), Some(Ordering::Greater | Ordering::Equal)) {
                violations.push((ConstraintKind::Minimum, note(ConstraintKind::Minimum, raw)));
            }
        }
        if let Some((maximum, raw)) = &self.maximum {
            if !matches!(value.compare(maximum), Some(Ordering::Less | Ordering::Equal)) {
                violations.push((ConstraintKind::Maximum, note(ConstraintKind::Maximum, raw)));
            }
        }
        if let Some((regex, raw)) = &self.pattern {
            if !regex.is_match(&value.to_string()) {
                violations.push((ConstraintKind::Pattern, note(ConstraintKind::Pattern, raw)));
            }
        }
        if let Some((members, raw)) = &self.enum_values {
            if !members.iter().any(|member| member.key() == value.key()) {
                violations.push((ConstraintKind::Enum, note(ConstraintKind::Enum, raw)));
            }
        }
        violations
    }
}

fn note(kind: ConstraintKind, constraint: impl fmt::Display) -> String {
    format!("constraint \"{kind}\" is \"{constraint}\"")
}

fn display_json(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
