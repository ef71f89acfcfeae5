//! Field descriptors.

use crate::caster::{FieldCaster, Notes};
use crate::constraints::Constraints;
use crate::error::Result;
use crate::types::TypeRegistry;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Descriptor type used when a field omits `type`.
pub const DEFAULT_FIELD_TYPE: &str = "string";

/// Descriptor format used when a field omits `format`.
pub const DEFAULT_FIELD_FORMAT: &str = "default";

fn default_type() -> String {
    DEFAULT_FIELD_TYPE.to_string()
}

fn default_format() -> String {
    DEFAULT_FIELD_FORMAT.to_string()
}

fn is_default_format(format: &str) -> bool {
    format == DEFAULT_FIELD_FORMAT
}

/// A named, typed column of a table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Field name, unique within a schema
    pub name: String,

    /// Logical type name, resolved through a [`TypeRegistry`]
    #[serde(rename = "type", default = "default_type")]
    pub field_type: String,

    #[serde(default = "default_format", skip_serializing_if = "is_default_format")]
    pub format: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Overrides the schema-level missing values for this field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "is_unconstrained")]
    pub constraints: Constraints,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bare_number: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_char: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_char: Option<String>,
}

fn is_unconstrained(constraints: &Constraints) -> bool {
    *constraints == Constraints::default()
}

impl Field {
    /// Creates a field with the default format and no constraints.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            format: default_format(),
            title: None,
            description: None,
            missing_values: None,
            constraints: Constraints::default(),
            true_values: None,
            false_values: None,
            bare_number: None,
            decimal_char: None,
            group_char: None,
        }
    }

    /// Whether the `required` constraint is set.
    pub fn required(&self) -> bool {
        self.constraints.required.unwrap_or(false)
    }

    /// Whether the `unique` constraint is set.
    pub fn unique(&self) -> bool {
        self.constraints.unique.unwrap_or(false)
    }

    /// Reads a single cell with the builtin types, returning the typed value
    /// and any type and constraint notes.
    ///
    /// This compiles the field on every call; schemas compile their fields
    /// once through [`crate::Schema::create_caster`].
    pub fn read_cell(&self, cell: Option<&Value>) -> Result<(Option<Value>, Notes)> {
        let caster = FieldCaster::new(self, &[String::new()], false, &TypeRegistry::new())?;
        let (value, mut notes) = caster.read_cell(cell);
        if notes.is_empty() {
            notes = caster.check_constraints(value.as_ref());
        }
        Ok((value, notes))
    }

    /// Writes a typed value with the builtin types.
    pub fn write_cell(&self, value: Option<&Value>) -> Result<(Option<String>, Notes)> {
        let caster = FieldCaster::new(self, &[String::new()], false, &TypeRegistry::new())?;
        Ok(caster.write_cell(value))
    }
}
