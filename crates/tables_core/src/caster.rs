//! Compiled cell readers and writers.
//!
//! A [`SchemaCaster`] is built once per table from a [`Schema`] and a
//! [`TypeRegistry`]. It owns one [`FieldCaster`] per field, so type lookup,
//! bound casting and pattern compilation never happen per cell.
//!
//! [`Schema`]: crate::Schema

use crate::constraints::ConstraintChecker;
use crate::error::Result;
use crate::field::Field;
use crate::types::{FieldType, TypeRegistry};
use crate::value::Value;
use std::fmt;

/// Ordered notes keyed by `"type"` or a constraint name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notes(Vec<(String, String)>);

impl Notes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a note, replacing an existing one with the same key.
    pub fn insert(&mut self, key: impl Into<String>, note: impl Into<String>) {
        let key = key.into();
        let note = note.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = note,
            None => self.0.push((key, note)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, note)| note.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Reader, writer and constraint checker of a single field.
pub struct FieldCaster {
    name: String,
    type_label: String,
    field_type: Box<dyn FieldType>,
    missing_values: Vec<String>,
    checker: ConstraintChecker,
}

impl FieldCaster {
    /// Compiles a field.
    ///
    /// `missing_values` applies unless the field declares its own;
    /// `implicit_required` is set for primary key members.
    pub fn new(
        field: &Field,
        missing_values: &[String],
        implicit_required: bool,
        registry: &TypeRegistry,
    ) -> Result<Self> {
        let field_type = registry.create(field)?;
        let checker = ConstraintChecker::compile(&field.name, &field.constraints, field_type.as_ref(), implicit_required)?;
        Ok(Self {
            name: field.name.clone(),
            type_label: format!("{}/{}", field.field_type, field.format),
            field_type,
            missing_values: field
                .missing_values
                .clone()
                .unwrap_or_else(|| missing_values.to_vec()),
            checker,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the field is required, explicitly or through the primary key.
    pub fn required(&self) -> bool {
        self.checker.required()
    }

    /// Whether a raw cell counts as missing for this field.
    pub fn is_missing(&self, cell: Option<&Value>) -> bool {
        match cell {
            None => true,
            Some(Value::String(text)) => self.missing_values.iter().any(|m| m == text),
            Some(other) => {
                let text = other.to_string();
                self.missing_values.iter().any(|m| *m == text)
            }
        }
    }

    /// Casts a raw cell. A failed cast yields no value and a `"type"` note.
    pub fn read_cell(&self, cell: Option<&Value>) -> (Option<Value>, Notes) {
        let mut notes = Notes::new();
        if self.is_missing(cell) {
            return (None, notes);
        }
        let Some(cell) = cell else {
            return (None, notes);
        };
        match self.field_type.read_value(cell) {
            Some(value) => (Some(value), notes),
            None => {
                notes.insert("type", format!("type is \"{}\"", self.type_label));
                (None, notes)
            }
        }
    }

    /// Evaluates constraints against a typed value.
    pub fn check_constraints(&self, value: Option<&Value>) -> Notes {
        let mut notes = Notes::new();
        for (kind, note) in self.checker.check(value) {
            notes.insert(kind.name(), note);
        }
        notes
    }

    /// Serializes a typed value. Missing values are written as the first
    /// missing-value marker.
    pub fn write_cell(&self, value: Option<&Value>) -> (Option<String>, Notes) {
        let mut notes = Notes::new();
        let Some(value) = value else {
            return (Some(self.missing_values.first().cloned().unwrap_or_default()), notes);
        };
        match self.field_type.write_value(value) {
            Some(text) => (Some(text), notes),
            None => {
                notes.insert("type", format!("type is \"{}\"", self.type_label));
                (None, notes)
            }
        }
    }
}

impl fmt::Debug for FieldCaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCaster")
            .field("name", &self.name)
            .field("type", &self.type_label)
            .finish()
    }
}

/// Compiled casters for every field of a schema, in schema order.
#[derive(Debug)]
pub struct SchemaCaster {
    fields: Vec<FieldCaster>,
}

impl SchemaCaster {
    pub(crate) fn new(fields: Vec<FieldCaster>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldCaster] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&FieldCaster> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Casts raw cells positionally. Absent trailing cells read as missing
    /// and cells beyond the field count are ignored.
    pub fn read_cells(&self, cells: &[Option<Value>]) -> (Vec<Option<Value>>, Vec<Notes>) {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, field)| field.read_cell(cells.get(i).and_then(Option::as_ref)))
            .unzip()
    }

    /// Serializes typed values positionally.
    pub fn write_cells(&self, values: &[Option<Value>]) -> (Vec<Option<String>>, Vec<Notes>) {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, field)| field.write_cell(values.get(i).and_then(Option::as_ref)))
            .unzip()
    }

    /// Constraint notes for each typed value, positionally.
    pub fn check_constraints(&self, values: &[Option<Value>]) -> Vec<Notes> {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, field)| field.check_constraints(values.get(i).and_then(Option::as_ref)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caster(field: Field) -> FieldCaster {
        FieldCaster::new(&field, &["".to_string(), "NA".to_string()], false, &TypeRegistry::new()).unwrap()
    }

    #[test]
    fn test_missing_values() {
        let caster = caster(Field::new("age", "integer"));
        assert_eq!(caster.read_cell(Some(&Value::from("NA"))), (None, Notes::new()));
        assert_eq!(caster.read_cell(None), (None, Notes::new()));
        assert!(caster.is_missing(Some(&Value::from(""))));
        assert!(!caster.is_missing(Some(&Value::from("0"))));
    }

    #[test]
    fn test_field_missing_values_override() {
        let mut field = Field::new("age", "integer");
        field.missing_values = Some(vec!["-".to_string()]);
        let caster = caster(field);
        assert_eq!(caster.read_cell(Some(&Value::from("-"))).0, None);
        assert!(caster.read_cell(Some(&Value::from("NA"))).1.contains("type"));
        assert_eq!(caster.write_cell(None).0.as_deref(), Some("-"));
    }

    #[test]
    fn test_type_note() {
        let mut field = Field::new("when", "date");
        field.format = "%d/%m/%Y".to_string();
        let (value, notes) = caster(field).read_cell(Some(&Value::from("2024-01-01")));
        assert_eq!(value, None);
        assert_eq!(notes.get("type"), Some("type is \"date/%d/%m/%Y\""));
    }

    #[test]
    fn test_notes_replace_in_place() {
        let mut notes = Notes::new();
        notes.insert("type", "a");
        notes.insert("minimum", "b");
        notes.insert("type", "c");
        let collected: Vec<_> = notes.iter().collect();
        assert_eq!(collected, vec![("type", "c"), ("minimum", "b")]);
    }
}
