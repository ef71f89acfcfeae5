//! Table schemas.

use crate::caster::{FieldCaster, Notes, SchemaCaster};
use crate::error::{Result, TableError};
use crate::field::Field;
use crate::types::TypeRegistry;
use crate::value::Value;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Missing values used when a schema does not declare any.
pub fn default_missing_values() -> Vec<String> {
    vec![String::new()]
}

/// Accepts either a single name or a list of names.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    })
}

/// Table schema: ordered fields plus table-level keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<Field>,

    /// Raw cell spellings that mean "no value"
    #[serde(default = "default_missing_values")]
    pub missing_values: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

/// A foreign key from local fields to fields of a reference resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    #[serde(deserialize_with = "one_or_many")]
    pub fields: Vec<String>,

    pub reference: ForeignKeyReference,
}

/// Target of a foreign key. An empty resource name refers to the table itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    #[serde(default)]
    pub resource: String,

    #[serde(deserialize_with = "one_or_many")]
    pub fields: Vec<String>,
}

impl ForeignKey {
    pub fn new(fields: Vec<String>, resource: impl Into<String>, reference_fields: Vec<String>) -> Self {
        Self {
            fields,
            reference: ForeignKeyReference {
                resource: resource.into(),
                fields: reference_fields,
            },
        }
    }

    /// Whether the key references the table it is declared on.
    pub fn is_self_reference(&self) -> bool {
        self.reference.resource.is_empty()
    }
}

impl Schema {
    /// Creates an empty schema with the default missing values.
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            missing_values: default_missing_values(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Field names in schema order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Position of a field in schema order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn get_field(&self, name: &str) -> Result<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| TableError::schema(format!("field \"{name}\" does not exist")))
    }

    pub fn get_field_mut(&mut self, name: &str) -> Result<&mut Field> {
        self.fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| TableError::schema(format!("field \"{name}\" does not exist")))
    }

    /// Appends a field. Names must stay unique.
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        if self.has_field(&field.name) {
            return Err(TableError::schema(format!("field \"{}\" already exists", field.name)));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Removes and returns a field.
    pub fn remove_field(&mut self, name: &str) -> Result<Field> {
        let index = self
            .field_index(name)
            .ok_or_else(|| TableError::schema(format!("field \"{name}\" does not exist")))?;
        Ok(self.fields.remove(index))
    }

    /// Structural problems of the schema, checked against the builtin types.
    pub fn metadata_validate(&self) -> Vec<TableError> {
        self.metadata_validate_with(&TypeRegistry::new())
    }

    /// Structural problems of the schema, checked against a registry.
    ///
    /// Covers field name uniqueness, type resolution, constraint support and
    /// values, and key references.
    pub fn metadata_validate_with(&self, registry: &TypeRegistry) -> Vec<TableError> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                errors.push(TableError::field(format!("field name \"{}\" is not unique", field.name)));
            }
            match registry.create(field) {
                Ok(field_type) => {
                    let supported = field_type.supported_constraints();
                    for kind in field.constraints.declared() {
                        if !supported.contains(&kind) {
                            errors.push(TableError::field(format!(
                                "field \"{}\" of type \"{}\" does not support constraint \"{kind}\"",
                                field.name, field.field_type
                            )));
                        }
                    }
                    if let Err(err) = FieldCaster::new(field, &self.missing_values, false, registry) {
                        errors.push(err);
                    }
                }
                Err(err) => errors.push(err),
            }
        }

        for name in &self.primary_key {
            if !self.has_field(name) {
                errors.push(TableError::schema(format!(
                    "primary key \"{name}\" does not match the fields {:?}",
                    self.field_names()
                )));
            }
        }

        for fk in &self.foreign_keys {
            for name in &fk.fields {
                if !self.has_field(name) {
                    errors.push(TableError::schema(format!(
                        "foreign key \"{name}\" does not match the fields {:?}",
                        self.field_names()
                    )));
                }
            }
            if fk.fields.is_empty() || fk.fields.len() != fk.reference.fields.len() {
                errors.push(TableError::schema(format!(
                    "foreign key fields \"{:?}\" do not match the reference fields \"{:?}\"",
                    fk.fields, fk.reference.fields
                )));
            }
        }

        errors
    }

    /// Compiles the schema into per-field casters.
    ///
    /// Primary key members are treated as required.
    pub fn create_caster(&self, registry: &TypeRegistry) -> Result<SchemaCaster> {
        let fields = self
            .fields
            .iter()
            .map(|field| {
                let in_primary_key = self.primary_key.contains(&field.name);
                FieldCaster::new(field, &self.missing_values, in_primary_key, registry)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SchemaCaster::new(fields))
    }

    /// Casts raw cells positionally with the builtin types.
    pub fn read_cells(&self, cells: &[Option<Value>]) -> Result<(Vec<Option<Value>>, Vec<Notes>)> {
        Ok(self.create_caster(&TypeRegistry::new())?.read_cells(cells))
    }

    /// Serializes typed values positionally with the builtin types.
    pub fn write_cells(&self, values: &[Option<Value>]) -> Result<(Vec<Option<String>>, Vec<Notes>)> {
        Ok(self.create_caster(&TypeRegistry::new())?.write_cells(values))
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_schema() -> Schema {
        serde_json::from_str(
            r#"{
                "fields": [
                    {"name": "id", "type": "integer"},
                    {"name": "name", "type": "string"}
                ],
                "primaryKey": "id"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_descriptor() {
        let schema = sample_schema();
        assert_eq!(schema.field_names(), vec!["id", "name"]);
        assert_eq!(schema.primary_key, vec!["id"]);
        assert_eq!(schema.missing_values, vec![""]);
        assert!(schema.metadata_validate().is_empty());
    }

    #[test]
    fn test_foreign_key_descriptor() {
        let schema: Schema = serde_json::from_str(
            r#"{
                "fields": [{"name": "id"}, {"name": "parent"}],
                "foreignKeys": [{"fields": "parent", "reference": {"resource": "", "fields": "id"}}]
            }"#,
        )
        .unwrap();
        assert_eq!(schema.foreign_keys.len(), 1);
        assert!(schema.foreign_keys[0].is_self_reference());
        assert_eq!(schema.foreign_keys[0].reference.fields, vec!["id"]);
    }

    #[test]
    fn test_field_management() {
        let mut schema = sample_schema();
        assert!(schema.get_field("name").is_ok());
        assert_eq!(schema.get_field("missing").unwrap_err().code(), "schema-error");
        assert!(schema.add_field(Field::new("id", "string")).is_err());
        schema.add_field(Field::new("email", "string")).unwrap();
        assert_eq!(schema.remove_field("name").unwrap().name, "name");
        assert_eq!(schema.field_names(), vec!["id", "email"]);
        assert!(schema.remove_field("name").is_err());
    }

    #[test]
    fn test_metadata_validate() {
        let mut schema = sample_schema();
        schema.fields.push(Field::new("id", "integer"));
        schema.primary_key = vec!["code".to_string()];
        let mut field = Field::new("age", "integer");
        field.constraints.pattern = Some("\\d+".to_string());
        schema.fields.push(field);
        schema.fields.push(Field::new("blob", "decimal"));

        let codes: Vec<_> = schema.metadata_validate().iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["field-error", "field-error", "field-error", "schema-error"]);
    }

    #[test]
    fn test_read_cells_pads_missing() {
        let schema = sample_schema();
        let (values, notes) = schema.read_cells(&[Some(Value::from("1"))]).unwrap();
        assert_eq!(values, vec![Some(Value::Integer(1)), None]);
        assert!(notes.iter().all(Notes::is_empty));
    }

    #[test]
    fn test_primary_key_is_required() {
        let schema = sample_schema();
        let caster = schema.create_caster(&TypeRegistry::new()).unwrap();
        assert!(caster.fields()[0].required());
        assert!(!caster.fields()[1].required());
    }
}
