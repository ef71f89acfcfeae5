//! Builder pattern for creating schemas.
//!
//! This module provides ergonomic builders for constructing schemas
//! and their fields with a fluent API.

use crate::{Constraints, Field, ForeignKey, Schema};
use serde_json::Value as JsonValue;

/// Builder for creating a `Schema`.
///
/// # Example
///
/// ```rust
/// use tables_core::{FieldBuilder, SchemaBuilder};
///
/// let schema = SchemaBuilder::new()
///     .field(FieldBuilder::new("id", "integer").build())
///     .field(FieldBuilder::new("name", "string").required(true).build())
///     .primary_key(["id"])
///     .build();
///
/// assert_eq!(schema.field_names(), vec!["id", "name"]);
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
    missing_values: Option<Vec<String>>,
    primary_key: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the schema.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds multiple fields to the schema.
    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Sets the schema-level missing values.
    pub fn missing_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the primary key.
    pub fn primary_key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a foreign key. Use an empty `resource` for a self-reference.
    pub fn foreign_key<I, J, S, T>(mut self, fields: I, resource: impl Into<String>, reference_fields: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        self.foreign_keys.push(ForeignKey::new(
            fields.into_iter().map(Into::into).collect(),
            resource,
            reference_fields.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Schema {
        let mut schema = Schema::new();
        schema.fields = self.fields;
        if let Some(missing_values) = self.missing_values {
            schema.missing_values = missing_values;
        }
        schema.primary_key = self.primary_key;
        schema.foreign_keys = self.foreign_keys;
        schema
    }
}

/// Builder for creating a `Field`.
///
/// # Example
///
/// ```rust
/// use tables_core::FieldBuilder;
///
/// let field = FieldBuilder::new("email", "string")
///     .format("email")
///     .required(true)
///     .build();
///
/// assert!(field.required());
/// ```
#[derive(Debug)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Creates a new field builder.
    ///
    /// # Arguments
    ///
    /// * `name` - Field name
    /// * `field_type` - Field type (e.g., "string", "integer")
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            field: Field::new(name, field_type),
        }
    }

    /// Sets the field format.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.field.format = format.into();
        self
    }

    /// Sets the field title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.field.title = Some(title.into());
        self
    }

    /// Sets the field description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.field.description = Some(description.into());
        self
    }

    /// Overrides the schema-level missing values for this field.
    pub fn missing_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field.missing_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces all constraints.
    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.field.constraints = constraints;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.field.constraints.required = Some(required);
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.field.constraints.unique = Some(unique);
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.field.constraints.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.field.constraints.max_length = Some(max_length);
        self
    }

    /// Sets the lower bound, in the field's logical type.
    pub fn minimum(mut self, minimum: impl Into<JsonValue>) -> Self {
        self.field.constraints.minimum = Some(minimum.into());
        self
    }

    /// Sets the upper bound, in the field's logical type.
    pub fn maximum(mut self, maximum: impl Into<JsonValue>) -> Self {
        self.field.constraints.maximum = Some(maximum.into());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.field.constraints.pattern = Some(pattern.into());
        self
    }

    pub fn enum_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        self.field.constraints.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn true_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field.true_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn false_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field.false_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn bare_number(mut self, bare_number: bool) -> Self {
        self.field.bare_number = Some(bare_number);
        self
    }

    pub fn decimal_char(mut self, decimal_char: impl Into<String>) -> Self {
        self.field.decimal_char = Some(decimal_char.into());
        self
    }

    pub fn group_char(mut self, group_char: impl Into<String>) -> Self {
        self.field.group_char = Some(group_char.into());
        self
    }

    /// Builds the field.
    pub fn build(self) -> Field {
        self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_builder_minimal() {
        let schema = SchemaBuilder::new().build();

        assert!(schema.fields.is_empty());
        assert_eq!(schema.missing_values, vec![""]);
        assert!(schema.primary_key.is_empty());
        assert!(schema.foreign_keys.is_empty());
    }

    #[test]
    fn test_schema_builder_full() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("id", "integer").build())
            .field(FieldBuilder::new("parent", "integer").build())
            .missing_values(["", "NA"])
            .primary_key(["id"])
            .foreign_key(["parent"], "", ["id"])
            .build();

        assert_eq!(schema.field_names(), vec!["id", "parent"]);
        assert_eq!(schema.missing_values, vec!["", "NA"]);
        assert_eq!(schema.primary_key, vec!["id"]);
        assert!(schema.foreign_keys[0].is_self_reference());
        assert!(schema.metadata_validate().is_empty());
    }

    #[test]
    fn test_field_builder_minimal() {
        let field = FieldBuilder::new("user_id", "string").build();

        assert_eq!(field.name, "user_id");
        assert_eq!(field.field_type, "string");
        assert_eq!(field.format, "default");
        assert!(!field.required());
        assert!(field.description.is_none());
    }

    #[test]
    fn test_field_builder_constraints() {
        let field = FieldBuilder::new("age", "integer")
            .required(true)
            .unique(true)
            .minimum(0)
            .maximum(150)
            .enum_values([1, 2, 3])
            .build();

        assert!(field.required());
        assert!(field.unique());
        assert_eq!(field.constraints.minimum, Some(json!(0)));
        assert_eq!(field.constraints.maximum, Some(json!(150)));
        assert_eq!(field.constraints.enum_values.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_field_builder_number_options() {
        let field = FieldBuilder::new("amount", "number")
            .bare_number(false)
            .decimal_char(",")
            .group_char(".")
            .missing_values(["-"])
            .build();

        assert_eq!(field.bare_number, Some(false));
        assert_eq!(field.decimal_char.as_deref(), Some(","));
        assert_eq!(field.group_char.as_deref(), Some("."));
        assert_eq!(field.missing_values, Some(vec!["-".to_string()]));
    }
}
