//! Field type registry.
//!
//! Every logical field type is a [`FieldType`]: a reader that turns a raw
//! cell into a typed value (or rejects it), a writer that serializes a typed
//! value back to text, and the list of constraints the type supports.
//!
//! The [`TypeRegistry`] maps descriptor type names to factories. It starts
//! with the builtin types and accepts user-registered ones; extending the
//! type set never requires touching the row engine.

mod any;
mod boolean;
mod collection;
mod geo;
mod numeric;
mod string;
mod temporal;
mod wkt;

pub use any::AnyType;
pub use boolean::BooleanType;
pub use collection::{ArrayType, ObjectType};
pub use geo::{GeoJsonType, GeoPointType};
pub use numeric::{IntegerType, NumberType};
pub use string::StringType;
pub use temporal::{DateTimeType, DateType, DurationType, TimeType, YearMonthType, YearType};

use crate::constraints::ConstraintKind;
use crate::error::{Result, TableError};
use crate::field::Field;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A logical field type: cell reader, cell writer and supported constraints.
pub trait FieldType: fmt::Debug + Send + Sync {
    /// Casts a raw cell to a typed value. `None` means the cell is not a
    /// valid value of this type.
    fn read_value(&self, cell: &Value) -> Option<Value>;

    /// Serializes a typed value to text. `None` means the value cannot be
    /// written by this type.
    fn write_value(&self, value: &Value) -> Option<String>;

    /// Constraints this type knows how to evaluate.
    fn supported_constraints(&self) -> &'static [ConstraintKind];
}

/// Constructs a field type from a field descriptor.
pub type TypeFactory = Arc<dyn Fn(&Field) -> Result<Box<dyn FieldType>> + Send + Sync>;

const BASE: &[ConstraintKind] = &[ConstraintKind::Required, ConstraintKind::Unique, ConstraintKind::Enum];

const ORDERED: &[ConstraintKind] = &[
    ConstraintKind::Required,
    ConstraintKind::Unique,
    ConstraintKind::Minimum,
    ConstraintKind::Maximum,
    ConstraintKind::Enum,
];

const SIZED: &[ConstraintKind] = &[
    ConstraintKind::Required,
    ConstraintKind::Unique,
    ConstraintKind::MinLength,
    ConstraintKind::MaxLength,
    ConstraintKind::Enum,
];

const TEXT: &[ConstraintKind] = &[
    ConstraintKind::Required,
    ConstraintKind::Unique,
    ConstraintKind::MinLength,
    ConstraintKind::MaxLength,
    ConstraintKind::Pattern,
    ConstraintKind::Enum,
];

/// Registry of field types keyed by descriptor type name.
#[derive(Clone)]
pub struct TypeRegistry {
    factories: BTreeMap<String, TypeFactory>,
}

impl TypeRegistry {
    /// Creates a registry holding the builtin types.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("any", |_| Ok(Box::new(AnyType)));
        registry.register("array", |_| Ok(Box::new(ArrayType)));
        registry.register("boolean", |field| Ok(Box::new(BooleanType::from_field(field))));
        registry.register("date", |field| Ok(Box::new(DateType::from_field(field))));
        registry.register("datetime", |field| Ok(Box::new(DateTimeType::from_field(field))));
        registry.register("duration", |_| Ok(Box::new(DurationType)));
        registry.register("geojson", |field| Ok(Box::new(GeoJsonType::from_field(field)?)));
        registry.register("geopoint", |field| Ok(Box::new(GeoPointType::from_field(field)?)));
        registry.register("integer", |field| Ok(Box::new(IntegerType::from_field(field))));
        registry.register("number", |field| Ok(Box::new(NumberType::from_field(field))));
        registry.register("object", |_| Ok(Box::new(ObjectType)));
        registry.register("string", |field| Ok(Box::new(StringType::from_field(field))));
        registry.register("time", |field| Ok(Box::new(TimeType::from_field(field))));
        registry.register("year", |_| Ok(Box::new(YearType)));
        registry.register("yearmonth", |_| Ok(Box::new(YearMonthType)));
        registry
    }

    /// Creates a registry without any types.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registers (or replaces) a field type.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Field) -> Result<Box<dyn FieldType>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Whether a type name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered type names in sorted order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Builds the field type for a field descriptor.
    pub fn create(&self, field: &Field) -> Result<Box<dyn FieldType>> {
        let factory = self.factories.get(&field.field_type).ok_or_else(|| {
            TableError::field(format!(
                "field \"{}\" has unsupported type \"{}\"",
                field.name, field.field_type
            ))
        })?;
        factory(field)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct UpperType;

    impl FieldType for UpperType {
        fn read_value(&self, cell: &Value) -> Option<Value> {
            let text = cell.as_str()?;
            text.chars()
                .all(|c| c.is_ascii_uppercase())
                .then(|| Value::from(text))
        }

        fn write_value(&self, value: &Value) -> Option<String> {
            value.as_str().map(str::to_string)
        }

        fn supported_constraints(&self) -> &'static [ConstraintKind] {
            BASE
        }
    }

    #[test]
    fn test_builtin_types() {
        let registry = TypeRegistry::new();
        for name in [
            "any", "array", "boolean", "date", "datetime", "duration", "geojson", "geopoint", "integer",
            "number", "object", "string", "time", "year", "yearmonth",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_unknown_type() {
        let registry = TypeRegistry::new();
        let err = registry.create(&Field::new("x", "decimal")).unwrap_err();
        assert_eq!(err.code(), "field-error");
        assert!(err.note().contains("decimal"));
    }

    #[test]
    fn test_register_custom_type() {
        let mut registry = TypeRegistry::new();
        registry.register("upper", |_| Ok(Box::new(UpperType)));
        let ty = registry.create(&Field::new("code", "upper")).unwrap();
        assert_eq!(ty.read_value(&Value::from("ABC")), Some(Value::from("ABC")));
        assert_eq!(ty.read_value(&Value::from("abc")), None);
    }
}
