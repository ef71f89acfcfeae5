//! Cross-row integrity: unique fields, primary keys and foreign keys.

use crate::error::{ErrorKind, ForeignKeyContext, ValidationError};
use crate::package::Package;
use crate::reader::TableReader;
use crate::row::Row;
use crate::source::Resource;
use std::collections::{HashMap, HashSet};
use tables_core::{CellKey, ForeignKey, Result, Schema, TableError, ValidationContext, Value};
use tracing::debug;

/// What an integrity check needs from its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityRequirement {
    /// One forward pass is enough.
    Streaming,
    /// The table is read in full before validation, which takes a second
    /// pass or a buffered source.
    Materialized,
}

impl IntegrityRequirement {
    /// Self-referencing foreign keys need the whole table up front.
    pub fn of(schema: &Schema) -> Self {
        if schema.foreign_keys.iter().any(ForeignKey::is_self_reference) {
            IntegrityRequirement::Materialized
        } else {
            IntegrityRequirement::Streaming
        }
    }
}

type KeyTuple = Vec<CellKey>;

/// Reference key sets, one per foreign key of a schema.
#[derive(Debug, Default)]
pub struct ForeignKeyLookup {
    keys: Vec<HashSet<KeyTuple>>,
}

impl ForeignKeyLookup {
    /// Reads every referenced table and collects its key tuples.
    ///
    /// Rows whose reference cells are all empty are left out.
    ///
    /// # Errors
    ///
    /// Fails once when a reference resource cannot be resolved or read.
    pub fn build(resource: &Resource, package: Option<&Package>, context: &ValidationContext) -> Result<Self> {
        let mut keys = Vec::with_capacity(resource.schema.foreign_keys.len());
        for fk in &resource.schema.foreign_keys {
            let reference = if fk.is_self_reference() {
                resource.clone()
            } else {
                package
                    .and_then(|package| package.get_resource(&fk.reference.resource))
                    .cloned()
                    .ok_or_else(|| {
                        TableError::resource(format!(
                            "foreign key reference resource \"{}\" is not found",
                            fk.reference.resource
                        ))
                    })?
            };
            let set = Self::collect_keys(reference, &fk.reference.fields, context)?;
            debug!(
                resource = %resource.name,
                reference = %fk.reference.resource,
                keys = set.len(),
                "foreign key lookup materialized"
            );
            keys.push(set);
        }
        Ok(Self { keys })
    }

    fn collect_keys(mut reference: Resource, fields: &[String], context: &ValidationContext) -> Result<HashSet<KeyTuple>> {
        reference.schema.foreign_keys.clear();
        for name in fields {
            if !reference.schema.has_field(name) {
                return Err(TableError::resource(format!(
                    "foreign key reference field \"{name}\" does not exist in resource \"{}\"",
                    reference.name
                )));
            }
        }
        let reader = TableReader::open(&reference, context)?;
        let mut set = HashSet::new();
        for row in reader {
            let row = row?;
            let cells: Vec<Option<&Value>> = fields.iter().map(|name| row.get(name)).collect();
            if cells.iter().all(Option::is_none) {
                continue;
            }
            set.insert(cells.iter().map(|cell| key_of(*cell)).collect());
        }
        Ok(set)
    }
}

fn key_of(value: Option<&Value>) -> CellKey {
    match value {
        Some(value) => value.key(),
        None => Value::from("").key(),
    }
}

struct UniqueState {
    field_name: String,
    seen: HashMap<CellKey, usize>,
}

struct PrimaryKeyState {
    field_names: Vec<String>,
    seen: HashMap<KeyTuple, usize>,
}

struct ForeignKeyState {
    foreign_key: ForeignKey,
    keys: HashSet<KeyTuple>,
}

/// Stateful checker fed with every row of one table.
///
/// Memory grows with the number of distinct unique and primary key values.
pub struct IntegrityChecker {
    unique: Vec<UniqueState>,
    primary_key: Option<PrimaryKeyState>,
    foreign_keys: Vec<ForeignKeyState>,
}

impl IntegrityChecker {
    pub fn new(schema: &Schema, lookup: ForeignKeyLookup) -> Self {
        let unique = schema
            .fields
            .iter()
            .filter(|field| field.unique())
            .map(|field| UniqueState {
                field_name: field.name.clone(),
                seen: HashMap::new(),
            })
            .collect();
        let primary_key = (!schema.primary_key.is_empty()).then(|| PrimaryKeyState {
            field_names: schema.primary_key.clone(),
            seen: HashMap::new(),
        });
        let foreign_keys = schema
            .foreign_keys
            .iter()
            .cloned()
            .zip(lookup.keys)
            .map(|(foreign_key, keys)| ForeignKeyState { foreign_key, keys })
            .collect();
        Self {
            unique,
            primary_key,
            foreign_keys,
        }
    }

    /// Whether the schema declares anything to check.
    pub fn is_active(&self) -> bool {
        !self.unique.is_empty() || self.primary_key.is_some() || !self.foreign_keys.is_empty()
    }

    /// Integrity errors of one row, recording its keys for later rows.
    pub fn check_row(&mut self, row: &Row) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for state in &mut self.unique {
            let Some(value) = row.get(&state.field_name) else {
                continue;
            };
            match state.seen.get(&value.key()) {
                Some(earlier) => errors.push(row.cell_error(
                    ErrorKind::UniqueError,
                    format!("the same as in the row at position {earlier}"),
                    &state.field_name,
                )),
                None => {
                    state.seen.insert(value.key(), row.row_position());
                }
            }
        }

        if let Some(state) = &mut self.primary_key {
            let cells: Vec<Option<&Value>> = state.field_names.iter().map(|name| row.get(name)).collect();
            if cells.iter().all(Option::is_some) {
                let tuple: KeyTuple = cells.iter().map(|cell| key_of(*cell)).collect();
                match state.seen.get(&tuple) {
                    Some(earlier) => errors.push(row.row_error(
                        ErrorKind::PrimaryKey,
                        format!("the same as in the row at position {earlier}"),
                    )),
                    None => {
                        state.seen.insert(tuple, row.row_position());
                    }
                }
            }
        }

        for state in &self.foreign_keys {
            let fk = &state.foreign_key;
            let cells: Vec<Option<&Value>> = fk.fields.iter().map(|name| row.get(name)).collect();
            if cells.iter().any(Option::is_none) {
                continue;
            }
            let tuple: KeyTuple = cells.iter().map(|cell| key_of(*cell)).collect();
            if state.keys.contains(&tuple) {
                continue;
            }
            let target_cells: Vec<String> = cells.iter().map(|cell| cell.map(ToString::to_string).unwrap_or_default()).collect();
            let note = format!(
                "for \"{}\": values \"{}\" not found in the lookup table \"{}\" as \"{}\"",
                fk.fields.join(", "),
                target_cells.join(", "),
                fk.reference.resource,
                fk.reference.fields.join(", ")
            );
            errors.push(row.row_error(ErrorKind::ForeignKey, note).with_foreign_key(ForeignKeyContext {
                source_name: fk.reference.resource.clone(),
                source_keys: fk.reference.fields.clone(),
                target_keys: fk.fields.clone(),
                target_cells,
            }));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;
    use crate::row::RowEngine;
    use crate::source::InlineSource;
    use pretty_assertions::assert_eq;
    use tables_core::{FieldBuilder, SchemaBuilder, TypeRegistry};

    fn rows(schema: &Schema, data: &[&[&str]]) -> Vec<Row> {
        let engine = RowEngine::new(schema, &Header::headerless(schema), &TypeRegistry::new()).unwrap();
        data.iter()
            .enumerate()
            .map(|(index, cells)| {
                let raw: Vec<Option<Value>> = cells.iter().map(|c| Some(Value::from(*c))).collect();
                engine.build_row(&raw, index + 1, index + 2)
            })
            .collect()
    }

    fn check_all(checker: &mut IntegrityChecker, rows: &[Row]) -> Vec<(usize, &'static str)> {
        rows.iter()
            .flat_map(|row| {
                checker
                    .check_row(row)
                    .into_iter()
                    .map(|e| (e.row_position().unwrap_or_default(), e.code()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn test_unique_skips_nulls() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("code", "string").unique(true).build())
            .build();
        let rows = rows(&schema, &[&["a"], &[""], &[""], &["a"]]);
        let mut checker = IntegrityChecker::new(&schema, ForeignKeyLookup::default());
        assert!(checker.is_active());
        assert_eq!(check_all(&mut checker, &rows), vec![(5, "unique-error")]);
    }

    #[test]
    fn test_unique_note() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("id", "integer").unique(true).build())
            .build();
        let rows = rows(&schema, &[&["1"], &["1"]]);
        let mut checker = IntegrityChecker::new(&schema, ForeignKeyLookup::default());
        assert!(checker.check_row(&rows[0]).is_empty());
        let errors = checker.check_row(&rows[1]);
        assert_eq!(errors[0].note, "the same as in the row at position 2");
        assert_eq!(errors[0].field_name(), Some("id"));
    }

    #[test]
    fn test_composite_primary_key() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("id1", "string").build())
            .field(FieldBuilder::new("id2", "integer").build())
            .primary_key(["id1", "id2"])
            .build();
        let rows = rows(&schema, &[&["a", "1"], &["a", "2"], &["a", "1"]]);
        let mut checker = IntegrityChecker::new(&schema, ForeignKeyLookup::default());
        assert_eq!(check_all(&mut checker, &rows), vec![(4, "primary-key")]);
    }

    #[test]
    fn test_self_referencing_foreign_key() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("id", "integer").build())
            .field(FieldBuilder::new("next_id", "integer").build())
            .foreign_key(["next_id"], "", ["id"])
            .build();
        assert_eq!(IntegrityRequirement::of(&schema), IntegrityRequirement::Materialized);
        let resource = Resource::new(
            "chain",
            InlineSource::from_text(vec![vec!["id", "next_id"], vec!["1", "2"], vec!["2", "4"], vec!["4", ""]]),
            schema.clone(),
        );
        let lookup = ForeignKeyLookup::build(&resource, None, &ValidationContext::new()).unwrap();
        let mut checker = IntegrityChecker::new(&schema, lookup);
        let rows = rows(&schema, &[&["1", "2"], &["2", "3"], &["3", ""]]);
        let errors: Vec<ValidationError> = rows.iter().flat_map(|row| checker.check_row(row)).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "foreign-key");
        assert_eq!(
            errors[0].note,
            "for \"next_id\": values \"3\" not found in the lookup table \"\" as \"id\""
        );
        let fk = errors[0].foreign_key.as_ref().unwrap();
        assert_eq!(fk.target_cells, vec!["3"]);
        assert_eq!(fk.source_keys, vec!["id"]);
    }

    #[test]
    fn test_unresolved_reference() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("country", "string").build())
            .foreign_key(["country"], "countries", ["code"])
            .build();
        assert_eq!(IntegrityRequirement::of(&schema), IntegrityRequirement::Streaming);
        let resource = Resource::new("people", InlineSource::default(), schema);
        let err = ForeignKeyLookup::build(&resource, None, &ValidationContext::new()).unwrap_err();
        assert_eq!(err.code(), "resource-error");
    }
}
