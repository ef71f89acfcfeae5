//! Typed rows and the per-row casting engine.

use crate::error::{CellContext, ErrorKind, RowContext, ValidationError};
use crate::header::Header;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tables_core::{Notes, Result, Schema, SchemaCaster, TypeRegistry, Value};

/// Field layout shared by every row of a table.
#[derive(Debug)]
struct RowLayout {
    field_names: Vec<String>,
    field_positions: Vec<usize>,
}

/// One data row after casting.
///
/// `cells` always holds one entry per effective field; absent, missing and
/// uncastable cells are `None`.
#[derive(Debug, Clone)]
pub struct Row {
    cells: Vec<Option<Value>>,
    raw_cells: Vec<String>,
    layout: Arc<RowLayout>,
    row_number: usize,
    row_position: usize,
    errors: Vec<ValidationError>,
    blank_cells: BTreeMap<String, Option<Value>>,
    error_cells: BTreeMap<String, Value>,
}

impl Row {
    /// Cast values in field order.
    pub fn cells(&self) -> &[Option<Value>] {
        &self.cells
    }

    /// Raw source cells rendered as text, `""` for absent values.
    pub fn raw_cells(&self) -> &[String] {
        &self.raw_cells
    }

    pub fn field_names(&self) -> &[String] {
        &self.layout.field_names
    }

    /// Data row count, starting at 1.
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    /// Physical position in the source, header and comment rows included.
    pub fn row_position(&self) -> usize {
        self.row_position
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Fields whose cell was absent or a missing value.
    pub fn blank_cells(&self) -> &BTreeMap<String, Option<Value>> {
        &self.blank_cells
    }

    /// Fields whose cell failed to cast, with the raw cell.
    pub fn error_cells(&self) -> &BTreeMap<String, Value> {
        &self.error_cells
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Cast value of a field; `None` for unknown fields and empty cells.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field_index(name).and_then(|index| self.cells[index].as_ref())
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.layout.field_names.iter().position(|field| field == name)
    }

    pub fn to_list(&self) -> Vec<Option<Value>> {
        self.cells.clone()
    }

    /// `(name, value)` pairs in field order.
    pub fn to_dict(&self) -> Vec<(String, Option<Value>)> {
        self.layout
            .field_names
            .iter()
            .cloned()
            .zip(self.cells.iter().cloned())
            .collect()
    }

    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .layout
            .field_names
            .iter()
            .zip(&self.cells)
            .map(|(name, cell)| (name.clone(), cell.as_ref().map(Value::to_json).unwrap_or(JsonValue::Null)))
            .collect();
        JsonValue::Object(map)
    }

    /// Row addressing for errors raised against this row.
    pub fn context(&self) -> RowContext {
        RowContext {
            cells: self.raw_cells.clone(),
            row_number: self.row_number,
            row_position: self.row_position,
        }
    }

    /// A row-level error addressed to this row.
    pub fn row_error(&self, kind: ErrorKind, note: impl Into<String>) -> ValidationError {
        ValidationError::row(kind, note, &self.context())
    }

    /// A cell-level error addressed to one field of this row.
    pub fn cell_error(&self, kind: ErrorKind, note: impl Into<String>, field_name: &str) -> ValidationError {
        let index = self.field_index(field_name);
        let field_position = index.map(|i| self.layout.field_positions[i]).unwrap_or_default();
        let cell = field_position
            .checked_sub(1)
            .and_then(|column| self.raw_cells.get(column))
            .cloned()
            .unwrap_or_default();
        ValidationError::cell(
            kind,
            note,
            &self.context(),
            CellContext {
                cell,
                field_name: field_name.to_string(),
                field_number: index.map(|i| i + 1).unwrap_or_default(),
                field_position,
            },
        )
    }

    pub(crate) fn extend_errors(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }
}

/// Casts raw source rows into [`Row`]s.
///
/// Built once per table from the effective schema and the reconciled
/// header.
#[derive(Debug)]
pub struct RowEngine {
    caster: SchemaCaster,
    layout: Arc<RowLayout>,
    mapped_columns: HashSet<usize>,
}

impl RowEngine {
    pub fn new(schema: &Schema, header: &Header, registry: &TypeRegistry) -> Result<Self> {
        let caster = schema.create_caster(registry)?;
        let layout = RowLayout {
            field_names: header.field_names().to_vec(),
            field_positions: header.field_positions().to_vec(),
        };
        let mapped_columns = layout.field_positions.iter().copied().collect();
        Ok(Self {
            caster,
            layout: Arc::new(layout),
            mapped_columns,
        })
    }

    pub fn field_names(&self) -> &[String] {
        &self.layout.field_names
    }

    /// Casts one raw row.
    ///
    /// Errors are ordered blank-row, missing/extra cells, type errors, then
    /// constraint errors, each group by ascending field position. A blank
    /// row carries only its blank-row error.
    pub fn build_row(&self, raw: &[Option<Value>], row_number: usize, row_position: usize) -> Row {
        let raw_cells: Vec<String> = raw
            .iter()
            .map(|cell| cell.as_ref().map(ToString::to_string).unwrap_or_default())
            .collect();
        let mut row = Row {
            cells: vec![None; self.caster.len()],
            raw_cells,
            layout: Arc::clone(&self.layout),
            row_number,
            row_position,
            errors: Vec::new(),
            blank_cells: BTreeMap::new(),
            error_cells: BTreeMap::new(),
        };
        let context = row.context();

        let sources: Vec<Option<&Value>> = self
            .layout
            .field_positions
            .iter()
            .map(|position| raw.get(position - 1).and_then(Option::as_ref))
            .collect();

        let extra_columns: Vec<usize> = (1..=raw.len())
            .filter(|column| !self.mapped_columns.contains(column))
            .collect();

        let fields_blank = self
            .caster
            .fields()
            .iter()
            .zip(&sources)
            .all(|(field, source)| field.is_missing(*source));
        let extras_blank = extra_columns
            .iter()
            .all(|column| matches!(&raw[column - 1], None) || row.raw_cells[column - 1].is_empty());
        if fields_blank && extras_blank {
            for (name, source) in self.layout.field_names.iter().zip(&sources) {
                row.blank_cells.insert(name.clone(), source.cloned());
            }
            row.errors.push(ValidationError::row(ErrorKind::BlankRow, "", &context));
            return row;
        }

        let mut structural = Vec::new();
        let mut type_errors = Vec::new();
        let mut constraint_errors = Vec::new();

        for (index, field) in self.caster.fields().iter().enumerate() {
            let name = &self.layout.field_names[index];
            let position = self.layout.field_positions[index];
            let source = sources[index];
            let cell_context = CellContext {
                cell: source.map(ToString::to_string).unwrap_or_default(),
                field_name: name.clone(),
                field_number: index + 1,
                field_position: position,
            };

            if position > raw.len() {
                structural.push(ValidationError::cell(
                    ErrorKind::MissingCell,
                    "",
                    &context,
                    cell_context.clone(),
                ));
            }

            let (value, notes) = field.read_cell(source);
            let mut constraint_notes = Notes::new();
            match notes.get("type") {
                Some(note) => {
                    type_errors.push(ValidationError::cell(
                        ErrorKind::TypeError,
                        note,
                        &context,
                        cell_context.clone(),
                    ));
                    if let Some(source) = source {
                        row.error_cells.insert(name.clone(), source.clone());
                    }
                }
                None => {
                    if value.is_none() {
                        row.blank_cells.insert(name.clone(), source.cloned());
                    }
                    constraint_notes = field.check_constraints(value.as_ref());
                }
            }
            for (_, note) in constraint_notes.iter() {
                constraint_errors.push(ValidationError::cell(
                    ErrorKind::ConstraintError,
                    note,
                    &context,
                    cell_context.clone(),
                ));
            }
            row.cells[index] = value;
        }

        for column in extra_columns {
            structural.push(ValidationError::cell(
                ErrorKind::ExtraCell,
                "",
                &context,
                CellContext {
                    cell: row.raw_cells[column - 1].clone(),
                    field_name: String::new(),
                    field_number: column,
                    field_position: column,
                },
            ));
        }

        row.errors.extend(structural);
        row.errors.extend(type_errors);
        row.errors.extend(constraint_errors);
        row
    }
}
