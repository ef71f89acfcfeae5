//! Header reconciliation.
//!
//! A [`HeaderReconciler`] collects the label rows of a source and aligns
//! them with the schema, either positionally or, in schema-sync mode, by
//! name. The resulting [`Header`] fixes which source column feeds which
//! field for the rest of the run.

use crate::error::{ErrorKind, ValidationError};
use tables_core::{Detector, Dialect, Field, Result, Schema, TableError, Value};
use tracing::debug;

/// Lifecycle of a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    AwaitingLabels,
    Reconciled,
    ReconciledWithErrors,
}

/// A reconciled header.
#[derive(Debug, Clone)]
pub struct Header {
    labels: Vec<String>,
    field_names: Vec<String>,
    field_positions: Vec<usize>,
    row_numbers: Vec<usize>,
    errors: Vec<ValidationError>,
    state: HeaderState,
}

impl Header {
    /// A header for sources without label rows: fields map to columns
    /// positionally and nothing can mismatch.
    pub fn headerless(schema: &Schema) -> Self {
        Self {
            labels: Vec::new(),
            field_names: schema.field_names(),
            field_positions: (1..=schema.fields.len()).collect(),
            row_numbers: Vec::new(),
            errors: Vec::new(),
            state: HeaderState::Reconciled,
        }
    }

    /// Raw labels after joining and trimming.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Effective field names in reading order.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// 1-based source column of each effective field.
    pub fn field_positions(&self) -> &[usize] {
        &self.field_positions
    }

    /// Physical positions of the label rows.
    pub fn row_numbers(&self) -> &[usize] {
        &self.row_numbers
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn state(&self) -> HeaderState {
        self.state
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether the source had label rows at all.
    pub fn missing(&self) -> bool {
        self.row_numbers.is_empty()
    }
}

/// Builds a [`Header`] from the label rows of a source.
#[derive(Debug)]
pub struct HeaderReconciler<'a> {
    dialect: &'a Dialect,
    detector: &'a Detector,
    rows: Vec<Vec<String>>,
    row_numbers: Vec<usize>,
    state: HeaderState,
}

impl<'a> HeaderReconciler<'a> {
    pub fn new(dialect: &'a Dialect, detector: &'a Detector) -> Self {
        Self {
            dialect,
            detector,
            rows: Vec::new(),
            row_numbers: Vec::new(),
            state: HeaderState::AwaitingLabels,
        }
    }

    pub fn state(&self) -> HeaderState {
        self.state
    }

    /// Records one label row found at a physical position.
    pub fn add_label_row(&mut self, position: usize, cells: &[Option<Value>]) {
        let labels = cells
            .iter()
            .map(|cell| cell.as_ref().map(ToString::to_string).unwrap_or_default())
            .collect();
        self.rows.push(labels);
        self.row_numbers.push(position);
    }

    /// Joins the collected rows column-wise into one label per column.
    fn joined_labels(&self) -> Vec<String> {
        let width = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        (0..width)
            .map(|column| {
                let parts: Vec<&str> = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(column))
                    .map(|label| label.trim())
                    .filter(|label| !label.is_empty())
                    .collect();
                parts.join(&self.dialect.header_join)
            })
            .collect()
    }

    fn normalize(&self, label: &str) -> String {
        if self.dialect.header_case {
            label.to_string()
        } else {
            label.to_lowercase()
        }
    }

    /// Aligns the labels with `schema`.
    ///
    /// Returns the header and the effective schema of the run, which only
    /// differs from `schema` in schema-sync mode.
    ///
    /// # Errors
    ///
    /// Returns a general error when schema-sync is requested and the labels
    /// are not unique.
    pub fn reconcile(mut self, schema: &Schema) -> Result<(Header, Schema)> {
        let labels = self.joined_labels();
        let (header, effective) = if self.detector.schema_sync {
            self.reconcile_by_name(labels, schema)?
        } else {
            (self.reconcile_by_position(labels, schema), schema.clone())
        };
        self.state = header.state;
        debug!(
            labels = header.labels.len(),
            errors = header.errors.len(),
            schema_sync = self.detector.schema_sync,
            "header reconciled"
        );
        Ok((header, effective))
    }

    fn finish(&self, labels: Vec<String>, field_names: Vec<String>, field_positions: Vec<usize>, errors: Vec<ValidationError>) -> Header {
        let state = if errors.is_empty() {
            HeaderState::Reconciled
        } else {
            HeaderState::ReconciledWithErrors
        };
        Header {
            labels,
            field_names,
            field_positions,
            row_numbers: self.row_numbers.clone(),
            errors,
            state,
        }
    }

    fn blank_header(&self, labels: &[String]) -> ValidationError {
        ValidationError::header(ErrorKind::BlankHeader, "", labels, &self.row_numbers)
    }

    fn reconcile_by_position(&self, labels: Vec<String>, schema: &Schema) -> Header {
        let field_names = schema.field_names();
        let field_positions = (1..=field_names.len()).collect();
        let rows = &self.row_numbers;

        if labels.iter().all(|label| label.is_empty()) {
            let errors = vec![self.blank_header(&labels)];
            return self.finish(labels, field_names, field_positions, errors);
        }

        let mut errors = Vec::new();
        let normalized: Vec<String> = labels.iter().map(|label| self.normalize(label)).collect();
        for (index, (name, label)) in field_names.iter().zip(&labels).enumerate() {
            let field_number = index + 1;
            if label.is_empty() {
                errors.push(ValidationError::label(
                    ErrorKind::BlankLabel,
                    "",
                    &labels,
                    rows,
                    "",
                    name.as_str(),
                    field_number,
                ));
                continue;
            }
            let earlier: Vec<String> = normalized[..index]
                .iter()
                .enumerate()
                .filter(|(_, seen)| **seen == normalized[index])
                .map(|(position, _)| (position + 1).to_string())
                .collect();
            if !earlier.is_empty() {
                errors.push(ValidationError::label(
                    ErrorKind::DuplicateLabel,
                    format!("at position \"{}\"", earlier.join(", ")),
                    &labels,
                    rows,
                    label.as_str(),
                    name.as_str(),
                    field_number,
                ));
                continue;
            }
            if self.normalize(name) != normalized[index] {
                errors.push(ValidationError::label(
                    ErrorKind::IncorrectLabel,
                    "",
                    &labels,
                    rows,
                    label.as_str(),
                    name.as_str(),
                    field_number,
                ));
            }
        }

        for (offset, label) in labels.iter().enumerate().skip(field_names.len()) {
            errors.push(ValidationError::label(
                ErrorKind::ExtraLabel,
                "",
                &labels,
                rows,
                label.as_str(),
                "",
                offset + 1,
            ));
        }

        for (offset, name) in field_names.iter().enumerate().skip(labels.len()) {
            errors.push(ValidationError::label(
                ErrorKind::MissingLabel,
                "",
                &labels,
                rows,
                "",
                name.as_str(),
                offset + 1,
            ));
        }

        self.finish(labels, field_names, field_positions, errors)
    }

    fn reconcile_by_name(&self, labels: Vec<String>, schema: &Schema) -> Result<(Header, Schema)> {
        if labels.iter().all(|label| label.is_empty()) {
            let errors = vec![self.blank_header(&labels)];
            let header = self.finish(labels, schema.field_names(), (1..=schema.fields.len()).collect(), errors);
            return Ok((header, schema.clone()));
        }

        let normalized: Vec<String> = labels.iter().map(|label| self.normalize(label)).collect();
        let mut unique = normalized.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != normalized.len() {
            return Err(TableError::general("\"schema_sync\" requires unique labels in the header"));
        }

        let rows = &self.row_numbers;
        let mut errors = Vec::new();
        let mut fields: Vec<Field> = Vec::with_capacity(labels.len());
        for (index, label) in labels.iter().enumerate() {
            let matched = schema
                .fields
                .iter()
                .find(|field| self.normalize(&field.name) == normalized[index]);
            match matched {
                Some(field) => fields.push(field.clone()),
                None if label.is_empty() => {
                    let name = format!("field{}", index + 1);
                    errors.push(ValidationError::label(
                        ErrorKind::BlankLabel,
                        "",
                        &labels,
                        rows,
                        "",
                        name.as_str(),
                        index + 1,
                    ));
                    fields.push(Field::new(name, "any"));
                }
                None => fields.push(Field::new(label.as_str(), "any")),
            }
        }

        let absent: Vec<&Field> = schema
            .fields
            .iter()
            .filter(|field| !normalized.contains(&self.normalize(&field.name)))
            .collect();
        let mut missing_number = labels.len();
        for field in &absent {
            if field.required() || schema.primary_key.contains(&field.name) {
                missing_number += 1;
                errors.push(ValidationError::label(
                    ErrorKind::MissingLabel,
                    "",
                    &labels,
                    rows,
                    "",
                    field.name.as_str(),
                    missing_number,
                ));
            }
        }

        let mut effective = schema.clone();
        effective.fields = fields;
        let present = |name: &String| effective.fields.iter().any(|field| &field.name == name);
        if !effective.primary_key.iter().all(present) {
            effective.primary_key.clear();
        }
        let foreign_keys = effective
            .foreign_keys
            .iter()
            .filter(|fk| fk.fields.iter().all(present))
            .cloned()
            .collect();
        effective.foreign_keys = foreign_keys;

        let header = self.finish(
            labels,
            effective.field_names(),
            (1..=effective.fields.len()).collect(),
            errors,
        );
        Ok((header, effective))
    }
}
