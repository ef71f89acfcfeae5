use super::{check_error, Check};
use crate::error::{ErrorKind, ValidationError};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tables_core::Schema;

/// Bounds on the number of fields and rows of a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_rows: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rows: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_fields: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_fields: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fields: Option<usize>,

    #[serde(skip)]
    last_row_number: usize,
}

fn dimension_error(note: String, limit: (&str, usize), actual: (&str, usize)) -> ValidationError {
    let limits = BTreeMap::from([(limit.0.to_string(), limit.1), (actual.0.to_string(), actual.1)]);
    ValidationError::general(ErrorKind::TableDimensions, note).with_limits(limits)
}

impl TableDimensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_rows(mut self, num_rows: usize) -> Self {
        self.num_rows = Some(num_rows);
        self
    }

    pub fn with_min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = Some(min_rows);
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn with_num_fields(mut self, num_fields: usize) -> Self {
        self.num_fields = Some(num_fields);
        self
    }

    pub fn with_min_fields(mut self, min_fields: usize) -> Self {
        self.min_fields = Some(min_fields);
        self
    }

    pub fn with_max_fields(mut self, max_fields: usize) -> Self {
        self.max_fields = Some(max_fields);
        self
    }

    fn has_limits(&self) -> bool {
        [
            self.num_rows,
            self.min_rows,
            self.max_rows,
            self.num_fields,
            self.min_fields,
            self.max_fields,
        ]
        .iter()
        .any(Option::is_some)
    }
}

impl Check for TableDimensions {
    fn code(&self) -> &'static str {
        "table-dimensions"
    }

    fn validate_start(&mut self, schema: &Schema) -> Vec<ValidationError> {
        if !self.has_limits() {
            return vec![check_error("table dimensions check requires at least one limit")];
        }
        let fields = schema.fields.len();
        let mut errors = Vec::new();
        if let Some(required) = self.num_fields {
            if fields != required {
                errors.push(dimension_error(
                    format!("Current number of fields is {fields}, the required number is {required}"),
                    ("requiredNumFields", required),
                    ("numberFields", fields),
                ));
            }
        }
        if let Some(minimum) = self.min_fields {
            if fields < minimum {
                errors.push(dimension_error(
                    format!("Current number of fields is {fields}, the minimum is {minimum}"),
                    ("minFields", minimum),
                    ("numberFields", fields),
                ));
            }
        }
        if let Some(maximum) = self.max_fields {
            if fields > maximum {
                errors.push(dimension_error(
                    format!("Current number of fields is {fields}, the maximum is {maximum}"),
                    ("maxFields", maximum),
                    ("numberFields", fields),
                ));
            }
        }
        errors
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        let rows = row.row_number();
        self.last_row_number = rows;
        match self.max_rows {
            Some(maximum) if rows > maximum => vec![dimension_error(
                format!("Current number of rows is {rows}, the maximum is {maximum}"),
                ("maxRows", maximum),
                ("numberRows", rows),
            )],
            _ => Vec::new(),
        }
    }

    fn validate_end(&mut self) -> Vec<ValidationError> {
        let rows = self.last_row_number;
        let mut errors = Vec::new();
        if let Some(required) = self.num_rows {
            if rows != required {
                errors.push(dimension_error(
                    format!("Current number of rows is {rows}, the required is {required}"),
                    ("requiredNumRows", required),
                    ("numberRows", rows),
                ));
            }
        }
        if let Some(minimum) = self.min_rows {
            if rows < minimum {
                errors.push(dimension_error(
                    format!("Current number of rows is {rows}, the minimum is {minimum}"),
                    ("minRows", minimum),
                    ("numberRows", rows),
                ));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::tests_support::{rows, schema};
    use pretty_assertions::assert_eq;

    const FIELDS: [(&str, &str); 2] = [("id", "integer"), ("name", "string")];

    fn run(check: &mut TableDimensions, count: usize) -> Vec<ValidationError> {
        let data: Vec<[&str; 2]> = (0..count).map(|_| ["1", "a"]).collect();
        let data: Vec<&[&str]> = data.iter().map(|row| row.as_slice()).collect();
        let mut errors = check.validate_start(&schema(&FIELDS));
        for row in rows(&FIELDS, &data) {
            errors.extend(check.validate_row(&row));
        }
        errors.extend(check.validate_end());
        errors
    }

    #[test]
    fn test_field_limits() {
        let errors = run(&mut TableDimensions::new().with_num_fields(3).with_max_fields(1), 1);
        let notes: Vec<_> = errors.iter().map(|e| e.note.as_str()).collect();
        assert_eq!(
            notes,
            vec![
                "Current number of fields is 2, the required number is 3",
                "Current number of fields is 2, the maximum is 1",
            ]
        );
        let limits = errors[0].limits.as_ref().unwrap();
        assert_eq!(limits.get("requiredNumFields"), Some(&3));
        assert_eq!(limits.get("numberFields"), Some(&2));
    }

    #[test]
    fn test_row_limits() {
        let errors = run(&mut TableDimensions::new().with_max_rows(2), 4);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[1].note, "Current number of rows is 4, the maximum is 2");

        let errors = run(&mut TableDimensions::new().with_min_rows(5).with_num_rows(3), 3);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].note, "Current number of rows is 3, the minimum is 5");
    }

    #[test]
    fn test_empty_table() {
        let errors = run(&mut TableDimensions::new().with_min_rows(1), 0);
        assert_eq!(errors[0].limits.as_ref().unwrap().get("numberRows"), Some(&0));
    }

    #[test]
    fn test_requires_a_limit() {
        let errors = TableDimensions::new().validate_start(&schema(&FIELDS));
        assert_eq!(errors[0].code(), "check-error");
    }
}
