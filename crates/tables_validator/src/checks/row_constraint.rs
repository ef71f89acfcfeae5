use super::{check_error, Check};
use super::expr::{EvalValue, Expression};
use crate::error::{ErrorKind, ValidationError};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use tables_core::Schema;

/// Evaluates a boolean formula over the cells of every row.
///
/// Field names in the formula resolve to the row's typed cells; unknown
/// names and missing cells evaluate to null. A formula that fails to
/// evaluate or yields a falsy value produces a `row-constraint` error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowConstraint {
    pub formula: String,

    #[serde(skip)]
    expression: Option<Expression>,
}

impl RowConstraint {
    pub fn new(formula: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            expression: None,
        }
    }
}

impl Check for RowConstraint {
    fn code(&self) -> &'static str {
        "row-constraint"
    }

    fn validate_start(&mut self, _schema: &Schema) -> Vec<ValidationError> {
        match Expression::parse(&self.formula) {
            Ok(expression) => {
                self.expression = Some(expression);
                Vec::new()
            }
            Err(err) => vec![check_error(format!("row constraint \"{}\" is not valid: {err}", self.formula))],
        }
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        let Some(expression) = &self.expression else {
            return Vec::new();
        };
        let lookup = |name: &str| Some(EvalValue::from(row.get(name)));
        let passed = expression.eval(&lookup).map(|value| value.truthy()).unwrap_or(false);
        if passed {
            return Vec::new();
        }
        vec![row.row_error(
            ErrorKind::RowConstraint,
            format!("the row constraint to conform is \"{}\"", self.formula),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::tests_support::{rows, schema};
    use pretty_assertions::assert_eq;

    const FIELDS: [(&str, &str); 3] = [("name", "string"), ("salary", "integer"), ("bonus", "integer")];

    #[test]
    fn test_row_constraint() {
        let rows = rows(&FIELDS, &[&["alex", "100", "10"], &["john", "50", "60"], &["jim", "", "1"]]);
        let mut check = RowConstraint::new("salary == bonus * 10 or salary > bonus * 2");
        assert!(check.validate_start(&schema(&FIELDS)).is_empty());
        let positions: Vec<_> = rows
            .iter()
            .flat_map(|row| check.validate_row(row))
            .map(|e| e.row_position())
            .collect();
        assert_eq!(positions, vec![Some(3), Some(4)]);
    }

    #[test]
    fn test_note() {
        let rows = rows(&FIELDS, &[&["a", "1", "2"]]);
        let mut check = RowConstraint::new("salary > bonus");
        check.validate_start(&schema(&FIELDS));
        let errors = check.validate_row(&rows[0]);
        assert_eq!(errors[0].note, "the row constraint to conform is \"salary > bonus\"");
        assert_eq!(errors[0].code(), "row-constraint");
    }

    #[test]
    fn test_invalid_formula() {
        let mut check = RowConstraint::new("salary >");
        let errors = check.validate_start(&schema(&FIELDS));
        assert_eq!(errors[0].code(), "check-error");
    }
}
