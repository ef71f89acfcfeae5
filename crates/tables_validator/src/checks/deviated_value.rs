use super::{check_error, Check};
use crate::error::{ErrorKind, ValidationError};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use tables_core::{Schema, Value};

fn default_average() -> String {
    "mean".to_string()
}

fn default_interval() -> f64 {
    3.0
}

const AVERAGES: [&str; 3] = ["mean", "median", "mode"];

/// Reports numeric values further than `interval` standard deviations
/// from the field's average.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviatedValue {
    pub field_name: String,

    /// One of `mean`, `median` or `mode`
    #[serde(default = "default_average")]
    pub average: String,

    #[serde(default = "default_interval")]
    pub interval: f64,

    #[serde(skip)]
    cells: Vec<(f64, Value, usize)>,
}

impl DeviatedValue {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            average: default_average(),
            interval: default_interval(),
            cells: Vec::new(),
        }
    }

    pub fn with_average(mut self, average: impl Into<String>) -> Self {
        self.average = average.into();
        self
    }

    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

/// Most common value; ties go to the value seen first.
fn mode(values: &[f64]) -> f64 {
    let mut best = (values[0], 0);
    for (index, value) in values.iter().enumerate() {
        if values[..index].contains(value) {
            continue;
        }
        let count = values.iter().filter(|other| *other == value).count();
        if count > best.1 {
            best = (*value, count);
        }
    }
    best.0
}

/// Sample standard deviation.
fn stdev(values: &[f64]) -> f64 {
    let average = mean(values);
    let variance = values.iter().map(|v| (v - average).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

impl Check for DeviatedValue {
    fn code(&self) -> &'static str {
        "deviated-value"
    }

    fn validate_start(&mut self, schema: &Schema) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match schema.get_field(&self.field_name) {
            Err(_) => errors.push(check_error(format!(
                "deviated value check requires field \"{}\" to exist",
                self.field_name
            ))),
            Ok(field) if !matches!(field.field_type.as_str(), "integer" | "number") => {
                errors.push(check_error(format!(
                    "deviated value check requires field \"{}\" to be numeric",
                    self.field_name
                )))
            }
            Ok(_) => {}
        }
        if !AVERAGES.contains(&self.average.as_str()) {
            errors.push(check_error(format!(
                "deviated value check supports only average functions \"{}\"",
                AVERAGES.join(", ")
            )));
        }
        errors
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        if let Some(cell) = row.get(&self.field_name) {
            if let Some(number) = cell.as_f64() {
                self.cells.push((number, cell.clone(), row.row_position()));
            }
        }
        Vec::new()
    }

    fn validate_end(&mut self) -> Vec<ValidationError> {
        if self.cells.len() < 2 {
            return Vec::new();
        }
        let values: Vec<f64> = self.cells.iter().map(|(number, _, _)| *number).collect();
        let average = match self.average.as_str() {
            "median" => median(&values),
            "mode" => mode(&values),
            _ => mean(&values),
        };
        let spread = stdev(&values) * self.interval;
        let (minimum, maximum) = (average - spread, average + spread);
        self.cells
            .iter()
            .filter(|(number, _, _)| *number < minimum || *number > maximum)
            .map(|(_, cell, position)| {
                ValidationError::general(
                    ErrorKind::DeviatedValue,
                    format!(
                        "value \"{cell}\" in row at position \"{position}\" and field \"{}\" is deviated \"[{minimum:.2}, {maximum:.2}]\"",
                        self.field_name
                    ),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::tests_support::{rows, schema};
    use pretty_assertions::assert_eq;

    fn run(check: &mut DeviatedValue, values: &[&str]) -> Vec<ValidationError> {
        let fields = [("temperature", "integer")];
        let data: Vec<Vec<&str>> = values.iter().map(|v| vec![*v]).collect();
        let data: Vec<&[&str]> = data.iter().map(Vec::as_slice).collect();
        assert!(check.validate_start(&schema(&fields)).is_empty());
        for row in rows(&fields, &data) {
            check.validate_row(&row);
        }
        check.validate_end()
    }

    #[test]
    fn test_deviated_value() {
        let mut values = vec!["1"; 20];
        values.push("100");
        let errors = run(&mut DeviatedValue::new("temperature"), &values);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "deviated-value");
        assert!(errors[0].note.starts_with("value \"100\" in row at position \"22\" and field \"temperature\""));
    }

    #[test]
    fn test_too_few_values() {
        assert!(run(&mut DeviatedValue::new("temperature"), &["1"]).is_empty());
    }

    #[test]
    fn test_averages() {
        assert_eq!(median(&[3.0, 1.0, 2.0, 10.0]), 2.5);
        assert_eq!(mode(&[1.0, 2.0, 2.0, 3.0, 3.0]), 2.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(stdev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), (32.0f64 / 7.0).sqrt());
    }

    #[test]
    fn test_start_errors() {
        let fields = [("name", "string")];
        let errors = DeviatedValue::new("name").with_average("max").validate_start(&schema(&fields));
        let notes: Vec<_> = errors.iter().map(|e| e.note.as_str()).collect();
        assert_eq!(
            notes,
            vec![
                "deviated value check requires field \"name\" to be numeric",
                "deviated value check supports only average functions \"mean, median, mode\"",
            ]
        );
    }
}
