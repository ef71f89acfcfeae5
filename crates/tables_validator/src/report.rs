//! Validation reports.
//!
//! A [`Report`] holds one [`ReportTask`] per validated table plus any
//! errors raised before a task could start. Both serialize to the stable
//! camelCase wire format.

use crate::checks::Checklist;
use crate::error::ValidationError;
use crate::row::Row;
use crate::source::Resource;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt::Write as _;
use std::time::Duration;
use tracing::warn;

/// Default projection of [`ReportTask::flatten`].
pub const DEFAULT_TASK_FLATTEN: [&str; 3] = ["rowNumber", "fieldNumber", "type"];

fn seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub tasks: usize,
    pub errors: usize,
    pub warnings: usize,
    pub seconds: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// Data rows read
    pub rows: usize,
    /// Fields of the effective schema
    pub fields: usize,
    pub errors: usize,
    pub warnings: usize,
    pub seconds: f64,
}

/// Outcome of validating one table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTask {
    pub name: String,
    pub place: String,
    pub valid: bool,
    /// Set when a row or error limit stopped the task early
    pub partial: bool,
    pub labels: Vec<String>,
    pub stats: TaskStats,
    pub warnings: Vec<String>,
    pub errors: Vec<ValidationError>,
}

impl ReportTask {
    /// The only error of the task, if it has exactly one.
    pub fn error(&self) -> Option<&ValidationError> {
        match self.errors.as_slice() {
            [error] => Some(error),
            _ => None,
        }
    }

    /// Projects the given properties of every error, `null` where absent.
    pub fn flatten(&self, properties: &[&str]) -> Vec<Vec<JsonValue>> {
        self.errors
            .iter()
            .map(|error| properties.iter().map(|property| error.get(property)).collect())
            .collect()
    }

    /// Error codes in report order.
    pub fn error_codes(&self) -> Vec<&'static str> {
        self.errors.iter().map(ValidationError::code).collect()
    }

    pub fn to_summary(&self) -> String {
        let mut out = String::new();
        for warning in &self.warnings {
            let _ = writeln!(out, "> {warning}");
        }
        let _ = writeln!(out, "File Place    {}", self.place);
        let _ = writeln!(out, "Total Time    {} Seconds", self.stats.seconds);
        let _ = writeln!(out, "Rows Checked  {}", self.stats.rows);
        if !self.errors.is_empty() {
            let _ = writeln!(out, "Total Errors  {}", self.errors.len());
            let mut titles: Vec<(&str, usize)> = Vec::new();
            for error in &self.errors {
                let title = error.kind.title();
                match titles.iter_mut().find(|(t, _)| *t == title) {
                    Some((_, count)) => *count += 1,
                    None => titles.push((title, 1)),
                }
            }
            for (title, count) in titles {
                let _ = writeln!(out, "{title}  {count}");
            }
        }
        out
    }
}

/// Outcome of a validation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub valid: bool,
    /// Totals over the run-level entries and every task
    pub stats: ReportStats,
    /// Warnings not tied to a task
    pub warnings: Vec<String>,
    /// Errors that prevented any task from running
    pub errors: Vec<ValidationError>,
    pub tasks: Vec<ReportTask>,
}

impl Report {
    pub fn from_tasks(tasks: Vec<ReportTask>, elapsed: Duration) -> Self {
        Self::build(tasks, Vec::new(), elapsed)
    }

    /// A report for a run that failed before validating any table.
    pub fn from_errors(errors: Vec<ValidationError>, elapsed: Duration) -> Self {
        Self::build(Vec::new(), errors, elapsed)
    }

    fn build(tasks: Vec<ReportTask>, errors: Vec<ValidationError>, elapsed: Duration) -> Self {
        let error_count = errors.len() + tasks.iter().map(|task| task.stats.errors).sum::<usize>();
        let warning_count = tasks.iter().map(|task| task.stats.warnings).sum::<usize>();
        Self {
            valid: error_count == 0 && tasks.iter().all(|task| task.valid),
            stats: ReportStats {
                tasks: tasks.len(),
                errors: error_count,
                warnings: warning_count,
                seconds: seconds(elapsed),
            },
            warnings: Vec::new(),
            errors,
            tasks,
        }
    }

    /// Adds a run-level warning.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self.stats.warnings += 1;
        self
    }

    /// The only task, if there is exactly one.
    pub fn task(&self) -> Option<&ReportTask> {
        match self.tasks.as_slice() {
            [task] => Some(task),
            _ => None,
        }
    }

    /// The only error of the whole report, if there is exactly one.
    pub fn error(&self) -> Option<&ValidationError> {
        if self.stats.errors != 1 {
            return None;
        }
        self.errors.first().or_else(|| self.tasks.iter().find_map(ReportTask::error))
    }

    /// Projects the given properties of every error across all tasks.
    ///
    /// `taskNumber` resolves to the 1-based task index; run-level errors
    /// have no task number.
    pub fn flatten(&self, properties: &[&str]) -> Vec<Vec<JsonValue>> {
        let run_errors = self.errors.iter().map(|error| (None, error));
        let task_errors = self
            .tasks
            .iter()
            .enumerate()
            .flat_map(|(index, task)| task.errors.iter().map(move |error| (Some(index + 1), error)));
        run_errors
            .chain(task_errors)
            .map(|(task_number, error)| {
                properties
                    .iter()
                    .map(|property| match *property {
                        "taskNumber" => task_number.map_or(JsonValue::Null, JsonValue::from),
                        other => error.get(other),
                    })
                    .collect()
            })
            .collect()
    }

    /// Human-readable summary of every task.
    pub fn to_summary(&self) -> String {
        let mut out = String::new();
        for warning in &self.warnings {
            let _ = writeln!(out, "> {warning}");
        }
        for error in &self.errors {
            let _ = writeln!(out, "{}: {}", error.code(), error.message());
        }
        for task in &self.tasks {
            let prefix = if task.valid { "valid" } else { "invalid" };
            let _ = writeln!(out, "# {}", "-".repeat(prefix.len()));
            let _ = writeln!(out, "# {prefix}: {}", task.place);
            let _ = writeln!(out, "# {}\n", "-".repeat(prefix.len()));
            let _ = writeln!(out, "## Summary\n");
            out.push_str(&task.to_summary());
            if !task.errors.is_empty() {
                let _ = writeln!(out, "\n## Errors\n");
                for error in &task.errors {
                    let row = error.row_number().map(|n| n.to_string()).unwrap_or_default();
                    let field = error.field_number().map(|n| n.to_string()).unwrap_or_default();
                    let _ = writeln!(out, "{row:>5} {field:>5}  {:<20} {}", error.code(), error.message());
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Collects the errors of one task, applying filters and the error limit.
pub(crate) struct TaskBuilder<'a> {
    name: String,
    place: String,
    checklist: &'a Checklist,
    limit_errors: usize,
    labels: Vec<String>,
    rows: usize,
    fields: usize,
    errors: Vec<ValidationError>,
    warnings: Vec<String>,
    partial: bool,
}

impl<'a> TaskBuilder<'a> {
    pub fn new(resource: &Resource, checklist: &'a Checklist, limit_errors: usize) -> Self {
        Self {
            name: resource.name.clone(),
            place: resource.place.clone(),
            checklist,
            limit_errors,
            labels: Vec::new(),
            rows: 0,
            fields: resource.schema.fields.len(),
            errors: Vec::new(),
            warnings: Vec::new(),
            partial: false,
        }
    }

    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.labels = labels;
    }

    pub fn set_fields(&mut self, fields: usize) {
        self.fields = fields;
    }

    pub fn partial(&self) -> bool {
        self.partial
    }

    /// Adds an error if it passes the pick/skip filters.
    pub fn push(&mut self, error: ValidationError) {
        if self.checklist.accepts(&error) {
            self.errors.push(error);
        }
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        for error in errors {
            self.push(error);
        }
    }

    /// Adds a fatal error; these bypass the filters.
    pub fn push_fatal(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_row(&mut self, row: &Row) {
        self.rows += 1;
        self.extend(row.errors().iter().cloned());
    }

    /// Truncates to the error limit and marks the task partial once the
    /// limit is reached.
    pub fn reached_error_limit(&mut self) -> bool {
        if self.limit_errors == 0 || self.errors.len() < self.limit_errors {
            return false;
        }
        if !self.partial {
            warn!(resource = %self.name, limit = self.limit_errors, "error limit reached");
            self.errors.truncate(self.limit_errors);
            self.warnings.push(format!("reached error limit: {}", self.limit_errors));
            self.partial = true;
        }
        true
    }

    pub fn reach_row_limit(&mut self, limit_rows: usize) {
        warn!(resource = %self.name, limit = limit_rows, "row limit reached");
        self.warnings.push(format!("reached row limit: {limit_rows}"));
        self.partial = true;
    }

    pub fn finish(self, elapsed: Duration) -> ReportTask {
        ReportTask {
            valid: self.errors.is_empty(),
            stats: TaskStats {
                rows: self.rows,
                fields: self.fields,
                errors: self.errors.len(),
                warnings: self.warnings.len(),
                seconds: seconds(elapsed),
            },
            name: self.name,
            place: self.place,
            partial: self.partial,
            labels: self.labels,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, RowContext};
    use crate::source::InlineSource;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tables_core::Schema;

    fn resource() -> Resource {
        Resource::new("table", InlineSource::default(), Schema::new())
    }

    fn row_error(kind: ErrorKind, row_number: usize) -> ValidationError {
        ValidationError::row(
            kind,
            "",
            &RowContext {
                cells: vec![],
                row_number,
                row_position: row_number + 1,
            },
        )
    }

    #[test]
    fn test_error_limit() {
        let checklist = Checklist::new();
        let mut builder = TaskBuilder::new(&resource(), &checklist, 2);
        builder.extend((1..=3).map(|n| row_error(ErrorKind::BlankRow, n)));
        assert!(builder.reached_error_limit());
        let task = builder.finish(Duration::from_millis(5));
        assert!(task.partial);
        assert_eq!(task.errors.len(), 2);
        assert_eq!(task.warnings, vec!["reached error limit: 2"]);
        assert_eq!(task.stats.seconds, 0.005);
    }

    #[test]
    fn test_filters_apply_on_push() {
        let checklist = Checklist::new().with_skip_errors(["blank-row"]);
        let mut builder = TaskBuilder::new(&resource(), &checklist, 0);
        builder.push(row_error(ErrorKind::BlankRow, 1));
        builder.push(row_error(ErrorKind::PrimaryKey, 2));
        builder.push_fatal(ValidationError::general(ErrorKind::Source, "gone"));
        let task = builder.finish(Duration::ZERO);
        assert_eq!(task.error_codes(), vec!["primary-key", "source-error"]);
        assert!(!task.valid);
    }

    #[test]
    fn test_report_flatten() {
        let checklist = Checklist::new();
        let mut builder = TaskBuilder::new(&resource(), &checklist, 0);
        builder.push(row_error(ErrorKind::BlankRow, 3));
        let report = Report::from_tasks(vec![builder.finish(Duration::ZERO)], Duration::ZERO);
        assert!(!report.valid);
        assert_eq!(
            report.flatten(&["taskNumber", "rowNumber", "fieldNumber", "type"]),
            vec![vec![json!(1), json!(3), JsonValue::Null, json!("blank-row")]]
        );
        assert_eq!(report.error().map(ValidationError::code), Some("blank-row"));
        assert_eq!(
            report.task().map(|task| task.flatten(&DEFAULT_TASK_FLATTEN)),
            Some(vec![vec![json!(3), JsonValue::Null, json!("blank-row")]])
        );
    }

    #[test]
    fn test_valid_report_serializes() {
        let checklist = Checklist::new();
        let report = Report::from_tasks(
            vec![TaskBuilder::new(&resource(), &checklist, 0).finish(Duration::ZERO)],
            Duration::ZERO,
        );
        assert!(report.valid);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["tasks"][0]["name"], json!("table"));
        assert_eq!(value["tasks"][0]["place"], json!("<memory>"));
        assert_eq!(value["stats"]["tasks"], json!(1));
        assert!(report.to_summary().contains("# valid: <memory>"));
    }

    #[test]
    fn test_task_warnings_roll_up() {
        let checklist = Checklist::new();
        let mut limited = TaskBuilder::new(&resource(), &checklist, 1);
        limited.push(row_error(ErrorKind::BlankRow, 1));
        assert!(limited.reached_error_limit());
        let mut truncated = TaskBuilder::new(&resource(), &checklist, 0);
        truncated.reach_row_limit(10);
        let report = Report::from_tasks(
            vec![limited.finish(Duration::ZERO), truncated.finish(Duration::ZERO)],
            Duration::ZERO,
        );
        assert_eq!(report.stats.warnings, 2);
        assert_eq!(report.stats.errors, 1);
        assert!(report.warnings.is_empty());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["stats"]["warnings"], json!(2));

        let report = report.with_warning("validated sequentially");
        assert_eq!(report.stats.warnings, 3);
        assert_eq!(report.warnings, vec!["validated sequentially"]);
    }
}
