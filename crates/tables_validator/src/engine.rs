//! Main validation engine.
//!
//! [`TableValidator`] drives one table through header reconciliation, row
//! casting, integrity checks and the checklist, collecting everything into a
//! [`Report`].

use crate::checks::{Check, Checklist};
use crate::error::{ErrorKind, ValidationError};
use crate::integrity::{ForeignKeyLookup, IntegrityChecker, IntegrityRequirement};
use crate::package::Package;
use crate::reader::TableReader;
use crate::report::{Report, ReportTask, TaskBuilder};
use crate::row::Row;
use crate::source::{InlineSource, Resource};
use std::sync::Arc;
use std::time::Instant;
use tables_core::{Result, Schema, ValidationContext};
use tracing::{debug, info, warn};

/// Validation engine for tables and packages.
///
/// # Example
///
/// ```rust
/// use tables_core::{FieldBuilder, SchemaBuilder, ValidationContext};
/// use tables_validator::{Checklist, InlineSource, Resource, TableValidator};
///
/// let schema = SchemaBuilder::new()
///     .field(FieldBuilder::new("id", "integer").build())
///     .field(FieldBuilder::new("name", "string").build())
///     .build();
/// let source = InlineSource::from_text(vec![vec!["id", "name"], vec!["1", "english"]]);
/// let resource = Resource::new("table", source, schema);
///
/// let validator = TableValidator::new(ValidationContext::new());
/// let report = validator.validate(&resource, &Checklist::new());
///
/// if report.valid {
///     println!("Validation passed!");
/// } else {
///     print!("{}", report.to_summary());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableValidator {
    context: ValidationContext,
}

impl TableValidator {
    pub fn new(context: ValidationContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    /// Validates a standalone table.
    ///
    /// Foreign keys may only reference the table itself; other references
    /// end the task with a `resource-error`.
    pub fn validate(&self, resource: &Resource, checklist: &Checklist) -> Report {
        let start = Instant::now();
        let task = self.validate_task(resource, None, checklist);
        Report::from_tasks(vec![task], start.elapsed())
    }

    /// Validates one table, resolving foreign keys against `package`.
    ///
    /// Always returns a task: fatal conditions become its single error.
    pub fn validate_task(&self, resource: &Resource, package: Option<&Package>, checklist: &Checklist) -> ReportTask {
        let start = Instant::now();
        info!(resource = %resource.name, place = %resource.place, "validating table");
        let mut task = TaskBuilder::new(resource, checklist, self.context.limit_errors);

        let metadata = self.metadata_errors(&resource.schema, checklist);
        if !metadata.is_empty() {
            warn!(resource = %resource.name, errors = metadata.len(), "invalid metadata, rows not read");
            for error in metadata {
                task.push_fatal(error);
            }
            return task.finish(start.elapsed());
        }

        if let Err(err) = self.run(resource, package, checklist, &mut task) {
            warn!(resource = %resource.name, error = %err, "validation task failed");
            task.push_fatal(ValidationError::from_table_error(&err));
        }

        let report = task.finish(start.elapsed());
        info!(
            resource = %resource.name,
            valid = report.valid,
            rows = report.stats.rows,
            errors = report.stats.errors,
            "table validated"
        );
        report
    }

    /// Structural validation of a schema on its own.
    pub fn validate_definition(&self, schema: &Schema) -> Report {
        let start = Instant::now();
        let errors = self.metadata_errors(schema, &Checklist::new());
        Report::from_errors(errors, start.elapsed())
    }

    /// Reads and casts every row of a table.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error met while opening or reading.
    pub fn read_rows(&self, resource: &Resource) -> Result<Vec<Row>> {
        TableReader::open(resource, &self.context)?.collect()
    }

    fn metadata_errors(&self, schema: &Schema, checklist: &Checklist) -> Vec<ValidationError> {
        schema
            .metadata_validate_with(&self.context.registry)
            .iter()
            .map(ValidationError::from_table_error)
            .chain(checklist.metadata_validate())
            .collect()
    }

    /// Buffers a one-shot source when the integrity checks need two passes.
    fn prepare(&self, resource: &Resource) -> Result<Resource> {
        let requirement = IntegrityRequirement::of(&resource.schema);
        if requirement == IntegrityRequirement::Materialized && !resource.source.restartable() {
            debug!(resource = %resource.name, "buffering one-shot source for a second pass");
            let buffered = InlineSource::materialize(resource.source.as_ref())?;
            return Ok(resource.clone().with_source(Arc::new(buffered)));
        }
        Ok(resource.clone())
    }

    fn start_checks(&self, checklist: &Checklist, schema: &Schema, task: &mut TaskBuilder<'_>) -> Vec<Box<dyn Check>> {
        let mut checks = Vec::new();
        for mut check in checklist.connect() {
            let errors = check.validate_start(schema);
            let failed = errors.iter().any(|error| error.kind == ErrorKind::Check);
            task.extend(errors);
            if failed {
                warn!(check = check.code(), "check removed after a check-error");
            } else {
                checks.push(check);
            }
        }
        checks
    }

    fn run(
        &self,
        resource: &Resource,
        package: Option<&Package>,
        checklist: &Checklist,
        task: &mut TaskBuilder<'_>,
    ) -> Result<()> {
        let resource = self.prepare(resource)?;
        let mut reader = TableReader::open(&resource, &self.context)?;
        let schema = reader.schema().clone();
        task.set_labels(reader.header().labels().to_vec());
        task.set_fields(schema.fields.len());
        task.extend(reader.header().errors().iter().cloned());

        let lookup = ForeignKeyLookup::build(&resource.clone().with_schema(schema.clone()), package, &self.context)?;
        let mut integrity = IntegrityChecker::new(&schema, lookup);
        let mut checks = self.start_checks(checklist, &schema, task);
        if task.reached_error_limit() {
            return Ok(());
        }

        for row in reader.by_ref() {
            let mut row = row?;
            let mut extra = integrity.check_row(&row);
            for check in &mut checks {
                extra.extend(check.validate_row(&row));
            }
            row.extend_errors(extra);
            task.add_row(&row);

            if let Some(limit_rows) = self.context.limit_rows {
                if row.row_number() >= limit_rows {
                    task.reach_row_limit(limit_rows);
                    break;
                }
            }
            if task.reached_error_limit() {
                break;
            }
        }

        if !task.partial() {
            for check in &mut checks {
                task.extend(check.validate_end());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckDescriptor;
    use crate::checks::DuplicateRow;
    use crate::source::OnceSource;
    use pretty_assertions::assert_eq;
    use tables_core::{FieldBuilder, SchemaBuilder, Value};

    fn schema() -> Schema {
        SchemaBuilder::new()
            .field(FieldBuilder::new("id", "integer").build())
            .field(FieldBuilder::new("name", "string").build())
            .build()
    }

    fn resource(rows: Vec<Vec<&str>>) -> Resource {
        Resource::new("table", InlineSource::from_text(rows), schema())
    }

    #[test]
    fn test_valid_table() {
        let report = TableValidator::default().validate(
            &resource(vec![vec!["id", "name"], vec!["1", "english"], vec!["2", "中国人"]]),
            &Checklist::new(),
        );
        assert!(report.valid);
        let task = report.task().unwrap();
        assert_eq!(task.labels, vec!["id", "name"]);
        assert_eq!((task.stats.rows, task.stats.fields), (2, 2));
    }

    #[test]
    fn test_limit_errors() {
        let validator = TableValidator::new(ValidationContext::new().with_limit_errors(1));
        let report = validator.validate(
            &resource(vec![vec!["id", "name"], vec!["x", "a"], vec!["y", "b"]]),
            &Checklist::new(),
        );
        let task = report.task().unwrap();
        assert!(task.partial);
        assert_eq!(task.error_codes(), vec!["type-error"]);
        assert_eq!(task.warnings, vec!["reached error limit: 1"]);
    }

    #[test]
    fn test_limit_rows() {
        let validator = TableValidator::new(ValidationContext::new().with_limit_rows(1));
        let report = validator.validate(
            &resource(vec![vec!["id", "name"], vec!["1", "a"], vec!["x", "b"]]),
            &Checklist::new(),
        );
        let task = report.task().unwrap();
        assert!(report.valid);
        assert!(task.partial);
        assert_eq!(task.stats.rows, 1);
        assert_eq!(task.warnings, vec!["reached row limit: 1"]);
    }

    #[test]
    fn test_check_error_removes_check() {
        let checklist = Checklist::new().with_check(CheckDescriptor::ForbiddenValue(
            crate::checks::ForbiddenValue::new("missing", vec![]),
        ));
        let report = TableValidator::default().validate(&resource(vec![vec!["id", "name"], vec!["1", "a"]]), &checklist);
        assert_eq!(report.task().unwrap().error_codes(), vec!["check-error"]);
    }

    #[test]
    fn test_checks_run_after_integrity() {
        let checklist = Checklist::new().with_check(CheckDescriptor::DuplicateRow(DuplicateRow::new()));
        let report = TableValidator::default().validate(
            &resource(vec![vec!["id", "name"], vec!["1", "a"], vec!["1", "a"]]),
            &checklist,
        );
        assert_eq!(
            report.task().unwrap().flatten(&["rowPosition", "type"]),
            vec![vec![serde_json::json!(3), serde_json::json!("duplicate-row")]]
        );
    }

    #[test]
    fn test_invalid_schema_is_fatal() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("id", "integer").build())
            .primary_key(["nope"])
            .build();
        let resource = Resource::new("table", InlineSource::from_text(vec![vec!["id"], vec!["1"]]), schema);
        let report = TableValidator::default().validate(&resource, &Checklist::new());
        let task = report.task().unwrap();
        assert_eq!(task.error_codes(), vec!["schema-error"]);
        assert_eq!(task.stats.rows, 0);
    }

    #[test]
    fn test_self_reference_on_one_shot_source() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("id", "integer").build())
            .field(FieldBuilder::new("parent", "integer").build())
            .foreign_key(["parent"], "", ["id"])
            .build();
        let rows: Vec<Result<Vec<Option<Value>>>> = [["id", "parent"], ["1", ""], ["2", "1"], ["3", "5"]]
            .into_iter()
            .map(|row| Ok(row.iter().map(|cell| Some(Value::from(*cell))).collect()))
            .collect();
        let resource = Resource::new("tree", OnceSource::new(rows.into_iter()), schema);
        let report = TableValidator::default().validate(&resource, &Checklist::new());
        assert_eq!(
            report.task().unwrap().flatten(&["rowPosition", "type"]),
            vec![vec![serde_json::json!(4), serde_json::json!("foreign-key")]]
        );
    }

    #[test]
    fn test_read_rows() {
        let rows = TableValidator::default()
            .read_rows(&resource(vec![vec!["id", "name"], vec!["1", "a"]]))
            .unwrap();
        assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_validate_definition() {
        assert!(TableValidator::default().validate_definition(&schema()).valid);
    }
}
