//! Packages of related tables.

use crate::checks::Checklist;
use crate::engine::TableValidator;
use crate::error::{ErrorKind, ValidationError};
use crate::report::{Report, ReportTask};
use crate::source::{InlineSource, Resource, RowIter, TableSource};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tables_core::{Result, TableError};
use tracing::{debug, info, warn};

/// Run-level warning added when parallel validation falls back.
pub const SEQUENTIAL_FALLBACK_WARNING: &str = "inter-resource foreign keys: tables were validated sequentially";

/// Named tables validated together; foreign keys may reference siblings
/// by name.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub name: String,
    pub resources: Vec<Resource>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
        }
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn get_resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|resource| resource.name == name)
    }

    pub fn resource_names(&self) -> Vec<&str> {
        self.resources.iter().map(|resource| resource.name.as_str()).collect()
    }

    /// Whether any table references another table of the package.
    pub fn has_inter_resource_foreign_keys(&self) -> bool {
        !self.referenced_names().is_empty()
    }

    /// Names of the tables referenced by another table's foreign keys.
    pub fn referenced_names(&self) -> HashSet<&str> {
        self.resources
            .iter()
            .flat_map(|resource| &resource.schema.foreign_keys)
            .filter(|fk| !fk.is_self_reference())
            .map(|fk| fk.reference.resource.as_str())
            .collect()
    }

    /// Buffers referenced one-shot tables so they can be read once for
    /// their own task and again for every foreign key lookup.
    fn materialize_references(&self) -> Package {
        let referenced = self.referenced_names();
        let resources = self
            .resources
            .iter()
            .map(|resource| {
                if resource.source.restartable() || !referenced.contains(resource.name.as_str()) {
                    return resource.clone();
                }
                let source: Arc<dyn TableSource> = match InlineSource::materialize(resource.source.as_ref()) {
                    Ok(buffered) => {
                        debug!(
                            resource = %resource.name,
                            rows = buffered.rows().len(),
                            "buffered referenced one-shot source"
                        );
                        Arc::new(buffered)
                    }
                    Err(err) => {
                        warn!(resource = %resource.name, error = %err, "referenced source could not be buffered");
                        Arc::new(FailedSource { note: err.note() })
                    }
                };
                resource.clone().with_source(source)
            })
            .collect();
        Package {
            name: self.name.clone(),
            resources,
        }
    }
}

/// Stands in for a source whose only pass failed.
struct FailedSource {
    note: String,
}

impl TableSource for FailedSource {
    fn open(&self) -> Result<RowIter> {
        Err(TableError::source(self.note.clone()))
    }
}

impl TableValidator {
    /// Validates every table of a package in order, one task each.
    pub fn validate_package(&self, package: &Package, checklist: &Checklist) -> Report {
        let start = Instant::now();
        let errors = checklist.metadata_validate();
        if !errors.is_empty() {
            return Report::from_errors(errors, start.elapsed());
        }
        info!(package = %package.name, resources = package.resources.len(), "validating package");
        let package = &package.materialize_references();
        let tasks = package
            .resources
            .iter()
            .map(|resource| self.validate_task(resource, Some(package), checklist))
            .collect();
        Report::from_tasks(tasks, start.elapsed())
    }

    /// Validates the tables of a package concurrently, one blocking task per
    /// table.
    ///
    /// Falls back to [`validate_package`](Self::validate_package) when a
    /// table references another one, since the referenced table has to be
    /// read first.
    pub async fn validate_package_parallel(&self, package: &Package, checklist: &Checklist) -> Report {
        if package.has_inter_resource_foreign_keys() {
            info!(package = %package.name, "inter-resource foreign keys, validating sequentially");
            return self
                .validate_package(package, checklist)
                .with_warning(SEQUENTIAL_FALLBACK_WARNING);
        }
        let start = Instant::now();
        let errors = checklist.metadata_validate();
        if !errors.is_empty() {
            return Report::from_errors(errors, start.elapsed());
        }
        info!(package = %package.name, resources = package.resources.len(), "validating package in parallel");

        let checklist = Arc::new(checklist.clone());
        let handles: Vec<_> = package
            .resources
            .iter()
            .cloned()
            .map(|resource| {
                let validator = self.clone();
                let checklist = Arc::clone(&checklist);
                let name = resource.name.clone();
                let handle =
                    tokio::task::spawn_blocking(move || validator.validate_task(&resource, None, &checklist));
                (name, handle)
            })
            .collect();

        let mut tasks = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            match handle.await {
                Ok(task) => tasks.push(task),
                Err(err) => {
                    warn!(resource = %name, error = %err, "validation task aborted");
                    tasks.push(aborted_task(name, &err.to_string()));
                }
            }
        }
        Report::from_tasks(tasks, start.elapsed())
    }
}

fn aborted_task(name: String, reason: &str) -> ReportTask {
    let error = ValidationError::general(ErrorKind::Task, format!("task \"{name}\" was aborted: {reason}"));
    ReportTask {
        name,
        place: String::new(),
        valid: false,
        partial: true,
        labels: Vec::new(),
        stats: crate::report::TaskStats {
            errors: 1,
            ..Default::default()
        },
        warnings: Vec::new(),
        errors: vec![error],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::OnceSource;
    use pretty_assertions::assert_eq;
    use tables_core::{FieldBuilder, SchemaBuilder, Value};

    fn package() -> Package {
        let countries = SchemaBuilder::new()
            .field(FieldBuilder::new("code", "string").build())
            .primary_key(["code"])
            .build();
        let people = SchemaBuilder::new()
            .field(FieldBuilder::new("name", "string").build())
            .field(FieldBuilder::new("country", "string").build())
            .foreign_key(["country"], "countries", ["code"])
            .build();
        Package::new("world")
            .with_resource(Resource::new(
                "countries",
                InlineSource::from_text(vec![vec!["code"], vec!["fr"], vec!["it"]]),
                countries,
            ))
            .with_resource(Resource::new(
                "people",
                InlineSource::from_text(vec![vec!["name", "country"], vec!["ada", "it"], vec!["bob", "de"]]),
                people,
            ))
    }

    #[test]
    fn test_package_foreign_keys() {
        let package = package();
        assert!(package.has_inter_resource_foreign_keys());
        assert_eq!(package.resource_names(), vec!["countries", "people"]);
        let report = TableValidator::default().validate_package(&package, &Checklist::new());
        assert!(!report.valid);
        assert_eq!(report.stats.tasks, 2);
        assert!(report.tasks[0].valid);
        let error = report.tasks[1].error().unwrap();
        assert_eq!(error.code(), "foreign-key");
        assert_eq!(error.row_position(), Some(3));
    }

    #[test]
    fn test_one_shot_referenced_table() {
        let countries = SchemaBuilder::new()
            .field(FieldBuilder::new("code", "string").build())
            .primary_key(["code"])
            .build();
        let rows: Vec<Result<Vec<Option<Value>>>> = [["code"], ["fr"], ["it"]]
            .into_iter()
            .map(|row| Ok(row.iter().map(|cell| Some(Value::from(*cell))).collect()))
            .collect();
        let mut package = package();
        package.resources[0] = Resource::new("countries", OnceSource::new(rows.into_iter()), countries);

        let report = TableValidator::default().validate_package(&package, &Checklist::new());
        assert!(report.tasks[0].valid);
        assert_eq!(report.tasks[0].stats.rows, 2);
        assert_eq!(report.tasks[1].error_codes(), vec!["foreign-key"]);
        assert_eq!(report.tasks[1].errors[0].row_position(), Some(3));
    }

    #[test]
    fn test_failing_referenced_table() {
        let countries = SchemaBuilder::new()
            .field(FieldBuilder::new("code", "string").build())
            .build();
        let rows: Vec<Result<Vec<Option<Value>>>> = vec![
            Ok(vec![Some(Value::from("code"))]),
            Err(TableError::source("connection reset")),
        ];
        let mut package = package();
        package.resources[0] = Resource::new("countries", OnceSource::new(rows.into_iter()), countries);

        let report = TableValidator::default().validate_package(&package, &Checklist::new());
        for task in &report.tasks {
            let error = task.error().unwrap();
            assert_eq!(error.code(), "source-error");
            assert_eq!(error.note, "connection reset");
        }
    }

    #[test]
    fn test_invalid_checklist() {
        let checklist = Checklist::new().with_skip_errors(["bogus"]);
        let report = TableValidator::default().validate_package(&package(), &checklist);
        assert!(report.tasks.is_empty());
        assert_eq!(report.error().map(ValidationError::code), Some("check-error"));
    }

    #[tokio::test]
    async fn test_parallel_falls_back_to_sequential() {
        let report = TableValidator::default()
            .validate_package_parallel(&package(), &Checklist::new())
            .await;
        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.stats.errors, 1);
        assert_eq!(report.warnings, vec![SEQUENTIAL_FALLBACK_WARNING]);
    }

    #[tokio::test]
    async fn test_parallel() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("id", "integer").build())
            .build();
        let package = Package::new("numbers")
            .with_resource(Resource::new(
                "a",
                InlineSource::from_text(vec![vec!["id"], vec!["1"]]),
                schema.clone(),
            ))
            .with_resource(Resource::new(
                "b",
                InlineSource::from_text(vec![vec!["id"], vec!["x"]]),
                schema,
            ));
        let report = TableValidator::default()
            .validate_package_parallel(&package, &Checklist::new())
            .await;
        let names: Vec<_> = report.tasks.iter().map(|task| task.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(report.tasks[0].valid);
        assert_eq!(report.tasks[1].error_codes(), vec!["type-error"]);
    }
}
