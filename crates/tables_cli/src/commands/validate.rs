use anyhow::{Context, Result, bail};
use std::path::Path;
use tables_core::{Detector, Dialect, ValidationContext};
use tables_parser::{parse_descriptor_file, parse_dialect_file, parse_file};
use tables_validator::{Checklist, Resource, TableValidator};
use tracing::info;

use crate::output;
use crate::source::CsvSource;

/// Options of the `validate` command besides the input paths.
pub struct ValidateOptions {
    pub checklist: Option<String>,
    pub dialect: Option<String>,
    pub limit_errors: usize,
    pub limit_rows: Option<usize>,
    pub pick_errors: Vec<String>,
    pub skip_errors: Vec<String>,
    pub schema_sync: bool,
    pub header_case: Option<bool>,
    pub delimiter: char,
}

pub async fn execute(data_path: &str, schema_path: &str, options: &ValidateOptions, format: &str) -> Result<()> {
    info!("Validating {} against {}", data_path, schema_path);

    let schema = parse_file(Path::new(schema_path))
        .with_context(|| format!("Failed to parse schema file: {}", schema_path))?;

    let mut checklist = match &options.checklist {
        Some(path) => parse_descriptor_file::<Checklist>(Path::new(path))
            .with_context(|| format!("Failed to parse checklist file: {}", path))?,
        None => Checklist::new(),
    };
    if !options.pick_errors.is_empty() {
        checklist = checklist.with_pick_errors(options.pick_errors.iter().cloned());
    }
    if !options.skip_errors.is_empty() {
        checklist = checklist.with_skip_errors(options.skip_errors.iter().cloned());
    }

    let mut dialect = match &options.dialect {
        Some(path) => parse_dialect_file(Path::new(path))
            .with_context(|| format!("Failed to parse dialect file: {}", path))?,
        None => Dialect::new(),
    };
    if let Some(header_case) = options.header_case {
        dialect = dialect.with_header_case(header_case);
    }

    if !options.delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character, got {:?}", options.delimiter);
    }
    let source = CsvSource::new(data_path).with_delimiter(options.delimiter as u8);
    let name = Path::new(data_path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("table")
        .to_string();
    let resource = Resource::new(name, source, schema)
        .with_place(data_path)
        .with_dialect(dialect);

    let mut context = ValidationContext::new()
        .with_limit_errors(options.limit_errors)
        .with_detector(Detector::new().with_schema_sync(options.schema_sync));
    if let Some(limit_rows) = options.limit_rows {
        context = context.with_limit_rows(limit_rows);
    }

    let report = TableValidator::new(context).validate(&resource, &checklist);

    output::print_validation_report(&report, format);

    if !report.valid {
        std::process::exit(1);
    }

    Ok(())
}
