use anyhow::{Context, Result};
use std::path::Path;
use tables_core::ValidationContext;
use tables_parser::{detect_format, parse_file};
use tables_validator::TableValidator;
use tracing::info;

use crate::output;

pub async fn execute(schema_path: &str, format: &str) -> Result<()> {
    info!("Checking schema: {}", schema_path);

    let path = Path::new(schema_path);
    let format_detected =
        detect_format(path).with_context(|| format!("Failed to parse schema file: {}", schema_path))?;
    let schema = parse_file(path).with_context(|| format!("Failed to parse schema file: {}", schema_path))?;

    let report = TableValidator::new(ValidationContext::new()).validate_definition(&schema);

    if format == "json" {
        output::print_validation_report(&report, format);
    } else if report.valid {
        output::print_success("Schema is valid");
        println!("\nSchema Summary:");
        println!("  Format:       {:?}", format_detected);
        println!("  Fields:       {}", schema.fields.len());
        for field in &schema.fields {
            println!("    - {} ({})", field.name, field.field_type);
        }
        if !schema.primary_key.is_empty() {
            println!("  Primary Key:  {}", schema.primary_key.join(", "));
        }
        if !schema.foreign_keys.is_empty() {
            println!("  Foreign Keys: {}", schema.foreign_keys.len());
        }
    } else {
        output::print_validation_report(&report, format);
    }

    if !report.valid {
        std::process::exit(1);
    }

    Ok(())
}
