//! Descriptor loading for table schemas (YAML/TOML/JSON formats).
//!
//! This crate reads [`Schema`], [`Dialect`] and any other serde descriptor,
//! such as a validation checklist, from text or files.
//!
//! # Example
//!
//! ```rust
//! use tables_core::Schema;
//! use tables_parser::{DescriptorFormat, parse_descriptor};
//!
//! let yaml = r#"
//! fields:
//!   - name: id
//!     type: integer
//!   - name: name
//!     type: string
//! primaryKey: id
//! "#;
//!
//! let schema: Schema = parse_descriptor(yaml, DescriptorFormat::Yaml).expect("Failed to parse schema");
//! assert_eq!(schema.field_names(), vec!["id", "name"]);
//! assert_eq!(schema.primary_key, vec!["id"]);
//! ```

use serde::de::DeserializeOwned;
use std::path::Path;
use tables_core::{Dialect, Schema};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during descriptor parsing.
#[derive(Debug, Error)]
pub enum ParserError {
    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// TOML parsing or deserialization failed
    #[error("Failed to parse TOML: {0}")]
    Toml(String),

    /// JSON parsing or deserialization failed
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Supported descriptor file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
    /// JSON format (.json)
    Json,
}

/// Parses any descriptor from text in the given format.
///
/// # Example
///
/// ```rust
/// use tables_core::Schema;
/// use tables_parser::{DescriptorFormat, parse_descriptor};
///
/// let toml = r#"
/// missingValues = ["", "n/a"]
///
/// [[fields]]
/// name = "price"
/// type = "number"
/// groupChar = ","
/// "#;
///
/// let schema: Schema = parse_descriptor(toml, DescriptorFormat::Toml).unwrap();
/// assert_eq!(schema.fields[0].group_char.as_deref(), Some(","));
/// ```
pub fn parse_descriptor<T: DeserializeOwned>(content: &str, format: DescriptorFormat) -> Result<T> {
    match format {
        DescriptorFormat::Yaml => Ok(serde_yaml_ng::from_str(content)?),
        DescriptorFormat::Toml => toml::from_str(content).map_err(|e| ParserError::Toml(e.to_string())),
        DescriptorFormat::Json => Ok(serde_json::from_str(content)?),
    }
}

/// Parses any descriptor from a file, detecting the format from its
/// extension.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use tables_core::Dialect;
/// use tables_parser::parse_descriptor_file;
///
/// let dialect: Dialect = parse_descriptor_file(Path::new("dialect.yml")).unwrap();
/// println!("Header rows: {:?}", dialect.header_rows);
/// ```
pub fn parse_descriptor_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), ?format, "loading descriptor");
    parse_descriptor(&content, format)
}

/// Detect the descriptor format from a file path based on its extension.
///
/// # Supported Extensions
///
/// * `.yaml`, `.yml` → `DescriptorFormat::Yaml`
/// * `.toml` → `DescriptorFormat::Toml`
/// * `.json` → `DescriptorFormat::Json`
///
/// # Errors
///
/// Returns `ParserError::InvalidExtension` if the file has no extension.
/// Returns `ParserError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<DescriptorFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(ParserError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(DescriptorFormat::Yaml),
        "toml" => Ok(DescriptorFormat::Toml),
        "json" => Ok(DescriptorFormat::Json),
        other => Err(ParserError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse a schema from a file with automatic format detection.
pub fn parse_file(path: &Path) -> Result<Schema> {
    parse_descriptor_file(path)
}

/// Parse a dialect from a file with automatic format detection.
pub fn parse_dialect_file(path: &Path) -> Result<Dialect> {
    parse_descriptor_file(path)
}
