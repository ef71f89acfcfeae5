//! # Tables Validator
//!
//! Schema-driven row validation engine for tabular data. Given raw rows and
//! a [`Schema`](tables_core::Schema), this crate:
//!
//! - Reconciles the header labels with the schema fields
//! - Casts every row, reporting missing, extra, mistyped and constrained cells
//! - Enforces unique fields, primary keys and foreign keys across rows
//! - Runs a [`Checklist`] of built-in and user checks
//! - Collects everything into a serializable [`Report`]
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use tables_core::{FieldBuilder, SchemaBuilder, ValidationContext};
//! use tables_validator::{Checklist, InlineSource, Resource, TableValidator};
//!
//! let schema = SchemaBuilder::new()
//!     .field(FieldBuilder::new("id", "integer").build())
//!     .field(FieldBuilder::new("name", "string").build())
//!     .build();
//! let source = InlineSource::from_text(vec![
//!     vec!["id", "name"],
//!     vec!["1", "english"],
//!     vec!["two", "中国人"],
//! ]);
//! let resource = Resource::new("languages", source, schema);
//!
//! let validator = TableValidator::new(ValidationContext::new());
//! let report = validator.validate(&resource, &Checklist::new());
//!
//! assert!(!report.valid);
//! assert_eq!(
//!     report.flatten(&["rowNumber", "fieldNumber", "type"]),
//!     vec![vec![json!(2), json!(1), json!("type-error")]],
//! );
//! ```

mod checks;
mod engine;
mod error;
mod header;
mod integrity;
mod package;
mod reader;
mod report;
mod row;
mod source;

pub use checks::*;
pub use engine::*;
pub use error::*;
pub use header::*;
pub use integrity::*;
pub use package::*;
pub use reader::*;
pub use report::*;
pub use row::*;
pub use source::*;
