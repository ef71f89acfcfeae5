//! # Tables Core
//!
//! Core data structures and types for tabular data validation.
//!
//! This crate provides the fundamental building blocks for describing tables:
//! schemas made of typed fields, the field type registry that turns raw cells
//! into typed values, and the configuration shared by validation runs.
//!
//! ## Key Concepts
//!
//! - **Schema**: Ordered fields plus primary and foreign keys
//! - **Field**: A named column with a logical type, format and constraints
//! - **TypeRegistry**: Maps type names to cell readers and writers
//! - **SchemaCaster**: A schema compiled once for reading many rows
//!
//! ## Example
//!
//! ```rust
//! use tables_core::{FieldBuilder, SchemaBuilder, Value};
//!
//! let schema = SchemaBuilder::new()
//!     .field(FieldBuilder::new("id", "integer").build())
//!     .field(FieldBuilder::new("name", "string").build())
//!     .build();
//!
//! let (values, notes) = schema
//!     .read_cells(&[Some(Value::from("1")), Some(Value::from("english"))])
//!     .unwrap();
//! assert_eq!(values[0], Some(Value::Integer(1)));
//! assert!(notes.iter().all(|n| n.is_empty()));
//! ```

pub mod builder;
pub mod caster;
pub mod constraints;
pub mod context;
pub mod error;
pub mod field;
pub mod schema;
pub mod types;
pub mod value;

pub use builder::*;
pub use caster::*;
pub use constraints::*;
pub use context::*;
pub use error::*;
pub use field::*;
pub use schema::*;
pub use types::{FieldType, TypeFactory, TypeRegistry};
pub use value::*;
