//! Row sources and resources.
//!
//! A [`TableSource`] hands out forward-only iterators of raw rows. Parsing
//! concrete formats happens outside this crate; the CLI ships a CSV source
//! and tests use [`InlineSource`].

use std::fmt;
use std::sync::{Arc, Mutex};
use tables_core::{Dialect, Result, Schema, TableError, Value};

/// One raw source row.
pub type RawRow = Vec<Option<Value>>;

/// Iterator over the raw rows of one pass.
pub type RowIter = Box<dyn Iterator<Item = Result<RawRow>> + Send>;

/// A provider of raw rows.
pub trait TableSource: Send + Sync {
    /// Starts a new pass over the rows.
    fn open(&self) -> Result<RowIter>;

    /// Whether [`open`](Self::open) may be called more than once.
    fn restartable(&self) -> bool {
        true
    }
}

/// In-memory rows.
#[derive(Debug, Clone, Default)]
pub struct InlineSource {
    rows: Arc<Vec<RawRow>>,
}

impl InlineSource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows: Arc::new(rows) }
    }

    /// Rows of text cells; empty strings stay empty strings.
    pub fn from_text<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|cell| Some(Value::String(cell.into()))).collect())
                .collect(),
        )
    }

    /// Reads a whole pass of `source` into memory.
    pub fn materialize(source: &dyn TableSource) -> Result<Self> {
        let rows = source.open()?.collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rows))
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }
}

impl TableSource for InlineSource {
    fn open(&self) -> Result<RowIter> {
        let rows = Arc::clone(&self.rows);
        Ok(Box::new((0..rows.len()).map(move |index| Ok(rows[index].clone()))))
    }
}

/// A source that can only be read once, such as a stream.
pub struct OnceSource {
    rows: Mutex<Option<RowIter>>,
}

impl OnceSource {
    pub fn new<I>(rows: I) -> Self
    where
        I: Iterator<Item = Result<RawRow>> + Send + 'static,
    {
        Self {
            rows: Mutex::new(Some(Box::new(rows))),
        }
    }
}

impl TableSource for OnceSource {
    fn open(&self) -> Result<RowIter> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| TableError::source("the stream lock is poisoned"))?;
        rows.take()
            .ok_or_else(|| TableError::source("the stream has already been consumed"))
    }

    fn restartable(&self) -> bool {
        false
    }
}

impl fmt::Debug for OnceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceSource").finish_non_exhaustive()
    }
}

/// A named table: rows plus the schema and dialect to read them with.
#[derive(Clone)]
pub struct Resource {
    pub name: String,
    /// Where the rows come from, such as a file path
    pub place: String,
    pub source: Arc<dyn TableSource>,
    pub schema: Schema,
    pub dialect: Dialect,
}

impl Resource {
    pub fn new(name: impl Into<String>, source: impl TableSource + 'static, schema: Schema) -> Self {
        Self {
            name: name.into(),
            place: "<memory>".to_string(),
            source: Arc::new(source),
            schema,
            dialect: Dialect::default(),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = place.into();
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_source(mut self, source: Arc<dyn TableSource>) -> Self {
        self.source = source;
        self
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("place", &self.place)
            .field("restartable", &self.source.restartable())
            .field("fields", &self.schema.field_names())
            .finish()
    }
}
