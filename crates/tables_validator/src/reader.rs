//! Streaming table reader.

use crate::header::{Header, HeaderReconciler};
use crate::row::{Row, RowEngine};
use crate::source::{RawRow, Resource, RowIter};
use tables_core::{Dialect, Result, Schema, ValidationContext};
use tracing::debug;

/// Reads a resource row by row.
///
/// Opening the reader consumes the label rows and reconciles the header;
/// iterating it yields one [`Row`] per data row, skipping comment rows.
pub struct TableReader {
    rows: RowIter,
    dialect: Dialect,
    header: Header,
    schema: Schema,
    engine: RowEngine,
    position: usize,
    row_number: usize,
    pending: Option<Result<RawRow>>,
}

impl TableReader {
    /// Opens `resource` and reconciles its header.
    ///
    /// # Errors
    ///
    /// Fails when the source cannot be opened or read, when schema-sync
    /// meets duplicate labels, or when the schema does not compile.
    pub fn open(resource: &Resource, context: &ValidationContext) -> Result<Self> {
        let dialect = resource.dialect.clone();
        let mut rows = resource.source.open()?;
        let mut position = 0;

        let (header, schema) = if dialect.has_header() {
            let mut reconciler = HeaderReconciler::new(&dialect, &context.detector);
            let last = dialect.last_header_row();
            while position < last {
                let Some(cells) = rows.next() else { break };
                let cells = cells?;
                position += 1;
                if dialect.header_rows.contains(&position) {
                    reconciler.add_label_row(position, &cells);
                }
            }
            reconciler.reconcile(&resource.schema)?
        } else {
            (Header::headerless(&resource.schema), resource.schema.clone())
        };

        let engine = RowEngine::new(&schema, &header, &context.registry)?;
        debug!(
            resource = %resource.name,
            fields = schema.fields.len(),
            header_errors = header.errors().len(),
            "table opened"
        );

        let pending = rows.next();

        Ok(Self {
            rows,
            dialect,
            header,
            schema,
            engine,
            position,
            row_number: 0,
            pending,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Schema in effect for this read, after schema-sync.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether any data row remains.
    pub fn has_more(&self) -> bool {
        self.pending.is_some()
    }

    fn next_raw(&mut self) -> Option<Result<RawRow>> {
        self.pending.take().or_else(|| self.rows.next())
    }
}

impl Iterator for TableReader {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cells = match self.next_raw()? {
                Ok(cells) => cells,
                Err(err) => return Some(Err(err)),
            };
            self.position += 1;
            if self.dialect.is_comment(self.position, &cells) {
                continue;
            }
            self.row_number += 1;
            let row = self.engine.build_row(&cells, self.row_number, self.position);
            self.pending = self.rows.next();
            return Some(Ok(row));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InlineSource;
    use pretty_assertions::assert_eq;
    use tables_core::{FieldBuilder, SchemaBuilder, Value};

    fn schema() -> Schema {
        SchemaBuilder::new()
            .field(FieldBuilder::new("id", "integer").build())
            .field(FieldBuilder::new("name", "string").build())
            .build()
    }

    #[test]
    fn test_read_rows() {
        let resource = Resource::new(
            "table",
            InlineSource::from_text(vec![vec!["id", "name"], vec!["1", "english"], vec!["2", "中国人"]]),
            schema(),
        );
        let reader = TableReader::open(&resource, &ValidationContext::new()).unwrap();
        assert!(reader.header().valid());
        let rows: Vec<Row> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("name"), Some(&Value::from("中国人")));
        assert_eq!((rows[1].row_number(), rows[1].row_position()), (2, 3));
    }

    #[test]
    fn test_comments_keep_positions() {
        let resource = Resource::new(
            "table",
            InlineSource::from_text(vec![vec!["id", "name"], vec!["# skipped", ""], vec!["1", "a"]]),
            schema(),
        )
        .with_dialect(Dialect::new().with_comment_char("#"));
        let rows: Vec<Row> = TableReader::open(&resource, &ValidationContext::new())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].row_number(), rows[0].row_position()), (1, 3));
    }

    #[test]
    fn test_headerless() {
        let resource = Resource::new("table", InlineSource::from_text(vec![vec!["1", "a"]]), schema())
            .with_dialect(Dialect::headerless());
        let reader = TableReader::open(&resource, &ValidationContext::new()).unwrap();
        assert!(reader.header().missing());
        assert!(reader.has_more());
        let rows: Vec<Row> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(rows[0].row_position(), 1);
        assert!(rows[0].valid());
    }
}
