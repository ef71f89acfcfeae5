use super::Check;
use crate::error::{ErrorKind, ValidationError};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Reports rows whose cast values repeat an earlier row.
///
/// Rows are remembered by the SHA-256 digest of their values, so memory
/// grows with the number of distinct rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateRow {
    #[serde(skip)]
    memory: HashMap<String, usize>,
}

impl DuplicateRow {
    pub fn new() -> Self {
        Self::default()
    }
}

fn digest(row: &Row) -> String {
    let text = row
        .cells()
        .iter()
        .map(|cell| cell.as_ref().map(ToString::to_string).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",");
    hex::encode(Sha256::digest(text.as_bytes()))
}

impl Check for DuplicateRow {
    fn code(&self) -> &'static str {
        "duplicate-row"
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        let hash = digest(row);
        match self.memory.get(&hash) {
            Some(earlier) => vec![row.row_error(
                ErrorKind::DuplicateRow,
                format!("the same as row at position \"{earlier}\""),
            )],
            None => {
                self.memory.insert(hash, row.row_position());
                Vec::new()
            }
        }
    }
}
