//! Loading and indexing score rows.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, ScoreError};
use crate::types::ScoreRow;

/// A collection of score rows indexed by row id.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub rows: Vec<ScoreRow>,
    /// row_id -> index into rows (first occurrence)
    index: HashMap<String, usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RowsFile {
    Rows(Vec<ScoreRow>),
    Wrapped { rows: Vec<ScoreRow> },
}

impl Dataset {
    /// Load rows from a JSON file.
    ///
    /// The file holds either an array of `{"row_id", "annotation", "shape"}`
    /// objects or an object with a `rows` field.
    pub fn new(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let rows = match serde_json::from_reader::<_, RowsFile>(reader)? {
            RowsFile::Rows(rows) => rows,
            RowsFile::Wrapped { rows } => rows,
        };
        Ok(Self::from_rows(rows))
    }

    /// Build a dataset from rows already in memory.
    pub fn from_rows(rows: Vec<ScoreRow>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            index.entry(row.row_id.clone()).or_insert(i);
        }
        Dataset { rows, index }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a row by id.
    pub fn get_row(&self, row_id: &str) -> Option<&ScoreRow> {
        self.index.get(row_id).map(|&i| &self.rows[i])
    }

    /// Row ids in row order.
    pub fn row_ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.row_id.as_str()).collect()
    }

    /// Reorder this dataset's rows to follow `reference`'s row order.
    ///
    /// Every reference row id must be present here; extra rows are dropped.
    pub fn align_to(&self, reference: &Dataset) -> Result<Dataset> {
        let rows = reference
            .rows
            .iter()
            .map(|r| {
                self.get_row(&r.row_id).cloned().ok_or_else(|| {
                    ScoreError::malformed(format!("row id {:?} missing from submission", r.row_id))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_rows(rows))
    }
}
