use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ScoreError};

/// A binary mask of `height x width` cells.
///
/// Cells are stored in column-major order (Fortran order): cell `(row, col)`
/// is at index `row + height * col`. `true` marks foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    h: usize,
    w: usize,
    data: Vec<bool>,
}

impl Mask {
    /// An all-background mask.
    pub fn new(h: usize, w: usize) -> Self {
        Mask {
            h,
            w,
            data: vec![false; h * w],
        }
    }

    /// Build a mask from a column-major buffer of length `h * w`.
    pub fn from_col_major(h: usize, w: usize, data: Vec<bool>) -> Result<Self> {
        if data.len() != h * w {
            return Err(ScoreError::malformed(format!(
                "mask buffer has {} cells, expected {}x{} = {}",
                data.len(),
                h,
                w,
                h * w
            )));
        }
        Ok(Mask { h, w, data })
    }

    /// Build a mask from row-major rows. All rows must have the same length.
    pub fn from_rows<R: AsRef<[bool]>>(rows: &[R]) -> Result<Self> {
        let h = rows.len();
        let w = rows.first().map_or(0, |r| r.as_ref().len());
        if let Some(i) = rows.iter().position(|r| r.as_ref().len() != w) {
            return Err(ScoreError::malformed(format!(
                "ragged mask: row {} has {} cells, expected {}",
                i,
                rows[i].as_ref().len(),
                w
            )));
        }
        Ok(Self::from_fn(h, w, |row, col| rows[row].as_ref()[col]))
    }

    /// Build a mask by evaluating `f(row, col)` for every cell.
    pub fn from_fn(h: usize, w: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(h * w);
        for col in 0..w {
            for row in 0..h {
                data.push(f(row, col));
            }
        }
        Mask { h, w, data }
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn width(&self) -> usize {
        self.w
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.h, self.w)
    }

    /// Value of cell `(row, col)`.
    ///
    /// Panics if the cell is outside the mask.
    pub fn get(&self, row: usize, col: usize) -> bool {
        assert!(row < self.h && col < self.w, "cell ({row}, {col}) out of bounds");
        self.data[row + self.h * col]
    }

    /// The flat column-major cell buffer.
    pub fn as_col_major(&self) -> &[bool] {
        &self.data
    }

    /// Row-major copy of the grid.
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        (0..self.h)
            .map(|row| (0..self.w).map(|col| self.get(row, col)).collect())
            .collect()
    }

    /// Number of foreground cells.
    pub fn area(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// True when the mask has no foreground cell.
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }
}

/// One foreground run over the column-major flattened mask. `start` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub length: usize,
}

/// Run-length encoding of a mask: ascending, non-overlapping foreground runs.
///
/// Unlike COCO-style counts, only foreground runs are stored, so the encoding
/// carries no dimensions. Height and width travel separately (see [`Shape`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rle {
    pub runs: Vec<Run>,
}

/// Mask dimensions as carried by a score row's `shape` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub height: usize,
    pub width: usize,
}

/// One dataset record: an image identifier, its annotation and mask shape.
///
/// `annotation` is either the authentic sentinel or `;`-joined RLE wire
/// strings; `shape` is the wire text `[height, width]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScoreRow {
    #[serde(deserialize_with = "deserialize_row_id")]
    pub row_id: String,
    pub annotation: String,
    #[serde(deserialize_with = "deserialize_shape")]
    pub shape: String,
}

impl ScoreRow {
    pub fn new(
        row_id: impl Into<String>,
        annotation: impl Into<String>,
        shape: impl Into<String>,
    ) -> Self {
        ScoreRow {
            row_id: row_id.into(),
            annotation: annotation.into(),
            shape: shape.into(),
        }
    }
}

fn deserialize_row_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RowId {
        Text(String),
        Int(i64),
    }
    match RowId::deserialize(deserializer)? {
        RowId::Text(s) => Ok(s),
        RowId::Int(i) => Ok(i.to_string()),
    }
}

/// Accept `"[h, w]"` as well as a bare JSON array; the text is validated later.
fn deserialize_shape<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}
