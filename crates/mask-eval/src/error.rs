//! Error types for mask decoding, scoring and dataset evaluation.

use thiserror::Error;

/// Errors raised while decoding masks or scoring predictions.
///
/// Every validation failure is reported to the caller; none of them is turned
/// into a default score.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// Unparseable JSON, wrong shape arity, non-positive dimensions, ragged grids.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// RLE run starts are not non-decreasing.
    #[error("RLE ordering violation: run {index} starts at {start}, before previous start {previous}")]
    OrderingViolation {
        index: usize,
        start: i64,
        previous: i64,
    },

    /// Two decoded RLE runs overlap.
    #[error("RLE overlap violation: run [{start}, {end}) overlaps previous run ending at {previous_end}")]
    OverlapViolation {
        start: i64,
        end: i64,
        previous_end: i64,
    },

    /// An RLE run falls outside the mask.
    #[error("RLE bounds violation: run [{start}, {end}) outside mask of {size} cells")]
    BoundsViolation { start: i64, end: i64, size: i64 },

    /// Two masks compared cell-by-cell have different dimensions.
    #[error("Shape mismatch: {pred_h}x{pred_w} prediction vs {gt_h}x{gt_w} ground truth")]
    ShapeMismatch {
        pred_h: usize,
        pred_w: usize,
        gt_h: usize,
        gt_w: usize,
    },

    /// Solution and submission have a different number of rows.
    #[error("Row count mismatch: {solution} solution rows vs {submission} submission rows")]
    RowCountMismatch { solution: usize, submission: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScoreError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        ScoreError::MalformedInput(msg.into())
    }
}

/// Result type for scoring operations
pub type Result<T> = std::result::Result<T, ScoreError>;
