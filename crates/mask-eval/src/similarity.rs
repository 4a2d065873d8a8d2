//! Pairwise F1 similarity between predicted and ground-truth masks.

use rayon::prelude::*;

use crate::error::{Result, ScoreError};
use crate::types::Mask;

/// Harmonic mean of precision and recall of `pred` against `gt`.
///
/// Both masks must have the same dimensions. A zero denominator makes the
/// corresponding ratio 0, so two blank masks score 0 rather than NaN.
pub fn f1_score(pred: &Mask, gt: &Mask) -> Result<f64> {
    if pred.shape() != gt.shape() {
        return Err(ScoreError::ShapeMismatch {
            pred_h: pred.height(),
            pred_w: pred.width(),
            gt_h: gt.height(),
            gt_w: gt.width(),
        });
    }

    let (mut tp, mut fp, mut fn_) = (0u64, 0u64, 0u64);
    for (&p, &g) in pred.as_col_major().iter().zip(gt.as_col_major()) {
        match (p, g) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => {}
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    if precision + recall == 0.0 {
        return Ok(0.0);
    }
    Ok(2.0 * precision * recall / (precision + recall))
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Compute the F1 matrix between `preds` and `gts`.
///
/// Returns a `P x G` matrix (row-major, one row per prediction). When there
/// are fewer predictions than ground truths the matrix is padded with zero
/// rows to `G x G`, so every ground truth takes part in the assignment.
pub fn similarity_matrix(preds: &[Mask], gts: &[Mask]) -> Result<Vec<Vec<f64>>> {
    let mut matrix: Vec<Vec<f64>> = preds
        .par_iter()
        .map(|pred| -> Result<Vec<f64>> { gts.iter().map(|gt| f1_score(pred, gt)).collect() })
        .collect::<Result<_>>()?;

    if matrix.len() < gts.len() {
        matrix.resize(gts.len(), vec![0.0; gts.len()]);
    }
    Ok(matrix)
}
