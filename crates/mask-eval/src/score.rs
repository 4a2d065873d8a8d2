//! Per-image score: optimal one-to-one matching of predictions to ground truths.

use tracing::debug;

use crate::assignment::linear_sum_assignment;
use crate::error::Result;
use crate::similarity::similarity_matrix;
use crate::types::Mask;

/// One assigned (prediction, ground truth) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPair {
    /// Index into the predictions, `None` for a padding row (missed ground truth).
    pub pred: Option<usize>,
    pub gt: usize,
    pub similarity: f64,
}

/// Outcome of matching one image's predictions against its ground truths.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub pairs: Vec<MatchedPair>,
    /// Mean similarity over the assigned pairs.
    pub mean_similarity: f64,
    /// `|gt| / max(|pred|, |gt|)`
    pub penalty: f64,
    pub score: f64,
}

/// Match predictions to ground truths maximizing total F1 and score the image.
///
/// - no predictions and no ground truths: 1.0
/// - only one side empty: 0.0
/// - otherwise the mean F1 over the optimal assignment, times the
///   excess-prediction penalty `|gt| / max(|pred|, |gt|)`.
///
/// Missed ground truths are matched against zero rows and count as 0.
pub fn optimal_match(preds: &[Mask], gts: &[Mask]) -> Result<MatchResult> {
    match (preds.is_empty(), gts.is_empty()) {
        (true, true) => {
            return Ok(MatchResult {
                pairs: Vec::new(),
                mean_similarity: 1.0,
                penalty: 1.0,
                score: 1.0,
            })
        }
        (false, true) => {
            return Ok(MatchResult {
                pairs: Vec::new(),
                mean_similarity: 0.0,
                penalty: 0.0,
                score: 0.0,
            })
        }
        (true, false) => {
            return Ok(MatchResult {
                pairs: (0..gts.len())
                    .map(|gt| MatchedPair {
                        pred: None,
                        gt,
                        similarity: 0.0,
                    })
                    .collect(),
                mean_similarity: 0.0,
                penalty: 1.0,
                score: 0.0,
            })
        }
        (false, false) => {}
    }

    let sim = similarity_matrix(preds, gts)?;
    let cost: Vec<Vec<f64>> = sim
        .iter()
        .map(|row| row.iter().map(|v| -v).collect())
        .collect();
    let (rows, cols) = linear_sum_assignment(&cost)?;

    let pairs: Vec<MatchedPair> = rows
        .iter()
        .zip(&cols)
        .map(|(&i, &j)| MatchedPair {
            pred: (i < preds.len()).then_some(i),
            gt: j,
            similarity: sim[i][j],
        })
        .collect();

    let mean_similarity =
        pairs.iter().map(|p| p.similarity).sum::<f64>() / pairs.len() as f64;
    let penalty = gts.len() as f64 / preds.len().max(gts.len()) as f64;
    let score = mean_similarity * penalty;

    debug!(
        num_pred = preds.len(),
        num_gt = gts.len(),
        mean_similarity,
        penalty,
        score,
        "matched masks"
    );

    Ok(MatchResult {
        pairs,
        mean_similarity,
        penalty,
        score,
    })
}

/// Score one image; see [`optimal_match`].
pub fn optimal_score(preds: &[Mask], gts: &[Mask]) -> Result<f64> {
    Ok(optimal_match(preds, gts)?.score)
}
