//! Dataset-level evaluation: score every (solution, submission) row pair and
//! average.
//!
//! A row whose annotation is the authentic sentinel on either side is scored
//! as a class label (1.0 when both annotations are identical, else 0.0).
//! Every other row is decoded into masks and scored with
//! [`optimal_score`](crate::score::optimal_score).
//!
//! Rows are classified by the solution's label: a forged image the submission
//! called authentic is still a forged row in the summary.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::dataset::Dataset;
use crate::error::{Result, ScoreError};
use crate::mask::{decode_annotation, parse_shape};
use crate::params::Params;
use crate::score::optimal_score;
use crate::types::ScoreRow;

/// How a row was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// The solution carried the authentic sentinel; no masks were decoded.
    Authentic,
    /// A forged solution row the submission labelled authentic. Scores 0.0.
    Missed,
    /// Both sides carried masks.
    Masks { num_gt: usize, num_pred: usize },
}

/// Per-row evaluation result.
#[derive(Debug, Clone, PartialEq)]
pub struct RowEval {
    pub row_id: String,
    pub kind: RowKind,
    pub score: f64,
}

/// Accumulated evaluation results.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalSummary {
    /// Mean row score over the whole dataset.
    pub score: f64,
    pub num_rows: usize,
    pub num_authentic: usize,
    /// Mean score of the authentic-sentinel rows, `None` without any.
    pub authentic_accuracy: Option<f64>,
    pub num_forged: usize,
    /// Mean score of the forged rows, missed ones included. `None` without any.
    pub forged_score: Option<f64>,
}

/// Score one solution row against its submission row.
pub fn score_row(solution: &ScoreRow, submission: &ScoreRow, params: &Params) -> Result<RowEval> {
    if params.match_row_ids && solution.row_id != submission.row_id {
        return Err(ScoreError::malformed(format!(
            "solution row {:?} paired with submission row {:?}",
            solution.row_id, submission.row_id
        )));
    }

    if params.is_authentic(&solution.annotation) {
        let score = if solution.annotation == submission.annotation {
            1.0
        } else {
            0.0
        };
        return Ok(RowEval {
            row_id: solution.row_id.clone(),
            kind: RowKind::Authentic,
            score,
        });
    }
    if params.is_authentic(&submission.annotation) {
        return Ok(RowEval {
            row_id: solution.row_id.clone(),
            kind: RowKind::Missed,
            score: 0.0,
        });
    }

    let shape = parse_shape(&solution.shape)?;
    let gts = decode_annotation(
        &solution.annotation,
        shape.height,
        shape.width,
        params.mask_delimiter,
    )?;
    let preds = decode_annotation(
        &submission.annotation,
        shape.height,
        shape.width,
        params.mask_delimiter,
    )?;
    let score = optimal_score(&preds, &gts)?;

    Ok(RowEval {
        row_id: solution.row_id.clone(),
        kind: RowKind::Masks {
            num_gt: gts.len(),
            num_pred: preds.len(),
        },
        score,
    })
}

/// Score every row pair, in row order.
///
/// A malformed row aborts the evaluation with its error. With
/// `params.parallel` set and several malformed rows, which one is reported is
/// unspecified; the sequential path always reports the first.
pub fn evaluate_rows(
    solution: &[ScoreRow],
    submission: &[ScoreRow],
    params: &Params,
) -> Result<Vec<RowEval>> {
    if solution.len() != submission.len() {
        return Err(ScoreError::RowCountMismatch {
            solution: solution.len(),
            submission: submission.len(),
        });
    }
    if solution.is_empty() {
        return Err(ScoreError::malformed("no rows to score"));
    }

    let result = if params.parallel {
        solution
            .par_iter()
            .zip(submission.par_iter())
            .map(|(sol, sub)| score_row(sol, sub, params))
            .collect::<Result<Vec<_>>>()
    } else {
        solution
            .iter()
            .zip(submission)
            .map(|(sol, sub)| score_row(sol, sub, params))
            .collect::<Result<Vec<_>>>()
    };

    match &result {
        Ok(rows) => debug!(num_rows = rows.len(), "evaluated rows"),
        Err(e) => warn!(error = %e, "evaluation aborted"),
    }
    result
}

/// Mean row score of `solution` against `submission` with default parameters.
pub fn score(solution: &[ScoreRow], submission: &[ScoreRow]) -> Result<f64> {
    score_with(solution, submission, &Params::default())
}

/// Mean row score of `solution` against `submission`.
pub fn score_with(solution: &[ScoreRow], submission: &[ScoreRow], params: &Params) -> Result<f64> {
    let rows = evaluate_rows(solution, submission, params)?;
    Ok(mean(rows.iter().map(|r| r.score)).unwrap_or(0.0))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Evaluator over a solution and a submission dataset.
pub struct MaskEval {
    pub solution: Dataset,
    pub submission: Dataset,
    pub params: Params,
    /// Per-row results, filled by [`MaskEval::evaluate`].
    pub row_evals: Vec<RowEval>,
    /// Filled by [`MaskEval::accumulate`].
    pub summary: Option<EvalSummary>,
}

impl MaskEval {
    pub fn new(solution: Dataset, submission: Dataset) -> Self {
        MaskEval {
            solution,
            submission,
            params: Params::new(),
            row_evals: Vec::new(),
            summary: None,
        }
    }

    /// Run per-row evaluation.
    pub fn evaluate(&mut self) -> Result<()> {
        self.row_evals = evaluate_rows(&self.solution.rows, &self.submission.rows, &self.params)?;
        self.summary = None;
        Ok(())
    }

    /// Reduce per-row results into an [`EvalSummary`] and return the dataset score.
    pub fn accumulate(&mut self) -> Result<f64> {
        if self.row_evals.is_empty() {
            return Err(ScoreError::malformed(
                "no evaluated rows; run evaluate() first",
            ));
        }

        let authentic: Vec<f64> = self
            .row_evals
            .iter()
            .filter(|r| r.kind == RowKind::Authentic)
            .map(|r| r.score)
            .collect();
        let forged: Vec<f64> = self
            .row_evals
            .iter()
            .filter(|r| r.kind != RowKind::Authentic)
            .map(|r| r.score)
            .collect();

        let summary = EvalSummary {
            score: mean(self.row_evals.iter().map(|r| r.score)).unwrap_or(0.0),
            num_rows: self.row_evals.len(),
            num_authentic: authentic.len(),
            authentic_accuracy: mean(authentic.into_iter()),
            num_forged: forged.len(),
            forged_score: mean(forged.into_iter()),
        };
        info!(
            score = summary.score,
            num_rows = summary.num_rows,
            num_authentic = summary.num_authentic,
            num_forged = summary.num_forged,
            "accumulated evaluation"
        );

        let score = summary.score;
        self.summary = Some(summary);
        Ok(score)
    }

    /// Print the evaluation summary.
    pub fn summarize(&self) {
        let summary = match &self.summary {
            Some(s) => s,
            None => {
                eprintln!("Please run evaluate() and accumulate() first.");
                return;
            }
        };

        let lines = [
            ("Score (all rows)", summary.num_rows, Some(summary.score)),
            (
                "Authentic accuracy",
                summary.num_authentic,
                summary.authentic_accuracy,
            ),
            ("Forged mean oF1", summary.num_forged, summary.forged_score),
        ];
        for (name, rows, value) in lines {
            println!(
                " {:<20} @[ rows={:>6} ] = {:0.3}",
                name,
                rows,
                value.unwrap_or(-1.0)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn row(id: &str, annotation: &str, shape: &str) -> ScoreRow {
        ScoreRow::new(id, annotation, shape)
    }

    #[test]
    fn test_authentic_rows() {
        let params = Params::new();
        let both = score_row(
            &row("0", "authentic", "garbage"),
            &row("0", "authentic", "also garbage"),
            &params,
        )
        .unwrap();
        assert_eq!(both.score, 1.0);
        assert_eq!(both.kind, RowKind::Authentic);

        let mismatch = score_row(
            &row("0", "authentic", "[2, 2]"),
            &row("0", "[1, 2]", "[2, 2]"),
            &params,
        )
        .unwrap();
        assert_eq!(mismatch.score, 0.0);

        let mismatch = score_row(
            &row("0", "[1, 2]", "[2, 2]"),
            &row("0", "authentic", "[2, 2]"),
            &params,
        )
        .unwrap();
        assert_eq!(mismatch.score, 0.0);
        assert_eq!(mismatch.kind, RowKind::Missed);
    }

    #[test]
    fn test_authentic_is_case_sensitive() {
        // "Authentic" is not the sentinel, so it is parsed as an RLE and rejected.
        let err = score_row(
            &row("0", "Authentic", "[2, 2]"),
            &row("0", "[1, 2]", "[2, 2]"),
            &Params::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ScoreError::MalformedInput(_)));
    }

    #[test]
    fn test_mask_row() {
        let r = score_row(
            &row("7", "[1, 2];[4, 1]", "[2, 2]"),
            &row("7", "[1, 2]", "[2, 2]"),
            &Params::new(),
        )
        .unwrap();
        assert_eq!(
            r.kind,
            RowKind::Masks {
                num_gt: 2,
                num_pred: 1
            }
        );
        assert_abs_diff_eq!(r.score, 0.5);
        assert_eq!(r.row_id, "7");
    }

    #[test]
    fn test_bad_shape_aborts() {
        let err = score_row(
            &row("0", "[1, 2]", "[2]"),
            &row("0", "[1, 2]", "[2, 2]"),
            &Params::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ScoreError::MalformedInput(_)));
    }

    #[test]
    fn test_score_mean() {
        let solution = vec![
            row("a", "authentic", "[2, 2]"),
            row("b", "[1, 2]", "[2, 2]"),
            row("c", "[1, 2]", "[2, 2]"),
            row("d", "authentic", "[2, 2]"),
        ];
        let submission = vec![
            row("a", "authentic", "[2, 2]"),
            row("b", "[1, 2]", "[2, 2]"),
            row("c", "[]", "[2, 2]"),
            row("d", "[4, 1]", "[2, 2]"),
        ];
        assert_abs_diff_eq!(score(&solution, &submission).unwrap(), 0.5);

        let sequential = Params {
            parallel: false,
            ..Params::new()
        };
        assert_abs_diff_eq!(
            score_with(&solution, &submission, &sequential).unwrap(),
            0.5
        );
    }

    #[test]
    fn test_malformed_row_aborts_evaluation() {
        let solution = vec![row("a", "authentic", "[2, 2]"), row("b", "[1, 2]", "[2, 2]")];
        let submission = vec![row("a", "authentic", "[2, 2]"), row("b", "[2, 3, 1, 1]", "[2, 2]")];
        let err = score(&solution, &submission).unwrap_err();
        assert!(matches!(err, ScoreError::OrderingViolation { .. }));
    }

    #[test]
    fn test_row_count_mismatch() {
        let solution = vec![row("a", "authentic", "[2, 2]")];
        let err = score(&solution, &[]).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::RowCountMismatch {
                solution: 1,
                submission: 0
            }
        ));
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert!(matches!(
            score(&[], &[]).unwrap_err(),
            ScoreError::MalformedInput(_)
        ));
    }

    #[test]
    fn test_match_row_ids() {
        let solution = vec![row("a", "authentic", "[2, 2]")];
        let submission = vec![row("b", "authentic", "[2, 2]")];
        assert_eq!(score(&solution, &submission).unwrap(), 1.0);

        let strict = Params {
            match_row_ids: true,
            ..Params::new()
        };
        assert!(matches!(
            score_with(&solution, &submission, &strict).unwrap_err(),
            ScoreError::MalformedInput(_)
        ));
    }

    #[test]
    fn test_mask_eval_accumulate() {
        let solution = Dataset::from_rows(vec![
            row("a", "authentic", "[2, 2]"),
            row("b", "[1, 2]", "[2, 2]"),
            row("c", "[1, 1];[4, 1]", "[2, 2]"),
        ]);
        let submission = Dataset::from_rows(vec![
            row("a", "[1, 1]", "[2, 2]"),
            row("b", "[1, 2]", "[2, 2]"),
            row("c", "[4, 1]", "[2, 2]"),
        ]);
        let mut eval = MaskEval::new(solution, submission);
        assert!(eval.accumulate().is_err());

        eval.evaluate().unwrap();
        let score = eval.accumulate().unwrap();
        // rows: 0.0, 1.0, 0.5
        assert_abs_diff_eq!(score, 0.5);

        let summary = eval.summary.clone().unwrap();
        assert_eq!(summary.num_rows, 3);
        assert_eq!(summary.num_authentic, 1);
        assert_eq!(summary.authentic_accuracy, Some(0.0));
        assert_eq!(summary.num_forged, 2);
        assert_abs_diff_eq!(summary.forged_score.unwrap(), 0.75);
        eval.summarize();
    }

    #[test]
    fn test_missed_forgery_counts_as_forged() {
        let solution = Dataset::from_rows(vec![
            row("a", "[1, 2]", "[2, 2]"),
            row("b", "[1, 2]", "[2, 2]"),
        ]);
        let submission = Dataset::from_rows(vec![
            row("a", "authentic", "[2, 2]"),
            row("b", "[1, 2]", "[2, 2]"),
        ]);
        let mut eval = MaskEval::new(solution, submission);
        eval.evaluate().unwrap();
        assert_eq!(eval.row_evals[0].kind, RowKind::Missed);

        assert_abs_diff_eq!(eval.accumulate().unwrap(), 0.5);
        let summary = eval.summary.as_ref().unwrap();
        assert_eq!(summary.num_authentic, 0);
        assert_eq!(summary.authentic_accuracy, None);
        assert_eq!(summary.num_forged, 2);
        assert_eq!(summary.forged_score, Some(0.5));
    }

    #[test]
    fn test_parallel_and_sequential_agree_on_single_error() {
        let solution = vec![row("a", "[1, 2]", "[2, 2]"), row("b", "[1, 2]", "[2, 2]")];
        let submission = vec![row("a", "[1, 2]", "[2, 2]"), row("b", "[3, 1, 1, 1]", "[2, 2]")];
        for parallel in [true, false] {
            let params = Params {
                parallel,
                ..Params::new()
            };
            assert!(matches!(
                score_with(&solution, &submission, &params).unwrap_err(),
                ScoreError::OrderingViolation { .. }
            ));
        }
    }

    #[test]
    fn test_summary_without_authentic_rows() {
        let ds = Dataset::from_rows(vec![row("b", "[1, 2]", "[2, 2]")]);
        let mut eval = MaskEval::new(ds.clone(), ds);
        eval.evaluate().unwrap();
        assert_eq!(eval.accumulate().unwrap(), 1.0);
        let summary = eval.summary.as_ref().unwrap();
        assert_eq!(summary.authentic_accuracy, None);
        assert_eq!(summary.forged_score, Some(1.0));
    }
}
