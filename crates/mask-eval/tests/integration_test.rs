use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use mask_eval::mask::{decode_str, encode, encode_annotation, rle_to_string};
use mask_eval::{
    f1_score, optimal_score, score, Dataset, Mask, MaskEval, Params, RowKind, ScoreError, ScoreRow,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_pair() -> (Dataset, Dataset) {
    let solution = Dataset::new(&fixtures_dir().join("solution.json")).expect("Failed to load solution");
    let submission =
        Dataset::new(&fixtures_dir().join("submission.json")).expect("Failed to load submission");
    (solution, submission)
}

#[test]
fn test_load_fixtures() {
    let (solution, submission) = load_pair();
    assert_eq!(solution.len(), 6);
    assert_eq!(submission.len(), 6);
    // Array-valued shapes are normalized to their JSON text.
    assert_eq!(submission.get_row("img_2").unwrap().shape, "[3,3]");
}

#[test]
fn test_aligned_evaluation() {
    let (solution, submission) = load_pair();
    let submission = submission.align_to(&solution).unwrap();

    let mut eval = MaskEval::new(solution, submission);
    eval.params.match_row_ids = true;
    eval.evaluate().unwrap();

    let scores: Vec<f64> = eval.row_evals.iter().map(|r| r.score).collect();
    let expected = [1.0, 0.0, 1.0, 0.5, 0.5, 0.5];
    for (got, want) in scores.iter().zip(expected) {
        assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
    }
    assert_eq!(
        eval.row_evals[3].kind,
        RowKind::Masks {
            num_gt: 2,
            num_pred: 1
        }
    );

    let total = eval.accumulate().unwrap();
    assert_abs_diff_eq!(total, 3.5 / 6.0, epsilon = 1e-12);
    let summary = eval.summary.as_ref().unwrap();
    assert_eq!(summary.num_authentic, 2);
    assert_eq!(summary.authentic_accuracy, Some(0.5));
    assert_abs_diff_eq!(summary.forged_score.unwrap(), 2.5 / 4.0, epsilon = 1e-12);
    eval.summarize();
}

#[test]
fn test_positional_pairing() {
    let (solution, submission) = load_pair();
    let total = score(&solution.rows, &submission.rows).unwrap();
    assert_abs_diff_eq!(total, 2.1 / 6.0, epsilon = 1e-12);

    let mut eval = MaskEval::new(solution, submission);
    eval.params = Params {
        match_row_ids: true,
        ..Params::default()
    };
    assert!(matches!(
        eval.evaluate().unwrap_err(),
        ScoreError::MalformedInput(_)
    ));
}

#[test]
fn test_missing_file() {
    let err = Dataset::new(&fixtures_dir().join("does_not_exist.json")).unwrap_err();
    assert!(matches!(err, ScoreError::Io(_)));
}

#[test]
fn test_concrete_two_by_two() {
    let gt = decode_str("[1,2]", 2, 2).unwrap();
    assert!(gt.get(0, 0) && gt.get(1, 0));
    assert!(!gt.get(0, 1) && !gt.get(1, 1));

    assert_eq!(f1_score(&gt, &gt).unwrap(), 1.0);
    assert_eq!(optimal_score(&[gt.clone()], &[gt.clone()]).unwrap(), 1.0);

    let empty = Mask::new(2, 2);
    assert_eq!(f1_score(&empty, &gt).unwrap(), 0.0);
    assert_eq!(optimal_score(&[empty], &[gt]).unwrap(), 0.0);
}

#[test]
fn test_ordering_violation_any_shape() {
    for (h, w) in [(1, 4), (2, 2), (5, 7)] {
        assert!(matches!(
            decode_str("[2,3,1,1]", h, w).unwrap_err(),
            ScoreError::OrderingViolation { .. }
        ));
    }
}

#[test]
fn test_authentic_sentinel_ignores_shape() {
    let solution = vec![ScoreRow::new("x", "authentic", "not a shape")];
    let submission = vec![ScoreRow::new("x", "authentic", "[0, 0]")];
    assert_eq!(score(&solution, &submission).unwrap(), 1.0);

    let submission = vec![ScoreRow::new("x", "[1, 1]", "[0, 0]")];
    assert_eq!(score(&solution, &submission).unwrap(), 0.0);
}

#[test]
fn test_encoded_predictions_score_through_rows() {
    let gt_a = Mask::from_fn(4, 5, |r, c| r < 2 && c < 2);
    let gt_b = Mask::from_fn(4, 5, |r, c| r >= 2 && c >= 3);
    let pred_a = Mask::from_fn(4, 5, |r, c| r < 2 && c < 3);

    let solution = vec![ScoreRow::new(
        "img",
        encode_annotation(&[gt_a.clone(), gt_b.clone()]),
        "[4, 5]",
    )];
    let submission = vec![ScoreRow::new(
        "img",
        encode_annotation(&[pred_a.clone(), gt_b.clone()]),
        "[4, 5]",
    )];

    // pred_a vs gt_a: tp 4, fp 2, fn 0 -> P 2/3, R 1, F1 0.8
    let expected = (0.8 + 1.0) / 2.0;
    assert_abs_diff_eq!(score(&solution, &submission).unwrap(), expected, epsilon = 1e-12);
    assert_abs_diff_eq!(
        optimal_score(&[gt_b.clone(), pred_a], &[gt_a, gt_b.clone()]).unwrap(),
        expected,
        epsilon = 1e-12
    );
    assert_eq!(rle_to_string(&encode(&gt_b, true)), "[15,2,19,2]");
}
