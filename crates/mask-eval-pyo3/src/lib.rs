use pyo3::prelude::*;
use pyo3::types::PyDict;

mod convert;
mod mask;

use convert::{py_to_row, to_py_err};

fn rows_from_py(rows: &[Bound<'_, PyDict>]) -> PyResult<Vec<mask_core::ScoreRow>> {
    rows.iter().map(py_to_row).collect()
}

fn make_params(parallel: bool, match_row_ids: bool) -> mask_core::Params {
    mask_core::Params {
        parallel,
        match_row_ids,
        ..mask_core::Params::default()
    }
}

/// Mean row score of a submission against a solution.
///
/// Both arguments are lists of `{"row_id", "annotation", "shape"}` dicts,
/// paired by position.
#[pyfunction]
#[pyo3(signature = (solution, submission, parallel = true, match_row_ids = false))]
fn score(
    py: Python<'_>,
    solution: Vec<Bound<'_, PyDict>>,
    submission: Vec<Bound<'_, PyDict>>,
    parallel: bool,
    match_row_ids: bool,
) -> PyResult<f64> {
    let solution = rows_from_py(&solution)?;
    let submission = rows_from_py(&submission)?;
    let params = make_params(parallel, match_row_ids);
    py.allow_threads(|| mask_core::score_with(&solution, &submission, &params))
        .map_err(to_py_err)
}

/// Per-row `(row_id, score)` pairs.
#[pyfunction]
#[pyo3(signature = (solution, submission, parallel = true, match_row_ids = false))]
fn evaluate_rows(
    py: Python<'_>,
    solution: Vec<Bound<'_, PyDict>>,
    submission: Vec<Bound<'_, PyDict>>,
    parallel: bool,
    match_row_ids: bool,
) -> PyResult<Vec<(String, f64)>> {
    let solution = rows_from_py(&solution)?;
    let submission = rows_from_py(&submission)?;
    let params = make_params(parallel, match_row_ids);
    let rows = py
        .allow_threads(|| mask_core::eval::evaluate_rows(&solution, &submission, &params))
        .map_err(to_py_err)?;
    Ok(rows.into_iter().map(|r| (r.row_id, r.score)).collect())
}

#[pymodule]
fn mask_eval_py(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("AUTHENTIC_LABEL", mask_core::AUTHENTIC_LABEL)?;
    m.add_function(wrap_pyfunction!(score, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rows, m)?)?;
    m.add_function(wrap_pyfunction!(mask::f1_score, m)?)?;
    m.add_function(wrap_pyfunction!(mask::optimal_score, m)?)?;
    m.add_function(wrap_pyfunction!(mask::optimal_match, m)?)?;
    m.add_function(wrap_pyfunction!(mask::linear_sum_assignment, m)?)?;

    // mask submodule
    let mask_mod = PyModule::new(py, "mask")?;
    mask_mod.add_function(wrap_pyfunction!(mask::rle_encode, &mask_mod)?)?;
    mask_mod.add_function(wrap_pyfunction!(mask::rle_decode, &mask_mod)?)?;
    m.add_submodule(&mask_mod)?;

    Ok(())
}
