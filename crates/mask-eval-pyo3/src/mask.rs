use mask_core::mask as rmask;
use numpy::{PyArray2, PyReadonlyArray2};
use pyo3::prelude::*;

use crate::convert::{mask_to_py, match_to_py, py_to_mask, to_py_err};

/// Encode the foreground of a 2-D bool array to an RLE wire string.
#[pyfunction]
pub fn rle_encode(mask: PyReadonlyArray2<'_, bool>) -> String {
    rmask::rle_to_string(&rmask::encode(&py_to_mask(&mask), true))
}

#[pyfunction]
pub fn rle_decode(py: Python<'_>, rle: &str, h: usize, w: usize) -> PyResult<Py<PyArray2<bool>>> {
    let mask = rmask::decode_str(rle, h, w).map_err(to_py_err)?;
    Ok(mask_to_py(py, &mask).unbind())
}

#[pyfunction]
pub fn f1_score(pred: PyReadonlyArray2<'_, bool>, gt: PyReadonlyArray2<'_, bool>) -> PyResult<f64> {
    mask_core::f1_score(&py_to_mask(&pred), &py_to_mask(&gt)).map_err(to_py_err)
}

#[pyfunction]
pub fn optimal_score(
    preds: Vec<PyReadonlyArray2<'_, bool>>,
    gts: Vec<PyReadonlyArray2<'_, bool>>,
) -> PyResult<f64> {
    let preds: Vec<_> = preds.iter().map(py_to_mask).collect();
    let gts: Vec<_> = gts.iter().map(py_to_mask).collect();
    mask_core::optimal_score(&preds, &gts).map_err(to_py_err)
}

/// Like `optimal_score`, also returning the assigned pairs and the penalty.
#[pyfunction]
pub fn optimal_match(
    py: Python<'_>,
    preds: Vec<PyReadonlyArray2<'_, bool>>,
    gts: Vec<PyReadonlyArray2<'_, bool>>,
) -> PyResult<PyObject> {
    let preds: Vec<_> = preds.iter().map(py_to_mask).collect();
    let gts: Vec<_> = gts.iter().map(py_to_mask).collect();
    let result = mask_core::optimal_match(&preds, &gts).map_err(to_py_err)?;
    match_to_py(py, &result)
}

#[pyfunction]
pub fn linear_sum_assignment(cost: Vec<Vec<f64>>) -> PyResult<(Vec<usize>, Vec<usize>)> {
    mask_core::linear_sum_assignment(&cost).map_err(to_py_err)
}
