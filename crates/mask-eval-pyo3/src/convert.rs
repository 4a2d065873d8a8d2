use mask_core::{Mask, MatchResult, ScoreError, ScoreRow};
use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

pub fn to_py_err(err: ScoreError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Convert a row-major numpy bool array to a column-major mask.
pub fn py_to_mask(arr: &PyReadonlyArray2<'_, bool>) -> Mask {
    let view = arr.as_array();
    let (h, w) = view.dim();
    Mask::from_fn(h, w, |r, c| view[[r, c]])
}

pub fn mask_to_py<'py>(py: Python<'py>, mask: &Mask) -> Bound<'py, PyArray2<bool>> {
    Array2::from_shape_fn(mask.shape(), |(r, c)| mask.get(r, c)).into_pyarray(py)
}

pub fn match_to_py(py: Python<'_>, result: &MatchResult) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    dict.set_item("score", result.score)?;
    dict.set_item("mean_similarity", result.mean_similarity)?;
    dict.set_item("penalty", result.penalty)?;
    let pairs: Vec<(Option<usize>, usize, f64)> = result
        .pairs
        .iter()
        .map(|p| (p.pred, p.gt, p.similarity))
        .collect();
    dict.set_item("pairs", pairs)?;
    Ok(dict.into_any().unbind())
}

fn required<'py>(dict: &Bound<'py, PyDict>, key: &str) -> PyResult<Bound<'py, PyAny>> {
    dict.get_item(key)?
        .ok_or_else(|| PyKeyError::new_err(key.to_string()))
}

/// Read a `{"row_id", "annotation", "shape"}` dict.
///
/// All three keys are required. `row_id` may be a str or an int; `shape` a
/// str or a sequence of ints.
pub fn py_to_row(dict: &Bound<'_, PyDict>) -> PyResult<ScoreRow> {
    let id_obj = required(dict, "row_id")?;
    let row_id = match id_obj.extract::<String>() {
        Ok(s) => s,
        Err(_) => id_obj.extract::<i64>()?.to_string(),
    };
    let annotation: String = required(dict, "annotation")?.extract()?;
    let shape_obj = required(dict, "shape")?;
    let shape = match shape_obj.extract::<String>() {
        Ok(s) => s,
        Err(_) => {
            let dims: Vec<i64> = shape_obj.extract()?;
            let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
            format!("[{}]", dims.join(", "))
        }
    };
    Ok(ScoreRow {
        row_id,
        annotation,
        shape,
    })
}
