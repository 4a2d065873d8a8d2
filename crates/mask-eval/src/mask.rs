//! Run-length encoding of binary masks.
//!
//! Masks are flattened in column-major (Fortran) order and only the runs of
//! the foreground value are stored, as `(start, length)` pairs. On the wire a
//! run list is a JSON integer array alternating 1-based starts and lengths,
//! e.g. `[3, 2, 10, 1]`; several masks of one image are joined with `;`.

use crate::error::{Result, ScoreError};
use crate::types::{Mask, Rle, Run, Shape};

/// Delimiter between the masks of one annotation string.
pub const MASK_DELIMITER: char = ';';

/// Encode every maximal run of cells equal to `foreground` in column-major order.
///
/// An all-background mask encodes to an empty run list.
pub fn encode(mask: &Mask, foreground: bool) -> Rle {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &v) in mask.as_col_major().iter().enumerate() {
        match (v == foreground, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(Run {
                    start: s,
                    length: i - s,
                });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(Run {
            start: s,
            length: mask.as_col_major().len() - s,
        });
    }

    Rle { runs }
}

/// Decode an RLE into an `h x w` mask.
///
/// Runs are validated for ordering, overlap and bounds (in that order) before
/// the output buffer is touched.
pub fn decode(rle: &Rle, h: usize, w: usize) -> Result<Mask> {
    let mut intervals = Vec::with_capacity(rle.runs.len());
    for run in &rle.runs {
        if run.length == 0 {
            return Err(ScoreError::malformed(format!(
                "run starting at {} has zero length",
                run.start
            )));
        }
        let start = to_i64(run.start)?;
        intervals.push((start, start.saturating_add(to_i64(run.length)?)));
    }
    decode_intervals(&intervals, h, w)
}

/// Decode a wire-format RLE string (`"[start, length, ...]"`, 1-based starts).
pub fn decode_str(s: &str, h: usize, w: usize) -> Result<Mask> {
    let intervals = parse_wire(s)?;
    decode_intervals(&intervals, h, w)
}

/// Parse a wire-format RLE string without decoding it against a shape.
pub fn parse_rle(s: &str) -> Result<Rle> {
    let intervals = parse_wire(s)?;
    validate_intervals(&intervals, None)?;
    let runs = intervals
        .iter()
        .map(|&(start, end)| Run {
            start: start as usize,
            length: (end - start) as usize,
        })
        .collect();
    Ok(Rle { runs })
}

/// Flat wire values: `[start + 1, length, start + 1, length, ...]`.
pub fn to_wire(rle: &Rle) -> Vec<u64> {
    rle.runs
        .iter()
        .flat_map(|run| [run.start as u64 + 1, run.length as u64])
        .collect()
}

/// Serialize an RLE to its wire string, a compact JSON array.
pub fn rle_to_string(rle: &Rle) -> String {
    let values: Vec<String> = to_wire(rle).iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

/// Encode several masks and join their wire strings with `;`.
pub fn encode_annotation(masks: &[Mask]) -> String {
    let delimiter = MASK_DELIMITER.to_string();
    masks
        .iter()
        .map(|m| rle_to_string(&encode(m, true)))
        .collect::<Vec<_>>()
        .join(delimiter.as_str())
}

/// Split an annotation on `delimiter` and decode every segment as an `h x w` mask.
pub fn decode_annotation(annotation: &str, h: usize, w: usize, delimiter: char) -> Result<Vec<Mask>> {
    annotation
        .split(delimiter)
        .map(|segment| decode_str(segment, h, w))
        .collect()
}

/// Parse a shape descriptor `[height, width]`. Both entries must be positive integers.
pub fn parse_shape(s: &str) -> Result<Shape> {
    let value: serde_json::Value = serde_json::from_str(s)
        .map_err(|e| ScoreError::malformed(format!("shape {:?} is not valid JSON: {}", s, e)))?;
    let dims = match value.as_array() {
        Some(items) if items.len() == 2 => items
            .iter()
            .map(|v| v.as_i64())
            .collect::<Option<Vec<i64>>>(),
        _ => None,
    };
    match dims.as_deref() {
        Some(&[h, w]) if h > 0 && w > 0 => Ok(Shape {
            height: h as usize,
            width: w as usize,
        }),
        Some(&[h, w]) => Err(ScoreError::malformed(format!(
            "shape dimensions must be positive, got [{}, {}]",
            h, w
        ))),
        _ => Err(ScoreError::malformed(format!(
            "shape {:?} must be a JSON array of exactly two integers",
            s
        ))),
    }
}

/// Number of foreground cells covered by an RLE.
pub fn area(rle: &Rle) -> usize {
    rle.runs.iter().map(|r| r.length).sum()
}

fn to_i64(v: usize) -> Result<i64> {
    i64::try_from(v).map_err(|_| ScoreError::malformed(format!("run value {} too large", v)))
}

/// Parse wire text into 0-based half-open intervals.
fn parse_wire(s: &str) -> Result<Vec<(i64, i64)>> {
    let values: Vec<i64> = serde_json::from_str(s).map_err(|e| {
        ScoreError::malformed(format!("RLE {:?} is not a JSON integer array: {}", s, e))
    })?;
    if values.len() % 2 != 0 {
        return Err(ScoreError::malformed(format!(
            "RLE has odd length {}",
            values.len()
        )));
    }
    if let Some(v) = values.iter().find(|&&v| v < 0) {
        return Err(ScoreError::malformed(format!(
            "RLE values must be non-negative, got {}",
            v
        )));
    }

    let mut intervals = Vec::with_capacity(values.len() / 2);
    for pair in values.chunks_exact(2) {
        let (start, length) = (pair[0] - 1, pair[1]);
        if length == 0 {
            return Err(ScoreError::malformed(format!(
                "run starting at {} has zero length",
                pair[0]
            )));
        }
        intervals.push((start, start.saturating_add(length)));
    }
    Ok(intervals)
}

/// Check ordering, then overlap, then (when `size` is known) bounds.
fn validate_intervals(intervals: &[(i64, i64)], size: Option<i64>) -> Result<()> {
    for (index, pair) in intervals.windows(2).enumerate() {
        if pair[1].0 < pair[0].0 {
            return Err(ScoreError::OrderingViolation {
                index: index + 1,
                start: pair[1].0,
                previous: pair[0].0,
            });
        }
    }

    let mut previous_end: Option<i64> = None;
    for &(start, end) in intervals {
        if let Some(prev) = previous_end {
            if start < prev {
                return Err(ScoreError::OverlapViolation {
                    start,
                    end,
                    previous_end: prev,
                });
            }
        }
        previous_end = Some(previous_end.map_or(end, |p| p.max(end)));
    }

    let upper = size.unwrap_or(i64::MAX);
    if let Some(&(start, end)) = intervals.iter().find(|&&(s, e)| s < 0 || e > upper) {
        return Err(ScoreError::BoundsViolation {
            start,
            end,
            size: upper,
        });
    }
    Ok(())
}

fn decode_intervals(intervals: &[(i64, i64)], h: usize, w: usize) -> Result<Mask> {
    if h == 0 || w == 0 {
        return Err(ScoreError::malformed(format!(
            "mask dimensions must be positive, got {}x{}",
            h, w
        )));
    }
    let n = h
        .checked_mul(w)
        .ok_or_else(|| ScoreError::malformed(format!("mask {}x{} is too large", h, w)))?;
    validate_intervals(intervals, Some(to_i64(n)?))?;

    let mut data = vec![false; n];
    for &(start, end) in intervals {
        for cell in &mut data[start as usize..end as usize] {
            *cell = true;
        }
    }
    Mask::from_col_major(h, w, data)
}
