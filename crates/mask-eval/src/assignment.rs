//! Minimum-cost bipartite matching (Hungarian / Kuhn-Munkres).
//!
//! Shortest augmenting path formulation with row and column potentials,
//! `O(n^3)` in `n = max(rows, cols)`. The solver works on matrices with no
//! more rows than columns; taller matrices are transposed first and the
//! result is mapped back.

use crate::error::{Result, ScoreError};

/// Solve the linear sum assignment problem for a (possibly rectangular) cost matrix.
///
/// Returns `(row_indices, col_indices)` of the `min(rows, cols)` assigned
/// pairs, sorted by row index, minimizing the total cost. An empty matrix
/// gives two empty vectors. Entries must be finite.
pub fn linear_sum_assignment(cost: &[Vec<f64>]) -> Result<(Vec<usize>, Vec<usize>)> {
    let nr = cost.len();
    let nc = cost.first().map_or(0, Vec::len);
    if let Some(i) = cost.iter().position(|row| row.len() != nc) {
        return Err(ScoreError::malformed(format!(
            "cost matrix row {} has {} columns, expected {}",
            i,
            cost[i].len(),
            nc
        )));
    }
    if nr == 0 || nc == 0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let transpose = nr > nc;
    let col4row = if transpose {
        let transposed: Vec<Vec<f64>> = (0..nc)
            .map(|j| cost.iter().map(|row| row[j]).collect())
            .collect();
        Solver::new(&transposed).solve()?
    } else {
        Solver::new(cost).solve()?
    };

    let mut pairs: Vec<(usize, usize)> = col4row
        .into_iter()
        .enumerate()
        .map(|(i, j)| if transpose { (j, i) } else { (i, j) })
        .collect();
    pairs.sort_unstable();
    Ok(pairs.into_iter().unzip())
}

/// Solver state for a cost matrix with `rows <= cols`.
struct Solver<'a> {
    cost: &'a [Vec<f64>],
    /// Row potentials
    u: Vec<f64>,
    /// Column potentials
    v: Vec<f64>,
    shortest: Vec<f64>,
    /// Predecessor row of each column on the current shortest path tree
    path: Vec<usize>,
    col4row: Vec<Option<usize>>,
    row4col: Vec<Option<usize>>,
    visited_rows: Vec<bool>,
    visited_cols: Vec<bool>,
    remaining: Vec<usize>,
}

impl<'a> Solver<'a> {
    fn new(cost: &'a [Vec<f64>]) -> Self {
        let nr = cost.len();
        let nc = cost[0].len();
        Solver {
            cost,
            u: vec![0.0; nr],
            v: vec![0.0; nc],
            shortest: vec![f64::INFINITY; nc],
            path: vec![0; nc],
            col4row: vec![None; nr],
            row4col: vec![None; nc],
            visited_rows: vec![false; nr],
            visited_cols: vec![false; nc],
            remaining: vec![0; nc],
        }
    }

    /// Assign every row, one augmenting path at a time.
    fn solve(mut self) -> Result<Vec<usize>> {
        let nr = self.u.len();
        for cur_row in 0..nr {
            let (sink, min_val) = self.augmenting_path(cur_row).ok_or_else(|| {
                ScoreError::malformed(format!(
                    "no finite augmenting path for row {}; cost matrix must be finite",
                    cur_row
                ))
            })?;

            // Update potentials
            self.u[cur_row] += min_val;
            for i in 0..nr {
                if self.visited_rows[i] && i != cur_row {
                    if let Some(j) = self.col4row[i] {
                        self.u[i] += min_val - self.shortest[j];
                    }
                }
            }
            for j in 0..self.v.len() {
                if self.visited_cols[j] {
                    self.v[j] -= min_val - self.shortest[j];
                }
            }

            // Flip the matching along the path back to cur_row
            let mut j = sink;
            loop {
                let i = self.path[j];
                self.row4col[j] = Some(i);
                let previous = self.col4row[i].replace(j);
                if i == cur_row {
                    break;
                }
                match previous {
                    Some(p) => j = p,
                    None => break,
                }
            }
        }

        self.col4row
            .into_iter()
            .enumerate()
            .map(|(i, j)| j.ok_or_else(|| ScoreError::malformed(format!("row {} left unassigned", i))))
            .collect()
    }

    /// Dijkstra-style search for the cheapest path from `cur_row` to a free column.
    ///
    /// Returns the free column reached and the path length, or `None` when
    /// every reduced cost is infinite or NaN.
    fn augmenting_path(&mut self, cur_row: usize) -> Option<(usize, f64)> {
        let nc = self.v.len();
        let mut min_val = 0.0;

        // Columns still to visit, scanned in reverse index order.
        let mut num_remaining = nc;
        for (it, slot) in self.remaining.iter_mut().enumerate() {
            *slot = nc - it - 1;
        }
        self.visited_rows.fill(false);
        self.visited_cols.fill(false);
        self.shortest.fill(f64::INFINITY);

        let mut i = cur_row;
        loop {
            let mut index = None;
            let mut lowest = f64::INFINITY;
            self.visited_rows[i] = true;

            for it in 0..num_remaining {
                let j = self.remaining[it];
                let r = min_val + self.cost[i][j] - self.u[i] - self.v[j];
                if r < self.shortest[j] {
                    self.path[j] = i;
                    self.shortest[j] = r;
                }
                // Among equal candidates prefer a free column: it ends the search.
                if self.shortest[j] < lowest
                    || (self.shortest[j] == lowest && self.row4col[j].is_none())
                {
                    lowest = self.shortest[j];
                    index = Some(it);
                }
            }

            min_val = lowest;
            if min_val == f64::INFINITY {
                return None;
            }
            let index = index?;
            let j = self.remaining[index];
            self.visited_cols[j] = true;
            num_remaining -= 1;
            self.remaining[index] = self.remaining[num_remaining];

            match self.row4col[j] {
                None => return Some((j, min_val)),
                Some(next) => i = next,
            }
        }
    }
}
