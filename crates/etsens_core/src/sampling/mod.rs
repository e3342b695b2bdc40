//! Sample matrix generation.
//!
//! A `Sampler` turns a problem specification into a matrix whose rows are
//! parameter vectors and whose columns follow the specification's order. The
//! row layout is a contract with the matching `Analyzer`: scores are handed
//! back positionally.

mod saltelli;

pub use saltelli::{SaltelliSampler, saltelli_step};

use serde::{Deserialize, Serialize};

use crate::error::SamplingError;
use crate::problem::ProblemSpec;

/// Generates a sample matrix for a problem
pub trait Sampler {
    /// `base_count` must be a power of two
    fn generate(
        &self,
        problem: &ProblemSpec,
        base_count: usize,
    ) -> Result<SampleMatrix, SamplingError>;
}

/// N x P matrix of parameter vectors, stored row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMatrix {
    n_cols: usize,
    data: Vec<f64>,
}

impl SampleMatrix {
    #[must_use]
    pub fn with_capacity(n_cols: usize, n_rows: usize) -> Self {
        Self {
            n_cols,
            data: Vec::with_capacity(n_cols * n_rows),
        }
    }

    /// Build from nested rows; `None` when rows are ragged
    #[must_use]
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != n_cols) {
            return None;
        }
        Some(Self {
            n_cols,
            data: rows.iter().flatten().copied().collect(),
        })
    }

    pub(crate) fn push_row(&mut self, row: &[f64]) {
        debug_assert_eq!(row.len(), self.n_cols);
        self.data.extend_from_slice(row);
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        if self.n_cols == 0 {
            0
        } else {
            self.data.len() / self.n_cols
        }
    }

    #[must_use]
    pub fn num_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.n_cols)?;
        self.data.get(start..start + self.n_cols)
    }

    /// Rows in order
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> {
        self.data.chunks_exact(self.n_cols.max(1))
    }

    /// Values of one column
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows().filter_map(move |row| row.get(col).copied())
    }
}
