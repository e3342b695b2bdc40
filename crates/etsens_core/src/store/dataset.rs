//! N-dimensional numeric dataset with flat backing storage.
//!
//! Values are stored in row-major order (last dimension varies fastest) and
//! `NaN` marks a missing value.

use serde::{Deserialize, Serialize};

use crate::error::DataError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// The data stored in row-major order
    data: Vec<f64>,
    /// Shape of each dimension (e.g., [365, 12, 9] for days x sites x subgrid)
    shape: Vec<usize>,
}

impl Dataset {
    /// Create a dataset with the given shape, filled with `value`
    #[must_use]
    pub fn filled(shape: Vec<usize>, value: f64) -> Self {
        let total_size: usize = shape.iter().product();
        Self {
            data: vec![value; total_size],
            shape,
        }
    }

    /// Create a dataset from existing row-major data.
    /// Returns `None` when `data` does not fill `shape` exactly.
    #[must_use]
    pub fn from_data(shape: Vec<usize>, data: Vec<f64>) -> Option<Self> {
        let total_size: usize = shape.iter().product();
        if data.len() != total_size {
            return None;
        }
        Some(Self { data, shape })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Fail with `ShapeMismatch` unless the shape equals `expected`
    pub fn expect_shape(&self, what: &str, expected: &[usize]) -> Result<(), DataError> {
        if self.shape != expected {
            return Err(DataError::ShapeMismatch {
                what: what.to_string(),
                expected: expected.to_vec(),
                found: self.shape.clone(),
            });
        }
        Ok(())
    }

    /// Keep only the positions along `axis` where `keep` is true.
    pub fn select(&self, axis: usize, keep: &[bool]) -> Result<Self, DataError> {
        if axis >= self.ndim() || self.shape[axis] != keep.len() {
            return Err(DataError::ShapeMismatch {
                what: format!("selection along axis {axis}"),
                expected: vec![keep.len()],
                found: self.shape.clone(),
            });
        }
        let outer: usize = self.shape[..axis].iter().product();
        let inner: usize = self.shape[axis + 1..].iter().product();
        let n = self.shape[axis];
        let kept = keep.iter().filter(|&&k| k).count();

        let mut data = Vec::with_capacity(outer * kept * inner);
        for o in 0..outer {
            for (k, _) in keep.iter().enumerate().filter(|(_, keep)| **keep) {
                let start = (o * n + k) * inner;
                data.extend_from_slice(&self.data[start..start + inner]);
            }
        }

        let mut shape = self.shape.clone();
        shape[axis] = kept;
        Ok(Self { data, shape })
    }

    /// Mean over the last axis, skipping `NaN`. All-missing lanes stay `NaN`.
    #[must_use]
    pub fn nanmean_last_axis(&self) -> Self {
        let Some((&last, rest)) = self.shape.split_last() else {
            return self.clone();
        };
        let shape = rest.to_vec();
        if last == 0 {
            return Self::filled(shape, f64::NAN);
        }
        let data = self.data.chunks(last).map(nanmean).collect();
        Self { data, shape }
    }

    /// Plain mean over the first axis (missing values propagate).
    #[must_use]
    pub fn mean_axis0(&self) -> Self {
        let Some((&first, rest)) = self.shape.split_first() else {
            return self.clone();
        };
        let shape = rest.to_vec();
        let lane: usize = rest.iter().product();
        let mut data = vec![0.0; lane];
        for row in self.data.chunks(lane.max(1)).take(first) {
            for (acc, v) in data.iter_mut().zip(row) {
                *acc += v;
            }
        }
        for acc in &mut data {
            *acc /= first as f64;
        }
        Self { data, shape }
    }

    /// Prepend a leading axis of length `n`, repeating the data along it
    #[must_use]
    pub fn broadcast_leading(&self, n: usize) -> Self {
        let mut shape = Vec::with_capacity(self.ndim() + 1);
        shape.push(n);
        shape.extend_from_slice(&self.shape);
        let mut data = Vec::with_capacity(n * self.data.len());
        for _ in 0..n {
            data.extend_from_slice(&self.data);
        }
        Self { data, shape }
    }

    /// Apply `f` elementwise
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            data: self.data.iter().map(|&v| f(v)).collect(),
            shape: self.shape.clone(),
        }
    }
}

/// Mean of the finite values in `values`, `NaN` if there are none
fn nanmean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
