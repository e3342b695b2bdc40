//! Variance-based sensitivity analysis.
//!
//! An `Analyzer` consumes the score vector produced for a sampler's matrix,
//! positionally matched to that sampler's row layout, and returns a named set
//! of indices. Values are scalars, per-parameter vectors, or parameter-pair
//! matrices; missing entries are `NaN` and serialize as `null`.

mod sobol;

pub use sobol::SobolAnalyzer;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::AnalysisError;
use crate::problem::ProblemSpec;

/// Computes sensitivity indices from a score vector
pub trait Analyzer {
    fn analyze(
        &self,
        problem: &ProblemSpec,
        scores: &[f64],
    ) -> Result<SensitivityIndexSet, AnalysisError>;
}

/// One named index: a scalar, a per-parameter vector or a P x P matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IndexValue {
    Scalar(f64),
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

impl IndexValue {
    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            IndexValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&[Vec<f64>]> {
        match self {
            IndexValue::Matrix(m) => Some(m),
            _ => None,
        }
    }
}

/// Index name to value, iterated (and serialized) in sorted key order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SensitivityIndexSet {
    indices: BTreeMap<String, IndexValue>,
}

impl SensitivityIndexSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: IndexValue) {
        self.indices.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&IndexValue> {
        self.indices.get(name)
    }

    /// Shorthand for a per-parameter index such as `S1`
    pub fn vector(&self, name: &str) -> Option<&[f64]> {
        self.get(name).and_then(IndexValue::as_vector)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexValue)> {
        self.indices.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
