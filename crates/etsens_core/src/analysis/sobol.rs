//! Sobol indices from a Saltelli design.
//!
//! - First order: Saltelli et al. (2010)
//! - Total order: Jansen (1999)
//! - Second order: Saltelli (2002), closed pairs minus both first orders
//!
//! Confidence half-widths come from a bootstrap over base rows, one set of
//! resampled rows shared by every index.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::config::{BootstrapConfig, SensitivityConfig};
use crate::error::AnalysisError;
use crate::problem::ProblemSpec;
use crate::sampling::saltelli_step;

use super::{Analyzer, IndexValue, SensitivityIndexSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SobolAnalyzer {
    pub second_order: bool,
    pub resamples: usize,
    /// Confidence level of the reported half-widths, e.g. 0.95
    pub confidence: f64,
    pub seed: u64,
}

impl Default for SobolAnalyzer {
    fn default() -> Self {
        Self::new(true, &BootstrapConfig::default())
    }
}

impl SobolAnalyzer {
    #[must_use]
    pub fn new(second_order: bool, bootstrap: &BootstrapConfig) -> Self {
        Self {
            second_order,
            resamples: bootstrap.resamples,
            confidence: bootstrap.confidence,
            seed: bootstrap.seed,
        }
    }

    #[must_use]
    pub fn from_config(config: &SensitivityConfig) -> Self {
        Self::new(config.second_order, &config.bootstrap)
    }

    /// Resampled base-row indices, one vector per bootstrap replicate
    fn draws(&self, n: usize) -> Vec<Vec<usize>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.resamples)
            .map(|_| (0..n).map(|_| rng.random_range(0..n)).collect())
            .collect()
    }

    /// Two-sided standard normal quantile for the configured confidence level
    fn z_score(&self) -> Result<f64, AnalysisError> {
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(AnalysisError::InvalidConfidence(self.confidence));
        }
        let normal =
            Normal::new(0.0, 1.0).map_err(|e| AnalysisError::Distribution(e.to_string()))?;
        Ok(normal.inverse_cdf(0.5 + self.confidence / 2.0))
    }
}

impl Analyzer for SobolAnalyzer {
    fn analyze(
        &self,
        problem: &ProblemSpec,
        scores: &[f64],
    ) -> Result<SensitivityIndexSet, AnalysisError> {
        let d = problem.num_vars();
        let step = saltelli_step(d, self.second_order);
        if scores.is_empty() || scores.len() % step != 0 {
            return Err(AnalysisError::SampleCountMismatch {
                rows: scores.len(),
                step,
            });
        }

        let z = self.z_score()?;
        let y = standardize(scores)?;
        let blocks = Blocks::separate(&y, d, self.second_order);
        let n = blocks.a.len();
        let all: Vec<usize> = (0..n).collect();
        let draws = self.draws(n);
        let half_width =
            |stat: &dyn Fn(&[usize]) -> f64| z * sample_std(draws.iter().map(|r| stat(r)));

        let mut s1 = Vec::with_capacity(d);
        let mut s1_conf = Vec::with_capacity(d);
        let mut st = Vec::with_capacity(d);
        let mut st_conf = Vec::with_capacity(d);
        for ab in &blocks.ab {
            let first = |idx: &[usize]| first_order(&blocks.a, ab, &blocks.b, idx);
            let total = |idx: &[usize]| total_order(&blocks.a, ab, &blocks.b, idx);
            s1.push(first(&all));
            s1_conf.push(half_width(&first));
            st.push(total(&all));
            st_conf.push(half_width(&total));
        }

        let mut indices = SensitivityIndexSet::new();
        indices.insert("S1", IndexValue::Vector(s1));
        indices.insert("S1_conf", IndexValue::Vector(s1_conf));
        indices.insert("ST", IndexValue::Vector(st));
        indices.insert("ST_conf", IndexValue::Vector(st_conf));

        if self.second_order {
            let mut s2 = vec![vec![f64::NAN; d]; d];
            let mut s2_conf = vec![vec![f64::NAN; d]; d];
            for j in 0..d {
                for k in j + 1..d {
                    let pair = |idx: &[usize]| blocks.second_order(j, k, idx);
                    s2[j][k] = pair(&all);
                    s2_conf[j][k] = half_width(&pair);
                }
            }
            indices.insert("S2", IndexValue::Matrix(s2));
            indices.insert("S2_conf", IndexValue::Matrix(s2_conf));
        }

        tracing::debug!(
            parameters = d,
            base_rows = n,
            resamples = self.resamples,
            "Computed Sobol indices"
        );
        Ok(indices)
    }
}

/// Score blocks of a Saltelli design, one entry per base row
struct Blocks {
    a: Vec<f64>,
    b: Vec<f64>,
    ab: Vec<Vec<f64>>,
    ba: Vec<Vec<f64>>,
}

impl Blocks {
    fn separate(y: &[f64], d: usize, second_order: bool) -> Self {
        let step = saltelli_step(d, second_order);
        let column = |offset: usize| -> Vec<f64> {
            y.iter().skip(offset).step_by(step).copied().collect()
        };
        Self {
            a: column(0),
            b: column(step - 1),
            ab: (0..d).map(|j| column(j + 1)).collect(),
            ba: if second_order {
                (0..d).map(|j| column(j + 1 + d)).collect()
            } else {
                Vec::new()
            },
        }
    }

    fn second_order(&self, j: usize, k: usize, idx: &[usize]) -> f64 {
        let (a, b) = (&self.a, &self.b);
        let (ba_j, ab_k) = (&self.ba[j], &self.ab[k]);
        let closed = mean(idx.iter().map(|&i| ba_j[i] * ab_k[i] - a[i] * b[i]));
        closed / pooled_variance(a, b, idx)
            - first_order(a, &self.ab[j], b, idx)
            - first_order(a, ab_k, b, idx)
    }
}

fn first_order(a: &[f64], ab: &[f64], b: &[f64], idx: &[usize]) -> f64 {
    mean(idx.iter().map(|&i| b[i] * (ab[i] - a[i]))) / pooled_variance(a, b, idx)
}

fn total_order(a: &[f64], ab: &[f64], b: &[f64], idx: &[usize]) -> f64 {
    0.5 * mean(idx.iter().map(|&i| (a[i] - ab[i]).powi(2))) / pooled_variance(a, b, idx)
}

/// Population variance of the `A` and `B` scores together
fn pooled_variance(a: &[f64], b: &[f64], idx: &[usize]) -> f64 {
    let n = 2.0 * idx.len() as f64;
    let m = idx.iter().map(|&i| a[i] + b[i]).sum::<f64>() / n;
    idx.iter()
        .map(|&i| (a[i] - m).powi(2) + (b[i] - m).powi(2))
        .sum::<f64>()
        / n
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    sum / count as f64
}

/// Sample standard deviation (n - 1), `NaN` below two values
fn sample_std(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

fn standardize(scores: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    if let Some(row) = scores.iter().position(|v| !v.is_finite()) {
        return Err(AnalysisError::NonFiniteScore { row });
    }
    let n = scores.len() as f64;
    let m = scores.iter().sum::<f64>() / n;
    let std = (scores.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n).sqrt();
    if std == 0.0 || !std.is_finite() {
        return Err(AnalysisError::ZeroVariance);
    }
    Ok(scores.iter().map(|v| (v - m) / std).collect())
}
