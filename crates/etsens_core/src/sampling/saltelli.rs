use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::SamplingError;
use crate::problem::ProblemSpec;

use super::{SampleMatrix, Sampler};

/// Rows emitted per base sample: `A`, `AB_j` for each j, `BA_j` for each j
/// (second order only), then `B`
#[must_use]
pub fn saltelli_step(num_vars: usize, second_order: bool) -> usize {
    if second_order {
        2 * num_vars + 2
    } else {
        num_vars + 2
    }
}

/// Saltelli cross-sampling design over a seeded uniform base sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaltelliSampler {
    pub second_order: bool,
    pub seed: u64,
}

impl Default for SaltelliSampler {
    fn default() -> Self {
        Self {
            second_order: true,
            seed: 0,
        }
    }
}

impl SaltelliSampler {
    #[must_use]
    pub fn new(second_order: bool, seed: u64) -> Self {
        Self { second_order, seed }
    }

    /// Number of rows `generate` returns for this problem size
    #[must_use]
    pub fn num_rows(&self, num_vars: usize, base_count: usize) -> usize {
        base_count * saltelli_step(num_vars, self.second_order)
    }
}

impl Sampler for SaltelliSampler {
    fn generate(
        &self,
        problem: &ProblemSpec,
        base_count: usize,
    ) -> Result<SampleMatrix, SamplingError> {
        if !base_count.is_power_of_two() {
            return Err(SamplingError::BaseCountNotPowerOfTwo(base_count));
        }
        let p = problem.num_vars();
        if p == 0 {
            return Err(SamplingError::EmptyProblem);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut matrix = SampleMatrix::with_capacity(p, self.num_rows(p, base_count));
        let mut mixed = vec![0.0; p];

        for _ in 0..base_count {
            let a: Vec<f64> = (0..p).map(|_| rng.random::<f64>()).collect();
            let b: Vec<f64> = (0..p).map(|_| rng.random::<f64>()).collect();

            matrix.push_row(&problem.scale(&a));
            for j in 0..p {
                mixed.copy_from_slice(&a);
                mixed[j] = b[j];
                matrix.push_row(&problem.scale(&mixed));
            }
            if self.second_order {
                for j in 0..p {
                    mixed.copy_from_slice(&b);
                    mixed[j] = a[j];
                    matrix.push_row(&problem.scale(&mixed));
                }
            }
            matrix.push_row(&problem.scale(&b));
        }

        tracing::debug!(
            rows = matrix.num_rows(),
            cols = p,
            base_count,
            second_order = self.second_order,
            "Generated sample matrix"
        );
        Ok(matrix)
    }
}
