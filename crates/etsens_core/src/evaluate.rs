//! Sample evaluation: one parameter vector to one skill score.

use crate::drivers::AssembledData;
use crate::error::{EvaluationError, ModelError};
use crate::metrics::{finite_pairs, normalize_nse, nse};
use crate::model::EtModel;

/// Scores parameter vectors against assembled observations.
///
/// Holds only shared references, so one evaluator can be used from every
/// worker of a parallel evaluation.
pub struct SampleEvaluator<'a, M: ?Sized> {
    model: &'a M,
    data: &'a AssembledData,
}

impl<M: ?Sized> Clone for SampleEvaluator<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: ?Sized> Copy for SampleEvaluator<'_, M> {}

impl<'a, M: EtModel + ?Sized> SampleEvaluator<'a, M> {
    pub fn new(model: &'a M, data: &'a AssembledData) -> Self {
        Self { model, data }
    }

    /// Normalized NSE of the model's predictions for `params`
    pub fn score(&self, params: &[f64]) -> Result<f64, ModelError> {
        let expected = self.model.required_parameters().len();
        if params.len() != expected {
            return Err(ModelError::ParameterCount {
                expected,
                found: params.len(),
            });
        }

        let predicted = self.model.predict(params, &self.data.drivers)?;
        if predicted.len() != self.data.len() {
            return Err(ModelError::DriverLength {
                expected: self.data.len(),
                found: predicted.len(),
            });
        }

        let efficiency = nse(&self.data.observations, &predicted);
        if !efficiency.is_finite() {
            let pairs = finite_pairs(&self.data.observations, &predicted);
            return Err(ModelError::Skill(format!(
                "efficiency is {efficiency} over {pairs} finite pairs"
            )));
        }
        Ok(normalize_nse(efficiency))
    }

    /// Score sample `row`, attaching the row and its parameters on failure
    pub fn evaluate_row(&self, row: usize, params: &[f64]) -> Result<f64, EvaluationError> {
        self.score(params).map_err(|source| EvaluationError {
            row,
            parameters: params.to_vec(),
            source,
        })
    }
}
