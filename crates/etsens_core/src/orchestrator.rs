//! Sensitivity run orchestration.
//!
//! Drives one analysis: build the problem, generate the sample matrix, score
//! every row, and hand the ordered score vector to the analyzer.
//!
//! ```ignore
//! use etsens_core::{RunConfig, SensitivityRun, drivers, model::Mod16};
//!
//! let data = drivers::assemble_from_file(&config.data, &Mod16, stratum)?;
//! let mut run = SensitivityRun::from_config(&config, stratum.pft());
//! let report = run.run(&Mod16, &registry, &data)?;
//! ```
//!
//! Rows are scored in matrix order. With the `parallel` feature and
//! `RunSettings::parallel` set, rows are scored on the rayon pool and each
//! score lands at its own row index, so the score vector is identical to the
//! sequential one.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::{Analyzer, SensitivityIndexSet, SobolAnalyzer};
use crate::config::RunConfig;
use crate::drivers::{AssembledData, Stratum};
use crate::error::{EvaluationError, SensitivityError};
use crate::evaluate::SampleEvaluator;
use crate::model::EtModel;
use crate::problem::{BoundsRegistry, ProblemSpec};
use crate::sampling::{SaltelliSampler, SampleMatrix, Sampler};

/// Progress of the evaluation loop, shareable with a watcher thread
#[derive(Debug, Clone)]
pub struct EvaluationProgress {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl EvaluationProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Count one scored row and return the new completed count
    pub fn increment(&self) -> usize {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }
}

impl Default for EvaluationProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Lifecycle of a run. `Failed` is terminal; `run` restarts from `Init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Init,
    SpecBuilt,
    Sampled,
    Evaluating,
    Analyzing,
    Analyzed,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "init",
            RunState::SpecBuilt => "spec built",
            RunState::Sampled => "sampled",
            RunState::Evaluating => "evaluating",
            RunState::Analyzing => "analyzing",
            RunState::Analyzed => "analyzed",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSettings {
    /// Base sample count handed to the sampler (power of two)
    pub base_count: usize,
    /// Score rows on the rayon pool (needs the `parallel` feature)
    pub parallel: bool,
    /// Log progress every this many rows; `None` logs every 10%
    pub progress_every: Option<usize>,
}

impl RunSettings {
    #[must_use]
    pub fn new(base_count: usize) -> Self {
        Self {
            base_count,
            parallel: false,
            progress_every: None,
        }
    }

    /// Settings for a run over `pft` (or the whole population)
    #[must_use]
    pub fn from_config(config: &RunConfig, pft: Option<u8>) -> Self {
        Self {
            base_count: config.base_count_for(pft),
            parallel: config.sensitivity.parallel,
            progress_every: None,
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct SensitivityReport {
    /// Which part of the site population was analysed
    pub stratum: Stratum,
    pub problem: ProblemSpec,
    pub samples: SampleMatrix,
    /// One score per sample row, in row order
    pub scores: Vec<f64>,
    pub indices: SensitivityIndexSet,
}

/// One sensitivity analysis with its state machine
#[derive(Debug)]
pub struct SensitivityRun<S = SaltelliSampler, A = SobolAnalyzer> {
    sampler: S,
    analyzer: A,
    settings: RunSettings,
    state: RunState,
    failed_during: Option<RunState>,
    progress: EvaluationProgress,
}

impl SensitivityRun {
    /// Saltelli sampling and Sobol analysis as configured
    #[must_use]
    pub fn from_config(config: &RunConfig, pft: Option<u8>) -> Self {
        let sensitivity = &config.sensitivity;
        Self::new(
            SaltelliSampler::new(sensitivity.second_order, sensitivity.seed),
            SobolAnalyzer::from_config(sensitivity),
            RunSettings::from_config(config, pft),
        )
    }
}

impl<S: Sampler, A: Analyzer> SensitivityRun<S, A> {
    pub fn new(sampler: S, analyzer: A, settings: RunSettings) -> Self {
        Self {
            sampler,
            analyzer,
            settings,
            state: RunState::Init,
            failed_during: None,
            progress: EvaluationProgress::default(),
        }
    }

    /// Share progress counters with a watcher
    #[must_use]
    pub fn with_progress(mut self, progress: EvaluationProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// State the run was in when it failed
    pub fn failed_during(&self) -> Option<RunState> {
        self.failed_during
    }

    pub fn progress(&self) -> &EvaluationProgress {
        &self.progress
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run the full pipeline from `Init`.
    ///
    /// Any failure leaves the run in `Failed` and nothing is returned but the
    /// error; an evaluation failure carries the failing row and parameters.
    pub fn run<M: EtModel + ?Sized>(
        &mut self,
        model: &M,
        registry: &BoundsRegistry,
        data: &AssembledData,
    ) -> Result<SensitivityReport, SensitivityError> {
        self.failed_during = None;
        self.transition(RunState::Init);

        let result = self.pipeline(model, registry, data);
        if let Err(err) = &result {
            self.failed_during = Some(self.state);
            tracing::warn!(during = %self.state, error = %err, "Sensitivity run failed");
            self.state = RunState::Failed;
        }
        result
    }

    fn pipeline<M: EtModel + ?Sized>(
        &mut self,
        model: &M,
        registry: &BoundsRegistry,
        data: &AssembledData,
    ) -> Result<SensitivityReport, SensitivityError> {
        let problem = ProblemSpec::build(model.required_parameters(), registry)?;
        self.transition(RunState::SpecBuilt);

        let samples = self.sampler.generate(&problem, self.settings.base_count)?;
        self.transition(RunState::Sampled);
        tracing::info!(
            stratum = %data.stratum,
            rows = samples.num_rows(),
            parameters = problem.num_vars(),
            cells = data.len(),
            "Sample matrix ready"
        );

        self.transition(RunState::Evaluating);
        let scores = self.evaluate(model, data, &samples)?;

        self.transition(RunState::Analyzing);
        let indices = self.analyzer.analyze(&problem, &scores)?;
        self.transition(RunState::Analyzed);

        let report = SensitivityReport {
            stratum: data.stratum,
            problem,
            samples,
            scores,
            indices,
        };
        self.transition(RunState::Done);
        Ok(report)
    }

    fn evaluate<M: EtModel + ?Sized>(
        &self,
        model: &M,
        data: &AssembledData,
        samples: &SampleMatrix,
    ) -> Result<Vec<f64>, EvaluationError> {
        let evaluator = SampleEvaluator::new(model, data);
        let total = samples.num_rows();
        let every = self
            .settings
            .progress_every
            .unwrap_or(total / 10)
            .max(1);
        let progress = &self.progress;
        progress.reset(total);

        let score_row = |row: usize, params: &[f64]| {
            let score = evaluator.evaluate_row(row, params);
            let completed = progress.increment();
            if completed % every == 0 {
                tracing::info!(completed, total, "Evaluating samples");
            }
            score
        };

        #[cfg(feature = "parallel")]
        if self.settings.parallel {
            let rows: Vec<&[f64]> = samples.rows().collect();
            let results: Vec<Result<f64, EvaluationError>> = rows
                .par_iter()
                .enumerate()
                .map(|(row, params)| score_row(row, params))
                .collect();
            // First error in row order is the lowest failing row
            return results.into_iter().collect();
        }

        #[cfg(not(feature = "parallel"))]
        if self.settings.parallel {
            tracing::warn!("Built without the parallel feature, scoring rows sequentially");
        }

        samples
            .rows()
            .enumerate()
            .map(|(row, params)| score_row(row, params))
            .collect()
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = %self.state, to = %next, "Run state");
        self.state = next;
    }
}
