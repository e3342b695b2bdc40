//! Variance-based sensitivity analysis for the MOD16 evapotranspiration model
//!
//! This crate estimates how much each MOD16 parameter contributes to the
//! model's skill at eddy-covariance tower sites. It supports:
//! - Driver assembly from a hierarchical dataset store, with per-PFT or
//!   validation-subset site selection
//! - Saltelli cross-sampling of the parameter space
//! - Per-row model evaluation scored by normalized Nash-Sutcliffe efficiency
//! - Sobol first-order, total-order and second-order indices with
//!   bootstrap confidence intervals
//! - Atomic JSON export of the index set
//!
//! # Example
//!
//! ```ignore
//! use etsens_core::{BoundsRegistry, Mod16, ResultExporter, RunConfig, SensitivityRun, Stratum};
//!
//! let stratum = Stratum::for_invocation(Some(4));
//! let data = etsens_core::drivers::assemble_from_file(&config.data, &Mod16, stratum)?;
//! let registry = BoundsRegistry::mod16().with_overrides(&config.bounds);
//! let report = SensitivityRun::from_config(&config, stratum.pft()).run(&Mod16, &registry, &data)?;
//! let path = ResultExporter::new(config.output.clone()).export(&report.indices, stratum)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Data access
// ============================================================================

pub mod config;
pub mod drivers;
pub mod error;
pub mod store;

// ============================================================================
// Model and scoring
// ============================================================================

pub mod evaluate;
pub mod metrics;
pub mod model;

// ============================================================================
// Sensitivity pipeline
// ============================================================================

pub mod analysis;
pub mod export;
pub mod orchestrator;
pub mod problem;
pub mod sampling;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use analysis::{Analyzer, SensitivityIndexSet, SobolAnalyzer};
pub use config::RunConfig;
pub use drivers::{AssembledData, Stratum};
pub use error::SensitivityError;
pub use export::ResultExporter;
pub use model::{EtModel, Mod16};
pub use orchestrator::{EvaluationProgress, RunState, SensitivityReport, SensitivityRun};
pub use problem::{BoundsRegistry, ProblemSpec};
pub use sampling::{SaltelliSampler, Sampler};
