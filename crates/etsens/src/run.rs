//! One end-to-end analysis: assemble, sample, evaluate, analyze, export.

use std::path::PathBuf;

use color_eyre::eyre::WrapErr;
use etsens_core::drivers::assemble_from_file;
use etsens_core::{BoundsRegistry, EtModel, ResultExporter, RunConfig, SensitivityRun, Stratum};

/// Run the analysis for `pft` (or the whole population) and return the
/// artifact path. Nothing is written unless every stage succeeds.
pub fn run_analysis<M: EtModel + ?Sized>(
    config: &RunConfig,
    model: &M,
    registry: &BoundsRegistry,
    pft: Option<u8>,
) -> color_eyre::Result<PathBuf> {
    let stratum = Stratum::for_invocation(pft);
    tracing::info!(%stratum, store = %config.data.file.display(), "Starting sensitivity analysis");

    let data = assemble_from_file(&config.data, model, stratum)
        .wrap_err_with(|| format!("Failed to assemble driver data for {stratum}"))?;
    tracing::info!(cells = data.len(), sites = data.sites.len(), "Driver data assembled");

    let mut run = SensitivityRun::from_config(config, pft);
    let report = run
        .run(model, registry, &data)
        .wrap_err_with(|| format!("Sensitivity run failed during {}", failed_stage(&run)))?;

    ResultExporter::new(config.output.clone())
        .export(&report.indices, report.stratum)
        .wrap_err("Failed to export sensitivity indices")
}

fn failed_stage(run: &SensitivityRun) -> String {
    run.failed_during()
        .map_or_else(|| run.state().to_string(), |state| state.to_string())
}
