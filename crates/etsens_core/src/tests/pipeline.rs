//! Tests for full sensitivity runs
//!
//! These tests verify:
//! - Sample matrix shape follows the design formula
//! - A failing row aborts the run and nothing is exported
//! - Parallel and sequential evaluation agree
//! - A run over the tower fixture produces a complete artifact

use std::fs;

use tempfile::tempdir;

use super::fixtures::{TowerFixture, data_config, linear_data};
use crate::analysis::SobolAnalyzer;
use crate::config::{OutputConfig, RunConfig};
use crate::drivers::{DriverSet, DriverVariable, Stratum, assemble};
use crate::error::{ModelError, SensitivityError};
use crate::export::ResultExporter;
use crate::model::{EtModel, Mod16};
use crate::orchestrator::{RunSettings, RunState, SensitivityRun};
use crate::problem::{BoundsRegistry, ProblemSpec};
use crate::sampling::{SaltelliSampler, SampleMatrix, Sampler};

/// Weighted sum of four parameters scaled by `temp_day`; fails on listed rows
struct FlakyModel {
    fail_on: Vec<Vec<f64>>,
}

impl EtModel for FlakyModel {
    fn required_parameters(&self) -> &[&'static str] {
        &["p0", "p1", "p2", "p3"]
    }

    fn predict(&self, params: &[f64], drivers: &DriverSet) -> Result<Vec<f64>, ModelError> {
        if self.fail_on.iter().any(|row| row == params) {
            return Err(ModelError::Other("solver diverged".into()));
        }
        let weight = 4.0 * params[0] + 2.0 * params[1] + params[2] + 0.5 * params[3];
        Ok(drivers
            .get(DriverVariable::TempDay)
            .iter()
            .map(|x| weight * x)
            .collect())
    }
}

fn unit_registry(names: &[&str]) -> BoundsRegistry {
    let mut registry = BoundsRegistry::new();
    for name in names {
        registry.insert(*name, 0.0, 1.0);
    }
    registry
}

fn flaky_samples(registry: &BoundsRegistry) -> SampleMatrix {
    let problem = ProblemSpec::build(&["p0", "p1", "p2", "p3"], registry).unwrap();
    SaltelliSampler::new(true, 17).generate(&problem, 2).unwrap()
}

fn flaky_run(parallel: bool) -> SensitivityRun {
    SensitivityRun::new(
        SaltelliSampler::new(true, 17),
        SobolAnalyzer::default(),
        RunSettings {
            parallel,
            ..RunSettings::new(2)
        },
    )
}

#[test]
fn test_two_parameter_design_shape() {
    let registry = unit_registry(&["a", "b"]);
    let problem = ProblemSpec::build(&["a", "b"], &registry).unwrap();
    let samples = SaltelliSampler::new(true, 0).generate(&problem, 4).unwrap();
    assert_eq!(samples.num_rows(), 4 * (2 * 2 + 2));
    assert_eq!(samples.num_cols(), 2);
}

#[test]
fn test_failing_row_aborts_without_export() {
    let registry = unit_registry(&["p0", "p1", "p2", "p3"]);
    let samples = flaky_samples(&registry);
    assert_eq!(samples.num_rows(), 20);
    let row7 = samples.row(7).unwrap().to_vec();

    let model = FlakyModel {
        fail_on: vec![row7.clone()],
    };
    let data = linear_data(&[1.0, 3.0, 2.0, 5.0, 4.0]);
    let dir = tempdir().unwrap();
    let exporter = ResultExporter::new(OutputConfig {
        dir: dir.path().to_path_buf(),
        ..OutputConfig::default()
    });

    let mut run = flaky_run(false);
    let result = run
        .run(&model, &registry, &data)
        .and_then(|report| {
            exporter
                .export(&report.indices, report.stratum)
                .map_err(SensitivityError::from)
        });

    let err = match result {
        Err(SensitivityError::Evaluation(err)) => err,
        other => panic!("expected an evaluation error, got {other:?}"),
    };
    assert_eq!(err.row, 7);
    assert_eq!(err.parameters, row7);
    assert_eq!(run.state(), RunState::Failed);
    assert_eq!(run.failed_during(), Some(RunState::Evaluating));
    // Rows after the failure are never scored
    assert_eq!(run.progress().completed(), 8);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_parallel_reports_lowest_failing_row() {
    let registry = unit_registry(&["p0", "p1", "p2", "p3"]);
    let samples = flaky_samples(&registry);
    let model = FlakyModel {
        fail_on: vec![
            samples.row(13).unwrap().to_vec(),
            samples.row(7).unwrap().to_vec(),
        ],
    };
    let data = linear_data(&[1.0, 3.0, 2.0, 5.0, 4.0]);

    for parallel in [false, true] {
        let err = match flaky_run(parallel).run(&model, &registry, &data) {
            Err(SensitivityError::Evaluation(err)) => err,
            other => panic!("expected an evaluation error, got {other:?}"),
        };
        assert_eq!(err.row, 7, "parallel = {parallel}");
    }
}

#[test]
fn test_parallel_scores_match_sequential() {
    let registry = unit_registry(&["p0", "p1", "p2", "p3"]);
    let model = FlakyModel {
        fail_on: Vec::new(),
    };
    let data = linear_data(&[1.0, 3.0, 2.0, 5.0, 4.0]);

    let sequential = flaky_run(false).run(&model, &registry, &data).unwrap();
    let parallel = flaky_run(true).run(&model, &registry, &data).unwrap();
    assert_eq!(sequential.scores, parallel.scores);
    assert_eq!(sequential.samples, parallel.samples);
    assert_eq!(sequential.scores.len(), sequential.samples.num_rows());
}

#[test]
fn test_tower_run_writes_complete_artifact() {
    let fixture = TowerFixture::default();
    let dir = tempdir().unwrap();

    let mut config = RunConfig::new(data_config());
    config.sensitivity.base_count = 4;
    config.sensitivity.bootstrap.resamples = 10;
    config.output.dir = dir.path().to_path_buf();

    let stratum = Stratum::for_invocation(None);
    let data = assemble(&fixture.store(), &config.data, &Mod16, stratum).unwrap();
    let registry = BoundsRegistry::mod16().with_overrides(&config.bounds);
    let report = SensitivityRun::from_config(&config, stratum.pft())
        .run(&Mod16, &registry, &data)
        .unwrap();

    assert_eq!(report.samples.num_rows(), 4 * (2 * 11 + 2));
    assert_eq!(report.scores.len(), report.samples.num_rows());
    assert!(report.scores.iter().all(|s| *s > 0.0 && *s <= 1.0));

    let exporter = ResultExporter::new(config.output.clone());
    let path = exporter.export(&report.indices, report.stratum).unwrap();
    assert_eq!(
        path.file_name().unwrap(),
        "MOD16_sensitivity_ET_analysis.json"
    );

    let first = fs::read(&path).unwrap();
    exporter.export(&report.indices, report.stratum).unwrap();
    assert_eq!(first, fs::read(&path).unwrap());

    let value: serde_json::Value = serde_json::from_slice(&first).unwrap();
    for key in ["S1", "S1_conf", "ST", "ST_conf", "S2", "S2_conf"] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    assert_eq!(value["S1"].as_array().unwrap().len(), 11);
    assert_eq!(value["S2"].as_array().unwrap().len(), 11);
}
