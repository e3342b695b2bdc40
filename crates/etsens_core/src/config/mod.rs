//! Run configuration
//!
//! The main configuration type is `RunConfig`, which carries everything a
//! sensitivity run needs: where the driver data lives and which dataset paths
//! hold each driver, how many samples to draw, and where the indices go.
//!
//! A `RunConfig` is built once at startup (usually deserialized from YAML by
//! the application crate) and passed by reference into the assembler and the
//! problem builder. Nothing here is global.
//!
//! ```ignore
//! let config = RunConfig::new(DataConfig::new("towers.json", StaticDatasets {
//!     albedo: "MODIS/albedo".into(),
//!     elevation: "state/elevation_m".into(),
//!     fpar: "MODIS/fPAR".into(),
//!     lai: "MODIS/LAI".into(),
//! }));
//! let data = assemble(&store, &config.data, &Mod16, Stratum::Pft(4))?;
//! let report = SensitivityRun::from_config(&config, Some(4)).run(&Mod16, &registry, &data)?;
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_met_group() -> String {
    "MERRA2".to_string()
}

fn default_pft_path() -> String {
    "state/PFT".to_string()
}

fn default_site_id_path() -> String {
    "FLUXNET/site_id".to_string()
}

fn default_observations_path() -> String {
    "FLUXNET/latent_heat".to_string()
}

fn default_validation_mask_path() -> String {
    "FLUXNET/validation_mask".to_string()
}

fn default_base_count() -> usize {
    256
}

fn default_base_count_pft() -> usize {
    128
}

fn default_true() -> bool {
    true
}

fn default_resamples() -> usize {
    100
}

fn default_confidence() -> f64 {
    0.95
}

fn default_template() -> String {
    "MOD16_sensitivity_{label}_analysis.json".to_string()
}

fn default_target() -> String {
    "ET".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Complete configuration for one sensitivity run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataConfig,

    #[serde(default)]
    pub sensitivity: SensitivityConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Parameter bounds that override or extend the built-in registry
    #[serde(default)]
    pub bounds: BTreeMap<String, [f64; 2]>,
}

impl RunConfig {
    #[must_use]
    pub fn new(data: DataConfig) -> Self {
        Self {
            data,
            sensitivity: SensitivityConfig::default(),
            output: OutputConfig::default(),
            bounds: BTreeMap::new(),
        }
    }

    /// Base sample count for the requested stratum.
    ///
    /// Whole-population runs have more cells to score per row and use the
    /// larger design; single-class runs use `base_count_pft`.
    #[must_use]
    pub fn base_count_for(&self, pft: Option<u8>) -> usize {
        match pft {
            None => self.sensitivity.base_count,
            Some(_) => self.sensitivity.base_count_pft,
        }
    }
}

/// Location of the backing store and the dataset paths inside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the backing store file
    pub file: PathBuf,

    /// Group prefix for the meteorological time series
    #[serde(default = "default_met_group")]
    pub met_group: String,

    /// Paths of the static / vegetation drivers
    pub datasets: StaticDatasets,

    /// Per-site, per-subgrid vegetation class codes
    #[serde(default = "default_pft_path")]
    pub pft: String,

    #[serde(default = "default_site_id_path")]
    pub site_id: String,

    /// Observed target series, `[time, site]`
    #[serde(default = "default_observations_path")]
    pub observations: String,

    /// Validation-subset flags, `[time, site]`
    #[serde(default = "default_validation_mask_path")]
    pub validation_mask: String,
}

impl DataConfig {
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, datasets: StaticDatasets) -> Self {
        Self {
            file: file.into(),
            met_group: default_met_group(),
            datasets,
            pft: default_pft_path(),
            site_id: default_site_id_path(),
            observations: default_observations_path(),
            validation_mask: default_validation_mask_path(),
        }
    }

    /// Full path of a dataset under the meteorological group
    #[must_use]
    pub fn met(&self, name: &str) -> String {
        format!("{}/{}", self.met_group, name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticDatasets {
    pub albedo: String,
    pub elevation: String,
    #[serde(rename = "fPAR")]
    pub fpar: String,
    #[serde(rename = "LAI")]
    pub lai: String,
}

/// Sampling and analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityConfig {
    /// Base sample count for whole-population runs (power of two)
    #[serde(default = "default_base_count")]
    pub base_count: usize,

    /// Base sample count for single-class runs (power of two)
    #[serde(default = "default_base_count_pft")]
    pub base_count_pft: usize,

    /// Also estimate second-order (pairwise) indices
    #[serde(default = "default_true")]
    pub second_order: bool,

    /// Seed for the sample matrix
    #[serde(default)]
    pub seed: u64,

    /// Evaluate sample rows on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            base_count: default_base_count(),
            base_count_pft: default_base_count_pft(),
            second_order: true,
            seed: 0,
            parallel: false,
            bootstrap: BootstrapConfig::default(),
        }
    }
}

/// Bootstrap settings for confidence intervals on the indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_resamples")]
    pub resamples: usize,

    #[serde(default = "default_confidence")]
    pub confidence: f64,

    #[serde(default)]
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            resamples: default_resamples(),
            confidence: default_confidence(),
            seed: 0,
        }
    }
}

/// Where and under what name the indices are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Filename template; `{label}` is replaced by the analysis label
    #[serde(default = "default_template")]
    pub template: String,

    /// Name of the analysed target variable
    #[serde(default = "default_target")]
    pub target: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            template: default_template(),
            target: default_target(),
        }
    }
}
