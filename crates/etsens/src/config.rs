//! Configuration file loading and command-line overrides

use std::fs;
use std::path::{Path, PathBuf};

use etsens_core::RunConfig;

/// Error types for configuration loading
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, reason: String },
    Parse { path: PathBuf, reason: String },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, reason } => {
                write!(f, "cannot read {}: {}", path.display(), reason)
            }
            ConfigError::Parse { path, reason } => {
                write!(f, "cannot parse {}: {}", path.display(), reason)
            }
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Default configuration location (`<config dir>/etsens/config.yaml`)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("etsens")
        .join("config.yaml")
}

pub fn from_yaml(yaml: &str) -> Result<RunConfig, serde_saphyr::Error> {
    serde_saphyr::from_str(yaml)
}

/// Read and validate the YAML run configuration at `path`
pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config = from_yaml(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate(&config)?;

    tracing::debug!(path = %path.display(), store = %config.data.file.display(), "Loaded configuration");
    Ok(config)
}

fn validate(config: &RunConfig) -> Result<(), ConfigError> {
    let bootstrap = &config.sensitivity.bootstrap;
    if !(bootstrap.confidence > 0.0 && bootstrap.confidence < 1.0) {
        return Err(ConfigError::Invalid(format!(
            "bootstrap confidence must lie in (0, 1), got {}",
            bootstrap.confidence
        )));
    }
    if bootstrap.resamples < 2 {
        return Err(ConfigError::Invalid(format!(
            "bootstrap needs at least 2 resamples for a spread, got {}",
            bootstrap.resamples
        )));
    }
    if !config.output.template.contains("{label}") {
        return Err(ConfigError::Invalid(format!(
            "output template `{}` has no {{label}} placeholder",
            config.output.template
        )));
    }
    Ok(())
}

/// Values given on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_count: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub parallel: bool,
}

impl Overrides {
    /// Apply to `config` for a run over `pft`
    pub fn apply(&self, config: &mut RunConfig, pft: Option<u8>) {
        if let Some(n) = self.base_count {
            match pft {
                None => config.sensitivity.base_count = n,
                Some(_) => config.sensitivity.base_count_pft = n,
            }
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if self.parallel {
            config.sensitivity.parallel = true;
        }
    }
}
