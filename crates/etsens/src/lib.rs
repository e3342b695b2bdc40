//! Command-line front end for the MOD16 sensitivity analysis
//!
//! Loads a YAML run configuration, sets up logging, and runs one analysis
//! per invocation through `etsens_core`.

pub mod config;
pub mod logging;
pub mod run;

pub use config::{ConfigError, Overrides, default_config_path, load_config};
pub use logging::init_logging;
pub use run::run_analysis;
