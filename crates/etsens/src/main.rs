use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use etsens::{Overrides, default_config_path, init_logging, load_config, run_analysis};
use etsens_core::{BoundsRegistry, Mod16};

#[derive(Parser, Debug)]
#[command(name = "etsens")]
#[command(about = "Sobol sensitivity analysis of the MOD16 ET model at flux tower sites")]
struct Args {
    /// Path to the run configuration (default: <config dir>/etsens/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Analyse only sites whose dominant vegetation class is this code
    #[arg(long)]
    pft: Option<u8>,

    /// Override the base sample count (power of two)
    #[arg(long)]
    base_count: Option<usize>,

    /// Override the output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also write logs to etsens.log in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Evaluate sample rows in parallel
    #[arg(long)]
    parallel: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.log_dir.as_deref(), &args.log_level)?;

    let config_path = args.config.unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path).wrap_err("Failed to load configuration")?;
    Overrides {
        base_count: args.base_count,
        output_dir: args.output_dir,
        parallel: args.parallel,
    }
    .apply(&mut config, args.pft);

    let registry = BoundsRegistry::mod16().with_overrides(&config.bounds);
    let path = run_analysis(&config, &Mod16, &registry, args.pft)?;

    tracing::info!(path = %path.display(), "Analysis complete");
    println!("{}", path.display());
    Ok(())
}
