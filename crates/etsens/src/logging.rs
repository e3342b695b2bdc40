use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log file name inside the log directory
pub const LOG_FILE: &str = "etsens.log";

/// Size limits for the log file
#[derive(Debug, Clone, Copy)]
struct LogLimits {
    /// Trim once the file is larger than this
    max: u64,
    /// Bytes of recent history to keep when trimming
    keep: u64,
}

const LIMITS: LogLimits = LogLimits {
    max: 5 * 1024 * 1024,
    keep: 1024 * 1024,
};

/// Drop old entries from the log at `log_path` once it outgrows `limits`.
///
/// Returns the number of bytes dropped, or `None` if the file was left alone.
/// The kept tail begins at a line start and is preceded by a one-line marker.
fn trim_log(log_path: &Path, limits: LogLimits) -> io::Result<Option<u64>> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if size <= limits.max {
        return Ok(None);
    }

    let mut tail = Vec::new();
    let mut file = File::open(log_path)?;
    let start = file.seek(SeekFrom::Start(size.saturating_sub(limits.keep)))?;
    file.read_to_end(&mut tail)?;

    let partial = tail.iter().position(|&b| b == b'\n').map_or(0, |i| i + 1);
    let dropped = start + partial as u64;

    let mut file = File::create(log_path)?;
    writeln!(file, "# etsens: dropped {dropped} bytes of older log entries")?;
    file.write_all(&tail[partial..])?;
    Ok(Some(dropped))
}

/// Open `<log_dir>/etsens.log` for appending, trimming it first
fn open_log_file(log_dir: &Path) -> color_eyre::Result<(PathBuf, File)> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE);

    if let Err(e) = trim_log(&log_path, LIMITS) {
        eprintln!("Warning: could not trim {}: {e}", log_path.display());
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    Ok((log_path, file))
}

/// Default filter directives for `level`
fn default_filter(level: &str) -> String {
    format!("etsens={level},etsens_core={level}")
}

/// Initialize logging to stderr and, with a `log_dir`, to `etsens.log` in it.
///
/// Past 5MB the log file is trimmed to its most recent 1MB.
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(log_dir: Option<&Path>, level: &str) -> color_eyre::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let (log_path, file_layer) = match log_dir {
        Some(dir) => {
            let (path, file) = open_log_file(dir)?;
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false);
            (Some(path), Some(layer))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()?;

    match log_path {
        Some(path) => tracing::debug!(log_path = %path.display(), "Logging initialized"),
        None => tracing::debug!("Logging initialized"),
    }
    Ok(())
}
