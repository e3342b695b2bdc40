//! Result export: sensitivity indices to a JSON artifact.
//!
//! The document is built completely in memory, then written to a sibling
//! temporary file and renamed over the target, so a reader never sees a
//! partial artifact.

use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::SensitivityIndexSet;
use crate::config::OutputConfig;
use crate::drivers::Stratum;
use crate::error::ExportError;

/// Artifact label: the target alone, or `{target}-PFT{class}`
#[must_use]
pub fn label(target: &str, stratum: Stratum) -> String {
    match stratum.pft() {
        Some(class) => format!("{target}-PFT{class}"),
        None => target.to_string(),
    }
}

/// Deterministic JSON for an index set: sorted keys, nested lists, `null` for NaN
pub fn to_json(indices: &SensitivityIndexSet) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(indices)
}

/// Write `content` next to `path` and rename it into place
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, content)?;
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    Ok(())
}

/// Writes index sets under the configured directory and filename template
#[derive(Debug, Clone)]
pub struct ResultExporter {
    output: OutputConfig,
}

impl ResultExporter {
    #[must_use]
    pub fn new(output: OutputConfig) -> Self {
        Self { output }
    }

    /// Destination of the artifact for `stratum`
    #[must_use]
    pub fn path_for(&self, stratum: Stratum) -> PathBuf {
        let label = label(&self.output.target, stratum);
        self.output
            .dir
            .join(self.output.template.replace("{label}", &label))
    }

    /// Serialize and persist `indices`, returning the artifact path
    pub fn export(
        &self,
        indices: &SensitivityIndexSet,
        stratum: Stratum,
    ) -> Result<PathBuf, ExportError> {
        let path = self.path_for(stratum);
        let write_error = |reason: String| ExportError::Write {
            path: path.clone(),
            reason,
        };

        let mut json = to_json(indices).map_err(|e| write_error(e.to_string()))?;
        json.push('\n');

        if !self.output.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.output.dir).map_err(|e| write_error(e.to_string()))?;
        }
        atomic_write(&path, json.as_bytes()).map_err(|e| write_error(e.to_string()))?;

        tracing::info!(path = %path.display(), indices = indices.len(), "Wrote sensitivity indices");
        Ok(path)
    }
}
