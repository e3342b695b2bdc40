//! File-backed store.
//!
//! File layout:
//!
//! ```json
//! {
//!   "datasets": {
//!     "MERRA2/Tmin": { "shape": [365, 12], "data": [271.3, null, ...] }
//!   },
//!   "strings": {
//!     "FLUXNET/site_id": ["US-Ha1", "CA-Oas"]
//!   }
//! }
//! ```
//!
//! `null` entries decode to `NaN` (missing).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use super::{DataStore, Dataset, MemoryStore};
use crate::error::DataError;

#[derive(Debug, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    datasets: BTreeMap<String, RawDataset>,
    #[serde(default)]
    strings: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    shape: Vec<usize>,
    data: Vec<Option<f64>>,
}

/// Store handle backed by a JSON document on disk.
///
/// The whole document is decoded on `open`; the file handle is closed before
/// `open` returns, and the decoded contents are released when the store is
/// dropped.
#[derive(Debug)]
pub struct JsonStore {
    inner: MemoryStore,
}

impl JsonStore {
    pub fn open(path: &Path) -> Result<Self, DataError> {
        let source_error = |reason: String| DataError::DataSource {
            path: path.display().to_string(),
            reason,
        };

        let file = File::open(path).map_err(|e| source_error(format!("cannot open store: {e}")))?;
        let document: StoreDocument = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| source_error(format!("malformed store: {e}")))?;

        let mut inner = MemoryStore::new();
        for (name, raw) in document.datasets {
            let data = raw.data.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            let dataset = Dataset::from_data(raw.shape, data).ok_or_else(|| DataError::DataSource {
                path: name.clone(),
                reason: "data length does not match declared shape".to_string(),
            })?;
            inner.insert(name, dataset);
        }
        for (name, values) in document.strings {
            inner.insert_strings(name, values);
        }

        tracing::debug!(path = %path.display(), "Opened backing store");
        Ok(Self { inner })
    }
}

impl DataStore for JsonStore {
    fn dataset(&self, path: &str) -> Result<Dataset, DataError> {
        self.inner.dataset(path)
    }

    fn strings(&self, path: &str) -> Result<Vec<String>, DataError> {
        self.inner.strings(path)
    }

    fn contains(&self, path: &str) -> bool {
        self.inner.contains(path)
    }
}
