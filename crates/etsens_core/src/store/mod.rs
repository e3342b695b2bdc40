//! Backing data store: named datasets under hierarchical group paths.
//!
//! The assembler only needs read access, expressed by the `DataStore` trait.
//! Two implementations ship with the crate:
//! - `MemoryStore` - datasets held in a hash map (tests, embedding callers)
//! - `JsonStore` - a file-backed store opened for the duration of an assembly

mod dataset;
mod json;

pub use dataset::Dataset;
pub use json::JsonStore;

use rustc_hash::FxHashMap;

use crate::error::DataError;

/// Read-only access to named datasets (e.g. `MERRA2/Tmin`, `FLUXNET/site_id`)
pub trait DataStore {
    /// Load a numeric dataset. Absent paths are a `DataSource` error.
    fn dataset(&self, path: &str) -> Result<Dataset, DataError>;

    /// Load a string list (e.g. site identifiers)
    fn strings(&self, path: &str) -> Result<Vec<String>, DataError>;

    fn contains(&self, path: &str) -> bool;
}

/// `DataSource` error for a path the store does not hold
pub(crate) fn absent(path: &str) -> DataError {
    DataError::DataSource {
        path: path.to_string(),
        reason: "dataset not found in backing store".to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    datasets: FxHashMap<String, Dataset>,
    strings: FxHashMap<String, Vec<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, dataset: Dataset) {
        self.datasets.insert(path.into(), dataset);
    }

    pub fn insert_strings(&mut self, path: impl Into<String>, values: Vec<String>) {
        self.strings.insert(path.into(), values);
    }

    #[must_use]
    pub fn with_dataset(mut self, path: impl Into<String>, dataset: Dataset) -> Self {
        self.insert(path, dataset);
        self
    }

    #[must_use]
    pub fn with_strings(mut self, path: impl Into<String>, values: Vec<String>) -> Self {
        self.insert_strings(path, values);
        self
    }

    /// Drop a dataset (used to simulate incomplete stores)
    pub fn remove(&mut self, path: &str) -> Option<Dataset> {
        self.datasets.remove(path)
    }
}

impl DataStore for MemoryStore {
    fn dataset(&self, path: &str) -> Result<Dataset, DataError> {
        self.datasets.get(path).cloned().ok_or_else(|| absent(path))
    }

    fn strings(&self, path: &str) -> Result<Vec<String>, DataError> {
        self.strings.get(path).cloned().ok_or_else(|| absent(path))
    }

    fn contains(&self, path: &str) -> bool {
        self.datasets.contains_key(path) || self.strings.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lookup() {
        let store = MemoryStore::new()
            .with_dataset("MERRA2/Tmin", Dataset::filled(vec![2, 2], 270.0))
            .with_strings("FLUXNET/site_id", vec!["US-Ha1".into(), "CA-Oas".into()]);

        assert!(store.contains("MERRA2/Tmin"));
        assert!(store.contains("FLUXNET/site_id"));
        assert_eq!(store.dataset("MERRA2/Tmin").unwrap().len(), 4);
        assert_eq!(store.strings("FLUXNET/site_id").unwrap().len(), 2);
    }

    #[test]
    fn test_memory_store_absent_path() {
        let store = MemoryStore::new();
        let err = store.dataset("MERRA2/T10M").unwrap_err();
        assert!(matches!(err, DataError::DataSource { ref path, .. } if path == "MERRA2/T10M"));
    }
}
