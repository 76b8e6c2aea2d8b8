//! Dataset lookup.
//!
//! Replacements never own their data: they resolve a dataset id through a
//! [`DatasetRegistry`] at build time. [`InMemoryRegistry`] is the default
//! implementation, a map of `DataFrame`s behind a `parking_lot::RwLock`.

use crate::error::{ReplacementError, Result};
use parking_lot::RwLock;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// A store of datasets keyed by id.
pub trait DatasetRegistry: Send + Sync {
    /// Fetch a dataset. Unknown ids are a lookup error.
    fn get(&self, data_id: &str) -> Result<DataFrame>;
}

/// Thread-safe in-memory registry.
///
/// `DataFrame` clones share their column buffers, so handing out a copy on
/// every lookup is cheap.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    datasets: RwLock<HashMap<String, DataFrame>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset, returning the one previously stored under `data_id`.
    pub fn insert(&self, data_id: impl Into<String>, df: DataFrame) -> Option<DataFrame> {
        let data_id = data_id.into();
        debug!(
            "Registering dataset '{}' ({} rows x {} columns)",
            data_id,
            df.height(),
            df.width()
        );
        self.datasets.write().insert(data_id, df)
    }

    pub fn remove(&self, data_id: &str) -> Option<DataFrame> {
        self.datasets.write().remove(data_id)
    }

    pub fn contains(&self, data_id: &str) -> bool {
        self.datasets.read().contains_key(data_id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.datasets.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.datasets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.read().is_empty()
    }
}

impl DatasetRegistry for InMemoryRegistry {
    fn get(&self, data_id: &str) -> Result<DataFrame> {
        self.datasets
            .read()
            .get(data_id)
            .cloned()
            .ok_or_else(|| ReplacementError::DatasetNotFound(data_id.to_string()))
    }
}

static_assertions::assert_impl_all!(InMemoryRegistry: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df!["a" => [1, 2, 3]].unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let registry = InMemoryRegistry::new();
        assert!(registry.is_empty());

        assert!(registry.insert("1", sample()).is_none());
        assert!(registry.contains("1"));
        assert_eq!(registry.len(), 1);

        let df = registry.get("1").unwrap();
        assert_eq!(df.shape(), (3, 1));
    }

    #[test]
    fn test_insert_replaces_existing() {
        let registry = InMemoryRegistry::new();
        registry.insert("1", sample());
        let previous = registry.insert("1", df!["b" => ["x"]].unwrap());

        assert_eq!(previous.map(|df| df.height()), Some(3));
        assert_eq!(registry.get("1").unwrap().height(), 1);
    }

    #[test]
    fn test_get_unknown_id() {
        let registry = InMemoryRegistry::new();
        let err = registry.get("missing").unwrap_err();
        assert_eq!(err.error_code(), "DATASET_NOT_FOUND");
        assert!(err.is_lookup());
    }

    #[test]
    fn test_remove_and_ids() {
        let registry = InMemoryRegistry::new();
        registry.insert("b", sample());
        registry.insert("a", sample());
        assert_eq!(registry.ids(), vec!["a".to_string(), "b".to_string()]);

        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert_eq!(registry.ids(), vec!["b".to_string()]);
    }
}
