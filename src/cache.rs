use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::debug;

use crate::{
    error::DataLoadError,
    loader::{self, OrderTable},
};

/// Loaded tables keyed by input path and delimiter. Each pair is read from
/// disk at most once for the lifetime of the cache; failed loads are not
/// remembered.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<(PathBuf, u8), Arc<OrderTable>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path, delimiter: u8) -> Result<Arc<OrderTable>, DataLoadError> {
        let key = (path.to_path_buf(), delimiter);
        if let Some(table) = self.entries.get(&key) {
            debug!("Reusing cached table for {path:?}");
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(loader::load(path, delimiter)?);
        self.entries.insert(key, Arc::clone(&table));
        Ok(table)
    }

    pub fn contains(&self, path: &Path, delimiter: u8) -> bool {
        self.entries.contains_key(&(path.to_path_buf(), delimiter))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
