pub mod disk;
pub mod memory;

use crate::core::cache::{KeyValueCollection, Store};
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use memory::MemoryCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};
use tracing::{debug, warn};

/// A thread-safe key-value store that can hold multiple collections.
pub struct KeyValueStore {
    collections: RwLock<HashMap<(String, bool), Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Keyspace>,
}

impl KeyValueStore {
    /// Opens a store whose persistent collections live under `path`.
    /// Without a usable path only in-memory collections are available.
    pub fn open(path: Option<&Path>) -> Self {
        let keyspace = path.and_then(|path| {
            let cache_dir = path.join("cache");
            match fjall::Config::new(&cache_dir).open() {
                Ok(keyspace) => {
                    debug!("Opened cache keyspace at {}", cache_dir.display());
                    Some(keyspace)
                }
                Err(e) => {
                    warn!("Could not open cache at {}: {}", cache_dir.display(), e);
                    None
                }
            }
        });

        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.keyspace.is_some()
    }
}

impl Store for KeyValueStore {
    fn get_collection(&self, name: &str, persist: bool) -> Option<Arc<dyn KeyValueCollection>> {
        let key = (name.to_string(), persist);
        if let Some(collection) = self
            .collections
            .read()
            .ok()
            .and_then(|collections| collections.get(&key).cloned())
        {
            return Some(collection);
        }

        let collection: Arc<dyn KeyValueCollection> = if persist {
            let partition = self
                .keyspace
                .as_ref()?
                .open_partition(name, PartitionCreateOptions::default())
                .inspect_err(|e| warn!("Could not open cache partition {}: {}", name, e))
                .ok()?;
            Arc::new(DiskCollection::new(partition))
        } else {
            Arc::new(MemoryCollection::new())
        };

        let mut collections = self.collections.write().ok()?;
        Some(Arc::clone(collections.entry(key).or_insert(collection)))
    }
}
