use crate::core::cache::{KeyValueCollection, decode_entry, encode_entry};
use async_trait::async_trait;
use fjall::PartitionHandle;
use std::time::Duration;
use tracing::debug;

/// Collection backed by a fjall partition, survives process restarts.
pub struct DiskCollection {
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(partition: PartitionHandle) -> Self {
        Self { partition }
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let entry = match self.partition.get(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("Cache MISS for key: {}", String::from_utf8_lossy(key));
                return None;
            }
            Err(e) => {
                debug!("DiskCollection get error: {}", e);
                return None;
            }
        };

        match decode_entry(&entry) {
            Some(value) => {
                debug!("Cache HIT for key: {}", String::from_utf8_lossy(key));
                Some(value.to_vec())
            }
            None => {
                debug!("Cache entry expired for key: {}", String::from_utf8_lossy(key));
                self.remove(key).await;
                None
            }
        }
    }

    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) {
        match self.partition.insert(key, encode_entry(value, ttl)) {
            Ok(()) => debug!("Cache PUT for key: {}", String::from_utf8_lossy(key)),
            Err(e) => debug!("DiskCollection put error: {}", e),
        }
    }

    async fn remove(&self, key: &[u8]) {
        if let Err(e) = self.partition.remove(key) {
            debug!("DiskCollection remove error: {}", e);
        }
    }
}
