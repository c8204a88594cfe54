use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A named byte-oriented key-value collection with optional expiry.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>);
    async fn remove(&self, key: &[u8]);
}

/// Hands out collections by name.
pub trait Store {
    /// Returns the collection `name`, creating it if needed. Persistent
    /// collections are `None` when no disk backend is available.
    fn get_collection(&self, name: &str, persist: bool) -> Option<Arc<dyn KeyValueCollection>>;
}

/// Prepends the expiry (unix millis, 0 for never) to a value.
pub(crate) fn encode_entry(value: &[u8], ttl: Option<Duration>) -> Vec<u8> {
    let expires_at = ttl
        .and_then(|d| SystemTime::now().checked_add(d))
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| (d.as_millis() as u64).max(1));
    let mut entry = Vec::with_capacity(value.len() + 8);
    entry.extend_from_slice(&expires_at.to_be_bytes());
    entry.extend_from_slice(value);
    entry
}

/// Splits an encoded entry, returning `None` for malformed or expired ones.
pub(crate) fn decode_entry(entry: &[u8]) -> Option<&[u8]> {
    let (header, value) = entry.split_at_checked(8)?;
    let expires_at = u64::from_be_bytes(header.try_into().ok()?);
    if expires_at != 0 {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_millis() as u64;
        if now >= expires_at {
            return None;
        }
    }
    Some(value)
}
