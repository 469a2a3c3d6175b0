//! Failure-aware rotation over the shared marketplace key pool.
use crate::service::Store;
use crate::Result;
use common::ApiKey;
use log::warn;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Snapshot of the active keys for one collection cycle.
///
/// The key order is fixed when the snapshot is taken. Deactivation is written
/// through to the store and also excludes the key from the rest of this cycle.
pub struct KeyPool {
    store: Arc<dyn Store>,
    keys: Vec<ApiKey>,
    deactivated: Mutex<HashSet<ApiKey>>,
}

impl KeyPool {
    pub async fn snapshot(store: Arc<dyn Store>) -> Result<Self> {
        let keys = store.active_keys().await?;
        Ok(Self::new(store, keys))
    }

    pub fn new(store: Arc<dyn Store>, keys: Vec<ApiKey>) -> Self {
        Self {
            store,
            keys,
            deactivated: Mutex::new(HashSet::new()),
        }
    }

    pub fn keys(&self) -> &[ApiKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Endless k0, k1, .., kN-1, k0, .. over the snapshot. Empty for an empty pool.
    pub fn cycle(&self) -> impl Iterator<Item = &ApiKey> + '_ {
        self.keys.iter().cycle()
    }

    pub async fn is_usable(&self, key: &ApiKey) -> bool {
        !self.deactivated.lock().await.contains(key)
    }

    /// First usable key in pool order that is not in `tried`.
    pub async fn next_untried(&self, tried: &[ApiKey]) -> Option<ApiKey> {
        let deactivated = self.deactivated.lock().await;
        self.keys
            .iter()
            .find(|key| !tried.contains(*key) && !deactivated.contains(*key))
            .cloned()
    }

    /// Marks `key` inactive. Returns `false` if this pool had already deactivated it.
    ///
    /// The lock is held across the store write so concurrent callers for the
    /// same key issue a single write, and nobody sees the key as unusable
    /// before that write has finished.
    pub async fn deactivate(&self, key: &ApiKey) -> Result<bool> {
        let mut deactivated = self.deactivated.lock().await;
        if deactivated.contains(key) {
            return Ok(false);
        }

        self.store.deactivate_key(key).await?;
        deactivated.insert(key.clone());
        warn!("Deactivated market key {}", masked(key));
        Ok(true)
    }
}

/// Keeps keys out of logs.
pub(crate) fn masked(key: &ApiKey) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{visible}***")
}
