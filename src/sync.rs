use crate::error::{Error, Result};
use compact_str::CompactString;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
struct Inner {
    table: Mutex<HashMap<CompactString, Arc<AsyncMutex<()>>>>,
}

/// Keyed issuance lock
///
/// Serializes token issuance for requests that derive the same lock key,
/// so two concurrent exchanges of, say, the same refresh token can't race
/// each other into minting duplicate tokens. Requests with distinct keys
/// never contend.
#[derive(Clone, Default)]
pub struct LockMap {
    inner: Arc<Inner>,
}

impl LockMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block the calling task until no other task holds `key`
    ///
    /// The returned guard releases on drop, which covers every exit path of
    /// the issuance flow. A poisoned table is fatal: issuance must not
    /// proceed without lock evaluation.
    pub async fn acquire(&self, key: &str) -> Result<LockGuard> {
        let entry = {
            let mut table = self.inner.table.lock().map_err(|_| Error::SyncPoisoned)?;
            Arc::clone(table.entry(key.into()).or_default())
        };

        debug!(?key, "waiting for issuance lock");
        let guard = entry.lock_owned().await;

        Ok(LockGuard {
            key: key.into(),
            map: Arc::clone(&self.inner),
            guard: Some(guard),
        })
    }
}

pub struct LockGuard {
    key: CompactString,
    map: Arc<Inner>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Evict the slot unless someone else still holds or awaits it.
        // The table itself keeps one strong reference, every waiter another.
        if let Ok(mut table) = self.map.table.lock() {
            if let Some(entry) = table.get(&self.key) {
                if Arc::strong_count(entry) == 1 {
                    table.remove(&self.key);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::LockMap;

    #[tokio::test]
    async fn slot_evicted_after_release() {
        let locks = LockMap::new();

        let guard = locks.acquire("client_1:user_1").await.unwrap();
        assert_eq!(locks.inner.table.lock().unwrap().len(), 1);

        drop(guard);
        assert!(locks.inner.table.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reacquire_after_release() {
        let locks = LockMap::new();

        drop(locks.acquire("key").await.unwrap());
        drop(locks.acquire("key").await.unwrap());
    }
}
