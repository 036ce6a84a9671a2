//! List-page snapshot store.
//!
//! Holds one `{payload, fetched_at}` record per list key ("movies",
//! "series", ...). Payloads are opaque to the store and are replaced
//! wholesale on every write.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use reelcache_core::{Clock, Snapshot};
use time::OffsetDateTime;
use tracing::{trace, warn};

type Payload = Arc<dyn Any + Send + Sync>;

/// Keyed holder of list-page snapshots.
#[derive(Debug)]
pub struct ListSnapshotStore {
    entries: RwLock<HashMap<String, Snapshot<Payload>>>,
    clock: Arc<dyn Clock>,
}

impl ListSnapshotStore {
    /// Create an empty store stamping writes with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::default(),
            clock,
        }
    }

    /// Look up the snapshot stored under `list_key`.
    ///
    /// A payload stored with a different type than `T` reads as absent.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, list_key: &str) -> Option<Snapshot<Arc<T>>> {
        let entry = self.read().get(list_key).cloned()?;
        match Arc::downcast::<T>(entry.payload) {
            Ok(payload) => Some(Snapshot::new(payload, entry.fetched_at)),
            Err(_) => {
                warn!(
                    list_key,
                    expected = type_name::<T>(),
                    "List snapshot has a different payload type"
                );
                None
            }
        }
    }

    /// Replace the snapshot for `list_key`, stamped with the current time.
    pub fn set<T: Any + Send + Sync>(
        &self,
        list_key: impl Into<String>,
        payload: T,
    ) -> OffsetDateTime {
        let now = self.clock.now();
        self.set_at(list_key, payload, now);
        now
    }

    /// Replace the snapshot for `list_key` with an explicit fetch time.
    pub fn set_at<T: Any + Send + Sync>(
        &self,
        list_key: impl Into<String>,
        payload: T,
        fetched_at: OffsetDateTime,
    ) {
        let list_key = list_key.into();
        trace!(%list_key, %fetched_at, "Storing list snapshot");
        let payload: Payload = Arc::new(payload);
        self.write().insert(list_key, Snapshot::new(payload, fetched_at));
    }

    /// Keys currently holding a snapshot, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of stored list snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true when no list snapshot is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Snapshot<Payload>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Snapshot<Payload>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
