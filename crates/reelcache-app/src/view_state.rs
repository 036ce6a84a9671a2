//! Per-list scroll/search state with a best-effort durable mirror.
//!
//! The in-memory map is authoritative. The durable mirror is consulted only
//! on a memory miss (cold start) and every failure there degrades to "no
//! saved state".

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use reelcache_core::Clock;
use reelcache_durable::{DurableKv, Result as DurableResult};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Saved scroll/search state for one list screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Vertical scroll offset.
    pub scroll_position: f64,
    /// Text in the list's search box.
    pub search_text: String,
    /// When the state was last written.
    pub updated_at: OffsetDateTime,
}

/// Caller-supplied portion of a [`ViewState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewStateUpdate {
    /// Vertical scroll offset.
    pub scroll_position: f64,
    /// Text in the list's search box.
    pub search_text: String,
}

impl ViewStateUpdate {
    /// Build an update from its parts.
    pub fn new(scroll_position: f64, search_text: impl Into<String>) -> Self {
        Self {
            scroll_position,
            search_text: search_text.into(),
        }
    }
}

/// Wire shape of a mirrored entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedViewState {
    scroll_position: f64,
    search_text: String,
    /// Unix milliseconds.
    #[serde(default)]
    updated_at: Option<i64>,
}

impl PersistedViewState {
    fn from_state(state: &ViewState) -> Self {
        Self {
            scroll_position: state.scroll_position,
            search_text: state.search_text.clone(),
            updated_at: i64::try_from(state.updated_at.unix_timestamp_nanos() / 1_000_000).ok(),
        }
    }

    fn into_state(self, fallback: OffsetDateTime) -> Option<ViewState> {
        if !self.scroll_position.is_finite() {
            return None;
        }
        let updated_at = self
            .updated_at
            .and_then(|ms| OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok())
            .unwrap_or(fallback);
        Some(ViewState {
            scroll_position: self.scroll_position,
            search_text: self.search_text,
            updated_at,
        })
    }
}

/// View-state store with promote-on-read from the durable mirror.
pub struct ViewStateStore {
    memory: RwLock<HashMap<String, ViewState>>,
    durable: Arc<dyn DurableKv>,
    namespace: String,
    clock: Arc<dyn Clock>,
}

impl ViewStateStore {
    /// Create a store mirroring into `durable` under `namespace`.
    pub fn new(
        durable: Arc<dyn DurableKv>,
        namespace: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            memory: RwLock::default(),
            durable,
            namespace: namespace.into(),
            clock,
        }
    }

    /// Durable key addressing the mirror entry for `list_key`.
    #[must_use]
    pub fn durable_key(&self, list_key: &str) -> String {
        format!("{}{list_key}", self.namespace)
    }

    /// Namespace prefix used for mirror keys.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Return the saved state for `list_key`, if any.
    ///
    /// A memory miss falls through to the durable mirror; a valid mirror
    /// entry is promoted into memory before returning.
    #[must_use]
    pub fn get(&self, list_key: &str) -> Option<ViewState> {
        if let Some(state) = self.read().get(list_key) {
            return Some(state.clone());
        }

        let state = self.load_durable(list_key)?;
        let mut memory = self.write();
        let promoted = memory
            .entry(list_key.to_owned())
            .or_insert(state)
            .clone();
        drop(memory);
        debug!(list_key, "Promoted view state from durable mirror");
        Some(promoted)
    }

    /// Save state for `list_key`, stamping `updated_at` with the current time.
    ///
    /// The in-memory write always succeeds; the mirror write is best-effort.
    pub fn set(&self, list_key: &str, update: ViewStateUpdate) -> ViewState {
        let state = ViewState {
            scroll_position: update.scroll_position,
            search_text: update.search_text,
            updated_at: self.clock.now(),
        };
        self.write().insert(list_key.to_owned(), state.clone());
        self.store_durable(list_key, &state);
        state
    }

    /// Forget the state for `list_key` in memory and in the mirror.
    ///
    /// # Errors
    /// Returns the backend error when the mirror entry cannot be removed; the
    /// in-memory copy is dropped regardless.
    pub fn clear(&self, list_key: &str) -> DurableResult<()> {
        self.write().remove(list_key);
        self.durable.remove(&self.durable_key(list_key))
    }

    /// List keys that have a mirror entry under this store's namespace.
    ///
    /// # Errors
    /// Returns the backend error when the mirror cannot be listed.
    pub fn persisted_keys(&self) -> DurableResult<Vec<String>> {
        Ok(self
            .durable
            .keys_with_prefix(&self.namespace)?
            .into_iter()
            .filter_map(|key| key.strip_prefix(self.namespace.as_str()).map(str::to_owned))
            .collect())
    }

    /// Number of list keys held in memory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true when nothing is held in memory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load_durable(&self, list_key: &str) -> Option<ViewState> {
        let key = self.durable_key(list_key);
        let raw = match self.durable.get(&key) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(%key, error = %err, "Durable view-state read failed; treating as absent");
                return None;
            }
        };
        let persisted: PersistedViewState = match serde_json::from_str(&raw) {
            Ok(persisted) => persisted,
            Err(err) => {
                debug!(%key, error = %err, "Ignoring malformed view-state payload");
                return None;
            }
        };
        persisted.into_state(self.clock.now())
    }

    fn store_durable(&self, list_key: &str, state: &ViewState) {
        let key = self.durable_key(list_key);
        let body = match serde_json::to_string(&PersistedViewState::from_state(state)) {
            Ok(body) => body,
            Err(err) => {
                warn!(%key, error = %err, "Failed to encode view state");
                return;
            }
        };
        if let Err(err) = self.durable.set(&key, &body) {
            warn!(%key, error = %err, "Durable view-state write failed; keeping in-memory copy");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ViewState>> {
        self.memory.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ViewState>> {
        self.memory.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ViewStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewStateStore")
            .field("namespace", &self.namespace)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
