//! Owned cache service bundling every store behind one handle.

use std::sync::Arc;

use reelcache_core::{
    Clock, Episode, EpisodeId, Movie, MovieId, Season, SeasonNumber, SeriesId, Snapshot, SystemClock,
};
use reelcache_durable::{DurableKv, MemoryKv};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::config::CacheConfig;
use crate::entity_cache::EntityCache;
use crate::list_cache::ListSnapshotStore;
use crate::propagation::{self, PropagationReport};
use crate::view_state::{ViewState, ViewStateStore, ViewStateUpdate};

/// Entry counts per store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// List snapshots.
    pub lists: usize,
    /// View states held in memory.
    pub view_states: usize,
    /// Movie detail snapshots.
    pub movies: usize,
    /// Series detail snapshots.
    pub series: usize,
    /// Season detail snapshots.
    pub seasons: usize,
    /// Episode detail snapshots.
    pub episodes: usize,
}

/// Detail-snapshot cache for one process or session.
///
/// Constructed explicitly and handed to callers; nothing here is global.
#[derive(Debug)]
pub struct CacheService {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    lists: ListSnapshotStore,
    view_state: ViewStateStore,
    entities: EntityCache,
}

impl CacheService {
    /// Create a service using the system clock.
    pub fn new(config: CacheConfig, durable: Arc<dyn DurableKv>) -> Self {
        Self::with_clock(config, durable, Arc::new(SystemClock))
    }

    /// Create a service with default configuration and an in-memory mirror.
    pub fn in_memory() -> Self {
        Self::new(CacheConfig::default(), Arc::new(MemoryKv::new()))
    }

    /// Create a service with an explicit clock.
    pub fn with_clock(
        config: CacheConfig,
        durable: Arc<dyn DurableKv>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let lists = ListSnapshotStore::new(Arc::clone(&clock));
        let view_state = ViewStateStore::new(
            durable,
            config.view_state.namespace.clone(),
            Arc::clone(&clock),
        );
        let entities = EntityCache::new(config.movies.capacity(), Arc::clone(&clock));
        debug!(
            ttl_ms = config.freshness.ttl_ms,
            movie_capacity = config.movies.capacity,
            "Created cache service"
        );
        Self {
            config,
            clock,
            lists,
            view_state,
            entities,
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current time according to the service clock.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// List-page snapshots.
    pub const fn lists(&self) -> &ListSnapshotStore {
        &self.lists
    }

    /// Scroll/search state per list.
    pub const fn view_state(&self) -> &ViewStateStore {
        &self.view_state
    }

    /// Detail snapshots for movies, series, seasons and episodes.
    pub const fn entities(&self) -> &EntityCache {
        &self.entities
    }

    /// Configured time-to-live for freshness checks.
    pub fn ttl(&self) -> Duration {
        self.config.freshness.ttl()
    }

    /// Freshness against the configured TTL.
    pub fn is_fresh<T>(&self, snapshot: &Snapshot<T>) -> bool {
        self.is_fresh_within(snapshot, self.ttl())
    }

    /// Freshness against a caller-supplied TTL.
    pub fn is_fresh_within<T>(&self, snapshot: &Snapshot<T>, ttl: Duration) -> bool {
        snapshot.is_fresh(ttl, self.now())
    }

    /// Saved view state for `list_key`.
    pub fn view(&self, list_key: &str) -> Option<ViewState> {
        self.view_state.get(list_key)
    }

    /// Save view state for `list_key`.
    pub fn save_view(&self, list_key: &str, update: ViewStateUpdate) -> ViewState {
        self.view_state.set(list_key, update)
    }

    /// Propagate an episode edit to every warm copy.
    pub fn patch_episode(
        &self,
        series_id: SeriesId,
        episode_id: EpisodeId,
        update: impl FnMut(&mut Episode),
    ) -> PropagationReport {
        propagation::patch_episode(&self.entities, series_id, episode_id, update)
    }

    /// Propagate a season edit to every warm copy of the series.
    pub fn patch_season(
        &self,
        series_id: SeriesId,
        season_number: SeasonNumber,
        update: impl FnMut(&mut Season),
    ) -> PropagationReport {
        propagation::patch_season(&self.entities, series_id, season_number, update)
    }

    /// Propagate a movie edit to its cached detail.
    pub fn patch_movie(&self, movie_id: MovieId, update: impl FnMut(&mut Movie)) -> PropagationReport {
        propagation::patch_movie(&self.entities, movie_id, update)
    }

    /// Entry counts per store.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            lists: self.lists.len(),
            view_states: self.view_state.len(),
            movies: self.entities.movies().len(),
            series: self.entities.series().len(),
            seasons: self.entities.seasons().len(),
            episodes: self.entities.episodes().len(),
        }
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::in_memory()
    }
}
