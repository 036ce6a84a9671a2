//! Detail-snapshot caches for hierarchical media entities.
//!
//! Series, season and episode detail screens each cache their own copy of
//! the entities they display. The copies are independent values; keeping
//! them consistent after a mutation is the job of [`crate::propagation`].

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lru::LruCache;
use reelcache_core::{
    Clock, Episode, EpisodeId, HistoryItem, Movie, MovieId, QualityProfile, RootFolder, SeasonNumber,
    Series, SeriesId, Snapshot, Tag,
};
use time::OffsetDateTime;
use tracing::trace;

/// Movie detail screen contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieDetail {
    /// The movie, or `None` when the manager returned nothing.
    pub movie: Option<Movie>,
    /// Quality profiles for the edit form.
    pub quality_profiles: Vec<QualityProfile>,
    /// Tags for the edit form.
    pub tags: Vec<Tag>,
}

/// Series detail screen contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesDetail {
    /// The series with its embedded seasons.
    pub series: Option<Series>,
    /// Every episode of the series.
    pub episodes: Vec<Episode>,
    /// Quality profiles for the edit form.
    pub quality_profiles: Vec<QualityProfile>,
    /// Root folders for the edit form.
    pub root_folders: Vec<RootFolder>,
    /// Tags for the edit form.
    pub tags: Vec<Tag>,
}

/// Season detail screen contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonDetail {
    /// The owning series with its embedded seasons.
    pub series: Option<Series>,
    /// Episodes of this season only.
    pub episodes: Vec<Episode>,
}

/// Episode detail screen contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeDetail {
    /// The owning series with its embedded seasons.
    pub series: Option<Series>,
    /// The episode itself.
    pub episode: Option<Episode>,
    /// Download/import history of the episode.
    pub history: Vec<HistoryItem>,
}

/// Key of a season detail snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeasonKey {
    /// Owning series.
    pub series_id: SeriesId,
    /// Season within the series.
    pub season_number: SeasonNumber,
}

impl SeasonKey {
    /// Build a key from its parts.
    #[must_use]
    pub const fn new(series_id: SeriesId, season_number: SeasonNumber) -> Self {
        Self {
            series_id,
            season_number,
        }
    }
}

/// Key of an episode detail snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpisodeKey {
    /// Owning series.
    pub series_id: SeriesId,
    /// Episode within the series.
    pub episode_id: EpisodeId,
}

impl EpisodeKey {
    /// Build a key from its parts.
    #[must_use]
    pub const fn new(series_id: SeriesId, episode_id: EpisodeId) -> Self {
        Self {
            series_id,
            episode_id,
        }
    }
}

/// Unbounded keyed snapshot store.
#[derive(Debug)]
pub struct SnapshotMap<K, V> {
    entries: RwLock<HashMap<K, Snapshot<V>>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> SnapshotMap<K, V>
where
    K: Copy + Eq + Hash,
    V: Clone,
{
    /// Create an empty store stamping writes with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Clone out the snapshot stored under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Snapshot<V>> {
        self.read().get(key).cloned()
    }

    /// Store `value` under `key`, stamped with the current time.
    pub fn set(&self, key: K, value: V) -> OffsetDateTime {
        let now = self.clock.now();
        self.set_at(key, value, now);
        now
    }

    /// Store `value` under `key` with a caller-supplied fetch time.
    pub fn set_at(&self, key: K, value: V, fetched_at: OffsetDateTime) {
        self.write().insert(key, Snapshot::new(value, fetched_at));
    }

    /// Returns true when a snapshot is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.read().contains_key(key)
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently stored, in no particular order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.read().keys().copied().collect()
    }

    /// Rewrite the value under `key` in place.
    ///
    /// `edit` reports whether it touched anything; only then is the entry
    /// re-stamped. Returns false when the key is absent or nothing matched.
    pub(crate) fn rewrite(&self, key: &K, edit: impl FnOnce(&mut V) -> bool) -> bool {
        let mut entries = self.write();
        let Some(snapshot) = entries.get_mut(key) else {
            return false;
        };
        let touched = edit(&mut snapshot.payload);
        if touched {
            snapshot.fetched_at = self.clock.now();
        }
        drop(entries);
        touched
    }

    /// Rewrite every entry whose key satisfies `select`. Returns the number
    /// of entries that were touched and re-stamped.
    pub(crate) fn rewrite_where(
        &self,
        select: impl Fn(&K) -> bool,
        mut edit: impl FnMut(&mut V) -> bool,
    ) -> usize {
        let now = self.clock.now();
        let mut entries = self.write();
        let mut touched = 0;
        for (_, snapshot) in entries.iter_mut().filter(|(key, _)| select(key)) {
            if edit(&mut snapshot.payload) {
                snapshot.fetched_at = now;
                touched += 1;
            }
        }
        drop(entries);
        touched
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, Snapshot<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, Snapshot<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Movie detail store bounded by insertion order.
///
/// Once full, writing a new movie evicts the movie written longest ago.
/// Reads never change an entry's position, so re-reading a movie does not
/// protect it from eviction.
///
/// A wholesale re-fetch (`set`/`set_at` on an id already present) counts as
/// a fresh insertion and moves the movie to the newest position, resetting
/// its eviction order. In-place patches through propagation keep the
/// original position.
#[derive(Debug)]
pub struct MovieCache {
    entries: RwLock<LruCache<MovieId, Snapshot<MovieDetail>>>,
    clock: Arc<dyn Clock>,
}

impl MovieCache {
    /// Create an empty store holding at most `capacity` movies.
    pub fn new(capacity: NonZeroUsize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            clock,
        }
    }

    /// Clone out the snapshot for `id` without touching its eviction position.
    #[must_use]
    pub fn get(&self, id: MovieId) -> Option<Snapshot<MovieDetail>> {
        self.read().peek(&id).cloned()
    }

    /// Store `detail` for `id`, stamped with the current time.
    pub fn set(&self, id: MovieId, detail: MovieDetail) -> OffsetDateTime {
        let now = self.clock.now();
        self.set_at(id, detail, now);
        now
    }

    /// Store `detail` for `id` with a caller-supplied fetch time.
    ///
    /// Re-storing an existing id makes it the newest entry.
    pub fn set_at(&self, id: MovieId, detail: MovieDetail, fetched_at: OffsetDateTime) {
        let evicted = self.write().push(id, Snapshot::new(detail, fetched_at));
        if let Some((evicted_id, _)) = evicted
            && evicted_id != id
        {
            trace!(movie = %evicted_id, inserted = %id, "Evicted oldest movie detail snapshot");
        }
    }

    /// Returns true when a snapshot is stored for `id`.
    #[must_use]
    pub fn contains(&self, id: MovieId) -> bool {
        self.read().contains(&id)
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of stored snapshots.
    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        self.read().cap()
    }

    /// Stored ids from oldest to newest insertion.
    #[must_use]
    pub fn ids_oldest_first(&self) -> Vec<MovieId> {
        self.read().iter().rev().map(|(id, _)| *id).collect()
    }

    /// Rewrite the detail for `id` in place, keeping its eviction position.
    pub(crate) fn rewrite(&self, id: MovieId, edit: impl FnOnce(&mut MovieDetail) -> bool) -> bool {
        let mut entries = self.write();
        let Some(snapshot) = entries.peek_mut(&id) else {
            return false;
        };
        let touched = edit(&mut snapshot.payload);
        if touched {
            snapshot.fetched_at = self.clock.now();
        }
        drop(entries);
        touched
    }

    fn read(&self) -> RwLockReadGuard<'_, LruCache<MovieId, Snapshot<MovieDetail>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LruCache<MovieId, Snapshot<MovieDetail>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The four detail stores, owned together.
#[derive(Debug)]
pub struct EntityCache {
    movies: MovieCache,
    series: SnapshotMap<SeriesId, SeriesDetail>,
    seasons: SnapshotMap<SeasonKey, SeasonDetail>,
    episodes: SnapshotMap<EpisodeKey, EpisodeDetail>,
    clock: Arc<dyn Clock>,
}

impl EntityCache {
    /// Create empty stores; only the movie store is bounded.
    pub fn new(movie_capacity: NonZeroUsize, clock: Arc<dyn Clock>) -> Self {
        Self {
            movies: MovieCache::new(movie_capacity, Arc::clone(&clock)),
            series: SnapshotMap::new(Arc::clone(&clock)),
            seasons: SnapshotMap::new(Arc::clone(&clock)),
            episodes: SnapshotMap::new(Arc::clone(&clock)),
            clock,
        }
    }

    /// Movie detail snapshots keyed by movie.
    pub const fn movies(&self) -> &MovieCache {
        &self.movies
    }

    /// Series detail snapshots keyed by series.
    pub const fn series(&self) -> &SnapshotMap<SeriesId, SeriesDetail> {
        &self.series
    }

    /// Season detail snapshots keyed by (series, season number).
    pub const fn seasons(&self) -> &SnapshotMap<SeasonKey, SeasonDetail> {
        &self.seasons
    }

    /// Episode detail snapshots keyed by (series, episode).
    pub const fn episodes(&self) -> &SnapshotMap<EpisodeKey, EpisodeDetail> {
        &self.episodes
    }

    /// Current time according to the cache clock.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }
}
