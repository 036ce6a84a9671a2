//! Client-resident detail-snapshot cache.
//!
//! This crate holds previously fetched list pages and denormalized detail
//! views of series, seasons, episodes and movies, keeps per-list scroll and
//! search state, and propagates single-entity edits to every warm copy.

pub mod config;
pub mod entity_cache;
pub mod list_cache;
pub mod propagation;
pub mod service;
pub mod view_state;

// Re-exports for convenience
pub use config::{CacheConfig, FreshnessConfig, MovieCacheConfig, ViewStateConfig};
pub use entity_cache::{
    EntityCache, EpisodeDetail, EpisodeKey, MovieCache, MovieDetail, SeasonDetail, SeasonKey,
    SeriesDetail, SnapshotMap,
};
pub use list_cache::ListSnapshotStore;
pub use propagation::{PropagationReport, patch_episode, patch_movie, patch_season};
pub use service::{CacheService, CacheStats};
pub use view_state::{ViewState, ViewStateStore, ViewStateUpdate};
