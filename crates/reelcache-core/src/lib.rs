//! Domain types shared by the reelcache snapshot caches.

/// Time sources used to stamp snapshots.
pub mod clock;
/// Identifier types.
pub mod id;
/// Media entities embedded in cached snapshots.
pub mod media;
/// Timestamped snapshot wrapper and freshness rule.
pub mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use id::{EpisodeId, MovieId, QualityProfileId, SeasonNumber, SeriesId, TagId};
pub use media::{
    Episode, HistoryItem, Identified, Movie, QualityProfile, RootFolder, Season, SeasonStatistics,
    Series, Tag,
};
pub use snapshot::{DEFAULT_TTL, Snapshot, is_fresh};
