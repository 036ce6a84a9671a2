use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::{EpisodeId, MovieId, QualityProfileId, SeasonNumber, SeriesId, TagId};

/// Entity that carries a stable numeric identity.
///
/// Cached copies of the same entity are structurally independent, so every
/// lookup across caches goes through this key rather than through references.
pub trait Identified {
    /// Identity type compared during propagation.
    type Key: Copy + Eq;

    /// Identity of this entity.
    fn key(&self) -> Self::Key;
}

/// A television series together with its embedded seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    /// Identifier of the series.
    pub id: SeriesId,
    /// Display title.
    pub title: String,
    /// Whether the episode manager watches this series for new releases.
    #[serde(default)]
    pub monitored: bool,
    /// Path on the media root.
    #[serde(default)]
    pub path: Option<String>,
    /// Quality profile assigned to the series.
    #[serde(default)]
    pub quality_profile_id: Option<QualityProfileId>,
    /// Embedded season summaries.
    #[serde(default)]
    pub seasons: Vec<Season>,
    /// Tags attached to the series.
    #[serde(default)]
    pub tags: Vec<TagId>,
}

impl Series {
    /// Find an embedded season by number.
    #[must_use]
    pub fn season(&self, number: SeasonNumber) -> Option<&Season> {
        self.seasons.iter().find(|season| season.season_number == number)
    }
}

impl Identified for Series {
    type Key = SeriesId;

    fn key(&self) -> Self::Key {
        self.id
    }
}

/// Season summary embedded in a [`Series`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    /// Season number (0 for specials).
    pub season_number: SeasonNumber,
    /// Whether episodes of this season are monitored.
    #[serde(default)]
    pub monitored: bool,
    /// Aggregate file statistics, when the manager reports them.
    #[serde(default)]
    pub statistics: Option<SeasonStatistics>,
}

impl Identified for Season {
    type Key = SeasonNumber;

    fn key(&self) -> Self::Key {
        self.season_number
    }
}

/// File statistics for one season.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonStatistics {
    /// Number of aired episodes.
    pub episode_count: u32,
    /// Number of episodes with a file on disk.
    pub episode_file_count: u32,
    /// Total bytes on disk.
    pub size_on_disk: u64,
}

/// A single episode of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// Identifier of the episode.
    pub id: EpisodeId,
    /// Owning series.
    pub series_id: SeriesId,
    /// Season the episode belongs to.
    pub season_number: SeasonNumber,
    /// Episode number within the season.
    pub episode_number: u32,
    /// Episode title.
    #[serde(default)]
    pub title: String,
    /// Whether the episode is monitored.
    #[serde(default)]
    pub monitored: bool,
    /// Whether a file is present on disk.
    #[serde(default)]
    pub has_file: bool,
    /// Identifier of the episode file, if any.
    #[serde(default)]
    pub episode_file_id: Option<i64>,
    /// First air date in UTC.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub air_date_utc: Option<OffsetDateTime>,
}

impl Identified for Episode {
    type Key = EpisodeId;

    fn key(&self) -> Self::Key {
        self.id
    }
}

/// A movie as reported by the movie manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    /// Identifier of the movie.
    pub id: MovieId,
    /// Display title.
    pub title: String,
    /// Release year.
    #[serde(default)]
    pub year: Option<u32>,
    /// Whether the movie is monitored.
    #[serde(default)]
    pub monitored: bool,
    /// Whether a file is present on disk.
    #[serde(default)]
    pub has_file: bool,
    /// Quality profile assigned to the movie.
    #[serde(default)]
    pub quality_profile_id: Option<QualityProfileId>,
    /// Identifier of the movie file, if any.
    #[serde(default)]
    pub movie_file_id: Option<i64>,
    /// Tags attached to the movie.
    #[serde(default)]
    pub tags: Vec<TagId>,
}

impl Identified for Movie {
    type Key = MovieId;

    fn key(&self) -> Self::Key {
        self.id
    }
}

/// Quality profile reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityProfile {
    /// Identifier of the profile.
    pub id: QualityProfileId,
    /// Profile name.
    pub name: String,
}

/// Root folder reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootFolder {
    /// Identifier of the root folder.
    pub id: i64,
    /// Absolute path.
    pub path: String,
    /// Free bytes reported by the manager.
    #[serde(default)]
    pub free_space: Option<u64>,
}

/// Tag reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Identifier of the tag.
    pub id: TagId,
    /// Tag label.
    pub label: String,
}

/// Download/import history entry for an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// Identifier of the history record.
    pub id: i64,
    /// Episode the record belongs to.
    #[serde(default)]
    pub episode_id: Option<EpisodeId>,
    /// Event type, e.g. `grabbed` or `downloadFolderImported`.
    pub event_type: String,
    /// Release title as seen by the indexer.
    #[serde(default)]
    pub source_title: String,
    /// When the event happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}
