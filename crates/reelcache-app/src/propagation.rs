//! In-place propagation of single-entity mutations across warm caches.
//!
//! An episode can be embedded in the series detail, in a season detail and
//! in its own episode detail; a season summary is embedded in every cached
//! copy of its series. After a mutation the caller applies the same edit to
//! each warm copy through these functions. Cold caches are skipped.
//!
//! Matching is by numeric identity only. Every entry that contained a match
//! is re-stamped, even if the edit left it unchanged.

use reelcache_core::{
    Episode, EpisodeId, Identified, Movie, MovieId, Season, SeasonNumber, Series, SeriesId,
};
use tracing::debug;

use crate::entity_cache::{EntityCache, EpisodeKey, SeasonKey};

/// Number of cache entries rewritten by one propagation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Series detail snapshots rewritten.
    pub series: usize,
    /// Season detail snapshots rewritten.
    pub seasons: usize,
    /// Episode detail snapshots rewritten.
    pub episodes: usize,
    /// Movie detail snapshots rewritten.
    pub movies: usize,
}

impl PropagationReport {
    /// Total entries rewritten.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.series + self.seasons + self.episodes + self.movies
    }

    /// Returns true when no warm entry contained the target.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Apply `update` to every element whose identity equals `key`.
fn update_matching<T: Identified>(
    items: &mut [T],
    key: T::Key,
    update: &mut impl FnMut(&mut T),
) -> bool {
    let mut matched = false;
    for item in items.iter_mut().filter(|item| item.key() == key) {
        update(item);
        matched = true;
    }
    matched
}

fn update_embedded_season(
    series: Option<&mut Series>,
    season_number: SeasonNumber,
    update: &mut impl FnMut(&mut Season),
) -> bool {
    series.is_some_and(|series| update_matching(&mut series.seasons, season_number, update))
}

/// Rewrite episode `episode_id` of `series_id` wherever it is cached.
///
/// Targets the series detail's episode list, every season detail of the
/// series, and the episode's own detail snapshot.
pub fn patch_episode(
    cache: &EntityCache,
    series_id: SeriesId,
    episode_id: EpisodeId,
    mut update: impl FnMut(&mut Episode),
) -> PropagationReport {
    let mut report = PropagationReport::default();

    if cache
        .series()
        .rewrite(&series_id, |detail| update_matching(&mut detail.episodes, episode_id, &mut update))
    {
        report.series += 1;
    }

    report.seasons = cache.seasons().rewrite_where(
        |key| key.series_id == series_id,
        |detail| update_matching(&mut detail.episodes, episode_id, &mut update),
    );

    if cache
        .episodes()
        .rewrite(&EpisodeKey::new(series_id, episode_id), |detail| {
            detail.episode.as_mut().map(&mut update).is_some()
        })
    {
        report.episodes += 1;
    }

    debug!(
        series = %series_id,
        episode = %episode_id,
        series_rewritten = report.series,
        seasons_rewritten = report.seasons,
        episodes_rewritten = report.episodes,
        "Propagated episode update"
    );
    report
}

/// Rewrite the season summary `season_number` of `series_id` wherever a copy
/// of the series is cached.
///
/// Targets the series detail, the season's own detail snapshot, and every
/// episode detail of the series that embeds the season.
pub fn patch_season(
    cache: &EntityCache,
    series_id: SeriesId,
    season_number: SeasonNumber,
    mut update: impl FnMut(&mut Season),
) -> PropagationReport {
    let mut report = PropagationReport::default();

    if cache.series().rewrite(&series_id, |detail| {
        update_embedded_season(detail.series.as_mut(), season_number, &mut update)
    }) {
        report.series += 1;
    }

    if cache
        .seasons()
        .rewrite(&SeasonKey::new(series_id, season_number), |detail| {
            update_embedded_season(detail.series.as_mut(), season_number, &mut update)
        })
    {
        report.seasons += 1;
    }

    report.episodes = cache.episodes().rewrite_where(
        |key| key.series_id == series_id,
        |detail| update_embedded_season(detail.series.as_mut(), season_number, &mut update),
    );

    debug!(
        series = %series_id,
        season = %season_number,
        series_rewritten = report.series,
        seasons_rewritten = report.seasons,
        episodes_rewritten = report.episodes,
        "Propagated season update"
    );
    report
}

/// Rewrite movie `movie_id` inside its cached detail snapshot.
///
/// The entry keeps its eviction position.
pub fn patch_movie(
    cache: &EntityCache,
    movie_id: MovieId,
    mut update: impl FnMut(&mut Movie),
) -> PropagationReport {
    let mut report = PropagationReport::default();
    if cache
        .movies()
        .rewrite(movie_id, |detail| detail.movie.as_mut().map(&mut update).is_some())
    {
        report.movies += 1;
    }
    debug!(movie = %movie_id, movies_rewritten = report.movies, "Propagated movie update");
    report
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use crate::entity_cache::{EpisodeDetail, MovieDetail, SeasonDetail, SeriesDetail};
    use reelcache_core::{Clock, ManualClock};
    use std::num::NonZeroUsize;
    use std::sync::Arc;
    use time::Duration;
    use time::macros::datetime;

    fn setup() -> (Arc<ManualClock>, EntityCache) {
        let clock = Arc::new(ManualClock::new(datetime!(2024-05-01 12:00 UTC)));
        let capacity = NonZeroUsize::new(4).expect("non-zero");
        let cache = EntityCache::new(capacity, clock.clone());
        (clock, cache)
    }

    fn season(number: u32) -> Season {
        Season {
            season_number: SeasonNumber(number),
            monitored: true,
            statistics: None,
        }
    }

    fn series(id: i64, seasons: &[u32]) -> Series {
        Series {
            id: SeriesId(id),
            title: format!("Series {id}"),
            monitored: true,
            path: None,
            quality_profile_id: None,
            seasons: seasons.iter().copied().map(season).collect(),
            tags: Vec::new(),
        }
    }

    fn episode(series_id: i64, id: i64, season: u32) -> Episode {
        Episode {
            id: EpisodeId(id),
            series_id: SeriesId(series_id),
            season_number: SeasonNumber(season),
            episode_number: 1,
            title: format!("Episode {id}"),
            monitored: true,
            has_file: true,
            episode_file_id: Some(id * 10),
            air_date_utc: None,
        }
    }

    #[test]
    fn patch_episode_skips_cold_caches() {
        let (_clock, cache) = setup();
        let report = patch_episode(&cache, SeriesId(1), EpisodeId(1), |ep| ep.monitored = false);
        assert!(report.is_empty());
    }

    #[test]
    fn patch_episode_leaves_unmatched_series_unstamped() {
        let (clock, cache) = setup();
        let written = cache.series().set(
            SeriesId(1),
            SeriesDetail {
                series: Some(series(1, &[1])),
                episodes: vec![episode(1, 2, 1)],
                ..SeriesDetail::default()
            },
        );
        clock.advance(Duration::seconds(30));

        let report = patch_episode(&cache, SeriesId(1), EpisodeId(99), |ep| ep.monitored = false);
        assert_eq!(report, PropagationReport::default());
        assert_eq!(cache.series().get(&SeriesId(1)).expect("present").fetched_at, written);
    }

    #[test]
    fn patch_episode_leaves_other_season_snapshots_unstamped() {
        let (clock, cache) = setup();
        let show = series(1, &[1, 2]);
        let season_one = SeasonKey::new(SeriesId(1), SeasonNumber(1));
        let season_two = SeasonKey::new(SeriesId(1), SeasonNumber(2));
        cache.seasons().set(
            season_one,
            SeasonDetail {
                series: Some(show.clone()),
                episodes: vec![episode(1, 10, 1)],
            },
        );
        let written = cache.seasons().set(
            season_two,
            SeasonDetail {
                series: Some(show),
                episodes: vec![episode(1, 20, 2)],
            },
        );
        clock.advance(Duration::seconds(15));

        let report = patch_episode(&cache, SeriesId(1), EpisodeId(10), |ep| ep.monitored = false);
        assert_eq!(report.seasons, 1);
        assert_eq!(cache.seasons().get(&season_one).expect("season 1").fetched_at, clock.now());

        let untouched = cache.seasons().get(&season_two).expect("season 2");
        assert_eq!(untouched.fetched_at, written);
        assert!(untouched.payload.episodes[0].monitored);
    }

    #[test]
    fn patch_episode_ignores_null_leaf() {
        let (_clock, cache) = setup();
        cache
            .episodes()
            .set(EpisodeKey::new(SeriesId(1), EpisodeId(1)), EpisodeDetail::default());
        let report = patch_episode(&cache, SeriesId(1), EpisodeId(1), |ep| ep.has_file = false);
        assert_eq!(report.episodes, 0);
    }

    #[test]
    fn patch_season_updates_every_embedded_series_copy() {
        let (clock, cache) = setup();
        let show = series(1, &[1, 2]);
        cache.series().set(
            SeriesId(1),
            SeriesDetail {
                series: Some(show.clone()),
                ..SeriesDetail::default()
            },
        );
        cache.seasons().set(
            SeasonKey::new(SeriesId(1), SeasonNumber(2)),
            SeasonDetail {
                series: Some(show.clone()),
                episodes: vec![episode(1, 20, 2)],
            },
        );
        cache.episodes().set(
            EpisodeKey::new(SeriesId(1), EpisodeId(20)),
            EpisodeDetail {
                series: Some(show.clone()),
                episode: Some(episode(1, 20, 2)),
                history: Vec::new(),
            },
        );
        cache.episodes().set(
            EpisodeKey::new(SeriesId(1), EpisodeId(10)),
            EpisodeDetail {
                series: Some(show),
                episode: Some(episode(1, 10, 1)),
                history: Vec::new(),
            },
        );
        clock.advance(Duration::seconds(5));

        let report = patch_season(&cache, SeriesId(1), SeasonNumber(2), |s| s.monitored = false);
        assert_eq!(
            report,
            PropagationReport {
                series: 1,
                seasons: 1,
                episodes: 2,
                movies: 0,
            }
        );

        let detail = cache.series().get(&SeriesId(1)).expect("series");
        let embedded = detail.payload.series.expect("series entity");
        assert!(!embedded.season(SeasonNumber(2)).expect("season 2").monitored);
        assert!(embedded.season(SeasonNumber(1)).expect("season 1").monitored);
        assert_eq!(detail.fetched_at, clock.now());

        for id in [10, 20] {
            let ep = cache
                .episodes()
                .get(&EpisodeKey::new(SeriesId(1), EpisodeId(id)))
                .expect("episode detail");
            let embedded = ep.payload.series.expect("series entity");
            assert!(!embedded.season(SeasonNumber(2)).expect("season 2").monitored);
        }
    }

    #[test]
    fn patch_season_only_touches_its_own_season_snapshot() {
        let (clock, cache) = setup();
        let show = series(1, &[1, 2]);
        let season_one = SeasonKey::new(SeriesId(1), SeasonNumber(1));
        let written = cache.seasons().set(
            season_one,
            SeasonDetail {
                series: Some(show),
                episodes: Vec::new(),
            },
        );
        clock.advance(Duration::seconds(5));

        let report = patch_season(&cache, SeriesId(1), SeasonNumber(2), |s| s.monitored = false);
        assert_eq!(report.seasons, 0);
        let snap = cache.seasons().get(&season_one).expect("season detail");
        assert_eq!(snap.fetched_at, written);
        assert!(
            snap.payload
                .series
                .expect("series")
                .season(SeasonNumber(2))
                .expect("season 2")
                .monitored
        );
    }

    #[test]
    fn patch_season_skips_episode_details_without_the_season() {
        let (_clock, cache) = setup();
        cache.episodes().set(
            EpisodeKey::new(SeriesId(1), EpisodeId(10)),
            EpisodeDetail {
                series: Some(series(1, &[1])),
                episode: Some(episode(1, 10, 1)),
                history: Vec::new(),
            },
        );
        let report = patch_season(&cache, SeriesId(1), SeasonNumber(3), |s| s.monitored = false);
        assert!(report.is_empty());
    }

    #[test]
    fn patch_movie_rewrites_warm_entry() {
        let (clock, cache) = setup();
        cache.movies().set(
            MovieId(7),
            MovieDetail {
                movie: Some(Movie {
                    id: MovieId(7),
                    title: "Heat".into(),
                    year: Some(1995),
                    monitored: true,
                    has_file: true,
                    quality_profile_id: None,
                    movie_file_id: Some(70),
                    tags: Vec::new(),
                }),
                ..MovieDetail::default()
            },
        );
        clock.advance(Duration::seconds(1));

        let report = patch_movie(&cache, MovieId(7), |movie| {
            movie.has_file = false;
            movie.movie_file_id = None;
        });
        assert_eq!(report.movies, 1);

        let snap = cache.movies().get(MovieId(7)).expect("movie detail");
        let movie = snap.payload.movie.expect("movie");
        assert!(!movie.has_file);
        assert_eq!(movie.movie_file_id, None);
        assert_eq!(snap.fetched_at, clock.now());

        assert!(patch_movie(&cache, MovieId(8), |movie| movie.monitored = false).is_empty());
    }
}
