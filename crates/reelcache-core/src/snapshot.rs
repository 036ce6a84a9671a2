use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Default time-to-live applied by freshness checks.
pub const DEFAULT_TTL: Duration = Duration::seconds(60);

/// A cached payload plus the time it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<T> {
    /// Cached value.
    pub payload: T,
    /// When this entry was last written.
    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: OffsetDateTime,
}

impl<T> Snapshot<T> {
    /// Wrap a payload with an explicit fetch timestamp.
    pub const fn new(payload: T, fetched_at: OffsetDateTime) -> Self {
        Self {
            payload,
            fetched_at,
        }
    }

    /// Advisory freshness check: `now - fetched_at <= ttl`.
    ///
    /// Nothing is evicted on staleness; callers decide whether to re-fetch.
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration, now: OffsetDateTime) -> bool {
        is_fresh(self.fetched_at, ttl, now)
    }

    /// Age of the snapshot relative to `now`.
    #[must_use]
    pub fn age(&self, now: OffsetDateTime) -> Duration {
        now - self.fetched_at
    }

    /// Transform the payload while keeping the timestamp.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Snapshot<U> {
        Snapshot {
            payload: f(self.payload),
            fetched_at: self.fetched_at,
        }
    }
}

/// Freshness rule shared by every store.
#[must_use]
pub fn is_fresh(fetched_at: OffsetDateTime, ttl: Duration, now: OffsetDateTime) -> bool {
    now - fetched_at <= ttl
}
