use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseIntError, str::FromStr};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id! {
    /// Identifier of a series as assigned by the episode manager.
    SeriesId(i64)
}

numeric_id! {
    /// Identifier of an episode, unique within the episode manager.
    EpisodeId(i64)
}

numeric_id! {
    /// Identifier of a movie as assigned by the movie manager.
    MovieId(i64)
}

numeric_id! {
    /// Identifier of a tag.
    TagId(i64)
}

numeric_id! {
    /// Identifier of a quality profile.
    QualityProfileId(i64)
}

numeric_id! {
    /// Season number within a series. Season 0 holds specials.
    SeasonNumber(u32)
}

impl SeasonNumber {
    /// Returns true for the specials pseudo-season.
    #[must_use]
    pub const fn is_specials(self) -> bool {
        self.0 == 0
    }
}
