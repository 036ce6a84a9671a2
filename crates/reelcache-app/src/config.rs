//! Cache settings loaded from `.reelcache/config.toml`.
//!
//! Every section and field is optional; missing values take the defaults
//! below and the result is validated before use.

use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use time::Duration;

const CONFIG_DIR: &str = ".reelcache";
const CONFIG_FILE: &str = "config.toml";

const DEFAULT_TTL_MS: u64 = 60_000;
const DEFAULT_MOVIE_CAPACITY: usize = 100;
const DEFAULT_VIEW_STATE_NAMESPACE: &str = "reelcache:view-state:";

/// Top-level cache configuration loaded from `.reelcache/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// `[freshness]`: TTL for advisory freshness checks.
    #[serde(default)]
    pub freshness: FreshnessConfig,
    /// `[movies]`: movie detail cache bound.
    #[serde(default)]
    pub movies: MovieCacheConfig,
    /// `[view_state]`: durable mirror namespace.
    #[serde(default)]
    pub view_state: ViewStateConfig,
}

impl CacheConfig {
    /// Load configuration from a working directory, falling back to defaults
    /// when `.reelcache/config.toml` does not exist.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_or_default(Self::workdir_path(workdir))
    }

    /// Location of the per-directory configuration file.
    pub fn workdir_path(workdir: impl AsRef<Path>) -> PathBuf {
        workdir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load configuration from `path`, returning defaults if the file is missing.
    pub fn from_path_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_path(path)
    }

    /// Load and validate configuration from an existing file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }

    fn validate(&self) -> Result<()> {
        if self.freshness.ttl_ms == 0 {
            bail!("freshness.ttl_ms must be greater than zero");
        }
        if self.movies.capacity == 0 {
            bail!("movies.capacity must be greater than zero");
        }
        if self.view_state.namespace.trim().is_empty() {
            bail!("view_state.namespace must not be empty");
        }
        Ok(())
    }
}

/// Freshness policy block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessConfig {
    /// Time-to-live in milliseconds used by freshness checks.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
        }
    }
}

impl FreshnessConfig {
    /// TTL as a duration, saturating at the largest representable value.
    pub fn ttl(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.ttl_ms).unwrap_or(i64::MAX))
    }
}

/// Movie detail cache block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieCacheConfig {
    /// Maximum number of movie detail snapshots kept at once.
    #[serde(default = "default_movie_capacity")]
    pub capacity: usize,
}

impl Default for MovieCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MOVIE_CAPACITY,
        }
    }
}

impl MovieCacheConfig {
    /// Capacity as a non-zero bound; a zero value falls back to the default.
    pub fn capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_MOVIE_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN)
    }
}

/// View-state mirror block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewStateConfig {
    /// Prefix prepended to list keys in the durable mirror.
    #[serde(default = "default_view_state_namespace")]
    pub namespace: String,
}

impl Default for ViewStateConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_VIEW_STATE_NAMESPACE.to_owned(),
        }
    }
}

const fn default_ttl_ms() -> u64 {
    DEFAULT_TTL_MS
}

const fn default_movie_capacity() -> usize {
    DEFAULT_MOVIE_CAPACITY
}

fn default_view_state_namespace() -> String {
    DEFAULT_VIEW_STATE_NAMESPACE.to_owned()
}
