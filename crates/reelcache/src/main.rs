//! CLI entry point for inspecting the reelcache durable mirror.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reelcache_app::{CacheConfig, CacheService};
use reelcache_durable::FileKv;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Inspect and edit persisted list view state.
#[derive(Parser, Debug)]
#[command(
    name = "reelcache",
    version,
    about = "reelcache: inspect the view-state mirror of the media dashboard cache"
)]
struct Cli {
    /// Mirror file (defaults to the platform data directory).
    #[arg(long)]
    store: Option<PathBuf>,

    /// Configuration file (defaults to `.reelcache/config.toml`, then the user config).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Working directory used for config lookup (defaults to current).
    #[arg(long)]
    workdir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Saved list view state.
    Views {
        #[command(subcommand)]
        action: ViewsCommand,
    },

    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Subcommand, Debug)]
enum ViewsCommand {
    /// List keys with persisted state.
    Ls,

    /// Show the saved state of one list.
    Show { key: String },

    /// Save scroll position and search text for a list.
    Set {
        key: String,
        #[arg(long, allow_negative_numbers = true)]
        scroll: f64,
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Remove the persisted state of a list.
    Clear { key: String },
}

fn main() -> Result<()> {
    let Cli {
        store,
        config,
        workdir,
        cmd,
    } = Cli::parse();

    install_tracing();

    let workdir = workdir.unwrap_or_else(|| PathBuf::from("."));
    let config = load_config(config.as_deref(), &workdir)?;
    match cmd {
        Command::Config => commands::print_config(&config),
        Command::Views { action } => {
            let store = store
                .or_else(default_store_path)
                .context("Could not determine data directory")?;
            debug!(store = %store.display(), "Opening view-state mirror");
            let service = CacheService::new(config, Arc::new(FileKv::open(store)));
            commands::run_views(action, &service)
        }
    }
}

/// Resolve configuration: explicit path, then the working directory, then
/// the user config directory. A missing file yields defaults.
fn load_config(explicit: Option<&Path>, workdir: &Path) -> Result<CacheConfig> {
    if let Some(path) = explicit {
        return CacheConfig::from_path(path);
    }
    let local = CacheConfig::workdir_path(workdir);
    if local.exists() {
        return CacheConfig::from_path(local);
    }
    default_config_path().map_or_else(
        || Ok(CacheConfig::default()),
        CacheConfig::from_path_or_default,
    )
}

/// Returns the user configuration file path.
///
/// On Linux: `~/.config/reelcache/config.toml`
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reelcache").join("config.toml"))
}

/// Returns the default mirror file path.
///
/// On Linux: `~/.local/share/reelcache/view-state.json`
fn default_store_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("reelcache").join("view-state.json"))
}

fn install_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Filter built from a `RUST_LOG`-style directive string, `info` when unset or invalid.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

const DEFAULT_LOG_LEVEL: &str = "info";

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use std::fs;
    use tracing::level_filters::LevelFilter;
    use tempfile::TempDir;

    #[test]
    fn parse_views_set_command() {
        let cli = Cli::parse_from([
            "reelcache",
            "--store",
            "/tmp/state.json",
            "views",
            "set",
            "movies",
            "--scroll",
            "480.5",
            "--search",
            "alien",
        ]);

        assert_eq!(cli.store, Some(PathBuf::from("/tmp/state.json")));
        match cli.cmd {
            Command::Views {
                action: ViewsCommand::Set { key, scroll, search },
            } => {
                assert_eq!(key, "movies");
                assert_eq!(scroll.to_bits(), 480.5_f64.to_bits());
                assert_eq!(search, "alien");
            }
            _ => panic!("expected views set command"),
        }
    }

    #[test]
    fn parse_views_set_defaults_search_to_empty() {
        let cli = Cli::parse_from(["reelcache", "views", "set", "series", "--scroll", "0"]);
        match cli.cmd {
            Command::Views {
                action: ViewsCommand::Set { search, .. },
            } => assert!(search.is_empty()),
            _ => panic!("expected views set command"),
        }
    }

    #[test]
    fn parse_views_show_and_clear() {
        let show = Cli::parse_from(["reelcache", "views", "show", "calendar"]);
        assert!(matches!(
            show.cmd,
            Command::Views { action: ViewsCommand::Show { ref key } } if key == "calendar"
        ));

        let clear = Cli::parse_from(["reelcache", "views", "clear", "calendar"]);
        assert!(matches!(
            clear.cmd,
            Command::Views { action: ViewsCommand::Clear { ref key } } if key == "calendar"
        ));
    }

    #[test]
    fn parse_config_command() {
        let cli = Cli::parse_from(["reelcache", "--workdir", "/srv/dash", "config"]);
        assert!(matches!(cli.cmd, Command::Config));
        assert_eq!(cli.workdir, Some(PathBuf::from("/srv/dash")));
    }

    #[test]
    fn load_config_prefers_explicit_path() {
        let dir = TempDir::new().expect("create temp dir");
        let explicit = dir.path().join("custom.toml");
        fs::write(&explicit, "[movies]\ncapacity = 7\n").expect("write config");
        let local = CacheConfig::workdir_path(dir.path());
        fs::create_dir_all(local.parent().expect("parent")).expect("create dir");
        fs::write(&local, "[movies]\ncapacity = 9\n").expect("write config");

        let config = load_config(Some(explicit.as_path()), dir.path()).expect("load");
        assert_eq!(config.movies.capacity, 7);

        let config = load_config(None, dir.path()).expect("load");
        assert_eq!(config.movies.capacity, 9);
    }

    #[test]
    fn load_config_reports_missing_explicit_file() {
        let dir = TempDir::new().expect("create temp dir");
        let missing = dir.path().join("missing.toml");
        assert!(load_config(Some(missing.as_path()), dir.path()).is_err());
    }

    #[test]
    fn log_filter_honours_rust_log() {
        assert_eq!(log_filter(Some("off")).max_level_hint(), Some(LevelFilter::OFF));
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }
}
