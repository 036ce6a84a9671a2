//! Runs the reelcache binary against a temporary mirror file.

use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result, bail};
use assert_cmd::cargo::CommandCargoExt;
use tempfile::TempDir;

fn reelcache(workdir: &Path, args: &[&str]) -> Result<Output> {
    let store = workdir.join("view-state.json");
    let output = Command::cargo_bin("reelcache")
        .context("locate reelcache binary")?
        .arg("--store")
        .arg(&store)
        .arg("--workdir")
        .arg(workdir)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .context("run reelcache")?;
    if !output.status.success() {
        bail!(
            "reelcache {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(output)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn views_persist_between_invocations() -> Result<()> {
    let dir = TempDir::new()?;

    reelcache(dir.path(), &["views", "set", "movies", "--scroll", "480", "--search", "alien"])?;
    reelcache(dir.path(), &["views", "set", "series", "--scroll", "12"])?;

    let listed = stdout(&reelcache(dir.path(), &["views", "ls"])?);
    assert_eq!(listed.lines().collect::<Vec<_>>(), vec!["movies", "series"]);

    let shown = stdout(&reelcache(dir.path(), &["views", "show", "movies"])?);
    assert!(shown.starts_with("movies | scroll 480 | search \"alien\""), "{shown}");

    reelcache(dir.path(), &["views", "clear", "movies"])?;
    let shown = stdout(&reelcache(dir.path(), &["views", "show", "movies"])?);
    assert_eq!(shown.trim(), "movies: no saved state");
    Ok(())
}

#[test]
fn namespace_from_workdir_config_scopes_listing() -> Result<()> {
    let dir = TempDir::new()?;
    reelcache(dir.path(), &["views", "set", "movies", "--scroll", "1"])?;

    let config_dir = dir.path().join(".reelcache");
    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(
        config_dir.join("config.toml"),
        "[view_state]\nnamespace = \"tab-2:\"\n",
    )?;

    let listed = stdout(&reelcache(dir.path(), &["views", "ls"])?);
    assert_eq!(listed.trim(), "No saved view state");

    let config = stdout(&reelcache(dir.path(), &["config"])?);
    assert!(config.contains("namespace = \"tab-2:\""), "{config}");
    assert!(config.contains("capacity = 100"), "{config}");
    Ok(())
}

#[test]
fn rust_log_controls_stderr() -> Result<()> {
    let dir = TempDir::new()?;
    let store = dir.path().join("nested").join("view-state.json");
    let run = |level: &str| {
        Command::cargo_bin("reelcache")
            .context("locate reelcache binary")?
            .arg("--store")
            .arg(&store)
            .arg("--workdir")
            .arg(dir.path())
            .args(["views", "set", "movies", "--scroll", "1"])
            .env("RUST_LOG", level)
            .output()
            .context("run reelcache")
    };

    let quiet = run("off")?;
    assert!(quiet.status.success());
    assert!(quiet.stderr.is_empty(), "{}", String::from_utf8_lossy(&quiet.stderr));

    let verbose = run("debug")?;
    let stderr = String::from_utf8_lossy(&verbose.stderr);
    assert!(stderr.contains("Opening view-state mirror"), "{stderr}");
    Ok(())
}
