use anyhow::{Context, Result};
use reelcache_app::{CacheConfig, CacheService, ViewState, ViewStateUpdate};
use time::format_description::well_known::Rfc3339;

use crate::ViewsCommand;

pub fn print_config(config: &CacheConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

pub fn run_views(command: ViewsCommand, service: &CacheService) -> Result<()> {
    match command {
        ViewsCommand::Ls => handle_ls(service),
        ViewsCommand::Show { key } => handle_show(service, &key),
        ViewsCommand::Set {
            key,
            scroll,
            search,
        } => handle_set(service, &key, scroll, search),
        ViewsCommand::Clear { key } => handle_clear(service, &key),
    }
}

fn handle_ls(service: &CacheService) -> Result<()> {
    let keys = service
        .view_state()
        .persisted_keys()
        .context("failed to list persisted view state")?;
    if keys.is_empty() {
        println!("No saved view state");
        return Ok(());
    }
    for key in keys {
        println!("{key}");
    }
    Ok(())
}

fn handle_show(service: &CacheService, key: &str) -> Result<()> {
    match service.view(key) {
        Some(state) => println!("{}", render_state(key, &state)?),
        None => println!("{key}: no saved state"),
    }
    Ok(())
}

fn handle_set(service: &CacheService, key: &str, scroll: f64, search: String) -> Result<()> {
    let state = service.save_view(key, ViewStateUpdate::new(scroll, search));
    println!("saved: {}", render_state(key, &state)?);
    Ok(())
}

fn handle_clear(service: &CacheService, key: &str) -> Result<()> {
    service
        .view_state()
        .clear(key)
        .with_context(|| format!("failed to clear view state for {key}"))?;
    println!("cleared: {key}");
    Ok(())
}

fn render_state(key: &str, state: &ViewState) -> Result<String> {
    let updated = state
        .updated_at
        .format(&Rfc3339)
        .context("failed to format timestamp")?;
    Ok(format!(
        "{key} | scroll {} | search {:?} | updated {updated}",
        state.scroll_position, state.search_text
    ))
}
