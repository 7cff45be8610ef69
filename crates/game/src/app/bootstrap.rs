use quest_engine::{resolve_app_paths, LoopConfig, Site, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::site::{build_site, load_quest_config, load_rooms, SiteConfigError, WindowSettings};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) site: Site,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    SiteConfig(#[from] SiteConfigError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Startup Quest ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        assets = %paths.asset_dir.display(),
        storage = %paths.storage_dir.display(),
        "app_paths_resolved"
    );

    let quest = load_quest_config(&paths.asset_dir)?;
    let rooms = load_rooms(&paths.asset_dir)?;
    let config = loop_config_for(&quest.window);
    let site = build_site(&quest, rooms, &paths.asset_dir, &paths.storage_dir);

    Ok(AppWiring { config, site })
}

/// Applies the site's window overrides. A render cap of zero means uncapped.
fn loop_config_for(window: &WindowSettings) -> LoopConfig {
    let defaults = LoopConfig::default();
    LoopConfig {
        window_title: window.title.clone().unwrap_or(defaults.window_title),
        window_width: window.width.unwrap_or(defaults.window_width).max(1),
        window_height: window.height.unwrap_or(defaults.window_height).max(1),
        max_render_fps: match window.max_render_fps {
            Some(0) => None,
            Some(cap) => Some(cap),
            None => defaults.max_render_fps,
        },
        ..defaults
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
