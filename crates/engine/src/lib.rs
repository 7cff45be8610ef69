use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
mod assets;
mod breadcrumb;
mod camera;
mod collision;
mod config;
mod engine;
mod geometry;
mod input;
mod mask;
mod navigation;
mod player;
mod portal;
mod rooms;
mod storage;
mod teleport;

pub use app::{run_app, AppError, LoopConfig, Site};
pub use assets::{
    procedural_background, AssetError, AssetKind, AssetStore, LoadState, LoadedAsset,
};
pub use breadcrumb::{
    consume_return_breadcrumb, mark_return_from_page, write_breadcrumb, Breadcrumb, BreadcrumbError,
    LAST_PORTAL_USED_KEY, RETURN_FROM_PAGE_KEY,
};
pub use camera::{zoom_for_viewport, Camera};
pub use collision::CollisionField;
pub use config::{
    AssetManifest, CameraConfig, CollisionConfig, EngineConfig, PlayerConfig, PortalConfig,
};
pub use engine::{GameEngine, StepOutcome};
pub use geometry::{Vec2, Viewport};
pub use input::{InputAction, InputRouter, MoveIntent};
pub use mask::MaskImage;
pub use navigation::Destination;
pub use player::{Direction, Player};
pub use portal::{DestinationTable, GridCell, Portal, PortalRegistry};
pub use rooms::{MarkupError, Room, RoomCatalog};
pub use storage::{FileStorage, MemoryStorage, PageStorage, StorageError};
pub use teleport::{DwellState, PortalInteraction};

pub const ROOT_ENV_VAR: &str = "QUEST_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub asset_dir: PathBuf,
    pub storage_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create storage directory at {path}: {source}")]
    CreateStorageDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "QUEST_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/startup-quest\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Resolves the project root and the two directories the game touches:
/// `assets/base` (read-only site assets) and `cache` (page storage).
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let asset_dir = root.join("assets").join("base");
    let storage_dir = root.join("cache");

    fs::create_dir_all(&storage_dir).map_err(|source| StartupError::CreateStorageDir {
        path: storage_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        root,
        asset_dir,
        storage_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
