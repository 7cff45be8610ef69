//! Site configuration: `quest.json` holds engine knobs, image file names and
//! the portal destination table; `rooms.json` holds the room page content.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use quest_engine::{
    AssetManifest, Destination, DestinationTable, EngineConfig, FileStorage, GridCell,
    RoomCatalog, Site,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

pub(crate) const QUEST_CONFIG_FILE: &str = "quest.json";
pub(crate) const ROOMS_FILE: &str = "rooms.json";

#[derive(Debug, Error)]
pub(crate) enum SiteConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse {
        path: PathBuf,
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Window settings a site may override; absent fields keep the loop defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct WindowSettings {
    pub(crate) title: Option<String>,
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) max_render_fps: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct QuestConfig {
    pub(crate) window: WindowSettings,
    pub(crate) engine: EngineConfig,
    pub(crate) assets: AssetManifest,
    pub(crate) destinations: DestinationTable,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            engine: EngineConfig::default(),
            assets: AssetManifest::default(),
            destinations: default_destinations(),
        }
    }
}

/// The shipped portal table. The bottom-middle cell has no destination.
pub(crate) fn default_destinations() -> DestinationTable {
    [
        (GridCell::TopLeft, "about.html"),
        (GridCell::TopMiddle, "apply.html"),
        (GridCell::TopRight, "sponsors.html"),
        (GridCell::MiddleLeft, "team.html"),
        (GridCell::MiddleRight, "contact.html"),
        (GridCell::BottomLeft, "https://lu.ma/7epaq2w3"),
        (GridCell::BottomRight, "schedule.html"),
    ]
    .into_iter()
    .map(|(cell, raw)| (cell, Destination::parse(raw)))
    .collect()
}

/// Reads `quest.json` from the asset directory. A missing file means the
/// shipped defaults.
pub(crate) fn load_quest_config(asset_dir: &Path) -> Result<QuestConfig, SiteConfigError> {
    let path = asset_dir.join(QUEST_CONFIG_FILE);
    match read_json_file::<QuestConfig>(&path)? {
        Some(config) => {
            info!(
                path = %path.display(),
                destinations = config.destinations.len(),
                "quest_config_loaded"
            );
            Ok(config)
        }
        None => {
            info!(path = %path.display(), "quest_config_missing_using_defaults");
            Ok(QuestConfig::default())
        }
    }
}

/// Reads `rooms.json`. Without it every site page falls back to the
/// destination page, so a missing file only warns.
pub(crate) fn load_rooms(asset_dir: &Path) -> Result<RoomCatalog, SiteConfigError> {
    let path = asset_dir.join(ROOMS_FILE);
    match read_json_file::<RoomCatalog>(&path)? {
        Some(rooms) => {
            info!(path = %path.display(), rooms = rooms.rooms().len(), "rooms_loaded");
            for (key, error) in rooms.markup_errors() {
                warn!(room = key, line = error.line, error = %error.message, "room_markup_invalid");
            }
            Ok(rooms)
        }
        None => {
            warn!(path = %path.display(), "rooms_missing");
            Ok(RoomCatalog::new(Vec::new()))
        }
    }
}

pub(crate) fn build_site(
    config: &QuestConfig,
    rooms: RoomCatalog,
    asset_dir: &Path,
    storage_dir: &Path,
) -> Site {
    Site {
        engine: config.engine.clone(),
        assets: config.assets.clone(),
        asset_dir: asset_dir.to_path_buf(),
        destinations: config.destinations.clone(),
        rooms,
        storage: Rc::new(FileStorage::in_dir(storage_dir)),
    }
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SiteConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SiteConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_json(path, &raw).map(Some)
}

fn parse_json<T: DeserializeOwned>(path: &Path, raw: &str) -> Result<T, SiteConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|error| {
        let at = error.path().to_string();
        let source = error.into_inner();
        let message = if at.is_empty() || at == "." {
            source.to_string()
        } else {
            format!("at {at}: {source}")
        };
        SiteConfigError::Parse {
            path: path.to_path_buf(),
            message,
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_quest_json_uses_shipped_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_quest_config(dir.path()).expect("config");

        assert_eq!(config, QuestConfig::default());
        assert_eq!(config.destinations.len(), 7);
        assert!(config.destinations.get(GridCell::BottomMiddle).is_none());
        assert_eq!(
            config.destinations.get(GridCell::BottomLeft),
            Some(&Destination::External("https://lu.ma/7epaq2w3".to_string()))
        );
    }

    #[test]
    fn partial_quest_json_overrides_only_named_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join(QUEST_CONFIG_FILE),
            r#"{
                "window": { "title": "Demo Day" },
                "assets": { "background": "night.png" },
                "destinations": { "top-left": "./faq.html" }
            }"#,
        )
        .expect("write");

        let config = load_quest_config(dir.path()).expect("config");
        assert_eq!(config.window.title.as_deref(), Some("Demo Day"));
        assert_eq!(config.window.width, None);
        assert_eq!(config.assets.background, "night.png");
        assert_eq!(config.assets.portal_icon, AssetManifest::default().portal_icon);
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.destinations.len(), 1);
        assert_eq!(
            config.destinations.get(GridCell::TopLeft),
            Some(&Destination::Page("faq.html".to_string()))
        );
    }

    #[test]
    fn parse_error_names_the_failing_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join(QUEST_CONFIG_FILE),
            r#"{ "engine": { "player": { "speed": "fast" } } }"#,
        )
        .expect("write");

        let error = load_quest_config(dir.path()).expect_err("bad speed");
        let message = match error {
            SiteConfigError::Parse { message, .. } => message,
            other => panic!("expected parse error, got {other:?}"),
        };
        assert!(message.starts_with("at engine.player.speed:"), "{message}");
    }

    #[test]
    fn missing_rooms_json_yields_empty_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rooms = load_rooms(dir.path()).expect("rooms");
        assert!(rooms.rooms().is_empty());
    }

    #[test]
    fn shipped_site_files_cover_every_internal_destination() {
        let asset_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/base");
        let config = load_quest_config(&asset_dir).expect("quest.json");
        let rooms = load_rooms(&asset_dir).expect("rooms.json");

        for cell in GridCell::ALL {
            if let Some(Destination::Page(page)) = config.destinations.get(cell) {
                assert!(rooms.by_page(page).is_some(), "no room for {page}");
            }
        }
    }
}
