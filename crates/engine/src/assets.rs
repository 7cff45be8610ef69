use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, Frame, ImageReader, Rgba, RgbaImage};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AssetManifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Background,
    CharacterSprite,
    CollisionMask,
    PortalMask,
    PortalIcon,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Background,
        AssetKind::CharacterSprite,
        AssetKind::CollisionMask,
        AssetKind::PortalMask,
        AssetKind::PortalIcon,
    ];

    const fn index(self) -> usize {
        match self {
            AssetKind::Background => 0,
            AssetKind::CharacterSprite => 1,
            AssetKind::CollisionMask => 2,
            AssetKind::PortalMask => 3,
            AssetKind::PortalIcon => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Background => "background",
            AssetKind::CharacterSprite => "character_sprite",
            AssetKind::CollisionMask => "collision_mask",
            AssetKind::PortalMask => "portal_mask",
            AssetKind::PortalIcon => "portal_icon",
        }
    }

    fn file_name(self, manifest: &AssetManifest) -> &str {
        match self {
            AssetKind::Background => &manifest.background,
            AssetKind::CharacterSprite => &manifest.character_sprite,
            AssetKind::CollisionMask => &manifest.collision_mask,
            AssetKind::PortalMask => &manifest.portal_mask,
            AssetKind::PortalIcon => &manifest.portal_icon,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Pending,
    Ready,
    Failed,
}

impl LoadState {
    pub fn is_settled(self) -> bool {
        !matches!(self, LoadState::Pending)
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("animation {path} contains no frames")]
    NoFrames { path: PathBuf },
}

/// Decoded image data as delivered by a loader thread.
#[derive(Debug, Clone)]
pub enum LoadedAsset {
    Image(RgbaImage),
    Frames(Vec<RgbaImage>),
}

struct AssetMessage {
    kind: AssetKind,
    result: Result<LoadedAsset, AssetError>,
}

/// Owns the five site images. Loads run on their own threads and land here
/// through `poll`, which must be called from the loop thread.
pub struct AssetStore {
    receiver: Option<Receiver<AssetMessage>>,
    states: [LoadState; 5],
    background: Option<RgbaImage>,
    sprite_frames: Vec<RgbaImage>,
    collision_mask: Option<RgbaImage>,
    portal_mask: Option<RgbaImage>,
    portal_icon: Option<RgbaImage>,
    fallback_size: (u32, u32),
}

impl AssetStore {
    /// Store with every asset pending and no loads in flight.
    pub fn idle(fallback_size: (u32, u32)) -> Self {
        Self {
            receiver: None,
            states: [LoadState::Pending; 5],
            background: None,
            sprite_frames: Vec::new(),
            collision_mask: None,
            portal_mask: None,
            portal_icon: None,
            fallback_size,
        }
    }

    /// Starts one loader thread per asset. `fallback_size` sizes the
    /// procedural background used when the real one fails.
    pub fn spawn_loads(
        manifest: &AssetManifest,
        asset_dir: &Path,
        fallback_size: (u32, u32),
    ) -> Self {
        let (sender, receiver) = mpsc::channel();
        for kind in AssetKind::ALL {
            let path = asset_dir.join(kind.file_name(manifest));
            let sender = sender.clone();
            let spawned = thread::Builder::new()
                .name(format!("asset-{}", kind.label()))
                .spawn(move || {
                    let result = load_asset(kind, &path);
                    // The store may already be gone; a late result is dropped.
                    let _ = sender.send(AssetMessage { kind, result });
                });
            if let Err(error) = spawned {
                warn!(asset = kind.label(), error = %error, "asset_loader_spawn_failed");
            }
        }

        let mut store = Self::idle(fallback_size);
        store.receiver = Some(receiver);
        store
    }

    /// Applies every finished load. Returns the kinds that settled this call.
    pub fn poll(&mut self) -> Vec<AssetKind> {
        let mut messages = Vec::new();
        let mut disconnected = false;
        if let Some(receiver) = self.receiver.as_ref() {
            loop {
                match receiver.try_recv() {
                    Ok(message) => messages.push(message),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }
        if disconnected {
            self.receiver = None;
        }
        messages
            .into_iter()
            .map(|message| {
                self.apply(message.kind, message.result);
                message.kind
            })
            .collect()
    }

    pub fn apply(&mut self, kind: AssetKind, result: Result<LoadedAsset, AssetError>) {
        let asset = match result {
            Ok(asset) => asset,
            Err(error) => {
                warn!(asset = kind.label(), error = %error, "asset_load_failed");
                self.states[kind.index()] = LoadState::Failed;
                if kind == AssetKind::Background {
                    let (width, height) = self.fallback_size;
                    self.background = Some(procedural_background(width, height));
                    info!(width, height, "procedural_background_generated");
                }
                return;
            }
        };

        let (width, height) = match &asset {
            LoadedAsset::Image(image) => image.dimensions(),
            LoadedAsset::Frames(frames) => frames.first().map_or((0, 0), RgbaImage::dimensions),
        };
        info!(asset = kind.label(), width, height, "asset_loaded");
        self.states[kind.index()] = LoadState::Ready;

        let image = match asset {
            LoadedAsset::Frames(frames) if kind == AssetKind::CharacterSprite => {
                self.sprite_frames = frames;
                return;
            }
            LoadedAsset::Frames(frames) => frames.into_iter().next().unwrap_or_default(),
            LoadedAsset::Image(image) => image,
        };
        match kind {
            AssetKind::Background => self.background = Some(image),
            AssetKind::CharacterSprite => self.sprite_frames = vec![image],
            AssetKind::CollisionMask => self.collision_mask = Some(image),
            AssetKind::PortalMask => self.portal_mask = Some(image),
            AssetKind::PortalIcon => self.portal_icon = Some(image),
        }
    }

    pub fn state(&self, kind: AssetKind) -> LoadState {
        self.states[kind.index()]
    }

    pub fn background(&self) -> Option<&RgbaImage> {
        self.background.as_ref()
    }

    /// Idle frame of the character sprite.
    pub fn sprite_static_frame(&self) -> Option<&RgbaImage> {
        self.sprite_frames.first()
    }

    pub fn sprite_frames(&self) -> &[RgbaImage] {
        &self.sprite_frames
    }

    pub fn portal_icon(&self) -> Option<&RgbaImage> {
        self.portal_icon.as_ref()
    }

    pub fn take_collision_mask(&mut self) -> Option<RgbaImage> {
        self.collision_mask.take()
    }

    pub fn take_portal_mask(&mut self) -> Option<RgbaImage> {
        self.portal_mask.take()
    }

    /// Stops listening for loads; results still in flight are discarded.
    pub fn detach(&mut self) {
        self.receiver = None;
    }
}

fn load_asset(kind: AssetKind, path: &Path) -> Result<LoadedAsset, AssetError> {
    let is_gif = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"));
    if kind == AssetKind::CharacterSprite && is_gif {
        return load_gif_frames(path).map(LoadedAsset::Frames);
    }
    load_rgba(path).map(LoadedAsset::Image)
}

fn load_rgba(path: &Path) -> Result<RgbaImage, AssetError> {
    let reader = ImageReader::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.to_rgba8())
}

fn load_gif_frames(path: &Path) -> Result<Vec<RgbaImage>, AssetError> {
    let decode_error = |source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoder = GifDecoder::new(BufReader::new(file)).map_err(decode_error)?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(decode_error)?;
    if frames.is_empty() {
        return Err(AssetError::NoFrames {
            path: path.to_path_buf(),
        });
    }
    Ok(frames.into_iter().map(Frame::into_buffer).collect())
}

const DEEP_WATER: [u8; 3] = [0x1e, 0x40, 0xaf];
const OPEN_WATER: [u8; 3] = [0x1e, 0x3a, 0x8a];
const GRASS: [u8; 3] = [0x22, 0xc5, 0x5e];
const CRYSTAL: [u8; 3] = [0x58, 0x1c, 0x87];
const VOLCANIC: [u8; 3] = [0x7c, 0x2d, 0x12];
const LAVA: [u8; 3] = [0xf9, 0x73, 0x16];

/// Stand-in world art: radial water gradient with a handful of islands.
pub fn procedural_background(width: u32, height: u32) -> RgbaImage {
    let (w, h) = (width as f32, height as f32);
    let radius = (w / 2.0).max(1.0);
    // Center, half extents and colour of each island, in drawing order.
    let islands = [
        (w * 0.5, h * 0.5, 200.0, 150.0, GRASS),
        (w * 0.75, h * 0.25, 100.0, 75.0, CRYSTAL),
        (w * 0.5, h * 0.8, 150.0, 75.0, VOLCANIC),
        (w * 0.5, h * 0.8, 75.0, 40.0, LAVA),
        (w * 0.2, h * 0.4, 90.0, 100.0, GRASS),
        (w * 0.8, h * 0.6, 90.0, 100.0, GRASS),
    ];

    RgbaImage::from_fn(width, height, |x, y| {
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        let island = islands.iter().rev().find(|(cx, cy, rx, ry, _)| {
            let dx = (px - cx) / rx;
            let dy = (py - cy) / ry;
            dx * dx + dy * dy <= 1.0
        });
        if let Some((.., colour)) = island {
            return Rgba([colour[0], colour[1], colour[2], 255]);
        }
        let t = ((px - w / 2.0).hypot(py - h / 2.0) / radius).min(1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Rgba([
            mix(DEEP_WATER[0], OPEN_WATER[0]),
            mix(DEEP_WATER[1], OPEN_WATER[1]),
            mix(DEEP_WATER[2], OPEN_WATER[2]),
            255,
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
    }

    #[test]
    fn applied_assets_become_ready() {
        let mut store = AssetStore::idle((100, 100));
        assert_eq!(store.state(AssetKind::PortalIcon), LoadState::Pending);

        store.apply(AssetKind::PortalIcon, Ok(LoadedAsset::Image(solid(64, 48))));
        assert_eq!(store.state(AssetKind::PortalIcon), LoadState::Ready);
        assert_eq!(store.portal_icon().map(RgbaImage::dimensions), Some((64, 48)));
    }

    #[test]
    fn failed_background_falls_back_to_procedural_art() {
        let mut store = AssetStore::idle((320, 200));
        store.apply(
            AssetKind::Background,
            Err(AssetError::NoFrames {
                path: PathBuf::from("map.png"),
            }),
        );
        assert_eq!(store.state(AssetKind::Background), LoadState::Failed);
        assert!(store.state(AssetKind::Background).is_settled());
        assert_eq!(store.background().map(RgbaImage::dimensions), Some((320, 200)));
    }

    #[test]
    fn sprite_frames_keep_first_as_static_frame() {
        let mut store = AssetStore::idle((10, 10));
        let mut first = solid(4, 4);
        first.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        store.apply(
            AssetKind::CharacterSprite,
            Ok(LoadedAsset::Frames(vec![first.clone(), solid(4, 4), solid(4, 4)])),
        );
        assert_eq!(store.sprite_frames().len(), 3);
        assert_eq!(store.sprite_static_frame(), Some(&first));
    }

    #[test]
    fn masks_are_handed_over_once() {
        let mut store = AssetStore::idle((10, 10));
        store.apply(AssetKind::CollisionMask, Ok(LoadedAsset::Image(solid(8, 8))));
        assert!(store.take_collision_mask().is_some());
        assert!(store.take_collision_mask().is_none());
        assert_eq!(store.state(AssetKind::CollisionMask), LoadState::Ready);
    }

    #[test]
    fn loader_threads_report_missing_and_present_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        solid(12, 6)
            .save(dir.path().join("portal.png"))
            .expect("write png");

        let mut store = AssetStore::spawn_loads(&AssetManifest::default(), dir.path(), (50, 40));
        let mut settled = Vec::new();
        for _ in 0..500 {
            settled.extend(store.poll());
            if settled.len() == AssetKind::ALL.len() {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(5));
        }

        assert_eq!(settled.len(), AssetKind::ALL.len());
        assert_eq!(store.state(AssetKind::PortalIcon), LoadState::Ready);
        assert_eq!(store.portal_icon().map(RgbaImage::dimensions), Some((12, 6)));
        assert_eq!(store.state(AssetKind::CollisionMask), LoadState::Failed);
        assert_eq!(store.state(AssetKind::Background), LoadState::Failed);
        assert_eq!(store.background().map(RgbaImage::dimensions), Some((50, 40)));
    }

    #[test]
    fn procedural_background_paints_water_and_land() {
        let image = procedural_background(400, 300);
        assert_eq!(image.dimensions(), (400, 300));
        assert_eq!(image.get_pixel(200, 150), &Rgba([GRASS[0], GRASS[1], GRASS[2], 255]));
        let corner = image.get_pixel(0, 0);
        assert_eq!(corner[2], OPEN_WATER[2]);
    }
}
