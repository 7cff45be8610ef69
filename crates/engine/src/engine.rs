use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::assets::{AssetError, AssetKind, AssetStore, LoadState, LoadedAsset};
use crate::breadcrumb::{consume_return_breadcrumb, write_breadcrumb, Breadcrumb};
use crate::camera::Camera;
use crate::collision::CollisionField;
use crate::config::EngineConfig;
use crate::geometry::{Vec2, Viewport};
use crate::input::MoveIntent;
use crate::mask::MaskImage;
use crate::navigation::Destination;
use crate::player::Player;
use crate::portal::{DestinationTable, PortalRegistry};
use crate::storage::PageStorage;
use crate::teleport::PortalInteraction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Navigate(Destination),
}

/// Where the player should stand until they first move. Re-applied when a
/// late asset changes the world size or the collision data.
#[derive(Debug, Clone)]
enum Placement {
    Center,
    ReturnNear(Breadcrumb),
}

/// One world page: every subsystem of the explorable map, driven one frame
/// at a time by the host.
pub struct GameEngine {
    config: EngineConfig,
    assets: AssetStore,
    collision: CollisionField,
    portals: PortalRegistry,
    player: Player,
    camera: Camera,
    interaction: PortalInteraction,
    storage: Rc<dyn PageStorage>,
    placement: Placement,
    portal_mask: Option<MaskImage>,
    map_width: u32,
    map_height: u32,
    frames: u64,
}

impl GameEngine {
    /// Builds the world page and consumes any return breadcrumb.
    pub fn new(
        config: EngineConfig,
        destinations: DestinationTable,
        assets: AssetStore,
        storage: Rc<dyn PageStorage>,
    ) -> Self {
        let placement = match consume_return_breadcrumb(storage.as_ref()) {
            Ok(Some(breadcrumb)) => {
                info!(
                    portal_index = breadcrumb.portal_index,
                    cell = %breadcrumb.position,
                    "returning_from_portal"
                );
                Placement::ReturnNear(breadcrumb)
            }
            Ok(None) => Placement::Center,
            Err(error) => {
                warn!(error = %error, "breadcrumb_unreadable_using_center");
                Placement::Center
            }
        };

        let map_width = config.default_map_width;
        let map_height = config.default_map_height;
        let mut engine = Self {
            collision: CollisionField::new(config.collision.clone(), config.world_edge_margin),
            portals: PortalRegistry::new(config.portals.clone(), destinations),
            player: Player::new(&config.player, Vec2::default()),
            camera: Camera::default(),
            interaction: PortalInteraction::new(&config.portals),
            config,
            assets,
            storage,
            placement,
            portal_mask: None,
            map_width,
            map_height,
            frames: 0,
        };
        engine.apply_placement();
        info!(
            x = engine.player.position.x,
            y = engine.player.position.y,
            "world_page_started"
        );
        engine
    }

    /// Applies every asset load that finished since the last call.
    pub fn pump_assets(&mut self) {
        for kind in self.assets.poll() {
            self.on_asset_settled(kind);
        }
    }

    /// Feeds a load result straight in, bypassing the loader threads.
    pub fn apply_asset(&mut self, kind: AssetKind, result: Result<LoadedAsset, AssetError>) {
        self.assets.apply(kind, result);
        self.on_asset_settled(kind);
    }

    fn on_asset_settled(&mut self, kind: AssetKind) {
        let ready = self.assets.state(kind) == LoadState::Ready;
        match kind {
            AssetKind::Background => {
                if let Some((width, height)) = self.assets.background().map(|image| image.dimensions()) {
                    if ready && width > 0 && height > 0 {
                        self.resize_world(width, height);
                    }
                }
                self.try_detect_portals();
            }
            AssetKind::CollisionMask if ready => {
                if let Some(pixels) = self.assets.take_collision_mask() {
                    self.collision
                        .set_mask(MaskImage::new(pixels, self.map_width, self.map_height));
                    self.reapply_placement();
                }
            }
            AssetKind::PortalMask if ready => {
                if let Some(pixels) = self.assets.take_portal_mask() {
                    self.portal_mask = Some(MaskImage::new(pixels, self.map_width, self.map_height));
                    self.try_detect_portals();
                }
            }
            AssetKind::PortalIcon if ready => {
                if let Some((width, height)) = self.assets.portal_icon().map(|icon| icon.dimensions()) {
                    self.portals.set_icon_size(width, height);
                }
            }
            _ => {}
        }
    }

    fn resize_world(&mut self, width: u32, height: u32) {
        info!(width, height, "world_size_changed");
        self.map_width = width;
        self.map_height = height;
        self.collision.rescale(width, height);
        if let Some(mask) = self.portal_mask.as_mut() {
            mask.rescale(width, height);
        }
        self.reapply_placement();
    }

    fn try_detect_portals(&mut self) {
        if self.portals.detection_attempted()
            || !self.assets.state(AssetKind::Background).is_settled()
        {
            return;
        }
        let Some(mask) = self.portal_mask.as_ref() else {
            return;
        };
        let icon_size = self.assets.portal_icon().map(|icon| icon.dimensions());
        self.portals
            .detect(mask, self.map_width, self.map_height, icon_size);
        // The mask is only needed once.
        self.portal_mask = None;
    }

    fn reapply_placement(&mut self) {
        if !self.player.has_moved() {
            self.apply_placement();
        }
    }

    fn apply_placement(&mut self) {
        let (width, height) = (self.map_width as f32, self.map_height as f32);
        let position = match &self.placement {
            Placement::Center => Vec2::new(width / 2.0, height / 2.0),
            Placement::ReturnNear(breadcrumb) => {
                let margin = self.config.collision.placement_margin;
                let offset = self.config.portals.return_offset;
                let clamp = |value: f32, extent: f32| value.min(extent - margin).max(margin);
                let target = Vec2::new(
                    clamp(breadcrumb.x + offset, width),
                    clamp(breadcrumb.y + offset, height),
                );
                self.collision.find_nearest_valid_position(
                    target,
                    Vec2::new(breadcrumb.x, breadcrumb.y),
                    self.map_width,
                    self.map_height,
                )
            }
        };
        debug!(x = position.x, y = position.y, "player_placed");
        self.player.place(position);
    }

    /// Runs one simulation frame.
    pub fn step(&mut self, dt: Duration, intent: MoveIntent, viewport: Viewport) -> StepOutcome {
        self.pump_assets();
        self.frames += 1;

        let (width, height) = (self.map_width, self.map_height);
        let collision = &self.collision;
        self.player
            .apply_movement(intent, |x, y| collision.can_move_to(x, y, width, height));
        self.player.advance_animation();

        if self.assets.state(AssetKind::PortalIcon) == LoadState::Ready {
            self.portals
                .update_rotations(self.player.position, self.player.size());
        }

        self.camera.follow(
            self.player.position,
            viewport,
            width,
            height,
            &self.config.camera,
        );

        let center = self.player.center();
        let anchor = Vec2::new(center.x, center.y - self.config.collision.y_offset_correction);
        match self.interaction.update(dt, anchor, self.portals.portals()) {
            Some(index) => self.begin_teleport(index),
            None => StepOutcome::Continue,
        }
    }

    fn begin_teleport(&mut self, portal_index: usize) -> StepOutcome {
        let Some(portal) = self.portals.get(portal_index) else {
            self.interaction.reset();
            return StepOutcome::Continue;
        };
        let Some(destination) = self.portals.destination_for(portal.cell).cloned() else {
            warn!(portal_index, cell = %portal.cell, "portal_destination_unmapped");
            self.interaction.reset();
            return StepOutcome::Continue;
        };

        let breadcrumb = Breadcrumb {
            x: portal.position.x,
            y: portal.position.y,
            position: portal.cell,
            portal_index,
        };
        if let Err(error) = write_breadcrumb(self.storage.as_ref(), &breadcrumb) {
            warn!(error = %error, "breadcrumb_write_failed");
        }
        info!(
            portal_index,
            cell = %portal.cell,
            destination = %destination,
            "teleport_started"
        );
        StepOutcome::Navigate(destination)
    }

    /// Ends the page. Loads still in flight are discarded.
    pub fn dispose(mut self) {
        self.assets.detach();
        info!(frames = self.frames, "world_page_disposed");
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn portals(&self) -> &PortalRegistry {
        &self.portals
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn interaction(&self) -> &PortalInteraction {
        &self.interaction
    }

    pub fn map_size(&self) -> (u32, u32) {
        (self.map_width, self.map_height)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world_opacity(&self) -> f32 {
        self.interaction.opacity()
    }

    /// The map title stays up until the player first moves.
    pub fn title_visible(&self) -> bool {
        !self.player.has_moved()
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::breadcrumb::{mark_return_from_page, LAST_PORTAL_USED_KEY};
    use crate::player::Direction;
    use crate::portal::GridCell;
    use crate::storage::MemoryStorage;
    use crate::teleport::DwellState;

    const FRAME: Duration = Duration::from_millis(16);
    const VIEW: Viewport = Viewport::new(320, 240);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn config() -> EngineConfig {
        let mut config = EngineConfig {
            default_map_width: 400,
            default_map_height: 400,
            ..EngineConfig::default()
        };
        config.portals.trigger_grace_period_ms = 0;
        config
    }

    fn table() -> DestinationTable {
        [(GridCell::TopLeft, Destination::parse("about.html"))]
            .into_iter()
            .collect()
    }

    fn engine_with(storage: &MemoryStorage, destinations: DestinationTable) -> GameEngine {
        GameEngine::new(
            config(),
            destinations,
            AssetStore::idle((400, 400)),
            Rc::new(storage.clone()),
        )
    }

    fn portal_mask_at(x: u32, y: u32) -> RgbaImage {
        let mut mask = RgbaImage::from_pixel(400, 400, BLACK);
        for py in y - 4..=y + 4 {
            for px in x - 4..=x + 4 {
                mask.put_pixel(px, py, WHITE);
            }
        }
        mask
    }

    fn load_world(engine: &mut GameEngine, portal: (u32, u32)) {
        engine.apply_asset(
            AssetKind::Background,
            Ok(LoadedAsset::Image(RgbaImage::from_pixel(400, 400, BLACK))),
        );
        engine.apply_asset(
            AssetKind::PortalMask,
            Ok(LoadedAsset::Image(portal_mask_at(portal.0, portal.1))),
        );
    }

    fn up_left() -> MoveIntent {
        MoveIntent {
            dx: -1,
            dy: -1,
            facing: Some(Direction::Left),
        }
    }

    #[test]
    fn fresh_start_places_player_at_map_center() {
        let storage = MemoryStorage::new();
        let engine = engine_with(&storage, table());
        assert_eq!(engine.player().position, Vec2::new(200.0, 200.0));
        assert!(engine.title_visible());
    }

    #[test]
    fn returning_player_lands_offset_from_the_portal() {
        let storage = MemoryStorage::new();
        write_breadcrumb(
            &storage,
            &Breadcrumb {
                x: 80.0,
                y: 90.0,
                position: GridCell::TopLeft,
                portal_index: 0,
            },
        )
        .expect("write");
        mark_return_from_page(&storage, "about.html").expect("mark");

        let engine = engine_with(&storage, table());
        assert_eq!(engine.player().position, Vec2::new(180.0, 190.0));
        assert!(storage.is_empty(), "breadcrumb consumed");
    }

    #[test]
    fn return_target_is_clamped_inside_placement_margin() {
        let storage = MemoryStorage::new();
        write_breadcrumb(
            &storage,
            &Breadcrumb {
                x: 330.0,
                y: 10.0,
                position: GridCell::TopRight,
                portal_index: 2,
            },
        )
        .expect("write");
        mark_return_from_page(&storage, "sponsors.html").expect("mark");

        let engine = engine_with(&storage, table());
        assert_eq!(engine.player().position, Vec2::new(350.0, 110.0));
    }

    #[test]
    fn malformed_breadcrumb_centers_the_player() {
        let storage = MemoryStorage::new();
        storage
            .set_item(LAST_PORTAL_USED_KEY, "not json")
            .expect("set");
        mark_return_from_page(&storage, "team.html").expect("mark");

        let engine = engine_with(&storage, table());
        assert_eq!(engine.player().position, Vec2::new(200.0, 200.0));
    }

    #[test]
    fn late_collision_mask_moves_an_unmoved_player_off_walls() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(&storage, table());
        let mut walls = RgbaImage::from_pixel(400, 400, BLACK);
        for y in 150..250 {
            for x in 150..250 {
                walls.put_pixel(x, y, WHITE);
            }
        }
        engine.apply_asset(AssetKind::CollisionMask, Ok(LoadedAsset::Image(walls)));
        let position = engine.player().position;
        assert_eq!(position, Vec2::new(200.0, 200.0), "center placement never searches");

        let outcome = engine.step(FRAME, up_left(), VIEW);
        assert_eq!(outcome, StepOutcome::Continue);
        assert_eq!(engine.player().position, position, "walls block movement");
        assert!(!engine.player().is_moving);
    }

    #[test]
    fn detection_waits_for_background_to_settle() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(&storage, table());
        engine.apply_asset(
            AssetKind::PortalMask,
            Ok(LoadedAsset::Image(portal_mask_at(60, 60))),
        );
        assert!(engine.portals().is_empty());

        engine.apply_asset(
            AssetKind::Background,
            Err(AssetError::NoFrames {
                path: "map.png".into(),
            }),
        );
        assert_eq!(engine.portals().len(), 1);
        assert_eq!(engine.portals().portals()[0].cell, GridCell::TopLeft);
    }

    #[test]
    fn dwelling_on_a_mapped_portal_navigates_once_and_leaves_a_breadcrumb() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(&storage, table());
        load_world(&mut engine, (60, 60));

        let mut navigations = Vec::new();
        for frame in 0..300 {
            let intent = if frame < 38 { up_left() } else { MoveIntent::NONE };
            if let StepOutcome::Navigate(destination) = engine.step(FRAME, intent, VIEW) {
                navigations.push(destination);
            }
        }

        assert_eq!(navigations, vec![Destination::Page("about.html".to_string())]);
        assert!(matches!(
            engine.interaction().state(),
            DwellState::Teleporting { portal_index: 0 }
        ));
        assert!((engine.world_opacity() - 0.2).abs() < 1e-6);
        assert!(!engine.title_visible());

        let raw = storage
            .get_item(LAST_PORTAL_USED_KEY)
            .expect("get")
            .expect("breadcrumb");
        let breadcrumb: Breadcrumb = serde_json::from_str(&raw).expect("json");
        assert_eq!(breadcrumb.position, GridCell::TopLeft);
        assert_eq!(breadcrumb.portal_index, 0);
    }

    #[test]
    fn unmapped_portal_resets_dwell_without_navigating() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(&storage, DestinationTable::new());
        load_world(&mut engine, (60, 60));

        for frame in 0..300 {
            let intent = if frame < 38 { up_left() } else { MoveIntent::NONE };
            assert_eq!(engine.step(FRAME, intent, VIEW), StepOutcome::Continue);
        }
        assert!(!matches!(
            engine.interaction().state(),
            DwellState::Teleporting { .. }
        ));
        assert!(storage.get_item(LAST_PORTAL_USED_KEY).expect("get").is_none());
    }

    #[test]
    fn open_map_walk_up_moves_four_units_every_frame() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(&storage, table());
        engine.apply_asset(
            AssetKind::CollisionMask,
            Ok(LoadedAsset::Image(RgbaImage::from_pixel(400, 400, BLACK))),
        );
        let start = engine.player().position;
        assert_eq!(start, Vec2::new(200.0, 200.0));

        let up = MoveIntent {
            dx: 0,
            dy: -1,
            facing: Some(Direction::Up),
        };
        let mut previous_y = start.y;
        for _ in 0..10 {
            engine.step(FRAME, up, VIEW);
            let player = engine.player();
            assert!(player.position.y < previous_y, "y falls every frame");
            assert_eq!(player.position.x, start.x);
            assert!(player.is_moving);
            previous_y = player.position.y;
        }
        assert_eq!(engine.player().position.y - start.y, -40.0);

        engine.step(FRAME, MoveIntent::NONE, VIEW);
        assert!(!engine.player().is_moving);
        assert_eq!(engine.player().position.y, previous_y);
    }

    #[test]
    fn portal_spin_measures_from_the_player_position() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(&storage, DestinationTable::new());
        load_world(&mut engine, (200, 200));
        engine.apply_asset(
            AssetKind::PortalIcon,
            Ok(LoadedAsset::Image(RgbaImage::from_pixel(8, 8, WHITE))),
        );
        assert_eq!(engine.player().position, Vec2::new(200.0, 200.0));

        engine.step(FRAME, MoveIntent::NONE, VIEW);
        let portal = &engine.portals().portals()[0];
        assert!(portal.is_active);
        // Full proximity: base 0.008 plus max 0.05.
        assert!((portal.rotation_speed - 0.058).abs() < 1e-6);
    }

    #[test]
    fn background_size_becomes_world_size() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(&storage, table());
        engine.apply_asset(
            AssetKind::Background,
            Ok(LoadedAsset::Image(RgbaImage::from_pixel(800, 600, BLACK))),
        );
        assert_eq!(engine.map_size(), (800, 600));
        assert_eq!(engine.player().position, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn dispose_consumes_the_page() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(&storage, table());
        engine.step(FRAME, MoveIntent::NONE, VIEW);
        engine.dispose();
    }
}
