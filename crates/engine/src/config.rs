//! Tuning knobs for the engine. Every field has a default matching the
//! shipped site; `quest.json` may override any subset.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World size used until the background image reports its natural size.
    pub default_map_width: u32,
    pub default_map_height: u32,
    /// Movement is rejected within this many world units of any map edge.
    pub world_edge_margin: f32,
    pub player: PlayerConfig,
    pub collision: CollisionConfig,
    pub portals: PortalConfig,
    pub camera: CameraConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_map_width: 1920,
            default_map_height: 1080,
            world_edge_margin: 20.0,
            player: PlayerConfig::default(),
            collision: CollisionConfig::default(),
            portals: PortalConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub anim_ticks_per_frame: u32,
    pub anim_frame_count: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            width: 24.0,
            height: 24.0,
            speed: 4.0,
            anim_ticks_per_frame: 10,
            anim_frame_count: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Half-extent of the five-point collision sample.
    pub collision_radius: f32,
    /// A mask pixel blocks when R, G and B all exceed this value.
    pub blocked_threshold: u8,
    /// Subtracted from world Y before sampling masks and measuring portal distance.
    pub y_offset_correction: f32,
    pub search_step: f32,
    pub search_max_radius: f32,
    pub fallback_min_radius: f32,
    pub fallback_max_radius: f32,
    pub fallback_points: u32,
    /// Return-placement candidates closer than this to an edge are skipped.
    pub placement_margin: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            collision_radius: 8.0,
            blocked_threshold: 245,
            y_offset_correction: 0.0,
            search_step: 20.0,
            search_max_radius: 150.0,
            fallback_min_radius: 60.0,
            fallback_max_radius: 120.0,
            fallback_points: 8,
            placement_margin: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub detection_threshold: u8,
    pub min_component_pixels: usize,
    pub scan_stride: u32,
    pub default_size: f32,
    /// World-unit edge of the square a portal is drawn into and spins within.
    pub render_size: f32,
    pub middle_left_nudge: f32,
    pub trigger_radius: f32,
    pub center_radius: f32,
    pub teleport_delay_ticks: u32,
    pub faded_opacity: f32,
    pub trigger_grace_period_ms: u64,
    /// Offset from the departure portal used to place a returning player.
    pub return_offset: f32,
    pub base_rotation_speed: f32,
    pub max_rotation_speed: f32,
    pub idle_rotation_speed: f32,
    pub rotation_decay: f32,
}

impl PortalConfig {
    pub fn trigger_grace_period(&self) -> Duration {
        Duration::from_millis(self.trigger_grace_period_ms)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            detection_threshold: 240,
            min_component_pixels: 10,
            scan_stride: 2,
            default_size: 64.0,
            render_size: 120.0,
            middle_left_nudge: 25.0,
            trigger_radius: 70.0,
            center_radius: 50.0,
            teleport_delay_ticks: 90,
            faded_opacity: 0.2,
            trigger_grace_period_ms: 1000,
            return_offset: 100.0,
            base_rotation_speed: 0.008,
            max_rotation_speed: 0.05,
            idle_rotation_speed: -0.003,
            rotation_decay: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub follow_factor: f32,
    /// How much of the viewport the map overfills; larger shows less world.
    pub viewport_overfill: f32,
    pub min_zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            follow_factor: 0.08,
            viewport_overfill: 1.4,
            min_zoom: 0.5,
        }
    }
}

/// File names of the five site images, relative to the asset directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    pub background: String,
    pub character_sprite: String,
    pub collision_mask: String,
    pub portal_mask: String,
    pub portal_icon: String,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            background: "map.png".to_string(),
            character_sprite: "dragon.gif".to_string(),
            collision_mask: "Component 1.png".to_string(),
            portal_mask: "Component 2.png".to_string(),
            portal_icon: "portal.png".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{ "collision": { "collision_radius": 5.0, "y_offset_correction": 60.0 } }"#,
        )
        .expect("config");

        assert_eq!(config.collision.collision_radius, 5.0);
        assert_eq!(config.collision.y_offset_correction, 60.0);
        assert_eq!(config.collision.blocked_threshold, 245);
        assert_eq!(config.portals.teleport_delay_ticks, 90);
        assert_eq!(config.default_map_width, 1920);
    }

    #[test]
    fn grace_period_converts_to_duration() {
        let config = PortalConfig {
            trigger_grace_period_ms: 250,
            ..PortalConfig::default()
        };
        assert_eq!(config.trigger_grace_period(), Duration::from_millis(250));
    }
}
