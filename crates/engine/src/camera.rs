use crate::config::CameraConfig;
use crate::geometry::{Vec2, Viewport};

/// Zoom at which the map overfills the viewport by the configured factor on
/// both axes, never below the configured floor.
pub fn zoom_for_viewport(
    viewport: Viewport,
    map_width: u32,
    map_height: u32,
    config: &CameraConfig,
) -> f32 {
    let fit = |screen: u32, map: u32| {
        if map == 0 {
            0.0
        } else {
            screen as f32 * config.viewport_overfill / map as f32
        }
    };
    fit(viewport.width, map_width)
        .max(fit(viewport.height, map_height))
        .max(config.min_zoom)
}

/// Screen-space camera: `x`/`y` are the top-left of the view in scaled
/// world pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Recomputes zoom for the current viewport, eases toward `focus`, then
    /// clamps to the scaled map.
    pub fn follow(
        &mut self,
        focus: Vec2,
        viewport: Viewport,
        map_width: u32,
        map_height: u32,
        config: &CameraConfig,
    ) {
        self.zoom = zoom_for_viewport(viewport, map_width, map_height, config);

        let target_x = focus.x * self.zoom - viewport.width as f32 / 2.0;
        let target_y = focus.y * self.zoom - viewport.height as f32 / 2.0;
        self.x += (target_x - self.x) * config.follow_factor;
        self.y += (target_y - self.y) * config.follow_factor;

        let max_x = map_width as f32 * self.zoom - viewport.width as f32;
        let max_y = map_height as f32 * self.zoom - viewport.height as f32;
        // Lower bound wins when the map is narrower than the viewport.
        self.x = self.x.min(max_x).max(0.0);
        self.y = self.y.min(max_y).max(0.0);
    }

    pub fn world_to_screen(&self, world: Vec2) -> (f32, f32) {
        (world.x * self.zoom - self.x, world.y * self.zoom - self.y)
    }

    pub fn screen_to_world(&self, screen_x: f32, screen_y: f32) -> Vec2 {
        Vec2::new((screen_x + self.x) / self.zoom, (screen_y + self.y) / self.zoom)
    }
}
