use std::f32::consts::TAU;

use tracing::{debug, info};

use crate::config::CollisionConfig;
use crate::geometry::Vec2;
use crate::mask::MaskImage;

/// Movement gate backed by the collision mask. Every query is fail-open:
/// without a mask nothing is blocked.
#[derive(Debug, Clone)]
pub struct CollisionField {
    mask: Option<MaskImage>,
    config: CollisionConfig,
    edge_margin: f32,
}

impl CollisionField {
    pub fn new(config: CollisionConfig, edge_margin: f32) -> Self {
        Self {
            mask: None,
            config,
            edge_margin,
        }
    }

    pub fn set_mask(&mut self, mask: MaskImage) {
        let (scale_x, scale_y) = mask.scale();
        info!(
            mask_width = mask.width(),
            mask_height = mask.height(),
            scale_x,
            scale_y,
            "collision_mask_ready"
        );
        self.mask = Some(mask);
    }

    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    pub fn rescale(&mut self, map_width: u32, map_height: u32) {
        if let Some(mask) = self.mask.as_mut() {
            mask.rescale(map_width, map_height);
        }
    }

    /// Five-point sample: center plus the four axis offsets at the collision
    /// radius. Samples landing outside the mask never block.
    pub fn is_blocked(&self, x: f32, y: f32) -> bool {
        let Some(mask) = self.mask.as_ref() else {
            return false;
        };
        let radius = self.config.collision_radius;
        let y = y - self.config.y_offset_correction;
        let samples = [
            Vec2::new(x, y),
            Vec2::new(x - radius, y),
            Vec2::new(x + radius, y),
            Vec2::new(x, y - radius),
            Vec2::new(x, y + radius),
        ];
        samples
            .iter()
            .any(|point| mask.is_white_at_world(*point, self.config.blocked_threshold))
    }

    pub fn in_world_bounds(&self, x: f32, y: f32, map_width: u32, map_height: u32) -> bool {
        let margin = self.edge_margin;
        x >= margin
            && x < map_width as f32 - margin
            && y >= margin
            && y < map_height as f32 - margin
    }

    pub fn can_move_to(&self, x: f32, y: f32, map_width: u32, map_height: u32) -> bool {
        if !self.in_world_bounds(x, y, map_width, map_height) {
            debug!(x, y, "movement_rejected_out_of_bounds");
            return false;
        }
        !self.is_blocked(x, y)
    }

    /// Closest unblocked point near `target`, searching rings around the
    /// target and then around `fallback`. Returns the world center when both
    /// searches come up empty.
    pub fn find_nearest_valid_position(
        &self,
        target: Vec2,
        fallback: Vec2,
        map_width: u32,
        map_height: u32,
    ) -> Vec2 {
        if !self.is_blocked(target.x, target.y) {
            return target;
        }

        let step = self.config.search_step.max(1.0);
        let mut radius = step;
        while radius <= self.config.search_max_radius {
            let points = ((radius / 10.0).floor() as u32).max(8);
            if let Some(found) = self.search_ring(target, radius, points, map_width, map_height) {
                debug!(x = found.x, y = found.y, radius, "placement_found_near_target");
                return found;
            }
            radius += step;
        }

        let mut radius = self.config.fallback_min_radius;
        while radius <= self.config.fallback_max_radius {
            let points = self.config.fallback_points.max(1);
            if let Some(found) = self.search_ring(fallback, radius, points, map_width, map_height)
            {
                debug!(x = found.x, y = found.y, radius, "placement_found_near_fallback");
                return found;
            }
            radius += step;
        }

        info!("placement_search_exhausted_using_center");
        Vec2::new(map_width as f32 / 2.0, map_height as f32 / 2.0)
    }

    fn search_ring(
        &self,
        center: Vec2,
        radius: f32,
        points: u32,
        map_width: u32,
        map_height: u32,
    ) -> Option<Vec2> {
        let margin = self.config.placement_margin;
        (0..points)
            .map(|i| {
                let angle = i as f32 / points as f32 * TAU;
                Vec2::new(
                    center.x + angle.cos() * radius,
                    center.y + angle.sin() * radius,
                )
            })
            .filter(|p| {
                p.x >= margin
                    && p.x <= map_width as f32 - margin
                    && p.y >= margin
                    && p.y <= map_height as f32 - margin
            })
            .find(|p| !self.is_blocked(p.x, p.y))
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn field_with(pixels: RgbaImage, map_width: u32, map_height: u32) -> CollisionField {
        let mut field = CollisionField::new(CollisionConfig::default(), 20.0);
        field.set_mask(MaskImage::new(pixels, map_width, map_height));
        field
    }

    fn paint_rect(pixels: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                pixels.put_pixel(x, y, WHITE);
            }
        }
    }

    #[test]
    fn missing_mask_never_blocks() {
        let field = CollisionField::new(CollisionConfig::default(), 20.0);
        for (x, y) in [(0.0, 0.0), (500.0, 500.0), (-40.0, 9000.0)] {
            assert!(!field.is_blocked(x, y), "({x},{y})");
        }
    }

    #[test]
    fn white_pixel_under_any_sample_blocks() {
        let mut pixels = RgbaImage::from_pixel(200, 200, BLACK);
        pixels.put_pixel(108, 100, WHITE);
        let field = field_with(pixels, 200, 200);

        assert!(field.is_blocked(100.0, 100.0));
        assert!(field.is_blocked(108.0, 100.0));
        assert!(!field.is_blocked(100.0, 90.0));
    }

    #[test]
    fn samples_outside_the_mask_are_skipped() {
        let pixels = RgbaImage::from_pixel(50, 50, WHITE);
        let field = field_with(pixels, 50, 50);

        assert!(!field.is_blocked(-20.0, -20.0));
        assert!(!field.is_blocked(80.0, 25.0));
        assert!(field.is_blocked(25.0, 25.0));
    }

    #[test]
    fn scale_factors_convert_world_to_mask_pixels() {
        let mut pixels = RgbaImage::from_pixel(100, 100, BLACK);
        paint_rect(&mut pixels, 40, 40, 60, 60);
        let field = field_with(pixels, 400, 400);

        assert!(field.is_blocked(200.0, 200.0));
        assert!(!field.is_blocked(100.0, 100.0));
    }

    #[test]
    fn y_offset_correction_shifts_samples() {
        let mut pixels = RgbaImage::from_pixel(200, 200, BLACK);
        pixels.put_pixel(100, 40, WHITE);
        let mut config = CollisionConfig::default();
        config.y_offset_correction = 60.0;
        let mut field = CollisionField::new(config, 20.0);
        field.set_mask(MaskImage::new(pixels, 200, 200));

        assert!(field.is_blocked(100.0, 100.0));
        assert!(!field.is_blocked(100.0, 40.0));
    }

    #[test]
    fn can_move_to_respects_edge_margin() {
        let field = CollisionField::new(CollisionConfig::default(), 20.0);
        assert!(field.can_move_to(20.0, 20.0, 200, 200));
        assert!(!field.can_move_to(19.9, 100.0, 200, 200));
        assert!(!field.can_move_to(100.0, 180.0, 200, 200));
        assert!(field.can_move_to(179.9, 179.9, 200, 200));
    }

    #[test]
    fn clear_target_is_returned_unchanged() {
        let pixels = RgbaImage::from_pixel(400, 400, BLACK);
        let field = field_with(pixels, 400, 400);
        let target = Vec2::new(123.0, 234.0);
        assert_eq!(
            field.find_nearest_valid_position(target, Vec2::new(50.0, 50.0), 400, 400),
            target
        );
    }

    #[test]
    fn blocked_target_resolves_to_a_clear_point_nearby() {
        let mut pixels = RgbaImage::from_pixel(400, 400, BLACK);
        paint_rect(&mut pixels, 180, 180, 230, 230);
        let field = field_with(pixels, 400, 400);
        let target = Vec2::new(200.0, 200.0);

        let found = field.find_nearest_valid_position(target, target, 400, 400);
        assert!(!field.is_blocked(found.x, found.y));
        assert!(found.distance(target) <= 150.0 + 1e-3);
    }

    #[test]
    fn search_falls_back_to_the_fallback_ring() {
        let mut pixels = RgbaImage::from_pixel(1000, 1000, BLACK);
        paint_rect(&mut pixels, 0, 0, 500, 1000);
        let field = field_with(pixels, 1000, 1000);

        let found = field.find_nearest_valid_position(
            Vec2::new(200.0, 500.0),
            Vec2::new(700.0, 500.0),
            1000,
            1000,
        );
        assert!(!field.is_blocked(found.x, found.y));
        let from_fallback = found.distance(Vec2::new(700.0, 500.0));
        assert!((60.0 - 1e-3..=120.0 + 1e-3).contains(&from_fallback));
    }

    #[test]
    fn fully_blocked_world_returns_exact_center() {
        let pixels = RgbaImage::from_pixel(300, 200, WHITE);
        let field = field_with(pixels, 300, 200);

        let found =
            field.find_nearest_valid_position(Vec2::new(80.0, 80.0), Vec2::new(90.0, 90.0), 300, 200);
        assert_eq!(found, Vec2::new(150.0, 100.0));
    }
}
