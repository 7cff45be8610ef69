use image::RgbaImage;

use crate::geometry::Vec2;

/// Off-screen copy of a mask image plus the factors that convert world
/// coordinates into its pixel space. The mask may have a different
/// resolution than the background, so X and Y scale independently.
#[derive(Debug, Clone)]
pub struct MaskImage {
    pixels: RgbaImage,
    scale_x: f32,
    scale_y: f32,
}

impl MaskImage {
    pub fn new(pixels: RgbaImage, map_width: u32, map_height: u32) -> Self {
        let mut mask = Self {
            pixels,
            scale_x: 1.0,
            scale_y: 1.0,
        };
        mask.rescale(map_width, map_height);
        mask
    }

    /// Recomputes the scale factors against a new world size.
    pub fn rescale(&mut self, map_width: u32, map_height: u32) {
        self.scale_x = ratio(self.pixels.width(), map_width);
        self.scale_y = ratio(self.pixels.height(), map_height);
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }

    /// Mask pixel under a world point, or `None` when it falls outside the mask.
    pub fn world_to_pixel(&self, world: Vec2) -> Option<(u32, u32)> {
        let px = (world.x * self.scale_x).floor();
        let py = (world.y * self.scale_y).floor();
        if !px.is_finite() || !py.is_finite() || px < 0.0 || py < 0.0 {
            return None;
        }
        let (px, py) = (px as u32, py as u32);
        (px < self.width() && py < self.height()).then_some((px, py))
    }

    /// Converts a mask-pixel position (possibly fractional, e.g. a centroid)
    /// back into world space.
    pub fn pixel_to_world(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x / self.scale_x, y / self.scale_y)
    }

    pub fn is_white_at(&self, x: u32, y: u32, threshold: u8) -> bool {
        self.pixels
            .get_pixel_checked(x, y)
            .is_some_and(|pixel| pixel[0] > threshold && pixel[1] > threshold && pixel[2] > threshold)
    }

    pub fn is_white_at_world(&self, world: Vec2, threshold: u8) -> bool {
        self.world_to_pixel(world)
            .is_some_and(|(x, y)| self.is_white_at(x, y, threshold))
    }
}

fn ratio(mask_extent: u32, map_extent: u32) -> f32 {
    if map_extent == 0 {
        return 1.0;
    }
    mask_extent as f32 / map_extent as f32
}
