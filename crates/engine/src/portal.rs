use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PortalConfig;
use crate::geometry::Vec2;
use crate::mask::MaskImage;
use crate::navigation::Destination;

/// Cell of the 3x3 grid the map is divided into for routing portals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridCell {
    TopLeft,
    TopMiddle,
    TopRight,
    MiddleLeft,
    MiddleMiddle,
    MiddleRight,
    BottomLeft,
    BottomMiddle,
    BottomRight,
}

impl GridCell {
    pub const ALL: [GridCell; 9] = [
        GridCell::TopLeft,
        GridCell::TopMiddle,
        GridCell::TopRight,
        GridCell::MiddleLeft,
        GridCell::MiddleMiddle,
        GridCell::MiddleRight,
        GridCell::BottomLeft,
        GridCell::BottomMiddle,
        GridCell::BottomRight,
    ];

    /// Cell containing `position` on a map of the given size. Boundaries sit
    /// at 33% and 67% of each axis; exactly on a boundary counts as middle.
    pub fn classify(position: Vec2, map_width: u32, map_height: u32) -> Self {
        let column = band(position.x, map_width as f32);
        let row = band(position.y, map_height as f32);
        Self::ALL[row * 3 + column]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopMiddle => "top-middle",
            Self::TopRight => "top-right",
            Self::MiddleLeft => "middle-left",
            Self::MiddleMiddle => "middle-middle",
            Self::MiddleRight => "middle-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomMiddle => "bottom-middle",
            Self::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn band(value: f32, extent: f32) -> usize {
    if value < extent * 0.33 {
        0
    } else if value > extent * 0.67 {
        2
    } else {
        1
    }
}

/// Site routing from grid cell to destination. Cells without an entry are
/// decorative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct DestinationTable {
    entries: BTreeMap<GridCell, Destination>,
}

impl DestinationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: GridCell) -> Option<&Destination> {
        self.entries.get(&cell)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(GridCell, Destination)> for DestinationTable {
    fn from_iter<T: IntoIterator<Item = (GridCell, Destination)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    pub index: usize,
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub cell: GridCell,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct PortalRegistry {
    portals: Vec<Portal>,
    destinations: DestinationTable,
    config: PortalConfig,
    detection_attempted: bool,
}

impl PortalRegistry {
    pub fn new(config: PortalConfig, destinations: DestinationTable) -> Self {
        Self {
            portals: Vec::new(),
            destinations,
            config,
            detection_attempted: false,
        }
    }

    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn get(&self, index: usize) -> Option<&Portal> {
        self.portals.get(index)
    }

    pub fn len(&self) -> usize {
        self.portals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    pub fn detection_attempted(&self) -> bool {
        self.detection_attempted
    }

    pub fn destination_for(&self, cell: GridCell) -> Option<&Destination> {
        self.destinations.get(cell)
    }

    /// Finds portals as connected white regions of the portal mask. Runs at
    /// most once per registry; `icon_size` is the portal icon's natural size
    /// when it is already loaded.
    pub fn detect(
        &mut self,
        mask: &MaskImage,
        map_width: u32,
        map_height: u32,
        icon_size: Option<(u32, u32)>,
    ) -> usize {
        if self.detection_attempted || !self.portals.is_empty() {
            return self.portals.len();
        }
        self.detection_attempted = true;

        let (width, height) = match icon_size {
            Some((w, h)) => (w as f32, h as f32),
            None => (self.config.default_size, self.config.default_size),
        };

        let centroids = find_components(
            mask,
            self.config.detection_threshold,
            self.config.scan_stride.max(1),
            self.config.min_component_pixels,
        );
        for (sum_x, sum_y) in centroids {
            let position = mask.pixel_to_world(sum_x, sum_y);
            let index = self.portals.len();
            debug!(index, x = position.x, y = position.y, "portal_found");
            self.portals.push(Portal {
                index,
                position,
                width,
                height,
                cell: GridCell::classify(position, map_width, map_height),
                rotation: 0.0,
                rotation_speed: 0.0,
                is_active: false,
            });
        }

        self.nudge_middle_left(map_width, map_height);
        info!(count = self.portals.len(), "portal_detection_complete");
        self.portals.len()
    }

    /// Shifts the second-from-top portal in the left 40% of the map to the
    /// right when at least three portals live there.
    fn nudge_middle_left(&mut self, map_width: u32, map_height: u32) {
        let limit = map_width as f32 * 0.4;
        let mut left: Vec<usize> = self
            .portals
            .iter()
            .filter(|portal| portal.position.x < limit)
            .map(|portal| portal.index)
            .collect();
        if left.len() < 3 {
            debug!(found = left.len(), "middle_left_nudge_skipped");
            return;
        }
        left.sort_by(|a, b| {
            self.portals[*a]
                .position
                .y
                .total_cmp(&self.portals[*b].position.y)
        });
        let nudge = self.config.middle_left_nudge;
        let portal = &mut self.portals[left[1]];
        portal.position.x += nudge;
        portal.cell = GridCell::classify(portal.position, map_width, map_height);
        debug!(
            index = portal.index,
            x = portal.position.x,
            y = portal.position.y,
            "middle_left_portal_nudged"
        );
    }

    pub fn set_icon_size(&mut self, width: u32, height: u32) {
        for portal in &mut self.portals {
            portal.width = width as f32;
            portal.height = height as f32;
        }
    }

    /// Advances every portal's spin. The player's box is centred on `player`,
    /// the raw player position; overlap with a portal's render box speeds it up.
    pub fn update_rotations(&mut self, player: Vec2, player_size: Vec2) {
        let half = self.config.render_size / 2.0;
        let config = &self.config;
        for portal in &mut self.portals {
            let overlaps = player.x + player_size.x / 2.0 > portal.position.x - half
                && player.x - player_size.x / 2.0 < portal.position.x + half
                && player.y + player_size.y / 2.0 > portal.position.y - half
                && player.y - player_size.y / 2.0 < portal.position.y + half;

            if overlaps {
                let distance = player.distance(portal.position);
                let proximity = ((half - distance) / half).max(0.0);
                portal.rotation_speed =
                    config.base_rotation_speed + proximity * config.max_rotation_speed;
                portal.is_active = true;
            } else if portal.is_active {
                portal.rotation_speed *= config.rotation_decay;
                if (portal.rotation_speed - config.idle_rotation_speed).abs() < 0.005 {
                    portal.rotation_speed = config.idle_rotation_speed;
                    portal.is_active = false;
                }
            } else {
                portal.rotation_speed = config.idle_rotation_speed;
            }

            portal.rotation = wrap_angle(portal.rotation + portal.rotation_speed);
        }
    }
}

fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Connected components of white pixels, returned as centroids in mask pixel
/// space. Seeds are scanned on a `stride` grid; the fill itself visits every
/// 4-neighbour.
fn find_components(
    mask: &MaskImage,
    threshold: u8,
    stride: u32,
    min_pixels: usize,
) -> Vec<(f32, f32)> {
    let (width, height) = (mask.width(), mask.height());
    let mut visited = vec![false; width as usize * height as usize];
    let mut centroids = Vec::new();
    let mut stack = Vec::new();

    for seed_y in (0..height).step_by(stride as usize) {
        for seed_x in (0..width).step_by(stride as usize) {
            let seed = (seed_y * width + seed_x) as usize;
            if visited[seed] || !mask.is_white_at(seed_x, seed_y, threshold) {
                continue;
            }

            let (mut count, mut sum_x, mut sum_y) = (0usize, 0f64, 0f64);
            stack.push((seed_x, seed_y));
            while let Some((x, y)) = stack.pop() {
                let offset = (y * width + x) as usize;
                if visited[offset] || !mask.is_white_at(x, y, threshold) {
                    continue;
                }
                visited[offset] = true;
                count += 1;
                sum_x += f64::from(x);
                sum_y += f64::from(y);

                if x + 1 < width {
                    stack.push((x + 1, y));
                }
                if x > 0 {
                    stack.push((x - 1, y));
                }
                if y + 1 < height {
                    stack.push((x, y + 1));
                }
                if y > 0 {
                    stack.push((x, y - 1));
                }
            }

            if count > min_pixels {
                centroids.push(((sum_x / count as f64) as f32, (sum_y / count as f64) as f32));
            }
        }
    }
    centroids
}
