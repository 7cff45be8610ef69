use serde::{Deserialize, Serialize};

use crate::config::PlayerConfig;
use crate::geometry::Vec2;
use crate::input::MoveIntent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub direction: Direction,
    pub is_moving: bool,
    pub anim_frame: u32,
    anim_timer: u32,
    ticks_per_frame: u32,
    frame_count: u32,
    has_moved: bool,
}

impl Player {
    pub fn new(config: &PlayerConfig, position: Vec2) -> Self {
        Self {
            position,
            width: config.width,
            height: config.height,
            speed: config.speed,
            direction: Direction::default(),
            is_moving: false,
            anim_frame: 0,
            anim_timer: 0,
            ticks_per_frame: config.anim_ticks_per_frame.max(1),
            frame_count: config.anim_frame_count.max(1),
            has_moved: false,
        }
    }

    /// Point used for portal distance and rotation overlap.
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// True once any movement has been committed.
    pub fn has_moved(&self) -> bool {
        self.has_moved
    }

    /// Moves one step along `intent` when `can_move_to` accepts the candidate.
    /// Returns whether the player actually moved this frame.
    pub fn apply_movement(
        &mut self,
        intent: MoveIntent,
        can_move_to: impl Fn(f32, f32) -> bool,
    ) -> bool {
        let was_moving = self.is_moving;
        if let Some(facing) = intent.facing {
            self.direction = facing;
        }

        self.is_moving = false;
        if intent.has_motion() {
            let x = self.position.x + f32::from(intent.dx) * self.speed;
            let y = self.position.y + f32::from(intent.dy) * self.speed;
            if can_move_to(x, y) {
                self.position = Vec2::new(x, y);
                self.is_moving = true;
                self.has_moved = true;
            }
        }

        if was_moving && !self.is_moving {
            self.anim_frame = 0;
        }
        self.is_moving
    }

    pub fn advance_animation(&mut self) {
        if !self.is_moving {
            return;
        }
        self.anim_timer += 1;
        if self.anim_timer >= self.ticks_per_frame {
            self.anim_frame = (self.anim_frame + 1) % self.frame_count;
            self.anim_timer = 0;
        }
    }

    /// Moves the player without counting it as a move, for spawn placement.
    pub fn place(&mut self, position: Vec2) {
        self.position = position;
    }
}
