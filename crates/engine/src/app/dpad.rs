use crate::player::Direction;

const BUTTON_SIZE_PX: i32 = 56;
const BUTTON_GAP_PX: i32 = 6;
const EDGE_MARGIN_PX: i32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScreenRectPx {
    pub(crate) left: i32,
    pub(crate) top: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
}

impl ScreenRectPx {
    pub(crate) fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left as f32
            && y >= self.top as f32
            && x < (self.left + self.width) as f32
            && y < (self.top + self.height) as f32
    }
}

/// On-screen direction pad anchored to the bottom-right corner of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DpadLayout {
    buttons: [(Direction, ScreenRectPx); 4],
}

impl DpadLayout {
    pub(crate) fn for_window(width: u32, height: u32) -> Self {
        let step = BUTTON_SIZE_PX + BUTTON_GAP_PX;
        let origin_x = width as i32 - EDGE_MARGIN_PX - 3 * BUTTON_SIZE_PX - 2 * BUTTON_GAP_PX;
        let origin_y = height as i32 - EDGE_MARGIN_PX - 3 * BUTTON_SIZE_PX - 2 * BUTTON_GAP_PX;
        let cell = |col: i32, row: i32| ScreenRectPx {
            left: origin_x + col * step,
            top: origin_y + row * step,
            width: BUTTON_SIZE_PX,
            height: BUTTON_SIZE_PX,
        };
        Self {
            buttons: [
                (Direction::Up, cell(1, 0)),
                (Direction::Left, cell(0, 1)),
                (Direction::Right, cell(2, 1)),
                (Direction::Down, cell(1, 2)),
            ],
        }
    }

    pub(crate) fn buttons(&self) -> &[(Direction, ScreenRectPx); 4] {
        &self.buttons
    }

    pub(crate) fn hit_test(&self, x: f32, y: f32) -> Option<Direction> {
        self.buttons
            .iter()
            .find(|(_, rect)| rect.contains(x, y))
            .map(|(direction, _)| *direction)
    }
}
