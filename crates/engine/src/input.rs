use crate::player::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Back,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Back => 4,
        }
    }
}

/// One frame of movement input: each axis in `{-1, 0, 1}` plus the facing
/// picked by the last non-zero input evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub dx: i8,
    pub dy: i8,
    pub facing: Option<Direction>,
}

impl MoveIntent {
    pub const NONE: MoveIntent = MoveIntent {
        dx: 0,
        dy: 0,
        facing: None,
    };

    pub fn has_motion(&self) -> bool {
        self.dx != 0 || self.dy != 0
    }

    fn push(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.dy = -1,
            Direction::Down => self.dy = 1,
            Direction::Left => self.dx = -1,
            Direction::Right => self.dx = 1,
        }
        self.facing = Some(direction);
    }
}

/// Merges held keys with the single on-screen d-pad direction.
#[derive(Debug, Clone, Default)]
pub struct InputRouter {
    keys: ActionStates,
    touch: Option<Direction>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_action(&mut self, action: InputAction, is_down: bool) {
        self.keys.set(action, is_down);
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.keys.is_down(action)
    }

    pub fn set_touch(&mut self, direction: Option<Direction>) {
        self.touch = direction;
    }

    pub fn touch(&self) -> Option<Direction> {
        self.touch
    }

    /// Drops every held input, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn intent(&self) -> MoveIntent {
        let mut intent = MoveIntent::NONE;
        let keyboard = [
            (InputAction::MoveUp, Direction::Up),
            (InputAction::MoveDown, Direction::Down),
            (InputAction::MoveLeft, Direction::Left),
            (InputAction::MoveRight, Direction::Right),
        ];
        for (action, direction) in keyboard {
            if self.keys.is_down(action) {
                intent.push(direction);
            }
        }
        if let Some(direction) = self.touch {
            intent.push(direction);
        }
        intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_input_means_no_motion() {
        let router = InputRouter::new();
        assert_eq!(router.intent(), MoveIntent::NONE);
        assert!(!router.intent().has_motion());
    }

    #[test]
    fn later_inputs_override_axis_and_facing() {
        let mut router = InputRouter::new();
        router.set_action(InputAction::MoveUp, true);
        router.set_action(InputAction::MoveDown, true);
        router.set_action(InputAction::MoveLeft, true);

        let intent = router.intent();
        assert_eq!((intent.dx, intent.dy), (-1, 1));
        assert_eq!(intent.facing, Some(Direction::Left));
    }

    #[test]
    fn touch_direction_is_evaluated_last() {
        let mut router = InputRouter::new();
        router.set_action(InputAction::MoveRight, true);
        router.set_touch(Some(Direction::Up));

        let intent = router.intent();
        assert_eq!((intent.dx, intent.dy), (1, -1));
        assert_eq!(intent.facing, Some(Direction::Up));
    }

    #[test]
    fn clear_releases_keys_and_touch() {
        let mut router = InputRouter::new();
        router.set_action(InputAction::MoveUp, true);
        router.set_touch(Some(Direction::Left));
        router.clear();
        assert_eq!(router.intent(), MoveIntent::NONE);
        assert_eq!(router.touch(), None);
    }
}
