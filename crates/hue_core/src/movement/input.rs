use crate::color::{Color, ColorMask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveLeft,
    MoveRight,
    Jump,
}

const ACTION_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
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
            InputAction::MoveLeft => 0,
            InputAction::MoveRight => 1,
            InputAction::Jump => 2,
        }
    }
}

/// Input for one fixed step: held actions plus this step's press edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    actions: ActionStates,
    jump_pressed: bool,
    toggles_pressed: ColorMask,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_action_down(mut self, action: InputAction) -> Self {
        self.actions.set(action, true);
        self
    }

    /// Marks the jump press edge for this step; the button also counts as held.
    pub fn with_jump_pressed(mut self) -> Self {
        self.jump_pressed = true;
        self.actions.set(InputAction::Jump, true);
        self
    }

    pub fn with_toggle_pressed(mut self, color: Color) -> Self {
        self.toggles_pressed.insert(color);
        self
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn jump_pressed(&self) -> bool {
        self.jump_pressed
    }

    pub fn toggles_pressed(&self) -> ColorMask {
        self.toggles_pressed
    }

    /// -1, 0 or 1. Opposing directions cancel.
    pub fn horizontal_axis(&self) -> f64 {
        let mut axis = 0.0;
        if self.is_down(InputAction::MoveLeft) {
            axis -= 1.0;
        }
        if self.is_down(InputAction::MoveRight) {
            axis += 1.0;
        }
        axis
    }
}
