use crate::grid::WallSide;

pub const MAX_JUMPS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementState {
    Grounded,
    Rising,
    /// Apex float after a jump stops rising.
    HangTime { remaining: f64 },
    Falling,
    /// Just walked off a ledge; a jump still counts as grounded.
    CoyoteWindow { remaining: f64 },
    WallSliding { side: WallSide },
}

impl MovementState {
    pub fn name(self) -> &'static str {
        match self {
            MovementState::Grounded => "grounded",
            MovementState::Rising => "rising",
            MovementState::HangTime { .. } => "hang_time",
            MovementState::Falling => "falling",
            MovementState::CoyoteWindow { .. } => "coyote_window",
            MovementState::WallSliding { .. } => "wall_sliding",
        }
    }

    pub fn is_grounded(self) -> bool {
        matches!(self, MovementState::Grounded)
    }

    pub(crate) fn same_kind(self, other: MovementState) -> bool {
        std::mem::discriminant(&self) == std::mem::discriminant(&other)
    }
}
