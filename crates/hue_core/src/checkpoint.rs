use tracing::debug;

use crate::color::{ColorSnapshot, ColorState};
use crate::geometry::Vec2;
use crate::grid::CellCoord;

/// Respawn point plus the colors that were enabled when it was reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub position: Vec2,
    pub colors: ColorSnapshot,
    pub source: Option<CellCoord>,
}

/// Holds the single current checkpoint. A newer save replaces the older one.
#[derive(Debug, Clone, Default)]
pub struct CheckpointStore {
    current: Option<Checkpoint>,
}

impl CheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, position: Vec2, colors: &ColorState, source: Option<CellCoord>) {
        self.current = Some(Checkpoint {
            position,
            colors: colors.snapshot(),
            source,
        });
        debug!(
            x = position.x,
            y = position.y,
            enabled_colors = colors.enabled_mask().len(),
            "checkpoint_saved"
        );
    }

    /// Rewinds `colors` to the saved snapshot and returns the respawn position.
    pub fn restore(&self, colors: &mut ColorState) -> Option<Vec2> {
        let checkpoint = self.current?;
        let changed = colors.restore(&checkpoint.colors);
        debug!(
            x = checkpoint.position.x,
            y = checkpoint.position.y,
            colors_changed = changed.len(),
            "checkpoint_restored"
        );
        Some(checkpoint.position)
    }

    pub fn current(&self) -> Option<&Checkpoint> {
        self.current.as_ref()
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
