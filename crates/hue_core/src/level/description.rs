use serde::{Deserialize, Serialize};

use crate::color::{Color, DEFAULT_UNSTABLE_REVERT_SECONDS};
use crate::entity::EntityPlacement;
use crate::geometry::Vec2;
use crate::grid::{Cell, CellCoord, CellKind, GridBounds};
use crate::movement::MovementConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub x: i32,
    pub y: i32,
    /// Defaults to solid unless the cell is colored.
    #[serde(default)]
    pub solid: Option<bool>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub kind: CellKind,
}

impl CellRecord {
    pub fn block(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            solid: None,
            color: None,
            kind: CellKind::Plain,
        }
    }

    pub fn colored(x: i32, y: i32, color: Color) -> Self {
        Self {
            color: Some(color),
            ..Self::block(x, y)
        }
    }

    pub fn with_kind(mut self, kind: CellKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn coord(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }

    pub fn to_cell(&self) -> Cell {
        Cell {
            solid: self.solid.unwrap_or(self.color.is_none()),
            color: self.color,
            kind: self.kind,
        }
    }
}

/// Validated input to `LevelSession::new`. How it was authored is not the core's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescription {
    pub bounds: GridBounds,
    #[serde(default)]
    pub cells: Vec<CellRecord>,
    #[serde(default)]
    pub entities: Vec<EntityPlacement>,
    pub spawn: CellCoord,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub movement: MovementConfig,
    pub unstable_revert_seconds: f64,
    pub pawn_size: Vec2,
    /// Surround the level with walls and a lethal floor.
    pub enclose: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            movement: MovementConfig::default(),
            unstable_revert_seconds: DEFAULT_UNSTABLE_REVERT_SECONDS,
            pawn_size: Vec2::new(1.0, 1.0),
            enclose: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_solidity_defaults_by_color() {
        assert!(CellRecord::block(0, 0).to_cell().solid);
        assert!(!CellRecord::colored(0, 0, Color::Red).to_cell().solid);
        let forced = CellRecord {
            solid: Some(true),
            ..CellRecord::colored(0, 0, Color::Red)
        };
        assert!(forced.to_cell().solid);
    }

    #[test]
    fn level_description_parses_minimal_json() {
        let raw = r#"{
            "bounds": {"origin": {"x": 0, "y": 0}, "width": 4, "height": 3},
            "cells": [
                {"x": 0, "y": 2},
                {"x": 1, "y": 2, "color": "blue"},
                {"x": 2, "y": 2, "kind": "spike"}
            ],
            "spawn": {"x": 0, "y": 0}
        }"#;
        let level: LevelDescription = serde_json::from_str(raw).expect("level");
        assert_eq!(level.cells.len(), 3);
        assert_eq!(level.cells[1].color, Some(Color::Blue));
        assert_eq!(level.cells[2].kind, CellKind::Spike);
        assert!(level.entities.is_empty());
    }

    #[test]
    fn session_config_defaults_fill_missing_fields() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"enclose": false}"#).expect("config");
        assert!(!config.enclose);
        assert_eq!(config.unstable_revert_seconds, DEFAULT_UNSTABLE_REVERT_SECONDS);
        assert_eq!(config.pawn_size, Vec2::new(1.0, 1.0));
    }
}
