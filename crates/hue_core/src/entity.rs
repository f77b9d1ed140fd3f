use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;
use crate::grid::CellCoord;

/// Things that occupy a cell without being part of the solid grid. Touching one
/// triggers its effect once per touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    Switch { color: Color },
    Checkpoint,
    JumpRestore,
    Springboard,
    Monster,
    ColorActuator { color: Color },
}

impl EntityKind {
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Switch { .. } => "switch",
            EntityKind::Checkpoint => "checkpoint",
            EntityKind::JumpRestore => "jump_restore",
            EntityKind::Springboard => "springboard",
            EntityKind::Monster => "monster",
            EntityKind::ColorActuator { .. } => "color_actuator",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPlacement {
    pub x: i32,
    pub y: i32,
    #[serde(flatten)]
    pub kind: EntityKind,
}

impl EntityPlacement {
    pub fn new(x: i32, y: i32, kind: EntityKind) -> Self {
        Self { x, y, kind }
    }

    pub fn coord(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EntityMapError {
    #[error("more than one entity placed at ({x}, {y})")]
    DuplicatePlacement { x: i32, y: i32 },
}

/// At most one entity per cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityMap {
    by_coord: BTreeMap<CellCoord, EntityKind>,
}

impl EntityMap {
    /// Fails on the first coordinate placed twice.
    pub fn from_placements(placements: &[EntityPlacement]) -> Result<Self, EntityMapError> {
        let mut by_coord = BTreeMap::new();
        for placement in placements {
            if by_coord.insert(placement.coord(), placement.kind).is_some() {
                return Err(EntityMapError::DuplicatePlacement {
                    x: placement.x,
                    y: placement.y,
                });
            }
        }
        Ok(Self { by_coord })
    }

    pub fn get(&self, coord: CellCoord) -> Option<EntityKind> {
        self.by_coord.get(&coord).copied()
    }

    pub fn len(&self) -> usize {
        self.by_coord.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_coord.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, EntityKind)> + '_ {
        self.by_coord.iter().map(|(coord, kind)| (*coord, *kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placements_deserialize_with_type_tag() {
        let raw = r#"[
            {"x": 2, "y": 5, "type": "switch", "color": "orange"},
            {"x": 7, "y": 1, "type": "springboard"}
        ]"#;
        let placements: Vec<EntityPlacement> = serde_json::from_str(raw).expect("placements");
        assert_eq!(
            placements,
            vec![
                EntityPlacement::new(
                    2,
                    5,
                    EntityKind::Switch {
                        color: Color::Orange
                    }
                ),
                EntityPlacement::new(7, 1, EntityKind::Springboard),
            ]
        );
    }

    #[test]
    fn duplicate_placement_is_rejected() {
        let result = EntityMap::from_placements(&[
            EntityPlacement::new(1, 1, EntityKind::Checkpoint),
            EntityPlacement::new(1, 1, EntityKind::Monster),
        ]);
        let err = result.expect_err("duplicate");
        assert_eq!(err, EntityMapError::DuplicatePlacement { x: 1, y: 1 });
        assert_eq!(err.to_string(), "more than one entity placed at (1, 1)");
    }

    #[test]
    fn lookup_by_coordinate() {
        let map = EntityMap::from_placements(&[
            EntityPlacement::new(3, 4, EntityKind::JumpRestore),
            EntityPlacement::new(0, 0, EntityKind::Monster),
        ])
        .expect("entities");
        assert_eq!(map.get(CellCoord::new(3, 4)), Some(EntityKind::JumpRestore));
        assert_eq!(map.get(CellCoord::new(4, 3)), None);
        assert_eq!(map.len(), 2);
        assert_eq!(map.iter().next().map(|(coord, _)| coord), Some(CellCoord::new(0, 0)));
    }
}
