use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::geometry::{cells_under_span, span_overlaps_cell, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Top-left corner of the cell in grid space.
    pub fn origin(self) -> Vec2 {
        Vec2::new(self.x as f64, self.y as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    #[default]
    Plain,
    /// Blocks only a pawn landing on it from above.
    PassThrough,
    /// Lethal; passable while moving upward.
    Spike,
    /// Lethal from every direction.
    Hazard,
    Other,
}

impl CellKind {
    /// Directional cells only block some sweeps and never block a pawn at rest.
    pub fn is_directional(self) -> bool {
        matches!(self, CellKind::PassThrough | CellKind::Spike)
    }

    pub fn is_lethal(self) -> bool {
        matches!(self, CellKind::Spike | CellKind::Hazard)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub solid: bool,
    pub color: Option<Color>,
    pub kind: CellKind,
}

impl Cell {
    pub const fn block() -> Self {
        Self {
            solid: true,
            color: None,
            kind: CellKind::Plain,
        }
    }

    pub const fn colored(color: Color) -> Self {
        Self {
            solid: false,
            color: Some(color),
            kind: CellKind::Plain,
        }
    }

    pub const fn with_kind(mut self, kind: CellKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Axis-aligned box the controller moves through the grid. `pos` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pawn {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Pawn {
    pub const fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    pub fn at(self, pos: Vec2) -> Self {
        Self { pos, ..self }
    }

    /// Whether the bottom edge is at or above row `y`.
    pub fn is_above_row(&self, y: i32) -> bool {
        self.pos.y <= f64::from(y) - self.size.y
    }

    pub fn overlaps_cell_x(&self, cell: CellCoord) -> bool {
        span_overlaps_cell(self.pos.x, self.size.x, f64::from(cell.x))
    }

    pub fn overlaps_cell_y(&self, cell: CellCoord) -> bool {
        span_overlaps_cell(self.pos.y, self.size.y, f64::from(cell.y))
    }

    pub fn overlaps_cell(&self, cell: CellCoord) -> bool {
        self.overlaps_cell_x(cell) && self.overlaps_cell_y(cell)
    }

    /// Every cell coordinate the box overlaps, row by row.
    pub fn covered_cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = cells_under_span(self.pos.x, self.size.x);
        cells_under_span(self.pos.y, self.size.y).flat_map(move |y| {
            columns
                .clone()
                .map(move |x| CellCoord::new(x, y))
        })
    }

    /// Cells covered by the start box, the end box, or anything between them.
    pub(crate) fn swept_cells(&self, delta: Vec2) -> impl Iterator<Item = CellCoord> {
        let end = self.pos + delta;
        let columns = span_union(
            cells_under_span(self.pos.x, self.size.x),
            cells_under_span(end.x, self.size.x),
        );
        let rows = span_union(
            cells_under_span(self.pos.y, self.size.y),
            cells_under_span(end.y, self.size.y),
        );
        rows.flat_map(move |y| {
            columns
                .clone()
                .map(move |x| CellCoord::new(x, y))
        })
    }
}

fn span_union(a: RangeInclusive<i32>, b: RangeInclusive<i32>) -> RangeInclusive<i32> {
    (*a.start()).min(*b.start())..=(*a.end()).max(*b.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_pawn(x: f64, y: f64) -> Pawn {
        Pawn::new(Vec2::new(x, y), Vec2::new(1.0, 1.0))
    }

    #[test]
    fn aligned_pawn_covers_exactly_one_cell() {
        let cells = unit_pawn(3.0, 4.0).covered_cells().collect::<Vec<_>>();
        assert_eq!(cells, vec![CellCoord::new(3, 4)]);
    }

    #[test]
    fn offset_pawn_covers_four_cells() {
        let cells = unit_pawn(0.5, 0.5).covered_cells().collect::<Vec<_>>();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(1, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 1),
            ]
        );
    }

    #[test]
    fn touching_edges_are_not_overlap() {
        let pawn = unit_pawn(1.0, 0.0);
        assert!(!pawn.overlaps_cell(CellCoord::new(0, 0)));
        assert!(!pawn.overlaps_cell(CellCoord::new(1, 1)));
        assert!(pawn.overlaps_cell(CellCoord::new(1, 0)));
    }

    #[test]
    fn swept_cells_cover_start_and_end_boxes() {
        let pawn = unit_pawn(0.0, 0.0);
        let cells = pawn.swept_cells(Vec2::new(2.0, -1.0)).collect::<Vec<_>>();
        assert_eq!(cells.len(), 6);
        assert!(cells.contains(&CellCoord::new(0, 0)));
        assert!(cells.contains(&CellCoord::new(2, -1)));
    }

    #[test]
    fn box_one_ulp_into_a_row_covers_it() {
        let pawn = unit_pawn(0.0, f64::from_bits(1.0f64.to_bits() + 1));
        assert!(pawn.overlaps_cell(CellCoord::new(0, 2)));
        assert!(!pawn.is_above_row(2));
        assert!(unit_pawn(0.0, 1.0).is_above_row(2));
        let cells = pawn.covered_cells().collect::<Vec<_>>();
        assert_eq!(cells, vec![CellCoord::new(0, 1), CellCoord::new(0, 2)]);
    }

    #[test]
    fn directional_kinds_are_classified() {
        assert!(CellKind::PassThrough.is_directional());
        assert!(CellKind::Spike.is_directional());
        assert!(!CellKind::Hazard.is_directional());
        assert!(CellKind::Hazard.is_lethal());
        assert!(!CellKind::Plain.is_lethal());
    }
}
