use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cell::{Cell, CellCoord, CellKind};

/// Grid bounds convention:
/// - `origin` is the coordinate of the top-left cell.
/// - Cell `(x, y)` is in bounds when `origin.x <= x < origin.x + width`, likewise for y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub origin: CellCoord,
    pub width: u32,
    pub height: u32,
}

impl GridBounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            origin: CellCoord::new(0, 0),
            width,
            height,
        }
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        self.index_of(coord).is_some()
    }

    fn index_of(&self, coord: CellCoord) -> Option<usize> {
        let dx = i64::from(coord.x) - i64::from(self.origin.x);
        let dy = i64::from(coord.y) - i64::from(self.origin.y);
        if dx < 0 || dy < 0 || dx >= i64::from(self.width) || dy >= i64::from(self.height) {
            return None;
        }
        Some(dy as usize * self.width as usize + dx as usize)
    }

    /// Same bounds grown by one cell on every side.
    fn expanded(&self) -> Self {
        Self {
            origin: CellCoord::new(self.origin.x - 1, self.origin.y - 1),
            width: self.width + 2,
            height: self.height + 2,
        }
    }

    fn max_x(&self) -> i32 {
        self.origin.x + self.width as i32 - 1
    }

    fn max_y(&self) -> i32 {
        self.origin.y + self.height as i32 - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileGridError {
    #[error("grid bounds must be non-empty, got {width}x{height}")]
    EmptyBounds { width: u32, height: u32 },
    #[error("cell ({x}, {y}) lies outside the grid bounds")]
    OutOfBounds { x: i32, y: i32 },
    #[error("cell ({x}, {y}) is defined more than once")]
    DuplicateCell { x: i32, y: i32 },
}

/// Immutable cell storage for one level. Missing cells are empty space.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    bounds: GridBounds,
    cells: Vec<Option<Cell>>,
    populated: usize,
}

impl TileGrid {
    pub fn new(
        bounds: GridBounds,
        records: impl IntoIterator<Item = (CellCoord, Cell)>,
    ) -> Result<Self, TileGridError> {
        if bounds.width == 0 || bounds.height == 0 {
            return Err(TileGridError::EmptyBounds {
                width: bounds.width,
                height: bounds.height,
            });
        }
        let mut grid = Self {
            bounds,
            cells: vec![None; bounds.width as usize * bounds.height as usize],
            populated: 0,
        };
        for (coord, cell) in records {
            grid.insert(coord, cell)?;
        }
        Ok(grid)
    }

    /// Returns a grid one cell larger on every side, with plain blocks along the
    /// top, left and right edges and a hazard row underneath.
    pub fn enclose(&self) -> Self {
        let outer = self.bounds.expanded();
        let mut cells = vec![None; outer.width as usize * outer.height as usize];
        for (coord, cell) in self.iter() {
            if let Some(index) = outer.index_of(coord) {
                cells[index] = Some(*cell);
            }
        }

        let mut populated = self.populated;
        let mut place = |coord: CellCoord, cell: Cell| {
            if let Some(index) = outer.index_of(coord) {
                if cells[index].is_none() {
                    populated += 1;
                }
                cells[index] = Some(cell);
            }
        };
        for x in outer.origin.x..=outer.max_x() {
            place(CellCoord::new(x, outer.origin.y), Cell::block());
            place(
                CellCoord::new(x, outer.max_y()),
                Cell::block().with_kind(CellKind::Hazard),
            );
        }
        for y in (outer.origin.y + 1)..outer.max_y() {
            place(CellCoord::new(outer.origin.x, y), Cell::block());
            place(CellCoord::new(outer.max_x(), y), Cell::block());
        }

        Self {
            bounds: outer,
            cells,
            populated,
        }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn cell_count(&self) -> usize {
        self.populated
    }

    pub fn get(&self, coord: CellCoord) -> Option<&Cell> {
        self.bounds
            .index_of(coord)
            .and_then(|index| self.cells.get(index))
            .and_then(Option::as_ref)
    }

    /// Populated cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &Cell)> + '_ {
        let bounds = self.bounds;
        self.cells.iter().enumerate().filter_map(move |(index, cell)| {
            let cell = cell.as_ref()?;
            let width = bounds.width as usize;
            let coord = CellCoord::new(
                bounds.origin.x + (index % width) as i32,
                bounds.origin.y + (index / width) as i32,
            );
            Some((coord, cell))
        })
    }

    fn insert(&mut self, coord: CellCoord, cell: Cell) -> Result<(), TileGridError> {
        let index = self
            .bounds
            .index_of(coord)
            .ok_or(TileGridError::OutOfBounds {
                x: coord.x,
                y: coord.y,
            })?;
        let slot = &mut self.cells[index];
        if slot.is_some() {
            return Err(TileGridError::DuplicateCell {
                x: coord.x,
                y: coord.y,
            });
        }
        *slot = Some(cell);
        self.populated += 1;
        Ok(())
    }
}
