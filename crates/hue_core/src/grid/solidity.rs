use crate::color::ColorState;

use super::cell::{Cell, CellCoord};
use super::tile_grid::TileGrid;

/// Solidity of the grid under the current color state. Borrows both, so a view
/// always reflects the toggles applied before it was built.
#[derive(Debug, Clone, Copy)]
pub struct ActiveSolidityView<'a> {
    grid: &'a TileGrid,
    colors: &'a ColorState,
}

impl<'a> ActiveSolidityView<'a> {
    pub fn new(grid: &'a TileGrid, colors: &'a ColorState) -> Self {
        Self { grid, colors }
    }

    pub fn is_solid(&self, coord: CellCoord) -> bool {
        self.solid_cell(coord).is_some()
    }

    pub fn solid_cell(&self, coord: CellCoord) -> Option<&'a Cell> {
        let cell = self.grid.get(coord)?;
        let active = cell.solid
            || cell
                .color
                .is_some_and(|color| self.colors.is_enabled(color));
        active.then_some(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::grid::tile_grid::GridBounds;

    fn sample_grid() -> TileGrid {
        TileGrid::new(
            GridBounds::new(3, 1),
            [
                (CellCoord::new(0, 0), Cell::block()),
                (CellCoord::new(1, 0), Cell::colored(Color::Yellow)),
                (CellCoord::new(2, 0), Cell::colored(Color::Blue)),
            ],
        )
        .expect("grid")
    }

    #[test]
    fn plain_blocks_are_always_solid() {
        let grid = sample_grid();
        let mut colors = ColorState::default();
        colors.toggle(Color::Yellow);
        let view = ActiveSolidityView::new(&grid, &colors);
        assert!(view.is_solid(CellCoord::new(0, 0)));
    }

    #[test]
    fn colored_cells_follow_color_state() {
        let grid = sample_grid();
        let mut colors = ColorState::default();
        assert!(ActiveSolidityView::new(&grid, &colors).is_solid(CellCoord::new(1, 0)));

        colors.toggle(Color::Green);
        let view = ActiveSolidityView::new(&grid, &colors);
        assert!(!view.is_solid(CellCoord::new(1, 0)));
        assert!(!view.is_solid(CellCoord::new(2, 0)));
    }

    #[test]
    fn missing_cells_are_empty() {
        let grid = sample_grid();
        let colors = ColorState::default();
        let view = ActiveSolidityView::new(&grid, &colors);
        assert!(!view.is_solid(CellCoord::new(0, 1)));
        assert!(!view.is_solid(CellCoord::new(-5, 0)));
    }
}
