mod cell;
mod collider;
mod solidity;
mod tile_grid;

pub use cell::{Cell, CellCoord, CellKind, Pawn};
pub use collider::{
    cells_along_sweep, CollisionEvent, Contact, ContactKind, ContactResponse, GridCollider,
    MotionResolution, MotionSegment, StopOnContact, WallSide, MAX_RESOLUTION_PASSES,
};
pub use solidity::ActiveSolidityView;
pub use tile_grid::{GridBounds, TileGrid, TileGridError};
