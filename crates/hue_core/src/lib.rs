pub mod checkpoint;
pub mod color;
pub mod entity;
pub mod geometry;
pub mod grid;
pub mod level;
pub mod movement;
pub mod replay;

pub use checkpoint::{Checkpoint, CheckpointStore};
pub use color::{Color, ColorMask, ColorSnapshot, ColorState, DEFAULT_UNSTABLE_REVERT_SECONDS};
pub use entity::{EntityKind, EntityMap, EntityMapError, EntityPlacement};
pub use geometry::Vec2;
pub use grid::{
    cells_along_sweep, ActiveSolidityView, Cell, CellCoord, CellKind, CollisionEvent, Contact,
    ContactKind, ContactResponse, GridBounds, GridCollider, MotionResolution, MotionSegment, Pawn,
    StopOnContact, TileGrid, TileGridError, WallSide, MAX_RESOLUTION_PASSES,
};
pub use level::{
    CellRecord, LevelBuildError, LevelDescription, LevelSession, SessionConfig, SessionStep,
};
pub use movement::{
    ContactSummary, DeathCause, InputAction, InputSnapshot, MovementConfig, MovementConfigError,
    MovementController, MovementState, StepContext, StepEvent, StepOutcome, MAX_JUMPS,
    REFERENCE_TICK_HZ,
};
pub use replay::TrajectoryDigest;
