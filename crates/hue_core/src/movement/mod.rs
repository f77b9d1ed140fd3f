mod config;
mod controller;
mod input;
mod state;

pub use config::{MovementConfig, MovementConfigError, REFERENCE_TICK_HZ};
pub use controller::{
    ContactSummary, DeathCause, MovementController, StepContext, StepEvent, StepOutcome,
};
pub use input::{InputAction, InputSnapshot};
pub use state::{MovementState, MAX_JUMPS};
