mod description;
mod session;

pub use description::{CellRecord, LevelDescription, SessionConfig};
pub use session::{LevelBuildError, LevelSession, SessionStep};
