use thiserror::Error;
use tracing::{debug, info};

use crate::checkpoint::CheckpointStore;
use crate::color::{Color, ColorMask, ColorState};
use crate::entity::{EntityKind, EntityMap, EntityMapError};
use crate::geometry::Vec2;
use crate::grid::{ActiveSolidityView, GridCollider, TileGrid, TileGridError};
use crate::movement::{
    DeathCause, InputSnapshot, MovementConfigError, MovementController, StepContext, StepEvent,
    StepOutcome,
};

use super::description::{LevelDescription, SessionConfig};

#[derive(Debug, Error)]
pub enum LevelBuildError {
    #[error("invalid level grid: {0}")]
    Grid(#[from] TileGridError),
    #[error("invalid movement config: {0}")]
    Movement(#[from] MovementConfigError),
    #[error("invalid entity placement: {0}")]
    Entities(#[from] EntityMapError),
    #[error("spawn ({x}, {y}) lies outside the level bounds")]
    SpawnOutOfBounds { x: i32, y: i32 },
    #[error("spawn ({x}, {y}) overlaps a solid cell")]
    SpawnBlocked { x: i32, y: i32 },
    #[error("unstable revert time must be finite and positive, got {0}")]
    InvalidRevertSeconds(f64),
    #[error("pawn size must be positive and at most one cell, got {width}x{height}")]
    InvalidPawnSize { width: f64, height: f64 },
}

/// What happened during one `LevelSession::step`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStep {
    pub index: u64,
    pub outcome: StepOutcome,
    pub reverted: ColorMask,
    pub toggled: ColorMask,
    pub respawned_at: Option<Vec2>,
}

impl SessionStep {
    pub fn death(&self) -> Option<DeathCause> {
        self.outcome.died
    }
}

/// Owns one playthrough of a level: grid, colors, checkpoints and the pawn.
#[derive(Debug, Clone)]
pub struct LevelSession {
    grid: TileGrid,
    entities: EntityMap,
    colors: ColorState,
    checkpoints: CheckpointStore,
    controller: MovementController,
    unlocked: ColorMask,
    config: SessionConfig,
    spawn: Vec2,
    steps: u64,
    deaths: u32,
}

impl LevelSession {
    pub fn new(level: &LevelDescription, config: SessionConfig) -> Result<Self, LevelBuildError> {
        config.movement.validate()?;
        if !(config.unstable_revert_seconds.is_finite() && config.unstable_revert_seconds > 0.0) {
            return Err(LevelBuildError::InvalidRevertSeconds(
                config.unstable_revert_seconds,
            ));
        }
        let size = config.pawn_size;
        if !(size.x > 0.0 && size.x <= 1.0 && size.y > 0.0 && size.y <= 1.0) {
            return Err(LevelBuildError::InvalidPawnSize {
                width: size.x,
                height: size.y,
            });
        }

        let grid = TileGrid::new(
            level.bounds,
            level
                .cells
                .iter()
                .map(|record| (record.coord(), record.to_cell())),
        )?;
        let grid = if config.enclose { grid.enclose() } else { grid };
        if !level.bounds.contains(level.spawn) {
            return Err(LevelBuildError::SpawnOutOfBounds {
                x: level.spawn.x,
                y: level.spawn.y,
            });
        }
        let entities = EntityMap::from_placements(&level.entities)?;

        let spawn = level.spawn.origin();
        let colors = ColorState::new(config.unstable_revert_seconds);
        let controller = MovementController::new(config.movement, size, spawn);
        let blocked = GridCollider::new(ActiveSolidityView::new(&grid, &colors))
            .collide_pawn(&controller.pawn());
        if !blocked.is_empty() {
            return Err(LevelBuildError::SpawnBlocked {
                x: level.spawn.x,
                y: level.spawn.y,
            });
        }

        let mut checkpoints = CheckpointStore::new();
        checkpoints.save(spawn, &colors, None);
        info!(
            cells = grid.cell_count(),
            entities = entities.len(),
            spawn_x = level.spawn.x,
            spawn_y = level.spawn.y,
            enclosed = config.enclose,
            "level_session_started"
        );

        Ok(Self {
            grid,
            entities,
            colors,
            checkpoints,
            controller,
            unlocked: ColorMask::EMPTY,
            config,
            spawn,
            steps: 0,
            deaths: 0,
        })
    }

    /// Back to the level's initial state. The spawn becomes the current checkpoint again.
    pub fn restart(&mut self) {
        self.colors = ColorState::new(self.config.unstable_revert_seconds);
        self.checkpoints.reset();
        self.checkpoints.save(self.spawn, &self.colors, None);
        self.controller.respawn(self.spawn);
        self.unlocked = ColorMask::EMPTY;
        self.steps = 0;
        self.deaths = 0;
        info!("level_session_restarted");
    }

    /// Runs one fixed step: revert timers, input toggles, the reappearing-platform
    /// check, movement, touch effects, then respawn on death.
    pub fn step(&mut self, input: &InputSnapshot, dt: f64) -> SessionStep {
        self.steps += 1;

        let reverted = self.colors.tick(dt);
        let mut toggled = ColorMask::EMPTY;
        for color in input.toggles_pressed().iter() {
            if self.unlocked.contains(color) {
                toggled = toggled.union(self.colors.toggle(color));
            } else {
                debug!(color = color.name(), "color_toggle_locked");
            }
        }

        let blocked = self.collider().collide_pawn(&self.controller.pawn());
        let outcome = match blocked.first() {
            Some(coord) => self
                .controller
                .idle_outcome(Some(DeathCause::PlatformReappeared { coord: *coord })),
            None => {
                let ctx = StepContext {
                    collider: GridCollider::new(ActiveSolidityView::new(&self.grid, &self.colors)),
                    entities: &self.entities,
                };
                self.controller.step(input, dt, &ctx)
            }
        };

        toggled = toggled.union(self.apply_touch_effects(&outcome.triggered_events));

        let mut respawned_at = None;
        if let Some(cause) = outcome.died {
            self.deaths += 1;
            let position = match self
                .controller
                .restore_from(&self.checkpoints, &mut self.colors)
            {
                Some(position) => position,
                None => {
                    self.controller.respawn(self.spawn);
                    self.spawn
                }
            };
            respawned_at = Some(position);
            info!(
                cause = cause.name(),
                cell_x = cause.coord().x,
                cell_y = cause.coord().y,
                deaths = self.deaths,
                step = self.steps,
                "pawn_died"
            );
        }

        SessionStep {
            index: self.steps,
            outcome,
            reverted,
            toggled,
            respawned_at,
        }
    }

    /// Allows `color` to be toggled from input, as collecting its actuator does.
    pub fn unlock_color(&mut self, color: Color) {
        self.unlocked.insert(color);
    }

    pub fn collider(&self) -> GridCollider<'_> {
        GridCollider::new(ActiveSolidityView::new(&self.grid, &self.colors))
    }

    pub fn colors(&self) -> &ColorState {
        &self.colors
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    pub fn controller(&self) -> &MovementController {
        &self.controller
    }

    pub fn unlocked_colors(&self) -> ColorMask {
        self.unlocked
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    fn apply_touch_effects(&mut self, events: &[StepEvent]) -> ColorMask {
        let mut toggled = ColorMask::EMPTY;
        for event in events {
            let StepEvent::EntityTouched { coord, entity } = *event else {
                continue;
            };
            match entity {
                EntityKind::Switch { color } => {
                    toggled = toggled.union(self.colors.toggle(color));
                }
                EntityKind::Checkpoint => {
                    self.checkpoints
                        .save(coord.origin(), &self.colors, Some(coord));
                }
                EntityKind::ColorActuator { color } => {
                    if !self.unlocked.contains(color) {
                        self.unlocked.insert(color);
                        info!(color = color.name(), "color_unlocked");
                    }
                }
                EntityKind::JumpRestore | EntityKind::Springboard | EntityKind::Monster => {}
            }
        }
        toggled
    }
}
