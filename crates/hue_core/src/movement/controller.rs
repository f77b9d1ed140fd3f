use std::collections::BTreeSet;

use tracing::debug;

use crate::checkpoint::CheckpointStore;
use crate::color::ColorState;
use crate::entity::{EntityKind, EntityMap};
use crate::geometry::Vec2;
use crate::grid::{
    cells_along_sweep, CellCoord, CellKind, CollisionEvent, ContactResponse, GridCollider,
    MotionResolution, Pawn, WallSide,
};

use super::config::MovementConfig;
use super::input::InputSnapshot;
use super::state::{MovementState, MAX_JUMPS};

/// Read-only world access for one movement step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub collider: GridCollider<'a>,
    pub entities: &'a EntityMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    Spike { coord: CellCoord },
    Hazard { coord: CellCoord },
    Monster { coord: CellCoord },
    /// A platform switched on while the pawn was inside it.
    PlatformReappeared { coord: CellCoord },
}

impl DeathCause {
    pub fn name(self) -> &'static str {
        match self {
            DeathCause::Spike { .. } => "spike",
            DeathCause::Hazard { .. } => "hazard",
            DeathCause::Monster { .. } => "monster",
            DeathCause::PlatformReappeared { .. } => "platform_reappeared",
        }
    }

    pub fn coord(self) -> CellCoord {
        match self {
            DeathCause::Spike { coord }
            | DeathCause::Hazard { coord }
            | DeathCause::Monster { coord }
            | DeathCause::PlatformReappeared { coord } => coord,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    Jumped,
    Landed,
    EntityTouched { coord: CellCoord, entity: EntityKind },
    EntityReleased { coord: CellCoord, entity: EntityKind },
}

/// Which sides were blocked during a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactSummary {
    pub floor: bool,
    pub ceiling: bool,
    pub wall: Option<WallSide>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub position: Vec2,
    pub velocity: Vec2,
    pub state: MovementState,
    pub jumps_remaining: u8,
    pub died: Option<DeathCause>,
    pub triggered_events: Vec<StepEvent>,
    pub contacts: ContactSummary,
    pub resolution_cap_hit: bool,
}

/// Wall the pawn slid off recently enough to still jump from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct WallGrace {
    side: WallSide,
    remaining: f64,
}

#[derive(Debug, Clone)]
pub struct MovementController {
    config: MovementConfig,
    size: Vec2,
    position: Vec2,
    velocity: Vec2,
    state: MovementState,
    jumps_remaining: u8,
    jump_buffer_remaining: f64,
    forced_jump_speed: Option<f64>,
    last_wall_jump_side: Option<WallSide>,
    wall_grace: Option<WallGrace>,
    touching: BTreeSet<CellCoord>,
}

impl MovementController {
    pub fn new(config: MovementConfig, size: Vec2, position: Vec2) -> Self {
        Self {
            config,
            size,
            position,
            velocity: Vec2::ZERO,
            state: MovementState::Falling,
            jumps_remaining: MAX_JUMPS,
            jump_buffer_remaining: 0.0,
            forced_jump_speed: None,
            last_wall_jump_side: None,
            wall_grace: None,
            touching: BTreeSet::new(),
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn state(&self) -> MovementState {
        self.state
    }

    pub fn jumps_remaining(&self) -> u8 {
        self.jumps_remaining
    }

    pub fn pawn(&self) -> Pawn {
        Pawn::new(self.position, self.size)
    }

    /// Advances the pawn by `dt` seconds. Colors and checkpoints are left to the caller;
    /// see `StepOutcome::triggered_events` and `StepOutcome::died`.
    pub fn step(&mut self, input: &InputSnapshot, dt: f64, ctx: &StepContext<'_>) -> StepOutcome {
        let entry_state = self.state;
        let mut events = Vec::new();

        self.tick_timers(dt);
        let axis = input.horizontal_axis();
        self.apply_horizontal(axis, dt);
        if self.apply_jump(input, axis) {
            events.push(StepEvent::Jumped);
        }
        self.apply_gravity(dt);

        let delta = self.velocity * dt;
        let mut response = PawnResponse::new(self.config.wall_slide_speed * dt, delta.y);
        let resolution = ctx
            .collider
            .resolve_motion(&self.pawn(), delta, &mut response);
        self.position = resolution.position;

        self.apply_contacts(&response.contacts, &mut events);
        let touch_death = self.update_touches(&resolution, ctx.entities, &mut events);
        let died = response.lethal.or(touch_death);

        if !self.state.same_kind(entry_state) {
            debug!(
                from = entry_state.name(),
                to = self.state.name(),
                jumps = self.jumps_remaining,
                "movement_state_changed"
            );
        }

        StepOutcome {
            position: self.position,
            velocity: self.velocity,
            state: self.state,
            jumps_remaining: self.jumps_remaining,
            died,
            triggered_events: events,
            contacts: response.contacts,
            resolution_cap_hit: resolution.cap_hit,
        }
    }

    /// Outcome for a step in which the pawn did not move.
    pub fn idle_outcome(&self, died: Option<DeathCause>) -> StepOutcome {
        StepOutcome {
            position: self.position,
            velocity: self.velocity,
            state: self.state,
            jumps_remaining: self.jumps_remaining,
            died,
            triggered_events: Vec::new(),
            contacts: ContactSummary::default(),
            resolution_cap_hit: false,
        }
    }

    /// Places the pawn at `position` at rest, falling, with both jumps available.
    pub fn respawn(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.state = MovementState::Falling;
        self.jumps_remaining = MAX_JUMPS;
        self.jump_buffer_remaining = 0.0;
        self.forced_jump_speed = None;
        self.last_wall_jump_side = None;
        self.wall_grace = None;
        self.touching.clear();
        debug!(x = position.x, y = position.y, "pawn_respawned");
    }

    /// Rewinds colors to the current checkpoint and respawns there. Returns the
    /// respawn position, or `None` with nothing changed when no checkpoint is saved.
    pub fn restore_from(
        &mut self,
        checkpoints: &CheckpointStore,
        colors: &mut ColorState,
    ) -> Option<Vec2> {
        let position = checkpoints.restore(colors)?;
        self.respawn(position);
        Some(position)
    }

    fn tick_timers(&mut self, dt: f64) {
        match self.state {
            MovementState::HangTime { remaining } => {
                let remaining = remaining - dt;
                self.state = if remaining > 0.0 {
                    MovementState::HangTime { remaining }
                } else {
                    MovementState::Falling
                };
            }
            MovementState::CoyoteWindow { remaining } => {
                let remaining = remaining - dt;
                self.state = if remaining > 0.0 {
                    MovementState::CoyoteWindow { remaining }
                } else {
                    MovementState::Falling
                };
            }
            _ => {}
        }
        self.jump_buffer_remaining = (self.jump_buffer_remaining - dt).max(0.0);
        self.wall_grace = self.wall_grace.and_then(|grace| {
            let remaining = grace.remaining - dt;
            (remaining > 0.0).then_some(WallGrace { remaining, ..grace })
        });
    }

    fn apply_horizontal(&mut self, axis: f64, dt: f64) {
        if axis != 0.0 {
            let max = self.config.max_run_speed;
            self.velocity.x =
                (self.velocity.x + axis * self.config.run_acceleration * dt).clamp(-max, max);
        } else if self.state.is_grounded() {
            self.velocity.x *= self.config.friction_factor(dt);
            if self.velocity.x.abs() < self.config.stop_speed {
                self.velocity.x = 0.0;
            }
        }
    }

    fn apply_jump(&mut self, input: &InputSnapshot, axis: f64) -> bool {
        if let Some(speed) = self.forced_jump_speed.take() {
            self.jumps_remaining = MAX_JUMPS;
            self.launch(speed);
            debug!(speed, "springboard_launch");
            return true;
        }

        // A buffered press is retried only once the pawn is on a floor or a wall.
        let buffered = self.jump_buffer_remaining > 0.0
            && matches!(
                self.state,
                MovementState::Grounded | MovementState::WallSliding { .. }
            );
        if !input.jump_pressed() && !buffered {
            return false;
        }

        let mut wall_push = None;
        if let MovementState::CoyoteWindow { .. } = self.state {
            self.jumps_remaining = MAX_JUMPS;
            if axis != 0.0 {
                self.velocity.x = axis * self.config.max_run_speed;
            }
        } else if let Some(side) = self.jumpable_wall() {
            if self.last_wall_jump_side != Some(side) {
                self.jumps_remaining = MAX_JUMPS;
                self.last_wall_jump_side = Some(side);
            }
            wall_push = Some(-side.sign() * self.config.wall_push_speed);
        }

        if self.jumps_remaining == 0 {
            if input.jump_pressed() {
                self.jump_buffer_remaining = self.config.jump_buffer_seconds;
            }
            return false;
        }
        if let Some(push) = wall_push {
            self.velocity.x = push;
        }
        self.launch(self.config.jump_speed);
        true
    }

    fn jumpable_wall(&self) -> Option<WallSide> {
        match self.state {
            MovementState::WallSliding { side } => Some(side),
            _ => self.wall_grace.map(|grace| grace.side),
        }
    }

    fn launch(&mut self, speed: f64) {
        self.velocity.y = -speed;
        self.state = MovementState::Rising;
        self.jumps_remaining = self.jumps_remaining.saturating_sub(1);
        self.jump_buffer_remaining = 0.0;
        self.wall_grace = None;
    }

    fn apply_gravity(&mut self, dt: f64) {
        match self.state {
            MovementState::Rising => {
                self.velocity.y += self.config.rising_gravity * dt;
                if self.velocity.y >= 0.0 {
                    self.velocity.y = 0.0;
                    self.state = if self.config.hang_seconds > 0.0 {
                        MovementState::HangTime {
                            remaining: self.config.hang_seconds,
                        }
                    } else {
                        MovementState::Falling
                    };
                }
            }
            MovementState::HangTime { .. } => self.velocity.y = 0.0,
            _ => {
                self.velocity.y = (self.velocity.y + self.config.falling_gravity * dt)
                    .min(self.config.terminal_velocity);
                if matches!(self.state, MovementState::WallSliding { .. }) {
                    self.velocity.y = self.velocity.y.min(self.config.wall_slide_speed);
                }
            }
        }
    }

    fn apply_contacts(&mut self, contacts: &ContactSummary, events: &mut Vec<StepEvent>) {
        if contacts.ceiling && self.velocity.y < 0.0 {
            self.velocity.y = 0.0;
        }
        if let Some(side) = contacts.wall {
            if self.velocity.x * side.sign() > 0.0 {
                self.velocity.x = 0.0;
            }
        }

        if contacts.floor {
            if !self.state.is_grounded() {
                events.push(StepEvent::Landed);
            }
            self.state = MovementState::Grounded;
            self.jumps_remaining = MAX_JUMPS;
            self.last_wall_jump_side = None;
            self.wall_grace = None;
            if self.velocity.y > 0.0 {
                self.velocity.y = 0.0;
            }
            return;
        }

        match (contacts.wall, self.state) {
            (
                Some(side),
                MovementState::Falling
                | MovementState::CoyoteWindow { .. }
                | MovementState::WallSliding { .. }
                | MovementState::Grounded,
            ) if self.velocity.y > 0.0 => {
                self.velocity.y = self.velocity.y.min(self.config.wall_slide_speed);
                self.state = MovementState::WallSliding { side };
                self.wall_grace = None;
                return;
            }
            (None, MovementState::WallSliding { side }) => {
                self.state = MovementState::Falling;
                if self.config.coyote_seconds > 0.0 {
                    self.wall_grace = Some(WallGrace {
                        side,
                        remaining: self.config.coyote_seconds,
                    });
                }
            }
            _ => {}
        }

        if self.state.is_grounded() {
            self.jumps_remaining = self.jumps_remaining.min(1);
            self.state = if self.config.coyote_seconds > 0.0 {
                MovementState::CoyoteWindow {
                    remaining: self.config.coyote_seconds,
                }
            } else {
                MovementState::Falling
            };
        }
    }

    fn update_touches(
        &mut self,
        resolution: &MotionResolution,
        entities: &EntityMap,
        events: &mut Vec<StepEvent>,
    ) -> Option<DeathCause> {
        let mut touched = BTreeSet::new();
        let swept = resolution.segments.iter().flat_map(|segment| {
            cells_along_sweep(&Pawn::new(segment.start, self.size), segment.delta)
        });
        for coord in swept.chain(self.pawn().covered_cells()) {
            if entities.get(coord).is_some() {
                touched.insert(coord);
            }
        }

        let mut death = None;
        for coord in &touched {
            if self.touching.contains(coord) {
                continue;
            }
            let Some(entity) = entities.get(*coord) else {
                continue;
            };
            events.push(StepEvent::EntityTouched {
                coord: *coord,
                entity,
            });
            match entity {
                EntityKind::JumpRestore => self.jumps_remaining = MAX_JUMPS,
                EntityKind::Springboard => {
                    self.velocity = Vec2::ZERO;
                    self.forced_jump_speed =
                        Some(self.config.jump_speed * self.config.springboard_multiplier);
                }
                EntityKind::Monster => {
                    death.get_or_insert(DeathCause::Monster { coord: *coord });
                }
                EntityKind::Switch { .. }
                | EntityKind::Checkpoint
                | EntityKind::ColorActuator { .. } => {}
            }
        }
        for coord in self.touching.difference(&touched) {
            if let Some(entity) = entities.get(*coord) {
                events.push(StepEvent::EntityReleased {
                    coord: *coord,
                    entity,
                });
            }
        }
        self.touching = touched;
        death
    }
}

/// Contact handling inside the resolution loop: clips blocked axes, caps the fall
/// along a wall to the slide speed and stops everything on a lethal cell.
struct PawnResponse {
    slide_step: f64,
    step_dy: f64,
    contacts: ContactSummary,
    lethal: Option<DeathCause>,
}

impl PawnResponse {
    fn new(slide_step: f64, step_dy: f64) -> Self {
        Self {
            slide_step,
            step_dy,
            contacts: ContactSummary::default(),
            lethal: None,
        }
    }
}

impl ContactResponse for PawnResponse {
    fn respond(&mut self, event: &CollisionEvent, remaining: Vec2) -> Vec2 {
        self.contacts.floor |= event.hit_floor();
        self.contacts.ceiling |= event.hit_ceiling();
        if let Some(side) = event.wall() {
            self.contacts.wall = Some(side);
        }
        if let Some(contact) = event.lethal_contact() {
            let coord = contact.coord;
            self.lethal = Some(match contact.cell_kind {
                CellKind::Spike => DeathCause::Spike { coord },
                _ => DeathCause::Hazard { coord },
            });
            return Vec2::ZERO;
        }

        let mut next = event.clip(remaining);
        if event.wall().is_some() && next.y > 0.0 && self.step_dy > 0.0 {
            next.y = next.y.min(self.slide_step * next.y / self.step_dy);
        }
        next
    }
}
