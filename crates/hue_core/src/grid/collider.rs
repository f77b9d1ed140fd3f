use tracing::warn;

use crate::geometry::{previous_time, span_overlaps_cell, Vec2};

use super::cell::{CellCoord, CellKind, Pawn};
use super::solidity::ActiveSolidityView;

/// Upper bound on sweep/clip passes for one displacement.
pub const MAX_RESOLUTION_PASSES: usize = 8;

/// Side of the pawn that met a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallSide {
    Left,
    Right,
}

impl WallSide {
    pub fn sign(self) -> f64 {
        match self {
            WallSide::Left => -1.0,
            WallSide::Right => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WallSide::Left => "left",
            WallSide::Right => "right",
        }
    }

    fn facing(dx: f64) -> Self {
        if dx > 0.0 {
            WallSide::Right
        } else {
            WallSide::Left
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Wall(WallSide),
    Floor,
    Ceiling,
    Corner,
}

impl ContactKind {
    fn vertical(dy: f64) -> Self {
        if dy < 0.0 {
            ContactKind::Ceiling
        } else {
            ContactKind::Floor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub coord: CellCoord,
    pub cell_kind: CellKind,
    pub kind: ContactKind,
}

/// First contact along a sweep.
///
/// `t` is the earliest representable fraction of the displacement at which the
/// box overlaps a solid cell; `previous_t` is the representable value just below
/// it, where the box is still clear.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    pub t: f64,
    pub previous_t: f64,
    pub pos_at_t: Vec2,
    pub contacts: Vec<Contact>,
    /// Every contact was a pure corner touch and has been resolved as vertical.
    pub corner_only: bool,
}

impl CollisionEvent {
    /// Floor or ceiling wins over a wall at the same time; a corner-only event
    /// reports its vertical kind.
    pub fn classification(&self) -> ContactKind {
        if self.hit_floor() {
            ContactKind::Floor
        } else if self.hit_ceiling() {
            ContactKind::Ceiling
        } else {
            self.wall().map_or(ContactKind::Corner, ContactKind::Wall)
        }
    }

    pub fn wall(&self) -> Option<WallSide> {
        self.contacts.iter().find_map(|contact| match contact.kind {
            ContactKind::Wall(side) => Some(side),
            _ => None,
        })
    }

    pub fn hit_floor(&self) -> bool {
        self.contacts
            .iter()
            .any(|contact| contact.kind == ContactKind::Floor)
    }

    pub fn hit_ceiling(&self) -> bool {
        self.contacts
            .iter()
            .any(|contact| contact.kind == ContactKind::Ceiling)
    }

    pub fn lethal_contact(&self) -> Option<&Contact> {
        self.contacts
            .iter()
            .find(|contact| contact.cell_kind.is_lethal())
    }

    /// Zeroes the displacement components blocked by this event.
    pub fn clip(&self, remaining: Vec2) -> Vec2 {
        let mut clipped = remaining;
        if self.wall().is_some() {
            clipped.x = 0.0;
        }
        if self.hit_floor() || self.hit_ceiling() {
            clipped.y = 0.0;
        }
        clipped
    }
}

/// Decides how much displacement survives a contact.
pub trait ContactResponse {
    /// `remaining` is the unused part of the displacement, already scaled by
    /// `1 - previous_t`.
    fn respond(&mut self, event: &CollisionEvent, remaining: Vec2) -> Vec2;
}

/// Stops motion along every blocked axis and keeps sliding along the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopOnContact;

impl ContactResponse for StopOnContact {
    fn respond(&mut self, event: &CollisionEvent, remaining: Vec2) -> Vec2 {
        event.clip(remaining)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSegment {
    pub start: Vec2,
    pub delta: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionResolution {
    pub position: Vec2,
    pub events: Vec<CollisionEvent>,
    /// Displacements actually travelled, in order.
    pub segments: Vec<MotionSegment>,
    pub passes: usize,
    pub cap_hit: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct GridCollider<'a> {
    view: ActiveSolidityView<'a>,
}

impl<'a> GridCollider<'a> {
    pub fn new(view: ActiveSolidityView<'a>) -> Self {
        Self { view }
    }

    pub fn view(&self) -> ActiveSolidityView<'a> {
        self.view
    }

    /// Solid cells overlapping the pawn right now, row by row. Directional cells
    /// only block sweeps and are never reported here.
    pub fn collide_pawn(&self, pawn: &Pawn) -> Vec<CellCoord> {
        pawn.covered_cells()
            .filter(|coord| {
                self.view
                    .solid_cell(*coord)
                    .is_some_and(|cell| !cell.kind.is_directional())
            })
            .collect()
    }

    pub fn collide_moving_pawn(&self, pawn: &Pawn, delta: Vec2) -> Option<CollisionEvent> {
        if delta.is_zero() {
            return None;
        }

        let mut earliest: Option<f64> = None;
        let mut contacts = Vec::<Contact>::new();
        for coord in pawn.swept_cells(delta) {
            let Some(cell) = self.view.solid_cell(coord) else {
                continue;
            };
            if pawn.overlaps_cell(coord) {
                debug_assert!(
                    cell.kind.is_directional(),
                    "sweep starts inside solid cell ({}, {})",
                    coord.x,
                    coord.y
                );
                continue;
            }
            if !blocks_sweep(cell.kind, pawn, delta, coord) {
                continue;
            }
            let Some(t) = contact_time(pawn, delta, coord) else {
                continue;
            };
            if earliest.is_some_and(|best| t > best) {
                continue;
            }

            let probe = pawn.at(pawn.pos + delta * previous_time(t));
            let kind = classify(&probe, coord, delta);
            if cell.kind == CellKind::PassThrough && matches!(kind, ContactKind::Wall(_)) {
                continue;
            }
            if earliest.is_some_and(|best| t < best) {
                contacts.clear();
            }
            earliest = Some(t);
            contacts.push(Contact {
                coord,
                cell_kind: cell.kind,
                kind,
            });
        }

        let t = earliest?;
        let corner_only = contacts
            .iter()
            .all(|contact| contact.kind == ContactKind::Corner);
        if corner_only {
            let vertical = ContactKind::vertical(delta.y);
            for contact in &mut contacts {
                contact.kind = vertical;
            }
        } else {
            contacts.retain(|contact| contact.kind != ContactKind::Corner);
        }

        Some(CollisionEvent {
            t,
            previous_t: previous_time(t),
            pos_at_t: pawn.pos + delta * t,
            contacts,
            corner_only,
        })
    }

    /// Sweeps, stops just short of each contact and lets `response` decide what is
    /// left, until the displacement is used up or `MAX_RESOLUTION_PASSES` is reached.
    pub fn resolve_motion<R: ContactResponse>(
        &self,
        pawn: &Pawn,
        delta: Vec2,
        response: &mut R,
    ) -> MotionResolution {
        let mut current = *pawn;
        let mut remaining = delta;
        let mut events = Vec::new();
        let mut segments = Vec::new();
        let mut passes = 0;

        while passes < MAX_RESOLUTION_PASSES && !remaining.is_zero() {
            passes += 1;
            match self.collide_moving_pawn(&current, remaining) {
                None => {
                    segments.push(MotionSegment {
                        start: current.pos,
                        delta: remaining,
                    });
                    current.pos = current.pos + remaining;
                    remaining = Vec2::ZERO;
                }
                Some(event) => {
                    let travelled = remaining * event.previous_t;
                    segments.push(MotionSegment {
                        start: current.pos,
                        delta: travelled,
                    });
                    current.pos = current.pos + travelled;
                    remaining = response.respond(&event, remaining * (1.0 - event.previous_t));
                    events.push(event);
                }
            }
        }

        let cap_hit = !remaining.is_zero();
        if cap_hit {
            warn!(
                passes,
                residual_x = remaining.x,
                residual_y = remaining.y,
                "resolution_pass_cap_hit"
            );
        }

        MotionResolution {
            position: current.pos,
            events,
            segments,
            passes,
            cap_hit,
        }
    }
}

/// Every cell coordinate the box touches while moving along `delta`, whether or
/// not the grid has anything there.
pub fn cells_along_sweep(pawn: &Pawn, delta: Vec2) -> Vec<CellCoord> {
    pawn.swept_cells(delta)
        .filter(|coord| pawn.overlaps_cell(*coord) || contact_time(pawn, delta, *coord).is_some())
        .collect()
}

fn blocks_sweep(kind: CellKind, pawn: &Pawn, delta: Vec2, coord: CellCoord) -> bool {
    match kind {
        CellKind::PassThrough => delta.y > 0.0 && pawn.is_above_row(coord.y),
        CellKind::Spike => delta.y >= 0.0,
        CellKind::Plain | CellKind::Hazard | CellKind::Other => true,
    }
}

fn classify(probe: &Pawn, coord: CellCoord, delta: Vec2) -> ContactKind {
    let overlaps_x = probe.overlaps_cell_x(coord);
    let overlaps_y = probe.overlaps_cell_y(coord);
    debug_assert!(
        !(overlaps_x && overlaps_y),
        "pawn overlaps ({}, {}) before contact",
        coord.x,
        coord.y
    );
    match (overlaps_x, overlaps_y) {
        (true, _) => ContactKind::vertical(delta.y),
        (false, true) => ContactKind::Wall(WallSide::facing(delta.x)),
        (false, false) => ContactKind::Corner,
    }
}

/// Earliest `t` in `[0, 1]` at which the box at `pos + delta * t` overlaps `coord`.
fn contact_time(pawn: &Pawn, delta: Vec2, coord: CellCoord) -> Option<f64> {
    let tx = axis_entry(pawn.pos.x, pawn.size.x, delta.x, coord.x as f64)?;
    let ty = axis_entry(pawn.pos.y, pawn.size.y, delta.y, coord.y as f64)?;
    let t = tx.max(ty);
    if t > 1.0 {
        return None;
    }
    pawn.at(pawn.pos + delta * t)
        .overlaps_cell(coord)
        .then_some(t)
}

/// Earliest non-negative `t` at which the span `[start, start + extent)` moved by
/// `d * t` overlaps `[cell, cell + 1)`.
///
/// The analytic slab time only brackets the answer; the exact value is found by
/// bisecting the bit patterns of non-negative floats, which order the same way as
/// their values, so the result is the first representable time that overlaps.
fn axis_entry(start: f64, extent: f64, d: f64, cell: f64) -> Option<f64> {
    let overlaps_at = |t: f64| span_overlaps_cell(start + d * t, extent, cell);
    if overlaps_at(0.0) {
        return Some(0.0);
    }
    if d == 0.0 {
        return None;
    }

    let gap = if d > 0.0 {
        cell - extent - start
    } else {
        cell + 1.0 - start
    };
    let estimate = gap / d;
    if !(0.0..=2.0).contains(&estimate) {
        return None;
    }
    let inside = estimate + (1.0 + extent) / (2.0 * d.abs());
    if !overlaps_at(inside) {
        return None;
    }

    let mut clear_bits = 0.0f64.to_bits();
    let mut overlap_bits = inside.to_bits();
    while overlap_bits - clear_bits > 1 {
        let mid = clear_bits + (overlap_bits - clear_bits) / 2;
        if overlaps_at(f64::from_bits(mid)) {
            overlap_bits = mid;
        } else {
            clear_bits = mid;
        }
    }
    Some(f64::from_bits(overlap_bits))
}
