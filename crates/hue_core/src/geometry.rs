use std::ops::{Add, Mul, RangeInclusive, Sub};

use serde::{Deserialize, Serialize};

/// Grid-space vector. One unit is one cell; y grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2 {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// Half-open overlap of `[start, start + extent)` with the unit cell `[cell, cell + 1)`.
///
/// The far edge is tested as `cell - extent < start`. The rounded sum
/// `start + extent` can land exactly on `cell` while the box is still inside it.
pub(crate) fn span_overlaps_cell(start: f64, extent: f64, cell: f64) -> bool {
    start < cell + 1.0 && cell - extent < start
}

/// Unit cells overlapped by `[start, start + extent)`, in the same terms as
/// [`span_overlaps_cell`].
pub(crate) fn cells_under_span(start: f64, extent: f64) -> RangeInclusive<i32> {
    let first = start.floor() as i32;
    let mut last = ((start + extent).ceil() as i32).saturating_sub(1).max(first);
    while span_overlaps_cell(start, extent, f64::from(last) + 1.0) {
        last += 1;
    }
    while last > first && !span_overlaps_cell(start, extent, f64::from(last)) {
        last -= 1;
    }
    first..=last
}

/// Greatest representable `f64` strictly below `t`.
pub(crate) fn previous_time(t: f64) -> f64 {
    if t.is_nan() || t == f64::NEG_INFINITY {
        return t;
    }
    if t == 0.0 {
        return -f64::from_bits(1);
    }
    let bits = t.to_bits();
    if t > 0.0 {
        f64::from_bits(bits - 1)
    } else {
        f64::from_bits(bits + 1)
    }
}
