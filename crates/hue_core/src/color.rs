use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_UNSTABLE_REVERT_SECONDS: f64 = 1.8;

const COLOR_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

/// Secondary colors and the primaries they drag along when toggled.
static TOGGLE_GROUPS: [(Color, [Color; 2]); 3] = [
    (Color::Orange, [Color::Red, Color::Yellow]),
    (Color::Green, [Color::Yellow, Color::Blue]),
    (Color::Purple, [Color::Blue, Color::Red]),
];

impl Color {
    pub const ALL: [Color; COLOR_COUNT] = [
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Purple,
    ];

    const fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Orange => 1,
            Color::Yellow => 2,
            Color::Green => 3,
            Color::Blue => 4,
            Color::Purple => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
        }
    }

    pub fn is_secondary(self) -> bool {
        !self.linked_primaries().is_empty()
    }

    /// Blue and purple platforms come back on their own after being switched off.
    pub fn is_unstable(self) -> bool {
        matches!(self, Color::Blue | Color::Purple)
    }

    pub fn linked_primaries(self) -> &'static [Color] {
        TOGGLE_GROUPS
            .iter()
            .find(|(secondary, _)| *secondary == self)
            .map(|(_, primaries)| primaries.as_slice())
            .unwrap_or(&[])
    }

    fn group(self) -> impl Iterator<Item = Color> {
        std::iter::once(self).chain(self.linked_primaries().iter().copied())
    }
}

/// Small set of colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ColorMask(u8);

impl ColorMask {
    pub const EMPTY: Self = Self(0);

    pub fn of(colors: &[Color]) -> Self {
        let mut mask = Self::EMPTY;
        for color in colors {
            mask.insert(*color);
        }
        mask
    }

    pub fn insert(&mut self, color: Color) {
        self.0 |= 1 << color.index();
    }

    pub fn contains(self, color: Color) -> bool {
        self.0 & (1 << color.index()) != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Color> {
        Color::ALL
            .into_iter()
            .filter(move |color| self.contains(*color))
    }
}

/// Frozen copy of which colors are enabled. Revert timers are not captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSnapshot {
    enabled: [bool; COLOR_COUNT],
}

impl ColorSnapshot {
    pub fn is_enabled(&self, color: Color) -> bool {
        self.enabled[color.index()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorState {
    enabled: [bool; COLOR_COUNT],
    revert_deadline: [Option<f64>; COLOR_COUNT],
    clock_seconds: f64,
    revert_seconds: f64,
}

impl Default for ColorState {
    fn default() -> Self {
        Self::new(DEFAULT_UNSTABLE_REVERT_SECONDS)
    }
}

impl ColorState {
    /// All colors start enabled.
    pub fn new(revert_seconds: f64) -> Self {
        Self {
            enabled: [true; COLOR_COUNT],
            revert_deadline: [None; COLOR_COUNT],
            clock_seconds: 0.0,
            revert_seconds,
        }
    }

    pub fn is_enabled(&self, color: Color) -> bool {
        self.enabled[color.index()]
    }

    pub fn revert_deadline(&self, color: Color) -> Option<f64> {
        self.revert_deadline[color.index()]
    }

    pub fn now(&self) -> f64 {
        self.clock_seconds
    }

    pub fn enabled_mask(&self) -> ColorMask {
        let mut mask = ColorMask::EMPTY;
        for color in Color::ALL {
            if self.is_enabled(color) {
                mask.insert(color);
            }
        }
        mask
    }

    /// Flips `color` and, for a secondary, its two linked primaries to the same new
    /// value. Returns the colors whose value changed.
    ///
    /// Switching a group off while any unstable member still waits on its revert
    /// timer does nothing.
    pub fn toggle(&mut self, color: Color) -> ColorMask {
        let value = !self.is_enabled(color);
        if !value {
            if let Some(pending) = color
                .group()
                .find(|member| member.is_unstable() && self.revert_deadline(*member).is_some())
            {
                debug!(
                    color = color.name(),
                    pending = pending.name(),
                    "color_toggle_ignored"
                );
                return ColorMask::EMPTY;
            }
        }

        let changed = self.set_group(color, value);
        debug!(
            color = color.name(),
            enabled = value,
            changed = changed.len(),
            "color_toggled"
        );
        changed
    }

    /// Advances the revert clock and fires every revert whose deadline has passed,
    /// in color order. Returns the colors whose value changed.
    pub fn tick(&mut self, dt: f64) -> ColorMask {
        self.clock_seconds += dt;
        let mut changed = ColorMask::EMPTY;
        for color in Color::ALL {
            let Some(deadline) = self.revert_deadline(color) else {
                continue;
            };
            if deadline > self.clock_seconds {
                continue;
            }
            self.revert_deadline[color.index()] = None;
            if !self.is_enabled(color) {
                let reverted = self.set_group(color, true);
                debug!(
                    color = color.name(),
                    changed = reverted.len(),
                    "color_reverted"
                );
                changed = changed.union(reverted);
            }
        }
        changed
    }

    pub fn snapshot(&self) -> ColorSnapshot {
        ColorSnapshot {
            enabled: self.enabled,
        }
    }

    /// Replaces the enabled set with `snapshot`. Pending reverts are dropped and every
    /// unstable color the snapshot leaves off gets a fresh revert deadline.
    pub fn restore(&mut self, snapshot: &ColorSnapshot) -> ColorMask {
        let mut changed = ColorMask::EMPTY;
        for color in Color::ALL {
            let index = color.index();
            if self.enabled[index] != snapshot.enabled[index] {
                changed.insert(color);
            }
            self.enabled[index] = snapshot.enabled[index];
            self.revert_deadline[index] = None;
            if color.is_unstable() && !snapshot.enabled[index] {
                self.revert_deadline[index] = Some(self.clock_seconds + self.revert_seconds);
            }
        }
        changed
    }

    fn set_group(&mut self, color: Color, value: bool) -> ColorMask {
        let mut changed = ColorMask::EMPTY;
        for member in color.group() {
            let index = member.index();
            if self.enabled[index] != value {
                changed.insert(member);
            }
            self.enabled[index] = value;
            if !value && member.is_unstable() && self.revert_deadline[index].is_none() {
                self.revert_deadline[index] = Some(self.clock_seconds + self.revert_seconds);
            }
        }
        changed
    }
}
