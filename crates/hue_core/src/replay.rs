use sha2::{Digest, Sha256};

use crate::movement::StepOutcome;

/// Running hash over a sequence of step outcomes.
///
/// Two runs from the same level, config and inputs produce the same digest; any
/// drift in position, velocity, state or death shows up as a different hex string.
#[derive(Clone, Default)]
pub struct TrajectoryDigest {
    hasher: Sha256,
    steps: u64,
}

impl std::fmt::Debug for TrajectoryDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrajectoryDigest")
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl TrajectoryDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &StepOutcome) {
        self.hasher.update(outcome.position.x.to_bits().to_le_bytes());
        self.hasher.update(outcome.position.y.to_bits().to_le_bytes());
        self.hasher.update(outcome.velocity.x.to_bits().to_le_bytes());
        self.hasher.update(outcome.velocity.y.to_bits().to_le_bytes());
        self.hasher.update(outcome.state.name().as_bytes());
        self.hasher.update([0u8]);
        self.hasher.update([outcome.jumps_remaining]);
        match outcome.died {
            Some(cause) => {
                self.hasher.update(cause.name().as_bytes());
                self.hasher.update(cause.coord().x.to_le_bytes());
                self.hasher.update(cause.coord().y.to_le_bytes());
            }
            None => self.hasher.update([0u8]),
        }
        self.steps += 1;
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn finish(&self) -> String {
        to_hex_lower(&self.hasher.clone().finalize())
    }
}

fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
