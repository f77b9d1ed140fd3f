use std::process::ExitCode;
use std::time::Duration;

use hue_core::{LevelBuildError, LevelSession, TrajectoryDigest, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;
use super::scenario::Scenario;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct LoopConfig {
    pub(crate) target_tps: u32,
    pub(crate) max_ticks_per_frame: u32,
    /// Simulation steps to run before stopping.
    pub(crate) max_steps: u64,
    /// Wall-clock time fed to the accumulator per frame.
    pub(crate) frame_dt_ms: u64,
    pub(crate) max_frame_delta_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_ticks_per_frame: 5,
            max_steps: 1800,
            frame_dt_ms: 16,
            max_frame_delta_ms: 250,
        }
    }
}

impl LoopConfig {
    /// One simulation tick at `target_tps`, never shorter than a nanosecond.
    fn tick(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_tps.max(1)))
            .max(Duration::from_nanos(1))
    }

    /// Frame time fed to the clock. Zero means one tick per frame, and the result
    /// never exceeds `max_frame_delta_ms` (250 ms when that is zero).
    fn frame_time(&self) -> Duration {
        let cap = millis_or(self.max_frame_delta_ms, Duration::from_millis(250));
        millis_or(self.frame_dt_ms, self.tick()).min(cap)
    }
}

fn millis_or(ms: u64, fallback: Duration) -> Duration {
    if ms == 0 {
        fallback
    } else {
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Error)]
pub(crate) enum RunnerError {
    #[error("failed to build level session: {0}")]
    Level(#[from] LevelBuildError),
    #[error("trajectory digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RunReport {
    pub(crate) steps: u64,
    pub(crate) frames: u64,
    pub(crate) deaths: u32,
    pub(crate) clamped_frames: u64,
    pub(crate) final_position: Vec2,
    pub(crate) digest: String,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_scenario(&app.scenario) {
        Ok(report) => {
            info!(
                scenario = app.scenario.name.as_str(),
                steps = report.steps,
                frames = report.frames,
                deaths = report.deaths,
                clamped_frames = report.clamped_frames,
                final_x = report.final_position.x,
                final_y = report.final_position.y,
                digest = report.digest.as_str(),
                "run_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run_failed");
            ExitCode::FAILURE
        }
    }
}

/// Plays the scenario headless on a fixed step, feeding the accumulator a constant
/// frame time the way a display-driven loop would.
pub(crate) fn run_scenario(scenario: &Scenario) -> Result<RunReport, RunnerError> {
    let mut session = LevelSession::new(&scenario.level, scenario.config)?;
    for color in &scenario.unlocked {
        session.unlock_color(*color);
    }

    let config = scenario.loop_config;
    let tick = config.tick();
    let dt = tick.as_secs_f64();
    let frame_time = config.frame_time();
    let mut clock = TickClock::new(tick, config.max_ticks_per_frame);
    info!(
        scenario = scenario.name.as_str(),
        target_tps = config.target_tps,
        max_ticks_per_frame = clock.max_ticks,
        max_steps = config.max_steps,
        frame_time_ms = frame_time.as_millis() as u64,
        scripted_steps = scenario.scripted_steps(),
        "loop_config"
    );

    let mut digest = TrajectoryDigest::new();
    let mut steps = 0u64;
    let mut frames = 0u64;
    let mut clamped_frames = 0u64;
    while steps < config.max_steps {
        frames += 1;
        let batch = clock.advance(frame_time);
        for _ in 0..batch.ticks {
            if steps >= config.max_steps {
                break;
            }
            let step = session.step(&scenario.input_at(steps), dt);
            digest.record(&step.outcome);
            if step.outcome.resolution_cap_hit {
                warn!(step = step.index, "resolution_cap_in_step");
            }
            steps += 1;
        }

        if batch.dropped > Duration::ZERO {
            clamped_frames += 1;
            warn!(
                frame = frames,
                dropped_ms = batch.dropped.as_millis() as u64,
                "frame_backlog_dropped"
            );
        }
    }

    let report = RunReport {
        steps,
        frames,
        deaths: session.deaths(),
        clamped_frames,
        final_position: session.controller().position(),
        digest: digest.finish(),
    };
    if let Some(expected) = &scenario.expected_digest {
        if !expected.eq_ignore_ascii_case(&report.digest) {
            return Err(RunnerError::DigestMismatch {
                expected: expected.clone(),
                actual: report.digest,
            });
        }
    }
    Ok(report)
}

/// Turns frame time into whole ticks. Time short of a tick carries into the next
/// frame; whole ticks beyond `max_ticks` are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TickClock {
    tick: Duration,
    max_ticks: u32,
    carry: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TickBatch {
    ticks: u32,
    dropped: Duration,
}

impl TickClock {
    fn new(tick: Duration, max_ticks: u32) -> Self {
        Self {
            tick,
            max_ticks: max_ticks.max(1),
            carry: Duration::ZERO,
        }
    }

    fn advance(&mut self, frame_time: Duration) -> TickBatch {
        let available = self.carry.saturating_add(frame_time);
        let due = available.as_nanos() / self.tick.as_nanos();
        let ticks = u32::try_from(due).unwrap_or(u32::MAX).min(self.max_ticks);
        let left = available.saturating_sub(self.tick.saturating_mul(ticks));
        if left >= self.tick {
            self.carry = Duration::ZERO;
            TickBatch {
                ticks,
                dropped: left,
            }
        } else {
            self.carry = left;
            TickBatch {
                ticks,
                dropped: Duration::ZERO,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::scenario::demo_scenario;

    #[test]
    fn clock_runs_whole_ticks_without_drop() {
        let mut clock = TickClock::new(Duration::from_millis(16), 5);
        let batch = clock.advance(Duration::from_millis(48));

        assert_eq!(batch.ticks, 3);
        assert_eq!(batch.dropped, Duration::ZERO);
        assert_eq!(clock.carry, Duration::ZERO);
    }

    #[test]
    fn clock_drops_backlog_past_tick_cap() {
        let mut clock = TickClock::new(Duration::from_millis(16), 3);
        let batch = clock.advance(Duration::from_millis(120));

        assert_eq!(batch.ticks, 3);
        assert_eq!(batch.dropped, Duration::from_millis(72));
        assert_eq!(clock.carry, Duration::ZERO);
    }

    #[test]
    fn clock_carries_partial_tick_into_next_frame() {
        let mut clock = TickClock::new(Duration::from_millis(16), 5);
        assert_eq!(clock.advance(Duration::from_millis(10)).ticks, 0);
        assert_eq!(clock.carry, Duration::from_millis(10));

        let batch = clock.advance(Duration::from_millis(10));
        assert_eq!(batch.ticks, 1);
        assert_eq!(clock.carry, Duration::from_millis(4));
    }

    #[test]
    fn zero_frame_settings_fall_back() {
        let config = LoopConfig {
            frame_dt_ms: 0,
            ..LoopConfig::default()
        };
        assert_eq!(config.frame_time(), config.tick());

        let slow = LoopConfig {
            frame_dt_ms: 900,
            max_frame_delta_ms: 0,
            ..LoopConfig::default()
        };
        assert_eq!(slow.frame_time(), Duration::from_millis(250));

        let capped = LoopConfig {
            frame_dt_ms: 900,
            ..LoopConfig::default()
        };
        assert_eq!(capped.frame_time(), Duration::from_millis(250));
    }

    #[test]
    fn demo_run_is_reproducible() {
        let mut scenario = demo_scenario().expect("demo");
        scenario.loop_config.max_steps = 240;

        let first = run_scenario(&scenario).expect("first run");
        let second = run_scenario(&scenario).expect("second run");
        assert_eq!(first.steps, 240);
        assert_eq!(first, second);
    }

    #[test]
    fn slow_frames_are_clamped_but_step_count_holds() {
        let mut scenario = demo_scenario().expect("demo");
        scenario.loop_config = LoopConfig {
            max_steps: 120,
            frame_dt_ms: 200,
            max_ticks_per_frame: 3,
            ..LoopConfig::default()
        };

        let report = run_scenario(&scenario).expect("run");
        assert_eq!(report.steps, 120);
        assert_eq!(report.frames, 40);
        assert_eq!(report.clamped_frames, 40);
    }

    #[test]
    fn expected_digest_is_checked() {
        let mut scenario = demo_scenario().expect("demo");
        scenario.loop_config.max_steps = 60;
        let digest = run_scenario(&scenario).expect("run").digest;

        scenario.expected_digest = Some(digest.to_uppercase());
        assert!(run_scenario(&scenario).is_ok());

        scenario.expected_digest = Some("00".repeat(32));
        let err = run_scenario(&scenario).expect_err("mismatch");
        assert!(matches!(err, RunnerError::DigestMismatch { .. }));
    }

    #[test]
    fn invalid_level_is_reported() {
        let mut scenario = demo_scenario().expect("demo");
        scenario.level.spawn = hue_core::CellCoord::new(100, 100);
        let err = run_scenario(&scenario).expect_err("spawn outside");
        assert!(matches!(
            err,
            RunnerError::Level(LevelBuildError::SpawnOutOfBounds { .. })
        ));
    }
}
