use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use hue_core::{Color, InputAction, InputSnapshot, LevelDescription, SessionConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::loop_runner::LoopConfig;

pub(crate) const SCENARIO_ENV_VAR: &str = "HUE_SCENARIO";

const DEMO_SCENARIO_JSON: &str = include_str!("demo_scenario.json");

/// A level plus the scripted input to play through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Scenario {
    #[serde(default = "default_scenario_name")]
    pub(crate) name: String,
    pub(crate) level: LevelDescription,
    #[serde(default)]
    pub(crate) config: SessionConfig,
    #[serde(default)]
    pub(crate) loop_config: LoopConfig,
    /// Colors whose toggle is available from the start.
    #[serde(default)]
    pub(crate) unlocked: Vec<Color>,
    #[serde(default)]
    pub(crate) inputs: Vec<InputFrame>,
    /// When set, the run fails unless the trajectory hashes to this value.
    #[serde(default)]
    pub(crate) expected_digest: Option<String>,
}

/// Input held for `frames` consecutive steps. Jump and toggles are pressed on the
/// first of those steps only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct InputFrame {
    pub(crate) frames: u32,
    pub(crate) left: bool,
    pub(crate) right: bool,
    pub(crate) jump: bool,
    pub(crate) toggle: Vec<Color>,
}

impl InputFrame {
    fn snapshot(&self, first_step: bool) -> InputSnapshot {
        let mut snapshot = InputSnapshot::empty();
        if self.left {
            snapshot = snapshot.with_action_down(InputAction::MoveLeft);
        }
        if self.right {
            snapshot = snapshot.with_action_down(InputAction::MoveRight);
        }
        if self.jump {
            snapshot = if first_step {
                snapshot.with_jump_pressed()
            } else {
                snapshot.with_action_down(InputAction::Jump)
            };
        }
        if first_step {
            for color in &self.toggle {
                snapshot = snapshot.with_toggle_pressed(*color);
            }
        }
        snapshot
    }
}

impl Scenario {
    /// Input for step `index`; empty once the script has run out.
    pub(crate) fn input_at(&self, index: u64) -> InputSnapshot {
        let mut start = 0u64;
        for frame in &self.inputs {
            let end = start + u64::from(frame.frames);
            if index < end {
                return frame.snapshot(index == start);
            }
            start = end;
        }
        InputSnapshot::empty()
    }

    pub(crate) fn scripted_steps(&self) -> u64 {
        self.inputs
            .iter()
            .map(|frame| u64::from(frame.frames))
            .sum()
    }
}

fn default_scenario_name() -> String {
    "scenario".to_string()
}

#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to read scenario file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scenario {origin}{}: {source}", location_suffix(.location))]
    Parse {
        origin: String,
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

fn location_suffix(location: &str) -> String {
    if location.is_empty() || location == "." {
        String::new()
    } else {
        format!(" at {location}")
    }
}

/// The scenario named by `HUE_SCENARIO`, or the built-in demo when it is unset.
pub(crate) fn resolve_scenario() -> Result<Scenario, ScenarioError> {
    match env::var(SCENARIO_ENV_VAR) {
        Ok(value) => load_scenario(Path::new(value.trim())),
        Err(env::VarError::NotPresent) => demo_scenario(),
        Err(source) => Err(ScenarioError::EnvVar {
            var: SCENARIO_ENV_VAR,
            source,
        }),
    }
}

pub(crate) fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenario(&raw, &path.display().to_string())
}

pub(crate) fn demo_scenario() -> Result<Scenario, ScenarioError> {
    parse_scenario(DEMO_SCENARIO_JSON, "built-in demo")
}

fn parse_scenario(raw: &str, origin: &str) -> Result<Scenario, ScenarioError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, Scenario>(&mut deserializer).map_err(|error| {
        let location = error.path().to_string();
        ScenarioError::Parse {
            origin: origin.to_string(),
            location,
            source: error.into_inner(),
        }
    })
}
