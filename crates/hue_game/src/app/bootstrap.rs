use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

use super::scenario::{self, Scenario, ScenarioError, SCENARIO_ENV_VAR};

/// Log directives, in `RUST_LOG` syntax. `hue_core=debug` adds movement state
/// changes, touches and color reverts.
const LOG_ENV_VAR: &str = "HUE_LOG";
const DEFAULT_LOG_DIRECTIVES: &str = "info,hue_core=info";

pub(crate) struct AppWiring {
    pub(crate) scenario: Scenario,
}

pub(crate) fn build_app() -> Result<AppWiring, ScenarioError> {
    init_logging();
    info!("=== Hue Startup ===");

    let scenario = scenario::resolve_scenario()?;
    info!(
        scenario = scenario.name.as_str(),
        env_var = SCENARIO_ENV_VAR,
        cells = scenario.level.cells.len(),
        entities = scenario.level.entities.len(),
        input_frames = scenario.inputs.len(),
        "scenario_loaded"
    );

    Ok(AppWiring { scenario })
}

fn init_logging() {
    let directives = env::var(LOG_ENV_VAR).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .init();
}

/// Unparseable directives fall back to the defaults.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_log_directives_use_defaults() {
        assert!(log_filter(None).to_string().contains("hue_core=info"));
    }

    #[test]
    fn log_directives_override_defaults() {
        let filter = log_filter(Some(" hue_core=debug ")).to_string();
        assert!(filter.contains("hue_core=debug"));
    }

    #[test]
    fn invalid_log_directives_fall_back() {
        let filter = log_filter(Some("hue_core=loud")).to_string();
        assert!(filter.contains("hue_core=info"));
    }
}
