use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Friction and other per-tick factors are tuned against this rate.
pub const REFERENCE_TICK_HZ: f64 = 60.0;

/// Movement tuning, in cells and seconds. Defaults reproduce the reference feel at 60 Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub jump_speed: f64,
    pub rising_gravity: f64,
    pub falling_gravity: f64,
    pub terminal_velocity: f64,
    pub run_acceleration: f64,
    pub max_run_speed: f64,
    /// Fraction of horizontal speed kept per reference tick while grounded with no input.
    pub ground_friction: f64,
    pub stop_speed: f64,
    pub wall_slide_speed: f64,
    pub wall_push_speed: f64,
    pub hang_seconds: f64,
    pub coyote_seconds: f64,
    pub jump_buffer_seconds: f64,
    pub springboard_multiplier: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            jump_speed: 16.2,
            rising_gravity: 48.0,
            falling_gravity: 66.0,
            terminal_velocity: 20.0,
            run_acceleration: 36.0,
            max_run_speed: 24.0,
            ground_friction: 0.7,
            stop_speed: 0.3,
            wall_slide_speed: 4.0,
            wall_push_speed: 12.0,
            hang_seconds: 0.07,
            coyote_seconds: 0.05,
            jump_buffer_seconds: 0.05,
            springboard_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MovementConfigError {
    #[error("movement setting `{name}` must be finite and positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("movement setting `{name}` must be finite and not negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("ground friction must be within [0, 1], got {0}")]
    FrictionOutOfRange(f64),
}

impl MovementConfig {
    pub fn validate(&self) -> Result<(), MovementConfigError> {
        for (name, value) in [
            ("jump_speed", self.jump_speed),
            ("rising_gravity", self.rising_gravity),
            ("falling_gravity", self.falling_gravity),
            ("terminal_velocity", self.terminal_velocity),
            ("run_acceleration", self.run_acceleration),
            ("max_run_speed", self.max_run_speed),
            ("wall_slide_speed", self.wall_slide_speed),
            ("springboard_multiplier", self.springboard_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(MovementConfigError::NotPositive { name, value });
            }
        }
        for (name, value) in [
            ("stop_speed", self.stop_speed),
            ("wall_push_speed", self.wall_push_speed),
            ("hang_seconds", self.hang_seconds),
            ("coyote_seconds", self.coyote_seconds),
            ("jump_buffer_seconds", self.jump_buffer_seconds),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(MovementConfigError::Negative { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.ground_friction) {
            return Err(MovementConfigError::FrictionOutOfRange(self.ground_friction));
        }
        Ok(())
    }

    /// Speed multiplier applied over `dt` seconds of grounded coasting.
    pub(crate) fn friction_factor(&self, dt: f64) -> f64 {
        self.ground_friction.powf(dt * REFERENCE_TICK_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        MovementConfig::default().validate().expect("valid defaults");
    }

    #[test]
    fn validate_rejects_zero_jump() {
        let config = MovementConfig {
            jump_speed: 0.0,
            ..MovementConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(MovementConfigError::NotPositive {
                name: "jump_speed",
                value: 0.0
            })
        );
    }

    #[test]
    fn validate_rejects_negative_coyote_time() {
        let config = MovementConfig {
            coyote_seconds: -0.1,
            ..MovementConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MovementConfigError::Negative {
                name: "coyote_seconds",
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_friction_above_one() {
        let config = MovementConfig {
            ground_friction: 1.5,
            ..MovementConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(MovementConfigError::FrictionOutOfRange(1.5))
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: MovementConfig =
            serde_json::from_str(r#"{"jump_speed": 20.0}"#).expect("config");
        assert_eq!(config.jump_speed, 20.0);
        assert_eq!(config.max_run_speed, MovementConfig::default().max_run_speed);
    }

    #[test]
    fn friction_factor_matches_reference_tick() {
        let config = MovementConfig::default();
        assert!((config.friction_factor(1.0 / REFERENCE_TICK_HZ) - 0.7).abs() < 1e-12);
        assert!((config.friction_factor(2.0 / REFERENCE_TICK_HZ) - 0.49).abs() < 1e-12);
    }
}
