use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Gains and limits of a [`SingleLoopPid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub integral_limit: f64,
    pub output_limit: f64,
}

/// Single-loop PID with a clamped integral and derivative-on-measurement.
///
/// This is the feedback block the model matching compensators superseded. It
/// is kept so an axis can fall back to it through
/// [`CompensatorConfig::Pid`](crate::config::CompensatorConfig::Pid).
#[derive(Debug, Clone)]
pub struct SingleLoopPid {
    kp: f64,
    ki: f64,
    kd: f64,
    integral: f64,
    integral_limit: f64,
    output_limit: f64,
}

impl SingleLoopPid {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPid`] when a gain or limit is not finite
    /// or a limit is negative.
    pub fn new(config: &PidConfig) -> Result<Self, ConfigError> {
        let finite = [
            config.kp,
            config.ki,
            config.kd,
            config.integral_limit,
            config.output_limit,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite || config.integral_limit < 0.0 || config.output_limit < 0.0 {
            return Err(ConfigError::InvalidPid);
        }

        Ok(Self {
            kp: config.kp,
            ki: config.ki,
            kd: config.kd,
            integral: 0.0,
            integral_limit: config.integral_limit,
            output_limit: config.output_limit,
        })
    }

    /// Advances the controller by `dt` seconds.
    ///
    /// `derivative` is the time derivative of the measured quantity (gyro rate
    /// for an attitude loop, angular acceleration for a rate loop), so setpoint
    /// steps do not kick the derivative term.
    pub fn update(&mut self, error: f64, derivative: f64, dt: f64) -> f64 {
        let integral = self.integral + self.ki * error * dt;
        self.integral = integral.clamp(-self.integral_limit, self.integral_limit);

        let output = self.kp * error + self.integral - self.kd * derivative;
        output.clamp(-self.output_limit, self.output_limit)
    }

    pub fn reset_integral(&mut self) {
        self.integral = 0.0;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn config() -> PidConfig {
        PidConfig {
            kp: 2.0,
            ki: 10.0,
            kd: 0.5,
            integral_limit: 1.0,
            output_limit: 5.0,
        }
    }

    #[test]
    fn test_proportional_and_derivative() {
        let proportional = PidConfig {
            ki: 0.0,
            ..config()
        };
        let mut pid = SingleLoopPid::new(&proportional).unwrap();
        assert_abs_diff_eq!(pid.update(1.0, 2.0, 0.001), 2.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_integral_is_clamped_and_resettable() {
        let mut pid = SingleLoopPid::new(&config()).unwrap();
        for _ in 0..1000 {
            pid.update(1.0, 0.0, 0.01);
        }
        assert_eq!(pid.integral(), 1.0);

        pid.reset_integral();
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn test_output_is_clamped() {
        let mut pid = SingleLoopPid::new(&config()).unwrap();
        assert_eq!(pid.update(100.0, 0.0, 0.0), 5.0);
        assert_eq!(pid.update(-100.0, 0.0, 0.0), -5.0);
    }

    #[test]
    fn test_rejects_negative_limits() {
        let bad = PidConfig {
            output_limit: -1.0,
            ..config()
        };
        let result = SingleLoopPid::new(&bad);
        assert!(matches!(result, Err(ConfigError::InvalidPid)));
    }
}
