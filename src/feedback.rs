use crate::config::CompensatorConfig;
use crate::error::ConfigError;
use crate::filter::DigitalFilter;
use crate::pid::SingleLoopPid;

/// Feedback block closing one loop on one axis.
///
/// Loops call [`update`](FeedbackBlock::update) without knowing which kind of
/// compensator an axis uses.
#[derive(Debug, Clone)]
pub enum FeedbackBlock {
    Pid(SingleLoopPid),
    Filter(DigitalFilter<f64>),
}

impl FeedbackBlock {
    /// # Errors
    ///
    /// Propagates the filter or PID validation error.
    pub fn from_config(config: &CompensatorConfig) -> Result<Self, ConfigError> {
        Ok(match config {
            CompensatorConfig::Filter(filter) => FeedbackBlock::Filter(filter.build()?),
            CompensatorConfig::Pid(pid) => FeedbackBlock::Pid(SingleLoopPid::new(pid)?),
        })
    }

    /// Advances the block by one tick.
    ///
    /// A digital filter only sees `error`; it assumes its design period and
    /// ignores `dt`. The PID integrates over `dt` and damps with `derivative`,
    /// the time derivative of `measurement`.
    pub fn update(&mut self, error: f64, _measurement: f64, derivative: f64, dt: f64) -> f64 {
        match self {
            FeedbackBlock::Pid(pid) => pid.update(error, derivative, dt),
            FeedbackBlock::Filter(filter) => filter.update(error),
        }
    }

    /// Returns the block to rest.
    pub fn reset(&mut self) {
        match self {
            FeedbackBlock::Pid(pid) => pid.reset_integral(),
            FeedbackBlock::Filter(filter) => filter.reset(),
        }
    }

    /// Clears a PID integral; filters are left untouched.
    pub fn reset_integral(&mut self) {
        if let FeedbackBlock::Pid(pid) = self {
            pid.reset_integral();
        }
    }

    pub fn as_filter(&self) -> Option<&DigitalFilter<f64>> {
        match self {
            FeedbackBlock::Filter(filter) => Some(filter),
            FeedbackBlock::Pid(_) => None,
        }
    }

    pub fn is_at_rest(&self) -> bool {
        match self {
            FeedbackBlock::Pid(pid) => pid.integral() == 0.0,
            FeedbackBlock::Filter(filter) => filter.is_at_rest(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use crate::pid::PidConfig;

    #[test]
    fn test_filter_ignores_dt() {
        let config =
            CompensatorConfig::Filter(FilterConfig::new(&[0.5, 0.0], &[1.0, -0.5], 10.0, 100.0));
        let mut slow = FeedbackBlock::from_config(&config).unwrap();
        let mut fast = FeedbackBlock::from_config(&config).unwrap();

        for _ in 0..5 {
            let coarse = slow.update(1.0, 0.0, 0.0, 0.1);
            assert_eq!(coarse, fast.update(1.0, 3.0, 7.0, 0.001));
        }
    }

    #[test]
    fn test_integral_reset_only_touches_pid() {
        let mut filter = FeedbackBlock::from_config(&CompensatorConfig::Filter(FilterConfig::new(
            &[1.0, 0.0],
            &[1.0, -0.5],
            10.0,
            100.0,
        )))
        .unwrap();
        filter.update(1.0, 0.0, 0.0, 0.001);
        filter.reset_integral();
        assert!(!filter.is_at_rest());
        filter.reset();
        assert!(filter.is_at_rest());

        let mut pid = FeedbackBlock::from_config(&CompensatorConfig::Pid(PidConfig {
            kp: 1.0,
            ki: 1.0,
            kd: 0.0,
            integral_limit: 10.0,
            output_limit: 10.0,
        }))
        .unwrap();
        pid.update(1.0, 0.0, 0.0, 0.01);
        assert!(!pid.is_at_rest());
        pid.reset_integral();
        assert!(pid.is_at_rest());
        assert!(pid.as_filter().is_none());
    }
}
