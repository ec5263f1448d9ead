use serde::{Deserialize, Serialize};

use crate::bank::Axis;
use crate::coefficients::*;
use crate::error::ConfigError;
use crate::filter::{DigitalFilter, Sample};
use crate::pid::PidConfig;
use crate::reset::ResetPolicy;

/// Coefficients, saturation and nominal rate of one digital filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub numerator: Vec<f64>,
    pub denominator: Vec<f64>,
    pub output_limit: f64,
    pub sample_rate_hz: f64,
}

impl FilterConfig {
    pub fn new(
        numerator: &[f64],
        denominator: &[f64],
        output_limit: f64,
        sample_rate_hz: f64,
    ) -> Self {
        Self {
            numerator: numerator.to_vec(),
            denominator: denominator.to_vec(),
            output_limit,
            sample_rate_hz,
        }
    }

    /// # Errors
    ///
    /// See [`DigitalFilter::initialize`].
    pub fn build<T: Sample>(&self) -> Result<DigitalFilter<T>, ConfigError> {
        DigitalFilter::initialize(
            &self.numerator,
            &self.denominator,
            self.output_limit,
            self.sample_rate_hz,
        )
    }
}

/// Which feedback block closes a loop on one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompensatorConfig {
    Filter(FilterConfig),
    Pid(PidConfig),
}

/// Every filter and calibration gain of one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub attitude_model: FilterConfig,
    pub rate_model: FilterConfig,
    /// C1, closes the attitude loop.
    pub attitude_compensator: CompensatorConfig,
    /// C2, closes the rate loop.
    pub rate_compensator: CompensatorConfig,
    pub feedforward_stage1: FilterConfig,
    pub feedforward_stage2: FilterConfig,
    /// Scales C2 output into mixer units.
    pub feedback_gain: f64,
    /// Scales feedforward stage two output into mixer units.
    pub feedforward_gain: f64,
}

impl AxisConfig {
    /// Reference design for the roll axis.
    pub fn roll() -> Self {
        Self {
            attitude_model: attitude_model(),
            rate_model: rate_model(),
            attitude_compensator: CompensatorConfig::Filter(FilterConfig::new(
                &ROLL_C1_NUM,
                &ROLL_C1_DEN,
                C1_LIMIT,
                COMPENSATOR_SAMPLE_RATE_HZ,
            )),
            rate_compensator: CompensatorConfig::Filter(FilterConfig::new(
                &ROLL_C2_NUM,
                &ROLL_C2_DEN,
                C2_LIMIT,
                COMPENSATOR_SAMPLE_RATE_HZ,
            )),
            feedforward_stage1: FilterConfig::new(
                &ROLL_FF1_NUM,
                &ROLL_FF1_DEN,
                ROLL_FF1_LIMIT,
                COMPENSATOR_SAMPLE_RATE_HZ,
            ),
            feedforward_stage2: FilterConfig::new(
                &ROLL_FF2_NUM,
                &ROLL_FF2_DEN,
                ROLL_FF2_LIMIT,
                COMPENSATOR_SAMPLE_RATE_HZ,
            ),
            feedback_gain: ROLL_FEEDBACK_GAIN,
            feedforward_gain: ROLL_FEEDFORWARD_GAIN,
        }
    }

    /// Reference design for the pitch axis.
    pub fn pitch() -> Self {
        Self {
            attitude_model: attitude_model(),
            rate_model: rate_model(),
            attitude_compensator: CompensatorConfig::Filter(FilterConfig::new(
                &PITCH_C1_NUM,
                &PITCH_C1_DEN,
                C1_LIMIT,
                COMPENSATOR_SAMPLE_RATE_HZ,
            )),
            rate_compensator: CompensatorConfig::Filter(FilterConfig::new(
                &PITCH_C2_NUM,
                &PITCH_C2_DEN,
                C2_LIMIT,
                COMPENSATOR_SAMPLE_RATE_HZ,
            )),
            feedforward_stage1: FilterConfig::new(
                &PITCH_FF1_NUM,
                &PITCH_FF1_DEN,
                PITCH_FF1_LIMIT,
                COMPENSATOR_SAMPLE_RATE_HZ,
            ),
            feedforward_stage2: FilterConfig::new(
                &PITCH_FF2_NUM,
                &PITCH_FF2_DEN,
                PITCH_FF2_LIMIT,
                COMPENSATOR_SAMPLE_RATE_HZ,
            ),
            feedback_gain: PITCH_FEEDBACK_GAIN,
            feedforward_gain: PITCH_FEEDFORWARD_GAIN,
        }
    }
}

fn attitude_model() -> FilterConfig {
    FilterConfig::new(
        &ATTITUDE_MODEL_NUM,
        &ATTITUDE_MODEL_DEN,
        ATTITUDE_MODEL_LIMIT,
        MODEL_SAMPLE_RATE_HZ,
    )
}

fn rate_model() -> FilterConfig {
    FilterConfig::new(
        &RATE_MODEL_NUM,
        &RATE_MODEL_DEN,
        RATE_MODEL_LIMIT,
        MODEL_SAMPLE_RATE_HZ,
    )
}

/// Complete configuration of the control core.
///
/// `Default` reproduces the reference design. Missing fields in a JSON
/// override fall back to it.
///
/// The loop rates document the scheduling period every filter was designed
/// for. They are never used to rescale coefficients: a scheduler that runs a
/// loop at another period silently changes its frequency response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub roll: AxisConfig,
    pub pitch: AxisConfig,
    pub reset: ResetPolicy,
    pub rate_loop_hz: f64,
    pub attitude_loop_hz: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            roll: AxisConfig::roll(),
            pitch: AxisConfig::pitch(),
            reset: ResetPolicy::default(),
            rate_loop_hz: MODEL_SAMPLE_RATE_HZ,
            attitude_loop_hz: MODEL_SAMPLE_RATE_HZ,
        }
    }
}

impl ControlConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::Roll => &self.roll,
            Axis::Pitch => &self.pitch,
        }
    }
}
