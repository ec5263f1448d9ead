use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AxisConfig, CompensatorConfig, ControlConfig, FilterConfig};
use crate::error::ConfigError;
use crate::feedback::FeedbackBlock;
use crate::filter::DigitalFilter;

/// Controlled axis. The discriminant is the index into per-axis arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Roll = 0,
    Pitch = 1,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Roll, Axis::Pitch];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Position of a block in the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Shapes the raw pilot angle into the attitude reference.
    AttitudeModel,
    /// Derivative of the shaped reference, the feedforward rate target.
    RateModel,
    /// C1, attitude-loop feedback.
    AttitudeCompensator,
    /// C2, rate-loop feedback.
    RateCompensator,
    /// First feedforward stage, fed with the raw pilot reference.
    FeedforwardStage1,
    /// Second feedforward stage, fed with the first stage's output.
    FeedforwardStage2,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::AttitudeModel,
        Role::RateModel,
        Role::AttitudeCompensator,
        Role::RateCompensator,
        Role::FeedforwardStage1,
        Role::FeedforwardStage2,
    ];
}

/// Borrowed view of a bank block.
#[derive(Debug, Clone, Copy)]
pub enum BlockRef<'a> {
    Filter(&'a DigitalFilter<f64>),
    Feedback(&'a FeedbackBlock),
}

impl BlockRef<'_> {
    /// True when the block holds no state from earlier ticks.
    pub fn is_at_rest(&self) -> bool {
        match self {
            BlockRef::Filter(filter) => filter.is_at_rest(),
            BlockRef::Feedback(block) => block.is_at_rest(),
        }
    }
}

/// A bank block tagged with its axis and role.
#[derive(Debug, Clone, Copy)]
pub struct BankEntry<'a> {
    pub axis: Axis,
    pub role: Role,
    pub block: BlockRef<'a>,
}

/// Attitude-loop blocks of one axis.
#[derive(Debug, Clone)]
pub struct AttitudeAxisBank {
    /// Shapes the pilot angle into the attitude reference.
    pub attitude_model: DigitalFilter<f64>,
    /// Shapes the pilot angle into the model rate reference.
    pub rate_model: DigitalFilter<f64>,
    /// C1, fed with the attitude tracking error.
    pub compensator: FeedbackBlock,
}

impl AttitudeAxisBank {
    fn build(config: &AxisConfig, axis: Axis) -> Result<Self, ConfigError> {
        Ok(Self {
            attitude_model: build_filter(&config.attitude_model, axis, Role::AttitudeModel)?,
            rate_model: build_filter(&config.rate_model, axis, Role::RateModel)?,
            compensator: build_compensator(
                &config.attitude_compensator,
                axis,
                Role::AttitudeCompensator,
            )?,
        })
    }
}

/// Rate-loop blocks and calibration gains of one axis.
#[derive(Debug, Clone)]
pub struct RateAxisBank {
    /// C2, fed with the rate tracking error.
    pub compensator: FeedbackBlock,
    /// First feedforward stage, fed with the raw pilot reference.
    pub feedforward_stage1: DigitalFilter<f64>,
    /// Second feedforward stage, in series with the first.
    pub feedforward_stage2: DigitalFilter<f64>,
    /// Scales C2 output into mixer units.
    pub feedback_gain: f64,
    /// Scales feedforward stage two output into mixer units.
    pub feedforward_gain: f64,
}

impl RateAxisBank {
    fn build(config: &AxisConfig, axis: Axis) -> Result<Self, ConfigError> {
        for gain in [config.feedback_gain, config.feedforward_gain] {
            if !gain.is_finite() {
                return Err(ConfigError::InvalidGain(gain).for_entry(axis, Role::RateCompensator));
            }
        }

        Ok(Self {
            compensator: build_compensator(&config.rate_compensator, axis, Role::RateCompensator)?,
            feedforward_stage1: build_filter(
                &config.feedforward_stage1,
                axis,
                Role::FeedforwardStage1,
            )?,
            feedforward_stage2: build_filter(
                &config.feedforward_stage2,
                axis,
                Role::FeedforwardStage2,
            )?,
            feedback_gain: config.feedback_gain,
            feedforward_gain: config.feedforward_gain,
        })
    }
}

/// Blocks owned by the attitude loop, indexed by [`Axis::index`].
#[derive(Debug, Clone)]
pub struct AttitudeBank {
    pub axes: [AttitudeAxisBank; 2],
}

impl AttitudeBank {
    pub fn axis(&self, axis: Axis) -> &AttitudeAxisBank {
        &self.axes[axis.index()]
    }

    pub fn entries(&self) -> impl Iterator<Item = BankEntry<'_>> {
        Axis::ALL.into_iter().flat_map(move |axis| {
            let bank = self.axis(axis);
            [
                BankEntry {
                    axis,
                    role: Role::AttitudeModel,
                    block: BlockRef::Filter(&bank.attitude_model),
                },
                BankEntry {
                    axis,
                    role: Role::RateModel,
                    block: BlockRef::Filter(&bank.rate_model),
                },
                BankEntry {
                    axis,
                    role: Role::AttitudeCompensator,
                    block: BlockRef::Feedback(&bank.compensator),
                },
            ]
        })
    }
}

/// Blocks owned by the rate loop, indexed by [`Axis::index`].
#[derive(Debug, Clone)]
pub struct RateBank {
    pub axes: [RateAxisBank; 2],
}

impl RateBank {
    pub fn axis(&self, axis: Axis) -> &RateAxisBank {
        &self.axes[axis.index()]
    }

    pub fn entries(&self) -> impl Iterator<Item = BankEntry<'_>> {
        Axis::ALL.into_iter().flat_map(move |axis| {
            let bank = self.axis(axis);
            [
                BankEntry {
                    axis,
                    role: Role::RateCompensator,
                    block: BlockRef::Feedback(&bank.compensator),
                },
                BankEntry {
                    axis,
                    role: Role::FeedforwardStage1,
                    block: BlockRef::Filter(&bank.feedforward_stage1),
                },
                BankEntry {
                    axis,
                    role: Role::FeedforwardStage2,
                    block: BlockRef::Filter(&bank.feedforward_stage2),
                },
            ]
        })
    }
}

/// Every filter of the cascade, built once at startup.
///
/// The bank is split with [`into_parts`](ControllerBank::into_parts) so each
/// loop exclusively owns its blocks. The loops share only the rate setpoint.
#[derive(Debug, Clone)]
pub struct ControllerBank {
    pub attitude: AttitudeBank,
    pub rate: RateBank,
}

impl ControllerBank {
    /// Builds all twelve blocks.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry as [`ConfigError::Filter`], tagged with
    /// its axis and role.
    pub fn build(config: &ControlConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            attitude: AttitudeBank {
                axes: [
                    AttitudeAxisBank::build(&config.roll, Axis::Roll)?,
                    AttitudeAxisBank::build(&config.pitch, Axis::Pitch)?,
                ],
            },
            rate: RateBank {
                axes: [
                    RateAxisBank::build(&config.roll, Axis::Roll)?,
                    RateAxisBank::build(&config.pitch, Axis::Pitch)?,
                ],
            },
        })
    }

    pub fn into_parts(self) -> (AttitudeBank, RateBank) {
        (self.attitude, self.rate)
    }

    pub fn entries(&self) -> impl Iterator<Item = BankEntry<'_>> {
        self.attitude.entries().chain(self.rate.entries())
    }
}

fn build_filter(
    config: &FilterConfig,
    axis: Axis,
    role: Role,
) -> Result<DigitalFilter<f64>, ConfigError> {
    let filter = config
        .build::<f64>()
        .map_err(|err| err.for_entry(axis, role))?;
    debug!(
        ?axis,
        ?role,
        order = filter.order(),
        limit = filter.output_limit(),
        pole_radius = filter.pole_radius(),
        "filter initialized"
    );
    Ok(filter)
}

fn build_compensator(
    config: &CompensatorConfig,
    axis: Axis,
    role: Role,
) -> Result<FeedbackBlock, ConfigError> {
    let block = FeedbackBlock::from_config(config).map_err(|err| err.for_entry(axis, role))?;
    match &block {
        FeedbackBlock::Filter(filter) => debug!(
            ?axis,
            ?role,
            order = filter.order(),
            limit = filter.output_limit(),
            pole_radius = filter.pole_radius(),
            "compensator initialized"
        ),
        FeedbackBlock::Pid(_) => debug!(?axis, ?role, "single-loop PID initialized"),
    }
    Ok(block)
}
