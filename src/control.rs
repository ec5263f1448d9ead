use nalgebra::Vector2;
use tracing::{info, warn};

use crate::attitude::{AttitudeLoop, AttitudeOutputs};
use crate::bank::{BankEntry, ControllerBank};
use crate::config::ControlConfig;
use crate::error::ConfigError;
use crate::io::{AttitudeSample, Clock, Mixer, PilotInput, RateSample, Sensors};
use crate::rate::{RateLoop, RateOutputs};
use crate::reset::ResetPolicy;
use crate::shared::{SharedRateSetpoint, SharedSnapshot};
use crate::telemetry::ControlSnapshot;

/// The complete cascade: both loops, the setpoint they share and the
/// telemetry read-back.
///
/// # Control Architecture
///
/// Pilot reference → Attitude Model ─(−attitude)→ C1 ─┐
///                 → Rate Model ──────────────────────+→ Rate Setpoint
///                                                          ↓ (shared)
/// Rate Setpoint ─(−rate)→ C2 → Feedback Gain ─┐
/// Pilot reference → FF Stage 1 → FF Stage 2 → Feedforward Gain ─+→ Mixer
///
/// A scheduler calls [`rate_tick`](ControlCore::rate_tick) from its fastest
/// periodic task and [`attitude_tick`](ControlCore::attitude_tick) from a
/// slower one. Every filter assumes it is stepped at the period it was
/// designed for; the core never rescales coefficients to the measured period.
///
/// Firmware that runs the loops in separate interrupt handlers can take them
/// apart with [`into_parts`](ControlCore::into_parts) and share a `static`
/// [`SharedRateSetpoint`] instead.
#[derive(Debug)]
pub struct ControlCore {
    attitude: AttitudeLoop,
    rate: RateLoop,
    setpoint: SharedRateSetpoint,
    snapshot: SharedSnapshot,
    reset_policy: ResetPolicy,
}

impl ControlCore {
    /// Builds every filter and calibration gain from `config`.
    ///
    /// # Errors
    ///
    /// Returns the first invalid bank entry. Nothing can fail after this.
    pub fn new(config: &ControlConfig) -> Result<Self, ConfigError> {
        let (attitude_bank, rate_bank) = ControllerBank::build(config)?.into_parts();

        for role in config.reset.uncovered() {
            warn!(?role, "block keeps its state across motor stops");
        }
        info!(
            attitude_loop_hz = config.attitude_loop_hz,
            rate_loop_hz = config.rate_loop_hz,
            "control core ready"
        );

        Ok(Self {
            attitude: AttitudeLoop::new(attitude_bank, config.reset),
            rate: RateLoop::new(rate_bank, config.reset),
            setpoint: SharedRateSetpoint::new(),
            snapshot: SharedSnapshot::new(),
            reset_policy: config.reset,
        })
    }

    /// Runs one attitude-loop tick against the collaborators and publishes
    /// the new rate setpoint.
    ///
    /// # Arguments
    ///
    /// * `pilot` - Reference angles and the motor-stop level
    /// * `sensors` - Measured attitude and rate
    /// * `clock` - Timestamp of the tick
    ///
    /// # Returns
    ///
    /// The values computed on this tick.
    pub fn attitude_tick(
        &mut self,
        pilot: &impl PilotInput,
        sensors: &impl Sensors,
        clock: &impl Clock,
    ) -> AttitudeOutputs {
        self.step_attitude(&AttitudeSample::read(pilot, sensors, clock))
    }

    /// Runs one rate-loop tick against the latest published setpoint and hands
    /// the roll and pitch action to `mixer`.
    ///
    /// # Arguments
    ///
    /// * `pilot` - Reference angles and the motor-stop level
    /// * `sensors` - Measured rate and angular acceleration
    /// * `clock` - Timestamp of the tick
    /// * `mixer` - Receiver of the roll and pitch action
    ///
    /// # Returns
    ///
    /// The values computed on this tick.
    pub fn rate_tick<M: Mixer>(
        &mut self,
        pilot: &impl PilotInput,
        sensors: &impl Sensors,
        clock: &impl Clock,
        mixer: &mut M,
    ) -> RateOutputs {
        let outputs = self.step_rate(&RateSample::read(pilot, sensors, clock));
        mixer.publish_control_action(outputs.total);
        outputs
    }

    /// Attitude tick on an already collected sample. Updates the snapshot.
    pub fn step_attitude(&mut self, sample: &AttitudeSample) -> AttitudeOutputs {
        let outputs = self.attitude.step(sample, &self.setpoint);
        self.snapshot.update(|s| {
            s.attitude_reference = outputs.attitude_reference;
            s.model_rate_reference = outputs.model_rate_reference;
            s.attitude_compensator = outputs.compensator_output;
            s.rate_setpoint = outputs.rate_setpoint;
        });
        outputs
    }

    /// Rate tick on an already collected sample. Updates the snapshot; the
    /// caller forwards `total` to the mixer.
    pub fn step_rate(&mut self, sample: &RateSample) -> RateOutputs {
        let outputs = self.rate.step(sample, self.setpoint.latest());
        self.snapshot.update(|s| {
            s.timestamp_us = sample.now_us;
            s.feedforward = outputs.feedforward;
            s.feedback = outputs.feedback;
            s.total = outputs.total;
        });
        outputs
    }

    /// Latest completed values of both loops.
    pub fn snapshot(&self) -> ControlSnapshot {
        self.snapshot.latest()
    }

    /// Setpoint most recently published by the attitude loop.
    pub fn rate_setpoint(&self) -> Vector2<f64> {
        self.setpoint.latest()
    }

    pub fn reset_policy(&self) -> &ResetPolicy {
        &self.reset_policy
    }

    pub fn attitude(&self) -> &AttitudeLoop {
        &self.attitude
    }

    pub fn rate(&self) -> &RateLoop {
        &self.rate
    }

    /// All twelve blocks of both loops.
    pub fn entries(&self) -> impl Iterator<Item = BankEntry<'_>> {
        self.attitude
            .bank()
            .entries()
            .chain(self.rate.bank().entries())
    }

    /// Splits the core into its two loops. The setpoint owned by the core is
    /// dropped; the caller provides its own.
    pub fn into_parts(self) -> (AttitudeLoop, RateLoop) {
        (self.attitude, self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn attitude_sample(reference: f64, now_us: u32) -> AttitudeSample {
        AttitudeSample {
            reference: Vector2::new(reference, reference),
            attitude: Vector2::zeros(),
            rate: Vector2::zeros(),
            motors_stopped: false,
            now_us,
        }
    }

    fn rate_sample(reference: f64, now_us: u32) -> RateSample {
        RateSample {
            reference: Vector2::new(reference, reference),
            rate: Vector2::zeros(),
            acceleration: Vector2::zeros(),
            motors_stopped: false,
            now_us,
        }
    }

    #[test]
    fn test_rate_loop_reads_published_setpoint() {
        let mut core = ControlCore::new(&ControlConfig::default()).unwrap();
        for k in 0..30 {
            core.step_attitude(&attitude_sample(10.0, k * 1_000));
        }
        let published = core.rate_setpoint();
        assert_ne!(published, Vector2::zeros());

        let out = core.step_rate(&rate_sample(10.0, 30_000));
        assert_eq!(out.rate_error, published);
    }

    #[test]
    fn test_snapshot_reflects_last_ticks() {
        let mut core = ControlCore::new(&ControlConfig::default()).unwrap();
        let mut attitude = AttitudeOutputs::default();
        let mut rate = RateOutputs::default();
        for k in 0..40 {
            attitude = core.step_attitude(&attitude_sample(5.0, k * 1_000));
            rate = core.step_rate(&rate_sample(5.0, k * 1_000 + 500));
        }

        let snapshot = core.snapshot();
        assert_eq!(snapshot.timestamp_us, 39_500);
        assert_eq!(snapshot.total, rate.total);
        assert_eq!(snapshot.feedforward, rate.feedforward);
        assert_eq!(snapshot.rate_setpoint, attitude.rate_setpoint);
        assert_relative_eq!(
            snapshot.rate_setpoint.x,
            snapshot.model_rate_reference.x + snapshot.attitude_compensator.x
        );
    }

    #[test]
    fn test_entries_and_parts() {
        let core = ControlCore::new(&ControlConfig::default()).unwrap();
        assert_eq!(core.entries().count(), 12);
        assert!(!core.reset_policy().rate_compensator);

        let (attitude, rate) = core.into_parts();
        assert_eq!(attitude.bank().entries().count(), 6);
        assert_eq!(rate.bank().entries().count(), 6);
    }
}
