use nalgebra::Vector2;

use crate::bank::{AttitudeBank, Axis};
use crate::io::{AttitudeSample, Clock, PilotInput, Sensors};
use crate::reset::{ResetCoordinator, ResetPolicy};
use crate::shared::SharedRateSetpoint;
use crate::timing::{micros_to_seconds, TickTimer};

/// Values computed by the latest completed attitude tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeOutputs {
    /// Pilot reference shaped by the attitude model.
    pub attitude_reference: Vector2<f64>,
    /// C1 output.
    pub compensator_output: Vector2<f64>,
    /// Rate model output, the feedforward part of the setpoint.
    pub model_rate_reference: Vector2<f64>,
    /// `model_rate_reference + compensator_output`, published to the rate loop.
    pub rate_setpoint: Vector2<f64>,
    pub elapsed_us: u32,
}

impl Default for AttitudeOutputs {
    fn default() -> Self {
        Self {
            attitude_reference: Vector2::zeros(),
            compensator_output: Vector2::zeros(),
            model_rate_reference: Vector2::zeros(),
            rate_setpoint: Vector2::zeros(),
            elapsed_us: 0,
        }
    }
}

/// Outer loop: turns pilot angles into the rate setpoint of the inner loop.
///
/// ```text
/// reference ──► attitude model ──► (−) attitude ──► C1 ──┐
///          └──► rate model ───────────────────────────── + ──► rate setpoint
/// ```
#[derive(Debug, Clone)]
pub struct AttitudeLoop {
    bank: AttitudeBank,
    resets: ResetCoordinator,
    timer: TickTimer,
    outputs: AttitudeOutputs,
}

impl AttitudeLoop {
    pub fn new(bank: AttitudeBank, policy: ResetPolicy) -> Self {
        Self {
            bank,
            resets: ResetCoordinator::new(policy, "attitude"),
            timer: TickTimer::default(),
            outputs: AttitudeOutputs::default(),
        }
    }

    /// Reads the collaborators and runs one tick.
    pub fn tick(
        &mut self,
        pilot: &impl PilotInput,
        sensors: &impl Sensors,
        clock: &impl Clock,
        setpoint: &SharedRateSetpoint,
    ) -> AttitudeOutputs {
        self.step(&AttitudeSample::read(pilot, sensors, clock), setpoint)
    }

    /// Runs one tick on an already collected sample and publishes the new
    /// rate setpoint.
    ///
    /// While `motors_stopped` holds, the covered blocks are returned to rest
    /// after the update, so the next tick starts from zero state.
    pub fn step(
        &mut self,
        sample: &AttitudeSample,
        setpoint: &SharedRateSetpoint,
    ) -> AttitudeOutputs {
        let elapsed_us = self.timer.tick(sample.now_us);
        let dt = micros_to_seconds(elapsed_us);
        let mut outputs = AttitudeOutputs {
            elapsed_us,
            ..AttitudeOutputs::default()
        };

        for axis in Axis::ALL {
            let i = axis.index();
            let bank = &mut self.bank.axes[i];

            let attitude_reference = bank.attitude_model.update(sample.reference[i]);
            let tracking_error = attitude_reference - sample.attitude[i];
            let compensator_output =
                bank.compensator.update(tracking_error, sample.attitude[i], sample.rate[i], dt);
            let model_rate_reference = bank.rate_model.update(sample.reference[i]);

            outputs.attitude_reference[i] = attitude_reference;
            outputs.compensator_output[i] = compensator_output;
            outputs.model_rate_reference[i] = model_rate_reference;
            outputs.rate_setpoint[i] = model_rate_reference + compensator_output;
        }

        setpoint.publish(outputs.rate_setpoint);
        self.resets.attitude(sample.motors_stopped, &mut self.bank);
        self.outputs = outputs;
        outputs
    }

    pub fn outputs(&self) -> &AttitudeOutputs {
        &self.outputs
    }

    pub fn bank(&self) -> &AttitudeBank {
        &self.bank
    }

    pub fn resets(&self) -> &ResetCoordinator {
        &self.resets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::ControllerBank;
    use crate::config::ControlConfig;

    fn attitude_loop(policy: ResetPolicy) -> AttitudeLoop {
        let (bank, _) = ControllerBank::build(&ControlConfig::default())
            .unwrap()
            .into_parts();
        AttitudeLoop::new(bank, policy)
    }

    fn sample(reference: f64, attitude: f64, now_us: u32, motors_stopped: bool) -> AttitudeSample {
        AttitudeSample {
            reference: Vector2::new(reference, -reference),
            attitude: Vector2::new(attitude, -attitude),
            rate: Vector2::zeros(),
            motors_stopped,
            now_us,
        }
    }

    #[test]
    fn test_setpoint_is_model_rate_plus_compensator() {
        let mut outer = attitude_loop(ResetPolicy::default());
        let setpoint = SharedRateSetpoint::new();

        for k in 0..50 {
            let out = outer.step(&sample(10.0, 1.0, k * 1_000, false), &setpoint);
            let expected = out.model_rate_reference + out.compensator_output;
            assert_eq!(out.rate_setpoint, expected);
            assert_eq!(setpoint.latest(), out.rate_setpoint);
        }
        assert!(outer.outputs().attitude_reference.x > 0.0);
        assert!(outer.outputs().attitude_reference.y < 0.0);
        assert_eq!(outer.outputs().elapsed_us, 1_000);
    }

    #[test]
    fn test_zero_inputs_stay_at_zero() {
        let mut outer = attitude_loop(ResetPolicy::default());
        let setpoint = SharedRateSetpoint::new();
        for k in 0..20 {
            let out = outer.step(&sample(0.0, 0.0, k, false), &setpoint);
            assert_eq!(out.rate_setpoint, Vector2::zeros());
        }
    }

    #[test]
    fn test_stop_resets_after_update() {
        let mut outer = attitude_loop(ResetPolicy::default());
        let setpoint = SharedRateSetpoint::new();
        for k in 0..20 {
            outer.step(&sample(10.0, 0.0, k, false), &setpoint);
        }

        let stopped = outer.step(&sample(10.0, 0.0, 20, true), &setpoint);
        assert_ne!(stopped.attitude_reference, Vector2::zeros());
        assert!(outer.bank().entries().all(|e| e.block.is_at_rest()));
        assert_eq!(outer.resets().monitor().stop_events(), 1);
    }
}
