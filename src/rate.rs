use nalgebra::Vector2;

use crate::bank::{Axis, RateBank};
use crate::io::{Clock, Mixer, PilotInput, RateSample, Sensors};
use crate::reset::{ResetCoordinator, ResetPolicy};
use crate::shared::SharedRateSetpoint;
use crate::timing::{micros_to_seconds, TickTimer};

/// Values computed by the latest completed rate tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateOutputs {
    /// Scaled C2 output.
    pub feedback: Vector2<f64>,
    /// Scaled output of the two feedforward stages.
    pub feedforward: Vector2<f64>,
    /// `feedback + feedforward`, handed to the mixer as its roll and pitch
    /// slots.
    pub total: Vector2<f64>,
    /// Rate setpoint minus measured rate.
    pub rate_error: Vector2<f64>,
    /// Time since the previous rate tick.
    pub elapsed_us: u32,
}

impl Default for RateOutputs {
    fn default() -> Self {
        Self {
            feedback: Vector2::zeros(),
            feedforward: Vector2::zeros(),
            total: Vector2::zeros(),
            rate_error: Vector2::zeros(),
            elapsed_us: 0,
        }
    }
}

/// Inner loop: closes angular rate against the published setpoint and adds
/// a feedforward term shaped from the raw pilot reference.
///
/// Per axis:
///
/// ```text
/// feedback    = feedback_gain    · C2(setpoint − rate)
/// feedforward = feedforward_gain · stage2(stage1(reference))
/// total       = feedback + feedforward
/// ```
#[derive(Debug, Clone)]
pub struct RateLoop {
    bank: RateBank,
    resets: ResetCoordinator,
    timer: TickTimer,
    outputs: RateOutputs,
}

impl RateLoop {
    pub fn new(bank: RateBank, policy: ResetPolicy) -> Self {
        Self {
            bank,
            resets: ResetCoordinator::new(policy, "rate"),
            timer: TickTimer::default(),
            outputs: RateOutputs::default(),
        }
    }

    /// Reads the collaborators and the latest setpoint, runs one tick and
    /// hands the roll and pitch action to `mixer`.
    pub fn tick<M: Mixer>(
        &mut self,
        pilot: &impl PilotInput,
        sensors: &impl Sensors,
        clock: &impl Clock,
        setpoint: &SharedRateSetpoint,
        mixer: &mut M,
    ) -> RateOutputs {
        let outputs = self.step(&RateSample::read(pilot, sensors, clock), setpoint.latest());
        mixer.publish_control_action(outputs.total);
        outputs
    }

    /// Runs one tick against `setpoint`, the most recent value the attitude
    /// loop published. The two loops need not run at the same rate.
    pub fn step(&mut self, sample: &RateSample, setpoint: Vector2<f64>) -> RateOutputs {
        let elapsed_us = self.timer.tick(sample.now_us);
        let dt = micros_to_seconds(elapsed_us);
        let mut outputs = RateOutputs {
            elapsed_us,
            ..RateOutputs::default()
        };

        for axis in Axis::ALL {
            let i = axis.index();
            let bank = &mut self.bank.axes[i];

            let rate_error = setpoint[i] - sample.rate[i];
            let feedback = bank.feedback_gain
                * bank
                    .compensator
                    .update(rate_error, sample.rate[i], sample.acceleration[i], dt);

            let stage1 = bank.feedforward_stage1.update(sample.reference[i]);
            let feedforward = bank.feedforward_gain * bank.feedforward_stage2.update(stage1);

            outputs.rate_error[i] = rate_error;
            outputs.feedback[i] = feedback;
            outputs.feedforward[i] = feedforward;
            outputs.total[i] = feedback + feedforward;
        }

        self.resets.rate(sample.motors_stopped, &mut self.bank);
        self.outputs = outputs;
        outputs
    }

    pub fn outputs(&self) -> &RateOutputs {
        &self.outputs
    }

    pub fn bank(&self) -> &RateBank {
        &self.bank
    }

    pub fn resets(&self) -> &ResetCoordinator {
        &self.resets
    }
}
