//! Simulated roll/pitch airframe for exercising the loops off-target.
//!
//! Each axis is a rigid body driven by the mixer action:
//!
//! ```text
//! angle' = rate
//! rate'  = torque_gain · action − damping · rate
//! ```
//!
//! Angles are in degrees and rates in degrees per second, matching what the
//! estimator hands the loops on the vehicle. The action is held constant over
//! each integration step.

use nalgebra::Vector2;

use crate::error::SimError;
use crate::io::{Clock, Mixer, PilotInput, Sensors};

/// Roll and pitch state of the airframe.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AirframeState {
    pub roll: f64,
    pub pitch: f64,
    pub roll_rate: f64,
    pub pitch_rate: f64,
}

impl AirframeState {
    /// `[roll, pitch, roll_rate, pitch_rate]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.roll, self.pitch, self.roll_rate, self.pitch_rate]
    }

    pub fn from_array(arr: &[f64; 4]) -> Self {
        AirframeState {
            roll: arr[0],
            pitch: arr[1],
            roll_rate: arr[2],
            pitch_rate: arr[3],
        }
    }

    pub fn attitude(&self) -> Vector2<f64> {
        Vector2::new(self.roll, self.pitch)
    }

    pub fn rate(&self) -> Vector2<f64> {
        Vector2::new(self.roll_rate, self.pitch_rate)
    }
}

/// Response of each axis to the mixer action.
///
/// # Fields
///
/// * `torque_gain` - angular acceleration per unit of action (deg/s² per unit)
/// * `damping` - aerodynamic rate damping (1/s)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AirframeParams {
    pub torque_gain: Vector2<f64>,
    pub damping: Vector2<f64>,
}

impl Default for AirframeParams {
    fn default() -> Self {
        Self {
            torque_gain: Vector2::new(1.0e5, 1.0e5),
            damping: Vector2::new(1.0, 1.0),
        }
    }
}

impl AirframeParams {
    pub fn acceleration(&self, rate: Vector2<f64>, action: Vector2<f64>) -> Vector2<f64> {
        self.torque_gain.component_mul(&action) - self.damping.component_mul(&rate)
    }
}

/// ODE system of the two axes under a constant action.
pub struct AirframeOde {
    pub params: AirframeParams,
    pub action: Vector2<f64>,
}

impl fast_ode::DifferentialEquation<4> for AirframeOde {
    fn ode_dot_y(&self, _t: f64, y: &fast_ode::Coord<4>) -> (fast_ode::Coord<4>, bool) {
        let state = AirframeState::from_array(&y.0);
        let accel = self.params.acceleration(state.rate(), self.action);

        (
            fast_ode::Coord([state.roll_rate, state.pitch_rate, accel.x, accel.y]),
            true,
        )
    }
}

/// Integrates the airframe over `time_span` with `action` held.
///
/// # Errors
///
/// Returns [`SimError::IntegrationFailed`] when the solver stops early.
pub fn simulate_airframe(
    initial_state: AirframeState,
    params: AirframeParams,
    action: Vector2<f64>,
    time_span: (f64, f64),
    tolerance: f64,
) -> Result<AirframeState, SimError> {
    let ode = AirframeOde { params, action };

    let result = fast_ode::solve_ivp(
        &ode,
        time_span,
        fast_ode::Coord(initial_state.to_array()),
        |_, _| true,
        tolerance,
        tolerance * 10.0,
    );

    match result {
        fast_ode::IvpResult::FinalTimeReached(final_coord) => {
            Ok(AirframeState::from_array(&final_coord.0))
        }
        _ => Err(SimError::IntegrationFailed),
    }
}

/// Airframe plus the collaborators around it: pilot sticks, estimator, clock
/// and mixer.
#[derive(Clone, Debug)]
pub struct SimulatedVehicle {
    pub state: AirframeState,
    pub params: AirframeParams,
    pub reference: Vector2<f64>,
    pub motors_stopped: bool,
    /// Last roll and pitch action received from the mixer port.
    pub action: Vector2<f64>,
    pub time_us: u32,
    tolerance: f64,
}

impl SimulatedVehicle {
    pub fn new(params: AirframeParams) -> Self {
        Self {
            state: AirframeState::default(),
            params,
            reference: Vector2::zeros(),
            motors_stopped: false,
            action: Vector2::zeros(),
            time_us: 0,
            tolerance: 1e-9,
        }
    }

    /// Integrates `dt_us` microseconds under the last action and advances the
    /// clock. Stopped motors produce no torque.
    pub fn advance(&mut self, dt_us: u32) -> Result<(), SimError> {
        let action = self.applied_action();
        let dt = dt_us as f64 * 1e-6;
        self.state = simulate_airframe(self.state, self.params, action, (0.0, dt), self.tolerance)?;
        self.time_us = self.time_us.wrapping_add(dt_us);
        Ok(())
    }

    fn applied_action(&self) -> Vector2<f64> {
        if self.motors_stopped {
            Vector2::zeros()
        } else {
            self.action
        }
    }
}

impl PilotInput for SimulatedVehicle {
    fn pilot_reference(&self) -> Vector2<f64> {
        self.reference
    }

    fn motors_stopped(&self) -> bool {
        self.motors_stopped
    }
}

impl Sensors for SimulatedVehicle {
    fn measured_rate(&self) -> Vector2<f64> {
        self.state.rate()
    }

    fn measured_acceleration(&self) -> Vector2<f64> {
        let rate = self.state.rate();
        self.params.acceleration(rate, self.applied_action())
    }

    fn measured_attitude(&self) -> Vector2<f64> {
        self.state.attitude()
    }
}

impl Clock for SimulatedVehicle {
    fn micros(&self) -> u32 {
        self.time_us
    }
}

impl Mixer for SimulatedVehicle {
    fn publish_control_action(&mut self, action: Vector2<f64>) {
        self.action = action;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_constant_action_without_damping() {
        let params = AirframeParams {
            torque_gain: Vector2::new(2.0, 4.0),
            damping: Vector2::zeros(),
        };
        let final_state = simulate_airframe(
            AirframeState::default(),
            params,
            Vector2::new(1.0, -1.0),
            (0.0, 1.0),
            1e-9,
        )
        .unwrap();

        // angle = ½·k·u·t²
        assert_abs_diff_eq!(final_state.roll, 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(final_state.pitch, -2.0, epsilon = 1e-4);
        assert_abs_diff_eq!(final_state.roll_rate, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_damping_decays_rate() {
        let params = AirframeParams {
            torque_gain: Vector2::zeros(),
            damping: Vector2::new(1.0, 1.0),
        };
        let initial_state = AirframeState {
            roll_rate: 10.0,
            ..AirframeState::default()
        };
        let final_state =
            simulate_airframe(initial_state, params, Vector2::zeros(), (0.0, 1.0), 1e-9).unwrap();

        let decay = (-1.0f64).exp();
        assert_abs_diff_eq!(final_state.roll_rate, 10.0 * decay, epsilon = 1e-4);
        assert_abs_diff_eq!(final_state.roll, 10.0 * (1.0 - decay), epsilon = 1e-4);
    }

    #[test]
    fn test_stopped_vehicle_ignores_action() {
        let mut vehicle = SimulatedVehicle::new(AirframeParams::default());
        vehicle.publish_control_action(Vector2::new(0.1, 0.1));
        vehicle.motors_stopped = true;
        vehicle.advance(1_000).unwrap();

        assert_eq!(vehicle.state, AirframeState::default());
        assert_eq!(vehicle.micros(), 1_000);
    }
}
