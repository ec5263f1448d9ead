//! Interfaces to the collaborators around the control core.
//!
//! Sensor fusion, pilot input decoding, the mixer and the hardware clock all
//! live outside this crate. The loops only need the accessors below; every
//! call is expected to be non-blocking.

use nalgebra::Vector2;

/// Pilot or autopilot commands.
pub trait PilotInput {
    /// Raw roll and pitch reference angles (deg).
    fn pilot_reference(&self) -> Vector2<f64>;

    /// Level signal: true while the motors are commanded to stop.
    fn motors_stopped(&self) -> bool;
}

/// Fused estimator outputs, already validated.
pub trait Sensors {
    /// Roll and pitch angular rate (deg/s).
    fn measured_rate(&self) -> Vector2<f64>;

    /// Roll and pitch angular acceleration (deg/s²).
    fn measured_acceleration(&self) -> Vector2<f64>;

    /// Roll and pitch Euler angles (deg).
    fn measured_attitude(&self) -> Vector2<f64>;
}

/// Consumer of the control action.
///
/// The mixer command has four slots `[roll, pitch, yaw, throttle]`. This core
/// only computes the first two; yaw and throttle belong to other subsystems
/// and are never written here.
pub trait Mixer {
    /// Hands over the roll and pitch slots of the action.
    ///
    /// # Arguments
    ///
    /// * `action` - Total roll and pitch action in mixer units.
    fn publish_control_action(&mut self, action: Vector2<f64>);
}

/// Free-running microsecond counter. Wraps at `u32::MAX`.
pub trait Clock {
    fn micros(&self) -> u32;
}

/// Inputs of one attitude-loop tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeSample {
    pub reference: Vector2<f64>,
    pub attitude: Vector2<f64>,
    /// Passed to a PID compensator as the derivative of attitude.
    pub rate: Vector2<f64>,
    pub motors_stopped: bool,
    pub now_us: u32,
}

impl AttitudeSample {
    pub fn read(pilot: &impl PilotInput, sensors: &impl Sensors, clock: &impl Clock) -> Self {
        Self {
            reference: pilot.pilot_reference(),
            attitude: sensors.measured_attitude(),
            rate: sensors.measured_rate(),
            motors_stopped: pilot.motors_stopped(),
            now_us: clock.micros(),
        }
    }
}

/// Inputs of one rate-loop tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub reference: Vector2<f64>,
    pub rate: Vector2<f64>,
    /// Only a PID compensator consumes it.
    pub acceleration: Vector2<f64>,
    pub motors_stopped: bool,
    pub now_us: u32,
}

impl RateSample {
    pub fn read(pilot: &impl PilotInput, sensors: &impl Sensors, clock: &impl Clock) -> Self {
        Self {
            reference: pilot.pilot_reference(),
            rate: sensors.measured_rate(),
            acceleration: sensors.measured_acceleration(),
            motors_stopped: pilot.motors_stopped(),
            now_us: clock.micros(),
        }
    }
}
