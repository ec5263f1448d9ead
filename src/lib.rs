//! Two-degree-of-freedom model matching attitude control for multirotors.
//!
//! The crate is the control core of a flight controller. An outer attitude
//! loop shapes the pilot's roll and pitch angles through a reference model and
//! closes attitude error with a compensator; its output is the rate setpoint
//! of an inner rate loop, which closes angular rate and adds a feedforward
//! term shaped from the same pilot reference. Every block is a
//! [`DigitalFilter`] with fixed coefficients and symmetric output saturation.
//!
//! Sensor fusion, pilot input decoding and motor mixing are collaborators,
//! reached through the traits in [`io`]. [`sim`] provides a simulated airframe
//! that implements all of them.
//!
//! ```no_run
//! use model_matching::io::{AttitudeSample, Mixer, RateSample};
//! use model_matching::sim::{AirframeParams, SimulatedVehicle};
//! use model_matching::{ControlConfig, ControlCore};
//!
//! let mut core = ControlCore::new(&ControlConfig::default())?;
//! let mut vehicle = SimulatedVehicle::new(AirframeParams::default());
//! vehicle.reference.x = 10.0;
//!
//! for _ in 0..4000 {
//!     core.step_attitude(&AttitudeSample::read(&vehicle, &vehicle, &vehicle));
//!     let rate = core.step_rate(&RateSample::read(&vehicle, &vehicle, &vehicle));
//!     vehicle.publish_control_action(rate.total);
//!     vehicle.advance(1_000)?;
//! }
//! println!("roll {:.3} deg", vehicle.state.roll);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod attitude;
pub mod bank;
pub mod coefficients;
pub mod config;
pub mod control;
pub mod error;
pub mod feedback;
pub mod filter;
pub mod io;
pub mod pid;
pub mod rate;
pub mod reset;
pub mod shared;
pub mod sim;
pub mod telemetry;
pub mod timing;

pub use attitude::{AttitudeLoop, AttitudeOutputs};
pub use bank::{Axis, ControllerBank, Role};
pub use config::{AxisConfig, CompensatorConfig, ControlConfig, FilterConfig};
pub use control::ControlCore;
pub use error::{ConfigError, SimError, TelemetryError};
pub use feedback::FeedbackBlock;
pub use filter::{DigitalFilter, Sample, MAX_ORDER};
pub use rate::{RateLoop, RateOutputs};
pub use reset::ResetPolicy;
pub use shared::SharedRateSetpoint;
pub use telemetry::ControlSnapshot;
