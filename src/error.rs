use thiserror::Error;

use crate::bank::{Axis, Role};

/// Startup-time configuration violations.
///
/// Every variant is raised while the controller bank is being built. Once a
/// [`ControlCore`](crate::ControlCore) exists, the per-tick paths cannot fail.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("filter has no coefficients")]
    EmptyFilter,

    #[error("filter order {order} exceeds the fixed capacity of {capacity} coefficients")]
    OrderTooLarge { order: usize, capacity: usize },

    #[error("numerator has {numerator} coefficients but denominator has {denominator}")]
    LengthMismatch {
        numerator: usize,
        denominator: usize,
    },

    #[error("leading denominator coefficient a[0] must be non-zero")]
    ZeroLeadingDenominator,

    #[error("coefficient {index} is not finite")]
    NonFiniteCoefficient { index: usize },

    #[error("output limit {0} must be finite and non-negative")]
    InvalidOutputLimit(f64),

    #[error(
        "{mantissa_bits}-bit mantissa is too coarse for a degree {degree} denominator \
         with pole radius {pole_radius:.6}; use double precision"
    )]
    InsufficientPrecision {
        degree: usize,
        pole_radius: f64,
        mantissa_bits: u32,
    },

    #[error("calibration gain {0} must be finite")]
    InvalidGain(f64),

    #[error("PID limits must be finite and non-negative")]
    InvalidPid,

    #[error("{axis:?} {role:?}: {source}")]
    Filter {
        axis: Axis,
        role: Role,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("failed to parse control configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Tags an error with the bank entry it was raised for.
    pub fn for_entry(self, axis: Axis, role: Role) -> Self {
        ConfigError::Filter {
            axis,
            role,
            source: Box::new(self),
        }
    }
}

/// Failures of the simulated airframe used to exercise the loops.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("integration did not reach the end of the time span")]
    IntegrationFailed,
}

/// Telemetry frame encoding failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("telemetry frame is full ({capacity} bytes)")]
    FrameFull { capacity: usize },
}
