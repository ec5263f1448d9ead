//! Read-back of the latest tick for the telemetry link.
//!
//! Frames are a flat run of little-endian `f32` values terminated by `\r\n`.
//! The ground station uplinks blocks of four little-endian `f32` values.

use heapless::Vec;
use nalgebra::Vector2;

use crate::error::TelemetryError;

/// Number of `f32` values in a snapshot frame: the timestamp, six roll/pitch
/// pairs and the four-slot total action.
pub const SNAPSHOT_VALUES: usize = 17;
pub const FRAME_TERMINATOR: [u8; 2] = *b"\r\n";
/// Fixed fourth slot of the total action read-back. It is a marker for the
/// ground station, not a computed value, and never reaches the mixer.
pub const TOTAL_READBACK_SLOT3: f32 = 0.5;
/// Encoded size of a snapshot frame.
pub const FRAME_LEN: usize = SNAPSHOT_VALUES * 4 + 2;
/// Size of an uplink block.
pub const UPLINK_LEN: usize = 16;

/// Values of the latest completed ticks of both loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSnapshot {
    /// Clock reading of the last rate tick.
    pub timestamp_us: u32,
    /// Scaled feedforward output of the rate loop.
    pub feedforward: Vector2<f64>,
    /// Scaled C2 output of the rate loop.
    pub feedback: Vector2<f64>,
    /// Roll and pitch action handed to the mixer.
    pub total: Vector2<f64>,
    /// Attitude model output.
    pub attitude_reference: Vector2<f64>,
    /// Rate model output.
    pub model_rate_reference: Vector2<f64>,
    /// Setpoint published to the rate loop.
    pub rate_setpoint: Vector2<f64>,
    /// C1 output.
    pub attitude_compensator: Vector2<f64>,
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self {
            timestamp_us: 0,
            feedforward: Vector2::zeros(),
            feedback: Vector2::zeros(),
            total: Vector2::zeros(),
            attitude_reference: Vector2::zeros(),
            model_rate_reference: Vector2::zeros(),
            rate_setpoint: Vector2::zeros(),
            attitude_compensator: Vector2::zeros(),
        }
    }
}

impl ControlSnapshot {
    /// Total action as read back by the ground station:
    /// `[roll, pitch, 0.0, TOTAL_READBACK_SLOT3]`.
    pub fn total_readback(&self) -> [f32; 4] {
        [
            self.total.x as f32,
            self.total.y as f32,
            0.0,
            TOTAL_READBACK_SLOT3,
        ]
    }

    /// Packs the snapshot into one frame.
    ///
    /// Layout: timestamp, feedforward, feedback, the four-slot
    /// [`total_readback`](Self::total_readback), attitude reference, model
    /// rate reference, rate setpoint and C1 output.
    ///
    /// Values are narrowed to `f32`. The timestamp is therefore exact only up
    /// to 2^24 µs (about 16.8 s); later readings are rounded to the nearest
    /// representable value.
    pub fn encode(&self) -> Result<Vec<u8, FRAME_LEN>, TelemetryError> {
        let mut frame = FrameBuilder::<FRAME_LEN>::new();
        frame.push(self.timestamp_us as f32)?;
        frame.push_pair(self.feedforward)?;
        frame.push_pair(self.feedback)?;
        for value in self.total_readback() {
            frame.push(value)?;
        }
        for pair in [
            self.attitude_reference,
            self.model_rate_reference,
            self.rate_setpoint,
            self.attitude_compensator,
        ] {
            frame.push_pair(pair)?;
        }
        frame.finish()
    }
}

/// Appends `f32` values to a fixed-capacity frame.
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder<const N: usize> {
    bytes: Vec<u8, N>,
}

impl<const N: usize> FrameBuilder<N> {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Appends one value, little-endian.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::FrameFull`] when `N` bytes would be exceeded.
    pub fn push(&mut self, value: f32) -> Result<(), TelemetryError> {
        self.extend(&value.to_le_bytes())
    }

    /// Appends the roll then the pitch value.
    pub fn push_pair(&mut self, pair: Vector2<f64>) -> Result<(), TelemetryError> {
        self.push(pair.x as f32)?;
        self.push(pair.y as f32)
    }

    /// Number of values pushed so far.
    pub fn len(&self) -> usize {
        self.bytes.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Terminates the frame.
    pub fn finish(mut self) -> Result<Vec<u8, N>, TelemetryError> {
        self.extend(&FRAME_TERMINATOR)?;
        Ok(self.bytes)
    }

    fn extend(&mut self, bytes: &[u8]) -> Result<(), TelemetryError> {
        self.bytes
            .extend_from_slice(bytes)
            .map_err(|_| TelemetryError::FrameFull { capacity: N })
    }
}

/// Decodes the leading uplink block, `None` when fewer than
/// [`UPLINK_LEN`] bytes arrived.
pub fn decode_uplink(bytes: &[u8]) -> Option<[f32; 4]> {
    let block = bytes.get(..UPLINK_LEN)?;
    let mut values = [0.0; 4];
    for (value, chunk) in values.iter_mut().zip(block.chunks_exact(4)) {
        *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Some(values)
}
