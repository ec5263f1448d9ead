use core::cell::Cell;

use critical_section::Mutex;
use nalgebra::Vector2;

use crate::telemetry::ControlSnapshot;

/// Rate setpoint handed from the attitude loop to the rate loop.
///
/// Single writer (attitude loop), single reader (rate loop). Both axes are
/// written and read inside one critical section, so the reader never sees a
/// roll value from one attitude tick paired with a pitch value from another.
/// Can live in a `static`.
pub struct SharedRateSetpoint {
    inner: Mutex<Cell<[f64; 2]>>,
}

impl SharedRateSetpoint {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new([0.0; 2])),
        }
    }

    pub fn publish(&self, setpoint: Vector2<f64>) {
        critical_section::with(|cs| self.inner.borrow(cs).set([setpoint.x, setpoint.y]));
    }

    /// Most recently published pair, zero before the first publish.
    pub fn latest(&self) -> Vector2<f64> {
        let [roll, pitch] = critical_section::with(|cs| self.inner.borrow(cs).get());
        Vector2::new(roll, pitch)
    }
}

impl Default for SharedRateSetpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for SharedRateSetpoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedRateSetpoint")
            .field("latest", &self.latest())
            .finish()
    }
}

/// Latest completed values of both loops, for telemetry read-back.
///
/// Each loop merges its own fields in one critical section at the end of its
/// tick, so a reader sees whole ticks only.
pub struct SharedSnapshot {
    inner: Mutex<Cell<ControlSnapshot>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(ControlSnapshot::default())),
        }
    }

    pub fn update(&self, apply: impl FnOnce(&mut ControlSnapshot)) {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let mut snapshot = cell.get();
            apply(&mut snapshot);
            cell.set(snapshot);
        });
    }

    pub fn latest(&self) -> ControlSnapshot {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }
}

impl Default for SharedSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for SharedSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedSnapshot")
            .field("latest", &self.latest())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SETPOINT: SharedRateSetpoint = SharedRateSetpoint::new();

    #[test]
    fn test_static_setpoint_publish() {
        assert_eq!(SETPOINT.latest(), Vector2::zeros());
        SETPOINT.publish(Vector2::new(1.5, -2.5));
        assert_eq!(SETPOINT.latest(), Vector2::new(1.5, -2.5));
    }

    #[test]
    fn test_pair_is_never_torn() {
        let shared = std::sync::Arc::new(SharedRateSetpoint::new());
        let writer = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    let v = i as f64;
                    shared.publish(Vector2::new(v, -v));
                }
            })
        };
        for _ in 0..10_000 {
            let latest = shared.latest();
            assert_eq!(latest.x, -latest.y);
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_snapshot_merge_keeps_other_fields() {
        let shared = SharedSnapshot::new();
        shared.update(|s| s.total = Vector2::new(1.0, 2.0));
        shared.update(|s| s.rate_setpoint = Vector2::new(3.0, 4.0));

        let latest = shared.latest();
        assert_eq!(latest.total, Vector2::new(1.0, 2.0));
        assert_eq!(latest.rate_setpoint, Vector2::new(3.0, 4.0));
    }
}
