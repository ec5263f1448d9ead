/// Elapsed time between consecutive ticks of one loop.
///
/// The result is reported and handed to PID compensators. Digital filters
/// never see it: they assume the period they were designed for.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickTimer {
    previous_us: Option<u32>,
}

impl TickTimer {
    /// Records `now_us` and returns the microseconds since the previous tick,
    /// zero on the first one. The counter may wrap between ticks.
    pub fn tick(&mut self, now_us: u32) -> u32 {
        let elapsed = self
            .previous_us
            .map_or(0, |previous| now_us.wrapping_sub(previous));
        self.previous_us = Some(now_us);
        elapsed
    }

    pub fn previous_us(&self) -> Option<u32> {
        self.previous_us
    }
}

pub fn micros_to_seconds(us: u32) -> f64 {
    us as f64 * 1e-6
}
