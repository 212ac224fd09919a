use cubeedit_render::DEFAULT_SIM_RATE_MS;

/// Fixed-timestep accumulator: turns variable frame times into whole ticks.
#[derive(Debug, Clone)]
pub struct SimClock {
    rate_ms: f64,
    accumulator: f64,
    max_ticks: u32,
}

impl SimClock {
    /// At most this many ticks are produced per frame; the rest is dropped.
    pub const DEFAULT_MAX_TICKS: u32 = 10;

    pub fn new(rate_ms: f64) -> Self {
        Self {
            rate_ms: if rate_ms > 0.0 { rate_ms } else { DEFAULT_SIM_RATE_MS },
            accumulator: 0.0,
            max_ticks: Self::DEFAULT_MAX_TICKS,
        }
    }

    pub fn rate_ms(&self) -> f64 {
        self.rate_ms
    }

    /// Time carried over to the next frame.
    pub fn pending_ms(&self) -> f64 {
        self.accumulator
    }

    /// Add one frame's elapsed time and return how many ticks to run.
    pub fn advance(&mut self, frame_ms: f64) -> u32 {
        if frame_ms.is_finite() && frame_ms > 0.0 {
            self.accumulator += frame_ms;
        }
        let mut ticks = 0;
        while self.accumulator >= self.rate_ms {
            self.accumulator -= self.rate_ms;
            ticks += 1;
            if ticks == self.max_ticks {
                tracing::debug!(dropped_ms = self.accumulator, "frame too long, ticks dropped");
                self.accumulator = 0.0;
                break;
            }
        }
        ticks
    }
}
