use std::time::{Duration, Instant};

/// Turns periodic wake-up instants into elapsed durations for [`tick`](crate::PlaybackEngine::tick).
///
/// Wake-ups may be late or coalesced; the reported elapsed time is whatever really passed, up
/// to the optional `max_elapsed` clamp.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisplayClock {
    last: Option<Instant>,
    max_elapsed: Option<Duration>,
}

impl DisplayClock {
    /// Create a clock. `max_elapsed` caps what a single wake-up can report.
    pub fn new(max_elapsed: Option<Duration>) -> Self {
        Self {
            last: None,
            max_elapsed,
        }
    }

    /// Report time since the previous wake-up. The first wake-up is zero.
    pub fn tick_at(&mut self, now: Instant) -> Duration {
        let elapsed = match self.last {
            Some(prev) => now.saturating_duration_since(prev),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        match self.max_elapsed {
            Some(max) => elapsed.min(max),
            None => elapsed,
        }
    }

    /// [`tick_at`](Self::tick_at) with the current instant.
    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    /// Restart from the next wake-up; time before it is never reported.
    pub fn resume(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clock/display.rs"]
mod tests;
