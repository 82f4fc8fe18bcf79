use std::num::NonZeroU32;

use crate::foundation::error::{PlaybackError, PlaybackResult};

/// Scheduler run state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Ticks are ignored; cursors and accumulator are preserved.
    #[default]
    Stopped,
    /// Ticks advance the display cursor.
    Playing,
}

/// Number of complete traversals after which playback stops on the final frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayLimit {
    /// Loop forever.
    #[default]
    Infinite,
    /// Stop after this many traversals.
    Finite(NonZeroU32),
}

impl PlayLimit {
    /// Build a finite limit; zero is rejected.
    pub fn finite(plays: u32) -> PlaybackResult<Self> {
        NonZeroU32::new(plays)
            .map(Self::Finite)
            .ok_or_else(|| PlaybackError::invalid_config("play limit must be > 0"))
    }

    /// Return `true` once `loops` completed traversals satisfy the limit.
    pub fn is_reached(self, loops: u32) -> bool {
        match self {
            Self::Infinite => false,
            Self::Finite(n) => loops >= n.get(),
        }
    }
}

/// What a single [`tick`](crate::PlaybackEngine::tick) did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Number of committed display advances.
    pub advanced: u32,
    /// Index that was due but not ready, if the tick stalled.
    pub missed: Option<usize>,
    /// Display cursor after the tick.
    pub displaying: usize,
}

#[cfg(test)]
#[path = "../../tests/unit/playback/state.rs"]
mod tests;
