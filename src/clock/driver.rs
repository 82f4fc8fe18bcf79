use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;

use crate::clock::display::DisplayClock;
use crate::foundation::error::{PlaybackError, PlaybackResult};
use crate::playback::engine::PlaybackEngine;

/// Dedicated timing thread that feeds an engine from a [`DisplayClock`].
pub struct PlaybackLoop;

impl PlaybackLoop {
    /// Spawn a thread that wakes every `interval` and ticks `engine`.
    ///
    /// The thread exits once the engine is stopped, finished or torn down, or when the returned
    /// handle is stopped. Start the engine before spawning.
    pub fn spawn(
        engine: Arc<Mutex<PlaybackEngine>>,
        interval: Duration,
    ) -> PlaybackResult<PlaybackLoopHandle> {
        Self::spawn_with_clock(engine, interval, DisplayClock::new(None))
    }

    /// Like [`spawn`](Self::spawn) with a caller-configured clock.
    pub fn spawn_with_clock(
        engine: Arc<Mutex<PlaybackEngine>>,
        interval: Duration,
        mut clock: DisplayClock,
    ) -> PlaybackResult<PlaybackLoopHandle> {
        if interval.is_zero() {
            return Err(PlaybackError::invalid_config(
                "playback loop interval must be > 0",
            ));
        }
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("apng-clock".to_owned())
            .spawn(move || {
                clock.resume();
                clock.tick();
                let mut wakes: u64 = 0;
                while !thread_stop.load(Ordering::Acquire) {
                    std::thread::sleep(interval);
                    let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
                    if engine.is_torn_down() || !engine.is_playing() {
                        break;
                    }
                    engine.tick(clock.tick());
                    wakes += 1;
                }
                tracing::debug!(wakes, "playback loop exiting");
            })
            .context("spawn playback loop thread")?;
        Ok(PlaybackLoopHandle {
            stop,
            handle: Some(handle),
        })
    }
}

/// Owner of a running [`PlaybackLoop`] thread.
pub struct PlaybackLoopHandle {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PlaybackLoopHandle {
    /// Return `true` once the thread has exited on its own or been stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Ask the thread to exit and wait for it. The engine keeps its state.
    pub fn stop(mut self) {
        self.join();
    }

    fn join(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("playback loop thread panicked");
        }
    }
}

impl Drop for PlaybackLoopHandle {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clock/driver.rs"]
mod tests;
