use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;

use crate::decode::cursor::DecodeCursor;
use crate::decode::preparer::{FramePreparer, InlinePreparer};
use crate::decode::worker::WorkerPreparer;
use crate::foundation::error::{PlaybackError, PlaybackResult};
use crate::foundation::time::Timebase;
use crate::playback::events::{ObserverId, Observers, PlaybackEvent, PlaybackObserver};
use crate::playback::opts::{PlaybackOpts, Preparation};
use crate::playback::state::{PlayLimit, PlaybackState, TickOutcome};
use crate::store::frame::FrameStore;

type TeardownHook = Box<dyn FnOnce() + Send>;

/// Playback scheduler for one [`FrameStore`].
///
/// The host serializes calls (`tick`, `start`, `stop`) on one timing stream. Frame preparation
/// may run elsewhere; the engine only ever asks whether an index is ready.
pub struct PlaybackEngine {
    store: Arc<FrameStore>,
    timebase: Timebase,
    cursor: DecodeCursor,
    observers: Observers,
    teardown_hooks: Vec<TeardownHook>,
    state: PlaybackState,
    display: usize,
    accumulator: u128,
    loops: u32,
    play_limit: PlayLimit,
    advance_cap: usize,
    torn_down: bool,
}

impl PlaybackEngine {
    /// Build an engine whose preparer is chosen by `opts.preparation`.
    pub fn new(store: Arc<FrameStore>, opts: PlaybackOpts) -> PlaybackResult<Self> {
        opts.validate()?;
        let preparer: Box<dyn FramePreparer> = match opts.preparation {
            Preparation::Inline => Box::new(InlinePreparer::compositing(Arc::clone(&store))),
            Preparation::Worker => Box::new(WorkerPreparer::compositing(Arc::clone(&store))?),
        };
        Self::with_preparer(store, preparer, opts)
    }

    /// Build an engine around a caller-supplied preparer.
    ///
    /// Frame 0 and then frame 1 are requested before this returns.
    pub fn with_preparer(
        store: Arc<FrameStore>,
        preparer: Box<dyn FramePreparer>,
        opts: PlaybackOpts,
    ) -> PlaybackResult<Self> {
        opts.validate()?;
        let n = store.len();
        if n == 0 {
            return Err(PlaybackError::invalid_config(
                "frame store must contain at least one frame",
            ));
        }
        let advance_cap = opts.max_advances_per_tick.unwrap_or(n).clamp(1, n);
        let play_limit = opts.play_limit.unwrap_or(store.default_play_limit());

        let mut cursor = DecodeCursor::new(preparer);
        cursor.request(0);
        if n > 1 {
            cursor.request(1);
        }

        let timebase = store.timebase();
        tracing::debug!(
            frames = n,
            ?play_limit,
            advance_cap,
            units_per_sec = timebase.units_per_sec(),
            exact = timebase.is_exact(),
            "playback engine created"
        );
        Ok(Self {
            timebase,
            store,
            cursor,
            observers: Observers::default(),
            teardown_hooks: Vec::new(),
            state: PlaybackState::Stopped,
            display: 0,
            accumulator: 0,
            loops: 0,
            play_limit,
            advance_cap,
            torn_down: false,
        })
    }

    /// Enter `Playing`. Returns `false` when torn down or the play limit is already reached.
    pub fn start(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        if self.state == PlaybackState::Playing {
            return true;
        }
        if self.is_finished() {
            tracing::debug!(loops = self.loops, "start refused: play limit reached");
            return false;
        }
        self.state = PlaybackState::Playing;
        tracing::debug!(display = self.display, "playback started");
        true
    }

    /// Enter `Stopped`, keeping position and accumulated time.
    pub fn stop(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Stopped;
            tracing::debug!(display = self.display, "playback stopped");
        }
    }

    /// Replace the play limit. Checked at the next traversal completion.
    pub fn set_play_limit(&mut self, limit: PlayLimit) {
        self.play_limit = limit;
    }

    /// Feed elapsed wall time and advance the display cursor as far as it is due.
    pub fn tick(&mut self, elapsed: Duration) -> TickOutcome {
        let mut out = TickOutcome {
            displaying: self.display,
            ..TickOutcome::default()
        };
        if self.torn_down || self.state != PlaybackState::Playing {
            return out;
        }

        let n = self.store.len();
        self.accumulator = self
            .accumulator
            .saturating_add(self.timebase.units_of_std(elapsed));
        self.cursor.request((self.display + 1) % n);

        let mut steps = 0;
        while steps < self.advance_cap && self.state == PlaybackState::Playing {
            let Ok(due) = self.store.duration_units(self.display) else {
                break;
            };
            if self.accumulator < due {
                break;
            }
            let next = (self.display + 1) % n;

            if next == 0 && self.play_limit.is_reached(self.loops.saturating_add(1)) {
                self.accumulator -= due;
                let completed = self.loops;
                self.loops = self.loops.saturating_add(1);
                self.state = PlaybackState::Stopped;
                tracing::debug!(loops = self.loops, display = self.display, "all plays done");
                self.emit(PlaybackEvent::OnePlayDone {
                    loop_count: completed,
                });
                self.emit(PlaybackEvent::AllPlaysDone);
                break;
            }

            if !self.cursor.poll(next) {
                out.missed = Some(next);
                tracing::debug!(index = next, "frame missed");
                self.emit(PlaybackEvent::FrameMissed { index: next });
                break;
            }

            self.accumulator -= due;
            self.display = next;
            steps += 1;
            out.advanced += 1;
            tracing::trace!(display = next, "advanced");
            self.cursor.request((next + 1) % n);

            if next == 0 {
                let completed = self.loops;
                self.loops = self.loops.saturating_add(1);
                tracing::debug!(loop_count = completed, "play done");
                self.emit(PlaybackEvent::OnePlayDone {
                    loop_count: completed,
                });
            }
        }

        out.displaying = self.display;
        out
    }

    /// Register an observer. Observers run synchronously inside `tick`.
    pub fn subscribe(&mut self, observer: impl PlaybackObserver + 'static) -> ObserverId {
        self.observers.subscribe(Box::new(observer))
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Register a hook that runs once at teardown. Runs immediately if already torn down.
    pub fn on_teardown(&mut self, hook: impl FnOnce() + Send + 'static) {
        if self.torn_down {
            hook();
            return;
        }
        self.teardown_hooks.push(Box::new(hook));
    }

    /// Stop, release the preparer, drop observers and run teardown hooks. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.state = PlaybackState::Stopped;
        self.cursor.shutdown();
        tracing::debug!(
            observers = self.observers.len(),
            hooks = self.teardown_hooks.len(),
            "playback engine torn down"
        );
        self.observers.clear();
        for hook in self.teardown_hooks.drain(..) {
            hook();
        }
    }

    /// Return `true` while in `Playing`.
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Current run state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Index of the frame on screen.
    pub fn displaying_frame_index(&self) -> usize {
        self.display
    }

    /// Most recent index confirmed ready by the decode cursor.
    pub fn decode_index(&self) -> usize {
        self.cursor.position()
    }

    /// Completed traversals.
    pub fn loop_count(&self) -> u32 {
        self.loops
    }

    /// Active play limit.
    pub fn play_limit(&self) -> PlayLimit {
        self.play_limit
    }

    /// Time accumulated toward the current frame's interval.
    pub fn elapsed_in_frame(&self) -> Duration {
        self.timebase.to_std(self.accumulator)
    }

    /// Return `true` once the play limit has been reached.
    pub fn is_finished(&self) -> bool {
        self.play_limit.is_reached(self.loops)
    }

    /// Composited pixels of the frame on screen.
    pub fn displayed_frame(&self) -> PlaybackResult<Arc<RgbaImage>> {
        self.cursor
            .frame(self.display)
            .ok_or(PlaybackError::FrameNotReady {
                index: self.display,
            })
    }

    /// The frame store being played.
    pub fn store(&self) -> &Arc<FrameStore> {
        &self.store
    }

    /// Return `true` after `teardown`.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn emit(&mut self, event: PlaybackEvent) {
        if self.torn_down {
            return;
        }
        let control = self.observers.dispatch(&event);
        if control.teardown_requested() {
            self.teardown();
        } else if control.stop_requested() {
            self.stop();
        }
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("frames", &self.store.len())
            .field("state", &self.state)
            .field("display", &self.display)
            .field("loops", &self.loops)
            .field("play_limit", &self.play_limit)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/engine.rs"]
mod tests;
