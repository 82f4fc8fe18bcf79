use std::sync::{Arc, Mutex, PoisonError};

/// Notification raised synchronously from inside [`tick`](crate::PlaybackEngine::tick).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// The display cursor was due to advance to `index`, but it was not prepared yet.
    FrameMissed {
        /// Index that was not ready.
        index: usize,
    },
    /// A traversal finished; `loop_count` is the zero-based number of the finished traversal.
    ///
    /// The first traversal reports `0`, while [`loop_count`](crate::PlaybackEngine::loop_count)
    /// already reads `1` when this fires.
    OnePlayDone {
        /// Zero-based traversal number.
        loop_count: u32,
    },
    /// The play limit was reached; playback stopped on the final frame.
    AllPlaysDone,
}

/// Requests an observer can make of the engine that is dispatching to it.
///
/// Requests take effect once the current event has been delivered, before the scheduler
/// considers any further advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackControl {
    stop: bool,
    teardown: bool,
}

impl PlaybackControl {
    /// Stop playback, keeping the current position.
    pub fn request_stop(&mut self) {
        self.stop = true;
    }

    /// Tear the engine down; no observer is invoked afterwards.
    pub fn request_teardown(&mut self) {
        self.teardown = true;
    }

    /// Return `true` if a stop was requested.
    pub fn stop_requested(&self) -> bool {
        self.stop
    }

    /// Return `true` if a teardown was requested.
    pub fn teardown_requested(&self) -> bool {
        self.teardown
    }
}

/// Receiver of playback events.
///
/// Any `FnMut(&PlaybackEvent, &mut PlaybackControl) + Send` closure is an observer.
pub trait PlaybackObserver: Send {
    /// Handle one event.
    fn on_event(&mut self, event: &PlaybackEvent, control: &mut PlaybackControl);
}

impl<F> PlaybackObserver for F
where
    F: FnMut(&PlaybackEvent, &mut PlaybackControl) + Send,
{
    fn on_event(&mut self, event: &PlaybackEvent, control: &mut PlaybackControl) {
        self(event, control)
    }
}

/// Registration handle returned by [`subscribe`](crate::PlaybackEngine::subscribe).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    list: Vec<(ObserverId, Box<dyn PlaybackObserver>)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Box<dyn PlaybackObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.list.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.list.len();
        self.list.retain(|(i, _)| *i != id);
        self.list.len() != before
    }

    /// Deliver `event` in registration order. A teardown request ends delivery immediately.
    pub(crate) fn dispatch(&mut self, event: &PlaybackEvent) -> PlaybackControl {
        let mut control = PlaybackControl::default();
        for (_, observer) in &mut self.list {
            observer.on_event(event, &mut control);
            if control.teardown {
                break;
            }
        }
        control
    }

    pub(crate) fn len(&self) -> usize {
        self.list.len()
    }

    pub(crate) fn clear(&mut self) {
        self.list.clear();
    }
}

/// Cloneable observer that records every event it receives.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Arc<Mutex<Vec<PlaybackEvent>>>);

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events in delivery order.
    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Indices reported by `FrameMissed` events.
    pub fn missed(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlaybackEvent::FrameMissed { index } => Some(index),
                _ => None,
            })
            .collect()
    }

    /// Loop counts reported by `OnePlayDone` events.
    pub fn plays_done(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlaybackEvent::OnePlayDone { loop_count } => Some(loop_count),
                _ => None,
            })
            .collect()
    }

    /// Number of `AllPlaysDone` events.
    pub fn all_done_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, PlaybackEvent::AllPlaysDone))
            .count()
    }
}

impl PlaybackObserver for EventLog {
    fn on_event(&mut self, event: &PlaybackEvent, _control: &mut PlaybackControl) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/events.rs"]
mod tests;
