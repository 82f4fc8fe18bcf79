use std::sync::Arc;

use image::RgbaImage;

use crate::decode::composite::{Compositor, FrameSource};
use crate::store::frame::FrameStore;

/// Readiness contract between the scheduler and whatever prepares frames ahead of display.
///
/// `is_ready` must be a consistent snapshot: once it returns `true` for an index, `frame` returns
/// pixels for that index until a newer preparation evicts it.
pub trait FramePreparer: Send {
    /// Begin preparing `index`. Returns `true` when new work was started.
    fn prepare(&mut self, index: usize) -> bool;
    /// Return `true` when `index` has finished preparation.
    fn is_ready(&self, index: usize) -> bool;
    /// Pixels for a ready frame.
    fn frame(&self, index: usize) -> Option<Arc<RgbaImage>>;
    /// Stop background work. In-flight results must be discarded. Called at most once.
    fn shutdown(&mut self) {}
}

/// The two most recently prepared frames: the one on screen and the lookahead.
#[derive(Default)]
pub(crate) struct ReadySlots {
    slots: [Option<(usize, Arc<RgbaImage>)>; 2],
}

impl ReadySlots {
    pub(crate) fn get(&self, index: usize) -> Option<&Arc<RgbaImage>> {
        self.slots
            .iter()
            .flatten()
            .find(|(i, _)| *i == index)
            .map(|(_, img)| img)
    }

    pub(crate) fn insert(&mut self, index: usize, img: Arc<RgbaImage>) {
        if let Some(slot) = self.slots.iter_mut().flatten().find(|(i, _)| *i == index) {
            slot.1 = img;
            return;
        }
        self.slots.swap(0, 1);
        self.slots[1] = Some((index, img));
    }

    pub(crate) fn clear(&mut self) {
        self.slots = [None, None];
    }
}

/// Prepares frames synchronously inside [`prepare`](FramePreparer::prepare).
pub struct InlinePreparer<S: FrameSource = Compositor> {
    source: S,
    ready: ReadySlots,
}

impl<S: FrameSource> InlinePreparer<S> {
    /// Wrap any frame source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            ready: ReadySlots::default(),
        }
    }
}

impl InlinePreparer<Compositor> {
    /// Inline preparer compositing frames from `store`.
    pub fn compositing(store: Arc<FrameStore>) -> Self {
        Self::new(Compositor::new(store))
    }
}

impl<S: FrameSource> FramePreparer for InlinePreparer<S> {
    fn prepare(&mut self, index: usize) -> bool {
        if self.ready.get(index).is_some() {
            return false;
        }
        match self.source.render(index) {
            Ok(img) => {
                self.ready.insert(index, img);
                true
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "frame preparation failed");
                false
            }
        }
    }

    fn is_ready(&self, index: usize) -> bool {
        self.ready.get(index).is_some()
    }

    fn frame(&self, index: usize) -> Option<Arc<RgbaImage>> {
        self.ready.get(index).cloned()
    }

    fn shutdown(&mut self) {
        self.ready.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/preparer.rs"]
mod tests;
