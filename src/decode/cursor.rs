use std::sync::Arc;

use image::RgbaImage;

use crate::decode::preparer::FramePreparer;

/// Lookahead position over a [`FramePreparer`].
///
/// Holds at most one outstanding request; `position` is the most recent index confirmed ready.
pub(crate) struct DecodeCursor {
    preparer: Box<dyn FramePreparer>,
    requested: Option<usize>,
    confirmed: usize,
    shut_down: bool,
}

impl DecodeCursor {
    pub(crate) fn new(preparer: Box<dyn FramePreparer>) -> Self {
        Self {
            preparer,
            requested: None,
            confirmed: 0,
            shut_down: false,
        }
    }

    /// Ask for `index` to be prepared, replacing any earlier request.
    ///
    /// Repeating a request that is not ready yet asks the preparer again, so a failed
    /// preparation is retried.
    pub(crate) fn request(&mut self, index: usize) {
        if self.shut_down {
            return;
        }
        if self.requested == Some(index) && self.preparer.is_ready(index) {
            return;
        }
        let started = self.preparer.prepare(index);
        tracing::trace!(index, started, "lookahead requested");
        self.requested = Some(index);
        self.poll(index);
    }

    /// Synchronous readiness check for `index`.
    pub(crate) fn poll(&mut self, index: usize) -> bool {
        if self.shut_down {
            return false;
        }
        let ready = self.preparer.is_ready(index);
        if ready && self.requested == Some(index) {
            self.confirmed = index;
        }
        ready
    }

    pub(crate) fn position(&self) -> usize {
        match self.requested {
            Some(i) if !self.shut_down && self.preparer.is_ready(i) => i,
            _ => self.confirmed,
        }
    }

    pub(crate) fn frame(&self, index: usize) -> Option<Arc<RgbaImage>> {
        if self.shut_down {
            return None;
        }
        self.preparer.frame(index)
    }

    pub(crate) fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.requested = None;
        self.preparer.shutdown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/cursor.rs"]
mod tests;
