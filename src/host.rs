use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::PlaybackResult;
use crate::playback::engine::PlaybackEngine;
use crate::playback::opts::PlaybackOpts;
use crate::store::frame::FrameStore;

/// Owner of one engine on behalf of a view: store swaps, visibility and teardown.
///
/// The engine never refers back to its host; the host drives it with explicit calls.
pub struct PlayerHost {
    engine: Option<PlaybackEngine>,
    opts: PlaybackOpts,
    auto_start_on_set: bool,
    attached: bool,
    resume_on_attach: bool,
}

impl PlayerHost {
    /// Host with no store. Engines created later use `opts`.
    pub fn new(opts: PlaybackOpts) -> Self {
        Self {
            engine: None,
            opts,
            auto_start_on_set: true,
            attached: true,
            resume_on_attach: false,
        }
    }

    /// Host playing `store` immediately when `auto_start` is set.
    pub fn with_store(
        store: Arc<FrameStore>,
        opts: PlaybackOpts,
        auto_start: bool,
    ) -> PlaybackResult<Self> {
        let mut host = Self::new(opts);
        host.auto_start_on_set = auto_start;
        host.set_store(Some(store))?;
        Ok(host)
    }

    /// Whether `set_store` starts playback.
    pub fn auto_start_on_set(&self) -> bool {
        self.auto_start_on_set
    }

    /// Choose whether `set_store` starts playback.
    pub fn set_auto_start_on_set(&mut self, auto_start: bool) {
        self.auto_start_on_set = auto_start;
    }

    /// Replace the store, tearing down the previous engine. `None` clears the host.
    pub fn set_store(&mut self, store: Option<Arc<FrameStore>>) -> PlaybackResult<()> {
        if let Some(mut old) = self.engine.take() {
            old.teardown();
        }
        self.resume_on_attach = false;
        let Some(store) = store else {
            return Ok(());
        };
        let mut engine = PlaybackEngine::new(store, self.opts.clone())?;
        if self.auto_start_on_set {
            if self.attached {
                engine.start();
            } else {
                self.resume_on_attach = true;
            }
        }
        self.engine = Some(engine);
        Ok(())
    }

    /// The view became visible. Resumes playback paused by [`detach`](Self::detach).
    pub fn attach(&mut self) {
        if self.attached {
            return;
        }
        self.attached = true;
        if std::mem::take(&mut self.resume_on_attach) {
            self.start_animating();
        }
    }

    /// The view left the screen. Pauses playback until the next [`attach`](Self::attach).
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.resume_on_attach = self.is_animating();
        if let Some(engine) = &mut self.engine {
            engine.stop();
        }
    }

    /// Return `true` while the view is attached.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Start playback. Returns `false` without a store or when the engine refuses.
    pub fn start_animating(&mut self) -> bool {
        self.engine.as_mut().is_some_and(PlaybackEngine::start)
    }

    /// Stop playback, keeping position.
    pub fn stop_animating(&mut self) {
        self.resume_on_attach = false;
        if let Some(engine) = &mut self.engine {
            engine.stop();
        }
    }

    /// Return `true` while the engine is playing.
    pub fn is_animating(&self) -> bool {
        self.engine.as_ref().is_some_and(PlaybackEngine::is_playing)
    }

    /// Current engine, if a store is set.
    pub fn engine(&self) -> Option<&PlaybackEngine> {
        self.engine.as_ref()
    }

    /// Mutable access to the current engine.
    pub fn engine_mut(&mut self) -> Option<&mut PlaybackEngine> {
        self.engine.as_mut()
    }

    /// Canvas size of the current store.
    pub fn intrinsic_size(&self) -> Option<Canvas> {
        self.engine.as_ref().map(|e| e.store().canvas())
    }

    /// Register a teardown hook on the current engine. Returns `false` without a store.
    pub fn on_teardown(&mut self, hook: impl FnOnce() + Send + 'static) -> bool {
        match &mut self.engine {
            Some(engine) => {
                engine.on_teardown(hook);
                true
            }
            None => false,
        }
    }
}

impl Drop for PlayerHost {
    fn drop(&mut self) {
        if let Some(engine) = &mut self.engine {
            engine.teardown();
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/host/host.rs"]
mod tests;
