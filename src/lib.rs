//! apng-playback drives Animated PNG frames at their authored rate.
//!
//! The engine keeps a lookahead decode cursor one frame ahead of what is on screen, so
//! compositing latency shows up as a reported missed frame rather than as stutter:
//!
//! - Load a [`FrameStore`] from APNG bytes or build one from decoded frames
//! - Create a [`PlaybackEngine`] and [`subscribe`](PlaybackEngine::subscribe) to its events
//! - Feed it elapsed time with [`tick`](PlaybackEngine::tick), or let a [`PlaybackLoop`] do it
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod clock;
pub(crate) mod decode;
pub(crate) mod host;
pub(crate) mod playback;
pub(crate) mod store;

pub use crate::foundation::core::{Canvas, FrameRegion};
pub use crate::foundation::error::{PlaybackError, PlaybackResult};
pub use crate::foundation::time::FrameDuration;

pub use crate::clock::display::DisplayClock;
pub use crate::clock::driver::{PlaybackLoop, PlaybackLoopHandle};
pub use crate::decode::composite::{Compositor, FrameSource};
pub use crate::decode::preparer::{FramePreparer, InlinePreparer};
pub use crate::decode::worker::{WorkerLiveness, WorkerPreparer};
pub use crate::host::PlayerHost;
pub use crate::playback::engine::PlaybackEngine;
pub use crate::playback::events::{
    EventLog, ObserverId, PlaybackControl, PlaybackEvent, PlaybackObserver,
};
pub use crate::playback::opts::{PlaybackOpts, Preparation};
pub use crate::playback::state::{PlayLimit, PlaybackState, TickOutcome};
pub use crate::store::apng::LoadOpts;
pub use crate::store::frame::{BlendOp, DisposeOp, Frame, FrameSpec, FrameStore};
