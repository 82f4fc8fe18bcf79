use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Context;
use image::RgbaImage;

use crate::decode::composite::{Compositor, FrameSource};
use crate::decode::preparer::{FramePreparer, ReadySlots};
use crate::foundation::error::PlaybackResult;
use crate::store::frame::FrameStore;

struct WorkerShared {
    ready: Mutex<ReadySlots>,
    queued: Mutex<Vec<usize>>,
    cancelled: AtomicBool,
    running: AtomicBool,
}

impl WorkerShared {
    fn ready(&self) -> MutexGuard<'_, ReadySlots> {
        self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Indices sent to the worker whose render has not finished, successfully or not.
    fn queued(&self) -> MutexGuard<'_, Vec<usize>> {
        self.queued.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, index: usize) {
        let mut queued = self.queued();
        if let Some(pos) = queued.iter().position(|i| *i == index) {
            queued.remove(pos);
        }
    }
}

/// Observes whether a [`WorkerPreparer`] thread is still alive, after the preparer is gone.
#[derive(Clone)]
pub struct WorkerLiveness(Arc<WorkerShared>);

impl WorkerLiveness {
    /// Return `true` while the worker thread has not exited.
    pub fn is_running(&self) -> bool {
        self.0.running.load(Ordering::Acquire)
    }

    /// Poll until the worker exits or `timeout` passes. Returns `true` if it exited.
    pub fn wait_for_exit(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_running() {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }
}

/// Runs a [`FrameSource`] on a dedicated thread fed by an `mpsc` channel.
///
/// Requests are prepared in the order they were made. An index whose render failed can be
/// requested again.
/// [`shutdown`](FramePreparer::shutdown) never blocks; a preparation already running finishes on
/// the worker and its result is discarded.
pub struct WorkerPreparer {
    tx: Option<mpsc::Sender<usize>>,
    shared: Arc<WorkerShared>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerPreparer {
    /// Spawn the worker thread for `source`.
    pub fn spawn<S: FrameSource>(source: S) -> PlaybackResult<Self> {
        let (tx, rx) = mpsc::channel::<usize>();
        let shared = Arc::new(WorkerShared {
            ready: Mutex::new(ReadySlots::default()),
            queued: Mutex::new(Vec::new()),
            cancelled: AtomicBool::new(false),
            running: AtomicBool::new(true),
        });
        let worker_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("apng-prepare".to_owned())
            .spawn(move || worker_loop(source, rx, worker_shared))
            .context("spawn frame preparation worker")?;
        Ok(Self {
            tx: Some(tx),
            shared,
            handle: Some(handle),
        })
    }

    /// Worker compositing frames from `store`.
    pub fn compositing(store: Arc<FrameStore>) -> PlaybackResult<Self> {
        Self::spawn(Compositor::new(store))
    }

    /// Handle that reports when the worker thread has exited.
    pub fn liveness(&self) -> WorkerLiveness {
        WorkerLiveness(Arc::clone(&self.shared))
    }
}

impl FramePreparer for WorkerPreparer {
    fn prepare(&mut self, index: usize) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };
        if self.is_ready(index) {
            return false;
        }
        let mut queued = self.shared.queued();
        if queued.contains(&index) {
            return false;
        }
        if tx.send(index).is_err() {
            tracing::warn!(index, "frame preparation worker is gone");
            return false;
        }
        queued.push(index);
        true
    }

    fn is_ready(&self, index: usize) -> bool {
        self.shared.ready().get(index).is_some()
    }

    fn frame(&self, index: usize) -> Option<Arc<RgbaImage>> {
        self.shared.ready().get(index).cloned()
    }

    fn shutdown(&mut self) {
        self.shared.cancelled.store(true, Ordering::Release);
        self.tx = None;
        self.shared.queued().clear();
        // Detach: the thread exits after any in-flight render and drops its source.
        self.handle = None;
        self.shared.ready().clear();
    }
}

impl Drop for WorkerPreparer {
    fn drop(&mut self) {
        if self.tx.is_some() {
            self.shutdown();
        }
    }
}

struct ExitFlag(Arc<WorkerShared>);

impl Drop for ExitFlag {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
    }
}

fn worker_loop<S: FrameSource>(mut source: S, rx: mpsc::Receiver<usize>, shared: Arc<WorkerShared>) {
    let _exit = ExitFlag(Arc::clone(&shared));
    while let Ok(index) = rx.recv() {
        if shared.cancelled.load(Ordering::Acquire) {
            break;
        }
        match source.render(index) {
            Ok(img) => {
                let mut ready = shared.ready();
                if shared.cancelled.load(Ordering::Acquire) {
                    break;
                }
                ready.insert(index, img);
                drop(ready);
                shared.finish(index);
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "frame preparation failed");
                shared.finish(index);
            }
        }
    }
    drop(source);
    tracing::trace!("frame preparation worker exiting");
}

#[cfg(test)]
#[path = "../../tests/unit/decode/worker.rs"]
mod tests;
