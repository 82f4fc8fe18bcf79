use super::*;
use std::sync::Mutex;

/// Preparer whose readiness is toggled by the test.
#[derive(Clone, Default)]
struct Manual(Arc<Mutex<ManualState>>);

#[derive(Default)]
struct ManualState {
    ready: Vec<usize>,
    prepared: Vec<usize>,
    shutdowns: u32,
}

impl Manual {
    fn make_ready(&self, index: usize) {
        self.0.lock().unwrap().ready.push(index);
    }
}

impl FramePreparer for Manual {
    fn prepare(&mut self, index: usize) -> bool {
        self.0.lock().unwrap().prepared.push(index);
        true
    }
    fn is_ready(&self, index: usize) -> bool {
        self.0.lock().unwrap().ready.contains(&index)
    }
    fn frame(&self, index: usize) -> Option<Arc<RgbaImage>> {
        self.is_ready(index).then(|| Arc::new(RgbaImage::new(1, 1)))
    }
    fn shutdown(&mut self) {
        self.0.lock().unwrap().shutdowns += 1;
    }
}

#[test]
fn request_is_reissued_until_ready() {
    let m = Manual::default();
    let mut c = DecodeCursor::new(Box::new(m.clone()));
    c.request(1);
    c.request(1);
    assert_eq!(m.0.lock().unwrap().prepared, vec![1, 1]);
    m.make_ready(1);
    c.request(1);
    c.request(1);
    assert_eq!(m.0.lock().unwrap().prepared, vec![1, 1]);
}

#[test]
fn position_tracks_confirmed_readiness() {
    let m = Manual::default();
    let mut c = DecodeCursor::new(Box::new(m.clone()));
    assert_eq!(c.position(), 0);
    c.request(1);
    assert_eq!(c.position(), 0);
    assert!(!c.poll(1));
    m.make_ready(1);
    assert_eq!(c.position(), 1);
    assert!(c.poll(1));
    c.request(2);
    assert_eq!(c.position(), 1);
}

#[test]
fn shutdown_is_idempotent_and_hides_frames() {
    let m = Manual::default();
    m.make_ready(0);
    let mut c = DecodeCursor::new(Box::new(m.clone()));
    assert!(c.frame(0).is_some());
    c.shutdown();
    c.shutdown();
    assert_eq!(m.0.lock().unwrap().shutdowns, 1);
    assert!(c.frame(0).is_none());
    assert!(!c.poll(0));
    c.request(3);
    assert!(m.0.lock().unwrap().prepared.is_empty());
}
