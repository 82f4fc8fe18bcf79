use super::*;
use crate::foundation::time::FrameDuration;
use crate::playback::events::EventLog;
use crate::playback::state::PlayLimit;
use crate::store::frame::FrameSpec;
use image::RgbaImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn ball(limit: PlayLimit) -> Arc<FrameStore> {
    let canvas = Canvas::new(8, 6).unwrap();
    let specs = (0..4)
        .map(|_| FrameSpec::full(RgbaImage::new(8, 6), FrameDuration::from_millis(100).unwrap()))
        .collect();
    Arc::new(FrameStore::new(canvas, specs, limit).unwrap())
}

fn counter(host: &mut PlayerHost) -> Arc<AtomicUsize> {
    let n = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&n);
    assert!(host.on_teardown(move || {
        c.fetch_add(1, Ordering::SeqCst);
    }));
    n
}

fn d(frac: f64) -> Duration {
    Duration::from_millis((100.0 * frac) as u64)
}

#[test]
fn empty_host_is_idle() {
    let mut host = PlayerHost::new(PlaybackOpts::default());
    assert!(host.engine().is_none());
    assert!(!host.is_animating());
    assert!(!host.start_animating());
    assert_eq!(host.intrinsic_size(), None);
    assert!(!host.on_teardown(|| {}));
}

#[test]
fn store_starts_playback_and_reports_size() {
    let host = PlayerHost::with_store(ball(PlayLimit::Infinite), PlaybackOpts::default(), true)
        .unwrap();
    assert!(host.is_animating());
    assert_eq!(host.intrinsic_size(), Some(Canvas::new(8, 6).unwrap()));
}

#[test]
fn drop_tears_down_exactly_once() {
    for auto in [true, false] {
        let mut host =
            PlayerHost::with_store(ball(PlayLimit::Infinite), PlaybackOpts::default(), auto)
                .unwrap();
        let hooks = counter(&mut host);
        drop(host);
        assert_eq!(hooks.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn replacing_store_tears_down_old_engine() {
    let mut host = PlayerHost::new(PlaybackOpts::default());
    host.set_auto_start_on_set(false);
    host.set_store(Some(ball(PlayLimit::Infinite))).unwrap();
    assert!(!host.is_animating());
    let first = counter(&mut host);
    host.set_store(Some(ball(PlayLimit::Infinite))).unwrap();
    assert_eq!(first.load(Ordering::SeqCst), 1);
    let second = counter(&mut host);
    host.set_store(None).unwrap();
    assert_eq!(second.load(Ordering::SeqCst), 1);
    assert!(host.engine().is_none());
}

#[test]
fn manual_start_after_set_without_auto_start() {
    let mut host =
        PlayerHost::with_store(ball(PlayLimit::Infinite), PlaybackOpts::default(), false).unwrap();
    let e = host.engine_mut().unwrap();
    assert_eq!(e.decode_index(), 1);
    e.tick(d(1.75));
    assert_eq!(e.displaying_frame_index(), 0);

    assert!(host.start_animating());
    let e = host.engine_mut().unwrap();
    e.tick(d(0.75));
    e.tick(d(1.0));
    assert_eq!(e.displaying_frame_index(), 1);
    assert_eq!(e.decode_index(), 2);
}

#[test]
fn animating_play_tracks_display_and_decode() {
    let mut host =
        PlayerHost::with_store(ball(PlayLimit::Infinite), PlaybackOpts::default(), true).unwrap();
    let log = EventLog::new();
    let e = host.engine_mut().unwrap();
    e.subscribe(log.clone());
    assert_eq!((e.displaying_frame_index(), e.decode_index()), (0, 1));
    e.tick(d(0.75));
    for (display, decode) in [(1, 2), (2, 3), (3, 0), (0, 1), (1, 2)] {
        e.tick(d(1.0));
        assert_eq!(e.displaying_frame_index(), display);
        assert_eq!(e.decode_index(), decode);
    }
    assert_eq!(log.plays_done(), vec![0]);
    assert!(log.missed().is_empty());
}

#[test]
fn stop_animating_holds_frame() {
    let mut host =
        PlayerHost::with_store(ball(PlayLimit::Infinite), PlaybackOpts::default(), true).unwrap();
    host.engine_mut().unwrap().tick(d(1.75));
    host.stop_animating();
    assert!(!host.is_animating());
    let e = host.engine_mut().unwrap();
    e.tick(d(1.0));
    assert_eq!((e.displaying_frame_index(), e.decode_index()), (1, 2));
}

#[test]
fn all_done_stops_on_final_frame() {
    let mut host = PlayerHost::with_store(
        ball(PlayLimit::finite(1).unwrap()),
        PlaybackOpts::default(),
        true,
    )
    .unwrap();
    let log = EventLog::new();
    let e = host.engine_mut().unwrap();
    e.subscribe(log.clone());
    e.tick(d(0.75));
    e.tick(d(3.0));
    assert_eq!((e.displaying_frame_index(), e.decode_index()), (3, 0));
    assert!(e.is_playing());
    assert_eq!(log.all_done_count(), 0);
    e.tick(d(1.0));
    assert_eq!(e.displaying_frame_index(), 3);
    assert!(!host.is_animating());
    assert_eq!(log.all_done_count(), 1);
}

#[test]
fn detach_pauses_and_attach_resumes_only_if_playing() {
    let mut host =
        PlayerHost::with_store(ball(PlayLimit::Infinite), PlaybackOpts::default(), true).unwrap();
    host.detach();
    assert!(!host.is_attached());
    assert!(!host.is_animating());
    host.attach();
    assert!(host.is_animating());

    host.stop_animating();
    host.detach();
    host.attach();
    assert!(!host.is_animating());
}

#[test]
fn store_set_while_detached_starts_on_attach() {
    let mut host = PlayerHost::new(PlaybackOpts::default());
    host.detach();
    host.set_store(Some(ball(PlayLimit::Infinite))).unwrap();
    assert!(!host.is_animating());
    host.attach();
    assert!(host.is_animating());
}
