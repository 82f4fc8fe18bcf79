use super::*;
use crate::foundation::core::Canvas;
use crate::foundation::time::FrameDuration;
use crate::playback::state::PlayLimit;
use crate::store::frame::FrameSpec;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

fn patch(x: u32, y: u32, w: u32, h: u32, px: [u8; 4], dispose: DisposeOp, blend: BlendOp) -> FrameSpec {
    FrameSpec {
        pixels: RgbaImage::from_pixel(w, h, Rgba(px)),
        region: FrameRegion {
            x,
            y,
            width: w,
            height: h,
        },
        duration: FrameDuration::from_millis(10).unwrap(),
        dispose,
        blend,
    }
}

fn store(specs: Vec<FrameSpec>) -> Arc<FrameStore> {
    Arc::new(FrameStore::new(Canvas::new(4, 4).unwrap(), specs, PlayLimit::Infinite).unwrap())
}

#[test]
fn dispose_none_accumulates() {
    let s = store(vec![
        patch(0, 0, 4, 4, RED, DisposeOp::None, BlendOp::Source),
        patch(1, 1, 2, 2, BLUE, DisposeOp::None, BlendOp::Source),
    ]);
    let mut c = Compositor::new(s);
    let f1 = c.compose(1).unwrap();
    assert_eq!(f1.get_pixel(0, 0).0, RED);
    assert_eq!(f1.get_pixel(1, 1).0, BLUE);
}

#[test]
fn dispose_background_clears_region_for_next_frame() {
    let s = store(vec![
        patch(0, 0, 4, 4, RED, DisposeOp::Background, BlendOp::Source),
        patch(0, 0, 1, 1, BLUE, DisposeOp::None, BlendOp::Source),
    ]);
    let mut c = Compositor::new(s);
    let f0 = c.compose(0).unwrap();
    assert_eq!(f0.get_pixel(3, 3).0, RED);
    let f1 = c.compose(1).unwrap();
    assert_eq!(f1.get_pixel(0, 0).0, BLUE);
    assert_eq!(f1.get_pixel(3, 3).0, CLEAR);
}

#[test]
fn dispose_previous_restores_region() {
    let s = store(vec![
        patch(0, 0, 4, 4, RED, DisposeOp::None, BlendOp::Source),
        patch(0, 0, 2, 2, BLUE, DisposeOp::Previous, BlendOp::Source),
        patch(3, 3, 1, 1, BLUE, DisposeOp::None, BlendOp::Source),
    ]);
    let mut c = Compositor::new(s);
    let f1 = c.compose(1).unwrap();
    assert_eq!(f1.get_pixel(0, 0).0, BLUE);
    let f2 = c.compose(2).unwrap();
    assert_eq!(f2.get_pixel(0, 0).0, RED);
    assert_eq!(f2.get_pixel(3, 3).0, BLUE);
}

#[test]
fn random_access_matches_sequential() {
    let specs = vec![
        patch(0, 0, 4, 4, RED, DisposeOp::None, BlendOp::Source),
        patch(1, 0, 1, 4, BLUE, DisposeOp::Background, BlendOp::Source),
        patch(2, 0, 1, 4, [0, 255, 0, 128], DisposeOp::None, BlendOp::Over),
    ];
    let s = store(specs);
    let mut seq = Compositor::new(Arc::clone(&s));
    let sequential: Vec<_> = (0..3).map(|i| seq.compose(i).unwrap()).collect();

    let mut jumpy = Compositor::new(s);
    assert_eq!(jumpy.compose(2).unwrap(), sequential[2]);
    assert_eq!(jumpy.compose(0).unwrap(), sequential[0]);
    assert_eq!(jumpy.compose(1).unwrap(), sequential[1]);
}

#[test]
fn loop_restart_begins_from_transparent_canvas() {
    let s = store(vec![
        patch(0, 0, 1, 1, RED, DisposeOp::None, BlendOp::Source),
        patch(3, 3, 1, 1, BLUE, DisposeOp::None, BlendOp::Source),
    ]);
    let mut c = Compositor::new(s);
    c.compose(1).unwrap();
    let again = c.compose(0).unwrap();
    assert_eq!(again.get_pixel(3, 3).0, CLEAR);
}

#[test]
fn out_of_range_index_fails() {
    let s = store(vec![patch(0, 0, 4, 4, RED, DisposeOp::None, BlendOp::Source)]);
    let mut c = Compositor::new(s);
    assert!(c.compose(1).is_err());
}

#[test]
fn blend_over_half_alpha() {
    let mut dst = [255, 255, 255, 255];
    blend_over(&mut dst, [0, 0, 0, 128]);
    assert_eq!(dst[3], 255);
    assert_eq!(dst[0], 127);

    let mut clear = CLEAR;
    blend_over(&mut clear, [200, 100, 50, 128]);
    assert_eq!(clear, [200, 100, 50, 128]);

    let mut untouched = RED;
    blend_over(&mut untouched, [0, 255, 0, 0]);
    assert_eq!(untouched, RED);
}
