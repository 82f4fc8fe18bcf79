use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 4).is_err());
    assert!(Canvas::new(4, 0).is_err());
    let c = Canvas::new(3, 2).unwrap();
    assert_eq!(c.rgba8_len(), 24);
}

#[test]
fn region_fit_boundaries() {
    let canvas = Canvas::new(10, 8).unwrap();
    assert!(canvas.full_region().fits(canvas));
    let r = FrameRegion {
        x: 6,
        y: 4,
        width: 4,
        height: 4,
    };
    assert!(r.fits(canvas));
    assert!(!FrameRegion { x: 7, ..r }.fits(canvas));
    assert!(!FrameRegion { width: 0, ..r }.fits(canvas));
    assert_eq!(r.area(), 16);
}

#[test]
fn region_fit_does_not_overflow() {
    let canvas = Canvas::new(10, 10).unwrap();
    let r = FrameRegion {
        x: u32::MAX,
        y: 0,
        width: 2,
        height: 1,
    };
    assert!(!r.fits(canvas));
}
