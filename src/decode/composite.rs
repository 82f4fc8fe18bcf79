use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::foundation::core::FrameRegion;
use crate::foundation::error::PlaybackResult;
use crate::store::frame::{BlendOp, DisposeOp, Frame, FrameStore};

/// Work that turns a frame index into displayable canvas pixels.
///
/// Implementations may be slow; callers decide whether to run them inline or on a worker.
pub trait FrameSource: Send + 'static {
    /// Produce the full-canvas image shown while frame `index` is displayed.
    fn render(&mut self, index: usize) -> PlaybackResult<Arc<RgbaImage>>;
}

/// Replays APNG disposal and blend rules onto a canvas-sized straight-alpha RGBA8 buffer.
///
/// Frames depend on the canvas left behind by their predecessors, so sequential requests are
/// incremental and a request for an earlier index replays from frame 0.
pub struct Compositor {
    store: Arc<FrameStore>,
    canvas: RgbaImage,
    next: usize,
}

impl Compositor {
    /// Create a compositor positioned before frame 0.
    pub fn new(store: Arc<FrameStore>) -> Self {
        let c = store.canvas();
        Self {
            canvas: RgbaImage::new(c.width, c.height),
            store,
            next: 0,
        }
    }

    /// Composite frame `index` and return a snapshot of the canvas while it is displayed.
    pub fn compose(&mut self, index: usize) -> PlaybackResult<RgbaImage> {
        self.store.frame_at(index)?;
        if index < self.next {
            self.canvas.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
            self.next = 0;
        }

        let store = Arc::clone(&self.store);
        let frames = store.frames();
        while self.next < index {
            self.draw(&frames[self.next], false);
            self.next += 1;
        }
        let out = self.draw(&frames[index], true);
        self.next = index + 1;
        Ok(out.unwrap_or_else(|| self.canvas.clone()))
    }

    fn draw(&mut self, frame: &Frame, snapshot: bool) -> Option<RgbaImage> {
        let saved = (frame.dispose == DisposeOp::Previous)
            .then(|| copy_region(&self.canvas, frame.region));

        let r = frame.region;
        for (sx, sy, src) in frame.pixels.enumerate_pixels() {
            let dst = self.canvas.get_pixel_mut(r.x + sx, r.y + sy);
            match frame.blend {
                BlendOp::Source => *dst = *src,
                BlendOp::Over => blend_over(&mut dst.0, src.0),
            }
        }

        let out = snapshot.then(|| self.canvas.clone());

        match frame.dispose {
            DisposeOp::None => {}
            DisposeOp::Background => fill_region(&mut self.canvas, r, Rgba([0, 0, 0, 0])),
            DisposeOp::Previous => {
                if let Some(saved) = saved {
                    for (sx, sy, px) in saved.enumerate_pixels() {
                        self.canvas.put_pixel(r.x + sx, r.y + sy, *px);
                    }
                }
            }
        }
        out
    }
}

impl FrameSource for Compositor {
    fn render(&mut self, index: usize) -> PlaybackResult<Arc<RgbaImage>> {
        self.compose(index).map(Arc::new)
    }
}

fn copy_region(canvas: &RgbaImage, r: FrameRegion) -> RgbaImage {
    RgbaImage::from_fn(r.width, r.height, |x, y| *canvas.get_pixel(r.x + x, r.y + y))
}

fn fill_region(canvas: &mut RgbaImage, r: FrameRegion, px: Rgba<u8>) {
    for y in r.y..r.y + r.height {
        for x in r.x..r.x + r.width {
            canvas.put_pixel(x, y, px);
        }
    }
}

/// Straight-alpha "over" in integer arithmetic, rounding to nearest.
pub(crate) fn blend_over(dst: &mut [u8; 4], src: [u8; 4]) {
    let sa = u32::from(src[3]);
    if sa == 255 {
        *dst = src;
        return;
    }
    if sa == 0 {
        return;
    }
    let da = u32::from(dst[3]);
    let inv = 255 - sa;
    // Output alpha scaled by 255.
    let out_a = sa * 255 + da * inv;
    if out_a == 0 {
        *dst = [0, 0, 0, 0];
        return;
    }
    for c in 0..3 {
        let s = u32::from(src[c]) * sa * 255;
        let d = u32::from(dst[c]) * da * inv;
        dst[c] = ((s + d + out_a / 2) / out_a) as u8;
    }
    dst[3] = ((out_a + 127) / 255) as u8;
}

#[cfg(test)]
#[path = "../../tests/unit/decode/composite.rs"]
mod tests;
