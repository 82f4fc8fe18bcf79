use std::io::Cursor;
use std::num::NonZeroU32;
use std::path::Path;

use anyhow::Context;
use image::RgbaImage;

use crate::foundation::core::{Canvas, FrameRegion};
use crate::foundation::error::{PlaybackError, PlaybackResult};
use crate::foundation::time::FrameDuration;
use crate::playback::state::PlayLimit;
use crate::store::frame::{BlendOp, DisposeOp, FrameSpec, FrameStore};

/// Options controlling how encoded bytes become a [`FrameStore`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoadOpts {
    /// Duration given to frames whose `fcTL` delay numerator is zero.
    pub zero_delay_fallback_ms: u32,
    /// Duration of the single frame produced from a non-animated PNG.
    pub still_duration_ms: u32,
}

impl Default for LoadOpts {
    fn default() -> Self {
        Self {
            zero_delay_fallback_ms: 100,
            still_duration_ms: 100,
        }
    }
}

impl FrameStore {
    /// Decode APNG (or plain PNG) bytes into a frame store.
    ///
    /// A default image without an `fcTL` chunk is not part of the animation and is skipped. A plain
    /// PNG becomes one frame lasting [`LoadOpts::still_duration_ms`] that plays once.
    #[tracing::instrument(skip(bytes, opts), fields(len = bytes.len()))]
    pub fn from_apng_bytes(bytes: &[u8], opts: &LoadOpts) -> PlaybackResult<Self> {
        let zero_fallback = FrameDuration::from_millis(opts.zero_delay_fallback_ms)?;
        let still = FrameDuration::from_millis(opts.still_duration_ms)?;

        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder.read_info()?;

        let (width, height, actl, default_is_frame) = {
            let info = reader.info();
            (
                info.width,
                info.height,
                info.animation_control,
                info.frame_control.is_some(),
            )
        };
        let canvas = Canvas::new(width, height)?;
        let mut buf = vec![0u8; reader.output_buffer_size()];

        let Some(actl) = actl else {
            let out = reader.next_frame(&mut buf)?;
            let pixels = to_rgba8(&buf, &out)?;
            tracing::debug!(width, height, "decoded still PNG");
            return FrameStore::new(
                canvas,
                vec![FrameSpec::full(pixels, still)],
                PlayLimit::Finite(NonZeroU32::MIN),
            );
        };
        if actl.num_frames == 0 {
            return Err(PlaybackError::decode("acTL declares zero frames"));
        }

        if !default_is_frame {
            reader.next_frame(&mut buf)?;
        }

        let mut specs = Vec::with_capacity(actl.num_frames as usize);
        for i in 0..actl.num_frames {
            let out = reader.next_frame(&mut buf)?;
            let fc = reader
                .info()
                .frame_control
                .ok_or_else(|| PlaybackError::decode(format!("frame {i} has no fcTL chunk")))?;
            let pixels = to_rgba8(&buf, &out)?;

            let mut dispose = match fc.dispose_op {
                png::DisposeOp::None => DisposeOp::None,
                png::DisposeOp::Background => DisposeOp::Background,
                png::DisposeOp::Previous => DisposeOp::Previous,
            };
            // Nothing to restore before the first frame.
            if i == 0 && dispose == DisposeOp::Previous {
                dispose = DisposeOp::Background;
            }
            let blend = match fc.blend_op {
                png::BlendOp::Source => BlendOp::Source,
                png::BlendOp::Over => BlendOp::Over,
            };

            specs.push(FrameSpec {
                pixels,
                region: FrameRegion {
                    x: fc.x_offset,
                    y: fc.y_offset,
                    width: fc.width,
                    height: fc.height,
                },
                duration: FrameDuration::from_apng_delay(fc.delay_num, fc.delay_den, zero_fallback),
                dispose,
                blend,
            });
        }

        let limit = match NonZeroU32::new(actl.num_plays) {
            Some(n) => PlayLimit::Finite(n),
            None => PlayLimit::Infinite,
        };
        tracing::debug!(
            width,
            height,
            frames = specs.len(),
            plays = actl.num_plays,
            "decoded APNG"
        );
        FrameStore::new(canvas, specs, limit)
    }

    /// Read and decode an APNG file from disk.
    pub fn from_path(path: impl AsRef<Path>, opts: &LoadOpts) -> PlaybackResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
        Self::from_apng_bytes(&bytes, opts)
    }
}

/// Repack one decoded (EXPAND + STRIP_16) frame into tightly packed RGBA8.
fn to_rgba8(buf: &[u8], out: &png::OutputInfo) -> PlaybackResult<RgbaImage> {
    if out.bit_depth != png::BitDepth::Eight {
        return Err(PlaybackError::decode(format!(
            "unexpected bit depth {:?} after expansion",
            out.bit_depth
        )));
    }
    let w = out.width as usize;
    let h = out.height as usize;
    let channels = match out.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        png::ColorType::Indexed => {
            return Err(PlaybackError::decode("palette was not expanded"));
        }
    };
    if out.line_size < w * channels || buf.len() < out.line_size * h {
        return Err(PlaybackError::decode("decoded frame buffer is truncated"));
    }

    let mut rgba = Vec::with_capacity(w * h * 4);
    for row in buf.chunks(out.line_size).take(h) {
        let row = &row[..w * channels];
        match channels {
            1 => {
                for &g in row {
                    rgba.extend_from_slice(&[g, g, g, 255]);
                }
            }
            2 => {
                for px in row.chunks_exact(2) {
                    rgba.extend_from_slice(&[px[0], px[0], px[0], px[1]]);
                }
            }
            3 => {
                for px in row.chunks_exact(3) {
                    rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
            }
            _ => rgba.extend_from_slice(row),
        }
    }

    RgbaImage::from_raw(out.width, out.height, rgba)
        .ok_or_else(|| PlaybackError::decode("frame buffer does not match its dimensions"))
}

#[cfg(test)]
#[path = "../../tests/unit/store/apng.rs"]
mod tests;
