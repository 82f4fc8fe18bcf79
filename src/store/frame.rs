use std::time::Duration;

use image::RgbaImage;

use crate::foundation::core::{Canvas, FrameRegion};
use crate::foundation::error::{PlaybackError, PlaybackResult};
use crate::foundation::time::{FrameDuration, Timebase};
use crate::playback::state::PlayLimit;

/// How the frame's region is treated once its display interval ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposeOp {
    /// Leave the canvas as drawn.
    #[default]
    None,
    /// Clear the region to transparent black.
    Background,
    /// Restore the region to what it was before the frame was drawn.
    Previous,
}

/// How the frame's pixels are combined with the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendOp {
    /// Overwrite the region, alpha included.
    #[default]
    Source,
    /// Alpha-composite over the current canvas.
    Over,
}

/// One decoded animation frame, plus its frame-control metadata.
#[derive(Clone)]
pub struct Frame {
    /// Position in the store, `0..N-1`.
    pub index: usize,
    /// Straight-alpha RGBA8 pixels covering `region`.
    pub pixels: RgbaImage,
    /// Canvas rectangle updated by this frame.
    pub region: FrameRegion,
    /// Display duration.
    pub duration: FrameDuration,
    /// Disposal applied after display.
    pub dispose: DisposeOp,
    /// Blend applied when drawing.
    pub blend: BlendOp,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("index", &self.index)
            .field("region", &self.region)
            .field("duration", &self.duration)
            .field("dispose", &self.dispose)
            .field("blend", &self.blend)
            .field("pixels_len", &self.pixels.as_raw().len())
            .finish()
    }
}

/// Frame description used to build a [`FrameStore`]; the index is assigned by position.
#[derive(Clone, Debug)]
pub struct FrameSpec {
    /// Straight-alpha RGBA8 pixels covering `region`.
    pub pixels: RgbaImage,
    /// Canvas rectangle updated by this frame.
    pub region: FrameRegion,
    /// Display duration.
    pub duration: FrameDuration,
    /// Disposal applied after display.
    pub dispose: DisposeOp,
    /// Blend applied when drawing.
    pub blend: BlendOp,
}

impl FrameSpec {
    /// Full-canvas frame that replaces the canvas contents.
    pub fn full(pixels: RgbaImage, duration: FrameDuration) -> Self {
        let region = FrameRegion {
            x: 0,
            y: 0,
            width: pixels.width(),
            height: pixels.height(),
        };
        Self {
            pixels,
            region,
            duration,
            dispose: DisposeOp::None,
            blend: BlendOp::Source,
        }
    }
}

/// Immutable, indexable sequence of decoded frames for one resource.
///
/// Shared read-only (behind `Arc`) by the scheduler and any decode worker.
#[derive(Debug)]
pub struct FrameStore {
    canvas: Canvas,
    frames: Vec<Frame>,
    default_play_limit: PlayLimit,
    timebase: Timebase,
    units: Vec<u128>,
    total_units: u128,
}

impl FrameStore {
    /// Build a store from frame descriptions in display order.
    ///
    /// Fails with `InvalidConfiguration` when `specs` is empty or a frame does not fit the canvas.
    pub fn new(
        canvas: Canvas,
        specs: Vec<FrameSpec>,
        default_play_limit: PlayLimit,
    ) -> PlaybackResult<Self> {
        if specs.is_empty() {
            return Err(PlaybackError::invalid_config(
                "frame store must contain at least one frame",
            ));
        }
        if canvas.width == 0 || canvas.height == 0 {
            return Err(PlaybackError::invalid_config(
                "canvas width and height must be > 0",
            ));
        }

        let mut frames = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            if !spec.region.fits(canvas) {
                return Err(PlaybackError::invalid_config(format!(
                    "frame {index} region {:?} does not fit canvas {}x{}",
                    spec.region, canvas.width, canvas.height
                )));
            }
            if spec.pixels.dimensions() != (spec.region.width, spec.region.height) {
                return Err(PlaybackError::invalid_config(format!(
                    "frame {index} pixels are {:?}, region is {}x{}",
                    spec.pixels.dimensions(),
                    spec.region.width,
                    spec.region.height
                )));
            }
            frames.push(Frame {
                index,
                pixels: spec.pixels,
                region: spec.region,
                duration: spec.duration,
                dispose: spec.dispose,
                blend: spec.blend,
            });
        }

        let timebase = Timebase::for_durations(frames.iter().map(|f| f.duration));
        let units: Vec<u128> = frames.iter().map(|f| timebase.units_of(f.duration)).collect();
        let total_units = units.iter().sum();

        Ok(Self {
            canvas,
            frames,
            default_play_limit,
            timebase,
            units,
            total_units,
        })
    }

    /// Canvas dimensions.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Number of frames, always `>= 1`.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`; construction rejects empty stores.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Play limit declared by the resource (`num_plays`, where 0 means infinite).
    pub fn default_play_limit(&self) -> PlayLimit {
        self.default_play_limit
    }

    /// Borrow all frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Borrow the frame at `index`.
    pub fn frame_at(&self, index: usize) -> PlaybackResult<&Frame> {
        self.frames
            .get(index)
            .ok_or_else(|| PlaybackError::out_of_range(index, self.frames.len()))
    }

    /// Exact display duration of the frame at `index`.
    pub fn duration(&self, index: usize) -> PlaybackResult<FrameDuration> {
        self.frame_at(index).map(|f| f.duration)
    }

    /// Sum of all frame durations (one traversal).
    pub fn total_duration(&self) -> Duration {
        self.timebase.to_std(self.total_units)
    }

    pub(crate) fn timebase(&self) -> Timebase {
        self.timebase
    }

    pub(crate) fn duration_units(&self, index: usize) -> PlaybackResult<u128> {
        self.units
            .get(index)
            .copied()
            .ok_or_else(|| PlaybackError::out_of_range(index, self.units.len()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/frame.rs"]
mod tests;
