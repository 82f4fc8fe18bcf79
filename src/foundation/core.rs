use crate::foundation::error::{PlaybackError, PlaybackResult};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas with non-zero dimensions.
    pub fn new(width: u32, height: u32) -> PlaybackResult<Self> {
        if width == 0 || height == 0 {
            return Err(PlaybackError::invalid_config(
                "canvas width and height must be > 0",
            ));
        }
        Ok(Self { width, height })
    }

    /// Region covering the whole canvas.
    pub fn full_region(self) -> FrameRegion {
        FrameRegion {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }

    /// Number of bytes in a tightly packed RGBA8 buffer of this size.
    pub fn rgba8_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// Rectangle on the canvas updated by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRegion {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameRegion {
    /// Return `true` when the region is non-empty and lies fully inside `canvas`.
    pub fn fits(self, canvas: Canvas) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        let right = u64::from(self.x) + u64::from(self.width);
        let bottom = u64::from(self.y) + u64::from(self.height);
        right <= u64::from(canvas.width) && bottom <= u64::from(canvas.height)
    }

    /// Number of pixels covered.
    pub fn area(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
