/// Convenience result type used across the playback engine.
pub type PlaybackResult<T> = Result<T, PlaybackError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Timing-related non-readiness during a tick is never an error: it is reported through
/// [`PlaybackEvent::FrameMissed`](crate::PlaybackEvent::FrameMissed). `FrameNotReady` only surfaces
/// from pixel accessors asked for a frame the decode cursor has not produced yet.
#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    /// A frame store was accessed with an index `>= len`.
    #[error("index out of range: {index} (frame count {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of frames in the store.
        len: usize,
    },

    /// Pixels were requested for a frame that has not finished preparation.
    #[error("frame not ready: {index}")]
    FrameNotReady {
        /// Requested index.
        index: usize,
    },

    /// Structural invariant violation detected at construction or configuration time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Malformed or unsupported image data.
    #[error("decode error: {0}")]
    Decode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlaybackError {
    /// Build a [`PlaybackError::InvalidConfiguration`] value.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Build a [`PlaybackError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`PlaybackError::IndexOutOfRange`] value.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}

impl From<png::DecodingError> for PlaybackError {
    fn from(e: png::DecodingError) -> Self {
        Self::Decode(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
