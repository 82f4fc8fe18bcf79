use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{PlaybackError, PlaybackResult};
use crate::playback::state::PlayLimit;

/// Where frame preparation runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preparation {
    /// Composite synchronously on the timing thread.
    #[default]
    Inline,
    /// Composite on a dedicated worker thread.
    Worker,
}

/// Options controlling a [`PlaybackEngine`](crate::PlaybackEngine).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlaybackOpts {
    /// Override the resource's declared play limit.
    pub play_limit: Option<PlayLimit>,
    /// Where frame preparation runs.
    pub preparation: Preparation,
    /// Cap on display advances per tick. `None` uses the frame count; values are clamped to
    /// `1..=frame count`.
    pub max_advances_per_tick: Option<usize>,
}

impl PlaybackOpts {
    /// Parse options from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> PlaybackResult<Self> {
        let opts: Self = serde_json::from_reader(r)
            .map_err(|e| PlaybackError::invalid_config(format!("parse playback options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse options from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PlaybackResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PlaybackError::invalid_config(format!(
                "open playback options '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject values that cannot describe a working engine.
    pub fn validate(&self) -> PlaybackResult<()> {
        if self.max_advances_per_tick == Some(0) {
            return Err(PlaybackError::invalid_config(
                "max_advances_per_tick must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/opts.rs"]
mod tests;
