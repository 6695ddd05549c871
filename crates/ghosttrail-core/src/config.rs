// crates/ghosttrail-core/src/config.rs
//
// Effect configuration. Plain data, serializable so it can live in a JSON
// file next to the footage:
//
//   { "delay_depth": 24 }
//
// Missing fields fall back to their defaults. The CLI loads the file first
// and then applies any command-line overrides on top.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Depth used when neither the config file nor the command line sets one.
pub const DEFAULT_DELAY_DEPTH: usize = 10;

/// How the delayed reference frame is chosen, derived from the depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayMode {
    /// Depth 0: the first frame is the reference for the whole stream.
    Freeze,
    /// Depth k > 0: the reference trails the live frame by k frames.
    Window(usize),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Number of frames the delay queue holds. 0 selects freeze mode.
    pub delay_depth:       usize,
    /// Emit a progress event every this many output frames.
    pub progress_interval: u64,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            delay_depth:       DEFAULT_DELAY_DEPTH,
            progress_interval: 30,
        }
    }
}

impl EffectConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_delay_depth(mut self, depth: usize) -> Self {
        self.delay_depth = depth;
        self
    }

    pub fn mode(&self) -> DelayMode {
        match self.delay_depth {
            0 => DelayMode::Freeze,
            k => DelayMode::Window(k),
        }
    }
}
