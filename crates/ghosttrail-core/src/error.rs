// crates/ghosttrail-core/src/error.rs
//
// Error kinds raised by the core. Nothing here is retried: every variant is
// fatal to the current processing step and bubbles up to the pipeline driver,
// which aborts the run.

use std::path::PathBuf;

use thiserror::Error;

use crate::frame::PlaneKind;

#[derive(Debug, Error)]
pub enum Error {
    /// A frame or queue buffer could not be allocated.
    #[error("failed to allocate {bytes} bytes for a frame buffer")]
    Allocation { bytes: usize },

    /// A plane buffer is too small for its stride and row count.
    #[error("{plane:?} plane needs {expected} bytes (stride {stride}), got {actual}")]
    PlaneSize {
        plane:    PlaneKind,
        stride:   usize,
        expected: usize,
        actual:   usize,
    },

    /// A plane stride is narrower than the plane's logical width.
    #[error("{plane:?} plane stride {stride} is narrower than its width {width}")]
    StrideTooSmall {
        plane:  PlaneKind,
        stride: usize,
        width:  usize,
    },

    /// A plane's logical size does not match 4:2:0 geometry for the frame.
    #[error("{plane:?} plane is {}x{}, expected {}x{}", actual.0, actual.1, expected.0, expected.1)]
    PlaneGeometry {
        plane:    PlaneKind,
        expected: (usize, usize),
        actual:   (usize, usize),
    },

    /// Two frames that must be blended have different dimensions.
    #[error("frame is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}")]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w:   u32,
        actual_h:   u32,
    },

    /// The effect config file could not be read.
    #[error("could not read config '{}'", path.display())]
    ConfigIo {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The effect config file is not valid JSON for `EffectConfig`.
    #[error("invalid config '{}'", path.display())]
    ConfigParse {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
