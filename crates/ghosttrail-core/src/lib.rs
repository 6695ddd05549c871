// crates/ghosttrail-core/src/lib.rs
//
// Pure frame data and pixel algorithms. No ffmpeg, no threads.
//
//   frame        owned YUV 4:2:0 frame with strided planes
//   delay_queue  fixed-depth delay line (freeze mode at depth 0)
//   overlay      invert + blend engine driven once per decoded frame
//   config       effect configuration (JSON)
//   media_types  events shared with ghosttrail-media and the CLI

pub mod config;
pub mod delay_queue;
pub mod error;
pub mod frame;
pub mod helpers;
pub mod media_types;
pub mod overlay;

pub use config::{DelayMode, EffectConfig};
pub use delay_queue::DelayQueue;
pub use error::{Error, Result};
pub use frame::{Frame, Plane, PlaneKind};
pub use overlay::{FrameEffect, OverlayEngine};
