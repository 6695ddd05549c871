// crates/ghosttrail-media/src/lib.rs
//
// FFmpeg side of ghosttrail: demux, decode, encode, mux. The pixel work
// itself lives in ghosttrail-core; this crate only moves frames in and out
// of libav and reports progress over a channel.
//
//   probe     open the input, find the video stream
//   decode    packets → core frames (YUV420P only)
//   encode    core frames → packets, same codec as the input
//   mux       output container, stream copy for non-video packets
//   pipeline  the decode → overlay → encode → remux loop
//   worker    runs a pipeline on its own thread

mod helpers;

pub mod decode;
pub mod encode;
pub mod mux;
pub mod pipeline;
pub mod probe;
pub mod worker;

pub use pipeline::{run_pipeline, PipelineSpec};
pub use worker::PipelineWorker;
pub use ghosttrail_core::media_types::{PipelineEvent, StreamSummary};
