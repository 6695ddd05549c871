// crates/ghosttrail-core/src/media_types.rs
//
// Types that flow across the channel between ghosttrail-media and the CLI.
// No ffmpeg, just plain data.

use std::path::PathBuf;

/// Shape of the input as seen by the pipeline once it is opened.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamSummary {
    pub width:        u32,
    pub height:       u32,
    /// Index of the video stream in the input container.
    pub video_index:  usize,
    /// Total streams in the input; all non-video ones are copied untouched.
    pub stream_count: usize,
    /// Frame count advertised by the container (None if unknown).
    pub frames_hint:  Option<u64>,
    pub codec:        String,
}

/// Events sent from the pipeline thread.
#[derive(Clone, Debug)]
pub enum PipelineEvent {
    Started  { input: PathBuf, summary: StreamSummary, delay_depth: usize },
    Progress { frames: u64, total: Option<u64> },
    Done     { output: PathBuf, frames: u64 },
    Error    { msg: String },
}
