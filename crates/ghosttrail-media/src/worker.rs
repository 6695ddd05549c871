// crates/ghosttrail-media/src/worker.rs
//
// PipelineWorker: runs one pipeline on a background thread and hands its
// events back over a channel. The CLI only talks to the media layer through
// this type.

use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver};

use ghosttrail_core::media_types::PipelineEvent;

use crate::pipeline::{run_pipeline, PipelineSpec};

pub struct PipelineWorker {
    /// Started, Progress..., then exactly one of Done / Error.
    pub rx: Receiver<PipelineEvent>,
    handle: JoinHandle<()>,
}

impl PipelineWorker {
    /// Spawn the pipeline thread. Returns immediately.
    pub fn start(spec: PipelineSpec) -> Result<Self> {
        // Progress events are small; 64 lets the pipeline run ahead of a slow
        // consumer without blocking on every send.
        let (tx, rx) = bounded(64);
        let handle = thread::Builder::new()
            .name("ghosttrail-pipeline".into())
            .spawn(move || run_pipeline(spec, tx))?;
        Ok(Self { rx, handle })
    }

    /// Wait for the pipeline thread to exit.
    pub fn join(self) -> Result<()> {
        self.handle.join().map_err(|_| anyhow!("pipeline thread panicked"))
    }
}
