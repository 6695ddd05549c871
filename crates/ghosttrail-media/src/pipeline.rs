// crates/ghosttrail-media/src/pipeline.rs
//
// Decode → overlay → encode → remux, for one input file.
//
// Design:
//   • `PipelineSpec`: input path, output path, effect configuration.
//   • `run_pipeline()`: blocking, meant to run on its own thread (see
//     PipelineWorker). Sends Started once the output header is written,
//     Progress every `progress_interval` frames, then Done or Error.
//
// Stream handling:
//   Every input stream gets an output stream with copied parameters. Packets
//   from the video stream are decoded, run through the overlay and
//   re-encoded; every other packet is copied with its timestamps rescaled.
//
// Shutdown order:
//   demux EOF → flush decoder (remaining frames still go through the overlay
//   and encoder) → flush encoder → trailer. Any error aborts immediately; the
//   partially written output is left on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use log::{debug, error, info};

use ghosttrail_core::media_types::PipelineEvent;
use ghosttrail_core::{EffectConfig, Frame, FrameEffect, OverlayEngine};

use crate::decode::VideoDecoder;
use crate::encode::VideoEncoder;
use crate::mux::OutputMux;
use crate::probe::{open_input, probe_input};

#[derive(Clone, Debug)]
pub struct PipelineSpec {
    pub input:  PathBuf,
    pub output: PathBuf,
    pub effect: EffectConfig,
}

/// Run the whole pipeline, reporting through `tx`. Never panics on media
/// errors; they arrive as `PipelineEvent::Error`.
pub fn run_pipeline(spec: PipelineSpec, tx: Sender<PipelineEvent>) {
    match run(&spec, &tx) {
        Ok(frames) => {
            info!("done: {frames} frames → '{}'", spec.output.display());
            let _ = tx.send(PipelineEvent::Done { output: spec.output.clone(), frames });
        }
        Err(e) => {
            error!("pipeline failed: {e:#}");
            let _ = tx.send(PipelineEvent::Error { msg: format!("{e:#}") });
        }
    }
}

// ── Progress reporting ────────────────────────────────────────────────────────

struct Progress<'a> {
    tx:       &'a Sender<PipelineEvent>,
    interval: u64,
    total:    Option<u64>,
    frames:   u64,
}

impl Progress<'_> {
    fn tick(&mut self) {
        self.frames += 1;
        if self.interval > 0 && self.frames % self.interval == 0 {
            debug!("{} frames", self.frames);
            let _ = self.tx.send(PipelineEvent::Progress { frames: self.frames, total: self.total });
        }
    }
}

/// One decoded frame through the effect and into the encoder.
fn process_frame(
    frame:    Frame,
    effect:   &mut dyn FrameEffect,
    encoder:  &mut VideoEncoder,
    mux:      &mut OutputMux,
    progress: &mut Progress<'_>,
) -> Result<()> {
    let out = effect.apply(frame)
        .with_context(|| format!("{} on frame {}", effect.name(), progress.frames))?;
    encoder.send_frame(&out)?;
    encoder.drain(mux)?;
    progress.tick();
    Ok(())
}

// ── Internal implementation ───────────────────────────────────────────────────

fn run(spec: &PipelineSpec, tx: &Sender<PipelineEvent>) -> Result<u64> {
    let mut ictx  = open_input(&spec.input)?;
    let layout    = probe_input(&ictx)?;
    let video_idx = layout.video_index;

    let mut mux     = OutputMux::create(&spec.output, &ictx)?;
    let mut decoder = VideoDecoder::open(&ictx, video_idx)?;
    let mut encoder = VideoEncoder::open(
        &ictx,
        video_idx,
        layout.frame_rate,
        mux.wants_global_header(),
    )?;
    encoder.attach(&mut mux)?;
    mux.write_header()?;

    let mut engine = OverlayEngine::from_config(&spec.effect)?;
    info!("{} effect, {:?}", engine.name(), spec.effect.mode());
    let _ = tx.send(PipelineEvent::Started {
        input:       spec.input.clone(),
        summary:     layout.summary(),
        delay_depth: engine.depth(),
    });

    let mut progress = Progress {
        tx,
        interval: spec.effect.progress_interval,
        total:    layout.frames_hint,
        frames:   0,
    };

    // ── Demux loop ────────────────────────────────────────────────────────────
    for result in ictx.packets() {
        let (stream, mut packet) = result.context("read packet from input")?;
        let index = stream.index();

        if index == video_idx {
            decoder.send_packet(&packet)?;
            decoder.drain(|frame| {
                process_frame(frame, &mut engine, &mut encoder, &mut mux, &mut progress)
            })?;
        } else {
            mux.write(&mut packet, index, layout.time_bases[index])?;
        }
    }

    // ── Flush ─────────────────────────────────────────────────────────────────
    decoder.send_eof()?;
    decoder.drain(|frame| {
        process_frame(frame, &mut engine, &mut encoder, &mut mux, &mut progress)
    })?;

    encoder.send_eof()?;
    encoder.drain(&mut mux)?;
    debug!(
        "decoded {} frames, encoded {} packets, {} frames still in the delay queue",
        decoder.frames(), encoder.packets(), engine.queue().len(),
    );

    mux.finish()?;
    Ok(progress.frames)
}
