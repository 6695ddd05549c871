// crates/ghosttrail-cli/src/main.rs
//
// `ghosttrail <INPUT> <OUTPUT>`: apply the ghost-trail effect to a video
// file. Configuration is layered: built-in defaults, then the optional JSON
// file given with --config, then --delay on top.

mod helpers;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use ffmpeg_the_third as ffmpeg;

use ghosttrail_core::EffectConfig;
use ghosttrail_media::{PipelineEvent, PipelineSpec, PipelineWorker};

use helpers::format::{delay_label, progress_line};

#[derive(Parser, Debug)]
#[command(name = "ghosttrail", version, about = "Blend every frame with an inverted, delayed copy of the stream")]
struct Args {
    /// Input video (YUV 4:2:0)
    input: PathBuf,

    /// Output file; the container is picked from the extension
    output: PathBuf,

    /// Frames between the live frame and its ghost. 0 freezes the first frame.
    #[arg(short, long, value_name = "N")]
    delay: Option<usize>,

    /// JSON effect configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging for ghosttrail and ffmpeg
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn effect_config(&self) -> Result<EffectConfig> {
        let base = match &self.config {
            Some(path) => EffectConfig::load(path)
                .with_context(|| format!("loading config '{}'", path.display()))?,
            None => EffectConfig::default(),
        };
        Ok(match self.delay {
            Some(depth) => base.with_delay_depth(depth),
            None        => base,
        })
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();

    ffmpeg::util::log::set_level(if verbose {
        ffmpeg::util::log::Level::Debug
    } else {
        ffmpeg::util::log::Level::Warning
    });
}

fn run(args: Args) -> Result<()> {
    ffmpeg::init().context("FFmpeg init failed")?;

    let effect = args.effect_config()?;
    let worker = PipelineWorker::start(PipelineSpec {
        input:  args.input,
        output: args.output,
        effect,
    })?;

    let mut failure = None;
    for event in worker.rx.iter() {
        match event {
            PipelineEvent::Started { input, summary, delay_depth } => info!(
                "{}: {}x{} {}, ghost delay {}",
                input.display(), summary.width, summary.height, summary.codec,
                delay_label(delay_depth),
            ),
            PipelineEvent::Progress { frames, total } => info!("{}", progress_line(frames, total)),
            PipelineEvent::Done { output, frames } => {
                info!("wrote {} ({frames} frames)", output.display());
            }
            PipelineEvent::Error { msg } => failure = Some(msg),
        }
    }
    worker.join()?;

    match failure {
        Some(msg) => Err(anyhow::anyhow!(msg)),
        None      => Ok(()),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
