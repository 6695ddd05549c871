// crates/ghosttrail-media/src/probe.rs
//
// Open the input container and describe it: which stream is the video, its
// geometry, frame rate and time bases. Everything the later stages need is
// copied out into `InputLayout` so the stream borrows end here.

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, info};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::context::Input;
use ffmpeg::media::Type;
use ffmpeg::Rational;

use ghosttrail_core::media_types::StreamSummary;

/// Fallback when the container advertises no usable rate at all.
const FALLBACK_FRAME_RATE: Rational = Rational(25, 1);

#[derive(Clone, Debug)]
pub struct InputLayout {
    pub video_index: usize,
    pub width:       u32,
    pub height:      u32,
    /// Guessed video frame rate; the encoder time base is its inverse.
    pub frame_rate:  Rational,
    /// Time base of every input stream, indexed by stream index.
    pub time_bases:  Vec<Rational>,
    pub frames_hint: Option<u64>,
    pub codec:       String,
}

impl InputLayout {
    pub fn stream_count(&self) -> usize {
        self.time_bases.len()
    }

    pub fn summary(&self) -> StreamSummary {
        StreamSummary {
            width:        self.width,
            height:       self.height,
            video_index:  self.video_index,
            stream_count: self.stream_count(),
            frames_hint:  self.frames_hint,
            codec:        self.codec.clone(),
        }
    }
}

/// Open `path` for demuxing and print its stream table at info level.
pub fn open_input(path: &Path) -> Result<Input> {
    let ictx = ffmpeg::format::input(path)
        .with_context(|| format!("could not open input '{}'", path.display()))?;
    ffmpeg::format::context::input::dump(&ictx, 0, Some(&path.to_string_lossy()));
    Ok(ictx)
}

/// Find the single video stream and collect the layout of the whole input.
///
/// Inputs with no video stream, or with more than one, are rejected.
pub fn probe_input(ictx: &Input) -> Result<InputLayout> {
    let mut video = None;
    let mut time_bases = Vec::with_capacity(ictx.nb_streams() as usize);

    for stream in ictx.streams() {
        time_bases.push(stream.time_base());
        if stream.parameters().medium() != Type::Video {
            continue;
        }
        if let Some(first) = video {
            bail!("input has more than one video stream ({first} and {})", stream.index());
        }
        video = Some(stream.index());
    }

    let Some(video_index) = video else {
        bail!("input has no video stream");
    };
    let stream = ictx.stream(video_index).context("video stream vanished")?;

    let (width, height) = unsafe {
        let p = stream.parameters().as_ptr();
        ((*p).width as u32, (*p).height as u32)
    };
    let frame_rate  = guess_frame_rate(stream.avg_frame_rate(), stream.rate());
    let frames_hint = u64::try_from(stream.frames()).ok().filter(|&n| n > 0);
    let codec       = format!("{:?}", stream.parameters().id()).to_lowercase();

    info!(
        "video stream #{video_index}: {codec} {width}x{height} @ {}/{} fps, {} streams total",
        frame_rate.numerator(), frame_rate.denominator(), time_bases.len(),
    );
    debug!("input time bases: {time_bases:?}");

    Ok(InputLayout { video_index, width, height, frame_rate, time_bases, frames_hint, codec })
}

/// Pick the frame rate the encoder should assume.
///
/// Prefers the average rate, falls back to the container's base rate, and
/// finally to 25 fps when neither is valid.
pub fn guess_frame_rate(avg: Rational, base: Rational) -> Rational {
    let valid = |r: Rational| r.numerator() > 0 && r.denominator() > 0;
    if valid(avg) {
        avg
    } else if valid(base) {
        base
    } else {
        FALLBACK_FRAME_RATE
    }
}
