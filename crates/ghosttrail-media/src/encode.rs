// crates/ghosttrail-media/src/encode.rs
//
// VideoEncoder: re-encodes overlay output with the input's own codec.
//
// The encoder context is built from the input stream's codec parameters, so
// size, pixel format, profile and bit rate all follow the source. Its time
// base is the inverse of the guessed input frame rate. Frame pts arrive in
// the input stream's time base and are rescaled on the way in; packets leave
// in the encoder time base and OutputMux rescales them to the muxer's.
//
// The rescale rounds. With variable frame rate input two source timestamps
// can land on the same encoder tick, which encoders reject, so every pts is
// pushed to at least one tick past the previous one.

use anyhow::{Context, Result};
use log::debug;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::context::Input;
use ffmpeg::util::mathematics::Rescale;
use ffmpeg::{codec, encoder, picture, Rational};

use ghosttrail_core::Frame;

use crate::helpers::yuv::frame_to_ffmpeg;
use crate::mux::OutputMux;

pub struct VideoEncoder {
    encoder:     encoder::video::Encoder,
    /// Time base of the frames handed to `send_frame`.
    input_tb:    Rational,
    time_base:   Rational,
    /// Last pts handed to the encoder, in `time_base`.
    last_pts:    Option<i64>,
    /// Output stream the packets belong to.
    stream:      usize,
    packets:     u64,
}

impl VideoEncoder {
    /// Open an encoder for the video stream described by `index` in `ictx`.
    ///
    /// `global_header` mirrors the muxer's GLOBALHEADER flag: when set, the
    /// codec puts its extradata in the stream header instead of every keyframe.
    pub fn open(
        ictx:          &Input,
        index:         usize,
        frame_rate:    Rational,
        global_header: bool,
    ) -> Result<Self> {
        let stream = ictx.stream(index)
            .with_context(|| format!("no stream #{index} in input"))?;
        let input_tb = stream.time_base();
        let params   = stream.parameters();
        let codec_id = params.id();

        let codec = encoder::find(codec_id)
            .with_context(|| format!("no encoder available for {codec_id:?}"))?;

        let ctx = codec::context::Context::from_parameters(params)
            .context("copy codec parameters into encoder")?;
        let mut enc = ctx.encoder().video()
            .context("create video encoder context")?;

        let time_base = frame_rate.invert();
        enc.set_time_base(time_base);
        enc.set_frame_rate(Some(frame_rate));
        if global_header {
            enc.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let encoder = enc.open_as_with(codec, ffmpeg::Dictionary::new())
            .with_context(|| format!("open {codec_id:?} encoder"))?;
        debug!(
            "encoder open: {codec_id:?} {}x{} tb {}/{}",
            encoder.width(), encoder.height(), time_base.numerator(), time_base.denominator(),
        );

        Ok(Self { encoder, input_tb, time_base, last_pts: None, stream: index, packets: 0 })
    }

    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// Copy the opened encoder's parameters onto the matching output stream.
    pub fn attach(&self, mux: &mut OutputMux) -> Result<()> {
        mux.adopt_encoder(self.stream, &self.encoder, self.time_base)
    }

    /// Queue one frame for encoding. Its pts is carried over, rescaled and
    /// kept strictly increasing.
    pub fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        let mut out = frame_to_ffmpeg(frame)?;
        let pts = frame.pts.map(|pts| {
            monotonic_pts(pts.rescale(self.input_tb, self.time_base), self.last_pts)
        });
        if pts.is_some() {
            self.last_pts = pts;
        }
        out.set_pts(pts);
        out.set_kind(picture::Type::None);
        self.encoder.send_frame(&out).context("send frame to encoder")
    }

    pub fn send_eof(&mut self) -> Result<()> {
        self.encoder.send_eof().context("flush encoder")
    }

    /// Write every packet the encoder has ready to `mux`.
    pub fn drain(&mut self, mux: &mut OutputMux) -> Result<()> {
        let mut pkt = ffmpeg::Packet::empty();
        loop {
            match self.encoder.receive_packet(&mut pkt) {
                Ok(()) => {
                    mux.write(&mut pkt, self.stream, self.time_base)?;
                    self.packets += 1;
                }
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::ffi::EAGAIN => return Ok(()),
                Err(ffmpeg::Error::Eof) => return Ok(()),
                Err(e) => return Err(e).context("receive packet from encoder"),
            }
        }
    }
}

/// `pts`, or one tick past `last` if rounding left it at or behind it.
fn monotonic_pts(pts: i64, last: Option<i64>) -> i64 {
    match last {
        Some(last) if pts <= last => last + 1,
        _ => pts,
    }
}
