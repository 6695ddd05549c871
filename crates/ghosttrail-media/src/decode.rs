// crates/ghosttrail-media/src/decode.rs
//
// VideoDecoder: packet-in / frame-out wrapper around the input video codec.
//
// The decoder is fed with send_packet (or send_eof once demuxing is done) and
// then drained: every frame it can produce is converted to a core Frame and
// handed to the caller's sink. EAGAIN ends a drain normally (needs more
// input), as does EOF after flushing. Any other error aborts the pipeline.

use anyhow::{bail, Context, Result};
use log::debug;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::context::Input;
use ffmpeg::format::Pixel;
use ffmpeg::util::frame::video::Video as VideoFrame;

use ghosttrail_core::Frame;

use crate::helpers::yuv::frame_from_ffmpeg;

/// Reject every input pixel format except planar 8-bit YUV 4:2:0.
///
/// Full-range YUVJ420P has the same layout but is still refused: the effect
/// and the re-encode assume limited-range samples.
pub fn check_pixel_format(format: Pixel) -> Result<()> {
    if format != Pixel::YUV420P {
        bail!("unsupported pixel format {format:?}: only YUV420P input is handled");
    }
    Ok(())
}

pub struct VideoDecoder {
    decoder: ffmpeg::decoder::Video,
    decoded: VideoFrame,
    frames:  u64,
}

impl VideoDecoder {
    /// Open a decoder for stream `index` of `ictx`.
    ///
    /// Only 8-bit YUV 4:2:0 input is supported; anything else is rejected here
    /// rather than halfway through the stream.
    pub fn open(ictx: &Input, index: usize) -> Result<Self> {
        let stream = ictx.stream(index)
            .with_context(|| format!("no stream #{index} in input"))?;
        let ctx = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .context("copy video codec parameters")?;
        let decoder = ctx.decoder().video()
            .context("open video decoder")?;

        check_pixel_format(decoder.format())?;
        debug!("decoder open: {}x{} {:?}", decoder.width(), decoder.height(), decoder.format());

        Ok(Self { decoder, decoded: VideoFrame::empty(), frames: 0 })
    }

    /// Frames produced so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn send_packet(&mut self, packet: &ffmpeg::Packet) -> Result<()> {
        self.decoder.send_packet(packet).context("send packet to decoder")
    }

    /// Enter draining mode; the next `drain` returns every buffered frame.
    pub fn send_eof(&mut self) -> Result<()> {
        self.decoder.send_eof().context("flush decoder")
    }

    /// Pull every frame currently available and pass it to `sink`, in
    /// presentation order as the codec emits it.
    pub fn drain<F>(&mut self, mut sink: F) -> Result<()>
    where
        F: FnMut(Frame) -> Result<()>,
    {
        loop {
            match self.decoder.receive_frame(&mut self.decoded) {
                Ok(()) => {
                    let frame = frame_from_ffmpeg(&self.decoded)?;
                    self.frames += 1;
                    sink(frame)?;
                }
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::ffi::EAGAIN => return Ok(()),
                Err(ffmpeg::Error::Eof) => return Ok(()),
                Err(e) => return Err(e).context("receive frame from decoder"),
            }
        }
    }
}
