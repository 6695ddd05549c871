// crates/ghosttrail-media/src/mux.rs
//
// OutputMux: the output container.
//
// One output stream is created per input stream, in the same order, with the
// input's codec parameters copied across. Non-video streams keep those
// parameters and their packets are passed straight through; the video stream
// has its parameters replaced by the opened encoder's (see VideoEncoder::attach)
// before the header is written.
//
// The muxer may change stream time bases in write_header, so they are only
// read back after it. Every packet is rescaled from the time base its writer
// knows into the stream's final one.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, info};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::context::{Input, Output};
use ffmpeg::{encoder, Packet, Rational};

pub struct OutputMux {
    octx:        Output,
    path:        PathBuf,
    /// Final per-stream time bases, filled by `write_header`.
    time_bases:  Vec<Rational>,
    packets:     u64,
}

impl OutputMux {
    /// Create the output file and mirror every input stream into it.
    pub fn create(path: &Path, ictx: &Input) -> Result<Self> {
        let mut octx = ffmpeg::format::output(path)
            .with_context(|| format!("could not open output '{}'", path.display()))?;

        for ist in ictx.streams() {
            // No safe API clears codec_tag, so the copy goes through FFI.
            unsafe {
                let ost = ffmpeg::ffi::avformat_new_stream(octx.as_mut_ptr(), std::ptr::null());
                if ost.is_null() {
                    bail!("failed to allocate output stream #{}", ist.index());
                }
                let ret = ffmpeg::ffi::avcodec_parameters_copy(
                    (*ost).codecpar,
                    ist.parameters().as_ptr(),
                );
                if ret < 0 {
                    bail!("avcodec_parameters_copy (stream #{}) failed: {ret}", ist.index());
                }
                // The input container's codec tag may not be valid in the output one.
                (*(*ost).codecpar).codec_tag = 0;
                (*ost).time_base = ist.time_base().into();
            }
        }
        debug!("output '{}': {} streams mirrored", path.display(), ictx.nb_streams());

        Ok(Self { octx, path: path.to_path_buf(), time_bases: Vec::new(), packets: 0 })
    }

    /// Whether the container wants codec extradata in the stream header.
    pub fn wants_global_header(&self) -> bool {
        unsafe {
            let oformat = (*self.octx.as_ptr()).oformat;
            !oformat.is_null() && ((*oformat).flags & ffmpeg::ffi::AVFMT_GLOBALHEADER as i32) != 0
        }
    }

    /// Replace stream `index`'s parameters with those of an opened encoder.
    pub(crate) fn adopt_encoder(
        &mut self,
        index:     usize,
        encoder:   &encoder::video::Encoder,
        time_base: Rational,
    ) -> Result<()> {
        if index >= self.octx.nb_streams() as usize {
            bail!("output has no stream #{index}");
        }
        // Stream::set_parameters requires AsPtr<AVCodecParameters>, which
        // the opened encoder does not implement, so go through FFI directly.
        unsafe {
            let ost = *(*self.octx.as_mut_ptr()).streams.add(index);
            let ret = ffmpeg::ffi::avcodec_parameters_from_context(
                (*ost).codecpar,
                encoder.as_ptr() as *mut ffmpeg::ffi::AVCodecContext,
            );
            if ret < 0 {
                bail!("avcodec_parameters_from_context (stream #{index}) failed: {ret}");
            }
            (*ost).time_base = time_base.into();
        }
        Ok(())
    }

    pub fn write_header(&mut self) -> Result<()> {
        ffmpeg::format::context::output::dump(&self.octx, 0, Some(&self.path.to_string_lossy()));
        self.octx.write_header()
            .with_context(|| format!("write header to '{}'", self.path.display()))?;
        self.time_bases = self.octx.streams().map(|s| s.time_base()).collect();
        Ok(())
    }

    /// Rescale `packet` from `src_tb` into stream `index`'s time base and
    /// write it interleaved.
    pub fn write(&mut self, packet: &mut Packet, index: usize, src_tb: Rational) -> Result<()> {
        let dst_tb = self.time_bases.get(index).copied()
            .with_context(|| format!("packet for stream #{index} before header or out of range"))?;
        packet.rescale_ts(src_tb, dst_tb);
        packet.set_stream(index);
        packet.set_position(-1);
        packet.write_interleaved(&mut self.octx)
            .with_context(|| format!("write packet (stream #{index})"))?;
        self.packets += 1;
        Ok(())
    }

    /// Write the trailer and close the file.
    pub fn finish(mut self) -> Result<()> {
        self.octx.write_trailer()
            .with_context(|| format!("write trailer to '{}'", self.path.display()))?;
        info!("wrote {} packets to '{}'", self.packets, self.path.display());
        Ok(())
    }
}
