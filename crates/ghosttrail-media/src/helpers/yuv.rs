// crates/ghosttrail-media/src/helpers/yuv.rs
//
// Conversion between ffmpeg YUV420P frames and ghosttrail_core::Frame.
//
// Both sides are strided; rows are copied one at a time so neither side's
// padding leaks into the other. The core frame keeps the decoder's stride so
// the overlay sees the same row layout ffmpeg produced.
//
// Chroma geometry differs for odd sizes: ffmpeg allocates ceil(w/2) x ceil(h/2)
// chroma samples, the core uses floor. On the way in the extra column/row is
// dropped; on the way out it is filled by repeating the last real sample so
// the encoder never sees uninitialised bytes.

use anyhow::{bail, Result};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::util::frame::video::Video as VideoFrame;

use ghosttrail_core::{Frame, Plane, PlaneKind};

use crate::decode::check_pixel_format;

fn opt_ts(ts: i64) -> Option<i64> {
    if ts == ffmpeg::ffi::AV_NOPTS_VALUE { None } else { Some(ts) }
}

/// Copy a decoded YUV420P frame into an owned core `Frame`.
///
/// pts is the decoder's best-effort timestamp; dts is the dts of the packet
/// that produced the frame.
pub fn frame_from_ffmpeg(src: &VideoFrame) -> Result<Frame> {
    check_pixel_format(src.format())?;

    let (w, h) = (src.width(), src.height());
    let copy = |kind: PlaneKind| -> Result<Plane> {
        let (pw, ph) = kind.dims(w, h);
        let stride   = src.stride(kind.index());
        let data     = src.data(kind.index());
        let len      = stride * ph;
        if data.len() < len {
            bail!("{kind:?} plane holds {} bytes, need {len}", data.len());
        }
        let mut plane = Plane::filled(kind, stride, pw, ph, 0)?;
        plane.data_mut().copy_from_slice(&data[..len]);
        Ok(plane)
    };

    let planes = [copy(PlaneKind::Y)?, copy(PlaneKind::Cb)?, copy(PlaneKind::Cr)?];
    let dts = opt_ts(src.packet().dts);

    Ok(Frame::from_planes(w, h, planes)?.with_timestamps(src.timestamp(), dts))
}

/// Write a core `Frame` into a freshly allocated ffmpeg YUV420P frame.
///
/// Timestamps are NOT copied; the caller rescales them into the encoder's
/// time base and sets them itself.
pub fn frame_to_ffmpeg(frame: &Frame) -> Result<VideoFrame> {
    let (w, h) = (frame.width(), frame.height());
    let mut out = VideoFrame::new(Pixel::YUV420P, w, h);
    // VideoFrame::new leaves the planes unallocated when av_frame_get_buffer fails.
    if out.data(0).is_empty() {
        return Err(ghosttrail_core::Error::Allocation { bytes: frame_bytes(w, h) }.into());
    }

    for kind in PlaneKind::ALL {
        let plane = frame.plane(kind);
        let idx   = kind.index();
        let dst_stride = out.stride(idx);
        let (dst_w, dst_h) = if kind.is_chroma() {
            (w.div_ceil(2) as usize, h.div_ceil(2) as usize)
        } else {
            (w as usize, h as usize)
        };
        let dst = out.data_mut(idx);

        for row in 0..dst_h {
            let line = &mut dst[row * dst_stride..row * dst_stride + dst_w];
            // 1-pixel-wide or -tall frames have empty chroma planes.
            if plane.width() == 0 || plane.height() == 0 {
                line.fill(128);
                continue;
            }
            // Rows past the logical height repeat the last real row.
            let src_row = plane.row(row.min(plane.height() - 1));
            line[..src_row.len()].copy_from_slice(src_row);
            let last = src_row[src_row.len() - 1];
            line[src_row.len()..].fill(last);
        }
    }

    Ok(out)
}

/// Unpadded size of a YUV420P picture as ffmpeg lays it out.
fn frame_bytes(w: u32, h: u32) -> usize {
    let (w, h) = (w as usize, h as usize);
    w * h + 2 * (w.div_ceil(2) * h.div_ceil(2))
}
