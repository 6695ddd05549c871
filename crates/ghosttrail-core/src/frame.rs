// crates/ghosttrail-core/src/frame.rs
//
// Owned decoded video frame: three planar YUV 4:2:0 planes plus timing.
//
// Ownership rules:
//   • A `Frame` owns its plane buffers outright. There is no `Clone` impl;
//     deep copies go through `try_clone()` so allocation failure surfaces as
//     `Error::Allocation` instead of aborting the process.
//   • Whoever holds a `Frame` is its only owner. Handing a frame to the delay
//     queue moves it; the queue moves evicted frames back out.
//
// Geometry rules (checked by every constructor):
//   • Luma plane is width x height, chroma planes width/2 x height/2.
//   • stride >= plane width, buffer length == stride x plane height.
//   • Bytes past the logical width of a row are padding; nothing in the
//     effect reads or writes them.

use crate::error::{Error, Result};
use crate::helpers::plane::{chroma_dims, luma_dims, plane_len};

/// Which of the three planes of a 4:2:0 frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaneKind {
    Y,
    Cb,
    Cr,
}

impl PlaneKind {
    pub const ALL: [PlaneKind; 3] = [PlaneKind::Y, PlaneKind::Cb, PlaneKind::Cr];

    /// Index of this plane in FFmpeg's `data[]` / `linesize[]` arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            PlaneKind::Y  => 0,
            PlaneKind::Cb => 1,
            PlaneKind::Cr => 2,
        }
    }

    pub const fn is_chroma(self) -> bool {
        !matches!(self, PlaneKind::Y)
    }

    /// Logical (width, height) of this plane for a `w x h` frame.
    #[inline]
    pub fn dims(self, w: u32, h: u32) -> (usize, usize) {
        if self.is_chroma() { chroma_dims(w, h) } else { luma_dims(w, h) }
    }
}

/// Allocate `len` bytes set to `fill`, reporting failure instead of aborting.
fn try_alloc(len: usize, fill: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Allocation { bytes: len })?;
    buf.resize(len, fill);
    Ok(buf)
}

// ── Plane ─────────────────────────────────────────────────────────────────────

/// One 2-D sample grid with a possibly padded row stride.
#[derive(Debug)]
pub struct Plane {
    data:   Vec<u8>,
    stride: usize,
    width:  usize,
    height: usize,
}

impl Plane {
    /// Wrap an existing buffer. `kind` is only used for error reporting.
    pub fn new(
        kind:   PlaneKind,
        data:   Vec<u8>,
        stride: usize,
        width:  usize,
        height: usize,
    ) -> Result<Self> {
        if stride < width {
            return Err(Error::StrideTooSmall { plane: kind, stride, width });
        }
        let expected = plane_len(stride, height);
        if data.len() != expected {
            return Err(Error::PlaneSize {
                plane: kind,
                stride,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, stride, width, height })
    }

    /// Allocate a plane with every byte (padding included) set to `value`.
    pub fn filled(
        kind:   PlaneKind,
        stride: usize,
        width:  usize,
        height: usize,
        value:  u8,
    ) -> Result<Self> {
        let data = try_alloc(plane_len(stride, height), value)?;
        Self::new(kind, data, stride, width, height)
    }

    pub fn stride(&self) -> usize { self.stride }
    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    /// The whole buffer, padding included.
    pub fn data(&self) -> &[u8] { &self.data }
    pub fn data_mut(&mut self) -> &mut [u8] { &mut self.data }

    /// Logical samples of row `y` (padding excluded).
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// Iterate the logical rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Deep copy with the same stride.
    pub fn try_clone(&self) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(self.data.len())
            .map_err(|_| Error::Allocation { bytes: self.data.len() })?;
        data.extend_from_slice(&self.data);
        Ok(Self { data, stride: self.stride, width: self.width, height: self.height })
    }

    /// True when the logical samples match (strides may differ).
    pub fn same_samples(&self, other: &Plane) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.rows().zip(other.rows()).all(|(a, b)| a == b)
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// An owned decoded YUV 4:2:0 frame.
///
/// `pts` / `dts` are in the source stream's time base; `None` when the
/// decoder could not resolve one.
#[derive(Debug)]
pub struct Frame {
    planes:  [Plane; 3],
    width:   u32,
    height:  u32,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
}

impl Frame {
    /// Build a frame from three planes, checking 4:2:0 geometry.
    pub fn from_planes(width: u32, height: u32, planes: [Plane; 3]) -> Result<Self> {
        for kind in PlaneKind::ALL {
            let plane    = &planes[kind.index()];
            let expected = kind.dims(width, height);
            let actual   = (plane.width, plane.height);
            if expected != actual {
                return Err(Error::PlaneGeometry { plane: kind, expected, actual });
            }
        }
        Ok(Self { planes, width, height, pts: None, dts: None })
    }

    /// Allocate a frame whose planes are filled with `yuv` = (Y, Cb, Cr).
    ///
    /// `strides` are per plane, in `PlaneKind::index` order.
    pub fn filled(width: u32, height: u32, strides: [usize; 3], yuv: [u8; 3]) -> Result<Self> {
        let make = |kind: PlaneKind| {
            let (w, h) = kind.dims(width, height);
            Plane::filled(kind, strides[kind.index()], w, h, yuv[kind.index()])
        };
        Self::from_planes(width, height, [make(PlaneKind::Y)?, make(PlaneKind::Cb)?, make(PlaneKind::Cr)?])
    }

    /// Same frame with the given timestamps.
    pub fn with_timestamps(mut self, pts: Option<i64>, dts: Option<i64>) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    pub fn width(&self)  -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }

    pub fn plane(&self, kind: PlaneKind) -> &Plane {
        &self.planes[kind.index()]
    }

    pub fn plane_mut(&mut self, kind: PlaneKind) -> &mut Plane {
        &mut self.planes[kind.index()]
    }

    pub fn planes(&self) -> &[Plane; 3] {
        &self.planes
    }

    pub fn planes_mut(&mut self) -> &mut [Plane; 3] {
        &mut self.planes
    }

    /// Independent deep copy, timestamps included.
    pub fn try_clone(&self) -> Result<Self> {
        let [y, cb, cr] = &self.planes;
        Ok(Self {
            planes: [y.try_clone()?, cb.try_clone()?, cr.try_clone()?],
            width:  self.width,
            height: self.height,
            pts:    self.pts,
            dts:    self.dts,
        })
    }

    /// True when both frames have the same dimensions and logical samples.
    /// Timestamps and stride padding are ignored.
    pub fn same_pixels(&self, other: &Frame) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.planes.iter().zip(other.planes.iter()).all(|(a, b)| a.same_samples(b))
    }

    pub(crate) fn check_same_dims(&self, other: &Frame) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(Error::DimensionMismatch {
                expected_w: self.width,
                expected_h: self.height,
                actual_w:   other.width,
                actual_h:   other.height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_frame_has_420_geometry() {
        let f = Frame::filled(6, 4, [8, 4, 4], [16, 128, 128]).unwrap();
        assert_eq!(f.plane(PlaneKind::Y).width(), 6);
        assert_eq!(f.plane(PlaneKind::Y).height(), 4);
        assert_eq!(f.plane(PlaneKind::Cb).width(), 3);
        assert_eq!(f.plane(PlaneKind::Cr).height(), 2);
        assert_eq!(f.plane(PlaneKind::Y).data().len(), 8 * 4);
        assert_eq!(f.plane(PlaneKind::Cb).data().len(), 4 * 2);
    }

    #[test]
    fn odd_dimensions_round_chroma_down() {
        let f = Frame::filled(5, 3, [5, 2, 2], [0, 0, 0]).unwrap();
        assert_eq!(f.plane(PlaneKind::Cb).width(), 2);
        assert_eq!(f.plane(PlaneKind::Cb).height(), 1);
    }

    #[test]
    fn stride_narrower_than_width_rejected() {
        let err = Frame::filled(8, 2, [4, 4, 4], [0, 0, 0]).unwrap_err();
        assert!(matches!(err, Error::StrideTooSmall { plane: PlaneKind::Y, .. }));
    }

    #[test]
    fn wrong_buffer_length_rejected() {
        let err = Plane::new(PlaneKind::Cr, vec![0; 7], 4, 4, 2).unwrap_err();
        assert!(matches!(err, Error::PlaneSize { expected: 8, actual: 7, .. }));
    }

    #[test]
    fn mismatched_plane_geometry_rejected() {
        let y  = Plane::filled(PlaneKind::Y, 4, 4, 4, 0).unwrap();
        let cb = Plane::filled(PlaneKind::Cb, 4, 4, 4, 0).unwrap(); // should be 2x2
        let cr = Plane::filled(PlaneKind::Cr, 2, 2, 2, 0).unwrap();
        let err = Frame::from_planes(4, 4, [y, cb, cr]).unwrap_err();
        assert!(matches!(
            err,
            Error::PlaneGeometry { plane: PlaneKind::Cb, expected: (2, 2), actual: (4, 4) }
        ));
    }

    #[test]
    fn try_clone_is_independent() {
        let original = Frame::filled(4, 2, [4, 2, 2], [10, 20, 30])
            .unwrap()
            .with_timestamps(Some(7), Some(6));
        let mut copy = original.try_clone().unwrap();
        copy.plane_mut(PlaneKind::Y).row_mut(0)[0] = 99;

        assert_eq!(original.plane(PlaneKind::Y).sample(0, 0), 10);
        assert_eq!(copy.plane(PlaneKind::Y).sample(0, 0), 99);
        assert_eq!(copy.pts, Some(7));
        assert_eq!(copy.dts, Some(6));
    }

    #[test]
    fn same_pixels_ignores_padding_and_stride() {
        let a = Frame::filled(4, 2, [4, 2, 2], [1, 2, 3]).unwrap();
        let mut b = Frame::filled(4, 2, [16, 8, 8], [1, 2, 3]).unwrap();
        // Scribble over padding only.
        b.plane_mut(PlaneKind::Y).data_mut()[15] = 200;
        assert!(a.same_pixels(&b));

        b.plane_mut(PlaneKind::Cr).row_mut(0)[1] = 4;
        assert!(!a.same_pixels(&b));
    }

    #[test]
    fn plane_index_matches_ffmpeg_order() {
        assert_eq!(PlaneKind::Y.index(), 0);
        assert_eq!(PlaneKind::Cb.index(), 1);
        assert_eq!(PlaneKind::Cr.index(), 2);
    }
}
