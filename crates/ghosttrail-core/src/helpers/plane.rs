// crates/ghosttrail-core/src/helpers/plane.rs
//
// Plane geometry for planar YUV 4:2:0.
//
// Chroma planes are half the luma width and half the luma height, rounded
// DOWN. FFmpeg itself rounds odd dimensions up when it allocates chroma
// planes, so a decoded frame may carry one extra chroma row/column; the
// effect never reads or writes it.
//
//   [ Y  plane : width       x height       ]
//   [ Cb plane : width / 2   x height / 2   ]
//   [ Cr plane : width / 2   x height / 2   ]
//
// Use these helpers instead of hard-coding `/ 2` at call sites.

/// Logical (width, height) in samples of the luma plane.
#[inline]
pub fn luma_dims(w: u32, h: u32) -> (usize, usize) {
    (w as usize, h as usize)
}

/// Logical (width, height) in samples of one chroma plane.
///
/// ```
/// use ghosttrail_core::helpers::plane::chroma_dims;
/// assert_eq!(chroma_dims(1920, 1080), (960, 540));
/// assert_eq!(chroma_dims(5, 3),       (2, 1));
/// ```
#[inline]
pub fn chroma_dims(w: u32, h: u32) -> (usize, usize) {
    ((w / 2) as usize, (h / 2) as usize)
}

/// Byte length of a plane buffer with `rows` rows of `stride` bytes.
#[inline]
pub fn plane_len(stride: usize, rows: usize) -> usize {
    stride * rows
}
