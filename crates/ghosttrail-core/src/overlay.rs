// crates/ghosttrail-core/src/overlay.rs
//
// Ghost-trail overlay: blend each live frame with an inverted, time-delayed
// earlier frame.
//
// Per frame:
//   1. deep-copy the live frame and push the copy into the delay queue
//   2. take back the delayed frame (evicted, or a copy while warming up)
//   3. invert the delayed frame in place: s -> 255 - s
//   4. average it with the live frame, writing into the delayed frame's
//      buffers so no third frame is allocated
//   5. stamp the live frame's pts/dts onto the result and return it
//
// The blend reads from the live frame, not from the copy that went into the
// queue: the copy now belongs to the queue and may even have been dropped
// (freeze mode). Both hold identical samples.
//
// Only the logical region of each plane is touched: width x height for luma,
// width/2 x height/2 for chroma. Stride padding is left as it was.

use crate::config::EffectConfig;
use crate::delay_queue::DelayQueue;
use crate::error::Result;
use crate::frame::{Frame, Plane};

/// A per-frame transform the pipeline can drive.
///
/// Takes ownership of each decoded frame and returns the frame to encode.
/// Implementors may keep state across frames (the overlay keeps its delay
/// queue), so frames must be applied in decode order.
pub trait FrameEffect {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn apply(&mut self, frame: Frame) -> Result<Frame>;
}

/// Owns the delay queue for the lifetime of one video stream.
#[derive(Debug)]
pub struct OverlayEngine {
    queue:            DelayQueue,
    frames_processed: u64,
}

impl OverlayEngine {
    /// `depth == 0` freezes the delayed frame on the first frame seen.
    pub fn new(depth: usize) -> Result<Self> {
        Ok(Self { queue: DelayQueue::new(depth)?, frames_processed: 0 })
    }

    pub fn from_config(config: &EffectConfig) -> Result<Self> {
        Self::new(config.delay_depth)
    }

    pub fn depth(&self) -> usize {
        self.queue.capacity()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn queue(&self) -> &DelayQueue {
        &self.queue
    }

    /// Consume `current` and return the blended frame carrying its timing.
    pub fn overlay(&mut self, current: Frame) -> Result<Frame> {
        let current_copy = current.try_clone()?;
        let mut delayed = self.queue.push_pop(current_copy)?;
        delayed.check_same_dims(&current)?;

        invert_frame(&mut delayed);
        blend_frame(&mut delayed, &current);

        delayed.pts = current.pts;
        delayed.dts = current.dts;
        self.frames_processed += 1;

        Ok(delayed)
    }
}

impl FrameEffect for OverlayEngine {
    fn name(&self) -> &'static str {
        "ghost-trail"
    }

    fn apply(&mut self, frame: Frame) -> Result<Frame> {
        self.overlay(frame)
    }
}

// ── Pixel kernels ─────────────────────────────────────────────────────────────

/// Average of an inverted delayed sample and a live sample.
///
/// The sum of two u8 fits in u16, so the clamp never fires; it stays so the
/// result is provably in range.
///
/// ```
/// use ghosttrail_core::overlay::blend_sample;
/// assert_eq!(blend_sample(255, 255), 255);
/// assert_eq!(blend_sample(0, 255),   127);
/// assert_eq!(blend_sample(100, 51),  75);
/// ```
#[inline]
pub fn blend_sample(inverted: u8, current: u8) -> u8 {
    ((u16::from(inverted) + u16::from(current)) / 2).min(255) as u8
}

/// Invert the logical samples of one plane in place.
pub fn invert_plane(plane: &mut Plane) {
    for y in 0..plane.height() {
        for s in plane.row_mut(y) {
            *s = 255 - *s;
        }
    }
}

/// Blend `current` into `dst` (already inverted) row by row.
///
/// Planes must share logical dimensions; strides may differ.
pub fn blend_plane(dst: &mut Plane, current: &Plane) {
    debug_assert_eq!(
        (dst.width(), dst.height()),
        (current.width(), current.height()),
        "blend_plane: plane size mismatch",
    );
    for y in 0..dst.height() {
        let src = current.row(y);
        for (d, &c) in dst.row_mut(y).iter_mut().zip(src) {
            *d = blend_sample(*d, c);
        }
    }
}

pub fn invert_frame(frame: &mut Frame) {
    for plane in frame.planes_mut() {
        invert_plane(plane);
    }
}

pub fn blend_frame(dst: &mut Frame, current: &Frame) {
    for (d, c) in dst.planes_mut().iter_mut().zip(current.planes()) {
        blend_plane(d, c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::frame::PlaneKind;

    /// Frame whose samples vary per position so blends can be checked
    /// sample by sample. Strides are padded and the padding is set to 0xEE.
    fn gradient(w: u32, h: u32, seed: u8) -> Frame {
        let strides = [w as usize + 3, (w / 2) as usize + 5, (w / 2) as usize + 5];
        let mut f = Frame::filled(w, h, strides, [0xEE; 3]).unwrap();
        for kind in PlaneKind::ALL {
            let plane = f.plane_mut(kind);
            for y in 0..plane.height() {
                for (x, s) in plane.row_mut(y).iter_mut().enumerate() {
                    *s = seed
                        .wrapping_mul(7)
                        .wrapping_add((x * 31 + y * 17) as u8)
                        .wrapping_add(kind.index() as u8 * 50);
                }
            }
        }
        f
    }

    fn expected_blend(delayed: &Plane, current: &Plane, x: usize, y: usize) -> u8 {
        let v = (255 - u16::from(delayed.sample(x, y)) + u16::from(current.sample(x, y))) / 2;
        v.min(255) as u8
    }

    #[test]
    fn blend_matches_formula_on_every_plane() {
        // Freeze mode: the delayed frame is always B (first frame).
        let mut engine = OverlayEngine::new(0).unwrap();
        let b = gradient(8, 6, 3);
        let a = gradient(8, 6, 90);

        engine.overlay(b.try_clone().unwrap()).unwrap();
        let out = engine.overlay(a.try_clone().unwrap()).unwrap();

        for kind in PlaneKind::ALL {
            let (bp, ap, op) = (b.plane(kind), a.plane(kind), out.plane(kind));
            for y in 0..op.height() {
                for x in 0..op.width() {
                    assert_eq!(op.sample(x, y), expected_blend(bp, ap, x, y), "{kind:?} ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn chroma_loops_cover_half_resolution_only() {
        let mut engine = OverlayEngine::new(0).unwrap();
        let frame = gradient(7, 5, 11);
        let out = engine.overlay(frame).unwrap();

        for kind in [PlaneKind::Cb, PlaneKind::Cr] {
            let plane = out.plane(kind);
            assert_eq!((plane.width(), plane.height()), (3, 2));
            // Padding bytes after the logical width keep their fill value.
            for y in 0..plane.height() {
                let pad = &plane.data()[y * plane.stride() + plane.width()..(y + 1) * plane.stride()];
                assert!(pad.iter().all(|&b| b == 0xEE), "{kind:?} row {y} padding touched");
            }
        }
        let luma = out.plane(PlaneKind::Y);
        let pad = &luma.data()[luma.width()..luma.stride()];
        assert!(pad.iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn first_frame_blends_against_its_own_inverse() {
        // s and 255 - s average to 127 everywhere.
        let mut engine = OverlayEngine::new(3).unwrap();
        let out = engine.overlay(gradient(4, 4, 42)).unwrap();
        for plane in out.planes() {
            assert!(plane.rows().all(|row| row.iter().all(|&s| s == 127)));
        }
    }

    #[test]
    fn output_carries_current_timestamps() {
        let mut engine = OverlayEngine::new(1).unwrap();
        let f1 = gradient(4, 2, 1).with_timestamps(Some(1000), Some(990));
        let f2 = gradient(4, 2, 2).with_timestamps(Some(2000), Some(1990));

        let out1 = engine.overlay(f1).unwrap();
        assert_eq!((out1.pts, out1.dts), (Some(1000), Some(990)));

        // out2 is built from the evicted F1 buffer but must carry F2's timing.
        let out2 = engine.overlay(f2).unwrap();
        assert_eq!((out2.pts, out2.dts), (Some(2000), Some(1990)));
    }

    #[test]
    fn missing_timestamps_carry_over_as_none() {
        let mut engine = OverlayEngine::new(1).unwrap();
        engine.overlay(gradient(4, 2, 1).with_timestamps(Some(5), Some(5))).unwrap();
        let out = engine.overlay(gradient(4, 2, 2)).unwrap();
        assert_eq!((out.pts, out.dts), (None, None));
    }

    #[test]
    fn depth_one_blends_against_previous_frame() {
        let mut engine = OverlayEngine::new(1).unwrap();
        let frames: Vec<Frame> = (1..=3).map(|s| gradient(4, 4, s * 20)).collect();
        let copies: Vec<Frame> = frames.iter().map(|f| f.try_clone().unwrap()).collect();

        let mut outputs = Vec::new();
        for f in frames {
            outputs.push(engine.overlay(f).unwrap());
        }

        // out[0] vs F1, out[1] vs F1 (evicted), out[2] vs F2 (evicted).
        let delayed_for = [0usize, 0, 1];
        for (i, out) in outputs.iter().enumerate() {
            let d = &copies[delayed_for[i]];
            let c = &copies[i];
            let (dp, cp, op) = (d.plane(PlaneKind::Y), c.plane(PlaneKind::Y), out.plane(PlaneKind::Y));
            for y in 0..op.height() {
                for x in 0..op.width() {
                    assert_eq!(op.sample(x, y), expected_blend(dp, cp, x, y), "frame {i} ({x},{y})");
                }
            }
        }
        assert_eq!(engine.frames_processed(), 3);
        assert_eq!(engine.queue().len(), 1);
    }

    #[test]
    fn freeze_mode_keeps_first_frame_as_reference() {
        let mut engine = OverlayEngine::new(0).unwrap();
        let first = gradient(4, 2, 9);
        let reference = first.try_clone().unwrap();
        engine.overlay(first).unwrap();

        for seed in [50u8, 100, 150] {
            let live = gradient(4, 2, seed);
            let live_ref = live.try_clone().unwrap();
            let out = engine.overlay(live).unwrap();
            let (rp, lp, op) = (
                reference.plane(PlaneKind::Cb),
                live_ref.plane(PlaneKind::Cb),
                out.plane(PlaneKind::Cb),
            );
            assert_eq!(op.sample(1, 0), expected_blend(rp, lp, 1, 0));
        }
        assert_eq!(engine.queue().len(), 1);
    }

    #[test]
    fn size_change_mid_stream_is_an_error() {
        let mut engine = OverlayEngine::new(2).unwrap();
        engine.overlay(gradient(4, 4, 1)).unwrap();
        let err = engine.overlay(gradient(8, 4, 2)).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch { expected_w: 4, actual_w: 8, .. }
        ));
    }

    #[test]
    fn invert_is_its_own_inverse() {
        let original = gradient(6, 4, 77);
        let mut f = original.try_clone().unwrap();
        invert_frame(&mut f);
        assert!(!f.same_pixels(&original));
        invert_frame(&mut f);
        assert!(f.same_pixels(&original));
    }

    #[test]
    fn blend_sample_extremes() {
        assert_eq!(blend_sample(0, 0), 0);
        assert_eq!(blend_sample(255, 0), 127);
        assert_eq!(blend_sample(255, 255), 255);
    }

    #[test]
    fn effect_trait_drives_overlay() {
        let mut engine = OverlayEngine::new(2).unwrap();
        let effect: &mut dyn FrameEffect = &mut engine;
        assert_eq!(effect.name(), "ghost-trail");
        let out = effect.apply(gradient(4, 2, 5).with_timestamps(Some(3), None)).unwrap();
        assert_eq!(out.pts, Some(3));
    }
}
