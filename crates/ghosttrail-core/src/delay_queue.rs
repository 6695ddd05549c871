// crates/ghosttrail-core/src/delay_queue.rs
//
// Fixed-depth delay line of owned frames.
//
// Two modes, chosen once at construction from the configured depth:
//
//   Freeze (depth 0)
//     The first frame ever pushed is pinned as the anchor and never evicted.
//     Every push_pop returns a fresh deep copy of the anchor; the pushed frame
//     is dropped unless it becomes the anchor.
//
//   Window (depth k > 0)
//     A FIFO holding at most k frames. Each push appends the newest frame;
//     once the queue holds more than k, the oldest is moved out to the caller.
//     While the window is still filling, the caller gets a deep copy of the
//     oldest frame instead, so warm-up blends against repeats of the very
//     first frame rather than failing.
//
// Storage is a VecDeque reserved for k + 1 frames at construction: the push
// happens before the eviction, so the deque briefly holds k + 1 and never
// reallocates after `new`.

use std::collections::VecDeque;
use std::fmt;

use crate::error::{Error, Result};
use crate::frame::Frame;

enum Mode {
    Freeze { anchor: Option<Frame> },
    Window { frames: VecDeque<Frame>, cap: usize },
}

/// Bounded delay line. Owns every frame it retains; dropping the queue
/// releases them.
pub struct DelayQueue {
    mode: Mode,
}

impl DelayQueue {
    /// Create an empty queue. `cap == 0` selects freeze mode.
    pub fn new(cap: usize) -> Result<Self> {
        if cap == 0 {
            return Ok(Self { mode: Mode::Freeze { anchor: None } });
        }

        let slots = cap.checked_add(1).ok_or(Error::Allocation { bytes: usize::MAX })?;
        let mut frames = VecDeque::new();
        frames
            .try_reserve_exact(slots)
            .map_err(|_| Error::Allocation {
                bytes: slots.saturating_mul(std::mem::size_of::<Frame>()),
            })?;

        Ok(Self { mode: Mode::Window { frames, cap } })
    }

    /// Configured depth (0 in freeze mode).
    pub fn capacity(&self) -> usize {
        match &self.mode {
            Mode::Freeze { .. }      => 0,
            Mode::Window { cap, .. } => *cap,
        }
    }

    pub fn is_freeze(&self) -> bool {
        matches!(self.mode, Mode::Freeze { .. })
    }

    /// Frames currently retained (the anchor counts as one).
    pub fn len(&self) -> usize {
        match &self.mode {
            Mode::Freeze { anchor }     => usize::from(anchor.is_some()),
            Mode::Window { frames, .. } => frames.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take ownership of `frame` and hand back the delayed frame.
    ///
    /// The returned frame is always exclusively the caller's: either the
    /// evicted oldest frame itself, or a deep copy of the anchor / oldest
    /// frame. Fails only if a deep copy cannot be allocated.
    pub fn push_pop(&mut self, frame: Frame) -> Result<Frame> {
        match &mut self.mode {
            Mode::Freeze { anchor } => {
                // Later frames are dropped here; only the first is pinned.
                anchor.get_or_insert(frame).try_clone()
            }
            Mode::Window { frames, cap } => {
                frames.push_back(frame);
                if frames.len() > *cap {
                    if let Some(oldest) = frames.pop_front() {
                        return Ok(oldest);
                    }
                }
                // Warm-up: the window is not full yet, repeat the oldest.
                frames[0].try_clone()
            }
        }
    }

    /// Consume the queue, returning retained frames oldest first.
    pub fn into_frames(self) -> Vec<Frame> {
        match self.mode {
            Mode::Freeze { anchor }     => anchor.into_iter().collect(),
            Mode::Window { frames, .. } => frames.into(),
        }
    }
}

impl fmt::Debug for DelayQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayQueue")
            .field("capacity", &self.capacity())
            .field("freeze", &self.is_freeze())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
