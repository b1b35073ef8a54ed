//! Two-slot recycling buffer for captured frames.
//!
//! The capture side paints into the current slot while the previous slot's
//! contents may still be on their way into the encoder, so the cycle keeps
//! exactly two slots and `shift()` swaps which one is current.
//!
//! Resizes are deliberately lazy: `resize()` only records the new dimensions
//! and marks every slot stale. The actual reallocation happens on the next
//! `shift()` into a stale slot, so a burst of window-resize events costs one
//! allocation, not one per event. Allocation failures are recorded in the
//! slot they hit; the cycle itself never panics over memory.

use kine_common::STREAM_PIXEL_FORMAT;
use kine_common::frame::{PixelBuffer, PixelView};
use kine_common::types::Resolution;

use tracing::{debug, warn};

/// Number of slots in the cycle.
pub const CYCLE_DEPTH: usize = 2;

/// One staging slot: its allocation plus the flags tracking staleness.
#[derive(Debug, Default)]
struct FrameSlot {
    buffer: Option<PixelBuffer>,
    needs_resize: bool,
    error: Option<String>,
}

impl FrameSlot {
    /// Whether the slot can be handed out for reading or writing.
    fn is_usable(&self) -> bool {
        self.buffer.is_some() && !self.needs_resize && self.error.is_none()
    }

    /// Drop any allocation and forget past failures.
    fn clear(&mut self) {
        self.buffer = None;
        self.needs_resize = false;
        self.error = None;
    }

    /// Replace the slot's allocation at the given dimensions, recording a
    /// failure instead of propagating it.
    fn reallocate(&mut self, resolution: Resolution) {
        self.buffer = None;
        self.needs_resize = false;
        match PixelBuffer::alloc(resolution, STREAM_PIXEL_FORMAT) {
            Ok(buffer) => {
                self.buffer = Some(buffer);
                self.error = None;
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
    }
}

/// Recycling frame buffer with `CYCLE_DEPTH` slots.
#[derive(Debug)]
pub struct FrameCycle {
    slots: [FrameSlot; CYCLE_DEPTH],
    current: usize,
    resolution: Resolution,
}

impl Default for FrameCycle {
    /// An invalid cycle with nothing allocated; `resize` + `shift` bring it
    /// to life.
    fn default() -> Self {
        Self {
            slots: Default::default(),
            current: 0,
            resolution: Resolution::new(0, 0),
        }
    }
}

impl FrameCycle {
    /// Build a cycle and allocate every slot at the given dimensions.
    ///
    /// Empty dimensions yield an invalid cycle with nothing allocated; a
    /// later `resize` + `shift` brings it to life. Per-slot allocation
    /// failures are recorded in the slot, not returned.
    pub fn new(resolution: Resolution) -> Self {
        let mut cycle = Self::default();
        if resolution.width == 0 || resolution.height == 0 {
            warn!(%resolution, "Frame cycle constructed with empty dimensions");
            return cycle;
        }

        cycle.resolution = resolution;
        for (index, slot) in cycle.slots.iter_mut().enumerate() {
            slot.reallocate(resolution);
            if let Some(err) = &slot.error {
                warn!(index, error = %err, "Cycle slot allocation failed");
            }
        }
        cycle
    }

    /// Record new dimensions and mark every slot stale.
    ///
    /// No memory moves until the next `shift()` into each slot. Resizing to
    /// the current dimensions is a no-op; resizing to empty dimensions drops
    /// every allocation and leaves the cycle invalid.
    pub fn resize(&mut self, resolution: Resolution) {
        if resolution == self.resolution {
            return;
        }
        self.resolution = resolution;

        if resolution.width == 0 || resolution.height == 0 {
            for slot in &mut self.slots {
                slot.clear();
            }
            return;
        }

        debug!(%resolution, "Frame cycle resize deferred to next shift");
        for slot in &mut self.slots {
            slot.needs_resize = true;
        }
    }

    /// Advance to the next slot, reallocating it first if it is stale.
    pub fn shift(&mut self) {
        self.current = (self.current + 1) % CYCLE_DEPTH;
        self.refresh_current();
    }

    /// Discard whatever the current slot holds and advance, same as `shift`.
    ///
    /// Called at recording start so the first frame never lands in a slot
    /// left over from a previous run.
    pub fn reset(&mut self) {
        self.shift();
    }

    fn refresh_current(&mut self) {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return;
        }
        let index = self.current;
        let slot = &mut self.slots[index];
        if slot.is_usable() {
            return;
        }

        debug!(index, resolution = %self.resolution, "Reallocating cycle slot");
        slot.reallocate(self.resolution);
        if let Some(err) = &slot.error {
            warn!(index, error = %err, "Cycle slot allocation failed");
        }
    }

    /// Whether the current slot is allocated at the current dimensions and
    /// error-free.
    pub fn is_valid(&self) -> bool {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return false;
        }
        self.slots[self.current].is_usable()
    }

    /// The current slot's frame, if usable.
    pub fn frame(&self) -> Option<&PixelBuffer> {
        let slot = &self.slots[self.current];
        if slot.is_usable() { slot.buffer.as_ref() } else { None }
    }

    /// The current slot's frame for writing, if usable.
    pub fn frame_mut(&mut self) -> Option<&mut PixelBuffer> {
        let slot = &mut self.slots[self.current];
        if slot.is_usable() { slot.buffer.as_mut() } else { None }
    }

    /// Read-only view of the current slot's pixels, if usable.
    pub fn pixel_view(&self) -> Option<PixelView<'_>> {
        self.frame().map(PixelBuffer::as_view)
    }

    /// The failure recorded in the current slot, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.slots[self.current].error.as_deref()
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Index of the current slot (diagnostics).
    pub fn current_index(&self) -> usize {
        self.current
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Resolution {
        Resolution::new(64, 48)
    }

    // ── Construction ─────────────────────────────────────────────

    #[test]
    fn new_with_empty_dimensions_is_invalid() {
        let cycle = FrameCycle::new(Resolution::new(0, 0));
        assert!(!cycle.is_valid());
        assert!(cycle.frame().is_none());
        assert!(cycle.pixel_view().is_none());
    }

    #[test]
    fn default_is_invalid() {
        let cycle = FrameCycle::default();
        assert!(!cycle.is_valid());
    }

    #[test]
    fn new_allocates_every_slot() {
        let mut cycle = FrameCycle::new(small());
        assert!(cycle.is_valid());
        assert_eq!(cycle.frame().unwrap().len(), small().frame_bytes());

        // The other slot was allocated up front too: shifting must not be
        // what brings it to life.
        cycle.shift();
        assert!(cycle.is_valid());
        assert_eq!(cycle.frame().unwrap().len(), small().frame_bytes());
    }

    // ── Shifting ─────────────────────────────────────────────────

    #[test]
    fn shift_alternates_slots() {
        let mut cycle = FrameCycle::new(small());
        let start = cycle.current_index();
        cycle.shift();
        assert_ne!(cycle.current_index(), start);
        cycle.shift();
        assert_eq!(cycle.current_index(), start);
    }

    #[test]
    fn even_shift_count_returns_to_start() {
        let mut cycle = FrameCycle::new(small());
        let start = cycle.current_index();
        for _ in 0..6 {
            cycle.shift();
        }
        assert_eq!(cycle.current_index(), start);
    }

    #[test]
    fn shift_reuses_allocations() {
        let mut cycle = FrameCycle::new(small());
        let before = cycle.frame().unwrap().data().as_ptr();
        cycle.shift();
        cycle.shift();
        let after = cycle.frame().unwrap().data().as_ptr();
        assert_eq!(before, after);
    }

    #[test]
    fn reset_behaves_like_shift() {
        let mut cycle = FrameCycle::new(small());
        let start = cycle.current_index();
        cycle.reset();
        assert_ne!(cycle.current_index(), start);
        assert!(cycle.is_valid());
    }

    // ── Resize ───────────────────────────────────────────────────

    #[test]
    fn resize_to_same_dimensions_is_noop() {
        let mut cycle = FrameCycle::new(small());
        let before = cycle.frame().unwrap().data().as_ptr();
        cycle.resize(small());
        assert!(cycle.is_valid());
        assert_eq!(cycle.frame().unwrap().data().as_ptr(), before);
    }

    #[test]
    fn resize_is_lazy_until_shift() {
        let mut cycle = FrameCycle::new(small());
        let bigger = Resolution::new(128, 96);

        cycle.resize(bigger);
        // Nothing reallocated yet; the slot must not be read as valid.
        assert!(!cycle.is_valid());
        assert!(cycle.frame().is_none());

        cycle.shift();
        assert!(cycle.is_valid());
        assert_eq!(cycle.frame().unwrap().len(), bigger.frame_bytes());
        assert_eq!(cycle.resolution(), bigger);
    }

    #[test]
    fn resize_refreshes_each_slot_on_its_shift() {
        let mut cycle = FrameCycle::new(small());
        let bigger = Resolution::new(128, 96);
        cycle.resize(bigger);

        cycle.shift();
        assert_eq!(cycle.frame().unwrap().len(), bigger.frame_bytes());
        cycle.shift();
        assert_eq!(cycle.frame().unwrap().len(), bigger.frame_bytes());
    }

    #[test]
    fn resize_to_empty_invalidates() {
        let mut cycle = FrameCycle::new(small());
        cycle.resize(Resolution::new(0, 0));
        assert!(!cycle.is_valid());
        assert!(cycle.frame().is_none());
        cycle.shift();
        assert!(!cycle.is_valid());
    }

    // ── Errors ───────────────────────────────────────────────────

    #[test]
    fn misaligned_resize_records_slot_error() {
        let mut cycle = FrameCycle::new(small());
        cycle.resize(Resolution::new(1366, 768));
        cycle.shift();

        assert!(!cycle.is_valid());
        assert!(cycle.frame().is_none());
        let err = cycle.last_error().unwrap();
        assert!(err.contains("1366"));
        assert!(err.contains("alignment"));
    }

    #[test]
    fn slot_error_clears_after_good_resize() {
        let mut cycle = FrameCycle::new(small());
        cycle.resize(Resolution::new(1366, 768));
        cycle.shift();
        assert!(cycle.last_error().is_some());

        cycle.resize(small());
        cycle.shift();
        assert!(cycle.is_valid());
        assert!(cycle.last_error().is_none());
    }

    #[test]
    fn writes_land_in_current_slot_only() {
        let mut cycle = FrameCycle::new(small());
        cycle.frame_mut().unwrap().data_mut().fill(0xA1);
        cycle.shift();
        assert!(cycle.frame().unwrap().data().iter().all(|&b| b == 0));
        cycle.shift();
        assert!(cycle.frame().unwrap().data().iter().all(|&b| b == 0xA1));
    }
}
