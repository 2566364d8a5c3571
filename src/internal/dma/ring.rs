//! Circular descriptor ring with host-side slot tracking.
//!
//! The ring never touches descriptor memory itself. It keeps one
//! [`SlotState`] per slot, walks the `head`/`tail` cursors, and asks a
//! [`DescriptorQueue`] for ownership and completion. Every hand-off to the
//! device goes through [`DescriptorRing::publish`] or
//! [`DescriptorRing::recycle_filled`], which issue the release fence before
//! the ownership flip. Every hand-back issues an acquire fence before the
//! caller reads descriptor content.
//!
//! `free_count() + in_flight() == N` holds after every method returns.

use core::sync::atomic::{Ordering, fence};

use super::descriptor::{DescriptorQueue, Ownership, ReclaimQueue};
use crate::driver::config::WaterMarks;
use crate::driver::error::{DmaError, DmaResult};

/// Host-side state of one ring slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    /// Host owned and available to [`DescriptorRing::allocate`]
    Free,
    /// Handed out by `allocate`, content being written
    Allocated,
    /// Owned by the device
    InFlight,
}

/// Result of a successful allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// Slot to fill
    pub index: usize,
    /// The free count just dropped below the low water mark
    pub stop_upstream: bool,
}

/// Result of one reclaim or recycle pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    /// Slots handed back to the host (TX) or processed (RX)
    pub processed: usize,
    /// Descriptors inspected
    pub inspected: usize,
    /// The free count just rose above the high water mark while stopped
    pub resume_upstream: bool,
}

/// Fixed-capacity ring over `N` descriptor slots.
#[derive(Debug)]
pub struct DescriptorRing<const N: usize> {
    states: [SlotState; N],
    head: usize,
    tail: usize,
    free: usize,
    water: WaterMarks,
    stopped: bool,
}

impl<const N: usize> DescriptorRing<N> {
    /// Ring whose slots all start host owned (TX).
    pub const fn new_free(water: WaterMarks) -> Self {
        Self {
            states: [SlotState::Free; N],
            head: 0,
            tail: 0,
            free: N,
            water,
            stopped: false,
        }
    }

    /// Ring whose slots all start posted to the device (RX).
    pub const fn new_posted() -> Self {
        Self {
            states: [SlotState::InFlight; N],
            head: 0,
            tail: 0,
            free: 0,
            water: WaterMarks::new(0, 0),
            stopped: false,
        }
    }

    /// Number of slots
    #[cfg(test)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Host-owned slots available
    #[inline(always)]
    pub const fn free_count(&self) -> usize {
        self.free
    }

    /// Slots not available to `allocate`
    #[inline(always)]
    pub const fn in_flight(&self) -> usize {
        N - self.free
    }

    /// Next slot to allocate
    #[cfg(test)]
    pub const fn head(&self) -> usize {
        self.head
    }

    /// Next slot to reclaim
    #[inline(always)]
    pub const fn tail(&self) -> usize {
        self.tail
    }

    /// Upstream is currently stopped
    #[inline(always)]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Host-side state of slot `index`
    #[inline(always)]
    pub fn state(&self, index: usize) -> SlotState {
        self.states[index % N]
    }

    /// Owner as recorded by the host
    #[inline]
    pub fn owner(&self, index: usize) -> Ownership {
        match self.state(index) {
            SlotState::InFlight => Ownership::Device,
            SlotState::Free | SlotState::Allocated => Ownership::Host,
        }
    }

    #[inline(always)]
    const fn next(index: usize) -> usize {
        (index + 1) % N
    }

    // -------------------------------------------------------------------------
    // Producer side
    // -------------------------------------------------------------------------

    /// Take the slot at `head`.
    ///
    /// Fails with [`DmaError::RingFull`] and leaves the ring untouched unless
    /// the slot is free in both the host record and the descriptor.
    pub fn allocate<Q: DescriptorQueue>(&mut self, queue: &Q) -> DmaResult<Allocation> {
        let index = self.head;
        if N == 0 || self.states[index] != SlotState::Free || !queue.status(index).is_free() {
            return Err(DmaError::RingFull);
        }

        self.states[index] = SlotState::Allocated;
        self.free -= 1;
        self.head = Self::next(index);

        let stop_upstream = !self.stopped && self.free < self.water.low;
        if stop_upstream {
            self.stopped = true;
        }
        Ok(Allocation {
            index,
            stop_upstream,
        })
    }

    /// Hand an allocated slot to the device.
    ///
    /// All content writes for the slot must already be done.
    pub fn publish<Q: DescriptorQueue>(&mut self, queue: &Q, index: usize) -> DmaResult<()> {
        if index >= N || self.states[index] != SlotState::Allocated {
            return Err(DmaError::DescriptorBusy);
        }
        fence(Ordering::Release);
        queue.hand_to_device(index);
        self.states[index] = SlotState::InFlight;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Consumer side (TX)
    // -------------------------------------------------------------------------

    /// Reclaim completed slots starting at `tail`.
    ///
    /// `on_complete` runs once per completed slot, after the acquire fence
    /// and before the slot returns to host ownership. The scan stops at the
    /// first device-owned slot that is not ready, except while nothing has
    /// been reclaimed yet, and never inspects more than `N` slots.
    /// `associated` gates the resume edge.
    pub fn reclaim_from_tail<Q, F>(&mut self, queue: &Q, associated: bool, mut on_complete: F) -> ScanSummary
    where
        Q: ReclaimQueue,
        F: FnMut(usize),
    {
        let mut summary = ScanSummary::default();
        let mut finger = self.tail;

        while summary.inspected < N {
            summary.inspected += 1;

            // Slots reclaimed out of order by an earlier pass are skipped.
            if self.states[finger] == SlotState::InFlight {
                if queue.status(finger).is_ready() {
                    fence(Ordering::Acquire);
                    on_complete(finger);
                    queue.hand_to_host(finger);
                    self.states[finger] = SlotState::Free;
                    self.free += 1;
                    summary.processed += 1;
                } else if summary.processed > 0 {
                    break;
                }
            }
            finger = Self::next(finger);
        }

        self.settle_tail();
        summary.resume_upstream = self.try_resume(associated);
        summary
    }

    /// Release backpressure if the ring is stopped and above the high mark.
    pub fn try_resume(&mut self, associated: bool) -> bool {
        if self.stopped && associated && self.free > self.water.high {
            self.stopped = false;
            true
        } else {
            false
        }
    }

    // Move `tail` to the oldest slot still owed by the device.
    fn settle_tail(&mut self) {
        let mut steps = 0;
        while steps < N && self.states[self.tail] == SlotState::Free {
            self.tail = Self::next(self.tail);
            steps += 1;
        }
        if self.free == N {
            self.tail = self.head;
        }
    }

    // -------------------------------------------------------------------------
    // Consumer side (RX)
    // -------------------------------------------------------------------------

    /// Process filled slots starting at `tail` and post them back.
    ///
    /// Looks for the first filled slot within `N` inspections, then handles
    /// consecutive filled slots until one is not. `on_filled` runs while the
    /// host owns the slot; afterwards the slot is handed back to the device
    /// and `tail` moves past it.
    pub fn recycle_filled<Q, F>(&mut self, queue: &Q, mut on_filled: F) -> ScanSummary
    where
        Q: DescriptorQueue,
        F: FnMut(usize),
    {
        let mut summary = ScanSummary::default();
        let mut finger = self.tail;

        while summary.inspected < N {
            summary.inspected += 1;
            let filled = self.states[finger] == SlotState::InFlight && queue.status(finger).is_ready();

            if filled {
                fence(Ordering::Acquire);
                self.states[finger] = SlotState::Free;
                self.free += 1;

                on_filled(finger);

                fence(Ordering::Release);
                queue.hand_to_device(finger);
                self.states[finger] = SlotState::InFlight;
                self.free -= 1;

                summary.processed += 1;
                self.tail = Self::next(finger);
            } else if summary.processed > 0 {
                break;
            }
            finger = Self::next(finger);
        }
        summary
    }
}
