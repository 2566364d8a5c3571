//! TX submission and completion.
//!
//! [`TxEngine`] owns the TX half of the engine: the descriptor ring, the
//! frame buffers, the peer table with its rate controllers, and the TX
//! counters. Submission and completion both take `&mut self`, so whatever
//! lock serializes access to the engine is the TX exclusion domain.

use super::config::{AddressingMode, ChipGeneration, DmaConfig, LinkState};
use super::error::{ConfigError, ConfigResult, DmaError, IoError, Result};
use super::peer::{PeerId, PeerTable, TrafficClass};
use super::stats::{TxErrorKind, TxStats};
use super::upstream::TxQueueControl;
use crate::hal::signal::DeviceSignal;
use crate::internal::constants::{TX_HEADER_SLOT_SIZE, TX_PAYLOAD_SLOT_SIZE};
use crate::internal::dma::descriptor::bits::{ctl, ctl2};
use crate::internal::dma::descriptor::{Ownership, TxQueue};
use crate::internal::dma::pool::TxBufferPool;
use crate::internal::dma::ring::DescriptorRing;

/// Per-slot bookkeeping for a frame in flight
#[derive(Debug, Clone, Copy)]
struct TxSlot {
    peer: Option<PeerId>,
    class: TrafficClass,
    len: u16,
}

impl TxSlot {
    const EMPTY: Self = Self {
        peer: None,
        class: TrafficClass::Data,
        len: 0,
    };
}

/// Outcome of one completion pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompletionSummary {
    /// Descriptors returned to the host
    pub reclaimed: usize,
    /// Descriptors inspected
    pub inspected: usize,
    /// Reclaimed descriptors that carried an error code
    pub errors: usize,
    /// Upstream queue was woken
    pub woke_upstream: bool,
}

/// TX path of the ring engine over `N` descriptors.
#[derive(Debug)]
pub struct TxEngine<const N: usize> {
    ring: DescriptorRing<N>,
    queue: TxQueue,
    buffers: TxBufferPool,
    slots: [TxSlot; N],
    peers: PeerTable,
    stats: TxStats,
    generation: ChipGeneration,
    rts_threshold: u16,
    link: LinkState,
    kick_on_error: bool,
}

impl<const N: usize> TxEngine<N> {
    /// Initialize the descriptor queue and wrap it.
    pub(crate) fn new(queue: TxQueue, buffers: TxBufferPool, config: &DmaConfig) -> ConfigResult<Self> {
        if queue.len() != N {
            return Err(ConfigError::InvalidConfig);
        }
        config.tx_water_marks.validate(N)?;

        queue.init(|i| buffers.header_bus(i), |i| buffers.payload_bus(i));

        Ok(Self {
            ring: DescriptorRing::new_free(config.tx_water_marks),
            queue,
            buffers,
            slots: [TxSlot::EMPTY; N],
            peers: PeerTable::new(),
            stats: TxStats::default(),
            generation: config.generation,
            rts_threshold: config.rts_threshold,
            link: LinkState::Idle,
            kick_on_error: config.addressing == AddressingMode::Split,
        })
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Queue one frame for `peer`.
    ///
    /// `header` is the 802.11 header (at most 32 bytes) and `payload` the
    /// frame body (at most 1500 bytes). On success the slot index is
    /// returned and the device has been signalled. On
    /// [`DmaError::RingFull`] nothing was written; hold the frame and retry
    /// after the next completion.
    pub fn submit<S, Q>(
        &mut self,
        peer: PeerId,
        header: &[u8],
        payload: &[u8],
        signal: &mut S,
        upstream: &mut Q,
    ) -> Result<usize>
    where
        S: DeviceSignal + ?Sized,
        Q: TxQueueControl + ?Sized,
    {
        let class = TrafficClass::of_header(header).ok_or(DmaError::InvalidLength)?;
        if header.len() > TX_HEADER_SLOT_SIZE || payload.len() > TX_PAYLOAD_SLOT_SIZE {
            return Err(DmaError::FrameTooLarge.into());
        }
        let rates = *self.peers.get(peer).ok_or(IoError::UnknownPeer)?;

        let alloc = match self.ring.allocate(&self.queue) {
            Ok(alloc) => alloc,
            Err(e) => {
                trace!("tx ring full, {} in flight", self.ring.in_flight());
                self.stats.tx_ring_full = self.stats.tx_ring_full.wrapping_add(1);
                return Err(e.into());
            }
        };
        let index = alloc.index;

        let frags = self.buffers.write(index, header, payload);
        self.queue
            .write_host(TxQueue::header_host(index), frags.header_bus, frags.header_len);
        self.queue
            .write_host(TxQueue::payload_host(index), frags.payload_bus, frags.payload_len);

        let control = rates.class(class);
        let short_preamble = control.short_preamble(rates.short_preamble);
        let ctl_8 = match self.generation {
            ChipGeneration::Acx100 if short_preamble => ctl::TX_SUBMIT_ACX100 | ctl::SHORT_PREAMBLE,
            ChipGeneration::Acx100 => ctl::TX_SUBMIT_ACX100,
            ChipGeneration::Acx111 => 0,
        };
        let total = header.len() + payload.len();
        let ctl2_8 = if total > usize::from(self.rts_threshold) {
            ctl2::RTS
        } else {
            0
        };
        let rate = control.encode(self.generation, short_preamble);

        self.queue.write_content(index, total as u16, ctl_8, ctl2_8, rate);
        self.slots[index] = TxSlot {
            peer: Some(peer),
            class,
            len: total as u16,
        };
        self.ring.publish(&self.queue, index)?;

        self.stats.record_submit(total);
        signal.notify_tx_work();
        if alloc.stop_upstream {
            debug!("tx: stop queue, {} descriptors free", self.ring.free_count());
            upstream.stop();
        }
        Ok(index)
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Reclaim finished descriptors and feed their outcomes to rate control.
    ///
    /// Inspects at most `N` descriptors. Wakes `upstream` once when the
    /// ring climbs above the high water mark while associated. On PCI
    /// (split addressing) a pass that reclaimed errored descriptors rings
    /// `signal` once so the firmware resumes the queue.
    pub fn complete<S, Q>(&mut self, signal: &mut S, upstream: &mut Q) -> CompletionSummary
    where
        S: DeviceSignal + ?Sized,
        Q: TxQueueControl + ?Sized,
    {
        let associated = self.link == LinkState::Associated;
        let Self {
            ring,
            queue,
            slots,
            peers,
            stats,
            ..
        } = &mut *self;

        let mut errors = 0;
        let scan = ring.reclaim_from_tail(queue, associated, |index| {
            let slot = core::mem::replace(&mut slots[index], TxSlot::EMPTY);
            let error = queue.error(index);
            let rate_used = queue.rate(index).decode();

            trace!(
                "tx: cleaned {}: len={} ack_fail={} rate={:#x}",
                index,
                slot.len,
                queue.ack_failures(index),
                rate_used.bits()
            );

            if error != 0 {
                let kind = TxErrorKind::from_code(error);
                debug!("tx error {:#x} on slot {}: {}", error, index, kind.as_str());
                stats.record_error(kind);
                errors += 1;
            }

            let Some(peer) = slot.peer else {
                return;
            };
            let Some(rates) = peers.get_mut(peer) else {
                warn!("tx completion on slot {} for a removed peer", index);
                return;
            };
            let control = rates.class_mut(slot.class);
            if control.is_auto() && control.on_outcome(rate_used, error).is_some() {
                stats.rate_changes = stats.rate_changes.wrapping_add(1);
            }
        });

        if errors > 0 && self.kick_on_error {
            signal.notify_tx_work();
        }
        if scan.resume_upstream {
            debug!("tx: wake queue, {} descriptors free", self.ring.free_count());
            upstream.wake();
        }

        CompletionSummary {
            reclaimed: scan.processed,
            inspected: scan.inspected,
            errors,
            woke_upstream: scan.resume_upstream,
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Update the association state.
    ///
    /// Becoming associated wakes a stopped upstream queue if enough
    /// descriptors are already free.
    pub fn set_link_state<Q>(&mut self, link: LinkState, upstream: &mut Q)
    where
        Q: TxQueueControl + ?Sized,
    {
        self.link = link;
        if link == LinkState::Associated && self.ring.try_resume(true) {
            upstream.wake();
        }
    }

    /// Current association state
    #[inline(always)]
    pub const fn link_state(&self) -> LinkState {
        self.link
    }

    /// Set the RTS/CTS length threshold
    pub fn set_rts_threshold(&mut self, threshold: u16) {
        self.rts_threshold = threshold;
    }

    /// Peer table
    #[inline(always)]
    pub const fn peers(&self) -> &PeerTable {
        &self.peers
    }

    /// Peer table, mutable
    #[inline(always)]
    pub fn peers_mut(&mut self) -> &mut PeerTable {
        &mut self.peers
    }

    /// TX counters
    #[inline(always)]
    pub const fn stats(&self) -> &TxStats {
        &self.stats
    }

    /// Host-owned descriptors available
    #[inline(always)]
    pub const fn free_count(&self) -> usize {
        self.ring.free_count()
    }

    /// Descriptors owned by the device
    #[inline(always)]
    pub const fn in_flight(&self) -> usize {
        self.ring.in_flight()
    }

    /// Upstream is currently stopped by backpressure
    #[inline(always)]
    pub const fn is_stopped(&self) -> bool {
        self.ring.is_stopped()
    }

    /// Owner of slot `index` as recorded by the host
    pub fn slot_owner(&self, index: usize) -> Ownership {
        self.ring.owner(index)
    }

    /// Descriptor queue
    #[inline(always)]
    pub(crate) const fn queue(&self) -> &TxQueue {
        &self.queue
    }

    /// Frame buffers
    #[cfg(test)]
    pub(crate) const fn buffers(&self) -> &TxBufferPool {
        &self.buffers
    }
}
