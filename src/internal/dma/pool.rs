//! Descriptor and buffer pool layout.
//!
//! All shared memory is requested once at bring-up from the platform
//! [`DmaAllocator`] and carved into fixed-stride [`DmaArray`] views. Pool
//! sizes depend on the chip generation (separate or combined TX buffers) and
//! the addressing mode (descriptor queues in host memory or in an adapter
//! [`QueueWindow`]).

use crate::driver::config::{AddressingMode, ChipGeneration, DmaConfig};
use crate::driver::error::{ConfigError, ConfigResult};
use crate::hal::dma::{DmaAllocator, DmaRegion, QueueWindow};
use crate::internal::constants::{
    DESC_ALIGN, HOST_DESC_SIZE, RX_BUFFER_SLOT_SIZE, RX_DESC_SIZE, TX_HEADER_SLOT_SIZE,
    TX_PAYLOAD_SLOT_SIZE,
};

use super::descriptor::{DmaArray, RxQueue, TxQueue};

/// Upper bound on pools for any configuration
pub const MAX_POOLS: usize = 7;

/// One kind of shared-memory pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PoolKind {
    /// 802.11 header slots (ACX100)
    TxHeaders,
    /// Payload slots (ACX100)
    TxPayloads,
    /// Combined header and payload slots (ACX111)
    TxBuffers,
    /// TX host descriptor pairs
    TxHostDescs,
    /// RX host descriptors
    RxHostDescs,
    /// RX buffers
    RxBuffers,
    /// TX descriptor queue (unified addressing)
    TxQueue,
    /// RX descriptor queue (unified addressing)
    RxQueue,
}

/// Size and alignment of one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSpec {
    /// Pool kind
    pub kind: PoolKind,
    /// Bytes requested
    pub size: usize,
    /// Required alignment
    pub align: usize,
}

/// Pool sizes for one configuration and ring capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLayout {
    generation: ChipGeneration,
    addressing: AddressingMode,
    tx_count: usize,
    rx_count: usize,
}

impl PoolLayout {
    /// Layout for `tx_count` TX and `rx_count` RX descriptors.
    pub const fn new(config: &DmaConfig, tx_count: usize, rx_count: usize) -> Self {
        Self {
            generation: config.generation,
            addressing: config.addressing,
            tx_count,
            rx_count,
        }
    }

    /// TX descriptors
    #[inline(always)]
    pub const fn tx_count(&self) -> usize {
        self.tx_count
    }

    /// RX descriptors
    #[inline(always)]
    pub const fn rx_count(&self) -> usize {
        self.rx_count
    }

    /// Chip generation
    #[inline(always)]
    pub const fn generation(&self) -> ChipGeneration {
        self.generation
    }

    /// Bytes of the TX descriptor queue
    pub const fn tx_queue_size(&self) -> usize {
        self.tx_count * self.generation.tx_desc_size()
    }

    /// Bytes of the RX descriptor queue
    pub const fn rx_queue_size(&self) -> usize {
        self.rx_count * RX_DESC_SIZE
    }

    /// Adapter memory needed for both queues with split addressing
    pub const fn queue_window_size(&self) -> usize {
        self.tx_queue_size() + self.rx_queue_size()
    }

    /// Bytes of one combined ACX111 TX buffer slot
    pub const fn tx_combined_slot_size() -> usize {
        TX_HEADER_SLOT_SIZE + TX_PAYLOAD_SLOT_SIZE
    }

    /// Pools in allocation order.
    pub fn specs(&self) -> impl Iterator<Item = PoolSpec> {
        let tx = self.tx_count;
        let rx = self.rx_count;
        let spec = |kind, size| {
            Some(PoolSpec {
                kind,
                size,
                align: DESC_ALIGN,
            })
        };

        let (tx_first, tx_second) = match self.generation {
            ChipGeneration::Acx100 => (
                spec(PoolKind::TxHeaders, tx * TX_HEADER_SLOT_SIZE),
                spec(PoolKind::TxPayloads, tx * TX_PAYLOAD_SLOT_SIZE),
            ),
            ChipGeneration::Acx111 => (spec(PoolKind::TxBuffers, tx * Self::tx_combined_slot_size()), None),
        };
        let (tx_queue, rx_queue) = if self.addressing.queues_in_host_memory() {
            (
                spec(PoolKind::TxQueue, self.tx_queue_size()),
                spec(PoolKind::RxQueue, self.rx_queue_size()),
            )
        } else {
            (None, None)
        };

        [
            tx_first,
            tx_second,
            spec(PoolKind::TxHostDescs, 2 * tx * HOST_DESC_SIZE),
            spec(PoolKind::RxHostDescs, rx * HOST_DESC_SIZE),
            spec(PoolKind::RxBuffers, rx * RX_BUFFER_SLOT_SIZE),
            tx_queue,
            rx_queue,
        ]
        .into_iter()
        .flatten()
    }

    /// Total bytes requested from the allocator
    pub fn host_memory(&self) -> usize {
        self.specs().map(|spec| spec.size).sum()
    }
}

// =============================================================================
// Allocated Pools
// =============================================================================

/// Shared-memory pools owned by a running ring engine.
///
/// Released exactly once through [`DmaPools::release`].
#[derive(Debug)]
pub struct DmaPools {
    regions: [Option<(PoolKind, DmaRegion)>; MAX_POOLS],
    count: usize,
    window: Option<DmaRegion>,
}

impl DmaPools {
    /// Allocate every pool in `layout`.
    ///
    /// On failure every pool obtained so far is released in reverse order
    /// before the error is returned. Split addressing needs a `window` large
    /// enough for both descriptor queues; that check happens before any
    /// allocation.
    pub fn allocate<A>(layout: &PoolLayout, alloc: &mut A, window: Option<QueueWindow>) -> ConfigResult<Self>
    where
        A: DmaAllocator + ?Sized,
    {
        let window = match layout.addressing {
            AddressingMode::Unified => None,
            AddressingMode::Split => {
                let window = window.ok_or(ConfigError::QueueWindowMissing)?.region();
                if window.len() < layout.queue_window_size() {
                    error!(
                        "queue window of {} bytes cannot hold {} bytes of descriptors",
                        window.len(),
                        layout.queue_window_size()
                    );
                    return Err(ConfigError::QueueWindowTooSmall);
                }
                Some(window)
            }
        };

        let mut pools = Self {
            regions: [None; MAX_POOLS],
            count: 0,
            window,
        };

        for spec in layout.specs() {
            match alloc.allocate(spec.size, spec.align) {
                Some(region) if region.len() >= spec.size => {
                    pools.regions[pools.count] = Some((spec.kind, region));
                    pools.count += 1;
                }
                short => {
                    if let Some(region) = short {
                        alloc.release(region);
                    }
                    error!(
                        "allocation of {:?} pool ({} bytes) failed, releasing {} pools",
                        spec.kind,
                        spec.size,
                        pools.count
                    );
                    pools.release(alloc);
                    return Err(ConfigError::AllocationFailed);
                }
            }
        }

        Ok(pools)
    }

    /// Number of allocated pools
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// No pools allocated
    #[cfg(test)]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Region of pool `kind`
    pub fn region(&self, kind: PoolKind) -> Option<&DmaRegion> {
        self.regions[..self.count]
            .iter()
            .flatten()
            .find(|(k, _)| *k == kind)
            .map(|(_, region)| region)
    }

    fn array(&self, kind: PoolKind, stride: usize, count: usize) -> ConfigResult<DmaArray> {
        let region = self.region(kind).ok_or(ConfigError::AllocationFailed)?;
        DmaArray::from_region(region, 0, stride, count).ok_or(ConfigError::AllocationFailed)
    }

    // Descriptor queue at `offset` in the window, or in its own pool.
    fn queue_array(&self, kind: PoolKind, offset: usize, stride: usize, count: usize) -> ConfigResult<DmaArray> {
        match &self.window {
            Some(window) => {
                DmaArray::from_region(window, offset, stride, count).ok_or(ConfigError::QueueWindowTooSmall)
            }
            None => self.array(kind, stride, count),
        }
    }

    /// TX descriptor queue view
    pub fn tx_queue(&self, layout: &PoolLayout) -> ConfigResult<TxQueue> {
        let descs = self.queue_array(PoolKind::TxQueue, 0, layout.generation.tx_desc_size(), layout.tx_count)?;
        let hosts = self.array(PoolKind::TxHostDescs, HOST_DESC_SIZE, layout.tx_count * 2)?;
        TxQueue::new(descs, hosts, layout.generation)
    }

    /// RX descriptor queue view; the RX queue follows the TX queue in the
    /// adapter window.
    pub fn rx_queue(&self, layout: &PoolLayout) -> ConfigResult<RxQueue> {
        let descs = self.queue_array(PoolKind::RxQueue, layout.tx_queue_size(), RX_DESC_SIZE, layout.rx_count)?;
        let hosts = self.array(PoolKind::RxHostDescs, HOST_DESC_SIZE, layout.rx_count)?;
        let buffers = self.array(PoolKind::RxBuffers, RX_BUFFER_SLOT_SIZE, layout.rx_count)?;
        RxQueue::new(descs, hosts, buffers, layout.generation)
    }

    /// TX buffer views
    pub fn tx_buffers(&self, layout: &PoolLayout) -> ConfigResult<TxBufferPool> {
        match layout.generation {
            ChipGeneration::Acx100 => Ok(TxBufferPool::Separate {
                headers: self.array(PoolKind::TxHeaders, TX_HEADER_SLOT_SIZE, layout.tx_count)?,
                payloads: self.array(PoolKind::TxPayloads, TX_PAYLOAD_SLOT_SIZE, layout.tx_count)?,
            }),
            ChipGeneration::Acx111 => Ok(TxBufferPool::Combined {
                slots: self.array(PoolKind::TxBuffers, PoolLayout::tx_combined_slot_size(), layout.tx_count)?,
            }),
        }
    }

    /// Return every pool to `alloc`, newest first.
    pub fn release<A>(mut self, alloc: &mut A)
    where
        A: DmaAllocator + ?Sized,
    {
        while self.count > 0 {
            self.count -= 1;
            if let Some((_, region)) = self.regions[self.count].take() {
                alloc.release(region);
            }
        }
    }
}

// =============================================================================
// TX Buffers
// =============================================================================

/// Bus addresses and lengths for one TX host descriptor pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxFragments {
    /// Header host descriptor buffer address
    pub header_bus: u32,
    /// Header host descriptor length
    pub header_len: u16,
    /// Payload host descriptor buffer address
    pub payload_bus: u32,
    /// Payload host descriptor length
    pub payload_len: u16,
}

/// TX frame buffers in the active generation's layout.
#[derive(Debug)]
pub enum TxBufferPool {
    /// ACX100: header and payload in separate pools
    Separate {
        /// Header slots
        headers: DmaArray,
        /// Payload slots
        payloads: DmaArray,
    },
    /// ACX111: one slot per frame, payload right after the header
    Combined {
        /// Frame slots
        slots: DmaArray,
    },
}

impl TxBufferPool {
    /// Bus address of the header area of slot `index`
    pub fn header_bus(&self, index: usize) -> u32 {
        match self {
            TxBufferPool::Separate { headers, .. } => headers.bus_addr(index),
            TxBufferPool::Combined { slots } => slots.bus_addr(index),
        }
    }

    /// Bus address of the payload area of slot `index` at bring-up
    pub fn payload_bus(&self, index: usize) -> u32 {
        match self {
            TxBufferPool::Separate { payloads, .. } => payloads.bus_addr(index),
            TxBufferPool::Combined { slots } => slots.bus_addr_at(index, TX_HEADER_SLOT_SIZE),
        }
    }

    /// Copy a frame into slot `index`.
    ///
    /// Lengths must already be checked against the slot sizes.
    pub fn write(&self, index: usize, header: &[u8], payload: &[u8]) -> TxFragments {
        match self {
            TxBufferPool::Separate { headers, payloads } => {
                headers.copy_in(index, 0, header);
                payloads.copy_in(index, 0, payload);
                TxFragments {
                    header_bus: headers.bus_addr(index),
                    header_len: header.len() as u16,
                    payload_bus: payloads.bus_addr(index),
                    payload_len: payload.len() as u16,
                }
            }
            TxBufferPool::Combined { slots } => {
                slots.copy_in(index, 0, header);
                slots.copy_in(index, header.len(), payload);
                TxFragments {
                    header_bus: slots.bus_addr(index),
                    header_len: (header.len() + payload.len()) as u16,
                    payload_bus: slots.bus_addr_at(index, header.len()),
                    payload_len: payload.len() as u16,
                }
            }
        }
    }

    /// Borrow the bytes stored in slot `index` (header area, then payload area).
    #[cfg(test)]
    pub fn contents(&self, index: usize, header_len: usize, payload_len: usize) -> (&[u8], &[u8]) {
        match self {
            TxBufferPool::Separate { headers, payloads } => {
                (headers.bytes(index, 0, header_len), payloads.bytes(index, 0, payload_len))
            }
            TxBufferPool::Combined { slots } => {
                (slots.bytes(index, 0, header_len), slots.bytes(index, header_len, payload_len))
            }
        }
    }
}
