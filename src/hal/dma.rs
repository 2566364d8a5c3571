//! DMA Memory Provider
//!
//! The ring engine never allocates on its own. All descriptor and buffer
//! pools come from a platform-supplied [`DmaAllocator`], which returns
//! regions that are visible to both the CPU and the adapter.
//!
//! On PCI (split addressing) this is typically a coherent-DMA allocator
//! returning a CPU pointer plus a bus address. On USB (unified addressing)
//! plain host memory is used and the bus address is only meaningful to the
//! transfer layer.

use core::ptr::NonNull;

// =============================================================================
// DMA Region
// =============================================================================

/// A block of memory shared between the host and the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaRegion {
    cpu: NonNull<u8>,
    bus: u32,
    len: usize,
}

impl DmaRegion {
    /// Describe an allocated region.
    ///
    /// # Safety
    ///
    /// `cpu` must point to `len` bytes that stay valid and unaliased by Rust
    /// references until the region is handed back through
    /// [`DmaAllocator::release`]. `bus` must be the address the adapter uses
    /// to reach the first byte.
    pub const unsafe fn new(cpu: NonNull<u8>, bus: u32, len: usize) -> Self {
        Self { cpu, bus, len }
    }

    /// CPU-visible start address
    #[inline(always)]
    pub const fn cpu_ptr(&self) -> NonNull<u8> {
        self.cpu
    }

    /// Device-visible start address
    #[inline(always)]
    pub const fn bus_addr(&self) -> u32 {
        self.bus
    }

    /// Length in bytes
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length region
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// =============================================================================
// Allocator Trait
// =============================================================================

/// Provider of DMA-capable memory.
///
/// # Safety
///
/// Implementations must return regions that satisfy the contract of
/// [`DmaRegion::new`], are at least `size` bytes long, start at a CPU
/// address aligned to `align`, and do not overlap any other live region.
pub unsafe trait DmaAllocator {
    /// Allocate `size` bytes aligned to `align`.
    ///
    /// Returns `None` when memory is exhausted.
    fn allocate(&mut self, size: usize, align: usize) -> Option<DmaRegion>;

    /// Return a region obtained from [`allocate`](Self::allocate).
    fn release(&mut self, region: DmaRegion);
}

// =============================================================================
// Adapter Queue Window
// =============================================================================

/// Adapter memory reserved by firmware for the TX and RX descriptor queues.
///
/// With split addressing the descriptor queues live in adapter memory that
/// the host reaches through a mapped window. The firmware reports where the
/// window starts; the RX queue is placed directly after the TX queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueWindow {
    region: DmaRegion,
}

impl QueueWindow {
    /// Wrap a mapped adapter-memory window.
    ///
    /// # Safety
    ///
    /// Same contract as [`DmaRegion::new`]. The window is owned by the
    /// adapter mapping and is never passed to a [`DmaAllocator`].
    pub const unsafe fn new(cpu: NonNull<u8>, bus: u32, len: usize) -> Self {
        Self {
            // SAFETY: forwarded from the caller.
            region: unsafe { DmaRegion::new(cpu, bus, len) },
        }
    }

    /// The window as a region
    #[inline(always)]
    pub const fn region(&self) -> DmaRegion {
        self.region
    }
}
