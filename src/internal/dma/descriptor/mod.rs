//! Device-visible descriptor records.
//!
//! Descriptors live in memory shared with the adapter and their size depends
//! on the chip generation, so they cannot be plain `#[repr(C)]` structs
//! sized at compile time. [`DmaArray`] views a block of shared memory as
//! `count` records of `stride` bytes and performs every field access as a
//! volatile, little-endian load or store.
//!
//! Ownership of each record is exposed through [`DescriptorQueue`]. The ring
//! never touches control bits directly.

pub mod bits;
pub mod rx;
pub mod tx;

pub use rx::RxQueue;
pub use tx::TxQueue;

use core::ptr::NonNull;

use crate::hal::dma::DmaRegion;

// =============================================================================
// Ownership
// =============================================================================

/// Which side may currently write a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ownership {
    /// Host software owns the descriptor
    Host,
    /// Adapter firmware owns the descriptor
    Device,
}

/// Ownership plus completion state decoded from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorStatus {
    /// Current owner
    pub owner: Ownership,
    /// Device finished with the descriptor (TX done, RX full)
    pub complete: bool,
}

impl DescriptorStatus {
    /// Returned to the host with the completion flag set
    #[inline(always)]
    pub const fn is_ready(&self) -> bool {
        matches!(self.owner, Ownership::Host) && self.complete
    }

    /// Host owned and not waiting to be processed
    #[inline(always)]
    pub const fn is_free(&self) -> bool {
        matches!(self.owner, Ownership::Host) && !self.complete
    }
}

/// Per-slot ownership access for one descriptor queue.
pub trait DescriptorQueue {
    /// Decode the ownership and completion state of slot `index`.
    fn status(&self, index: usize) -> DescriptorStatus;

    /// Flip slot `index` to device ownership.
    ///
    /// Callers must have finished every content write for the slot; the
    /// ring issues a release fence before calling this.
    fn hand_to_device(&self, index: usize);
}

/// Queues whose completed slots are reset by the host.
pub trait ReclaimQueue: DescriptorQueue {
    /// Clear completion state and return slot `index` to host ownership.
    fn hand_to_host(&self, index: usize);
}

// =============================================================================
// Shared Memory Array
// =============================================================================

/// Fixed-stride view over a shared memory block.
#[derive(Debug)]
pub struct DmaArray {
    base: NonNull<u8>,
    bus: u32,
    stride: usize,
    count: usize,
}

impl DmaArray {
    /// View `count` records of `stride` bytes starting `offset` bytes into
    /// `region`.
    ///
    /// Returns `None` when the records do not fit.
    pub fn from_region(region: &DmaRegion, offset: usize, stride: usize, count: usize) -> Option<Self> {
        let span = stride.checked_mul(count)?;
        let end = offset.checked_add(span)?;
        if stride == 0 || end > region.len() {
            return None;
        }
        // SAFETY: offset + span <= region.len(), so the pointer stays in bounds.
        let base = unsafe { NonNull::new_unchecked(region.cpu_ptr().as_ptr().add(offset)) };
        Some(Self {
            base,
            bus: region.bus_addr().wrapping_add(offset as u32),
            stride,
            count,
        })
    }

    /// Number of records
    #[inline(always)]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Bytes per record
    #[cfg(test)]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Device-visible address of the first record
    #[inline(always)]
    pub const fn base_bus(&self) -> u32 {
        self.bus
    }

    /// Device-visible address of record `index`
    #[inline(always)]
    pub fn bus_addr(&self, index: usize) -> u32 {
        debug_assert!(index < self.count);
        self.bus.wrapping_add((index * self.stride) as u32)
    }

    /// Device-visible address of byte `offset` inside record `index`
    #[inline(always)]
    pub fn bus_addr_at(&self, index: usize, offset: usize) -> u32 {
        self.bus_addr(index).wrapping_add(offset as u32)
    }

    #[inline(always)]
    fn field_ptr(&self, index: usize, offset: usize, width: usize) -> *mut u8 {
        assert!(index < self.count, "descriptor index out of range");
        assert!(offset + width <= self.stride, "field outside record");
        // SAFETY: bounds checked above against the block validated in from_region.
        unsafe { self.base.as_ptr().add(index * self.stride + offset) }
    }

    /// Volatile read of a byte field
    #[inline(always)]
    pub fn read_u8(&self, index: usize, offset: usize) -> u8 {
        let ptr = self.field_ptr(index, offset, 1);
        // SAFETY: in bounds per field_ptr.
        unsafe { core::ptr::read_volatile(ptr) }
    }

    /// Volatile write of a byte field
    #[inline(always)]
    pub fn write_u8(&self, index: usize, offset: usize, value: u8) {
        let ptr = self.field_ptr(index, offset, 1);
        // SAFETY: in bounds per field_ptr.
        unsafe { core::ptr::write_volatile(ptr, value) }
    }

    /// Volatile read of a little-endian u16 field
    #[inline(always)]
    pub fn read_u16(&self, index: usize, offset: usize) -> u16 {
        let ptr = self.field_ptr(index, offset, 2).cast::<u16>();
        debug_assert!(ptr.is_aligned(), "misaligned descriptor field");
        // SAFETY: in bounds and aligned per field_ptr.
        u16::from_le(unsafe { core::ptr::read_volatile(ptr) })
    }

    /// Volatile write of a little-endian u16 field
    #[inline(always)]
    pub fn write_u16(&self, index: usize, offset: usize, value: u16) {
        let ptr = self.field_ptr(index, offset, 2).cast::<u16>();
        debug_assert!(ptr.is_aligned(), "misaligned descriptor field");
        // SAFETY: in bounds and aligned per field_ptr.
        unsafe { core::ptr::write_volatile(ptr, value.to_le()) }
    }

    /// Volatile read of a little-endian u32 field
    #[inline(always)]
    pub fn read_u32(&self, index: usize, offset: usize) -> u32 {
        let ptr = self.field_ptr(index, offset, 4).cast::<u32>();
        debug_assert!(ptr.is_aligned(), "misaligned descriptor field");
        // SAFETY: in bounds and aligned per field_ptr.
        u32::from_le(unsafe { core::ptr::read_volatile(ptr) })
    }

    /// Volatile write of a little-endian u32 field
    #[inline(always)]
    pub fn write_u32(&self, index: usize, offset: usize, value: u32) {
        let ptr = self.field_ptr(index, offset, 4).cast::<u32>();
        debug_assert!(ptr.is_aligned(), "misaligned descriptor field");
        // SAFETY: in bounds and aligned per field_ptr.
        unsafe { core::ptr::write_volatile(ptr, value.to_le()) }
    }

    /// Read-modify-write of a byte field
    #[inline(always)]
    pub fn update_u8<F: FnOnce(u8) -> u8>(&self, index: usize, offset: usize, f: F) {
        let old = self.read_u8(index, offset);
        self.write_u8(index, offset, f(old));
    }

    /// Read-modify-write of a u16 field
    #[inline(always)]
    pub fn update_u16<F: FnOnce(u16) -> u16>(&self, index: usize, offset: usize, f: F) {
        let old = self.read_u16(index, offset);
        self.write_u16(index, offset, f(old));
    }

    /// Copy `data` into record `index` starting at `offset`.
    pub fn copy_in(&self, index: usize, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let ptr = self.field_ptr(index, offset, data.len());
        // SAFETY: destination range checked by field_ptr; the source is a
        // Rust slice and cannot overlap host-owned DMA memory.
        unsafe { core::ptr::copy_nonoverlapping(data.as_ptr(), ptr, data.len()) }
    }

    /// Borrow `len` bytes of record `index` starting at `offset`.
    ///
    /// Only call on records the host currently owns; the device must not
    /// write the range while the slice is alive.
    pub fn bytes(&self, index: usize, offset: usize, len: usize) -> &[u8] {
        if len == 0 {
            return &[];
        }
        let ptr = self.field_ptr(index, offset, 1);
        assert!(offset + len <= self.stride, "range outside record");
        // SAFETY: range checked above; host ownership keeps the device out.
        unsafe { core::slice::from_raw_parts(ptr, len) }
    }

    /// Zero every record.
    pub fn zero(&self) {
        // SAFETY: the whole block was validated in from_region.
        unsafe { core::ptr::write_bytes(self.base.as_ptr(), 0, self.stride * self.count) }
    }
}

// SAFETY: DmaArray is a view over memory owned by the driver for its whole
// lifetime; access is serialized by the engine that holds it.
unsafe impl Send for DmaArray {}

#[cfg(test)]
mod tests {
    use super::*;

    fn region_over(backing: &mut [u32]) -> DmaRegion {
        let ptr = NonNull::new(backing.as_mut_ptr().cast::<u8>()).unwrap();
        unsafe { DmaRegion::new(ptr, 0x1000, backing.len() * 4) }
    }

    #[test]
    fn from_region_rejects_overflowing_layout() {
        let mut backing = [0u32; 8];
        let region = region_over(&mut backing);
        assert!(DmaArray::from_region(&region, 0, 8, 4).is_some());
        assert!(DmaArray::from_region(&region, 4, 8, 4).is_none());
        assert!(DmaArray::from_region(&region, 0, 0, 4).is_none());
    }

    #[test]
    fn fields_are_little_endian() {
        let mut backing = [0u32; 4];
        let region = region_over(&mut backing);
        let array = DmaArray::from_region(&region, 0, 8, 2).unwrap();

        array.write_u32(1, 0, 0x1122_3344);
        array.write_u16(1, 4, 0xa1b2);

        assert_eq!(array.read_u8(1, 0), 0x44);
        assert_eq!(array.read_u8(1, 3), 0x11);
        assert_eq!(array.read_u8(1, 4), 0xb2);
        assert_eq!(array.read_u16(1, 4), 0xa1b2);
        assert_eq!(array.read_u32(1, 0), 0x1122_3344);
        assert_eq!(array.read_u32(0, 0), 0);
    }

    #[test]
    fn bus_addresses_follow_stride_and_offset() {
        let mut backing = [0u32; 16];
        let region = region_over(&mut backing);
        let array = DmaArray::from_region(&region, 8, 12, 4).unwrap();

        assert_eq!(array.base_bus(), 0x1008);
        assert_eq!(array.bus_addr(2), 0x1008 + 24);
        assert_eq!(array.bus_addr_at(2, 4), 0x1008 + 28);
    }

    #[test]
    fn copy_in_and_bytes_round_trip_inside_record() {
        let mut backing = [0u32; 8];
        let region = region_over(&mut backing);
        let array = DmaArray::from_region(&region, 0, 16, 2).unwrap();

        array.copy_in(1, 2, &[1, 2, 3]);
        assert_eq!(array.bytes(1, 2, 3), &[1, 2, 3]);
        assert_eq!(array.read_u8(0, 2), 0);
    }

    #[test]
    #[should_panic(expected = "field outside record")]
    fn field_past_stride_panics() {
        let mut backing = [0u32; 4];
        let region = region_over(&mut backing);
        let array = DmaArray::from_region(&region, 0, 8, 2).unwrap();
        array.read_u32(0, 8);
    }

    #[test]
    fn zero_clears_every_record() {
        let mut backing = [0xffff_ffffu32; 4];
        let region = region_over(&mut backing);
        let array = DmaArray::from_region(&region, 0, 8, 2).unwrap();
        array.zero();
        assert_eq!(array.read_u32(0, 0), 0);
        assert_eq!(array.read_u32(1, 4), 0);
    }

    #[test]
    fn status_helpers() {
        let ready = DescriptorStatus { owner: Ownership::Host, complete: true };
        let free = DescriptorStatus { owner: Ownership::Host, complete: false };
        let busy = DescriptorStatus { owner: Ownership::Device, complete: false };

        assert!(ready.is_ready() && !ready.is_free());
        assert!(free.is_free() && !free.is_ready());
        assert!(!busy.is_free() && !busy.is_ready());
    }
}
