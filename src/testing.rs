//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for exercising the ring engine
//! on the host without an adapter: a heap-backed DMA allocator, recording
//! doorbell/queue/dispatch sinks, and a device simulator that plays the
//! firmware side of the descriptor protocol.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use core::ptr::NonNull;
use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::vec;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::driver::rate::TxRateField;
use crate::driver::signal::SignalQuality;
use crate::driver::upstream::{CaptureHeader, RxDispatch, RxFrame, TxQueueControl};
use crate::hal::dma::{DmaAllocator, DmaRegion, QueueWindow};
use crate::hal::signal::DeviceSignal;
use crate::internal::constants::RXBUF_HDR_SIZE;
use crate::internal::dma::descriptor::bits::{ctl, hostdesc, rxbuf, txdesc};
use crate::internal::dma::descriptor::{
    DescriptorQueue, DescriptorStatus, Ownership, ReclaimQueue, RxQueue, TxQueue,
};

// =============================================================================
// Mock DMA Allocator
// =============================================================================

/// Heap-backed [`DmaAllocator`] with failure injection.
///
/// Bus addresses are synthetic and increase per allocation. Every region
/// still live when the allocator is dropped is freed.
#[derive(Debug)]
pub struct MockAllocator {
    live: Vec<(NonNull<u8>, Layout)>,
    next_bus: u32,
    allocated: usize,
    released: usize,
    fail_after: Option<usize>,
}

impl MockAllocator {
    pub fn new() -> Self {
        Self {
            live: Vec::new(),
            next_bus: 0x0100_0000,
            allocated: 0,
            released: 0,
            fail_after: None,
        }
    }

    /// Let `n` allocations succeed, then fail every later one.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Regions handed out and not yet released
    pub fn live(&self) -> usize {
        self.live.len()
    }

    /// Successful allocations so far
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Releases so far
    pub fn released(&self) -> usize {
        self.released
    }
}

impl Default for MockAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: regions come from the global allocator, are zeroed, aligned as
// requested, and stay valid until released or the allocator is dropped.
unsafe impl DmaAllocator for MockAllocator {
    fn allocate(&mut self, size: usize, align: usize) -> Option<DmaRegion> {
        if self.fail_after.is_some_and(|n| self.allocated >= n) {
            return None;
        }
        let layout = Layout::from_size_align(size.max(1), align).ok()?;
        // SAFETY: layout has a non-zero size.
        let cpu = NonNull::new(unsafe { alloc_zeroed(layout) })?;
        let bus = self.next_bus;
        self.next_bus = self.next_bus.wrapping_add(((size as u32) + 0xfff) & !0xfff);
        self.live.push((cpu, layout));
        self.allocated += 1;
        // SAFETY: freshly allocated, exclusively owned by the returned region.
        Some(unsafe { DmaRegion::new(cpu, bus, size) })
    }

    fn release(&mut self, region: DmaRegion) {
        let position = self
            .live
            .iter()
            .position(|(cpu, _)| *cpu == region.cpu_ptr())
            .expect("released a region that is not live");
        let (cpu, layout) = self.live.swap_remove(position);
        // SAFETY: allocated above with the same layout.
        unsafe { dealloc(cpu.as_ptr(), layout) };
        self.released += 1;
    }
}

impl Drop for MockAllocator {
    fn drop(&mut self) {
        for (cpu, layout) in self.live.drain(..) {
            // SAFETY: allocated above with the same layout.
            unsafe { dealloc(cpu.as_ptr(), layout) };
        }
    }
}

/// Wrap a word buffer as an adapter queue window.
pub fn window_over(backing: &mut [u32], bus: u32) -> QueueWindow {
    let cpu = NonNull::new(backing.as_mut_ptr().cast::<u8>()).expect("non-null buffer");
    // SAFETY: the test keeps `backing` alive for as long as the window is used.
    unsafe { QueueWindow::new(cpu, bus, backing.len() * 4) }
}

// =============================================================================
// Mock Descriptor Queue
// =============================================================================

/// In-memory [`DescriptorQueue`] that records every ownership write.
#[derive(Debug)]
pub struct MockQueue {
    slots: RefCell<Vec<DescriptorStatus>>,
    history: RefCell<Vec<Vec<Ownership>>>,
}

impl MockQueue {
    fn with_owner(count: usize, owner: Ownership) -> Self {
        Self {
            slots: RefCell::new(vec![DescriptorStatus { owner, complete: false }; count]),
            history: RefCell::new(vec![vec![owner]; count]),
        }
    }

    /// All slots host owned and idle (TX at bring-up)
    pub fn new_host_owned(count: usize) -> Self {
        Self::with_owner(count, Ownership::Host)
    }

    /// All slots posted to the device (RX at bring-up)
    pub fn new_device_owned(count: usize) -> Self {
        Self::with_owner(count, Ownership::Device)
    }

    fn device_returns(&self, index: usize) {
        self.slots.borrow_mut()[index] = DescriptorStatus {
            owner: Ownership::Host,
            complete: true,
        };
        self.history.borrow_mut()[index].push(Ownership::Host);
    }

    /// Device finishes a TX slot.
    pub fn complete(&self, index: usize) {
        self.device_returns(index);
    }

    /// Device fills an RX slot.
    pub fn fill(&self, index: usize) {
        self.device_returns(index);
    }

    /// Ownership writes after the initial state
    pub fn flips(&self, index: usize) -> usize {
        self.history.borrow()[index].len() - 1
    }

    /// Every ownership write changed the owner
    pub fn alternates(&self, index: usize) -> bool {
        self.history.borrow()[index].windows(2).all(|w| w[0] != w[1])
    }
}

impl DescriptorQueue for MockQueue {
    fn status(&self, index: usize) -> DescriptorStatus {
        self.slots.borrow()[index]
    }

    fn hand_to_device(&self, index: usize) {
        self.slots.borrow_mut()[index] = DescriptorStatus {
            owner: Ownership::Device,
            complete: false,
        };
        self.history.borrow_mut()[index].push(Ownership::Device);
    }
}

impl ReclaimQueue for MockQueue {
    fn hand_to_host(&self, index: usize) {
        self.slots.borrow_mut()[index].complete = false;
    }
}

// =============================================================================
// Upstream Mocks
// =============================================================================

/// Counts doorbell and quiesce signals.
#[derive(Debug, Default)]
pub struct MockSignal {
    pub tx_work: usize,
    pub quiesced: usize,
}

impl DeviceSignal for MockSignal {
    fn notify_tx_work(&mut self) {
        self.tx_work += 1;
    }

    fn quiesce(&mut self) {
        self.quiesced += 1;
    }
}

/// Records stop/wake edges and rejects repeated ones.
#[derive(Debug, Default)]
pub struct MockTxQueue {
    pub stops: usize,
    pub wakes: usize,
    pub stopped: bool,
}

impl TxQueueControl for MockTxQueue {
    fn stop(&mut self) {
        assert!(!self.stopped, "stop issued while already stopped");
        self.stopped = true;
        self.stops += 1;
    }

    fn wake(&mut self) {
        assert!(self.stopped, "wake issued while running");
        self.stopped = false;
        self.wakes += 1;
    }
}

/// A frame captured by [`RecordingDispatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFrame {
    pub data: Vec<u8>,
    pub signal: SignalQuality,
    pub timestamp: u32,
    pub plcp_signal: u8,
    pub mac_status: u8,
}

/// Keeps copies of every delivered frame.
#[derive(Debug, Default)]
pub struct RecordingDispatch {
    pub frames: Vec<RecordedFrame>,
    pub captures: Vec<(CaptureHeader, Vec<u8>)>,
}

impl RxDispatch for RecordingDispatch {
    fn deliver(&mut self, frame: RxFrame<'_>) {
        self.frames.push(RecordedFrame {
            data: frame.data.to_vec(),
            signal: frame.signal,
            timestamp: frame.timestamp,
            plcp_signal: frame.plcp_signal,
            mac_status: frame.mac_status,
        });
    }

    fn deliver_capture(&mut self, header: &CaptureHeader, frame: &[u8]) {
        self.captures.push((*header, frame.to_vec()));
    }
}

/// Delay that only accumulates the requested time.
#[derive(Debug, Default)]
pub struct NoopDelay {
    pub total_ns: u64,
}

impl NoopDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

// =============================================================================
// Device Simulator
// =============================================================================

/// Plays the firmware side of the descriptor protocol.
pub struct DeviceSim;

impl DeviceSim {
    /// Report completion of TX slot `index`.
    ///
    /// `rate` overrides the rate field the way firmware does when it fell
    /// back to a lower rate.
    pub fn complete_tx(queue: &TxQueue, index: usize, error: u8, rate: Option<TxRateField>) {
        assert_eq!(
            queue.status(index).owner,
            Ownership::Device,
            "completing a slot the device does not own"
        );
        let descs = queue.descs();
        descs.write_u8(index, txdesc::ERROR, error);
        match rate {
            Some(TxRateField::Acx100(value)) => descs.write_u8(index, txdesc::RATE, value),
            Some(TxRateField::Acx111(value)) => descs.write_u16(index, txdesc::RATE, value),
            None => {}
        }
        descs.update_u8(index, txdesc::CTL, |v| v | ctl::DONE);
    }

    /// Fill RX slot `index` with `frame`.
    ///
    /// `phy_header` bytes of zeroes are placed before the frame, as the
    /// firmware does when asked to include its PHY header.
    pub fn fill_rx(queue: &RxQueue, index: usize, frame: &[u8], signal: RxSignal, phy_header: usize) {
        assert_eq!(
            queue.status(index).owner,
            Ownership::Device,
            "filling a slot the device does not own"
        );
        let buffers = queue.buffers();
        let length = (frame.len() + phy_header) as u16;
        buffers.write_u16(index, rxbuf::MAC_CNT_RCVD, 0xf000 | length);
        buffers.write_u8(index, rxbuf::MAC_STATUS, signal.mac_status);
        buffers.write_u8(index, rxbuf::PHY_PLCP_SIGNAL, signal.plcp_signal);
        buffers.write_u8(index, rxbuf::PHY_LEVEL, signal.level);
        buffers.write_u8(index, rxbuf::PHY_SNR, signal.snr);
        buffers.write_u32(index, rxbuf::TIME, signal.time);
        buffers.copy_in(index, RXBUF_HDR_SIZE, &vec![0u8; phy_header]);
        buffers.copy_in(index, RXBUF_HDR_SIZE + phy_header, frame);

        let hosts = queue.hosts();
        hosts.write_u32(index, hostdesc::STATUS, hostdesc::STATUS_FULL);
        hosts.update_u16(index, hostdesc::CTL, |v| v | hostdesc::CTL_OWN);
    }

    /// Write a raw length field for slot `index` and mark it full.
    pub fn fill_rx_raw_length(queue: &RxQueue, index: usize, length: u16) {
        queue.buffers().write_u16(index, rxbuf::MAC_CNT_RCVD, length);
        queue.hosts().write_u32(index, hostdesc::STATUS, hostdesc::STATUS_FULL);
        queue
            .hosts()
            .update_u16(index, hostdesc::CTL, |v| v | hostdesc::CTL_OWN);
    }
}

/// Per-frame metadata written by [`DeviceSim::fill_rx`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RxSignal {
    pub level: u8,
    pub snr: u8,
    pub time: u32,
    pub plcp_signal: u8,
    pub mac_status: u8,
}

/// A minimal 802.11 data header (frame control `0x0208`) padded to `len`.
pub fn data_header(len: usize) -> Vec<u8> {
    let mut header = vec![0u8; len];
    header[0] = 0x08;
    header[1] = 0x02;
    header
}

/// A minimal 802.11 management header (beacon) padded to `len`.
pub fn mgmt_header(len: usize) -> Vec<u8> {
    let mut header = vec![0u8; len];
    header[0] = 0x80;
    header
}
