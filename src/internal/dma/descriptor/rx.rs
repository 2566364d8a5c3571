//! RX descriptor queue.
//!
//! The firmware signals a filled buffer on the host descriptor: it sets the
//! `Ctl_16` own bit and bit 31 of `Status`. The host recycles a buffer by
//! clearing `Status` and then the own bit.

use core::sync::atomic::{Ordering, fence};

use super::bits::{ctl, hostdesc, rxbuf, rxdesc};
use super::{DescriptorQueue, DescriptorStatus, DmaArray, Ownership};
use crate::driver::config::ChipGeneration;
use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::RX_BUFFER_SIZE;

/// Status header the device writes at the start of every RX buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxBufferHeader {
    /// Frame length in bytes (802.11 header through FCS)
    pub length: u16,
    /// MAC status byte
    pub mac_status: u8,
    /// PLCP signal field (rate of the received frame)
    pub plcp_signal: u8,
    /// Raw signal level
    pub level: u8,
    /// Raw signal-to-noise ratio
    pub snr: u8,
    /// Device receive timestamp
    pub time: u32,
}

/// Device RX descriptors, host descriptors, and receive buffers.
#[derive(Debug)]
pub struct RxQueue {
    descs: DmaArray,
    hosts: DmaArray,
    buffers: DmaArray,
    generation: ChipGeneration,
}

impl RxQueue {
    /// Combine the three arrays; all must have the same count.
    pub fn new(
        descs: DmaArray,
        hosts: DmaArray,
        buffers: DmaArray,
        generation: ChipGeneration,
    ) -> ConfigResult<Self> {
        if descs.count() != hosts.count() || hosts.count() != buffers.count() {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(Self {
            descs,
            hosts,
            buffers,
            generation,
        })
    }

    /// Number of RX descriptors
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.descs.count()
    }

    /// Device records
    #[inline(always)]
    pub const fn descs(&self) -> &DmaArray {
        &self.descs
    }

    /// Host descriptor records
    #[cfg(test)]
    pub const fn hosts(&self) -> &DmaArray {
        &self.hosts
    }

    /// Receive buffers
    #[cfg(test)]
    pub const fn buffers(&self) -> &DmaArray {
        &self.buffers
    }

    /// Zero and link every record; all buffers start device owned.
    pub fn init(&self) {
        let count = self.descs.count();
        let rx_ctl = match self.generation {
            ChipGeneration::Acx100 => ctl::RX_INIT_ACX100,
            ChipGeneration::Acx111 => ctl::RX_INIT_ACX111,
        };

        self.descs.zero();
        self.hosts.zero();

        for i in 0..count {
            let next = (i + 1) % count;
            self.descs.write_u32(i, rxdesc::NEXT, self.descs.bus_addr(next));
            self.descs.write_u32(i, rxdesc::HOST_MEM_PTR, self.hosts.bus_addr(i));
            self.descs.write_u8(i, rxdesc::CTL, rx_ctl);

            self.hosts.write_u32(i, hostdesc::DATA_PHY, self.buffers.bus_addr(i));
            self.hosts.write_u16(i, hostdesc::LENGTH, RX_BUFFER_SIZE as u16);
            self.hosts.write_u32(i, hostdesc::DESC_PHY_NEXT, self.hosts.bus_addr(next));
        }
    }

    /// Decode the status header of buffer `index`.
    pub fn header(&self, index: usize) -> RxBufferHeader {
        let b = &self.buffers;
        RxBufferHeader {
            length: b.read_u16(index, rxbuf::MAC_CNT_RCVD) & rxbuf::LENGTH_MASK,
            mac_status: b.read_u8(index, rxbuf::MAC_STATUS),
            plcp_signal: b.read_u8(index, rxbuf::PHY_PLCP_SIGNAL),
            level: b.read_u8(index, rxbuf::PHY_LEVEL),
            snr: b.read_u8(index, rxbuf::PHY_SNR),
            time: b.read_u32(index, rxbuf::TIME),
        }
    }

    /// Borrow `len` bytes of buffer `index` starting at `offset`.
    ///
    /// Returns `None` when the range runs past the space described to the
    /// device.
    pub fn frame(&self, index: usize, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        if end > RX_BUFFER_SIZE {
            return None;
        }
        Some(self.buffers.bytes(index, offset, len))
    }
}

impl DescriptorQueue for RxQueue {
    fn status(&self, index: usize) -> DescriptorStatus {
        let control = self.hosts.read_u16(index, hostdesc::CTL);
        let status = self.hosts.read_u32(index, hostdesc::STATUS);
        let owner = if control & hostdesc::CTL_OWN != 0 {
            Ownership::Host
        } else {
            Ownership::Device
        };
        DescriptorStatus {
            owner,
            complete: status & hostdesc::STATUS_FULL != 0,
        }
    }

    fn hand_to_device(&self, index: usize) {
        self.hosts.write_u32(index, hostdesc::STATUS, 0);
        fence(Ordering::Release);
        self.hosts
            .update_u16(index, hostdesc::CTL, |v| v & !hostdesc::CTL_OWN);
    }
}
