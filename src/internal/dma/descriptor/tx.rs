//! TX descriptor queue.
//!
//! Each TX descriptor is paired with two host descriptors: index `2 * i`
//! describes the 802.11 header buffer and `2 * i + 1` the payload buffer.
//! The descriptor's `Ctl_8` host-own bit is the ownership flag the firmware
//! acts on; the host descriptors' own bits are kept in step with it.

use core::sync::atomic::{Ordering, fence};

use super::bits::{ctl, hostdesc, txdesc};
use super::{DescriptorQueue, DescriptorStatus, DmaArray, Ownership, ReclaimQueue};
use crate::driver::config::ChipGeneration;
use crate::driver::error::{ConfigError, ConfigResult};
use crate::driver::rate::TxRateField;

/// Device TX descriptors plus their host descriptor pairs.
#[derive(Debug)]
pub struct TxQueue {
    descs: DmaArray,
    hosts: DmaArray,
    generation: ChipGeneration,
}

impl TxQueue {
    /// Combine a descriptor array with a host descriptor array of twice the
    /// length.
    pub fn new(descs: DmaArray, hosts: DmaArray, generation: ChipGeneration) -> ConfigResult<Self> {
        if hosts.count() != descs.count() * 2 {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(Self {
            descs,
            hosts,
            generation,
        })
    }

    /// Number of TX descriptors
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

    /// Host descriptor index of the header buffer for slot `index`
    #[inline(always)]
    pub const fn header_host(index: usize) -> usize {
        index * 2
    }

    /// Host descriptor index of the payload buffer for slot `index`
    #[inline(always)]
    pub const fn payload_host(index: usize) -> usize {
        index * 2 + 1
    }

    /// Zero and link every record.
    ///
    /// `header_bus` and `payload_bus` give the device address of each slot's
    /// buffers.
    pub fn init<H, P>(&self, header_bus: H, payload_bus: P)
    where
        H: Fn(usize) -> u32,
        P: Fn(usize) -> u32,
    {
        let count = self.descs.count();
        let host_count = self.hosts.count();

        self.descs.zero();
        self.hosts.zero();

        for i in 0..count {
            self.descs.write_u32(i, txdesc::NEXT, self.descs.bus_addr((i + 1) % count));
            self.descs
                .write_u32(i, txdesc::HOST_MEM_PTR, self.hosts.bus_addr(Self::header_host(i)));
            self.descs.write_u8(i, txdesc::CTL, ctl::TX_INIT);
        }

        for j in 0..host_count {
            let slot = j / 2;
            let is_header = j % 2 == 0;
            let data = if is_header {
                header_bus(slot)
            } else {
                payload_bus(slot)
            };
            self.hosts.write_u32(j, hostdesc::DATA_PHY, data);
            self.hosts.write_u16(j, hostdesc::CTL, hostdesc::CTL_OWN);
            self.hosts
                .write_u32(j, hostdesc::DESC_PHY_NEXT, self.hosts.bus_addr((j + 1) % host_count));
            // The header descriptor chains to its payload; the payload ends the frame.
            let frame_next = if is_header { self.hosts.bus_addr(j + 1) } else { 0 };
            self.hosts.write_u32(j, hostdesc::P_NEXT, frame_next);
        }
    }

    // -------------------------------------------------------------------------
    // Field access
    // -------------------------------------------------------------------------

    /// Control byte of slot `index`
    #[inline]
    pub fn ctl(&self, index: usize) -> u8 {
        self.descs.read_u8(index, txdesc::CTL)
    }

    /// Completion error code of slot `index`
    #[inline]
    pub fn error(&self, index: usize) -> u8 {
        self.descs.read_u8(index, txdesc::ERROR)
    }

    /// ACK failures reported for slot `index`
    #[inline]
    pub fn ack_failures(&self, index: usize) -> u8 {
        self.descs.read_u8(index, txdesc::ACK_FAILURES)
    }

    /// Rate the device reports for slot `index`
    pub fn rate(&self, index: usize) -> TxRateField {
        match self.generation {
            ChipGeneration::Acx100 => TxRateField::Acx100(self.descs.read_u8(index, txdesc::RATE)),
            ChipGeneration::Acx111 => TxRateField::Acx111(self.descs.read_u16(index, txdesc::RATE)),
        }
    }

    /// Write every content field of slot `index` except ownership.
    ///
    /// `control` must not carry [`ctl::HOSTOWN`]; the host-own bit stays set
    /// until [`DescriptorQueue::hand_to_device`].
    pub fn write_content(
        &self,
        index: usize,
        total_len: u16,
        control: u8,
        control2: u8,
        rate: TxRateField,
    ) {
        debug_assert_eq!(control & ctl::HOSTOWN, 0);
        self.descs.write_u16(index, txdesc::TOTAL_LENGTH, total_len);
        self.descs.write_u8(index, txdesc::CTL2, control2);
        self.clear_soft_counters(index);
        match rate {
            TxRateField::Acx100(value) => self.descs.write_u8(index, txdesc::RATE, value),
            TxRateField::Acx111(value) => self.descs.write_u16(index, txdesc::RATE, value),
        }
        self.descs.write_u8(index, txdesc::CTL, control | ctl::HOSTOWN);
    }

    /// Point a host descriptor at `data_bus` and set its length.
    pub fn write_host(&self, host: usize, data_bus: u32, len: u16) {
        self.hosts.write_u32(host, hostdesc::DATA_PHY, data_bus);
        self.hosts.write_u16(host, hostdesc::LENGTH, len);
    }

    /// Length stored in a host descriptor
    #[inline]
    #[cfg(test)]
    pub fn host_len(&self, host: usize) -> u16 {
        self.hosts.read_u16(host, hostdesc::LENGTH)
    }

    fn clear_soft_counters(&self, index: usize) {
        self.descs.write_u8(index, txdesc::ERROR, 0);
        self.descs.write_u8(index, txdesc::ACK_FAILURES, 0);
        self.descs.write_u8(index, txdesc::RTS_FAILURES, 0);
        self.descs.write_u8(index, txdesc::RTS_OK, 0);
    }
}

impl DescriptorQueue for TxQueue {
    fn status(&self, index: usize) -> DescriptorStatus {
        let control = self.ctl(index);
        let owner = if control & ctl::HOSTOWN != 0 {
            Ownership::Host
        } else {
            Ownership::Device
        };
        DescriptorStatus {
            owner,
            complete: control & ctl::DONE == ctl::DONE,
        }
    }

    fn hand_to_device(&self, index: usize) {
        let clear_own = |v: u16| v & !hostdesc::CTL_OWN;
        self.hosts.update_u16(Self::payload_host(index), hostdesc::CTL, clear_own);
        self.hosts.update_u16(Self::header_host(index), hostdesc::CTL, clear_own);
        // The descriptor flag is what the firmware polls, so it goes last.
        fence(Ordering::Release);
        self.descs.update_u8(index, txdesc::CTL, |v| v & !(ctl::HOSTOWN | ctl::ACXDONE));
    }
}

impl ReclaimQueue for TxQueue {
    fn hand_to_host(&self, index: usize) {
        self.clear_soft_counters(index);
        let set_own = |v: u16| v | hostdesc::CTL_OWN;
        self.hosts.update_u16(Self::header_host(index), hostdesc::CTL, set_own);
        self.hosts.update_u16(Self::payload_host(index), hostdesc::CTL, set_own);
        self.descs.write_u8(index, txdesc::CTL, ctl::HOSTOWN);
    }
}
