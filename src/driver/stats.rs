//! TX/RX counters and TX error classification.
//!
//! TX and RX statistics are kept apart because the two paths run under
//! separate locks.

use crate::internal::dma::descriptor::bits::txerr;

// =============================================================================
// TX Error Classification
// =============================================================================

/// Classified TX completion error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxErrorKind {
    /// Fragment dependency failed
    Fragment,
    /// Transmission aborted
    Aborted,
    /// Invalid descriptor parameter (a submission bug)
    InvalidParameter,
    /// No encryption key for the destination
    NoWepKey,
    /// MSDU lifetime expired
    LifetimeExpired,
    /// Retry limit exceeded
    ExcessiveRetries,
    /// Buffer overflow
    BufferOverflow,
    /// DMA error
    Dma,
    /// Code outside the table (several bits, or undefined)
    Unknown(u8),
}

impl TxErrorKind {
    /// Classify a non-zero error code.
    pub const fn from_code(code: u8) -> Self {
        match code {
            txerr::FRAGMENT => TxErrorKind::Fragment,
            txerr::ABORT => TxErrorKind::Aborted,
            txerr::PARAM => TxErrorKind::InvalidParameter,
            txerr::NO_WEP_KEY => TxErrorKind::NoWepKey,
            txerr::LIFETIME => TxErrorKind::LifetimeExpired,
            txerr::RETRIES => TxErrorKind::ExcessiveRetries,
            txerr::OVERFLOW => TxErrorKind::BufferOverflow,
            txerr::DMA => TxErrorKind::Dma,
            other => TxErrorKind::Unknown(other),
        }
    }

    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TxErrorKind::Fragment => "fragment dependency failed",
            TxErrorKind::Aborted => "aborted",
            TxErrorKind::InvalidParameter => "invalid descriptor parameter",
            TxErrorKind::NoWepKey => "no WEP key",
            TxErrorKind::LifetimeExpired => "lifetime expired",
            TxErrorKind::ExcessiveRetries => "excessive retries",
            TxErrorKind::BufferOverflow => "buffer overflow",
            TxErrorKind::Dma => "DMA error",
            TxErrorKind::Unknown(_) => "unknown error",
        }
    }
}

impl core::fmt::Display for TxErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Counters
// =============================================================================

/// TX path counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxStats {
    /// Frames handed to the device
    pub tx_packets: u32,
    /// Bytes handed to the device
    pub tx_bytes: u32,
    /// Completions with any error
    pub tx_errors: u32,
    /// Aborted transmissions
    pub tx_aborted_errors: u32,
    /// Buffer overflows
    pub tx_fifo_errors: u32,
    /// Fragment dependency failures
    pub discard_fragment: u32,
    /// Miscellaneous discards (parameter, key, lifetime, DMA, unknown)
    pub discard_misc: u32,
    /// Retry-limit discards
    pub discard_retries: u32,
    /// Submissions rejected because the ring was full
    pub tx_ring_full: u32,
    /// Rate mask changes made by the controller
    pub rate_changes: u32,
}

impl TxStats {
    /// Count one TX error.
    pub fn record_error(&mut self, kind: TxErrorKind) {
        self.tx_errors = self.tx_errors.wrapping_add(1);
        let counter = match kind {
            TxErrorKind::Fragment => &mut self.discard_fragment,
            TxErrorKind::Aborted => &mut self.tx_aborted_errors,
            TxErrorKind::ExcessiveRetries => &mut self.discard_retries,
            TxErrorKind::BufferOverflow => &mut self.tx_fifo_errors,
            TxErrorKind::InvalidParameter
            | TxErrorKind::NoWepKey
            | TxErrorKind::LifetimeExpired
            | TxErrorKind::Dma
            | TxErrorKind::Unknown(_) => &mut self.discard_misc,
        };
        *counter = counter.wrapping_add(1);
    }

    /// Count one submitted frame.
    pub fn record_submit(&mut self, len: usize) {
        self.tx_packets = self.tx_packets.wrapping_add(1);
        self.tx_bytes = self.tx_bytes.wrapping_add(len as u32);
    }
}

/// RX path counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxStats {
    /// Frames delivered on the normal path
    pub rx_packets: u32,
    /// Bytes delivered on the normal path
    pub rx_bytes: u32,
    /// Frames delivered on the capture path
    pub rx_captured: u32,
    /// Frames shorter than the minimum 802.11 frame
    pub rx_dropped_short: u32,
    /// Capture frames longer than the largest 802.11 frame
    pub rx_dropped_oversize: u32,
    /// Length field pointing past the end of the buffer
    pub rx_length_errors: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bit_codes_classify() {
        assert_eq!(TxErrorKind::from_code(0x01), TxErrorKind::Fragment);
        assert_eq!(TxErrorKind::from_code(0x02), TxErrorKind::Aborted);
        assert_eq!(TxErrorKind::from_code(0x20), TxErrorKind::ExcessiveRetries);
        assert_eq!(TxErrorKind::from_code(0x40), TxErrorKind::BufferOverflow);
        assert_eq!(TxErrorKind::from_code(0x80), TxErrorKind::Dma);
        assert_eq!(TxErrorKind::from_code(0x21), TxErrorKind::Unknown(0x21));
    }

    #[test]
    fn every_error_bumps_tx_errors_and_one_bucket() {
        let mut stats = TxStats::default();
        for code in [0x01u8, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80] {
            stats.record_error(TxErrorKind::from_code(code));
        }

        assert_eq!(stats.tx_errors, 8);
        assert_eq!(stats.discard_fragment, 1);
        assert_eq!(stats.tx_aborted_errors, 1);
        assert_eq!(stats.discard_retries, 1);
        assert_eq!(stats.tx_fifo_errors, 1);
        assert_eq!(stats.discard_misc, 4);
    }

    #[test]
    fn submit_counts_bytes() {
        let mut stats = TxStats::default();
        stats.record_submit(100);
        stats.record_submit(24);
        assert_eq!(stats.tx_packets, 2);
        assert_eq!(stats.tx_bytes, 124);
    }

    #[test]
    fn error_kind_display() {
        extern crate std;
        use std::format;
        assert_eq!(format!("{}", TxErrorKind::ExcessiveRetries), "excessive retries");
    }
}
