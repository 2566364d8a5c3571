//! Descriptor field offsets and bit constants.
//!
//! All records are little-endian. Offsets are from the start of each record.

#![allow(dead_code)]

// =============================================================================
// Shared Control Byte (TX and RX descriptors)
// =============================================================================

/// `Ctl_8` bit constants
pub mod ctl {
    /// Use short preamble (ACX100 only; ACX111 encodes it in the rate)
    pub const SHORT_PREAMBLE: u8 = 0x01;
    /// First fragment of a frame
    pub const FIRSTFRAG: u8 = 0x02;
    /// Device fetches the host buffers itself
    pub const AUTODMA: u8 = 0x04;
    /// Descriptor is reclaimed by the host after completion
    pub const RECLAIM: u8 = 0x08;
    /// Host finished with the descriptor
    pub const HOSTDONE: u8 = 0x20;
    /// Device finished with the descriptor
    pub const ACXDONE: u8 = 0x40;
    /// Host owns the descriptor
    pub const HOSTOWN: u8 = 0x80;

    /// Device returned the descriptor to the host after processing
    pub const DONE: u8 = ACXDONE | HOSTOWN;

    /// Value written to every TX descriptor at bring-up
    pub const TX_INIT: u8 = HOSTOWN | RECLAIM | AUTODMA | FIRSTFRAG;

    /// Flags ACX100 submission sets on every frame
    pub const TX_SUBMIT_ACX100: u8 = AUTODMA | RECLAIM | FIRSTFRAG;

    /// RX descriptor control at bring-up on ACX100
    pub const RX_INIT_ACX100: u8 = RECLAIM | AUTODMA;
    /// RX descriptor control at bring-up on ACX111
    pub const RX_INIT_ACX111: u8 = 0;
}

/// `Ctl2_8` bit constants
pub mod ctl2 {
    /// Do not increase the sequence field
    pub const SEQ: u8 = 0x01;
    /// Do not append the FCS
    pub const FCS: u8 = 0x02;
    /// More fragments follow
    pub const MORE_FRAG: u8 = 0x04;
    /// Do not increase the retry field
    pub const RETRY: u8 = 0x08;
    /// Do not increase the power-management field
    pub const POWER: u8 = 0x10;
    /// Protect the frame with RTS/CTS
    pub const RTS: u8 = 0x20;
    /// Encrypt the frame with WEP
    pub const WEP: u8 = 0x40;
    /// Do not increase the duration field
    pub const DUR: u8 = 0x80;
}

// =============================================================================
// TX Descriptor Layout
// =============================================================================

/// TX descriptor field offsets
pub mod txdesc {
    /// Bus address of the next TX descriptor
    pub const NEXT: usize = 0x00;
    /// Bus address of the first host descriptor of the pair
    pub const HOST_MEM_PTR: usize = 0x04;
    /// Adapter-internal buffer pointer (written by firmware)
    pub const ACX_MEM_PTR: usize = 0x08;
    /// Submission timestamp
    pub const TX_TIME: usize = 0x0c;
    /// Header plus payload length (u16)
    pub const TOTAL_LENGTH: usize = 0x10;
    /// Control flags (u8, see [`super::ctl`])
    pub const CTL: usize = 0x24;
    /// Secondary control flags (u8, see [`super::ctl2`])
    pub const CTL2: usize = 0x25;
    /// Completion error code (u8)
    pub const ERROR: usize = 0x26;
    /// ACK failure count (u8)
    pub const ACK_FAILURES: usize = 0x27;
    /// RTS failure count (u8)
    pub const RTS_FAILURES: usize = 0x28;
    /// RTS success count (u8)
    pub const RTS_OK: usize = 0x29;
    /// Rate: u8 on ACX100, u16 bitmask on ACX111
    pub const RATE: usize = 0x2a;
    /// Queue control (u8, ACX100 only)
    pub const QUEUE_CTRL: usize = 0x2b;
    /// Queue info (u32)
    pub const QUEUE_INFO: usize = 0x2c;
}

/// TX completion error codes (`error` field)
pub mod txerr {
    /// Fragment dependency failed
    pub const FRAGMENT: u8 = 0x01;
    /// Transmission aborted
    pub const ABORT: u8 = 0x02;
    /// Invalid descriptor parameter
    pub const PARAM: u8 = 0x04;
    /// No WEP key for the destination
    pub const NO_WEP_KEY: u8 = 0x08;
    /// MSDU lifetime expired
    pub const LIFETIME: u8 = 0x10;
    /// Retry limit exceeded
    pub const RETRIES: u8 = 0x20;
    /// Buffer overflow
    pub const OVERFLOW: u8 = 0x40;
    /// DMA error
    pub const DMA: u8 = 0x80;

    /// Errors that count as a bad outcome for rate control
    pub const RATE_FALLBACK: u8 = LIFETIME | RETRIES;
}

// =============================================================================
// RX Descriptor Layout
// =============================================================================

/// RX descriptor field offsets
pub mod rxdesc {
    /// Bus address of the next RX descriptor
    pub const NEXT: usize = 0x00;
    /// Bus address of the host descriptor
    pub const HOST_MEM_PTR: usize = 0x04;
    /// Adapter-internal buffer pointer
    pub const ACX_MEM_PTR: usize = 0x08;
    /// Receive timestamp
    pub const RX_TIME: usize = 0x0c;
    /// Frame length (u16)
    pub const TOTAL_LENGTH: usize = 0x10;
    /// Control flags (u8)
    pub const CTL: usize = 0x28;
}

// =============================================================================
// Host Descriptor Layout
// =============================================================================

/// Host descriptor field offsets (TX and RX)
pub mod hostdesc {
    /// Bus address of the data buffer
    pub const DATA_PHY: usize = 0x00;
    /// Offset into the data buffer (u16)
    pub const DATA_OFFSET: usize = 0x04;
    /// Control flags (u16)
    pub const CTL: usize = 0x08;
    /// Buffer length (u16)
    pub const LENGTH: usize = 0x0a;
    /// Bus address of the next host descriptor in the pool
    pub const DESC_PHY_NEXT: usize = 0x0c;
    /// Bus address of the next host descriptor of the same frame
    pub const P_NEXT: usize = 0x10;
    /// Fill status (u32, RX only)
    pub const STATUS: usize = 0x14;

    /// `Ctl_16` host-owned bit
    pub const CTL_OWN: u16 = 0x80;
    /// `Status` buffer-full bit
    pub const STATUS_FULL: u32 = 1 << 31;
}

// =============================================================================
// RX Buffer Layout
// =============================================================================

/// RX buffer header written by the device
pub mod rxbuf {
    /// Received byte count (u16, low 12 bits)
    pub const MAC_CNT_RCVD: usize = 0x00;
    /// Memory blocks used
    pub const MAC_CNT_MBLKS: usize = 0x02;
    /// MAC status byte
    pub const MAC_STATUS: usize = 0x03;
    /// Baseband status
    pub const PHY_STAT_BASEBAND: usize = 0x04;
    /// PLCP signal field (rate)
    pub const PHY_PLCP_SIGNAL: usize = 0x05;
    /// Raw signal level
    pub const PHY_LEVEL: usize = 0x06;
    /// Raw signal-to-noise ratio
    pub const PHY_SNR: usize = 0x07;
    /// Device receive timestamp (u32)
    pub const TIME: usize = 0x08;

    /// Mask applied to `mac_cnt_rcvd` to get the frame length
    pub const LENGTH_MASK: u16 = 0x0fff;
}
