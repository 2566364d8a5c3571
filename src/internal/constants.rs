//! Centralized Constants
//!
//! Single source of truth for the sizes, counts, and defaults used by the
//! descriptor-ring engine.
//!
//! # Organization
//!
//! - **802.11 frame sizes**: header and body limits used to size buffers
//! - **Descriptor record sizes**: per-generation device record strides
//! - **Buffer slots**: TX header/payload and RX buffer slot sizes
//! - **Default configuration**: ring capacities, water marks, rate thresholds
//! - **Timing**: teardown quiesce delay
//!
//! Bit definitions and field offsets of the device records live in
//! `internal::dma::descriptor::bits` next to the code that uses them.

// =============================================================================
// 802.11 Frame Sizes
// =============================================================================

/// 802.11 header with four addresses
pub const WLAN_HDR_A4_LEN: usize = 30;

/// Maximum 802.11 frame body
pub const WLAN_DATA_MAXLEN: usize = 2312;

/// 802.11 FCS length
pub const WLAN_CRC_LEN: usize = 4;

/// WEP IV plus ICV overhead
pub const WLAN_WEP_OVERHEAD: usize = 8;

/// Largest frame the device can place in an RX buffer (A4 header, WEP, FCS)
pub const WLAN_A4FR_MAXLEN_WEP_FCS: usize =
    WLAN_HDR_A4_LEN + WLAN_DATA_MAXLEN + WLAN_WEP_OVERHEAD + WLAN_CRC_LEN;

/// Largest frame accepted on the monitor capture path
pub const WLAN_MAX_CAPTURE_LEN: usize = WLAN_HDR_A4_LEN + WLAN_DATA_MAXLEN + WLAN_CRC_LEN;

/// Frames shorter than this are dropped on the normal receive path
pub const WLAN_MIN_FRAME_LEN: usize = 14;

/// Largest Ethernet frame handed down by the network stack
pub const WLAN_MAX_ETHFRM_LEN: usize = 1514;

/// Ethernet header size stripped before the body is sent
pub const WLAN_ETHHDR_LEN: usize = 14;

// =============================================================================
// Descriptor Record Sizes
// =============================================================================

/// TX descriptor size on ACX100
pub const TX_DESC_SIZE_ACX100: usize = 0x30;

/// TX descriptor size on ACX111 (4 trailing reserved bytes)
pub const TX_DESC_SIZE_ACX111: usize = 0x34;

/// RX descriptor size (both generations)
pub const RX_DESC_SIZE: usize = 0x34;

/// Host descriptor size (TX and RX)
pub const HOST_DESC_SIZE: usize = 0x18;

/// Alignment required for descriptor records
pub const DESC_ALIGN: usize = 4;

// =============================================================================
// Buffer Slots
// =============================================================================

/// TX header slot (four-address header rounded up)
pub const TX_HEADER_SLOT_SIZE: usize = 32;

/// TX payload slot
pub const TX_PAYLOAD_SLOT_SIZE: usize = WLAN_MAX_ETHFRM_LEN - WLAN_ETHHDR_LEN;

/// RX buffer status header written by the device before the frame
pub const RXBUF_HDR_SIZE: usize = 12;

/// Bytes described to the device per RX buffer
pub const RX_BUFFER_SIZE: usize = RXBUF_HDR_SIZE + WLAN_A4FR_MAXLEN_WEP_FCS;

/// Stride between RX buffers in the pool (slack of 32 bytes, 4-byte aligned)
pub const RX_BUFFER_SLOT_SIZE: usize = (RX_BUFFER_SIZE + 32 + 3) & !3;

/// PHY header prepended by ACX100 firmware when enabled
pub const PHY_HDR_LEN_ACX100: usize = 4;

/// PHY header prepended by ACX111 firmware when enabled
pub const PHY_HDR_LEN_ACX111: usize = 8;

// =============================================================================
// Default Configuration
// =============================================================================

/// Default TX descriptor count on PCI adapters
pub const DEFAULT_TX_DESCS_PCI: usize = 16;

/// Default RX descriptor count on PCI adapters
pub const DEFAULT_RX_DESCS_PCI: usize = 16;

/// Default TX descriptor count on USB adapters
pub const DEFAULT_TX_DESCS_USB: usize = 10;

/// Default RX descriptor count on USB adapters
pub const DEFAULT_RX_DESCS_USB: usize = 10;

/// Stop the upstream queue when fewer TX descriptors than this are free
pub const DEFAULT_TX_LOW_WATER: usize = 3;

/// Wake the upstream queue when more TX descriptors than this are free
pub const DEFAULT_TX_HIGH_WATER: usize = 5;

/// Frames longer than this request RTS/CTS protection
pub const DEFAULT_RTS_THRESHOLD: u16 = 2312;

/// Consecutive bad outcomes tolerated before falling back a rate
pub const DEFAULT_FALLBACK_THRESHOLD: u8 = 3;

/// Consecutive full-rate successes required before stepping up a rate
pub const DEFAULT_STEPUP_THRESHOLD: u8 = 10;

/// Default peer table capacity
pub const MAX_PEERS: usize = 8;

// =============================================================================
// Timing
// =============================================================================

/// Time given to the device to finish in-flight DMA before pools are released
pub const TEARDOWN_QUIESCE_MS: u32 = 100;
