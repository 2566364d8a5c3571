//! Configuration types for the ACX descriptor-ring engine

use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_FALLBACK_THRESHOLD, DEFAULT_RTS_THRESHOLD, DEFAULT_STEPUP_THRESHOLD,
    DEFAULT_TX_HIGH_WATER, DEFAULT_TX_LOW_WATER, PHY_HDR_LEN_ACX100, PHY_HDR_LEN_ACX111,
    TX_DESC_SIZE_ACX100, TX_DESC_SIZE_ACX111,
};

/// Adapter chip generation
///
/// Selects descriptor sizes, the TX rate encoding, and the PHY header
/// length. Chosen once at bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipGeneration {
    /// TNETW1100 (ACX100): 8-bit single-rate encoding, 0x30-byte TX descriptors
    #[default]
    Acx100,
    /// TNETW1130 (ACX111): 16-bit rate bitmask, 0x34-byte TX descriptors
    Acx111,
}

impl ChipGeneration {
    /// Size of one TX descriptor record
    #[inline(always)]
    pub const fn tx_desc_size(self) -> usize {
        match self {
            ChipGeneration::Acx100 => TX_DESC_SIZE_ACX100,
            ChipGeneration::Acx111 => TX_DESC_SIZE_ACX111,
        }
    }

    /// Length of the PHY header the firmware can prepend to RX frames
    #[inline(always)]
    pub const fn phy_header_len(self) -> usize {
        match self {
            ChipGeneration::Acx100 => PHY_HDR_LEN_ACX100,
            ChipGeneration::Acx111 => PHY_HDR_LEN_ACX111,
        }
    }
}

/// How the host and the adapter address shared memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressingMode {
    /// Separate CPU and bus addresses (PCI). Descriptor queues live in
    /// adapter memory reached through a [`QueueWindow`](crate::hal::QueueWindow).
    #[default]
    Split,
    /// One address space (USB). Descriptor queues are allocated from host
    /// memory alongside the buffers.
    Unified,
}

impl AddressingMode {
    /// Descriptor queues are allocated from host memory
    #[inline(always)]
    pub const fn queues_in_host_memory(self) -> bool {
        matches!(self, AddressingMode::Unified)
    }
}

/// Upstream association state
///
/// Backpressure is only released while associated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Not associated
    #[default]
    Idle,
    /// Associated with a BSS or IBSS
    Associated,
}

/// TX ring water marks
///
/// The upstream queue is stopped when fewer than `low` descriptors are free
/// and woken again once more than `high` are free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaterMarks {
    /// Stop threshold
    pub low: usize,
    /// Resume threshold
    pub high: usize,
}

impl WaterMarks {
    /// Create water marks
    #[must_use]
    pub const fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }

    /// Check the marks against a ring of `capacity` descriptors.
    pub const fn validate(&self, capacity: usize) -> ConfigResult<()> {
        if self.low > self.high || self.high >= capacity {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(())
    }
}

impl Default for WaterMarks {
    fn default() -> Self {
        Self::new(DEFAULT_TX_LOW_WATER, DEFAULT_TX_HIGH_WATER)
    }
}

/// Receive path mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxMode {
    /// Deliver every frame on the capture path with signal metadata
    pub monitor: bool,
    /// Firmware prepends a PHY header to each frame
    pub include_phy_header: bool,
}

/// Default rate-controller thresholds for new peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateDefaults {
    /// Bad outcomes tolerated before falling back
    pub fallback_threshold: u8,
    /// Full-rate successes required before stepping up
    pub stepup_threshold: u8,
}

impl Default for RateDefaults {
    fn default() -> Self {
        Self {
            fallback_threshold: DEFAULT_FALLBACK_THRESHOLD,
            stepup_threshold: DEFAULT_STEPUP_THRESHOLD,
        }
    }
}

/// Complete ring-engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaConfig {
    /// Chip generation
    pub generation: ChipGeneration,
    /// Addressing mode
    pub addressing: AddressingMode,
    /// Frames longer than this request RTS/CTS
    pub rts_threshold: u16,
    /// TX backpressure water marks
    pub tx_water_marks: WaterMarks,
    /// Initial receive mode
    pub rx_mode: RxMode,
    /// Rate-controller thresholds
    pub rate_defaults: RateDefaults,
}

impl Default for DmaConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DmaConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generation: ChipGeneration::Acx100,
            addressing: AddressingMode::Split,
            rts_threshold: DEFAULT_RTS_THRESHOLD,
            tx_water_marks: WaterMarks::new(DEFAULT_TX_LOW_WATER, DEFAULT_TX_HIGH_WATER),
            rx_mode: RxMode {
                monitor: false,
                include_phy_header: false,
            },
            rate_defaults: RateDefaults {
                fallback_threshold: DEFAULT_FALLBACK_THRESHOLD,
                stepup_threshold: DEFAULT_STEPUP_THRESHOLD,
            },
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the chip generation
    #[must_use]
    pub const fn with_generation(mut self, generation: ChipGeneration) -> Self {
        self.generation = generation;
        self
    }

    /// Set the addressing mode
    #[must_use]
    pub const fn with_addressing(mut self, addressing: AddressingMode) -> Self {
        self.addressing = addressing;
        self
    }

    /// Set the RTS/CTS length threshold
    #[must_use]
    pub const fn with_rts_threshold(mut self, threshold: u16) -> Self {
        self.rts_threshold = threshold;
        self
    }

    /// Set the TX water marks
    #[must_use]
    pub const fn with_tx_water_marks(mut self, low: usize, high: usize) -> Self {
        self.tx_water_marks = WaterMarks::new(low, high);
        self
    }

    /// Enable or disable monitor capture
    #[must_use]
    pub const fn with_monitor(mut self, enabled: bool) -> Self {
        self.rx_mode.monitor = enabled;
        self
    }

    /// Declare whether firmware prepends a PHY header to RX frames
    #[must_use]
    pub const fn with_phy_header(mut self, included: bool) -> Self {
        self.rx_mode.include_phy_header = included;
        self
    }

    /// Set the rate-controller thresholds
    #[must_use]
    pub const fn with_rate_thresholds(mut self, fallback: u8, stepup: u8) -> Self {
        self.rate_defaults = RateDefaults {
            fallback_threshold: fallback,
            stepup_threshold: stepup,
        };
        self
    }

    /// Validate against the ring capacities the engine was built with.
    pub const fn validate(&self, tx_descs: usize, rx_descs: usize) -> ConfigResult<()> {
        if tx_descs == 0 || rx_descs == 0 || tx_descs > u16::MAX as usize {
            return Err(ConfigError::InvalidConfig);
        }
        if self.rate_defaults.fallback_threshold == 0 || self.rate_defaults.stepup_threshold == 0 {
            return Err(ConfigError::InvalidConfig);
        }
        self.tx_water_marks.validate(tx_descs)
    }
}
