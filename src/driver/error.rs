//! Error types for the ACX descriptor-ring engine
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Bring-up, pool allocation, and configuration failures
//! - [`DmaError`]: Descriptor ring and buffer conditions
//! - [`IoError`]: Runtime lookup failures on the TX/RX paths
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and bring-up errors
///
/// These errors occur while validating [`DmaConfig`](super::config::DmaConfig),
/// allocating descriptor pools, or managing peer entries. A pool allocation
/// failure is fatal for device initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Invalid configuration parameter
    InvalidConfig,
    /// A descriptor or buffer pool could not be allocated
    AllocationFailed,
    /// Split addressing needs an adapter queue window
    QueueWindowMissing,
    /// The adapter queue window cannot hold both descriptor queues
    QueueWindowTooSmall,
    /// Rate mask is empty or has bits outside the supported rates
    InvalidRateMask,
    /// No free peer slot
    PeerTableFull,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::AllocationFailed => "DMA pool allocation failed",
            ConfigError::QueueWindowMissing => "queue window required for split addressing",
            ConfigError::QueueWindowTooSmall => "queue window too small",
            ConfigError::InvalidRateMask => "invalid rate mask",
            ConfigError::PeerTableFull => "peer table full",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// DMA ring and buffer errors
///
/// [`DmaError::RingFull`] is ordinary flow control: the caller should hold
/// the frame and retry after the next TX completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// No host-owned TX descriptor at the ring head
    RingFull,
    /// Descriptor is in the wrong state for the operation
    DescriptorBusy,
    /// Frame does not fit the buffer slot
    FrameTooLarge,
    /// Invalid frame length (empty or truncated header)
    InvalidLength,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::RingFull => "TX ring full",
            DmaError::DescriptorBusy => "descriptor busy",
            DmaError::FrameTooLarge => "frame too large for buffers",
            DmaError::InvalidLength => "invalid frame length",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Runtime TX/RX errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Peer id is unknown or was removed
    UnknownPeer,
    /// Invalid state for operation
    InvalidState,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::UnknownPeer => "unknown peer",
            IoError::InvalidState => "invalid state for operation",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match tx.submit(peer, frame, &mut signal, &mut queue) {
///     Err(Error::Dma(DmaError::RingFull)) => { /* hold the frame */ }
///     Err(Error::Io(IoError::UnknownPeer)) => { /* drop it */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// DMA error
    Dma(DmaError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for ring-engine operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for DMA operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================
