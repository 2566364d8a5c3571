//! Core driver components for the ACX ring engine.
//!
//! - [`config`] - Configuration types and builder
//! - [`error`] - Error types and result aliases
//! - [`tx`] - TX submission and completion
//! - [`rx`] - RX ingestion
//! - [`rate`] - Per-peer TX rate control
//! - [`wlan`] - Bring-up and teardown of the whole engine
//!
//! # Example
//!
//! ```ignore
//! use ph_acx_dma::driver::{ChipGeneration, DmaConfig, WlanDmaPci};
//!
//! let config = DmaConfig::new().with_generation(ChipGeneration::Acx111);
//! let mut dma = WlanDmaPci::bring_up(config, &mut allocator, None)?;
//! ```

pub mod config;
pub mod error;
pub mod peer;
pub mod rate;
pub mod rx;
pub mod signal;
pub mod stats;
pub mod tx;
pub mod upstream;
pub mod wlan;

pub use config::{
    AddressingMode, ChipGeneration, DmaConfig, LinkState, RateDefaults, RxMode, WaterMarks,
};
pub use error::{ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result};
pub use peer::{PeerId, PeerRates, PeerTable, TrafficClass};
pub use rate::{RateControl, RateMask, TxRateField};
pub use rx::{IngestSummary, RxEngine};
pub use signal::SignalQuality;
pub use stats::{RxStats, TxErrorKind, TxStats};
pub use tx::{CompletionSummary, TxEngine};
pub use upstream::{CaptureHeader, RxDispatch, RxFrame, TxQueueControl};
pub use wlan::{QueueConfig, WlanDma, WlanDmaPci, WlanDmaUsb};
