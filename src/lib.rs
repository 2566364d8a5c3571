//! ACX100/ACX111 DMA Ring Engine
//!
//! A `no_std`, `no_alloc` implementation of the host side of the TX and RX
//! descriptor rings used by TI ACX100 and ACX111 wireless adapters, together
//! with the per-peer TX rate controller that consumes completion results.
//!
//! # Architecture
//!
//! The crate is organized into three layers:
//!
//! 1. **Driver Layer** ([`driver`]): [`WlanDma`] bring-up and teardown,
//!    [`TxEngine`] submission and completion, [`RxEngine`] ingestion, and
//!    [`RateControl`]
//! 2. **HAL Layer** ([`hal`]): Traits the platform implements for DMA-capable
//!    memory and device signalling
//! 3. **Internal Layer**: Descriptor record layouts, shared-memory pools and
//!    ring bookkeeping
//!
//! ## Ownership Protocol
//!
//! Every descriptor carries an ownership flag. The host writes a descriptor
//! only while it owns it, and publishes it to the adapter by flipping the
//! flag as its final write. The adapter hands the descriptor back the same
//! way once it has finished with it.
//!
//! # Features
//!
//! - `defmt`: Log through defmt and derive `defmt::Format` on public types
//! - `log`: Log through the `log` facade
//! - `critical-section`: Enable the ISR-safe [`sync::SharedWlanDma`] wrapper
//!
//! # Example
//!
//! ```ignore
//! use ph_acx_dma::{ChipGeneration, DmaConfig, LinkState, WlanDmaPci};
//!
//! let config = DmaConfig::new()
//!     .with_generation(ChipGeneration::Acx111)
//!     .with_rts_threshold(2312);
//!
//! let mut dma = WlanDmaPci::bring_up(config, &mut allocator, None)?;
//! // Hand dma.queue_config() to the firmware, then:
//! dma.tx_mut().set_link_state(LinkState::Associated, &mut netif);
//!
//! let rates = PeerRates::new(
//!     RateControl::fixed(RateMask::RATE_1)?,
//!     RateControl::new(RateMask::B_COMPAT, config.rate_defaults)?,
//! );
//! let peer = dma.tx_mut().peers_mut().insert(rates)?;
//! dma.tx_mut().submit(peer, &header, &payload, &mut irq, &mut netif)?;
//!
//! // From the interrupt handler:
//! dma.tx_mut().complete(&mut irq, &mut netif);
//! dma.rx_mut().ingest(&mut netif);
//! ```
//!
//! # Memory Requirements
//!
//! With the PCI defaults (16 TX and 16 RX descriptors) on an ACX111 with
//! host-resident queues, about 45 KB of DMA-capable memory.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

// Internal implementation details (pub(crate) only). Declared first so the
// logging macros are visible to every other module.
#[macro_use]
mod internal;

pub mod driver;
pub mod hal;

#[cfg(feature = "critical-section")]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{
    AddressingMode, ChipGeneration, DmaConfig, LinkState, RateDefaults, RxMode, WaterMarks,
};
pub use driver::error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result,
};
pub use driver::peer::{PeerId, PeerRates, PeerTable, TrafficClass};
pub use driver::rate::{RateControl, RateMask, TxRateField};
pub use driver::rx::{IngestSummary, RxEngine};
pub use driver::signal::SignalQuality;
pub use driver::stats::{RxStats, TxErrorKind, TxStats};
pub use driver::tx::{CompletionSummary, TxEngine};
pub use driver::upstream::{CaptureHeader, RxDispatch, RxFrame, TxQueueControl};
pub use driver::wlan::{QueueConfig, WlanDma, WlanDmaPci, WlanDmaUsb};
pub use hal::{DeviceSignal, DmaAllocator, DmaRegion, QueueWindow};

pub use internal::dma::descriptor::Ownership;
pub use internal::dma::pool::{PoolKind, PoolLayout, PoolSpec};

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::{SharedWlanDma, SharedWlanDmaPci, SharedWlanDmaUsb};

/// Shared engine constants.
///
/// Grouped into a dedicated module to keep the top-level facade focused on
/// driver types.
pub mod constants {
    pub use crate::internal::constants::{
        // Defaults
        DEFAULT_FALLBACK_THRESHOLD,
        DEFAULT_RTS_THRESHOLD,
        DEFAULT_RX_DESCS_PCI,
        DEFAULT_RX_DESCS_USB,
        DEFAULT_STEPUP_THRESHOLD,
        DEFAULT_TX_DESCS_PCI,
        DEFAULT_TX_DESCS_USB,
        DEFAULT_TX_HIGH_WATER,
        DEFAULT_TX_LOW_WATER,
        // Descriptor records
        HOST_DESC_SIZE,
        MAX_PEERS,
        PHY_HDR_LEN_ACX100,
        PHY_HDR_LEN_ACX111,
        RX_BUFFER_SIZE,
        RX_DESC_SIZE,
        RXBUF_HDR_SIZE,
        TEARDOWN_QUIESCE_MS,
        TX_DESC_SIZE_ACX100,
        TX_DESC_SIZE_ACX111,
        // Buffers and frames
        TX_HEADER_SLOT_SIZE,
        TX_PAYLOAD_SLOT_SIZE,
        WLAN_MAX_CAPTURE_LEN,
        WLAN_MIN_FRAME_LEN,
    };
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Declare a static, ISR-safe ring engine slot.
///
/// Expands to an empty [`sync::SharedWlanDma`] static. Install the engine
/// after bring-up.
///
/// # Examples
///
/// ```ignore
/// ph_acx_dma::wlan_dma_static!(WLAN);
///
/// let dma = WlanDmaPci::bring_up(config, &mut allocator, None)?;
/// WLAN.install(dma).ok();
/// WLAN.with_tx(|tx| tx.complete(&mut irq, &mut netif));
/// ```
#[cfg(feature = "critical-section")]
#[macro_export]
macro_rules! wlan_dma_static {
    ($name:ident) => {
        $crate::wlan_dma_static!($name, 16, 16);
    };
    ($name:ident, $tx:expr, $rx:expr) => {
        static $name: $crate::sync::SharedWlanDma<$tx, $rx> = $crate::sync::SharedWlanDma::new();
    };
}
