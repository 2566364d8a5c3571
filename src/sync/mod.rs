//! Synchronization Support
//!
//! ISR-safe access to a running ring engine.
//!
//! - [`CriticalSectionCell`]: Interrupt-safe interior mutability
//! - [`SharedWlanDma`]: The engine split into a TX cell and an RX cell, so
//!   submission and completion exclude each other while RX ingestion runs
//!   independently
//!
//! Requires the `critical-section` feature. The platform HAL crate provides
//! the critical-section implementation.
//!
//! # Example
//!
//! ```ignore
//! use ph_acx_dma::sync::SharedWlanDmaPci;
//!
//! static WLAN: SharedWlanDmaPci = SharedWlanDmaPci::new();
//!
//! fn start(dma: WlanDmaPci) {
//!     WLAN.install(dma).ok();
//! }
//!
//! #[interrupt]
//! fn ACX_IRQ() {
//!     WLAN.with_rx(|rx| rx.ingest(&mut NETIF));
//! }
//! ```

mod primitives;
mod shared;

pub use primitives::CriticalSectionCell;
pub use shared::{SharedWlanDma, SharedWlanDmaPci, SharedWlanDmaUsb};
