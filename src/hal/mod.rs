//! Hardware Abstraction Layer
//!
//! Traits the platform implements so the ring engine can run without
//! knowing how the adapter is attached.
//!
//! # Modules
//!
//! - [`dma`]: DMA-capable memory provider and adapter queue window
//! - [`signal`]: Doorbell and quiesce signals to the device
//!
//! # Delay Integration
//!
//! Teardown waits for in-flight DMA with `embedded_hal::delay::DelayNs`.
//! Pass any delay implementation from your HAL.

pub mod dma;
pub mod signal;

// Re-export commonly used types
pub use dma::{DmaAllocator, DmaRegion, QueueWindow};
pub use signal::DeviceSignal;
