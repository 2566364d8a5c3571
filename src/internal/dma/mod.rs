//! DMA descriptor rings
//!
//! - [`descriptor`]: Byte-level access to device and host descriptor records
//! - [`pool`]: Shared-memory pools and the TX buffer layout
//! - [`ring`]: Head/tail bookkeeping shared by the TX and RX paths

pub mod descriptor;
pub mod pool;
pub mod ring;
