//! ISR-safe ring engine wrapper using critical sections.

use super::primitives::CriticalSectionCell;
use crate::driver::rx::RxEngine;
use crate::driver::tx::TxEngine;
use crate::driver::wlan::{WlanDma, WlanResources};
use crate::internal::constants::{
    DEFAULT_RX_DESCS_PCI, DEFAULT_RX_DESCS_USB, DEFAULT_TX_DESCS_PCI, DEFAULT_TX_DESCS_USB,
};

/// ISR-safe ring engine with independent TX and RX locks.
///
/// TX submission and TX completion serialize on the TX cell; RX ingestion
/// takes only the RX cell, so a receive interrupt never waits on a
/// transmitter. Each closure runs with interrupts disabled.
///
/// # Example
///
/// ```ignore
/// static WLAN: SharedWlanDma<16, 16> = SharedWlanDma::new();
///
/// WLAN.install(WlanDma::bring_up(config, &mut alloc, None)?).ok();
///
/// #[interrupt]
/// fn ACX_IRQ() {
///     WLAN.with_tx(|tx| tx.complete(&mut IRQ, &mut NETIF));
///     WLAN.with_rx(|rx| rx.ingest(&mut NETIF));
/// }
/// ```
pub struct SharedWlanDma<const TX: usize, const RX: usize> {
    resources: CriticalSectionCell<Option<WlanResources>>,
    tx: CriticalSectionCell<Option<TxEngine<TX>>>,
    rx: CriticalSectionCell<Option<RxEngine<RX>>>,
}

/// Default PCI sizing
pub type SharedWlanDmaPci = SharedWlanDma<DEFAULT_TX_DESCS_PCI, DEFAULT_RX_DESCS_PCI>;

/// Default USB sizing
pub type SharedWlanDmaUsb = SharedWlanDma<DEFAULT_TX_DESCS_USB, DEFAULT_RX_DESCS_USB>;

impl<const TX: usize, const RX: usize> SharedWlanDma<TX, RX> {
    /// Create an empty slot (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            resources: CriticalSectionCell::new(None),
            tx: CriticalSectionCell::new(None),
            rx: CriticalSectionCell::new(None),
        }
    }

    /// Move a running engine in.
    ///
    /// Gives the engine back if one is already installed.
    pub fn install(&self, dma: WlanDma<TX, RX>) -> Result<(), WlanDma<TX, RX>> {
        critical_section::with(|_| {
            if self.resources.with(|r| r.is_some()) {
                return Err(dma);
            }
            let (resources, tx, rx) = dma.into_parts();
            self.resources.with(|r| *r = Some(resources));
            self.tx.with(|t| *t = Some(tx));
            self.rx.with(|r| *r = Some(rx));
            Ok(())
        })
    }

    /// Run `f` on the TX engine; `None` if nothing is installed.
    #[inline]
    pub fn with_tx<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut TxEngine<TX>) -> R,
    {
        self.tx.with(|tx| tx.as_mut().map(f))
    }

    /// Run `f` on the RX engine; `None` if nothing is installed.
    #[inline]
    pub fn with_rx<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut RxEngine<RX>) -> R,
    {
        self.rx.with(|rx| rx.as_mut().map(f))
    }

    /// Like [`with_tx`](Self::with_tx), but `None` when the TX engine is
    /// already borrowed.
    #[inline]
    pub fn try_with_tx<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut TxEngine<TX>) -> R,
    {
        self.tx.try_with(|tx| tx.as_mut().map(f)).flatten()
    }

    /// Like [`with_rx`](Self::with_rx), but `None` when the RX engine is
    /// already borrowed.
    #[inline]
    pub fn try_with_rx<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut RxEngine<RX>) -> R,
    {
        self.rx.try_with(|rx| rx.as_mut().map(f)).flatten()
    }

    /// Move the engine back out, e.g. for teardown.
    pub fn take(&self) -> Option<WlanDma<TX, RX>> {
        critical_section::with(|_| {
            let resources = self.resources.with(Option::take)?;
            let tx = self.tx.with(Option::take);
            let rx = self.rx.with(Option::take);
            match (tx, rx) {
                (Some(tx), Some(rx)) => Some(WlanDma::from_parts(resources, tx, rx)),
                _ => None,
            }
        })
    }

    /// Engine is installed
    pub fn is_installed(&self) -> bool {
        self.resources.with(|r| r.is_some())
    }

    /// Consume the wrapper and return the engine, if installed.
    pub fn into_inner(self) -> Option<WlanDma<TX, RX>> {
        let resources = self.resources.into_inner()?;
        let tx = self.tx.into_inner()?;
        let rx = self.rx.into_inner()?;
        Some(WlanDma::from_parts(resources, tx, rx))
    }
}

impl<const TX: usize, const RX: usize> Default for SharedWlanDma<TX, RX> {
    fn default() -> Self {
        Self::new()
    }
}
