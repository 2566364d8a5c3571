//! Device doorbell.
//!
//! The engine pokes the adapter through two signals only: "new TX work is
//! queued" after a descriptor is published, and "stop DMA" at teardown.
//! Register access is left to the platform.

/// Host-to-device signalling used by the ring engine.
pub trait DeviceSignal {
    /// Tell the firmware that freshly published TX descriptors are waiting.
    ///
    /// On PCI adapters this writes the TX bit of the interrupt-trigger
    /// register.
    fn notify_tx_work(&mut self);

    /// Stop the radio and DMA engines so no further descriptor or buffer
    /// accesses occur.
    fn quiesce(&mut self);
}

impl<T: DeviceSignal + ?Sized> DeviceSignal for &mut T {
    #[inline]
    fn notify_tx_work(&mut self) {
        (**self).notify_tx_work();
    }

    #[inline]
    fn quiesce(&mut self) {
        (**self).quiesce();
    }
}
