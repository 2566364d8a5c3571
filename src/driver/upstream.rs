//! Interfaces towards the network layer above the ring engine.
//!
//! The engine never owns a network stack. Received frames leave through
//! [`RxDispatch`], and TX backpressure is signalled through
//! [`TxQueueControl`].

use super::signal::SignalQuality;

/// Stop/resume control of the upstream TX frame source.
///
/// Calls are edge-triggered: `stop` is only issued while the queue runs and
/// `wake` only while it is stopped.
pub trait TxQueueControl {
    /// Stop handing frames to the driver.
    fn stop(&mut self);

    /// Resume handing frames to the driver.
    fn wake(&mut self);
}

impl<T: TxQueueControl + ?Sized> TxQueueControl for &mut T {
    #[inline]
    fn stop(&mut self) {
        (**self).stop();
    }

    #[inline]
    fn wake(&mut self) {
        (**self).wake();
    }
}

/// A received frame on the normal path.
///
/// `data` borrows the receive buffer and is only valid for the duration of
/// the [`RxDispatch::deliver`] call.
#[derive(Debug, Clone, Copy)]
pub struct RxFrame<'a> {
    /// 802.11 frame bytes
    pub data: &'a [u8],
    /// Signal metrics at reception
    pub signal: SignalQuality,
    /// Device receive timestamp
    pub timestamp: u32,
    /// PLCP signal byte (rate of the received frame)
    pub plcp_signal: u8,
    /// MAC status byte
    pub mac_status: u8,
}

/// Metadata prepended to frames on the capture path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureHeader {
    /// Device receive timestamp
    pub timestamp: u32,
    /// Signal level, `0..=100`
    pub signal: u8,
    /// Noise level, `0..=100`
    pub noise: u8,
    /// Captured frame length
    pub frame_len: u16,
    /// Frame was received (as opposed to a transmit echo)
    pub received: bool,
}

/// Consumer of received frames.
pub trait RxDispatch {
    /// Hand a frame to normal protocol processing.
    fn deliver(&mut self, frame: RxFrame<'_>);

    /// Hand an unfiltered frame to the capture path.
    fn deliver_capture(&mut self, header: &CaptureHeader, frame: &[u8]);
}

impl<T: RxDispatch + ?Sized> RxDispatch for &mut T {
    #[inline]
    fn deliver(&mut self, frame: RxFrame<'_>) {
        (**self).deliver(frame);
    }

    #[inline]
    fn deliver_capture(&mut self, header: &CaptureHeader, frame: &[u8]) {
        (**self).deliver_capture(header, frame);
    }
}
