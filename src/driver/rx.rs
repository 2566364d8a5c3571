//! RX ingestion.
//!
//! [`RxEngine`] walks the RX ring for buffers the device filled, hands each
//! frame to an [`RxDispatch`], and posts the buffer straight back to the
//! device. All buffers stay posted between calls; a frame borrowed by the
//! dispatcher is only valid until `deliver` returns.

use super::config::{ChipGeneration, DmaConfig, RxMode};
use super::error::{ConfigError, ConfigResult};
use super::signal::SignalQuality;
use super::stats::RxStats;
use super::upstream::{CaptureHeader, RxDispatch, RxFrame};
use crate::internal::constants::{RXBUF_HDR_SIZE, WLAN_MAX_CAPTURE_LEN, WLAN_MIN_FRAME_LEN};
use crate::internal::dma::descriptor::RxQueue;
use crate::internal::dma::descriptor::rx::RxBufferHeader;
use crate::internal::dma::ring::DescriptorRing;

/// Outcome of one ingestion pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IngestSummary {
    /// Filled buffers processed and reposted
    pub processed: usize,
    /// Descriptors inspected
    pub inspected: usize,
    /// Frames handed to the dispatcher (normal or capture path)
    pub delivered: usize,
}

/// RX path of the ring engine over `N` descriptors.
#[derive(Debug)]
pub struct RxEngine<const N: usize> {
    ring: DescriptorRing<N>,
    queue: RxQueue,
    mode: RxMode,
    generation: ChipGeneration,
    stats: RxStats,
    last_signal: Option<SignalQuality>,
}

impl<const N: usize> RxEngine<N> {
    /// Initialize the descriptor queue and post every buffer to the device.
    pub(crate) fn new(queue: RxQueue, config: &DmaConfig) -> ConfigResult<Self> {
        if queue.len() != N {
            return Err(ConfigError::InvalidConfig);
        }
        queue.init();

        Ok(Self {
            ring: DescriptorRing::new_posted(),
            queue,
            mode: config.rx_mode,
            generation: config.generation,
            stats: RxStats::default(),
            last_signal: None,
        })
    }

    /// Process every filled buffer starting at the ring tail.
    ///
    /// Inspects at most `N` descriptors. Finding nothing is not an error.
    pub fn ingest<D>(&mut self, dispatch: &mut D) -> IngestSummary
    where
        D: RxDispatch + ?Sized,
    {
        let phy_len = if self.mode.include_phy_header {
            self.generation.phy_header_len()
        } else {
            0
        };
        let Self {
            ring,
            queue,
            mode,
            stats,
            last_signal,
            ..
        } = &mut *self;
        let queue = &*queue;
        let monitor = mode.monitor;

        let mut delivered = 0;
        let scan = ring.recycle_filled(queue, |index| {
            let header = queue.header(index);
            let signal = SignalQuality::from_raw(header.level, header.snr);
            *last_signal = Some(signal);

            let accepted = if monitor {
                capture(queue, index, &header, signal, phy_len, stats, dispatch)
            } else {
                receive(queue, index, &header, signal, phy_len, stats, dispatch)
            };
            if accepted {
                delivered += 1;
            }
        });

        if scan.processed > 0 {
            trace!("rx: {} buffers in {} inspections", scan.processed, scan.inspected);
        }

        IngestSummary {
            processed: scan.processed,
            inspected: scan.inspected,
            delivered,
        }
    }

    /// Switch monitor capture or PHY header inclusion.
    ///
    /// Takes effect for the next buffer processed.
    pub fn set_mode(&mut self, mode: RxMode) {
        self.mode = mode;
    }

    /// Current receive mode
    #[inline(always)]
    pub const fn mode(&self) -> RxMode {
        self.mode
    }

    /// RX counters
    #[inline(always)]
    pub const fn stats(&self) -> &RxStats {
        &self.stats
    }

    /// Signal metrics of the most recent frame
    #[inline(always)]
    pub const fn last_signal(&self) -> Option<SignalQuality> {
        self.last_signal
    }

    /// Next descriptor to inspect
    #[inline(always)]
    pub const fn tail(&self) -> usize {
        self.ring.tail()
    }

    /// Descriptor queue
    #[inline(always)]
    pub(crate) const fn queue(&self) -> &RxQueue {
        &self.queue
    }
}

// Frame length after the optional PHY header, or `None` when the length
// field cannot describe a frame in this buffer.
fn frame_len(header: &RxBufferHeader, phy_len: usize) -> Option<usize> {
    usize::from(header.length).checked_sub(phy_len)
}

fn capture<D: RxDispatch + ?Sized>(
    queue: &RxQueue,
    index: usize,
    header: &RxBufferHeader,
    signal: SignalQuality,
    phy_len: usize,
    stats: &mut RxStats,
    dispatch: &mut D,
) -> bool {
    let Some(len) = frame_len(header, phy_len) else {
        stats.rx_length_errors = stats.rx_length_errors.wrapping_add(1);
        return false;
    };
    if len > WLAN_MAX_CAPTURE_LEN {
        warn!("rx capture: oversized frame of {} bytes on slot {}", len, index);
        stats.rx_dropped_oversize = stats.rx_dropped_oversize.wrapping_add(1);
        return false;
    }
    let Some(frame) = queue.frame(index, RXBUF_HDR_SIZE + phy_len, len) else {
        stats.rx_length_errors = stats.rx_length_errors.wrapping_add(1);
        return false;
    };

    let capture = CaptureHeader {
        timestamp: header.time,
        signal: signal.level,
        noise: signal.noise,
        frame_len: len as u16,
        received: true,
    };
    dispatch.deliver_capture(&capture, frame);
    stats.rx_captured = stats.rx_captured.wrapping_add(1);
    true
}

fn receive<D: RxDispatch + ?Sized>(
    queue: &RxQueue,
    index: usize,
    header: &RxBufferHeader,
    signal: SignalQuality,
    phy_len: usize,
    stats: &mut RxStats,
    dispatch: &mut D,
) -> bool {
    let Some(len) = frame_len(header, phy_len) else {
        debug!("rx: length {} shorter than PHY header on slot {}", header.length, index);
        stats.rx_length_errors = stats.rx_length_errors.wrapping_add(1);
        return false;
    };
    if len < WLAN_MIN_FRAME_LEN {
        debug!("rx: dropping {} byte frame on slot {}", len, index);
        stats.rx_dropped_short = stats.rx_dropped_short.wrapping_add(1);
        return false;
    }
    let Some(data) = queue.frame(index, RXBUF_HDR_SIZE + phy_len, len) else {
        debug!("rx: length {} runs past buffer on slot {}", len, index);
        stats.rx_length_errors = stats.rx_length_errors.wrapping_add(1);
        return false;
    };

    dispatch.deliver(RxFrame {
        data,
        signal,
        timestamp: header.time,
        plcp_signal: header.plcp_signal,
        mac_status: header.mac_status,
    });
    stats.rx_packets = stats.rx_packets.wrapping_add(1);
    stats.rx_bytes = stats.rx_bytes.wrapping_add(len as u32);
    true
}
