//! Ring engine lifecycle.
//!
//! [`WlanDma`] owns every shared-memory pool together with the TX and RX
//! engines built on top of them. It is created once by
//! [`WlanDma::bring_up`] and destroyed once by [`WlanDma::teardown`]; ring
//! capacity is fixed in between.

use embedded_hal::delay::DelayNs;

use super::config::DmaConfig;
use super::error::ConfigResult;
use super::rx::RxEngine;
use super::tx::TxEngine;
use crate::hal::dma::{DmaAllocator, QueueWindow};
use crate::hal::signal::DeviceSignal;
use crate::internal::constants::{
    DEFAULT_RX_DESCS_PCI, DEFAULT_RX_DESCS_USB, DEFAULT_TX_DESCS_PCI, DEFAULT_TX_DESCS_USB,
    TEARDOWN_QUIESCE_MS,
};
use crate::internal::dma::pool::{DmaPools, PoolLayout};

/// Ring placement reported to firmware by the queue configuration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueConfig {
    /// Bus address of the first TX descriptor
    pub tx_base: u32,
    /// TX descriptors
    pub tx_count: usize,
    /// Bus address of the first RX descriptor
    pub rx_base: u32,
    /// RX descriptors
    pub rx_count: usize,
    /// Stride of one TX descriptor
    pub tx_desc_size: usize,
}

/// Pools and layout kept aside while the engines are shared.
#[derive(Debug)]
pub(crate) struct WlanResources {
    config: DmaConfig,
    layout: PoolLayout,
    pools: DmaPools,
}

/// Descriptor-ring engine for one adapter.
///
/// # Type Parameters
///
/// * `TX` - TX descriptors
/// * `RX` - RX descriptors
///
/// # Example
///
/// ```ignore
/// let config = DmaConfig::new().with_generation(ChipGeneration::Acx111);
/// let mut dma: WlanDmaPci = WlanDma::bring_up(config, &mut alloc, Some(window))?;
/// firmware.configure_queues(dma.queue_config());
///
/// let peer = dma.tx_mut().peers_mut().insert(rates)?;
/// dma.tx_mut().submit(peer, header, payload, &mut doorbell, &mut netif)?;
/// ```
#[derive(Debug)]
pub struct WlanDma<const TX: usize, const RX: usize> {
    resources: WlanResources,
    tx: TxEngine<TX>,
    rx: RxEngine<RX>,
}

/// Default PCI sizing
pub type WlanDmaPci = WlanDma<DEFAULT_TX_DESCS_PCI, DEFAULT_RX_DESCS_PCI>;

/// Default USB sizing
pub type WlanDmaUsb = WlanDma<DEFAULT_TX_DESCS_USB, DEFAULT_RX_DESCS_USB>;

impl<const TX: usize, const RX: usize> WlanDma<TX, RX> {
    /// Allocate every pool, initialize both descriptor queues, and post all
    /// RX buffers.
    ///
    /// With split addressing `window` is the adapter memory reserved for the
    /// descriptor queues. Any failure leaves `alloc` exactly as it was.
    pub fn bring_up<A>(config: DmaConfig, alloc: &mut A, window: Option<QueueWindow>) -> ConfigResult<Self>
    where
        A: DmaAllocator + ?Sized,
    {
        config.validate(TX, RX)?;

        let layout = PoolLayout::new(&config, TX, RX);
        let pools = DmaPools::allocate(&layout, alloc, window)?;

        let engines = Self::build_engines(&config, &layout, &pools);
        let (tx, rx) = match engines {
            Ok(engines) => engines,
            Err(e) => {
                error!("engine setup failed: {}, releasing pools", e.as_str());
                pools.release(alloc);
                return Err(e);
            }
        };

        info!(
            "wlan dma up: {} tx / {} rx descriptors, {} bytes in {} pools",
            TX,
            RX,
            layout.host_memory(),
            pools.len()
        );

        Ok(Self {
            resources: WlanResources { config, layout, pools },
            tx,
            rx,
        })
    }

    fn build_engines(
        config: &DmaConfig,
        layout: &PoolLayout,
        pools: &DmaPools,
    ) -> ConfigResult<(TxEngine<TX>, RxEngine<RX>)> {
        let tx_queue = pools.tx_queue(layout)?;
        let buffers = pools.tx_buffers(layout)?;
        let rx_queue = pools.rx_queue(layout)?;
        let tx = TxEngine::new(tx_queue, buffers, config)?;
        let rx = RxEngine::new(rx_queue, config)?;
        Ok((tx, rx))
    }

    /// Stop the device, wait for in-flight DMA, and release every pool.
    pub fn teardown<A, S, D>(self, alloc: &mut A, signal: &mut S, delay: &mut D)
    where
        A: DmaAllocator + ?Sized,
        S: DeviceSignal + ?Sized,
        D: DelayNs + ?Sized,
    {
        let in_flight = self.tx.in_flight();
        signal.quiesce();
        delay.delay_ms(TEARDOWN_QUIESCE_MS);

        let pools = self.resources.pools;
        debug!("teardown: {} tx in flight, releasing {} pools", in_flight, pools.len());
        pools.release(alloc);
    }

    /// Configuration the engine was brought up with
    #[inline(always)]
    pub const fn config(&self) -> &DmaConfig {
        &self.resources.config
    }

    /// Pool sizes
    #[inline(always)]
    pub const fn layout(&self) -> &PoolLayout {
        &self.resources.layout
    }

    /// Base addresses and counts to hand to firmware.
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            tx_base: self.tx.queue().descs().base_bus(),
            tx_count: TX,
            rx_base: self.rx.queue().descs().base_bus(),
            rx_count: RX,
            tx_desc_size: self.resources.config.generation.tx_desc_size(),
        }
    }

    /// TX path
    #[inline(always)]
    pub const fn tx(&self) -> &TxEngine<TX> {
        &self.tx
    }

    /// TX path, mutable
    #[inline(always)]
    pub fn tx_mut(&mut self) -> &mut TxEngine<TX> {
        &mut self.tx
    }

    /// RX path
    #[inline(always)]
    pub const fn rx(&self) -> &RxEngine<RX> {
        &self.rx
    }

    /// RX path, mutable
    #[inline(always)]
    pub fn rx_mut(&mut self) -> &mut RxEngine<RX> {
        &mut self.rx
    }

    /// Borrow both paths at once, e.g. to run completion and ingestion from
    /// the same interrupt handler.
    #[inline]
    pub fn split(&mut self) -> (&mut TxEngine<TX>, &mut RxEngine<RX>) {
        (&mut self.tx, &mut self.rx)
    }

    #[cfg(feature = "critical-section")]
    pub(crate) fn into_parts(self) -> (WlanResources, TxEngine<TX>, RxEngine<RX>) {
        (self.resources, self.tx, self.rx)
    }

    #[cfg(feature = "critical-section")]
    pub(crate) fn from_parts(resources: WlanResources, tx: TxEngine<TX>, rx: RxEngine<RX>) -> Self {
        Self { resources, tx, rx }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec;

    use super::*;
    use crate::driver::config::{AddressingMode, ChipGeneration, LinkState};
    use crate::driver::error::ConfigError;
    use crate::driver::peer::PeerRates;
    use crate::driver::rate::{RateControl, RateMask};
    use crate::internal::dma::descriptor::Ownership;
    use crate::testing::{
        DeviceSim, MockAllocator, MockSignal, MockTxQueue, NoopDelay, RecordingDispatch, RxSignal,
        data_header, window_over,
    };

    fn peer_rates() -> PeerRates {
        PeerRates::new(
            RateControl::fixed(RateMask::RATE_1).unwrap(),
            RateControl::new(RateMask::B_COMPAT, Default::default()).unwrap(),
        )
    }

    #[test]
    fn split_bring_up_places_queues_in_window() {
        let config = DmaConfig::new();
        let layout = PoolLayout::new(&config, 16, 16);
        let mut backing = vec![0u32; layout.queue_window_size() / 4];
        let window = window_over(&mut backing, 0x0002_0000);
        let mut alloc = MockAllocator::new();

        let dma: WlanDmaPci = WlanDma::bring_up(config, &mut alloc, Some(window)).unwrap();
        let queues = dma.queue_config();
        assert_eq!(queues.tx_base, 0x0002_0000);
        assert_eq!(queues.rx_base, 0x0002_0000 + 16 * 0x30);
        assert_eq!((queues.tx_count, queues.rx_count), (16, 16));
        assert_eq!(queues.tx_desc_size, 0x30);
        assert_eq!(alloc.live(), 5);
        assert_eq!(dma.tx().free_count(), 16);

        dma.teardown(&mut alloc, &mut MockSignal::default(), &mut NoopDelay::default());
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn split_bring_up_without_window_fails_cleanly() {
        let mut alloc = MockAllocator::new();
        let result = WlanDmaUsb::bring_up(DmaConfig::new(), &mut alloc, None);
        assert_eq!(result.err(), Some(ConfigError::QueueWindowMissing));
        assert_eq!(alloc.allocated(), 0);
    }

    #[test]
    fn invalid_config_rejected_before_allocation() {
        let mut alloc = MockAllocator::new();
        let config = DmaConfig::new()
            .with_addressing(AddressingMode::Unified)
            .with_tx_water_marks(3, 10);
        let result = WlanDmaUsb::bring_up(config, &mut alloc, None);
        assert_eq!(result.err(), Some(ConfigError::InvalidConfig));
        assert_eq!(alloc.allocated(), 0);
    }

    #[test]
    fn allocation_failure_rolls_back() {
        let config = DmaConfig::new()
            .with_generation(ChipGeneration::Acx111)
            .with_addressing(AddressingMode::Unified);
        for fail_at in 0..6 {
            let mut alloc = MockAllocator::new().fail_after(fail_at);
            let result = WlanDmaUsb::bring_up(config, &mut alloc, None);
            assert_eq!(result.err(), Some(ConfigError::AllocationFailed));
            assert_eq!(alloc.live(), 0);
        }
    }

    #[test]
    fn teardown_quiesces_waits_and_releases_once() {
        let config = DmaConfig::new().with_addressing(AddressingMode::Unified);
        let mut alloc = MockAllocator::new();
        let mut dma: WlanDmaUsb = WlanDma::bring_up(config, &mut alloc, None).unwrap();

        let peer = dma.tx_mut().peers_mut().insert(peer_rates()).unwrap();
        let mut signal = MockSignal::default();
        let mut upstream = MockTxQueue::default();
        dma.tx_mut()
            .submit(peer, &data_header(24), &[0; 64], &mut signal, &mut upstream)
            .unwrap();

        let mut delay = NoopDelay::default();
        dma.teardown(&mut alloc, &mut signal, &mut delay);
        assert_eq!(signal.quiesced, 1);
        assert_eq!(delay.total_ms(), 100);
        assert_eq!(alloc.live(), 0);
        assert_eq!(alloc.released(), alloc.allocated());
    }

    #[test]
    fn traffic_flows_both_ways() {
        let config = DmaConfig::new()
            .with_generation(ChipGeneration::Acx111)
            .with_addressing(AddressingMode::Unified);
        let mut alloc = MockAllocator::new();
        let mut dma: WlanDma<8, 4> = WlanDma::bring_up(config, &mut alloc, None).unwrap();

        let mut signal = MockSignal::default();
        let mut upstream = MockTxQueue::default();
        let mut dispatch = RecordingDispatch::default();
        let peer = dma.tx_mut().peers_mut().insert(peer_rates()).unwrap();
        dma.tx_mut().set_link_state(LinkState::Associated, &mut upstream);

        let (tx, rx) = dma.split();
        let index = tx
            .submit(peer, &data_header(24), &[1; 200], &mut signal, &mut upstream)
            .unwrap();
        assert_eq!(tx.slot_owner(index), Ownership::Device);
        DeviceSim::complete_tx(tx.queue(), index, 0, None);

        let mut frame = data_header(24);
        frame.extend_from_slice(&[2; 40]);
        DeviceSim::fill_rx(rx.queue(), 0, &frame, RxSignal::default(), 0);

        assert_eq!(tx.complete(&mut signal, &mut upstream).reclaimed, 1);
        assert_eq!(rx.ingest(&mut dispatch).delivered, 1);
        assert_eq!(dispatch.frames[0].data, frame);
        assert_eq!(tx.free_count(), 8);

        dma.teardown(&mut alloc, &mut signal, &mut NoopDelay::default());
        assert_eq!(alloc.live(), 0);
    }
}
