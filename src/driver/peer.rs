//! Peer rate state.
//!
//! The TX path owns a [`PeerTable`]; submission reads a peer's controller to
//! encode the rate and completion feeds the outcome back into the same
//! entry. Removing a peer bumps the slot's generation so ids held by frames
//! still in flight stop resolving.

use super::error::{ConfigError, ConfigResult};
use super::rate::RateControl;
use crate::internal::constants::MAX_PEERS;

/// Frame class used to pick a peer's rate controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrafficClass {
    /// Management frames (beacons, authentication, association): fixed base rate
    Management,
    /// Data and control frames: adaptive rate
    Data,
}

impl TrafficClass {
    /// Classify by the type field of an 802.11 frame-control word.
    #[inline]
    pub const fn from_frame_control(fc: u16) -> Self {
        if (fc >> 2) & 0x3 == 0 {
            TrafficClass::Management
        } else {
            TrafficClass::Data
        }
    }

    /// Classify a raw 802.11 header; `None` if it is shorter than the
    /// frame-control word.
    pub fn of_header(header: &[u8]) -> Option<Self> {
        match header {
            [lo, hi, ..] => Some(Self::from_frame_control(u16::from_le_bytes([*lo, *hi]))),
            _ => None,
        }
    }
}

/// Rate state for one peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerRates {
    /// Controller for management frames
    pub base: RateControl,
    /// Controller for data frames
    pub data: RateControl,
    /// Peer accepts short preamble
    pub short_preamble: bool,
}

impl PeerRates {
    /// Create peer state from a base and a data controller.
    pub const fn new(base: RateControl, data: RateControl) -> Self {
        Self {
            base,
            data,
            short_preamble: false,
        }
    }

    /// Mark short-preamble support
    #[must_use]
    pub const fn with_short_preamble(mut self, supported: bool) -> Self {
        self.short_preamble = supported;
        self
    }

    /// Controller for `class`
    #[inline]
    pub const fn class(&self, class: TrafficClass) -> &RateControl {
        match class {
            TrafficClass::Management => &self.base,
            TrafficClass::Data => &self.data,
        }
    }

    /// Mutable controller for `class`
    #[inline]
    pub fn class_mut(&mut self, class: TrafficClass) -> &mut RateControl {
        match class {
            TrafficClass::Management => &mut self.base,
            TrafficClass::Data => &mut self.data,
        }
    }
}

/// Handle to a peer table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerId {
    index: u8,
    generation: u16,
}

impl PeerId {
    /// Slot index inside the table
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.index as usize
    }
}

/// Fixed-capacity peer table.
#[derive(Debug)]
pub struct PeerTable<const N: usize = MAX_PEERS> {
    slots: [Option<PeerRates>; N],
    generations: [u16; N],
}

impl<const N: usize> PeerTable<N> {
    /// Empty table
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [const { None }; N],
            generations: [0; N],
        }
    }

    /// Add a peer.
    pub fn insert(&mut self, rates: PeerRates) -> ConfigResult<PeerId> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(ConfigError::PeerTableFull)?;
        self.slots[index] = Some(rates);
        Ok(PeerId {
            index: index as u8,
            generation: self.generations[index],
        })
    }

    /// Remove a peer, invalidating its id.
    pub fn remove(&mut self, id: PeerId) -> Option<PeerRates> {
        if !self.is_live(id) {
            return None;
        }
        let index = id.index();
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.slots[index].take()
    }

    /// Look up a peer
    pub fn get(&self, id: PeerId) -> Option<&PeerRates> {
        if self.is_live(id) {
            self.slots[id.index()].as_ref()
        } else {
            None
        }
    }

    /// Look up a peer mutably
    pub fn get_mut(&mut self, id: PeerId) -> Option<&mut PeerRates> {
        if self.is_live(id) {
            self.slots[id.index()].as_mut()
        } else {
            None
        }
    }

    /// Number of live peers
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// No live peers
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_live(&self, id: PeerId) -> bool {
        id.index() < N && self.generations[id.index()] == id.generation && self.slots[id.index()].is_some()
    }
}

impl<const N: usize> Default for PeerTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
