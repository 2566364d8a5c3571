//! Adaptive TX rate control
//!
//! Each peer carries a [`RateControl`] per traffic class. The controller
//! tracks which rates may currently be tried (`current`) inside the rates the
//! operator allows (`configured`) and adjusts `current` from TX completion
//! outcomes:
//!
//! - a completion at a lower rate than the best one tried, or one that ended
//!   in retry exhaustion or lifetime expiry, counts towards fallback;
//! - a completion at full rate counts towards step-up.
//!
//! Each counter must pass its threshold before the mask changes, and a
//! fallback resets the step-up count, so the controller falls back faster
//! than it climbs. The mask is never allowed to become empty.
//!
//! # Encodings
//!
//! ACX100 descriptors carry one rate in units of 100 kbit/s with bit 7
//! selecting PBCC. ACX111 descriptors carry the 13-bit mask itself, letting
//! firmware pick among the set bits.

use super::config::{ChipGeneration, RateDefaults};
use super::error::{ConfigError, ConfigResult};
use crate::internal::dma::descriptor::bits::txerr;

// =============================================================================
// Rate Mask
// =============================================================================

/// Set of 802.11b/g rates, one bit per rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateMask(u16);

impl RateMask {
    /// 1 Mbit/s
    pub const RATE_1: Self = Self(0x0001);
    /// 2 Mbit/s
    pub const RATE_2: Self = Self(0x0002);
    /// 5.5 Mbit/s
    pub const RATE_5_5: Self = Self(0x0004);
    /// 6 Mbit/s
    pub const RATE_6: Self = Self(0x0008);
    /// 9 Mbit/s
    pub const RATE_9: Self = Self(0x0010);
    /// 11 Mbit/s
    pub const RATE_11: Self = Self(0x0020);
    /// 12 Mbit/s
    pub const RATE_12: Self = Self(0x0040);
    /// 18 Mbit/s
    pub const RATE_18: Self = Self(0x0080);
    /// 22 Mbit/s (PBCC)
    pub const RATE_22: Self = Self(0x0100);
    /// 24 Mbit/s
    pub const RATE_24: Self = Self(0x0200);
    /// 36 Mbit/s
    pub const RATE_36: Self = Self(0x0400);
    /// 48 Mbit/s
    pub const RATE_48: Self = Self(0x0800);
    /// 54 Mbit/s
    pub const RATE_54: Self = Self(0x1000);

    /// Every supported rate
    pub const ALL: Self = Self(0x1fff);
    /// Rates an ACX100 can transmit
    pub const ACX100_COMPAT: Self = Self(0x0127);
    /// 802.11b rates
    pub const B_COMPAT: Self = Self(0x0027);
    /// No rates
    pub const EMPTY: Self = Self(0);

    /// Build a mask, rejecting bits outside [`RateMask::ALL`].
    #[must_use]
    pub const fn from_bits(bits: u16) -> Option<Self> {
        if bits & !Self::ALL.0 != 0 {
            None
        } else {
            Some(Self(bits))
        }
    }

    /// Build a mask, dropping bits outside [`RateMask::ALL`].
    #[must_use]
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw bits
    #[inline(always)]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// No rate set
    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Every bit of `other` is also set here
    #[inline(always)]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union
    #[inline(always)]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Index of the highest set bit
    #[inline]
    pub const fn highest_index(self) -> Option<u32> {
        if self.0 == 0 {
            None
        } else {
            Some(15 - self.0.leading_zeros())
        }
    }

    /// Only the highest set bit, or empty
    #[inline]
    #[must_use]
    pub const fn highest(self) -> Self {
        match self.highest_index() {
            Some(n) => Self(1 << n),
            None => Self::EMPTY,
        }
    }

    /// Mask with the highest set bit removed
    #[inline]
    #[must_use]
    pub const fn without_highest(self) -> Self {
        Self(self.0 & !self.highest().0)
    }
}

impl core::ops::BitOr for RateMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

// =============================================================================
// Hardware Encodings
// =============================================================================

/// ACX100 rate byte for 1 Mbit/s
pub const RATE100_1: u8 = 10;
/// ACX100 rate byte for 2 Mbit/s
pub const RATE100_2: u8 = 20;
/// ACX100 rate byte for 5.5 Mbit/s
pub const RATE100_5: u8 = 55;
/// ACX100 rate byte for 11 Mbit/s
pub const RATE100_11: u8 = 110;
/// ACX100 rate byte for 22 Mbit/s
pub const RATE100_22: u8 = 220;
/// ACX100 PBCC modulation flag
pub const RATE100_PBCC511: u8 = 0x80;

/// ACX111 PBCC modulation flag
pub const RATE111_PBCC511: u16 = 0x4000;
/// ACX111 short-preamble flag
pub const RATE111_SHORTPRE: u16 = 0x8000;

// Highest mask bit to ACX100 rate byte; zero entries are not ACX100 rates.
const BITPOS_TO_RATE100: [u8; 9] = [RATE100_1, RATE100_2, RATE100_5, 0, 0, RATE100_11, 0, 0, RATE100_22];

/// Rate field of a TX descriptor in the active chip generation's encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxRateField {
    /// ACX100 single rate in 100 kbit/s units, bit 7 for PBCC
    Acx100(u8),
    /// ACX111 rate bitmask plus modulation flags
    Acx111(u16),
}

impl TxRateField {
    /// Canonical single-bit rate the device reports it used.
    ///
    /// Unknown ACX100 values decode as 2 Mbit/s.
    pub fn decode(self) -> RateMask {
        match self {
            // 220 has bit 7 set itself; PBCC only ever marks 5.5 and 11.
            TxRateField::Acx100(RATE100_22) => RateMask::RATE_22,
            TxRateField::Acx100(raw) => match raw & !RATE100_PBCC511 {
                RATE100_1 => RateMask::RATE_1,
                RATE100_2 => RateMask::RATE_2,
                RATE100_5 => RateMask::RATE_5_5,
                RATE100_11 => RateMask::RATE_11,
                other => {
                    debug!("unknown ACX100 rate byte {}, assuming 2 Mbit/s", other);
                    RateMask::RATE_2
                }
            },
            TxRateField::Acx111(raw) => {
                let highest = RateMask::from_bits_truncate(raw).highest();
                if highest.is_empty() {
                    RateMask::RATE_1
                } else {
                    highest
                }
            }
        }
    }
}

fn rate100_from_mask(mask: RateMask) -> u8 {
    let index = mask.highest_index().unwrap_or(0) as usize;
    match BITPOS_TO_RATE100.get(index) {
        Some(&rate) if rate != 0 => rate,
        _ => {
            error!("rate mask {:#x} has no ACX100 encoding, using 1 Mbit/s", mask.bits());
            RATE100_1
        }
    }
}

// =============================================================================
// Rate Controller
// =============================================================================

/// Per-peer, per-class rate control state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateControl {
    current: RateMask,
    configured: RateMask,
    fallback_count: u8,
    fallback_threshold: u8,
    stepup_count: u8,
    stepup_threshold: u8,
    auto: bool,
    pbcc511: bool,
}

impl RateControl {
    /// Automatic controller trying every configured rate.
    pub fn new(configured: RateMask, defaults: RateDefaults) -> ConfigResult<Self> {
        if configured.is_empty() {
            return Err(ConfigError::InvalidRateMask);
        }
        Ok(Self {
            current: configured,
            configured,
            fallback_count: 0,
            fallback_threshold: defaults.fallback_threshold,
            stepup_count: 0,
            stepup_threshold: defaults.stepup_threshold,
            auto: true,
            pbcc511: false,
        })
    }

    /// Non-adaptive controller that always uses `rate`.
    pub fn fixed(rate: RateMask) -> ConfigResult<Self> {
        let mut control = Self::new(rate, RateDefaults::default())?;
        control.auto = false;
        Ok(control)
    }

    /// Start from `current` instead of the full configured set.
    pub fn with_current(mut self, current: RateMask) -> ConfigResult<Self> {
        if current.is_empty() || !self.configured.contains(current) {
            return Err(ConfigError::InvalidRateMask);
        }
        self.current = current;
        Ok(self)
    }

    /// Enable or disable PBCC modulation for 5.5/11/22 Mbit/s.
    #[must_use]
    pub const fn with_pbcc(mut self, enabled: bool) -> Self {
        self.pbcc511 = enabled;
        self
    }

    /// Replace the operator-allowed rates.
    ///
    /// `current` is trimmed to the new set; if nothing remains it restarts
    /// at the lowest configured rate.
    pub fn set_configured(&mut self, configured: RateMask) -> ConfigResult<()> {
        if configured.is_empty() {
            return Err(ConfigError::InvalidRateMask);
        }
        self.configured = configured;
        let trimmed = RateMask(self.current.0 & configured.0);
        self.current = if trimmed.is_empty() {
            RateMask(configured.0 & configured.0.wrapping_neg())
        } else {
            trimmed
        };
        self.fallback_count = 0;
        self.stepup_count = 0;
        Ok(())
    }

    /// Switch between adaptive and fixed operation.
    pub fn set_auto(&mut self, auto: bool) {
        self.auto = auto;
    }

    /// Rates currently tried
    #[inline(always)]
    pub const fn current(&self) -> RateMask {
        self.current
    }

    /// Operator-allowed rates
    #[inline(always)]
    pub const fn configured(&self) -> RateMask {
        self.configured
    }

    /// Adaptive mode
    #[inline(always)]
    pub const fn is_auto(&self) -> bool {
        self.auto
    }

    /// Consecutive bad outcomes so far
    #[inline(always)]
    pub const fn fallback_count(&self) -> u8 {
        self.fallback_count
    }

    /// Consecutive full-rate successes so far
    #[inline(always)]
    pub const fn stepup_count(&self) -> u8 {
        self.stepup_count
    }

    /// Feed one TX outcome.
    ///
    /// `rate_used` is the single rate the device reports, `error` the raw
    /// completion error code. Returns the new `current` mask when it changed.
    pub fn on_outcome(&mut self, rate_used: RateMask, error: u8) -> Option<RateMask> {
        let cur = self.current.0;
        let used = rate_used.0;
        let slower = cur > used && (cur ^ used) >= used;

        if slower || error & txerr::RATE_FALLBACK != 0 {
            self.stepup_count = 0;
            self.fallback_count = self.fallback_count.saturating_add(1);
            if self.fallback_count <= self.fallback_threshold {
                return None;
            }
            self.fallback_count = 0;

            let reduced = self.current.without_highest();
            if reduced.is_empty() {
                return None;
            }
            self.current = reduced;
        } else {
            self.fallback_count = 0;
            self.stepup_count = self.stepup_count.saturating_add(1);
            if self.stepup_count <= self.stepup_threshold {
                return None;
            }
            self.stepup_count = 0;

            let mut next = used;
            loop {
                next <<= 1;
                if next == 0 || next & !RateMask::ALL.0 != 0 {
                    return None;
                }
                if self.configured.0 & next != 0 {
                    break;
                }
            }
            if cur & next != 0 {
                return None;
            }
            self.current = RateMask(cur | next);
        }

        debug!("tx rate mask {:#x} -> {:#x}", cur, self.current.0);
        Some(self.current)
    }

    /// Short preamble applies: the peer supports it and the rate is above 1 Mbit/s.
    #[inline]
    pub fn short_preamble(&self, peer_supports: bool) -> bool {
        peer_supports && self.current != RateMask::RATE_1
    }

    /// Encode the rate for a TX descriptor.
    ///
    /// On ACX100 the short-preamble request travels in the control byte, so
    /// only ACX111 folds `short_preamble` into the rate field.
    pub fn encode(&self, generation: ChipGeneration, short_preamble: bool) -> TxRateField {
        match generation {
            ChipGeneration::Acx100 => {
                let mut rate = rate100_from_mask(self.current);
                if self.pbcc511 && (rate == RATE100_5 || rate == RATE100_11) {
                    rate |= RATE100_PBCC511;
                }
                TxRateField::Acx100(rate)
            }
            ChipGeneration::Acx111 => {
                let mut rate = if self.auto {
                    self.current.0
                } else {
                    self.current.highest().0
                };
                if self.pbcc511 {
                    rate |= RATE111_PBCC511;
                }
                if short_preamble {
                    rate |= RATE111_SHORTPRE;
                }
                TxRateField::Acx111(rate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(configured: RateMask, fallback: u8, stepup: u8) -> RateControl {
        RateControl::new(
            configured,
            RateDefaults {
                fallback_threshold: fallback,
                stepup_threshold: stepup,
            },
        )
        .unwrap()
    }

    // =========================================================================
    // RateMask
    // =========================================================================

    #[test]
    fn highest_bit_helpers() {
        let mask = RateMask::RATE_2 | RateMask::RATE_11;
        assert_eq!(mask.highest(), RateMask::RATE_11);
        assert_eq!(mask.highest_index(), Some(5));
        assert_eq!(mask.without_highest(), RateMask::RATE_2);
        assert_eq!(RateMask::EMPTY.highest_index(), None);
    }

    #[test]
    fn from_bits_rejects_flag_bits() {
        assert_eq!(RateMask::from_bits(0x0020), Some(RateMask::RATE_11));
        assert_eq!(RateMask::from_bits(RATE111_SHORTPRE | 0x0001), None);
        assert_eq!(RateMask::from_bits_truncate(0xffff), RateMask::ALL);
    }

    // =========================================================================
    // Fallback
    // =========================================================================

    #[test]
    fn fallback_after_threshold_plus_one_slow_outcomes() {
        let mut rc = control(RateMask::B_COMPAT, 2, 10);
        let before = rc.current();

        assert_eq!(rc.on_outcome(RateMask::RATE_2, 0), None);
        assert_eq!(rc.current(), before);
        assert_eq!(rc.on_outcome(RateMask::RATE_2, 0), None);
        assert_eq!(rc.current(), before);

        let after = rc.on_outcome(RateMask::RATE_2, 0);
        assert_eq!(after, Some(RateMask::RATE_1 | RateMask::RATE_2 | RateMask::RATE_5_5));
        assert_eq!(rc.fallback_count(), 0);
    }

    #[test]
    fn retry_exhaustion_counts_as_fallback_even_at_full_rate() {
        let mut rc = control(RateMask::B_COMPAT, 0, 10);
        let changed = rc.on_outcome(RateMask::RATE_11, txerr::RETRIES);
        assert_eq!(changed, Some(RateMask::RATE_1 | RateMask::RATE_2 | RateMask::RATE_5_5));
    }

    #[test]
    fn lifetime_expiry_counts_as_fallback() {
        let mut rc = control(RateMask::B_COMPAT, 0, 10);
        assert!(rc.on_outcome(RateMask::RATE_11, txerr::LIFETIME).is_some());
    }

    #[test]
    fn other_errors_do_not_trigger_fallback() {
        let mut rc = control(RateMask::B_COMPAT, 0, 10);
        assert_eq!(rc.on_outcome(RateMask::RATE_11, txerr::OVERFLOW), None);
        assert_eq!(rc.fallback_count(), 0);
        assert_eq!(rc.stepup_count(), 1);
    }

    #[test]
    fn mask_never_becomes_empty() {
        let mut rc = control(RateMask::B_COMPAT, 0, 10);
        for _ in 0..64 {
            rc.on_outcome(RateMask::RATE_1, txerr::RETRIES);
            assert!(!rc.current().is_empty());
        }
        assert_eq!(rc.current(), RateMask::RATE_1);
    }

    #[test]
    fn fallback_resets_stepup_progress() {
        let mut rc = control(RateMask::B_COMPAT, 5, 5);
        rc.on_outcome(RateMask::RATE_11, 0);
        rc.on_outcome(RateMask::RATE_11, 0);
        assert_eq!(rc.stepup_count(), 2);
        rc.on_outcome(RateMask::RATE_1, 0);
        assert_eq!(rc.stepup_count(), 0);
        assert_eq!(rc.fallback_count(), 1);
    }

    // =========================================================================
    // Step-up
    // =========================================================================

    #[test]
    fn stepup_adds_next_configured_rate() {
        let mut rc = control(RateMask::B_COMPAT, 3, 1)
            .with_current(RateMask::RATE_1 | RateMask::RATE_2)
            .unwrap();

        assert_eq!(rc.on_outcome(RateMask::RATE_2, 0), None);
        let changed = rc.on_outcome(RateMask::RATE_2, 0);
        assert_eq!(changed, Some(RateMask::RATE_1 | RateMask::RATE_2 | RateMask::RATE_5_5));

        // 6 and 9 are not configured, so 11 comes next.
        rc.on_outcome(RateMask::RATE_5_5, 0);
        let changed = rc.on_outcome(RateMask::RATE_5_5, 0);
        assert_eq!(changed.map(RateMask::highest), Some(RateMask::RATE_11));
    }

    #[test]
    fn stepup_at_top_rate_is_no_change() {
        let mut rc = control(RateMask::B_COMPAT, 3, 0);
        assert_eq!(rc.on_outcome(RateMask::RATE_11, 0), None);
        assert_eq!(rc.current(), RateMask::B_COMPAT);
    }

    #[test]
    fn slower_is_decided_by_highest_bit() {
        // Current {1,2,5.5}; a completion at 5.5 is full rate.
        let mut rc = control(RateMask::B_COMPAT, 0, 100)
            .with_current(RateMask::RATE_1 | RateMask::RATE_2 | RateMask::RATE_5_5)
            .unwrap();
        assert_eq!(rc.on_outcome(RateMask::RATE_5_5, 0), None);
        assert_eq!(rc.stepup_count(), 1);

        // A completion at 2 is slower.
        assert!(rc.on_outcome(RateMask::RATE_2, 0).is_some());
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    #[test]
    fn rejects_empty_and_out_of_range_masks() {
        assert_eq!(
            RateControl::new(RateMask::EMPTY, RateDefaults::default()),
            Err(ConfigError::InvalidRateMask)
        );
        let rc = control(RateMask::B_COMPAT, 3, 10);
        assert_eq!(rc.with_current(RateMask::RATE_54), Err(ConfigError::InvalidRateMask));
    }

    #[test]
    fn set_configured_trims_current() {
        let mut rc = control(RateMask::B_COMPAT, 3, 10);
        rc.set_configured(RateMask::RATE_54 | RateMask::RATE_48).unwrap();
        assert_eq!(rc.current(), RateMask::RATE_48);

        rc.set_configured(RateMask::RATE_48 | RateMask::RATE_6).unwrap();
        assert_eq!(rc.current(), RateMask::RATE_48);
    }

    // =========================================================================
    // Encodings
    // =========================================================================

    #[test]
    fn acx100_encoding_uses_highest_rate() {
        let rc = control(RateMask::B_COMPAT, 3, 10);
        assert_eq!(rc.encode(ChipGeneration::Acx100, false), TxRateField::Acx100(RATE100_11));

        let pbcc = rc.with_pbcc(true);
        assert_eq!(
            pbcc.encode(ChipGeneration::Acx100, true),
            TxRateField::Acx100(RATE100_11 | RATE100_PBCC511)
        );
    }

    #[test]
    fn acx100_encoding_falls_back_for_ofdm_rates() {
        let rc = control(RateMask::RATE_54, 3, 10);
        assert_eq!(rc.encode(ChipGeneration::Acx100, false), TxRateField::Acx100(RATE100_1));
    }

    #[test]
    fn acx111_encoding_sends_mask_when_auto() {
        let rc = control(RateMask::B_COMPAT, 3, 10);
        assert_eq!(rc.encode(ChipGeneration::Acx111, false), TxRateField::Acx111(0x0027));
        assert_eq!(rc.encode(ChipGeneration::Acx111, true), TxRateField::Acx111(0x8027));

        let fixed = RateControl::fixed(RateMask::B_COMPAT).unwrap();
        assert_eq!(fixed.encode(ChipGeneration::Acx111, false), TxRateField::Acx111(0x0020));
    }

    #[test]
    fn short_preamble_skipped_at_one_mbit() {
        let rc = RateControl::fixed(RateMask::RATE_1).unwrap();
        assert!(!rc.short_preamble(true));
        let rc = RateControl::fixed(RateMask::RATE_2).unwrap();
        assert!(rc.short_preamble(true));
        assert!(!rc.short_preamble(false));
    }

    #[test]
    fn decode_maps_back_to_single_bit() {
        assert_eq!(TxRateField::Acx100(RATE100_11 | RATE100_PBCC511).decode(), RateMask::RATE_11);
        assert_eq!(TxRateField::Acx100(RATE100_22).decode(), RateMask::RATE_22);
        assert_eq!(TxRateField::Acx100(99).decode(), RateMask::RATE_2);
        assert_eq!(TxRateField::Acx111(0x8027).decode(), RateMask::RATE_11);
        assert_eq!(TxRateField::Acx111(0).decode(), RateMask::RATE_1);
    }

    #[test]
    fn acx100_pbcc_flag_only_strips_from_cck_rates() {
        assert_eq!(TxRateField::Acx100(RATE100_5 | RATE100_PBCC511).decode(), RateMask::RATE_5_5);
        assert_eq!(TxRateField::Acx100(RATE100_22 & !RATE100_PBCC511).decode(), RateMask::RATE_2);
    }

    #[test]
    fn acx100_full_rate_22_completions_do_not_fall_back() {
        let configured = RateMask::B_COMPAT | RateMask::RATE_22;
        let mut rc = control(configured, 2, 10);
        let sent = rc.encode(ChipGeneration::Acx100, false);
        assert_eq!(sent, TxRateField::Acx100(RATE100_22));

        for _ in 0..5 {
            assert_eq!(rc.on_outcome(sent.decode(), 0), None);
        }
        assert_eq!(rc.current(), configured);
        assert_eq!(rc.fallback_count(), 0);
        assert_eq!(rc.stepup_count(), 5);
    }
}
