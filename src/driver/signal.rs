//! Receive signal quality.
//!
//! Raw level and SNR bytes from the RX buffer header are scaled to 0..=100
//! and combined into a single quality figure.

/// Signal metrics of one received frame, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalQuality {
    /// Signal level
    pub level: u8,
    /// Noise level
    pub noise: u8,
    /// Composite link quality
    pub quality: u8,
}

impl SignalQuality {
    /// Derive metrics from the raw `phy_level` and `phy_snr` bytes.
    pub fn from_raw(raw_level: u8, raw_snr: u8) -> Self {
        let level = scale_level(raw_level);
        let noise = scale_level(raw_snr);
        Self {
            level,
            noise,
            quality: quality(level, noise),
        }
    }
}

/// Scale a raw level byte: `min(100, (4 + raw * 5) / 8)`.
#[inline]
pub const fn scale_level(raw: u8) -> u8 {
    let scaled = (4 + raw as u32 * 5) / 8;
    if scaled > 100 { 100 } else { scaled as u8 }
}

/// Composite quality: mean of the level above a 30 floor (scaled over 70)
/// and the noise penalty, clamped to `0..=100`.
#[inline]
pub const fn quality(level: u8, noise: u8) -> u8 {
    let from_level = (level as i32 - 30) * 100 / 70;
    let from_noise = 100 - noise as i32 * 4;
    let q = (from_level + from_noise) / 2;
    if q < 0 {
        0
    } else if q > 100 {
        100
    } else {
        q as u8
    }
}
