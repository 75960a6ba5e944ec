//! Ambient light classification.
//!
//! Readings are sorted into three bands against two thresholds.  Between
//! the thresholds brightness falls off linearly:
//!
//! ```text
//!  duty
//!  100 ┤━━━━━━━━┓
//!      │         ╲
//!      │          ╲
//!    0 ┤           ╲━━━━━━━━━
//!      └────────┬────────┬──── reading
//!              low      high
//! ```

/// Which brightness regime a reading falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbientBand {
    /// Below the low threshold.
    Dark,
    /// Between the thresholds, carrying the mapped duty cycle.
    Moderate(u8),
    /// Above the high threshold.
    Bright,
}

/// Thresholds for [`AmbientBand`] classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientThresholds {
    pub low: u16,
    pub high: u16,
}

impl AmbientThresholds {
    pub const fn new(low: u16, high: u16) -> Self {
        Self { low, high }
    }

    /// Classify a raw clear-channel reading.  The thresholds themselves
    /// belong to the moderate band.
    pub fn classify(&self, reading: u16) -> AmbientBand {
        if reading < self.low {
            AmbientBand::Dark
        } else if reading > self.high {
            AmbientBand::Bright
        } else {
            AmbientBand::Moderate(self.duty_for(reading))
        }
    }

    /// Linear map `(high - reading) * 100 / (high - low)`, with the reading
    /// clamped into `[low, high]` first and the result rounded to the
    /// nearest whole duty unit.
    pub fn duty_for(&self, reading: u16) -> u8 {
        if self.high <= self.low {
            return if reading < self.low { 100 } else { 0 };
        }
        let r = u32::from(reading.clamp(self.low, self.high));
        let span = u32::from(self.high - self.low);
        let num = (u32::from(self.high) - r) * 100;
        ((num + span / 2) / span).min(100) as u8
    }
}
