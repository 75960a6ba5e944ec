//! System configuration parameters
//!
//! All tunable parameters for the Nightwatch lighting controller.
//! Configuration is held in memory only; [`SystemConfig::default`] carries
//! the values the controller ships with.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Ramp engine ---
    /// Duty-cycle units moved per ramp step
    pub ramp_step: u8,
    /// Delay between ramp steps (milliseconds)
    pub ramp_step_delay_ms: u32,

    // --- Ambient light ---
    /// Readings below this are "dark"
    pub ambient_low_threshold: u16,
    /// Readings above this are "bright"
    pub ambient_high_threshold: u16,
    /// Reading substituted while the ambient sensor is simulated as failed
    pub simulated_ambient_value: u16,

    // --- TCS34725 ---
    /// ATIME register value (0xFF = 2.4 ms)
    pub sensor_integration_time: u8,
    /// CONTROL register gain code (0x03 = 60x)
    pub sensor_gain: u8,

    // --- Timing ---
    /// Monitoring loop period (milliseconds)
    pub cycle_period_ms: u32,
    /// How long a delayed-response stall lasts (milliseconds)
    pub delayed_response_hold_ms: u32,
    /// Poll interval while stalled (milliseconds)
    pub delayed_response_poll_ms: u32,
    /// Task watchdog timeout (seconds)
    pub watchdog_timeout_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Ramp
            ramp_step: 5,
            ramp_step_delay_ms: 50,

            // Ambient
            ambient_low_threshold: 1_000,
            ambient_high_threshold: 10_000,
            simulated_ambient_value: 5_000,

            // TCS34725
            sensor_integration_time: 0xFF,
            sensor_gain: 0x03,

            // Timing
            cycle_period_ms: 1_000,          // 1 Hz
            delayed_response_hold_ms: 5_000, // 5 s stall
            delayed_response_poll_ms: 500,
            watchdog_timeout_secs: 10,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ramp_step == 0 || self.ramp_step > 100 {
            return Err(ConfigError::ValidationFailed("ramp_step must be 1..=100"));
        }
        if self.ambient_low_threshold >= self.ambient_high_threshold {
            return Err(ConfigError::ValidationFailed(
                "ambient_low_threshold must be below ambient_high_threshold",
            ));
        }
        if self.sensor_gain > 0x03 {
            return Err(ConfigError::ValidationFailed("sensor_gain must be 0..=3"));
        }
        if self.cycle_period_ms == 0 || self.delayed_response_poll_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop intervals must be non-zero"));
        }
        if self.delayed_response_poll_ms > self.delayed_response_hold_ms {
            return Err(ConfigError::ValidationFailed(
                "delayed_response_poll_ms must not exceed the hold",
            ));
        }
        if self.watchdog_timeout_secs * 1000 <= self.cycle_period_ms {
            return Err(ConfigError::ValidationFailed(
                "watchdog timeout must exceed the cycle period",
            ));
        }
        Ok(())
    }
}

/// Errors from configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
