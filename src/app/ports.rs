//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LightingService / MonitorLoop / RampEngine
//! ```
//!
//! Driven adapters (sensors, lights, clocks, randomness, event sinks)
//! implement these traits.  The domain core is generic over them and never
//! touches hardware directly.
//!
//! Hardware ports take `&self` and are `Send + Sync`: the monitoring loop,
//! command handlers, and every ramp task share one adapter behind an `Arc`
//! and call into it from different threads.  Implementations serialise
//! whatever bus access needs serialising internally.

use crate::error::HwError;

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to sample inputs.
pub trait SensorPort: Send + Sync {
    /// Sample a digital input pin.
    fn digital_read(&self, pin: i32) -> Result<bool, HwError>;

    /// Power up and configure the ambient-light sensor.
    fn init_ambient_sensor(&self) -> Result<(), HwError>;

    /// Read the raw clear-channel ambient light level.
    fn read_ambient_light(&self) -> Result<u16, HwError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive outputs.
pub trait ActuatorPort: Send + Sync {
    /// Drive a digital output pin.
    fn digital_write(&self, pin: i32, high: bool) -> Result<(), HwError>;

    /// Set a PWM output's duty cycle (0–100 %).
    fn set_pwm_duty(&self, pin: i32, duty: u8) -> Result<(), HwError>;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic clock.
pub trait TimePort: Send + Sync {
    /// Milliseconds since boot.
    fn uptime_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Flicker source
// ───────────────────────────────────────────────────────────────

/// Supplies the duty values applied while power issues are simulated.
/// Tests inject a scripted sequence; the firmware uses a PRNG.
pub trait FlickerSource: Send {
    /// Next duty cycle, one of 0, 50 or 100.
    fn next_duty(&mut self) -> u8;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &AppEvent);
}
