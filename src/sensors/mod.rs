//! Sensor sampling with fault-mode overrides.
//!
//! The monitoring loop never reads a sensor port directly.  It goes
//! through [`read_presence`] and [`read_ambient`], which substitute the
//! readings a simulated failure calls for before any hardware is touched.

pub mod tcs34725;

use log::warn;

use crate::app::ports::SensorPort;
use crate::error::HwError;
use crate::fault::{AmbientOverride, FaultMode};
use crate::pins;

/// Presence inputs for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presence {
    pub motion: bool,
    pub proximity: bool,
}

/// Where an ambient reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbientReading {
    /// Read from the sensor.
    Measured(u16),
    /// Substituted by the active fault mode.
    Simulated(u16),
}

impl AmbientReading {
    pub fn value(self) -> u16 {
        match self {
            Self::Measured(v) | Self::Simulated(v) => v,
        }
    }
}

/// Sample motion and proximity, applying `mode`'s overrides.
///
/// A failed pin read is logged and treated as "not detected"; one bad
/// sample must not stop the loop.
pub fn read_presence<S: SensorPort + ?Sized>(hw: &S, mode: FaultMode) -> Presence {
    let motion = mode
        .motion_override()
        .unwrap_or_else(|| sample(hw, pins::PIR_SENSOR_GPIO, "PIR"));
    let proximity = mode
        .proximity_override()
        .unwrap_or_else(|| sample(hw, pins::IR_SENSOR_GPIO, "IR"));
    Presence { motion, proximity }
}

fn sample<S: SensorPort + ?Sized>(hw: &S, pin: i32, label: &str) -> bool {
    hw.digital_read(pin).unwrap_or_else(|e| {
        warn!("{label} sensor read failed: {e}");
        false
    })
}

/// Read ambient light, applying `mode`'s override.
///
/// Under a simulated sensor failure the configured `simulated` value is
/// returned without touching the bus.  Under a simulated bus failure the
/// read fails with [`HwError::I2cFailed`], again without touching the bus.
pub fn read_ambient<S: SensorPort + ?Sized>(
    hw: &S,
    mode: FaultMode,
    simulated: u16,
) -> Result<AmbientReading, HwError> {
    match mode.ambient_override() {
        AmbientOverride::Fixed => Ok(AmbientReading::Simulated(simulated)),
        AmbientOverride::CommFailure => Err(HwError::I2cFailed),
        AmbientOverride::None => hw.read_ambient_light().map(AmbientReading::Measured),
    }
}
