//! Fault modes and fault flags.
//!
//! ```text
//!        set_fault_mode("N")
//!   ┌──────────────────────────────┐
//!   │                              ▼
//! Normal ◀──────────────▶ Simulate<X>  (12 modes total, code "1".."12")
//!   entry: clear all        entry: clear all, then set X's flag
//! ```
//!
//! Exactly one [`FaultMode`] is active at a time.  Transitions happen only
//! on an explicit external command; there are no automatic transitions and
//! no terminal state.  Everything a mode implies (its flag, the actuator
//! it implicates, its sensor overrides) is carried as data on the enum
//! rather than recovered from the label.
//!
//! [`FaultFlags`] is a bitmask over [`FaultFlag`].  It is mostly driven by
//! mode entry but is also set and cleared at runtime by readback detection
//! and by ambient-sensor I/O results.

use core::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::actuators::Actuator;

// ---------------------------------------------------------------------------
// Fault flags
// ---------------------------------------------------------------------------

/// A single failure condition, detected or simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FaultFlag {
    PirSensorFailure = 1 << 0,
    IrSensorFailure = 1 << 1,
    TcsSensorFailure = 1 << 2,
    I2cCommunicationFailure = 1 << 3,
    SensorCrossTalk = 1 << 4,
    PirLedFailure = 1 << 5,
    IrLedFailure = 1 << 6,
    TcsLedFailure = 1 << 7,
    Led1Failure = 1 << 8,
    Led2Failure = 1 << 9,
    Led3Failure = 1 << 10,
    GpioOutputFailure = 1 << 11,
    PowerIssues = 1 << 12,
    DelayedResponse = 1 << 13,
}

impl FaultFlag {
    pub const COUNT: usize = 14;

    /// Every flag, in status-report order.
    pub const ALL: [FaultFlag; Self::COUNT] = [
        Self::PirSensorFailure,
        Self::IrSensorFailure,
        Self::TcsSensorFailure,
        Self::I2cCommunicationFailure,
        Self::SensorCrossTalk,
        Self::PirLedFailure,
        Self::IrLedFailure,
        Self::TcsLedFailure,
        Self::Led1Failure,
        Self::Led2Failure,
        Self::Led3Failure,
        Self::GpioOutputFailure,
        Self::PowerIssues,
        Self::DelayedResponse,
    ];

    pub const fn mask(self) -> u16 {
        self as u16
    }

    /// Key used in status reports.
    pub const fn key(self) -> &'static str {
        match self {
            Self::PirSensorFailure => "PIR_Sensor_Failure",
            Self::IrSensorFailure => "IR_Sensor_Failure",
            Self::TcsSensorFailure => "TCS_Sensor_Failure",
            Self::I2cCommunicationFailure => "I2C_Communication_Failure",
            Self::SensorCrossTalk => "Sensor_CrossTalk",
            Self::PirLedFailure => "PIR_LED_Failure",
            Self::IrLedFailure => "IR_LED_Failure",
            Self::TcsLedFailure => "TCS_LED_Failure",
            Self::Led1Failure => "LED1_Failure",
            Self::Led2Failure => "LED2_Failure",
            Self::Led3Failure => "LED3_Failure",
            Self::GpioOutputFailure => "GPIO_Output_Failure",
            Self::PowerIssues => "Power_Issues",
            Self::DelayedResponse => "Delayed_Response",
        }
    }
}

impl fmt::Display for FaultFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Set of asserted fault flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultFlags(u16);

impl FaultFlags {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, flag: FaultFlag) -> bool {
        self.0 & flag.mask() != 0
    }

    pub fn insert(&mut self, flag: FaultFlag) {
        self.0 |= flag.mask();
    }

    pub fn remove(&mut self, flag: FaultFlag) {
        self.0 &= !flag.mask();
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Every flag paired with its current value, in report order.
    pub fn iter(self) -> impl Iterator<Item = (FaultFlag, bool)> {
        FaultFlag::ALL.into_iter().map(move |f| (f, self.contains(f)))
    }

    /// Asserted flags only.
    pub fn active(self) -> impl Iterator<Item = FaultFlag> {
        self.iter().filter_map(|(f, on)| on.then_some(f))
    }
}

impl Serialize for FaultFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FaultFlag::COUNT))?;
        for (flag, on) in self.iter() {
            map.serialize_entry(flag.key(), &on)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Fault modes
// ---------------------------------------------------------------------------

/// The single active operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FaultMode {
    #[default]
    Normal,
    PirSensorFailure,
    IrSensorFailure,
    TcsSensorFailure,
    I2cCommunicationFailure,
    GpioOutputFailure,
    PowerIssues,
    DelayedResponse,
    SensorCrossTalk,
    Led1Failure,
    Led2Failure,
    Led3Failure,
}

/// How the ambient-light read behaves under a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbientOverride {
    /// Read the real sensor.
    None,
    /// Return the configured fixed value without touching the sensor.
    Fixed,
    /// Fail the read with an I/O error.
    CommFailure,
}

impl FaultMode {
    pub const COUNT: usize = 12;

    pub const ALL: [FaultMode; Self::COUNT] = [
        Self::Normal,
        Self::PirSensorFailure,
        Self::IrSensorFailure,
        Self::TcsSensorFailure,
        Self::I2cCommunicationFailure,
        Self::GpioOutputFailure,
        Self::PowerIssues,
        Self::DelayedResponse,
        Self::SensorCrossTalk,
        Self::Led1Failure,
        Self::Led2Failure,
        Self::Led3Failure,
    ];

    /// Command code ("1".."12").
    pub const fn code(self) -> &'static str {
        match self {
            Self::Normal => "1",
            Self::PirSensorFailure => "2",
            Self::IrSensorFailure => "3",
            Self::TcsSensorFailure => "4",
            Self::I2cCommunicationFailure => "5",
            Self::GpioOutputFailure => "6",
            Self::PowerIssues => "7",
            Self::DelayedResponse => "8",
            Self::SensorCrossTalk => "9",
            Self::Led1Failure => "10",
            Self::Led2Failure => "11",
            Self::Led3Failure => "12",
        }
    }

    /// Parse a command code.  Surrounding whitespace is ignored.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Human-readable label reported by status and mode changes.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal Operation",
            Self::PirSensorFailure => "Simulate PIR Sensor Failure",
            Self::IrSensorFailure => "Simulate IR Sensor Failure",
            Self::TcsSensorFailure => "Simulate TCS Sensor Failure",
            Self::I2cCommunicationFailure => "Simulate I2C Communication Failure",
            Self::GpioOutputFailure => "Simulate GPIO Output Failure",
            Self::PowerIssues => "Simulate Power Issues",
            Self::DelayedResponse => "Simulate Delayed Response",
            Self::SensorCrossTalk => "Simulate Sensor Cross-Talk",
            Self::Led1Failure => "Simulate LED1 Failure",
            Self::Led2Failure => "Simulate LED2 Failure",
            Self::Led3Failure => "Simulate LED3 Failure",
        }
    }

    pub const fn is_normal(self) -> bool {
        matches!(self, Self::Normal)
    }

    /// The flag asserted on entry (none for `Normal`).
    pub const fn implied_flag(self) -> Option<FaultFlag> {
        match self {
            Self::Normal => None,
            Self::PirSensorFailure => Some(FaultFlag::PirSensorFailure),
            Self::IrSensorFailure => Some(FaultFlag::IrSensorFailure),
            Self::TcsSensorFailure => Some(FaultFlag::TcsSensorFailure),
            Self::I2cCommunicationFailure => Some(FaultFlag::I2cCommunicationFailure),
            Self::GpioOutputFailure => Some(FaultFlag::GpioOutputFailure),
            Self::PowerIssues => Some(FaultFlag::PowerIssues),
            Self::DelayedResponse => Some(FaultFlag::DelayedResponse),
            Self::SensorCrossTalk => Some(FaultFlag::SensorCrossTalk),
            Self::Led1Failure => Some(FaultFlag::Led1Failure),
            Self::Led2Failure => Some(FaultFlag::Led2Failure),
            Self::Led3Failure => Some(FaultFlag::Led3Failure),
        }
    }

    /// Flags in force immediately after entering this mode.
    pub fn entry_flags(self) -> FaultFlags {
        let mut flags = FaultFlags::empty();
        if let Some(flag) = self.implied_flag() {
            flags.insert(flag);
        }
        flags
    }

    /// The light forced dark by a single-actuator failure mode.
    pub const fn implicated_actuator(self) -> Option<Actuator> {
        match self {
            Self::Led1Failure => Some(Actuator::Led1),
            Self::Led2Failure => Some(Actuator::Led2),
            Self::Led3Failure => Some(Actuator::Led3),
            _ => None,
        }
    }

    /// Whether light outputs may be written at all.
    pub const fn outputs_enabled(self) -> bool {
        !matches!(self, Self::GpioOutputFailure)
    }

    /// Forced motion reading, if the mode overrides the PIR sensor.
    pub const fn motion_override(self) -> Option<bool> {
        match self {
            Self::SensorCrossTalk => Some(true),
            Self::PirSensorFailure => Some(false),
            _ => None,
        }
    }

    /// Forced proximity reading, if the mode overrides the IR sensor.
    pub const fn proximity_override(self) -> Option<bool> {
        match self {
            Self::SensorCrossTalk | Self::IrSensorFailure => Some(true),
            _ => None,
        }
    }

    pub const fn ambient_override(self) -> AmbientOverride {
        match self {
            Self::TcsSensorFailure => AmbientOverride::Fixed,
            Self::I2cCommunicationFailure => AmbientOverride::CommFailure,
            _ => AmbientOverride::None,
        }
    }

    /// Whether manual control of `actuator` is refused in this mode.
    pub fn locks_out(self, actuator: Actuator) -> bool {
        if self.implicated_actuator() == Some(actuator) {
            return true;
        }
        match self {
            Self::PirSensorFailure => actuator == Actuator::Pir,
            Self::IrSensorFailure => actuator == Actuator::Ir,
            Self::TcsSensorFailure => actuator == Actuator::Tcs,
            Self::GpioOutputFailure
            | Self::PowerIssues
            | Self::DelayedResponse
            | Self::SensorCrossTalk => {
                matches!(actuator, Actuator::Led1 | Actuator::Led2 | Actuator::Led3)
            }
            _ => false,
        }
    }
}

impl fmt::Display for FaultMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
