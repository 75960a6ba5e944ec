//! The fixed set of indicator lights.
//!
//! Five dimmable PWM lights and one binary light (LED2) whose output has
//! an independent detection pin for readback fault detection.

use core::fmt;

use crate::fault::FaultFlag;
use crate::pins;

/// Identity of a controllable light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Actuator {
    /// Indicator paired with the PIR motion sensor.
    Pir = 0,
    /// Indicator paired with the IR proximity sensor.
    Ir = 1,
    /// Ambient-responsive light paired with the colour sensor.
    Tcs = 2,
    Led1 = 3,
    /// Binary light with hardware readback.
    Led2 = 4,
    Led3 = 5,
}

impl Actuator {
    pub const COUNT: usize = 6;

    pub const ALL: [Actuator; Self::COUNT] = [
        Self::Pir,
        Self::Ir,
        Self::Tcs,
        Self::Led1,
        Self::Led2,
        Self::Led3,
    ];

    /// Dimmable lights the monitoring loop drives from presence + ambient
    /// light.  The ambient-responsive TCS light is handled separately.
    pub const AUXILIARY: [Actuator; 2] = [Self::Led1, Self::Led3];

    /// The binary light with a detection pin.
    pub const READBACK: Actuator = Self::Led2;

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Upper-case name used by the command boundary and in status.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pir => "PIR",
            Self::Ir => "IR",
            Self::Tcs => "TCS",
            Self::Led1 => "LED1",
            Self::Led2 => "LED2",
            Self::Led3 => "LED3",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
    }

    /// Output pin (PWM for dimmable lights, plain GPIO for LED2).
    pub const fn pin(self) -> i32 {
        match self {
            Self::Pir => pins::PIR_LED_GPIO,
            Self::Ir => pins::IR_LED_GPIO,
            Self::Tcs => pins::TCS_LED_GPIO,
            Self::Led1 => pins::LED1_GPIO,
            Self::Led2 => pins::LED2_GPIO,
            Self::Led3 => pins::LED3_GPIO,
        }
    }

    pub const fn is_dimmable(self) -> bool {
        !matches!(self, Self::Led2)
    }

    /// Fault flag that suppresses control of this light when set.
    pub const fn failure_flag(self) -> FaultFlag {
        match self {
            Self::Pir => FaultFlag::PirLedFailure,
            Self::Ir => FaultFlag::IrLedFailure,
            Self::Tcs => FaultFlag::TcsLedFailure,
            Self::Led1 => FaultFlag::Led1Failure,
            Self::Led2 => FaultFlag::Led2Failure,
            Self::Led3 => FaultFlag::Led3Failure,
        }
    }
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
