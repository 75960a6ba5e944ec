//! Unified error types for the Nightwatch firmware.
//!
//! Every fallible hardware or command path funnels into one of the enums
//! below.  Hardware errors are `Copy` so the monitoring loop can log them,
//! substitute a fallback, and carry on without allocation.

use core::fmt;

use crate::actuators::Actuator;
use crate::fault::FaultMode;

// ---------------------------------------------------------------------------
// Hardware access errors
// ---------------------------------------------------------------------------

/// Failure reported by a hardware port call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwError {
    /// Digital input could not be sampled.
    GpioReadFailed(i32),
    /// Digital output could not be driven.
    GpioWriteFailed(i32),
    /// PWM duty-cycle register write failed.
    PwmWriteFailed(i32),
    /// I²C transaction with the colour sensor failed.
    I2cFailed,
    /// The pin has no PWM channel attached.
    NoPwmChannel(i32),
}

impl fmt::Display for HwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioReadFailed(pin) => write!(f, "GPIO{pin} read failed"),
            Self::GpioWriteFailed(pin) => write!(f, "GPIO{pin} write failed"),
            Self::PwmWriteFailed(pin) => write!(f, "PWM write on GPIO{pin} failed"),
            Self::I2cFailed => write!(f, "I2C communication error"),
            Self::NoPwmChannel(pin) => write!(f, "GPIO{pin} has no PWM channel"),
        }
    }
}

impl std::error::Error for HwError {}

// ---------------------------------------------------------------------------
// Ramp engine errors
// ---------------------------------------------------------------------------

/// Why a ramp request was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampError {
    /// The actuator's fault flag is set; the request is suppressed.
    Faulted(Actuator),
    /// Another ramp task already owns the actuator.
    Busy(Actuator),
    /// Binary outputs cannot be ramped.
    NotDimmable(Actuator),
    /// The ramp task could not be spawned.
    SpawnFailed(Actuator),
}

impl fmt::Display for RampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Faulted(a) => write!(f, "cannot ramp {a} due to a detected fault"),
            Self::Busy(a) => write!(f, "{a} is already ramping"),
            Self::NotDimmable(a) => write!(f, "{a} is not dimmable"),
            Self::SpawnFailed(a) => write!(f, "ramp task for {a} could not be spawned"),
        }
    }
}

impl std::error::Error for RampError {}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Synchronous rejection of an external command.  No state is mutated
/// when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The requested fault-mode code is not one of the known modes.
    InvalidFaultMode(String),
    /// The actuator name does not match any known actuator.
    UnknownActuator(String),
    /// The active fault mode locks this actuator out of manual control.
    ForbiddenInMode { actuator: Actuator, mode: FaultMode },
    /// The hardware write backing the command failed.
    Hardware(HwError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFaultMode(_) => write!(f, "Invalid fault mode."),
            Self::UnknownActuator(_) => write!(f, "Invalid LED name"),
            Self::ForbiddenInMode { actuator, .. } => {
                write!(f, "Cannot control {actuator} in current fault mode.")
            }
            Self::Hardware(e) => write!(f, "Failed to set LED: {e}"),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<HwError> for CommandError {
    fn from(e: HwError) -> Self {
        Self::Hardware(e)
    }
}
