//! Outbound application events.
//!
//! The service, the monitoring loop and the ramp engine emit these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::actuators::Actuator;
use crate::error::HwError;
use crate::fault::FaultMode;

/// Why a ramp request did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The actuator's fault flag is set.
    Faulted,
    /// Another ramp task owns the actuator.
    Busy,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial mode).
    Started(FaultMode),

    /// The active fault mode changed on command.
    ModeChanged { from: FaultMode, to: FaultMode },

    /// Readback disagrees with the commanded state.
    ReadbackFault {
        actuator: Actuator,
        commanded: bool,
        detected: bool,
    },

    /// Readback agrees with the commanded state again.
    ReadbackResolved(Actuator),

    /// A ramp request was dropped without running.
    RampSuppressed {
        actuator: Actuator,
        reason: SuppressReason,
    },

    /// A running ramp forced its actuator to 0 after a fault flag appeared.
    RampAborted(Actuator),

    /// The ambient-light sensor could not be read.
    AmbientReadFailed,

    /// The loop began stalling under the delayed-response simulation.
    DelayedHoldStarted,

    /// The delayed-response stall elapsed.
    DelayedHoldReleased,

    /// An external command took direct control of an actuator.
    ManualOverride { actuator: Actuator, on: bool },

    /// A hardware write failed.
    WriteFailed(HwError),
}
