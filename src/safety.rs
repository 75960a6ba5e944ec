//! Readback fault detection.
//!
//! LED2 has an independent detection pin that senses whether the light is
//! actually conducting.  Once per monitoring cycle the loop compares the
//! commanded state with that pin and feeds the result through a
//! [`ReadbackDetector`].
//!
//! ## Fault lifecycle
//!
//! 1. Commanded and detected levels disagree (either direction).
//! 2. The detector latches and reports [`ReadbackEdge::Detected`] once.
//!    The loop asserts the light's fault flag.
//! 3. While the mismatch persists nothing further is reported.
//! 4. When the levels agree again the detector unlatches and reports
//!    [`ReadbackEdge::Resolved`] once.  The loop clears the fault flag
//!    and the manual override.
//!
//! If the flag is cleared behind the detector's back (a mode change or a
//! manual command), the latch is dropped silently so a persisting
//! mismatch is reported again on the next cycle.

use log::{error, info};

use crate::actuators::Actuator;

/// Transition reported by [`ReadbackDetector::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadbackEdge {
    /// No change since the last evaluation.
    Steady,
    /// A mismatch has just appeared.
    Detected { commanded: bool, detected: bool },
    /// A previously reported mismatch has cleared.
    Resolved,
}

/// Edge-triggered commanded/detected comparator for one light.
#[derive(Debug)]
pub struct ReadbackDetector {
    actuator: Actuator,
    latched: bool,
}

impl ReadbackDetector {
    pub fn new(actuator: Actuator) -> Self {
        Self {
            actuator,
            latched: false,
        }
    }

    pub fn actuator(&self) -> Actuator {
        self.actuator
    }

    /// Whether a mismatch is currently latched.
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Compare one sample.  `flag_asserted` is the light's fault flag as
    /// currently stored in shared state.
    pub fn evaluate(&mut self, commanded: bool, detected: bool, flag_asserted: bool) -> ReadbackEdge {
        if self.latched && !flag_asserted {
            self.latched = false;
        }

        if commanded != detected {
            if self.latched {
                return ReadbackEdge::Steady;
            }
            self.latched = true;
            error!(
                "READBACK FAULT: {} commanded {} but detected {}",
                self.actuator,
                on_off(commanded),
                on_off(detected)
            );
            ReadbackEdge::Detected { commanded, detected }
        } else if self.latched {
            self.latched = false;
            info!("READBACK FAULT RESOLVED: {} responding correctly", self.actuator);
            ReadbackEdge::Resolved
        } else {
            ReadbackEdge::Steady
        }
    }
}

fn on_off(level: bool) -> &'static str {
    if level { "ON" } else { "OFF" }
}
