//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (ESP-IDF logger → UART / USB-CDC on the device).

use log::{error, info, warn};

use crate::app::events::{AppEvent, SuppressReason};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | mode={}", mode);
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE  | {} -> {}", from, to);
            }
            AppEvent::ReadbackFault {
                actuator,
                commanded,
                detected,
            } => {
                error!(
                    "FAULT | {} not responding as expected (commanded={} detected={})",
                    actuator, commanded, detected
                );
            }
            AppEvent::ReadbackResolved(actuator) => {
                info!("FAULT | {} responding correctly, override cleared", actuator);
            }
            AppEvent::RampSuppressed { actuator, reason } => match reason {
                SuppressReason::Faulted => warn!("RAMP  | {} suppressed: fault flag set", actuator),
                SuppressReason::Busy => info!("RAMP  | {} suppressed: already ramping", actuator),
            },
            AppEvent::RampAborted(actuator) => {
                warn!("RAMP  | {} aborted mid-ramp, forced off", actuator);
            }
            AppEvent::AmbientReadFailed => {
                error!("SENSE | ambient light read failed, assuming bright");
            }
            AppEvent::DelayedHoldStarted => {
                warn!("DELAY | control path stalled");
            }
            AppEvent::DelayedHoldReleased => {
                info!("DELAY | stall elapsed, resuming");
            }
            AppEvent::ManualOverride { actuator, on } => {
                info!("MANUAL| {} -> {}", actuator, if *on { "ON" } else { "OFF" });
            }
            AppEvent::WriteFailed(e) => {
                error!("OUTPUT| {}", e);
            }
        }
    }
}
