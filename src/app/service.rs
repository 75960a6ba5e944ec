//! Application service: the hexagonal core.
//!
//! [`LightingService`] owns the shared control state and the ramp engine
//! and answers external commands.  All I/O flows through port traits, so
//! the service runs unchanged against the ESP32 adapter or a mock.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │     LightingService      │
//! ActuatorPort ◀──│  state · ramps · modes   │
//!                 └────────────┬─────────────┘
//!                              │ monitor()
//!                              ▼
//!                         MonitorLoop (own task)
//! ```
//!
//! Commands validate first and mutate second: a rejected command leaves
//! every part of the shared state untouched.  A fault-mode change only
//! rewrites mode and flags; the loop picks it up on its next cycle.

use std::sync::Arc;

use log::{info, warn};

use crate::actuators::Actuator;
use crate::config::SystemConfig;
use crate::control::ramp::RampEngine;
use crate::error::CommandError;
use crate::fault::{AmbientOverride, FaultFlag, FaultMode};
use crate::pins;

use super::commands::{AppCommand, AppResponse};
use super::events::AppEvent;
use super::monitor::MonitorLoop;
use super::ports::{ActuatorPort, EventSink, FlickerSource, SensorPort, TimePort};
use super::state::{SharedState, StatusSnapshot};

// ───────────────────────────────────────────────────────────────
// LightingService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct LightingService<H> {
    state: Arc<SharedState>,
    hw: Arc<H>,
    ramps: RampEngine<H>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn TimePort>,
    config: SystemConfig,
}

impl<H: SensorPort + ActuatorPort + 'static> LightingService<H> {
    /// Construct the service.  Does **not** touch hardware; call
    /// [`start`](Self::start) next.
    pub fn new(
        hw: Arc<H>,
        config: SystemConfig,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn TimePort>,
    ) -> Self {
        let state = SharedState::new();
        let ramps = RampEngine::new(Arc::clone(&state), Arc::clone(&hw), Arc::clone(&sink), &config);
        Self {
            state,
            hw,
            ramps,
            sink,
            clock,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring up the ambient sensor.  A failure is recorded as a fault and
    /// the service keeps running; the loop treats the light as bright.
    pub fn start(&self) {
        let mode = self.state.mode();
        if mode.ambient_override() == AmbientOverride::Fixed {
            warn!("Ambient sensor failure simulated, skipping bring-up");
        } else if let Err(e) = self.hw.init_ambient_sensor() {
            warn!("Ambient sensor bring-up failed: {e}");
            self.state.set_flag(FaultFlag::TcsSensorFailure);
            self.state.set_flag(FaultFlag::I2cCommunicationFailure);
        }
        self.sink.emit(&AppEvent::Started(mode));
        info!("LightingService started in {}", mode);
    }

    /// Build the monitoring loop.  The caller decides which task runs it.
    pub fn monitor(&self, flicker: Box<dyn FlickerSource>) -> MonitorLoop<H> {
        MonitorLoop::new(
            Arc::clone(&self.state),
            Arc::clone(&self.hw),
            self.ramps.clone(),
            Arc::clone(&self.sink),
            Arc::clone(&self.clock),
            flicker,
            &self.config,
        )
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(&self, cmd: AppCommand) -> Result<AppResponse, CommandError> {
        match cmd {
            AppCommand::GetStatus => Ok(AppResponse::Status(self.status())),
            AppCommand::SetFaultMode(code) => {
                let mode = self.set_fault_mode(&code)?;
                Ok(AppResponse::message(mode.label()))
            }
            AppCommand::SetActuator { name, on } => {
                self.set_actuator(&name, on).map(AppResponse::message)
            }
        }
    }

    /// Current status.  Samples LED2's detection pin; an unreadable pin
    /// asserts LED2's fault flag and reports the light as off.
    pub fn status(&self) -> StatusSnapshot {
        let led2_state = match self.hw.digital_read(pins::LED2_DETECT_GPIO) {
            Ok(level) => level,
            Err(e) => {
                warn!("LED2 detect pin unreadable: {e}");
                self.state.set_flag(Actuator::Led2.failure_flag());
                false
            }
        };
        self.state.snapshot(led2_state)
    }

    /// Enter the fault mode with `code`.  Clears every flag, then sets the
    /// one the mode implies.
    pub fn set_fault_mode(&self, code: &str) -> Result<FaultMode, CommandError> {
        let Some(mode) = FaultMode::from_code(code) else {
            warn!("Invalid fault mode attempted: {code:?}");
            return Err(CommandError::InvalidFaultMode(code.to_owned()));
        };
        let from = self.state.enter_fault_mode(mode);
        if mode.is_normal() {
            info!("Switched to {}, all faults cleared", mode);
        } else {
            info!("Simulated fault mode: {}", mode);
        }
        self.sink.emit(&AppEvent::ModeChanged { from, to: mode });
        Ok(mode)
    }

    /// Switch a light on or off by name.  Returns the reply message.
    ///
    /// LED2 is written immediately and placed under manual override,
    /// which also clears its fault flag.  Dimmable lights are ramped to
    /// 100 or 0; a ramp that cannot start is logged, not reported.
    pub fn set_actuator(&self, name: &str, on: bool) -> Result<String, CommandError> {
        let Some(actuator) = Actuator::from_name(name) else {
            warn!("Invalid LED name attempted: {name:?}");
            return Err(CommandError::UnknownActuator(name.to_owned()));
        };

        let mode = self.state.mode();
        if mode.locks_out(actuator) {
            warn!("Attempted to control {actuator} while in {mode}");
            return Err(CommandError::ForbiddenInMode { actuator, mode });
        }

        let word = if on { "on" } else { "off" };
        if actuator.is_dimmable() {
            if let Err(e) = self.ramps.ramp(actuator, if on { 100 } else { 0 }) {
                warn!("{e}");
            }
            info!("{actuator} LED set to {word}");
            Ok(format!("{actuator} LED turned {word}"))
        } else {
            self.hw.digital_write(actuator.pin(), on)?;
            self.state.update_actuator(actuator, |s| {
                s.commanded_on = on;
                s.current = if on { 100 } else { 0 };
                s.target = s.current;
            });
            self.state.set_manual_override(actuator, true);
            if self.state.clear_flag(actuator.failure_flag()) {
                info!("Manual control restored for {actuator}, fault flag cleared");
            }
            self.sink.emit(&AppEvent::ManualOverride { actuator, on });
            Ok(format!("{actuator} LED turned {word} via manual control"))
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn ramps(&self) -> &RampEngine<H> {
        &self.ramps
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}
