//! Sensor monitoring loop.
//!
//! One long-lived task samples the sensors once per cycle and decides
//! what every loop-driven light should be doing:
//!
//! ```text
//!  ┌─ fault LED ─ delayed-response gate ─ presence ─ simulated LED faults ─┐
//!  │                                                                       │
//!  │  power issues?  ── yes ─▶ flicker TCS / LED1 / LED3 directly          │
//!  │        │                                                              │
//!  │        no ─▶ ambient band ─▶ ramp TCS / LED1 / LED3, switch LED2      │
//!  │                                                                       │
//!  └─ LED2 readback ─ sleep ───────────────────────────────────────────────┘
//! ```
//!
//! Dimmable lights change only through the [`RampEngine`]; the loop never
//! writes their duty itself except while simulating a flickering supply,
//! and even then only for a light whose ramp slot it can claim.  LED2 is
//! binary and always written directly.
//!
//! Nothing in a cycle can end the loop.  Sensor and bus errors are logged,
//! mapped to a safe fallback, and the next cycle runs as usual.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::actuators::Actuator;
use crate::config::SystemConfig;
use crate::control::ambient::{AmbientBand, AmbientThresholds};
use crate::control::ramp::RampEngine;
use crate::drivers::watchdog::Watchdog;
use crate::fault::{AmbientOverride, FaultFlag, FaultMode};
use crate::pins;
use crate::safety::{ReadbackDetector, ReadbackEdge};
use crate::sensors::{self, AmbientReading, Presence};

use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink, FlickerSource, SensorPort, TimePort};
use super::state::SharedState;

/// Targets for the loop-driven lights in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LightPlan {
    auxiliary: u8,
    tcs: u8,
    led2: bool,
}

impl LightPlan {
    /// Lights come on when someone moves, or when nothing is close by.
    fn for_band(band: AmbientBand, presence: Presence) -> Self {
        let wanted = presence.motion || !presence.proximity;
        match band {
            AmbientBand::Dark => Self {
                auxiliary: if wanted { 100 } else { 0 },
                tcs: 100,
                led2: wanted,
            },
            AmbientBand::Moderate(duty) => Self {
                auxiliary: if wanted { duty } else { 0 },
                tcs: duty,
                led2: wanted,
            },
            AmbientBand::Bright => Self {
                auxiliary: 0,
                tcs: 0,
                led2: false,
            },
        }
    }
}

/// The monitoring loop and the state it owns between cycles.
pub struct MonitorLoop<H> {
    state: Arc<SharedState>,
    hw: Arc<H>,
    ramps: RampEngine<H>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn TimePort>,
    flicker: Box<dyn FlickerSource>,
    thresholds: AmbientThresholds,
    simulated_ambient: u16,
    cycle_period: Duration,
    hold_ms: u64,
    poll: Duration,
    watchdog_timeout_secs: u32,
    /// Uptime at which the current delayed-response stall began.
    delayed_since_ms: Option<u64>,
    readback: ReadbackDetector,
}

impl<H: SensorPort + ActuatorPort + 'static> MonitorLoop<H> {
    pub fn new(
        state: Arc<SharedState>,
        hw: Arc<H>,
        ramps: RampEngine<H>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn TimePort>,
        flicker: Box<dyn FlickerSource>,
        config: &SystemConfig,
    ) -> Self {
        Self {
            state,
            hw,
            ramps,
            sink,
            clock,
            flicker,
            thresholds: AmbientThresholds::new(
                config.ambient_low_threshold,
                config.ambient_high_threshold,
            ),
            simulated_ambient: config.simulated_ambient_value,
            cycle_period: Duration::from_millis(u64::from(config.cycle_period_ms)),
            hold_ms: u64::from(config.delayed_response_hold_ms),
            poll: Duration::from_millis(u64::from(config.delayed_response_poll_ms)),
            watchdog_timeout_secs: config.watchdog_timeout_secs,
            delayed_since_ms: None,
            readback: ReadbackDetector::new(Actuator::READBACK),
        }
    }

    /// Run forever.  Subscribes the calling task to the watchdog.
    pub fn run(mut self) -> ! {
        let watchdog = Watchdog::new(self.watchdog_timeout_secs);
        info!("Monitoring loop running ({:?} period)", self.cycle_period);
        loop {
            let pause = self.run_cycle();
            watchdog.feed();
            std::thread::sleep(pause);
        }
    }

    /// Execute one cycle and return how long to sleep before the next.
    pub fn run_cycle(&mut self) -> Duration {
        let mode = self.state.mode();

        self.write_output(pins::FAULT_LED_GPIO, !mode.is_normal());

        if self.delayed_response_gate(mode) {
            return self.poll;
        }

        let presence = sensors::read_presence(&*self.hw, mode);
        self.state
            .record_activity(self.clock.uptime_ms(), presence.motion, presence.proximity);

        if let Some(actuator) = mode.implicated_actuator() {
            self.hold_dark(actuator);
        }

        let outputs_enabled = mode.outputs_enabled();
        if !outputs_enabled {
            debug!("Outputs disabled in {}", mode);
        }

        if mode == FaultMode::PowerIssues {
            if outputs_enabled {
                self.apply_flicker();
            }
        } else {
            let band = self.ambient_band(mode);
            let plan = LightPlan::for_band(band, presence);
            if outputs_enabled {
                self.apply(plan);
            }
        }

        self.check_readback(mode);

        self.cycle_period
    }

    /// Whether a delayed-response stall is in progress.  Leaving the mode
    /// discards any recorded stall.
    fn delayed_response_gate(&mut self, mode: FaultMode) -> bool {
        if mode != FaultMode::DelayedResponse {
            self.delayed_since_ms = None;
            return false;
        }
        let now = self.clock.uptime_ms();
        match self.delayed_since_ms {
            None => {
                self.delayed_since_ms = Some(now);
                warn!("Delayed response active, holding for {} ms", self.hold_ms);
                self.sink.emit(&AppEvent::DelayedHoldStarted);
                true
            }
            Some(since) if now.saturating_sub(since) < self.hold_ms => true,
            Some(_) => {
                self.delayed_since_ms = None;
                self.sink.emit(&AppEvent::DelayedHoldReleased);
                false
            }
        }
    }

    /// Keep a light implicated by the active mode off.
    fn hold_dark(&mut self, actuator: Actuator) {
        if actuator.is_dimmable() {
            match self.ramps.force_off(actuator) {
                Ok(true) => {}
                Ok(false) => debug!("{actuator} busy, in-flight ramp will force it off"),
                Err(e) => self.sink.emit(&AppEvent::WriteFailed(e)),
            }
        } else {
            self.write_binary(actuator, false);
        }
    }

    /// Apply one pseudo-random duty to every flickering light at once.
    fn apply_flicker(&mut self) {
        let duty = self.flicker.next_duty();
        for actuator in [Actuator::Tcs, Actuator::Led1, Actuator::Led3] {
            if self.state.is_faulted(actuator) {
                continue;
            }
            let Some(_slot) = self.state.try_claim(actuator) else {
                continue;
            };
            match self.hw.set_pwm_duty(actuator.pin(), duty) {
                Ok(()) => self.state.set_duty(actuator, duty),
                Err(e) => self.sink.emit(&AppEvent::WriteFailed(e)),
            }
        }
        warn!("Simulating power issues, lights flickering at {}%", duty);
    }

    /// Read and classify ambient light.  Any failure reads as bright so
    /// the lights go off.
    fn ambient_band(&mut self, mode: FaultMode) -> AmbientBand {
        match sensors::read_ambient(&*self.hw, mode, self.simulated_ambient) {
            Ok(AmbientReading::Measured(value)) => {
                self.state.clear_flag(FaultFlag::TcsSensorFailure);
                self.state.clear_flag(FaultFlag::I2cCommunicationFailure);
                debug!("Ambient clear={}", value);
                self.thresholds.classify(value)
            }
            Ok(AmbientReading::Simulated(value)) => {
                warn!("Ambient sensor failure simulated, using {}", value);
                self.thresholds.classify(value)
            }
            Err(e) => {
                error!("Ambient light read failed: {e}");
                if mode.ambient_override() != AmbientOverride::CommFailure {
                    self.state.set_flag(FaultFlag::TcsSensorFailure);
                    self.state.set_flag(FaultFlag::I2cCommunicationFailure);
                }
                self.sink.emit(&AppEvent::AmbientReadFailed);
                AmbientBand::Bright
            }
        }
    }

    fn apply(&mut self, plan: LightPlan) {
        for actuator in Actuator::AUXILIARY {
            self.steer(actuator, plan.auxiliary);
        }
        self.steer(Actuator::Tcs, plan.tcs);
        self.switch_binary(Actuator::READBACK, plan.led2);
    }

    /// Start a ramp toward `target` unless the light is faulted, already
    /// moving, or already there.
    fn steer(&self, actuator: Actuator, target: u8) {
        if self.state.is_faulted(actuator)
            || self.state.is_ramping(actuator)
            || self.state.duty(actuator) == target
        {
            return;
        }
        if let Err(e) = self.ramps.ramp(actuator, target) {
            debug!("Ramp {actuator} -> {target}% not started: {e}");
        }
    }

    /// Drive the binary light unless it is under manual control or faulted.
    fn switch_binary(&self, actuator: Actuator, on: bool) {
        if self.state.manual_override(actuator) || self.state.is_faulted(actuator) {
            return;
        }
        self.write_binary(actuator, on);
    }

    fn write_binary(&self, actuator: Actuator, on: bool) {
        match self.hw.digital_write(actuator.pin(), on) {
            Ok(()) => self.state.update_actuator(actuator, |s| {
                s.commanded_on = on;
                s.current = if on { 100 } else { 0 };
                s.target = s.current;
            }),
            Err(e) => self.sink.emit(&AppEvent::WriteFailed(e)),
        }
    }

    /// Compare LED2's commanded state with its detection pin.
    fn check_readback(&mut self, mode: FaultMode) {
        let actuator = self.readback.actuator();
        if mode.implicated_actuator() == Some(actuator) || self.state.manual_override(actuator) {
            return;
        }
        let detected = match self.hw.digital_read(pins::LED2_DETECT_GPIO) {
            Ok(level) => level,
            Err(e) => {
                warn!("{actuator} detect pin unreadable, skipping readback: {e}");
                return;
            }
        };
        let commanded = self.state.actuator(actuator).commanded_on;
        let flag = actuator.failure_flag();

        match self
            .readback
            .evaluate(commanded, detected, self.state.has_flag(flag))
        {
            ReadbackEdge::Steady => {}
            ReadbackEdge::Detected {
                commanded,
                detected,
            } => {
                self.state.set_flag(flag);
                self.sink.emit(&AppEvent::ReadbackFault {
                    actuator,
                    commanded,
                    detected,
                });
            }
            ReadbackEdge::Resolved => {
                self.state.clear_flag(flag);
                self.state.set_manual_override(actuator, false);
                self.sink.emit(&AppEvent::ReadbackResolved(actuator));
            }
        }
    }

    fn write_output(&self, pin: i32, high: bool) {
        if let Err(e) = self.hw.digital_write(pin, high) {
            self.sink.emit(&AppEvent::WriteFailed(e));
        }
    }
}
