//! Brightness ramp engine.
//!
//! A ramp moves one dimmable light from its current duty toward a target in
//! fixed steps, writing each intermediate value to PWM and sleeping between
//! steps.  Each ramp runs on its own short-lived thread so the monitoring
//! loop and command handlers never wait on a fade.
//!
//! At most one ramp runs per light.  The slot is claimed with a
//! compare-and-swap in [`SharedState::try_claim`]; a request that loses the
//! claim is rejected with [`RampError::Busy`] rather than queued.  The
//! winning task holds a [`RampSlot`] for its whole lifetime and is the
//! only writer of that light's duty until it exits.
//!
//! A running ramp re-checks the light's fault flag before every step.  If
//! the flag has appeared, the task drives the light to 0 and exits, so a
//! fault raised mid-fade never leaves two writers on one channel.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, error, warn};

use crate::actuators::Actuator;
use crate::app::events::{AppEvent, SuppressReason};
use crate::app::ports::{ActuatorPort, EventSink};
use crate::app::state::{RampSlot, SharedState};
use crate::config::SystemConfig;
use crate::drivers::task_pin::{self, Core};
use crate::error::{HwError, RampError};

/// Ramp tasks sit just below the monitoring loop.
const RAMP_TASK_PRIORITY: u8 = 4;
const RAMP_TASK_STACK_KB: usize = 4;

/// One step from `current` toward `target`, never overshooting.
pub fn next_step(current: u8, target: u8, step: u8) -> u8 {
    if current < target {
        current.saturating_add(step).min(target)
    } else {
        current.saturating_sub(step).max(target)
    }
}

/// Handle to a spawned ramp task.
#[derive(Debug)]
pub struct RampHandle {
    actuator: Actuator,
    inner: JoinHandle<()>,
}

impl RampHandle {
    pub fn actuator(&self) -> Actuator {
        self.actuator
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Block until the task exits.  Returns `false` if it panicked.
    pub fn join(self) -> bool {
        self.inner.join().is_ok()
    }
}

/// Spawns and polices ramp tasks.
pub struct RampEngine<H> {
    state: Arc<SharedState>,
    hw: Arc<H>,
    sink: Arc<dyn EventSink>,
    step: u8,
    delay: Duration,
}

impl<H> Clone for RampEngine<H> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            hw: Arc::clone(&self.hw),
            sink: Arc::clone(&self.sink),
            step: self.step,
            delay: self.delay,
        }
    }
}

impl<H: ActuatorPort + 'static> RampEngine<H> {
    pub fn new(
        state: Arc<SharedState>,
        hw: Arc<H>,
        sink: Arc<dyn EventSink>,
        config: &SystemConfig,
    ) -> Self {
        Self {
            state,
            hw,
            sink,
            step: config.ramp_step.max(1),
            delay: Duration::from_millis(u64::from(config.ramp_step_delay_ms)),
        }
    }

    /// Start ramping `actuator` toward `target` (clamped to 100).
    ///
    /// Returns `Ok(None)` when the light is already at `target`.  A set
    /// fault flag or an occupied slot rejects the request without side
    /// effects beyond a log line and an event.
    pub fn ramp(&self, actuator: Actuator, target: u8) -> Result<Option<RampHandle>, RampError> {
        if !actuator.is_dimmable() {
            return Err(RampError::NotDimmable(actuator));
        }
        let target = target.min(100);

        if self.state.is_faulted(actuator) {
            error!("Cannot ramp {actuator} due to a detected fault");
            self.sink.emit(&AppEvent::RampSuppressed {
                actuator,
                reason: SuppressReason::Faulted,
            });
            return Err(RampError::Faulted(actuator));
        }

        let Some(slot) = self.state.try_claim(actuator) else {
            debug!("{actuator} already ramping, request for {target}% dropped");
            self.sink.emit(&AppEvent::RampSuppressed {
                actuator,
                reason: SuppressReason::Busy,
            });
            return Err(RampError::Busy(actuator));
        };

        let current = self.state.update_actuator(actuator, |s| {
            s.target = target;
            s.current
        });
        if current == target {
            return Ok(None);
        }

        let task = RampTask {
            slot,
            hw: Arc::clone(&self.hw),
            sink: Arc::clone(&self.sink),
            target,
            step: self.step,
            delay: self.delay,
        };
        match task_pin::spawn_on_core(
            Core::App,
            RAMP_TASK_PRIORITY,
            RAMP_TASK_STACK_KB,
            "ramp\0",
            move || task.run(),
        ) {
            Ok(inner) => Ok(Some(RampHandle { actuator, inner })),
            Err(e) => {
                error!("Ramp task for {actuator} failed to spawn: {e}");
                Err(RampError::SpawnFailed(actuator))
            }
        }
    }

    /// Drive `actuator` to 0 immediately, bypassing the step sequence.
    ///
    /// Goes through the same slot as [`ramp`](Self::ramp).  If a ramp task
    /// currently owns the light this returns `Ok(false)` and leaves the
    /// work to that task, which forces 0 itself once it sees the fault flag.
    pub fn force_off(&self, actuator: Actuator) -> Result<bool, HwError> {
        let Some(_slot) = self.state.try_claim(actuator) else {
            return Ok(false);
        };
        if self.state.duty(actuator) == 0 {
            return Ok(true);
        }
        self.hw.set_pwm_duty(actuator.pin(), 0)?;
        self.state.update_actuator(actuator, |s| {
            s.current = 0;
            s.target = 0;
            s.commanded_on = false;
        });
        Ok(true)
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }
}

/// The body of one ramp thread.
struct RampTask<H> {
    slot: RampSlot,
    hw: Arc<H>,
    sink: Arc<dyn EventSink>,
    target: u8,
    step: u8,
    delay: Duration,
}

impl<H: ActuatorPort> RampTask<H> {
    fn run(self) {
        let actuator = self.slot.actuator();
        let state = self.slot.state();
        let pin = actuator.pin();

        loop {
            if state.is_faulted(actuator) {
                warn!("{actuator} fault raised mid-ramp, forcing off");
                if let Err(e) = self.hw.set_pwm_duty(pin, 0) {
                    self.sink.emit(&AppEvent::WriteFailed(e));
                }
                state.set_duty(actuator, 0);
                self.sink.emit(&AppEvent::RampAborted(actuator));
                return;
            }

            let current = state.duty(actuator);
            if current == self.target {
                debug!("{actuator} reached {}%", self.target);
                return;
            }

            let next = next_step(current, self.target, self.step);
            if let Err(e) = self.hw.set_pwm_duty(pin, next) {
                error!("{actuator} ramp stopped: {e}");
                self.sink.emit(&AppEvent::WriteFailed(e));
                return;
            }
            state.set_duty(actuator, next);

            std::thread::sleep(self.delay);
        }
    }
}
