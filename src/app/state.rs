//! Shared control state.
//!
//! One [`SharedState`] is created at boot, wrapped in an `Arc`, and handed
//! to the service, the monitoring loop and the ramp engine.  Each logical
//! group has its own lock:
//!
//! | Group            | Guard                         |
//! |------------------|-------------------------------|
//! | fault mode       | `Mutex<FaultMode>`            |
//! | fault flags      | `Mutex<FaultFlags>`           |
//! | per-actuator     | `Mutex<ActuatorState>` each   |
//! | ramp slots       | `AtomicBool` each             |
//! | manual override  | `Mutex<[bool; N]>`            |
//! | activity times   | `Mutex<Activity>`             |
//!
//! Every accessor takes its lock for the duration of one read or one
//! mutation and returns owned copies.  No guard escapes this module, so no
//! lock is ever held across a sleep or a hardware call.  The only nested
//! acquisition is mode → flags inside [`SharedState::enter_fault_mode`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::actuators::Actuator;
use crate::fault::{FaultFlag, FaultFlags, FaultMode};

/// Lock a mutex, recovering the data if a panicking thread poisoned it.
/// All guarded values are plain data that is valid after any partial
/// update, so the inner value is always usable.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-actuator output state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorState {
    /// Duty cycle currently applied (0–100).  For LED2: 0 or 100.
    pub current: u8,
    /// Where the last ramp was heading.
    pub target: u8,
    /// Logical on/off state last commanded (LED2 readback compares this).
    pub commanded_on: bool,
}

/// Most recent presence detections (uptime milliseconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activity {
    pub last_motion_ms: Option<u64>,
    pub last_proximity_ms: Option<u64>,
}

/// Status report returned by the status command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub fault_mode: &'static str,
    pub current_duty: BTreeMap<&'static str, u8>,
    #[serde(rename = "last_pir_detection_time")]
    pub last_motion_ms: Option<u64>,
    #[serde(rename = "last_ir_detection_time")]
    pub last_proximity_ms: Option<u64>,
    #[serde(rename = "LED2_state")]
    pub led2_state: bool,
    pub faults: FaultFlags,
}

/// The process-wide control state.
#[derive(Debug, Default)]
pub struct SharedState {
    mode: Mutex<FaultMode>,
    flags: Mutex<FaultFlags>,
    actuators: [Mutex<ActuatorState>; Actuator::COUNT],
    ramping: [AtomicBool; Actuator::COUNT],
    overrides: Mutex<[bool; Actuator::COUNT]>,
    activity: Mutex<Activity>,
}

impl SharedState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // ── Fault mode ────────────────────────────────────────────

    pub fn mode(&self) -> FaultMode {
        *lock(&self.mode)
    }

    /// Switch mode and apply its entry action: clear every flag, then set
    /// the flag the new mode implies.  Returns the previous mode.
    ///
    /// The mode lock is held while the flags are rewritten, so no reader
    /// that takes mode then flags sees the new mode with stale flags.
    pub fn enter_fault_mode(&self, mode: FaultMode) -> FaultMode {
        let mut current = lock(&self.mode);
        let mut flags = lock(&self.flags);
        *flags = mode.entry_flags();
        core::mem::replace(&mut *current, mode)
    }

    // ── Fault flags ───────────────────────────────────────────

    pub fn flags(&self) -> FaultFlags {
        *lock(&self.flags)
    }

    pub fn has_flag(&self, flag: FaultFlag) -> bool {
        lock(&self.flags).contains(flag)
    }

    /// Assert a flag.  Returns `true` if it was previously clear.
    pub fn set_flag(&self, flag: FaultFlag) -> bool {
        let mut flags = lock(&self.flags);
        let was = flags.contains(flag);
        flags.insert(flag);
        !was
    }

    /// Clear a flag.  Returns `true` if it was previously set.
    pub fn clear_flag(&self, flag: FaultFlag) -> bool {
        let mut flags = lock(&self.flags);
        let was = flags.contains(flag);
        flags.remove(flag);
        was
    }

    /// Whether `actuator`'s failure flag is asserted.
    pub fn is_faulted(&self, actuator: Actuator) -> bool {
        self.has_flag(actuator.failure_flag())
    }

    // ── Per-actuator state ────────────────────────────────────

    pub fn actuator(&self, actuator: Actuator) -> ActuatorState {
        *lock(&self.actuators[actuator.index()])
    }

    pub fn duty(&self, actuator: Actuator) -> u8 {
        self.actuator(actuator).current
    }

    /// Apply `f` to one actuator's state under its lock.
    pub fn update_actuator<R>(
        &self,
        actuator: Actuator,
        f: impl FnOnce(&mut ActuatorState) -> R,
    ) -> R {
        f(&mut lock(&self.actuators[actuator.index()]))
    }

    /// Record a duty that has just been written to hardware.
    pub fn set_duty(&self, actuator: Actuator, duty: u8) {
        self.update_actuator(actuator, |s| {
            s.current = duty;
            s.commanded_on = duty > 0;
        });
    }

    // ── Ramp slots ────────────────────────────────────────────

    /// Claim `actuator`'s ramp slot.  `None` if another task holds it.
    pub fn try_claim(self: &Arc<Self>, actuator: Actuator) -> Option<RampSlot> {
        self.ramping[actuator.index()]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RampSlot {
                state: Arc::clone(self),
                actuator,
            })
    }

    pub fn is_ramping(&self, actuator: Actuator) -> bool {
        self.ramping[actuator.index()].load(Ordering::Acquire)
    }

    // ── Manual override ───────────────────────────────────────

    pub fn manual_override(&self, actuator: Actuator) -> bool {
        lock(&self.overrides)[actuator.index()]
    }

    pub fn set_manual_override(&self, actuator: Actuator, on: bool) {
        lock(&self.overrides)[actuator.index()] = on;
    }

    // ── Activity ──────────────────────────────────────────────

    pub fn activity(&self) -> Activity {
        *lock(&self.activity)
    }

    pub fn record_activity(&self, now_ms: u64, motion: bool, proximity: bool) {
        let mut activity = lock(&self.activity);
        if motion {
            activity.last_motion_ms = Some(now_ms);
        }
        if proximity {
            activity.last_proximity_ms = Some(now_ms);
        }
    }

    // ── Status ────────────────────────────────────────────────

    /// Build a status report.  `led2_state` is the observed detect-pin
    /// level, sampled by the caller.
    pub fn snapshot(&self, led2_state: bool) -> StatusSnapshot {
        let mode = self.mode();
        let current_duty = Actuator::ALL
            .into_iter()
            .filter(|a| a.is_dimmable())
            .map(|a| (a.name(), self.duty(a)))
            .collect();
        let activity = self.activity();
        StatusSnapshot {
            fault_mode: mode.label(),
            current_duty,
            last_motion_ms: activity.last_motion_ms,
            last_proximity_ms: activity.last_proximity_ms,
            led2_state,
            faults: self.flags(),
        }
    }
}

/// Exclusive ownership of one actuator's ramp slot.  Dropping it releases
/// the slot, including when the owning task unwinds.
#[derive(Debug)]
pub struct RampSlot {
    state: Arc<SharedState>,
    actuator: Actuator,
}

impl RampSlot {
    pub fn actuator(&self) -> Actuator {
        self.actuator
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }
}

impl Drop for RampSlot {
    fn drop(&mut self) {
        self.state.ramping[self.actuator.index()].store(false, Ordering::Release);
    }
}
