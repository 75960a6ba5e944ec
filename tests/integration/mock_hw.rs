//! Mock hardware adapter for integration tests.
//!
//! Records every output call so tests can assert on the full command
//! history without touching real GPIO/PWM registers, and lets each test
//! script sensor inputs, the LED2 detection pin, and the clock.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use nightwatch::actuators::Actuator;
use nightwatch::app::events::AppEvent;
use nightwatch::app::ports::{ActuatorPort, EventSink, FlickerSource, SensorPort, TimePort};
use nightwatch::app::service::LightingService;
use nightwatch::config::SystemConfig;
use nightwatch::error::HwError;
use nightwatch::pins;

// ── Output call record ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    Digital { pin: i32, high: bool },
    Pwm { pin: i32, duty: u8 },
}

/// How the LED2 detection pin behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detect {
    /// Mirrors the last level written to LED2 (healthy light).
    Follow,
    /// Stuck at a level regardless of what LED2 is driven to.
    Stuck(bool),
    /// Read fails.
    Fail,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    calls: Mutex<Vec<HwCall>>,
    inputs: Mutex<HashMap<i32, bool>>,
    ambient: Mutex<Result<u16, HwError>>,
    init_result: Mutex<Result<(), HwError>>,
    detect: Mutex<Detect>,
    led2_level: Mutex<bool>,
    pub ambient_reads: AtomicU32,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            inputs: Mutex::new(HashMap::new()),
            ambient: Mutex::new(Ok(20_000)),
            init_result: Mutex::new(Ok(())),
            detect: Mutex::new(Detect::Follow),
            led2_level: Mutex::new(false),
            ambient_reads: AtomicU32::new(0),
        }
    }

    pub fn set_motion(&self, on: bool) {
        self.inputs.lock().unwrap().insert(pins::PIR_SENSOR_GPIO, on);
    }

    pub fn set_proximity(&self, on: bool) {
        self.inputs.lock().unwrap().insert(pins::IR_SENSOR_GPIO, on);
    }

    pub fn set_ambient(&self, reading: Result<u16, HwError>) {
        *self.ambient.lock().unwrap() = reading;
    }

    pub fn set_init_result(&self, result: Result<(), HwError>) {
        *self.init_result.lock().unwrap() = result;
    }

    pub fn set_detect(&self, detect: Detect) {
        *self.detect.lock().unwrap() = detect;
    }

    pub fn calls(&self) -> Vec<HwCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Every duty written to `actuator`'s PWM pin, in order.
    pub fn pwm_history(&self, actuator: Actuator) -> Vec<u8> {
        let pin = actuator.pin();
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HwCall::Pwm { pin: p, duty } if p == pin => Some(duty),
                _ => None,
            })
            .collect()
    }

    /// Last level written to a digital pin.
    pub fn last_digital(&self, pin: i32) -> Option<bool> {
        self.calls().into_iter().rev().find_map(|c| match c {
            HwCall::Digital { pin: p, high } if p == pin => Some(high),
            _ => None,
        })
    }

    pub fn digital_writes(&self, pin: i32) -> usize {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, HwCall::Digital { pin: p, .. } if *p == pin))
            .count()
    }

    pub fn pwm_writes(&self) -> usize {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, HwCall::Pwm { .. }))
            .count()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn digital_read(&self, pin: i32) -> Result<bool, HwError> {
        if pin == pins::LED2_DETECT_GPIO {
            return match *self.detect.lock().unwrap() {
                Detect::Follow => Ok(*self.led2_level.lock().unwrap()),
                Detect::Stuck(level) => Ok(level),
                Detect::Fail => Err(HwError::GpioReadFailed(pin)),
            };
        }
        Ok(self.inputs.lock().unwrap().get(&pin).copied().unwrap_or(false))
    }

    fn init_ambient_sensor(&self) -> Result<(), HwError> {
        *self.init_result.lock().unwrap()
    }

    fn read_ambient_light(&self) -> Result<u16, HwError> {
        self.ambient_reads.fetch_add(1, Ordering::Relaxed);
        *self.ambient.lock().unwrap()
    }
}

impl ActuatorPort for MockHardware {
    fn digital_write(&self, pin: i32, high: bool) -> Result<(), HwError> {
        if pin == pins::LED2_GPIO {
            *self.led2_level.lock().unwrap() = high;
        }
        self.calls.lock().unwrap().push(HwCall::Digital { pin, high });
        Ok(())
    }

    fn set_pwm_duty(&self, pin: i32, duty: u8) -> Result<(), HwError> {
        self.calls.lock().unwrap().push(HwCall::Pwm { pin, duty });
        Ok(())
    }
}

// ── ManualClock ───────────────────────────────────────────────

#[derive(Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl TimePort for ManualClock {
    fn uptime_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }
}

// ── ScriptedFlicker ───────────────────────────────────────────

/// Replays a fixed sequence, cycling when exhausted.
pub struct ScriptedFlicker {
    script: VecDeque<u8>,
}

#[allow(dead_code)]
impl ScriptedFlicker {
    pub fn new(values: &[u8]) -> Self {
        Self {
            script: values.iter().copied().collect(),
        }
    }
}

impl FlickerSource for ScriptedFlicker {
    fn next_duty(&mut self) -> u8 {
        let v = self.script.pop_front().unwrap_or(0);
        self.script.push_back(v);
        v
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AppEvent>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

pub struct Rig {
    pub service: LightingService<MockHardware>,
    pub hw: Arc<MockHardware>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
}

/// Fast ramps so tests finish quickly.
pub fn fast_config() -> SystemConfig {
    SystemConfig {
        ramp_step_delay_ms: 1,
        ..SystemConfig::default()
    }
}

#[allow(dead_code)]
pub fn rig() -> Rig {
    rig_with(fast_config())
}

pub fn rig_with(config: SystemConfig) -> Rig {
    let hw = Arc::new(MockHardware::new());
    let sink = Arc::new(RecordingSink::default());
    let clock = Arc::new(ManualClock::default());
    let service = LightingService::new(
        Arc::clone(&hw),
        config,
        Arc::clone(&sink) as Arc<dyn EventSink>,
        Arc::clone(&clock) as Arc<dyn TimePort>,
    );
    Rig {
        service,
        hw,
        sink,
        clock,
    }
}

/// Poll `cond` until it holds or two seconds pass.
#[allow(dead_code)]
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}

/// Wait until `actuator` has settled at `duty` with no ramp in flight.
#[allow(dead_code)]
pub fn settles_at(rig: &Rig, actuator: Actuator, duty: u8) -> bool {
    let state = rig.service.state();
    wait_until(|| !state.is_ramping(actuator) && state.duty(actuator) == duty)
}
