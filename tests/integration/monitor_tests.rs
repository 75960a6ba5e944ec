//! Monitoring loop scenarios, one `run_cycle` at a time.

use std::sync::atomic::Ordering;
use std::time::Duration;

use nightwatch::actuators::Actuator;
use nightwatch::app::events::AppEvent;
use nightwatch::app::monitor::MonitorLoop;
use nightwatch::error::HwError;
use nightwatch::fault::FaultFlag;
use nightwatch::pins;

use super::mock_hw::{Detect, MockHardware, Rig, ScriptedFlicker, rig, settles_at};

const DARK: u16 = 500;
const MODERATE: u16 = 5_500;

fn monitor(r: &Rig) -> MonitorLoop<MockHardware> {
    r.service.monitor(Box::new(ScriptedFlicker::new(&[50, 0, 100])))
}

/// Turn every auxiliary light and TCS fully on, then wait for the fades.
fn all_lights_on(r: &Rig) {
    for name in ["TCS", "LED1", "LED3"] {
        r.service.set_actuator(name, true).unwrap();
    }
    for a in [Actuator::Tcs, Actuator::Led1, Actuator::Led3] {
        assert!(settles_at(r, a, 100));
    }
}

fn readback_faults(r: &Rig) -> usize {
    r.sink
        .count(|e| matches!(e, AppEvent::ReadbackFault { .. }))
}

// ── Normal operation ──────────────────────────────────────────

#[test]
fn dark_room_with_motion_lights_everything() {
    let r = rig();
    r.hw.set_ambient(Ok(DARK));
    r.hw.set_motion(true);
    r.clock.advance(1_234);
    let mut m = monitor(&r);

    assert_eq!(m.run_cycle(), Duration::from_millis(1_000));

    for a in [Actuator::Tcs, Actuator::Led1, Actuator::Led3] {
        assert!(settles_at(&r, a, 100), "{a} did not reach 100");
    }
    assert_eq!(r.hw.last_digital(pins::LED2_GPIO), Some(true));
    assert_eq!(r.hw.last_digital(pins::FAULT_LED_GPIO), Some(false));
    assert_eq!(r.service.state().activity().last_motion_ms, Some(1_234));
    assert!(r.service.state().flags().is_empty());
}

#[test]
fn moderate_light_maps_to_proportional_duty() {
    let r = rig();
    r.hw.set_ambient(Ok(MODERATE));
    let mut m = monitor(&r);
    m.run_cycle();

    for a in [Actuator::Tcs, Actuator::Led1, Actuator::Led3] {
        assert!(settles_at(&r, a, 50));
    }
}

#[test]
fn occupant_standing_still_keeps_auxiliary_lights_off() {
    let r = rig();
    r.hw.set_ambient(Ok(DARK));
    r.hw.set_proximity(true);
    let mut m = monitor(&r);
    m.run_cycle();

    assert!(settles_at(&r, Actuator::Tcs, 100));
    assert_eq!(r.service.state().duty(Actuator::Led1), 0);
    assert_eq!(r.service.state().duty(Actuator::Led3), 0);
    assert_eq!(r.hw.last_digital(pins::LED2_GPIO), Some(false));
}

#[test]
fn bright_room_turns_lights_off() {
    let r = rig();
    all_lights_on(&r);
    r.hw.set_ambient(Ok(20_000));
    r.hw.set_motion(true);
    let mut m = monitor(&r);
    m.run_cycle();

    for a in [Actuator::Tcs, Actuator::Led1, Actuator::Led3] {
        assert!(settles_at(&r, a, 0));
    }
    assert_eq!(r.hw.last_digital(pins::LED2_GPIO), Some(false));
}

// ── Ambient sensor faults ─────────────────────────────────────

#[test]
fn simulated_sensor_failure_uses_fixed_reading_without_bus_access() {
    let r = rig();
    r.service.set_fault_mode("4").unwrap();
    let mut m = monitor(&r);
    m.run_cycle();

    assert_eq!(r.hw.ambient_reads.load(Ordering::Relaxed), 0);
    for a in [Actuator::Tcs, Actuator::Led1, Actuator::Led3] {
        assert!(settles_at(&r, a, 56));
    }
    let active: Vec<_> = r.service.state().flags().active().collect();
    assert_eq!(active, vec![FaultFlag::TcsSensorFailure]);
    assert_eq!(r.hw.last_digital(pins::FAULT_LED_GPIO), Some(true));
}

#[test]
fn simulated_bus_failure_turns_lights_off_with_single_flag() {
    let r = rig();
    all_lights_on(&r);
    r.hw.set_ambient(Ok(DARK));
    r.service.set_fault_mode("5").unwrap();
    let mut m = monitor(&r);
    m.run_cycle();

    for a in [Actuator::Tcs, Actuator::Led1, Actuator::Led3] {
        assert!(settles_at(&r, a, 0));
    }
    assert_eq!(r.hw.ambient_reads.load(Ordering::Relaxed), 0);
    let active: Vec<_> = r.service.state().flags().active().collect();
    assert_eq!(active, vec![FaultFlag::I2cCommunicationFailure]);
    assert_eq!(r.sink.count(|e| *e == AppEvent::AmbientReadFailed), 1);
}

#[test]
fn real_read_failure_flags_sensor_until_next_good_read() {
    let r = rig();
    r.hw.set_ambient(Err(HwError::I2cFailed));
    let mut m = monitor(&r);
    m.run_cycle();

    let flags = r.service.state().flags();
    assert!(flags.contains(FaultFlag::TcsSensorFailure));
    assert!(flags.contains(FaultFlag::I2cCommunicationFailure));

    r.hw.set_ambient(Ok(DARK));
    m.run_cycle();
    assert!(r.service.state().flags().is_empty());
    assert!(settles_at(&r, Actuator::Led1, 100));
}

// ── Simulated output faults ───────────────────────────────────

#[test]
fn gpio_output_failure_writes_nothing_to_lights() {
    let r = rig();
    r.hw.set_ambient(Ok(DARK));
    r.service.set_fault_mode("6").unwrap();
    let mut m = monitor(&r);
    m.run_cycle();
    m.run_cycle();

    assert_eq!(r.hw.pwm_writes(), 0);
    assert_eq!(r.hw.digital_writes(pins::LED2_GPIO), 0);
    assert_eq!(r.hw.last_digital(pins::FAULT_LED_GPIO), Some(true));
}

#[test]
fn led1_failure_mode_holds_led1_dark() {
    let r = rig();
    all_lights_on(&r);
    r.hw.set_ambient(Ok(DARK));
    r.service.set_fault_mode("10").unwrap();
    let mut m = monitor(&r);
    m.run_cycle();

    assert_eq!(r.service.state().duty(Actuator::Led1), 0);
    assert_eq!(r.hw.pwm_history(Actuator::Led1).last(), Some(&0));
    assert!(settles_at(&r, Actuator::Led3, 100));

    m.run_cycle();
    assert_eq!(r.service.state().duty(Actuator::Led1), 0);
}

#[test]
fn led2_failure_mode_forces_led2_low() {
    let r = rig();
    r.hw.set_ambient(Ok(DARK));
    let mut m = monitor(&r);
    m.run_cycle();
    assert_eq!(r.hw.last_digital(pins::LED2_GPIO), Some(true));

    r.service.set_fault_mode("11").unwrap();
    m.run_cycle();
    assert_eq!(r.hw.last_digital(pins::LED2_GPIO), Some(false));
    assert!(!r.service.state().actuator(Actuator::Led2).commanded_on);
    assert_eq!(readback_faults(&r), 0);
}

#[test]
fn power_issues_flicker_lights_directly() {
    let r = rig();
    r.hw.set_ambient(Ok(DARK));
    r.service.set_fault_mode("7").unwrap();
    let mut m = monitor(&r);
    for _ in 0..3 {
        m.run_cycle();
    }

    for a in [Actuator::Tcs, Actuator::Led1, Actuator::Led3] {
        assert_eq!(r.hw.pwm_history(a), vec![50, 0, 100]);
        assert_eq!(r.service.state().duty(a), 100);
    }
    assert!(r.hw.pwm_history(Actuator::Pir).is_empty());
    assert_eq!(r.hw.ambient_reads.load(Ordering::Relaxed), 0);
}

// ── Delayed response ──────────────────────────────────────────

#[test]
fn delayed_response_stalls_then_runs_one_cycle() {
    let r = rig();
    r.hw.set_ambient(Ok(DARK));
    r.service.set_fault_mode("8").unwrap();
    let mut m = monitor(&r);

    assert_eq!(m.run_cycle(), Duration::from_millis(500));
    assert_eq!(r.sink.count(|e| *e == AppEvent::DelayedHoldStarted), 1);

    r.clock.advance(4_999);
    assert_eq!(m.run_cycle(), Duration::from_millis(500));
    assert_eq!(r.hw.ambient_reads.load(Ordering::Relaxed), 0);
    assert_eq!(r.hw.pwm_writes(), 0);

    r.clock.advance(1);
    assert_eq!(m.run_cycle(), Duration::from_millis(1_000));
    assert_eq!(r.sink.count(|e| *e == AppEvent::DelayedHoldReleased), 1);
    assert_eq!(r.hw.ambient_reads.load(Ordering::Relaxed), 1);

    assert_eq!(m.run_cycle(), Duration::from_millis(500));
    assert_eq!(r.sink.count(|e| *e == AppEvent::DelayedHoldStarted), 2);
}

#[test]
fn leaving_delayed_response_discards_stall() {
    let r = rig();
    r.service.set_fault_mode("8").unwrap();
    let mut m = monitor(&r);
    m.run_cycle();

    r.service.set_fault_mode("1").unwrap();
    assert_eq!(m.run_cycle(), Duration::from_millis(1_000));

    r.service.set_fault_mode("8").unwrap();
    assert_eq!(m.run_cycle(), Duration::from_millis(500));
    assert_eq!(r.sink.count(|e| *e == AppEvent::DelayedHoldStarted), 2);
}

// ── LED2 readback ─────────────────────────────────────────────

#[test]
fn readback_mismatch_is_reported_once_then_resolves() {
    let r = rig();
    r.hw.set_ambient(Ok(DARK));
    r.hw.set_detect(Detect::Stuck(false));
    let mut m = monitor(&r);

    for _ in 0..3 {
        m.run_cycle();
    }
    assert_eq!(readback_faults(&r), 1);
    assert!(r.service.state().has_flag(FaultFlag::Led2Failure));
    assert!(r.sink.events().contains(&AppEvent::ReadbackFault {
        actuator: Actuator::Led2,
        commanded: true,
        detected: false,
    }));

    r.hw.set_detect(Detect::Follow);
    m.run_cycle();
    assert!(!r.service.state().has_flag(FaultFlag::Led2Failure));
    assert_eq!(
        r.sink
            .count(|e| *e == AppEvent::ReadbackResolved(Actuator::Led2)),
        1
    );
    assert!(!r.service.state().manual_override(Actuator::Led2));

    m.run_cycle();
    assert_eq!(readback_faults(&r), 1);
}

#[test]
fn persisting_mismatch_is_reported_again_after_flags_reset() {
    let r = rig();
    r.hw.set_ambient(Ok(DARK));
    r.hw.set_detect(Detect::Stuck(false));
    let mut m = monitor(&r);

    m.run_cycle();
    assert_eq!(readback_faults(&r), 1);

    r.service.set_fault_mode("1").unwrap();
    m.run_cycle();
    assert_eq!(readback_faults(&r), 2);
}

#[test]
fn unreadable_detect_pin_skips_readback() {
    let r = rig();
    r.hw.set_ambient(Ok(DARK));
    r.hw.set_detect(Detect::Fail);
    let mut m = monitor(&r);
    m.run_cycle();

    assert_eq!(readback_faults(&r), 0);
    assert!(!r.service.state().has_flag(FaultFlag::Led2Failure));
}

#[test]
fn manual_override_keeps_loop_off_led2() {
    let r = rig();
    r.hw.set_ambient(Ok(DARK));
    r.hw.set_detect(Detect::Stuck(true));
    r.service.set_actuator("LED2", false).unwrap();
    let writes = r.hw.digital_writes(pins::LED2_GPIO);

    let mut m = monitor(&r);
    m.run_cycle();

    assert_eq!(r.hw.digital_writes(pins::LED2_GPIO), writes);
    assert_eq!(readback_faults(&r), 0);
}
