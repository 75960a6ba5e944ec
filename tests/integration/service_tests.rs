//! LightingService integration tests: commands, status, and bring-up.

use nightwatch::actuators::Actuator;
use nightwatch::app::commands::{AppCommand, AppResponse};
use nightwatch::app::events::AppEvent;
use nightwatch::error::{CommandError, HwError};
use nightwatch::fault::{FaultFlag, FaultFlags, FaultMode};
use nightwatch::pins;

use super::mock_hw::{Detect, rig, settles_at};

fn only(flag: FaultFlag) -> FaultFlags {
    let mut flags = FaultFlags::empty();
    flags.insert(flag);
    flags
}

// ── Fault modes ───────────────────────────────────────────────

#[test]
fn setting_a_mode_replaces_flags_with_its_own() {
    let r = rig();
    r.service.state().set_flag(FaultFlag::Led2Failure);

    let resp = r
        .service
        .handle_command(AppCommand::SetFaultMode("3".into()))
        .unwrap();
    assert_eq!(resp, AppResponse::message("Simulate IR Sensor Failure"));
    assert_eq!(r.service.state().mode(), FaultMode::IrSensorFailure);
    assert_eq!(r.service.state().flags(), only(FaultFlag::IrSensorFailure));
    assert!(r.sink.events().contains(&AppEvent::ModeChanged {
        from: FaultMode::Normal,
        to: FaultMode::IrSensorFailure,
    }));
}

#[test]
fn invalid_mode_codes_leave_state_untouched() {
    let r = rig();
    r.service.set_fault_mode("9").unwrap();
    let before = r.service.state().flags();

    for code in ["0", "13", "abc", "", "-1"] {
        let err = r.service.set_fault_mode(code).unwrap_err();
        assert_eq!(err, CommandError::InvalidFaultMode(code.to_owned()));
        assert_eq!(err.to_string(), "Invalid fault mode.");
    }
    assert_eq!(r.service.state().mode(), FaultMode::SensorCrossTalk);
    assert_eq!(r.service.state().flags(), before);
}

#[test]
fn repeating_a_mode_is_idempotent() {
    let r = rig();
    r.service.set_fault_mode("5").unwrap();
    let first = r.service.state().flags();
    r.service.set_fault_mode("5").unwrap();
    assert_eq!(r.service.state().flags(), first);
    assert_eq!(r.service.state().mode(), FaultMode::I2cCommunicationFailure);
}

#[test]
fn returning_to_normal_clears_every_flag() {
    let r = rig();
    r.service.set_fault_mode("10").unwrap();
    r.service.state().set_flag(FaultFlag::TcsSensorFailure);

    let mode = r.service.set_fault_mode("1").unwrap();
    assert_eq!(mode, FaultMode::Normal);
    assert!(r.service.state().flags().is_empty());
}

// ── Manual control ────────────────────────────────────────────

#[test]
fn led2_is_locked_out_in_its_own_failure_mode() {
    let r = rig();
    r.service.set_fault_mode("11").unwrap();
    r.hw.clear_calls();

    let err = r.service.set_actuator("LED2", true).unwrap_err();
    assert_eq!(err.to_string(), "Cannot control LED2 in current fault mode.");
    assert_eq!(r.hw.digital_writes(pins::LED2_GPIO), 0);
    assert!(!r.service.state().manual_override(Actuator::Led2));
    assert!(r.service.state().has_flag(FaultFlag::Led2Failure));
}

#[test]
fn crosstalk_mode_locks_out_auxiliary_lights_only() {
    let r = rig();
    r.service.set_fault_mode("9").unwrap();
    for name in ["LED1", "LED2", "LED3"] {
        assert!(matches!(
            r.service.set_actuator(name, true),
            Err(CommandError::ForbiddenInMode { .. })
        ));
    }
    assert_eq!(
        r.service.set_actuator("PIR", true).unwrap(),
        "PIR LED turned on"
    );
}

#[test]
fn unknown_light_name_is_rejected() {
    let r = rig();
    let err = r.service.set_actuator("LED9", true).unwrap_err();
    assert_eq!(err, CommandError::UnknownActuator("LED9".into()));
    assert_eq!(err.to_string(), "Invalid LED name");
    assert_eq!(r.hw.calls().len(), 0);
}

#[test]
fn led2_manual_control_writes_pin_and_clears_fault() {
    let r = rig();
    r.service.state().set_flag(FaultFlag::Led2Failure);

    let msg = r.service.set_actuator("led2", true).unwrap();
    assert_eq!(msg, "LED2 LED turned on via manual control");
    assert_eq!(r.hw.last_digital(pins::LED2_GPIO), Some(true));

    let state = r.service.state();
    assert!(state.manual_override(Actuator::Led2));
    assert!(!state.has_flag(FaultFlag::Led2Failure));
    assert!(state.actuator(Actuator::Led2).commanded_on);
    assert!(r.sink.events().contains(&AppEvent::ManualOverride {
        actuator: Actuator::Led2,
        on: true,
    }));

    let msg = r.service.set_actuator("LED2", false).unwrap();
    assert_eq!(msg, "LED2 LED turned off via manual control");
    assert_eq!(r.hw.last_digital(pins::LED2_GPIO), Some(false));
    assert!(state.manual_override(Actuator::Led2));
}

#[test]
fn dimmable_light_ramps_to_full_then_off() {
    let r = rig();
    let msg = r.service.set_actuator("LED1", true).unwrap();
    assert_eq!(msg, "LED1 LED turned on");
    assert!(settles_at(&r, Actuator::Led1, 100));

    let msg = r.service.set_actuator("led1", false).unwrap();
    assert_eq!(msg, "LED1 LED turned off");
    assert!(settles_at(&r, Actuator::Led1, 0));
}

#[test]
fn faulted_dimmable_reports_success_but_stays_dark() {
    let r = rig();
    r.service.state().set_flag(FaultFlag::TcsLedFailure);
    let msg = r.service.set_actuator("TCS", true).unwrap();
    assert_eq!(msg, "TCS LED turned on");
    assert!(r.hw.pwm_history(Actuator::Tcs).is_empty());
    assert_eq!(r.service.state().duty(Actuator::Tcs), 0);
}

// ── Status ────────────────────────────────────────────────────

#[test]
fn status_serializes_expected_shape() {
    let r = rig();
    r.hw.set_detect(Detect::Stuck(true));
    r.service.set_fault_mode("2").unwrap();

    let resp = r.service.handle_command(AppCommand::GetStatus).unwrap();
    let json = serde_json::to_value(&resp).unwrap();

    assert_eq!(json["fault_mode"], "Simulate PIR Sensor Failure");
    assert_eq!(json["LED2_state"], true);
    assert!(json["last_pir_detection_time"].is_null());
    assert!(json["last_ir_detection_time"].is_null());

    let duty = json["current_duty"].as_object().unwrap();
    assert_eq!(duty.len(), 5);
    for key in ["PIR", "IR", "TCS", "LED1", "LED3"] {
        assert_eq!(duty[key], 0);
    }
    assert!(!duty.contains_key("LED2"));

    let faults = json["faults"].as_object().unwrap();
    assert_eq!(faults.len(), 14);
    assert_eq!(faults["PIR_Sensor_Failure"], true);
    assert_eq!(faults["LED2_Failure"], false);
}

#[test]
fn unreadable_detect_pin_sets_led2_fault() {
    let r = rig();
    r.hw.set_detect(Detect::Fail);
    let status = r.service.status();
    assert!(!status.led2_state);
    assert!(r.service.state().has_flag(FaultFlag::Led2Failure));
}

// ── Bring-up ──────────────────────────────────────────────────

#[test]
fn start_records_sensor_bring_up_failure() {
    let r = rig();
    r.hw.set_init_result(Err(HwError::I2cFailed));
    r.service.start();

    let flags = r.service.state().flags();
    assert!(flags.contains(FaultFlag::TcsSensorFailure));
    assert!(flags.contains(FaultFlag::I2cCommunicationFailure));
    assert_eq!(r.sink.events().first(), Some(&AppEvent::Started(FaultMode::Normal)));
}

#[test]
fn start_in_simulated_sensor_failure_skips_bring_up() {
    let r = rig();
    r.service.set_fault_mode("4").unwrap();
    r.hw.set_init_result(Err(HwError::I2cFailed));
    r.service.start();

    assert_eq!(r.service.state().flags(), only(FaultFlag::TcsSensorFailure));
}

#[test]
fn healthy_start_raises_no_faults() {
    let r = rig();
    r.service.start();
    assert!(r.service.state().flags().is_empty());
}
