use gripper_core::error::BuildError;
use gripper_core::{
    Gripper, GripperCfg, HandState, SideButtonCfg, SwingCfg, SwingKind, TimingCfg,
};
use gripper_hardware::{Scenario, SimulatedActuator, SimulatedSensors};
use gripper_traits::ManualClock;
use rstest::rstest;
use std::sync::Arc;

fn sim_sensors() -> SimulatedSensors {
    SimulatedSensors::new(Scenario::Idle, Arc::new(ManualClock::new()))
}

#[rstest]
fn builder_missing_actuator_yields_typed_build_error() {
    let err = Gripper::builder()
        // missing with_actuator()
        .with_sensors(sim_sensors())
        .try_build()
        .expect_err("should fail with MissingActuator");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingActuator) => {}
        other => panic!("expected MissingActuator, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_sensors_yields_typed_build_error() {
    let err = Gripper::builder()
        .with_actuator(SimulatedActuator::new())
        .try_build()
        .expect_err("should fail with MissingSensors");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingSensors) => {}
        other => panic!("expected MissingSensors, got: {other:?}"),
    }
}

#[rstest]
#[case::zero_finger_speed(GripperCfg { grasp: gripper_core::GraspCfg { finger_speed_percent: 0, ..Default::default() }, ..Default::default() })]
#[case::thumb_speed_over_100(GripperCfg { grasp: gripper_core::GraspCfg { thumb_speed_percent: -101, ..Default::default() }, ..Default::default() })]
#[case::nan_presence(GripperCfg { presence: gripper_core::PresenceCfg { threshold_cm: f64::NAN, ..Default::default() }, ..Default::default() })]
#[case::inverted_click_window(GripperCfg { side_button: SideButtonCfg { short_min_ms: 2000, short_max_ms: 100, long_hold_ms: 3000 }, ..Default::default() })]
#[case::click_window_past_long_hold(GripperCfg { side_button: SideButtonCfg { short_min_ms: 100, short_max_ms: 4000, long_hold_ms: 3000 }, ..Default::default() })]
#[case::zero_swing_target(GripperCfg { swing: SwingCfg { target_count: 0, ..Default::default() }, ..Default::default() })]
#[case::negative_swing_threshold(GripperCfg { swing: SwingCfg { threshold_deg: -85.0, ..Default::default() }, ..Default::default() })]
#[case::periodic_without_interval(GripperCfg { swing: SwingCfg { kind: SwingKind::Periodic, interval_ms: 0, ..Default::default() }, ..Default::default() })]
#[case::zero_tick(GripperCfg { timing: TimingCfg { tick_ms: 0, ..Default::default() }, ..Default::default() })]
fn invalid_config_is_rejected(#[case] cfg: GripperCfg) {
    let err = Gripper::builder()
        .with_actuator(SimulatedActuator::new())
        .with_sensors(sim_sensors())
        .with_cfg(cfg)
        .build()
        .expect_err("config should be rejected");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(_)) => {}
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[rstest]
fn valid_build_starts_open() {
    let mut gripper = Gripper::builder()
        .with_actuator(SimulatedActuator::new())
        .with_sensors(sim_sensors())
        .with_clock(Box::new(ManualClock::new()))
        .with_swing(SwingCfg {
            kind: SwingKind::Periodic,
            ..Default::default()
        })
        .build()
        .expect("valid build");
    gripper.begin().expect("begin");
    assert_eq!(gripper.state(), HandState::Open);
    assert_eq!(gripper.swing_count(), 0);
    gripper.shutdown().expect("shutdown");
}
