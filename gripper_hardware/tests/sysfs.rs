use std::fs;
use std::path::Path;
use std::time::Duration;

use gripper_hardware::error::HwError;
use gripper_hardware::{MotorPorts, SensorPorts, SysfsActuator, SysfsSensors};
use gripper_traits::{Actuator, ContactId, MotorId, Sensors, Target};
use rstest::rstest;
use tempfile::{TempDir, tempdir};

fn attr(dir: &Path, name: &str, value: &str) {
    fs::write(dir.join(name), value).unwrap();
}

fn fake_motor(root: &Path, n: u32, port: &str, state: &str) {
    let dir = root.join("tacho-motor").join(format!("motor{n}"));
    fs::create_dir_all(&dir).unwrap();
    attr(&dir, "address", &format!("ev3-ports:{port}\n"));
    attr(&dir, "max_speed", "1000\n");
    attr(&dir, "state", state);
    attr(&dir, "position", "123\n");
}

fn fake_sensor(root: &Path, n: u32, port: &str, value0: &str, decimals: &str) {
    let dir = root.join("lego-sensor").join(format!("sensor{n}"));
    fs::create_dir_all(&dir).unwrap();
    attr(&dir, "address", &format!("ev3-ports:{port}\n"));
    attr(&dir, "value0", value0);
    attr(&dir, "decimals", decimals);
}

fn motor_ports() -> MotorPorts {
    MotorPorts {
        finger_a: "outA".into(),
        finger_b: "outB".into(),
        thumb: "outC".into(),
    }
}

fn sensor_ports() -> SensorPorts {
    SensorPorts {
        distance: "in1".into(),
        palm: "in2".into(),
        side: "in3".into(),
        orientation: "in4".into(),
    }
}

fn motor_tree(thumb_state: &str) -> TempDir {
    let dir = tempdir().unwrap();
    fake_motor(dir.path(), 0, "outA", "");
    fake_motor(dir.path(), 1, "outB", "");
    fake_motor(dir.path(), 2, "outC", thumb_state);
    dir
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap().trim().to_string()
}

#[rstest]
#[case(15, Target::Relative(-400), "150", "-400", "run-to-rel-pos")]
#[case(-15, Target::Relative(-400), "150", "400", "run-to-rel-pos")]
#[case(15, Target::Absolute(0), "150", "0", "run-to-abs-pos")]
fn drive_writes_setpoints(
    #[case] speed: i8,
    #[case] target: Target,
    #[case] speed_sp: &str,
    #[case] position_sp: &str,
    #[case] command: &str,
) {
    let tree = motor_tree("");
    let mut act = SysfsActuator::open(tree.path(), &motor_ports(), Duration::from_secs(1))
        .expect("open motors");

    act.drive(MotorId::FingerA, speed, target, false).unwrap();

    assert_eq!(read(tree.path(), "tacho-motor/motor0/speed_sp"), speed_sp);
    assert_eq!(read(tree.path(), "tacho-motor/motor0/position_sp"), position_sp);
    assert_eq!(read(tree.path(), "tacho-motor/motor0/command"), command);
}

#[test]
fn blocking_drive_returns_once_idle() {
    let tree = motor_tree("holding");
    let mut act = SysfsActuator::open(tree.path(), &motor_ports(), Duration::from_millis(200))
        .expect("open motors");
    act.drive(MotorId::Thumb, 5, Target::Relative(200), true)
        .expect("idle thumb should not block");
}

#[test]
fn blocking_drive_times_out_and_stops_motor() {
    let tree = motor_tree("running");
    let mut act = SysfsActuator::open(tree.path(), &motor_ports(), Duration::from_millis(30))
        .expect("open motors");

    let err = act
        .drive(MotorId::Thumb, 15, Target::Absolute(0), true)
        .expect_err("thumb never settles");
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::MoveTimeout)));
    assert_eq!(read(tree.path(), "tacho-motor/motor2/command"), "stop");
}

#[test]
fn stalled_motor_counts_as_finished() {
    let tree = motor_tree("running stalled");
    let mut act = SysfsActuator::open(tree.path(), &motor_ports(), Duration::from_millis(30))
        .expect("open motors");
    act.drive(MotorId::Thumb, 15, Target::Absolute(0), true)
        .expect("stalled motor is not waited on");
}

#[test]
fn rebase_zeroes_position_without_commanding_motion() {
    let tree = motor_tree("");
    let mut act = SysfsActuator::open(tree.path(), &motor_ports(), Duration::from_secs(1))
        .expect("open motors");
    act.rebase_zero(MotorId::FingerB).unwrap();
    assert_eq!(read(tree.path(), "tacho-motor/motor1/position"), "0");
    assert!(!tree.path().join("tacho-motor/motor1/command").exists());
}

#[test]
fn missing_port_is_reported() {
    let dir = tempdir().unwrap();
    fake_motor(dir.path(), 0, "outA", "");
    let err = SysfsActuator::open(dir.path(), &motor_ports(), Duration::from_secs(1))
        .expect_err("outB is missing");
    match err {
        HwError::PortNotFound(port) => assert_eq!(port, "outB"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn sensors_read_scaled_values_and_set_modes() {
    let dir = tempdir().unwrap();
    fake_sensor(dir.path(), 0, "in1", "53\n", "1\n");
    fake_sensor(dir.path(), 1, "in2", "1\n", "0\n");
    fake_sensor(dir.path(), 2, "in3", "0\n", "0\n");
    fake_sensor(dir.path(), 3, "in4", "-87\n", "0\n");

    let mut sensors = SysfsSensors::open(dir.path(), &sensor_ports()).expect("open sensors");

    assert!((sensors.read_distance_cm().unwrap() - 5.3).abs() < 1e-9);
    assert!(sensors.read_contact(ContactId::Palm).unwrap());
    assert!(!sensors.read_contact(ContactId::Side).unwrap());
    assert_eq!(sensors.read_orientation_deg().unwrap(), -87.0);
    assert_eq!(read(dir.path(), "lego-sensor/sensor0/mode"), "US-DIST-CM");

    sensors.calibrate_orientation_zero().unwrap();
    assert_eq!(read(dir.path(), "lego-sensor/sensor3/mode"), "GYRO-ANG");
}

#[test]
fn garbage_sensor_value_is_an_attribute_error() {
    let dir = tempdir().unwrap();
    fake_sensor(dir.path(), 0, "in1", "n/a\n", "0\n");
    fake_sensor(dir.path(), 1, "in2", "0\n", "0\n");
    fake_sensor(dir.path(), 2, "in3", "0\n", "0\n");
    fake_sensor(dir.path(), 3, "in4", "0\n", "0\n");
    let mut sensors = SysfsSensors::open(dir.path(), &sensor_ports()).expect("open sensors");

    let err = sensors.read_distance_cm().expect_err("non-numeric value");
    assert!(matches!(
        err.downcast_ref::<HwError>(),
        Some(HwError::Attribute { .. })
    ));
}
