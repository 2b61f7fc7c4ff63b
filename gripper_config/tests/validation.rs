use gripper_config::{RunMode, SwingStrategy, load_toml};
use rstest::rstest;

const FULL: &str = r#"
[ports]
finger_a = "outA"
finger_b = "outB"
thumb = "outC"
distance = "in1"
palm = "in2"
side = "in3"
orientation = "in4"
stop_button = 17

[grasp]
finger_speed_percent = 15
finger_degrees = -400
thumb_speed_percent = 5
thumb_degrees = 200
cooldown_ms = 1000

[release]
speed_percent = 15

[presence]
threshold_cm = 5.0
dwell_ms = 2000

[side_button]
short_min_ms = 100
short_max_ms = 2000
long_hold_ms = 3000

[swing]
strategy = "periodic"
threshold_deg = 90.0
target_count = 2
interval_ms = 1000

[timing]
tick_ms = 50
settle_ms = 1500
calibration_ms = 3000
startup_calibration_ms = 2000

[timeouts]
move_ms = 10000
sensor_stall_ms = 1000

[runner]
mode = "sampler"

[hardware]
sysfs_root = "/sys/class"

[logging]
level = "debug"
rotation = "daily"
"#;

#[test]
fn accepts_full_config() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("full config validates");
    assert_eq!(cfg.ports.stop_button, Some(17));
    assert_eq!(cfg.swing.strategy, SwingStrategy::Periodic);
    assert_eq!(cfg.swing.target_count, 2);
    assert_eq!(cfg.runner.mode, RunMode::Sampler);
}

#[test]
fn partial_tables_keep_defaults_for_missing_keys() {
    let cfg = load_toml("[grasp]\ncooldown_ms = 250\n").expect("parse");
    cfg.validate().expect("valid");
    assert_eq!(cfg.grasp.cooldown_ms, 250);
    assert_eq!(cfg.grasp.thumb_degrees, 200);
    assert_eq!(cfg.ports.thumb, "outC");
}

#[rstest]
#[case("[grasp]\nfinger_speed_percent = 0\n", "grasp.finger_speed_percent")]
#[case("[grasp]\nthumb_speed_percent = 101\n", "grasp.thumb_speed_percent")]
#[case("[release]\nspeed_percent = -120\n", "release.speed_percent")]
#[case(
    "[grasp]\nfinger_degrees = 0\nthumb_degrees = 0\n",
    "cannot both be 0"
)]
#[case("[presence]\nthreshold_cm = 0.0\n", "presence.threshold_cm")]
#[case("[presence]\nthreshold_cm = 300.0\n", "presence.threshold_cm")]
#[case("[presence]\ndwell_ms = 120000\n", "presence.dwell_ms")]
#[case(
    "[side_button]\nshort_min_ms = 2000\nshort_max_ms = 100\n",
    "short_min_ms must be <"
)]
#[case(
    "[side_button]\nshort_max_ms = 4000\nlong_hold_ms = 3000\n",
    "short_max_ms must be <="
)]
#[case("[swing]\nthreshold_deg = 0.0\n", "swing.threshold_deg")]
#[case("[swing]\ntarget_count = 0\n", "swing.target_count")]
#[case(
    "[swing]\nstrategy = \"periodic\"\ninterval_ms = 0\n",
    "swing.interval_ms"
)]
#[case("[timing]\ntick_ms = 0\n", "timing.tick_ms")]
#[case("[timing]\nsettle_ms = 600000\n", "timing.settle_ms")]
#[case("[timeouts]\nmove_ms = 0\n", "timeouts.move_ms")]
#[case(
    "[runner]\nmode = \"sampler\"\n[timeouts]\nsensor_stall_ms = 60\n",
    "sensor_stall_ms"
)]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
#[case("[ports]\nthumb = \"outA\"\n", "both use port outA")]
#[case("[ports]\npalm = \"  \"\n", "ports.palm must not be empty")]
fn rejects_invalid(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "expected '{needle}' in '{msg}'");
}

#[test]
fn short_stall_window_is_fine_in_direct_mode() {
    let cfg = load_toml("[timeouts]\nsensor_stall_ms = 60\n").expect("parse");
    cfg.validate().expect("direct mode ignores the stall window");
}

#[test]
fn stall_watchdog_can_be_disabled() {
    let cfg =
        load_toml("[runner]\nmode = \"sampler\"\n[timeouts]\nsensor_stall_ms = 0\n").expect("parse");
    cfg.validate().expect("0 disables the watchdog");
}

#[rstest]
#[case("[swing]\nstrategy = \"pendulum\"\n")]
#[case("[runner]\nmode = \"turbo\"\n")]
#[case("[grasp]\nfinger_speed_percent = 200\n")]
#[case("[timing]\ntick_ms = -5\n")]
fn rejects_at_parse_time(#[case] toml: &str) {
    assert!(load_toml(toml).is_err());
}

#[test]
fn shipped_sample_config_is_valid() {
    let cfg = load_toml(include_str!("../../etc/gripper_config.toml")).expect("parse");
    cfg.validate().expect("sample validates");
    assert_eq!(cfg.runner.mode, RunMode::Direct);
    assert_eq!(cfg.swing.strategy, SwingStrategy::Threshold);
}
