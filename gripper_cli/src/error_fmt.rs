//! Human-readable error descriptions, exit codes and structured JSON errors.

use gripper_core::error::{BuildError, GripperError};

/// Exit code when a sensor read failed.
pub const EXIT_SENSOR: i32 = 3;
/// Exit code when sensors stopped answering in time.
pub const EXIT_SENSOR_TIMEOUT: i32 = 4;
/// Exit code for unreadable or invalid configuration.
pub const EXIT_CONFIG: i32 = 5;
/// Exit code for everything else.
pub const EXIT_OTHER: i32 = 1;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingActuator => {
                "What happened: No actuator was provided to the controller.\nLikely causes: The motor backend failed to initialize or was not wired into the builder.\nHow to fix: Check the motor ports in [ports] and that the motors are plugged in.".to_string()
            }
            BuildError::MissingSensors => {
                "What happened: No sensors were provided to the controller.\nLikely causes: The sensor backend failed to initialize or was not wired into the builder.\nHow to fix: Check the sensor ports in [ports] and that the sensors are plugged in.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GripperError>() {
        return match ge {
            GripperError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: A typo, a value out of range, or two devices on one port.\nHow to fix: Edit the config file (or the GRIPPER_SIM_* variables), then rerun."
            ),
            GripperError::SensorTimeout => {
                "What happened: Sensors stopped answering.\nLikely causes: A sensor cable came loose or the sensor driver hung.\nHow to fix: Reseat the sensor cables; raise timeouts.sensor_stall_ms if the sensors are just slow.".to_string()
            }
            GripperError::Sensor(msg) => format!(
                "What happened: A sensor read failed ({msg}).\nLikely causes: Wrong port in [ports], unplugged sensor, or a sensor in the wrong mode.\nHow to fix: Run `gripper self-check` and fix the failing sensor."
            ),
            GripperError::ActuatorTimeout => {
                "What happened: A motor did not finish its move in time.\nLikely causes: The hand is blocked or the motor stalled.\nHow to fix: Free the hand; raise timeouts.move_ms if moves are just slow.".to_string()
            }
            GripperError::Actuator(msg) => format!(
                "What happened: A motor command failed ({msg}).\nLikely causes: Wrong port in [ports] or an unplugged motor.\nHow to fix: Check the motor cables and [ports], then rerun."
            ),
            GripperError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from backend init
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("no device found on port") || lower.contains("opening motors") {
        return format!(
            "What happened: A device was not found ({msg}).\nLikely causes: Wrong port name in [ports] or the device is unplugged.\nHow to fix: Compare [ports] with the ports the brick reports under [hardware] sysfs_root."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes for the failure classes scripts care about.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(BuildError::InvalidConfig(_)) = err.downcast_ref::<BuildError>() {
        return EXIT_CONFIG;
    }
    match err.downcast_ref::<GripperError>() {
        Some(GripperError::Sensor(_)) => EXIT_SENSOR,
        Some(GripperError::SensorTimeout) => EXIT_SENSOR_TIMEOUT,
        Some(GripperError::Config(_)) => EXIT_CONFIG,
        _ => EXIT_OTHER,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingActuator => "MissingActuator",
            BuildError::MissingSensors => "MissingSensors",
            BuildError::InvalidConfig(_) => "Config",
        };
    }
    match err.downcast_ref::<GripperError>() {
        Some(GripperError::Actuator(_)) => "Actuator",
        Some(GripperError::ActuatorTimeout) => "ActuatorTimeout",
        Some(GripperError::Sensor(_)) => "Sensor",
        Some(GripperError::SensorTimeout) => "SensorTimeout",
        Some(GripperError::Config(_)) => "Config",
        Some(GripperError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let sensor = eyre::Report::new(GripperError::Sensor("gyro".into())).wrap_err("reading");
        assert_eq!(exit_code_for_error(&sensor), EXIT_SENSOR);
        let stall = eyre::Report::new(GripperError::SensorTimeout);
        assert_eq!(exit_code_for_error(&stall), EXIT_SENSOR_TIMEOUT);
        let cfg = eyre::Report::new(BuildError::InvalidConfig("tick"));
        assert_eq!(exit_code_for_error(&cfg), EXIT_CONFIG);
        let other = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&other), EXIT_OTHER);
    }

    #[test]
    fn json_error_has_reason_and_message() {
        let err = eyre::Report::new(GripperError::Config("swing.target_count must be >= 1".into()));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Config");
        assert_eq!(v["exit_code"], 5);
        assert!(v["message"].as_str().unwrap().contains("target_count"));
    }
}
