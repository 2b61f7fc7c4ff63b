//! Maps `Box<dyn Error>` from trait boundaries to typed `GripperError`.
//!
//! The traits in `gripper_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `gripper_hardware::HwError`.

use crate::error::GripperError;

/// Map an error returned by an `Actuator` call.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> GripperError {
    if let Some(known) = e.downcast_ref::<GripperError>() {
        return known.clone();
    }

    #[cfg(feature = "hardware-errors")]
    {
        use gripper_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::MoveTimeout => GripperError::ActuatorTimeout,
                other => GripperError::Actuator(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        GripperError::ActuatorTimeout
    } else {
        GripperError::Actuator(s)
    }
}

/// Map an error returned by a `Sensors` call.
///
/// Every hardware failure on the sensor side is a sensor error, whatever the
/// backend called it.
pub fn map_sensor_error(e: &(dyn std::error::Error + 'static)) -> GripperError {
    match map_hw_error(e) {
        GripperError::ActuatorTimeout | GripperError::SensorTimeout => GripperError::SensorTimeout,
        GripperError::Actuator(s) => GripperError::Sensor(s),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Opaque(&'static str);

    impl std::fmt::Display for Opaque {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for Opaque {}

    #[test]
    fn string_fallback() {
        assert_eq!(
            map_hw_error(&Opaque("move timeout on outC")),
            GripperError::ActuatorTimeout
        );
        assert_eq!(
            map_hw_error(&Opaque("tacho jammed")),
            GripperError::Actuator("tacho jammed".into())
        );
        assert_eq!(
            map_sensor_error(&Opaque("i2c nack")),
            GripperError::Sensor("i2c nack".into())
        );
        assert_eq!(
            map_sensor_error(&Opaque("read timeout")),
            GripperError::SensorTimeout
        );
    }

    #[test]
    fn typed_errors_pass_through() {
        assert_eq!(
            map_sensor_error(&GripperError::SensorTimeout),
            GripperError::SensorTimeout
        );
        assert_eq!(
            map_hw_error(&GripperError::State("x".into())),
            GripperError::State("x".into())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_error_downcast() {
        use gripper_hardware::error::HwError;
        assert_eq!(map_hw_error(&HwError::MoveTimeout), GripperError::ActuatorTimeout);
        assert!(matches!(
            map_sensor_error(&HwError::PortNotFound("in1".into())),
            GripperError::Sensor(s) if s.contains("in1")
        ));
    }
}
