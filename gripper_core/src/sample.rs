use std::time::Instant;

use eyre::WrapErr;
use gripper_traits::{Clock, ContactId, Sensors};

use crate::error::Result;
use crate::hw_error::map_sensor_error;

/// All four sensors read once, stamped after the last read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub distance_cm: f64,
    pub palm_pressed: bool,
    pub side_pressed: bool,
    pub orientation_deg: f64,
    pub timestamp: Instant,
}

impl SensorSample {
    pub fn read<S: Sensors + ?Sized>(sensors: &mut S, clock: &dyn Clock) -> Result<Self> {
        let distance_cm = sensors
            .read_distance_cm()
            .map_err(|e| eyre::Report::new(map_sensor_error(&*e)))
            .wrap_err("reading distance")?;
        let palm_pressed = sensors
            .read_contact(ContactId::Palm)
            .map_err(|e| eyre::Report::new(map_sensor_error(&*e)))
            .wrap_err("reading palm contact")?;
        let side_pressed = sensors
            .read_contact(ContactId::Side)
            .map_err(|e| eyre::Report::new(map_sensor_error(&*e)))
            .wrap_err("reading side contact")?;
        let orientation_deg = sensors
            .read_orientation_deg()
            .map_err(|e| eyre::Report::new(map_sensor_error(&*e)))
            .wrap_err("reading orientation")?;
        Ok(Self {
            distance_cm,
            palm_pressed,
            side_pressed,
            orientation_deg,
            timestamp: clock.now(),
        })
    }
}
