//! Backend assembly: ev3dev sysfs drivers with the `hardware` feature,
//! otherwise the scripted simulator driven by `GRIPPER_SIM_*` variables.

use gripper_core::GripperError;
use gripper_traits::{Actuator, Clock, Sensors};

/// Everything the controller needs from the outside world.
pub struct Backend {
    pub actuator: Box<dyn Actuator>,
    pub sensors: Box<dyn Sensors + Send>,
    /// Clock shared with the sensors; `None` means real monotonic time.
    pub clock: Option<Box<dyn Clock + Send + Sync>>,
    /// Time only advances when the controller sleeps; the sampler thread cannot be used.
    pub virtual_time: bool,
}

#[cfg(not(feature = "hardware"))]
pub fn open_backend(_cfg: &gripper_config::Config) -> eyre::Result<Backend> {
    use gripper_hardware::{Scenario, SimulatedActuator, SimulatedSensors};
    use gripper_traits::{ManualClock, MonotonicClock};
    use std::sync::Arc;

    let scenario: Scenario = match std::env::var("GRIPPER_SIM_SCENARIO") {
        Ok(s) => s.parse().map_err(GripperError::Config)?,
        Err(_) => Scenario::default(),
    };
    let virtual_time = std::env::var("GRIPPER_SIM_CLOCK")
        .map(|v| v.eq_ignore_ascii_case("virtual"))
        .unwrap_or(false);

    let sensor_clock: Arc<dyn Clock + Send + Sync>;
    let mut clock: Option<Box<dyn Clock + Send + Sync>> = None;
    if virtual_time {
        // Sensors and controller share one virtual timeline.
        let manual = ManualClock::new();
        sensor_clock = Arc::new(manual.clone());
        clock = Some(Box::new(manual));
    } else {
        sensor_clock = Arc::new(MonotonicClock::new());
    }

    let mut sensors = SimulatedSensors::new(scenario, sensor_clock);
    let mut actuator = SimulatedActuator::new();
    match std::env::var("GRIPPER_SIM_FAULT").ok().as_deref() {
        None | Some("") | Some("none") => {}
        Some("sensor") => sensors = sensors.failing_after(std::time::Duration::ZERO),
        Some("actuator") => actuator = actuator.rejecting_drives(),
        Some(other) => {
            return Err(GripperError::Config(format!(
                "unknown GRIPPER_SIM_FAULT '{other}' (expected sensor or actuator)"
            ))
            .into());
        }
    }
    tracing::info!(?scenario, virtual_time, "using simulated hand");

    Ok(Backend {
        actuator: Box::new(actuator),
        sensors: Box::new(sensors),
        clock,
        virtual_time,
    })
}

#[cfg(feature = "hardware")]
pub fn open_backend(cfg: &gripper_config::Config) -> eyre::Result<Backend> {
    use eyre::WrapErr;
    use gripper_hardware::{MotorPorts, SensorPorts, SysfsActuator, SysfsSensors};

    let root = std::path::Path::new(&cfg.hardware.sysfs_root);
    let motors = MotorPorts {
        finger_a: cfg.ports.finger_a.clone(),
        finger_b: cfg.ports.finger_b.clone(),
        thumb: cfg.ports.thumb.clone(),
    };
    let probes = SensorPorts {
        distance: cfg.ports.distance.clone(),
        palm: cfg.ports.palm.clone(),
        side: cfg.ports.side.clone(),
        orientation: cfg.ports.orientation.clone(),
    };
    let actuator = SysfsActuator::open(
        root,
        &motors,
        std::time::Duration::from_millis(cfg.timeouts.move_ms),
    )
    .map_err(|e| GripperError::Actuator(e.to_string()))
    .wrap_err("opening motors")?;
    let sensors = SysfsSensors::open(root, &probes)
        .map_err(|e| GripperError::Sensor(e.to_string()))
        .wrap_err("opening sensors")?;
    tracing::info!(root = %root.display(), "ev3dev backends ready");

    Ok(Backend {
        actuator: Box::new(actuator),
        sensors: Box::new(sensors),
        clock: None,
        virtual_time: false,
    })
}

/// Operator stop button, when one is configured and the platform has GPIO.
pub fn stop_button(cfg: &gripper_config::Config) -> Option<Box<dyn Fn() -> bool + Send + Sync>> {
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        let pin = cfg.ports.stop_button?;
        match gripper_hardware::make_stop_checker(pin, cfg.ports.stop_active_low) {
            Ok(check) => {
                tracing::info!(pin, active_low = cfg.ports.stop_active_low, "stop button enabled");
                Some(check)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to init stop button; continuing without it");
                None
            }
        }
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    {
        if cfg.ports.stop_button.is_some() {
            tracing::warn!("stop_button is configured but GPIO is unavailable in this build");
        }
        None
    }
}
