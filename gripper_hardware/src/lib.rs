//! Hardware backends for the gripper: ev3dev sysfs drivers, a scripted
//! simulator, and (with the `hardware` feature on Linux) a GPIO stop button.

pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod sim;
pub mod sysfs;
pub mod util;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::make_stop_checker;
pub use sim::{Scenario, SimulatedActuator, SimulatedSensors};
pub use sysfs::{MotorPorts, SensorPorts, SysfsActuator, SysfsSensors};
