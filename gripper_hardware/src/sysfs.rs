//! ev3dev sysfs drivers for the tacho motors and LEGO sensors.
//!
//! Devices are located by scanning `<root>/tacho-motor/*` and
//! `<root>/lego-sensor/*` for an `address` attribute that ends with the
//! configured port name (`outA`, `in1`, ...). All I/O is plain attribute
//! reads and writes, so the drivers can be exercised against a fake tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gripper_traits::{Actuator, BoxError, ContactId, MotorId, Sensors, Target};
use tracing::{debug, trace};

use crate::error::{HwError, Result};
use crate::util::wait_until_idle_with_timeout;

const MOTOR_CLASS: &str = "tacho-motor";
const SENSOR_CLASS: &str = "lego-sensor";
const STATE_POLL: Duration = Duration::from_millis(10);

fn read_attr(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

fn write_attr(path: &Path, value: &str) -> Result<()> {
    trace!(path = %path.display(), value, "sysfs write");
    fs::write(path, value)?;
    Ok(())
}

fn read_i32(path: &Path) -> Result<i32> {
    let s = read_attr(path)?;
    s.parse::<i32>().map_err(|_| HwError::Attribute {
        path: path.to_path_buf(),
        value: s,
    })
}

/// Find the device directory under `root/class` whose `address` names `port`.
fn find_device(root: &Path, class: &str, port: &str) -> Result<PathBuf> {
    let dir = root.join(class);
    let entries = fs::read_dir(&dir).map_err(|_| HwError::PortNotFound(port.to_string()))?;
    for entry in entries {
        let path = entry?.path();
        let Ok(address) = read_attr(&path.join("address")) else {
            continue;
        };
        // ev3dev reports e.g. "ev3-ports:outA"
        if address == port || address.rsplit(':').next() == Some(port) {
            debug!(port, device = %path.display(), "sysfs device found");
            return Ok(path);
        }
    }
    Err(HwError::PortNotFound(port.to_string()))
}

/// One tacho motor (`/sys/class/tacho-motor/motorN`).
#[derive(Debug)]
struct TachoMotor {
    dir: PathBuf,
    max_speed: i32,
}

impl TachoMotor {
    fn open(root: &Path, port: &str) -> Result<Self> {
        let dir = find_device(root, MOTOR_CLASS, port)?;
        let max_speed = read_i32(&dir.join("max_speed"))?;
        Ok(Self { dir, max_speed })
    }

    fn run(&self, speed_percent: i8, target: Target) -> Result<()> {
        let pct = i32::from(speed_percent);
        let speed_sp = self.max_speed * pct.abs() / 100;
        let (command, position_sp) = match target {
            // A negative speed flips the direction of a relative move.
            Target::Relative(deg) => ("run-to-rel-pos", if pct < 0 { -deg } else { deg }),
            Target::Absolute(pos) => ("run-to-abs-pos", pos),
        };
        write_attr(&self.dir.join("speed_sp"), &speed_sp.to_string())?;
        write_attr(&self.dir.join("position_sp"), &position_sp.to_string())?;
        write_attr(&self.dir.join("command"), command)
    }

    /// Moving means "running" is in the state flags and the motor has not stalled.
    fn is_busy(&self) -> Result<bool> {
        let state = read_attr(&self.dir.join("state"))?;
        let mut running = false;
        for flag in state.split_whitespace() {
            match flag {
                "stalled" => return Ok(false),
                "running" => running = true,
                _ => {}
            }
        }
        Ok(running)
    }

    fn stop(&self) -> Result<()> {
        write_attr(&self.dir.join("command"), "stop")
    }

    fn rebase(&self) -> Result<()> {
        write_attr(&self.dir.join("position"), "0")
    }
}

/// Ports for the three hand motors.
#[derive(Debug, Clone)]
pub struct MotorPorts {
    pub finger_a: String,
    pub finger_b: String,
    pub thumb: String,
}

/// The three hand motors driven through the tacho-motor class.
#[derive(Debug)]
pub struct SysfsActuator {
    finger_a: TachoMotor,
    finger_b: TachoMotor,
    thumb: TachoMotor,
    move_timeout: Duration,
}

impl SysfsActuator {
    pub fn open(root: impl AsRef<Path>, ports: &MotorPorts, move_timeout: Duration) -> Result<Self> {
        let root = root.as_ref();
        Ok(Self {
            finger_a: TachoMotor::open(root, &ports.finger_a)?,
            finger_b: TachoMotor::open(root, &ports.finger_b)?,
            thumb: TachoMotor::open(root, &ports.thumb)?,
            move_timeout,
        })
    }

    fn motor(&self, id: MotorId) -> &TachoMotor {
        match id {
            MotorId::FingerA => &self.finger_a,
            MotorId::FingerB => &self.finger_b,
            MotorId::Thumb => &self.thumb,
        }
    }
}

impl Actuator for SysfsActuator {
    fn drive(
        &mut self,
        id: MotorId,
        speed_percent: i8,
        target: Target,
        blocking: bool,
    ) -> std::result::Result<(), BoxError> {
        let motor = self.motor(id);
        motor.run(speed_percent, target)?;
        if blocking {
            if let Err(e) =
                wait_until_idle_with_timeout(|| motor.is_busy(), self.move_timeout, STATE_POLL)
            {
                // Never leave a motor energized after giving up on it.
                let _ = motor.stop();
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn stop(&mut self, id: MotorId) -> std::result::Result<(), BoxError> {
        self.motor(id).stop()?;
        Ok(())
    }

    fn rebase_zero(&mut self, id: MotorId) -> std::result::Result<(), BoxError> {
        self.motor(id).rebase()?;
        Ok(())
    }
}

/// One LEGO sensor (`/sys/class/lego-sensor/sensorN`).
#[derive(Debug)]
struct LegoSensor {
    dir: PathBuf,
}

impl LegoSensor {
    fn open(root: &Path, port: &str, mode: &str) -> Result<Self> {
        let sensor = Self {
            dir: find_device(root, SENSOR_CLASS, port)?,
        };
        sensor.set_mode(mode)?;
        Ok(sensor)
    }

    fn set_mode(&self, mode: &str) -> Result<()> {
        write_attr(&self.dir.join("mode"), mode)
    }

    fn value0(&self) -> Result<i32> {
        read_i32(&self.dir.join("value0"))
    }

    /// value0 scaled by the `decimals` attribute.
    fn scaled_value0(&self) -> Result<f64> {
        let raw = self.value0()?;
        let decimals = read_i32(&self.dir.join("decimals")).unwrap_or(0);
        Ok(f64::from(raw) / 10f64.powi(decimals))
    }
}

/// Sensor ports.
#[derive(Debug, Clone)]
pub struct SensorPorts {
    pub distance: String,
    pub palm: String,
    pub side: String,
    pub orientation: String,
}

/// Ultrasonic, two touch sensors and the gyro.
#[derive(Debug)]
pub struct SysfsSensors {
    distance: LegoSensor,
    palm: LegoSensor,
    side: LegoSensor,
    gyro: LegoSensor,
}

impl SysfsSensors {
    pub fn open(root: impl AsRef<Path>, ports: &SensorPorts) -> Result<Self> {
        let root = root.as_ref();
        Ok(Self {
            distance: LegoSensor::open(root, &ports.distance, "US-DIST-CM")?,
            palm: LegoSensor::open(root, &ports.palm, "TOUCH")?,
            side: LegoSensor::open(root, &ports.side, "TOUCH")?,
            gyro: LegoSensor::open(root, &ports.orientation, "GYRO-ANG")?,
        })
    }
}

impl Sensors for SysfsSensors {
    fn read_distance_cm(&mut self) -> std::result::Result<f64, BoxError> {
        Ok(self.distance.scaled_value0()?)
    }

    fn read_contact(&mut self, id: ContactId) -> std::result::Result<bool, BoxError> {
        let sensor = match id {
            ContactId::Palm => &self.palm,
            ContactId::Side => &self.side,
        };
        Ok(sensor.value0()? != 0)
    }

    fn read_orientation_deg(&mut self) -> std::result::Result<f64, BoxError> {
        Ok(f64::from(self.gyro.value0()?))
    }

    fn calibrate_orientation_zero(&mut self) -> std::result::Result<(), BoxError> {
        // Switching through the calibration mode zeroes the accumulated angle.
        self.gyro.set_mode("GYRO-CAL")?;
        self.gyro.set_mode("GYRO-ANG")?;
        Ok(())
    }
}
