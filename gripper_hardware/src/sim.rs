//! Simulated hand for running the controller without a robot.
//!
//! The sensors replay a fixed [`Scenario`] against elapsed clock time, so the
//! same script runs in real time with a `MonotonicClock` or instantly with a
//! `ManualClock`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gripper_traits::{Actuator, BoxError, Clock, ContactId, MotorId, Sensors, Target};
use tracing::debug;

use crate::error::HwError;

/// Distance reported when nothing is in front of the hand.
const FAR_CM: f64 = 40.0;
/// Distance reported while the scripted object sits in front of the hand.
const NEAR_CM: f64 = 3.0;
const SWING_DEG: f64 = 90.0;

/// Scripted sensor timelines, measured from the moment the sensors are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scenario {
    /// Nothing ever happens.
    #[default]
    Idle,
    /// Object held in front of the hand from 2.5 s to 6 s, then the wrist is
    /// swung ±90° once per second from 7 s to 13 s.
    GraspRelease,
    /// Palm pressed at 2.5 s, side button clicked at 5 s for 0.8 s, then held
    /// from 7 s to 10.5 s.
    ClickRelease,
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Ok(Self::Idle),
            "grasp-release" => Ok(Self::GraspRelease),
            "click-release" => Ok(Self::ClickRelease),
            other => Err(format!(
                "unknown scenario '{other}' (expected idle, grasp-release or click-release)"
            )),
        }
    }
}

/// What every sensor reads at one instant of a scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub distance_cm: f64,
    pub palm: bool,
    pub side: bool,
    pub angle_deg: f64,
}

impl Scenario {
    /// Sensor readings `t` after the scenario started.
    pub fn frame(&self, t: Duration) -> Frame {
        let s = t.as_secs_f64();
        let idle = Frame {
            distance_cm: FAR_CM,
            palm: false,
            side: false,
            angle_deg: 0.0,
        };
        match self {
            Self::Idle => idle,
            Self::GraspRelease => {
                let distance_cm = if (2.5..6.0).contains(&s) { NEAR_CM } else { FAR_CM };
                let angle_deg = if (7.0..13.0).contains(&s) {
                    // whole seconds since 7 s: even -> +90, odd -> -90
                    if ((s - 7.0) as u32) % 2 == 0 {
                        SWING_DEG
                    } else {
                        -SWING_DEG
                    }
                } else {
                    0.0
                };
                Frame {
                    distance_cm,
                    angle_deg,
                    ..idle
                }
            }
            Self::ClickRelease => Frame {
                palm: (2.5..3.0).contains(&s),
                side: (5.0..5.8).contains(&s) || (7.0..10.5).contains(&s),
                ..idle
            },
        }
    }
}

/// Sensors replaying a [`Scenario`].
pub struct SimulatedSensors {
    scenario: Scenario,
    clock: Arc<dyn Clock + Send + Sync>,
    start: Instant,
    orientation_zero: f64,
    fail_after: Option<Duration>,
}

impl SimulatedSensors {
    pub fn new(scenario: Scenario, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let start = clock.now();
        Self {
            scenario,
            clock,
            start,
            orientation_zero: 0.0,
            fail_after: None,
        }
    }

    /// Make every read fail once `after` has elapsed.
    pub fn failing_after(mut self, after: Duration) -> Self {
        self.fail_after = Some(after);
        self
    }

    fn frame(&self) -> Result<Frame, HwError> {
        let t = self.clock.now().saturating_duration_since(self.start);
        if self.fail_after.is_some_and(|after| t >= after) {
            return Err(HwError::Simulated("sensor bus not responding"));
        }
        Ok(self.scenario.frame(t))
    }
}

impl Sensors for SimulatedSensors {
    fn read_distance_cm(&mut self) -> Result<f64, BoxError> {
        Ok(self.frame()?.distance_cm)
    }

    fn read_contact(&mut self, id: ContactId) -> Result<bool, BoxError> {
        let frame = self.frame()?;
        Ok(match id {
            ContactId::Palm => frame.palm,
            ContactId::Side => frame.side,
        })
    }

    fn read_orientation_deg(&mut self) -> Result<f64, BoxError> {
        Ok(self.frame()?.angle_deg - self.orientation_zero)
    }

    fn calibrate_orientation_zero(&mut self) -> Result<(), BoxError> {
        self.orientation_zero = self.frame()?.angle_deg;
        debug!(zero = self.orientation_zero, "simulated gyro re-zeroed");
        Ok(())
    }
}

/// Motors that track their positions in memory.
#[derive(Debug, Default)]
pub struct SimulatedActuator {
    positions: [i32; 3],
    reject_drives: bool,
}

fn slot(id: MotorId) -> usize {
    match id {
        MotorId::FingerA => 0,
        MotorId::FingerB => 1,
        MotorId::Thumb => 2,
    }
}

impl SimulatedActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every drive command, as a jammed or unplugged motor would.
    pub fn rejecting_drives(mut self) -> Self {
        self.reject_drives = true;
        self
    }

    /// Current position of `id` relative to its zero reference.
    pub fn position(&self, id: MotorId) -> i32 {
        self.positions[slot(id)]
    }
}

impl Actuator for SimulatedActuator {
    fn drive(
        &mut self,
        id: MotorId,
        speed_percent: i8,
        target: Target,
        blocking: bool,
    ) -> Result<(), BoxError> {
        if self.reject_drives {
            return Err(Box::new(HwError::Simulated("motor rejected command")));
        }
        let pos = &mut self.positions[slot(id)];
        match target {
            Target::Relative(deg) => {
                *pos += if speed_percent < 0 { -deg } else { deg };
            }
            Target::Absolute(p) => *pos = p,
        }
        debug!(
            motor = id.as_str(),
            speed_percent,
            position = *pos,
            blocking,
            "simulated drive"
        );
        Ok(())
    }

    fn stop(&mut self, id: MotorId) -> Result<(), BoxError> {
        debug!(motor = id.as_str(), "simulated stop");
        Ok(())
    }

    fn rebase_zero(&mut self, id: MotorId) -> Result<(), BoxError> {
        self.positions[slot(id)] = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gripper_traits::ManualClock;

    #[test]
    fn grasp_release_swings_alternate() {
        let s = Scenario::GraspRelease;
        assert_eq!(s.frame(Duration::from_millis(7_100)).angle_deg, 90.0);
        assert_eq!(s.frame(Duration::from_millis(8_100)).angle_deg, -90.0);
        assert_eq!(s.frame(Duration::from_millis(9_100)).angle_deg, 90.0);
        assert_eq!(s.frame(Duration::from_millis(13_100)).angle_deg, 0.0);
    }

    #[test]
    fn sensors_follow_the_clock() {
        let clock = ManualClock::new();
        let mut sensors = SimulatedSensors::new(Scenario::GraspRelease, Arc::new(clock.clone()));
        assert_eq!(sensors.read_distance_cm().unwrap(), FAR_CM);
        clock.advance(Duration::from_secs(3));
        assert_eq!(sensors.read_distance_cm().unwrap(), NEAR_CM);
    }

    #[test]
    fn calibration_rebiases_orientation() {
        let clock = ManualClock::new();
        let mut sensors = SimulatedSensors::new(Scenario::GraspRelease, Arc::new(clock.clone()));
        clock.advance(Duration::from_millis(8_500));
        assert_eq!(sensors.read_orientation_deg().unwrap(), -90.0);
        sensors.calibrate_orientation_zero().unwrap();
        assert_eq!(sensors.read_orientation_deg().unwrap(), 0.0);
    }

    #[test]
    fn sensors_fail_after_deadline() {
        let clock = ManualClock::new();
        let mut sensors = SimulatedSensors::new(Scenario::Idle, Arc::new(clock.clone()))
            .failing_after(Duration::from_secs(1));
        assert!(sensors.read_contact(ContactId::Palm).is_ok());
        clock.advance(Duration::from_secs(1));
        assert!(sensors.read_contact(ContactId::Palm).is_err());
    }

    #[test]
    fn relative_and_absolute_moves() {
        let mut act = SimulatedActuator::new();
        act.drive(MotorId::Thumb, 5, Target::Relative(200), true)
            .unwrap();
        assert_eq!(act.position(MotorId::Thumb), 200);
        act.drive(MotorId::Thumb, 15, Target::Absolute(0), true)
            .unwrap();
        assert_eq!(act.position(MotorId::Thumb), 0);
        act.drive(MotorId::FingerA, -15, Target::Relative(100), false)
            .unwrap();
        assert_eq!(act.position(MotorId::FingerA), -100);
    }

    #[test]
    fn rejecting_actuator_fails_drives_but_still_stops() {
        let mut act = SimulatedActuator::new().rejecting_drives();
        assert!(act.drive(MotorId::FingerB, 15, Target::Absolute(0), false).is_err());
        assert!(act.stop(MotorId::FingerB).is_ok());
    }

    #[test]
    fn scenario_names_parse() {
        assert_eq!("grasp-release".parse::<Scenario>(), Ok(Scenario::GraspRelease));
        assert_eq!(" Click-Release ".parse::<Scenario>(), Ok(Scenario::ClickRelease));
        assert!("juggle".parse::<Scenario>().is_err());
    }
}
