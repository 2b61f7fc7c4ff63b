//! Seams between the gripper controller and the outside world.
//!
//! The controller never talks to hardware directly: motors go through
//! [`Actuator`], the four sensors through [`Sensors`], and the operator stop
//! button through [`StopSignal`]. Errors crossing these boundaries are boxed so
//! that any backend can plug in; `gripper_core` maps them to typed errors.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Error type used at every trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The three motors of the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorId {
    FingerA,
    FingerB,
    Thumb,
}

impl MotorId {
    /// All motors, fingers first. The thumb is last because it is the one a
    /// grasp or release blocks on.
    pub const ALL: [MotorId; 3] = [MotorId::FingerA, MotorId::FingerB, MotorId::Thumb];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FingerA => "finger_a",
            Self::FingerB => "finger_b",
            Self::Thumb => "thumb",
        }
    }
}

/// The two contact (touch) sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactId {
    /// Inside of the hand; pressed by an object pushed into the palm.
    Palm,
    /// Edge of the hand; the operator's manual button.
    Side,
}

impl ContactId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Palm => "palm",
            Self::Side => "side",
        }
    }
}

/// Where a drive command should take a motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Degrees relative to wherever the motor currently is.
    Relative(i32),
    /// Position relative to the motor's zero reference.
    Absolute(i32),
}

pub trait Actuator {
    /// Run motor `id` at `speed_percent` (of its rated maximum) towards `target`.
    /// With `blocking` the call returns only once the motor has finished moving.
    fn drive(
        &mut self,
        id: MotorId,
        speed_percent: i8,
        target: Target,
        blocking: bool,
    ) -> Result<(), BoxError>;
    /// De-energize motor `id`.
    fn stop(&mut self, id: MotorId) -> Result<(), BoxError>;
    /// Declare the current physical position of `id` to be its new zero.
    /// Must not move the motor.
    fn rebase_zero(&mut self, id: MotorId) -> Result<(), BoxError>;
}

pub trait Sensors {
    fn read_distance_cm(&mut self) -> Result<f64, BoxError>;
    fn read_contact(&mut self, id: ContactId) -> Result<bool, BoxError>;
    fn read_orientation_deg(&mut self) -> Result<f64, BoxError>;
    /// Make the current orientation the new zero angle. Readings taken right
    /// after this call may still be settling.
    fn calibrate_orientation_zero(&mut self) -> Result<(), BoxError>;
}

/// Operator-side termination request, polled once per tick.
pub trait StopSignal {
    fn is_stop_requested(&self) -> bool;
}

impl<F: Fn() -> bool> StopSignal for F {
    fn is_stop_requested(&self) -> bool {
        self()
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn drive(
        &mut self,
        id: MotorId,
        speed_percent: i8,
        target: Target,
        blocking: bool,
    ) -> Result<(), BoxError> {
        (**self).drive(id, speed_percent, target, blocking)
    }
    fn stop(&mut self, id: MotorId) -> Result<(), BoxError> {
        (**self).stop(id)
    }
    fn rebase_zero(&mut self, id: MotorId) -> Result<(), BoxError> {
        (**self).rebase_zero(id)
    }
}

impl<S: Sensors + ?Sized> Sensors for Box<S> {
    fn read_distance_cm(&mut self) -> Result<f64, BoxError> {
        (**self).read_distance_cm()
    }
    fn read_contact(&mut self, id: ContactId) -> Result<bool, BoxError> {
        (**self).read_contact(id)
    }
    fn read_orientation_deg(&mut self) -> Result<f64, BoxError> {
        (**self).read_orientation_deg()
    }
    fn calibrate_orientation_zero(&mut self) -> Result<(), BoxError> {
        (**self).calibrate_orientation_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_stop_signals() {
        let flag = std::cell::Cell::new(false);
        let signal = || flag.get();
        assert!(!signal.is_stop_requested());
        flag.set(true);
        assert!(signal.is_stop_requested());
    }

    #[test]
    fn thumb_is_driven_last() {
        assert_eq!(MotorId::ALL.last(), Some(&MotorId::Thumb));
    }
}
