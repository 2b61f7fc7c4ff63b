//! Grasp, release and rebase as synchronous motor sequences.

use eyre::WrapErr;
use gripper_traits::{Actuator, MotorId, Target};

use crate::config::{GraspCfg, ReleaseCfg};
use crate::error::{GripperError, Result};
use crate::hw_error::map_hw_error;

fn drive_err(e: &(dyn std::error::Error + Send + Sync + 'static), id: MotorId) -> GripperError {
    let mapped = map_hw_error(e);
    tracing::debug!(motor = id.as_str(), error = %mapped, "actuator call failed");
    mapped
}

/// Owns the actuator and knows the motion profiles.
///
/// Fingers are commanded without waiting and the thumb last with waiting, so
/// every motion returns once the thumb is done or an error occurs.
pub struct Hand<A: Actuator> {
    actuator: A,
    grasp: GraspCfg,
    release: ReleaseCfg,
}

impl<A: Actuator> Hand<A> {
    pub fn new(actuator: A, grasp: GraspCfg, release: ReleaseCfg) -> Self {
        Self {
            actuator,
            grasp,
            release,
        }
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn grasp(&mut self) -> std::result::Result<(), GripperError> {
        let g = self.grasp;
        let fingers = Target::Relative(g.finger_degrees);
        self.drive(MotorId::FingerA, g.finger_speed_percent, fingers, false)?;
        self.drive(MotorId::FingerB, g.finger_speed_percent, fingers, false)?;
        self.drive(
            MotorId::Thumb,
            g.thumb_speed_percent,
            Target::Relative(g.thumb_degrees),
            true,
        )
    }

    pub fn release(&mut self) -> std::result::Result<(), GripperError> {
        let speed = self.release.speed_percent;
        for id in MotorId::ALL {
            self.drive(id, speed, Target::Absolute(0), id == MotorId::Thumb)?;
        }
        Ok(())
    }

    /// Re-zero every motor encoder at its current pose. Does not move anything.
    pub fn reset_reference(&mut self) -> std::result::Result<(), GripperError> {
        for id in MotorId::ALL {
            self.actuator
                .rebase_zero(id)
                .map_err(|e| drive_err(&*e, id))?;
        }
        Ok(())
    }

    /// Send `stop` to every motor, even when an earlier one fails.
    pub fn stop_all(&mut self) -> Result<()> {
        let mut first_err = None;
        for id in MotorId::ALL {
            if let Err(e) = self.actuator.stop(id) {
                let mapped = map_hw_error(&*e);
                tracing::warn!(motor = id.as_str(), error = %mapped, "motor stop failed");
                if first_err.is_none() {
                    first_err = Some(mapped);
                }
            }
        }
        match first_err {
            None => Ok(()),
            Some(e) => Err(eyre::Report::new(e)).wrap_err("stop_all"),
        }
    }

    fn drive(
        &mut self,
        id: MotorId,
        speed_percent: i8,
        target: Target,
        blocking: bool,
    ) -> std::result::Result<(), GripperError> {
        self.actuator
            .drive(id, speed_percent, target, blocking)
            .map_err(|e| drive_err(&*e, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gripper_hardware::SimulatedActuator;

    #[test]
    fn grasp_then_release_returns_to_zero() {
        let mut hand = Hand::new(
            SimulatedActuator::new(),
            GraspCfg::default(),
            ReleaseCfg::default(),
        );
        hand.grasp().unwrap();
        assert_eq!(hand.actuator().position(MotorId::FingerA), -400);
        assert_eq!(hand.actuator().position(MotorId::Thumb), 200);
        hand.release().unwrap();
        for id in MotorId::ALL {
            assert_eq!(hand.actuator().position(id), 0);
        }
    }

    #[test]
    fn failing_drive_is_typed() {
        let mut hand = Hand::new(
            SimulatedActuator::new().rejecting_drives(),
            GraspCfg::default(),
            ReleaseCfg::default(),
        );
        assert!(matches!(hand.grasp(), Err(GripperError::Actuator(_))));
        assert!(hand.stop_all().is_ok());
    }
}
