//! `From` implementations bridging `gripper_config` types to `gripper_core` types.

use crate::config::{
    GraspCfg, GripperCfg, PresenceCfg, ReleaseCfg, SideButtonCfg, SwingCfg, SwingKind, TimingCfg,
    Timeouts,
};

impl From<&gripper_config::GraspCfg> for GraspCfg {
    fn from(c: &gripper_config::GraspCfg) -> Self {
        Self {
            finger_speed_percent: c.finger_speed_percent,
            finger_degrees: c.finger_degrees,
            thumb_speed_percent: c.thumb_speed_percent,
            thumb_degrees: c.thumb_degrees,
            cooldown_ms: c.cooldown_ms,
        }
    }
}

impl From<&gripper_config::ReleaseCfg> for ReleaseCfg {
    fn from(c: &gripper_config::ReleaseCfg) -> Self {
        Self {
            speed_percent: c.speed_percent,
        }
    }
}

impl From<&gripper_config::PresenceCfg> for PresenceCfg {
    fn from(c: &gripper_config::PresenceCfg) -> Self {
        Self {
            threshold_cm: c.threshold_cm,
            dwell_ms: c.dwell_ms,
        }
    }
}

impl From<&gripper_config::SideButtonCfg> for SideButtonCfg {
    fn from(c: &gripper_config::SideButtonCfg) -> Self {
        Self {
            short_min_ms: c.short_min_ms,
            short_max_ms: c.short_max_ms,
            long_hold_ms: c.long_hold_ms,
        }
    }
}

impl From<gripper_config::SwingStrategy> for SwingKind {
    fn from(s: gripper_config::SwingStrategy) -> Self {
        match s {
            gripper_config::SwingStrategy::Threshold => Self::Threshold,
            gripper_config::SwingStrategy::Periodic => Self::Periodic,
        }
    }
}

impl From<&gripper_config::SwingCfg> for SwingCfg {
    fn from(c: &gripper_config::SwingCfg) -> Self {
        Self {
            kind: c.strategy.into(),
            threshold_deg: c.threshold_deg,
            target_count: c.target_count,
            interval_ms: c.interval_ms,
        }
    }
}

impl From<&gripper_config::TimingCfg> for TimingCfg {
    fn from(c: &gripper_config::TimingCfg) -> Self {
        Self {
            tick_ms: c.tick_ms,
            settle_ms: c.settle_ms,
            calibration_ms: c.calibration_ms,
            startup_calibration_ms: c.startup_calibration_ms,
        }
    }
}

impl From<&gripper_config::Timeouts> for Timeouts {
    fn from(c: &gripper_config::Timeouts) -> Self {
        Self {
            sensor_stall_ms: c.sensor_stall_ms,
        }
    }
}

impl From<&gripper_config::Config> for GripperCfg {
    fn from(c: &gripper_config::Config) -> Self {
        Self {
            grasp: (&c.grasp).into(),
            release: (&c.release).into(),
            presence: (&c.presence).into(),
            side_button: (&c.side_button).into(),
            swing: (&c.swing).into(),
            timing: (&c.timing).into(),
        }
    }
}
