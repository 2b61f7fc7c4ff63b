//! Configuration types for the gripper controller.
//!
//! These are the runtime configuration structs used by `GripperCore`.
//! They are separate from the TOML-deserialized config in `gripper_config`.

use std::time::Duration;

/// Motor commands for a grasp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraspCfg {
    /// Finger speed, percent of rated maximum.
    pub finger_speed_percent: i8,
    /// Relative finger travel in degrees (sign gives direction).
    pub finger_degrees: i32,
    pub thumb_speed_percent: i8,
    pub thumb_degrees: i32,
    /// Refractory pause after every grasp attempt.
    pub cooldown_ms: u64,
}

impl Default for GraspCfg {
    fn default() -> Self {
        Self {
            finger_speed_percent: 15,
            finger_degrees: -400,
            thumb_speed_percent: 5,
            thumb_degrees: 200,
            cooldown_ms: 1000,
        }
    }
}

/// Motor commands for a release: every motor returns to its zero reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseCfg {
    pub speed_percent: i8,
}

impl Default for ReleaseCfg {
    fn default() -> Self {
        Self { speed_percent: 15 }
    }
}

/// Object-presence debounce on the distance sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenceCfg {
    /// Present while `distance_cm < threshold_cm`.
    pub threshold_cm: f64,
    /// Presence must hold continuously for longer than this.
    pub dwell_ms: u64,
}

impl Default for PresenceCfg {
    fn default() -> Self {
        Self {
            threshold_cm: 5.0,
            dwell_ms: 2000,
        }
    }
}

/// Side-button press classification windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideButtonCfg {
    /// Short click: `short_min_ms < held < short_max_ms`, classified on release.
    pub short_min_ms: u64,
    pub short_max_ms: u64,
    /// Long hold: held for at least this long, classified while still pressed.
    pub long_hold_ms: u64,
}

impl Default for SideButtonCfg {
    fn default() -> Self {
        Self {
            short_min_ms: 100,
            short_max_ms: 2000,
            long_hold_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwingKind {
    /// Count every crossing past ±threshold, evaluated each tick.
    #[default]
    Threshold,
    /// Compare angle deltas once per interval and count reversals.
    Periodic,
}

impl SwingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::Periodic => "periodic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingCfg {
    pub kind: SwingKind,
    pub threshold_deg: f64,
    pub target_count: u32,
    /// Only used by `SwingKind::Periodic`.
    pub interval_ms: u64,
}

impl Default for SwingCfg {
    fn default() -> Self {
        Self {
            kind: SwingKind::Threshold,
            threshold_deg: 85.0,
            target_count: 3,
            interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingCfg {
    /// Control loop period.
    pub tick_ms: u64,
    /// Pause between a completed swing gesture and the release it triggers.
    pub settle_ms: u64,
    /// Pause after re-zeroing the orientation sensor following a swing release.
    pub calibration_ms: u64,
    /// Pause after zeroing the orientation sensor in `begin()`.
    pub startup_calibration_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            settle_ms: 1500,
            calibration_ms: 3000,
            startup_calibration_ms: 2000,
        }
    }
}

impl TimingCfg {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Everything the hand state machine needs, bundled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GripperCfg {
    pub grasp: GraspCfg,
    pub release: ReleaseCfg,
    pub presence: PresenceCfg,
    pub side_button: SideButtonCfg,
    pub swing: SwingCfg,
    pub timing: TimingCfg,
}

/// Runner-level timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Sampler mode: abort once no snapshot has arrived for this long. 0 disables.
    pub sensor_stall_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            sensor_stall_ms: 1000,
        }
    }
}
