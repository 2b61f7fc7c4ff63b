//! What the hand is doing, and what each tick did.

use crate::error::GripperError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandState {
    #[default]
    Open,
    Closed,
}

impl HandState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// What caused a grasp or release attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Object held in front of the distance sensor past the dwell time.
    Presence,
    /// Palm contact pressed.
    Palm,
    /// Swing gesture completed.
    Swing,
    /// Short click on the side button.
    SideClick,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Presence => "presence",
            Self::Palm => "palm",
            Self::Swing => "swing",
            Self::SideClick => "side_click",
        }
    }
}

/// One actuator action attempted during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Grasped { trigger: Trigger },
    GraspFailed { trigger: Trigger, error: GripperError },
    Released { trigger: Trigger },
    ReleaseFailed { trigger: Trigger, error: GripperError },
    Rebased,
    RebaseFailed { error: GripperError },
}

/// Public status of a single step of the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlStatus {
    /// Keep going; lists the actions this tick attempted (usually none).
    Running(Vec<Action>),
    /// Stop was requested; every motor has been told to stop.
    Stopped,
}

/// Counters over the life of a controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub ticks: u64,
    pub grasps: u32,
    pub grasp_failures: u32,
    pub releases: u32,
    pub release_failures: u32,
    pub rebases: u32,
}
