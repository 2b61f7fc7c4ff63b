#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core gripper control logic (hardware-agnostic).
//!
//! This crate decides when a three-motor hand grasps and releases. All
//! hardware interactions go through the `gripper_traits::Actuator` and
//! `gripper_traits::Sensors` traits.
//!
//! ## Architecture
//!
//! - **Debounce**: object presence and side-button press classification (`debounce`)
//! - **Swing**: pluggable wrist-swing gesture strategies (`swing`)
//! - **Actuation**: grasp / release / rebase motor sequences (`actuation`)
//! - **State machine**: `Open`/`Closed` hand automaton driven once per tick (`GripperCore`)
//! - **Runner**: direct or sampler-thread loop with guaranteed motor stop (`runner`)
//!
//! A tick never runs a grasp and a release together, and an action only
//! changes `HandState` when the actuator reports success.

pub mod actuation;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod core;
pub mod debounce;
pub mod error;
pub mod hw_error;
pub mod runner;
pub mod sample;
pub mod sampler;
pub mod status;
pub mod swing;
pub mod util;

pub use crate::builder::{Gripper, GripperBuilder, GripperG, Missing, Set, build_gripper};
pub use crate::config::{
    GraspCfg, GripperCfg, PresenceCfg, ReleaseCfg, SideButtonCfg, SwingCfg, SwingKind, TimingCfg,
    Timeouts,
};
pub use crate::core::GripperCore;
pub use crate::debounce::{ButtonState, DebounceTimer, Edge, PressEvent, SideButtonTracker};
pub use crate::error::{BuildError, GripperError};
pub use crate::sample::SensorSample;
pub use crate::status::{Action, ControlStatus, HandState, Stats, Trigger};
pub use crate::swing::{PeriodicDelta, SwingStrategy, ThresholdCrossing};
