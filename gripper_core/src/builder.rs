//! Type-state builder for `Gripper` and generic `build_gripper` constructor.
//!
//! The builder enforces at compile time that an actuator and sensors are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use gripper_traits::{Actuator, Clock, MonotonicClock, Sensors, StopSignal};

use crate::actuation::Hand;
use crate::config::*;
use crate::core::GripperCore;
use crate::debounce::{ButtonState, DebounceTimer, SideButtonTracker};
use crate::error::{BuildError, Result};
use crate::sample::SensorSample;
use crate::status::{ControlStatus, HandState, Stats};
use crate::swing::{self, SwingStrategy};

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Boxed gripper controller for callers that pick backends at runtime.
pub struct Gripper {
    pub(crate) inner: GripperCore<Box<dyn Actuator>, Box<dyn Sensors>>,
}

impl core::fmt::Debug for Gripper {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Gripper")
            .field("state", &self.inner.state)
            .field("swing_count", &self.inner.swing_count())
            .field("stats", &self.inner.stats)
            .finish()
    }
}

impl Gripper {
    /// Start building a Gripper.
    pub fn builder() -> GripperBuilder<Missing, Missing> {
        GripperBuilder::default()
    }

    pub fn state(&self) -> HandState {
        self.inner.state()
    }

    pub fn stats(&self) -> Stats {
        self.inner.stats()
    }

    pub fn swing_count(&self) -> u32 {
        self.inner.swing_count()
    }

    pub fn side_button_state(&self) -> ButtonState {
        self.inner.side_button_state()
    }

    /// Calibrate the orientation sensor and reset per-run state.
    pub fn begin(&mut self) -> Result<()> {
        self.inner.begin()
    }

    /// One iteration of the control loop.
    pub fn step(&mut self) -> Result<ControlStatus> {
        self.inner.step()
    }

    /// Process a pre-sampled snapshot (for sampler integration).
    pub fn step_from_sample(&mut self, sample: SensorSample) -> Result<ControlStatus> {
        self.inner.step_from_sample(sample)
    }

    /// Stop every motor.
    pub fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Gripper`. All fields are validated on `build()`.
pub struct GripperBuilder<A, S> {
    actuator: Option<Box<dyn Actuator>>,
    sensors: Option<Box<dyn Sensors>>,
    cfg: GripperCfg,
    stop_signal: Option<Box<dyn StopSignal>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    swing: Option<Box<dyn SwingStrategy>>,
    _a: PhantomData<A>,
    _s: PhantomData<S>,
}

impl Default for GripperBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            actuator: None,
            sensors: None,
            cfg: GripperCfg::default(),
            stop_signal: None,
            clock: None,
            swing: None,
            _a: PhantomData,
            _s: PhantomData,
        }
    }
}

fn check_speed(v: i8, msg: &'static str) -> Result<()> {
    if v == 0 || v.unsigned_abs() > 100 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(msg)));
    }
    Ok(())
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Reject physically meaningless thresholds and durations.
pub fn validate_cfg(cfg: &GripperCfg) -> Result<()> {
    check_speed(
        cfg.grasp.finger_speed_percent,
        "finger speed must be in -100..=100 and non-zero",
    )?;
    check_speed(
        cfg.grasp.thumb_speed_percent,
        "thumb speed must be in -100..=100 and non-zero",
    )?;
    check_speed(
        cfg.release.speed_percent,
        "release speed must be in -100..=100 and non-zero",
    )?;
    if !cfg.presence.threshold_cm.is_finite() || cfg.presence.threshold_cm <= 0.0 {
        return Err(invalid("presence threshold must be finite and > 0"));
    }
    let sb = &cfg.side_button;
    if sb.short_min_ms >= sb.short_max_ms || sb.short_max_ms > sb.long_hold_ms {
        return Err(invalid(
            "side button windows must satisfy short_min < short_max <= long_hold",
        ));
    }
    if !cfg.swing.threshold_deg.is_finite() || cfg.swing.threshold_deg <= 0.0 {
        return Err(invalid("swing threshold must be finite and > 0"));
    }
    if cfg.swing.target_count == 0 {
        return Err(invalid("swing target count must be >= 1"));
    }
    if cfg.swing.kind == SwingKind::Periodic && cfg.swing.interval_ms == 0 {
        return Err(invalid("periodic swing interval must be >= 1 ms"));
    }
    if !(1..=1000).contains(&cfg.timing.tick_ms) {
        return Err(invalid("tick must be in 1..=1000 ms"));
    }
    Ok(())
}

/// Validate configuration and construct a `GripperCore`.
///
/// Used by both `GripperBuilder::try_build()` and `build_gripper()`.
fn validate_and_build<A: Actuator, S: Sensors>(
    actuator: A,
    sensors: S,
    cfg: GripperCfg,
    stop_signal: Option<Box<dyn StopSignal>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    swing: Option<Box<dyn SwingStrategy>>,
) -> Result<GripperCore<A, S>> {
    validate_cfg(&cfg)?;

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let swing = swing.unwrap_or_else(|| swing::from_cfg(&cfg.swing, 0.0, clock.now()));

    Ok(GripperCore {
        hand: Hand::new(actuator, cfg.grasp, cfg.release),
        sensors,
        presence: DebounceTimer::new(std::time::Duration::from_millis(cfg.presence.dwell_ms)),
        side: SideButtonTracker::new(&cfg.side_button),
        cfg,
        clock,
        stop_signal,
        state: HandState::Open,
        swing,
        stats: Stats::default(),
        stop_latched: false,
        motors_stopped: false,
    })
}

impl<A, S> GripperBuilder<A, S> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Gripper> {
        let actuator = self
            .actuator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let sensors = self
            .sensors
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensors))?;

        let inner = validate_and_build(
            actuator,
            sensors,
            self.cfg,
            self.stop_signal,
            self.clock,
            self.swing,
        )?;
        Ok(Gripper { inner })
    }
}

/// Chainable setters that do not affect type-state.
impl<A, S> GripperBuilder<A, S> {
    pub fn with_cfg(mut self, cfg: GripperCfg) -> Self {
        self.cfg = cfg;
        self
    }
    pub fn with_grasp(mut self, grasp: GraspCfg) -> Self {
        self.cfg.grasp = grasp;
        self
    }
    pub fn with_release(mut self, release: ReleaseCfg) -> Self {
        self.cfg.release = release;
        self
    }
    pub fn with_presence(mut self, presence: PresenceCfg) -> Self {
        self.cfg.presence = presence;
        self
    }
    pub fn with_side_button(mut self, side_button: SideButtonCfg) -> Self {
        self.cfg.side_button = side_button;
        self
    }
    pub fn with_swing(mut self, swing: SwingCfg) -> Self {
        self.cfg.swing = swing;
        self
    }
    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.cfg.timing = timing;
        self
    }
    pub fn with_stop_signal(mut self, signal: impl StopSignal + 'static) -> Self {
        self.stop_signal = Some(Box::new(signal));
        self
    }
    /// Replace the swing strategy chosen from `SwingCfg::kind`.
    pub fn with_swing_strategy(mut self, strategy: Box<dyn SwingStrategy>) -> Self {
        self.swing = Some(strategy);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<S> GripperBuilder<Missing, S> {
    pub fn with_actuator(self, actuator: impl Actuator + 'static) -> GripperBuilder<Set, S> {
        GripperBuilder {
            actuator: Some(Box::new(actuator)),
            sensors: self.sensors,
            cfg: self.cfg,
            stop_signal: self.stop_signal,
            clock: self.clock,
            swing: self.swing,
            _a: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<A> GripperBuilder<A, Missing> {
    pub fn with_sensors(self, sensors: impl Sensors + 'static) -> GripperBuilder<A, Set> {
        GripperBuilder {
            actuator: self.actuator,
            sensors: Some(Box::new(sensors)),
            cfg: self.cfg,
            stop_signal: self.stop_signal,
            clock: self.clock,
            swing: self.swing,
            _a: PhantomData,
            _s: PhantomData,
        }
    }
}

impl GripperBuilder<Set, Set> {
    /// Validate and build. Only available once actuator and sensors are set.
    pub fn build(self) -> Result<Gripper> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias using the unified core.
pub type GripperG<A, S> = GripperCore<A, S>;

/// Build a generic, statically-dispatched `GripperG` from concrete backends.
pub fn build_gripper<A, S>(
    actuator: A,
    sensors: S,
    cfg: GripperCfg,
    stop_signal: Option<Box<dyn StopSignal>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<GripperG<A, S>>
where
    A: Actuator + 'static,
    S: Sensors + 'static,
{
    validate_and_build(actuator, sensors, cfg, stop_signal, clock, None)
}
