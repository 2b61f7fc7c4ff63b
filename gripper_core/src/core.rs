//! The hand state machine (`GripperCore`).
//!
//! Each tick takes one [`SensorSample`], runs it through the presence
//! debounce, the swing strategy and the side-button classifier, and commits
//! at most one grasp or release plus at most one side-button action. Grasp
//! and release only change `HandState` when the actuator reports success.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use gripper_traits::{Actuator, Clock, Sensors, StopSignal};

use crate::actuation::Hand;
use crate::config::GripperCfg;
use crate::debounce::{ButtonState, DebounceTimer, Edge, PressEvent, SideButtonTracker};
use crate::error::Result;
use crate::hw_error::map_sensor_error;
use crate::sample::SensorSample;
use crate::status::{Action, ControlStatus, HandState, Stats, Trigger};
use crate::swing::SwingStrategy;

/// Unified core for both dynamic (boxed) and generic (static dispatch) variants.
///
/// Motors are stopped on drop unless [`GripperCore::shutdown`] already ran.
pub struct GripperCore<A: Actuator, S: Sensors> {
    pub(crate) hand: Hand<A>,
    pub(crate) sensors: S,
    pub(crate) cfg: GripperCfg,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) stop_signal: Option<Box<dyn StopSignal>>,

    pub(crate) state: HandState,
    pub(crate) presence: DebounceTimer,
    pub(crate) side: SideButtonTracker,
    pub(crate) swing: Box<dyn SwingStrategy>,
    pub(crate) stats: Stats,
    pub(crate) stop_latched: bool,
    pub(crate) motors_stopped: bool,
}

impl<A: Actuator, S: Sensors> core::fmt::Debug for GripperCore<A, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GripperCore")
            .field("state", &self.state)
            .field("swing", &self.swing.name())
            .field("swing_count", &self.swing.count())
            .field("side_button", &self.side.state())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<A: Actuator, S: Sensors> GripperCore<A, S> {
    pub fn state(&self) -> HandState {
        self.state
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn cfg(&self) -> &GripperCfg {
        &self.cfg
    }

    pub fn swing_count(&self) -> u32 {
        self.swing.count()
    }

    pub fn side_button_state(&self) -> ButtonState {
        self.side.state()
    }

    pub fn presence_armed(&self) -> bool {
        self.presence.is_armed()
    }

    pub fn actuator(&self) -> &A {
        self.hand.actuator()
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    /// Zero the orientation sensor, wait for it to settle, and reset all
    /// per-run state. Call once before the first tick.
    pub fn begin(&mut self) -> Result<()> {
        self.calibrate_orientation()?;
        self.clock
            .sleep(Duration::from_millis(self.cfg.timing.startup_calibration_ms));

        let angle = self.read_orientation()?;
        self.state = HandState::Open;
        self.presence.reset();
        self.side = SideButtonTracker::new(&self.cfg.side_button);
        self.swing.reset(angle, self.clock.now());
        self.stop_latched = false;
        self.motors_stopped = false;
        tracing::info!(
            swing = self.swing.name(),
            tick_ms = self.cfg.timing.tick_ms,
            "gripper ready"
        );
        Ok(())
    }

    /// One iteration of the control loop: poll the stop signal, read every
    /// sensor, act, then sleep one tick.
    pub fn step(&mut self) -> Result<ControlStatus> {
        if self.stop_requested() {
            return Ok(self.stop_now());
        }
        let sample = SensorSample::read(&mut self.sensors, &*self.clock)?;
        let actions = self.process(sample)?;
        self.clock.sleep(self.cfg.timing.tick());
        Ok(ControlStatus::Running(actions))
    }

    /// Process a pre-sampled snapshot (for sampler integration). Does not sleep.
    pub fn step_from_sample(&mut self, sample: SensorSample) -> Result<ControlStatus> {
        if self.stop_requested() {
            return Ok(self.stop_now());
        }
        let actions = self.process(sample)?;
        Ok(ControlStatus::Running(actions))
    }

    /// Poll the stop signal. Latches: once true, stays true until `begin()`.
    pub fn stop_requested(&mut self) -> bool {
        if !self.stop_latched
            && let Some(signal) = &self.stop_signal
            && signal.is_stop_requested()
        {
            tracing::info!("stop requested");
            self.stop_latched = true;
        }
        self.stop_latched
    }

    /// De-energize every motor.
    pub fn shutdown(&mut self) -> Result<()> {
        let res = self.hand.stop_all();
        self.motors_stopped = true;
        tracing::info!(state = self.state.as_str(), "motors stopped");
        res
    }

    // ── Private: one tick of the state machine ───────────────────────────────

    fn stop_now(&mut self) -> ControlStatus {
        if let Err(e) = self.shutdown() {
            tracing::warn!(error = %e, "stop_all failed on stop request");
        }
        ControlStatus::Stopped
    }

    fn process(&mut self, sample: SensorSample) -> Result<Vec<Action>> {
        self.stats.ticks += 1;
        tracing::trace!(
            distance_cm = sample.distance_cm,
            palm = sample.palm_pressed,
            side = sample.side_pressed,
            angle = sample.orientation_deg,
            "tick"
        );
        let mut actions = Vec::new();

        // Set once this tick has tried a grasp or a release.
        let mut attempted = false;
        match self.state {
            HandState::Open => {
                let near = sample.distance_cm < self.cfg.presence.threshold_cm;
                let trigger = match self.presence.update(near, sample.timestamp) {
                    Edge::Confirmed => Some(Trigger::Presence),
                    Edge::None if sample.palm_pressed => Some(Trigger::Palm),
                    Edge::None => None,
                };
                if let Some(trigger) = trigger {
                    actions.push(self.try_grasp(trigger)?);
                    attempted = true;
                }
            }
            HandState::Closed => {
                if self.swing.observe(sample.orientation_deg, sample.timestamp) {
                    actions.push(self.swing_release()?);
                    attempted = true;
                }
            }
        }

        match self.side.update(sample.side_pressed, sample.timestamp) {
            PressEvent::ShortClick if self.state == HandState::Closed && attempted => {
                // Swing progress was already reset by this tick's grasp or release.
                tracing::debug!("side click dropped; hand already acted this tick");
            }
            PressEvent::ShortClick if self.state == HandState::Closed => {
                actions.push(self.try_release(Trigger::SideClick));
                self.swing.reset(sample.orientation_deg, sample.timestamp);
            }
            PressEvent::LongHold => actions.push(self.rebase()),
            PressEvent::ShortClick | PressEvent::None => {}
        }

        Ok(actions)
    }

    fn try_grasp(&mut self, trigger: Trigger) -> Result<Action> {
        self.presence.reset();
        let action = match self.hand.grasp() {
            Ok(()) => {
                self.state = HandState::Closed;
                self.stats.grasps += 1;
                tracing::info!(trigger = trigger.as_str(), "grasped");
                let angle = self.read_orientation()?;
                self.swing.reset(angle, self.clock.now());
                Action::Grasped { trigger }
            }
            Err(error) => {
                self.stats.grasp_failures += 1;
                tracing::warn!(trigger = trigger.as_str(), error = %error, "grasp failed; staying open");
                Action::GraspFailed { trigger, error }
            }
        };
        self.clock
            .sleep(Duration::from_millis(self.cfg.grasp.cooldown_ms));
        Ok(action)
    }

    fn try_release(&mut self, trigger: Trigger) -> Action {
        match self.hand.release() {
            Ok(()) => {
                self.state = HandState::Open;
                self.presence.reset();
                self.stats.releases += 1;
                tracing::info!(trigger = trigger.as_str(), "released");
                Action::Released { trigger }
            }
            Err(error) => {
                self.stats.release_failures += 1;
                tracing::warn!(trigger = trigger.as_str(), error = %error, "release failed; staying closed");
                Action::ReleaseFailed { trigger, error }
            }
        }
    }

    /// Settle, release, then re-zero the orientation sensor and let it settle.
    /// Runs in full even when the release itself fails.
    fn swing_release(&mut self) -> Result<Action> {
        tracing::info!(
            target = self.cfg.swing.target_count,
            "swing gesture complete"
        );
        self.clock
            .sleep(Duration::from_millis(self.cfg.timing.settle_ms));
        let action = self.try_release(Trigger::Swing);
        self.calibrate_orientation()?;
        self.swing.reset(0.0, self.clock.now());
        self.clock
            .sleep(Duration::from_millis(self.cfg.timing.calibration_ms));
        Ok(action)
    }

    fn rebase(&mut self) -> Action {
        match self.hand.reset_reference() {
            Ok(()) => {
                self.stats.rebases += 1;
                tracing::info!(state = self.state.as_str(), "motor positions rebased");
                Action::Rebased
            }
            Err(error) => {
                tracing::warn!(error = %error, "rebase failed");
                Action::RebaseFailed { error }
            }
        }
    }

    fn read_orientation(&mut self) -> Result<f64> {
        self.sensors
            .read_orientation_deg()
            .map_err(|e| eyre::Report::new(map_sensor_error(&*e)))
            .wrap_err("reading orientation")
    }

    fn calibrate_orientation(&mut self) -> Result<()> {
        self.sensors
            .calibrate_orientation_zero()
            .map_err(|e| eyre::Report::new(map_sensor_error(&*e)))
            .wrap_err("calibrating orientation")
    }
}

impl<A: Actuator, S: Sensors> Drop for GripperCore<A, S> {
    fn drop(&mut self) {
        if !self.motors_stopped && self.hand.stop_all().is_err() {
            tracing::warn!("motor stop on drop failed");
        }
    }
}
