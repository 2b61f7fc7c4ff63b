//! Swing gesture detection on the orientation sensor.
//!
//! Two strategies count back-and-forth wrist swings while the hand is closed.
//! Both return `true` from [`SwingStrategy::observe`] exactly on the sample
//! that completes the gesture, and clear their own progress at that moment.

use std::time::{Duration, Instant};

use crate::config::{SwingCfg, SwingKind};

pub trait SwingStrategy {
    /// Feed one orientation sample. Returns true when the target count is
    /// reached; the count is back at zero by the time this returns.
    fn observe(&mut self, angle_deg: f64, now: Instant) -> bool;
    /// Drop all progress and take `angle_deg` at `now` as the new baseline.
    fn reset(&mut self, angle_deg: f64, now: Instant);
    fn count(&self) -> u32;
    fn name(&self) -> &'static str;
}

/// Build the strategy selected in `cfg`, baselined at `angle_deg`.
pub fn from_cfg(cfg: &SwingCfg, angle_deg: f64, now: Instant) -> Box<dyn SwingStrategy> {
    match cfg.kind {
        SwingKind::Threshold => Box::new(ThresholdCrossing::new(cfg.threshold_deg, cfg.target_count)),
        SwingKind::Periodic => Box::new(PeriodicDelta::new(
            cfg.threshold_deg,
            cfg.target_count,
            Duration::from_millis(cfg.interval_ms),
            angle_deg,
            now,
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Center,
    Positive,
    Negative,
}

/// Counts every crossing past ±threshold, including the first one out of
/// `Center`. Once latched on one side, only a crossing to the opposite side
/// counts.
#[derive(Debug, Clone)]
pub struct ThresholdCrossing {
    phase: Phase,
    count: u32,
    threshold_deg: f64,
    target_count: u32,
}

impl ThresholdCrossing {
    pub fn new(threshold_deg: f64, target_count: u32) -> Self {
        Self {
            phase: Phase::Center,
            count: 0,
            threshold_deg,
            target_count,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl SwingStrategy for ThresholdCrossing {
    fn observe(&mut self, angle_deg: f64, now: Instant) -> bool {
        let above = angle_deg > self.threshold_deg;
        let below = angle_deg < -self.threshold_deg;
        let next = match self.phase {
            Phase::Center if above => Phase::Positive,
            Phase::Center if below => Phase::Negative,
            Phase::Positive if below => Phase::Negative,
            Phase::Negative if above => Phase::Positive,
            _ => return false,
        };
        self.phase = next;
        self.count += 1;
        tracing::debug!(count = self.count, angle_deg, "swing crossing");
        if self.count >= self.target_count {
            self.reset(angle_deg, now);
            return true;
        }
        false
    }

    fn reset(&mut self, _angle_deg: f64, _now: Instant) {
        self.phase = Phase::Center;
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn name(&self) -> &'static str {
        SwingKind::Threshold.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    None,
    Positive,
    Negative,
}

/// Samples the angle once per `interval` and counts reversals: a change
/// beyond the threshold latches a direction, and a later change beyond the
/// threshold the other way counts one and clears it.
#[derive(Debug, Clone)]
pub struct PeriodicDelta {
    last_angle: f64,
    last_check: Instant,
    direction: Direction,
    count: u32,
    threshold_deg: f64,
    target_count: u32,
    interval: Duration,
}

impl PeriodicDelta {
    pub fn new(
        threshold_deg: f64,
        target_count: u32,
        interval: Duration,
        angle_deg: f64,
        now: Instant,
    ) -> Self {
        Self {
            last_angle: angle_deg,
            last_check: now,
            direction: Direction::None,
            count: 0,
            threshold_deg,
            target_count,
            interval,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn count_reversal(&mut self, delta: f64) {
        self.count += 1;
        self.direction = Direction::None;
        tracing::debug!(count = self.count, delta, "swing reversal");
    }
}

impl SwingStrategy for PeriodicDelta {
    fn observe(&mut self, angle_deg: f64, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_check) < self.interval {
            return false;
        }
        let delta = angle_deg - self.last_angle;
        let up = delta > self.threshold_deg;
        let down = delta < -self.threshold_deg;
        match self.direction {
            Direction::None if up => self.direction = Direction::Positive,
            Direction::None if down => self.direction = Direction::Negative,
            Direction::Positive if down => self.count_reversal(delta),
            Direction::Negative if up => self.count_reversal(delta),
            _ => {}
        }
        self.last_check = now;
        self.last_angle = angle_deg;

        if self.count >= self.target_count {
            self.count = 0;
            self.direction = Direction::None;
            return true;
        }
        false
    }

    fn reset(&mut self, angle_deg: f64, now: Instant) {
        self.last_angle = angle_deg;
        self.last_check = now;
        self.direction = Direction::None;
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn name(&self) -> &'static str {
        SwingKind::Periodic.as_str()
    }
}
