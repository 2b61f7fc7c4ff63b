//! Debounced events from raw sensor samples.
//!
//! [`DebounceTimer`] confirms a condition that held continuously for longer
//! than a dwell time (object presence on the distance sensor).
//! [`SideButtonTracker`] classifies press durations on the side contact into
//! short clicks and long holds.

use std::time::{Duration, Instant};

use crate::config::SideButtonCfg;

/// Result of feeding one sample to a [`DebounceTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    None,
    Confirmed,
}

/// One-shot debounce: armed on the first true sample, disarmed on any false
/// sample, and disarmed again after it confirms.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    started_at: Option<Instant>,
    required: Duration,
}

impl DebounceTimer {
    pub fn new(required: Duration) -> Self {
        Self {
            started_at: None,
            required,
        }
    }

    pub fn update(&mut self, condition: bool, now: Instant) -> Edge {
        if !condition {
            self.started_at = None;
            return Edge::None;
        }
        match self.started_at {
            None => {
                self.started_at = Some(now);
                Edge::None
            }
            Some(since) if now.saturating_duration_since(since) > self.required => {
                self.started_at = None;
                Edge::Confirmed
            }
            Some(_) => Edge::None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn armed_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn reset(&mut self) {
        self.started_at = None;
    }
}

/// Long holds are checked once per tick, so one fires at most this many tick
/// periods after the hold threshold is crossed.
pub const LONG_HOLD_TOLERANCE_TICKS: u32 = 1;

/// Latest moment a long hold may be reported, given the tick period.
pub fn long_hold_deadline(long_hold: Duration, tick: Duration) -> Duration {
    long_hold + tick * LONG_HOLD_TOLERANCE_TICKS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Released,
    Pressing,
    /// The long-hold action already ran for the current press.
    ActionTaken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressEvent {
    None,
    ShortClick,
    LongHold,
}

/// `Released -> Pressing -> {ActionTaken | Released}`; `ActionTaken` only
/// leaves to `Released`.
#[derive(Debug, Clone)]
pub struct SideButtonTracker {
    state: ButtonState,
    pressed_at: Option<Instant>,
    short_min: Duration,
    short_max: Duration,
    long_hold: Duration,
}

impl SideButtonTracker {
    pub fn new(cfg: &SideButtonCfg) -> Self {
        Self {
            state: ButtonState::Released,
            pressed_at: None,
            short_min: Duration::from_millis(cfg.short_min_ms),
            short_max: Duration::from_millis(cfg.short_max_ms),
            long_hold: Duration::from_millis(cfg.long_hold_ms),
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn update(&mut self, pressed: bool, now: Instant) -> PressEvent {
        match (pressed, self.state) {
            (true, ButtonState::Released) => {
                self.state = ButtonState::Pressing;
                self.pressed_at = Some(now);
                PressEvent::None
            }
            (true, ButtonState::Pressing) => {
                let held = self.held_for(now);
                if held >= self.long_hold {
                    self.state = ButtonState::ActionTaken;
                    tracing::debug!(held_ms = held.as_millis() as u64, "side button long hold");
                    PressEvent::LongHold
                } else {
                    PressEvent::None
                }
            }
            (true, ButtonState::ActionTaken) => PressEvent::None,
            (false, ButtonState::Pressing) => {
                let held = self.held_for(now);
                self.release();
                if held > self.short_min && held < self.short_max {
                    tracing::debug!(held_ms = held.as_millis() as u64, "side button click");
                    PressEvent::ShortClick
                } else {
                    PressEvent::None
                }
            }
            (false, _) => {
                self.release();
                PressEvent::None
            }
        }
    }

    fn held_for(&self, now: Instant) -> Duration {
        self.pressed_at
            .map_or(Duration::ZERO, |t| now.saturating_duration_since(t))
    }

    fn release(&mut self) {
        self.state = ButtonState::Released;
        self.pressed_at = None;
    }
}
