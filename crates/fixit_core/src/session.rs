//! Session clock and end conditions.
//!
//! The victory countdown only runs while every machine is working at the
//! same time. It pauses (never resets) when something breaks. An optional
//! time limit ends the session independently.

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::math::Fixed;
use crate::presentation::VictoryView;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The victory countdown reached zero.
    Victory,
    /// The time limit ran out first.
    TimeUp,
}

/// Session-level state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    victory_remaining: Fixed,
    counting: bool,
    elapsed: Fixed,
    time_limit: Option<Fixed>,
    outcome: Option<SessionOutcome>,
}

impl Session {
    /// Start a fresh session.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            victory_remaining: config.victory_duration,
            counting: false,
            elapsed: Fixed::ZERO,
            time_limit: config.time_limit,
            outcome: None,
        }
    }

    /// Advance the clocks by `dt`.
    ///
    /// Returns the outcome on the tick the session ends, and `None` on every
    /// other tick, including all ticks after the end.
    pub fn advance(&mut self, dt: Fixed, all_machines_working: bool) -> Option<SessionOutcome> {
        if self.outcome.is_some() {
            return None;
        }

        self.elapsed += dt;
        self.counting = all_machines_working;
        if all_machines_working {
            self.victory_remaining = (self.victory_remaining - dt).max(Fixed::ZERO);
        }

        let outcome = if self.victory_remaining == Fixed::ZERO {
            Some(SessionOutcome::Victory)
        } else if self.time_limit.is_some_and(|limit| self.elapsed >= limit) {
            Some(SessionOutcome::TimeUp)
        } else {
            None
        };

        if outcome.is_some() {
            self.counting = false;
            self.outcome = outcome;
        }
        outcome
    }

    /// Whether the session has ended.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.outcome.is_some()
    }

    /// How the session ended, if it has.
    #[must_use]
    pub const fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    /// Seconds left on the victory countdown.
    #[must_use]
    pub const fn victory_time_remaining(&self) -> Fixed {
        self.victory_remaining
    }

    /// Seconds since the session started.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Current state of the victory widget.
    #[must_use]
    pub fn view(&self) -> VictoryView {
        VictoryView {
            counting: self.counting,
            seconds_remaining: self.victory_remaining.ceil().to_num::<u32>(),
        }
    }
}
