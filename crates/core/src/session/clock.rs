//! Per-side countdown clock

use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// Remaining time for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockValue {
    /// Untimed games never run out.
    Unbounded,
    Remaining(u32),
}

impl ClockValue {
    pub fn seconds(self) -> Option<u32> {
        match self {
            ClockValue::Unbounded => None,
            ClockValue::Remaining(s) => Some(s),
        }
    }

    pub fn is_flagged(self) -> bool {
        self == ClockValue::Remaining(0)
    }

    fn decrement(self) -> Self {
        match self {
            ClockValue::Unbounded => ClockValue::Unbounded,
            ClockValue::Remaining(s) => ClockValue::Remaining(s.saturating_sub(1)),
        }
    }

    /// "mm:ss", or "--:--" when untimed.
    pub fn display(self) -> String {
        match self {
            ClockValue::Unbounded => "--:--".to_string(),
            ClockValue::Remaining(s) => format!("{:02}:{:02}", s / 60, s % 60),
        }
    }
}

/// Timing choice made at game setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimeControl {
    Untimed,
    Timed { minutes: u32 },
}

impl TimeControl {
    pub const MIN_MINUTES: u32 = 1;
    pub const MAX_MINUTES: u32 = 60;

    /// Mirrors the setup form: minutes are clamped to 1..=60.
    pub fn timed(minutes: u32) -> Self {
        TimeControl::Timed {
            minutes: minutes.clamp(Self::MIN_MINUTES, Self::MAX_MINUTES),
        }
    }

    pub fn is_timed(self) -> bool {
        matches!(self, TimeControl::Timed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    white: ClockValue,
    black: ClockValue,
    state: ClockState,
}

impl Clock {
    pub fn untimed() -> Self {
        Self {
            white: ClockValue::Unbounded,
            black: ClockValue::Unbounded,
            state: ClockState::Stopped,
        }
    }

    pub fn new(control: TimeControl) -> Self {
        match control {
            TimeControl::Untimed => Self::untimed(),
            TimeControl::Timed { minutes } => {
                let seconds = minutes.saturating_mul(60);
                Self::with_seconds(seconds, seconds)
            }
        }
    }

    /// Seeds both sides, e.g. from a resumed session.
    pub fn with_seconds(white: u32, black: u32) -> Self {
        Self {
            white: ClockValue::Remaining(white),
            black: ClockValue::Remaining(black),
            state: ClockState::Stopped,
        }
    }

    pub fn is_timed(&self) -> bool {
        self.white != ClockValue::Unbounded || self.black != ClockValue::Unbounded
    }

    pub fn value(&self, color: Color) -> ClockValue {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Starts or stops the clock. An untimed clock never runs.
    pub fn set_running(&mut self, running: bool) {
        self.state = if running && self.is_timed() {
            ClockState::Running
        } else {
            ClockState::Stopped
        };
    }

    /// One second elapses for the side on move. Returns false when stopped.
    pub fn tick(&mut self, on_move: Color) -> bool {
        if !self.is_running() {
            return false;
        }
        match on_move {
            Color::White => self.white = self.white.decrement(),
            Color::Black => self.black = self.black.decrement(),
        }
        true
    }
}
