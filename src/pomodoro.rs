//! Pomodoro timer state machine.
//!
//! The timer is driven by [`PomodoroTimer::tick`]; it never reads the clock
//! itself, so callers decide how time passes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PomodoroState {
    Idle,
    Work,
    ShortBreak,
    LongBreak,
}

impl PomodoroState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Work => "Focus",
            Self::ShortBreak => "Short break",
            Self::LongBreak => "Long break",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PomodoroConfig {
    pub work_minutes: u64,
    pub short_break_minutes: u64,
    pub long_break_minutes: u64,
    /// Every N-th completed work session is followed by a long break.
    pub sessions_until_long_break: u32,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_until_long_break: 4,
        }
    }
}

impl PomodoroConfig {
    pub fn duration_of(&self, state: PomodoroState) -> Duration {
        let minutes = match state {
            PomodoroState::Work | PomodoroState::Idle => self.work_minutes,
            PomodoroState::ShortBreak => self.short_break_minutes,
            PomodoroState::LongBreak => self.long_break_minutes,
        };
        Duration::from_secs(minutes * 60)
    }
}

#[derive(Debug, Clone)]
pub struct PomodoroTimer {
    config: PomodoroConfig,
    state: PomodoroState,
    remaining: Duration,
    running: bool,
    completed_sessions: u32,
}

impl PomodoroTimer {
    pub fn new(config: PomodoroConfig) -> Self {
        let remaining = config.duration_of(PomodoroState::Idle);
        Self {
            config,
            state: PomodoroState::Idle,
            remaining,
            running: false,
            completed_sessions: 0,
        }
    }

    pub fn state(&self) -> PomodoroState {
        self.state
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    /// Start or resume. From idle this begins a work session.
    pub fn start(&mut self) {
        if self.state == PomodoroState::Idle {
            self.state = PomodoroState::Work;
            self.remaining = self.config.duration_of(PomodoroState::Work);
        }
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Back to idle with a full work session queued and the session count cleared.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// End the current phase now and move to the next one.
    pub fn skip(&mut self) -> PomodoroState {
        self.advance()
    }

    /// Let `elapsed` pass. Returns the new phase if the current one finished.
    ///
    /// Time left over after a phase ends is dropped; the next phase starts full.
    pub fn tick(&mut self, elapsed: Duration) -> Option<PomodoroState> {
        if !self.running || self.state == PomodoroState::Idle {
            return None;
        }

        if elapsed < self.remaining {
            self.remaining -= elapsed;
            None
        } else {
            Some(self.advance())
        }
    }

    /// Fraction of the current phase still remaining, `1.0` at the start.
    pub fn progress(&self) -> f32 {
        let total = self.config.duration_of(self.state).as_secs_f32();
        if total > 0.0 {
            self.remaining.as_secs_f32() / total
        } else {
            0.0
        }
    }

    /// Remaining time as `MM:SS`.
    pub fn format_remaining(&self) -> String {
        let secs = self.remaining.as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    fn advance(&mut self) -> PomodoroState {
        self.state = match self.state {
            PomodoroState::Work => {
                self.completed_sessions += 1;
                let every = self.config.sessions_until_long_break.max(1);
                if self.completed_sessions % every == 0 {
                    PomodoroState::LongBreak
                } else {
                    PomodoroState::ShortBreak
                }
            }
            PomodoroState::ShortBreak | PomodoroState::LongBreak | PomodoroState::Idle => {
                PomodoroState::Work
            }
        };
        self.remaining = self.config.duration_of(self.state);
        self.state
    }
}
