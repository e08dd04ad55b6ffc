use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Focus,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn is_break(self) -> bool {
        !matches!(self, SessionType::Focus)
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionType::Focus => "focus",
            SessionType::ShortBreak => "short_break",
            SessionType::LongBreak => "long_break",
        };
        f.write_str(s)
    }
}

impl FromStr for SessionType {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "focus" => Ok(SessionType::Focus),
            "short_break" | "short" => Ok(SessionType::ShortBreak),
            "long_break" | "long" => Ok(SessionType::LongBreak),
            other => Err(SchedulingError::invalid_policy(
                "session_type",
                format!("unknown session type '{other}'"),
            )),
        }
    }
}

/// Durations and long-break cadence of a Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    pub focus_duration_secs: u64,
    pub short_break_secs: u64,
    pub long_break_secs: u64,
    pub sessions_before_long_break: u32,
}

impl CycleConfig {
    pub fn from_minutes(focus: u32, short_break: u32, long_break: u32, sessions: u32) -> Self {
        Self {
            focus_duration_secs: u64::from(focus) * 60,
            short_break_secs: u64::from(short_break) * 60,
            long_break_secs: u64::from(long_break) * 60,
            sessions_before_long_break: sessions,
        }
    }

    pub fn duration_for(&self, session_type: SessionType) -> u64 {
        match session_type {
            SessionType::Focus => self.focus_duration_secs,
            SessionType::ShortBreak => self.short_break_secs,
            SessionType::LongBreak => self.long_break_secs,
        }
    }

    /// # Errors
    /// [`SchedulingError::InvalidPolicy`] for a zero duration or cadence.
    pub fn validate(&self) -> Result<(), SchedulingError> {
        let durations = [
            ("cycle.focus_duration", self.focus_duration_secs),
            ("cycle.short_break", self.short_break_secs),
            ("cycle.long_break", self.long_break_secs),
        ];
        for (field, secs) in durations {
            if secs == 0 {
                return Err(SchedulingError::invalid_policy(field, "must be positive"));
            }
        }
        if self.sessions_before_long_break == 0 {
            return Err(SchedulingError::invalid_policy(
                "cycle.sessions_before_long_break",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self::from_minutes(25, 5, 15, 4)
    }
}

/// Whether the next session starts running on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoStartPolicy {
    /// Start a break as soon as a focus session completes.
    #[serde(default = "default_true")]
    pub breaks: bool,
    /// Start focus as soon as a break completes.
    #[serde(default)]
    pub focus: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AutoStartPolicy {
    fn default() -> Self {
        Self {
            breaks: true,
            focus: false,
        }
    }
}

impl AutoStartPolicy {
    pub fn starts(&self, next: SessionType) -> bool {
        if next.is_break() {
            self.breaks
        } else {
            self.focus
        }
    }
}
