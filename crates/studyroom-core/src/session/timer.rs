//! Focus session state machine.
//!
//! The session does not own a clock or a thread. The caller feeds it
//! elapsed seconds through `tick()`, or reconciles against the wall clock
//! with `catch_up()` after the app was suspended.
//!
//! ## State Transitions
//!
//! ```text
//! Running <-> Paused
//! Running -> Completed   (elapsed reaches duration)
//! Running | Paused -> Canceled
//! ```
//!
//! Every command returns a new session; the receiver is never mutated.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{CycleConfig, SessionType};
use crate::error::SchedulingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Running,
    Paused,
    Completed,
    Canceled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Canceled)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Completed => "completed",
            SessionState::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// One run of the focus/break timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    pub session_type: SessionType,
    pub duration_secs: u64,
    pub elapsed_secs: u64,
    pub state: SessionState,
    /// Focus sessions completed earlier in the current cycle.
    pub completed_focus_count: u32,
    pub cycle_config: CycleConfig,
    pub created_at: DateTime<Utc>,
    /// Wall-clock instant the current running stretch began.
    #[serde(default)]
    pub resumed_at: Option<DateTime<Utc>>,
    /// `elapsed_secs` at `resumed_at`.
    #[serde(default)]
    pub elapsed_at_resume: u64,
}

impl FocusSession {
    /// Start a new running session of `session_type`.
    ///
    /// # Errors
    /// [`SchedulingError::InvalidPolicy`] if `cycle_config` is invalid.
    pub fn start<Tz: TimeZone>(
        id: impl Into<String>,
        session_type: SessionType,
        cycle_config: CycleConfig,
        completed_focus_count: u32,
        now: &DateTime<Tz>,
    ) -> Result<Self, SchedulingError> {
        cycle_config.validate()?;
        let now = now.with_timezone(&Utc);
        let session = Self {
            id: id.into(),
            session_type,
            duration_secs: cycle_config.duration_for(session_type),
            elapsed_secs: 0,
            state: SessionState::Running,
            completed_focus_count,
            cycle_config,
            created_at: now,
            resumed_at: Some(now),
            elapsed_at_resume: 0,
        };
        debug!(session = %session.id, %session_type, duration_secs = session.duration_secs, "session started");
        Ok(session)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.duration_secs.saturating_sub(self.elapsed_secs)
    }

    /// 0.0 .. 1.0 progress through the session.
    pub fn progress(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        (self.elapsed_secs as f64 / self.duration_secs as f64).min(1.0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Advance a running session by `delta_secs`.
    ///
    /// Elapsed time is clamped to the duration; reaching it completes the
    /// session. A paused session ignores ticks.
    ///
    /// # Errors
    /// [`SchedulingError::InvalidTransition`] on a completed or canceled session.
    pub fn tick(&self, delta_secs: u64) -> Result<Self, SchedulingError> {
        match self.state {
            SessionState::Running => {
                let elapsed = self
                    .elapsed_secs
                    .saturating_add(delta_secs)
                    .min(self.duration_secs);
                let mut next = Self {
                    elapsed_secs: elapsed,
                    ..self.clone()
                };
                if elapsed == self.duration_secs {
                    next.state = SessionState::Completed;
                    next.resumed_at = None;
                    debug!(session = %self.id, session_type = %self.session_type, "session completed");
                }
                Ok(next)
            }
            SessionState::Paused => Ok(self.clone()),
            state => Err(invalid(state, "tick")),
        }
    }

    /// # Errors
    /// [`SchedulingError::InvalidTransition`] unless running.
    pub fn pause(&self) -> Result<Self, SchedulingError> {
        match self.state {
            SessionState::Running => Ok(Self {
                state: SessionState::Paused,
                resumed_at: None,
                elapsed_at_resume: self.elapsed_secs,
                ..self.clone()
            }),
            state => Err(invalid(state, "pause")),
        }
    }

    /// Resume a paused session; `now` anchors wall-clock catch-up.
    ///
    /// # Errors
    /// [`SchedulingError::InvalidTransition`] unless paused.
    pub fn resume<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Self, SchedulingError> {
        match self.state {
            SessionState::Paused => Ok(Self {
                state: SessionState::Running,
                resumed_at: Some(now.with_timezone(&Utc)),
                elapsed_at_resume: self.elapsed_secs,
                ..self.clone()
            }),
            state => Err(invalid(state, "resume")),
        }
    }

    /// # Errors
    /// [`SchedulingError::InvalidTransition`] on a completed or canceled session.
    pub fn cancel(&self) -> Result<Self, SchedulingError> {
        match self.state {
            SessionState::Running | SessionState::Paused => Ok(Self {
                state: SessionState::Canceled,
                resumed_at: None,
                ..self.clone()
            }),
            state => Err(invalid(state, "cancel")),
        }
    }

    /// Bring elapsed time up to date with the wall clock.
    ///
    /// Elapsed becomes `elapsed_at_resume + (now - resumed_at)`, so ticks
    /// missed while the process was suspended are recovered. Never moves
    /// elapsed backwards; paused and terminal sessions are returned as-is.
    pub fn catch_up<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Self {
        let Some(resumed_at) = self.resumed_at else {
            return self.clone();
        };
        if self.state != SessionState::Running {
            return self.clone();
        }
        let since = now
            .with_timezone(&Utc)
            .signed_duration_since(resumed_at)
            .num_seconds()
            .max(0) as u64;
        let target = self.elapsed_at_resume.saturating_add(since);
        if target <= self.elapsed_secs {
            return self.clone();
        }
        // Running sessions always accept ticks.
        self.tick(target - self.elapsed_secs)
            .unwrap_or_else(|_| self.clone())
    }
}

fn invalid(state: SessionState, action: &'static str) -> SchedulingError {
    SchedulingError::InvalidTransition { state, action }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap()
    }

    fn focus() -> FocusSession {
        FocusSession::start("s1", SessionType::Focus, CycleConfig::default(), 0, &now()).unwrap()
    }

    #[test]
    fn starts_running_with_duration_from_config() {
        let s = focus();
        assert_eq!(s.state, SessionState::Running);
        assert_eq!(s.duration_secs, 25 * 60);
        assert_eq!(s.elapsed_secs, 0);
        assert_eq!(s.remaining_secs(), 25 * 60);
    }

    #[test]
    fn start_rejects_invalid_config() {
        let cfg = CycleConfig {
            focus_duration_secs: 0,
            ..CycleConfig::default()
        };
        assert!(FocusSession::start("s", SessionType::Focus, cfg, 0, &now()).is_err());
    }

    #[test]
    fn tick_accumulates_and_completes_at_duration() {
        let s = focus().tick(600).unwrap();
        assert_eq!(s.elapsed_secs, 600);
        assert_eq!(s.state, SessionState::Running);

        let done = s.tick(10_000).unwrap();
        assert_eq!(done.elapsed_secs, done.duration_secs);
        assert_eq!(done.state, SessionState::Completed);
        assert!((done.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn paused_session_ignores_ticks() {
        let paused = focus().tick(30).unwrap().pause().unwrap();
        let after = paused.tick(100).unwrap();
        assert_eq!(after.elapsed_secs, 30);
        assert_eq!(after.state, SessionState::Paused);
    }

    #[test]
    fn pause_resume_round_trip() {
        let s = focus().pause().unwrap();
        assert_eq!(s.state, SessionState::Paused);
        let s = s.resume(&now()).unwrap();
        assert_eq!(s.state, SessionState::Running);
    }

    #[test]
    fn double_pause_and_double_resume_are_invalid() {
        let paused = focus().pause().unwrap();
        assert!(matches!(
            paused.pause(),
            Err(SchedulingError::InvalidTransition { action: "pause", .. })
        ));
        assert!(matches!(
            focus().resume(&now()),
            Err(SchedulingError::InvalidTransition { action: "resume", .. })
        ));
    }

    #[test]
    fn terminal_sessions_reject_commands() {
        let done = focus().tick(u64::MAX).unwrap();
        let canceled = focus().cancel().unwrap();
        for s in [done, canceled] {
            assert!(s.tick(1).is_err());
            assert!(s.pause().is_err());
            assert!(s.resume(&now()).is_err());
            assert!(s.cancel().is_err());
        }
    }

    #[test]
    fn cancel_from_paused() {
        let s = focus().pause().unwrap().cancel().unwrap();
        assert_eq!(s.state, SessionState::Canceled);
    }

    #[test]
    fn catch_up_recovers_missed_ticks() {
        let s = focus().tick(60).unwrap();
        let later = now() + Duration::seconds(300);
        let caught = s.catch_up(&later);
        assert_eq!(caught.elapsed_secs, 300);
    }

    #[test]
    fn catch_up_counts_from_resume_anchor() {
        let paused = focus().tick(100).unwrap().pause().unwrap();
        let resumed_at = now() + Duration::minutes(30);
        let s = paused.resume(&resumed_at).unwrap();
        let caught = s.catch_up(&(resumed_at + Duration::seconds(50)));
        assert_eq!(caught.elapsed_secs, 150);
    }

    #[test]
    fn catch_up_never_goes_backwards_and_can_complete() {
        let s = focus().tick(500).unwrap();
        assert_eq!(s.catch_up(&(now() + Duration::seconds(10))).elapsed_secs, 500);
        assert_eq!(s.catch_up(&(now() - Duration::hours(1))).elapsed_secs, 500);

        let done = s.catch_up(&(now() + Duration::hours(2)));
        assert_eq!(done.state, SessionState::Completed);
        assert_eq!(done.elapsed_secs, done.duration_secs);
    }
}
