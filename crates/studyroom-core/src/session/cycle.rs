//! Sequencing of sessions within a Pomodoro cycle.
//!
//! ```text
//! focus done      -> count += 1; long break if count % n == 0, else short break
//! short break done -> focus
//! long break done  -> focus, count = 0
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{AutoStartPolicy, CycleConfig, SessionType};
use super::timer::{FocusSession, SessionState};
use crate::clock::IdGenerator;
use crate::error::SchedulingError;

/// The decided-but-not-started next session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSession {
    pub session_type: SessionType,
    pub duration_secs: u64,
    pub completed_focus_count: u32,
    pub cycle_config: CycleConfig,
    /// Session whose completion produced this decision.
    pub previous_id: String,
}

impl PendingSession {
    /// Create the running session. Its id is derived from the previous
    /// session and the start instant.
    ///
    /// # Errors
    /// [`SchedulingError::InvalidPolicy`] if the carried cycle config is invalid.
    pub fn start<Tz: TimeZone, G: IdGenerator + ?Sized>(
        &self,
        now: &DateTime<Tz>,
        ids: &G,
    ) -> Result<FocusSession, SchedulingError> {
        let id = ids.derived_id(&self.previous_id, &now.with_timezone(&Utc));
        FocusSession::start(
            id,
            self.session_type,
            self.cycle_config,
            self.completed_focus_count,
            now,
        )
    }
}

/// Result of [`FocusSession::advance_cycle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextSession {
    /// Auto-start was on: the next session is already running.
    Started(FocusSession),
    /// Auto-start was off: the caller decides when to start it.
    Pending(PendingSession),
}

impl NextSession {
    pub fn session_type(&self) -> SessionType {
        match self {
            NextSession::Started(s) => s.session_type,
            NextSession::Pending(p) => p.session_type,
        }
    }
}

impl FocusSession {
    /// Focus sessions completed in the cycle once this one is counted.
    pub fn focus_count_including_self(&self) -> u32 {
        match (self.session_type, self.state) {
            (SessionType::Focus, SessionState::Completed) => {
                self.completed_focus_count.saturating_add(1)
            }
            _ => self.completed_focus_count,
        }
    }

    /// Decide what follows this completed session.
    ///
    /// # Errors
    /// - [`SchedulingError::InvalidTransition`] unless the session completed.
    /// - [`SchedulingError::InvalidPolicy`] if its cycle config is invalid.
    pub fn next_in_cycle(&self) -> Result<PendingSession, SchedulingError> {
        if self.state != SessionState::Completed {
            return Err(SchedulingError::InvalidTransition {
                state: self.state,
                action: "advance",
            });
        }
        self.cycle_config.validate()?;

        let (session_type, completed_focus_count) = match self.session_type {
            SessionType::Focus => {
                let count = self.focus_count_including_self();
                if count % self.cycle_config.sessions_before_long_break == 0 {
                    (SessionType::LongBreak, count)
                } else {
                    (SessionType::ShortBreak, count)
                }
            }
            SessionType::ShortBreak => (SessionType::Focus, self.completed_focus_count),
            SessionType::LongBreak => (SessionType::Focus, 0),
        };

        Ok(PendingSession {
            session_type,
            duration_secs: self.cycle_config.duration_for(session_type),
            completed_focus_count,
            cycle_config: self.cycle_config,
            previous_id: self.id.clone(),
        })
    }

    /// Move to the next session of the cycle, starting it only when the
    /// matching auto-start flag is set.
    ///
    /// # Errors
    /// Same as [`FocusSession::next_in_cycle`].
    pub fn advance_cycle<Tz: TimeZone, G: IdGenerator + ?Sized>(
        &self,
        auto_start: &AutoStartPolicy,
        now: &DateTime<Tz>,
        ids: &G,
    ) -> Result<NextSession, SchedulingError> {
        let pending = self.next_in_cycle()?;
        debug!(
            from = %self.session_type,
            to = %pending.session_type,
            completed_focus_count = pending.completed_focus_count,
            "cycle advanced"
        );
        if auto_start.starts(pending.session_type) {
            Ok(NextSession::Started(pending.start(now, ids)?))
        } else {
            Ok(NextSession::Pending(pending))
        }
    }
}
