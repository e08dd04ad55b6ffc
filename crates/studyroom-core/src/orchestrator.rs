//! Glue between user actions, the engines and persistence.
//!
//! Every operation follows the same shape: load values from the [`Store`],
//! run a pure engine function, save what it returns, and append an
//! [`Event`] to the activity history. Rejected actions surface as errors and
//! leave the store untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::{Clock, DerivedIds, IdGenerator};
use crate::error::{CoreError, DatabaseError, Result, SchedulingError};
use crate::events::Event;
use crate::recurrence::{self, RecurrenceRule, RecurringTaskInstance, TaskStatus};
use crate::review::{self, DeckSummary, ForecastDay, MemorizationItem, RecallQuality};
use crate::session::{FocusSession, NextSession, PendingSession, SessionState, SessionType};
use crate::storage::{Config, Store};

/// Told when a session runs to completion (sound, vibration, bell...).
pub trait Notifier {
    fn session_completed(&self, session: &FocusSession);
}

/// Notifier that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn session_completed(&self, _session: &FocusSession) {}
}

/// Outcome of completing a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub completed: RecurringTaskInstance,
    /// The next occurrence, when the task recurs and its rule has not ended.
    pub successor: Option<RecurringTaskInstance>,
}

pub struct Orchestrator<S: Store, C: Clock, N: Notifier> {
    store: S,
    clock: C,
    notifier: N,
    config: Config,
    ids: Box<dyn IdGenerator>,
}

impl<S: Store, C: Clock, N: Notifier> Orchestrator<S, C, N> {
    pub fn new(store: S, clock: C, notifier: N, config: Config) -> Self {
        Self {
            store,
            clock,
            notifier,
            config,
            ids: Box::new(DerivedIds),
        }
    }

    /// Replace the id generator.
    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    // ── Cards ────────────────────────────────────────────────────────

    pub fn add_card(&self, label: &str) -> Result<MemorizationItem> {
        let policy = self.config.review_policy().map_err(|e| rejected("add card", e))?;
        let item = MemorizationItem::new(self.ids.fresh_id(), label, &policy, self.now_utc());
        self.store.save_item(&item)?;
        info!(card = %item.id, "card added");
        Ok(item)
    }

    pub fn review_card(&self, id: &str, quality: RecallQuality) -> Result<MemorizationItem> {
        let policy = self.config.review_policy().map_err(|e| rejected("review", e))?;
        let item = self
            .store
            .load_item(id)?
            .ok_or_else(|| not_found("card", id))?;
        let now = self.clock.now();
        let updated = review::record_review(&item, quality, &policy, &now)
            .map_err(|e| rejected("review", e))?;

        self.store.save_item(&updated)?;
        self.store.append_event(&Event::CardReviewed {
            item_id: updated.id.clone(),
            quality,
            interval_days: updated.interval_days,
            ease_factor: updated.ease_factor,
            mastery_state: updated.mastery_state,
            next_review_at: updated.next_review_at,
            at: now.with_timezone(&Utc),
        })?;
        info!(card = %updated.id, %quality, interval_days = updated.interval_days, "card reviewed");
        Ok(updated)
    }

    pub fn list_cards(&self) -> Result<Vec<MemorizationItem>> {
        self.store.list_items()
    }

    pub fn due_cards(&self) -> Result<Vec<MemorizationItem>> {
        let items = self.store.list_items()?;
        Ok(review::due_items(&items, &self.clock.now())
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn deck_summary(&self, horizon_days: u32) -> Result<DeckSummary> {
        let items = self.store.list_items()?;
        Ok(DeckSummary::from_items(&items, &self.clock.now(), horizon_days))
    }

    pub fn forecast(&self, days: u32) -> Result<Vec<ForecastDay>> {
        let items = self.store.list_items()?;
        Ok(review::forecast(&items, &self.clock.now(), days))
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn add_task(
        &self,
        title: &str,
        due_at: Option<DateTime<Utc>>,
        rule: Option<RecurrenceRule>,
        subtasks: Vec<String>,
    ) -> Result<RecurringTaskInstance> {
        if let Some(rule) = &rule {
            rule.validate().map_err(|e| rejected("add task", e))?;
            if due_at.is_none() {
                return Err(rejected(
                    "add task",
                    SchedulingError::invalid_policy("due_at", "a recurring task needs a due date"),
                ));
            }
        }
        let task = RecurringTaskInstance::new(self.ids.fresh_id(), title, due_at, rule, self.now_utc())
            .with_subtasks(subtasks);
        self.store.save_task(&task)?;
        info!(task = %task.id, recurring = task.is_recurring(), "task added");
        Ok(task)
    }

    pub fn list_tasks(&self) -> Result<Vec<RecurringTaskInstance>> {
        self.store.list_tasks()
    }

    /// Complete a task and, if it recurs, create its successor.
    ///
    /// The successor is computed before anything is saved, so a failing
    /// rule leaves the task open. The completed task, its successor and
    /// their events are written together. Completing an already completed
    /// task is a no-op.
    pub fn complete_task(&self, id: &str) -> Result<TaskCompletion> {
        let task = self
            .store
            .load_task(id)?
            .ok_or_else(|| not_found("task", id))?;
        if task.status == TaskStatus::Completed {
            warn!(task = %task.id, "task already completed");
            return Ok(TaskCompletion {
                completed: task,
                successor: None,
            });
        }

        let now = self.clock.now();
        let at = now.with_timezone(&Utc);
        let completed = task.completed(at);

        let mut ended_at = None;
        let successor = if completed.is_recurring() {
            match recurrence::next_occurrence(&completed, &now, self.ids.as_ref()) {
                Ok(next) => Some(next),
                Err(SchedulingError::RecurrenceEnded { end_at, .. }) => {
                    ended_at = Some(end_at);
                    None
                }
                Err(e) => return Err(rejected("complete task", e)),
            }
        } else {
            None
        };

        let mut events = vec![Event::TaskCompleted {
            task_id: completed.id.clone(),
            title: completed.title.clone(),
            at,
        }];
        if let Some(next) = &successor {
            if let Some(due_at) = next.due_at {
                events.push(Event::TaskRecurred {
                    task_id: completed.id.clone(),
                    successor_id: next.id.clone(),
                    due_at,
                    at,
                });
            }
        }
        if let Some(end_at) = ended_at {
            events.push(Event::RecurrenceEnded {
                task_id: completed.id.clone(),
                end_at,
                at,
            });
        }
        self.store
            .complete_task(&completed, successor.as_ref(), &events)?;

        match (&successor, ended_at) {
            (Some(next), _) => info!(task = %completed.id, successor = %next.id, "task recurred"),
            (None, Some(_)) => info!(task = %completed.id, "recurrence ended"),
            (None, None) => info!(task = %completed.id, "task completed"),
        }

        Ok(TaskCompletion {
            completed,
            successor,
        })
    }

    /// Preview the next due dates of a recurring task.
    pub fn upcoming(&self, id: &str, limit: usize) -> Result<Vec<DateTime<Utc>>> {
        let task = self
            .store
            .load_task(id)?
            .ok_or_else(|| not_found("task", id))?;
        recurrence::upcoming(&task, &self.clock.now(), limit).map_err(|e| rejected("upcoming", e))
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub fn current_session(&self) -> Result<Option<FocusSession>> {
        match self.store.current_session_id()? {
            Some(id) => self.store.load_session(&id),
            None => Ok(None),
        }
    }

    pub fn pending_session(&self) -> Result<Option<PendingSession>> {
        self.store.load_pending()
    }

    fn require_current(&self) -> Result<FocusSession> {
        self.current_session()?.ok_or(CoreError::NoActiveSession)
    }

    /// Start a session of `session_type`, continuing the current cycle.
    ///
    /// Refused while another session is still running or paused.
    pub fn start_session(&self, session_type: SessionType) -> Result<FocusSession> {
        let cycle = self.config.cycle_config().map_err(|e| rejected("start", e))?;
        let current = self.current_session()?;
        if let Some(active) = current.as_ref().filter(|s| !s.is_terminal()) {
            return Err(rejected(
                "start",
                SchedulingError::InvalidTransition {
                    state: active.state,
                    action: "start",
                },
            ));
        }

        let completed_focus_count = match (self.store.load_pending()?, &current) {
            (Some(pending), _) => pending.completed_focus_count,
            (None, Some(last)) if last.state == SessionState::Completed => {
                last.next_in_cycle()
                    .map_err(|e| rejected("start", e))?
                    .completed_focus_count
            }
            // A canceled session leaves the count where it was.
            (None, Some(last)) => last.completed_focus_count,
            (None, None) => 0,
        };
        let session = FocusSession::start(
            self.ids.fresh_id(),
            session_type,
            cycle,
            completed_focus_count,
            &self.clock.now(),
        )
        .map_err(|e| rejected("start", e))?;

        self.activate(&session)?;
        info!(session = %session.id, %session_type, "session started");
        Ok(session)
    }

    pub fn tick(&self, delta_secs: u64) -> Result<FocusSession> {
        let session = self.require_current()?;
        let next = session.tick(delta_secs).map_err(|e| rejected("tick", e))?;
        self.record_transition(&session, next)
    }

    pub fn pause(&self) -> Result<FocusSession> {
        let session = self.require_current()?;
        let next = session.pause().map_err(|e| rejected("pause", e))?;
        self.record_transition(&session, next)
    }

    pub fn resume(&self) -> Result<FocusSession> {
        let session = self.require_current()?;
        let next = session
            .resume(&self.clock.now())
            .map_err(|e| rejected("resume", e))?;
        self.record_transition(&session, next)
    }

    pub fn cancel(&self) -> Result<FocusSession> {
        let session = self.require_current()?;
        let next = session.cancel().map_err(|e| rejected("cancel", e))?;
        self.record_transition(&session, next)
    }

    /// Reconcile the current session with the wall clock.
    pub fn sync(&self) -> Result<Option<FocusSession>> {
        match self.current_session()? {
            Some(session) => {
                let next = session.catch_up(&self.clock.now());
                self.record_transition(&session, next).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Move past the completed current session.
    ///
    /// With auto-start the next session becomes current; otherwise the
    /// decision is stored as pending for [`Orchestrator::start_pending`].
    pub fn advance(&self) -> Result<NextSession> {
        let session = self.require_current()?;
        let next = session
            .advance_cycle(&self.config.auto_start, &self.clock.now(), self.ids.as_ref())
            .map_err(|e| rejected("advance", e))?;
        match &next {
            NextSession::Started(started) => {
                self.activate(started)?;
                info!(session = %started.id, session_type = %started.session_type, "next session started");
            }
            NextSession::Pending(pending) => {
                self.store.save_pending(Some(pending))?;
                info!(session_type = %pending.session_type, "next session pending");
            }
        }
        Ok(next)
    }

    pub fn start_pending(&self) -> Result<FocusSession> {
        if let Some(active) = self.current_session()?.filter(|s| !s.is_terminal()) {
            return Err(rejected(
                "start",
                SchedulingError::InvalidTransition {
                    state: active.state,
                    action: "start",
                },
            ));
        }
        let pending = self.store.load_pending()?.ok_or(CoreError::NoPendingSession)?;
        let session = pending
            .start(&self.clock.now(), self.ids.as_ref())
            .map_err(|e| rejected("start", e))?;
        self.activate(&session)?;
        info!(session = %session.id, session_type = %session.session_type, "pending session started");
        Ok(session)
    }

    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<FocusSession>> {
        self.store.list_sessions(limit)
    }

    pub fn history(&self, limit: usize) -> Result<Vec<Event>> {
        self.store.recent_events(limit)
    }

    fn activate(&self, session: &FocusSession) -> Result<()> {
        self.store.save_session(session)?;
        self.store.set_current_session_id(Some(&session.id))?;
        self.store.save_pending(None)
    }

    /// Save `after` and report entry into a terminal state.
    fn record_transition(&self, before: &FocusSession, after: FocusSession) -> Result<FocusSession> {
        if before == &after {
            return Ok(after);
        }
        self.store.save_session(&after)?;
        if before.state != after.state {
            let at = self.now_utc();
            match after.state {
                SessionState::Completed => {
                    self.store.append_event(&Event::SessionCompleted {
                        session_id: after.id.clone(),
                        session_type: after.session_type,
                        duration_secs: after.duration_secs,
                        completed_focus_count: after.focus_count_including_self(),
                        at,
                    })?;
                    self.notifier.session_completed(&after);
                    info!(session = %after.id, session_type = %after.session_type, "session completed");
                }
                SessionState::Canceled => {
                    self.store.append_event(&Event::SessionCanceled {
                        session_id: after.id.clone(),
                        session_type: after.session_type,
                        elapsed_secs: after.elapsed_secs,
                        at,
                    })?;
                    info!(session = %after.id, "session canceled");
                }
                SessionState::Running | SessionState::Paused => {}
            }
        }
        Ok(after)
    }
}

fn rejected(action: &str, err: SchedulingError) -> CoreError {
    warn!(%action, error = %err, "action rejected");
    err.into()
}

fn not_found(kind: &'static str, id: &str) -> CoreError {
    DatabaseError::NotFound {
        kind,
        id: id.to_string(),
    }
    .into()
}
