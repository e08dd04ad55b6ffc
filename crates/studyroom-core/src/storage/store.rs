use crate::error::Result;
use crate::events::Event;
use crate::recurrence::RecurringTaskInstance;
use crate::review::MemorizationItem;
use crate::session::{FocusSession, PendingSession};

/// Persistence collaborator used by the orchestrator.
///
/// Engines never see a `Store`; the orchestrator loads values, hands them
/// to an engine, and saves whatever comes back.
pub trait Store {
    fn load_item(&self, id: &str) -> Result<Option<MemorizationItem>>;
    fn save_item(&self, item: &MemorizationItem) -> Result<()>;
    fn list_items(&self) -> Result<Vec<MemorizationItem>>;

    fn load_task(&self, id: &str) -> Result<Option<RecurringTaskInstance>>;
    fn save_task(&self, task: &RecurringTaskInstance) -> Result<()>;
    fn list_tasks(&self) -> Result<Vec<RecurringTaskInstance>>;
    /// Save a completed task, its successor and their events as one unit.
    /// Either everything is written or nothing is.
    fn complete_task(
        &self,
        completed: &RecurringTaskInstance,
        successor: Option<&RecurringTaskInstance>,
        events: &[Event],
    ) -> Result<()>;

    fn load_session(&self, id: &str) -> Result<Option<FocusSession>>;
    fn save_session(&self, session: &FocusSession) -> Result<()>;
    /// Most recent sessions first.
    fn list_sessions(&self, limit: usize) -> Result<Vec<FocusSession>>;

    /// Id of the session the timer is currently driving, if any.
    fn current_session_id(&self) -> Result<Option<String>>;
    fn set_current_session_id(&self, id: Option<&str>) -> Result<()>;

    /// Next session decided by the cycle but not started yet.
    fn load_pending(&self) -> Result<Option<PendingSession>>;
    fn save_pending(&self, pending: Option<&PendingSession>) -> Result<()>;

    fn append_event(&self, event: &Event) -> Result<()>;
    /// Most recent events first.
    fn recent_events(&self, limit: usize) -> Result<Vec<Event>>;
}
