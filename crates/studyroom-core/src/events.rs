use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::review::{MasteryState, RecallQuality};
use crate::session::SessionType;

/// Every state change the orchestrator persists produces an Event.
/// Events form the activity history; each kind carries its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    CardReviewed {
        item_id: String,
        quality: RecallQuality,
        interval_days: u32,
        ease_factor: f64,
        mastery_state: MasteryState,
        next_review_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        task_id: String,
        title: String,
        at: DateTime<Utc>,
    },
    TaskRecurred {
        task_id: String,
        successor_id: String,
        due_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// A completed task's rule produced no further occurrence.
    RecurrenceEnded {
        task_id: String,
        end_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        session_id: String,
        session_type: SessionType,
        duration_secs: u64,
        /// Focus sessions completed in the cycle, counting this one.
        completed_focus_count: u32,
        at: DateTime<Utc>,
    },
    SessionCanceled {
        session_id: String,
        session_type: SessionType,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Stable name of the variant, as stored in the activity table.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::CardReviewed { .. } => "card_reviewed",
            Event::TaskCompleted { .. } => "task_completed",
            Event::TaskRecurred { .. } => "task_recurred",
            Event::RecurrenceEnded { .. } => "recurrence_ended",
            Event::SessionCompleted { .. } => "session_completed",
            Event::SessionCanceled { .. } => "session_canceled",
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::CardReviewed { at, .. }
            | Event::TaskCompleted { at, .. }
            | Event::TaskRecurred { at, .. }
            | Event::RecurrenceEnded { at, .. }
            | Event::SessionCompleted { at, .. }
            | Event::SessionCanceled { at, .. } => *at,
        }
    }
}
