use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rule::RecurrenceRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Open,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
        }
    }
}

/// One concrete occurrence of a (possibly) repeating task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringTaskInstance {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence_rule: Option<RecurrenceRule>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Instance this one was generated from.
    #[serde(default)]
    pub previous_id: Option<String>,
}

impl RecurringTaskInstance {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        due_at: Option<DateTime<Utc>>,
        recurrence_rule: Option<RecurrenceRule>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            due_at,
            recurrence_rule,
            subtasks: Vec::new(),
            status: TaskStatus::Open,
            created_at: now,
            completed_at: None,
            previous_id: None,
        }
    }

    pub fn with_subtasks<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subtasks = titles.into_iter().map(Subtask::new).collect();
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }

    /// A copy of this instance marked completed at `now`.
    pub fn completed(&self, now: DateTime<Utc>) -> Self {
        Self {
            status: TaskStatus::Completed,
            completed_at: Some(now),
            ..self.clone()
        }
    }

    /// Subtasks as templates: same titles, nothing checked off.
    pub fn subtask_templates(&self) -> Vec<Subtask> {
        self.subtasks
            .iter()
            .map(|s| Subtask::new(s.title.clone()))
            .collect()
    }
}
