//! Recurring task regeneration.

mod engine;
mod instance;
mod rule;

pub use engine::{next_occurrence, upcoming};
pub use instance::{RecurringTaskInstance, Subtask, TaskStatus};
pub use rule::{RecurrenceKind, RecurrenceRule};
