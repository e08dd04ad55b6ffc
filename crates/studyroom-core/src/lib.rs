//! # Studyroom Core Library
//!
//! Scheduling core for a study and productivity app: when a flashcard
//! should come back for review, when a repeating task regenerates, and how a
//! Pomodoro-style focus session progresses.
//!
//! ## Architecture
//!
//! - **Engines** ([`review`], [`recurrence`], [`session`]): pure, synchronous
//!   functions over immutable inputs. They take `now` and policy values as
//!   arguments and never touch storage, clocks or global state.
//! - **Collaborators**: [`Store`] for persistence, [`Clock`] for time,
//!   [`IdGenerator`] for identity, [`Notifier`] for completion alerts.
//! - **Orchestrator**: loads values, runs an engine, persists the result and
//!   appends an [`Event`] to the activity history.
//!
//! ## Key Components
//!
//! - [`record_review`]: SM-2 family review scheduling
//! - [`next_occurrence`]: successor generation for repeating tasks
//! - [`FocusSession`]: focus/break timer state machine
//! - [`Config`]: TOML configuration and policy validation
//! - [`Database`]: SQLite implementation of [`Store`]

pub mod calendar;
pub mod clock;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod recurrence;
pub mod review;
pub mod session;
pub mod storage;

pub use clock::{Clock, DerivedIds, FixedClock, IdGenerator, RandomIds, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, SchedulingError};
pub use events::Event;
pub use orchestrator::{Notifier, Orchestrator, SilentNotifier, TaskCompletion};
pub use recurrence::{
    next_occurrence, RecurrenceKind, RecurrenceRule, RecurringTaskInstance, Subtask, TaskStatus,
};
pub use review::{
    due_items, record_review, DeckSummary, MasteryState, MemorizationItem, RecallQuality,
    ReviewPolicy,
};
pub use session::{
    AutoStartPolicy, CycleConfig, FocusSession, NextSession, PendingSession, SessionState,
    SessionType,
};
pub use storage::{Config, Database, Store};
