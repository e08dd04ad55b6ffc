mod config;
mod cycle;
mod timer;

pub use config::{AutoStartPolicy, CycleConfig, SessionType};
pub use cycle::{NextSession, PendingSession};
pub use timer::{FocusSession, SessionState};
