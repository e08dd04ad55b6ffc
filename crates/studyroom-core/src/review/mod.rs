//! Spaced-repetition review scheduling.

mod item;
mod policy;
mod scheduler;
mod summary;

pub use item::{MasteryState, MemorizationItem, RecallQuality};
pub use policy::ReviewPolicy;
pub use scheduler::{due_items, record_review};
pub use summary::{forecast, DeckSummary, ForecastDay};
