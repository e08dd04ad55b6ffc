//! Time and identity collaborators.
//!
//! Engines never read the system clock or draw random ids on their own; the
//! caller passes `now` in and picks an [`IdGenerator`]. Tests freeze both.

use chrono::{DateTime, Local, TimeZone, Utc};
use uuid::Uuid;

/// Source of the current time, in the zone calendar arithmetic should use.
pub trait Clock {
    type Tz: TimeZone;

    fn now(&self) -> DateTime<Self::Tz>;
}

/// Wall clock in the machine's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone)]
pub struct FixedClock<Tz: TimeZone> {
    at: DateTime<Tz>,
}

impl<Tz: TimeZone> FixedClock<Tz> {
    pub fn new(at: DateTime<Tz>) -> Self {
        Self { at }
    }

    /// Move the frozen instant.
    pub fn set(&mut self, at: DateTime<Tz>) {
        self.at = at;
    }
}

impl<Tz: TimeZone> Clock for FixedClock<Tz> {
    type Tz = Tz;

    fn now(&self) -> DateTime<Tz> {
        self.at.clone()
    }
}

/// Produces ids for entities created by the engines.
pub trait IdGenerator {
    /// Id for an entity derived from `parent_id` at `at` (e.g. a task successor).
    fn derived_id(&self, parent_id: &str, at: &DateTime<Utc>) -> String;

    /// Id for a brand-new entity.
    fn fresh_id(&self) -> String;
}

/// Deterministic ids: derived ids are UUIDv5 of the parent id and instant.
///
/// The same parent and instant always produce the same id, which keeps
/// successor generation a pure function of its inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedIds;

impl IdGenerator for DerivedIds {
    fn derived_id(&self, parent_id: &str, at: &DateTime<Utc>) -> String {
        let name = format!("{parent_id}@{}", at.to_rfc3339());
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    fn fresh_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Random UUIDv4 ids for everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn derived_id(&self, _parent_id: &str, _at: &DateTime<Utc>) -> String {
        Uuid::new_v4().to_string()
    }

    fn fresh_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
