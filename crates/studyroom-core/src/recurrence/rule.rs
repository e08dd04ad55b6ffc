use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::SchedulingError;

/// Repeat cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

impl FromStr for RecurrenceKind {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(RecurrenceKind::Daily),
            "weekly" => Ok(RecurrenceKind::Weekly),
            "monthly" => Ok(RecurrenceKind::Monthly),
            other => Err(SchedulingError::invalid_policy(
                "recurrence.type",
                format!("unknown recurrence '{other}', expected daily/weekly/monthly"),
            )),
        }
    }
}

/// Repeat cadence plus an optional inclusive end date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    #[serde(rename = "type")]
    pub kind: RecurrenceKind,
    pub interval: u32,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
}

impl RecurrenceRule {
    pub fn new(kind: RecurrenceKind, interval: u32) -> Self {
        Self {
            kind,
            interval,
            end_at: None,
        }
    }

    pub fn until(mut self, end_at: DateTime<Utc>) -> Self {
        self.end_at = Some(end_at);
        self
    }

    /// # Errors
    /// [`SchedulingError::InvalidPolicy`] when `interval` is zero.
    pub fn validate(&self) -> Result<(), SchedulingError> {
        if self.interval == 0 {
            return Err(SchedulingError::invalid_policy(
                "recurrence.interval",
                "must be a positive integer",
            ));
        }
        Ok(())
    }

    /// The date one step after `from`, in `from`'s calendar.
    ///
    /// `None` if the result falls outside the representable range.
    pub fn advance<Tz: TimeZone>(&self, from: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        match self.kind {
            RecurrenceKind::Daily => calendar::add_days(from, u64::from(self.interval)),
            RecurrenceKind::Weekly => calendar::add_days(from, u64::from(self.interval) * 7),
            RecurrenceKind::Monthly => calendar::add_months(from, self.interval),
        }
    }
}
