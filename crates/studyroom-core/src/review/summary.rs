use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::item::{MasteryState, MemorizationItem};
use crate::calendar;

/// Counts across a deck, for status displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSummary {
    pub total: usize,
    pub new: usize,
    pub learning: usize,
    pub review: usize,
    pub mastered: usize,
    /// Due at or before now.
    pub due_now: usize,
    /// Due within the horizon (includes `due_now`).
    pub due_within_horizon: usize,
    pub horizon_days: u32,
}

impl DeckSummary {
    pub fn from_items<Tz: TimeZone>(
        items: &[MemorizationItem],
        now: &DateTime<Tz>,
        horizon_days: u32,
    ) -> Self {
        let now_utc = now.with_timezone(&Utc);
        let horizon = calendar::add_days(now, u64::from(horizon_days))
            .map(|h| h.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut summary = DeckSummary {
            horizon_days,
            ..DeckSummary::default()
        };
        for item in items {
            summary.total += 1;
            match item.mastery_state {
                MasteryState::New => summary.new += 1,
                MasteryState::Learning => summary.learning += 1,
                MasteryState::Review => summary.review += 1,
                MasteryState::Mastered => summary.mastered += 1,
            }
            if item.next_review_at <= now_utc {
                summary.due_now += 1;
            }
            if item.next_review_at <= horizon {
                summary.due_within_horizon += 1;
            }
        }
        summary
    }
}

/// Number of reviews falling on one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub due: usize,
}

/// Per-day review load for the next `days` days, starting today.
///
/// Overdue items are counted on today.
pub fn forecast<Tz: TimeZone>(
    items: &[MemorizationItem],
    now: &DateTime<Tz>,
    days: u32,
) -> Vec<ForecastDay> {
    let zone = now.timezone();
    let today = now.date_naive();
    let mut out: Vec<ForecastDay> = (0..days)
        .filter_map(|offset| today.checked_add_days(Days::new(u64::from(offset))))
        .map(|date| ForecastDay { date, due: 0 })
        .collect();

    for item in items {
        let date = calendar::local_date(&item.next_review_at, &zone).max(today);
        if let Some(slot) = out.iter_mut().find(|d| d.date == date) {
            slot.due += 1;
        }
    }
    out
}
