//! SM-2 family review scheduling.
//!
//! ```text
//! again            -> repetitions = 0, interval = 1, ease -= penalty
//! hard/good/easy   -> repetitions += 1
//!                     interval = initial step, or round(interval * ease)
//!                     ease += delta(quality)
//!                     easy: + bonus days, hard: - penalty days (min 1)
//! ```
//!
//! The interval grows with the ease factor the item had *before* this
//! review; the adjusted ease applies from the next review on.

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use super::item::{MasteryState, MemorizationItem, RecallQuality};
use super::policy::ReviewPolicy;
use crate::calendar;
use crate::error::SchedulingError;

/// Apply one review to `item` and return the updated item.
///
/// `now` supplies both the review instant and the zone whose calendar the
/// interval is counted in.
///
/// # Errors
/// [`SchedulingError::InvalidPolicy`] if `policy` is inconsistent or the
/// item's stored ease factor is below the policy floor.
pub fn record_review<Tz: TimeZone>(
    item: &MemorizationItem,
    quality: RecallQuality,
    policy: &ReviewPolicy,
    now: &DateTime<Tz>,
) -> Result<MemorizationItem, SchedulingError> {
    policy.validate()?;
    if !item.ease_factor.is_finite() || item.ease_factor < policy.minimum_ease {
        return Err(SchedulingError::invalid_policy(
            "ease_factor",
            format!(
                "item '{}' has ease {} below the floor {}",
                item.id, item.ease_factor, policy.minimum_ease
            ),
        ));
    }

    let (repetition_count, interval_days) = match quality {
        RecallQuality::Again => (0, 1),
        RecallQuality::Hard | RecallQuality::Good | RecallQuality::Easy => {
            let repetitions = item.repetition_count.saturating_add(1);
            let base = base_interval(item, repetitions, policy);
            let interval = match quality {
                RecallQuality::Easy => base.saturating_add(policy.easy_bonus_days),
                RecallQuality::Hard => base.saturating_sub(policy.hard_penalty_days).max(1),
                _ => base,
            };
            (repetitions, interval)
        }
    };
    let ease_factor = (item.ease_factor + quality.ease_delta(policy)).max(policy.minimum_ease);

    let next_review_at = calendar::add_days(now, u64::from(interval_days))
        .ok_or_else(|| {
            SchedulingError::invalid_policy("interval_days", "next review date is out of range")
        })?
        .with_timezone(&Utc);

    debug!(
        item = %item.id,
        %quality,
        repetition_count,
        interval_days,
        ease_factor,
        "scheduled review"
    );

    Ok(MemorizationItem {
        id: item.id.clone(),
        label: item.label.clone(),
        repetition_count,
        ease_factor,
        interval_days,
        next_review_at,
        last_reviewed_at: Some(now.with_timezone(&Utc)),
        mastery_state: MasteryState::classify(repetition_count, interval_days, policy),
    })
}

/// Interval before the quality-specific bonus or penalty.
///
/// Successful reviews never shorten the interval the item already had.
fn base_interval(item: &MemorizationItem, repetitions: u32, policy: &ReviewPolicy) -> u32 {
    let step = usize::try_from(repetitions - 1)
        .ok()
        .and_then(|i| policy.initial_steps_days.get(i).copied());
    let grown = match step {
        Some(days) => days,
        None => {
            // `as` saturates for out-of-range floats.
            (f64::from(item.interval_days) * item.ease_factor).round() as u32
        }
    };
    grown.max(item.interval_days).max(1)
}

/// Items due at or before `now`, oldest first, ties broken by id.
pub fn due_items<'a, Tz: TimeZone>(
    items: &'a [MemorizationItem],
    now: &DateTime<Tz>,
) -> Vec<&'a MemorizationItem> {
    let now = now.with_timezone(&Utc);
    let mut due: Vec<&MemorizationItem> = items.iter().filter(|i| i.is_due(now)).collect();
    due.sort_by(|a, b| {
        a.next_review_at
            .cmp(&b.next_review_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    due
}
