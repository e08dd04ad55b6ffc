//! Successor generation for repeating tasks.

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use super::instance::{RecurringTaskInstance, TaskStatus};
use crate::clock::{DerivedIds, IdGenerator};
use crate::error::SchedulingError;

/// Build the instance that follows `instance` under its recurrence rule.
///
/// The step is taken from `instance.due_at` in `now`'s zone. The successor
/// may fall exactly on `end_at` but not after it. With a deterministic
/// [`IdGenerator`] the result depends only on the arguments.
///
/// # Errors
/// - [`SchedulingError::NoRecurrenceConfigured`] without a rule or due date.
/// - [`SchedulingError::InvalidPolicy`] for a zero interval.
/// - [`SchedulingError::RecurrenceEnded`] when the next date passes `end_at`.
pub fn next_occurrence<Tz: TimeZone, G: IdGenerator + ?Sized>(
    instance: &RecurringTaskInstance,
    now: &DateTime<Tz>,
    ids: &G,
) -> Result<RecurringTaskInstance, SchedulingError> {
    let (rule, due_at) = match (&instance.recurrence_rule, instance.due_at) {
        (Some(rule), Some(due_at)) => (rule, due_at),
        _ => {
            return Err(SchedulingError::NoRecurrenceConfigured {
                task_id: instance.id.clone(),
            })
        }
    };
    rule.validate()?;

    let zone = now.timezone();
    let next_due = rule
        .advance(&due_at.with_timezone(&zone))
        .ok_or_else(|| {
            SchedulingError::invalid_policy("recurrence.interval", "next due date is out of range")
        })?
        .with_timezone(&Utc);

    if let Some(end_at) = rule.end_at {
        if next_due > end_at {
            return Err(SchedulingError::RecurrenceEnded {
                task_id: instance.id.clone(),
                next_due,
                end_at,
            });
        }
    }

    debug!(task = %instance.id, kind = %rule.kind, %next_due, "generated successor");

    Ok(RecurringTaskInstance {
        id: ids.derived_id(&instance.id, &next_due),
        title: instance.title.clone(),
        due_at: Some(next_due),
        recurrence_rule: Some(rule.clone()),
        subtasks: instance.subtask_templates(),
        status: TaskStatus::Open,
        created_at: now.with_timezone(&Utc),
        completed_at: None,
        previous_id: Some(instance.id.clone()),
    })
}

/// Preview the next `limit` due dates of a recurring task.
///
/// Stops early once the rule ends.
///
/// # Errors
/// Same as [`next_occurrence`], except that reaching the end is not an error.
pub fn upcoming<Tz: TimeZone>(
    instance: &RecurringTaskInstance,
    now: &DateTime<Tz>,
    limit: usize,
) -> Result<Vec<DateTime<Utc>>, SchedulingError> {
    let mut dates = Vec::with_capacity(limit);
    let mut current = instance.clone();
    while dates.len() < limit {
        match next_occurrence(&current, now, &DerivedIds) {
            Ok(next) => {
                if let Some(due) = next.due_at {
                    dates.push(due);
                }
                current = next;
            }
            Err(SchedulingError::RecurrenceEnded { .. }) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(dates)
}
