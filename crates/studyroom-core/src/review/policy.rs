use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

/// Tunables for the SM-2 style review scheduler.
///
/// Loaded from the `[review]` section of the config. Call [`validate`]
/// before handing a policy to the scheduler; the scheduler validates again
/// and refuses to run on an inconsistent policy.
///
/// [`validate`]: ReviewPolicy::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPolicy {
    /// Ease factor given to newly created items.
    #[serde(default = "default_starting_ease")]
    pub starting_ease: f64,
    /// Floor the ease factor is clamped to.
    #[serde(default = "default_minimum_ease")]
    pub minimum_ease: f64,
    /// Subtracted from the ease factor on an `again` review.
    #[serde(default = "default_again_ease_penalty")]
    pub again_ease_penalty: f64,
    /// Added to the ease factor on a `hard` review (zero or negative).
    #[serde(default = "default_hard_ease_delta")]
    pub hard_ease_delta: f64,
    /// Added to the ease factor on an `easy` review (zero or positive).
    #[serde(default = "default_easy_ease_delta")]
    pub easy_ease_delta: f64,
    /// Extra days added to the interval on an `easy` review.
    #[serde(default)]
    pub easy_bonus_days: u32,
    /// Days removed from the interval on a `hard` review (never below 1).
    #[serde(default)]
    pub hard_penalty_days: u32,
    /// Intervals for the first successful repetitions, in days.
    #[serde(default = "default_initial_steps")]
    pub initial_steps_days: Vec<u32>,
    /// Repetitions needed before an item counts as mastered.
    #[serde(default = "default_mastery_repetitions")]
    pub mastery_repetitions: u32,
    /// Interval needed before an item counts as mastered.
    #[serde(default = "default_mastery_interval_days")]
    pub mastery_interval_days: u32,
}

fn default_starting_ease() -> f64 {
    2.5
}
fn default_minimum_ease() -> f64 {
    1.3
}
fn default_again_ease_penalty() -> f64 {
    0.2
}
fn default_hard_ease_delta() -> f64 {
    -0.15
}
fn default_easy_ease_delta() -> f64 {
    0.15
}
fn default_initial_steps() -> Vec<u32> {
    vec![1, 6]
}
fn default_mastery_repetitions() -> u32 {
    5
}
fn default_mastery_interval_days() -> u32 {
    21
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            starting_ease: default_starting_ease(),
            minimum_ease: default_minimum_ease(),
            again_ease_penalty: default_again_ease_penalty(),
            hard_ease_delta: default_hard_ease_delta(),
            easy_ease_delta: default_easy_ease_delta(),
            easy_bonus_days: 0,
            hard_penalty_days: 0,
            initial_steps_days: default_initial_steps(),
            mastery_repetitions: default_mastery_repetitions(),
            mastery_interval_days: default_mastery_interval_days(),
        }
    }
}

impl ReviewPolicy {
    /// Check that every bound is consistent.
    ///
    /// # Errors
    /// Returns [`SchedulingError::InvalidPolicy`] naming the first offending field.
    pub fn validate(&self) -> Result<(), SchedulingError> {
        if !self.minimum_ease.is_finite() || self.minimum_ease < 1.0 {
            return Err(SchedulingError::invalid_policy(
                "minimum_ease",
                format!("must be at least 1.0, got {}", self.minimum_ease),
            ));
        }
        if !self.starting_ease.is_finite() || self.starting_ease <= self.minimum_ease {
            return Err(SchedulingError::invalid_policy(
                "starting_ease",
                format!(
                    "must be greater than minimum_ease ({}), got {}",
                    self.minimum_ease, self.starting_ease
                ),
            ));
        }
        if !self.again_ease_penalty.is_finite() || self.again_ease_penalty < 0.0 {
            return Err(SchedulingError::invalid_policy(
                "again_ease_penalty",
                "must be zero or positive",
            ));
        }
        if !self.hard_ease_delta.is_finite() || self.hard_ease_delta > 0.0 {
            return Err(SchedulingError::invalid_policy(
                "hard_ease_delta",
                "must be zero or negative",
            ));
        }
        if !self.easy_ease_delta.is_finite() || self.easy_ease_delta < 0.0 {
            return Err(SchedulingError::invalid_policy(
                "easy_ease_delta",
                "must be zero or positive",
            ));
        }
        if self.initial_steps_days.is_empty() {
            return Err(SchedulingError::invalid_policy(
                "initial_steps_days",
                "needs at least one step",
            ));
        }
        if self.initial_steps_days.contains(&0) {
            return Err(SchedulingError::invalid_policy(
                "initial_steps_days",
                "steps must be at least 1 day",
            ));
        }
        if self.initial_steps_days.windows(2).any(|w| w[1] < w[0]) {
            return Err(SchedulingError::invalid_policy(
                "initial_steps_days",
                "steps must not decrease",
            ));
        }
        if self.mastery_repetitions == 0 {
            return Err(SchedulingError::invalid_policy(
                "mastery_repetitions",
                "must be at least 1",
            ));
        }
        if self.mastery_interval_days == 0 {
            return Err(SchedulingError::invalid_policy(
                "mastery_interval_days",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: SchedulingError) -> String {
        match err {
            SchedulingError::InvalidPolicy { field, .. } => field,
            other => panic!("expected InvalidPolicy, got {other:?}"),
        }
    }

    #[test]
    fn default_policy_is_valid() {
        assert!(ReviewPolicy::default().validate().is_ok());
    }

    #[test]
    fn floor_at_or_above_starting_ease_is_rejected() {
        let policy = ReviewPolicy {
            minimum_ease: 2.5,
            ..ReviewPolicy::default()
        };
        assert_eq!(field_of(policy.validate().unwrap_err()), "starting_ease");
    }

    #[test]
    fn floor_below_one_is_rejected() {
        let policy = ReviewPolicy {
            minimum_ease: 0.5,
            ..ReviewPolicy::default()
        };
        assert_eq!(field_of(policy.validate().unwrap_err()), "minimum_ease");
    }

    #[test]
    fn wrong_sign_deltas_are_rejected() {
        let hard = ReviewPolicy {
            hard_ease_delta: 0.1,
            ..ReviewPolicy::default()
        };
        assert_eq!(field_of(hard.validate().unwrap_err()), "hard_ease_delta");

        let easy = ReviewPolicy {
            easy_ease_delta: -0.1,
            ..ReviewPolicy::default()
        };
        assert_eq!(field_of(easy.validate().unwrap_err()), "easy_ease_delta");
    }

    #[test]
    fn steps_must_be_positive_and_sorted() {
        for steps in [vec![], vec![0, 6], vec![6, 1]] {
            let policy = ReviewPolicy {
                initial_steps_days: steps,
                ..ReviewPolicy::default()
            };
            assert_eq!(
                field_of(policy.validate().unwrap_err()),
                "initial_steps_days"
            );
        }
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let policy: ReviewPolicy = toml::from_str("easy_bonus_days = 2").unwrap();
        assert_eq!(policy.easy_bonus_days, 2);
        assert_eq!(policy.initial_steps_days, vec![1, 6]);
        assert_eq!(policy.minimum_ease, 1.3);
    }
}
