use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::policy::ReviewPolicy;
use crate::error::SchedulingError;

/// Coarse learning progress of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryState {
    New,
    Learning,
    Review,
    Mastered,
}

impl MasteryState {
    /// Derive the state from the repetition count and interval alone.
    pub fn classify(repetition_count: u32, interval_days: u32, policy: &ReviewPolicy) -> Self {
        if repetition_count == 0 {
            if interval_days == 0 {
                MasteryState::New
            } else {
                MasteryState::Learning
            }
        } else if repetition_count >= policy.mastery_repetitions
            && interval_days >= policy.mastery_interval_days
        {
            MasteryState::Mastered
        } else {
            MasteryState::Review
        }
    }
}

impl fmt::Display for MasteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MasteryState::New => "new",
            MasteryState::Learning => "learning",
            MasteryState::Review => "review",
            MasteryState::Mastered => "mastered",
        };
        f.write_str(s)
    }
}

/// How well the learner recalled an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecallQuality {
    Again,
    Hard,
    Good,
    Easy,
}

impl RecallQuality {
    /// Ease factor change for this grade.
    pub(crate) fn ease_delta(self, policy: &ReviewPolicy) -> f64 {
        match self {
            RecallQuality::Again => -policy.again_ease_penalty,
            RecallQuality::Hard => policy.hard_ease_delta,
            RecallQuality::Good => 0.0,
            RecallQuality::Easy => policy.easy_ease_delta,
        }
    }
}

impl TryFrom<u8> for RecallQuality {
    type Error = SchedulingError;

    /// Button order: 1 = again, 2 = hard, 3 = good, 4 = easy.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RecallQuality::Again),
            2 => Ok(RecallQuality::Hard),
            3 => Ok(RecallQuality::Good),
            4 => Ok(RecallQuality::Easy),
            other => Err(SchedulingError::InvalidQuality {
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for RecallQuality {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" => Ok(RecallQuality::Again),
            "hard" => Ok(RecallQuality::Hard),
            "good" => Ok(RecallQuality::Good),
            "easy" => Ok(RecallQuality::Easy),
            other => other
                .parse::<u8>()
                .map_err(|_| SchedulingError::InvalidQuality {
                    value: s.to_string(),
                })
                .and_then(RecallQuality::try_from),
        }
    }
}

impl fmt::Display for RecallQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecallQuality::Again => "again",
            RecallQuality::Hard => "hard",
            RecallQuality::Good => "good",
            RecallQuality::Easy => "easy",
        };
        f.write_str(s)
    }
}

/// Review state of one flashcard.
///
/// Only [`record_review`](super::record_review) produces updated items;
/// `mastery_state` always matches [`MasteryState::classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorizationItem {
    pub id: String,
    /// Free-form text shown to the learner.
    #[serde(default)]
    pub label: String,
    pub repetition_count: u32,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub next_review_at: DateTime<Utc>,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub mastery_state: MasteryState,
}

impl MemorizationItem {
    /// A fresh item, due immediately.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        policy: &ReviewPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            repetition_count: 0,
            ease_factor: policy.starting_ease,
            interval_days: 0,
            next_review_at: now,
            last_reviewed_at: None,
            mastery_state: MasteryState::New,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }
}
