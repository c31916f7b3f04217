//! Week records of the calendar timeline.
//!
//! # States
//!
//! | State | Stored | Meaning |
//! |-------|--------|---------|
//! | `Unset` | no | not decided yet (pending) |
//! | `Skipped` | yes | fixed, no shifts this week |
//! | `Active` | yes | fixed, shifts come from `rule_id` |
//!
//! `Unset → Skipped | Active` happens only by appending to the timeline;
//! the way back to `Unset` is truncation.

use serde::{Deserialize, Serialize};

use super::rule::RuleId;

/// Monday-starting week index counted from the calendar epoch.
pub type AbsWeek = usize;

/// Position of an activated week in the rotation history.
pub type RotationOffset = u64;

/// A committed (fixed) week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum WeekRecord {
    /// Active week governed by a rule.
    #[serde(rename_all = "camelCase")]
    Active {
        rule_id: RuleId,
        rotation_offset: RotationOffset,
    },
    /// Week without shifts (holiday, closure).
    Skipped,
}

impl WeekRecord {
    /// Whether this week was skipped.
    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self, WeekRecord::Skipped)
    }

    /// Rotation offset of an active week.
    #[inline]
    pub fn rotation_offset(&self) -> Option<RotationOffset> {
        match self {
            WeekRecord::Active {
                rotation_offset, ..
            } => Some(*rotation_offset),
            WeekRecord::Skipped => None,
        }
    }
}

/// State of any abs-week, committed or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum WeekState {
    /// Not committed.
    Unset,
    /// Fixed as skipped.
    Skipped,
    /// Fixed as active.
    #[serde(rename_all = "camelCase")]
    Active {
        rule_id: RuleId,
        rotation_offset: RotationOffset,
    },
}

impl WeekState {
    /// Whether the week is committed.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        !matches!(self, WeekState::Unset)
    }
}

impl From<Option<&WeekRecord>> for WeekState {
    fn from(record: Option<&WeekRecord>) -> Self {
        match record {
            None => WeekState::Unset,
            Some(WeekRecord::Skipped) => WeekState::Skipped,
            Some(&WeekRecord::Active {
                rule_id,
                rotation_offset,
            }) => WeekState::Active {
                rule_id,
                rotation_offset,
            },
        }
    }
}
