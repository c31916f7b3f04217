//! Error taxonomy.
//!
//! Every write path returns a named failure. Read paths (month derivation,
//! range queries) never fail on dangling data; they degrade to empty or
//! partial results instead (see [`crate::deriver`]).

use thiserror::Error;

use crate::models::{AbsWeek, GroupId, MemberId, RuleId};
use crate::plan::PlanId;

/// Failures of the timeline state machine.
///
/// Every variant is raised before any record is written, so a rejected
/// `apply_range` call leaves the timeline untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// The apply did not start at the first uncommitted week.
    #[error("out-of-order apply: expected week {expected}, got {got}")]
    OutOfOrderApply { expected: AbsWeek, got: AbsWeek },

    /// An activation was requested while the plan has no rules.
    #[error("cannot activate a week: the rule list is empty")]
    EmptyRuleList,

    /// An activated week would need a rotation offset past `u64::MAX`.
    #[error("rotation offset overflow")]
    RotationOverflow,
}

/// Rejection of a persisted plan at load time.
///
/// Imports are all-or-nothing: the first problem found rejects the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// A record's week index does not continue the contiguous prefix.
    #[error("timeline record {position} is at week {found}, expected week {expected}")]
    NonContiguous {
        position: usize,
        expected: AbsWeek,
        found: AbsWeek,
    },

    /// A committed active week names a rule the plan does not define.
    #[error("timeline week {week} references unknown rule {rule_id}")]
    UnknownRule { week: AbsWeek, rule_id: RuleId },

    /// Two entities of the same kind share an id.
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u64 },
}

/// Errors surfaced by the plan coordinator and the directory/catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("unknown plan {0}")]
    UnknownPlan(PlanId),

    #[error("unknown staff group {0}")]
    UnknownGroup(GroupId),

    #[error("unknown staff member {0}")]
    UnknownMember(MemberId),

    #[error("unknown weekly rule {0}")]
    UnknownRule(RuleId),

    /// Identity fields (names) must not be blank.
    #[error("{0} name must not be empty")]
    EmptyName(&'static str),

    /// A positional index was past the end of its list.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Abs-weeks are only defined from the calendar epoch on.
    #[error("date {0} is before the calendar epoch")]
    BeforeEpoch(chrono::NaiveDate),

    /// Month numbers are zero-based (0 = January .. 11 = December).
    #[error("invalid month {month} of year {year}")]
    InvalidMonth { year: i32, month: u32 },

    /// `apply_month` needs exactly one flag per displayed week row.
    #[error("expected {expected} week flags for this month, got {got}")]
    DecisionCountMismatch { expected: usize, got: usize },

    /// A flag disagrees with a week that is already fixed.
    #[error("week {week} is already fixed and cannot be changed")]
    OverwriteAttempt { week: AbsWeek },

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Configuration loading failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// Abs-week numbering requires a Monday epoch.
    #[error("epoch {0} is not a Monday")]
    EpochNotMonday(chrono::NaiveDate),
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
