//! Persisted form of a plan.
//!
//! ```json
//! {
//!   "id": 1,
//!   "name": "Bistro",
//!   "groups": [{ "id": 1, "name": "kitchen", "sortOrder": 0, "members": [...] }],
//!   "rules": [{ "id": 1, "name": "Standard", "sortOrder": 0, "assignments": [...] }],
//!   "timeline": {
//!     "baseAbsWeek": 2919,
//!     "initialRotationOffset": 0,
//!     "records": [
//!       { "absWeek": 2919, "record": { "type": "active", "content": { "ruleId": 1, "rotationOffset": 0 } } },
//!       { "absWeek": 2920, "record": { "type": "skipped" } }
//!     ]
//!   }
//! }
//! ```
//!
//! Each record carries its abs-week so storage can keep one row per week.
//! [`PlanSnapshot::restore`] accepts records in any order but rejects the
//! whole snapshot unless they form a gap-free run from `baseAbsWeek`.

use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::models::{
    AbsWeek, RotationOffset, RuleCatalog, StaffDirectory, StaffGroup, WeekRecord, WeeklyRule,
};
use crate::plan::{Plan, PlanId};
use crate::timeline::CalendarTimeline;

/// Durable plan state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub id: PlanId,
    pub name: String,
    pub groups: Vec<StaffGroup>,
    pub rules: Vec<WeeklyRule>,
    pub timeline: TimelineSnapshot,
}

/// Durable timeline state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    pub base_abs_week: AbsWeek,
    pub initial_rotation_offset: RotationOffset,
    pub records: Vec<TimelineEntry>,
}

/// One fixed week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub abs_week: AbsWeek,
    pub record: WeekRecord,
}

impl TimelineSnapshot {
    /// Persisted form of a timeline.
    pub fn capture(timeline: &CalendarTimeline) -> Self {
        let base = timeline.base_abs_week();
        Self {
            base_abs_week: base,
            initial_rotation_offset: timeline.initial_rotation_offset(),
            records: timeline
                .records()
                .iter()
                .enumerate()
                .map(|(i, &record)| TimelineEntry {
                    abs_week: base + i,
                    record,
                })
                .collect(),
        }
    }

    /// Rebuilds a timeline, checking contiguity and rule references.
    pub fn restore(mut self, catalog: &RuleCatalog) -> Result<CalendarTimeline, ImportError> {
        self.records.sort_by_key(|e| e.abs_week);

        let mut records = Vec::with_capacity(self.records.len());
        for (position, entry) in self.records.iter().enumerate() {
            let expected = self.base_abs_week + position;
            if entry.abs_week != expected {
                return Err(ImportError::NonContiguous {
                    position,
                    expected,
                    found: entry.abs_week,
                });
            }
            if let WeekRecord::Active { rule_id, .. } = entry.record {
                if catalog.rule(rule_id).is_none() {
                    return Err(ImportError::UnknownRule {
                        week: entry.abs_week,
                        rule_id,
                    });
                }
            }
            records.push(entry.record);
        }

        Ok(CalendarTimeline::with_records(
            self.base_abs_week,
            self.initial_rotation_offset,
            records,
        ))
    }
}

impl PlanSnapshot {
    /// Persisted form of a plan.
    pub fn capture(plan: &Plan) -> Self {
        Self {
            id: plan.id(),
            name: plan.name().to_string(),
            groups: plan.groups().to_vec(),
            rules: plan.rules().to_vec(),
            timeline: TimelineSnapshot::capture(plan.timeline()),
        }
    }

    /// Rebuilds the plan under `id`. All-or-nothing.
    pub fn restore(self, id: PlanId) -> Result<Plan, ImportError> {
        let directory = StaffDirectory::from_groups(self.groups)?;
        let catalog = RuleCatalog::from_rules(self.rules)?;
        let timeline = self.timeline.restore(&catalog)?;
        Ok(Plan::from_parts(id, self.name, directory, catalog, timeline))
    }
}
