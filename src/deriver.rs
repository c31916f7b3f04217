//! Month derivation: fixed weeks → concrete daily staff lists.
//!
//! # Algorithm
//!
//! 1. Take the month's week rows (see [`crate::calendar::MonthView`]).
//! 2. For each row, read the timeline state of its abs-week.
//!    `Skipped`, `Unset`, or an `Active` week whose rule no longer exists
//!    yields a week with seven empty days.
//! 3. For an active week, walk the seven days and both periods, collect the
//!    rule's assignments for that cell in chip order, and resolve each
//!    `(group, index)` against the *current* staff directory.
//! 4. References that do not resolve (deleted group, index past the end)
//!    are dropped from that cell.
//!
//! Derivation is read-only and never fails, so deriving the same month twice
//! without an intervening edit gives identical output. Member renames and
//! reorders are visible in already-fixed weeks on the next derivation.
//!
//! # Complexity
//! O(r * a) where r = rows (≤ 6) and a = assignments of the row's rule.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{MonthView, WeekRow};
use crate::models::{
    AbsWeek, GroupId, RotationOffset, RuleCatalog, RuleId, ShiftPeriod, StaffDirectory,
    WeekState, WeeklyRule,
};
use crate::timeline::CalendarTimeline;

/// Fixed/pending state of a displayed week row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "camelCase")]
pub enum RowStatus {
    /// Before the plan's first week; can never be fixed.
    BeforeBase,
    /// Not fixed yet.
    Pending,
    /// Fixed without shifts.
    FixedSkipped,
    /// Fixed with a rule.
    #[serde(rename_all = "camelCase")]
    FixedActive {
        rule_id: RuleId,
        rotation_offset: RotationOffset,
    },
}

impl RowStatus {
    /// Status of an abs-week in a timeline.
    pub fn of(timeline: &CalendarTimeline, abs_week: AbsWeek) -> Self {
        if abs_week < timeline.base_abs_week() {
            return RowStatus::BeforeBase;
        }
        match timeline.state(abs_week) {
            WeekState::Unset => RowStatus::Pending,
            WeekState::Skipped => RowStatus::FixedSkipped,
            WeekState::Active {
                rule_id,
                rotation_offset,
            } => RowStatus::FixedActive {
                rule_id,
                rotation_offset,
            },
        }
    }

    /// Whether the row is fixed (locked for editing).
    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(
            self,
            RowStatus::FixedSkipped | RowStatus::FixedActive { .. }
        )
    }

    /// Whether the row can still be decided by `apply_month`.
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, RowStatus::Pending)
    }
}

/// A resolved staff member in a derived cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedStaff {
    /// Current display name.
    pub name: String,
    /// Group the member was resolved from.
    pub group_id: GroupId,
    /// Rule index the member was resolved from.
    pub member_index: usize,
}

/// Staff of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayShift {
    pub date: NaiveDate,
    /// False for padding days from the neighbouring months.
    pub in_month: bool,
    pub morning: Vec<AssignedStaff>,
    pub afternoon: Vec<AssignedStaff>,
}

impl DayShift {
    fn empty(date: NaiveDate, in_month: bool) -> Self {
        Self {
            date,
            in_month,
            morning: Vec::new(),
            afternoon: Vec::new(),
        }
    }

    /// Staff of one period.
    pub fn period(&self, period: ShiftPeriod) -> &[AssignedStaff] {
        match period {
            ShiftPeriod::Morning => &self.morning,
            ShiftPeriod::Afternoon => &self.afternoon,
        }
    }

    /// Display names of one period, in chip order.
    pub fn names(&self, period: ShiftPeriod) -> Vec<&str> {
        self.period(period).iter().map(|s| s.name.as_str()).collect()
    }

    /// Whether nobody works this day.
    pub fn is_empty(&self) -> bool {
        self.morning.is_empty() && self.afternoon.is_empty()
    }
}

/// One derived week row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekShift {
    pub abs_week: AbsWeek,
    pub status: RowStatus,
    /// Name of the rule that produced the week, if it still exists.
    pub rule_name: Option<String>,
    /// Seven days, Monday first.
    pub days: Vec<DayShift>,
}

impl WeekShift {
    /// Day of the week by weekday.
    pub fn day(&self, weekday: Weekday) -> Option<&DayShift> {
        self.days.get(weekday.num_days_from_monday() as usize)
    }
}

/// Derived shifts of a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyShift {
    pub year: i32,
    /// Zero-based month.
    pub month: u32,
    pub weeks: Vec<WeekShift>,
}

impl MonthlyShift {
    /// Looks up a derived day by date.
    pub fn day(&self, date: NaiveDate) -> Option<&DayShift> {
        self.weeks
            .iter()
            .flat_map(|w| &w.days)
            .find(|d| d.date == date)
    }

    /// Total number of resolved staff slots across the month's rows.
    pub fn assignment_count(&self) -> usize {
        self.weeks
            .iter()
            .flat_map(|w| &w.days)
            .map(|d| d.morning.len() + d.afternoon.len())
            .sum()
    }
}

/// Resolves fixed weeks against the current rules and staff.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, Weekday};
/// use shift_rota::calendar::WeekCalendar;
/// use shift_rota::deriver::ShiftDeriver;
/// use shift_rota::models::{RuleAssignment, RuleCatalog, ShiftPeriod, StaffDirectory};
/// use shift_rota::timeline::CalendarTimeline;
///
/// let mut staff = StaffDirectory::new();
/// let kitchen = staff.add_group("kitchen").unwrap();
/// staff.add_member(kitchen, "Alice").unwrap();
///
/// let mut rules = RuleCatalog::new();
/// let standard = rules.add_rule("Standard").unwrap();
/// rules
///     .add_assignment(
///         standard,
///         RuleAssignment::new(Weekday::Mon, ShiftPeriod::Morning, kitchen, 0),
///     )
///     .unwrap();
///
/// let calendar = WeekCalendar::default();
/// let week = calendar.abs_week_of(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()).unwrap();
/// let mut timeline = CalendarTimeline::new(week, 0);
/// timeline.apply_range(&rules.rotation(), week, &[false]).unwrap();
///
/// let view = calendar.month_view(2026, 0).unwrap();
/// let month = ShiftDeriver::new(&staff, &rules, &timeline).derive(&view);
/// let monday = month.day(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()).unwrap();
/// assert_eq!(monday.names(ShiftPeriod::Morning), ["Alice"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ShiftDeriver<'a> {
    directory: &'a StaffDirectory,
    catalog: &'a RuleCatalog,
    timeline: &'a CalendarTimeline,
}

impl<'a> ShiftDeriver<'a> {
    /// Creates a deriver over one plan's parts.
    pub fn new(
        directory: &'a StaffDirectory,
        catalog: &'a RuleCatalog,
        timeline: &'a CalendarTimeline,
    ) -> Self {
        Self {
            directory,
            catalog,
            timeline,
        }
    }

    /// Derives every row of a month view.
    pub fn derive(&self, view: &MonthView) -> MonthlyShift {
        MonthlyShift {
            year: view.year,
            month: view.month,
            weeks: view.rows.iter().map(|row| self.derive_week(row)).collect(),
        }
    }

    /// Statuses of a month view's rows, without resolving staff.
    pub fn statuses(&self, view: &MonthView) -> Vec<RowStatus> {
        view.abs_weeks()
            .map(|w| RowStatus::of(self.timeline, w))
            .collect()
    }

    /// Derives one week row.
    pub fn derive_week(&self, row: &WeekRow) -> WeekShift {
        let status = RowStatus::of(self.timeline, row.abs_week);
        let mut days: Vec<DayShift> = row
            .days
            .iter()
            .map(|d| DayShift::empty(d.date, d.in_month))
            .collect();

        let rule = match status {
            RowStatus::FixedActive { rule_id, .. } => {
                let rule = self.catalog.rule(rule_id);
                if rule.is_none() {
                    debug!(week = row.abs_week, rule_id, "fixed week uses a deleted rule");
                }
                rule
            }
            _ => None,
        };

        if let Some(rule) = rule {
            for day in &mut days {
                let weekday = day.date.weekday();
                day.morning = self.resolve_cell(rule, weekday, ShiftPeriod::Morning);
                day.afternoon = self.resolve_cell(rule, weekday, ShiftPeriod::Afternoon);
            }
        }

        WeekShift {
            abs_week: row.abs_week,
            status,
            rule_name: rule.map(|r| r.name.clone()),
            days,
        }
    }

    fn resolve_cell(
        &self,
        rule: &WeeklyRule,
        weekday: Weekday,
        period: ShiftPeriod,
    ) -> Vec<AssignedStaff> {
        rule.slot(weekday, period)
            .filter_map(|a| {
                let member = self
                    .directory
                    .resolve(a.target_group_id, a.target_member_index);
                if member.is_none() {
                    debug!(
                        rule_id = rule.id,
                        group_id = a.target_group_id,
                        index = a.target_member_index,
                        "dropping dangling assignment"
                    );
                }
                member.map(|m| AssignedStaff {
                    name: m.display_name.clone(),
                    group_id: a.target_group_id,
                    member_index: a.target_member_index,
                })
            })
            .collect()
    }
}
