//! Plans and the plan coordinator.
//!
//! A [`Plan`] owns one staff directory, one rule catalog and one calendar
//! timeline. The [`PlanCoordinator`] keeps a registry of independent plans
//! and exposes the operations a UI or storage layer calls.
//!
//! # Operations
//!
//! | Area | Operations |
//! |------|------------|
//! | Lifecycle | `create_plan`, `create_plan_at`, `list_plans`, `rename_plan`, `delete_plan` |
//! | Staff | `add_group`, `remove_group`, `rename_group`, `add_member`, `remove_member`, `rename_member`, `move_member` |
//! | Rules | `add_rule`, `remove_rule`, `rename_rule`, `move_rule`, `add_assignment`, `remove_assignment` |
//! | Timeline | `apply_month`, `reset_from_month`, `rebase_rotation`, `query_range` |
//! | Read | `derive_month`, `month_status`, `diagnose` |
//! | Persistence | `export_plan`, `import_plan` |
//!
//! Edits return the id or value they create; the updated aggregate is read
//! back through [`PlanCoordinator::plan`].
//!
//! # Month contract
//! `apply_month` takes one skip flag per row of the displayed month, the way
//! a calendar view lists them. Rows before the plan's base week are ignored,
//! fixed rows must agree with their flag, and the remaining pending rows are
//! committed in one atomic `apply_range` call.

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calendar::{MonthView, WeekCalendar};
use crate::config::EngineConfig;
use crate::deriver::{MonthlyShift, RowStatus, ShiftDeriver};
use crate::error::{ConfigError, PlanError};
use crate::models::{
    non_empty, AbsWeek, GroupId, MemberId, RotationOffset, RuleAssignment, RuleCatalog, RuleId,
    ShiftPeriod, StaffDirectory, StaffGroup, StaffMember, WeekState, WeeklyRule,
};
use crate::snapshot::PlanSnapshot;
use crate::timeline::CalendarTimeline;
use crate::validation::{diagnose_plan, ValidationError};

/// Plan identifier (unique within a coordinator, never reused).
pub type PlanId = u64;

/// One scheduling plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    id: PlanId,
    name: String,
    directory: StaffDirectory,
    catalog: RuleCatalog,
    timeline: CalendarTimeline,
}

impl Plan {
    /// Creates an empty plan whose timeline starts at `base_abs_week`.
    pub fn new(
        id: PlanId,
        name: impl Into<String>,
        base_abs_week: AbsWeek,
        initial_rotation_offset: RotationOffset,
    ) -> Self {
        Self::from_parts(
            id,
            name,
            StaffDirectory::new(),
            RuleCatalog::new(),
            CalendarTimeline::new(base_abs_week, initial_rotation_offset),
        )
    }

    /// Assembles a plan from already validated parts.
    pub fn from_parts(
        id: PlanId,
        name: impl Into<String>,
        directory: StaffDirectory,
        catalog: RuleCatalog,
        timeline: CalendarTimeline,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            directory,
            catalog,
            timeline,
        }
    }

    #[inline]
    pub fn id(&self) -> PlanId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn directory(&self) -> &StaffDirectory {
        &self.directory
    }

    #[inline]
    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    #[inline]
    pub fn timeline(&self) -> &CalendarTimeline {
        &self.timeline
    }

    /// Groups in display order.
    pub fn groups(&self) -> &[StaffGroup] {
        self.directory.groups()
    }

    /// Rules in rotation order.
    pub fn rules(&self) -> &[WeeklyRule] {
        self.catalog.rules()
    }

    /// Deriver over this plan's current state.
    pub fn deriver(&self) -> ShiftDeriver<'_> {
        ShiftDeriver::new(&self.directory, &self.catalog, &self.timeline)
    }

    fn summary(&self) -> PlanSummary {
        PlanSummary {
            id: self.id,
            name: self.name.clone(),
            base_abs_week: self.timeline.base_abs_week(),
            fixed_weeks: self.timeline.len(),
        }
    }
}

/// Listing entry of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: PlanId,
    pub name: String,
    pub base_abs_week: AbsWeek,
    /// Number of committed weeks.
    pub fixed_weeks: usize,
}

/// Registry of plans and the entry point for every plan operation.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, Weekday};
/// use shift_rota::models::{RuleAssignment, ShiftPeriod};
/// use shift_rota::plan::PlanCoordinator;
///
/// let mut rota = PlanCoordinator::new();
/// let plan = rota
///     .create_plan("Bistro", NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
///     .unwrap();
/// let kitchen = rota.add_group(plan, "kitchen").unwrap();
/// rota.add_member(plan, kitchen, "Alice").unwrap();
/// let rule = rota.add_rule(plan, "Standard").unwrap();
/// rota.add_assignment(
///     plan,
///     rule,
///     RuleAssignment::new(Weekday::Mon, ShiftPeriod::Morning, kitchen, 0),
/// )
/// .unwrap();
///
/// // January 2026 has five rows; the first lies before the plan's base week.
/// rota.apply_month(plan, 2026, 0, &[false, false, true, false, false]).unwrap();
///
/// let month = rota.derive_month(plan, 2026, 0).unwrap();
/// let day = month.day(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()).unwrap();
/// assert_eq!(day.names(ShiftPeriod::Morning), ["Alice"]);
/// assert!(month.day(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()).unwrap().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct PlanCoordinator {
    config: EngineConfig,
    calendar: WeekCalendar,
    plans: BTreeMap<PlanId, Plan>,
    next_plan_id: PlanId,
}

impl PlanCoordinator {
    /// Creates a coordinator with the default configuration.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            calendar: WeekCalendar::default(),
            plans: BTreeMap::new(),
            next_plan_id: 1,
        }
    }

    /// Creates a coordinator with a validated configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        let calendar = config.calendar()?;
        Ok(Self {
            config,
            calendar,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calendar(&self) -> &WeekCalendar {
        &self.calendar
    }

    // ---- lifecycle ----

    /// Creates a plan starting at the week containing `start`.
    pub fn create_plan(
        &mut self,
        name: impl Into<String>,
        start: NaiveDate,
    ) -> Result<PlanId, PlanError> {
        let base = self
            .calendar
            .abs_week_of(start)
            .ok_or(PlanError::BeforeEpoch(start))?;
        self.create_plan_at(name, base, self.config.default_initial_rotation)
    }

    /// Creates a plan with explicit timeline parameters.
    pub fn create_plan_at(
        &mut self,
        name: impl Into<String>,
        base_abs_week: AbsWeek,
        initial_rotation_offset: RotationOffset,
    ) -> Result<PlanId, PlanError> {
        let name = non_empty(name.into(), "plan")?;
        let id = self.register_plan(|id| {
            Ok(Plan::new(id, name, base_abs_week, initial_rotation_offset))
        })?;
        info!(plan = id, base_abs_week, "created plan");
        Ok(id)
    }

    /// Plans in id order.
    pub fn list_plans(&self) -> Vec<PlanSummary> {
        self.plans.values().map(Plan::summary).collect()
    }

    /// Looks up a plan.
    pub fn plan(&self, plan_id: PlanId) -> Result<&Plan, PlanError> {
        self.plans.get(&plan_id).ok_or(PlanError::UnknownPlan(plan_id))
    }

    pub fn rename_plan(
        &mut self,
        plan_id: PlanId,
        name: impl Into<String>,
    ) -> Result<(), PlanError> {
        let name = non_empty(name.into(), "plan")?;
        self.plan_mut(plan_id)?.name = name;
        Ok(())
    }

    /// Deletes a plan with its staff, rules and timeline.
    pub fn delete_plan(&mut self, plan_id: PlanId) -> Result<Plan, PlanError> {
        let plan = self
            .plans
            .remove(&plan_id)
            .ok_or(PlanError::UnknownPlan(plan_id))?;
        info!(plan = plan_id, "deleted plan");
        Ok(plan)
    }

    // ---- staff ----

    pub fn add_group(
        &mut self,
        plan_id: PlanId,
        name: impl Into<String>,
    ) -> Result<GroupId, PlanError> {
        self.plan_mut(plan_id)?.directory.add_group(name)
    }

    pub fn remove_group(
        &mut self,
        plan_id: PlanId,
        group_id: GroupId,
    ) -> Result<StaffGroup, PlanError> {
        self.plan_mut(plan_id)?.directory.remove_group(group_id)
    }

    pub fn rename_group(
        &mut self,
        plan_id: PlanId,
        group_id: GroupId,
        name: impl Into<String>,
    ) -> Result<(), PlanError> {
        self.plan_mut(plan_id)?.directory.rename_group(group_id, name)
    }

    pub fn add_member(
        &mut self,
        plan_id: PlanId,
        group_id: GroupId,
        display_name: impl Into<String>,
    ) -> Result<MemberId, PlanError> {
        self.plan_mut(plan_id)?
            .directory
            .add_member(group_id, display_name)
    }

    pub fn remove_member(
        &mut self,
        plan_id: PlanId,
        member_id: MemberId,
    ) -> Result<StaffMember, PlanError> {
        self.plan_mut(plan_id)?.directory.remove_member(member_id)
    }

    pub fn rename_member(
        &mut self,
        plan_id: PlanId,
        member_id: MemberId,
        display_name: impl Into<String>,
    ) -> Result<(), PlanError> {
        self.plan_mut(plan_id)?
            .directory
            .rename_member(member_id, display_name)
    }

    /// Moves a member within its group; see [`StaffDirectory::move_member`].
    pub fn move_member(
        &mut self,
        plan_id: PlanId,
        group_id: GroupId,
        from: usize,
        to: usize,
    ) -> Result<(), PlanError> {
        self.plan_mut(plan_id)?
            .directory
            .move_member(group_id, from, to)
    }

    // ---- rules ----

    pub fn add_rule(
        &mut self,
        plan_id: PlanId,
        name: impl Into<String>,
    ) -> Result<RuleId, PlanError> {
        self.plan_mut(plan_id)?.catalog.add_rule(name)
    }

    pub fn remove_rule(
        &mut self,
        plan_id: PlanId,
        rule_id: RuleId,
    ) -> Result<WeeklyRule, PlanError> {
        self.plan_mut(plan_id)?.catalog.remove_rule(rule_id)
    }

    pub fn rename_rule(
        &mut self,
        plan_id: PlanId,
        rule_id: RuleId,
        name: impl Into<String>,
    ) -> Result<(), PlanError> {
        self.plan_mut(plan_id)?.catalog.rename_rule(rule_id, name)
    }

    pub fn move_rule(&mut self, plan_id: PlanId, from: usize, to: usize) -> Result<(), PlanError> {
        self.plan_mut(plan_id)?.catalog.move_rule(from, to)
    }

    /// Adds an assignment, returning its index within its cell.
    pub fn add_assignment(
        &mut self,
        plan_id: PlanId,
        rule_id: RuleId,
        assignment: RuleAssignment,
    ) -> Result<usize, PlanError> {
        self.plan_mut(plan_id)?
            .catalog
            .add_assignment(rule_id, assignment)
    }

    /// Removes the `index`-th assignment of a cell.
    pub fn remove_assignment(
        &mut self,
        plan_id: PlanId,
        rule_id: RuleId,
        weekday: Weekday,
        period: ShiftPeriod,
        index: usize,
    ) -> Result<RuleAssignment, PlanError> {
        self.plan_mut(plan_id)?
            .catalog
            .remove_assignment(rule_id, weekday, period, index)
    }

    // ---- timeline ----

    /// Commits the pending rows of a month; `flags[i] == true` skips row `i`.
    ///
    /// Returns the committed abs-week range (empty if nothing was pending).
    ///
    /// # Errors
    /// - [`PlanError::UnknownPlan`] if the plan does not exist.
    /// - [`PlanError::InvalidMonth`] for a month outside 0..=11.
    /// - [`PlanError::DecisionCountMismatch`] unless there is one flag per row.
    /// - [`PlanError::OverwriteAttempt`] if a flag contradicts a fixed row.
    /// - [`PlanError::Timeline`] if the pending rows do not continue the
    ///   timeline or need a rule while none exists.
    pub fn apply_month(
        &mut self,
        plan_id: PlanId,
        year: i32,
        month: u32,
        flags: &[bool],
    ) -> Result<Range<AbsWeek>, PlanError> {
        let calendar = self.calendar;
        let plan = self.plan_mut(plan_id)?;
        let view = month_view(&calendar, year, month)?;
        if flags.len() != view.len() {
            return Err(PlanError::DecisionCountMismatch {
                expected: view.len(),
                got: flags.len(),
            });
        }

        let mut from = None;
        let mut decisions = Vec::with_capacity(flags.len());
        for (week, &skip) in view.abs_weeks().zip(flags) {
            match RowStatus::of(&plan.timeline, week) {
                RowStatus::BeforeBase => {}
                RowStatus::Pending => {
                    from.get_or_insert(week);
                    decisions.push(skip);
                }
                RowStatus::FixedSkipped if skip => {}
                RowStatus::FixedActive { .. } if !skip => {}
                RowStatus::FixedSkipped | RowStatus::FixedActive { .. } => {
                    warn!(plan = plan_id, week, "flag contradicts a fixed week");
                    return Err(PlanError::OverwriteAttempt { week });
                }
            }
        }

        let Some(from) = from else {
            let next = plan.timeline.next_unset();
            return Ok(next..next);
        };
        let rotation = plan.catalog.rotation();
        Ok(plan.timeline.apply_range(&rotation, from, &decisions)?)
    }

    /// Unfixes the displayed month and everything after it.
    ///
    /// The cut is the row holding the month's first day, or the epoch week
    /// if that row is before the epoch. Returns the number of weeks removed.
    /// Destructive: callers should confirm with the user.
    pub fn reset_from_month(
        &mut self,
        plan_id: PlanId,
        year: i32,
        month: u32,
    ) -> Result<usize, PlanError> {
        let calendar = self.calendar;
        let plan = self.plan_mut(plan_id)?;
        let view = month_view(&calendar, year, month)?;
        let cut = view.first_week().unwrap_or(0);
        Ok(plan.timeline.truncate_from(cut))
    }

    /// Renumbers the rotation offsets of fixed active weeks from `initial`.
    pub fn rebase_rotation(
        &mut self,
        plan_id: PlanId,
        initial: RotationOffset,
    ) -> Result<(), PlanError> {
        Ok(self.plan_mut(plan_id)?.timeline.rebase_rotation(initial)?)
    }

    /// Timeline states for `[from, to)`.
    pub fn query_range(
        &self,
        plan_id: PlanId,
        from: AbsWeek,
        to: AbsWeek,
    ) -> Result<Vec<WeekState>, PlanError> {
        Ok(self.plan(plan_id)?.timeline.query_range(from, to))
    }

    // ---- read ----

    /// Concrete staff per day and period for every row of a month.
    pub fn derive_month(
        &self,
        plan_id: PlanId,
        year: i32,
        month: u32,
    ) -> Result<MonthlyShift, PlanError> {
        let plan = self.plan(plan_id)?;
        let view = month_view(&self.calendar, year, month)?;
        Ok(plan.deriver().derive(&view))
    }

    /// Fixed/pending state of each row of a month.
    pub fn month_status(
        &self,
        plan_id: PlanId,
        year: i32,
        month: u32,
    ) -> Result<Vec<(AbsWeek, RowStatus)>, PlanError> {
        let plan = self.plan(plan_id)?;
        let view = month_view(&self.calendar, year, month)?;
        Ok(view
            .abs_weeks()
            .map(|w| (w, RowStatus::of(&plan.timeline, w)))
            .collect())
    }

    /// Dangling references of a plan.
    pub fn diagnose(&self, plan_id: PlanId) -> Result<Vec<ValidationError>, PlanError> {
        Ok(diagnose_plan(self.plan(plan_id)?))
    }

    // ---- persistence ----

    /// Persisted form of a plan.
    pub fn export_plan(&self, plan_id: PlanId) -> Result<PlanSnapshot, PlanError> {
        Ok(PlanSnapshot::capture(self.plan(plan_id)?))
    }

    /// Loads a persisted plan under a fresh id.
    ///
    /// The whole snapshot is rejected if its timeline is not contiguous,
    /// names unknown rules, or repeats ids.
    pub fn import_plan(&mut self, snapshot: PlanSnapshot) -> Result<PlanId, PlanError> {
        let source_id = snapshot.id;
        let id = self.register_plan(|id| {
            snapshot.restore(id).map_err(|e| {
                warn!(source_id, error = %e, "rejected plan import");
                PlanError::from(e)
            })
        })?;
        info!(plan = id, source_id, "imported plan");
        Ok(id)
    }

    fn plan_mut(&mut self, plan_id: PlanId) -> Result<&mut Plan, PlanError> {
        self.plans
            .get_mut(&plan_id)
            .ok_or(PlanError::UnknownPlan(plan_id))
    }

    /// Builds a plan under the next free id; the id is consumed only if
    /// `build` succeeds.
    fn register_plan(
        &mut self,
        build: impl FnOnce(PlanId) -> Result<Plan, PlanError>,
    ) -> Result<PlanId, PlanError> {
        let id = self.next_plan_id.max(1);
        let plan = build(id)?;
        self.next_plan_id = id + 1;
        self.plans.insert(id, plan);
        Ok(id)
    }
}

fn month_view(calendar: &WeekCalendar, year: i32, month: u32) -> Result<MonthView, PlanError> {
    calendar
        .month_view(year, month)
        .ok_or(PlanError::InvalidMonth { year, month })
}

impl Default for PlanCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ImportError, TimelineError};
    use crate::models::ShiftPeriod::Morning;
    use crate::models::WeekRecord;
    use chrono::Weekday::{Mon, Tue};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Plan starting at 2026-01-05 with kitchen = [Alice, Bob] and rules
    /// A (Alice Monday morning) and B (Bob Tuesday morning).
    fn setup() -> (PlanCoordinator, PlanId, RuleId, RuleId) {
        let mut rota = PlanCoordinator::new();
        let plan = rota.create_plan("Bistro", date(2026, 1, 5)).unwrap();
        let kitchen = rota.add_group(plan, "kitchen").unwrap();
        rota.add_member(plan, kitchen, "Alice").unwrap();
        rota.add_member(plan, kitchen, "Bob").unwrap();
        let a = rota.add_rule(plan, "A").unwrap();
        let b = rota.add_rule(plan, "B").unwrap();
        rota.add_assignment(plan, a, RuleAssignment::new(Mon, Morning, kitchen, 0))
            .unwrap();
        rota.add_assignment(plan, b, RuleAssignment::new(Tue, Morning, kitchen, 1))
            .unwrap();
        (rota, plan, a, b)
    }

    #[test]
    fn test_plan_lifecycle() {
        let mut rota = PlanCoordinator::new();
        let p1 = rota.create_plan_at("One", 100, 0).unwrap();
        let p2 = rota.create_plan_at("Two", 200, 3).unwrap();
        assert_eq!(rota.list_plans().len(), 2);

        rota.rename_plan(p1, "First").unwrap();
        assert_eq!(rota.plan(p1).unwrap().name(), "First");
        assert_eq!(rota.rename_plan(p1, " "), Err(PlanError::EmptyName("plan")));

        rota.delete_plan(p1).unwrap();
        assert_eq!(rota.plan(p1).err(), Some(PlanError::UnknownPlan(p1)));
        let p3 = rota.create_plan_at("Three", 0, 0).unwrap();
        assert!(p3 > p2);

        let list = rota.list_plans();
        assert_eq!(list[0].id, p2);
        assert_eq!(list[0].base_abs_week, 200);
        assert_eq!(list[0].fixed_weeks, 0);
    }

    #[test]
    fn test_create_plan_before_epoch() {
        let mut rota = PlanCoordinator::new();
        assert_eq!(
            rota.create_plan("Old", date(1960, 1, 1)),
            Err(PlanError::BeforeEpoch(date(1960, 1, 1)))
        );
    }

    #[test]
    fn test_config_initial_rotation() {
        let config = EngineConfig::default().with_default_initial_rotation(1);
        let mut rota = PlanCoordinator::with_config(config).unwrap();
        let plan = rota.create_plan("X", date(2026, 1, 5)).unwrap();
        assert_eq!(rota.plan(plan).unwrap().timeline().initial_rotation_offset(), 1);
    }

    #[test]
    fn test_apply_month_ignores_rows_before_base() {
        let (mut rota, plan, a, b) = setup();
        let range = rota
            .apply_month(plan, 2026, 0, &[true, false, true, false, false])
            .unwrap();
        let base = rota.plan(plan).unwrap().timeline().base_abs_week();
        assert_eq!(range, base..base + 4);

        let records = rota.plan(plan).unwrap().timeline().records().to_vec();
        assert_eq!(
            records,
            [
                WeekRecord::Active {
                    rule_id: a,
                    rotation_offset: 0
                },
                WeekRecord::Skipped,
                WeekRecord::Active {
                    rule_id: b,
                    rotation_offset: 1
                },
                WeekRecord::Active {
                    rule_id: a,
                    rotation_offset: 2
                },
            ]
        );
    }

    #[test]
    fn test_apply_month_flag_count() {
        let (mut rota, plan, _, _) = setup();
        assert_eq!(
            rota.apply_month(plan, 2026, 0, &[false; 4]),
            Err(PlanError::DecisionCountMismatch {
                expected: 5,
                got: 4
            })
        );
        assert_eq!(
            rota.apply_month(plan, 2026, 12, &[]),
            Err(PlanError::InvalidMonth {
                year: 2026,
                month: 12
            })
        );
    }

    #[test]
    fn test_apply_month_fixed_rows() {
        let (mut rota, plan, _, _) = setup();
        rota.apply_month(plan, 2026, 0, &[false, false, true, false, false])
            .unwrap();
        let before = rota.plan(plan).unwrap().clone();

        // Same flags again: nothing pending, no change.
        let range = rota
            .apply_month(plan, 2026, 0, &[false, false, true, false, false])
            .unwrap();
        assert!(range.is_empty());

        // Flipping a fixed row is rejected and nothing is written.
        let base = before.timeline().base_abs_week();
        assert_eq!(
            rota.apply_month(plan, 2026, 0, &[false, false, false, false, false]),
            Err(PlanError::OverwriteAttempt { week: base + 1 })
        );
        assert_eq!(rota.plan(plan).unwrap(), &before);
    }

    #[test]
    fn test_apply_month_continues_into_next_month() {
        let (mut rota, plan, _, _) = setup();
        rota.apply_month(plan, 2026, 0, &[false; 5]).unwrap();
        // February's first row (week of Jan 26) is already fixed active.
        let feb_rows = rota.month_status(plan, 2026, 1).unwrap().len();
        let mut flags = vec![false; feb_rows];
        flags[1] = true;
        rota.apply_month(plan, 2026, 1, &flags).unwrap();

        let status = rota.month_status(plan, 2026, 1).unwrap();
        assert!(status.iter().all(|(_, s)| s.is_fixed()));
        assert_eq!(status[1].1, RowStatus::FixedSkipped);
    }

    #[test]
    fn test_apply_month_out_of_order() {
        let (mut rota, plan, _, _) = setup();
        let rows = rota.month_status(plan, 2026, 2).unwrap().len();
        let err = rota.apply_month(plan, 2026, 2, &vec![false; rows]).unwrap_err();
        assert!(matches!(
            err,
            PlanError::Timeline(TimelineError::OutOfOrderApply { .. })
        ));
    }

    #[test]
    fn test_apply_month_without_rules() {
        let mut rota = PlanCoordinator::new();
        let plan = rota.create_plan("Empty", date(2026, 1, 5)).unwrap();
        assert_eq!(
            rota.apply_month(plan, 2026, 0, &[false; 5]),
            Err(PlanError::Timeline(TimelineError::EmptyRuleList))
        );
        rota.apply_month(plan, 2026, 0, &[true; 5]).unwrap();
        assert_eq!(rota.plan(plan).unwrap().timeline().len(), 4);
    }

    #[test]
    fn test_reset_from_month() {
        let (mut rota, plan, _, _) = setup();
        rota.apply_month(plan, 2026, 0, &[false; 5]).unwrap();
        let rows = rota.month_status(plan, 2026, 1).unwrap().len();
        rota.apply_month(plan, 2026, 1, &vec![false; rows]).unwrap();

        // February starts in the week of Jan 26, which is cut too.
        let removed = rota.reset_from_month(plan, 2026, 1).unwrap();
        assert_eq!(removed, rows);
        let status = rota.month_status(plan, 2026, 0).unwrap();
        assert!(status[1..4].iter().all(|(_, s)| s.is_fixed()));
        assert_eq!(status[4].1, RowStatus::Pending);

        // Resetting an untouched month removes nothing.
        assert_eq!(rota.reset_from_month(plan, 2027, 0).unwrap(), 0);
    }

    #[test]
    fn test_rule_reorder_only_affects_future_weeks() {
        let (mut rota, plan, a, _) = setup();
        rota.apply_month(plan, 2026, 0, &[false; 5]).unwrap();
        let jan = rota.derive_month(plan, 2026, 0).unwrap();

        rota.move_rule(plan, 1, 0).unwrap();
        assert_eq!(rota.derive_month(plan, 2026, 0).unwrap(), jan);
        assert_eq!(rota.query_range(plan, 0, 1).unwrap(), [WeekState::Unset]);
        let base = rota.plan(plan).unwrap().timeline().base_abs_week();
        assert_eq!(
            rota.query_range(plan, base, base + 1).unwrap(),
            [WeekState::Active {
                rule_id: a,
                rotation_offset: 0
            }]
        );
    }

    #[test]
    fn test_rebase_rotation() {
        let (mut rota, plan, _, _) = setup();
        rota.apply_month(plan, 2026, 0, &[false, true, false, false, false])
            .unwrap();
        rota.rebase_rotation(plan, 7).unwrap();
        let t = rota.plan(plan).unwrap().timeline();
        assert_eq!(t.initial_rotation_offset(), 7);
        assert_eq!(t.next_rotation_offset(), Some(10));
    }

    #[test]
    fn test_unknown_plan() {
        let mut rota = PlanCoordinator::new();
        assert_eq!(rota.add_group(9, "x"), Err(PlanError::UnknownPlan(9)));
        assert_eq!(
            rota.derive_month(9, 2026, 0).err(),
            Some(PlanError::UnknownPlan(9))
        );
    }

    #[test]
    fn test_unknown_plan_checked_before_flags() {
        let mut rota = PlanCoordinator::new();
        assert_eq!(
            rota.apply_month(9, 2026, 0, &[false; 2]),
            Err(PlanError::UnknownPlan(9))
        );
        assert_eq!(
            rota.apply_month(9, 2026, 12, &[]),
            Err(PlanError::UnknownPlan(9))
        );
        assert_eq!(
            rota.reset_from_month(9, 2026, 12),
            Err(PlanError::UnknownPlan(9))
        );
    }

    #[test]
    fn test_epoch_inside_month() {
        // The epoch is the first Monday of January 2026, so the row holding
        // Jan 1 has no abs-week and January shows four rows.
        let config = EngineConfig::default().with_epoch(date(2026, 1, 5));
        let mut rota = PlanCoordinator::with_config(config).unwrap();
        let plan = rota.create_plan("Epoch", date(2026, 1, 5)).unwrap();
        let rule = rota.add_rule(plan, "Only").unwrap();
        assert_eq!(rota.plan(plan).unwrap().timeline().base_abs_week(), 0);

        let status = rota.month_status(plan, 2026, 0).unwrap();
        assert_eq!(status.len(), 4);
        assert!(status.iter().all(|(_, s)| s.is_pending()));
        assert_eq!(rota.derive_month(plan, 2026, 0).unwrap().weeks.len(), 4);

        assert_eq!(
            rota.apply_month(plan, 2026, 0, &[false; 5]),
            Err(PlanError::DecisionCountMismatch {
                expected: 4,
                got: 5
            })
        );
        let range = rota
            .apply_month(plan, 2026, 0, &[false, true, false, false])
            .unwrap();
        assert_eq!(range, 0..4);
        assert_eq!(
            rota.query_range(plan, 0, 1).unwrap(),
            [WeekState::Active {
                rule_id: rule,
                rotation_offset: 0
            }]
        );

        // December 2025 is wholly before the epoch: no rows, nothing to do.
        assert!(rota.derive_month(plan, 2025, 11).unwrap().weeks.is_empty());
        assert_eq!(rota.apply_month(plan, 2025, 11, &[]), Ok(4..4));
        assert_eq!(rota.reset_from_month(plan, 2025, 11).unwrap(), 4);
        assert!(rota.plan(plan).unwrap().timeline().is_empty());
    }

    #[test]
    fn test_rebase_rotation_overflow() {
        let (mut rota, plan, _, _) = setup();
        rota.apply_month(plan, 2026, 0, &[false; 5]).unwrap();
        let before = rota.plan(plan).unwrap().clone();
        assert_eq!(
            rota.rebase_rotation(plan, u64::MAX),
            Err(PlanError::Timeline(TimelineError::RotationOverflow))
        );
        assert_eq!(rota.plan(plan).unwrap(), &before);
    }

    #[test]
    fn test_rejected_import_keeps_next_id() {
        let (mut rota, plan, _, _) = setup();
        let mut snapshot = rota.export_plan(plan).unwrap();
        snapshot.rules.push(snapshot.rules[0].clone());
        assert!(matches!(
            rota.import_plan(snapshot),
            Err(PlanError::Import(ImportError::DuplicateId { kind: "rule", .. }))
        ));

        let next = rota.create_plan_at("Next", 0, 0).unwrap();
        assert_eq!(next, plan + 1);
    }
}
