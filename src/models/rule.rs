//! Weekly rule templates.
//!
//! A weekly rule is a template for one week: each weekday has a morning and
//! an afternoon cell, and each cell holds an ordered list of positional
//! member references. The plan's rule list order is the rotation sequence
//! consumed by [`crate::timeline::CalendarTimeline`].
//!
//! # Cell order
//! Assignments inside a cell keep insertion order, and removal is by
//! position within the cell, never by value: the same member may appear
//! several times in one cell or in both periods of a day.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::staff::{non_empty, GroupId};
use crate::error::{ImportError, PlanError};

/// Weekly rule identifier (unique within a plan).
pub type RuleId = u64;

/// Half-day shift slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftPeriod {
    Morning,
    Afternoon,
}

impl ShiftPeriod {
    /// Both periods in display order.
    pub const ALL: [ShiftPeriod; 2] = [ShiftPeriod::Morning, ShiftPeriod::Afternoon];
}

/// One positional member reference inside a rule cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAssignment {
    /// Day of week, stored as 0 (Monday) ..= 6 (Sunday).
    #[serde(with = "weekday_index")]
    pub weekday: Weekday,
    /// Morning or afternoon.
    pub shift_period: ShiftPeriod,
    /// Group the member is taken from.
    pub target_group_id: GroupId,
    /// Index into the group's member list at resolution time.
    pub target_member_index: usize,
}

impl RuleAssignment {
    /// Creates an assignment.
    pub fn new(
        weekday: Weekday,
        shift_period: ShiftPeriod,
        target_group_id: GroupId,
        target_member_index: usize,
    ) -> Self {
        Self {
            weekday,
            shift_period,
            target_group_id,
            target_member_index,
        }
    }

    /// Whether this assignment belongs to the given cell.
    #[inline]
    pub fn is_in(&self, weekday: Weekday, period: ShiftPeriod) -> bool {
        self.weekday == weekday && self.shift_period == period
    }
}

/// A named one-week template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRule {
    /// Rule identifier.
    pub id: RuleId,
    /// Display name (e.g., "Standard").
    pub name: String,
    /// Persisted ordering key; list position is the rotation position.
    pub sort_order: i64,
    /// All assignments; cell order is the relative order within this list.
    pub assignments: Vec<RuleAssignment>,
}

impl WeeklyRule {
    /// Creates an empty rule.
    pub fn new(id: RuleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sort_order: 0,
            assignments: Vec::new(),
        }
    }

    /// Sets the ordering key.
    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Appends an assignment.
    pub fn with_assignment(mut self, assignment: RuleAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Assignments of one cell, in chip order.
    pub fn slot(
        &self,
        weekday: Weekday,
        period: ShiftPeriod,
    ) -> impl Iterator<Item = &RuleAssignment> + '_ {
        self.assignments
            .iter()
            .filter(move |a| a.is_in(weekday, period))
    }

    /// Appends an assignment to its cell, returning its index in that cell.
    pub fn add_assignment(&mut self, assignment: RuleAssignment) -> usize {
        let index = self
            .slot(assignment.weekday, assignment.shift_period)
            .count();
        self.assignments.push(assignment);
        index
    }

    /// Removes the `index`-th assignment of a cell.
    pub fn remove_assignment(
        &mut self,
        weekday: Weekday,
        period: ShiftPeriod,
        index: usize,
    ) -> Result<RuleAssignment, PlanError> {
        let len = self.slot(weekday, period).count();
        let pos = self
            .assignments
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_in(weekday, period))
            .nth(index)
            .map(|(pos, _)| pos)
            .ok_or(PlanError::IndexOutOfRange { index, len })?;
        Ok(self.assignments.remove(pos))
    }
}

/// The ordered list of weekly rules of a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleCatalog {
    rules: Vec<WeeklyRule>,
    next_rule_id: RuleId,
}

impl RuleCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a catalog from persisted rules, ordered by `sort_order`.
    pub fn from_rules(mut rules: Vec<WeeklyRule>) -> Result<Self, ImportError> {
        let mut seen = std::collections::HashSet::new();
        for r in &rules {
            if !seen.insert(r.id) {
                return Err(ImportError::DuplicateId {
                    kind: "rule",
                    id: r.id,
                });
            }
        }
        rules.sort_by_key(|r| r.sort_order);
        Ok(Self {
            next_rule_id: seen.iter().max().map_or(1, |id| id + 1),
            rules,
        })
    }

    /// Rules in rotation order.
    pub fn rules(&self) -> &[WeeklyRule] {
        &self.rules
    }

    /// Rule ids in rotation order.
    pub fn rotation(&self) -> Vec<RuleId> {
        self.rules.iter().map(|r| r.id).collect()
    }

    /// Number of rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are defined.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Looks up a rule by id.
    pub fn rule(&self, rule_id: RuleId) -> Option<&WeeklyRule> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    /// Appends a new empty rule to the rotation.
    pub fn add_rule(&mut self, name: impl Into<String>) -> Result<RuleId, PlanError> {
        let name = non_empty(name.into(), "rule")?;
        self.next_rule_id = self.next_rule_id.max(1);
        let id = self.next_rule_id;
        self.next_rule_id += 1;
        let sort_order = self
            .rules
            .iter()
            .map(|r| r.sort_order)
            .max()
            .map_or(0, |o| o + 1);
        self.rules
            .push(WeeklyRule::new(id, name).with_sort_order(sort_order));
        Ok(id)
    }

    /// Removes a rule. Fixed weeks that used it derive as empty weeks.
    pub fn remove_rule(&mut self, rule_id: RuleId) -> Result<WeeklyRule, PlanError> {
        let pos = self
            .rules
            .iter()
            .position(|r| r.id == rule_id)
            .ok_or(PlanError::UnknownRule(rule_id))?;
        Ok(self.rules.remove(pos))
    }

    /// Renames a rule.
    pub fn rename_rule(
        &mut self,
        rule_id: RuleId,
        name: impl Into<String>,
    ) -> Result<(), PlanError> {
        let name = non_empty(name.into(), "rule")?;
        self.rule_mut(rule_id)?.name = name;
        Ok(())
    }

    /// Moves a rule within the rotation sequence.
    ///
    /// Only affects weeks applied afterwards; fixed weeks keep their rule id.
    pub fn move_rule(&mut self, from: usize, to: usize) -> Result<(), PlanError> {
        let len = self.rules.len();
        for index in [from, to] {
            if index >= len {
                return Err(PlanError::IndexOutOfRange { index, len });
            }
        }
        let rule = self.rules.remove(from);
        self.rules.insert(to, rule);
        for (i, r) in self.rules.iter_mut().enumerate() {
            r.sort_order = i as i64;
        }
        Ok(())
    }

    /// Adds an assignment to a rule cell, returning its index in the cell.
    ///
    /// The group reference is not checked: it resolves lazily.
    pub fn add_assignment(
        &mut self,
        rule_id: RuleId,
        assignment: RuleAssignment,
    ) -> Result<usize, PlanError> {
        Ok(self.rule_mut(rule_id)?.add_assignment(assignment))
    }

    /// Removes the `index`-th assignment of a rule cell.
    pub fn remove_assignment(
        &mut self,
        rule_id: RuleId,
        weekday: Weekday,
        period: ShiftPeriod,
        index: usize,
    ) -> Result<RuleAssignment, PlanError> {
        self.rule_mut(rule_id)?
            .remove_assignment(weekday, period, index)
    }

    fn rule_mut(&mut self, rule_id: RuleId) -> Result<&mut WeeklyRule, PlanError> {
        self.rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or(PlanError::UnknownRule(rule_id))
    }
}

/// Serializes `chrono::Weekday` as 0 (Monday) ..= 6 (Sunday).
mod weekday_index {
    use chrono::Weekday;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &Weekday, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(day.num_days_from_monday() as u8)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Weekday, D::Error> {
        let n = u8::deserialize(d)?;
        Weekday::try_from(n)
            .map_err(|_| D::Error::custom(format!("weekday {n} out of range 0..=6")))
    }
}

#[cfg(test)]
mod tests {
    use super::ShiftPeriod::{Afternoon, Morning};
    use super::*;
    use chrono::Weekday::{Mon, Tue};

    #[test]
    fn test_slot_order_and_index() {
        let mut rule = WeeklyRule::new(1, "Standard");
        assert_eq!(rule.add_assignment(RuleAssignment::new(Mon, Morning, 1, 0)), 0);
        assert_eq!(rule.add_assignment(RuleAssignment::new(Tue, Morning, 1, 1)), 0);
        assert_eq!(rule.add_assignment(RuleAssignment::new(Mon, Morning, 1, 2)), 1);
        assert_eq!(rule.add_assignment(RuleAssignment::new(Mon, Afternoon, 1, 0)), 0);

        let idx: Vec<_> = rule.slot(Mon, Morning).map(|a| a.target_member_index).collect();
        assert_eq!(idx, [0, 2]);
    }

    #[test]
    fn test_remove_by_position_not_value() {
        let mut rule = WeeklyRule::new(1, "Dup")
            .with_assignment(RuleAssignment::new(Mon, Morning, 1, 0))
            .with_assignment(RuleAssignment::new(Mon, Morning, 1, 5))
            .with_assignment(RuleAssignment::new(Mon, Morning, 1, 0));

        let removed = rule.remove_assignment(Mon, Morning, 1).unwrap();
        assert_eq!(removed.target_member_index, 5);
        let idx: Vec<_> = rule.slot(Mon, Morning).map(|a| a.target_member_index).collect();
        assert_eq!(idx, [0, 0]);

        assert_eq!(
            rule.remove_assignment(Mon, Afternoon, 0),
            Err(PlanError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_catalog_rotation_order() {
        let mut cat = RuleCatalog::new();
        let a = cat.add_rule("A").unwrap();
        let b = cat.add_rule("B").unwrap();
        let c = cat.add_rule("C").unwrap();
        assert_eq!(cat.rotation(), [a, b, c]);

        cat.move_rule(2, 0).unwrap();
        assert_eq!(cat.rotation(), [c, a, b]);

        cat.remove_rule(a).unwrap();
        assert_eq!(cat.rotation(), [c, b]);
        assert_eq!(cat.remove_rule(a), Err(PlanError::UnknownRule(a)));
    }

    #[test]
    fn test_catalog_assignment_ops() {
        let mut cat = RuleCatalog::new();
        let r = cat.add_rule("A").unwrap();
        cat.add_assignment(r, RuleAssignment::new(Mon, Morning, 9, 0)).unwrap();
        cat.rename_rule(r, "Renamed").unwrap();
        assert_eq!(cat.rule(r).unwrap().name, "Renamed");
        assert_eq!(cat.rule(r).unwrap().slot(Mon, Morning).count(), 1);

        cat.remove_assignment(r, Mon, Morning, 0).unwrap();
        assert!(cat.rule(r).unwrap().assignments.is_empty());
        assert_eq!(
            cat.add_assignment(42, RuleAssignment::new(Mon, Morning, 9, 0)),
            Err(PlanError::UnknownRule(42))
        );
    }

    #[test]
    fn test_weekday_serialized_as_index() {
        let a = RuleAssignment::new(Weekday::Sun, Afternoon, 3, 1);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(
            json,
            r#"{"weekday":6,"shiftPeriod":"afternoon","targetGroupId":3,"targetMemberIndex":1}"#
        );
        let bad =
            r#"{"weekday":7,"shiftPeriod":"morning","targetGroupId":3,"targetMemberIndex":1}"#;
        assert!(serde_json::from_str::<RuleAssignment>(bad).is_err());
    }
}
