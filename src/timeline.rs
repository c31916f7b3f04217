//! Calendar timeline: the append-only record of fixed weeks.
//!
//! The timeline stores one [`WeekRecord`] per abs-week, starting at
//! `base_abs_week` with no gaps. Committed weeks are immutable; the only
//! way to change one is [`CalendarTimeline::truncate_from`], which drops it
//! together with every later week.
//!
//! # Invariants
//! - Committed weeks are exactly `[base, base + len)`.
//! - `apply_range` starts at the first uncommitted week and is atomic.
//! - Rotation offsets of active weeks increase by one per activated week,
//!   skipped weeks in between do not advance them.
//!
//! # Rotation
//! The first activated week takes `initial_rotation_offset`; each later one
//! takes the previous active week's offset + 1, across calls. The rule used
//! is `rules[offset % rules.len()]`, where `rules` is the rotation order at
//! apply time. The chosen rule id is stored, so later edits to the rule list
//! never change a fixed week.
//!
//! ```text
//! decisions  [act, skip, act, act, skip]   rules [A, B], initial 0
//! offsets     0    -     1    2    -
//! rules       A    -     B    A    -
//! ```

use std::ops::Range;

use tracing::{debug, info, warn};

use crate::error::TimelineError;
use crate::models::{AbsWeek, RotationOffset, RuleId, WeekRecord, WeekState};

/// Contiguous sequence of fixed weeks starting at `base_abs_week`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarTimeline {
    base_abs_week: AbsWeek,
    initial_rotation_offset: RotationOffset,
    records: Vec<WeekRecord>,
}

impl CalendarTimeline {
    /// Creates an empty timeline.
    pub fn new(base_abs_week: AbsWeek, initial_rotation_offset: RotationOffset) -> Self {
        Self {
            base_abs_week,
            initial_rotation_offset,
            records: Vec::new(),
        }
    }

    /// Creates a timeline whose records start at `base_abs_week`.
    ///
    /// Rule references are not checked here; see [`crate::snapshot`].
    pub fn with_records(
        base_abs_week: AbsWeek,
        initial_rotation_offset: RotationOffset,
        records: Vec<WeekRecord>,
    ) -> Self {
        Self {
            base_abs_week,
            initial_rotation_offset,
            records,
        }
    }

    /// First abs-week the timeline can hold.
    #[inline]
    pub fn base_abs_week(&self) -> AbsWeek {
        self.base_abs_week
    }

    /// Offset of the first activated week.
    #[inline]
    pub fn initial_rotation_offset(&self) -> RotationOffset {
        self.initial_rotation_offset
    }

    /// Committed records, indexed from `base_abs_week`.
    pub fn records(&self) -> &[WeekRecord] {
        &self.records
    }

    /// Number of committed weeks.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is committed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First uncommitted abs-week; the only valid start for `apply_range`.
    #[inline]
    pub fn next_unset(&self) -> AbsWeek {
        self.base_abs_week + self.records.len()
    }

    /// Last committed abs-week.
    pub fn last_fixed(&self) -> Option<AbsWeek> {
        self.records.len().checked_sub(1).map(|i| self.base_abs_week + i)
    }

    /// Committed record of an abs-week.
    pub fn get(&self, abs_week: AbsWeek) -> Option<&WeekRecord> {
        let index = abs_week.checked_sub(self.base_abs_week)?;
        self.records.get(index)
    }

    /// State of an abs-week; anything outside the committed prefix is `Unset`.
    pub fn state(&self, abs_week: AbsWeek) -> WeekState {
        WeekState::from(self.get(abs_week))
    }

    /// Whether an abs-week is committed.
    #[inline]
    pub fn is_fixed(&self, abs_week: AbsWeek) -> bool {
        self.get(abs_week).is_some()
    }

    /// Rotation offset the next activated week will take.
    ///
    /// `None` once the last active week holds `u64::MAX`.
    pub fn next_rotation_offset(&self) -> Option<RotationOffset> {
        let last = self
            .records
            .iter()
            .rev()
            .find_map(WeekRecord::rotation_offset);
        match last {
            Some(last) => last.checked_add(1),
            None => Some(self.initial_rotation_offset),
        }
    }

    /// States for `[from, to)`. Never fails; out-of-range weeks are `Unset`.
    pub fn query_range(&self, from: AbsWeek, to: AbsWeek) -> Vec<WeekState> {
        (from..to).map(|w| self.state(w)).collect()
    }

    /// Commits one week per decision, starting at `from`.
    ///
    /// `decisions[i] == true` skips week `from + i`, `false` activates it with
    /// the next rule in rotation. Nothing is written unless every check passes.
    ///
    /// # Errors
    /// - [`TimelineError::OutOfOrderApply`] if `from != self.next_unset()`.
    /// - [`TimelineError::EmptyRuleList`] if a week is activated while
    ///   `rules` is empty.
    /// - [`TimelineError::RotationOverflow`] if an activated week would need
    ///   an offset past `u64::MAX`.
    ///
    /// # Example
    /// ```
    /// use shift_rota::timeline::CalendarTimeline;
    /// use shift_rota::models::WeekRecord;
    ///
    /// let mut timeline = CalendarTimeline::new(100, 0);
    /// timeline.apply_range(&[7, 8], 100, &[false, true, false]).unwrap();
    /// assert_eq!(
    ///     timeline.get(102),
    ///     Some(&WeekRecord::Active { rule_id: 8, rotation_offset: 1 })
    /// );
    /// assert!(timeline.apply_range(&[7, 8], 100, &[false]).is_err());
    /// ```
    pub fn apply_range(
        &mut self,
        rules: &[RuleId],
        from: AbsWeek,
        decisions: &[bool],
    ) -> Result<Range<AbsWeek>, TimelineError> {
        let expected = self.next_unset();
        if from != expected {
            warn!(expected, got = from, "rejected out-of-order apply");
            return Err(TimelineError::OutOfOrderApply {
                expected,
                got: from,
            });
        }
        if rules.is_empty() && decisions.iter().any(|skip| !skip) {
            warn!(from, "rejected apply: no rules to activate weeks with");
            return Err(TimelineError::EmptyRuleList);
        }

        let mut offset = self.next_rotation_offset();
        let mut staged = Vec::with_capacity(decisions.len());
        for &skip in decisions {
            if skip {
                staged.push(WeekRecord::Skipped);
                continue;
            }
            let Some(rotation_offset) = offset else {
                warn!(from, "rejected apply: rotation offset overflow");
                return Err(TimelineError::RotationOverflow);
            };
            let rule_id = rules[(rotation_offset % rules.len() as u64) as usize];
            staged.push(WeekRecord::Active {
                rule_id,
                rotation_offset,
            });
            offset = rotation_offset.checked_add(1);
        }

        for (i, record) in staged.iter().enumerate() {
            debug!(week = from + i, ?record, "fixing week");
        }
        self.records.extend(staged);

        let range = from..self.next_unset();
        if !range.is_empty() {
            info!(from = range.start, to = range.end, "applied weeks");
        }
        Ok(range)
    }

    /// Drops every record at or after `cut`, returning how many were removed.
    ///
    /// A cut before `base_abs_week` clears the timeline; a cut past the last
    /// committed week is a no-op.
    pub fn truncate_from(&mut self, cut: AbsWeek) -> usize {
        let keep = cut.saturating_sub(self.base_abs_week);
        if keep >= self.records.len() {
            return 0;
        }
        let removed = self.records.len() - keep;
        self.records.truncate(keep);
        info!(cut, removed, "truncated timeline");
        removed
    }

    /// Renumbers active weeks consecutively from `initial`, keeping rule ids.
    ///
    /// Used to change the initial rotation offset of an existing history.
    /// Fails without changes if the last active week would pass `u64::MAX`.
    pub fn rebase_rotation(&mut self, initial: RotationOffset) -> Result<(), TimelineError> {
        let active = self
            .records
            .iter()
            .filter_map(WeekRecord::rotation_offset)
            .count() as u64;
        if active > 0 && initial.checked_add(active - 1).is_none() {
            warn!(initial, active, "rejected rebase: rotation offset overflow");
            return Err(TimelineError::RotationOverflow);
        }

        let mut counter = initial;
        for record in &mut self.records {
            if let WeekRecord::Active {
                rotation_offset, ..
            } = record
            {
                *rotation_offset = counter;
                counter = counter.saturating_add(1);
            }
        }
        self.initial_rotation_offset = initial;
        debug!(initial, "rebased rotation offsets");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: RuleId = 1;
    const B: RuleId = 2;

    fn active(rule_id: RuleId, rotation_offset: RotationOffset) -> WeekRecord {
        WeekRecord::Active {
            rule_id,
            rotation_offset,
        }
    }

    #[test]
    fn test_rotation_skips_do_not_advance() {
        let mut t = CalendarTimeline::new(2000, 0);
        let range = t
            .apply_range(&[A, B], 2000, &[false, true, false, false, true])
            .unwrap();
        assert_eq!(range, 2000..2005);
        assert_eq!(
            t.records(),
            [
                active(A, 0),
                WeekRecord::Skipped,
                active(B, 1),
                active(A, 2),
                WeekRecord::Skipped,
            ]
        );
    }

    #[test]
    fn test_rotation_continues_across_calls() {
        let mut t = CalendarTimeline::new(0, 5);
        t.apply_range(&[A, B], 0, &[false, true]).unwrap();
        t.apply_range(&[A, B], 2, &[true, false]).unwrap();
        // 5 % 2 = 1 → B, then 6 % 2 = 0 → A
        assert_eq!(t.get(0), Some(&active(B, 5)));
        assert_eq!(t.get(3), Some(&active(A, 6)));
        assert_eq!(t.next_rotation_offset(), Some(7));
    }

    #[test]
    fn test_rule_list_length_at_apply_time() {
        let mut t = CalendarTimeline::new(0, 0);
        t.apply_range(&[A, B], 0, &[false, false]).unwrap();
        // A third rule only affects weeks applied from now on.
        t.apply_range(&[A, B, 3], 2, &[false]).unwrap();
        assert_eq!(t.records(), [active(A, 0), active(B, 1), active(3, 2)]);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut t = CalendarTimeline::new(10, 0);
        t.apply_range(&[A], 10, &[false, false]).unwrap();

        for from in [10, 11, 13] {
            assert_eq!(
                t.apply_range(&[A], from, &[false]),
                Err(TimelineError::OutOfOrderApply {
                    expected: 12,
                    got: from
                })
            );
        }
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_empty_rule_list_is_atomic() {
        let mut t = CalendarTimeline::new(0, 0);
        assert_eq!(
            t.apply_range(&[], 0, &[true, true, false]),
            Err(TimelineError::EmptyRuleList)
        );
        assert!(t.is_empty());

        // All-skip decisions need no rules.
        t.apply_range(&[], 0, &[true, true]).unwrap();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_empty_decisions_noop() {
        let mut t = CalendarTimeline::new(3, 0);
        assert_eq!(t.apply_range(&[A], 3, &[]), Ok(3..3));
        assert!(t.is_empty());
    }

    #[test]
    fn test_truncate_then_reapply() {
        let mut t = CalendarTimeline::new(10, 0);
        t.apply_range(&[A, B], 10, &[false; 5]).unwrap();
        let before: Vec<_> = t.query_range(10, 12);

        assert_eq!(t.truncate_from(12), 3);
        assert_eq!(t.next_unset(), 12);
        t.apply_range(&[A, B], 12, &[true, false]).unwrap();

        assert_eq!(t.query_range(10, 12), before);
        assert_eq!(t.get(12), Some(&WeekRecord::Skipped));
        // Last surviving active week (11) had offset 1.
        assert_eq!(t.get(13), Some(&active(A, 2)));
        assert_eq!(t.state(14), WeekState::Unset);
    }

    #[test]
    fn test_truncate_bounds() {
        let mut t = CalendarTimeline::new(10, 0);
        t.apply_range(&[A], 10, &[false; 3]).unwrap();

        assert_eq!(t.truncate_from(13), 0);
        assert_eq!(t.truncate_from(50), 0);
        assert_eq!(t.len(), 3);

        assert_eq!(t.truncate_from(4), 3);
        assert!(t.is_empty());
        assert_eq!(t.next_rotation_offset(), Some(0));
    }

    #[test]
    fn test_contiguity_under_mixed_ops() {
        let mut t = CalendarTimeline::new(100, 0);
        let ops: [(bool, usize); 6] = [
            (true, 4),
            (false, 102),
            (true, 3),
            (false, 101),
            (false, 90),
            (true, 2),
        ];
        for (is_apply, n) in ops {
            if is_apply {
                let from = t.next_unset();
                t.apply_range(&[A, B], from, &vec![false; n]).unwrap();
            } else {
                t.truncate_from(n);
            }
            let fixed: Vec<_> = (0..200).filter(|&w| t.is_fixed(w)).collect();
            let expected: Vec<_> = (100..100 + t.len()).collect();
            assert_eq!(fixed, expected);
        }
    }

    #[test]
    fn test_query_range_out_of_bounds() {
        let mut t = CalendarTimeline::new(10, 0);
        t.apply_range(&[A], 10, &[true]).unwrap();
        assert_eq!(
            t.query_range(8, 12),
            [
                WeekState::Unset,
                WeekState::Unset,
                WeekState::Skipped,
                WeekState::Unset
            ]
        );
        assert!(t.query_range(12, 10).is_empty());
        assert_eq!(t.last_fixed(), Some(10));
    }

    #[test]
    fn test_rebase_rotation() {
        let mut t = CalendarTimeline::new(0, 0);
        t.apply_range(&[A, B], 0, &[false, true, false]).unwrap();
        t.rebase_rotation(10).unwrap();
        assert_eq!(
            t.records(),
            [active(A, 10), WeekRecord::Skipped, active(B, 11)]
        );
        assert_eq!(t.initial_rotation_offset(), 10);
        assert_eq!(t.next_rotation_offset(), Some(12));
    }

    #[test]
    fn test_rotation_overflow_is_atomic() {
        let mut t = CalendarTimeline::with_records(0, 0, vec![active(A, u64::MAX - 1)]);
        t.apply_range(&[A, B], 1, &[true, false]).unwrap();
        assert_eq!(t.get(2), Some(&active(B, u64::MAX)));
        assert_eq!(t.next_rotation_offset(), None);

        assert_eq!(
            t.apply_range(&[A, B], 3, &[true, false]),
            Err(TimelineError::RotationOverflow)
        );
        assert_eq!(t.len(), 3);
        // Skips never need an offset.
        t.apply_range(&[A, B], 3, &[true]).unwrap();
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_initial_offset_at_max() {
        let mut t = CalendarTimeline::new(0, u64::MAX);
        assert_eq!(
            t.apply_range(&[A], 0, &[false, false]),
            Err(TimelineError::RotationOverflow)
        );
        assert!(t.is_empty());
        t.apply_range(&[A], 0, &[false]).unwrap();
        assert_eq!(t.get(0), Some(&active(A, u64::MAX)));
    }

    #[test]
    fn test_rebase_rotation_overflow() {
        let mut t = CalendarTimeline::new(0, 0);
        t.apply_range(&[A, B], 0, &[false, true, false]).unwrap();
        let before = t.clone();
        assert_eq!(
            t.rebase_rotation(u64::MAX),
            Err(TimelineError::RotationOverflow)
        );
        assert_eq!(t, before);

        t.rebase_rotation(u64::MAX - 1).unwrap();
        assert_eq!(t.get(2), Some(&active(B, u64::MAX)));
    }
}
