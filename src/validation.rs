//! Structural diagnostics of a plan.
//!
//! Dangling references are legal: derivation drops them silently so a month
//! always renders. This module reports them so a caller can show why a cell
//! came out empty. Detects:
//! - Rule assignments naming a deleted group
//! - Rule assignments whose member index is past the end of the group
//! - Fixed weeks naming a deleted rule
//! - Active weeks whose rotation offsets are not consecutive

use std::collections::HashSet;

use crate::models::{RuleId, WeekRecord};
use crate::plan::Plan;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Finding category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// An assignment references a group that doesn't exist.
    DanglingGroup,
    /// An assignment's member index is past the end of its group.
    MemberIndexOutOfRange,
    /// A fixed week references a rule that doesn't exist.
    UnknownRule,
    /// An active week's offset does not follow the previous active week's.
    RotationGap,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Lists every dangling reference of a plan, in rule then week order.
pub fn diagnose_plan(plan: &Plan) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let directory = plan.directory();

    for rule in plan.rules() {
        for a in &rule.assignments {
            let Some(group) = directory.group(a.target_group_id) else {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DanglingGroup,
                    format!(
                        "Rule '{}' ({:?} {:?}) references unknown group {}",
                        rule.name, a.weekday, a.shift_period, a.target_group_id
                    ),
                ));
                continue;
            };
            if group.member_at(a.target_member_index).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MemberIndexOutOfRange,
                    format!(
                        "Rule '{}' ({:?} {:?}) references member #{} of '{}', which has {} members",
                        rule.name,
                        a.weekday,
                        a.shift_period,
                        a.target_member_index,
                        group.name,
                        group.members.len()
                    ),
                ));
            }
        }
    }

    let rule_ids: HashSet<RuleId> = plan.rules().iter().map(|r| r.id).collect();
    let timeline = plan.timeline();
    // `None` once an offset of `u64::MAX` has been seen: nothing can follow it.
    let mut expected_offset = Some(timeline.initial_rotation_offset());
    for (i, record) in timeline.records().iter().enumerate() {
        let WeekRecord::Active {
            rule_id,
            rotation_offset,
        } = *record
        else {
            continue;
        };
        let week = timeline.base_abs_week() + i;
        if !rule_ids.contains(&rule_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownRule,
                format!("Week {week} is fixed with unknown rule {rule_id}"),
            ));
        }
        if Some(rotation_offset) != expected_offset {
            let expected = match expected_offset {
                Some(offset) => offset.to_string(),
                None => "no further offset".to_string(),
            };
            errors.push(ValidationError::new(
                ValidationErrorKind::RotationGap,
                format!("Week {week} has rotation offset {rotation_offset}, expected {expected}"),
            ));
        }
        expected_offset = rotation_offset.checked_add(1);
    }

    errors
}

/// Like [`diagnose_plan`], as a `Result`.
pub fn validate_plan(plan: &Plan) -> ValidationResult {
    let errors = diagnose_plan(plan);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
