//! Rota domain models.
//!
//! Plain data types shared by the timeline engine and the shift deriver.
//!
//! # Domain Mappings
//!
//! | shift-rota | Restaurant | Clinic | Warehouse |
//! |------------|------------|--------|-----------|
//! | StaffGroup | Kitchen / Hall | Nurses | Dock team |
//! | StaffMember | Cook | Nurse | Picker |
//! | WeeklyRule | Standard week | On-call week | Peak week |
//! | WeekRecord | Fixed week | Fixed week | Fixed week |

mod rule;
mod staff;
mod week;

pub use rule::{RuleAssignment, RuleCatalog, RuleId, ShiftPeriod, WeeklyRule};
pub(crate) use staff::non_empty;
pub use staff::{GroupId, MemberId, StaffDirectory, StaffGroup, StaffMember};
pub use week::{AbsWeek, RotationOffset, WeekRecord, WeekState};
