//! Recurring staff-shift rota engine.
//!
//! Staff are organized into groups with ordered members; weekly rules are
//! one-week templates that place members (by position) on morning and
//! afternoon shifts; a calendar timeline fixes weeks one after another as
//! skipped or as active under the next rule in rotation. Any month can then
//! be derived into concrete names per day and period.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `StaffGroup`, `StaffMember`, `WeeklyRule`,
//!   `RuleAssignment`, `WeekRecord`, and the `StaffDirectory` / `RuleCatalog` registries
//! - **`calendar`**: Abs-week arithmetic and the month ↔ week-row mapping
//! - **`timeline`**: The append-only `CalendarTimeline` state machine
//! - **`deriver`**: Pure month derivation against the current staff and rules
//! - **`plan`**: `Plan` aggregate and the `PlanCoordinator` operation surface
//! - **`snapshot`**: Persisted plan shape with validating import
//! - **`validation`**: Dangling-reference diagnostics
//! - **`config`**: Engine configuration (epoch, default rotation)
//! - **`error`**: Error types
//!
//! # Architecture
//!
//! The crate is a synchronous, in-memory library. Storage and rendering
//! live outside it and talk to a [`plan::PlanCoordinator`]. Plans are
//! independent of each other; a single plan assumes a single writer.
//!
//! Logging goes through `tracing`; no subscriber is installed here.

pub mod calendar;
pub mod config;
pub mod deriver;
pub mod error;
pub mod models;
pub mod plan;
pub mod snapshot;
pub mod timeline;
pub mod validation;

pub use config::EngineConfig;
pub use error::{ConfigError, ImportError, PlanError, TimelineError};
pub use plan::{Plan, PlanCoordinator, PlanId};
