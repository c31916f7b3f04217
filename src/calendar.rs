//! Month ↔ week-row mapping.
//!
//! The rota addresses weeks by *abs-week*: the number of whole Monday-starting
//! weeks between a fixed Monday epoch and the week containing a date.
//!
//! # Default epoch
//! The default epoch is Monday 1969-12-29, the start of the week containing
//! the Unix epoch, so that week is abs-week 0:
//!
//! ```text
//!  Mo Tu We Th Fr Sa Su
//!  29 30 31  1  2  3  4   abs-week 0   (Dec 1969 / Jan 1970)
//!   5  6  7  8  9 10 11   abs-week 1
//!  12 13 14 15 16 17 18   abs-week 2
//! ```
//!
//! # Month view
//! A month is shown as the Monday-starting rows that contain at least one of
//! its days: the row holding the 1st, then every following row up to the one
//! holding the last day. That gives 4 (only a 28-day February starting on a
//! Monday), 5, or 6 rows. Leading and trailing days from the neighbouring
//! months fill the rows and are flagged `in_month = false`.
//!
//! Rows before the epoch have no abs-week and are dropped from the view.
//!
//! Months are zero-based throughout the crate (0 = January .. 11 = December).

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::AbsWeek;

/// Monday 1969-12-29.
pub const DEFAULT_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1969, 12, 29) {
    Some(d) => d,
    None => panic!("invalid default epoch"),
};

/// Abs-week arithmetic anchored at a Monday epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCalendar {
    epoch: NaiveDate,
}

impl Default for WeekCalendar {
    fn default() -> Self {
        Self {
            epoch: DEFAULT_EPOCH,
        }
    }
}

impl WeekCalendar {
    /// Creates a calendar anchored at `epoch`, which must be a Monday.
    pub fn new(epoch: NaiveDate) -> Result<Self, ConfigError> {
        if epoch.weekday() != Weekday::Mon {
            return Err(ConfigError::EpochNotMonday(epoch));
        }
        Ok(Self { epoch })
    }

    /// The epoch Monday (first day of abs-week 0).
    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// Abs-week containing `date`, or `None` before the epoch.
    pub fn abs_week_of(&self, date: NaiveDate) -> Option<AbsWeek> {
        let days = date.signed_duration_since(self.epoch).num_days();
        if days < 0 {
            None
        } else {
            Some((days / 7) as AbsWeek)
        }
    }

    /// Monday that starts `abs_week`.
    pub fn week_start(&self, abs_week: AbsWeek) -> Option<NaiveDate> {
        let days = (abs_week as u64).checked_mul(7)?;
        self.epoch.checked_add_days(Days::new(days))
    }

    /// Week rows of a month, or `None` for an invalid month.
    ///
    /// Rows that start before the epoch have no abs-week and are left out,
    /// so a month straddling the epoch has fewer rows and a month wholly
    /// before it has none.
    pub fn month_view(&self, year: i32, month: u32) -> Option<MonthView> {
        let first = first_of_month(year, month)?;
        let lead = u64::from(first.weekday().num_days_from_monday());
        let first_monday = first.checked_sub_days(Days::new(lead))?;
        let row_count = week_rows_in_month(year, month)?;
        let mut rows = Vec::with_capacity(row_count);

        for r in 0..row_count as u64 {
            let monday = first_monday.checked_add_days(Days::new(r * 7))?;
            let Some(abs_week) = self.abs_week_of(monday) else {
                continue;
            };
            let mut days = Vec::with_capacity(7);
            for d in 0..7 {
                let date = monday.checked_add_days(Days::new(d))?;
                days.push(CalendarDay {
                    date,
                    in_month: date.year() == year && date.month0() == month,
                });
            }
            rows.push(WeekRow { abs_week, days });
        }

        Some(MonthView { year, month, rows })
    }
}

/// One day cell of a month view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// False for padding days from the previous/next month.
    pub in_month: bool,
}

/// A Monday-to-Sunday row of a month view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekRow {
    pub abs_week: AbsWeek,
    /// Seven days, Monday first.
    pub days: Vec<CalendarDay>,
}

/// The week rows covering one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthView {
    pub year: i32,
    /// Zero-based month.
    pub month: u32,
    pub rows: Vec<WeekRow>,
}

impl MonthView {
    /// Abs-week of the first row.
    pub fn first_week(&self) -> Option<AbsWeek> {
        self.rows.first().map(|r| r.abs_week)
    }

    /// Abs-weeks of all rows, in order.
    pub fn abs_weeks(&self) -> impl Iterator<Item = AbsWeek> + '_ {
        self.rows.iter().map(|r| r.abs_week)
    }

    /// Number of rows (4..=6, fewer only around the epoch).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the view has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(year, month)` of the previous month.
    pub fn prev(&self) -> (i32, u32) {
        prev_month(self.year, self.month)
    }

    /// `(year, month)` of the next month.
    pub fn next(&self) -> (i32, u32) {
        next_month(self.year, self.month)
    }
}

/// Previous month as `(year, month)`; January steps back to December.
pub fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month == 0 {
        (year - 1, 11)
    } else {
        (year, month - 1)
    }
}

/// Next month as `(year, month)`; December steps forward to January.
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 11 {
        (year + 1, 0)
    } else {
        (year, month + 1)
    }
}

/// First day of a zero-based month.
pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month > 11 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month + 1, 1)
}

/// Number of days in a zero-based month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = first_of_month(year, month)?;
    let (ny, nm) = next_month(year, month);
    let next = first_of_month(ny, nm)?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Number of Monday-starting rows needed to show a zero-based month.
pub fn week_rows_in_month(year: i32, month: u32) -> Option<usize> {
    let first = first_of_month(year, month)?;
    let lead = first.weekday().num_days_from_monday();
    let cells = lead + days_in_month(year, month)?;
    Some(cells.div_ceil(7) as usize)
}
