//! Period key calculation.
//!
//! A period key is a canonical string identifying "this day/week/month/
//! quarter" for a given cadence. All instances of the same cadence
//! within the same period collide to one key, which is what the
//! instance uniqueness constraint is keyed on.
//!
//! Keys are computed from the server's local calendar date. A user near
//! a timezone boundary may see a new period up to a day early or late
//! relative to their local day.

use chrono::{Datelike, NaiveDate};

use super::mission::Cadence;

/// Compute the period key for a cadence on a given date.
///
/// - daily → `YYYY-MM-DD`
/// - weekly → `YYYY-Www` (ISO week number, ISO week-based year)
/// - monthly → `YYYY-MM`
/// - seasonal → `YYYY-Qn`
#[must_use]
pub fn period_key(cadence: Cadence, date: NaiveDate) -> String {
    match cadence {
        Cadence::Daily => date.format("%Y-%m-%d").to_string(),
        Cadence::Weekly => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Cadence::Monthly => date.format("%Y-%m").to_string(),
        Cadence::Seasonal => format!("{}-Q{}", date.year(), date.month0() / 3 + 1),
    }
}
