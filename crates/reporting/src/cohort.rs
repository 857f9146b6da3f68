//! Cohort assignment — the calendar month of each booker's first booking.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use ltv_core::types::{BookerId, FirstBooking};
use ltv_core::ReportError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A cohort month, displayed as `MM-YYYY`.
///
/// Ordering is by calendar date (year, then month) — string order would put
/// "01-2024" before "12-2023".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CohortKey {
    pub year: i32,
    pub month: u32,
}

impl CohortKey {
    /// The cohort month of a unix timestamp, bucketed in the given zone.
    /// `None` if the timestamp is outside chrono's representable range.
    pub fn from_timestamp(timestamp: i64, tz: &FixedOffset) -> Option<Self> {
        let instant = Utc.timestamp_opt(timestamp, 0).single()?;
        let local = instant.with_timezone(tz);
        Some(Self {
            year: local.year(),
            month: local.month(),
        })
    }
}

impl Ord for CohortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.year
            .cmp(&other.year)
            .then(self.month.cmp(&other.month))
    }
}

impl PartialOrd for CohortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CohortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

impl FromStr for CohortKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ReportError::Config(format!("Invalid cohort key `{s}`, expected MM-YYYY"));
        let (month, year) = s.split_once('-').ok_or_else(invalid)?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

impl Serialize for CohortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CohortKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The cutoff instant: local midnight on the first day of the month
/// `period_months` before `now`'s month, as a unix timestamp.
pub fn cutoff_timestamp(now: DateTime<FixedOffset>, period_months: u32) -> i64 {
    let total_months = i64::from(now.year()) * 12 + i64::from(now.month0()) - i64::from(period_months);
    let year = total_months.div_euclid(12) as i32;
    let month = total_months.rem_euclid(12) as u32 + 1;

    let midnight = NaiveDate::from_ymd_opt(year, month, 1)
        .expect("rolled month is in 1..=12")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time");
    midnight.and_utc().timestamp() - i64::from(now.offset().local_minus_utc())
}

/// Map each qualifying booker to the cohort month of their first booking.
/// One entry per booker; rows with an unrepresentable timestamp are skipped.
pub fn assign_cohorts(
    first_bookings: &[FirstBooking],
    tz: &FixedOffset,
) -> HashMap<BookerId, CohortKey> {
    let mut assignments = HashMap::with_capacity(first_bookings.len());
    for row in first_bookings {
        match CohortKey::from_timestamp(row.first_end_timestamp, tz) {
            Some(key) => {
                assignments.insert(row.booker_id, key);
            }
            None => {
                tracing::warn!(
                    booker_id = row.booker_id,
                    timestamp = row.first_end_timestamp,
                    "First booking timestamp out of range, booker skipped"
                );
            }
        }
    }
    assignments
}
