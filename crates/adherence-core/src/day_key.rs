//! Calendar-day keys
//!
//! Every grouping in the engine (window filtering, streaks, calendars, chart
//! points) goes through [`DayKey`], so "which day does this dose belong to"
//! is answered in exactly one place. Keys are UTC calendar dates.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const KEY_FORMAT: &str = "%Y-%m-%d";

/// Canonical `YYYY-MM-DD` day key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(NaiveDate);

/// Map an instant to the UTC calendar day it falls on.
pub fn day_key(instant: &DateTime<Utc>) -> DayKey {
    DayKey::from_instant(instant)
}

impl DayKey {
    pub fn from_instant(instant: &DateTime<Utc>) -> Self {
        Self(instant.date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The key `n` days earlier, saturating at the earliest representable date.
    pub fn days_before(&self, n: u32) -> Self {
        Self(
            self.0
                .checked_sub_days(Days::new(u64::from(n)))
                .unwrap_or(NaiveDate::MIN),
        )
    }

    pub fn previous(&self) -> Self {
        self.days_before(1)
    }

    /// Short month-day rendering, e.g. `Jun 15`.
    pub fn label(&self) -> String {
        self.0.format("%b %-d").to_string()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, KEY_FORMAT).map(Self)
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
