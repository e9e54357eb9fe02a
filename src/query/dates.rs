//! Date range literals
//!
//! Named DURING ranges and their resolution to explicit `[start, end]` days.
//! Resolution is relative to a caller-supplied `today` so it stays
//! deterministic; ranges are inclusive on both ends.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Layout of explicit DURING dates
pub const DATE_LAYOUT: &str = "%Y%m%d";

/// Named date range accepted by DURING
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateRangeLiteral {
    #[serde(rename = "TODAY")]
    Today,
    #[serde(rename = "YESTERDAY")]
    Yesterday,
    #[serde(rename = "THIS_WEEK_SUN_TODAY")]
    ThisWeekSunToday,
    #[serde(rename = "THIS_WEEK_MON_TODAY")]
    ThisWeekMonToday,
    #[serde(rename = "THIS_MONTH")]
    ThisMonth,
    #[serde(rename = "LAST_WEEK")]
    LastWeek,
    #[serde(rename = "LAST_7_DAYS")]
    Last7Days,
    #[serde(rename = "LAST_14_DAYS")]
    Last14Days,
    #[serde(rename = "LAST_30_DAYS")]
    Last30Days,
    #[serde(rename = "LAST_BUSINESS_WEEK")]
    LastBusinessWeek,
    #[serde(rename = "LAST_WEEK_SUN_SAT")]
    LastWeekSunSat,
}

impl DateRangeLiteral {
    pub const ALL: [DateRangeLiteral; 11] = [
        Self::Today,
        Self::Yesterday,
        Self::ThisWeekSunToday,
        Self::ThisWeekMonToday,
        Self::ThisMonth,
        Self::LastWeek,
        Self::Last7Days,
        Self::Last14Days,
        Self::Last30Days,
        Self::LastBusinessWeek,
        Self::LastWeekSunSat,
    ];

    /// Parse a literal name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|literal| literal.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "TODAY",
            Self::Yesterday => "YESTERDAY",
            Self::ThisWeekSunToday => "THIS_WEEK_SUN_TODAY",
            Self::ThisWeekMonToday => "THIS_WEEK_MON_TODAY",
            Self::ThisMonth => "THIS_MONTH",
            Self::LastWeek => "LAST_WEEK",
            Self::Last7Days => "LAST_7_DAYS",
            Self::Last14Days => "LAST_14_DAYS",
            Self::Last30Days => "LAST_30_DAYS",
            Self::LastBusinessWeek => "LAST_BUSINESS_WEEK",
            Self::LastWeekSunSat => "LAST_WEEK_SUN_SAT",
        }
    }

    /// Resolve to an inclusive `(start, end)` pair relative to `today`
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let days = Duration::days;
        let this_monday = today - days(today.weekday().num_days_from_monday() as i64);
        let this_sunday = today - days(today.weekday().num_days_from_sunday() as i64);

        match self {
            Self::Today => (today, today),
            Self::Yesterday => (today - days(1), today - days(1)),
            Self::ThisWeekSunToday => (this_sunday, today),
            Self::ThisWeekMonToday => (this_monday, today),
            Self::ThisMonth => (today.with_day(1).unwrap_or(today), today),
            Self::LastWeek => (this_monday - days(7), this_monday - days(1)),
            Self::Last7Days => (today - days(7), today - days(1)),
            Self::Last14Days => (today - days(14), today - days(1)),
            Self::Last30Days => (today - days(30), today - days(1)),
            Self::LastBusinessWeek => (this_monday - days(7), this_monday - days(3)),
            Self::LastWeekSunSat => (this_sunday - days(7), this_sunday - days(1)),
        }
    }
}

impl std::fmt::Display for DateRangeLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an explicit `YYYYMMDD` date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_LAYOUT).ok()
}
