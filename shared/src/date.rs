//! 时间类型模块
//!
//! - `Timestamp`: RFC 3339 instant as stored by the backend
//! - `Month`: calendar month a rent payment is made for

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =========================================================
// Timestamp
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub const fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// 毫秒时间戳；超出范围时返回 `None`
    pub fn from_millis(ms: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(ms).map(Self)
    }

    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Short date for tables, e.g. `2025-03-01`.
    pub fn date_label(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// =========================================================
// Month
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Month::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown month: {}", needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_round_trips_through_name() {
        for month in Month::ALL {
            assert_eq!(month.name().parse::<Month>().unwrap(), month);
        }
        assert_eq!("  july ".parse::<Month>().unwrap(), Month::July);
        assert!("Smarch".parse::<Month>().is_err());
    }

    #[test]
    fn test_timestamp_parses_backend_dates() {
        let ts: Timestamp = serde_json::from_str("\"2025-03-01T08:30:00.000Z\"").unwrap();
        assert_eq!(ts.date_label(), "2025-03-01");
        assert_eq!(Timestamp::from_millis(ts.as_millis()), Some(ts));
    }
}
