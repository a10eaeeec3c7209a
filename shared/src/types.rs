//! Common types used across the analysis engines

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validation::ParseEnumError;

/// Stock location analysed when the caller does not name one (WH/Stock)
pub const DEFAULT_LOCATION_ID: i64 = 8;

/// Granularity of a demand series
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    #[default]
    Day,
    Week,
    Month,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Day => "day",
            PeriodType::Week => "week",
            PeriodType::Month => "month",
        }
    }

    /// Expected length of one seasonal cycle, in periods
    pub fn seasonal_period(&self) -> usize {
        match self {
            PeriodType::Day => 7,
            PeriodType::Week => 4,
            PeriodType::Month => 12,
        }
    }

    /// First day of the period containing `date`
    ///
    /// Weeks start on Monday, months on the 1st.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            PeriodType::Day => date,
            PeriodType::Week => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            PeriodType::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// Advance `date` by `steps` whole periods
    pub fn advance(&self, date: NaiveDate, steps: u32) -> NaiveDate {
        match self {
            PeriodType::Day => date + Duration::days(steps as i64),
            PeriodType::Week => date + Duration::weeks(steps as i64),
            PeriodType::Month => date
                .checked_add_months(Months::new(steps))
                .unwrap_or(date),
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(PeriodType::Day),
            "week" => Ok(PeriodType::Week),
            "month" => Ok(PeriodType::Month),
            other => Err(ParseEnumError::new("period_type", other)),
        }
    }
}

/// Cumulative value shares bounding the A and B classes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AbcThresholds {
    pub a: f64,
    pub b: f64,
}

impl Default for AbcThresholds {
    fn default() -> Self {
        Self { a: 0.80, b: 0.95 }
    }
}

/// Coefficient-of-variation bounds for the X and Y classes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct XyzThresholds {
    pub x: f64,
    pub y: f64,
}

impl Default for XyzThresholds {
    fn default() -> Self {
        Self { x: 0.5, y: 1.0 }
    }
}

/// Format a date the way the ERP expects in domain filters
pub fn erp_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse the leading `YYYY-MM-DD` of an ERP date or datetime string
pub fn parse_erp_date(value: &str) -> Option<NaiveDate> {
    let head = value.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}
