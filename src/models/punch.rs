//! Punch models at each stage of normalization.
//!
//! A punch moves through three shapes: [`PunchRecord`] as ingested (raw clock
//! text), [`TimedPunch`] once clock values are imputed and parsed, and
//! [`WorkedPunch`] once overnight shifts are corrected and hours computed.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::clock::is_null_marker;

/// A single time-clock punch as supplied by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchRecord {
    /// Opaque identifier of the punch.
    pub punch_id: String,
    /// The employee who punched.
    pub employee_id: String,
    /// The calendar date the punch belongs to.
    pub date: NaiveDate,
    /// Raw clock-in text, if any.
    #[serde(default)]
    pub clock_in: Option<String>,
    /// Raw clock-out text, if any.
    #[serde(default)]
    pub clock_out: Option<String>,
}

impl PunchRecord {
    /// Returns true if the punch has no clock-out value.
    ///
    /// Blank text and null markers such as `nan` count as missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use branch_salary_engine::models::PunchRecord;
    /// use chrono::NaiveDate;
    ///
    /// let punch = PunchRecord {
    ///     punch_id: "t1".to_string(),
    ///     employee_id: "E1".to_string(),
    ///     date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
    ///     clock_in: Some("09:00:00".to_string()),
    ///     clock_out: None,
    /// };
    /// assert!(punch.is_missing_clock_out());
    /// ```
    pub fn is_missing_clock_out(&self) -> bool {
        self.clock_out.as_deref().is_none_or(is_null_marker)
    }

    /// Returns true if both punches agree on every field except the punch id.
    pub fn same_content(&self, other: &PunchRecord) -> bool {
        self.employee_id == other.employee_id
            && self.date == other.date
            && self.clock_in == other.clock_in
            && self.clock_out == other.clock_out
    }
}

/// A punch whose clock values have been imputed and parsed.
///
/// A `None` clock value means the value was missing and no fill rule
/// applied, or the text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedPunch {
    /// Opaque identifier of the punch.
    pub punch_id: String,
    /// The employee who punched.
    pub employee_id: String,
    /// The calendar date the punch belongs to.
    pub date: NaiveDate,
    /// Clock-in as a duration since midnight of `date`.
    pub clock_in: Option<Duration>,
    /// Clock-out as a duration since midnight of `date`.
    pub clock_out: Option<Duration>,
}

/// A punch after overnight correction, carrying the hours it represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkedPunch {
    /// Opaque identifier of the punch.
    pub punch_id: String,
    /// The employee who punched.
    pub employee_id: String,
    /// The calendar date the punch belongs to.
    pub date: NaiveDate,
    /// Clock-in as a duration since midnight of `date`.
    pub clock_in: Option<Duration>,
    /// Clock-out as a duration since midnight of `date`, past 24h for
    /// overnight shifts.
    pub clock_out: Option<Duration>,
    /// Hours between clock-in and clock-out; `None` if either is unknown.
    pub hours_worked: Option<Decimal>,
}
