//! Punch table mapping.

use chrono::NaiveDate;
use serde::Deserialize;

use super::RawTable;
use crate::error::{EngineError, EngineResult};
use crate::models::{PunchRecord, is_null_marker};

const TABLE: &str = "timesheets";

/// Maps punch source columns onto [`PunchRecord`] fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PunchSchema {
    /// Column holding the punch id.
    pub punch_id: String,
    /// Column holding the employee id.
    pub employee_id: String,
    /// Column holding the `YYYY-MM-DD` date.
    pub date: String,
    /// Column holding the clock-in text.
    pub clock_in: String,
    /// Column holding the clock-out text.
    pub clock_out: String,
}

impl Default for PunchSchema {
    fn default() -> Self {
        Self {
            punch_id: "timesheet_id".to_string(),
            employee_id: "employee_id".to_string(),
            date: "date".to_string(),
            clock_in: "checkin".to_string(),
            clock_out: "checkout".to_string(),
        }
    }
}

impl PunchSchema {
    /// Converts a punch table into records using this mapping.
    ///
    /// Clock text is carried through unparsed; blank and `nan` clock cells
    /// become `None`. A blank punch id is kept as an empty string. A blank
    /// employee id or an unparsable date is an error.
    pub fn normalize(&self, table: &RawTable) -> EngineResult<Vec<PunchRecord>> {
        let punch_column = table.require_column(TABLE, &self.punch_id)?;
        let employee_column = table.require_column(TABLE, &self.employee_id)?;
        let date_column = table.require_column(TABLE, &self.date)?;
        let clock_in_column = table.require_column(TABLE, &self.clock_in)?;
        let clock_out_column = table.require_column(TABLE, &self.clock_out)?;

        table
            .rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let required = |index: usize, column: &str| {
                    table
                        .cell(cells, index)
                        .filter(|text| !is_null_marker(text))
                        .ok_or_else(|| EngineError::InvalidRow {
                            table: TABLE.to_string(),
                            row,
                            message: format!("blank '{}'", column),
                        })
                };
                let optional = |index: usize| {
                    table
                        .cell(cells, index)
                        .filter(|text| !is_null_marker(text))
                        .map(str::to_string)
                };

                let date_text = required(date_column, self.date.as_str())?;
                let date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d").map_err(|e| {
                    EngineError::InvalidRow {
                        table: TABLE.to_string(),
                        row,
                        message: format!("invalid date '{}': {}", date_text, e),
                    }
                })?;

                Ok(PunchRecord {
                    punch_id: optional(punch_column).unwrap_or_default(),
                    employee_id: required(employee_column, self.employee_id.as_str())?.to_string(),
                    date,
                    clock_in: optional(clock_in_column),
                    clock_out: optional(clock_out_column),
                })
            })
            .collect()
    }
}
