//! Request types for the Branch Salary Engine API.
//!
//! This module defines the JSON request structures for the `/reconcile`
//! endpoint. Field names follow the domain model; the source-export names
//! (`timesheet_id`, `checkin`, `checkout`, `employe_id`) are accepted as
//! aliases.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeRecord, PunchRecord};

/// Request body for the `/reconcile` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileRequest {
    /// The employee table.
    pub employees: Vec<EmployeeRequest>,
    /// The punch table.
    pub punches: Vec<PunchRequest>,
}

/// One employee row in a reconcile request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRequest {
    /// Unique identifier for the employee.
    #[serde(alias = "employe_id")]
    pub employee_id: String,
    /// The employee's branch.
    #[serde(default)]
    pub branch_id: Option<String>,
    /// The employee's salary for the period.
    #[serde(default)]
    pub salary: Option<Decimal>,
}

/// One punch row in a reconcile request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunchRequest {
    /// Identifier of the punch.
    #[serde(alias = "timesheet_id")]
    pub punch_id: String,
    /// The employee who punched.
    pub employee_id: String,
    /// The date the punch belongs to.
    pub date: NaiveDate,
    /// Clock-in text such as `"09:00:00"`.
    #[serde(default, alias = "checkin")]
    pub clock_in: Option<String>,
    /// Clock-out text such as `"17:00:00"`.
    #[serde(default, alias = "checkout")]
    pub clock_out: Option<String>,
}

impl ReconcileRequest {
    /// Rejects rows with blank identifiers.
    pub fn validate(&self) -> EngineResult<()> {
        for (row, employee) in self.employees.iter().enumerate() {
            if employee.employee_id.trim().is_empty() {
                return Err(EngineError::InvalidRow {
                    table: "employees".to_string(),
                    row,
                    message: "blank 'employee_id'".to_string(),
                });
            }
        }

        for (row, punch) in self.punches.iter().enumerate() {
            if punch.employee_id.trim().is_empty() {
                return Err(EngineError::InvalidRow {
                    table: "punches".to_string(),
                    row,
                    message: "blank 'employee_id'".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl From<EmployeeRequest> for EmployeeRecord {
    fn from(req: EmployeeRequest) -> Self {
        Self {
            employee_id: req.employee_id,
            branch_id: req.branch_id,
            salary: req.salary,
        }
    }
}

impl From<PunchRequest> for PunchRecord {
    fn from(req: PunchRequest) -> Self {
        Self {
            punch_id: req.punch_id,
            employee_id: req.employee_id,
            date: req.date,
            clock_in: req.clock_in,
            clock_out: req.clock_out,
        }
    }
}
