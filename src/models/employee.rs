//! Employee compensation model.
//!
//! This module defines the EmployeeRecord struct that carries the branch
//! and salary an employee's punches are costed against.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An employee's branch assignment and period salary.
///
/// Both fields are optional because upstream data does not guarantee them;
/// a missing value flows through the merge as null rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Unique identifier for the employee.
    pub employee_id: String,
    /// The branch the employee belongs to.
    #[serde(default)]
    pub branch_id: Option<String>,
    /// The employee's salary for the period.
    #[serde(default)]
    pub salary: Option<Decimal>,
}
