//! Core data models for the Branch Salary Engine.
//!
//! This module contains the domain models used throughout the pipeline,
//! from raw punches to aggregated labor cost and the audit trace.

mod clock;
mod employee;
mod labor_cost;
mod punch;
mod reconciliation_result;

pub use clock::{
    duration_hours, format_clock, is_null_marker, one_day, parse_clock, time_of_day,
};
pub use employee::EmployeeRecord;
pub use labor_cost::{AggregatedRecord, LaborCostTotals, MergedRecord};
pub use punch::{PunchRecord, TimedPunch, WorkedPunch};
pub use reconciliation_result::{AuditStep, AuditTrace, AuditWarning, ReconciliationResult};
