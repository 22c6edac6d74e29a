//! The reconciliation stages.
//!
//! Each stage is a function over an owned batch plus the run's
//! [`AuditLog`](crate::audit::AuditLog):
//!
//! 1. [`remove_duplicates`] - one pass over `(employee_id, date)` groups
//! 2. [`impute_times`] - rule-based fill of missing clock values
//! 3. [`adjust_shifts`] - overnight correction and hours worked
//! 4. [`merge_employees`] - left join to branch and salary
//! 5. [`aggregate`] - labor cost per branch and period
//!
//! [`Pipeline`] runs them in that order.

mod aggregate;
mod deduplicate;
mod impute;
mod merge;
mod pipeline;
mod shift_adjust;

pub use aggregate::{aggregate, salary_per_hour};
pub use deduplicate::{
    DeduplicationResult, RemovalReason, RemovedPunch, UnresolvedGroup, remove_duplicates,
};
pub use impute::{
    ClockColumn, ColumnSummary, Comparison, FillRule, ImputationResult, ImputationRules,
    impute_times,
};
pub use merge::{EmployeeSchema, MergeResult, merge_employees};
pub use pipeline::{JobOutcome, Pipeline, load_sources, run_job};
pub use shift_adjust::{ShiftAdjustmentResult, adjust_shifts, crosses_midnight};
