//! Merged and aggregated labor-cost records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::WorkedPunch;

/// A worked punch joined with its employee's compensation data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRecord {
    /// The normalized punch.
    pub punch: WorkedPunch,
    /// The employee's branch; `None` when the employee is unknown.
    pub branch_id: Option<String>,
    /// The employee's salary; `None` when the employee is unknown.
    pub salary: Option<Decimal>,
    /// Calendar year of the punch date.
    pub year: i32,
    /// Calendar month (1-12) of the punch date.
    pub month: u32,
}

/// Labor cost for one branch in one month.
///
/// The natural key is `(year, month, branch_id)`; a batch never contains two
/// records with the same key.
///
/// # Example
///
/// ```
/// use branch_salary_engine::models::AggregatedRecord;
/// use rust_decimal::Decimal;
///
/// let record = AggregatedRecord {
///     year: 2024,
///     month: 3,
///     branch_id: Some("B1".to_string()),
///     hours_worked: Decimal::new(450, 0),
///     salary: Decimal::new(7000, 0),
///     salary_per_hour: Decimal::new(7000, 0) / Decimal::new(450, 0),
/// };
/// assert_eq!(record.key(), (2024, 3, Some("B1")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Branch identifier; `None` groups punches of unknown employees.
    pub branch_id: Option<String>,
    /// Total hours worked in the branch and period.
    pub hours_worked: Decimal,
    /// Total salary cost of the distinct salary buckets.
    pub salary: Decimal,
    /// `salary / hours_worked`, or zero when no hours were worked.
    pub salary_per_hour: Decimal,
}

impl AggregatedRecord {
    /// Returns the natural key of the record.
    pub fn key(&self) -> (i32, u32, Option<&str>) {
        (self.year, self.month, self.branch_id.as_deref())
    }
}

/// Batch-level totals across all aggregated records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaborCostTotals {
    /// Number of punches that entered the pipeline.
    pub punches_in: usize,
    /// Number of punches that survived deduplication.
    pub punches_kept: usize,
    /// Number of aggregated branch/period records.
    pub records: usize,
    /// Sum of hours across all records.
    pub hours_worked: Decimal,
    /// Sum of salary across all records.
    pub salary: Decimal,
}
