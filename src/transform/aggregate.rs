//! Branch labor-cost aggregation.
//!
//! Aggregation runs in two stages. Stage one buckets merged punches by
//! `(year, month, branch, salary)` and sums hours, so each distinct salary in
//! a branch contributes once. Stage two folds those buckets into one record
//! per `(year, month, branch)`, summing hours and salary, and derives
//! salary-per-hour.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::audit::{AMOUNT_OVERFLOW, AuditLog};
use crate::models::{AggregatedRecord, MergedRecord};

const STAGE: &str = "aggregate";

type PeriodKey = (i32, u32, Option<String>);

/// Returns `salary / hours`, or zero when no hours were worked.
///
/// Returns `None` when the quotient is too large for a [`Decimal`].
///
/// # Examples
///
/// ```
/// use branch_salary_engine::transform::salary_per_hour;
/// use rust_decimal::Decimal;
///
/// assert_eq!(salary_per_hour(Decimal::new(7000, 0), Decimal::ZERO), Some(Decimal::ZERO));
/// assert_eq!(
///     salary_per_hour(Decimal::new(3000, 0), Decimal::new(150, 0)),
///     Some(Decimal::new(20, 0))
/// );
/// assert_eq!(salary_per_hour(Decimal::MAX, Decimal::new(1, 3)), None);
/// ```
pub fn salary_per_hour(salary: Decimal, hours: Decimal) -> Option<Decimal> {
    if hours.is_zero() {
        Some(Decimal::ZERO)
    } else {
        salary.checked_div(hours)
    }
}

/// Adds `value` to `total`, clamping at the largest representable magnitude.
///
/// Returns `false` when the sum had to be clamped.
pub(crate) fn add_clamped(total: &mut Decimal, value: Decimal) -> bool {
    match total.checked_add(value) {
        Some(sum) => {
            *total = sum;
            true
        }
        None => {
            *total = clamp_toward(value);
            false
        }
    }
}

fn clamp_toward(value: Decimal) -> Decimal {
    if value.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

fn period_label(year: i32, month: u32, branch_id: Option<&str>) -> String {
    format!("{}-{:02} branch {}", year, month, branch_id.unwrap_or("<none>"))
}

/// Aggregates merged punches into one record per branch and period.
///
/// Null hours count as zero hours and a null salary counts as zero salary.
/// Records are returned sorted by `(year, month, branch_id)`, with the
/// unknown branch (`None`) first within a period.
///
/// A sum or rate too large for a [`Decimal`] is clamped to [`Decimal::MAX`]
/// (or [`Decimal::MIN`]) and reported as an `AMOUNT_OVERFLOW` warning.
pub fn aggregate(records: &[MergedRecord], log: &mut AuditLog) -> Vec<AggregatedRecord> {
    let mut overflowed: Vec<(PeriodKey, &str)> = Vec::new();

    let mut salary_buckets: BTreeMap<(PeriodKey, Option<Decimal>), Decimal> = BTreeMap::new();
    for record in records {
        let period = (record.year, record.month, record.branch_id.clone());
        let key = (period.clone(), record.salary.map(|s| s.normalize()));
        let hours = record.punch.hours_worked.unwrap_or(Decimal::ZERO);
        if !add_clamped(salary_buckets.entry(key).or_insert(Decimal::ZERO), hours) {
            overflowed.push((period, "hours_worked"));
        }
    }

    let mut periods: BTreeMap<PeriodKey, (Decimal, Decimal)> = BTreeMap::new();
    for ((period, salary), hours) in &salary_buckets {
        let totals = periods
            .entry(period.clone())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        if !add_clamped(&mut totals.0, *hours) {
            overflowed.push((period.clone(), "hours_worked"));
        }
        if !add_clamped(&mut totals.1, salary.unwrap_or(Decimal::ZERO)) {
            overflowed.push((period.clone(), "salary"));
        }
    }

    let aggregated: Vec<AggregatedRecord> = periods
        .into_iter()
        .map(|((year, month, branch_id), (hours_worked, salary))| {
            let rate = salary_per_hour(salary, hours_worked).unwrap_or_else(|| {
                overflowed.push(((year, month, branch_id.clone()), "salary_per_hour"));
                clamp_toward(salary)
            });
            AggregatedRecord {
                year,
                month,
                branch_id,
                hours_worked,
                salary,
                salary_per_hour: rate,
            }
        })
        .collect();

    overflowed.dedup();
    for ((year, month, branch_id), field) in &overflowed {
        log.warn(
            AMOUNT_OVERFLOW,
            "high",
            format!(
                "{} for {} exceeds the decimal range and was clamped",
                field,
                period_label(*year, *month, branch_id.as_deref())
            ),
        );
    }

    let zero_hour_records = aggregated
        .iter()
        .filter(|r| r.hours_worked.is_zero())
        .count();

    log.step(
        STAGE,
        "branch_aggregation",
        "Branch Labor Cost Aggregation",
        serde_json::json!({ "merged_records": records.len() }),
        serde_json::json!({
            "salary_buckets": salary_buckets.len(),
            "records": aggregated.len(),
            "zero_hour_records": zero_hour_records,
            "overflowed_values": overflowed.len()
        }),
        format!(
            "Folded {} salary bucket(s) into {} branch/period record(s)",
            salary_buckets.len(),
            aggregated.len()
        ),
    );

    aggregated
}
