//! Clock value imputation.
//!
//! Missing clock values are filled from the other clock column using an
//! ordered list of [`FillRule`]s per column; the first rule whose condition
//! holds supplies the value. Clock-out is always processed before clock-in
//! because the clock-in rules look at the imputed clock-out.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::audit::{AuditLog, CLOCK_PARSE_FAILURE, CLOCK_UNRESOLVED};
use crate::models::{PunchRecord, TimedPunch, format_clock, is_null_marker, parse_clock};

const STAGE: &str = "impute";

/// One of the two clock columns of a punch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockColumn {
    /// The clock-in column.
    ClockIn,
    /// The clock-out column.
    ClockOut,
}

impl ClockColumn {
    /// The column whose value drives imputation of this one.
    pub fn reference(self) -> ClockColumn {
        match self {
            ClockColumn::ClockIn => ClockColumn::ClockOut,
            ClockColumn::ClockOut => ClockColumn::ClockIn,
        }
    }

    /// The column name used in audit output.
    pub fn name(self) -> &'static str {
        match self {
            ClockColumn::ClockIn => "clock_in",
            ClockColumn::ClockOut => "clock_out",
        }
    }
}

/// How a reference value is compared to a rule threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Reference value is less than or equal to the threshold.
    AtMost,
    /// Reference value is strictly greater than the threshold.
    After,
}

impl Comparison {
    fn holds(self, value: Duration, threshold: Duration) -> bool {
        match self {
            Comparison::AtMost => value <= threshold,
            Comparison::After => value > threshold,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Comparison::AtMost => "<=",
            Comparison::After => ">",
        }
    }
}

/// Fills a missing clock value when the reference column satisfies a
/// threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillRule {
    /// How the reference value must compare to `threshold`.
    pub reference_is: Comparison,
    /// The threshold the reference value is compared against.
    pub threshold: Duration,
    /// The value written into the missing column.
    pub fill: Duration,
}

impl FillRule {
    /// Returns true if the rule applies given the reference column's value.
    ///
    /// A missing or unparseable reference never matches.
    pub fn matches(&self, reference: Option<Duration>) -> bool {
        reference.is_some_and(|value| self.reference_is.holds(value, self.threshold))
    }

    fn describe(&self, column: ClockColumn) -> String {
        format!(
            "{} missing and {} {} {} -> {}",
            column.name(),
            column.reference().name(),
            self.reference_is.symbol(),
            format_clock(self.threshold),
            format_clock(self.fill)
        )
    }
}

/// Ordered fill rules for both clock columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImputationRules {
    /// Rules for missing clock-out values, keyed on clock-in.
    pub clock_out: Vec<FillRule>,
    /// Rules for missing clock-in values, keyed on the imputed clock-out.
    pub clock_in: Vec<FillRule>,
}

impl ImputationRules {
    /// Returns the rules for the given column.
    pub fn for_column(&self, column: ClockColumn) -> &[FillRule] {
        match column {
            ClockColumn::ClockIn => &self.clock_in,
            ClockColumn::ClockOut => &self.clock_out,
        }
    }
}

impl Default for ImputationRules {
    /// Morning starts without clock-out end at 18:00; afternoon starts run to
    /// 08:00 the next day. Missing clock-in is 00:00 for clock-outs up to
    /// 09:00 and 09:00 otherwise.
    fn default() -> Self {
        Self {
            clock_out: vec![
                FillRule {
                    reference_is: Comparison::AtMost,
                    threshold: Duration::hours(12),
                    fill: Duration::hours(18),
                },
                FillRule {
                    reference_is: Comparison::After,
                    threshold: Duration::hours(12),
                    fill: Duration::hours(32),
                },
            ],
            clock_in: vec![
                FillRule {
                    reference_is: Comparison::AtMost,
                    threshold: Duration::hours(9),
                    fill: Duration::zero(),
                },
                FillRule {
                    reference_is: Comparison::After,
                    threshold: Duration::hours(9),
                    fill: Duration::hours(9),
                },
            ],
        }
    }
}

/// Per-column imputation counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnSummary {
    /// Values filled by a rule.
    pub filled: usize,
    /// Present values that failed to parse and became null.
    pub parse_failures: usize,
    /// Values still null after processing.
    pub missing_after: usize,
}

/// The result of imputation.
#[derive(Debug, Clone)]
pub struct ImputationResult {
    /// Punches with parsed clock values, in input order.
    pub punches: Vec<TimedPunch>,
    /// Clock-out column counts.
    pub clock_out: ColumnSummary,
    /// Clock-in column counts.
    pub clock_in: ColumnSummary,
}

/// A clock value before its column has been processed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ClockReading {
    Missing,
    Unparsed(String),
    At(Duration),
}

impl ClockReading {
    fn from_raw(raw: Option<String>) -> Self {
        match raw {
            None => ClockReading::Missing,
            Some(text) if is_null_marker(&text) => ClockReading::Missing,
            Some(text) => match parse_clock(&text) {
                Some(value) => ClockReading::At(value),
                None => ClockReading::Unparsed(text),
            },
        }
    }

    fn value(&self) -> Option<Duration> {
        match self {
            ClockReading::At(value) => Some(*value),
            ClockReading::Missing | ClockReading::Unparsed(_) => None,
        }
    }
}

struct PendingPunch {
    record: PunchRecord,
    clock_in: ClockReading,
    clock_out: ClockReading,
}

impl PendingPunch {
    fn new(mut record: PunchRecord) -> Self {
        let clock_in = ClockReading::from_raw(record.clock_in.take());
        let clock_out = ClockReading::from_raw(record.clock_out.take());
        Self {
            record,
            clock_in,
            clock_out,
        }
    }

    fn reading(&self, column: ClockColumn) -> &ClockReading {
        match column {
            ClockColumn::ClockIn => &self.clock_in,
            ClockColumn::ClockOut => &self.clock_out,
        }
    }

    fn reading_mut(&mut self, column: ClockColumn) -> &mut ClockReading {
        match column {
            ClockColumn::ClockIn => &mut self.clock_in,
            ClockColumn::ClockOut => &mut self.clock_out,
        }
    }

    fn finish(self) -> TimedPunch {
        TimedPunch {
            punch_id: self.record.punch_id,
            employee_id: self.record.employee_id,
            date: self.record.date,
            clock_in: self.clock_in.value(),
            clock_out: self.clock_out.value(),
        }
    }
}

/// Fills and parses both clock columns, clock-out first.
///
/// # Examples
///
/// ```
/// use branch_salary_engine::audit::AuditLog;
/// use branch_salary_engine::models::PunchRecord;
/// use branch_salary_engine::transform::{impute_times, ImputationRules};
/// use chrono::{Duration, NaiveDate};
///
/// let punch = PunchRecord {
///     punch_id: "t1".to_string(),
///     employee_id: "E1".to_string(),
///     date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
///     clock_in: Some("10:00:00".to_string()),
///     clock_out: None,
/// };
///
/// let mut log = AuditLog::default();
/// let result = impute_times(vec![punch], &ImputationRules::default(), &mut log);
/// assert_eq!(result.punches[0].clock_out, Some(Duration::hours(18)));
/// ```
pub fn impute_times(
    punches: Vec<PunchRecord>,
    rules: &ImputationRules,
    log: &mut AuditLog,
) -> ImputationResult {
    let mut pending: Vec<PendingPunch> = punches.into_iter().map(PendingPunch::new).collect();

    let clock_out = impute_column(&mut pending, ClockColumn::ClockOut, rules, log);
    let clock_in = impute_column(&mut pending, ClockColumn::ClockIn, rules, log);

    ImputationResult {
        punches: pending.into_iter().map(PendingPunch::finish).collect(),
        clock_out,
        clock_in,
    }
}

/// Applies one column's rules, then nulls out values that failed to parse.
fn impute_column(
    rows: &mut [PendingPunch],
    column: ClockColumn,
    rules: &ImputationRules,
    log: &mut AuditLog,
) -> ColumnSummary {
    let column_rules = rules.for_column(column);
    let mut per_rule = vec![0usize; column_rules.len()];
    let mut summary = ColumnSummary::default();

    for row in rows.iter_mut() {
        if *row.reading(column) != ClockReading::Missing {
            continue;
        }
        let reference = row.reading(column.reference()).value();
        if let Some(index) = column_rules.iter().position(|r| r.matches(reference)) {
            *row.reading_mut(column) = ClockReading::At(column_rules[index].fill);
            per_rule[index] += 1;
            summary.filled += 1;
        }
    }

    for row in rows.iter_mut() {
        if let ClockReading::Unparsed(text) = row.reading(column) {
            log.warn(
                CLOCK_PARSE_FAILURE,
                "medium",
                format!(
                    "Punch {} has unparseable {} '{}'; value set to null",
                    row.record.punch_id,
                    column.name(),
                    text
                ),
            );
            *row.reading_mut(column) = ClockReading::Missing;
            summary.parse_failures += 1;
        }
    }

    let unresolved: Vec<&str> = rows
        .iter()
        .filter(|row| *row.reading(column) == ClockReading::Missing)
        .map(|row| row.record.punch_id.as_str())
        .collect();
    summary.missing_after = unresolved.len();
    if !unresolved.is_empty() {
        log.warn(
            CLOCK_UNRESOLVED,
            "low",
            format!(
                "Column '{}' has {} missing value(s) after processing: {}",
                column.name(),
                unresolved.len(),
                unresolved.join(", ")
            ),
        );
    }

    let rule_counts: Vec<serde_json::Value> = column_rules
        .iter()
        .zip(&per_rule)
        .map(|(rule, count)| {
            serde_json::json!({
                "rule": rule.describe(column),
                "filled": count
            })
        })
        .collect();

    log.step(
        STAGE,
        &format!("{}_imputation", column.name()),
        &format!("Missing {} Imputation", column.name()),
        serde_json::json!({
            "column": column.name(),
            "reference": column.reference().name(),
            "rows": rows.len()
        }),
        serde_json::json!({
            "rules": rule_counts,
            "filled": summary.filled,
            "parse_failures": summary.parse_failures,
            "missing_after": summary.missing_after
        }),
        format!(
            "Filled {} missing {} value(s); {} parse failure(s); {} still missing",
            summary.filled,
            column.name(),
            summary.parse_failures,
            summary.missing_after
        ),
    );

    summary
}
