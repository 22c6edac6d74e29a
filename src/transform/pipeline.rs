//! Pipeline runner.
//!
//! [`Pipeline::run`] chains the five stages over in-memory tables with a
//! single [`AuditLog`]. [`run_job`] adds ingestion in front and a warehouse
//! load behind it; any structural failure along the way is returned.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::audit::{AMOUNT_OVERFLOW, AuditLog, BLANK_PUNCH_ID};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::ingest::read_csv;
use crate::models::{EmployeeRecord, LaborCostTotals, PunchRecord, ReconciliationResult};
use crate::sink::{LoadSummary, WarehouseSink};

use super::aggregate::add_clamped;
use super::{ImputationRules, adjust_shifts, aggregate, impute_times, merge_employees, remove_duplicates};

/// Runs deduplication, imputation, shift adjustment, merge and aggregation
/// in that order.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    rules: ImputationRules,
}

impl Pipeline {
    /// Creates a pipeline using the given imputation rules.
    pub fn new(rules: ImputationRules) -> Self {
        Self { rules }
    }

    /// Runs every stage under a fresh run id.
    ///
    /// # Examples
    ///
    /// ```
    /// use branch_salary_engine::models::{EmployeeRecord, PunchRecord};
    /// use branch_salary_engine::transform::Pipeline;
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let punches = vec![PunchRecord {
    ///     punch_id: "t1".to_string(),
    ///     employee_id: "E1".to_string(),
    ///     date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
    ///     clock_in: Some("22:00:00".to_string()),
    ///     clock_out: Some("06:00:00".to_string()),
    /// }];
    /// let employees = vec![EmployeeRecord {
    ///     employee_id: "E1".to_string(),
    ///     branch_id: Some("B1".to_string()),
    ///     salary: Some(Decimal::new(3000, 0)),
    /// }];
    ///
    /// let result = Pipeline::default().run(punches, &employees);
    /// assert_eq!(result.records[0].hours_worked, Decimal::new(8, 0));
    /// assert_eq!(result.records[0].salary_per_hour, Decimal::new(375, 0));
    /// ```
    pub fn run(&self, punches: Vec<PunchRecord>, employees: &[EmployeeRecord]) -> ReconciliationResult {
        self.run_as(Uuid::new_v4(), punches, employees)
    }

    /// Runs every stage under the given run id.
    pub fn run_as(
        &self,
        run_id: Uuid,
        punches: Vec<PunchRecord>,
        employees: &[EmployeeRecord],
    ) -> ReconciliationResult {
        let mut log = AuditLog::new(run_id);
        let punches_in = punches.len();
        info!(
            run_id = %run_id,
            punches = punches_in,
            employees = employees.len(),
            "Starting reconciliation"
        );

        let blank_ids = punches
            .iter()
            .filter(|p| p.punch_id.trim().is_empty())
            .count();
        if blank_ids > 0 {
            log.warn(
                BLANK_PUNCH_ID,
                "low",
                format!("{} punch(es) arrived without a punch id and were kept", blank_ids),
            );
        }

        let deduplicated = remove_duplicates(punches, &mut log);
        let punches_kept = deduplicated.punches.len();
        let imputed = impute_times(deduplicated.punches, &self.rules, &mut log);
        let adjusted = adjust_shifts(imputed.punches, &mut log);
        let merged = merge_employees(adjusted.punches, employees, &mut log);
        let records = aggregate(&merged.records, &mut log);

        let mut hours_worked = Decimal::ZERO;
        let mut salary = Decimal::ZERO;
        let mut clamped = false;
        for record in &records {
            clamped |= !add_clamped(&mut hours_worked, record.hours_worked);
            clamped |= !add_clamped(&mut salary, record.salary);
        }
        if clamped {
            log.warn(
                AMOUNT_OVERFLOW,
                "high",
                "run totals exceed the decimal range and were clamped",
            );
        }

        let totals = LaborCostTotals {
            punches_in,
            punches_kept,
            records: records.len(),
            hours_worked,
            salary,
        };

        let audit_trace = log.into_trace();
        info!(
            run_id = %run_id,
            records = totals.records,
            hours_worked = %totals.hours_worked,
            salary = %totals.salary,
            warnings = audit_trace.warnings.len(),
            duration_us = audit_trace.duration_us,
            "Reconciliation completed"
        );

        ReconciliationResult {
            run_id,
            timestamp: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            records,
            totals,
            audit_trace,
        }
    }
}

/// Reads and maps both source tables described by `config`.
pub fn load_sources(config: &EngineConfig) -> EngineResult<(Vec<PunchRecord>, Vec<EmployeeRecord>)> {
    let pipeline = config.pipeline();

    let employee_table = read_csv(&pipeline.sources.employees, "employees")?;
    let employees = pipeline.schema.employees.normalize(&employee_table)?;

    let punch_table = read_csv(&pipeline.sources.timesheets, "timesheets")?;
    let punches = pipeline.schema.punches.normalize(&punch_table)?;

    Ok((punches, employees))
}

/// The outcome of a completed job.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    /// The reconciliation result that was loaded.
    pub result: ReconciliationResult,
    /// What the warehouse load changed.
    pub load: LoadSummary,
}

/// Ingests the configured sources, runs the pipeline and loads the result.
pub fn run_job(config: &EngineConfig, sink: &mut dyn WarehouseSink) -> EngineResult<JobOutcome> {
    let (punches, employees) = load_sources(config)?;

    let result = Pipeline::new(config.rules().clone()).run(punches, &employees);
    let load = sink.replace(&result.records)?;

    info!(
        run_id = %result.run_id,
        replaced = load.replaced,
        inserted = load.inserted,
        "Job completed"
    );

    Ok(JobOutcome { result, load })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{UNMATCHED_EMPLOYEE, UNRESOLVED_DUPLICATE};
    use crate::sink::MemoryWarehouse;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_punch(id: &str, employee: &str, date: NaiveDate, clock_in: Option<&str>, clock_out: Option<&str>) -> PunchRecord {
        PunchRecord {
            punch_id: id.to_string(),
            employee_id: employee.to_string(),
            date,
            clock_in: clock_in.map(str::to_string),
            clock_out: clock_out.map(str::to_string),
        }
    }

    fn make_employee(id: &str, branch: &str, salary: &str) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            branch_id: Some(branch.to_string()),
            salary: Some(dec(salary)),
        }
    }

    #[test]
    fn test_null_clock_out_duplicate_is_removed_end_to_end() {
        let date = make_date(2024, 3, 4);
        let punches = vec![
            make_punch("t1", "E1", date, Some("09:00:00"), Some("17:00:00")),
            make_punch("t2", "E1", date, Some("09:00:00"), None),
        ];
        let employees = vec![make_employee("E1", "B1", "3000")];

        let result = Pipeline::default().run(punches, &employees);

        assert_eq!(result.totals.punches_in, 2);
        assert_eq!(result.totals.punches_kept, 1);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].hours_worked, dec("8"));
        assert_eq!(result.records[0].salary, dec("3000"));
        assert_eq!(result.records[0].salary_per_hour, dec("375"));
    }

    #[test]
    fn test_stages_are_audited_in_order() {
        let date = make_date(2024, 3, 4);
        let punches = vec![make_punch("t1", "E1", date, Some("09:00:00"), Some("17:00:00"))];
        let employees = vec![make_employee("E1", "B1", "3000")];

        let result = Pipeline::default().run(punches, &employees);

        let stages: Vec<&str> = result
            .audit_trace
            .steps
            .iter()
            .map(|s| s.stage.as_str())
            .collect();
        assert_eq!(
            stages,
            vec!["deduplicate", "impute", "impute", "shift_adjust", "merge", "aggregate"]
        );
        let numbers: Vec<u32> = result.audit_trace.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_imputed_afternoon_shift_runs_to_next_morning() {
        let date = make_date(2024, 3, 5);
        let punches = vec![make_punch("t1", "E3", date, Some("14:00:00"), None)];
        let employees = vec![make_employee("E3", "B2", "3500")];

        let result = Pipeline::default().run(punches, &employees);

        assert_eq!(result.records[0].hours_worked, dec("18"));
    }

    #[test]
    fn test_warnings_do_not_stop_the_run() {
        let date = make_date(2024, 3, 4);
        let punches = vec![
            make_punch("t1", "E1", date, Some("09:00:00"), Some("17:00:00")),
            make_punch("t2", "E1", date, Some("10:00:00"), Some("18:00:00")),
            make_punch("t3", "E9", date, Some("09:00:00"), Some("12:00:00")),
        ];
        let employees = vec![make_employee("E1", "B1", "3000")];

        let result = Pipeline::default().run(punches, &employees);

        assert!(!result.audit_trace.warnings_with_code(UNRESOLVED_DUPLICATE).is_empty());
        assert!(!result.audit_trace.warnings_with_code(UNMATCHED_EMPLOYEE).is_empty());
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.totals.hours_worked, dec("19"));
    }

    #[test]
    fn test_huge_salaries_are_clamped_instead_of_panicking() {
        let date = make_date(2024, 3, 4);
        let punches = vec![
            make_punch("t1", "E1", date, Some("09:00:00"), Some("17:00:00")),
            make_punch("t2", "E2", date, Some("09:00:00"), Some("17:00:00")),
            make_punch("t3", "E3", date, Some("09:00:00"), Some("17:00:00")),
        ];
        let employees = vec![
            make_employee("E1", "B1", "70000000000000000000000000000"),
            make_employee("E2", "B1", "60000000000000000000000000000"),
            make_employee("E3", "B2", "70000000000000000000000000000"),
        ];

        let result = Pipeline::default().run(punches, &employees);

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].salary, Decimal::MAX);
        assert_eq!(result.totals.salary, Decimal::MAX);
        assert_eq!(result.totals.hours_worked, dec("24"));
        let overflows = result.audit_trace.warnings_with_code(AMOUNT_OVERFLOW);
        assert_eq!(overflows.len(), 2);
        assert!(overflows[1].message.starts_with("run totals"));
    }

    #[test]
    fn test_sub_millisecond_span_rate_is_clamped() {
        let date = make_date(2024, 3, 4);
        let punches = vec![make_punch("t1", "E1", date, Some("09:00:00"), Some("09:00:00.001"))];
        let employees = vec![make_employee("E1", "B1", "100000000000000000000000")];

        let result = Pipeline::default().run(punches, &employees);

        assert_eq!(result.records[0].salary_per_hour, Decimal::MAX);
        assert_eq!(result.audit_trace.warnings_with_code(AMOUNT_OVERFLOW).len(), 1);
    }

    #[test]
    fn test_blank_punch_id_is_kept_with_warning() {
        let date = make_date(2024, 3, 4);
        let punches = vec![make_punch("", "E1", date, Some("09:00:00"), Some("17:00:00"))];
        let employees = vec![make_employee("E1", "B1", "3000")];

        let result = Pipeline::default().run(punches, &employees);

        assert_eq!(result.totals.punches_kept, 1);
        assert_eq!(result.records[0].hours_worked, dec("8"));
        assert_eq!(result.audit_trace.warnings_with_code(BLANK_PUNCH_ID).len(), 1);
    }

    #[test]
    fn test_run_as_keeps_run_id() {
        let run_id = Uuid::new_v4();
        let result = Pipeline::default().run_as(run_id, vec![], &[]);

        assert_eq!(result.run_id, run_id);
        assert!(result.records.is_empty());
        assert_eq!(result.totals.salary, Decimal::ZERO);
    }

    #[test]
    fn test_run_job_with_shipped_sources() {
        let config = crate::config::ConfigLoader::load("./config/branch_salary").unwrap();
        let mut warehouse = MemoryWarehouse::new();

        let outcome = run_job(config.config(), &mut warehouse).unwrap();

        assert_eq!(outcome.load.inserted, outcome.result.records.len());
        assert_eq!(warehouse.records(), outcome.result.records);
    }
}
