//! Employee merge.
//!
//! The employee table arrives with its own column names (the id column is
//! `employe_id` in the source export), so it first passes through an
//! [`EmployeeSchema`] mapping. Punches are then left-joined to employees on
//! employee id: every punch survives exactly once, and punches of unknown
//! employees carry null branch and salary.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::audit::{AuditLog, DUPLICATE_EMPLOYEE, UNMATCHED_EMPLOYEE};
use crate::error::{EngineError, EngineResult};
use crate::ingest::RawTable;
use crate::models::{EmployeeRecord, MergedRecord, WorkedPunch, is_null_marker};

const STAGE: &str = "merge";
const TABLE: &str = "employees";

/// Maps employee source columns onto [`EmployeeRecord`] fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmployeeSchema {
    /// Column holding the employee id.
    pub employee_id: String,
    /// Column holding the branch id.
    pub branch_id: String,
    /// Column holding the salary.
    pub salary: String,
}

impl Default for EmployeeSchema {
    fn default() -> Self {
        Self {
            employee_id: "employe_id".to_string(),
            branch_id: "branch_id".to_string(),
            salary: "salary".to_string(),
        }
    }
}

impl EmployeeSchema {
    /// Converts an employee table into records using this mapping.
    ///
    /// Blank or `nan` branch and salary cells become `None`. A missing column,
    /// a blank employee id, or a salary that is not a number is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use branch_salary_engine::ingest::RawTable;
    /// use branch_salary_engine::transform::EmployeeSchema;
    ///
    /// let table = RawTable {
    ///     headers: vec!["employe_id".into(), "branch_id".into(), "salary".into()],
    ///     rows: vec![vec!["E1".into(), "B1".into(), "3000".into()]],
    /// };
    /// let employees = EmployeeSchema::default().normalize(&table).unwrap();
    /// assert_eq!(employees[0].employee_id, "E1");
    /// ```
    pub fn normalize(&self, table: &RawTable) -> EngineResult<Vec<EmployeeRecord>> {
        let id_column = table.require_column(TABLE, &self.employee_id)?;
        let branch_column = table.require_column(TABLE, &self.branch_id)?;
        let salary_column = table.require_column(TABLE, &self.salary)?;

        table
            .rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let employee_id = table
                    .cell(cells, id_column)
                    .filter(|text| !is_null_marker(text))
                    .ok_or_else(|| EngineError::InvalidRow {
                        table: TABLE.to_string(),
                        row,
                        message: format!("blank '{}'", self.employee_id),
                    })?;

                let branch_id = table
                    .cell(cells, branch_column)
                    .filter(|text| !is_null_marker(text))
                    .map(str::to_string);

                let salary = match table.cell(cells, salary_column) {
                    Some(text) if !is_null_marker(text) => {
                        Some(Decimal::from_str(text).map_err(|e| EngineError::InvalidRow {
                            table: TABLE.to_string(),
                            row,
                            message: format!("invalid salary '{}': {}", text, e),
                        })?)
                    }
                    _ => None,
                };

                Ok(EmployeeRecord {
                    employee_id: employee_id.to_string(),
                    branch_id,
                    salary,
                })
            })
            .collect()
    }
}

/// The result of the employee merge.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// One merged record per input punch, in input order.
    pub records: Vec<MergedRecord>,
    /// Number of punches whose employee was not found.
    pub unmatched: usize,
}

/// Left-joins punches to employees and derives the (year, month) period.
///
/// When an employee id appears more than once, the first record is used.
///
/// # Examples
///
/// ```
/// use branch_salary_engine::audit::AuditLog;
/// use branch_salary_engine::models::WorkedPunch;
/// use branch_salary_engine::transform::merge_employees;
/// use chrono::NaiveDate;
///
/// let punch = WorkedPunch {
///     punch_id: "t1".to_string(),
///     employee_id: "E404".to_string(),
///     date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
///     clock_in: None,
///     clock_out: None,
///     hours_worked: None,
/// };
///
/// let mut log = AuditLog::default();
/// let result = merge_employees(vec![punch], &[], &mut log);
/// assert_eq!(result.records.len(), 1);
/// assert_eq!(result.records[0].branch_id, None);
/// assert_eq!((result.records[0].year, result.records[0].month), (2024, 3));
/// ```
pub fn merge_employees(
    punches: Vec<WorkedPunch>,
    employees: &[EmployeeRecord],
    log: &mut AuditLog,
) -> MergeResult {
    let input_count = punches.len();

    let mut by_id: HashMap<&str, &EmployeeRecord> = HashMap::with_capacity(employees.len());
    let mut repeated: BTreeMap<&str, usize> = BTreeMap::new();
    for employee in employees {
        if by_id.contains_key(employee.employee_id.as_str()) {
            *repeated.entry(employee.employee_id.as_str()).or_insert(1) += 1;
        } else {
            by_id.insert(employee.employee_id.as_str(), employee);
        }
    }
    for (employee_id, count) in &repeated {
        log.warn(
            DUPLICATE_EMPLOYEE,
            "medium",
            format!(
                "Employee {} appears {} times in the employee table; first record used",
                employee_id, count
            ),
        );
    }

    let mut unmatched_ids: BTreeMap<String, usize> = BTreeMap::new();
    let mut records = Vec::with_capacity(input_count);
    for punch in punches {
        let employee = by_id.get(punch.employee_id.as_str());
        if employee.is_none() {
            *unmatched_ids.entry(punch.employee_id.clone()).or_insert(0) += 1;
        }

        records.push(MergedRecord {
            branch_id: employee.and_then(|e| e.branch_id.clone()),
            salary: employee.and_then(|e| e.salary),
            year: punch.date.year(),
            month: punch.date.month(),
            punch,
        });
    }

    for (employee_id, count) in &unmatched_ids {
        log.warn(
            UNMATCHED_EMPLOYEE,
            "medium",
            format!(
                "Employee {} has {} punch(es) but no employee record; branch and salary left null",
                employee_id, count
            ),
        );
    }
    let unmatched: usize = unmatched_ids.values().sum();

    log.step(
        STAGE,
        "employee_merge",
        "Employee Merge",
        serde_json::json!({
            "punches": input_count,
            "employees": employees.len()
        }),
        serde_json::json!({
            "merged": records.len(),
            "unmatched_punches": unmatched,
            "unmatched_employees": unmatched_ids.len()
        }),
        format!(
            "Merged {} punch(es) with employee data; {} without an employee record",
            records.len(),
            unmatched
        ),
    );

    MergeResult { records, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_punch(id: &str, employee: &str, date: &str, hours: Option<&str>) -> WorkedPunch {
        WorkedPunch {
            punch_id: id.to_string(),
            employee_id: employee.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            clock_in: None,
            clock_out: None,
            hours_worked: hours.map(dec),
        }
    }

    fn make_employee(id: &str, branch: Option<&str>, salary: Option<&str>) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            branch_id: branch.map(str::to_string),
            salary: salary.map(dec),
        }
    }

    fn employee_table(rows: Vec<Vec<&str>>) -> RawTable {
        RawTable {
            headers: vec![
                "employe_id".to_string(),
                "branch_id".to_string(),
                "salary".to_string(),
            ],
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(str::to_string).collect())
                .collect(),
        }
    }

    #[test]
    fn test_schema_maps_source_id_column() {
        let table = employee_table(vec![vec!["E1", "B1", "3000"], vec!["E2", "", "nan"]]);

        let employees = EmployeeSchema::default().normalize(&table).unwrap();

        assert_eq!(employees[0], make_employee("E1", Some("B1"), Some("3000")));
        assert_eq!(employees[1], make_employee("E2", None, None));
    }

    #[test]
    fn test_schema_missing_column_is_error() {
        let table = RawTable {
            headers: vec!["employee_id".to_string(), "branch_id".to_string()],
            rows: vec![],
        };

        let result = EmployeeSchema::default().normalize(&table);

        match result {
            Err(EngineError::MissingColumn { table, column }) => {
                assert_eq!(table, "employees");
                assert_eq!(column, "employe_id");
            }
            _ => panic!("Expected MissingColumn error"),
        }
    }

    #[test]
    fn test_schema_custom_column_names() {
        let table = RawTable {
            headers: vec!["id".to_string(), "site".to_string(), "pay".to_string()],
            rows: vec![vec!["E1".to_string(), "S9".to_string(), "1234.5".to_string()]],
        };
        let schema = EmployeeSchema {
            employee_id: "id".to_string(),
            branch_id: "site".to_string(),
            salary: "pay".to_string(),
        };

        let employees = schema.normalize(&table).unwrap();

        assert_eq!(employees[0], make_employee("E1", Some("S9"), Some("1234.5")));
    }

    #[test]
    fn test_schema_rejects_bad_salary() {
        let table = employee_table(vec![vec!["E1", "B1", "lots"]]);

        let result = EmployeeSchema::default().normalize(&table);

        assert!(matches!(result, Err(EngineError::InvalidRow { row: 0, .. })));
    }

    #[test]
    fn test_merge_attaches_branch_salary_and_period() {
        let punches = vec![make_punch("t1", "E1", "2024-03-04", Some("8"))];
        let employees = vec![make_employee("E1", Some("B1"), Some("3000"))];
        let mut log = AuditLog::default();

        let result = merge_employees(punches, &employees, &mut log);

        let record = &result.records[0];
        assert_eq!(record.branch_id.as_deref(), Some("B1"));
        assert_eq!(record.salary, Some(dec("3000")));
        assert_eq!(record.year, 2024);
        assert_eq!(record.month, 3);
        assert_eq!(record.punch.punch_id, "t1");
        assert_eq!(result.unmatched, 0);
    }

    #[test]
    fn test_unmatched_punch_is_kept_with_nulls() {
        let punches = vec![
            make_punch("t1", "E1", "2024-03-04", Some("8")),
            make_punch("t2", "E9", "2024-03-04", Some("6")),
        ];
        let employees = vec![make_employee("E1", Some("B1"), Some("3000"))];
        let mut log = AuditLog::default();

        let result = merge_employees(punches, &employees, &mut log);

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[1].branch_id, None);
        assert_eq!(result.records[1].salary, None);
        assert_eq!(result.records[1].punch.hours_worked, Some(dec("6")));
        assert_eq!(result.unmatched, 1);
        assert_eq!(log.warnings()[0].code, UNMATCHED_EMPLOYEE);
    }

    #[test]
    fn test_repeated_employee_does_not_duplicate_punches() {
        let punches = vec![make_punch("t1", "E1", "2024-03-04", Some("8"))];
        let employees = vec![
            make_employee("E1", Some("B1"), Some("3000")),
            make_employee("E1", Some("B2"), Some("9000")),
        ];
        let mut log = AuditLog::default();

        let result = merge_employees(punches, &employees, &mut log);

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].branch_id.as_deref(), Some("B1"));
        assert_eq!(log.warnings()[0].code, DUPLICATE_EMPLOYEE);
        assert!(log.warnings()[0].message.contains("2 times"));
    }

    #[test]
    fn test_empty_employee_table_keeps_every_punch() {
        let punches = vec![
            make_punch("t1", "E1", "2024-03-04", Some("8")),
            make_punch("t2", "E2", "2024-04-01", None),
        ];
        let mut log = AuditLog::default();

        let result = merge_employees(punches, &[], &mut log);

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[1].month, 4);
        assert_eq!(result.unmatched, 2);
    }

    proptest! {
        #[test]
        fn prop_merge_preserves_row_count(
            punch_employees in prop::collection::vec(0..6u8, 0..30),
            employee_ids in prop::collection::vec(0..6u8, 0..10),
        ) {
            let punches: Vec<WorkedPunch> = punch_employees
                .iter()
                .enumerate()
                .map(|(i, e)| make_punch(&format!("t{}", i), &format!("E{}", e), "2024-03-04", Some("1")))
                .collect();
            let employees: Vec<EmployeeRecord> = employee_ids
                .iter()
                .map(|e| make_employee(&format!("E{}", e), Some("B1"), Some("100")))
                .collect();
            let mut log = AuditLog::default();

            let result = merge_employees(punches, &employees, &mut log);

            prop_assert_eq!(result.records.len(), punch_employees.len());
        }
    }
}
