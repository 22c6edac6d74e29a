//! Duplicate punch removal.
//!
//! Punches are grouped by (employee id, date). Each group with more than one
//! record gets a single resolution pass: a record without clock-out is
//! dropped first; failing that, a record that repeats an earlier one on every
//! field except the punch id is dropped. At most one record leaves a group
//! per pass, and groups still holding several records are reported rather
//! than resolved further.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::audit::{AuditLog, UNRESOLVED_DUPLICATE};
use crate::models::PunchRecord;

const STAGE: &str = "deduplicate";

/// Why a punch was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// The punch had no clock-out while another punch shared its date.
    MissingClockOut,
    /// The punch repeated an earlier punch on every field but its id.
    ExactDuplicate,
}

/// A punch removed by deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedPunch {
    /// Position of the punch in the input table.
    pub row: usize,
    /// The removed punch's id.
    pub punch_id: String,
    /// The employee the punch belonged to.
    pub employee_id: String,
    /// The punch date.
    pub date: NaiveDate,
    /// Why it was removed.
    pub reason: RemovalReason,
}

/// A duplicate group that still holds several punches after the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedGroup {
    /// The employee the group belongs to.
    pub employee_id: String,
    /// The group date.
    pub date: NaiveDate,
    /// Number of punches left in the group.
    pub remaining: usize,
}

/// The result of deduplication.
#[derive(Debug, Clone)]
pub struct DeduplicationResult {
    /// Surviving punches, in input order.
    pub punches: Vec<PunchRecord>,
    /// Punches that were removed, in input order.
    pub removed: Vec<RemovedPunch>,
    /// Groups that still contain more than one punch.
    pub unresolved: Vec<UnresolvedGroup>,
}

/// Collapses duplicate punches per (employee id, date).
///
/// # Examples
///
/// ```
/// use branch_salary_engine::audit::AuditLog;
/// use branch_salary_engine::models::PunchRecord;
/// use branch_salary_engine::transform::{remove_duplicates, RemovalReason};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let punches = vec![
///     PunchRecord {
///         punch_id: "t1".to_string(),
///         employee_id: "E1".to_string(),
///         date,
///         clock_in: Some("09:00:00".to_string()),
///         clock_out: Some("17:00:00".to_string()),
///     },
///     PunchRecord {
///         punch_id: "t2".to_string(),
///         employee_id: "E1".to_string(),
///         date,
///         clock_in: Some("09:00:00".to_string()),
///         clock_out: None,
///     },
/// ];
///
/// let mut log = AuditLog::default();
/// let result = remove_duplicates(punches, &mut log);
/// assert_eq!(result.punches.len(), 1);
/// assert_eq!(result.removed[0].reason, RemovalReason::MissingClockOut);
/// ```
pub fn remove_duplicates(punches: Vec<PunchRecord>, log: &mut AuditLog) -> DeduplicationResult {
    let input_count = punches.len();

    let groups = group_rows(&punches);

    let mut marked: BTreeSet<usize> = BTreeSet::new();
    let mut reasons: HashMap<usize, RemovalReason> = HashMap::new();
    let mut duplicate_groups = 0;
    let mut unresolved = Vec::new();

    for rows in groups.iter().filter(|rows| rows.len() > 1) {
        duplicate_groups += 1;

        if let Some((row, reason)) = resolve_group(&punches, rows) {
            marked.insert(row);
            reasons.insert(row, reason);
        }

        let remaining = rows.iter().filter(|&&row| !marked.contains(&row)).count();
        if remaining > 1 {
            let first = &punches[rows[0]];
            unresolved.push(UnresolvedGroup {
                employee_id: first.employee_id.clone(),
                date: first.date,
                remaining,
            });
        }
    }

    let mut removed = Vec::with_capacity(marked.len());
    let mut kept = Vec::with_capacity(input_count - marked.len());
    for (row, punch) in punches.into_iter().enumerate() {
        match reasons.get(&row) {
            Some(&reason) => removed.push(RemovedPunch {
                row,
                punch_id: punch.punch_id,
                employee_id: punch.employee_id,
                date: punch.date,
                reason,
            }),
            None => kept.push(punch),
        }
    }

    for group in &unresolved {
        log.warn(
            UNRESOLVED_DUPLICATE,
            "medium",
            format!(
                "Employee {} still has {} punches on {} after one resolution pass",
                group.employee_id, group.remaining, group.date
            ),
        );
    }

    let missing_clock_out = removed
        .iter()
        .filter(|r| r.reason == RemovalReason::MissingClockOut)
        .count();
    let exact_duplicates = removed.len() - missing_clock_out;

    log.step(
        STAGE,
        "duplicate_removal",
        "Duplicate Punch Removal",
        serde_json::json!({
            "punches": input_count,
            "duplicate_groups": duplicate_groups
        }),
        serde_json::json!({
            "kept": kept.len(),
            "removed": &removed,
            "unresolved_groups": unresolved.len()
        }),
        format!(
            "Removed {} duplicate punch(es): {} without clock-out, {} exact duplicate(s); {} group(s) unresolved",
            removed.len(),
            missing_clock_out,
            exact_duplicates,
            unresolved.len()
        ),
    );

    DeduplicationResult {
        punches: kept,
        removed,
        unresolved,
    }
}

/// Groups row positions by (employee id, date), keeping first-seen order of
/// both groups and members.
fn group_rows(punches: &[PunchRecord]) -> Vec<Vec<usize>> {
    let mut group_index: HashMap<(&str, NaiveDate), usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (row, punch) in punches.iter().enumerate() {
        let key = (punch.employee_id.as_str(), punch.date);
        match group_index.get(&key) {
            Some(&index) => groups[index].push(row),
            None => {
                group_index.insert(key, groups.len());
                groups.push(vec![row]);
            }
        }
    }
    groups
}

/// Picks the one row to drop from a duplicate group, if any.
fn resolve_group(punches: &[PunchRecord], rows: &[usize]) -> Option<(usize, RemovalReason)> {
    if let Some(&row) = rows.iter().find(|&&row| punches[row].is_missing_clock_out()) {
        return Some((row, RemovalReason::MissingClockOut));
    }

    rows.iter()
        .enumerate()
        .skip(1)
        .find(|&(position, &row)| {
            rows[..position]
                .iter()
                .any(|&earlier| punches[earlier].same_content(&punches[row]))
        })
        .map(|(_, &row)| (row, RemovalReason::ExactDuplicate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn make_punch(
        id: &str,
        employee: &str,
        date: &str,
        clock_in: Option<&str>,
        clock_out: Option<&str>,
    ) -> PunchRecord {
        PunchRecord {
            punch_id: id.to_string(),
            employee_id: employee.to_string(),
            date: make_date(date),
            clock_in: clock_in.map(str::to_string),
            clock_out: clock_out.map(str::to_string),
        }
    }

    fn ids(punches: &[PunchRecord]) -> Vec<&str> {
        punches.iter().map(|p| p.punch_id.as_str()).collect()
    }

    #[test]
    fn test_singletons_are_untouched() {
        let punches = vec![
            make_punch("t1", "E1", "2024-03-04", Some("09:00:00"), None),
            make_punch("t2", "E1", "2024-03-05", Some("09:00:00"), Some("17:00:00")),
            make_punch("t3", "E2", "2024-03-04", None, None),
        ];
        let mut log = AuditLog::default();

        let result = remove_duplicates(punches, &mut log);

        assert_eq!(ids(&result.punches), vec!["t1", "t2", "t3"]);
        assert!(result.removed.is_empty());
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_null_clock_out_is_removed_first() {
        let punches = vec![
            make_punch("t1", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
            make_punch("t2", "E1", "2024-03-04", Some("09:00:00"), None),
        ];
        let mut log = AuditLog::default();

        let result = remove_duplicates(punches, &mut log);

        assert_eq!(ids(&result.punches), vec!["t1"]);
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].punch_id, "t2");
        assert_eq!(result.removed[0].row, 1);
        assert_eq!(result.removed[0].reason, RemovalReason::MissingClockOut);
    }

    #[test]
    fn test_null_clock_out_wins_over_exact_duplicate() {
        let punches = vec![
            make_punch("t1", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
            make_punch("t2", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
            make_punch("t3", "E1", "2024-03-04", Some("09:00:00"), None),
        ];
        let mut log = AuditLog::default();

        let result = remove_duplicates(punches, &mut log);

        assert_eq!(ids(&result.punches), vec!["t1", "t2"]);
        assert_eq!(result.removed[0].reason, RemovalReason::MissingClockOut);
        assert_eq!(result.unresolved.len(), 1);
        assert_eq!(result.unresolved[0].remaining, 2);
    }

    #[test]
    fn test_exact_duplicate_keeps_first_occurrence() {
        let punches = vec![
            make_punch("t1", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
            make_punch("t2", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
        ];
        let mut log = AuditLog::default();

        let result = remove_duplicates(punches, &mut log);

        assert_eq!(ids(&result.punches), vec!["t1"]);
        assert_eq!(result.removed[0].punch_id, "t2");
        assert_eq!(result.removed[0].reason, RemovalReason::ExactDuplicate);
    }

    #[test]
    fn test_exact_duplicate_later_in_group() {
        let punches = vec![
            make_punch("t1", "E1", "2024-03-04", Some("08:00:00"), Some("16:00:00")),
            make_punch("t2", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
            make_punch("t3", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
        ];
        let mut log = AuditLog::default();

        let result = remove_duplicates(punches, &mut log);

        assert_eq!(result.removed[0].punch_id, "t3");
        assert_eq!(ids(&result.punches), vec!["t1", "t2"]);
    }

    #[test]
    fn test_differing_pair_is_left_and_reported() {
        let punches = vec![
            make_punch("t1", "E1", "2024-03-04", Some("08:00:00"), Some("16:00:00")),
            make_punch("t2", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
        ];
        let mut log = AuditLog::default();

        let result = remove_duplicates(punches, &mut log);

        assert_eq!(result.punches.len(), 2);
        assert!(result.removed.is_empty());
        assert_eq!(result.unresolved.len(), 1);
        assert_eq!(log.warnings()[0].code, UNRESOLVED_DUPLICATE);
    }

    #[test]
    fn test_three_identical_punches_lose_only_one() {
        let punches = vec![
            make_punch("t1", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
            make_punch("t2", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
            make_punch("t3", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
        ];
        let mut log = AuditLog::default();

        let result = remove_duplicates(punches, &mut log);

        assert_eq!(ids(&result.punches), vec!["t1", "t3"]);
        assert_eq!(result.unresolved[0].remaining, 2);
    }

    #[test]
    fn test_removal_is_keyed_by_row_not_punch_id() {
        // Same punch id on both rows; only the null clock-out row may go.
        let punches = vec![
            make_punch("t1", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
            make_punch("t1", "E1", "2024-03-04", Some("09:00:00"), None),
        ];
        let mut log = AuditLog::default();

        let result = remove_duplicates(punches, &mut log);

        assert_eq!(result.punches.len(), 1);
        assert_eq!(result.punches[0].clock_out.as_deref(), Some("17:00:00"));
    }

    #[test]
    fn test_audit_step_reports_counts() {
        let punches = vec![
            make_punch("t1", "E1", "2024-03-04", Some("09:00:00"), Some("17:00:00")),
            make_punch("t2", "E1", "2024-03-04", Some("09:00:00"), None),
        ];
        let mut log = AuditLog::default();

        remove_duplicates(punches, &mut log);

        let step = &log.steps()[0];
        assert_eq!(step.rule_id, "duplicate_removal");
        assert_eq!(step.input["duplicate_groups"], 1);
        assert_eq!(step.output["kept"], 1);
        assert_eq!(step.output["removed"][0]["reason"], "missing_clock_out");
    }

    fn punch_strategy() -> impl Strategy<Value = PunchRecord> {
        (
            0..3u8,
            1..4u32,
            prop::option::of(prop::sample::select(vec!["08:00:00", "13:00:00"])),
            prop::option::of(prop::sample::select(vec!["17:00:00", "02:00:00"])),
        )
            .prop_map(|(employee, day, clock_in, clock_out)| PunchRecord {
                punch_id: String::new(),
                employee_id: format!("E{}", employee),
                date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                clock_in: clock_in.map(str::to_string),
                clock_out: clock_out.map(str::to_string),
            })
    }

    proptest! {
        #[test]
        fn prop_removes_at_most_one_per_group(raw in prop::collection::vec(punch_strategy(), 0..40)) {
            let punches: Vec<PunchRecord> = raw
                .into_iter()
                .enumerate()
                .map(|(i, mut p)| { p.punch_id = format!("t{}", i); p })
                .collect();
            let input = punches.clone();
            let mut log = AuditLog::default();

            let result = remove_duplicates(punches, &mut log);

            prop_assert_eq!(result.punches.len() + result.removed.len(), input.len());

            let mut seen = HashSet::new();
            for removed in &result.removed {
                prop_assert!(seen.insert((removed.employee_id.clone(), removed.date)));
            }
        }

        #[test]
        fn prop_resolvable_pairs_collapse(raw in prop::collection::vec(punch_strategy(), 0..40)) {
            let punches: Vec<PunchRecord> = raw
                .into_iter()
                .enumerate()
                .map(|(i, mut p)| { p.punch_id = format!("t{}", i); p })
                .collect();
            let mut groups: HashMap<(String, NaiveDate), Vec<PunchRecord>> = HashMap::new();
            for punch in &punches {
                groups
                    .entry((punch.employee_id.clone(), punch.date))
                    .or_default()
                    .push(punch.clone());
            }
            let mut log = AuditLog::default();

            let result = remove_duplicates(punches, &mut log);

            for ((employee, date), members) in groups {
                let resolvable = members.len() == 2
                    && (members.iter().any(PunchRecord::is_missing_clock_out)
                        || members[0].same_content(&members[1]));
                if resolvable {
                    let survivors = result
                        .punches
                        .iter()
                        .filter(|p| p.employee_id == employee && p.date == date)
                        .count();
                    prop_assert_eq!(survivors, 1);
                }
            }
        }
    }
}
