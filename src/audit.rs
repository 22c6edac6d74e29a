//! The audit log passed into every pipeline stage.
//!
//! Stages never configure logging themselves. Each one receives an
//! [`AuditLog`], records its decisions as numbered [`AuditStep`]s and its
//! data-quality findings as [`AuditWarning`]s, and the log mirrors both to
//! `tracing` so operators see them without inspecting the trace.

use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{AuditStep, AuditTrace, AuditWarning};

/// Warning code for a duplicate group that one pass could not collapse.
pub const UNRESOLVED_DUPLICATE: &str = "UNRESOLVED_DUPLICATE";
/// Warning code for clock text that could not be parsed.
pub const CLOCK_PARSE_FAILURE: &str = "CLOCK_PARSE_FAILURE";
/// Warning code for a punch left without a clock value after imputation.
pub const CLOCK_UNRESOLVED: &str = "CLOCK_UNRESOLVED";
/// Warning code for a punch whose clock-out precedes its clock-in.
pub const NEGATIVE_SPAN: &str = "NEGATIVE_SPAN";
/// Warning code for a punch whose employee is not in the employee table.
pub const UNMATCHED_EMPLOYEE: &str = "UNMATCHED_EMPLOYEE";
/// Warning code for an employee id listed more than once.
pub const DUPLICATE_EMPLOYEE: &str = "DUPLICATE_EMPLOYEE";
/// Warning code for a punch that arrived without a punch id.
pub const BLANK_PUNCH_ID: &str = "BLANK_PUNCH_ID";
/// Warning code for a labor cost sum or rate clamped to the decimal range.
pub const AMOUNT_OVERFLOW: &str = "AMOUNT_OVERFLOW";

/// Collects audit steps and warnings for one run.
#[derive(Debug)]
pub struct AuditLog {
    run_id: Uuid,
    started: Instant,
    next_step: u32,
    steps: Vec<AuditStep>,
    warnings: Vec<AuditWarning>,
}

impl AuditLog {
    /// Creates an empty log for the given run.
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started: Instant::now(),
            next_step: 1,
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Records a stage decision and returns its step number.
    pub fn step(
        &mut self,
        stage: &str,
        rule_id: &str,
        rule_name: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: impl Into<String>,
    ) -> u32 {
        let step_number = self.next_step;
        self.next_step += 1;

        let reasoning = reasoning.into();
        info!(
            run_id = %self.run_id,
            step = step_number,
            stage,
            rule_id,
            "{}",
            reasoning
        );

        self.steps.push(AuditStep {
            step_number,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            stage: stage.to_string(),
            input,
            output,
            reasoning,
        });
        step_number
    }

    /// Records a data-quality warning.
    pub fn warn(&mut self, code: &str, severity: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(run_id = %self.run_id, code, severity, "{}", message);

        self.warnings.push(AuditWarning {
            code: code.to_string(),
            message,
            severity: severity.to_string(),
        });
    }

    /// Returns the steps recorded so far.
    pub fn steps(&self) -> &[AuditStep] {
        &self.steps
    }

    /// Returns the warnings recorded so far.
    pub fn warnings(&self) -> &[AuditWarning] {
        &self.warnings
    }

    /// Closes the log into an [`AuditTrace`] stamped with the elapsed time.
    pub fn into_trace(self) -> AuditTrace {
        AuditTrace {
            steps: self.steps,
            warnings: self.warnings,
            duration_us: self.started.elapsed().as_micros() as u64,
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_are_numbered_sequentially() {
        let mut log = AuditLog::default();
        let first = log.step(
            "dedup",
            "a",
            "A",
            serde_json::json!({}),
            serde_json::json!({}),
            "first",
        );
        let second = log.step(
            "impute",
            "b",
            "B",
            serde_json::json!({}),
            serde_json::json!({}),
            "second",
        );

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(log.steps()[1].stage, "impute");
    }

    #[test]
    fn test_into_trace_keeps_steps_and_warnings() {
        let mut log = AuditLog::default();
        log.step(
            "merge",
            "employee_merge",
            "Employee Merge",
            serde_json::json!({ "punches": 2 }),
            serde_json::json!({ "merged": 2 }),
            "merged",
        );
        log.warn(UNMATCHED_EMPLOYEE, "medium", "E9 not found");

        let trace = log.into_trace();
        assert_eq!(trace.steps.len(), 1);
        assert_eq!(trace.warnings.len(), 1);
        assert_eq!(trace.warnings[0].code, UNMATCHED_EMPLOYEE);
        assert_eq!(trace.warnings[0].severity, "medium");
    }
}
