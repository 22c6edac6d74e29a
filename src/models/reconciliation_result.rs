//! Reconciliation result models for the Branch Salary Engine.
//!
//! This module contains the [`ReconciliationResult`] type and the audit
//! structures that record every decision taken while normalizing punches,
//! so payroll can see why a figure came out the way it did.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AggregatedRecord, LaborCostTotals};

/// A single step in the audit trace recording a pipeline decision.
///
/// Each step captures the input, output, and reasoning for a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The pipeline stage that produced this step.
    pub stage: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A data-quality warning raised during reconciliation.
///
/// Warnings never stop the run; the affected rows continue with whatever
/// values they have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level ("low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a reconciliation run.
///
/// # Example
///
/// ```
/// use branch_salary_engine::models::AuditTrace;
///
/// let trace = AuditTrace {
///     steps: vec![],
///     warnings: vec![],
///     duration_us: 1234,
/// };
/// assert!(trace.warnings_with_code("UNRESOLVED_DUPLICATE").is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of pipeline steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during the run.
    pub warnings: Vec<AuditWarning>,
    /// The total run duration in microseconds.
    pub duration_us: u64,
}

impl AuditTrace {
    /// Returns the warnings carrying the given code.
    pub fn warnings_with_code(&self, code: &str) -> Vec<&AuditWarning> {
        self.warnings.iter().filter(|w| w.code == code).collect()
    }

    /// Returns the first step produced by the given rule.
    pub fn step(&self, rule_id: &str) -> Option<&AuditStep> {
        self.steps.iter().find(|s| s.rule_id == rule_id)
    }
}

/// The complete result of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    /// When the run was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the run.
    pub engine_version: String,
    /// Labor cost per branch and period, ordered by key.
    pub records: Vec<AggregatedRecord>,
    /// Batch-level totals.
    pub totals: LaborCostTotals,
    /// Complete audit trace of pipeline decisions.
    pub audit_trace: AuditTrace,
}
