//! Configuration types for the reconciliation pipeline.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::ingest::PunchSchema;
use crate::models::parse_clock;
use crate::transform::{Comparison, EmployeeSchema, FillRule, ImputationRules};

/// Locations of the two source tables.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// CSV file with one row per employee.
    pub employees: PathBuf,
    /// CSV file with one row per punch.
    pub timesheets: PathBuf,
}

/// Column mappings for both source tables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Punch table columns.
    pub punches: PunchSchema,
    /// Employee table columns.
    pub employees: EmployeeSchema,
}

/// SQLite warehouse settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    /// Path of the SQLite database file.
    pub path: PathBuf,
    /// Table holding the aggregated labor cost.
    #[serde(default = "default_main_table")]
    pub main_table: String,
    /// Scratch table used during a load.
    #[serde(default = "default_staging_table")]
    pub staging_table: String,
}

fn default_main_table() -> String {
    "branch_salary".to_string()
}

fn default_staging_table() -> String {
    "branch_salary_staging".to_string()
}

/// The `pipeline.yaml` file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Source table locations.
    pub sources: SourcesConfig,
    /// Source column mappings.
    #[serde(default)]
    pub schema: SchemaConfig,
    /// Warehouse settings.
    pub warehouse: WarehouseConfig,
}

/// A fill rule as written in `imputation.yaml`.
///
/// Durations are clock text such as `"12:00:00"` or `"1 days 08:00:00"`.
#[derive(Debug, Clone, Deserialize)]
pub struct FillRuleConfig {
    /// How the reference value must compare to the threshold.
    pub reference_is: Comparison,
    /// Threshold clock text.
    pub threshold: String,
    /// Fill clock text.
    pub fill: String,
}

impl FillRuleConfig {
    fn to_rule(&self, field: &str) -> EngineResult<FillRule> {
        let parse = |text: &str, part: &str| {
            parse_clock(text).ok_or_else(|| EngineError::InvalidConfigValue {
                field: format!("{}.{}", field, part),
                message: format!("'{}' is not a clock value", text),
            })
        };

        Ok(FillRule {
            reference_is: self.reference_is,
            threshold: parse(self.threshold.as_str(), "threshold")?,
            fill: parse(self.fill.as_str(), "fill")?,
        })
    }
}

/// The `imputation.yaml` file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct ImputationConfig {
    /// Ordered rules for missing clock-out values.
    pub clock_out: Vec<FillRuleConfig>,
    /// Ordered rules for missing clock-in values.
    pub clock_in: Vec<FillRuleConfig>,
}

impl ImputationConfig {
    /// Parses the rule text into [`ImputationRules`].
    pub fn to_rules(&self) -> EngineResult<ImputationRules> {
        let convert = |rules: &[FillRuleConfig], column: &str| {
            rules
                .iter()
                .enumerate()
                .map(|(i, rule)| rule.to_rule(&format!("{}[{}]", column, i)))
                .collect::<EngineResult<Vec<_>>>()
        };

        Ok(ImputationRules {
            clock_out: convert(self.clock_out.as_slice(), "clock_out")?,
            clock_in: convert(self.clock_in.as_slice(), "clock_in")?,
        })
    }
}

/// Complete engine configuration.
///
/// This is the top-level configuration structure that combines the
/// pipeline wiring with the imputation rules.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pipeline: PipelineConfig,
    rules: ImputationRules,
}

impl EngineConfig {
    /// Creates a new engine configuration.
    pub fn new(pipeline: PipelineConfig, rules: ImputationRules) -> Self {
        Self { pipeline, rules }
    }

    /// Returns the pipeline wiring.
    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Returns mutable pipeline wiring, for command-line overrides.
    pub fn pipeline_mut(&mut self) -> &mut PipelineConfig {
        &mut self.pipeline
    }

    /// Returns the imputation rules.
    pub fn rules(&self) -> &ImputationRules {
        &self.rules
    }
}

/// Returns true if `name` is usable as an unquoted SQLite table name.
///
/// # Examples
///
/// ```
/// use branch_salary_engine::config::is_valid_table_name;
///
/// assert!(is_valid_table_name("branch_salary"));
/// assert!(!is_valid_table_name("branch salary; DROP TABLE x"));
/// assert!(!is_valid_table_name("1st"));
/// ```
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
