//! Configuration loading and management for the Branch Salary Engine.
//!
//! This module loads the pipeline wiring (sources, column mappings, warehouse)
//! and the clock imputation rules from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use branch_salary_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/branch_salary").unwrap();
//! println!("Employees from: {}", config.sources().employees.display());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    EngineConfig, FillRuleConfig, ImputationConfig, PipelineConfig, SchemaConfig, SourcesConfig,
    WarehouseConfig, is_valid_table_name,
};
