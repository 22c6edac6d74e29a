//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading pipeline
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::transform::ImputationRules;

use super::types::{
    EngineConfig, ImputationConfig, PipelineConfig, SourcesConfig, WarehouseConfig,
    is_valid_table_name,
};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/branch_salary/
/// ├── pipeline.yaml    # Sources, column mappings and warehouse
/// └── imputation.yaml  # Clock fill rules
/// ```
///
/// Relative source and warehouse paths in `pipeline.yaml` are resolved
/// against the configuration directory.
///
/// # Example
///
/// ```no_run
/// use branch_salary_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/branch_salary")?;
/// println!("Warehouse: {}", loader.warehouse().path.display());
/// # Ok::<(), branch_salary_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if either file is missing or is not valid YAML, if a
    /// rule duration cannot be parsed, or if a table name is not a plain
    /// identifier.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let mut pipeline = Self::load_yaml::<PipelineConfig>(&path.join("pipeline.yaml"))?;
        Self::resolve_paths(path, &mut pipeline);
        Self::validate_warehouse(&pipeline.warehouse)?;

        let imputation = Self::load_yaml::<ImputationConfig>(&path.join("imputation.yaml"))?;
        let rules = imputation.to_rules()?;

        Ok(Self {
            config: EngineConfig::new(pipeline, rules),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn resolve_paths(base: &Path, pipeline: &mut PipelineConfig) {
        for file in [
            &mut pipeline.sources.employees,
            &mut pipeline.sources.timesheets,
            &mut pipeline.warehouse.path,
        ] {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
    }

    fn validate_warehouse(warehouse: &WarehouseConfig) -> EngineResult<()> {
        for (field, name) in [
            ("warehouse.main_table", &warehouse.main_table),
            ("warehouse.staging_table", &warehouse.staging_table),
        ] {
            if !is_valid_table_name(name) {
                return Err(EngineError::InvalidConfigValue {
                    field: field.to_string(),
                    message: format!("'{}' is not a valid table name", name),
                });
            }
        }

        if warehouse.main_table == warehouse.staging_table {
            return Err(EngineError::InvalidConfigValue {
                field: "warehouse.staging_table".to_string(),
                message: "staging table must differ from the main table".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns mutable access for command-line overrides.
    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    /// Returns the source table locations.
    pub fn sources(&self) -> &SourcesConfig {
        &self.config.pipeline().sources
    }

    /// Returns the warehouse settings.
    pub fn warehouse(&self) -> &WarehouseConfig {
        &self.config.pipeline().warehouse
    }

    /// Returns the imputation rules.
    pub fn rules(&self) -> &ImputationRules {
        self.config.rules()
    }
}
