//! Application state for the Branch Salary Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::transform::{ImputationRules, Pipeline};

/// Shared application state.
///
/// Holds the pipeline built from the loaded configuration. Requests only
/// read it, so one instance is shared behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Creates a new application state from loaded configuration.
    pub fn new(config: &ConfigLoader) -> Self {
        Self::with_rules(config.rules().clone())
    }

    /// Creates a new application state with the given imputation rules.
    pub fn with_rules(rules: ImputationRules) -> Self {
        Self {
            pipeline: Arc::new(Pipeline::new(rules)),
        }
    }

    /// Returns the shared pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}
