//! Error types for the Branch Salary Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for the structural failures that abort a reconciliation run. Data-quality
//! problems (duplicates, unparseable clock values, unmatched employees) are
//! not errors; they are recorded as audit warnings and the run continues.

use thiserror::Error;

/// The main error type for the Branch Salary Engine.
///
/// # Example
///
/// ```
/// use branch_salary_engine::error::EngineError;
///
/// let error = EngineError::SourceNotFound {
///     label: "timesheets".to_string(),
///     path: "/missing/timesheets.csv".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "timesheets source not found: /missing/timesheets.csv"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value was syntactically valid YAML but unusable.
    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidConfigValue {
        /// The configuration field that was rejected.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// An input table could not be opened.
    #[error("{label} source not found: {path}")]
    SourceNotFound {
        /// Which table was being loaded (e.g. "employees").
        label: String,
        /// The path that could not be opened.
        path: String,
    },

    /// An input table could not be read as CSV.
    #[error("Failed to read {label} source '{path}': {message}")]
    SourceParseError {
        /// Which table was being loaded.
        label: String,
        /// The path of the source.
        path: String,
        /// A description of the read error.
        message: String,
    },

    /// An input table lacks a column the schema mapping requires.
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn {
        /// Which table was being mapped.
        table: String,
        /// The column that was expected.
        column: String,
    },

    /// A row held a value that cannot be represented in the domain model.
    #[error("Invalid {table} row {row}: {message}")]
    InvalidRow {
        /// Which table the row belongs to.
        table: String,
        /// Zero-based data row position.
        row: usize,
        /// A description of the problem.
        message: String,
    },

    /// The warehouse rejected the load.
    #[error("Warehouse load failed: {message}")]
    SinkError {
        /// A description of the sink failure.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<rusqlite::Error> for EngineError {
    fn from(error: rusqlite::Error) -> Self {
        EngineError::SinkError {
            message: error.to_string(),
        }
    }
}
