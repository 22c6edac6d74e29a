//! Branch Salary Engine
//!
//! This crate turns raw time-clock punches and an employee table into
//! monthly labor cost per branch: it removes duplicate punches, imputes
//! missing clock values, corrects overnight shifts, joins employee
//! compensation and aggregates hours and salary per branch and period.
//! Results are loaded into a warehouse with replace-by-key semantics.

#![warn(missing_docs)]

pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod sink;
pub mod transform;
