//! HTTP API module for the Branch Salary Engine.
//!
//! This module provides the REST endpoint that runs the reconciliation
//! pipeline over posted employee and punch tables.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{EmployeeRequest, PunchRequest, ReconcileRequest};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
