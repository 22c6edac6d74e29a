//! Warehouse sinks for aggregated labor cost.
//!
//! A sink replaces, never appends: every `(year, month, branch_id)` key in a
//! batch overwrites whatever the warehouse already holds for that key, so a
//! rerun over the same inputs leaves the warehouse unchanged.

mod memory;
mod sqlite;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::AggregatedRecord;

pub use memory::MemoryWarehouse;
pub use sqlite::SqliteWarehouse;

/// Counts reported by a completed load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Existing rows removed because the batch carries their key.
    pub replaced: usize,
    /// Rows written from the batch.
    pub inserted: usize,
}

/// A destination for aggregated records with replace-by-key semantics.
pub trait WarehouseSink {
    /// Replaces all rows whose key appears in `records`, then inserts
    /// `records`. Either the whole batch lands or nothing changes.
    fn replace(&mut self, records: &[AggregatedRecord]) -> EngineResult<LoadSummary>;
}
