//! In-memory warehouse for dry runs and tests.

use std::collections::BTreeMap;

use tracing::debug;

use super::{LoadSummary, WarehouseSink};
use crate::error::EngineResult;
use crate::models::AggregatedRecord;

type Key = (i32, u32, Option<String>);

/// Holds aggregated records in a map keyed by `(year, month, branch_id)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryWarehouse {
    rows: BTreeMap<Key, AggregatedRecord>,
}

impl MemoryWarehouse {
    /// Creates an empty warehouse.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored record ordered by key.
    pub fn records(&self) -> Vec<AggregatedRecord> {
        self.rows.values().cloned().collect()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl WarehouseSink for MemoryWarehouse {
    fn replace(&mut self, records: &[AggregatedRecord]) -> EngineResult<LoadSummary> {
        let mut summary = LoadSummary::default();

        for record in records {
            let key = (record.year, record.month, record.branch_id.clone());
            if self.rows.remove(&key).is_some() {
                summary.replaced += 1;
            }
        }
        for record in records {
            let key = (record.year, record.month, record.branch_id.clone());
            self.rows.insert(key, record.clone());
            summary.inserted += 1;
        }

        debug!(
            replaced = summary.replaced,
            inserted = summary.inserted,
            "Loaded batch into memory warehouse"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn make_record(month: u32, branch: Option<&str>, hours: i64) -> AggregatedRecord {
        AggregatedRecord {
            year: 2024,
            month,
            branch_id: branch.map(str::to_string),
            hours_worked: Decimal::new(hours, 0),
            salary: Decimal::new(1000, 0),
            salary_per_hour: Decimal::new(1000, 0) / Decimal::new(hours, 0),
        }
    }

    #[test]
    fn test_replace_overwrites_matching_keys() {
        let mut warehouse = MemoryWarehouse::new();
        warehouse
            .replace(&[make_record(3, Some("B1"), 10), make_record(3, None, 5)])
            .unwrap();

        let summary = warehouse.replace(&[make_record(3, Some("B1"), 20)]).unwrap();

        assert_eq!(summary, LoadSummary { replaced: 1, inserted: 1 });
        assert_eq!(warehouse.len(), 2);
        let records = warehouse.records();
        assert_eq!(records[0].branch_id, None);
        assert_eq!(records[1].hours_worked, Decimal::new(20, 0));
    }

    #[test]
    fn test_new_warehouse_is_empty() {
        let warehouse = MemoryWarehouse::new();
        assert!(warehouse.is_empty());
        assert!(warehouse.records().is_empty());
    }
}
