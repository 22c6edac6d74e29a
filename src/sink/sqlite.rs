//! SQLite warehouse.

use std::str::FromStr;

use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use tracing::info;

use super::{LoadSummary, WarehouseSink};
use crate::config::{WarehouseConfig, is_valid_table_name};
use crate::error::{EngineError, EngineResult};
use crate::models::AggregatedRecord;

const COLUMNS: &str = "year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    branch_id TEXT,
    hours_worked TEXT NOT NULL,
    salary TEXT NOT NULL,
    salary_per_hour TEXT NOT NULL";

/// Aggregated labor cost stored in a SQLite table.
///
/// Each load writes the batch to a fresh staging table, deletes main-table
/// rows whose key is in staging, copies staging into main and drops staging,
/// all inside one transaction. Decimal columns are stored as text so no
/// precision is lost.
pub struct SqliteWarehouse {
    conn: Connection,
    main_table: String,
    staging_table: String,
}

impl SqliteWarehouse {
    /// Opens (or creates) the database described by `config`.
    pub fn open(config: &WarehouseConfig) -> EngineResult<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| EngineError::SinkError {
                    message: format!("cannot create {}: {}", parent.display(), e),
                })?;
            }
        }

        let conn = Connection::open(&config.path)?;
        Self::with_connection(conn, &config.main_table, &config.staging_table)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory(main_table: &str, staging_table: &str) -> EngineResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, main_table, staging_table)
    }

    fn with_connection(conn: Connection, main_table: &str, staging_table: &str) -> EngineResult<Self> {
        for name in [main_table, staging_table] {
            if !is_valid_table_name(name) {
                return Err(EngineError::InvalidConfigValue {
                    field: "warehouse table".to_string(),
                    message: format!("'{}' is not a valid table name", name),
                });
            }
        }

        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            main_table, COLUMNS
        ))?;

        Ok(Self {
            conn,
            main_table: main_table.to_string(),
            staging_table: staging_table.to_string(),
        })
    }

    /// Reads every stored record ordered by key.
    pub fn records(&self) -> EngineResult<Vec<AggregatedRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT year, month, branch_id, hours_worked, salary, salary_per_hour
             FROM {} ORDER BY year, month, branch_id",
            self.main_table
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i32>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (year, month, branch_id, hours, salary, rate) = row?;
            records.push(AggregatedRecord {
                year,
                month,
                branch_id,
                hours_worked: parse_stored_decimal(&hours)?,
                salary: parse_stored_decimal(&salary)?,
                salary_per_hour: parse_stored_decimal(&rate)?,
            });
        }
        Ok(records)
    }
}

fn parse_stored_decimal(text: &str) -> EngineResult<Decimal> {
    Decimal::from_str(text).map_err(|e| EngineError::SinkError {
        message: format!("stored value '{}' is not a decimal: {}", text, e),
    })
}

impl WarehouseSink for SqliteWarehouse {
    fn replace(&mut self, records: &[AggregatedRecord]) -> EngineResult<LoadSummary> {
        let main = self.main_table.as_str();
        let staging = self.staging_table.as_str();

        let tx = self.conn.transaction()?;

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {staging};
             CREATE TABLE {staging} ({COLUMNS});"
        ))?;

        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {staging}
                 (year, month, branch_id, hours_worked, salary, salary_per_hour)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ))?;
            for record in records {
                insert.execute(params![
                    record.year,
                    record.month,
                    record.branch_id,
                    record.hours_worked.to_string(),
                    record.salary.to_string(),
                    record.salary_per_hour.to_string(),
                ])?;
            }
        }

        let replaced = tx.execute(
            &format!(
                "DELETE FROM {main} WHERE EXISTS (
                     SELECT 1 FROM {staging} s
                     WHERE s.year = {main}.year
                       AND s.month = {main}.month
                       AND s.branch_id IS {main}.branch_id
                 )"
            ),
            [],
        )?;

        let inserted = tx.execute(
            &format!(
                "INSERT INTO {main}
                 (year, month, branch_id, hours_worked, salary, salary_per_hour)
                 SELECT year, month, branch_id, hours_worked, salary, salary_per_hour
                 FROM {staging}"
            ),
            [],
        )?;

        tx.execute_batch(&format!("DROP TABLE {staging};"))?;
        tx.commit()?;

        info!(table = main, replaced, inserted, "Loaded batch into warehouse");

        Ok(LoadSummary { replaced, inserted })
    }
}
