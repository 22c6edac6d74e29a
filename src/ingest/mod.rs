//! Source ingestion.
//!
//! CSV files are read into untyped [`RawTable`]s and then mapped onto punch
//! and employee records by explicit schema mappings, so source column names
//! never leak past this boundary.

mod punches;
mod table;

pub use punches::PunchSchema;
pub use table::{RawTable, read_csv};
