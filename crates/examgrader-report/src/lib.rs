//! examgrader-report — Export formats for submission snapshots.
//!
//! - **CSV**: UTF-8 with BOM, one row per submission, for spreadsheets
//! - **JSON**: snapshot plus summary statistics

pub mod csv_export;
pub mod json;

pub use csv_export::{export_csv, export_file_name, write_csv};
pub use json::{export_json, write_json};
