//! Ingestion of legacy-encoded ridership CSV files.

pub mod reader;
pub mod schema;

pub use reader::{parse_date, read_records, resolve_encoding, Ingested, RidershipRecord};
pub use schema::ColumnSchema;
