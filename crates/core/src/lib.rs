// crates/core/src/lib.rs
//! Records and record sources for the pipeline.
//!
//! - [`Record`] - one CSV row as an ordered list of fields
//! - [`RecordSource`] - lazy, non-restartable stream of records
//! - [`CsvFileSource`] - file-backed CSV source, opened on first pull

pub mod error;
pub mod record;
pub mod source;

pub use error::SourceError;
pub use record::{parse_line, Record, RowOutcome, RowParser};
pub use source::{CsvFileSource, MemorySource, RecordSource};
