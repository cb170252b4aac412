// crates/core/src/source.rs
//! Lazy record sources.
//!
//! A [`RecordSource`] yields records one at a time and is consumed exactly
//! once. [`CsvFileSource`] does not touch the filesystem until the first pull,
//! so a missing file surfaces as an error from the worker that owns it.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use crate::error::SourceError;
use crate::record::{Record, RowOutcome, RowParser};

/// A finite, non-restartable sequence of records.
#[async_trait]
pub trait RecordSource: Send {
    /// Pull the next record. `Ok(None)` means the source is exhausted.
    async fn next_record(&mut self) -> Result<Option<Record>, SourceError>;
}

/// CSV file read line by line through a buffered tokio reader.
pub struct CsvFileSource {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
    parser: RowParser,
    line_no: usize,
    exhausted: bool,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: None,
            parser: RowParser::new(),
            line_no: 0,
            exhausted: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&mut self) -> Result<(), SourceError> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| SourceError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), "opened csv source");
        self.lines = Some(BufReader::new(file).lines());
        Ok(())
    }
}

#[async_trait]
impl RecordSource for CsvFileSource {
    async fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        if self.exhausted {
            return Ok(None);
        }
        if self.lines.is_none() {
            self.open().await?;
        }
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };

        let mut row_start = self.line_no + 1;
        loop {
            let line = match lines.next_line().await {
                Ok(line) => line,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    self.exhausted = true;
                    self.lines = None;
                    return Err(SourceError::malformed(
                        &self.path,
                        self.line_no + 1,
                        "invalid UTF-8",
                    ));
                }
                Err(e) => return Err(SourceError::io(&self.path, e)),
            };

            let Some(line) = line else {
                self.exhausted = true;
                self.lines = None;
                if self.parser.is_pending() {
                    return Err(SourceError::malformed(
                        &self.path,
                        row_start,
                        "unterminated quoted field",
                    ));
                }
                return Ok(None);
            };
            self.line_no += 1;

            if line.is_empty() && !self.parser.is_pending() {
                row_start = self.line_no + 1;
                continue;
            }

            match self.parser.feed(&line) {
                RowOutcome::Complete(record) => return Ok(Some(record)),
                RowOutcome::Incomplete => continue,
            }
        }
    }
}

/// In-memory source over a fixed list of records.
#[derive(Debug, Default)]
pub struct MemorySource {
    records: VecDeque<Record>,
}

impl MemorySource {
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        Ok(self.records.pop_front())
    }
}
