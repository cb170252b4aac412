// crates/core/src/record.rs
//! CSV row parsing.
//!
//! Rows follow the RFC 4180 quoting rules: a field wrapped in double quotes
//! may contain commas, line breaks, and doubled quotes (`""` for a literal
//! `"`). Parsing is line-driven so a source can feed one physical line at a
//! time and keep going while a quoted field is still open.

/// One parsed row: an ordered sequence of string fields.
pub type Record = Vec<String>;

/// Result of feeding one physical line into a [`RowParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// The line closed a row.
    Complete(Record),
    /// A quoted field is still open; feed the next line.
    Incomplete,
}

/// Incremental parser for a single CSV row that may span several lines.
#[derive(Debug, Default)]
pub struct RowParser {
    fields: Vec<String>,
    field: String,
    in_quotes: bool,
    quoted: bool,
}

impl RowParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a quoted field is open across a line break.
    pub fn is_pending(&self) -> bool {
        self.in_quotes
    }

    /// Feed one line, without its trailing `\n` / `\r\n`.
    pub fn feed(&mut self, line: &str) -> RowOutcome {
        let mut chars = line.chars().peekable();
        while let Some(ch) = chars.next() {
            if self.in_quotes {
                if ch == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        self.field.push('"');
                    } else {
                        self.in_quotes = false;
                    }
                } else {
                    self.field.push(ch);
                }
                continue;
            }

            match ch {
                ',' => self.end_field(),
                '"' if self.field.is_empty() && !self.quoted => {
                    self.in_quotes = true;
                    self.quoted = true;
                }
                // Stray quotes in unquoted fields are kept as-is.
                _ => self.field.push(ch),
            }
        }

        if self.in_quotes {
            self.field.push('\n');
            return RowOutcome::Incomplete;
        }

        self.end_field();
        RowOutcome::Complete(std::mem::take(&mut self.fields))
    }

    fn end_field(&mut self) {
        self.fields.push(std::mem::take(&mut self.field));
        self.quoted = false;
    }
}

/// Parse a row that is known to fit on a single line.
///
/// An unterminated quote keeps everything after it in the last field.
pub fn parse_line(line: &str) -> Record {
    let mut parser = RowParser::new();
    match parser.feed(line) {
        RowOutcome::Complete(record) => record,
        RowOutcome::Incomplete => {
            let mut fields = std::mem::take(&mut parser.fields);
            let mut last = std::mem::take(&mut parser.field);
            last.pop();
            fields.push(last);
            fields
        }
    }
}
