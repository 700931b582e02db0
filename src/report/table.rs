//! Delimited-table reading and writing
//!
//! Separators may be longer than one byte (the default output separator is
//! the Arabic letter alif, two bytes in UTF-8). Quoting follows the usual
//! CSV rules: a field containing the separator, a double quote or a line
//! break is wrapped in quotes, with inner quotes doubled.

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Separator of the smell metrics and instance logs.
pub const COMMA: &str = ",";

/// Errors raised while reading or writing a table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{source_name}: missing column '{column}'")]
    MissingColumn { source_name: String, column: String },

    #[error("{source_name}: unterminated quoted field starting on line {line}")]
    UnterminatedQuote { source_name: String, line: usize },

    #[error("{source_name}: empty table, no header")]
    Empty { source_name: String },
}

/// A parsed table: one header row and its data rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Where the table came from, for error messages
    pub source_name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read(path: &Path, delimiter: &str) -> Result<Self, TableError> {
        let bytes = fs::read(path).map_err(|source| TableError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        Self::parse(&text, delimiter, &path.display().to_string())
    }

    pub fn parse(text: &str, delimiter: &str, source_name: &str) -> Result<Self, TableError> {
        let mut records = split_records(text, delimiter).map_err(|line| {
            TableError::UnterminatedQuote {
                source_name: source_name.to_string(),
                line,
            }
        })?;
        if records.is_empty() {
            return Err(TableError::Empty {
                source_name: source_name.to_string(),
            });
        }
        let header = records.remove(0).into_iter().map(|h| h.trim().to_string()).collect();
        Ok(Self {
            source_name: source_name.to_string(),
            header,
            rows: records,
        })
    }

    /// Index of the column named exactly `name`.
    pub fn column(&self, name: &str) -> Result<usize, TableError> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn {
                source_name: self.source_name.clone(),
                column: name.to_string(),
            })
    }

    /// Indices of every column whose name contains `needle`, in header order.
    pub fn columns_containing(&self, needle: &str) -> Vec<usize> {
        self.header
            .iter()
            .enumerate()
            .filter(|(_, h)| h.contains(needle))
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Field `idx` of `row`, empty when the row is short.
pub fn field(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Split `text` into records of fields. Blank lines are skipped.
///
/// Returns the starting line of an unterminated quoted field as the error.
pub fn split_records(text: &str, delimiter: &str) -> Result<Vec<Vec<String>>, usize> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut quote_line = 1;
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        if in_quotes {
            if rest.starts_with("\"\"") {
                field.push('"');
                i += 2;
                continue;
            }
            if rest.starts_with('"') {
                in_quotes = false;
                i += 1;
                continue;
            }
        } else {
            if field.is_empty() && rest.starts_with('"') {
                in_quotes = true;
                quote_line = line;
                i += 1;
                continue;
            }
            if !delimiter.is_empty() && rest.starts_with(delimiter) {
                record.push(std::mem::take(&mut field));
                i += delimiter.len();
                continue;
            }
            let newline = if rest.starts_with("\r\n") {
                2
            } else if rest.starts_with('\n') {
                1
            } else {
                0
            };
            if newline > 0 {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
                line += 1;
                i += newline;
                continue;
            }
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        if ch == '\n' {
            line += 1;
        }
        field.push(ch);
        i += ch.len_utf8();
    }

    if in_quotes {
        return Err(quote_line);
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }
    Ok(records)
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].is_empty();
    if !blank {
        records.push(record);
    }
}

/// Quote `value` if it contains the delimiter, a quote or a line break.
pub fn escape<'a>(value: &'a str, delimiter: &str) -> Cow<'a, str> {
    let needs_quotes = (!delimiter.is_empty() && value.contains(delimiter))
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Append one record, newline-terminated, to `out`.
pub fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S], delimiter: &str) {
    for (idx, value) in fields.iter().enumerate() {
        if idx > 0 {
            out.push_str(delimiter);
        }
        out.push_str(&escape(value.as_ref(), delimiter));
    }
    out.push('\n');
}

/// Render a header and rows into table text.
pub fn render<S: AsRef<str>>(header: &[S], rows: &[Vec<String>], delimiter: &str) -> String {
    let mut out = String::new();
    push_row(&mut out, header, delimiter);
    for row in rows {
        push_row(&mut out, row, delimiter);
    }
    out
}

/// Write rendered table text in one go.
pub fn write_file(path: &Path, text: &str) -> Result<(), TableError> {
    fs::write(path, text).map_err(|source| TableError::Write {
        path: path.display().to_string(),
        source,
    })
}
