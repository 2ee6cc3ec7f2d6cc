//! CSV parser - raw rows keyed by detected headers
//!
//! The parser knows nothing about transactions. It turns a delimited text
//! stream into the ordered header list plus one map per data row, which the
//! import service later interprets through a confirmed field mapping.

use std::collections::HashMap;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::FieldMapping;

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const UTF8_BOM: &str = "\u{feff}";

/// One data row, keyed by header text exactly as it appeared in the file
pub type RawRow = HashMap<String, String>;

/// Result of parsing an uploaded file
#[derive(Debug, Clone, Serialize)]
pub struct ParsedCsv {
    /// Header names in file order
    pub headers: Vec<String>,
    /// Data rows, blank rows excluded
    pub rows: Vec<RawRow>,
    /// Delimiter the file was read with
    pub delimiter: char,
}

impl ParsedCsv {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pre-filled mapping for the user to review
    pub fn suggested_mapping(&self) -> Option<FieldMapping> {
        FieldMapping::suggest(&self.headers)
    }
}

/// Parse a delimited text stream
///
/// Fails with `Error::Parse` when the stream is not UTF-8 text or has no
/// header row. A header row followed by no data is a successful, empty parse.
pub fn parse_csv(mut reader: impl Read) -> Result<ParsedCsv> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::parse(format!("Failed to read input: {}", e)))?;

    let text = String::from_utf8(bytes)
        .map_err(|_| Error::parse("Input is not valid UTF-8 text"))?;

    parse_csv_str(&text)
}

/// Parse delimited text that is already in memory
pub fn parse_csv_str(text: &str) -> Result<ParsedCsv> {
    let text = skip_blank_lines(text.strip_prefix(UTF8_BOM).unwrap_or(text));

    let header_line = text
        .lines()
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| Error::parse("No header row found"))?;
    let delimiter = detect_delimiter(header_line);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header_record = reader
        .headers()
        .map_err(|e| Error::parse(format!("Failed to read header row: {}", e)))?
        .clone();

    let headers: Vec<String> = header_record.iter().map(|h| h.to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::parse("No header row found"));
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            Error::parse(format!("Malformed row {}: {}", index + 1, e))
        })?;

        if is_blank(&record) {
            continue;
        }

        rows.push(to_raw_row(&headers, &record));
    }

    Ok(ParsedCsv {
        headers,
        rows,
        delimiter: delimiter as char,
    })
}

/// Drop whitespace-only lines before the header row
fn skip_blank_lines(text: &str) -> &str {
    let mut rest = text;
    while let Some((line, tail)) = rest.split_once('\n') {
        if !line.trim().is_empty() {
            break;
        }
        rest = tail;
    }
    rest
}

/// Pick the candidate delimiter occurring most often outside quotes
fn detect_delimiter(header_line: &str) -> u8 {
    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;

    for byte in header_line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(i) = CANDIDATE_DELIMITERS.iter().position(|d| *d == byte) {
            counts[i] += 1;
        }
    }

    // Ties keep the earlier candidate, so comma wins by default
    let best = counts
        .iter()
        .enumerate()
        .fold(0, |best, (i, count)| if *count > counts[best] { i } else { best });
    CANDIDATE_DELIMITERS[best]
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

/// First occurrence of a duplicated header wins; extra fields are dropped
fn to_raw_row(headers: &[String], record: &StringRecord) -> RawRow {
    let mut row = RawRow::with_capacity(headers.len());
    for (header, value) in headers.iter().zip(record.iter()) {
        row.entry(header.clone())
            .or_insert_with(|| value.to_string());
    }
    row
}
