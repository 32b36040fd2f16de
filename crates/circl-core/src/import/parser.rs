use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;

use crate::error::{CirclError, Result};

/// One data row keyed by column header.
pub type Row = BTreeMap<String, String>;

/// A CSV file split into its header row and data rows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl ParsedCsv {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn parse_file(path: &Path, delimiter: u8) -> Result<ParsedCsv> {
    let file = std::fs::File::open(path).map_err(|e| {
        CirclError::InvalidInput(format!("cannot open {}: {e}", path.display()))
    })?;
    parse_reader(std::io::BufReader::new(file), delimiter)
}

pub fn parse_str(text: &str, delimiter: u8) -> Result<ParsedCsv> {
    parse_reader(text.as_bytes(), delimiter)
}

/// Parse CSV with a mandatory header row.
///
/// Short rows are padded with empty cells and long rows are truncated to the
/// header width. Blank header cells become `Column N`; repeated headers get a
/// ` (2)`, ` (3)` suffix so every column stays addressable.
pub fn parse_reader<R: Read>(reader: R, delimiter: u8) -> Result<ParsedCsv> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(reader);

    let raw_headers = rdr.headers()?.clone();
    if raw_headers.iter().all(|h| h.trim_start_matches('\u{feff}').is_empty()) {
        return Err(CirclError::InvalidInput(
            "CSV file is empty or has no header row".into(),
        ));
    }
    let headers = normalize_headers(raw_headers.iter());

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }

    tracing::debug!(columns = headers.len(), rows = rows.len(), "parsed CSV");
    Ok(ParsedCsv { headers, rows })
}

fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (i, h) in raw.enumerate() {
        let h = h.trim_start_matches('\u{feff}').trim();
        let base = if h.is_empty() {
            format!("Column {}", i + 1)
        } else {
            h.to_string()
        };
        let mut name = base.clone();
        let mut n = 2;
        while out.iter().any(|existing| existing.eq_ignore_ascii_case(&name)) {
            name = format!("{base} ({n})");
            n += 1;
        }
        out.push(name);
    }
    out
}
