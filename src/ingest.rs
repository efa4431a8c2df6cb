//! Raw rows -> cleaned transactions
//!
//! Input is a headerless comma separated file. With a date column, the first
//! cell of each row is the transaction date and the rest are items.

use std::io::BufRead;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::{MinerError, MinerResult};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> MinerResult<Self> {
        if start > end {
            return Err(MinerError::config(format!("date range start {start} is after end {end}")));
        }
        Ok(Self { start, end })
    }

    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// How rows become transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestOptions {
    /// first cell is a date and not an item
    pub date_column: bool,
    /// keep only rows dated inside this range (needs `date_column`)
    pub range: Option<DateRange>,
}

/// Parse a date cell, time of day is dropped
pub fn parse_date(value: &str) -> MinerResult<NaiveDate> {
    let value = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(date);
        }
    }
    Err(MinerError::InvalidDate { value: value.to_string() })
}

/// Split one line into trimmed cells
/// Double-quoted cells may contain commas; `""` inside quotes is a literal quote.
pub fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

/// Read all rows, dropping empty cells and rows left with no cells
pub fn read_rows<R: BufRead>(reader: R) -> MinerResult<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let cells: Vec<String> = split_cells(&line)
            .into_iter()
            .filter(|cell| !cell.is_empty())
            .collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    debug!(rows = rows.len(), "rows read");
    Ok(rows)
}

/// Turn rows into transactions
/// Rows whose date cell does not parse are dropped with a warning.
pub fn to_transactions(rows: Vec<Vec<String>>, options: &IngestOptions) -> Vec<Vec<String>> {
    if !options.date_column {
        return rows;
    }
    let total = rows.len();
    let transactions: Vec<Vec<String>> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(line, mut row)| {
            if row.is_empty() {
                return None;
            }
            let items = row.split_off(1);
            match (parse_date(&row[0]), options.range) {
                (Ok(date), Some(range)) => range.contains(date).then_some(items),
                (Ok(_), None) => Some(items),
                (Err(err), _) => {
                    warn!(line = line + 1, %err, "row dropped");
                    None
                }
            }
        })
        .collect();
    debug!(rows = total, kept = transactions.len(), "rows filtered by date");
    transactions
}

/// Absolute support count for `percent` of `transaction_count`
#[inline]
pub fn support_count_from_percent(percent: f64, transaction_count: usize) -> f64 {
    percent / 100.0 * transaction_count as f64
}
