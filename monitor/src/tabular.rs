//! Minimal in-memory table over CSV snapshots.

use crate::error::{MonitorError, Result};

/// A parsed CSV file: header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse CSV text, detecting the delimiter among `,`, `;` and tab.
    pub fn from_csv(text: &str) -> Result<Self> {
        let bytes = strip_bom(text.as_bytes());
        Self::parse(bytes, detect_delimiter(bytes))
    }

    /// Parse CSV text with a known delimiter.
    pub fn from_csv_with(text: &str, delimiter: u8) -> Result<Self> {
        Self::parse(strip_bom(text.as_bytes()), delimiter)
    }

    fn parse(bytes: &[u8], delimiter: u8) -> Result<Self> {
        if bytes.is_empty() {
            return Err(MonitorError::Parse("Empty CSV file".to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(bytes);

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect::<Vec<_>>();

        if headers.is_empty() {
            return Err(MonitorError::Parse("CSV has no headers".to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Index of a column by header name.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| MonitorError::Parse(format!("Missing column '{name}'")))
    }

    /// Cell value, `None` when the row is short or the cell is blank.
    pub fn cell<'a>(&'a self, row: &'a [String], column: usize) -> Option<&'a str> {
        row.get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Numeric cell value; blank or non-numeric cells read as `None`.
    pub fn number(&self, row: &[String], column: usize) -> Option<f64> {
        self.cell(row, column).and_then(|v| v.parse().ok())
    }
}

/// Strip UTF-8 BOM if present
fn strip_bom(bytes: &[u8]) -> &[u8] {
    if bytes.len() >= 3 && bytes[0..3] == [0xEF, 0xBB, 0xBF] {
        &bytes[3..]
    } else {
        bytes
    }
}

/// Pick the delimiter producing the most consistent multi-column layout
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let candidates = [b',', b';', b'\t'];
    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delimiter in &candidates {
        let score = evaluate_delimiter(bytes, delimiter);
        if score > best_score {
            best_score = score;
            best_delimiter = delimiter;
        }
    }

    best_delimiter
}

fn evaluate_delimiter(bytes: &[u8], delimiter: u8) -> usize {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let mut column_counts: Vec<usize> = Vec::new();

    if let Ok(headers) = reader.headers() {
        column_counts.push(headers.len());
    }

    for result in reader.records().take(5) {
        if let Ok(record) = result {
            column_counts.push(record.len());
        }
    }

    let Some(&first_count) = column_counts.first() else {
        return 0;
    };
    if first_count <= 1 {
        return 0;
    }

    let consistent = column_counts.iter().all(|&c| c == first_count);
    if consistent {
        first_count * 10
    } else {
        first_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_semicolon_delimiter() {
        let table = Table::from_csv("a;b;c\n1;2;3\n4;5;6\n").unwrap();
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn strips_bom() {
        let table = Table::from_csv("\u{feff}Date,404\n2024-01-01,3\n").unwrap();
        assert_eq!(table.headers[0], "Date");
    }

    #[test]
    fn quoted_commas_stay_in_cell() {
        let table = Table::from_csv("name,city\n\"Doe, Jane\",Paris\n").unwrap();
        assert_eq!(table.rows[0][0], "Doe, Jane");
    }

    #[test]
    fn cells_and_numbers() {
        let table = Table::from_csv("a,b\n 1.5 ,\n").unwrap();
        let row = &table.rows[0];
        assert_eq!(table.number(row, 0), Some(1.5));
        assert_eq!(table.cell(row, 1), None);
    }

    #[test]
    fn missing_column_is_parse_error() {
        let table = Table::from_csv("a,b\n1,2\n").unwrap();
        assert!(matches!(table.column("z"), Err(MonitorError::Parse(_))));
    }

    #[test]
    fn empty_input_is_error() {
        assert!(Table::from_csv("").is_err());
    }
}
