//! In-memory tabular view used between the CSV transport and typed rows.

use crate::errors::CorpusError;
use crate::types::{CellValue, ColumnName};
use crate::utils::snake_case_header;

/// A header plus rows of optional cells; empty cells are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    /// Name used in error messages (usually the source file).
    pub name: String,
    /// Column names; snake_case once `normalize_headers` has run.
    pub headers: Vec<ColumnName>,
    /// Cells per row, padded to the header width.
    pub rows: Vec<Vec<Option<CellValue>>>,
}

impl RawTable {
    /// Create an empty table with the given headers.
    pub fn new(name: impl Into<String>, headers: Vec<ColumnName>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from parsed records, treating the first record as the header.
    ///
    /// Short rows are padded with `None`; extra cells beyond the header are dropped.
    pub fn from_records(name: impl Into<String>, records: Vec<Vec<String>>) -> Self {
        let mut records = records.into_iter();
        let headers = records.next().unwrap_or_default();
        let width = headers.len();
        let rows = records
            .map(|record| {
                let mut row: Vec<Option<CellValue>> = record
                    .into_iter()
                    .take(width)
                    .map(|cell| if cell.trim().is_empty() { None } else { Some(cell) })
                    .collect();
                row.resize(width, None);
                row
            })
            .collect();
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Option<CellValue>>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    /// Lowercase every header and replace spaces with underscores.
    pub fn normalize_headers(&mut self) {
        for header in &mut self.headers {
            *header = snake_case_header(header);
        }
    }

    /// Index of the first header matching any of `names`, in `names` order.
    pub fn column_index_any(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.headers.iter().position(|header| header == name))
    }

    /// Like [`RawTable::column_index_any`] but fails with `MissingColumn`.
    pub fn require_column(&self, names: &[&str]) -> Result<usize, CorpusError> {
        self.column_index_any(names)
            .ok_or_else(|| CorpusError::MissingColumn {
                table: self.name.clone(),
                column: names.first().copied().unwrap_or_default().to_string(),
            })
    }

    /// Rename the first header matching any of `aliases` to `canonical`.
    pub fn rename_column(&mut self, aliases: &[&str], canonical: &str) {
        if let Some(idx) = self.column_index_any(aliases) {
            self.headers[idx] = canonical.to_string();
        }
    }

    /// Cell text at (`row`, `col`), if present.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .and_then(|cell| cell.as_deref())
    }

    /// Replace missing cells of column `col` with `value`.
    pub fn fill_missing(&mut self, col: usize, value: &str) {
        for row in &mut self.rows {
            if row[col].is_none() {
                row[col] = Some(value.to_string());
            }
        }
    }

    /// Forward-fill every column except `skip`, top to bottom.
    pub fn forward_fill_except(&mut self, skip: &[usize]) {
        for col in 0..self.headers.len() {
            if skip.contains(&col) {
                continue;
            }
            let mut carry: Option<CellValue> = None;
            for row in &mut self.rows {
                match &row[col] {
                    Some(value) => carry = Some(value.clone()),
                    None => row[col] = carry.clone(),
                }
            }
        }
    }

    /// Parse a required unsigned integer cell.
    pub fn parse_u32(&self, row: usize, col: usize) -> Result<u32, CorpusError> {
        let raw = self.cell(row, col).unwrap_or_default();
        parse_integer_cell(raw).ok_or_else(|| CorpusError::InvalidField {
            table: self.name.clone(),
            column: self.headers[col].clone(),
            row,
            value: raw.to_string(),
        })
    }

    /// Parse an optional count cell; missing cells count as zero.
    pub fn parse_count(&self, row: usize, col: usize) -> Result<u64, CorpusError> {
        match self.cell(row, col) {
            None => Ok(0),
            Some(raw) => parse_integer_cell(raw).ok_or_else(|| CorpusError::InvalidField {
                table: self.name.clone(),
                column: self.headers[col].clone(),
                row,
                value: raw.to_string(),
            }),
        }
    }
}

/// Parse an integer cell, accepting spreadsheet float renderings such as `12.0`.
fn parse_integer_cell<T>(raw: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<T>() {
        return Some(value);
    }
    let (whole, fraction) = raw.split_once('.')?;
    if fraction.chars().all(|ch| ch == '0') {
        whole.parse::<T>().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        RawTable::from_records(
            "annotations.csv",
            vec![
                vec!["Dates".into(), "Page Number".into(), "Notes".into()],
                vec!["June 1965".into(), "1".into(), "".into()],
                vec!["".into(), "2.0".into()],
                vec!["July 1965".into(), "3".into(), "10-12".into(), "spill".into()],
            ],
        )
    }

    #[test]
    fn from_records_pads_and_truncates_rows() {
        let table = table();
        assert_eq!(table.rows.len(), 3);
        assert!(table.rows.iter().all(|row| row.len() == 3));
        assert_eq!(table.cell(1, 2), None);
        assert_eq!(table.cell(2, 2), Some("10-12"));
    }

    #[test]
    fn normalize_headers_and_lookup_by_alias() {
        let mut table = table();
        table.normalize_headers();
        assert_eq!(table.headers, vec!["dates", "page_number", "notes"]);
        assert_eq!(table.column_index_any(&["sequence", "page_number"]), Some(1));
        assert!(matches!(
            table.require_column(&["type_of_page"]),
            Err(CorpusError::MissingColumn { column, .. }) if column == "type_of_page"
        ));
    }

    #[test]
    fn forward_fill_skips_listed_columns() {
        let mut table = table();
        table.forward_fill_except(&[2]);
        assert_eq!(table.cell(1, 0), Some("June 1965"));
        assert_eq!(table.cell(1, 2), None);
    }

    #[test]
    fn parse_u32_accepts_float_renderings() {
        let table = table();
        assert_eq!(table.parse_u32(1, 1).unwrap(), 2);
        assert!(matches!(
            table.parse_u32(0, 0),
            Err(CorpusError::InvalidField { row: 0, .. })
        ));
        assert_eq!(table.parse_count(1, 2).unwrap(), 0);
    }
}
