//! Raw tabular data as loaded from a source file, plus header-row detection.

use std::collections::HashSet;

use crate::config::HeaderConfig;

/// Ordered named columns and string rows, before any semantic typing.
///
/// Every row has exactly `columns.len()` cells. Blank cells are stored as
/// empty strings and read back as `None` through [`RawTable::cell`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table, padding or truncating rows to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Build a table from a headerless grid, using `header_row` as the column
    /// names. Rows above the header are discarded and fully blank rows skipped.
    pub fn from_grid(grid: Vec<Vec<String>>, header_row: usize, lowercase_headers: bool) -> Self {
        let mut iter = grid.into_iter().skip(header_row);
        let Some(header) = iter.next() else {
            return Self::default();
        };

        let body: Vec<Vec<String>> = iter
            .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
            .collect();

        let width = body
            .iter()
            .map(|r| r.len())
            .max()
            .unwrap_or(0)
            .max(header.len());

        let mut names = header;
        names.resize(width, String::new());
        let columns = unique_column_names(names, lowercase_headers);

        Self::new(columns, body)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell text, or `None` when the cell is blank or out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Cell text by column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.column_index(column).and_then(|col| self.cell(row, col))
    }
}

/// Trim (and optionally lowercase) header names; blank names become
/// `unnamed: N` and repeats get a `.1`, `.2` suffix so every column stays
/// addressable by name.
fn unique_column_names(names: Vec<String>, lowercase: bool) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(names.len());

    for (idx, raw) in names.into_iter().enumerate() {
        let mut name = raw.trim().to_string();
        if lowercase {
            name = name.to_lowercase();
        }
        if name.is_empty() {
            name = format!("unnamed: {idx}");
        }
        let mut candidate = name.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{name}.{n}");
            n += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}

/// Index of the first row (within the scan window) that looks like a header:
/// its lowercased text contains an identifier keyword AND a companion keyword
/// (lot, quantity, stock).
pub fn find_header_row(rows: &[Vec<String>], config: &HeaderConfig) -> Option<usize> {
    rows.iter().take(config.scan_rows).position(|row| {
        let text = row
            .iter()
            .map(|c| c.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        let has_id = config
            .id_keywords
            .iter()
            .any(|k| text.contains(&k.to_lowercase()));
        let has_companion = config
            .companion_keywords
            .iter()
            .any(|k| text.contains(&k.to_lowercase()));
        has_id && has_companion
    })
}

/// Header row index, defaulting to row 0 when nothing matches.
pub fn detect_header_row(rows: &[Vec<String>], config: &HeaderConfig) -> usize {
    find_header_row(rows, config).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn header_found_below_title_rows() {
        let rows = grid(&[
            &["EXPORT STOCK", "", ""],
            &["Printed 2026-01-15", "", ""],
            &["Code Article", "Lot", "Qte"],
            &["A1", "L1", "4"],
        ]);
        assert_eq!(detect_header_row(&rows, &HeaderConfig::default()), 2);
    }

    #[test]
    fn article_and_stock_is_enough() {
        let rows = grid(&[&["x"], &["Article", "Stock dispo"]]);
        assert_eq!(find_header_row(&rows, &HeaderConfig::default()), Some(1));
    }

    #[test]
    fn no_match_defaults_to_zero() {
        let rows = grid(&[&["alpha", "beta"], &["1", "2"]]);
        assert_eq!(find_header_row(&rows, &HeaderConfig::default()), None);
        assert_eq!(detect_header_row(&rows, &HeaderConfig::default()), 0);
    }

    #[test]
    fn scan_window_is_bounded() {
        let mut rows = vec![vec!["filler".to_string()]; 25];
        rows.push(vec!["code".into(), "lot".into()]);
        assert_eq!(find_header_row(&rows, &HeaderConfig::default()), None);
    }

    #[test]
    fn from_grid_skips_preamble_and_blank_rows() {
        let rows = grid(&[
            &["title"],
            &[" Code ", "Lot", "Qte"],
            &["A1", "L1", "4"],
            &["", "", ""],
            &["A2", "L2"],
        ]);
        let table = RawTable::from_grid(rows, 1, false);
        assert_eq!(table.columns(), &["Code", "Lot", "Qte"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 2), None);
        assert_eq!(table.value(0, "Qte"), Some("4"));
    }

    #[test]
    fn from_grid_names_blank_and_duplicate_headers() {
        let rows = grid(&[&["Code", "", "Code"], &["a", "b", "c", "d"]]);
        let table = RawTable::from_grid(rows, 0, true);
        assert_eq!(
            table.columns(),
            &["code", "unnamed: 1", "code.1", "unnamed: 3"]
        );
    }
}
