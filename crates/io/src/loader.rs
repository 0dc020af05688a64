//! Source file loading: format dispatch, header detection, table build.

use std::path::Path;

use stockito_recon::table::find_header_row;
use stockito_recon::{HeaderConfig, RawTable};

use crate::error::LoadError;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Lowercase column names in addition to trimming them.
    pub lowercase_headers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

impl SourceFormat {
    /// Format implied by a file name's extension.
    pub fn from_name(name: &str) -> Result<Self, LoadError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            _ => Err(LoadError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// A loaded table and where its header was found.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: RawTable,
    pub header_row: usize,
    /// False when no row matched and row 0 was used.
    pub header_detected: bool,
}

/// Load a file with default options and the built-in header keywords.
pub fn load(path: &Path) -> Result<RawTable, LoadError> {
    load_with(path, &LoadOptions::default(), &HeaderConfig::default()).map(|l| l.table)
}

pub fn load_with(
    path: &Path,
    options: &LoadOptions,
    header: &HeaderConfig,
) -> Result<LoadedTable, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    load_from_bytes(&name, &bytes, options, header)
}

/// Load an uploaded file held in memory. `name` picks the format.
pub fn load_from_bytes(
    name: &str,
    bytes: &[u8],
    options: &LoadOptions,
    header: &HeaderConfig,
) -> Result<LoadedTable, LoadError> {
    let grid = match SourceFormat::from_name(name)? {
        SourceFormat::Csv => crate::csv::read_grid(&crate::csv::decode(bytes))?,
        SourceFormat::Spreadsheet => crate::xlsx::read_grid(bytes)?,
    };

    if grid.iter().all(|row| row.iter().all(|c| c.trim().is_empty())) {
        return Err(LoadError::Empty(name.to_string()));
    }

    let (header_row, header_detected) = match find_header_row(&grid, header) {
        Some(idx) => (idx, true),
        None => {
            tracing::warn!(file = name, "no recognizable header row, using row 0");
            (0, false)
        }
    };

    let table = RawTable::from_grid(grid, header_row, options.lowercase_headers);
    tracing::debug!(
        file = name,
        header_row,
        columns = table.columns().len(),
        rows = table.len(),
        "loaded"
    );

    Ok(LoadedTable {
        table,
        header_row,
        header_detected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_csv(content: &str) -> LoadedTable {
        load_from_bytes(
            "stock.csv",
            content.as_bytes(),
            &LoadOptions::default(),
            &HeaderConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn format_by_extension() {
        assert_eq!(SourceFormat::from_name("a.CSV").unwrap(), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_name("dir/b.xlsx").unwrap(), SourceFormat::Spreadsheet);
        assert_eq!(SourceFormat::from_name("c.ods").unwrap(), SourceFormat::Spreadsheet);
        assert!(matches!(
            SourceFormat::from_name("d.pdf"),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert!(SourceFormat::from_name("noext").is_err());
    }

    #[test]
    fn header_found_after_preamble() {
        let loaded = load_csv("Export du 15/01;;\n;;\n Code ;Lot;Qte\nA1;L1;3\n");
        assert_eq!(loaded.header_row, 2);
        assert!(loaded.header_detected);
        assert_eq!(loaded.table.columns(), &["Code", "Lot", "Qte"]);
        assert_eq!(loaded.table.len(), 1);
    }

    #[test]
    fn unrecognized_header_defaults_to_first_row() {
        let loaded = load_csv("a,b\n1,2\n");
        assert_eq!(loaded.header_row, 0);
        assert!(!loaded.header_detected);
        assert_eq!(loaded.table.columns(), &["a", "b"]);
    }

    #[test]
    fn lowercase_option() {
        let loaded = load_from_bytes(
            "x.csv",
            b"CODE,LOT,QTE\nA,B,1\n",
            &LoadOptions {
                lowercase_headers: true,
            },
            &HeaderConfig::default(),
        )
        .unwrap();
        assert_eq!(loaded.table.columns(), &["code", "lot", "qte"]);
    }

    #[test]
    fn empty_file_is_an_error() {
        let err = load_from_bytes("x.csv", b"", &LoadOptions::default(), &HeaderConfig::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Empty(_)));
    }

    #[test]
    fn corrupt_spreadsheet_is_an_error() {
        let err = load_from_bytes(
            "x.xlsx",
            b"PK\x03\x04 truncated",
            &LoadOptions::default(),
            &HeaderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Spreadsheet(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load(Path::new("/nonexistent/stock.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
