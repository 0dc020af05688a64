use std::path::PathBuf;

use stockito_recon::ReconError;
use thiserror::Error;

/// A source file could not be turned into a table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    /// Extension not recognized as CSV or spreadsheet.
    #[error("unsupported file format: '{0}'")]
    UnsupportedFormat(String),
    #[error("{0}: file contains no data")]
    Empty(String),
}

/// An output workbook could not be produced.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    /// A cell position does not fit the sheet's index types.
    #[error("cell at row {row}, column {col} is outside the sheet")]
    CellOutOfRange { row: usize, col: usize },
    #[error(transparent)]
    Recon(#[from] ReconError),
}
