//! CLI Exit Code Registry
//!
//! Single source of truth for `stockito` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error                                            |
//! | 2    | Usage error (bad arguments, bad corrections input)       |
//! | 3    | A source file could not be loaded                        |
//! | 4    | Required columns (code, lot, quantity) not found         |
//! | 5    | An output workbook could not be produced or written      |
//! | 6    | Configuration file unreadable or invalid                 |

use stockito_io::{ExportError, LoadError};
use stockito_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, or corrections that do not fit the comparison.
pub const EXIT_USAGE: u8 = 2;

/// Source file unreadable, corrupt, empty, or of an unsupported type.
pub const EXIT_LOAD: u8 = 3;

/// A source table lacks a code, lot, or quantity column.
pub const EXIT_MISSING_COLUMNS: u8 = 4;

/// Workbook rendering or writing failed.
pub const EXIT_EXPORT: u8 = 5;

/// `--config` file unreadable, malformed, or invalid.
pub const EXIT_CONFIG: u8 = 6;

pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::MissingColumns { .. } => EXIT_MISSING_COLUMNS,
        ReconError::UnknownKey { .. } | ReconError::Corrections(_) => EXIT_USAGE,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
    }
}

pub fn load_exit_code(_err: &LoadError) -> u8 {
    EXIT_LOAD
}

pub fn export_exit_code(err: &ExportError) -> u8 {
    match err {
        ExportError::Recon(inner) => recon_exit_code(inner),
        ExportError::Xlsx(_) | ExportError::CellOutOfRange { .. } => EXIT_EXPORT,
    }
}
