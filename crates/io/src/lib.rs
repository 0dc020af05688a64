// File I/O for stock reconciliation: loading sources, writing workbooks

pub mod csv;
pub mod error;
pub mod export;
pub mod loader;
pub mod xlsx;

pub use error::{ExportError, LoadError};
pub use export::{export_history, generate_full_update, generate_report};
pub use loader::{load, load_from_bytes, load_with, LoadOptions, LoadedTable, SourceFormat};
