//! `stockito-recon`: field vs computer stock reconciliation engine.
//!
//! Pure engine crate: receives raw tables, returns comparison and output
//! tables. No file IO; loading and spreadsheet rendering live in
//! `stockito-io`.

pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod report;
pub mod scan;
pub mod table;
pub mod update;

pub use columns::{find_column, ColumnMap, Role, Side};
pub use config::{HeaderConfig, ReconConfig};
pub use engine::{apply_corrections_csv, apply_corrections_csv_with, reconcile, Reconciler};
pub use error::ReconError;
pub use model::{
    CellValue, ComparisonRow, ComparisonSummary, ComparisonTable, CorrectionEdit, OutputTable,
    StockKey,
};
pub use normalize::{normalize_code, normalize_identifier, normalize_lot};
pub use report::build_report;
pub use scan::{HistoryEntry, HistoryStatus, MatchedItem, ScanSession, SearchStatus};
pub use table::{detect_header_row, RawTable};
pub use update::generate_full_update;
