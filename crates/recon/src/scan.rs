//! Lookup/scan workflow over a single reference table.
//!
//! A scanned token is matched exactly against every cell; all rows of the
//! matched article are folded into one item with a summed quantity. The
//! operator then confirms or corrects it, and each decision lands at the
//! front of the session history.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::columns::{find_column, ColumnMap, Role};
use crate::config::ScanKeywords;
use crate::model::format_qty;
use crate::normalize::coerce_quantity;
use crate::table::RawTable;

/// Lot text shown when several rows were folded into one item.
pub const MULTI_LOT_MARKER: &str = "MULTIPLE LOTS (SUMMED)";

/// History label when the reference table has no label.
pub const MISSING_LABEL: &str = "N/A";

/// Resolve the scan roles (code, quantity, label, lot) on a reference table.
pub fn resolve_scan_columns(table: &RawTable, keywords: &ScanKeywords) -> ColumnMap {
    let pairs = [
        (Role::Code, keywords.code.as_slice()),
        (Role::Quantity, keywords.quantity.as_slice()),
        (Role::Label, keywords.label.as_slice()),
        (Role::Lot, keywords.lot.as_slice()),
    ]
    .into_iter()
    .filter_map(|(role, list)| find_column(table, list).map(|name| (role, name)));
    ColumnMap::from_pairs(table, pairs)
}

/// One article found by a scan, quantities folded across its rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedItem {
    /// Index of the first matching row.
    pub anchor_row: usize,
    /// Anchor row as (column, text), with the summed quantity and the
    /// multi-lot marker substituted.
    pub fields: Vec<(String, String)>,
    pub code: Option<String>,
    pub label: Option<String>,
    pub lot: Option<String>,
    pub quantity: f64,
    /// Number of rows summed into `quantity`.
    pub folded_rows: usize,
}

/// Find the article matching `query` in `table`.
///
/// The query and every cell are trimmed and uppercased before an exact
/// comparison. Rows sharing the anchor row's code cell are folded; without a
/// code column (or with a blank code) only the anchor row is used.
pub fn search(table: &RawTable, columns: &ColumnMap, query: &str) -> Option<MatchedItem> {
    let needle = query.trim().to_uppercase();
    if needle.is_empty() {
        return None;
    }

    let anchor = (0..table.len()).find(|&row| {
        table.rows()[row]
            .iter()
            .any(|cell| cell.trim().to_uppercase() == needle)
    })?;

    let code_col = columns.index(Role::Code);
    let anchor_code = code_col.and_then(|c| table.cell(anchor, c));
    let folded: Vec<usize> = match (code_col, anchor_code) {
        (Some(c), Some(code)) => (0..table.len())
            .filter(|&row| table.cell(row, c) == Some(code))
            .collect(),
        _ => vec![anchor],
    };

    let qty_col = columns.index(Role::Quantity);
    let quantity: f64 = folded
        .iter()
        .map(|&row| coerce_quantity(qty_col.and_then(|c| table.cell(row, c))))
        .sum();

    let lot_col = columns.index(Role::Lot);
    let multi_lot = folded.len() > 1 && lot_col.is_some();

    let fields = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let value = if Some(idx) == qty_col {
                format_qty(quantity)
            } else if multi_lot && Some(idx) == lot_col {
                MULTI_LOT_MARKER.to_string()
            } else {
                table.rows()[anchor][idx].trim().to_string()
            };
            (name.clone(), value)
        })
        .collect();

    let owned = |role: Role| {
        columns
            .index(role)
            .and_then(|c| table.cell(anchor, c))
            .map(|v| v.trim().to_string())
    };
    let lot = if multi_lot {
        Some(MULTI_LOT_MARKER.to_string())
    } else {
        owned(Role::Lot)
    };

    tracing::debug!(query, anchor, folded = folded.len(), quantity, "scan match");

    Some(MatchedItem {
        anchor_row: anchor,
        fields,
        code: owned(Role::Code),
        label: owned(Role::Label),
        lot,
        quantity,
        folded_rows: folded.len(),
    })
}

// ---------------------------------------------------------------------------
// Session history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Confirmed,
    Corrected,
}

impl HistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Corrected => "corrected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub at: DateTime<Local>,
    pub code: String,
    pub label: String,
    pub old_qty: f64,
    pub new_qty: f64,
    pub status: HistoryStatus,
}

impl HistoryEntry {
    /// Wall-clock time as shown in the history sheet.
    pub fn time(&self) -> String {
        self.at.format("%H:%M").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    Found,
    NotFound,
}

/// Caller-owned state of one scan session.
#[derive(Debug, Clone)]
pub struct ScanSession {
    reference: RawTable,
    columns: ColumnMap,
    history: Vec<HistoryEntry>,
    current: Option<MatchedItem>,
    status: SearchStatus,
}

impl ScanSession {
    pub fn new(reference: RawTable, keywords: &ScanKeywords) -> Self {
        let columns = resolve_scan_columns(&reference, keywords);
        if !columns.contains(Role::Code) || !columns.contains(Role::Quantity) {
            tracing::warn!(
                resolved = ?columns.iter().map(|(r, c)| (r.as_str(), c.name.as_str())).collect::<Vec<_>>(),
                "reference table lacks a code or quantity column"
            );
        }
        Self {
            reference,
            columns,
            history: Vec::new(),
            current: None,
            status: SearchStatus::Idle,
        }
    }

    pub fn reference(&self) -> &RawTable {
        &self.reference
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Newest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn current(&self) -> Option<&MatchedItem> {
        self.current.as_ref()
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// Run a scan. A blank query leaves the session untouched.
    pub fn search(&mut self, query: &str) -> Option<&MatchedItem> {
        if query.trim().is_empty() {
            return None;
        }
        self.current = search(&self.reference, &self.columns, query);
        self.status = if self.current.is_some() {
            SearchStatus::Found
        } else {
            SearchStatus::NotFound
        };
        self.current.as_ref()
    }

    /// Accept the current item's quantity as counted.
    pub fn confirm(&mut self) -> Option<&HistoryEntry> {
        let item = self.take_current()?;
        Some(self.record_event(&item, item.quantity, item.quantity, HistoryStatus::Confirmed))
    }

    /// Replace the current item's quantity with a counted value.
    pub fn correct(&mut self, new_qty: f64) -> Option<&HistoryEntry> {
        let item = self.take_current()?;
        Some(self.record_event(&item, item.quantity, new_qty, HistoryStatus::Corrected))
    }

    pub fn record_event(
        &mut self,
        item: &MatchedItem,
        old_qty: f64,
        new_qty: f64,
        status: HistoryStatus,
    ) -> &HistoryEntry {
        self.record_event_at(Local::now(), item, old_qty, new_qty, status)
    }

    pub fn record_event_at(
        &mut self,
        at: DateTime<Local>,
        item: &MatchedItem,
        old_qty: f64,
        new_qty: f64,
        status: HistoryStatus,
    ) -> &HistoryEntry {
        let entry = HistoryEntry {
            at,
            code: item.code.clone().unwrap_or_default(),
            label: item
                .label
                .clone()
                .unwrap_or_else(|| MISSING_LABEL.to_string()),
            old_qty,
            new_qty,
            status,
        };
        tracing::info!(
            code = %entry.code,
            old = old_qty,
            new = new_qty,
            status = status.as_str(),
            "scan event"
        );
        self.history.insert(0, entry);
        &self.history[0]
    }

    fn take_current(&mut self) -> Option<MatchedItem> {
        let item = self.current.take()?;
        self.status = SearchStatus::Idle;
        Some(item)
    }
}
