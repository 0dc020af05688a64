//! Output workbooks: discrepancy report, full update, scan history.

use chrono::{DateTime, Local};
use stockito_recon::{
    build_report, CellValue, ComparisonTable, HistoryEntry, OutputTable, Reconciler,
};

use crate::error::ExportError;
use crate::xlsx::{write_table, SheetLayout};

pub const REPORT_LAYOUT: SheetLayout = SheetLayout {
    name: "Discrepancy Report",
    widths: &[(0, 0, 30.0), (1, 1, 70.0), (2, 5, 20.0)],
};

pub const UPDATE_LAYOUT: SheetLayout = SheetLayout {
    name: "Full Inventory",
    widths: &[(0, 2, 15.0), (3, 3, 50.0), (4, 25, 15.0)],
};

pub const HISTORY_LAYOUT: SheetLayout = SheetLayout {
    name: "History",
    widths: &[(0, 0, 8.0), (1, 1, 18.0), (2, 2, 50.0), (3, 5, 12.0)],
};

pub const HISTORY_COLUMNS: [&str; 6] = ["Time", "Code", "Label", "Old Qty", "New Qty", "Status"];

/// Discrepancy report for the rows the caller chose (usually the edited
/// discrepancy subset).
pub fn generate_report(edited: &ComparisonTable) -> Result<Vec<u8>, ExportError> {
    write_table(&build_report(edited), &REPORT_LAYOUT)
}

/// Full computer inventory with corrections merged in.
pub fn generate_full_update(
    reconciler: &Reconciler<'_>,
    edited: &ComparisonTable,
    full: &ComparisonTable,
) -> Result<Vec<u8>, ExportError> {
    let table = reconciler.full_update(edited, full)?;
    write_table(&table, &UPDATE_LAYOUT)
}

/// Scan history, newest first as stored.
pub fn export_history(history: &[HistoryEntry]) -> Result<Vec<u8>, ExportError> {
    write_table(&history_table(history), &HISTORY_LAYOUT)
}

pub fn history_table(history: &[HistoryEntry]) -> OutputTable {
    let rows = history
        .iter()
        .map(|h| {
            vec![
                CellValue::text(h.time()),
                CellValue::text(h.code.clone()),
                CellValue::text(h.label.clone()),
                CellValue::Number(h.old_qty),
                CellValue::Number(h.new_qty),
                CellValue::text(h.status.as_str()),
            ]
        })
        .collect();
    OutputTable {
        columns: HISTORY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

pub fn report_file_name(now: DateTime<Local>) -> String {
    format!("Discrepancy_Report_{}.xlsx", now.format("%d-%m-%Y_%Hh%M"))
}

pub fn update_file_name(now: DateTime<Local>) -> String {
    format!("STOCK {}.xlsx", now.format("%d-%m-%Y %Hh%M"))
}

pub fn history_file_name(now: DateTime<Local>) -> String {
    format!("Scan_History_{}.xlsx", now.format("%d-%m-%Y_%Hh%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stockito_recon::{HistoryStatus, MatchedItem, ScanSession};
    use stockito_recon::config::ScanKeywords;
    use stockito_recon::RawTable;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 15, h, m, 0).unwrap()
    }

    #[test]
    fn file_names() {
        assert_eq!(report_file_name(at(9, 5)), "Discrepancy_Report_15-01-2026_09h05.xlsx");
        assert_eq!(update_file_name(at(17, 30)), "STOCK 15-01-2026 17h30.xlsx");
    }

    #[test]
    fn history_rows_follow_session_order() {
        let reference = RawTable::new(
            vec!["Code".into(), "Qte".into()],
            vec![vec!["A1".into(), "3".into()]],
        );
        let mut session = ScanSession::new(reference, &ScanKeywords::default());
        let item: MatchedItem = session.search("A1").unwrap().clone();
        session.record_event_at(at(8, 0), &item, 3.0, 3.0, HistoryStatus::Confirmed);
        session.record_event_at(at(8, 10), &item, 3.0, 5.0, HistoryStatus::Corrected);

        let table = history_table(session.history());
        assert_eq!(table.columns, HISTORY_COLUMNS.to_vec());
        assert_eq!(table.rows[0][0], CellValue::Text("08:10".into()));
        assert_eq!(table.rows[0][2], CellValue::Text("N/A".into()));
        assert_eq!(table.rows[0][4], CellValue::Number(5.0));
        assert_eq!(table.rows[0][5], CellValue::Text("corrected".into()));
        assert_eq!(table.rows[1][5], CellValue::Text("confirmed".into()));
    }
}
