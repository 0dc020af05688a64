use crate::model::{CellValue, ComparisonTable, OutputTable};

/// Column headers of the discrepancy report, in order.
pub const REPORT_COLUMNS: [&str; 6] = [
    "Code",
    "Label",
    "Lot",
    "Qty_Field",
    "Qty_Computer",
    "Final_Discrepancy",
];

/// Project the (edited) comparison rows onto the report columns.
///
/// No filtering happens here; callers pass the subset they want reported.
pub fn build_report(edited: &ComparisonTable) -> OutputTable {
    let rows = edited
        .rows
        .iter()
        .map(|r| {
            vec![
                CellValue::text(r.code.clone()),
                CellValue::text(r.label.clone()),
                CellValue::text(r.lot.clone()),
                CellValue::Number(r.qty_terrain),
                CellValue::Number(r.qty_info),
                CellValue::Number(r.final_discrepancy()),
            ]
        })
        .collect();

    OutputTable {
        columns: REPORT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComparisonRow;

    #[test]
    fn final_discrepancy_follows_edit() {
        let mut row = ComparisonRow {
            code: "CODE001".into(),
            lot: "LOT_A".into(),
            label: "Widget".into(),
            qty_terrain: 15.0,
            qty_info: 12.0,
            original_qty_info: 12.0,
            discrepancy: -3.0,
        };
        row.qty_info = 14.0;
        let report = build_report(&ComparisonTable::new(vec![row]));
        assert_eq!(report.columns, REPORT_COLUMNS.to_vec());
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0][4], CellValue::Number(14.0));
        assert_eq!(report.rows[0][5], CellValue::Number(-1.0));
    }
}
