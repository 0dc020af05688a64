//! Full-update reconstruction.
//!
//! Produces a table shaped exactly like the computer file (same columns, same
//! order) carrying the corrected quantities of every non-zero (code, lot),
//! with ancillary columns backfilled from both source files.

use std::collections::{BTreeMap, HashMap};

use crate::columns::{Role, Side};
use crate::engine::Reconciler;
use crate::error::ReconError;
use crate::model::{CellValue, ComparisonRow, ComparisonTable, OutputTable, StockKey};
use crate::normalize::{normalize_identifier, parse_quantity};
use crate::table::RawTable;

/// Source rows joined to one comparison row.
#[derive(Debug, Clone, Copy)]
struct JoinedRows {
    computer: Option<usize>,
    field: Option<usize>,
}

impl<'a> Reconciler<'a> {
    /// Rebuild the full computer inventory with operator corrections.
    ///
    /// `edited` is the subset the operator worked on; `full` is the complete
    /// comparison it was taken from. Rows whose final quantity is zero are
    /// not written.
    pub fn full_update(
        &self,
        edited: &ComparisonTable,
        full: &ComparisonTable,
    ) -> Result<OutputTable, ReconError> {
        self.columns(Side::Computer)
            .require(Side::Computer, &Role::REQUIRED)?;

        let mut merged = full.clone();
        merged.merge_edits(edited);
        let before = merged.len();
        merged.rows.retain(|r| r.qty_info != 0.0);
        tracing::debug!(
            kept = merged.len(),
            dropped = before - merged.len(),
            "zero-quantity rows dropped"
        );

        let computer_rows = self.first_row_per_key(Side::Computer);
        let field_rows = self.first_row_per_key(Side::Field);
        let default_site = self.default_site();

        let computer = self.table(Side::Computer);
        let columns = computer.columns().to_vec();

        let rows = merged
            .rows
            .iter()
            .map(|row| {
                let key = row.key();
                let joined = JoinedRows {
                    computer: computer_rows.get(&key).copied(),
                    field: field_rows.get(&key).copied(),
                };
                (0..columns.len())
                    .map(|col| self.fill_cell(col, row, joined, default_site.as_deref()))
                    .collect()
            })
            .collect();

        Ok(OutputTable { columns, rows })
    }

    /// First source row for each (code, lot); later duplicates are ignored.
    fn first_row_per_key(&self, side: Side) -> HashMap<StockKey, usize> {
        let mut index = HashMap::new();
        for row in 0..self.table(side).len() {
            index.entry(self.row_key(side, row)).or_insert(row);
        }
        index
    }

    /// Most frequent value of the computer site column; ties go to the
    /// lexicographically smallest value.
    fn default_site(&self) -> Option<String> {
        let col = self.columns(Side::Computer).index(Role::Site)?;
        let table = self.table(Side::Computer);

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for row in 0..table.len() {
            if let Some(v) = table.cell(row, col) {
                *counts.entry(v.trim()).or_insert(0) += 1;
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for (value, count) in counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((value, count));
            }
        }
        best.map(|(v, _)| v.to_string())
    }

    fn fill_cell(
        &self,
        col: usize,
        row: &ComparisonRow,
        joined: JoinedRows,
        default_site: Option<&str>,
    ) -> CellValue {
        let computer = self.table(Side::Computer);
        let computer_value = joined.computer.and_then(|r| computer.cell(r, col));

        let Some(role) = self.columns(Side::Computer).role_of(col) else {
            return computer_value.map(CellValue::infer).unwrap_or(CellValue::Empty);
        };

        match role {
            Role::Code => CellValue::text(row.code.clone()),
            Role::Lot => CellValue::text(row.lot.clone()),
            Role::Label => CellValue::text(row.label.clone()),
            Role::Quantity | Role::Available => CellValue::Number(row.qty_info),
            Role::Ean | Role::Serial => {
                let from_computer = normalize_identifier(computer_value);
                if !from_computer.is_empty() {
                    return CellValue::Text(from_computer);
                }
                CellValue::text(normalize_identifier(self.field_value(joined, role)))
            }
            Role::Location | Role::UnitOfMeasure | Role::Site => {
                let value = computer_value
                    .or_else(|| self.field_value(joined, role))
                    .map(str::trim)
                    .or(if role == Role::Site { default_site } else { None });
                CellValue::text(value.unwrap_or_default())
            }
            Role::Reserved => match computer_value {
                Some(raw) => parse_quantity(Some(raw))
                    .map(CellValue::Number)
                    .unwrap_or_else(|| CellValue::text(raw)),
                None => CellValue::Number(0.0),
            },
        }
    }

    fn field_value(&self, joined: JoinedRows, role: Role) -> Option<&'a str> {
        joined
            .field
            .and_then(|r| self.role_value(Side::Field, r, role))
    }
}

/// Rebuild the computer file with corrections using the built-in keyword sets.
pub fn generate_full_update(
    field: &RawTable,
    computer: &RawTable,
    edited: &ComparisonTable,
    full: &ComparisonTable,
) -> Result<OutputTable, ReconError> {
    Reconciler::new(field, computer)?.full_update(edited, full)
}
