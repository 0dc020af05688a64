use std::collections::{BTreeMap, HashMap};

use crate::columns::{ColumnMap, Role, Side};
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::model::{ComparisonRow, ComparisonTable, StockKey};
use crate::normalize::{normalize_code, normalize_lot_with, parse_quantity};
use crate::table::RawTable;

/// Label used when no source names an article.
pub const UNKNOWN_LABEL: &str = "LABEL UNKNOWN";

/// Field and computer tables with their resolved columns.
///
/// Construction fails when either table lacks a code, lot, or quantity
/// column; every operation afterwards can rely on those roles.
#[derive(Debug)]
pub struct Reconciler<'a> {
    config: ReconConfig,
    field: &'a RawTable,
    computer: &'a RawTable,
    field_columns: ColumnMap,
    computer_columns: ColumnMap,
}

impl<'a> Reconciler<'a> {
    pub fn new(field: &'a RawTable, computer: &'a RawTable) -> Result<Self, ReconError> {
        Self::with_config(ReconConfig::default(), field, computer)
    }

    pub fn with_config(
        config: ReconConfig,
        field: &'a RawTable,
        computer: &'a RawTable,
    ) -> Result<Self, ReconError> {
        let field_columns = ColumnMap::resolve(field, &config.keywords, Side::Field);
        let computer_columns = ColumnMap::resolve(computer, &config.keywords, Side::Computer);

        field_columns.require(Side::Field, &Role::REQUIRED)?;
        computer_columns.require(Side::Computer, &Role::REQUIRED)?;

        Ok(Self {
            config,
            field,
            computer,
            field_columns,
            computer_columns,
        })
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    pub fn table(&self, side: Side) -> &'a RawTable {
        match side {
            Side::Field => self.field,
            Side::Computer => self.computer,
        }
    }

    pub fn columns(&self, side: Side) -> &ColumnMap {
        match side {
            Side::Field => &self.field_columns,
            Side::Computer => &self.computer_columns,
        }
    }

    /// Normalized (code, lot) of one source row.
    pub(crate) fn row_key(&self, side: Side, row: usize) -> StockKey {
        let table = self.table(side);
        let columns = self.columns(side);
        let code = columns.index(Role::Code).and_then(|c| table.cell(row, c));
        let lot = columns.index(Role::Lot).and_then(|c| table.cell(row, c));
        StockKey::new(
            normalize_code(code),
            normalize_lot_with(lot, &self.config.lot.recycle_variants),
        )
    }

    /// Cell text of `role` on one source row.
    pub(crate) fn role_value(&self, side: Side, row: usize, role: Role) -> Option<&'a str> {
        let table = self.table(side);
        self.columns(side)
            .index(role)
            .and_then(|c| table.cell(row, c))
    }

    /// Outer-join both sources on (code, lot) and compute discrepancies.
    pub fn compare(&self) -> ComparisonTable {
        let labels = self.label_dictionary();
        let field_totals = self.aggregate(Side::Field);
        let computer_totals = self.aggregate(Side::Computer);

        let mut joined: BTreeMap<StockKey, (f64, f64)> = BTreeMap::new();
        for (key, qty) in field_totals {
            joined.entry(key).or_insert((0.0, 0.0)).0 = qty;
        }
        for (key, qty) in computer_totals {
            joined.entry(key).or_insert((0.0, 0.0)).1 = qty;
        }

        let rows: Vec<ComparisonRow> = joined
            .into_iter()
            .map(|(key, (qty_terrain, qty_info))| {
                let label = labels
                    .get(&key.code)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
                ComparisonRow {
                    code: key.code,
                    lot: key.lot,
                    label,
                    qty_terrain,
                    qty_info,
                    original_qty_info: qty_info,
                    discrepancy: qty_info - qty_terrain,
                }
            })
            .collect();

        let table = ComparisonTable::new(rows);
        let summary = table.summary();
        tracing::info!(
            rows = summary.total_rows,
            discrepancies = summary.discrepant_rows,
            "comparison complete"
        );
        table
    }

    /// code → label: first label per code from the field file, then the
    /// computer file's first label per code overwrites.
    fn label_dictionary(&self) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        for side in [Side::Field, Side::Computer] {
            let mut seen: HashMap<String, String> = HashMap::new();
            for row in 0..self.table(side).len() {
                let Some(label) = self.role_value(side, row, Role::Label) else {
                    continue;
                };
                let code = normalize_code(self.role_value(side, row, Role::Code));
                seen.entry(code).or_insert_with(|| label.trim().to_string());
            }
            labels.extend(seen);
        }
        labels
    }

    /// Sum quantities per (code, lot). Non-numeric quantities count as zero.
    fn aggregate(&self, side: Side) -> BTreeMap<StockKey, f64> {
        let mut totals: BTreeMap<StockKey, f64> = BTreeMap::new();
        let mut coerced = 0usize;

        for row in 0..self.table(side).len() {
            let raw = self.role_value(side, row, Role::Quantity);
            let qty = match parse_quantity(raw) {
                Some(q) => q,
                None => {
                    if raw.is_some() {
                        coerced += 1;
                    }
                    0.0
                }
            };
            *totals.entry(self.row_key(side, row)).or_insert(0.0) += qty;
        }

        if coerced > 0 {
            tracing::warn!(%side, cells = coerced, "non-numeric quantities counted as zero");
        }
        tracing::debug!(%side, rows = self.table(side).len(), keys = totals.len(), "aggregated");
        totals
    }
}

/// Reconcile two tables with the built-in keyword sets.
pub fn reconcile(field: &RawTable, computer: &RawTable) -> Result<ComparisonTable, ReconError> {
    Ok(Reconciler::new(field, computer)?.compare())
}

/// Load operator corrections from comma-separated CSV (`code`, `lot`,
/// quantity columns found by keyword) and apply them to `table`.
///
/// Codes and lots go through the same normalizers as the sources, so a
/// correction file may use the raw spellings. Returns the number applied.
pub fn apply_corrections_csv(
    table: &mut ComparisonTable,
    csv_data: &str,
    config: &ReconConfig,
) -> Result<usize, ReconError> {
    apply_corrections_csv_with(table, csv_data, b',', config)
}

/// [`apply_corrections_csv`] with an explicit field delimiter.
pub fn apply_corrections_csv_with(
    table: &mut ComparisonTable,
    csv_data: &str,
    delimiter: u8,
    config: &ReconConfig,
) -> Result<usize, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Corrections(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let shape = RawTable::new(headers, Vec::new());
    let columns = ColumnMap::resolve(&shape, &config.keywords, Side::Computer);
    let (code_idx, lot_idx, qty_idx) = match (
        columns.index(Role::Code),
        columns.index(Role::Lot),
        columns.index(Role::Quantity),
    ) {
        (Some(c), Some(l), Some(q)) => (c, l, q),
        _ => {
            let missing: Vec<&str> = columns
                .missing(&Role::REQUIRED)
                .iter()
                .map(|r| r.as_str())
                .collect();
            return Err(ReconError::Corrections(format!(
                "missing column(s): {}",
                missing.join(", ")
            )));
        }
    };

    let mut applied = 0;
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Corrections(e.to_string()))?;
        let field = |idx: usize| record.get(idx).filter(|v| !v.is_empty());

        let key = StockKey::new(
            normalize_code(field(code_idx)),
            normalize_lot_with(field(lot_idx), &config.lot.recycle_variants),
        );
        let qty = parse_quantity(field(qty_idx)).ok_or_else(|| {
            ReconError::Corrections(format!(
                "line {}: quantity '{}' is not a number",
                line + 2,
                record.get(qty_idx).unwrap_or("")
            ))
        })?;

        table.set_qty_info(&key, qty)?;
        applied += 1;
    }

    Ok(applied)
}
