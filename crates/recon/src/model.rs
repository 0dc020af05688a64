use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Join key: (normalized code, normalized lot).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StockKey {
    pub code: String,
    pub lot: String,
}

impl StockKey {
    pub fn new(code: impl Into<String>, lot: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            lot: lot.into(),
        }
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.code, self.lot)
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// One row per distinct (code, lot) seen in either source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub code: String,
    pub lot: String,
    pub label: String,
    pub qty_terrain: f64,
    pub qty_info: f64,
    /// `qty_info` as computed, before any operator edit.
    pub original_qty_info: f64,
    /// `qty_info - qty_terrain`.
    pub discrepancy: f64,
}

impl ComparisonRow {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.code.clone(), self.lot.clone())
    }

    pub fn matches(&self, key: &StockKey) -> bool {
        self.code == key.code && self.lot == key.lot
    }

    /// Override the computer-side quantity and refresh the discrepancy.
    pub fn set_qty_info(&mut self, qty: f64) {
        self.qty_info = qty;
        self.discrepancy = self.qty_info - self.qty_terrain;
    }

    pub fn is_edited(&self) -> bool {
        self.qty_info != self.original_qty_info
    }

    pub fn has_discrepancy(&self) -> bool {
        self.discrepancy != 0.0
    }

    /// Discrepancy recomputed from the current quantities.
    pub fn final_discrepancy(&self) -> f64 {
        self.qty_info - self.qty_terrain
    }
}

/// An operator override, derived from a row whose `qty_info` moved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionEdit {
    pub code: String,
    pub lot: String,
    pub label: String,
    pub previous_qty: f64,
    pub new_qty: f64,
}

impl CorrectionEdit {
    /// Instruction line shown to the operator.
    pub fn action(&self) -> String {
        format!(
            "{} ({}): update computer stock to {}",
            self.code,
            self.label,
            format_qty(self.new_qty)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub total_rows: usize,
    pub discrepant_rows: usize,
    pub edited_rows: usize,
    pub total_terrain: f64,
    pub total_info: f64,
}

/// Reconciliation output and the source of truth after every edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn new(rows: Vec<ComparisonRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &StockKey) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.matches(key))
    }

    /// Apply one operator edit. The key must already exist.
    pub fn set_qty_info(&mut self, key: &StockKey, qty: f64) -> Result<(), ReconError> {
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.matches(key))
            .ok_or_else(|| ReconError::UnknownKey {
                code: key.code.clone(),
                lot: key.lot.clone(),
            })?;
        row.set_qty_info(qty);
        Ok(())
    }

    /// Rows with a non-zero discrepancy, as presented for editing.
    pub fn discrepancies(&self) -> ComparisonTable {
        Self::new(
            self.rows
                .iter()
                .filter(|r| r.has_discrepancy())
                .cloned()
                .collect(),
        )
    }

    /// Overwrite `qty_info` for every key present in `edited`; keys absent
    /// from this table are ignored.
    pub fn merge_edits(&mut self, edited: &ComparisonTable) {
        let overrides: HashMap<StockKey, f64> = edited
            .rows
            .iter()
            .map(|r| (r.key(), r.qty_info))
            .collect();
        for row in &mut self.rows {
            if let Some(qty) = overrides.get(&row.key()) {
                row.set_qty_info(*qty);
            }
        }
    }

    /// Derived view of operator corrections.
    pub fn edits(&self) -> Vec<CorrectionEdit> {
        self.rows
            .iter()
            .filter(|r| r.is_edited())
            .map(|r| CorrectionEdit {
                code: r.code.clone(),
                lot: r.lot.clone(),
                label: r.label.clone(),
                previous_qty: r.original_qty_info,
                new_qty: r.qty_info,
            })
            .collect()
    }

    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary {
            total_rows: self.rows.len(),
            discrepant_rows: self.rows.iter().filter(|r| r.has_discrepancy()).count(),
            edited_rows: self.rows.iter().filter(|r| r.is_edited()).count(),
            total_terrain: self.rows.iter().map(|r| r.qty_terrain).sum(),
            total_info: self.rows.iter().map(|r| r.qty_info).sum(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output tables
// ---------------------------------------------------------------------------

/// A single output cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    /// Calendar value, written back as a spreadsheet date.
    Date(NaiveDateTime),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s)
        }
    }

    /// Typed value of a pass-through source cell.
    ///
    /// ISO dates (`2026-01-15`, `2026-01-15T08:30:00`) become dates. Plain
    /// decimals (`42`, `-3`, `0.5`) become numbers unless a leading zero is
    /// significant (`00123`). Everything else, `1E5` and `+5` included, stays
    /// text as written.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        if let Some(dt) = parse_iso_datetime(trimmed) {
            return Self::Date(dt);
        }
        if is_plain_decimal(trimmed) {
            if let Ok(n) = trimmed.parse::<f64>() {
                return Self::Number(n);
            }
        }
        Self::Text(raw.to_string())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => f.write_str(&format_qty(*n)),
            Self::Date(dt) => f.write_str(&format_iso_datetime(*dt)),
        }
    }
}

/// `2026-01-15` at midnight, `2026-01-15T08:30:00` otherwise.
pub fn format_iso_datetime(dt: NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Optional minus, digits, optional fraction; no exponent, no plus sign.
fn is_plain_decimal(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };
    if int.is_empty() || !int.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if int.len() > 1 && int.starts_with('0') {
        return false;
    }
    frac.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

/// Named columns and typed rows ready to be serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl OutputTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|r| r.get(idx)).collect())
    }
}

/// Render a quantity without a trailing `.0` when it is integral.
pub fn format_qty(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
