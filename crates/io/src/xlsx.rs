// Spreadsheet import (xlsx, xlsm, xls, xlsb, ods) and xlsx export
//
// Import flattens the first worksheet to a grid of display strings.
// Export writes one OutputTable per workbook to an in-memory buffer.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveTime;
use rust_xlsxwriter::{Format, FormatBorder, Workbook};
use stockito_recon::model::format_iso_datetime;
use stockito_recon::{CellValue, OutputTable};

use crate::error::{ExportError, LoadError};

/// Read the first worksheet of a spreadsheet into rows of display strings.
pub fn read_grid(bytes: &[u8]) -> Result<Vec<Vec<String>>, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let Some(first) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook.worksheet_range(&first)?;
    tracing::debug!(
        sheet = %first,
        start = ?range.start(),
        size = ?range.get_size(),
        "reading worksheet"
    );

    // The range begins at the first used cell; put back the blank rows and
    // columns above and left of it so positions match the sheet.
    let (skipped_rows, skipped_cols) = range.start().unwrap_or((0, 0));
    let lead: Vec<String> = vec![String::new(); skipped_cols as usize];

    let mut grid: Vec<Vec<String>> = vec![Vec::new(); skipped_rows as usize];
    grid.extend(range.rows().map(|row| {
        lead.iter()
            .cloned()
            .chain(row.iter().map(cell_text))
            .collect::<Vec<_>>()
    }));
    Ok(grid)
}

/// Display text of one cell; integral floats lose their `.0`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(n) => format_number(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{e:?}"),
        // Calendar dates as ISO text; durations stay serial numbers.
        Data::DateTime(dt) if !dt.is_duration() => dt
            .as_datetime()
            .map(format_iso_datetime)
            .unwrap_or_else(|| format_number(dt.as_f64())),
        Data::DateTime(dt) => format_number(dt.as_f64()),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Sheet name and column widths of one exported workbook.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    pub name: &'static str,
    /// (first column, last column, width in characters), zero-based.
    pub widths: &'static [(u16, u16, f64)],
}

/// Render `table` as a single-sheet workbook and return the file bytes.
///
/// The header row is bold with thin borders. Text cells are written as
/// strings (so identifiers keep leading zeros), numbers as numbers, dates
/// with a `dd/mm/yyyy` format, and empty cells are left blank.
pub fn write_table(table: &OutputTable, layout: &SheetLayout) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(layout.name)?;

    let header = Format::new().set_bold().set_border(FormatBorder::Thin);
    let date = Format::new().set_num_format("dd/mm/yyyy");
    let date_time = Format::new().set_num_format("dd/mm/yyyy hh:mm");

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, cell_col(0, col)?, name, &header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row32 = u32::try_from(row_idx + 1)
            .map_err(|_| ExportError::CellOutOfRange { row: row_idx + 1, col: 0 })?;
        for (col, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let col16 = cell_col(row_idx + 1, col)?;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet.write_string(row32, col16, s)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(row32, col16, *n)?;
                }
                CellValue::Date(dt) => {
                    let format = if dt.time() == NaiveTime::MIN { &date } else { &date_time };
                    worksheet.write_datetime_with_format(row32, col16, dt, format)?;
                }
            }
        }
    }

    for &(first, last, width) in layout.widths {
        for col in first..=last {
            worksheet.set_column_width(col, width)?;
        }
    }

    let bytes = workbook.save_to_buffer()?;
    tracing::debug!(
        sheet = layout.name,
        rows = table.rows.len(),
        bytes = bytes.len(),
        "workbook written"
    );
    Ok(bytes)
}

fn cell_col(row: usize, col: usize) -> Result<u16, ExportError> {
    u16::try_from(col).map_err(|_| ExportError::CellOutOfRange { row, col })
}
