//! `stockito compare`: reconcile, apply corrections, write workbooks.

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Args;
use serde::Serialize;
use stockito_io::export::{report_file_name, update_file_name};
use stockito_io::{generate_full_update, generate_report, load_with, LoadOptions, LoadedTable};
use stockito_recon::model::format_qty;
use stockito_recon::{
    apply_corrections_csv_with, ComparisonRow, ComparisonSummary, CorrectionEdit, HeaderConfig,
    Reconciler,
};

use crate::{load_config, output_path, write_output, CliError};

#[derive(Args)]
pub struct CompareArgs {
    /// Field count file (physical inventory)
    pub field: PathBuf,

    /// Computer stock file (system of record)
    pub computer: PathBuf,

    /// Write the discrepancy report workbook (file, or directory for a dated name)
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Write the full inventory update workbook (file, or directory for a dated name)
    #[arg(long, value_name = "PATH")]
    pub update: Option<PathBuf>,

    /// CSV of code, lot, quantity overrides applied to the discrepancies
    #[arg(long, value_name = "CSV")]
    pub corrections: Option<PathBuf>,

    /// TOML file overriding column keywords and header detection
    #[arg(long, value_name = "TOML", env = "STOCKITO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Lowercase column names on load
    #[arg(long)]
    pub lowercase_headers: bool,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct CompareOutput<'a> {
    summary: ComparisonSummary,
    discrepancies: &'a [ComparisonRow],
    edits: &'a [CorrectionEdit],
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update: Option<String>,
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    let now = Local::now();
    if let (Some(report), Some(update)) = (&args.report, &args.update) {
        let report_path = output_path(report, &report_file_name(now));
        if report_path == output_path(update, &update_file_name(now)) {
            return Err(CliError::usage("--report and --update name the same file")
                .with_hint("pass a directory, or two different file names"));
        }
    }

    let config = load_config(args.config.as_deref())?;
    let options = LoadOptions { lowercase_headers: args.lowercase_headers };

    let field = load_source(&args.field, &options, &config.header)?;
    let computer = load_source(&args.computer, &options, &config.header)?;

    let reconciler = Reconciler::with_config(config, &field.table, &computer.table)
        .map_err(CliError::recon)?;
    let full = reconciler.compare();
    let mut edited = full.discrepancies();

    if let Some(path) = &args.corrections {
        let bytes = std::fs::read(path)
            .map_err(|e| CliError::io(format!("cannot read {}: {}", path.display(), e)))?;
        let text = stockito_io::csv::decode(&bytes);
        let delimiter = stockito_io::csv::sniff_delimiter(&text);
        let applied =
            apply_corrections_csv_with(&mut edited, &text, delimiter, reconciler.config()).map_err(
                |e| {
                    let mut err = CliError::recon(e);
                    err.message = format!("{}: {}", path.display(), err.message);
                    err
                },
            )?;
        tracing::info!(applied, path = %path.display(), "applied corrections");
    }

    let edits = edited.edits();
    let mut merged = full.clone();
    merged.merge_edits(&edited);

    let report = match &args.report {
        Some(target) => {
            let bytes = generate_report(&edited).map_err(CliError::export)?;
            Some(write_output(target, &report_file_name(now), &bytes)?)
        }
        None => None,
    };
    let update = match &args.update {
        Some(target) => {
            let bytes =
                generate_full_update(&reconciler, &edited, &full).map_err(CliError::export)?;
            Some(write_output(target, &update_file_name(now), &bytes)?)
        }
        None => None,
    };

    if args.json {
        let output = CompareOutput {
            summary: merged.summary(),
            discrepancies: &edited.rows,
            edits: &edits,
            report: report.as_ref().map(|p| p.display().to_string()),
            update: update.as_ref().map(|p| p.display().to_string()),
        };
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::io(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    eprintln!("field:     {}", describe(&args.field, &field));
    eprintln!("computer:  {}", describe(&args.computer, &computer));
    eprintln!(
        "compared:  {} keys, {} with discrepancy, {} corrected",
        full.len(),
        edited.len(),
        edits.len()
    );
    for row in &edited.rows {
        eprintln!(
            "  {:<16} {:<12} field {:>8}  computer {:>8}  diff {:>8}",
            row.code,
            row.lot,
            format_qty(row.qty_terrain),
            format_qty(row.qty_info),
            format_qty(row.final_discrepancy())
        );
    }
    if !edits.is_empty() {
        eprintln!();
        eprintln!("actions:");
        for edit in &edits {
            eprintln!("  {}", edit.action());
        }
    }
    for path in report.iter().chain(update.iter()) {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

pub(crate) fn load_source(
    path: &Path,
    options: &LoadOptions,
    header: &HeaderConfig,
) -> Result<LoadedTable, CliError> {
    load_with(path, options, header).map_err(|e| CliError::load(path, e))
}

fn describe(path: &Path, loaded: &LoadedTable) -> String {
    format!(
        "{} ({} rows, header on line {})",
        path.display(),
        loaded.table.len(),
        loaded.header_row + 1
    )
}
