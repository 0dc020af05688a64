//! `stockito inspect`: what the loader and column resolver see in a file.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;
use stockito_io::LoadOptions;
use stockito_recon::{ColumnMap, Role, Side};

use crate::compare::load_source;
use crate::{load_config, CliError};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SideArg {
    Field,
    Computer,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Field => Side::Field,
            SideArg::Computer => Side::Computer,
        }
    }
}

#[derive(Args)]
pub struct InspectArgs {
    /// Source file (CSV or spreadsheet)
    pub file: PathBuf,

    /// Keyword set to resolve columns with (serial numbers differ per side)
    #[arg(long, value_enum, default_value = "computer")]
    pub side: SideArg,

    /// TOML file overriding column keywords and header detection
    #[arg(long, value_name = "TOML", env = "STOCKITO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct InspectOutput<'a> {
    file: String,
    side: Side,
    /// 1-based line of the header in the source.
    header_row: usize,
    header_detected: bool,
    rows: usize,
    columns: &'a [String],
    roles: Vec<RoleOutput<'a>>,
    missing: Vec<&'static str>,
}

#[derive(Serialize)]
struct RoleOutput<'a> {
    role: &'static str,
    column: &'a str,
    index: usize,
}

pub fn cmd_inspect(args: InspectArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let side = Side::from(args.side);
    let loaded = load_source(&args.file, &LoadOptions::default(), &config.header)?;
    let columns = ColumnMap::resolve(&loaded.table, &config.keywords, side);

    let output = InspectOutput {
        file: args.file.display().to_string(),
        side,
        header_row: loaded.header_row + 1,
        header_detected: loaded.header_detected,
        rows: loaded.table.len(),
        columns: loaded.table.columns(),
        roles: roles(&columns),
        missing: columns.missing(&Role::REQUIRED).iter().map(|r| r.as_str()).collect(),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::io(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json);
    } else {
        print_human(&output);
    }

    // Inspection succeeds either way; the caller reads `missing`.
    Ok(())
}

fn roles(columns: &ColumnMap) -> Vec<RoleOutput<'_>> {
    columns
        .iter()
        .map(|(role, col)| RoleOutput { role: role.as_str(), column: &col.name, index: col.index })
        .collect()
}

fn print_human(output: &InspectOutput<'_>) {
    let detected = if output.header_detected { "" } else { " (fallback, no keyword match)" };
    eprintln!("file:      {} ({} keywords)", output.file, output.side);
    eprintln!("header:    line {}{}", output.header_row, detected);
    eprintln!("rows:      {}", output.rows);
    eprintln!("columns:   {}", output.columns.join(" | "));
    eprintln!();
    for role in &output.roles {
        eprintln!("  {:<16} -> {} (#{})", role.role, role.column, role.index + 1);
    }
    if !output.missing.is_empty() {
        eprintln!();
        eprintln!("missing required: {}", output.missing.join(", "));
    }
}
