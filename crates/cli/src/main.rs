// Stockito CLI - reconcile physical stock counts against computer inventory

mod compare;
mod exit_codes;
mod inspect;
mod logger;
mod scan;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stockito_io::{ExportError, LoadError};
use stockito_recon::{ReconConfig, ReconError};

use exit_codes::{
    export_exit_code, load_exit_code, recon_exit_code, EXIT_CONFIG, EXIT_ERROR, EXIT_EXPORT,
    EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "stockito")]
#[command(about = "Reconcile field stock counts against computer inventory")]
#[command(version)]
struct Cli {
    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a field count with a computer stock export
    #[command(after_help = "\
Both files may be CSV or spreadsheets. Header rows are detected, so title
lines above the real header are skipped. Rows are compared per (code, lot).

Corrections file: CSV with code, lot and quantity columns (same keywords as
the computer file). Each line overrides the computer quantity of one
discrepancy.

Examples:
  stockito compare terrain.xlsx informatique.xlsx
  stockito compare terrain.csv stock.csv --report out/ --update out/
  stockito compare terrain.csv stock.csv --corrections fixes.csv --json")]
    Compare(compare::CompareArgs),

    /// Show detected header row and column roles of a source file
    #[command(after_help = "\
Examples:
  stockito inspect informatique.xlsx
  stockito inspect terrain.csv --side field --json")]
    Inspect(inspect::InspectArgs),

    /// Look up articles by scanned code, one token per stdin line
    #[command(after_help = "\
Input lines:
  <token>   search the reference table (exact match on any column)
  ok        confirm the current article's quantity
  <number>  record a corrected quantity for the current article

Examples:
  stockito scan reference.xlsx
  stockito scan reference.csv --history out/ < scans.txt")]
    Scan(scan::ScanArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let result = match cli.command {
        Commands::Compare(args) => compare::cmd_compare(args),
        Commands::Inspect(args) => inspect::cmd_inspect(args),
        Commands::Scan(args) => scan::cmd_scan(args),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            eprintln!("error: {}", message);
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    pub fn write(path: &Path, err: std::io::Error) -> Self {
        Self {
            code: EXIT_EXPORT,
            message: format!("cannot write {}: {}", path.display(), err),
            hint: None,
        }
    }

    pub fn load(path: &Path, err: LoadError) -> Self {
        let hint = match &err {
            LoadError::UnsupportedFormat(_) => {
                Some("supported: .csv .tsv .txt .xlsx .xlsm .xls .xlsb .ods".to_string())
            }
            _ => None,
        };
        let message = match &err {
            LoadError::Csv(_) | LoadError::Spreadsheet(_) => format!("{}: {}", path.display(), err),
            _ => err.to_string(),
        };
        Self { code: load_exit_code(&err), message, hint }
    }

    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumns { .. } => {
                Some("run `stockito inspect <file>` to see detected columns".to_string())
            }
            ReconError::UnknownKey { .. } => {
                Some("corrections apply only to rows with a discrepancy".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn export(err: ExportError) -> Self {
        Self { code: export_exit_code(&err), message: err.to_string(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Built-in defaults, or a TOML file layered over them.
pub fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::config(format!("cannot read {}: {}", path.display(), e)))?;
    let config = ReconConfig::from_toml(&text).map_err(CliError::recon)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// An existing directory receives `default_name`; anything else is the file path.
pub fn output_path(target: &Path, default_name: &str) -> PathBuf {
    if target.is_dir() {
        target.join(default_name)
    } else {
        target.to_path_buf()
    }
}

pub fn write_output(target: &Path, default_name: &str, bytes: &[u8]) -> Result<PathBuf, CliError> {
    let path = output_path(target, default_name);
    std::fs::write(&path, bytes).map_err(|e| CliError::write(&path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(output_path(dir.path(), "a.xlsx"), dir.path().join("a.xlsx"));
        let file = dir.path().join("named.xlsx");
        assert_eq!(output_path(&file, "a.xlsx"), file);
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let err = load_config(Some(Path::new("/nonexistent/stockito.toml"))).unwrap_err();
        assert_eq!(err.code, EXIT_CONFIG);
    }

    #[test]
    fn invalid_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[header\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert_eq!(err.code, EXIT_CONFIG);
    }

    #[test]
    fn missing_columns_hint() {
        let err = CliError::recon(ReconError::MissingColumns {
            side: stockito_recon::Side::Field,
            roles: vec![stockito_recon::Role::Lot],
        });
        assert_eq!(err.code, exit_codes::EXIT_MISSING_COLUMNS);
        assert!(err.hint.unwrap().contains("inspect"));
    }
}
