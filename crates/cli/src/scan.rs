//! `stockito scan`: line-driven lookup against a reference table.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::Local;
use clap::Args;
use stockito_io::export::history_file_name;
use stockito_io::{export_history, LoadOptions};
use stockito_recon::model::format_qty;
use stockito_recon::normalize::parse_quantity;
use stockito_recon::{MatchedItem, ScanSession};

use crate::compare::load_source;
use crate::{load_config, write_output, CliError};

#[derive(Args)]
pub struct ScanArgs {
    /// Reference stock file (CSV or spreadsheet)
    pub reference: PathBuf,

    /// Write the scan history workbook at end of input (file, or directory for a dated name)
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// TOML file overriding scan keywords and header detection
    #[arg(long, value_name = "TOML", env = "STOCKITO_CONFIG")]
    pub config: Option<PathBuf>,
}

pub fn cmd_scan(args: ScanArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let loaded = load_source(&args.reference, &LoadOptions::default(), &config.header)?;
    let mut session = ScanSession::new(loaded.table, &config.scan);
    eprintln!(
        "{} articles loaded from {}; scan a code, `ok` to confirm, a number to correct",
        session.reference().len(),
        args.reference.display()
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(&mut session, stdin.lock(), stdout.lock())?;

    let events = session.history().len();
    eprintln!("{} event(s) recorded", events);
    if let Some(target) = &args.history {
        if events == 0 {
            eprintln!("no history to write");
            return Ok(());
        }
        let bytes = export_history(session.history()).map_err(CliError::export)?;
        let path = write_output(target, &history_file_name(Local::now()), &bytes)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

/// Drive `session` from `input` until end of input.
///
/// A number corrects the current article; with no current article it is
/// searched like any other token.
pub fn run_session<R: BufRead, W: Write>(
    session: &mut ScanSession,
    input: R,
    mut out: W,
) -> Result<(), CliError> {
    for line in input.lines() {
        let line = line.map_err(|e| CliError::io(format!("reading input: {}", e)))?;
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        step(session, token, &mut out)
            .map_err(|e| CliError::io(format!("writing output: {}", e)))?;
    }
    out.flush().map_err(|e| CliError::io(format!("writing output: {}", e)))
}

fn step<W: Write>(session: &mut ScanSession, token: &str, out: &mut W) -> io::Result<()> {
    if token.eq_ignore_ascii_case("ok") {
        return match session.confirm() {
            Some(entry) => writeln!(
                out,
                "confirmed {} at {}",
                entry.code,
                format_qty(entry.new_qty)
            ),
            None => writeln!(out, "nothing to confirm"),
        };
    }

    if session.current().is_some() {
        if let Some(qty) = parse_quantity(Some(token)) {
            if let Some(entry) = session.correct(qty) {
                return writeln!(
                    out,
                    "corrected {}: {} -> {}",
                    entry.code,
                    format_qty(entry.old_qty),
                    format_qty(entry.new_qty)
                );
            }
        }
    }

    match session.search(token) {
        Some(item) => print_item(item, out),
        None => writeln!(out, "not found: {}", token),
    }
}

fn print_item<W: Write>(item: &MatchedItem, out: &mut W) -> io::Result<()> {
    let rows = if item.folded_rows > 1 {
        format!(" ({} rows)", item.folded_rows)
    } else {
        String::new()
    };
    writeln!(
        out,
        "found {}  qty {}{}",
        item.code.as_deref().unwrap_or("?"),
        format_qty(item.quantity),
        rows
    )?;
    for (column, value) in &item.fields {
        writeln!(out, "  {}: {}", column, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockito_recon::config::ScanKeywords;
    use stockito_recon::{HistoryStatus, RawTable, SearchStatus};

    fn session() -> ScanSession {
        let reference = RawTable::new(
            vec!["Code".into(), "Lot".into(), "Qte".into(), "Libelle".into()],
            vec![
                vec!["A1".into(), "L1".into(), "3".into(), "Widget".into()],
                vec!["B1".into(), "L1".into(), "2".into(), "Bolt".into()],
                vec!["A1".into(), "L2".into(), "7".into(), "Widget".into()],
            ],
        );
        ScanSession::new(reference, &ScanKeywords::default())
    }

    fn run(session: &mut ScanSession, input: &str) -> String {
        let mut out = Vec::new();
        run_session(session, input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn search_then_confirm() {
        let mut s = session();
        let out = run(&mut s, "a1\nok\n");
        assert!(out.contains("found A1  qty 10 (2 rows)"));
        assert!(out.contains("confirmed A1 at 10"));
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.history()[0].status, HistoryStatus::Confirmed);
        assert_eq!(s.status(), SearchStatus::Idle);
    }

    #[test]
    fn number_corrects_current_item() {
        let mut s = session();
        let out = run(&mut s, "B1\n5\n");
        assert!(out.contains("corrected B1: 2 -> 5"));
        assert_eq!(s.history()[0].new_qty, 5.0);
        assert_eq!(s.history()[0].status, HistoryStatus::Corrected);
    }

    #[test]
    fn number_without_current_item_is_searched() {
        let mut s = session();
        let out = run(&mut s, "42\nok\n");
        assert!(out.contains("not found: 42"));
        assert!(out.contains("nothing to confirm"));
        assert!(s.history().is_empty());
    }

    #[test]
    fn blank_lines_skipped_and_history_newest_first() {
        let mut s = session();
        run(&mut s, "A1\n\n  \nok\nB1\n1\n");
        let codes: Vec<&str> = s.history().iter().map(|h| h.code.as_str()).collect();
        assert_eq!(codes, vec!["B1", "A1"]);
    }
}
