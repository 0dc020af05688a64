// End-to-end tests for the `stockito` binary.
//
// Human output goes to stderr; --json output must be a single JSON value on
// stdout. Exit codes follow src/exit_codes.rs.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn stockito() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stockito"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("STOCKITO_CONFIG");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn sources(dir: &Path) -> (PathBuf, PathBuf) {
    let field = write(
        dir,
        "terrain.csv",
        "Inventaire terrain;;\nCode;Lot;Qte\nCODE001;LOT_A;10\nCODE001;LOT_A;5\nB2;;1\n",
    );
    let computer = write(
        dir,
        "informatique.csv",
        "Magasin,Code article,Libell\u{e9},Lot,Quantit\u{e9}\nMAG1,code001,Widget,lot_a,12\nMAG1,Z9,Spare,L1,4\n",
    );
    (field, computer)
}

fn json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {}\n{}", e, stdout))
}

fn path_arg(p: &Path) -> &str {
    p.to_str().unwrap()
}

// ===========================================================================
// stockito compare
// ===========================================================================

#[test]
fn compare_json_lists_discrepancies() {
    let dir = tempfile::tempdir().unwrap();
    let (field, computer) = sources(dir.path());

    let output = stockito()
        .args(["compare", path_arg(&field), path_arg(&computer), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let val = json(&output);
    assert_eq!(val["summary"]["total_rows"], 3);
    assert_eq!(val["summary"]["discrepant_rows"], 3);
    let rows = val["discrepancies"].as_array().unwrap();
    let codes: Vec<&str> = rows.iter().map(|r| r["code"].as_str().unwrap()).collect();
    assert_eq!(codes, vec!["B2", "CODE001", "Z9"]);
    assert_eq!(rows[1]["label"], "Widget");
    assert_eq!(rows[1]["qty_terrain"], 15.0);
    assert_eq!(rows[1]["qty_info"], 12.0);
    assert!(val["edits"].as_array().unwrap().is_empty());
    assert!(val.get("report").is_none());
}

#[test]
fn compare_human_summary_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let (field, computer) = sources(dir.path());

    let output = stockito()
        .args(["compare", path_arg(&field), path_arg(&computer)])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("header on line 2"), "stderr: {}", stderr);
    assert!(stderr.contains("3 keys, 3 with discrepancy, 0 corrected"), "stderr: {}", stderr);
}

#[test]
fn compare_applies_corrections_and_writes_workbooks() {
    let dir = tempfile::tempdir().unwrap();
    let (field, computer) = sources(dir.path());
    let corrections = write(dir.path(), "fixes.csv", "code,lot,qte\ncode001,lot_a,15\n");
    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();
    let update = dir.path().join("update.xlsx");

    let output = stockito()
        .args([
            "compare",
            path_arg(&field),
            path_arg(&computer),
            "--corrections",
            path_arg(&corrections),
            "--report",
            path_arg(&out_dir),
            "--update",
            path_arg(&update),
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let val = json(&output);
    let edits = val["edits"].as_array().unwrap();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0]["code"], "CODE001");
    assert_eq!(edits[0]["new_qty"], 15.0);
    assert_eq!(val["summary"]["edited_rows"], 1);
    assert_eq!(val["summary"]["discrepant_rows"], 2);
    assert_eq!(val["summary"]["total_info"], 19.0);

    let reports: Vec<_> = std::fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].starts_with("Discrepancy_Report_"));
    assert!(reports[0].ends_with(".xlsx"));

    let bytes = std::fs::read(&update).unwrap();
    assert_eq!(&bytes[..2], b"PK");
    assert_eq!(val["update"], update.display().to_string());
}

#[test]
fn compare_reads_semicolon_corrections() {
    let dir = tempfile::tempdir().unwrap();
    let (field, computer) = sources(dir.path());
    let corrections = write(dir.path(), "fixes.csv", "code;lot;qte\ncode001;lot_a;15\n");

    let output = stockito()
        .args([
            "compare",
            path_arg(&field),
            path_arg(&computer),
            "--corrections",
            path_arg(&corrections),
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let val = json(&output);
    assert_eq!(val["edits"].as_array().unwrap().len(), 1);
    assert_eq!(val["summary"]["edited_rows"], 1);
}

#[test]
fn compare_prints_action_lines() {
    let dir = tempfile::tempdir().unwrap();
    let (field, computer) = sources(dir.path());
    let corrections = write(dir.path(), "fixes.csv", "code,lot,qte\nCODE001,LOT_A,15\n");

    let output = stockito()
        .args([
            "compare",
            path_arg(&field),
            path_arg(&computer),
            "--corrections",
            path_arg(&corrections),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("CODE001 (Widget): update computer stock to 15"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn correction_for_unknown_key_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let (field, computer) = sources(dir.path());
    let corrections = write(dir.path(), "fixes.csv", "code,lot,qte\nNOPE,L1,1\n");

    let output = stockito()
        .args([
            "compare",
            path_arg(&field),
            path_arg(&computer),
            "--corrections",
            path_arg(&corrections),
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("NOPE"));
}

#[test]
fn same_report_and_update_file_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let (field, computer) = sources(dir.path());
    let out = dir.path().join("both.xlsx");

    let output = stockito()
        .args([
            "compare",
            path_arg(&field),
            path_arg(&computer),
            "--report",
            path_arg(&out),
            "--update",
            path_arg(&out),
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!out.exists());
}

#[test]
fn missing_columns_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let (_, computer) = sources(dir.path());
    let field = write(dir.path(), "odd.csv", "Foo,Bar\n1,2\n");

    let output = stockito()
        .args(["compare", path_arg(&field), path_arg(&computer)])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("field file: missing required column(s): code, lot, quantity"));
    assert!(stderr.contains("hint:"));
}

#[test]
fn unsupported_source_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let (field, _) = sources(dir.path());
    let pdf = write(dir.path(), "stock.pdf", "%PDF-1.4");

    let output = stockito()
        .args(["compare", path_arg(&field), path_arg(&pdf)])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn invalid_config_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let (field, computer) = sources(dir.path());
    let config = write(dir.path(), "stockito.toml", "[keywords]\ncode = 5\n");

    let output = stockito()
        .args([
            "compare",
            path_arg(&field),
            path_arg(&computer),
            "--config",
            path_arg(&config),
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let output = stockito().args(["frobnicate"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ===========================================================================
// stockito inspect
// ===========================================================================

#[test]
fn inspect_json_reports_roles() {
    let dir = tempfile::tempdir().unwrap();
    let (field, computer) = sources(dir.path());

    let output = stockito()
        .args(["inspect", path_arg(&computer), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let val = json(&output);
    assert_eq!(val["header_row"], 1);
    assert_eq!(val["side"], "computer");
    assert_eq!(val["rows"], 2);
    let roles = val["roles"].as_array().unwrap();
    let code = roles.iter().find(|r| r["role"] == "code").unwrap();
    assert_eq!(code["column"], "Code article");
    assert!(val["missing"].as_array().unwrap().is_empty());

    let output = stockito()
        .args(["inspect", path_arg(&field), "--side", "field", "--json"])
        .output()
        .unwrap();
    let val = json(&output);
    assert_eq!(val["header_row"], 2);
    assert_eq!(val["header_detected"], true);
    assert_eq!(val["columns"], serde_json::json!(["Code", "Lot", "Qte"]));
}

// ===========================================================================
// stockito scan
// ===========================================================================

fn scan(args: &[&str], input: &str) -> Output {
    let mut child = stockito()
        .arg("scan")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn scan_confirms_and_writes_history() {
    let dir = tempfile::tempdir().unwrap();
    let reference = write(
        dir.path(),
        "reference.csv",
        "Code,Lot,Qte,Libelle\nA1,L1,3,Widget\nB1,L1,2,Bolt\nA1,L2,7,Widget\n",
    );

    let output = scan(
        &[path_arg(&reference), "--history", path_arg(dir.path())],
        "A1\nok\nB1\n4\nZZZ\n",
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("found A1  qty 10 (2 rows)"), "stdout: {}", stdout);
    assert!(stdout.contains("Lot: MULTIPLE LOTS (SUMMED)"), "stdout: {}", stdout);
    assert!(stdout.contains("confirmed A1 at 10"));
    assert!(stdout.contains("corrected B1: 2 -> 4"));
    assert!(stdout.contains("not found: ZZZ"));

    let history: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("Scan_History_"))
        .collect();
    assert_eq!(history.len(), 1);
}

#[test]
fn scan_without_events_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let reference = write(dir.path(), "reference.csv", "Code,Qte\nA1,3\n");
    let target = dir.path().join("history.xlsx");

    let output = scan(&[path_arg(&reference), "--history", path_arg(&target)], "A1\n");
    assert!(output.status.success());
    assert!(!target.exists());
}
