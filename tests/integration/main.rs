//! Integration tests for Strata
//!
//! These tests drive the CLI end to end against a small C tree in a temp dir.

use std::path::Path;
use std::process::{Command, Output};

use strata_core::{SymbolId, SymbolKind};
use strata_store::Store;
use tempfile::TempDir;

const UTIL_C: &str = "\
#include \"util.h\"

/* Clamp v into [lo, hi]. */
int clamp(int v, int lo, int hi)
{
    return v < lo ? lo : v > hi ? hi : v;
}

int twice(int v)
{
    return clamp(v * 2, 0, 100);
}
";

const MAIN_C: &str = "\
#include \"util.h\"

static int limit = 10;

int main(void)
{
    return twice(limit);
}
";

const SYMBOLS: &str = r#"{"id": 1, "name": "clamp", "file_path": "src/util.c", "start_line": 4}
{"id": 2, "name": "twice", "file_path": "src/util.c", "start_line": 9}
{"id": 3, "name": "limit", "file_path": "src/main.c", "start_line": 3}
{"id": 4, "name": "main", "file_path": "src/main.c", "start_line": 5}
"#;

const REFERENCES: &str = r#"{"from": 2, "to": 1, "line": 11}
{"from": 4, "to": 2, "line": 7}
{"from": 4, "to": 3, "line": 7}
"#;

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/util.c"), UTIL_C).unwrap();
    std::fs::write(dir.path().join("src/main.c"), MAIN_C).unwrap();
    std::fs::write(dir.path().join("symbols.jsonl"), SYMBOLS).unwrap();
    std::fs::write(dir.path().join("references.jsonl"), REFERENCES).unwrap();
    dir
}

fn strata(dir: &Path, args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to execute strata");
    assert!(
        output.status.success(),
        "strata {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn run_pipeline(dir: &Path) {
    strata(dir, &["import", "symbols.jsonl", "--references", "references.jsonl"]);
    strata(dir, &["bounds"]);
    strata(dir, &["resolve"]);
    strata(dir, &["plan", "--output", "batches.json"]);
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let dir = TempDir::new().unwrap();
    let output = strata(dir.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("strata"));
    assert!(stdout.contains("batch planning"));
}

#[test]
fn test_pipeline_resolves_spans() {
    let dir = fixture();
    run_pipeline(dir.path());

    let store = Store::open(&dir.path().join("strata.db")).unwrap();
    let clamp = store.get_symbol(SymbolId(1)).unwrap();
    assert_eq!((clamp.start_line, clamp.end_line), (3, 7));
    assert_eq!(clamp.kind, Some(SymbolKind::Function));

    let limit = store.get_symbol(SymbolId(3)).unwrap();
    assert_eq!((limit.start_line, limit.end_line), (3, 3));
    assert_eq!(limit.kind, Some(SymbolKind::Variable));

    let main = store.get_symbol(SymbolId(4)).unwrap();
    assert_eq!((main.start_line, main.end_line), (5, 8));
}

#[test]
fn test_pipeline_exports_ordered_batches() {
    let dir = fixture();
    run_pipeline(dir.path());

    let json = std::fs::read_to_string(dir.path().join("batches.json")).unwrap();
    let batches: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        batches,
        serde_json::json!([
            {"batch_id": 1, "type": "file", "layer": 0, "member_ids": [4, 3], "estimated_cost": 6000},
            {"batch_id": 2, "type": "file", "layer": 1, "member_ids": [1, 2], "estimated_cost": 6000}
        ])
    );

    let store = Store::open(&dir.path().join("strata.db")).unwrap();
    assert_eq!(store.assignment(SymbolId(1)).unwrap().unwrap().layer, 2);
    assert_eq!(store.assignment(SymbolId(4)).unwrap().unwrap().layer, 0);
}

#[test]
fn test_show_and_stats() {
    let dir = fixture();
    run_pipeline(dir.path());

    let output = strata(dir.path(), &["show", "clamp"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Source: src/util.c:3-7\n/* Clamp v into [lo, hi]. */"));
    assert!(stdout.contains("src/util.c:11  twice"));

    let output = strata(dir.path(), &["stats"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("symbols:      4 (0 unclassified)"));
    assert!(stdout.contains("planned:      4 symbols, 3 layers, 2 clusters"));
}

#[test]
fn test_missing_source_file_is_skipped() {
    let dir = fixture();
    std::fs::remove_file(dir.path().join("src/main.c")).unwrap();
    strata(dir.path(), &["import", "symbols.jsonl"]);
    let output = strata(dir.path(), &["resolve"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("resolved 2, missing file 2, out of range 0"));

    let store = Store::open(&dir.path().join("strata.db")).unwrap();
    let main = store.get_symbol(SymbolId(4)).unwrap();
    assert_eq!((main.start_line, main.kind), (5, None));
}

#[test]
fn test_config_file_narrows_scope() {
    let dir = fixture();
    std::fs::write(
        dir.path().join("strata.toml"),
        "[scope]\nkinds = [\"function\"]\n\n[cluster]\ncost_per_symbol = 10\n",
    )
    .unwrap();
    run_pipeline(dir.path());

    let store = Store::open(&dir.path().join("strata.db")).unwrap();
    assert!(store.assignment(SymbolId(3)).unwrap().is_none());
    let batches = store.load_batches().unwrap();
    let members: usize = batches.iter().map(|b| b.member_ids.len()).sum();
    assert_eq!(members, 3);
    assert!(batches.iter().all(|b| b.estimated_cost == b.member_ids.len() as u64 * 10));
}

#[test]
fn test_failed_import_leaves_store_intact() {
    let dir = fixture();
    run_pipeline(dir.path());
    std::fs::write(
        dir.path().join("dup.jsonl"),
        "{\"id\": 7, \"name\": \"a\", \"file_path\": \"src/a.c\", \"start_line\": 1}\n\
         {\"id\": 7, \"name\": \"b\", \"file_path\": \"src/a.c\", \"start_line\": 4}\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["import", "dup.jsonl"])
        .current_dir(dir.path())
        .output()
        .expect("Failed to execute strata");
    assert!(!output.status.success());

    let store = Store::open(&dir.path().join("strata.db")).unwrap();
    let stats = store.stats().unwrap();
    assert_eq!((stats.symbols, stats.references, stats.assigned), (4, 3, 4));
}

#[test]
fn test_show_by_location_and_pattern() {
    let dir = fixture();
    run_pipeline(dir.path());

    let output = strata(dir.path(), &["show", "src/util.c:5"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("clamp (function)"));

    let output = strata(dir.path(), &["show", "%a%"]);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "clamp\nmain\n");
}
