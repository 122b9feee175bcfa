//! Emitter output tests, written through real files.

use std::fs::{self, File};
use std::path::Path;

use tempfile::TempDir;

use scanreport_core::{
    CategoryBreakdown, CategoryBucket, ChildBucket, IndexPath, NodeReport, NodeWarning, ScanId,
};
use scanreport_render::{Detail, OutputFormat, ReportEmitter, emitter_for};

fn breakdown(entries: &[(&str, u64, u64)]) -> CategoryBreakdown {
    entries
        .iter()
        .map(|&(label, count, size)| (label, CategoryBucket::new(count, size)))
        .collect()
}

fn report(path: &str) -> NodeReport {
    NodeReport {
        path: IndexPath::new(path),
        total_size: 1000,
        total_count: 12,
        children: vec![
            ChildBucket::new("y", 4, 500, 4, 3),
            ChildBucket::new("x", 5, 400, 5, 9),
            ChildBucket::new("empty", 1, 0, 1, 0),
            ChildBucket::unindexed(1, 100),
        ],
        users: breakdown(&[("bob", 6, 400), ("alice", 6, 600)]),
        filetypes: breakdown(&[("txt", 10, 900), ("log", 2, 100)]),
        heat: breakdown(&[("7-30d", 8, 900), ("0-7d", 4, 100)]),
        scan_id: ScanId::new("s1"),
        warnings: Vec::new(),
    }
}

fn render(dir: &Path, format: OutputFormat, detail: Detail, reports: &[NodeReport]) -> String {
    let path = dir.join("report.out");
    let mut emitter = emitter_for(format, detail, File::create(&path).unwrap());
    for report in reports {
        emitter.emit(report).unwrap();
    }
    emitter.finish().unwrap();
    drop(emitter);
    fs::read_to_string(&path).unwrap()
}

fn line_index(text: &str, prefix: &str) -> usize {
    text.lines()
        .position(|l| l.starts_with(prefix))
        .unwrap_or_else(|| panic!("no line starting with {prefix:?}"))
}

#[test]
fn test_pages_one_page_per_node() {
    let dir = TempDir::new().unwrap();
    let text = render(
        dir.path(),
        OutputFormat::Pages,
        Detail::Full,
        &[report("/data"), report("/data/x")],
    );

    assert_eq!(text.matches('\x0c').count(), 1);
    assert!(text.starts_with("/data\n"));
    assert!(text.contains("Top level"));
    assert!(text.contains("Filetypes"));
    assert!(text.contains("Heat"));
}

#[test]
fn test_pages_children_by_size_without_empty() {
    let dir = TempDir::new().unwrap();
    let text = render(dir.path(), OutputFormat::Pages, Detail::Full, &[report("/data")]);

    let placeholder = line_index(&text, "__unindexed_children__");
    let x = line_index(&text, "x ");
    let y = line_index(&text, "y ");
    assert!(placeholder < x && x < y);
    assert!(!text.lines().any(|l| l.starts_with("empty")));

    let bob = line_index(&text, "bob ");
    let alice = line_index(&text, "alice ");
    assert!(bob < alice);
}

#[test]
fn test_pages_brief() {
    let dir = TempDir::new().unwrap();
    let text = render(dir.path(), OutputFormat::Pages, Detail::Brief, &[report("/data")]);

    assert!(!text.contains("Top level"));
    assert!(!text.contains("Filetypes"));
    assert!(text.contains("Children"));
    assert!(text.contains("Users"));
    assert!(text.contains("Heat"));
}

#[test]
fn test_csv_full_blocks() {
    let dir = TempDir::new().unwrap();
    let text = render(dir.path(), OutputFormat::Csv, Detail::Full, &[report("/data")]);

    assert!(text.starts_with("Top level\npath,total_size,total_count,scan_id\n/data,"));
    assert!(text.contains("\nFiletype\nextension,size,count\n"));
    assert!(text.contains("\nHeat (Last access time using atime)\nrange,size,count\n0-7d,"));

    // Children by name: the placeholder sorts before lowercase names.
    let placeholder = line_index(&text, "__unindexed_children__,");
    let x = line_index(&text, "x,");
    let y = line_index(&text, "y,");
    assert!(placeholder < x && x < y);
    assert!(!text.contains("empty,"));

    // Users by label, filetypes by size.
    assert!(line_index(&text, "alice,") < line_index(&text, "bob,"));
    assert!(line_index(&text, "log,") < line_index(&text, "txt,"));
}

#[test]
fn test_csv_brief_blocks() {
    let dir = TempDir::new().unwrap();
    let text = render(
        dir.path(),
        OutputFormat::Csv,
        Detail::Brief,
        &[report("/data"), report("/data/x")],
    );

    assert!(text.starts_with("At level /data\nChildren\npath,size,count\n"));
    assert!(text.contains("At level /data/x\n"));
    assert!(!text.contains("Top level"));
    assert!(!text.contains("Filetype"));
    assert_eq!(text.matches("Users\n").count(), 2);
}

#[test]
fn test_json_lines() {
    let dir = TempDir::new().unwrap();
    let text = render(
        dir.path(),
        OutputFormat::Json,
        Detail::Brief,
        &[report("/data"), report("/data/x")],
    );

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let second: NodeReport = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second, report("/data/x"));
}

#[test]
fn test_warnings_are_rendered() {
    let dir = TempDir::new().unwrap();
    let mut flagged = report("/data");
    flagged.warnings.push(NodeWarning::missing_totals(&flagged.path));

    let pages = render(dir.path(), OutputFormat::Pages, Detail::Full, &[flagged.clone()]);
    assert!(pages.contains("Warnings"));
    assert!(pages.contains("subtree totals missing"));

    let csv = render(dir.path(), OutputFormat::Csv, Detail::Full, &[flagged]);
    assert!(csv.contains("Warnings\nkind,message\nMissingTotals,"));
}
