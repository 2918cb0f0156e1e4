// Tests for crawl orchestration

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wikigap_core::analysis::AnalysisOptions;
use wikigap_core::config::Settings;
use wikigap_core::crawl::{
    CrawlOptions, execute_analysis, execute_crawl, extract_url_path, generate_crawl_report,
};
use wikigap_scanner::{LengthMode, VisitPolicy};

const EN_A: &str = "https://en.wikipedia.org/wiki/A";
const EN_B: &str = "https://en.wikipedia.org/wiki/B";
const EN_C: &str = "https://en.wikipedia.org/wiki/C";
const DE_A: &str = "https://de.wikipedia.org/wiki/A_de";

fn page(text: &str, links: &[&str], editions: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}"></a>"#, l))
        .collect();
    let languages: String = editions
        .iter()
        .map(|e| format!(r#"<li><a href="{}">x</a></li>"#, e))
        .collect();
    format!(
        r#"<html><body><div id="content"><p>{}</p>{}</div><nav id="p-lang"><ul>{}</ul></nav></body></html>"#,
        text, anchors, languages
    )
}

/// A -> B, A -> C, B -> C. C is missing from the snapshot.
fn write_snapshot(dir: &TempDir) -> PathBuf {
    let mut pages = HashMap::new();
    pages.insert(
        EN_A,
        page(&"a".repeat(300), &["/wiki/B", "/wiki/C", "/wiki/Help:Contents"], &[DE_A]),
    );
    pages.insert(EN_B, page(&"b".repeat(100), &["/wiki/C"], &[]));
    pages.insert(DE_A, page(&"a".repeat(100), &[], &[]));

    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, serde_json::to_string(&pages).unwrap()).unwrap();
    path
}

fn options(snapshot: PathBuf, max_depth: usize) -> CrawlOptions {
    CrawlOptions {
        seed: EN_A.to_string(),
        max_depth,
        workers: 2,
        policy: VisitPolicy::OnDiscovery,
        snapshot: Some(snapshot),
        show_progress_bars: false,
    }
}

// ============================================================================
// URL Path Extraction Tests
// ============================================================================

#[test]
fn test_extract_url_path_article() {
    assert_eq!(extract_url_path(EN_A), "/wiki/A");
}

#[test]
fn test_extract_url_path_root() {
    assert_eq!(extract_url_path("https://en.wikipedia.org"), "/");
    assert_eq!(extract_url_path("https://en.wikipedia.org/"), "/");
}

#[test]
fn test_extract_url_path_drops_fragment_and_query() {
    assert_eq!(
        extract_url_path("https://en.wikipedia.org/wiki/A?action=raw#History"),
        "/wiki/A"
    );
}

#[test]
fn test_extract_url_path_invalid_url() {
    let url = "not a valid url";
    assert_eq!(extract_url_path(url), url);
}

// ============================================================================
// Orchestration Tests
// ============================================================================

#[tokio::test]
async fn test_crawl_from_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(&dir);

    let survey = execute_crawl(&Settings::default(), options(snapshot, 2), None)
        .await
        .unwrap();
    let outcome = survey.outcome().unwrap();

    assert_eq!(outcome.graph.node_count(), 3);
    assert_eq!(outcome.graph.edge_count(), 3);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].url, EN_C);
    assert!(!outcome.interrupted);
}

#[tokio::test]
async fn test_crawl_reports_progress() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(&dir);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();

    execute_crawl(
        &Settings::default(),
        options(snapshot, 1),
        Some(Arc::new(move |url: String| {
            seen_clone.lock().unwrap().push(url);
        })),
    )
    .await
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![EN_A.to_string()]);
}

#[tokio::test]
async fn test_crawl_rejects_foreign_seed() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(&dir);
    let mut opts = options(snapshot, 1);
    opts.seed = "https://example.com/wiki/A".to_string();

    assert!(execute_crawl(&Settings::default(), opts, None).await.is_err());
}

#[tokio::test]
async fn test_crawl_missing_snapshot_file() {
    let dir = TempDir::new().unwrap();
    let opts = options(dir.path().join("absent.json"), 1);

    assert!(execute_crawl(&Settings::default(), opts, None).await.is_err());
}

#[tokio::test]
async fn test_crawl_then_analyze() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(&dir);
    let mut survey = execute_crawl(&Settings::default(), options(snapshot, 1), None)
        .await
        .unwrap();

    let analysis = AnalysisOptions::new("en").with_mode(LengthMode::Raw);
    let report = execute_analysis(&mut survey, &analysis, false).await.unwrap();

    let a = report.findings(EN_A).unwrap();
    assert_eq!(a.short, vec!["de"]);
    assert!(a.missing.is_empty());
    assert_eq!(report.table.get(EN_A, "de"), Some(100));
}

#[tokio::test]
async fn test_crawl_report_lists_top_articles() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(&dir);
    let survey = execute_crawl(&Settings::default(), options(snapshot, 2), None)
        .await
        .unwrap();

    let report = generate_crawl_report(survey.outcome().unwrap(), 10);
    assert!(report.contains("Articles found: 3"));
    assert!(report.contains("Links recorded: 3"));
    assert!(report.contains("Failed pages: 1"));
    assert!(report.contains("Top 10 by in-degree"));
    assert!(report.contains("/wiki/C"));
    assert!(!report.contains("interrupted"));
}
