use crate::analysis::{AnalysisOptions, CompletenessAnalyzer, CompletenessReport, rank_by_in_degree};
use crate::config::Settings;
use crate::survey::Survey;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;
use wikigap_scanner::error::Result;
use wikigap_scanner::{
    BuildOutcome, CachingPageSource, GraphBuilder, HttpPageSource, MemoryPageSource, PageSource,
    VisitPolicy,
};

/// Options for configuring a graph build
pub struct CrawlOptions {
    pub seed: String,
    pub max_depth: usize,
    pub workers: usize,
    pub policy: VisitPolicy,
    /// Read pages from a JSON snapshot instead of the network
    pub snapshot: Option<PathBuf>,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Network or snapshot source, wrapped so every page is fetched at most once.
pub fn open_page_source(settings: &Settings, snapshot: Option<&PathBuf>) -> Result<Arc<dyn PageSource>> {
    let inner: Arc<dyn PageSource> = match snapshot {
        Some(path) => Arc::new(MemoryPageSource::from_json_file(path)?),
        None => Arc::new(HttpPageSource::with_timeout(
            settings.timeout_secs,
            &settings.user_agent,
        )?),
    };
    Ok(Arc::new(CachingPageSource::new(inner)))
}

fn spinner(show: bool, message: &str) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    Some(pb)
}

/// Set up a survey for `options.seed` and build its graph.
pub async fn execute_crawl(
    settings: &Settings,
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<Survey> {
    let CrawlOptions {
        seed,
        max_depth,
        workers,
        policy,
        snapshot,
        show_progress_bars,
    } = options;

    let site = settings.site_family();
    let seed = site.article(&seed)?;
    let source = open_page_source(settings, snapshot.as_ref())?;

    let progress_bar = spinner(show_progress_bars, "Starting crawl...").map(Arc::new);
    let processed_count = Arc::new(AtomicUsize::new(0));

    let pb_clone = progress_bar.clone();
    let count_clone = processed_count.clone();
    let report_progress = progress_callback.clone();
    let mut builder = GraphBuilder::new(source.clone(), settings.link_extractor())
        .with_max_depth(max_depth)
        .with_workers(workers)
        .with_visit_policy(policy)
        .with_fetch_timeout(Duration::from_secs(settings.timeout_secs.max(1)))
        .with_progress_callback(Arc::new(move |depth: usize, url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!(
                    "Crawling... {} pages fetched (depth {} left) {}",
                    count,
                    depth,
                    extract_url_path(&url)
                ));
            }
            if let Some(ref callback) = report_progress {
                callback(url);
            }
        }));
    if settings.deadline_secs > 0 {
        builder = builder.with_deadline(Duration::from_secs(settings.deadline_secs));
    }

    // Ctrl-C stops the build; whatever was collected so far is kept
    let cancel = builder.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let analyzer = CompletenessAnalyzer::new(source, site).with_workers(workers);
    let mut survey = Survey::new(seed, builder, analyzer);
    let built = survey.build().await;
    interrupt.abort();
    built?;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} pages fetched", total));
    }

    Ok(survey)
}

/// Run the completeness analysis on an already built survey.
pub async fn execute_analysis(
    survey: &mut Survey,
    options: &AnalysisOptions,
    show_progress_bars: bool,
) -> Result<CompletenessReport> {
    let progress_bar = spinner(show_progress_bars, "Measuring language editions...");
    let report = survey.analyze(options).await?.clone();
    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!(
            "Analysis complete! {} articles, {} languages",
            report.articles.len(),
            report.table.languages().len()
        ));
    }
    Ok(report)
}

/// Generate a crawl report from a build outcome
pub fn generate_crawl_report(outcome: &BuildOutcome, top: usize) -> String {
    let graph = &outcome.graph;

    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Seed: {}\n", graph.seed()));
    report.push_str(&format!("  Articles found: {}\n", graph.node_count()));
    report.push_str(&format!("  Links recorded: {}\n", graph.edge_count()));
    report.push_str(&format!("  Pages fetched: {}\n", outcome.fetches));
    report.push_str(&format!("  Failed pages: {}\n", outcome.failures.len()));
    if outcome.interrupted {
        report.push_str("  \x1b[33mBuild interrupted, graph is partial\x1b[0m\n");
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Group articles by language edition
    let mut by_language: BTreeMap<&str, usize> = BTreeMap::new();
    for article in graph.nodes() {
        *by_language.entry(article.language_code()).or_default() += 1;
    }
    for (language, count) in &by_language {
        report.push_str(&format!("## {}\n  {} articles\n", language, count));
    }

    report.push_str(&format!("\n## Top {} by in-degree\n", top));
    for (article, degree) in rank_by_in_degree(graph).into_iter().take(top) {
        report.push_str(&format!(
            "  \x1b[32m{:>4}\x1b[0m {}\n",
            degree,
            extract_url_path(article.url())
        ));
    }

    if !outcome.failures.is_empty() {
        report.push_str("\n## Failed pages\n");
        for failure in &outcome.failures {
            report.push_str(&format!(
                "  \x1b[31m{}\x1b[0m \x1b[90m{}\x1b[0m\n",
                extract_url_path(&failure.url),
                failure.error
            ));
        }
    }

    report
}
