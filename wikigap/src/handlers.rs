use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;
use wikigap_core::analysis::AnalysisOptions;
use wikigap_core::config::Settings;
use wikigap_core::crawl::{
    CrawlOptions, execute_analysis, execute_crawl, generate_crawl_report, open_page_source,
};
use wikigap_core::report::{ReportFormat, render};
use wikigap_core::summary::PageSummary;
use wikigap_scanner::{LengthMode, VisitPolicy};

// Helper functions for the handlers

/// Tilde-expand a `--config` value.
pub fn expand_config_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    debug!("Loading settings from {}", path.display());
    Settings::load_or_default(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))
}

/// Split `"de, fr,DE"` into `["de", "fr"]`.
pub fn parse_language_list(raw: &str) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    for language in raw.split(',').map(|l| l.trim().to_lowercase()) {
        if !language.is_empty() && !languages.contains(&language) {
            languages.push(language);
        }
    }
    languages
}

pub fn visit_policy(legacy: bool) -> VisitPolicy {
    if legacy {
        VisitPolicy::AfterExpansion
    } else {
        VisitPolicy::OnDiscovery
    }
}

pub fn analysis_options(
    settings: &Settings,
    reference: Option<&str>,
    top_n: Option<usize>,
    languages: Option<&str>,
    raw: bool,
) -> AnalysisOptions {
    let reference = reference.unwrap_or(&settings.reference_language);
    let mut options =
        AnalysisOptions::new(reference.to_lowercase()).with_mode(LengthMode::from_compressed(!raw));
    if let Some(top_n) = top_n {
        options = options.with_top_n(top_n);
    }
    if let Some(languages) = languages {
        options = options.with_language_filter(parse_language_list(languages));
    }
    options
}

/// Write `content` to `output`, or print it when no path was given.
pub fn write_output(content: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            wikigap_core::report::save_report(content, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Saved to {}", "✓".green().bold(), path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Writes the default settings to `path`. An existing file is only replaced
/// with `force`.
pub fn init_settings(path: &Path, force: bool) -> Result<Settings> {
    if path.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite it",
            path.display()
        );
    }
    let settings = Settings::default();
    settings
        .save(path)
        .with_context(|| format!("Failed to write settings to {}", path.display()))?;
    Ok(settings)
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn workers(args: &ArgMatches, settings: &Settings) -> usize {
    args.get_one::<usize>("threads")
        .copied()
        .unwrap_or(settings.workers)
}

pub fn handle_init(args: &ArgMatches, config_path: &Path) -> Result<()> {
    print_divider();
    println!("{}", "  WIKIGAP INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let force = args.get_flag("force");
    let settings = init_settings(config_path, force)?;

    println!(
        "{} Settings written to {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );
    println!(
        "{} Site family: {}*{}",
        "→".blue(),
        settings.scheme,
        settings.site_suffix
    );
    Ok(())
}

pub async fn handle_crawl(args: &ArgMatches, settings: &Settings, quiet: bool) -> Result<()> {
    let seed = args
        .get_one::<Url>("url")
        .context("--url is required")?
        .to_string();
    let max_depth = args.get_one::<usize>("depth").copied().unwrap_or(1);
    let policy = visit_policy(args.get_flag("legacy-visit"));
    let workers = workers(args, settings);

    if !quiet {
        println!("\n🕸️  Crawling {}", seed.bright_white());
        println!("Workers: {}", workers);
        println!("Max depth: {}", max_depth);
        println!("Visit policy: {:?}\n", policy);
    }

    let options = CrawlOptions {
        seed,
        max_depth,
        workers,
        policy,
        snapshot: args.get_one::<PathBuf>("snapshot").cloned(),
        show_progress_bars: !quiet,
    };
    let survey = execute_crawl(settings, options, None)
        .await
        .context("Crawl failed")?;
    let outcome = survey.outcome()?;

    print!("{}", generate_crawl_report(outcome, 10));

    if let Some(path) = args.get_one::<PathBuf>("output") {
        let json = serde_json::to_string_pretty(&outcome.graph.export())?;
        write_output(&json, Some(path))?;
    }
    Ok(())
}

pub async fn handle_analyze(args: &ArgMatches, settings: &Settings, quiet: bool) -> Result<()> {
    let seed = args
        .get_one::<Url>("url")
        .context("--url is required")?
        .to_string();
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let options = analysis_options(
        settings,
        args.get_one::<String>("reference").map(String::as_str),
        args.get_one::<usize>("top").copied(),
        args.get_one::<String>("languages").map(String::as_str),
        args.get_flag("raw"),
    );

    let crawl = CrawlOptions {
        seed,
        max_depth: args.get_one::<usize>("depth").copied().unwrap_or(1),
        workers: workers(args, settings),
        policy: visit_policy(args.get_flag("legacy-visit")),
        snapshot: args.get_one::<PathBuf>("snapshot").cloned(),
        show_progress_bars: !quiet,
    };
    let mut survey = execute_crawl(settings, crawl, None)
        .await
        .context("Crawl failed")?;
    let report = execute_analysis(&mut survey, &options, !quiet)
        .await
        .context("Analysis failed")?;

    let content = render(&report, format)?;
    write_output(&content, args.get_one::<PathBuf>("output"))
}

pub async fn handle_info(args: &ArgMatches, settings: &Settings) -> Result<()> {
    let url = args.get_one::<Url>("url").context("--url is required")?;
    let article = settings.site_family().article(url.as_str())?;
    let source = open_page_source(settings, args.get_one::<PathBuf>("snapshot"))?;

    let summary = PageSummary::gather(source.as_ref(), &settings.link_extractor(), &article)
        .await
        .with_context(|| format!("Failed to read {}", article))?;
    println!("{}", summary);
    Ok(())
}
