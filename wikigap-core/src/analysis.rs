use crate::table::LanguageLengthTable;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use url::Url;
use wikigap_scanner::error::Result;
use wikigap_scanner::{ArticleRef, LengthMode, LinkGraph, PageSource, SiteFamily, measure};

/// An edition shorter than this fraction of the reference edition is "short".
pub const SHORT_RATIO: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub reference_language: String,
    pub top_n: Option<usize>,
    pub language_filter: Option<HashSet<String>>,
    pub mode: LengthMode,
}

impl AnalysisOptions {
    pub fn new(reference_language: impl Into<String>) -> Self {
        Self {
            reference_language: reference_language.into(),
            top_n: None,
            language_filter: None,
            mode: LengthMode::Compressed,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    pub fn with_language_filter<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.language_filter = Some(languages.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_mode(mut self, mode: LengthMode) -> Self {
        self.mode = mode;
        self
    }

    /// The reference language always passes the filter.
    fn admits(&self, language: &str) -> bool {
        language == self.reference_language
            || self
                .language_filter
                .as_ref()
                .is_none_or(|filter| filter.contains(language))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleFindings {
    pub url: String,
    pub in_degree: usize,
    pub missing: Vec<String>,
    pub short: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletenessReport {
    pub reference_language: String,
    pub mode: LengthMode,
    /// In rank order.
    pub articles: Vec<ArticleFindings>,
    /// Rows without a reference-language length; no "short" verdict possible.
    pub unreferenced: Vec<String>,
    pub table: LanguageLengthTable,
}

impl CompletenessReport {
    pub fn missing_map(&self) -> BTreeMap<String, Vec<String>> {
        self.articles
            .iter()
            .map(|a| (a.url.clone(), a.missing.clone()))
            .collect()
    }

    pub fn short_map(&self) -> BTreeMap<String, Vec<String>> {
        self.articles
            .iter()
            .map(|a| (a.url.clone(), a.short.clone()))
            .collect()
    }

    pub fn findings(&self, url: &str) -> Option<&ArticleFindings> {
        self.articles.iter().find(|a| a.url == url)
    }
}

/// Nodes sorted by in-degree, highest first. Equal in-degrees keep the
/// graph's insertion order.
pub fn rank_by_in_degree(graph: &LinkGraph) -> Vec<(ArticleRef, usize)> {
    let mut ranked: Vec<(ArticleRef, usize)> = graph
        .in_degrees()
        .into_iter()
        .map(|(article, degree)| (article.clone(), degree))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Sorts a row's cells into missing and short languages.
pub fn classify(
    table: &LanguageLengthTable,
    url: &str,
    reference_language: &str,
) -> (Vec<String>, Vec<String>) {
    let mut missing = Vec::new();
    let mut short = Vec::new();
    for language in table.languages() {
        if table.get(url, language).is_none() {
            missing.push(language.clone());
        } else if table
            .ratio(url, language, reference_language)
            .is_some_and(|ratio| ratio < SHORT_RATIO)
        {
            short.push(language.clone());
        }
    }
    (missing, short)
}

struct RowPlan {
    url: String,
    in_degree: usize,
    cells: Vec<(String, String)>,
}

pub struct CompletenessAnalyzer {
    source: Arc<dyn PageSource>,
    site: SiteFamily,
    workers: usize,
    lengths: Mutex<HashMap<(String, LengthMode), u64>>,
}

impl CompletenessAnalyzer {
    pub fn new(source: Arc<dyn PageSource>, site: SiteFamily) -> Self {
        Self {
            source,
            site,
            workers: 10,
            lengths: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub async fn analyze(
        &self,
        graph: &LinkGraph,
        options: &AnalysisOptions,
    ) -> Result<CompletenessReport> {
        let mut ranked = rank_by_in_degree(graph);
        if let Some(top_n) = options.top_n {
            ranked.truncate(top_n);
        }
        info!(
            "Analysing {} articles against '{}' ({} lengths)",
            ranked.len(),
            options.reference_language,
            options.mode.as_str()
        );

        let mut plans = Vec::with_capacity(ranked.len());
        for (article, in_degree) in ranked {
            plans.push(self.plan_row(article, in_degree, options).await);
        }

        let mut pending: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for plan in &plans {
            for (_, url) in &plan.cells {
                if seen.insert(url.clone()) && self.cached(url, options.mode).is_none() {
                    pending.push(url.clone());
                }
            }
        }
        self.measure_all(pending, options.mode).await;

        let mut table = LanguageLengthTable::new(options.mode);
        for plan in &plans {
            let cells: Vec<(String, Option<u64>)> = plan
                .cells
                .iter()
                .map(|(language, url)| (language.clone(), self.cached(url, options.mode)))
                .collect();
            table.push_row(&plan.url, cells);
        }
        table.ensure_language(&options.reference_language);

        let mut articles = Vec::with_capacity(plans.len());
        let mut unreferenced = Vec::new();
        for plan in &plans {
            if table.get(&plan.url, &options.reference_language).is_none() {
                unreferenced.push(plan.url.clone());
            }
            let (missing, short) = classify(&table, &plan.url, &options.reference_language);
            articles.push(ArticleFindings {
                url: plan.url.clone(),
                in_degree: plan.in_degree,
                missing,
                short,
            });
        }

        Ok(CompletenessReport {
            reference_language: options.reference_language.clone(),
            mode: options.mode,
            articles,
            unreferenced,
            table,
        })
    }

    /// Lists `(language, edition url)` for one ranked node, its own edition first.
    async fn plan_row(
        &self,
        article: ArticleRef,
        in_degree: usize,
        options: &AnalysisOptions,
    ) -> RowPlan {
        let mut cells = vec![(article.language_code().to_string(), article.url().to_string())];

        match self.source.fetch(article.url()).await {
            Ok(doc) => {
                self.store(article.url(), options.mode, measure(&doc, options.mode));
                for href in doc.language_editions() {
                    let Some(edition) = self.resolve_edition(&article, href) else {
                        continue;
                    };
                    let language = edition.language_code().to_string();
                    if !options.admits(&language) {
                        debug!("Filtered out {} edition of {}", language, article);
                        continue;
                    }
                    if cells.iter().any(|(l, _)| *l == language) {
                        continue;
                    }
                    cells.push((language, edition.url().to_string()));
                }
            }
            Err(e) => warn!("Could not read language editions of {}: {}", article, e),
        }

        RowPlan {
            url: article.url().to_string(),
            in_degree,
            cells,
        }
    }

    fn resolve_edition(&self, article: &ArticleRef, href: &str) -> Option<ArticleRef> {
        let absolute = Url::parse(article.url())
            .and_then(|base| base.join(href))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string());
        match ArticleRef::parse(&absolute, &self.site) {
            Ok(edition) => Some(edition),
            Err(e) => {
                warn!("Skipping language edition {}: {}", href, e);
                None
            }
        }
    }

    async fn measure_all(&self, urls: Vec<String>, mode: LengthMode) {
        let source = &self.source;
        let results: Vec<(String, Result<u64>)> = stream::iter(urls)
            .map(|url| async move {
                let length = source.fetch(&url).await.map(|doc| measure(&doc, mode));
                (url, length)
            })
            .buffered(self.workers)
            .collect()
            .await;

        for (url, length) in results {
            match length {
                Ok(length) => self.store(&url, mode, length),
                Err(e) => warn!("Could not measure {}: {}", url, e),
            }
        }
    }

    fn cached(&self, url: &str, mode: LengthMode) -> Option<u64> {
        self.lengths
            .lock()
            .ok()
            .and_then(|lengths| lengths.get(&(url.to_string(), mode)).copied())
    }

    fn store(&self, url: &str, mode: LengthMode, length: u64) {
        if let Ok(mut lengths) = self.lengths.lock() {
            lengths.insert((url.to_string(), mode), length);
        }
    }
}
