use crate::article::{ArticleRef, SiteFamily, strip_fragment};
use crate::error::Result;
use crate::page::Document;
use tracing::debug;

pub const ARTICLE_PATH_PREFIX: &str = "/wiki/";
pub const IDENTIFIER_SUFFIX: &str = "(identifier)";

/// Prefixes under `/wiki/` that never hold encyclopedia articles. Entries
/// ending in `:` only match the namespace itself, so `Special_relativity`
/// survives while `Special:Random` does not.
pub const DEFAULT_EXCLUDED_NAMESPACES: [&str; 9] = [
    "Category",
    "Wikipedia",
    "Help",
    "File",
    "Wayback_Machine",
    "Template",
    "Portal",
    "Special:",
    "Talk:",
];

/// Turns raw anchor targets into article-to-article links.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    site: SiteFamily,
    excluded_prefixes: Vec<String>,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new(SiteFamily::default())
    }
}

impl LinkExtractor {
    pub fn new(site: SiteFamily) -> Self {
        Self::with_excluded_namespaces(site, DEFAULT_EXCLUDED_NAMESPACES)
    }

    pub fn with_excluded_namespaces<I, S>(site: SiteFamily, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded_prefixes = namespaces
            .into_iter()
            .map(|ns| format!("{}{}", ARTICLE_PATH_PREFIX, ns.as_ref()))
            .collect();
        Self {
            site,
            excluded_prefixes,
        }
    }

    pub fn site(&self) -> &SiteFamily {
        &self.site
    }

    /// Article links of `document`'s body, resolved against the document's own root.
    pub fn extract(&self, document: &Document) -> Result<Vec<ArticleRef>> {
        let root_url = self.site.root_url(document.url())?;
        Ok(self.filter_targets(root_url, document.article_links().iter().map(String::as_str)))
    }

    pub fn filter_targets<'a, I>(&self, root_url: &str, targets: I) -> Vec<ArticleRef>
    where
        I: IntoIterator<Item = &'a str>,
    {
        targets
            .into_iter()
            .filter(|target| self.is_article_target(target))
            .filter_map(|target| {
                let absolute = format!("{}{}", root_url, strip_fragment(target));
                match ArticleRef::parse(&absolute, &self.site) {
                    Ok(article) => Some(article),
                    Err(e) => {
                        debug!("Dropping link {}: {}", target, e);
                        None
                    }
                }
            })
            .collect()
    }

    pub fn is_article_target(&self, target: &str) -> bool {
        !target.is_empty()
            && target.starts_with(ARTICLE_PATH_PREFIX)
            && !target.ends_with(IDENTIFIER_SUFFIX)
            && !self
                .excluded_prefixes
                .iter()
                .any(|prefix| target.starts_with(prefix.as_str()))
    }
}
