use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub const DEFAULT_SCHEME: &str = "https://";
pub const DEFAULT_SITE_SUFFIX: &str = ".wikipedia.org";

/// The encyclopedia family an article must belong to: every language edition
/// lives at `<scheme><language><site_suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteFamily {
    pub scheme: String,
    pub site_suffix: String,
}

impl Default for SiteFamily {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            site_suffix: DEFAULT_SITE_SUFFIX.to_string(),
        }
    }
}

impl SiteFamily {
    pub fn new(scheme: impl Into<String>, site_suffix: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            site_suffix: site_suffix.into(),
        }
    }

    /// Root site URL (scheme and host up to the suffix) of `url`.
    pub fn root_url<'a>(&self, url: &'a str) -> Result<&'a str> {
        url.find(&self.site_suffix)
            .map(|idx| &url[..idx + self.site_suffix.len()])
            .ok_or_else(|| {
                ScanError::Validation(format!(
                    "root url of {} could not be determined (no '{}')",
                    url, self.site_suffix
                ))
            })
    }

    pub fn article(&self, url: &str) -> Result<ArticleRef> {
        ArticleRef::parse(url, self)
    }
}

/// One encyclopedia article, identified by its fragment-stripped URL.
#[derive(Clone)]
pub struct ArticleRef {
    url: Arc<str>,
    lang_start: usize,
    lang_end: usize,
    root_end: usize,
}

impl ArticleRef {
    pub fn parse(url: &str, site: &SiteFamily) -> Result<Self> {
        let mut problems = Vec::new();
        if !url.starts_with(&site.scheme) {
            problems.push(format!("make sure it starts with {}", site.scheme));
        }
        if !url.contains(&site.site_suffix) {
            problems.push(format!("make sure it contains {}", site.site_suffix));
        }
        if !problems.is_empty() {
            return Err(ScanError::Validation(format!(
                "malformatted url {}: {}",
                url,
                problems.join("; ")
            )));
        }

        let canonical = strip_fragment(url);
        let root = site.root_url(canonical)?;
        let lang_start = site.scheme.len();
        let lang_end = root.len() - site.site_suffix.len();
        if lang_end < lang_start {
            return Err(ScanError::Validation(format!(
                "malformatted url {}: site suffix overlaps the scheme",
                url
            )));
        }

        Ok(Self {
            url: Arc::from(canonical),
            lang_start,
            lang_end,
            root_end: root.len(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn root_url(&self) -> &str {
        &self.url[..self.root_end]
    }

    /// Subdomain in front of the site suffix, e.g. `de` for `https://de.wikipedia.org/...`.
    pub fn language_code(&self) -> &str {
        &self.url[self.lang_start..self.lang_end]
    }

    /// Path part after the root, e.g. `/wiki/Rust`.
    pub fn path(&self) -> &str {
        &self.url[self.root_end..]
    }
}

/// Drops everything from the last `#` on.
pub fn strip_fragment(url: &str) -> &str {
    match url.rfind('#') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

impl PartialEq for ArticleRef {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for ArticleRef {}

impl Hash for ArticleRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl fmt::Display for ArticleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl fmt::Debug for ArticleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArticleRef({})", self.url)
    }
}

impl Serialize for ArticleRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url)
    }
}
