use crate::article::strip_fragment;
use crate::error::{Result, ScanError};
use crate::page::Document;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "wikigap/0.1 (https://github.com/trapdoorsec/wikigap)";

/// Anything that can turn an article URL into a parsed [`Document`].
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Arc<Document>>;
}

pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10, DEFAULT_USER_AGENT)
    }

    pub fn with_timeout(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<Arc<Document>> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let body = response.text().await?;
        debug!("Fetched {} ({} bytes in {:?})", url, body.len(), start.elapsed());

        Ok(Arc::new(Document::parse(url, &body)))
    }
}

/// Pages held in memory, keyed by fragment-stripped URL. Loaded from a JSON
/// snapshot (`{"<url>": "<html>"}`) for offline runs.
#[derive(Default)]
pub struct MemoryPageSource {
    pages: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl MemoryPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.insert(url, html);
        self
    }

    pub fn insert(&mut self, url: &str, html: impl Into<String>) {
        self.pages.insert(strip_fragment(url).to_string(), html.into());
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let pages: HashMap<String, String> = serde_json::from_str(&content)?;
        let mut source = Self::new();
        for (url, html) in pages {
            source.insert(&url, html);
        }
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Every URL requested so far, in request order, including misses.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PageSource for MemoryPageSource {
    async fn fetch(&self, url: &str) -> Result<Arc<Document>> {
        let key = strip_fragment(url);
        if let Ok(mut log) = self.fetched.lock() {
            log.push(key.to_string());
        }
        match self.pages.get(key) {
            Some(html) => Ok(Arc::new(Document::parse(key, html))),
            None => Err(ScanError::Fetch {
                url: url.to_string(),
                reason: "not present in snapshot".to_string(),
            }),
        }
    }
}

/// Fetch-once wrapper: the first successful fetch of a URL is kept for the
/// lifetime of the source. Failures are not cached.
pub struct CachingPageSource {
    inner: Arc<dyn PageSource>,
    documents: Mutex<HashMap<String, Arc<Document>>>,
}

impl CachingPageSource {
    pub fn new(inner: Arc<dyn PageSource>) -> Self {
        Self {
            inner,
            documents: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_count(&self) -> usize {
        self.documents.lock().map(|docs| docs.len()).unwrap_or(0)
    }

    fn cached(&self, key: &str) -> Option<Arc<Document>> {
        self.documents
            .lock()
            .ok()
            .and_then(|docs| docs.get(key).cloned())
    }
}

#[async_trait]
impl PageSource for CachingPageSource {
    async fn fetch(&self, url: &str) -> Result<Arc<Document>> {
        let key = strip_fragment(url);
        if let Some(doc) = self.cached(key) {
            debug!("Cache hit for {}", key);
            return Ok(doc);
        }

        let doc = self.inner.fetch(key).await?;
        if let Ok(mut docs) = self.documents.lock() {
            docs.entry(key.to_string()).or_insert_with(|| doc.clone());
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const ARTICLE: &str = r#"<html><body><div id="content">
        <p>Body <a href="/wiki/Other">other</a></p>
    </div></body></html>"#;

    #[tokio::test]
    async fn test_http_source_parses_document() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Article"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(ARTICLE.as_bytes()),
            )
            .mount(&mock_server)
            .await;

        let source = HttpPageSource::new().unwrap();
        let url = format!("{}/wiki/Article", mock_server.uri());
        let doc = source.fetch(&url).await.unwrap();

        assert_eq!(doc.url(), url);
        assert_eq!(doc.article_links(), ["/wiki/Other"]);
        assert_eq!(doc.visible_text(), "Body other");
    }

    #[tokio::test]
    async fn test_http_source_rejects_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let source = HttpPageSource::new().unwrap();
        let err = source
            .fetch(&format!("{}/wiki/Gone", mock_server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::Fetch { ref reason, .. } if reason == "HTTP 404"));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_http_source_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(ARTICLE.as_bytes())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let source = HttpPageSource::with_timeout(1, DEFAULT_USER_AGENT).unwrap();
        let result = source
            .fetch(&format!("{}/wiki/Slow", mock_server.uri()))
            .await;

        assert!(matches!(result, Err(ScanError::HttpError(_))));
    }

    #[tokio::test]
    async fn test_memory_source_strips_fragments() {
        let source = MemoryPageSource::new().with_page("https://en.wikipedia.org/wiki/A", ARTICLE);

        let doc = source
            .fetch("https://en.wikipedia.org/wiki/A#History")
            .await
            .unwrap();
        assert_eq!(doc.url(), "https://en.wikipedia.org/wiki/A");
        assert!(source.fetch("https://en.wikipedia.org/wiki/B").await.is_err());
        assert_eq!(
            source.fetched_urls(),
            vec![
                "https://en.wikipedia.org/wiki/A".to_string(),
                "https://en.wikipedia.org/wiki/B".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_memory_source_from_snapshot_file() {
        let mut file = NamedTempFile::new().unwrap();
        let snapshot = serde_json::json!({ "https://en.wikipedia.org/wiki/A": ARTICLE });
        write!(file, "{}", snapshot).unwrap();

        let source = MemoryPageSource::from_json_file(file.path()).unwrap();
        assert_eq!(source.len(), 1);
        assert!(source.fetch("https://en.wikipedia.org/wiki/A").await.is_ok());
    }

    #[tokio::test]
    async fn test_caching_source_fetches_once() {
        let memory = Arc::new(MemoryPageSource::new().with_page("https://en.wikipedia.org/wiki/A", ARTICLE));
        let cache = CachingPageSource::new(memory.clone());

        let first = cache.fetch("https://en.wikipedia.org/wiki/A").await.unwrap();
        let second = cache.fetch("https://en.wikipedia.org/wiki/A#top").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(memory.fetched_urls().len(), 1);
        assert_eq!(cache.cached_count(), 1);
    }

    #[tokio::test]
    async fn test_caching_source_does_not_cache_failures() {
        let memory = Arc::new(MemoryPageSource::new());
        let cache = CachingPageSource::new(memory.clone());

        assert!(cache.fetch("https://en.wikipedia.org/wiki/Missing").await.is_err());
        assert!(cache.fetch("https://en.wikipedia.org/wiki/Missing").await.is_err());
        assert_eq!(memory.fetched_urls().len(), 2);
        assert_eq!(cache.cached_count(), 0);
    }
}
