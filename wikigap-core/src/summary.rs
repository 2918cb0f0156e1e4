use serde::Serialize;
use std::fmt;
use wikigap_scanner::error::Result;
use wikigap_scanner::{ArticleRef, LengthMode, LinkExtractor, PageSource, measure};

/// Quick facts about a single article page.
#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub url: String,
    pub root_url: String,
    pub language_code: String,
    pub length: u64,
    pub compressed_length: u64,
    pub article_links: usize,
    /// Other editions plus this one.
    pub languages_available: usize,
}

impl PageSummary {
    pub async fn gather(
        source: &dyn PageSource,
        extractor: &LinkExtractor,
        article: &ArticleRef,
    ) -> Result<Self> {
        let doc = source.fetch(article.url()).await?;
        let links = extractor.extract(&doc)?;

        Ok(Self {
            url: article.url().to_string(),
            root_url: article.root_url().to_string(),
            language_code: article.language_code().to_string(),
            length: measure(&doc, LengthMode::Raw),
            compressed_length: measure(&doc, LengthMode::Compressed),
            article_links: links.len(),
            languages_available: doc.language_editions().len() + 1,
        })
    }
}

impl fmt::Display for PageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Page url: {}", self.url)?;
        writeln!(f, "Root url: {}", self.root_url)?;
        writeln!(f, "Language code: {}", self.language_code)?;
        writeln!(
            f,
            "Article length (compressed): {} ({})",
            self.length, self.compressed_length
        )?;
        writeln!(f, "# of article to article links: {}", self.article_links)?;
        write!(f, "# languages available: {}", self.languages_available)
    }
}
