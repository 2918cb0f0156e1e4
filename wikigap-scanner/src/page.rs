use crate::error::ScanError;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

static CONTENT_SELECTORS: LazyLock<[Selector; 2]> = LazyLock::new(|| {
    [
        Selector::parse("div#content").expect("static selector"),
        Selector::parse("main#content").expect("static selector"),
    ]
});
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));
static LANGUAGE_NAV_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("nav#p-lang").expect("static selector"));
static LANGUAGE_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li a[href]").expect("static selector"));

/// Parent elements whose text never renders.
const INVISIBLE_PARENTS: [&str; 5] = ["style", "script", "head", "title", "meta"];

/// A fetched article page, reduced to the parts the crawler and the
/// analyzer query. Parsing happens once; the parsed tree is not kept.
#[derive(Debug, Clone, Default)]
pub struct Document {
    url: String,
    article_links: Vec<String>,
    all_links: Vec<String>,
    language_editions: Vec<String>,
    visible_text: String,
    has_content: bool,
    has_language_nav: bool,
}

impl Document {
    pub fn parse(url: &str, html: &str) -> Self {
        let tree = Html::parse_document(html);

        let all_links = hrefs(tree.root_element());

        let content = CONTENT_SELECTORS
            .iter()
            .find_map(|selector| tree.select(selector).next());
        let (article_links, visible_text) = match content {
            Some(content) => (hrefs(content), visible_text(content)),
            None => {
                debug!(
                    "{}",
                    ScanError::Structure {
                        url: url.to_string(),
                        region: "article content".to_string(),
                    }
                );
                (Vec::new(), String::new())
            }
        };

        let language_nav = tree.select(&LANGUAGE_NAV_SELECTOR).next();
        let language_editions = match language_nav {
            Some(nav) => nav
                .select(&LANGUAGE_LINK_SELECTOR)
                .filter_map(|a| a.value().attr("href"))
                .map(str::to_string)
                .collect(),
            None => {
                debug!(
                    "{}",
                    ScanError::Structure {
                        url: url.to_string(),
                        region: "language navigation".to_string(),
                    }
                );
                Vec::new()
            }
        };

        Self {
            url: url.to_string(),
            article_links,
            all_links,
            language_editions,
            visible_text,
            has_content: content.is_some(),
            has_language_nav: language_nav.is_some(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw `href` targets inside the article body, in document order.
    pub fn article_links(&self) -> &[String] {
        &self.article_links
    }

    /// Raw `href` targets anywhere in the page.
    pub fn all_links(&self) -> &[String] {
        &self.all_links
    }

    /// Raw `href` targets of the "other languages" navigation block.
    pub fn language_editions(&self) -> &[String] {
        &self.language_editions
    }

    pub fn visible_text(&self) -> &str {
        &self.visible_text
    }

    pub fn has_content(&self) -> bool {
        self.has_content
    }

    pub fn has_language_nav(&self) -> bool {
        self.has_language_nav
    }
}

fn hrefs(scope: ElementRef<'_>) -> Vec<String> {
    scope
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

fn visible_text(scope: ElementRef<'_>) -> String {
    let mut fragments = Vec::new();
    for node in scope.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.parent().is_some_and(|parent| {
            parent
                .value()
                .as_element()
                .is_some_and(|el| INVISIBLE_PARENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            fragments.push(trimmed);
        }
    }
    fragments.join(" ")
}
