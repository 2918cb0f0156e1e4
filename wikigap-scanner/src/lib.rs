pub mod article;
pub mod builder;
pub mod error;
pub mod graph;
pub mod links;
pub mod measure;
pub mod page;
pub mod source;

pub use article::{ArticleRef, SiteFamily};
pub use builder::{BuildOutcome, FailedPage, GraphBuilder, ProgressCallback, VisitPolicy};
pub use error::ScanError;
pub use graph::{GraphExport, LinkGraph};
pub use links::LinkExtractor;
pub use measure::{LengthMode, measure};
pub use page::Document;
pub use source::{CachingPageSource, HttpPageSource, MemoryPageSource, PageSource};
