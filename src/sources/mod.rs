//! Remote search sources.
//!
//! A source answers exactly one question: "give me the page of results for
//! this query starting at this offset". Paging, date filtering and early
//! termination live in [`crate::utils::ResultStream`], which drives any
//! [`PageFetcher`].
//!
//! The only production source is [`ArxivClient`]; [`mock::MockFetcher`]
//! replays scripted pages for tests.

mod arxiv;
pub mod mock;

pub use arxiv::{parse_feed, ArxivClient, ARXIV_API_URL};
pub use mock::MockFetcher;

use async_trait::async_trait;

use crate::models::{FeedPage, SearchQuery};

/// Fetches single result pages from a search API.
///
/// Implementations perform one network call per invocation and never retry.
#[async_trait]
pub trait PageFetcher: Send + Sync + std::fmt::Debug {
    /// Short identifier used in log lines (e.g. "arxiv")
    fn id(&self) -> &str;

    /// Fetch `page_size` results of `query`, starting at result `offset`
    async fn fetch_page(
        &self,
        query: &SearchQuery,
        offset: usize,
        page_size: usize,
    ) -> Result<FeedPage, SourceError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for &T {
    fn id(&self) -> &str {
        (**self).id()
    }

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        offset: usize,
        page_size: usize,
    ) -> Result<FeedPage, SourceError> {
        (**self).fetch_page(query, offset, page_size).await
    }
}

/// Errors that can occur when talking to a remote source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status or an error document
    #[error("API error: {0}")]
    Api(String),

    /// Parsing error (XML, HTML)
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}
