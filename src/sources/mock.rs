//! Mock fetcher for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::models::{FeedPage, Link, RawEntry, SearchQuery};
use crate::sources::{PageFetcher, SourceError};

/// A fetcher that replays scripted pages in order.
///
/// Once the script runs out every further request gets an empty page.
#[derive(Debug, Default)]
pub struct MockFetcher {
    pages: Mutex<VecDeque<Result<FeedPage, SourceError>>>,
    requests: Mutex<Vec<(usize, usize)>>,
}

impl MockFetcher {
    /// Create a fetcher with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page to the script.
    pub fn push_page(&self, page: FeedPage) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    /// Append a failure to the script.
    pub fn push_error(&self, err: SourceError) {
        self.pages.lock().unwrap().push_back(Err(err));
    }

    /// `(offset, page_size)` of every request so far.
    pub fn requests(&self) -> Vec<(usize, usize)> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    fn id(&self) -> &str {
        "mock"
    }

    async fn fetch_page(
        &self,
        _query: &SearchQuery,
        offset: usize,
        page_size: usize,
    ) -> Result<FeedPage, SourceError> {
        self.requests.lock().unwrap().push((offset, page_size));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(FeedPage::default()))
    }
}

/// Helper function to create a complete raw entry published at noon UTC on `date`.
pub fn make_entry(short_id: &str, date: &str) -> RawEntry {
    let abs = format!("http://arxiv.org/abs/{}", short_id);
    let pdf = format!("http://arxiv.org/pdf/{}", short_id);
    RawEntry {
        id: Some(abs.clone()),
        title: Some(format!("Paper {}", short_id)),
        summary: Some("An abstract.".to_string()),
        authors: vec!["Test Author".to_string()],
        published: Some(format!("{}T12:00:00Z", date)),
        updated: Some(format!("{}T12:00:00Z", date)),
        primary_category: Some("cs.CV".to_string()),
        categories: vec!["cs.CV".to_string()],
        links: vec![
            Link {
                href: abs,
                rel: Some("alternate".to_string()),
                title: None,
                content_type: Some("text/html".to_string()),
            },
            Link {
                href: pdf,
                rel: Some("related".to_string()),
                title: Some("pdf".to_string()),
                content_type: Some("application/pdf".to_string()),
            },
        ],
        ..Default::default()
    }
}
