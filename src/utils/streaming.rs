//! Lazy, page-by-page result streaming.
//!
//! [`ResultStream`] pulls one page at a time from a [`PageFetcher`], filters
//! entries by publication date and hands out parsed [`ResultEntry`] values.
//! Nothing is fetched until the consumer asks for the next entry, and a
//! consumer that stops pulling causes no further requests.

use futures_util::stream::{self, Stream};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use crate::models::{DateWindow, RawEntry, ResultEntry, SearchQuery};
use crate::sources::{PageFetcher, SourceError};

/// Results requested per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// A forward-only stream of search results within a date window.
pub struct ResultStream<F: PageFetcher> {
    fetcher: F,
    query: SearchQuery,
    window: DateWindow,
    page_size: usize,
    /// Offset of the next page to request
    cursor: usize,
    /// Upper bound on `cursor`
    remaining: usize,
    first_page: bool,
    buffer: VecDeque<RawEntry>,
    done: bool,
    early_stop: bool,
    pages_fetched: usize,
}

impl<F: PageFetcher> ResultStream<F> {
    /// Create a new result stream
    ///
    /// - `fetcher`: The page fetcher to pull from
    /// - `query`: The search query
    /// - `offset`: Index of the first result to request
    /// - `window`: Publication-date window entries must fall into
    pub fn new(fetcher: F, query: SearchQuery, offset: usize, window: DateWindow) -> Self {
        let remaining = query.result_limit();
        let early_stop = query.is_newest_first();
        Self {
            fetcher,
            query,
            window,
            page_size: DEFAULT_PAGE_SIZE,
            cursor: offset,
            remaining,
            first_page: true,
            buffer: VecDeque::new(),
            done: false,
            early_stop,
            pages_fetched: 0,
        }
    }

    /// Set the number of results requested per page (at least 1)
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Number of pages requested so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Get the next accepted entry.
    ///
    /// Returns `Ok(None)` once the stream is exhausted. A fetch error ends
    /// the stream after being returned.
    pub async fn next_entry(&mut self) -> Result<Option<ResultEntry>, SourceError> {
        loop {
            let Some(raw) = self.buffer.pop_front() else {
                if self.done || self.cursor >= self.remaining {
                    self.done = true;
                    return Ok(None);
                }
                if let Err(e) = self.fetch_next_page().await {
                    self.finish();
                    return Err(e);
                }
                continue;
            };

            if let Some(entry) = self.accept(raw) {
                return Ok(Some(entry));
            }
        }
    }

    /// Collect all remaining entries into a Vec
    pub async fn collect_all(mut self) -> Result<Vec<ResultEntry>, SourceError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry().await? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Adapt into a [`Stream`] of results
    pub fn into_stream(self) -> impl Stream<Item = Result<ResultEntry, SourceError>> {
        stream::unfold(self, |mut results| async move {
            match results.next_entry().await {
                Ok(Some(entry)) => Some((Ok(entry), results)),
                Ok(None) => None,
                Err(e) => Some((Err(e), results)),
            }
        })
    }

    async fn fetch_next_page(&mut self) -> Result<(), SourceError> {
        let size = self.page_size.min(self.remaining - self.cursor);
        info!(
            "Requesting {} results at offset {} from {}",
            size,
            self.cursor,
            self.fetcher.id()
        );

        let page = self
            .fetcher
            .fetch_page(&self.query, self.cursor, size)
            .await?;
        self.pages_fetched += 1;

        if self.first_page {
            self.first_page = false;
            if page.entries.is_empty() {
                // an empty feed may still report a total of 1
                info!("Got empty first page; stopping generation");
                self.remaining = 0;
                self.finish();
                return Ok(());
            }
            self.remaining = self.remaining.min(page.total_results);
            info!(
                "Got first page: {} of {} total results",
                page.entries.len(),
                page.total_results
            );
        } else if page.entries.is_empty() {
            info!("Got empty results; stopping generation");
            self.finish();
            return Ok(());
        } else {
            debug!("Got page with {} results", page.entries.len());
        }

        self.cursor += page.entries.len();
        self.buffer.extend(page.entries);
        Ok(())
    }

    /// Apply the date window and parse. `None` means "not yielded".
    fn accept(&mut self, raw: RawEntry) -> Option<ResultEntry> {
        if self.window.is_active() {
            let Some(date) = raw.published_date() else {
                warn!(
                    "Skipping entry {} without a usable publish date",
                    raw.id.as_deref().unwrap_or("<no id>")
                );
                return None;
            };

            if self.window.is_after_end(date) {
                debug!("Skipping entry published {} after window {}", date, self.window);
                return None;
            }

            if self.window.is_before_start(date) {
                if self.early_stop {
                    info!(
                        "Entry published {} precedes window {}; stopping generation",
                        date, self.window
                    );
                    self.finish();
                } else {
                    debug!("Skipping entry published {} before window {}", date, self.window);
                }
                return None;
            }
        }

        match ResultEntry::try_from(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping partial result: {}", e);
                None
            }
        }
    }

    fn finish(&mut self) {
        self.done = true;
        self.buffer.clear();
    }
}

impl<F: PageFetcher> std::fmt::Debug for ResultStream<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStream")
            .field("fetcher", &self.fetcher.id())
            .field("window", &self.window)
            .field("cursor", &self.cursor)
            .field("remaining", &self.remaining)
            .field("buffered", &self.buffer.len())
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_date, FeedPage, SortBy, SortOrder};
    use crate::sources::mock::{make_entry, MockFetcher};
    use futures_util::StreamExt;

    fn window(start: &str, end: &str) -> DateWindow {
        DateWindow::new(parse_date(start).ok(), parse_date(end).ok())
    }

    fn ids(entries: &[ResultEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.short_id()).collect()
    }

    #[tokio::test]
    async fn test_result_stream_pages() {
        let mock = MockFetcher::new();
        mock.push_page(FeedPage::new(
            5,
            vec![make_entry("1", "2023-09-05"), make_entry("2", "2023-09-04")],
        ));
        mock.push_page(FeedPage::new(
            5,
            vec![make_entry("3", "2023-09-03"), make_entry("4", "2023-09-02")],
        ));
        mock.push_page(FeedPage::new(5, vec![make_entry("5", "2023-09-01")]));

        let stream = ResultStream::new(&mock, SearchQuery::new("test"), 0, DateWindow::unbounded())
            .page_size(2);
        let entries = stream.collect_all().await.unwrap();

        assert_eq!(ids(&entries), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(mock.requests(), vec![(0, 2), (2, 2), (4, 1)]);
    }

    #[tokio::test]
    async fn test_empty_first_page_yields_nothing() {
        let mock = MockFetcher::new();
        mock.push_page(FeedPage::new(1, Vec::new()));

        let entries = ResultStream::new(&mock, SearchQuery::new("none"), 0, DateWindow::unbounded())
            .collect_all()
            .await
            .unwrap();

        assert!(entries.is_empty());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_window_stops_early_when_newest_first() {
        let mock = MockFetcher::new();
        mock.push_page(FeedPage::new(
            6,
            vec![
                make_entry("a", "2023-09-30"),
                make_entry("b", "2023-09-20"),
                make_entry("c", "2023-09-10"),
            ],
        ));
        mock.push_page(FeedPage::new(6, vec![make_entry("d", "2023-09-16")]));

        let mut stream = ResultStream::new(
            &mock,
            SearchQuery::new("cat:cs.CV"),
            0,
            window("2023-09-15", "2023-09-30"),
        )
        .page_size(3);

        let mut yielded = Vec::new();
        while let Some(entry) = stream.next_entry().await.unwrap() {
            yielded.push(entry);
        }

        assert_eq!(ids(&yielded), vec!["a", "b"]);
        assert_eq!(stream.pages_fetched(), 1);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_window_skips_entries_after_end() {
        let mock = MockFetcher::new();
        mock.push_page(FeedPage::new(
            3,
            vec![
                make_entry("late", "2023-10-01"),
                make_entry("edge", "2023-09-30"),
                make_entry("start", "2023-09-15"),
            ],
        ));

        let entries = ResultStream::new(
            &mock,
            SearchQuery::new("test"),
            0,
            window("2023-09-15", "2023-09-30"),
        )
        .collect_all()
        .await
        .unwrap();

        assert_eq!(ids(&entries), vec!["edge", "start"]);
    }

    #[tokio::test]
    async fn test_window_filters_without_stopping_when_ascending() {
        let mock = MockFetcher::new();
        mock.push_page(FeedPage::new(
            3,
            vec![
                make_entry("old", "2023-09-01"),
                make_entry("in", "2023-09-20"),
                make_entry("new", "2023-10-05"),
            ],
        ));

        let query = SearchQuery::new("test")
            .sort_by(SortBy::SubmittedDate)
            .sort_order(SortOrder::Ascending);
        let entries = ResultStream::new(&mock, query, 0, window("2023-09-15", "2023-09-30"))
            .collect_all()
            .await
            .unwrap();

        assert_eq!(ids(&entries), vec!["in"]);
    }

    #[tokio::test]
    async fn test_partial_entries_are_skipped() {
        let mut no_author = make_entry("broken", "2023-09-02");
        no_author.authors.clear();
        let mut no_date = make_entry("undated", "2023-09-02");
        no_date.published = None;

        let mock = MockFetcher::new();
        mock.push_page(FeedPage::new(
            4,
            vec![
                make_entry("ok1", "2023-09-03"),
                no_author,
                no_date.clone(),
                make_entry("ok2", "2023-09-01"),
            ],
        ));
        let entries = ResultStream::new(&mock, SearchQuery::new("test"), 0, DateWindow::unbounded())
            .collect_all()
            .await
            .unwrap();
        assert_eq!(ids(&entries), vec!["ok1", "ok2"]);

        // with an active window an undated entry cannot be placed and is skipped too
        let mock = MockFetcher::new();
        mock.push_page(FeedPage::new(2, vec![no_date, make_entry("ok", "2023-09-02")]));
        let entries = ResultStream::new(
            &mock,
            SearchQuery::new("test"),
            0,
            window("2023-09-01", "2023-09-30"),
        )
        .collect_all()
        .await
        .unwrap();
        assert_eq!(ids(&entries), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_max_results_and_offset() {
        let mock = MockFetcher::new();
        mock.push_page(FeedPage::new(
            100,
            vec![make_entry("11", "2023-09-02"), make_entry("12", "2023-09-01")],
        ));
        mock.push_page(FeedPage::new(100, vec![make_entry("13", "2023-08-31")]));

        let query = SearchQuery::new("test").max_results(13);
        let entries = ResultStream::new(&mock, query, 10, DateWindow::unbounded())
            .page_size(2)
            .collect_all()
            .await
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(mock.requests(), vec![(10, 2), (12, 1)]);
    }

    #[tokio::test]
    async fn test_short_page_advances_by_received_count() {
        let mock = MockFetcher::new();
        mock.push_page(FeedPage::new(4, vec![make_entry("1", "2023-09-04")]));
        mock.push_page(FeedPage::new(
            4,
            vec![make_entry("2", "2023-09-03"), make_entry("3", "2023-09-02")],
        ));
        // script exhausted: the next request gets an empty page and ends the stream

        let entries = ResultStream::new(&mock, SearchQuery::new("test"), 0, DateWindow::unbounded())
            .page_size(3)
            .collect_all()
            .await
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(mock.requests(), vec![(0, 3), (1, 3), (3, 1)]);
    }

    #[tokio::test]
    async fn test_fetch_error_ends_stream() {
        let mock = MockFetcher::new();
        mock.push_page(FeedPage::new(4, vec![make_entry("1", "2023-09-04")]));
        mock.push_error(SourceError::Api("status 503".into()));

        let results: Vec<_> =
            ResultStream::new(&mock, SearchQuery::new("test"), 0, DateWindow::unbounded())
                .page_size(1)
                .into_stream()
                .collect()
                .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SourceError::Api(_))));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_abandoned_stream_stops_fetching() {
        let mock = MockFetcher::new();
        mock.push_page(FeedPage::new(
            10,
            vec![make_entry("1", "2023-09-04"), make_entry("2", "2023-09-03")],
        ));

        let taken: Vec<_> =
            ResultStream::new(&mock, SearchQuery::new("test"), 0, DateWindow::unbounded())
                .page_size(2)
                .into_stream()
                .take(1)
                .collect()
                .await;

        assert_eq!(taken.len(), 1);
        assert_eq!(mock.calls(), 1);
    }
}
