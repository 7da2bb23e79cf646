//! Utility modules supporting harvesting.
//!
//! - [`HttpClient`]: HTTP client that threads one explicit timeout through every request
//! - [`ResultStream`]: lazy, date-filtered paging over a [`crate::sources::PageFetcher`]
//!
//! # Streaming
//!
//! ```rust,no_run
//! use paper_harvester::models::{DateWindow, SearchQuery};
//! use paper_harvester::sources::ArxivClient;
//! use paper_harvester::utils::{HttpClient, ResultStream, DEFAULT_TIMEOUT};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ArxivClient::new(HttpClient::new(DEFAULT_TIMEOUT)?);
//! let mut results = ResultStream::new(client, SearchQuery::new("cat:cs.CV"), 0, DateWindow::unbounded());
//! while let Some(entry) = results.next_entry().await? {
//!     println!("{} {}", entry.short_id(), entry.title);
//! }
//! # Ok(())
//! # }
//! ```

mod http;
mod streaming;

pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use streaming::{ResultStream, DEFAULT_PAGE_SIZE};
