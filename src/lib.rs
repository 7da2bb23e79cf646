//! # Paper Harvester
//!
//! Harvest arXiv search results into spreadsheets, Markdown tables and PDF
//! folders, and bulk-download conference proceedings.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (SearchQuery, DateWindow, ResultEntry, ExportRecord)
//! - [`sources`]: The [`PageFetcher`] trait and the arXiv Atom API client
//! - [`utils`]: HTTP client and the lazy [`ResultStream`]
//! - [`export`]: CSV/Markdown tables and PDF downloads
//! - [`conference`]: Proceedings index scraper
//! - [`config`]: Configuration loading and validation
//! - [`harvest`]: The end-to-end harvest pipeline

pub mod conference;
pub mod config;
pub mod export;
pub mod harvest;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use config::HarvestConfig;
pub use harvest::{HarvestError, HarvestSummary, Harvester};
pub use models::{ExportField, ExportRecord, ResultEntry, SearchQuery};
pub use sources::{ArxivClient, PageFetcher};
pub use utils::ResultStream;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
