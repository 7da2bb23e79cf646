//! Core data models: query descriptor, date window, feed entries and export records.

mod paper;
mod record;
mod search;
mod window;

pub use paper::{
    parse_timestamp, source_url, FeedPage, Link, MissingField, RawEntry, ResultEntry,
};
pub use record::{ExportField, ExportRecord, UnknownField};
pub use search::{SearchQuery, SortBy, SortOrder};
pub use window::{parse_date, within_window, DateWindow, DATE_FORMAT};
