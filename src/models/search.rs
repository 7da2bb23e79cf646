//! Search query descriptor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort order for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    /// Value of the API's `sortOrder` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort key for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "relevance")]
    Relevance,
    #[serde(rename = "lastUpdatedDate", alias = "last_updated_date")]
    LastUpdatedDate,
    #[default]
    #[serde(rename = "submittedDate", alias = "submitted_date")]
    SubmittedDate,
}

impl SortBy {
    /// Value of the API's `sortBy` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
            SortBy::SubmittedDate => "submittedDate",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search query parameters
///
/// Built once from configuration and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query in the API's query syntax (e.g. `cat:cs.CV AND ti:nerf`)
    pub query: String,

    /// Explicit paper IDs to restrict the search to
    pub id_list: Vec<String>,

    /// Maximum number of results, `None` for unbounded
    pub max_results: Option<usize>,

    /// Sort key
    pub sort_by: SortBy,

    /// Sort direction
    pub sort_order: SortOrder,
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set the explicit ID list
    pub fn id_list<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_list = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Set sort by
    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort_by = sort;
        self
    }

    /// Set sort order
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Result limit with "unbounded" mapped to `usize::MAX`
    pub fn result_limit(&self) -> usize {
        self.max_results.unwrap_or(usize::MAX)
    }

    /// Whether results arrive newest submission first.
    ///
    /// Only then does a date older than the window start mean that every
    /// following result is older too.
    pub fn is_newest_first(&self) -> bool {
        self.sort_by == SortBy::SubmittedDate && self.sort_order == SortOrder::Descending
    }
}
