//! Feed pages and the paper entries they carry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A link element attached to a feed entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: Option<String>,
    pub title: Option<String>,
    pub content_type: Option<String>,
}

/// One feed item exactly as the API returned it.
///
/// Every field is optional here; [`ResultEntry::try_from`] decides which
/// ones a usable result needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    /// Entry URL, e.g. `http://arxiv.org/abs/2309.12345v1`
    pub id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub authors: Vec<String>,
    /// RFC 3339 timestamp of the first version
    pub published: Option<String>,
    /// RFC 3339 timestamp of the latest version
    pub updated: Option<String>,
    pub comment: Option<String>,
    pub doi: Option<String>,
    pub journal_ref: Option<String>,
    pub primary_category: Option<String>,
    pub categories: Vec<String>,
    pub links: Vec<Link>,
}

impl RawEntry {
    /// Calendar date (UTC) of the published timestamp, if it parses
    pub fn published_date(&self) -> Option<NaiveDate> {
        self.published
            .as_deref()
            .and_then(parse_timestamp)
            .map(|t| t.date_naive())
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPage {
    /// Total number of results the API reports for the whole query
    pub total_results: usize,

    /// Entries on this page, in API order
    pub entries: Vec<RawEntry>,
}

impl FeedPage {
    /// Create a page
    pub fn new(total_results: usize, entries: Vec<RawEntry>) -> Self {
        Self {
            total_results,
            entries,
        }
    }
}

/// A feed entry lacked a field every result must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("entry is missing required field `{0}`")]
pub struct MissingField(pub &'static str);

/// A fully parsed search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Entry URL, e.g. `http://arxiv.org/abs/2309.12345v1`
    pub entry_id: String,
    pub title: String,
    pub summary: String,
    /// Authors in byline order (never empty)
    pub authors: Vec<String>,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub primary_category: String,
    pub categories: Vec<String>,
    pub comment: Option<String>,
    pub doi: Option<String>,
    pub journal_ref: Option<String>,
    pub pdf_url: String,
}

impl ResultEntry {
    /// Short identifier, e.g. `2309.12345v1` or `hep-ex/0307015v1`
    pub fn short_id(&self) -> &str {
        self.entry_id
            .split("arxiv.org/abs/")
            .last()
            .unwrap_or(self.entry_id.as_str())
    }

    /// First listed author
    pub fn first_author(&self) -> &str {
        self.authors.first().map(String::as_str).unwrap_or_default()
    }

    /// URL of the source archive, derived from the PDF URL
    pub fn source_url(&self) -> String {
        source_url(&self.pdf_url)
    }
}

impl TryFrom<RawEntry> for ResultEntry {
    type Error = MissingField;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let entry_id = raw.id.filter(|s| !s.is_empty()).ok_or(MissingField("id"))?;
        let title = raw
            .title
            .map(|t| normalize_whitespace(&t))
            .filter(|t| !t.is_empty())
            .ok_or(MissingField("title"))?;
        let published = raw
            .published
            .as_deref()
            .and_then(parse_timestamp)
            .ok_or(MissingField("published"))?;
        let updated = raw
            .updated
            .as_deref()
            .and_then(parse_timestamp)
            .ok_or(MissingField("updated"))?;
        if raw.authors.is_empty() {
            return Err(MissingField("author"));
        }

        let primary_category = raw
            .primary_category
            .or_else(|| raw.categories.first().cloned())
            .ok_or(MissingField("primary_category"))?;

        let pdf_url = raw
            .links
            .iter()
            .find(|l| l.title.as_deref() == Some("pdf"))
            .or_else(|| {
                raw.links
                    .iter()
                    .find(|l| l.content_type.as_deref() == Some("application/pdf"))
            })
            .map(|l| l.href.clone())
            .unwrap_or_else(|| entry_id.replacen("/abs/", "/pdf/", 1));

        Ok(Self {
            title,
            summary: raw.summary.map(|s| s.trim().to_string()).unwrap_or_default(),
            authors: raw.authors,
            published,
            updated,
            primary_category,
            categories: raw.categories,
            comment: raw.comment.filter(|s| !s.is_empty()),
            doi: raw.doi.filter(|s| !s.is_empty()),
            journal_ref: raw.journal_ref.filter(|s| !s.is_empty()),
            pdf_url,
            entry_id,
        })
    }
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Source archive URL for a PDF URL (`/pdf/` becomes `/src/`)
pub fn source_url(pdf_url: &str) -> String {
    pdf_url.replace("/pdf/", "/src/")
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
