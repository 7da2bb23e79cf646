//! Flat export records and the fixed set of exportable fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::ResultEntry;

/// A field that table exports may include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportField {
    PaperId,
    PaperTitle,
    PaperFirstAuthor,
    PaperAllAuthor,
    PublishTime,
    UpdateTime,
    PaperSummary,
    PaperUrl,
    PdfUrl,
    Comment,
    Doi,
    PrimaryCategory,
    Categories,
}

impl ExportField {
    /// Every field, in default column order
    pub const ALL: [ExportField; 13] = [
        ExportField::PaperId,
        ExportField::PaperTitle,
        ExportField::PaperFirstAuthor,
        ExportField::PaperAllAuthor,
        ExportField::PublishTime,
        ExportField::UpdateTime,
        ExportField::PaperSummary,
        ExportField::PaperUrl,
        ExportField::PdfUrl,
        ExportField::Comment,
        ExportField::Doi,
        ExportField::PrimaryCategory,
        ExportField::Categories,
    ];

    /// Column name used in configuration files and table headers
    pub fn as_str(self) -> &'static str {
        match self {
            ExportField::PaperId => "paper_id",
            ExportField::PaperTitle => "paper_title",
            ExportField::PaperFirstAuthor => "paper_first_author",
            ExportField::PaperAllAuthor => "paper_all_author",
            ExportField::PublishTime => "publish_time",
            ExportField::UpdateTime => "update_time",
            ExportField::PaperSummary => "paper_summary",
            ExportField::PaperUrl => "paper_url",
            ExportField::PdfUrl => "pdf_url",
            ExportField::Comment => "comment",
            ExportField::Doi => "doi",
            ExportField::PrimaryCategory => "primary_category",
            ExportField::Categories => "categories",
        }
    }

    /// One-line description for `paper-harvester fields`
    pub fn description(self) -> &'static str {
        match self {
            ExportField::PaperId => "Short arXiv identifier, including version",
            ExportField::PaperTitle => "Paper title",
            ExportField::PaperFirstAuthor => "First listed author",
            ExportField::PaperAllAuthor => "All authors, comma separated",
            ExportField::PublishTime => "Date of the first version (YYYY-MM-DD)",
            ExportField::UpdateTime => "Date of the latest version (YYYY-MM-DD)",
            ExportField::PaperSummary => "Abstract with line breaks removed",
            ExportField::PaperUrl => "Abstract page URL",
            ExportField::PdfUrl => "PDF URL",
            ExportField::Comment => "Author comment (page count, venue, ...)",
            ExportField::Doi => "DOI, empty when none was registered",
            ExportField::PrimaryCategory => "Primary subject category",
            ExportField::Categories => "All subject categories, comma separated",
        }
    }

    /// Parse a list of field names, failing on the first unknown one
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<ExportField>, UnknownField> {
        names.iter().map(|name| name.as_ref().parse()).collect()
    }
}

impl fmt::Display for ExportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field name outside the allowed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown export field `{0}`")]
pub struct UnknownField(pub String);

impl FromStr for ExportField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ExportField::ALL
            .into_iter()
            .find(|field| field.as_str() == name)
            .ok_or_else(|| UnknownField(name.to_string()))
    }
}

/// Flat, string-valued projection of one result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub paper_id: String,
    pub paper_title: String,
    pub paper_first_author: String,
    pub paper_all_author: String,
    pub publish_time: String,
    pub update_time: String,
    pub paper_summary: String,
    pub paper_url: String,
    pub pdf_url: String,
    pub comment: String,
    pub doi: String,
    pub primary_category: String,
    pub categories: String,
    /// Journal reference; shown in JSON previews, not a table field
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub journal_ref: String,
}

impl ExportRecord {
    /// Value of one field
    pub fn get(&self, field: ExportField) -> &str {
        match field {
            ExportField::PaperId => &self.paper_id,
            ExportField::PaperTitle => &self.paper_title,
            ExportField::PaperFirstAuthor => &self.paper_first_author,
            ExportField::PaperAllAuthor => &self.paper_all_author,
            ExportField::PublishTime => &self.publish_time,
            ExportField::UpdateTime => &self.update_time,
            ExportField::PaperSummary => &self.paper_summary,
            ExportField::PaperUrl => &self.paper_url,
            ExportField::PdfUrl => &self.pdf_url,
            ExportField::Comment => &self.comment,
            ExportField::Doi => &self.doi,
            ExportField::PrimaryCategory => &self.primary_category,
            ExportField::Categories => &self.categories,
        }
    }

    /// Values of the given fields, in the given order
    pub fn project(&self, fields: &[ExportField]) -> Vec<&str> {
        fields.iter().map(|field| self.get(*field)).collect()
    }
}

impl From<&ResultEntry> for ExportRecord {
    fn from(entry: &ResultEntry) -> Self {
        Self {
            paper_id: entry.short_id().to_string(),
            paper_title: entry.title.clone(),
            paper_first_author: entry.first_author().to_string(),
            paper_all_author: entry.authors.join(", "),
            publish_time: entry.published.date_naive().to_string(),
            update_time: entry.updated.date_naive().to_string(),
            paper_summary: entry.summary.replace('\n', ""),
            paper_url: entry.entry_id.clone(),
            pdf_url: entry.pdf_url.clone(),
            comment: entry.comment.clone().unwrap_or_default(),
            doi: entry.doi.clone().unwrap_or_default(),
            primary_category: entry.primary_category.clone(),
            categories: entry.categories.join(", "),
            journal_ref: entry.journal_ref.clone().unwrap_or_default(),
        }
    }
}

impl From<ResultEntry> for ExportRecord {
    fn from(entry: ResultEntry) -> Self {
        Self::from(&entry)
    }
}
