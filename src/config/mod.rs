//! Configuration management.
//!
//! [`ConfigFile`] is the document as written; [`HarvestConfig`] is the
//! validated, typed form every other component consumes. All validation
//! happens here, before any network activity.

mod file_config;

pub use file_config::{ConfigFile, DEFAULT_TABLE_NAME, ENV_PREFIX};

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::models::{parse_date, DateWindow, ExportField, SearchQuery, UnknownField};

/// Configuration errors. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A field list or sort key names a field outside the allowed set
    #[error("Invalid `{key}`: {source}")]
    UnknownField {
        key: &'static str,
        source: UnknownField,
    },

    /// A date bound is not `YYYY-M-D`
    #[error("Invalid `{key}` {value:?}: expected YYYY-M-D ({source})")]
    InvalidDate {
        key: &'static str,
        value: String,
        source: chrono::ParseError,
    },

    /// `page_size` must be positive
    #[error("`page_size` must be at least 1")]
    InvalidPageSize,

    /// The template could not be serialized
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A table export that is enabled and has at least one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableExport {
    pub path: PathBuf,
    pub fields: Vec<ExportField>,
    pub sort_by: Option<ExportField>,
}

/// PDF download settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfExport {
    pub dir: PathBuf,
    pub with_source: bool,
}

/// Validated harvest configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    pub query: SearchQuery,
    pub window: DateWindow,
    pub offset: usize,
    pub page_size: usize,
    pub timeout: Duration,
    pub save_root: PathBuf,
    pub spreadsheet: Option<TableExport>,
    pub markdown: Option<TableExport>,
    pub pdf: Option<PdfExport>,
}

impl HarvestConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = ConfigFile::load(path)?.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ConfigFile {
    /// Validate into a [`HarvestConfig`].
    ///
    /// Field lists and sort keys are checked even for disabled exports.
    pub fn validate(self) -> Result<HarvestConfig, ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }

        let window = DateWindow::new(
            parse_bound("start_date", self.start_date.as_deref())?,
            parse_bound("end_date", self.end_date.as_deref())?,
        );
        if !window.is_ordered() {
            warn!("Date window {} ends before it starts; no results will match", window);
        }

        let spreadsheet_fields = parse_fields("spreadsheet_fields", &self.spreadsheet_fields)?;
        let spreadsheet_sorted = parse_sort("spreadsheet_sorted", self.spreadsheet_sorted.as_deref())?;
        let markdown_fields = parse_fields("markdown_fields", &self.markdown_fields)?;
        let markdown_sorted = parse_sort("markdown_sorted", self.markdown_sorted.as_deref())?;

        let spreadsheet = table_export(
            "spreadsheet",
            self.save_spreadsheet,
            self.save_root.join(format!("{}.csv", self.spreadsheet_name)),
            spreadsheet_fields,
            spreadsheet_sorted,
        );
        let markdown = table_export(
            "markdown",
            self.save_markdown,
            self.save_root.join(format!("{}.md", self.markdown_name)),
            markdown_fields,
            markdown_sorted,
        );
        let pdf = self.save_pdf.then(|| PdfExport {
            dir: self.save_root.join("pdf"),
            with_source: self.with_source,
        });

        let mut query = SearchQuery::new(self.query)
            .id_list(self.id_list)
            .sort_by(self.sort_by)
            .sort_order(self.sort_order);
        query.max_results = self.max_results;

        Ok(HarvestConfig {
            query,
            window,
            offset: self.offset,
            page_size: self.page_size,
            timeout: Duration::from_secs(self.timeout_secs),
            save_root: self.save_root,
            spreadsheet,
            markdown,
            pdf,
        })
    }
}

fn parse_bound(
    key: &'static str,
    value: Option<&str>,
) -> Result<Option<chrono::NaiveDate>, ConfigError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse_date(v)
            .map(Some)
            .map_err(|source| ConfigError::InvalidDate {
                key,
                value: v.to_string(),
                source,
            }),
    }
}

fn parse_fields(key: &'static str, names: &[String]) -> Result<Vec<ExportField>, ConfigError> {
    ExportField::parse_list(names).map_err(|source| ConfigError::UnknownField { key, source })
}

fn parse_sort(key: &'static str, name: Option<&str>) -> Result<Option<ExportField>, ConfigError> {
    name.map(|n| n.parse())
        .transpose()
        .map_err(|source| ConfigError::UnknownField { key, source })
}

fn table_export(
    kind: &str,
    enabled: bool,
    path: PathBuf,
    fields: Vec<ExportField>,
    sort_by: Option<ExportField>,
) -> Option<TableExport> {
    if !enabled {
        return None;
    }
    if fields.is_empty() {
        info!("No {} fields configured; skipping {} export", kind, kind);
        return None;
    }
    Some(TableExport {
        path,
        fields,
        sort_by,
    })
}
