//! Harvest configuration file support.
//!
//! This module reads YAML or TOML configuration files with support for
//! `PAPER_HARVESTER_*` environment variable overrides. Keys of the older
//! YAML layout (`s_time`, `e_time`, `save_xlsx`, `xlsx_name`, `xlsx_sorted`,
//! `xlsx_list`, `markdown_list`) are accepted as aliases.
//!
//! # Configuration File Format
//!
//! ```yaml
//! query: 'cat:cs.CV AND ti:"gaussian splatting"'
//! max_results: 300
//! start_date: "2023-9-15"
//! end_date: "2023-9-30"
//! save_root: ./out
//! save_pdf: true
//! with_source: false
//! save_spreadsheet: true
//! spreadsheet_name: splatting
//! spreadsheet_sorted: publish_time
//! spreadsheet_fields: [paper_id, paper_title, publish_time, paper_url]
//! save_markdown: true
//! markdown_fields: [paper_id, paper_title, pdf_url]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::models::{ExportField, SortBy, SortOrder};
use crate::utils::{DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT};

/// Prefix of environment variables that override file values
pub const ENV_PREFIX: &str = "PAPER_HARVESTER";

/// Default base name of the spreadsheet and Markdown files
pub const DEFAULT_TABLE_NAME: &str = "Arxiv";

/// Configuration file structure, as written by users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Search query in arXiv query syntax
    pub query: String,

    /// Explicit arXiv IDs
    pub id_list: Vec<String>,

    /// Maximum number of results; unbounded when absent
    pub max_results: Option<usize>,

    /// Earliest publication date, `YYYY-M-D`
    #[serde(alias = "s_time")]
    pub start_date: Option<String>,

    /// Latest publication date, `YYYY-M-D`
    #[serde(alias = "e_time")]
    pub end_date: Option<String>,

    /// Index of the first result to request
    pub offset: usize,

    pub page_size: usize,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Directory all output goes into
    pub save_root: PathBuf,

    pub save_pdf: bool,
    pub with_source: bool,

    #[serde(alias = "save_xlsx")]
    pub save_spreadsheet: bool,
    #[serde(alias = "xlsx_name")]
    pub spreadsheet_name: String,
    #[serde(alias = "xlsx_sorted")]
    pub spreadsheet_sorted: Option<String>,
    #[serde(alias = "xlsx_list")]
    pub spreadsheet_fields: Vec<String>,

    pub save_markdown: bool,
    pub markdown_name: String,
    pub markdown_sorted: Option<String>,
    #[serde(alias = "markdown_list")]
    pub markdown_fields: Vec<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let all_fields: Vec<String> = ExportField::ALL
            .iter()
            .map(|f| f.as_str().to_string())
            .collect();
        Self {
            query: String::new(),
            id_list: Vec::new(),
            max_results: None,
            start_date: None,
            end_date: None,
            offset: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            save_root: PathBuf::from("./"),
            save_pdf: false,
            with_source: false,
            save_spreadsheet: false,
            spreadsheet_name: DEFAULT_TABLE_NAME.to_string(),
            spreadsheet_sorted: None,
            spreadsheet_fields: all_fields.clone(),
            save_markdown: false,
            markdown_name: DEFAULT_TABLE_NAME.to_string(),
            markdown_sorted: None,
            markdown_fields: all_fields,
        }
    }
}

impl ConfigFile {
    /// Load configuration from a YAML or TOML file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("id_list")
                    .with_list_parse_key("spreadsheet_fields")
                    .with_list_parse_key("markdown_fields"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Starting point for `paper-harvester init`
    pub fn template() -> Self {
        Self {
            query: "cat:cs.CV".to_string(),
            max_results: Some(200),
            save_spreadsheet: true,
            save_markdown: true,
            spreadsheet_sorted: Some(ExportField::PublishTime.as_str().to_string()),
            markdown_fields: [
                ExportField::PaperId,
                ExportField::PaperTitle,
                ExportField::PaperFirstAuthor,
                ExportField::PublishTime,
                ExportField::PdfUrl,
            ]
            .iter()
            .map(|f| f.as_str().to_string())
            .collect(),
            ..Self::default()
        }
    }
}
