//! The harvest pipeline: stream, format, export.

use std::fmt;
use std::path::PathBuf;
use tracing::info;

use crate::config::HarvestConfig;
use crate::export::{DownloadReport, ExportError, FileExporter, RecordTable};
use crate::models::ExportRecord;
use crate::sources::{ArxivClient, PageFetcher, SourceError};
use crate::utils::{HttpClient, ResultStream};

/// Errors that abort a harvest run
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Fetching or parsing results failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Writing a table failed
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// What a harvest run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Number of accepted results
    pub records: usize,
    /// Spreadsheet written, if enabled
    pub spreadsheet: Option<PathBuf>,
    /// Markdown file written, if enabled
    pub markdown: Option<PathBuf>,
    /// Download outcomes, if PDF download is enabled
    pub downloads: Option<DownloadReport>,
}

impl fmt::Display for HarvestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} results", self.records)?;
        if let Some(path) = &self.spreadsheet {
            write!(f, "\n  spreadsheet: {}", path.display())?;
        }
        if let Some(path) = &self.markdown {
            write!(f, "\n  markdown:    {}", path.display())?;
        }
        if let Some(report) = &self.downloads {
            write!(f, "\n  downloads:   {}", report)?;
        }
        Ok(())
    }
}

/// Runs one configured harvest against a page fetcher.
#[derive(Debug)]
pub struct Harvester<F: PageFetcher> {
    config: HarvestConfig,
    fetcher: F,
    client: HttpClient,
    show_progress: bool,
}

impl Harvester<ArxivClient> {
    /// Harvest from the public arXiv API
    pub fn arxiv(config: HarvestConfig) -> Result<Self, HarvestError> {
        let client = HttpClient::new(config.timeout)?;
        let fetcher = ArxivClient::new(client.clone());
        Ok(Self::new(config, fetcher, client))
    }
}

impl<F: PageFetcher> Harvester<F> {
    /// Create a harvester; `client` is used for file downloads
    pub fn new(config: HarvestConfig, fetcher: F, client: HttpClient) -> Self {
        Self {
            config,
            fetcher,
            client,
            show_progress: false,
        }
    }

    /// Show download progress bars
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// A fresh result stream for the configured query and window
    pub fn stream(&self) -> ResultStream<&F> {
        ResultStream::new(
            &self.fetcher,
            self.config.query.clone(),
            self.config.offset,
            self.config.window,
        )
        .page_size(self.config.page_size)
    }

    /// Stream every accepted result and format it
    pub async fn collect_records(&self) -> Result<Vec<ExportRecord>, HarvestError> {
        info!(
            "Searching {:?} within {} via {}",
            self.config.query.query,
            self.config.window,
            self.fetcher.id()
        );

        let mut stream = self.stream();
        let mut records = Vec::new();
        while let Some(entry) = stream.next_entry().await? {
            records.push(ExportRecord::from(&entry));
        }

        info!(
            "Collected {} results in {} pages",
            records.len(),
            stream.pages_fetched()
        );
        Ok(records)
    }

    /// Run the whole pipeline: collect, write tables, download files
    pub async fn run(&self) -> Result<HarvestSummary, HarvestError> {
        let records = self.collect_records().await?;
        let mut summary = HarvestSummary {
            records: records.len(),
            ..Default::default()
        };

        if let Some(table) = &self.config.spreadsheet {
            RecordTable::new(&records, &table.fields, table.sort_by).save_csv(&table.path)?;
            summary.spreadsheet = Some(table.path.clone());
        }

        if let Some(table) = &self.config.markdown {
            RecordTable::new(&records, &table.fields, table.sort_by)
                .save_markdown(&table.path)?;
            summary.markdown = Some(table.path.clone());
        }

        if let Some(pdf) = &self.config.pdf {
            let report = FileExporter::new(self.client.clone(), &pdf.dir)
                .with_source(pdf.with_source)
                .show_progress(self.show_progress)
                .export(&records)
                .await?;
            summary.downloads = Some(report);
        }

        Ok(summary)
    }
}
