//! Sequential file downloads with skip-if-exists.

use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::export::ExportError;
use crate::models::{source_url, ExportRecord};
use crate::sources::SourceError;
use crate::ui;
use crate::utils::HttpClient;

/// What happened to one download attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was downloaded and written
    Written(PathBuf),
    /// The destination already existed; no request was made
    SkippedExists(PathBuf),
    /// The download failed; nothing was written
    Failed { path: PathBuf, reason: String },
}

impl DownloadOutcome {
    /// Destination path of the attempt
    pub fn path(&self) -> &Path {
        match self {
            DownloadOutcome::Written(path)
            | DownloadOutcome::SkippedExists(path)
            | DownloadOutcome::Failed { path, .. } => path,
        }
    }
}

/// Outcomes of a batch of downloads, in attempt order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    outcomes: Vec<DownloadOutcome>,
}

impl DownloadReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outcome
    pub fn push(&mut self, outcome: DownloadOutcome) {
        self.outcomes.push(outcome);
    }

    /// All outcomes
    pub fn outcomes(&self) -> &[DownloadOutcome] {
        &self.outcomes
    }

    /// Number of attempts
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether nothing was attempted
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of files written
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Written(_)))
    }

    /// Number of files skipped because they already existed
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::SkippedExists(_)))
    }

    /// Number of failed downloads
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&DownloadOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(*o)).count()
    }
}

impl fmt::Display for DownloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} already present, {} failed",
            self.written(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Download `url` to `path` unless `path` already exists.
///
/// The body is received in full and written to a sibling `.part` file that
/// is renamed into place, so a failed attempt never leaves a file that a
/// later run would mistake for a finished download.
pub async fn download_file(client: &HttpClient, url: &str, path: &Path) -> DownloadOutcome {
    if path.exists() {
        debug!("{} already exists, skipping", path.display());
        return DownloadOutcome::SkippedExists(path.to_path_buf());
    }

    match fetch_into(client, url, path).await {
        Ok(size) => {
            debug!("Wrote {} bytes to {}", size, path.display());
            DownloadOutcome::Written(path.to_path_buf())
        }
        Err(e) => {
            warn!("Failed to download {}: {}", url, e);
            DownloadOutcome::Failed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    }
}

async fn fetch_into(client: &HttpClient, url: &str, path: &Path) -> Result<usize, SourceError> {
    let body = client.get_bytes(url).await?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    tokio::fs::write(&partial, &body).await?;
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(body.len())
}

fn non_word() -> &'static Regex {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    NON_WORD.get_or_init(|| Regex::new(r"\W").expect("constant pattern compiles"))
}

/// File name for a paper: `{id}.{title}.{ext}`.
///
/// Slashes in old-style IDs become `_`; every non-word character of the
/// title becomes `_`, and an empty title becomes `UNTITLED`.
pub fn paper_filename(paper_id: &str, title: &str, ext: &str) -> String {
    let title = non_word().replace_all(title, "_");
    let title = if title.is_empty() {
        "UNTITLED".into()
    } else {
        title
    };
    format!("{}.{}.{}", paper_id.replace('/', "_"), title, ext)
}

/// Downloads the PDF (and optionally the source archive) of each record.
#[derive(Debug, Clone)]
pub struct FileExporter {
    client: HttpClient,
    dir: PathBuf,
    with_source: bool,
    show_progress: bool,
}

impl FileExporter {
    /// Create an exporter writing into `dir`
    pub fn new(client: HttpClient, dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            dir: dir.into(),
            with_source: false,
            show_progress: false,
        }
    }

    /// Also fetch the `.tar.gz` source archive of each paper
    pub fn with_source(mut self, with_source: bool) -> Self {
        self.with_source = with_source;
        self
    }

    /// Show a progress bar on stderr
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Download files for every record, one at a time.
    ///
    /// Per-file failures are recorded in the report; only failing to create
    /// the target directory is an error.
    pub async fn export(&self, records: &[ExportRecord]) -> Result<DownloadReport, ExportError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let per_record = if self.with_source { 2 } else { 1 };
        let progress = ui::progress_bar(
            (records.len() * per_record) as u64,
            "Downloading",
            self.show_progress,
        );

        let mut report = DownloadReport::new();
        for record in records {
            let pdf_path = self
                .dir
                .join(paper_filename(&record.paper_id, &record.paper_title, "pdf"));
            progress.set_message(record.paper_id.clone());
            report.push(download_file(&self.client, &record.pdf_url, &pdf_path).await);
            progress.inc(1);

            if self.with_source {
                let src_path = self
                    .dir
                    .join(paper_filename(&record.paper_id, &record.paper_title, "tar.gz"));
                let url = source_url(&record.pdf_url);
                report.push(download_file(&self.client, &url, &src_path).await);
                progress.inc(1);
            }
        }
        progress.finish_and_clear();

        info!("Downloads in {}: {}", self.dir.display(), report);
        Ok(report)
    }
}
