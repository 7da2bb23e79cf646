//! Exporters: tabular files and bulk file downloads.

mod download;
mod table;

pub use download::{
    download_file, paper_filename, DownloadOutcome, DownloadReport, FileExporter,
};
pub use table::RecordTable;

/// Errors raised while writing export files
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
