//! Spreadsheet (CSV) and Markdown table export.

use std::fs;
use std::io;
use std::path::Path;

use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::info;

use crate::export::ExportError;
use crate::models::{ExportField, ExportRecord};

/// Records restricted to a set of columns, optionally sorted.
#[derive(Debug, Clone)]
pub struct RecordTable<'a> {
    rows: Vec<&'a ExportRecord>,
    columns: &'a [ExportField],
}

impl<'a> RecordTable<'a> {
    /// Build a table over `records`.
    ///
    /// With `sort_by` set, rows are stably sorted ascending by that field,
    /// which does not have to be one of `columns`.
    pub fn new(
        records: &'a [ExportRecord],
        columns: &'a [ExportField],
        sort_by: Option<ExportField>,
    ) -> Self {
        let mut rows: Vec<&ExportRecord> = records.iter().collect();
        if let Some(field) = sort_by {
            rows.sort_by(|a, b| a.get(field).cmp(b.get(field)));
        }
        Self { rows, columns }
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names
    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.as_str()).collect()
    }

    /// Data rows, projected onto the columns
    pub fn rows(&self) -> impl Iterator<Item = Vec<&'a str>> + '_ {
        self.rows
            .iter()
            .copied()
            .map(|record| record.project(self.columns))
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.header())?;
        for row in self.rows() {
            csv.write_record(row)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Save the table as a CSV file, creating parent directories
    pub fn save_csv(&self, path: &Path) -> Result<(), ExportError> {
        create_parent(path)?;
        let file = fs::File::create(path)?;
        self.write_csv(io::BufWriter::new(file))?;
        info!("Wrote {} rows to {}", self.len(), path.display());
        Ok(())
    }

    /// Render the table as GitHub-flavored Markdown
    pub fn to_markdown(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.header());
        for row in self.rows() {
            builder.push_record(row.into_iter().map(markdown_cell));
        }

        let mut table = builder.build();
        table.with(Style::markdown());
        table.to_string()
    }

    /// Save the table as a Markdown file, creating parent directories
    pub fn save_markdown(&self, path: &Path) -> Result<(), ExportError> {
        create_parent(path)?;
        let mut markdown = self.to_markdown();
        markdown.push('\n');
        fs::write(path, markdown)?;
        info!("Wrote {} rows to {}", self.len(), path.display());
        Ok(())
    }
}

fn markdown_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
