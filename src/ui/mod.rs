//! Terminal output helpers: progress bars and preview tables.

use comfy_table::{presets, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

use crate::models::ExportRecord;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Create a progress bar for a download loop.
///
/// Returns a hidden bar when `visible` is false so callers never branch.
pub fn progress_bar(len: u64, prefix: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{prefix}: {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}",
    )
    .map(|s| s.progress_chars("█▓▒░ "))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb
}

/// Truncate text to `max` characters, ending in "..." when shortened.
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max - 3).collect();
    format!("{}...", kept)
}

/// Render records as a terminal table for `preview`.
pub fn preview_table(records: &[ExportRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Published", "First author", "Title"]);

    for record in records {
        table.add_row(vec![
            Cell::new(&record.paper_id),
            Cell::new(&record.publish_time),
            Cell::new(truncate_with_ellipsis(&record.paper_first_author, 30)),
            Cell::new(truncate_with_ellipsis(&record.paper_title, 80)),
        ]);
    }
    table
}
