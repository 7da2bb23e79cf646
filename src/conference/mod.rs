//! Conference proceedings scraper.
//!
//! Open-access proceedings index pages (e.g. `https://openaccess.thecvf.com/CVPR2023?day=all`)
//! list every paper as a title link to `*paper.html` followed by a `pdf`
//! link. [`ConferenceScraper`] pairs the two and downloads every PDF into a
//! directory, skipping files that are already there.

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};
use url::Url;

use crate::export::{download_file, DownloadReport};
use crate::sources::SourceError;
use crate::ui;
use crate::utils::HttpClient;

/// Errors that abort a conference scrape
#[derive(Debug, thiserror::Error)]
pub enum ConferenceError {
    /// The index URL could not be parsed
    #[error("Invalid index URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    /// Fetching the index page failed
    #[error("Failed to fetch index page: {0}")]
    Source(#[from] SourceError),

    /// The destination directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A CSS selector failed to parse
    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// One PDF to download and the file stem to save it under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperLink {
    pub url: Url,
    pub name: String,
}

/// Extract `(pdf link, sanitized name)` pairs from an index page.
///
/// PDF links are anchors whose text is `pdf` and whose href ends in `.pdf`;
/// names are the texts of anchors pointing at `*paper.html`. When the two
/// lists differ in length, names fall back to the PDF file names.
/// Names that collide after sanitizing get a `_2`, `_3`, ... suffix.
pub fn extract_paper_links(html: &str, base: &Url) -> Result<Vec<PaperLink>, ConferenceError> {
    let document = Html::parse_document(html);
    let pdf_selector = selector(r#"a[href$=".pdf"]"#)?;
    let title_selector = selector(r#"a[href$="paper.html"]"#)?;

    let mut links = Vec::new();
    for anchor in document.select(&pdf_selector) {
        let text = anchor.text().collect::<String>();
        if text.trim() != "pdf" {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        match base.join(href) {
            Ok(url) => links.push(url),
            Err(e) => warn!("Skipping unresolvable link {}: {}", href, e),
        }
    }

    let titles: Vec<String> = document
        .select(&title_selector)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .collect();

    let names: Vec<String> = if titles.len() == links.len() {
        titles
    } else {
        warn!(
            "Found {} PDF links but {} titles; naming files after their links",
            links.len(),
            titles.len()
        );
        links.iter().map(basename).collect()
    };

    let mut used = HashSet::new();
    Ok(links
        .into_iter()
        .zip(names)
        .map(|(url, name)| PaperLink {
            name: unique_name(sanitize_name(&name), &mut used),
            url,
        })
        .collect())
}

fn unique_name(name: String, used: &mut HashSet<String>) -> String {
    if used.insert(name.clone()) {
        return name;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", name, n);
        if used.insert(candidate.clone()) {
            warn!("File name {} is already taken; saving as {}", name, candidate);
            return candidate;
        }
        n += 1;
    }
}

fn selector(css: &str) -> Result<Selector, ConferenceError> {
    Selector::parse(css).map_err(|e| ConferenceError::Selector(format!("{}: {:?}", css, e)))
}

fn basename(url: &Url) -> String {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let decoded = urlencoding::decode(last)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| last.to_string());
    decoded
        .strip_suffix(".pdf")
        .map(str::to_string)
        .unwrap_or(decoded)
}

/// Replace `:`, `"`, `?`, `/` and spaces with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ':' | '"' | '?' | '/' | ' ' => '_',
            c => c,
        })
        .collect()
}

/// Scrapes one index page and downloads the PDFs it lists.
#[derive(Debug, Clone)]
pub struct ConferenceScraper {
    client: HttpClient,
    show_progress: bool,
}

impl ConferenceScraper {
    /// Create a scraper
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            show_progress: false,
        }
    }

    /// Show a progress bar on stderr
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Fetch and parse the index page
    pub async fn paper_links(&self, index_url: &str) -> Result<Vec<PaperLink>, ConferenceError> {
        let base = Url::parse(index_url).map_err(|source| ConferenceError::InvalidUrl {
            url: index_url.to_string(),
            source,
        })?;
        let html = self.client.get_text(index_url).await?;
        extract_paper_links(&html, &base)
    }

    /// Download every PDF listed on `index_url` into `dest`.
    ///
    /// Only a failure to fetch the index page or create `dest` is an
    /// error; individual downloads are classified in the report.
    pub async fn scrape_and_download(
        &self,
        index_url: &str,
        dest: &Path,
    ) -> Result<DownloadReport, ConferenceError> {
        let links = self.paper_links(index_url).await?;
        info!("Found {} papers on {}", links.len(), index_url);
        tokio::fs::create_dir_all(dest).await?;

        let progress = ui::progress_bar(links.len() as u64, "Downloading", self.show_progress);
        let mut report = DownloadReport::new();
        for link in &links {
            let path = dest.join(format!("{}.pdf", link.name));
            progress.set_message(link.name.clone());
            report.push(download_file(&self.client, link.url.as_str(), &path).await);
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!("Finished {}: {}", index_url, report);
        Ok(report)
    }
}
