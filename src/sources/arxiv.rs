//! arXiv Atom API source.

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use crate::models::{FeedPage, Link, RawEntry, SearchQuery};
use crate::sources::{PageFetcher, SourceError};
use crate::utils::HttpClient;

/// Base URL for arXiv API
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Page fetcher for the arXiv query API
#[derive(Debug, Clone)]
pub struct ArxivClient {
    client: HttpClient,
    base_url: String,
}

impl ArxivClient {
    /// Create a client against the public API
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, ARXIV_API_URL)
    }

    /// Create a client against another endpoint (for testing)
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build the request URL for one page
    pub fn page_url(&self, query: &SearchQuery, offset: usize, page_size: usize) -> String {
        format!(
            "{}?search_query={}&id_list={}&sortBy={}&sortOrder={}&start={}&max_results={}",
            self.base_url,
            urlencoding::encode(&query.query),
            urlencoding::encode(&query.id_list.join(",")),
            query.sort_by.as_str(),
            query.sort_order.as_str(),
            offset,
            page_size
        )
    }
}

#[async_trait]
impl PageFetcher for ArxivClient {
    fn id(&self) -> &str {
        "arxiv"
    }

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        offset: usize,
        page_size: usize,
    ) -> Result<FeedPage, SourceError> {
        let url = self.page_url(query, offset, page_size);
        debug!("Requesting page {}", url);

        let body = self.client.get_text(&url).await?;
        parse_feed(&body)
    }
}

/// Parse an arXiv Atom feed into a page of raw entries.
///
/// Element names are matched without their namespace prefix, so
/// `opensearch:totalResults`, `arxiv:doi` and friends are picked up
/// regardless of how the document binds its prefixes.
pub fn parse_feed(xml: &str) -> Result<FeedPage, SourceError> {
    let mut reader = Reader::from_str(xml);

    let mut total_results = None;
    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                text.clear();
                if e.local_name().as_ref() == b"entry" {
                    current = Some(RawEntry::default());
                } else if let Some(entry) = current.as_mut() {
                    read_attributes(entry, &e)?;
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(entry) = current.as_mut() {
                    read_attributes(entry, &e)?;
                }
            }
            Ok(Event::Text(e)) => text.push_str(&e.unescape()?),
            Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::End(e)) => {
                let value = std::mem::take(&mut text).trim().to_string();
                match e.local_name().as_ref() {
                    b"entry" => {
                        if let Some(entry) = current.take() {
                            check_api_error(&entry)?;
                            entries.push(entry);
                        }
                    }
                    b"totalResults" if current.is_none() => {
                        let total = value.parse().map_err(|_| {
                            SourceError::Parse(format!("Invalid totalResults: {:?}", value))
                        })?;
                        total_results = Some(total);
                    }
                    name => {
                        if let Some(entry) = current.as_mut() {
                            set_text_field(entry, name, value);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SourceError::Parse(format!(
                    "XML parsing error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
        }
    }

    let total_results = total_results
        .ok_or_else(|| SourceError::Parse("Feed has no totalResults element".to_string()))?;

    Ok(FeedPage::new(total_results, entries))
}

fn set_text_field(entry: &mut RawEntry, name: &[u8], value: String) {
    if value.is_empty() {
        return;
    }
    match name {
        b"id" => entry.id = Some(value),
        b"title" => entry.title = Some(value),
        b"summary" => entry.summary = Some(value),
        b"published" => entry.published = Some(value),
        b"updated" => entry.updated = Some(value),
        b"name" => entry.authors.push(value),
        b"comment" => entry.comment = Some(value),
        b"doi" => entry.doi = Some(value),
        b"journal_ref" => entry.journal_ref = Some(value),
        _ => {}
    }
}

fn read_attributes(entry: &mut RawEntry, e: &BytesStart<'_>) -> Result<(), SourceError> {
    match e.local_name().as_ref() {
        b"link" => {
            if let Some(href) = get_attr(e, b"href")? {
                entry.links.push(Link {
                    href,
                    rel: get_attr(e, b"rel")?,
                    title: get_attr(e, b"title")?,
                    content_type: get_attr(e, b"type")?,
                });
            }
        }
        b"primary_category" => entry.primary_category = get_attr(e, b"term")?,
        b"category" => {
            if let Some(term) = get_attr(e, b"term")? {
                entry.categories.push(term);
            }
        }
        _ => {}
    }
    Ok(())
}

fn get_attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, SourceError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| SourceError::Parse(format!("XML attribute: {}", err)))?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// The API reports malformed queries as a single entry under `/api/errors`.
fn check_api_error(entry: &RawEntry) -> Result<(), SourceError> {
    match entry.id.as_deref() {
        Some(id) if id.contains("/api/errors") => Err(SourceError::Api(
            entry
                .summary
                .clone()
                .unwrap_or_else(|| "arXiv rejected the query".to_string()),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResultEntry, SortBy, SortOrder};
    use mockito::Matcher;
    use std::time::Duration;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <link href="http://arxiv.org/api/query?search_query=cat:cs.CV" rel="self" type="application/atom+xml"/>
  <title type="html">ArXiv Query: search_query=cat:cs.CV</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2023-10-01T00:00:00-04:00</updated>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">2843</opensearch:totalResults>
  <opensearch:startIndex xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">0</opensearch:startIndex>
  <opensearch:itemsPerPage xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">2</opensearch:itemsPerPage>
  <entry>
    <id>http://arxiv.org/abs/2309.17448v1</id>
    <updated>2023-09-29T17:59:57Z</updated>
    <published>2023-09-29T17:59:57Z</published>
    <title>SMPLer-X: Scaling Up Expressive
  Human Pose and Shape Estimation</title>
    <summary>  Expressive human pose and shape estimation (EHPS) unifies body, hands, and
face motion capture &amp; has numerous applications.
</summary>
    <author>
      <name>Zhongang Cai</name>
    </author>
    <author>
      <name>Wanqi Yin</name>
    </author>
    <arxiv:comment xmlns:arxiv="http://arxiv.org/schemas/atom">Homepage: https://caizhongang.github.io/projects/SMPLer-X/</arxiv:comment>
    <link href="http://arxiv.org/abs/2309.17448v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2309.17448v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2309.17446v2</id>
    <updated>2023-10-02T08:00:00Z</updated>
    <published>2023-09-29T17:59:54Z</published>
    <title>L2CEval</title>
    <summary><![CDATA[Evaluating <b>language</b> models.]]></summary>
    <author>
      <name>Ansong Ni</name>
      <arxiv:affiliation xmlns:arxiv="http://arxiv.org/schemas/atom">Yale</arxiv:affiliation>
    </author>
    <arxiv:doi xmlns:arxiv="http://arxiv.org/schemas/atom">10.1000/xyz123</arxiv:doi>
    <arxiv:journal_ref xmlns:arxiv="http://arxiv.org/schemas/atom">TACL 2024</arxiv:journal_ref>
    <link href="http://arxiv.org/abs/2309.17446v2" rel="alternate" type="text/html"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=ti:nothingmatches</title>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">1</opensearch:totalResults>
</feed>"#;

    fn client(base_url: &str) -> ArxivClient {
        ArxivClient::with_base_url(
            HttpClient::new(Duration::from_secs(5)).unwrap(),
            format!("{}/api/query", base_url),
        )
    }

    #[test]
    fn test_parse_feed() {
        let page = parse_feed(FEED).unwrap();
        assert_eq!(page.total_results, 2843);
        assert_eq!(page.entries.len(), 2);

        let first = &page.entries[0];
        assert_eq!(first.id.as_deref(), Some("http://arxiv.org/abs/2309.17448v1"));
        assert_eq!(first.authors, vec!["Zhongang Cai", "Wanqi Yin"]);
        assert!(first.summary.as_deref().unwrap().contains("capture & has"));
        assert_eq!(first.primary_category.as_deref(), Some("cs.CV"));
        assert_eq!(first.categories, vec!["cs.CV", "cs.AI"]);
        assert_eq!(first.links.len(), 2);
        assert_eq!(first.doi, None);

        let second = &page.entries[1];
        assert_eq!(second.summary.as_deref(), Some("Evaluating <b>language</b> models."));
        assert_eq!(second.authors, vec!["Ansong Ni"]);
        assert_eq!(second.doi.as_deref(), Some("10.1000/xyz123"));
        assert_eq!(second.journal_ref.as_deref(), Some("TACL 2024"));
    }

    #[test]
    fn test_parsed_entries_convert() {
        let page = parse_feed(FEED).unwrap();
        let entries: Vec<ResultEntry> = page
            .entries
            .into_iter()
            .map(|raw| ResultEntry::try_from(raw).unwrap())
            .collect();

        assert_eq!(
            entries[0].title,
            "SMPLer-X: Scaling Up Expressive Human Pose and Shape Estimation"
        );
        assert_eq!(entries[0].pdf_url, "http://arxiv.org/pdf/2309.17448v1");
        // no pdf link in the feed, derived from the entry id
        assert_eq!(entries[1].pdf_url, "http://arxiv.org/pdf/2309.17446v2");
    }

    #[test]
    fn test_parse_empty_feed_misreports_total() {
        let page = parse_feed(EMPTY_FEED).unwrap();
        assert!(page.entries.is_empty());
        assert_eq!(page.total_results, 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_feed("<feed></feed>"), Err(SourceError::Parse(_))));
        assert!(matches!(
            parse_feed("<feed><entry></feed>"),
            Err(SourceError::Parse(_))
        ));

        let api_error = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">1</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
  </entry>
</feed>"#;
        match parse_feed(api_error) {
            Err(SourceError::Api(msg)) => assert_eq!(msg, "incorrect id format for 1234"),
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_page_url() {
        let client = client("http://localhost");
        let query = SearchQuery::new("cat:cs.CV AND ti:nerf")
            .id_list(["2309.00001", "2309.00002"])
            .sort_by(SortBy::LastUpdatedDate)
            .sort_order(SortOrder::Ascending);

        assert_eq!(
            client.page_url(&query, 200, 100),
            "http://localhost/api/query?search_query=cat%3Acs.CV%20AND%20ti%3Anerf\
             &id_list=2309.00001%2C2309.00002&sortBy=lastUpdatedDate&sortOrder=ascending\
             &start=200&max_results=100"
        );
    }

    #[tokio::test]
    async fn test_fetch_page_with_mockito() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_query".into(), "cat:cs.CV".into()),
                Matcher::UrlEncoded("sortBy".into(), "submittedDate".into()),
                Matcher::UrlEncoded("sortOrder".into(), "descending".into()),
                Matcher::UrlEncoded("start".into(), "0".into()),
                Matcher::UrlEncoded("max_results".into(), "2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let page = client(&server.url())
            .fetch_page(&SearchQuery::new("cat:cs.CV"), 0, 2)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_page_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let result = client(&server.url())
            .fetch_page(&SearchQuery::new("cat:cs.CV"), 0, 10)
            .await;

        assert!(matches!(result, Err(SourceError::Api(_))));
    }
}
