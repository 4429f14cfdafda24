use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::types::{PaperRecord, SearchRequest};
use super::PaperSource;
use crate::config::ArxivConfig;

/// The only category the trend report looks at.
pub const CATEGORY: &str = "cs.AI";

/// arXiv caps a single response well above this; 100 keeps pages fast.
const PAGE_SIZE: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum ArxivError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("arXiv returned HTTP {status}")]
    Status { status: u16 },
    #[error("arXiv unexpected content-type: {content_type} body: {preview}")]
    ContentType {
        content_type: String,
        preview: String,
    },
    #[error("arXiv API error: {0}")]
    Api(String),
    #[error("XML parse error: {0}")]
    Xml(String),
}

/// Paged client for the arXiv Atom query API.
#[derive(Clone)]
pub struct ArxivClient {
    http: Client,
    base: String,
    pause: Duration,
}

impl ArxivClient {
    /// Build a client with a fixed user agent and per-request timeout.
    pub fn new(config: &ArxivConfig) -> Result<Self, ArxivError> {
        let http = Client::builder()
            .user_agent(concat!("arxiv-trend/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base: config.base_url.clone(),
            pause: config.pause,
        })
    }

    /// Category + inclusive submission-date range for one calendar year.
    pub fn build_query(year: i32) -> String {
        format!("cat:{CATEGORY} AND submittedDate:[{year}0101 TO {year}1231]")
    }

    /// Fetch up to `max_results` records for the request, newest first.
    ///
    /// Consecutive page requests are separated by the configured pause.
    pub async fn fetch(&self, request: &SearchRequest) -> Result<Vec<PaperRecord>, ArxivError> {
        let query = Self::build_query(request.year());
        let max = request.max_results();
        info!(query = %query, max_results = max, "querying arXiv");

        let mut records: Vec<PaperRecord> = Vec::with_capacity(max.min(1000));
        let mut start = 0usize;
        while records.len() < max {
            if start > 0 {
                tokio::time::sleep(self.pause).await;
            }
            let page_size = (max - records.len()).min(PAGE_SIZE);
            let page = self.search_page(&query, start, page_size).await?;
            debug!(
                start,
                page_size,
                entries = page.entries,
                kept = page.records.len(),
                "arXiv page received"
            );
            records.extend(page.records);
            // Skipped entries still count toward the provider's page.
            if page.entries < page_size {
                break;
            }
            start += page.entries;
        }
        records.truncate(max);
        Ok(records)
    }

    async fn search_page(
        &self,
        query: &str,
        start: usize,
        page_size: usize,
    ) -> Result<AtomPage, ArxivError> {
        let resp = self
            .http
            .get(&self.base)
            .query(&[("search_query", query)])
            .query(&[("start", start), ("max_results", page_size)])
            .query(&[("sortBy", "submittedDate"), ("sortOrder", "descending")])
            .header(ACCEPT, "application/atom+xml, application/xml;q=0.9, text/xml;q=0.8")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ArxivError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();
        if !(content_type.contains("xml") || content_type.contains("atom")) {
            let body = resp.text().await.unwrap_or_default();
            let mut preview = body.trim().to_string();
            if preview.len() > 200 {
                let cut = (0..=200).rev().find(|i| preview.is_char_boundary(*i)).unwrap_or(0);
                preview.truncate(cut);
                preview.push('…');
            }
            return Err(ArxivError::ContentType {
                content_type,
                preview,
            });
        }

        let text = resp.text().await?;
        parse_atom_feed(&text)
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn search(&self, request: SearchRequest) -> Vec<PaperRecord> {
        let papers = match self.fetch(&request).await {
            Ok(papers) => {
                info!(year = request.year(), found = papers.len(), "arXiv search complete");
                papers
            }
            Err(e) => {
                error!(year = request.year(), error = %e, "arXiv search failed, treating as zero results");
                Vec::new()
            }
        };
        tokio::time::sleep(self.pause).await;
        papers
    }
}

/// One parsed feed: the usable records plus how many `<entry>` elements
/// the feed held.
#[derive(Debug, Default)]
pub(crate) struct AtomPage {
    pub records: Vec<PaperRecord>,
    pub entries: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
}

#[derive(Default)]
struct EntryBuilder {
    id: String,
    title: String,
    summary: String,
    published: String,
    categories: BTreeSet<String>,
}

impl EntryBuilder {
    fn push_text(&mut self, field: Field, text: &str) {
        match field {
            Field::Id => self.id.push_str(text),
            Field::Title => self.title.push_str(text),
            Field::Summary => self.summary.push_str(text),
            Field::Published => self.published.push_str(text),
        }
    }

    fn finish(self) -> Result<Option<PaperRecord>, ArxivError> {
        if self.id.contains("/api/errors") {
            return Err(ArxivError::Api(self.summary.trim().to_string()));
        }
        let Some(published) = parse_published(&self.published) else {
            warn!(id = %self.id.trim(), published = %self.published, "skipping entry with unparseable date");
            return Ok(None);
        };
        Ok(Some(PaperRecord {
            title: collapse_whitespace(&self.title),
            abstract_text: self.summary.trim().to_string(),
            published,
            categories: self.categories,
        }))
    }
}

fn parse_published(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            raw.get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn parse_atom_feed(xml: &str) -> Result<AtomPage, ArxivError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut out = AtomPage::default();

    let mut entry: Option<EntryBuilder> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    entry = Some(EntryBuilder::default());
                    field = None;
                }
                b"id" if entry.is_some() => field = Some(Field::Id),
                b"title" if entry.is_some() => field = Some(Field::Title),
                b"summary" if entry.is_some() => field = Some(Field::Summary),
                b"published" if entry.is_some() => field = Some(Field::Published),
                b"category" => {
                    if let Some(cur) = entry.as_mut() {
                        push_category(cur, &e);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"category" {
                    if let Some(cur) = entry.as_mut() {
                        push_category(cur, &e);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(cur), Some(f)) = (entry.as_mut(), field) {
                    let text = t.unescape().map_err(|e| ArxivError::Xml(e.to_string()))?;
                    cur.push_text(f, &text);
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(cur), Some(f)) = (entry.as_mut(), field) {
                    cur.push_text(f, &String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"entry" {
                    field = None;
                    if let Some(done) = entry.take() {
                        out.entries += 1;
                        if let Some(record) = done.finish()? {
                            out.records.push(record);
                        }
                    }
                } else {
                    field = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ArxivError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn push_category(cur: &mut EntryBuilder, e: &quick_xml::events::BytesStart<'_>) {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"term" {
            let term = String::from_utf8_lossy(&attr.value).trim().to_string();
            if !term.is_empty() {
                cur.categories.insert(term);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query</title>
  <id>http://arxiv.org/api/feed</id>
  <entry>
    <id>http://arxiv.org/abs/2203.01234v2</id>
    <updated>2022-03-09T12:00:00Z</updated>
    <published>2022-03-02T17:59:59Z</published>
    <title>Tool Use in
      Language Agents</title>
    <summary>  We study agents that call tools &amp; plan.  </summary>
    <author><name>Doe, J.</name></author>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.AI"/>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2201.00001v1</id>
    <published>2022-01-01T00:00:01Z</published>
    <title>Graph Coloring Heuristics</title>
    <summary>A study of heuristics.</summary>
    <category term="cs.AI"/>
  </entry>
</feed>
"#;

    #[test]
    fn parses_entries_into_records() {
        let page = parse_atom_feed(SAMPLE).expect("parse");
        assert_eq!(page.entries, 2);
        let records = page.records;
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "Tool Use in Language Agents");
        assert_eq!(first.abstract_text, "We study agents that call tools & plan.");
        assert_eq!(first.published, NaiveDate::from_ymd_opt(2022, 3, 2).unwrap());
        assert_eq!(
            first.categories.iter().cloned().collect::<Vec<_>>(),
            vec!["cs.AI".to_string(), "cs.CL".to_string()]
        );

        assert_eq!(records[1].title, "Graph Coloring Heuristics");
    }

    #[test]
    fn error_entry_surfaces_as_api_error() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_x</id>
    <title>Error</title>
    <summary>incorrect id format for x</summary>
    <updated>2022-01-01T00:00:00-05:00</updated>
  </entry>
</feed>"#;
        match parse_atom_feed(xml) {
            Err(ArxivError::Api(msg)) => assert_eq!(msg, "incorrect id format for x"),
            other => panic!("expected API error, got {:?}", other.map(|p| p.entries)),
        }
    }

    #[test]
    fn entry_without_date_is_skipped() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2201.00002v1</id>
    <title>No Date</title>
    <summary>Nothing here.</summary>
  </entry>
</feed>"#;
        let page = parse_atom_feed(xml).unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.entries, 1);
    }

    #[test]
    fn query_covers_whole_year() {
        assert_eq!(
            ArxivClient::build_query(2021),
            "cat:cs.AI AND submittedDate:[20210101 TO 20211231]"
        );
    }

    #[tokio::test]
    async fn failed_search_returns_empty_and_still_pauses() {
        let config = ArxivConfig {
            // Nothing listens on the discard port.
            base_url: "http://127.0.0.1:9/api/query".to_string(),
            pause: Duration::from_millis(20),
        };
        let client = ArxivClient::new(&config).unwrap();
        let request = SearchRequest::new(2022, 5).unwrap();

        let started = Instant::now();
        for _ in 0..3 {
            assert!(client.search(request).await.is_empty());
        }
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    /// Served requests: arrival time plus the `start` and `max_results` asked for.
    type RequestLog = Arc<Mutex<Vec<(Instant, usize, usize)>>>;

    fn query_param(request_line: &str, key: &str) -> usize {
        let query = request_line
            .split_whitespace()
            .nth(1)
            .and_then(|target| target.split_once('?'))
            .map(|(_, q)| q)
            .unwrap_or_default();
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0)
    }

    fn feed_page(start: usize, count: usize, undated: &[usize]) -> String {
        let mut body = String::from(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
        for n in start..start + count {
            let published = if undated.contains(&n) {
                String::new()
            } else {
                "<published>2022-05-01T00:00:00Z</published>".to_string()
            };
            body.push_str(&format!(
                "<entry><id>http://arxiv.org/abs/2205.{n:05}v1</id>{published}\
                 <title>Paper {n}</title><summary>Abstract {n}.</summary>\
                 <category term=\"cs.AI\"/></entry>"
            ));
        }
        body.push_str("</feed>");
        body
    }

    /// Local Atom endpoint that answers every page in full, leaving the
    /// listed entry numbers without a publication date.
    async fn serve_feed(undated: Vec<usize>) -> (String, RequestLog) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
        let served = log.clone();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut raw = Vec::new();
                let mut chunk = [0u8; 4096];
                while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => raw.extend_from_slice(&chunk[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&raw);
                let line = head.lines().next().unwrap_or_default();
                let start = query_param(line, "start");
                let count = query_param(line, "max_results");
                served.lock().unwrap().push((Instant::now(), start, count));

                let body = feed_page(start, count, &undated);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/atom+xml; charset=utf-8\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{addr}/api/query"), log)
    }

    #[tokio::test]
    async fn pages_are_spaced_by_the_pause() {
        let (base_url, log) = serve_feed(Vec::new()).await;
        let client = ArxivClient::new(&ArxivConfig {
            base_url,
            pause: Duration::from_millis(50),
        })
        .unwrap();

        let records = client
            .fetch(&SearchRequest::new(2022, 200).unwrap())
            .await
            .unwrap();

        assert_eq!(records.len(), 200);
        let requests = log.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!((requests[0].1, requests[0].2), (0, 100));
        assert_eq!((requests[1].1, requests[1].2), (100, 100));
        assert!(requests[1].0.duration_since(requests[0].0) >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn skipped_entries_do_not_end_paging() {
        let (base_url, log) = serve_feed(vec![0]).await;
        let client = ArxivClient::new(&ArxivConfig {
            base_url,
            pause: Duration::from_millis(1),
        })
        .unwrap();

        let records = client
            .fetch(&SearchRequest::new(2022, 200).unwrap())
            .await
            .unwrap();

        assert_eq!(records.len(), 200);
        assert_eq!(records[0].title, "Paper 1");
        let requests = log.lock().unwrap();
        let pages: Vec<_> = requests.iter().map(|(_, start, count)| (*start, *count)).collect();
        assert_eq!(pages, vec![(0, 100), (100, 100), (200, 1)]);
    }
}
