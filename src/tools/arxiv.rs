//! Most relevant paper from the arXiv Atom API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use tracing::warn;

use super::{normalize_ws, Lookup};

pub const DEFAULT_ENDPOINT: &str = "https://export.arxiv.org/api/query";
const ABSTRACT_CHARS: usize = 400;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paper {
    /// Entry id, which is also the abstract page URL.
    pub entry_id: String,
    pub title: String,
    pub summary: String,
}

pub struct ArxivSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl ArxivSearch {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    pub async fn top_paper(&self, query: &str) -> Result<Option<Paper>> {
        let search_query = format!("all:{}", query.trim());
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", "1"),
                ("sortBy", "relevance"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .context("arXiv request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("arXiv returned HTTP {}", status.as_u16());
        }
        let body = resp.text().await.context("Failed to read arXiv response")?;
        Ok(parse_feed(&body)?.into_iter().next())
    }
}

#[async_trait]
impl Lookup for ArxivSearch {
    async fn lookup(&self, query: &str) -> String {
        match self.top_paper(query).await {
            Ok(Some(paper)) => format_paper(&paper),
            Ok(None) => "No arXiv paper found.".to_string(),
            Err(e) => {
                warn!(query, "arXiv lookup failed: {:#}", e);
                format!("arXiv error: {:#}", e)
            }
        }
    }
}

pub fn format_paper(paper: &Paper) -> String {
    let snippet: String = paper.summary.chars().take(ABSTRACT_CHARS).collect();
    format!(
        "arXiv: {}\nLink: {}\n{}...\nSource:{}",
        paper.title, paper.entry_id, snippet, paper.entry_id
    )
}

fn parse_feed(body: &str) -> Result<Vec<Paper>> {
    let mut reader = quick_xml::Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut papers = Vec::new();
    let mut cur: Option<Paper> = None;
    let mut text = String::new();

    loop {
        match reader.read_event().context("Malformed arXiv feed")? {
            Event::Eof => break,
            Event::Start(e) => {
                if e.local_name().as_ref() == b"entry" {
                    cur = Some(Paper::default());
                }
                text.clear();
            }
            Event::Text(t) => {
                let t = t.unescape().context("Malformed arXiv feed text")?;
                text.push_str(&t);
            }
            Event::CData(t) => {
                text.push_str(&String::from_utf8_lossy(&t));
            }
            Event::End(e) => {
                let name = e.local_name();
                match (name.as_ref(), cur.as_mut()) {
                    (b"entry", _) => papers.extend(cur.take()),
                    (b"id", Some(p)) => p.entry_id = text.trim().to_string(),
                    (b"title", Some(p)) => p.title = normalize_ws(&text),
                    (b"summary", Some(p)) => p.summary = normalize_ws(&text),
                    _ => {}
                }
                text.clear();
            }
            _ => {}
        }
    }

    Ok(papers)
}
