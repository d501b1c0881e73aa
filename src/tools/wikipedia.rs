//! Encyclopedia summaries from the MediaWiki action API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::Lookup;

pub const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
const PAGE_BASE: &str = "https://en.wikipedia.org/wiki/";
const SENTENCES: u32 = 2;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: serde_json::Map<String, serde_json::Value>,
}

pub struct WikipediaSummary {
    client: reqwest::Client,
    endpoint: String,
    sentences: u32,
}

impl WikipediaSummary {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            sentences: SENTENCES,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(params)
            .send()
            .await
            .context("Wikipedia request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Wikipedia returned HTTP {}", status.as_u16());
        }
        resp.json::<T>().await.context("Failed to parse Wikipedia JSON")
    }

    /// Best-matching page title, if any.
    pub async fn best_title(&self, query: &str) -> Result<Option<String>> {
        let resp: SearchResponse = self
            .get_json(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "1"),
                ("srprop", ""),
                ("format", "json"),
            ])
            .await?;
        Ok(resp.query.search.into_iter().next().map(|hit| hit.title))
    }

    /// Plain-text summary of the first few sentences of a page.
    pub async fn summary(&self, title: &str) -> Result<String> {
        let sentences = self.sentences.to_string();
        let resp: ExtractResponse = self
            .get_json(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("exsentences", sentences.as_str()),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
            ])
            .await?;

        resp.query
            .pages
            .values()
            .find_map(|page| page["extract"].as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("page \"{}\" has no summary", title))
    }

    async fn describe(&self, query: &str) -> Result<Option<String>> {
        let Some(title) = self.best_title(query).await? else {
            return Ok(None);
        };
        let summary = self.summary(&title).await?;
        Ok(Some(format_summary(&title, &summary)))
    }
}

#[async_trait]
impl Lookup for WikipediaSummary {
    async fn lookup(&self, query: &str) -> String {
        match self.describe(query).await {
            Ok(Some(text)) => text,
            Ok(None) => "No Wikipedia page found.".to_string(),
            Err(e) => {
                warn!(query, "Wikipedia lookup failed: {:#}", e);
                format!("Wikipedia error: {:#}", e)
            }
        }
    }
}

pub fn page_url(title: &str) -> String {
    format!("{}{}", PAGE_BASE, title.replace(' ', "_"))
}

pub fn format_summary(title: &str, summary: &str) -> String {
    format!("Wikipedia: {}\n{}\nSource:{}", title, summary, page_url(title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use std::collections::HashMap;
    use std::net::SocketAddr;

    const SUMMARY: &str = "Quantum entanglement is the phenomenon where the quantum state of each \
        particle in a group cannot be described independently of the state of the others. \
        The topic of quantum entanglement is at the heart of the disparity between classical \
        and quantum physics.";

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn fixture() -> Router {
        Router::new().route(
            "/w/api.php",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let param = |k: &str| q.get(k).cloned().unwrap_or_default();
                if param("list") == "search" {
                    let hits = if param("srsearch").contains("entanglement") {
                        serde_json::json!([{"ns": 0, "title": "Quantum entanglement"}])
                    } else {
                        serde_json::json!([])
                    };
                    return Json(serde_json::json!({"query": {"search": hits}}));
                }
                assert_eq!(param("prop"), "extracts");
                assert_eq!(param("exsentences"), "2");
                assert_eq!(param("titles"), "Quantum entanglement");
                Json(serde_json::json!({
                    "query": {"pages": {"25336": {
                        "pageid": 25336,
                        "title": "Quantum entanglement",
                        "extract": SUMMARY
                    }}}
                }))
            }),
        )
    }

    #[test]
    fn page_url_uses_underscores() {
        assert_eq!(
            page_url("Quantum entanglement"),
            "https://en.wikipedia.org/wiki/Quantum_entanglement"
        );
    }

    #[tokio::test]
    async fn quantum_entanglement_summary() {
        let addr = serve(fixture()).await;
        let tool = WikipediaSummary::new(reqwest::Client::new(), &format!("http://{addr}/w/api.php"));

        let out = tool.lookup("quantum entanglement").await;
        assert!(out.starts_with("Wikipedia: Quantum entanglement"), "{out}");
        assert!(out.contains(SUMMARY));
        assert_eq!(
            out.lines().last(),
            Some("Source:https://en.wikipedia.org/wiki/Quantum_entanglement")
        );
    }

    #[tokio::test]
    async fn no_match_is_sentinel() {
        let addr = serve(fixture()).await;
        let tool = WikipediaSummary::new(reqwest::Client::new(), &format!("http://{addr}/w/api.php"));

        assert_eq!(tool.lookup("zzzxqv").await, "No Wikipedia page found.");
    }

    #[tokio::test]
    async fn server_error_is_error_text() {
        let app = Router::new().route(
            "/w/api.php",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let addr = serve(app).await;
        let tool = WikipediaSummary::new(reqwest::Client::new(), &format!("http://{addr}/w/api.php"));

        let out = tool.lookup("quantum entanglement").await;
        assert!(out.starts_with("Wikipedia error:"), "{out}");
        assert!(out.contains("500"), "{out}");
    }

    #[tokio::test]
    async fn unreachable_backend_is_error_text() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let tool = WikipediaSummary::new(reqwest::Client::new(), &format!("http://{addr}/w/api.php"));

        let out = tool.lookup("anything").await;
        assert!(out.starts_with("Wikipedia error:"), "{out}");
    }
}
