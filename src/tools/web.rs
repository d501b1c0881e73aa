//! Web search over DuckDuckGo's HTML endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::warn;

use super::{normalize_ws, Lookup};

pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const REGION: &str = "us-en";
const DEFAULT_LIMIT: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct WebResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

pub struct WebSearch {
    client: reqwest::Client,
    endpoint: String,
    limit: usize,
}

impl WebSearch {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            limit: DEFAULT_LIMIT,
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<WebResult>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("kl", REGION)])
            .send()
            .await
            .context("DuckDuckGo request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("DuckDuckGo returned HTTP {}", status.as_u16());
        }
        let html = resp.text().await.context("Failed to read DuckDuckGo response")?;
        Ok(parse_results(&html, self.limit))
    }
}

#[async_trait]
impl Lookup for WebSearch {
    async fn lookup(&self, query: &str) -> String {
        match self.search(query).await {
            Ok(results) => format_results(&results),
            Err(e) => {
                warn!(query, "Web search failed: {:#}", e);
                format!("Web search error: {:#}", e)
            }
        }
    }
}

pub fn format_results(results: &[WebResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }
    results
        .iter()
        .map(|r| format!("- {} - {}\n{}\nSource:{}", r.title, r.link, r.snippet, r.link))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_results(html: &str, limit: usize) -> Vec<WebResult> {
    let document = Html::parse_document(html);

    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse(".result"),
        Selector::parse(".result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for element in document.select(&result_sel) {
        if results.len() >= limit {
            break;
        }
        let Some(anchor) = element.select(&link_sel).next() else {
            continue;
        };
        let title = normalize_ws(&anchor.text().collect::<String>());
        let link = unwrap_redirect(anchor.value().attr("href").unwrap_or(""));
        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| normalize_ws(&el.text().collect::<String>()))
            .unwrap_or_default();

        if title.is_empty() || link.is_empty() {
            continue;
        }
        results.push(WebResult { title, link, snippet });
    }
    results
}

/// DuckDuckGo wraps result links as `//duckduckgo.com/l/?uddg=<encoded target>`.
fn unwrap_redirect(raw: &str) -> String {
    let raw = raw.trim();
    let absolute = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw.to_string()
    };
    let Ok(parsed) = url::Url::parse(&absolute) else {
        return absolute;
    };
    let is_ddg = parsed
        .domain()
        .map(|d| d == "duckduckgo.com" || d.ends_with(".duckduckgo.com"))
        .unwrap_or(false);
    if is_ddg && parsed.path().starts_with("/l/") {
        if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "uddg") {
            return target.into_owned();
        }
    }
    absolute
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Router};
    use std::collections::HashMap;
    use std::net::SocketAddr;

    const PAGE: &str = r#"
    <html><body>
      <div class="result results_links web-result">
        <h2 class="result__title">
          <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">Rust <b>Programming</b> Language</a>
        </h2>
        <a class="result__snippet" href="x">A language empowering everyone to build
          reliable and efficient software.</a>
      </div>
      <div class="result">
        <a class="result__a" href="https://doc.rust-lang.org/book/">The Rust Book</a>
        <a class="result__snippet">Learn Rust.</a>
      </div>
      <div class="result">
        <a class="result__a" href="https://example.com/third">Third</a>
      </div>
    </body></html>
    "#;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[test]
    fn parses_results_and_unwraps_redirects() {
        let results = parse_results(PAGE, 5);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].link, "https://www.rust-lang.org/");
        assert_eq!(
            results[0].snippet,
            "A language empowering everyone to build reliable and efficient software."
        );
        assert_eq!(results[1].link, "https://doc.rust-lang.org/book/");
        assert_eq!(results[2].snippet, "");
    }

    #[test]
    fn respects_limit() {
        assert_eq!(parse_results(PAGE, 2).len(), 2);
    }

    #[test]
    fn formats_every_result_with_source() {
        let out = format_results(&parse_results(PAGE, 2));
        assert!(out.starts_with("- Rust Programming Language - https://www.rust-lang.org/\n"));
        assert!(out.contains("Source:https://www.rust-lang.org/"));
        assert!(out.ends_with("Source:https://doc.rust-lang.org/book/"));
    }

    #[test]
    fn empty_page_is_no_result() {
        let results = parse_results("<html><body></body></html>", 4);
        assert!(results.is_empty());
        assert_eq!(format_results(&results), "No results found.");
    }

    #[tokio::test]
    async fn lookup_sends_query_and_region() {
        let app = Router::new().route(
            "/html/",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if q.get("q").map(String::as_str) == Some("rust lang")
                    && q.get("kl").map(String::as_str) == Some("us-en")
                {
                    axum::response::Html(PAGE.to_string())
                } else {
                    axum::response::Html("<html></html>".to_string())
                }
            }),
        );
        let addr = serve(app).await;
        let tool = WebSearch::new(reqwest::Client::new(), &format!("http://{addr}/html/"));

        let out = tool.lookup("rust lang").await;
        assert_eq!(out.matches("Source:").count(), 3);

        let out = tool.lookup("nothing").await;
        assert_eq!(out, "No results found.");
    }

    #[tokio::test]
    async fn backend_failure_becomes_error_text() {
        let app = Router::new().route("/html/", get(|| async { StatusCode::FORBIDDEN }));
        let addr = serve(app).await;
        let tool = WebSearch::new(reqwest::Client::new(), &format!("http://{addr}/html/"));

        let out = tool.lookup("anything").await;
        assert!(out.starts_with("Web search error:"), "{out}");
        assert!(out.contains("403"), "{out}");
    }
}
