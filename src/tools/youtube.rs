//! Video search via the YouTube results page.
//!
//! The page embeds its data as `var ytInitialData = {...};`. We read that JSON
//! and collect `videoRenderer` objects in document order.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::{normalize_ws, Lookup};

pub const DEFAULT_ENDPOINT: &str = "https://www.youtube.com/results";
const WATCH_BASE: &str = "https://www.youtube.com/watch?v=";
const DEFAULT_LIMIT: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub title: String,
    pub link: String,
    pub description: String,
}

pub struct YouTubeSearch {
    client: reqwest::Client,
    endpoint: String,
    limit: usize,
}

impl YouTubeSearch {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            limit: DEFAULT_LIMIT,
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Video>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("search_query", query), ("hl", "en"), ("gl", "US")])
            .send()
            .await
            .context("YouTube request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("YouTube returned HTTP {}", status.as_u16());
        }
        let html = resp.text().await.context("Failed to read YouTube response")?;
        let data = initial_data(&html)?;
        let mut videos = Vec::new();
        collect_videos(&data, self.limit, &mut videos);
        Ok(videos)
    }
}

#[async_trait]
impl Lookup for YouTubeSearch {
    async fn lookup(&self, query: &str) -> String {
        match self.search(query).await {
            Ok(videos) => format_videos(&videos),
            Err(e) => {
                warn!(query, "YouTube search failed: {:#}", e);
                format!("YouTube search error: {:#}", e)
            }
        }
    }
}

pub fn format_videos(videos: &[Video]) -> String {
    if videos.is_empty() {
        return "No results found.".to_string();
    }
    videos
        .iter()
        .map(|v| format!("- {} - {}\n{}\nSource:{}", v.title, v.link, v.description, v.link))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract and parse the `ytInitialData` object from a results page.
fn initial_data(html: &str) -> Result<Value> {
    let marker = html
        .find("ytInitialData")
        .context("results page has no ytInitialData")?;
    let rest = &html[marker..];
    let start = rest.find('{').context("ytInitialData has no object")?;
    let mut stream = serde_json::Deserializer::from_str(&rest[start..]).into_iter::<Value>();
    stream
        .next()
        .context("ytInitialData is empty")?
        .context("ytInitialData is not valid JSON")
}

fn collect_videos(node: &Value, limit: usize, out: &mut Vec<Video>) {
    if out.len() >= limit {
        return;
    }
    match node {
        Value::Object(map) => {
            if let Some(renderer) = map.get("videoRenderer") {
                if let Some(video) = video_from_renderer(renderer) {
                    out.push(video);
                }
                return;
            }
            for value in map.values() {
                collect_videos(value, limit, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_videos(item, limit, out);
            }
        }
        _ => {}
    }
}

fn runs_text(node: &Value) -> String {
    if let Some(s) = node["simpleText"].as_str() {
        return s.to_string();
    }
    node["runs"]
        .as_array()
        .map(|runs| {
            runs.iter()
                .filter_map(|r| r["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn video_from_renderer(r: &Value) -> Option<Video> {
    let id = r["videoId"].as_str()?;
    let title = normalize_ws(&runs_text(&r["title"]));

    // Each snippet run is a fragment; join them with spaces.
    let fragments: Vec<&str> = r["detailedMetadataSnippets"]
        .get(0)
        .map(|s| &s["snippetText"])
        .or_else(|| r.get("descriptionSnippet"))
        .and_then(|s| s["runs"].as_array())
        .map(|runs| runs.iter().filter_map(|run| run["text"].as_str()).collect())
        .unwrap_or_default();
    let description = normalize_ws(&fragments.join(" "));

    Some(Video {
        title,
        link: format!("{}{}", WATCH_BASE, id),
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Router};
    use std::collections::HashMap;
    use std::net::SocketAddr;

    fn page(data: &Value) -> String {
        format!(
            "<html><head><script>var ytInitialData = {};</script><script>var other = {{}};</script></head></html>",
            data
        )
    }

    fn results_data() -> Value {
        serde_json::json!({
            "contents": {"twoColumnSearchResultsRenderer": {"primaryContents": {"sectionListRenderer": {"contents": [
                {"itemSectionRenderer": {"contents": [
                    {"adSlotRenderer": {"adSlotMetadata": {}}},
                    {"videoRenderer": {
                        "videoId": "JFozGfxmi8A",
                        "title": {"runs": [{"text": "Quantum Entanglement Explained"}]},
                        "detailedMetadataSnippets": [{"snippetText": {"runs": [
                            {"text": "How does"},
                            {"text": "quantum entanglement", "bold": true},
                            {"text": "work?"}
                        ]}}]
                    }},
                    {"shelfRenderer": {"content": {"verticalListRenderer": {"items": [
                        {"videoRenderer": {
                            "videoId": "5_0o2fJhtSc",
                            "title": {"simpleText": "Spooky action at a distance"}
                        }}
                    ]}}}},
                    {"videoRenderer": {"videoId": "third", "title": {"runs": [{"text": "Third"}]}}}
                ]}}
            ]}}}}
        })
    }

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[test]
    fn extracts_videos_in_order() {
        let data = initial_data(&page(&results_data())).unwrap();
        let mut videos = Vec::new();
        collect_videos(&data, 4, &mut videos);

        assert_eq!(videos.len(), 3);
        assert_eq!(videos[0].title, "Quantum Entanglement Explained");
        assert_eq!(videos[0].link, "https://www.youtube.com/watch?v=JFozGfxmi8A");
        assert_eq!(videos[0].description, "How does quantum entanglement work?");
        assert_eq!(videos[1].title, "Spooky action at a distance");
        assert_eq!(videos[1].description, "");
    }

    #[test]
    fn respects_limit() {
        let data = initial_data(&page(&results_data())).unwrap();
        let mut videos = Vec::new();
        collect_videos(&data, 2, &mut videos);
        assert_eq!(videos.len(), 2);
    }

    #[test]
    fn page_without_data_is_an_error() {
        assert!(initial_data("<html></html>").is_err());
    }

    #[test]
    fn no_videos_is_sentinel() {
        assert_eq!(format_videos(&[]), "No results found.");
    }

    #[tokio::test]
    async fn lookup_formats_each_video() {
        let app = Router::new().route(
            "/results",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let data = if q.get("search_query").map(String::as_str) == Some("entanglement") {
                    results_data()
                } else {
                    serde_json::json!({"contents": {}})
                };
                axum::response::Html(page(&data))
            }),
        );
        let addr = serve(app).await;
        let tool = YouTubeSearch::new(reqwest::Client::new(), &format!("http://{addr}/results"));

        let out = tool.lookup("entanglement").await;
        assert!(out.starts_with(
            "- Quantum Entanglement Explained - https://www.youtube.com/watch?v=JFozGfxmi8A\n"
        ));
        assert_eq!(out.matches("Source:").count(), 3);

        assert_eq!(tool.lookup("nothing").await, "No results found.");
    }

    #[tokio::test]
    async fn garbage_page_is_error_text() {
        let app = Router::new().route("/results", get(|| async { "not a results page" }));
        let addr = serve(app).await;
        let tool = YouTubeSearch::new(reqwest::Client::new(), &format!("http://{addr}/results"));

        let out = tool.lookup("anything").await;
        assert!(out.starts_with("YouTube search error:"), "{out}");
    }

    #[tokio::test]
    async fn throttled_is_error_text() {
        let app = Router::new().route("/results", get(|| async { StatusCode::TOO_MANY_REQUESTS }));
        let addr = serve(app).await;
        let tool = YouTubeSearch::new(reqwest::Client::new(), &format!("http://{addr}/results"));

        let out = tool.lookup("entanglement").await;
        assert!(out.starts_with("YouTube search error:"), "{out}");
        assert!(out.contains("429"), "{out}");
    }

    #[tokio::test]
    async fn unreachable_backend_is_error_text() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let tool = YouTubeSearch::new(reqwest::Client::new(), &format!("http://{addr}/results"));

        let out = tool.lookup("entanglement").await;
        assert!(out.starts_with("YouTube search error:"), "{out}");
    }
}
