pub mod arxiv;
pub mod web;
pub mod wikipedia;
pub mod youtube;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use arxiv::ArxivSearch;
use web::WebSearch;
use wikipedia::WikipediaSummary;
use youtube::YouTubeSearch;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// A single lookup backend. Implementations never fail: every error path is
/// rendered into the returned observation text.
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, query: &str) -> String;
}

/// The closed set of tools the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum Tool {
    #[name = "Websearch"]
    WebSearch,
    #[name = "Wikipedia"]
    Wikipedia,
    #[name = "Arxiv"]
    Arxiv,
    #[name = "Youtube Search"]
    YouTube,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::WebSearch, Tool::Wikipedia, Tool::Arxiv, Tool::YouTube];

    /// Name as the model is told to write it.
    pub fn label(self) -> &'static str {
        match self {
            Tool::WebSearch => "Websearch",
            Tool::Wikipedia => "Wikipedia",
            Tool::Arxiv => "Arxiv",
            Tool::YouTube => "Youtube Search",
        }
    }

    pub fn blurb(self) -> &'static str {
        match self {
            Tool::WebSearch => "up-to-date content from the web",
            Tool::Wikipedia => "general information",
            Tool::Arxiv => "research papers",
            Tool::YouTube => "video explanations",
        }
    }

    /// Case- and punctuation-insensitive name lookup.
    pub fn resolve(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "websearch" | "web" => Some(Tool::WebSearch),
            "wikipedia" | "wiki" => Some(Tool::Wikipedia),
            "arxiv" => Some(Tool::Arxiv),
            "youtubesearch" | "youtube" => Some(Tool::YouTube),
            _ => None,
        }
    }
}

/// What the dispatcher should do with one parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Invoke(Tool),
    /// Unknown or absent action name.
    Unrecognized(String),
}

impl Action {
    pub fn parse(name: Option<&str>) -> Self {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => Tool::resolve(n)
                .map(Action::Invoke)
                .unwrap_or_else(|| Action::Unrecognized(n.to_string())),
            None => Action::Unrecognized("none".to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Action::Invoke(tool) => tool.label(),
            Action::Unrecognized(name) => name,
        }
    }
}

/// Endpoints for the four backends.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub duckduckgo: String,
    pub wikipedia: String,
    pub arxiv: String,
    pub youtube: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            duckduckgo: web::DEFAULT_ENDPOINT.to_string(),
            wikipedia: wikipedia::DEFAULT_ENDPOINT.to_string(),
            arxiv: arxiv::DEFAULT_ENDPOINT.to_string(),
            youtube: youtube::DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Endpoints {
    pub fn from_env() -> Self {
        let d = Self::default();
        let var = |key: &str, default: String| {
            dotenv::var(key)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
        };
        Self {
            duckduckgo: var("DUCKDUCKGO_URL", d.duckduckgo),
            wikipedia: var("WIKIPEDIA_API_URL", d.wikipedia),
            arxiv: var("ARXIV_API_URL", d.arxiv),
            youtube: var("YOUTUBE_URL", d.youtube),
        }
    }
}

/// Shared HTTP client for the lookup backends.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(20))
        .build()
        .context("Failed to create tool HTTP client")
}

/// Dispatches actions to one handler per tool.
pub struct Toolbox {
    web: Arc<dyn Lookup>,
    wikipedia: Arc<dyn Lookup>,
    arxiv: Arc<dyn Lookup>,
    youtube: Arc<dyn Lookup>,
}

impl Toolbox {
    pub fn new(
        web: Arc<dyn Lookup>,
        wikipedia: Arc<dyn Lookup>,
        arxiv: Arc<dyn Lookup>,
        youtube: Arc<dyn Lookup>,
    ) -> Self {
        Self {
            web,
            wikipedia,
            arxiv,
            youtube,
        }
    }

    /// The live backends.
    pub fn http(client: reqwest::Client, endpoints: &Endpoints) -> Self {
        Self::new(
            Arc::new(WebSearch::new(client.clone(), &endpoints.duckduckgo)),
            Arc::new(WikipediaSummary::new(client.clone(), &endpoints.wikipedia)),
            Arc::new(ArxivSearch::new(client.clone(), &endpoints.arxiv)),
            Arc::new(YouTubeSearch::new(client, &endpoints.youtube)),
        )
    }

    pub async fn call(&self, tool: Tool, query: &str) -> String {
        debug!(tool = tool.label(), query, "Tool call");
        match tool {
            Tool::WebSearch => self.web.lookup(query).await,
            Tool::Wikipedia => self.wikipedia.lookup(query).await,
            Tool::Arxiv => self.arxiv.lookup(query).await,
            Tool::YouTube => self.youtube.lookup(query).await,
        }
    }

    /// Run one directive. `input` is `None` when the reply had no Action Input line.
    pub async fn dispatch(&self, action: &Action, input: Option<&str>) -> String {
        match (action, input) {
            (Action::Unrecognized(name), _) => format!("Unknown tool: {}", name),
            (Action::Invoke(tool), None) => format!(
                "Missing Action Input for {}. Reply with an \"Action Input:\" line.",
                tool.label()
            ),
            (Action::Invoke(tool), Some(query)) => self.call(*tool, query).await,
        }
    }
}

/// Collapse runs of whitespace into single spaces.
pub(crate) fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every query and answers with a canned observation.
    pub struct RecordingLookup {
        pub reply: String,
        pub calls: Mutex<Vec<String>>,
    }

    impl RecordingLookup {
        pub fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Lookup for RecordingLookup {
        async fn lookup(&self, query: &str) -> String {
            self.calls.lock().unwrap().push(query.to_string());
            self.reply.clone()
        }
    }

    pub struct Fakes {
        pub web: Arc<RecordingLookup>,
        pub wikipedia: Arc<RecordingLookup>,
        pub arxiv: Arc<RecordingLookup>,
        pub youtube: Arc<RecordingLookup>,
    }

    impl Fakes {
        pub fn new() -> Self {
            Self {
                web: RecordingLookup::new("- Web - https://example.com/web\nweb body\nSource:https://example.com/web"),
                wikipedia: RecordingLookup::new(
                    "Wikipedia: Rust\nRust is a language.\nSource:https://en.wikipedia.org/wiki/Rust",
                ),
                arxiv: RecordingLookup::new("arXiv: Paper\nSource:http://arxiv.org/abs/1234.5678v1"),
                youtube: RecordingLookup::new("- Video - https://www.youtube.com/watch?v=abc\nSource:https://www.youtube.com/watch?v=abc"),
            }
        }

        pub fn toolbox(&self) -> Toolbox {
            Toolbox::new(
                self.web.clone(),
                self.wikipedia.clone(),
                self.arxiv.clone(),
                self.youtube.clone(),
            )
        }

        pub fn total_calls(&self) -> usize {
            self.web.calls().len()
                + self.wikipedia.calls().len()
                + self.arxiv.calls().len()
                + self.youtube.calls().len()
        }
    }
}
