use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::llm;
use crate::tools::Toolbox;

pub const MIN_STEPS: u32 = 1;
pub const MAX_STEPS: u32 = 6;

/// Hosted models the agent may run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum ModelChoice {
    #[name = "qwen/qwen3-32b"]
    Qwen3_32b,
    #[name = "llama-3.1-8b-instant"]
    Llama31_8bInstant,
    #[name = "openai/gpt-oss-20b"]
    GptOss20b,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 3] = [
        ModelChoice::Qwen3_32b,
        ModelChoice::Llama31_8bInstant,
        ModelChoice::GptOss20b,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ModelChoice::Qwen3_32b => "qwen/qwen3-32b",
            ModelChoice::Llama31_8bInstant => "llama-3.1-8b-instant",
            ModelChoice::GptOss20b => "openai/gpt-oss-20b",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.id() == id.trim())
    }
}

/// Defaults applied when `/agent ask` leaves an option out (admins can modify at runtime).
#[derive(Debug, Clone, Copy)]
pub struct AgentDefaults {
    pub model: ModelChoice,
    pub max_steps: u32,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: ModelChoice::Qwen3_32b,
            max_steps: 3,
        }
    }
}

impl AgentDefaults {
    pub fn from_env() -> Self {
        let mut defaults = Self::default();
        if let Ok(id) = dotenv::var("AGENT_MODEL") {
            match ModelChoice::from_id(&id) {
                Some(model) => defaults.model = model,
                None => warn!(model = %id, "Unknown AGENT_MODEL, keeping {}", defaults.model.id()),
            }
        }
        if let Some(steps) = dotenv::var("AGENT_MAX_STEPS")
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
        {
            defaults.max_steps = clamp_steps(steps);
        }
        defaults
    }
}

pub fn clamp_steps(steps: u32) -> u32 {
    steps.clamp(MIN_STEPS, MAX_STEPS)
}

/// Process-wide settings read once at startup.
pub struct Settings {
    pub llm_base_url: String,
    /// Used when the caller does not supply a key.
    pub api_key: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        let llm_base_url = dotenv::var("LLM_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| llm::DEFAULT_BASE_URL.to_string());
        let api_key = dotenv::var("GROQ_API_KEY")
            .or_else(|_| dotenv::var("api_key"))
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Self {
            llm_base_url,
            api_key,
        }
    }
}

pub struct AppState {
    pub settings: Settings,
    /// Client for completion calls; cheap to clone per run.
    pub llm_http: reqwest::Client,
    pub tools: Arc<Toolbox>,
    pub admin_ids: HashSet<u64>,
    pub defaults: Arc<RwLock<AgentDefaults>>,
}

impl AppState {
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// A key passed with the command wins over the configured one.
    pub fn resolve_api_key(&self, supplied: Option<&str>) -> Option<String> {
        supplied
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| self.settings.api_key.clone())
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
