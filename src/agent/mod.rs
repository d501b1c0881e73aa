pub mod citations;
pub mod parse;
pub mod prompts;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::llm::{ChatModel, ChatRequest, Message};
use crate::tools::{Action, Toolbox};

use parse::{Directive, Reply};

/// Per-run settings. Built once per question and never changed during the run.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub max_iterations: u32,
    pub temperature: f32,
    pub step_max_tokens: u32,
    pub summary_max_tokens: u32,
}

impl AgentConfig {
    pub fn new(model: impl Into<String>, max_iterations: u32) -> Self {
        Self {
            model: model.into(),
            max_iterations,
            temperature: 0.2,
            step_max_tokens: 9100,
            summary_max_tokens: 342,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The model wrote the final-answer marker.
    FinalAnswer,
    /// The step budget ran out and the transcript was summarized.
    Summarized,
}

/// One model call and whatever it triggered.
#[derive(Debug, Clone)]
pub struct Step {
    pub iteration: u32,
    /// Raw model output.
    pub reply: String,
    pub action: Option<String>,
    pub input: Option<String>,
    pub observation: Option<String>,
}

pub struct AgentResponse {
    pub answer: String,
    pub iterations: u32,
    pub outcome: Outcome,
    pub steps: Vec<Step>,
    /// Source links from tool observations not already in the answer.
    pub cited_urls: Vec<String>,
}

/// Append-only record of one run.
#[derive(Debug, Default)]
struct Transcript {
    entries: Vec<String>,
}

impl Transcript {
    fn push(&mut self, entry: String) {
        self.entries.push(entry);
    }

    fn render(&self) -> String {
        self.entries.join("\n")
    }
}

pub struct Agent {
    config: AgentConfig,
    llm: Arc<dyn ChatModel>,
    tools: Arc<Toolbox>,
}

impl Agent {
    pub fn new(config: AgentConfig, llm: Arc<dyn ChatModel>, tools: Arc<Toolbox>) -> Self {
        Self { config, llm, tools }
    }

    /// System instructions plus the transcript. The previous observation is the
    /// transcript's last entry.
    fn build_prompt(transcript: &Transcript) -> String {
        format!("{}\n{}", prompts::SYSTEM_PROMPT, transcript.render())
    }

    pub async fn run(&self, question: &str) -> Result<AgentResponse> {
        info!(
            model = %self.config.model,
            max_iterations = self.config.max_iterations,
            "Starting agent run"
        );

        let mut transcript = Transcript::default();
        transcript.push(format!("User Question: {}", question));

        let mut steps: Vec<Step> = Vec::new();
        let mut observations: Vec<String> = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            let request = ChatRequest {
                model: self.config.model.clone(),
                messages: vec![
                    Message::system(prompts::SYSTEM_PROMPT),
                    Message::user(Self::build_prompt(&transcript)),
                ],
                temperature: self.config.temperature,
                max_tokens: self.config.step_max_tokens,
            };

            let reply = self.llm.chat(&request).await?;

            debug!(iteration, reply_len = reply.len(), "─── LLM Response ───");
            for line in reply.lines().take(50) {
                debug!("  │ {}", line);
            }
            if reply.lines().count() > 50 {
                debug!("  │ ... ({} lines total)", reply.lines().count());
            }

            let directive = match Reply::parse(&reply) {
                Reply::Final(answer) => {
                    info!(iteration, answer_len = answer.len(), "Agent reached final answer");
                    let cited_urls = citations::resolve_citations(&observations, &answer);
                    steps.push(Step {
                        iteration,
                        reply,
                        action: None,
                        input: None,
                        observation: None,
                    });
                    return Ok(AgentResponse {
                        answer,
                        iterations: iteration,
                        outcome: Outcome::FinalAnswer,
                        steps,
                        cited_urls,
                    });
                }
                Reply::Act(directive) => directive,
            };

            let Directive {
                thought,
                action: action_name,
                input,
            } = directive;
            let action = Action::parse(action_name.as_deref());
            debug!(iteration, action = action.label(), input = ?input, "Parsed directive");

            let observation = self.tools.dispatch(&action, input.as_deref()).await;

            debug!(iteration, output_len = observation.len(), "─── Observation ───");
            for line in observation.lines().take(30) {
                debug!("  │ {}", line);
            }

            let thought = thought.unwrap_or_else(|| format!("I will use {}.", action.label()));
            transcript.push(format!("Thought: {}", thought));
            transcript.push(format!("Action: {}", action.label()));
            transcript.push(format!("Action Input: {}", input.as_deref().unwrap_or("")));
            transcript.push(format!("Observation: {}", observation));

            steps.push(Step {
                iteration,
                reply,
                action: Some(action.label().to_string()),
                input,
                observation: Some(observation.clone()),
            });
            observations.push(observation);
        }

        warn!(
            iterations = self.config.max_iterations,
            "Agent hit max iterations, summarizing transcript"
        );

        let answer = self.summarize(&transcript).await?;
        let cited_urls = citations::resolve_citations(&observations, &answer);

        Ok(AgentResponse {
            answer,
            iterations: self.config.max_iterations,
            outcome: Outcome::Summarized,
            steps,
            cited_urls,
        })
    }

    /// Best-effort answer once the step budget is spent.
    async fn summarize(&self, transcript: &Transcript) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message::system(prompts::SUMMARY_PROMPT),
                Message::user(transcript.render()),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.summary_max_tokens,
        };

        let summary = self.llm.chat(&request).await?;
        debug!("Summarized: {}", summary.chars().take(500).collect::<String>());

        let summary = summary.trim();
        if summary.is_empty() {
            return Ok(prompts::EMPTY_SUMMARY_FALLBACK.to_string());
        }
        Ok(summary.to_string())
    }
}
