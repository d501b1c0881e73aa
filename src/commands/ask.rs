use std::sync::Arc;

use poise::CreateReply;
use tracing::{info, warn};

use super::send_chunked;
use crate::agent::{Agent, AgentConfig, AgentResponse, Outcome};
use crate::llm::LlmClient;
use crate::state::{clamp_steps, Context, ModelChoice};

const MISSING_KEY: &str =
    "Please enter a valid API key (command option or GROQ_API_KEY in .env).";
/// Byte budget for one step's spoiler, so it always lands in a single chunk.
const STEP_PREVIEW_BYTES: usize = 1900;

/// Ask the research agent a question
#[poise::command(slash_command, guild_only)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "Your question"] question: String,
    #[description = "Model to reason with"] model: Option<ModelChoice>,
    #[description = "Max reasoning steps (1-6)"]
    #[min = 1]
    #[max = 6]
    max_steps: Option<u32>,
    #[description = "Groq API key (optional, falls back to the server key)"] api_key: Option<String>,
    #[description = "Show each reasoning step (default: on)"] show_steps: Option<bool>,
) -> Result<(), anyhow::Error> {
    let Some(api_key) = ctx.data().resolve_api_key(api_key.as_deref()) else {
        ctx.send(CreateReply::default().content(MISSING_KEY).ephemeral(true))
            .await?;
        return Ok(());
    };

    // Snapshot defaults so admin edits never touch a run in flight
    let defaults = *ctx.data().defaults.read().await;
    let model = model.unwrap_or(defaults.model);
    let max_steps = clamp_steps(max_steps.unwrap_or(defaults.max_steps));
    let show_steps = show_steps.unwrap_or(true);

    // Acknowledge immediately so the user isn't staring at a loading spinner
    let user_mention = format!("<@{}>", ctx.author().id);
    ctx.say(format!(
        "Thinking… researching with `{}` (up to {} steps), {}",
        model.id(),
        max_steps,
        user_mention
    ))
    .await?;

    info!(
        user = %ctx.author().name,
        question = %question,
        model = model.id(),
        max_steps,
        "Agent query started"
    );

    let llm = LlmClient::new(
        ctx.data().llm_http.clone(),
        ctx.data().settings.llm_base_url.as_str(),
        api_key,
    );
    let agent = Agent::new(
        AgentConfig::new(model.id(), max_steps),
        Arc::new(llm),
        ctx.data().tools.clone(),
    );

    let result = match agent.run(&question).await {
        Ok(result) => result,
        Err(e) => {
            warn!("Agent run failed: {:#}", e);
            send_chunked(&ctx, &format!("{} Agent run failed: {:#}", user_mention, e)).await?;
            return Ok(());
        }
    };

    info!(
        iterations = result.iterations,
        outcome = ?result.outcome,
        answer_len = result.answer.len(),
        "Agent query complete"
    );

    if show_steps {
        for step in render_steps(&result) {
            send_chunked(&ctx, &step).await?;
        }
    }
    send_chunked(&ctx, &render_answer(&user_mention, &question, model, &result)).await
}

/// One message per step, raw model output hidden behind a spoiler.
fn render_steps(result: &AgentResponse) -> Vec<String> {
    result
        .steps
        .iter()
        .map(|step| {
            let reply = step.reply.replace("||", "|");
            let reply = truncate_bytes(&reply, STEP_PREVIEW_BYTES);
            let mut out = format!("**Step {}**\n||{}||", step.iteration, reply.trim());
            if let Some(action) = &step.action {
                out.push_str(&format!(
                    "\n→ `{}`: {}",
                    action,
                    step.input.as_deref().unwrap_or("(no input)")
                ));
            }
            out
        })
        .collect()
}

/// Cut at a char boundary so the result is at most `limit` bytes, ellipsis included.
fn truncate_bytes(text: &str, limit: usize) -> String {
    const ELLIPSIS: &str = " …";
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit.saturating_sub(ELLIPSIS.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &text[..end], ELLIPSIS)
}

fn render_answer(
    user_mention: &str,
    question: &str,
    model: ModelChoice,
    result: &AgentResponse,
) -> String {
    let mut full = format!(
        "{} here's what I found:\n\n**Q:** {}\n**Model:** {} | **Steps:** {}\n\n**A:** {}",
        user_mention,
        question,
        model.id(),
        result.iterations,
        result.answer
    );

    if result.outcome == Outcome::Summarized {
        full.push_str("\n\n_Step budget reached; this answer is a summary of the research so far._");
    }

    // Cited URLs as clickable Discord markdown links
    if !result.cited_urls.is_empty() {
        full.push_str("\n\n**Sources:**\n");
        for url in &result.cited_urls {
            let label = url.rsplit('/').find(|s| !s.is_empty()).unwrap_or(url);
            full.push_str(&format!("- [{}](<{}>)\n", label, url));
        }
    }

    full
}
