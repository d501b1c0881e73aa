mod about;
mod ask;
mod config;
mod lookup;

use crate::state::Context;

/// Discord hard limit is 2000; leave room for markup.
const CHUNK_LIMIT: usize = 1990;

/// ReAct research assistant: web, Wikipedia, arXiv, and YouTube
#[poise::command(
    slash_command,
    subcommands("ask::ask", "lookup::lookup", "config::config", "about::about")
)]
pub async fn agent(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

/// Split text into Discord-safe chunks, preferring line then word boundaries.
fn chunk_text(text: &str, limit: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let mut end = remaining.len().min(limit);
        while !remaining.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            end = remaining.chars().next().map_or(1, char::len_utf8);
        }
        let split_at = if end < remaining.len() {
            remaining[..end]
                .rfind('\n')
                .or_else(|| remaining[..end].rfind(' '))
                .map(|i| i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    chunks
}

/// Send a message in Discord-safe chunks.
/// Uses ctx.say() for all chunks. Poise routes follow-ups through the
/// interaction webhook, which doesn't require Send Messages channel permission.
async fn send_chunked(ctx: &Context<'_>, text: &str) -> Result<(), anyhow::Error> {
    for chunk in chunk_text(text, CHUNK_LIMIT) {
        ctx.say(chunk).await?;
    }
    Ok(())
}
