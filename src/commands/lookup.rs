use tracing::info;

use super::send_chunked;
use crate::state::Context;
use crate::tools::Tool;

/// Run a single lookup tool directly
#[poise::command(slash_command, guild_only)]
pub async fn lookup(
    ctx: Context<'_>,
    #[description = "Which tool to call"] tool: Tool,
    #[description = "Search phrase"] query: String,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    info!(user = %ctx.author().name, tool = tool.label(), query = %query, "Direct lookup");

    let observation = ctx.data().tools.call(tool, &query).await;
    send_chunked(&ctx, &format!("**{}** `{}`\n{}", tool.label(), query, observation)).await
}
