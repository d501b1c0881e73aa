use crate::state::Context;
use crate::tools::Tool;

/// What this assistant can do
#[poise::command(slash_command)]
pub async fn about(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    ctx.say(features()).await?;
    Ok(())
}

fn features() -> String {
    let tools = Tool::ALL
        .iter()
        .map(|t| format!("- **{}** for {}", t.label(), t.blurb()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "**Features**\nThis agent finds answers with four tools:\n{}\n\
         It gathers information from these sources and gives you **links** so you can check them yourself.\n\
         Ask with `/agent ask`, or try one tool directly with `/agent lookup`.",
        tools
    )
}
