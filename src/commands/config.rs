use crate::state::{clamp_steps, AgentDefaults, Context, ModelChoice, MAX_STEPS, MIN_STEPS};

/// Configure agent defaults (admin only)
#[poise::command(slash_command, guild_only)]
pub async fn config(
    ctx: Context<'_>,
    #[description = "model | max_steps"] param: Option<String>,
    #[description = "New value"] value: Option<String>,
) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    if !ctx.data().is_admin(user_id) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    match (param.as_deref(), value) {
        // Show current config
        (None, _) => {
            let defaults = *ctx.data().defaults.read().await;
            ctx.say(describe(&defaults)).await?;
        }
        // Set a parameter
        (Some(key), Some(val)) => {
            let mut defaults = ctx.data().defaults.write().await;
            let reply = apply(&mut defaults, key, &val);
            ctx.say(reply).await?;
        }
        (Some(_), None) => {
            ctx.say("Provide both `param` and `value`. Example: `/agent config max_steps 4`")
                .await?;
        }
    }

    Ok(())
}

fn describe(defaults: &AgentDefaults) -> String {
    format!(
        "**Agent defaults:**\n\
         `model`: {}\n\
         `max_steps`: {}",
        defaults.model.id(),
        defaults.max_steps
    )
}

/// Apply one setting and return the message to show.
fn apply(defaults: &mut AgentDefaults, key: &str, value: &str) -> String {
    match key {
        "model" => match ModelChoice::from_id(value) {
            Some(model) => {
                defaults.model = model;
                format!("`model` set to {}", model.id())
            }
            None => format!(
                "Unknown model `{}`. Valid: {}",
                value,
                ModelChoice::ALL
                    .iter()
                    .map(|m| format!("`{}`", m.id()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        },
        "max_steps" => match value.trim().parse::<u32>() {
            Ok(steps) => {
                defaults.max_steps = clamp_steps(steps);
                format!("`max_steps` set to {}", defaults.max_steps)
            }
            Err(_) => format!(
                "`max_steps` must be a number between {} and {}",
                MIN_STEPS, MAX_STEPS
            ),
        },
        _ => format!("Unknown param `{}`. Valid: `model`, `max_steps`", key),
    }
}
