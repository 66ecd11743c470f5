use poise::CreateReply;

use crate::{bot::CommandContext, jobs::assignments::pull_assignments};

pub mod task;

/// Show the available commands
#[poise::command(prefix_command, slash_command)]
pub async fn help(
    ctx: CommandContext<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> Result<(), anyhow::Error> {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            ephemeral: true,
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}

#[poise::command(prefix_command, owners_only)]
pub async fn register(ctx: CommandContext<'_>) -> Result<(), anyhow::Error> {
    poise::builtins::register_application_commands_buttons(ctx).await?;
    Ok(())
}

/// Import the upcoming assignments now
#[poise::command(slash_command, owners_only, guild_only)]
pub async fn sync_now(ctx: CommandContext<'_>) -> Result<(), anyhow::Error> {
    // an import easily outlasts the three seconds discord gives us
    ctx.defer_ephemeral().await?;

    let data = ctx.data();
    let http = ctx.serenity_context().http.clone();

    let content = match data.sync_guard.run(pull_assignments(data, &http)).await {
        Some(report) => {
            let report = report?;
            let mut content = format!("Added {} assignments to your task board.", report.total());
            if !report.unresolved.is_empty() {
                content.push_str(&format!(
                    "\nNo class is configured for: {}",
                    report.unresolved.join(", ")
                ));
            }
            content
        }
        None => "An import is already running, try again later.".to_string(),
    };

    ctx.send(CreateReply::default().ephemeral(true).content(content))
        .await?;
    Ok(())
}
