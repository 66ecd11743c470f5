use anyhow::Context;
use futures::Stream;
use log::{debug, warn};
use poise::{
    serenity_prelude::{Colour, CreateEmbed},
    CreateReply,
};

use crate::{
    bot::CommandContext,
    classes::{channel_name, label_from_channel, strip_decoration},
    dates::DueDate,
    notion::{
        schema::{CLASS, TYPE},
        TaskStore,
    },
    task::PageFields,
};

/// Finds the class of a channel.
///
/// The class option whose channel name matches is preferred, so the
/// capitalization of the board is kept. Otherwise the channel name is
/// turned back into a label.
pub fn class_for_channel(channel: &str, options: &[String]) -> String {
    let wanted = strip_decoration(channel);

    options
        .iter()
        .find(|option| strip_decoration(&channel_name(option)) == wanted)
        .cloned()
        .unwrap_or_else(|| label_from_channel(channel))
}

/// Options containing `partial`, ignoring case.
pub fn matching_options(options: Vec<String>, partial: &str) -> Vec<String> {
    let partial = partial.to_lowercase();

    options
        .into_iter()
        .filter(|option| option.to_lowercase().contains(&partial))
        .collect()
}

async fn autocomplete_type<'a>(
    ctx: CommandContext<'_>,
    partial: &'a str,
) -> impl Stream<Item = String> + 'a {
    let options = match ctx.data().task_store().await {
        Ok(store) => store.list_category_options(TYPE).unwrap_or_else(|err| {
            warn!("no task types: {}", err);
            vec![]
        }),
        Err(err) => {
            warn!("no task types: {:?}", err);
            vec![]
        }
    };

    futures::stream::iter(matching_options(options, partial))
}

/// Create a task in the class of this channel
#[poise::command(slash_command, guild_only)]
pub async fn create_task(
    ctx: CommandContext<'_>,
    #[description = "Name of the task"] name: String,
    #[description = "Due date, as MM/DD/YY"] date: DueDate,
    #[description = "Kind of task"]
    #[autocomplete = "autocomplete_type"]
    type_of_task: String,
) -> Result<(), anyhow::Error> {
    debug!("entering create_task command");
    let store = ctx.data().task_store().await?;

    let channel = ctx
        .channel_id()
        .name(ctx.serenity_context())
        .await
        .context("failed to get the channel name")?;
    let options = store.list_category_options(CLASS).unwrap_or_default();
    let class_name = class_for_channel(&channel, &options);

    store
        .create_page(&PageFields {
            name: name.clone(),
            due_date: date.0,
            class_name: class_name.clone(),
            type_of_task,
        })
        .await?;

    let short_class = class_name.split_whitespace().next().unwrap_or_default();
    let embed = CreateEmbed::new()
        .title("Task created successfully!")
        .description(format!(
            "Your task: `{}` for {} was successfully created.",
            name, short_class
        ))
        .colour(Colour::DARK_GREEN);

    ctx.send(CreateReply::default().ephemeral(true).embed(embed))
        .await?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{class_for_channel, matching_options};

    fn options(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn class_from_options() {
        let classes = options(&["Computer Science 💻", "English 📖", "APUSH ⚖️"]);

        assert_eq!(class_for_channel("computer-science-💻", &classes), "Computer Science 💻");
        assert_eq!(class_for_channel("english", &classes), "English 📖");
        assert_eq!(class_for_channel("apush-⚖️", &classes), "APUSH ⚖️");
    }

    #[test]
    fn class_without_option() {
        assert_eq!(class_for_channel("spanish-🌎", &[]), "Spanish 🌎");
        assert_eq!(
            class_for_channel("general", &options(&["English 📖"])),
            "General"
        );
    }

    #[test]
    fn type_autocomplete() {
        let types = options(&["Assignment", "Test", "Quiz", "Project"]);

        assert_eq!(matching_options(types.clone(), "t"), options(&["Assignment", "Test", "Project"]));
        assert_eq!(matching_options(types.clone(), "QU"), options(&["Quiz"]));
        assert_eq!(matching_options(types.clone(), "").len(), 4);
        assert!(matching_options(types, "exam").is_empty());
    }
}
