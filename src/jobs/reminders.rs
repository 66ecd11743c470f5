use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use log::{debug, info};
use poise::serenity_prelude::{Colour, CreateEmbed, CreateMessage, Http};

use crate::{
    bot::{Bot, Data},
    notion::{NotionStore, TaskStore},
    task::Task,
};

use super::run_scheduled;

// discord refuses longer field values
const FIELD_LIMIT: usize = 1024;

/// The unfinished tasks worth a reminder.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Digest {
    pub overdue: Vec<Task>,
    pub due_today: Vec<Task>,
    pub due_tomorrow: Vec<Task>,
}

impl Digest {
    pub fn new(tasks: Vec<Task>, today: NaiveDate) -> Self {
        let mut digest = Self::default();

        for task in tasks.into_iter().filter(|task| !task.is_completed) {
            match task.days_overdue(today) {
                _ if task.is_overdue(today) => digest.overdue.push(task),
                0 => digest.due_today.push(task),
                -1 => digest.due_tomorrow.push(task),
                _ => {}
            }
        }

        // most overdue first
        digest.overdue.sort_by_key(|task| task.due_date);
        digest
    }

    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.due_today.is_empty() && self.due_tomorrow.is_empty()
    }

    pub fn embed(&self, today: NaiveDate) -> CreateEmbed {
        let mut embed = CreateEmbed::new().title("Task reminders").colour(if self.overdue.is_empty() {
            Colour::GOLD
        } else {
            Colour::RED
        });

        if !self.overdue.is_empty() {
            let lines = self.overdue.iter().map(|task| {
                let days = task.days_overdue(today);
                format!(
                    "{} ({} day{} late)",
                    describe(task),
                    days,
                    if days > 1 { "s" } else { "" }
                )
            });
            embed = embed.field("Overdue", field_value(lines), false);
        }
        if !self.due_today.is_empty() {
            embed = embed.field("Due today", field_value(self.due_today.iter().map(describe)), false);
        }
        if !self.due_tomorrow.is_empty() {
            embed = embed.field(
                "Due tomorrow",
                field_value(self.due_tomorrow.iter().map(describe)),
                false,
            );
        }

        embed
    }
}

fn describe(task: &Task) -> String {
    let mut line = format!("**{}**", task.name);
    if let Some(kind) = &task.type_of_assignment {
        line.push_str(&format!(" ({})", kind));
    }
    if let Some(class) = &task.class_name {
        line.push_str(&format!(" · {}", class));
    }
    line
}

/// Joins the lines, dropping the ones that don't fit in a field.
fn field_value(lines: impl Iterator<Item = String>) -> String {
    let lines: Vec<String> = lines.collect();
    let mut value = String::new();

    for (i, line) in lines.iter().enumerate() {
        let more = format!("… and {} more", lines.len() - i);
        if value.len() + line.len() + more.len() + 2 > FIELD_LIMIT {
            if !value.is_empty() {
                value.push('\n');
            }
            value.push_str(&more);
            return value;
        }

        if !value.is_empty() {
            value.push('\n');
        }
        value.push_str(line);
    }

    value
}

/// Posts the reminders of the day, if there is anything to remind.
pub async fn send_reminders(data: &Data, http: &Http) -> Result<(), anyhow::Error> {
    let today = Utc::now()
        .with_timezone(&data.config.sync.timezone()?)
        .date_naive();

    let store = NotionStore::connect(&data.config.notion)
        .await
        .context("failed to connect to notion")?;
    let digest = Digest::new(store.retrieve_all_tasks(today).await?, today);

    if digest.is_empty() {
        debug!("nothing to remind");
        return Ok(());
    }

    info!(
        "reminding {} overdue, {} due today, {} due tomorrow",
        digest.overdue.len(),
        digest.due_today.len(),
        digest.due_tomorrow.len()
    );
    data.config
        .sync
        .notification_channel
        .send_message(http, CreateMessage::new().embed(digest.embed(today)))
        .await
        .context("failed to send the reminders")?;

    Ok(())
}

/// Scheduled reminders, see [`send_reminders`].
pub async fn task(bot: Arc<Bot>, http: Arc<Http>) -> Result<(), anyhow::Error> {
    let data: &Data = &bot.data;
    let http: &Http = &http;

    run_scheduled(
        &data.reminder_guard,
        &data.config.reminders.schedule,
        bot.ready(),
        bot.shutdown.resubscribe(),
        move || send_reminders(data, http),
    )
    .await
}
