use std::{collections::HashSet, sync::Arc};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use log::{debug, error, info, warn};
use poise::serenity_prelude::{Colour, CreateEmbed, CreateMessage, Http};

use crate::{
    bot::{Bot, Data},
    canvas::{AssignmentSource, CanvasSource},
    classes::ClassMapping,
    error::Error,
    notion::{NotionStore, TaskStore},
    task::PageFields,
};

use super::run_scheduled;

/// Outcome of an import.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tasks created, per class label, in the order they were processed.
    pub added: Vec<(String, usize)>,
    /// Courses with new assignments but no class label.
    pub unresolved: Vec<String>,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.added.iter().map(|(_, count)| count).sum()
    }

    pub fn embed(&self) -> CreateEmbed {
        let embed = CreateEmbed::new().title(format!(
            "Added {} assignments to your task board.",
            self.total()
        ));

        if self.unresolved.is_empty() {
            embed.colour(Colour::DARK_GREEN)
        } else {
            embed.colour(Colour::ORANGE).description(format!(
                "No class is configured for: {}",
                self.unresolved.join(", ")
            ))
        }
    }
}

/// Imports the upcoming assignments as tasks.
pub struct AssignmentSync<'a> {
    pub classes: &'a ClassMapping,
    /// "Type" of the created tasks.
    pub default_type: &'a str,
}

impl AssignmentSync<'_> {
    /// Creates a task for every assignment whose name isn't already on the board.
    pub async fn run(
        &self,
        store: &dyn TaskStore,
        source: &dyn AssignmentSource,
        today: NaiveDate,
    ) -> Result<SyncReport, Error> {
        // names are the only link between assignments and tasks
        let mut existing: HashSet<String> = store
            .retrieve_all_tasks(today)
            .await?
            .into_iter()
            .map(|task| task.name)
            .collect();

        let mut report = SyncReport::default();

        for course in source.assignments_by_course().await? {
            let new: Vec<_> = course
                .assignments
                .iter()
                .filter(|assignment| !existing.contains(&assignment.name))
                .collect();
            if new.is_empty() {
                continue;
            }

            let class_name = match self.classes.resolve(&course.course) {
                Ok(label) => label,
                Err(err) => {
                    error!("skipping {} assignments: {}", new.len(), err);
                    report.unresolved.push(course.course.clone());
                    continue;
                }
            };

            let mut count = 0;
            for assignment in new {
                // a course may list the same name twice
                if existing.contains(&assignment.name) {
                    continue;
                }
                let Some(due_date) = assignment.due_date else {
                    warn!("`{}` has no due date, skipping", assignment.name);
                    continue;
                };

                store
                    .create_page(&PageFields {
                        name: assignment.name.clone(),
                        due_date,
                        class_name: class_name.to_string(),
                        type_of_task: self.default_type.to_string(),
                    })
                    .await?;

                debug!(
                    "created `{}` ({} points) for {}",
                    assignment.name, assignment.points_possible, class_name
                );
                existing.insert(assignment.name.clone());
                count += 1;
            }

            info!("Finished adding {} assignments for {}", count, class_name);
            report.added.push((class_name.to_string(), count));
        }

        Ok(report)
    }
}

/// Runs an import against Notion and Canvas, and posts the summary.
pub async fn pull_assignments(data: &Data, http: &Http) -> Result<SyncReport, anyhow::Error> {
    let config = &data.config;
    let timezone = config.sync.timezone()?;
    let today = Utc::now().with_timezone(&timezone).date_naive();

    // a new connection each run picks up the schema changes
    let store = NotionStore::connect(&config.notion)
        .await
        .context("failed to connect to notion")?;
    let source = CanvasSource::new(&config.canvas, config.sync.window_days()?, timezone)?;

    let job = AssignmentSync {
        classes: &data.classes,
        default_type: &config.sync.default_type,
    };
    let report = job
        .run(&store, &source, today)
        .await
        .context("failed to import the assignments")?;

    config
        .sync
        .notification_channel
        .send_message(http, CreateMessage::new().embed(report.embed()))
        .await
        .context("failed to send the summary")?;

    Ok(report)
}

/// Scheduled import, see [`pull_assignments`].
pub async fn task(bot: Arc<Bot>, http: Arc<Http>) -> Result<(), anyhow::Error> {
    let data: &Data = &bot.data;
    let http: &Http = &http;

    run_scheduled(
        &data.sync_guard,
        &data.config.sync.schedule,
        bot.ready(),
        bot.shutdown.resubscribe(),
        move || async move { pull_assignments(data, http).await.map(|_| ()) },
    )
    .await
}
