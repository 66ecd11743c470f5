use std::{collections::BTreeSet, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use log::{debug, info};
use poise::serenity_prelude::{ChannelId, ChannelType, CreateChannel, GuildChannel, GuildId, Http};

use crate::{
    bot::{Bot, Data},
    cfg::Comparison,
    classes::{channel_name, strip_decoration},
    notion::{schema::CLASS, NotionStore, TaskStore},
};

use super::run_scheduled;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingChannel {
    pub id: ChannelId,
    pub name: String,
}

/// The channels of one category.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// Channels of the category, in display order.
    async fn list(&self) -> Result<Vec<ExistingChannel>, anyhow::Error>;
    async fn delete(&self, channel: &ExistingChannel) -> Result<(), anyhow::Error>;
    /// Creates a text channel at the bottom of the category.
    async fn create(&self, name: &str) -> Result<(), anyhow::Error>;
}

/// [`ChannelDirectory`] of a discord category.
pub struct CategoryChannels<'a> {
    pub http: &'a Http,
    pub guild: GuildId,
    pub category: ChannelId,
}

#[async_trait]
impl ChannelDirectory for CategoryChannels<'_> {
    async fn list(&self) -> Result<Vec<ExistingChannel>, anyhow::Error> {
        let mut channels: Vec<GuildChannel> = self
            .guild
            .channels(self.http)
            .await
            .context("failed to list the guild channels")?
            .into_values()
            .filter(|channel| channel.parent_id == Some(self.category))
            .collect();
        channels.sort_by_key(|channel| channel.position);

        Ok(channels
            .into_iter()
            .map(|channel| ExistingChannel {
                id: channel.id,
                name: channel.name,
            })
            .collect())
    }

    async fn delete(&self, channel: &ExistingChannel) -> Result<(), anyhow::Error> {
        channel
            .id
            .delete(self.http)
            .await
            .with_context(|| format!("failed to delete #{}", channel.name))?;
        Ok(())
    }

    async fn create(&self, name: &str) -> Result<(), anyhow::Error> {
        let builder = CreateChannel::new(name)
            .kind(ChannelType::Text)
            .category(self.category);

        self.guild
            .create_channel(self.http, builder)
            .await
            .with_context(|| format!("failed to create #{}", name))?;
        Ok(())
    }
}

/// Whether the channels no longer match the class options.
/// Both sides are compared without their decoration.
pub fn needs_rebuild(expected: &[String], existing: &[String], comparison: Comparison) -> bool {
    let expected = expected.iter().map(|name| strip_decoration(name));
    let existing = existing.iter().map(|name| strip_decoration(name));

    match comparison {
        Comparison::Ordered => !expected.eq(existing),
        Comparison::Set => expected.collect::<BTreeSet<_>>() != existing.collect::<BTreeSet<_>>(),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChannelReport {
    pub deleted: usize,
    pub created: usize,
}

/// Keeps one channel per class option.
///
/// When the channels differ from the options, every channel of the category
/// is deleted and the channels are recreated in the order of the options.
/// The first failure stops the run; the next run starts over from the diff.
pub async fn sync_channels(
    store: &dyn TaskStore,
    directory: &dyn ChannelDirectory,
    comparison: Comparison,
) -> Result<ChannelReport, anyhow::Error> {
    let expected: Vec<String> = store
        .list_category_options(CLASS)?
        .iter()
        .map(|label| channel_name(label))
        .collect();
    let existing = directory.list().await?;
    let existing_names: Vec<String> = existing.iter().map(|c| c.name.clone()).collect();

    if !needs_rebuild(&expected, &existing_names, comparison) {
        debug!("channels are up to date");
        return Ok(ChannelReport::default());
    }

    info!(
        "rebuilding channels: {:?} -> {:?}",
        existing_names, expected
    );

    let mut report = ChannelReport::default();
    for channel in &existing {
        directory.delete(channel).await?;
        report.deleted += 1;
    }
    for name in &expected {
        directory.create(name).await?;
        report.created += 1;
    }

    Ok(report)
}

/// Scheduled channel reconciliation.
pub async fn task(bot: Arc<Bot>, http: Arc<Http>) -> Result<(), anyhow::Error> {
    let data: &Data = &bot.data;
    let http: &Http = &http;

    run_scheduled(
        &data.channel_guard,
        &data.config.channels.schedule,
        bot.ready(),
        bot.shutdown.resubscribe(),
        move || async move {
            let store = NotionStore::connect(&data.config.notion)
                .await
                .context("failed to connect to notion")?;
            let directory = CategoryChannels {
                http,
                guild: data.config.discord.guild_id,
                category: data.config.channels.category,
            };

            let report = sync_channels(&store, &directory, data.config.channels.comparison).await?;
            info!(
                "channels synced, {} deleted, {} created",
                report.deleted, report.created
            );
            Ok::<(), anyhow::Error>(())
        },
    )
    .await
}
