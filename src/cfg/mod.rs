use std::time::Duration;

use anyhow::Context;
use chrono_tz::Tz;
use poise::serenity_prelude::{ChannelId, GuildId};
use serde::Deserialize;

fn default_notion_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

fn default_timeout() -> String {
    "30s".to_string()
}

fn default_daily() -> String {
    "0 12 * * *".to_string()
}

fn default_window() -> String {
    "14d".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_type() -> String {
    "Assignment".to_string()
}

fn default_enabled() -> bool {
    true
}

fn parse_timeout(value: &str) -> Result<Duration, anyhow::Error> {
    humantime::parse_duration(value).with_context(|| format!("invalid timeout `{}`", value))
}

#[derive(Deserialize, Debug, Clone)]
/// Configuration regarding the discord bot itself.
pub struct DiscordConfig {
    pub token: String,
    /// The guild the commands are registered in and the channels live in.
    pub guild_id: GuildId,
}

#[derive(Deserialize, Debug, Clone, Default)]
/// Access to the Notion database holding the tasks.
pub struct NotionConfig {
    /// Integration token, usually given through `TASKBOARD__NOTION__TOKEN`.
    pub token: String,
    pub database_id: String,
    #[serde(default = "default_notion_url")]
    pub base_url: String,
    /// Value of the `Notion-Version` header.
    #[serde(default = "default_notion_version")]
    pub version: String,
    /// Request timeout, in the humantime format (`30s`, `1m`...).
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl NotionConfig {
    pub fn timeout(&self) -> Result<Duration, anyhow::Error> {
        parse_timeout(&self.timeout)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
/// Access to the Canvas instance the assignments are pulled from.
pub struct CanvasConfig {
    pub token: String,
    /// Root of the instance, such as `https://school.instructure.com`.
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl CanvasConfig {
    pub fn timeout(&self) -> Result<Duration, anyhow::Error> {
        parse_timeout(&self.timeout)
    }
}

#[derive(Deserialize, Debug, Clone)]
/// Configuration of the assignment import.
pub struct SyncConfig {
    /// When the import runs. This uses the cron syntax.
    #[serde(default = "default_daily")]
    pub schedule: String,
    /// Channel receiving the summary of each run.
    pub notification_channel: ChannelId,
    /// Assignments due further than this are ignored until a later run.
    #[serde(default = "default_window")]
    pub due_window: String,
    /// Timezone used to turn due timestamps into calendar dates.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// The "Type" given to imported tasks.
    #[serde(default = "default_type")]
    pub default_type: String,
}

impl SyncConfig {
    pub fn timezone(&self) -> Result<Tz, anyhow::Error> {
        self.timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid timezone `{}`: {}", self.timezone, e))
    }

    /// The due window, in whole days.
    pub fn window_days(&self) -> Result<i64, anyhow::Error> {
        let window = humantime::parse_duration(&self.due_window)
            .with_context(|| format!("invalid due window `{}`", self.due_window))?;

        Ok((window.as_secs() / 86_400) as i64)
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// How the channel list is compared with the class options.
pub enum Comparison {
    /// Same names in the same order.
    #[default]
    Ordered,
    /// Same names, any order.
    Set,
}

#[derive(Deserialize, Debug, Clone)]
/// Configuration of the per-class channels.
pub struct ChannelsConfig {
    #[serde(default = "default_daily")]
    pub schedule: String,
    /// The category holding one channel per class.
    pub category: ChannelId,
    #[serde(default)]
    pub comparison: Comparison,
}

#[derive(Deserialize, Debug, Clone)]
/// Configuration of the daily reminder digest.
pub struct RemindersConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_daily")]
    pub schedule: String,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            schedule: default_daily(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
/// One entry of the course to class table.
pub struct ClassEntry {
    /// Course label as shown by Canvas, without the teacher name.
    pub course: String,
    /// Canonical class label, as used by the board and the channels.
    pub label: String,
}

#[derive(Deserialize, Debug, Clone)]
/// Main configuration structure
/// It just contains all the configuration blocks.
pub struct Config {
    pub discord: DiscordConfig,
    pub notion: NotionConfig,
    pub canvas: CanvasConfig,
    pub sync: SyncConfig,
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
}
