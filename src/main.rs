use std::sync::Arc;

use bot::Bot;
use config::{Config, Environment, File};

mod bot;
mod canvas;
mod cfg;
mod classes;
mod commands;
mod dates;
mod error;
mod jobs;
mod notion;
mod task;

/// Loads the configuration using the `config` crate
fn load_config() -> Result<cfg::Config, anyhow::Error> {
    let settings = Config::builder()
        .add_source(File::with_name("config"))
        // TASKBOARD__NOTION__TOKEN overrides notion.token
        .add_source(Environment::with_prefix("TASKBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[tokio::main]
/// Entrypoint for the taskboard discord bot.
/// It imports the upcoming Canvas assignments into a Notion task board,
/// keeps one channel per class and lets students add their own tasks.
async fn main() -> Result<(), anyhow::Error> {
    // Initialize the logger
    pretty_env_logger::init();

    // load the config
    let config = Arc::new(load_config()?);

    Bot::new(config).await?.start().await
}
