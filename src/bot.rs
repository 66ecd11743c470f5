use crate::classes::ClassMapping;
use crate::jobs::{self, JobGuard};
use crate::notion::NotionStore;
use crate::{cfg::Config, commands};
use anyhow::Context;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{error, info};
use poise::serenity_prelude::{ClientBuilder, GatewayIntents};
use poise::CreateReply;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tokio::sync::{watch, OnceCell};
use tokio::{signal, sync::broadcast::Sender};

pub type CommandContext<'a> = poise::Context<'a, Arc<Data>, anyhow::Error>;

// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub config: Arc<Config>,
    pub classes: ClassMapping,
    pub sync_guard: JobGuard,
    pub channel_guard: JobGuard,
    pub reminder_guard: JobGuard,
    // connected on first use by a command
    task_store: OnceCell<NotionStore>,
}

impl Data {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            classes: ClassMapping::new(&config.classes),
            config,
            sync_guard: JobGuard::new("assignments"),
            channel_guard: JobGuard::new("channels"),
            reminder_guard: JobGuard::new("reminders"),
            task_store: OnceCell::new(),
        }
    }

    /// The board, shared by the commands.
    pub async fn task_store(&self) -> Result<&NotionStore, anyhow::Error> {
        self.task_store
            .get_or_try_init(|| NotionStore::connect(&self.config.notion))
            .await
            .context("failed to connect to notion")
    }
}

pub struct Bot {
    pub data: Arc<Data>,
    pub shutdown: Receiver<()>,
    shutdown_send: Sender<()>,
    ready: watch::Receiver<bool>,
    ready_send: watch::Sender<bool>,
}

/// Sends a message through `shutdown_send` when a stop signal is detected.
/// Used to start the bot stop sequence.
async fn wait_for_stop_signal(bot: Arc<Bot>) -> Result<(), anyhow::Error> {
    let mut shutdown = bot.shutdown.resubscribe();
    tokio::select! {
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => {
                    info!("stop signal received");
                    bot.shutdown_send
                        .send(())
                        .context("failed to send a shutdown signal")?;
                    Ok(())
                }
                Err(err) => Err(anyhow::anyhow!(err)),
            }
        },
        _ = shutdown.recv() => { Ok(()) }
    }
}

async fn on_error(error: poise::FrameworkError<'_, Arc<Data>, anyhow::Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => panic!("Failed to start bot: {:?}", error),
        poise::FrameworkError::Command { error, ctx, .. } => {
            let f = CreateReply::default()
                .ephemeral(true)
                .content(format!("{:#}", error));
            std::mem::drop(ctx.send(f).await);
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            // invalid dates end up here
            let f = CreateReply::default()
                .ephemeral(true)
                .content(error.to_string());
            std::mem::drop(ctx.send(f).await);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

impl Bot {
    pub async fn new(config: Arc<Config>) -> Result<Arc<Self>, anyhow::Error> {
        // Theses signals are used to stop the many tasks trigered.
        // this is called by the task listening for a stop signal.
        let (shutdown_send, shutdown) = tokio::sync::broadcast::channel(1);
        // flipped once discord is connected, the jobs wait for it.
        let (ready_send, ready) = watch::channel(false);

        let data = Arc::new(Data::new(config));

        Ok(Arc::new(Self {
            data,
            shutdown,
            shutdown_send,
            ready,
            ready_send,
        }))
    }

    pub fn ready(&self) -> watch::Receiver<bool> {
        self.ready.clone()
    }

    pub async fn start(self: Arc<Self>) -> Result<(), anyhow::Error> {
        let mut shutdown = self.shutdown.resubscribe();
        let mut tasks = FuturesUnordered::new();

        let options = poise::FrameworkOptions {
            commands: vec![
                commands::help(),
                commands::register(),
                commands::sync_now(),
                commands::task::create_task(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: None,
                edit_tracker: Some(Arc::new(poise::EditTracker::for_timespan(
                    Duration::from_secs(3600),
                ))),
                mention_as_prefix: true,
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        };
        let data = self.data.clone();
        let bot = self.clone();
        let framework = poise::Framework::builder()
            .options(options)
            .setup(move |ctx, ready, framework| {
                Box::pin(async move {
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        data.config.discord.guild_id,
                    )
                    .await?;
                    info!("{} has connected to the guild!", ready.user.name);
                    bot.ready_send.send_replace(true);
                    Ok(data)
                })
            })
            .build();
        let client = ClientBuilder::new(
            self.data.config.discord.token.clone(),
            GatewayIntents::non_privileged(),
        )
        .framework(framework);

        let mut client = client.await.context("failed to create the discord client")?;
        let http = client.http.clone();

        tasks.push(tokio::spawn(async move {
            // wait until the bot terminates or a shutdown signal is received.
            tokio::select! {
                result = client.start_autosharded() => {
                    if let Err(err) = result {
                        error!("Client error: {}", err);
                    }
                },
                _ = shutdown.recv() => {
                    // shutdown the bot properly
                    client.shard_manager.shutdown_all().await;
                }
            };
        }));

        let (bot, http_clone) = (self.clone(), http.clone());
        tasks.push(tokio::spawn(async move {
            if let Err(err) = jobs::assignments::task(bot, http_clone).await {
                error!("assignments job stopped: {:?}", err);
            }
        }));
        let (bot, http_clone) = (self.clone(), http.clone());
        tasks.push(tokio::spawn(async move {
            if let Err(err) = jobs::channels::task(bot, http_clone).await {
                error!("channels job stopped: {:?}", err);
            }
        }));
        if self.data.config.reminders.enabled {
            let bot = self.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(err) = jobs::reminders::task(bot, http).await {
                    error!("reminders job stopped: {:?}", err);
                }
            }));
        }
        let self_clone = self.clone();
        tasks.push(tokio::spawn(async move {
            let _ = wait_for_stop_signal(self_clone).await;
        }));

        // wait for a task to finish.
        let task = tasks
            .next()
            .await
            .context("no tasks started, illegal state")?
            .context("failed to join task");

        // when a task is finished, we must terminate all the others,
        // hence we send a signal telling all tasks to stop processing
        // and return.
        // the receivers may already be gone if everything stopped.
        std::mem::drop(self.shutdown_send.send(()));

        while let Some(operation) = tasks.next().await {
            operation.context("failed to join task")?;
        }

        task?;
        Ok(())
    }
}
