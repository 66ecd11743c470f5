use std::{
    future::Future,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{bail, Context};
use chrono::Utc;
use log::{error, info, warn};
use tokio::{
    sync::{broadcast, watch},
    time::sleep,
};

pub mod assignments;
pub mod channels;
pub mod reminders;

#[cfg(test)]
pub(crate) mod testing;

/// Makes sure a job never runs twice at the same time,
/// be it from its schedule or from a command.
#[derive(Debug)]
pub struct JobGuard {
    name: &'static str,
    running: AtomicBool,
}

/// Held while a run is in flight. Releases the guard when dropped.
pub struct RunPermit<'a> {
    guard: &'a JobGuard,
}

impl Drop for RunPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

impl JobGuard {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            running: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn try_start(&self) -> Option<RunPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit { guard: self })
    }

    /// Runs `job` unless a previous run is still in flight, in which case
    /// `None` is returned and `job` is dropped without being polled.
    pub async fn run<F: Future>(&self, job: F) -> Option<F::Output> {
        let Some(_permit) = self.try_start() else {
            warn!("{}: a run is already in flight, skipping", self.name);
            return None;
        };

        Some(job.await)
    }
}

/// Runs a job once the bot is ready, then at every firing of `cron`,
/// until a shutdown signal is received.
///
/// A failed run is logged and does not stop the loop.
pub async fn run_scheduled<F, Fut>(
    guard: &JobGuard,
    cron: &str,
    mut ready: watch::Receiver<bool>,
    mut shutdown: broadcast::Receiver<()>,
    mut job: F,
) -> Result<(), anyhow::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), anyhow::Error>>,
{
    let name = guard.name();
    let schedule = saffron::Cron::new(match cron.parse() {
        Ok(r) => r,
        Err(e) => bail!("failed to parse the cron expression of {}: {}", name, e),
    });

    // jobs talk to discord, wait for the connection first
    tokio::select! {
        result = async { ready.wait_for(|ready| *ready).await.map(|_| ()) } => {
            result.context("the ready signal was dropped")?;
        },
        _ = shutdown.recv() => {
            return Ok(());
        }
    }

    loop {
        info!("{}: starting run", name);
        match guard.run(job()).await {
            Some(Ok(())) => info!("{}: run finished", name),
            Some(Err(err)) => error!("{}: run failed: {:?}", name, err),
            None => {}
        }

        // calculate the next cron execution and wait
        let current_time = Utc::now();
        let next = schedule
            .next_after(current_time)
            .context("failed to get next date")?;

        let sleep_time = next - current_time;
        info!(
            "{}: waiting {}s, trigger at {}",
            name,
            sleep_time.num_seconds(),
            next
        );

        let wait = sleep(
            sleep_time
                .to_std()
                .context("failed to convert a chrono duration to a std duration")?,
        );

        tokio::select! {
            _ = wait => {},
            _ = shutdown.recv() => {
                return Ok(());
            }
        }
    }
}
