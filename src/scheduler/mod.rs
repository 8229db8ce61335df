//! Feed polling.
//!
//! Every enabled feed gets its own task with its own timer and [`Backoff`].
//! Tasks share nothing but the [`FeedCache`] and the shutdown token.

mod backoff;

pub use backoff::Backoff;

use crate::cache::FeedCache;
use crate::config::Config;
use crate::feeds::{FeedSource, HttpClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long `shutdown` waits for tasks before aborting them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Polling state owned by one feed's task.
struct FeedPoller {
    id: String,
    source: FeedSource,
    backoff: Backoff,
    cache: FeedCache,
    refresh: Arc<Notify>,
    shutdown: CancellationToken,
}

impl FeedPoller {
    async fn run(mut self) {
        debug!("Poller for '{}' started", self.id);
        loop {
            self.poll_once().await;
            if self.shutdown.is_cancelled() {
                break;
            }

            let delay = self.backoff.next_delay();
            debug!("Next poll of '{}' in {:?}", self.id, delay);
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = self.refresh.notified() => {
                    debug!("Manual refresh of '{}'", self.id);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
        debug!("Poller for '{}' stopped", self.id);
    }

    /// Run one fetch and commit its result, unless a poll is already running.
    async fn poll_once(&mut self) {
        let Some(_guard) = self.cache.try_begin_poll(&self.id) else {
            debug!("Skipping poll of '{}': already in flight", self.id);
            return;
        };

        let result = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return,
            result = self.source.fetch() => result,
        };

        match result {
            Ok(outcome) => {
                let records = outcome.records.len();
                let dropped = outcome.dropped;
                self.backoff.on_success();
                if self.cache.record_success(&self.id, outcome) {
                    debug!(
                        "Polled '{}': {} records, {} dropped",
                        self.id, records, dropped
                    );
                }
            }
            Err(e) => {
                self.backoff.on_failure(&e);
                if !self.cache.record_failure(&self.id, &e) {
                    return;
                }
                if e.is_retryable() {
                    warn!(
                        "Poll of '{}' failed ({} in a row): {}",
                        self.id,
                        self.backoff.failures(),
                        e
                    );
                } else {
                    error!(
                        "Poll of '{}' failed ({} in a row), likely needs a config change: {}",
                        self.id,
                        self.backoff.failures(),
                        e
                    );
                }
            }
        }
    }
}

/// Owns the per-feed polling tasks.
pub struct PollScheduler {
    pending: Vec<FeedPoller>,
    refresh: Vec<(String, Arc<Notify>)>,
    cache: FeedCache,
    shutdown: CancellationToken,
    tasks: JoinSet<()>,
}

impl PollScheduler {
    /// Prepare one poller per enabled feed. Nothing runs until [`start`](Self::start).
    pub fn new(
        config: &Config,
        cache: FeedCache,
        http: Arc<dyn HttpClient>,
        shutdown: CancellationToken,
    ) -> Self {
        let mut pending = Vec::new();
        let mut refresh = Vec::new();

        for (id, feed) in config.enabled_feeds() {
            let notify = Arc::new(Notify::new());
            refresh.push((id.clone(), Arc::clone(&notify)));
            pending.push(FeedPoller {
                id: id.clone(),
                source: FeedSource::from_params(&feed.params, Arc::clone(&http)),
                backoff: Backoff::new(
                    feed.refresh_interval(),
                    config.general.backoff_multiplier,
                    config.max_backoff(),
                ),
                cache: cache.clone(),
                refresh: notify,
                shutdown: shutdown.clone(),
            });
        }

        Self {
            pending,
            refresh,
            cache,
            shutdown,
            tasks: JoinSet::new(),
        }
    }

    /// Spawn the polling tasks; each feed is polled immediately.
    pub fn start(&mut self) {
        for poller in self.pending.drain(..) {
            info!(
                "Polling '{}' ({}) every {:?}",
                poller.id,
                poller.source.kind(),
                poller.backoff.next_delay()
            );
            self.tasks.spawn(poller.run());
        }
    }

    /// Number of feeds handled by this scheduler.
    pub fn feed_count(&self) -> usize {
        self.refresh.len()
    }

    /// Ask every idle feed to poll now.
    ///
    /// Feeds with a poll in flight ignore the request; it is never queued.
    pub fn refresh_all(&self) {
        for (id, notify) in &self.refresh {
            if self.cache.is_polling(id) {
                debug!("Refresh of '{}' ignored: poll in flight", id);
                continue;
            }
            // Only wakes a task already waiting; no permit is stored.
            notify.notify_waiters();
        }
    }

    /// Stop all polling.
    ///
    /// The cache is sealed before tasks are cancelled, so no snapshot lands
    /// once this is called.
    pub async fn shutdown(&mut self) {
        self.cache.seal();
        self.shutdown.cancel();

        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while let Some(res) = self.tasks.join_next().await {
                match res {
                    Err(e) if e.is_panic() => error!("Poll task panicked: {}", e),
                    _ => {}
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Poll tasks did not stop in time; aborting");
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        }
        info!("Poll scheduler stopped");
    }
}
