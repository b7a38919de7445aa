//! Rebuilds the served snapshot from a [`SourceLoader`].
//!
//! Loading and precomputation are blocking work and run on tokio's blocking pool. A
//! failed refresh is logged and leaves the current snapshot serving.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::index::{IndexSnapshot, Searcher, SnapshotError, SnapshotStats};
use crate::loader::{LoaderError, SourceLoader};

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("a refresh is already running")]
    AlreadyRunning,
    #[error("unable to load screening lists: {0}")]
    Load(#[from] LoaderError),
    #[error("unable to build index snapshot: {0}")]
    Build(#[from] SnapshotError),
    #[error("refresh task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct RefreshService {
    searcher: Arc<Searcher>,
    loader: Arc<dyn SourceLoader>,
    workers: usize,
}

impl std::fmt::Debug for RefreshService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshService")
            .field("workers", &self.workers)
            .field("refreshing", &self.searcher.is_refreshing())
            .finish()
    }
}

impl RefreshService {
    pub fn new(searcher: Arc<Searcher>, loader: Arc<dyn SourceLoader>, workers: usize) -> Self {
        Self {
            searcher,
            loader,
            workers: workers.max(1),
        }
    }

    pub fn searcher(&self) -> &Arc<Searcher> {
        &self.searcher
    }

    /// Loads, builds and swaps on the calling thread.
    pub fn refresh_blocking(&self) -> Result<SnapshotStats, RefreshError> {
        let _guard = self
            .searcher
            .try_begin_refresh()
            .ok_or(RefreshError::AlreadyRunning)?;
        self.rebuild()
    }

    /// Same as [`Self::refresh_blocking`], with the blocking work moved off the runtime.
    /// A second refresh requested while one is running fails with `AlreadyRunning`.
    pub async fn refresh(&self) -> Result<SnapshotStats, RefreshError> {
        let guard = self
            .searcher
            .try_begin_refresh()
            .ok_or(RefreshError::AlreadyRunning)?;
        let service = self.clone();

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            service.rebuild()
        })
        .await?
    }

    fn rebuild(&self) -> Result<SnapshotStats, RefreshError> {
        let started = Instant::now();
        let data = self.loader.load().map_err(|err| {
            error!(error = %err, "list load failed; keeping current snapshot");
            err
        })?;

        let generation = self.searcher.current_snapshot().generation() + 1;
        let snapshot = IndexSnapshot::build(data, self.workers)
            .map_err(|err| {
                error!(error = %err, "snapshot build failed; keeping current snapshot");
                err
            })?
            .with_generation(generation);

        let stats = snapshot.stats();
        let previous = self.searcher.replace(snapshot);
        info!(
            generation,
            previous = previous.generation(),
            records = stats.total(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index snapshot swapped"
        );
        Ok(stats)
    }

    /// Refreshes every `interval` until the returned task is aborted. The first refresh
    /// happens one interval after the call.
    pub fn spawn_periodic(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match self.refresh().await {
                    Ok(stats) => debug!(generation = stats.generation, "scheduled refresh complete"),
                    Err(RefreshError::AlreadyRunning) => {
                        debug!("scheduled refresh skipped; another refresh is running")
                    }
                    Err(err) => error!(error = %err, "scheduled refresh failed"),
                }
            }
        })
    }
}
