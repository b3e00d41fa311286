use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::provider::JwksFetcher;
use super::sanitize::redact_jwks_uri;
use super::super::constants::{DEFAULT_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL};
use crate::jwt::keys::{EvictionPolicy, KeyStore};

/// Outcome of one pass over every configured endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub endpoints_ok: usize,
    pub endpoints_failed: usize,
    pub keys_stored: usize,
    pub keys_evicted: usize,
}

/// Keeps a [`KeyStore`] in sync with its JWKS endpoints.
#[derive(Debug, Clone)]
pub struct KeyRefresher {
    store: Arc<KeyStore>,
    fetcher: JwksFetcher,
    interval: Duration,
    eviction: EvictionPolicy,
}

impl KeyRefresher {
    pub fn new(store: Arc<KeyStore>, fetcher: JwksFetcher) -> Self {
        Self {
            store,
            fetcher,
            interval: DEFAULT_REFRESH_INTERVAL,
            eviction: EvictionPolicy::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_REFRESH_INTERVAL);
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn store(&self) -> &Arc<KeyStore> {
        &self.store
    }

    /// Fetches every endpoint in order. A failing endpoint is logged and skipped.
    pub async fn refresh_once(&self) -> RefreshReport {
        let endpoints = self.store.endpoints();
        debug!("fetching keys from {} jwks endpoint(s)", endpoints.len());
        let mut report = RefreshReport::default();
        for endpoint in endpoints {
            match self.fetcher.fetch(endpoint).await {
                Ok(keys) => {
                    let fetched = keys.into_iter().map(|jwk| (jwk.kid, jwk.key)).collect();
                    let (stored, evicted) =
                        self.store.apply_remote(endpoint, fetched, self.eviction);
                    report.endpoints_ok += 1;
                    report.keys_stored += stored;
                    report.keys_evicted += evicted;
                }
                Err(err) => {
                    warn!(
                        "jwks refresh failed; uri={}: {}",
                        redact_jwks_uri(endpoint),
                        err
                    );
                    report.endpoints_failed += 1;
                }
            }
        }
        info!(
            "jwks refresh finished; ok={}, failed={}, stored={}, evicted={}, total_keys={}",
            report.endpoints_ok,
            report.endpoints_failed,
            report.keys_stored,
            report.keys_evicted,
            self.store.len()
        );
        report
    }

    /// Refreshes immediately, then once per interval, until `cancel` fires.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self, cancel: CancellationToken) -> RefreshHandle {
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = ticker(self.interval);
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = self.refresh_once() => {}
                }
            }
            debug!("jwks refresh task stopped");
        });
        RefreshHandle { cancel, task }
    }
}

/// A slow refresh pushes the next tick back instead of firing a catch-up burst.
pub(super) fn ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Owner of a running refresh task.
///
/// Dropping the handle leaves the task running until its token is cancelled.
#[derive(Debug)]
pub struct RefreshHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the task and waits for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            warn!("jwks refresh task ended abnormally: {}", err);
        }
    }
}
