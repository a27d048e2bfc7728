//! Periodic REST reconciliation of the office cache.
//!
//! Push events only patch what is already cached. Deletions, new desks and
//! anything missed while the relay was down are picked up here by replacing
//! the cache contents with a fresh fetch.

mod config;

pub use config::*;

use crate::api::{ApiClient, ApiError};
use crate::cache::OfficeCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Counts from one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub desks: usize,
    /// `None` when reservations were not fetched
    pub reservations: Option<usize>,
}

/// Background service that keeps the cache in line with the server.
pub struct CacheSync {
    api: ApiClient,
    cache: Arc<OfficeCache>,
    config: RefreshConfig,
}

impl CacheSync {
    pub fn new(api: ApiClient, cache: Arc<OfficeCache>, config: RefreshConfig) -> Self {
        Self { api, cache, config }
    }

    /// Fetch desks (and reservations) once and replace the cached sets.
    ///
    /// Nothing is replaced unless every fetch succeeded.
    pub async fn refresh_once(&self) -> Result<SyncReport, ApiError> {
        let desks = self.api.desks().await?;
        let reservations = if self.config.include_reservations {
            Some(self.api.reservations().await?)
        } else {
            None
        };

        let report = SyncReport {
            desks: desks.len(),
            reservations: reservations.as_ref().map(Vec::len),
        };

        self.cache.replace_desks(desks);
        if let Some(reservations) = reservations {
            self.cache.replace_reservations(reservations);
        }

        metrics::counter!("deskrelay_cache_refreshes_total").increment(1);
        Ok(report)
    }

    /// Start the refresh loop. The first cycle runs one interval from now.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = Duration::from_secs(self.config.interval_seconds.max(1));
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = self.config.interval_seconds,
                "Cache sync started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Cache sync shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        match self.refresh_once().await {
                            Ok(report) => tracing::debug!(
                                desks = report.desks,
                                reservations = ?report.reservations,
                                "Cache sync cycle completed"
                            ),
                            Err(e) => {
                                metrics::counter!("deskrelay_cache_refresh_failures_total").increment(1);
                                tracing::warn!(error = %e, "Cache sync cycle failed, keeping cached data");
                            }
                        }
                    }
                }
            }
        })
    }
}
