//! Cached exchange rate provider.
//!
//! [`ExchangeRateProvider`] owns a [`RateCache`] and refreshes it from a
//! [`RateSource`] once the snapshot is older than the refresh interval. Feed
//! failures never reach callers: the stale snapshot is served when there is
//! one, otherwise [`RateTable::fallback`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use super::rates::RateTable;

/// Default age after which the cached snapshot is refreshed.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::hours(24);

/// Errors from a single attempt to fetch a rate snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateFetchError {
    /// Transport failure or timeout.
    #[error("rate feed request failed: {0}")]
    Http(String),

    /// The feed answered with a non-success status.
    #[error("rate feed returned HTTP {0}")]
    Status(u16),

    /// The feed body could not be parsed.
    #[error("rate feed could not be parsed: {0}")]
    Parse(String),

    /// The feed parsed but carried no rates.
    #[error("rate feed contained no rates")]
    Empty,
}

/// Upstream source of rate snapshots.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches a fresh snapshot.
    async fn fetch(&self) -> Result<RateTable, RateFetchError>;
}

/// Time source, injectable for tests.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Last successful snapshot and when it was fetched.
#[derive(Debug, Clone, Default)]
pub struct RateCache {
    rates: Option<RateTable>,
    fetched_at: Option<DateTime<Utc>>,
}

impl RateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-populated with a snapshot fetched at `fetched_at`.
    #[must_use]
    pub fn seeded(rates: RateTable, fetched_at: DateTime<Utc>) -> Self {
        Self {
            rates: Some(rates),
            fetched_at: Some(fetched_at),
        }
    }

    /// Cached snapshot, if any.
    #[must_use]
    pub fn rates(&self) -> Option<&RateTable> {
        self.rates.as_ref()
    }

    /// When the cached snapshot was fetched.
    #[must_use]
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Returns the snapshot if it is younger than `max_age` at `now`.
    #[must_use]
    pub fn fresh(&self, now: DateTime<Utc>, max_age: Duration) -> Option<&RateTable> {
        match (&self.rates, self.fetched_at) {
            (Some(rates), Some(at)) if now - at < max_age => Some(rates),
            _ => None,
        }
    }

    /// Replaces the snapshot.
    pub fn store(&mut self, rates: RateTable, fetched_at: DateTime<Utc>) {
        self.rates = Some(rates);
        self.fetched_at = Some(fetched_at);
    }
}

/// Shared, cached access to the current rate table.
pub struct ExchangeRateProvider {
    source: Box<dyn RateSource>,
    clock: Arc<dyn Clock>,
    refresh_interval: Duration,
    cache: RwLock<RateCache>,
}

impl std::fmt::Debug for ExchangeRateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeRateProvider")
            .field("refresh_interval", &self.refresh_interval)
            .finish_non_exhaustive()
    }
}

impl ExchangeRateProvider {
    /// Creates a provider with an empty cache and the system clock.
    #[must_use]
    pub fn new(source: Box<dyn RateSource>, refresh_interval: Duration) -> Self {
        Self::with_parts(
            source,
            Arc::new(SystemClock),
            refresh_interval,
            RateCache::new(),
        )
    }

    /// Creates a provider from explicit parts.
    #[must_use]
    pub fn with_parts(
        source: Box<dyn RateSource>,
        clock: Arc<dyn Clock>,
        refresh_interval: Duration,
        cache: RateCache,
    ) -> Self {
        Self {
            source,
            clock,
            refresh_interval,
            cache: RwLock::new(cache),
        }
    }

    /// Returns the current rate table.
    ///
    /// Serves the cache while it is fresh. Otherwise fetches from the source
    /// and stores the result. On fetch failure the stale cache is served,
    /// then the static fallback. Concurrent refreshes are not coalesced; the
    /// last one to finish wins.
    pub async fn get_rates(&self) -> RateTable {
        let now = self.clock.now();

        {
            let cache = self.cache.read().await;
            if let Some(rates) = cache.fresh(now, self.refresh_interval) {
                return rates.clone();
            }
        }

        match self.source.fetch().await {
            Ok(rates) => {
                let fetched_at = self.clock.now();
                tracing::info!(currencies = rates.len(), %fetched_at, "Exchange rates refreshed");
                self.cache.write().await.store(rates.clone(), fetched_at);
                rates
            }
            Err(err) => {
                let cache = self.cache.read().await;
                if let Some(stale) = cache.rates() {
                    tracing::warn!(error = %err, fetched_at = ?cache.fetched_at(), "Rate refresh failed, serving stale rates");
                    stale.clone()
                } else {
                    tracing::warn!(error = %err, "Rate refresh failed with empty cache, serving fallback rates");
                    RateTable::fallback()
                }
            }
        }
    }

    /// Copy of the current cache state, without triggering a refresh.
    pub async fn snapshot(&self) -> RateCache {
        self.cache.read().await.clone()
    }
}
