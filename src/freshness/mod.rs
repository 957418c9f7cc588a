//! Freshness coordination and scrape gating
//!
//! Serving reads from the local store is cheap; scraping the upstream
//! sources is not. The [`FreshnessCoordinator`] decides which one a request
//! gets: recent-enough cached data is served as-is, stale data triggers a
//! scrape, and concurrent requests for the same keyword share one in-flight
//! scrape instead of each launching their own.
//!
//! The in-flight scrape runs in a spawned task, so a caller that gives up
//! waiting never cancels the work for everyone else.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::analytics::{classify_series, combined_volume_series, compute_score, window_from};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Computed, LifecycleStage, Observation, TrendScore};
use crate::sources::TrendSource;
use crate::storage::TrendStore;

/// How a read request was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Cached data was recent enough; no scrape happened
    Fresh,
    /// A scrape ran and the store now holds new observations
    Refreshed,
    /// The scrape produced nothing usable; serving older cached data
    Stale,
}

/// Terminal state of one shared scrape, broadcast to every waiter
#[derive(Debug, Clone)]
enum ScrapeOutcome {
    Refreshed,
    StaleFallback,
    NoData,
    Failed(String),
}

/// Gates scrapes behind a staleness check and deduplicates concurrent
/// scrapes per keyword
pub struct FreshnessCoordinator {
    store: Arc<dyn TrendStore>,
    sources: Vec<Arc<dyn TrendSource>>,
    staleness: Duration,
    scrape_period_days: u32,
    score_periods: Vec<u32>,
    inflight: Mutex<HashMap<String, broadcast::Sender<ScrapeOutcome>>>,
}

impl FreshnessCoordinator {
    pub fn new(
        store: Arc<dyn TrendStore>,
        sources: Vec<Arc<dyn TrendSource>>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            sources,
            staleness: Duration::hours(config.freshness.staleness_hours as i64),
            scrape_period_days: config.freshness.scrape_period_days,
            score_periods: config.scoring.score_periods.clone(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Serve-or-scrape decision for one keyword
    ///
    /// Data younger than the staleness threshold short-circuits to
    /// [`Freshness::Fresh`]. Otherwise the caller joins (or starts) the
    /// keyword's shared scrape and waits for its outcome.
    pub async fn ensure_fresh(self: &Arc<Self>, keyword: &str) -> Result<Freshness> {
        if let Some(latest) = self.store.latest_observation_at(keyword)? {
            if Utc::now() - latest <= self.staleness {
                debug!(keyword = %keyword, "cached data fresh, skipping scrape");
                return Ok(Freshness::Fresh);
            }
        }
        self.single_flight(keyword).await
    }

    /// Unconditional refresh, bypassing the staleness check
    ///
    /// Still deduplicated: a refresh issued while a scrape for the same
    /// keyword is in flight joins it instead of starting a second one.
    pub async fn refresh(self: &Arc<Self>, keyword: &str) -> Result<Freshness> {
        self.single_flight(keyword).await
    }

    async fn single_flight(self: &Arc<Self>, keyword: &str) -> Result<Freshness> {
        let mut rx = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(keyword) {
                Some(tx) => {
                    debug!(keyword = %keyword, "joining in-flight scrape");
                    tx.subscribe()
                }
                None => {
                    let (tx, rx) = broadcast::channel(1);
                    inflight.insert(keyword.to_string(), tx.clone());

                    let this = Arc::clone(self);
                    let kw = keyword.to_string();
                    // The leader waits on the channel like everyone else;
                    // the scrape itself runs detached so an abandoned
                    // waiter cannot cancel it.
                    tokio::spawn(async move {
                        let outcome = this.scrape_and_score(&kw).await;
                        this.inflight.lock().await.remove(&kw);
                        let _ = tx.send(outcome);
                    });
                    rx
                }
            }
        };

        match rx.recv().await {
            Ok(ScrapeOutcome::Refreshed) => Ok(Freshness::Refreshed),
            Ok(ScrapeOutcome::StaleFallback) => Ok(Freshness::Stale),
            Ok(ScrapeOutcome::NoData) => Err(Error::NoDataAvailable(keyword.to_string())),
            Ok(ScrapeOutcome::Failed(message)) => Err(Error::other(message)),
            Err(_) => Err(Error::other("in-flight scrape dropped")),
        }
    }

    /// Fan out across every source, persist what came back and recompute
    /// the keyword's stored scores
    async fn scrape_and_score(&self, keyword: &str) -> ScrapeOutcome {
        let fetches = self.sources.iter().map(|source| async move {
            let result = source.fetch(keyword, self.scrape_period_days).await;
            (source.name().to_string(), result)
        });

        let mut collected: Vec<Observation> = Vec::new();
        for (source, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(batch) => {
                    debug!(
                        keyword = %keyword,
                        source = %source,
                        observations = batch.len(),
                        "source fetch succeeded"
                    );
                    collected.extend(batch);
                }
                Err(e) => {
                    // Partial success is fine; one source failing must not
                    // discard the others' data.
                    warn!(
                        keyword = %keyword,
                        source = %source,
                        error = %e,
                        "source fetch failed"
                    );
                }
            }
        }

        if collected.is_empty() {
            let had_prior = match self.store.latest_observation_at(keyword) {
                Ok(latest) => latest.is_some(),
                Err(e) => return ScrapeOutcome::Failed(e.to_string()),
            };
            return if had_prior {
                warn!(keyword = %keyword, "scrape produced nothing, serving stale data");
                ScrapeOutcome::StaleFallback
            } else {
                ScrapeOutcome::NoData
            };
        }

        if let Err(e) = self.store.insert_observations(&collected) {
            return ScrapeOutcome::Failed(e.to_string());
        }
        info!(
            keyword = %keyword,
            observations = collected.len(),
            "scrape stored new observations"
        );

        if let Err(e) = self.recompute_scores(keyword) {
            return ScrapeOutcome::Failed(e.to_string());
        }
        ScrapeOutcome::Refreshed
    }

    /// Recompute and persist the stored score for every configured period
    fn recompute_scores(&self, keyword: &str) -> Result<()> {
        let observations = self.store.observations_since(keyword, None)?;
        let all_time = combined_volume_series(&observations);
        let now = Utc::now();

        for &period in &self.score_periods {
            let growth = match compute_score(period, now, &observations) {
                Computed::Ready(growth) => growth,
                Computed::InsufficientData => {
                    debug!(keyword = %keyword, period, "not enough data to score");
                    continue;
                }
            };

            // Slice the all-time series so the classifier's volume
            // percentile stays relative to the historical maximum
            let window_start = (now - Duration::days(i64::from(period))).date_naive();
            let period_series = window_from(&all_time, window_start);
            let stage = classify_series(period_series, &all_time)
                .ready()
                .unwrap_or(LifecycleStage::Saturation);

            let score = TrendScore {
                keyword: keyword.to_string(),
                period_days: period,
                volume_growth: growth.volume_growth,
                price_growth: growth.price_growth,
                composite_score: growth.composite_score,
                lifecycle_stage: stage,
                computed_at: now,
            };
            if !self.store.upsert_score(&score)? {
                debug!(keyword = %keyword, period, "newer score already stored, skipping");
            }
        }
        Ok(())
    }
}
