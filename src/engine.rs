//! High-level engine facade
//!
//! Ties the store, the freshness coordinator and the analytics core into
//! the operations a caller actually asks for: search a keyword, score it,
//! classify it, forecast it, rank the whole tracked set. Every public
//! method normalizes its keyword argument first so "  Quiet  Luxury " and
//! "quiet luxury" are the same keyword everywhere.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, OnceLock};

use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analytics::{
    classify_series, combined_volume_series, compute_score, correlations, rank_forecast,
    seasonal_profile, window_from, KeywordTrajectory, VolumeForecaster,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::freshness::{Freshness, FreshnessCoordinator};
use crate::models::{
    Computed, CorrelationEdge, DailyPoint, ForecastSeries, KeywordRecord, KeywordStatus,
    LifecycleStage, MonthlyProfile, RankForecast, TrendScore,
};
use crate::storage::TrendStore;

/// Supported scoring period range, days
pub const PERIOD_RANGE: std::ops::RangeInclusive<u32> = 2..=365;

/// Outcome of a user-facing keyword search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub keyword: String,
    pub freshness: Freshness,
    pub score: Computed<TrendScore>,
}

/// Facade over the whole trend analytics pipeline
pub struct TrendEngine {
    store: Arc<dyn TrendStore>,
    coordinator: Arc<FreshnessCoordinator>,
    forecaster: VolumeForecaster,
    rank_window: usize,
    score_periods: Vec<u32>,
}

impl TrendEngine {
    pub fn new(
        store: Arc<dyn TrendStore>,
        coordinator: Arc<FreshnessCoordinator>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            coordinator,
            forecaster: VolumeForecaster::new(&config.forecast),
            rank_window: config.ranking.trailing_window,
            score_periods: config.scoring.score_periods.clone(),
        }
    }

    /// Search for a keyword: track it, make its data fresh, score it
    ///
    /// A brand-new keyword enters the registry as a user search; an existing
    /// one gets its `last_searched_at` bumped (and is reactivated if it had
    /// been benched). The scrape outcome rides along in the result.
    pub async fn search(&self, keyword: &str, period_days: u32) -> Result<SearchResult> {
        let keyword = normalize_keyword(keyword);
        validate_period(period_days)?;

        self.ensure_tracked(&keyword)?;
        let freshness = self.coordinator.ensure_fresh(&keyword).await?;
        let score = self.score_normalized(&keyword, period_days)?;

        Ok(SearchResult {
            keyword,
            freshness,
            score,
        })
    }

    /// Make a keyword's cached data fresh without scoring it
    pub async fn ensure_fresh(&self, keyword: &str) -> Result<Freshness> {
        let keyword = normalize_keyword(keyword);
        self.ensure_tracked(&keyword)?;
        self.coordinator.ensure_fresh(&keyword).await
    }

    /// Compute the trend score for a keyword over a period, on the fly
    ///
    /// Reads whatever the store currently holds; does not scrape and does
    /// not persist the result (the freshness pipeline owns stored scores).
    pub fn score(&self, keyword: &str, period_days: u32) -> Result<Computed<TrendScore>> {
        let keyword = normalize_keyword(keyword);
        validate_period(period_days)?;
        self.score_normalized(&keyword, period_days)
    }

    /// Lifecycle stage of a keyword over a period
    pub fn lifecycle_stage(
        &self,
        keyword: &str,
        period_days: u32,
    ) -> Result<Computed<LifecycleStage>> {
        let keyword = normalize_keyword(keyword);
        validate_period(period_days)?;

        let observations = self.store.observations_since(&keyword, None)?;
        let all_time = combined_volume_series(&observations);
        let period_series = window_from(&all_time, window_start(period_days));
        Ok(classify_series(period_series, &all_time))
    }

    /// Volume forecast over the keyword's full history
    pub fn forecast(&self, keyword: &str, horizon_days: u32) -> Result<Computed<ForecastSeries>> {
        let keyword = normalize_keyword(keyword);
        let observations = self.store.observations_since(&keyword, None)?;
        let series = combined_volume_series(&observations);
        self.forecaster.forecast(&keyword, &series, horizon_days)
    }

    /// Rank forecast across every active keyword with volume history
    pub fn rank_forecast(&self) -> Result<Vec<RankForecast>> {
        let active = self.store.active_keywords()?;
        let mut trajectories = Vec::with_capacity(active.len());

        for record in &active {
            let observations = self.store.observations_since(&record.keyword, None)?;
            let all_time = combined_volume_series(&observations);
            if all_time.is_empty() {
                continue;
            }

            let start = all_time.len().saturating_sub(self.rank_window);
            let window = &all_time[start..];
            let stage = match classify_series(window, &all_time) {
                Computed::Ready(stage) => stage,
                Computed::InsufficientData => self
                    .stored_stage(&record.keyword)?
                    .unwrap_or(LifecycleStage::Saturation),
            };

            trajectories.push(KeywordTrajectory::new(
                record.keyword.clone(),
                window.iter().map(|p| p.value).collect(),
                stage,
            ));
        }

        Ok(rank_forecast(&trajectories))
    }

    /// Correlation edges between a keyword and the rest of the tracked set
    pub fn correlations(&self, keyword: &str, period_days: u32) -> Result<Vec<CorrelationEdge>> {
        let keyword = normalize_keyword(keyword);
        validate_period(period_days)?;
        if self.store.keyword(&keyword)?.is_none() {
            return Err(Error::KeywordNotFound(keyword));
        }

        let since = Utc::now() - Duration::days(i64::from(period_days));
        let mut series_by_keyword: BTreeMap<String, Vec<DailyPoint>> = BTreeMap::new();

        let mut keywords: Vec<String> = self
            .store
            .active_keywords()?
            .into_iter()
            .map(|r| r.keyword)
            .collect();
        if !keywords.contains(&keyword) {
            keywords.push(keyword.clone());
        }

        for kw in keywords {
            let observations = self.store.observations_since(&kw, Some(since))?;
            let series = combined_volume_series(&observations);
            if !series.is_empty() {
                series_by_keyword.insert(kw, series);
            }
        }

        Ok(correlations(&keyword, &series_by_keyword))
    }

    /// Monthly seasonal profile over the keyword's full history
    pub fn seasonal_profile(&self, keyword: &str) -> Result<Vec<MonthlyProfile>> {
        let keyword = normalize_keyword(keyword);
        let observations = self.store.observations_since(&keyword, None)?;
        Ok(seasonal_profile(&combined_volume_series(&observations)))
    }

    /// Stored leaderboard for a period: active keywords by composite score
    pub fn top_trends(&self, period_days: u32, limit: usize) -> Result<Vec<TrendScore>> {
        validate_period(period_days)?;

        let active: HashSet<String> = self
            .store
            .active_keywords()?
            .into_iter()
            .map(|r| r.keyword)
            .collect();

        let mut scores: Vec<TrendScore> = self
            .store
            .scores_for_period(period_days)?
            .into_iter()
            .filter(|s| active.contains(&s.keyword))
            .collect();
        scores.sort_by(|a, b| {
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        scores.truncate(limit);
        Ok(scores)
    }

    /// Every registry entry
    pub fn keywords(&self) -> Result<Vec<KeywordRecord>> {
        self.store.keywords()
    }

    /// Reactivate (or mark active) a tracked keyword
    pub fn activate_keyword(&self, keyword: &str) -> Result<()> {
        let keyword = normalize_keyword(keyword);
        self.store.set_keyword_status(&keyword, KeywordStatus::Active)
    }

    /// Deactivate a tracked keyword (seed keywords are protected)
    pub fn deactivate_keyword(&self, keyword: &str) -> Result<()> {
        let keyword = normalize_keyword(keyword);
        self.store.deactivate_keyword(&keyword)
    }

    fn ensure_tracked(&self, keyword: &str) -> Result<()> {
        let now = Utc::now();
        if self.store.keyword(keyword)?.is_some() {
            self.store.touch_keyword(keyword, now)
        } else {
            self.store
                .upsert_keyword(&KeywordRecord::user_search(keyword, now))
        }
    }

    fn score_normalized(&self, keyword: &str, period_days: u32) -> Result<Computed<TrendScore>> {
        let now = Utc::now();
        let observations = self.store.observations_since(keyword, None)?;

        let growth = match compute_score(period_days, now, &observations) {
            Computed::Ready(growth) => growth,
            Computed::InsufficientData => return Ok(Computed::InsufficientData),
        };

        let all_time = combined_volume_series(&observations);
        let period_series = window_from(&all_time, window_start(period_days));
        let stage = classify_series(period_series, &all_time)
            .ready()
            .unwrap_or(LifecycleStage::Saturation);

        Ok(Computed::Ready(TrendScore {
            keyword: keyword.to_string(),
            period_days,
            volume_growth: growth.volume_growth,
            price_growth: growth.price_growth,
            composite_score: growth.composite_score,
            lifecycle_stage: stage,
            computed_at: now,
        }))
    }

    /// First stored stage across the configured periods, if any
    fn stored_stage(&self, keyword: &str) -> Result<Option<LifecycleStage>> {
        for &period in &self.score_periods {
            if let Some(score) = self.store.score(keyword, period)? {
                return Ok(Some(score.lifecycle_stage));
            }
        }
        Ok(None)
    }
}

/// Canonical keyword form: trimmed, lowercased, inner whitespace collapsed
pub fn normalize_keyword(keyword: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let ws = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    ws.replace_all(keyword.trim(), " ").to_lowercase()
}

/// First date inside the trailing `period_days` window
fn window_start(period_days: u32) -> chrono::NaiveDate {
    (Utc::now() - Duration::days(i64::from(period_days))).date_naive()
}

/// Reject periods outside the supported range
pub fn validate_period(period_days: u32) -> Result<()> {
    if !PERIOD_RANGE.contains(&period_days) {
        return Err(Error::InvalidPeriod(period_days));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keyword() {
        assert_eq!(normalize_keyword("  Quiet   Luxury "), "quiet luxury");
        assert_eq!(normalize_keyword("Y2K\tFashion"), "y2k fashion");
        assert_eq!(normalize_keyword("clogs"), "clogs");
    }

    #[test]
    fn test_validate_period() {
        assert!(validate_period(2).is_ok());
        assert!(validate_period(365).is_ok());
        assert!(matches!(validate_period(1), Err(Error::InvalidPeriod(1))));
        assert!(matches!(
            validate_period(366),
            Err(Error::InvalidPeriod(366))
        ));
    }
}
