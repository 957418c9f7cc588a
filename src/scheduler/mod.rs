//! Periodic batch recompute over the active keyword set
//!
//! A batch pass walks every active keyword and forces a refresh through the
//! freshness coordinator. Keywords are isolated from each other: one failure
//! is logged and the pass moves on. A randomized pause between keywords
//! keeps the upstream sources from seeing a burst of scrapes.

use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use crate::config::BatchConfig;
use crate::error::Result;
use crate::freshness::{Freshness, FreshnessCoordinator};
use crate::models::KeywordRecord;

/// Snapshot of the keywords a batch pass covers
#[derive(Debug, Clone, Default)]
pub struct ActiveKeywordSet {
    keywords: Vec<String>,
}

impl ActiveKeywordSet {
    /// Build from an explicit keyword list
    pub fn new(mut keywords: Vec<String>) -> Self {
        keywords.sort();
        keywords.dedup();
        Self { keywords }
    }

    /// Build from registry records, keeping active entries only
    pub fn from_records(records: &[KeywordRecord]) -> Self {
        Self::new(
            records
                .iter()
                .filter(|r| r.is_active())
                .map(|r| r.keyword.clone())
                .collect(),
        )
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Tally of one batch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub refreshed: usize,
    pub stale: usize,
    pub failed: usize,
}

impl BatchStats {
    /// Tally one refresh outcome
    ///
    /// Fresh counts as refreshed: either way the keyword's data is current
    /// after the pass, while stale means the scrape came back empty.
    fn record(&mut self, freshness: Freshness) {
        match freshness {
            Freshness::Fresh | Freshness::Refreshed => self.refreshed += 1,
            Freshness::Stale => self.stale += 1,
        }
    }
}

/// Walks the active keyword set and refreshes each one in turn
pub struct BatchRecompute {
    coordinator: Arc<FreshnessCoordinator>,
    min_pause_ms: u64,
    max_pause_ms: u64,
}

impl BatchRecompute {
    pub fn new(coordinator: Arc<FreshnessCoordinator>, config: &BatchConfig) -> Self {
        Self {
            coordinator,
            min_pause_ms: config.min_pause_ms,
            max_pause_ms: config.max_pause_ms,
        }
    }

    /// One full pass over the keyword set
    pub async fn run_once(&self, keywords: &ActiveKeywordSet) -> Result<BatchStats> {
        let mut stats = BatchStats::default();
        info!(keywords = keywords.len(), "batch recompute pass starting");

        for (i, keyword) in keywords.keywords().iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }

            match self.coordinator.refresh(keyword).await {
                Ok(freshness) => stats.record(freshness),
                Err(e) => {
                    // One bad keyword must not abort the pass
                    warn!(keyword = %keyword, error = %e, "batch refresh failed");
                    stats.failed += 1;
                }
            }
        }

        info!(
            refreshed = stats.refreshed,
            stale = stats.stale,
            failed = stats.failed,
            "batch recompute pass finished"
        );
        Ok(stats)
    }

    async fn pause(&self) {
        let millis = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.min_pause_ms..=self.max_pause_ms)
        };
        tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_active_set_sorted_and_deduped() {
        let set = ActiveKeywordSet::new(vec![
            "mules".to_string(),
            "barn jacket".to_string(),
            "mules".to_string(),
        ]);
        assert_eq!(set.keywords(), ["barn jacket", "mules"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_active_set_from_records_filters_inactive() {
        let now = Utc::now();
        let mut inactive = KeywordRecord::user_search("benched", now);
        inactive.status = crate::models::KeywordStatus::Inactive;
        let records = vec![KeywordRecord::user_search("live", now), inactive];

        let set = ActiveKeywordSet::from_records(&records);
        assert_eq!(set.keywords(), ["live"]);
    }

    #[test]
    fn test_empty_set() {
        let set = ActiveKeywordSet::default();
        assert!(set.is_empty());
    }

    #[test]
    fn test_stats_count_fresh_as_refreshed() {
        let mut stats = BatchStats::default();
        stats.record(Freshness::Fresh);
        stats.record(Freshness::Refreshed);
        stats.record(Freshness::Stale);
        assert_eq!(
            stats,
            BatchStats {
                refreshed: 2,
                stale: 1,
                failed: 0,
            }
        );
    }
}
