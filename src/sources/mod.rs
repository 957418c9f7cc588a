//! Data-source collaborators
//!
//! A [`TrendSource`] wraps one upstream scraper (search interest,
//! marketplace, social media, image board). The freshness coordinator fans a
//! scrape out across every registered source and tolerates individual
//! failures, so implementations report their own errors instead of papering
//! over them with empty batches.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Observation, SourceKind};

/// One upstream scraper
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Human-readable source name, used in logs and error messages
    fn name(&self) -> &str;

    /// Which source family the observations belong to
    fn kind(&self) -> SourceKind;

    /// Fetch raw observations for a keyword covering the trailing
    /// `period_days` window
    async fn fetch(&self, keyword: &str, period_days: u32) -> Result<Vec<Observation>>;
}
