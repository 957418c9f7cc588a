//! Storage abstraction for observations, scores and the keyword registry
//!
//! The [`TrendStore`] trait decouples the engine and freshness pipeline from
//! the backing database, so tests can run against the in-memory store while
//! production uses SQLite.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryTrendStore;
pub use sqlite::SqliteTrendStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{KeywordRecord, KeywordStatus, Observation, TrendScore};

/// Persistent store for the trend analytics engine
///
/// Observations are append-only. Trend scores keep one logical row per
/// (keyword, period_days), replaced only by a strictly newer computation so
/// concurrent writers can race without locks.
pub trait TrendStore: Send + Sync {
    /// Append a batch of raw observations
    fn insert_observations(&self, observations: &[Observation]) -> Result<usize>;

    /// All observations for a keyword recorded at or after `since`
    /// (all of them when `since` is `None`), oldest first
    fn observations_since(
        &self,
        keyword: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>>;

    /// Timestamp of the most recent observation for a keyword
    fn latest_observation_at(&self, keyword: &str) -> Result<Option<DateTime<Utc>>>;

    /// Store a trend score unless a newer one is already present
    ///
    /// Returns `true` when the row was written, `false` when an equal-or-newer
    /// `computed_at` already held the slot.
    fn upsert_score(&self, score: &TrendScore) -> Result<bool>;

    /// Stored score for one (keyword, period) pair
    fn score(&self, keyword: &str, period_days: u32) -> Result<Option<TrendScore>>;

    /// All stored scores for a period, across keywords
    fn scores_for_period(&self, period_days: u32) -> Result<Vec<TrendScore>>;

    /// Insert or replace a keyword registry entry
    fn upsert_keyword(&self, record: &KeywordRecord) -> Result<()>;

    /// Registry entry for a keyword
    fn keyword(&self, keyword: &str) -> Result<Option<KeywordRecord>>;

    /// Record a user search against an existing keyword: bumps
    /// `last_searched_at` and reactivates an inactive entry
    fn touch_keyword(&self, keyword: &str, at: DateTime<Utc>) -> Result<()>;

    /// Every registry entry, alphabetical
    fn keywords(&self) -> Result<Vec<KeywordRecord>>;

    /// Active registry entries only, alphabetical
    fn active_keywords(&self) -> Result<Vec<KeywordRecord>>;

    /// Set a keyword's tracking status
    fn set_keyword_status(&self, keyword: &str, status: KeywordStatus) -> Result<()>;

    /// Deactivate a keyword
    ///
    /// Seed keywords are protected and return [`crate::error::Error::SeedProtected`];
    /// an unknown keyword returns [`crate::error::Error::KeywordNotFound`].
    /// Historical observations are kept either way.
    fn deactivate_keyword(&self, keyword: &str) -> Result<()>;
}
