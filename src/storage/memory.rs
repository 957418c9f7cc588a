//! In-memory trend store
//!
//! Mirrors the SQLite backend's semantics (including the compare-and-swap
//! score upsert) without touching disk. Used by tests and by ephemeral runs
//! that have no reason to persist.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::models::{KeywordOrigin, KeywordRecord, KeywordStatus, Observation, TrendScore};
use crate::storage::TrendStore;

#[derive(Default)]
struct Inner {
    observations: Vec<Observation>,
    scores: HashMap<(String, u32), TrendScore>,
    keywords: HashMap<String, KeywordRecord>,
}

/// [`TrendStore`] backed by process memory
#[derive(Default)]
pub struct MemoryTrendStore {
    inner: RwLock<Inner>,
}

impl MemoryTrendStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl TrendStore for MemoryTrendStore {
    fn insert_observations(&self, observations: &[Observation]) -> Result<usize> {
        self.write().observations.extend_from_slice(observations);
        Ok(observations.len())
    }

    fn observations_since(
        &self,
        keyword: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>> {
        let inner = self.read();
        let mut matching: Vec<Observation> = inner
            .observations
            .iter()
            .filter(|o| o.keyword == keyword)
            .filter(|o| since.map_or(true, |cutoff| o.recorded_at >= cutoff))
            .cloned()
            .collect();
        matching.sort_by_key(|o| o.recorded_at);
        Ok(matching)
    }

    fn latest_observation_at(&self, keyword: &str) -> Result<Option<DateTime<Utc>>> {
        let inner = self.read();
        Ok(inner
            .observations
            .iter()
            .filter(|o| o.keyword == keyword)
            .map(|o| o.recorded_at)
            .max())
    }

    fn upsert_score(&self, score: &TrendScore) -> Result<bool> {
        let mut inner = self.write();
        let key = (score.keyword.clone(), score.period_days);
        match inner.scores.get(&key) {
            Some(existing) if existing.computed_at >= score.computed_at => Ok(false),
            _ => {
                inner.scores.insert(key, score.clone());
                Ok(true)
            }
        }
    }

    fn score(&self, keyword: &str, period_days: u32) -> Result<Option<TrendScore>> {
        Ok(self
            .read()
            .scores
            .get(&(keyword.to_string(), period_days))
            .cloned())
    }

    fn scores_for_period(&self, period_days: u32) -> Result<Vec<TrendScore>> {
        let inner = self.read();
        let mut scores: Vec<TrendScore> = inner
            .scores
            .values()
            .filter(|s| s.period_days == period_days)
            .cloned()
            .collect();
        scores.sort_by(|a, b| a.keyword.cmp(&b.keyword));
        Ok(scores)
    }

    fn upsert_keyword(&self, record: &KeywordRecord) -> Result<()> {
        self.write()
            .keywords
            .insert(record.keyword.clone(), record.clone());
        Ok(())
    }

    fn keyword(&self, keyword: &str) -> Result<Option<KeywordRecord>> {
        Ok(self.read().keywords.get(keyword).cloned())
    }

    fn touch_keyword(&self, keyword: &str, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.write();
        let record = inner
            .keywords
            .get_mut(keyword)
            .ok_or_else(|| Error::KeywordNotFound(keyword.to_string()))?;
        record.last_searched_at = Some(at);
        record.status = KeywordStatus::Active;
        Ok(())
    }

    fn keywords(&self) -> Result<Vec<KeywordRecord>> {
        let inner = self.read();
        let mut records: Vec<KeywordRecord> = inner.keywords.values().cloned().collect();
        records.sort_by(|a, b| a.keyword.cmp(&b.keyword));
        Ok(records)
    }

    fn active_keywords(&self) -> Result<Vec<KeywordRecord>> {
        let mut records = self.keywords()?;
        records.retain(KeywordRecord::is_active);
        Ok(records)
    }

    fn set_keyword_status(&self, keyword: &str, status: KeywordStatus) -> Result<()> {
        let mut inner = self.write();
        let record = inner
            .keywords
            .get_mut(keyword)
            .ok_or_else(|| Error::KeywordNotFound(keyword.to_string()))?;
        record.status = status;
        Ok(())
    }

    fn deactivate_keyword(&self, keyword: &str) -> Result<()> {
        let mut inner = self.write();
        let record = inner
            .keywords
            .get_mut(keyword)
            .ok_or_else(|| Error::KeywordNotFound(keyword.to_string()))?;
        if record.origin == KeywordOrigin::Seed {
            return Err(Error::SeedProtected(keyword.to_string()));
        }
        record.status = KeywordStatus::Inactive;
        Ok(())
    }
}
