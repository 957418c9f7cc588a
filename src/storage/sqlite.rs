//! SQLite-backed trend store
//!
//! A single connection behind a mutex, WAL journaling for concurrent
//! readers. Timestamps are stored as fixed-width RFC 3339 strings
//! (microsecond precision, `Z` suffix) so lexicographic comparison in SQL
//! matches chronological order.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::models::{
    KeywordOrigin, KeywordRecord, KeywordStatus, Metric, Observation, SourceKind, TrendScore,
};
use crate::storage::TrendStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS observations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword TEXT NOT NULL,
    source TEXT NOT NULL,
    metric TEXT NOT NULL,
    value REAL NOT NULL,
    region TEXT,
    recorded_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_observations_keyword_time
    ON observations(keyword, recorded_at);

CREATE TABLE IF NOT EXISTS trend_scores (
    keyword TEXT NOT NULL,
    period_days INTEGER NOT NULL,
    volume_growth REAL NOT NULL,
    price_growth REAL NOT NULL,
    composite_score REAL NOT NULL,
    lifecycle_stage TEXT NOT NULL,
    computed_at TEXT NOT NULL,
    PRIMARY KEY (keyword, period_days)
);

CREATE TABLE IF NOT EXISTS keywords (
    keyword TEXT PRIMARY KEY,
    origin TEXT NOT NULL,
    status TEXT NOT NULL,
    added_at TEXT NOT NULL,
    last_searched_at TEXT
);
"#;

/// [`TrendStore`] backed by SQLite
pub struct SqliteTrendStore {
    conn: Mutex<Connection>,
}

impl SqliteTrendStore {
    /// Open (or create) a store at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, for tests and ephemeral runs
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means a panic elsewhere; the connection
        // itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TrendStore for SqliteTrendStore {
    fn insert_observations(&self, observations: &[Observation]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO observations (keyword, source, metric, value, region, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for obs in observations {
                stmt.execute(params![
                    obs.keyword,
                    obs.source.as_str(),
                    obs.metric.as_str(),
                    obs.value,
                    obs.region,
                    to_db_timestamp(obs.recorded_at),
                ])?;
            }
        }
        tx.commit()?;
        Ok(observations.len())
    }

    fn observations_since(
        &self,
        keyword: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>> {
        let conn = self.conn();
        let since = since.map_or_else(String::new, to_db_timestamp);
        let mut stmt = conn.prepare_cached(
            "SELECT keyword, source, metric, value, region, recorded_at
             FROM observations
             WHERE keyword = ?1 AND recorded_at >= ?2
             ORDER BY recorded_at ASC",
        )?;
        let rows = stmt.query_map(params![keyword, since], row_to_observation)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn latest_observation_at(&self, keyword: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn();
        let latest: Option<String> = conn
            .query_row(
                "SELECT MAX(recorded_at) FROM observations WHERE keyword = ?1",
                params![keyword],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        latest.as_deref().map(parse_db_timestamp).transpose()
    }

    fn upsert_score(&self, score: &TrendScore) -> Result<bool> {
        let conn = self.conn();
        let changed = conn.execute(
            "INSERT INTO trend_scores
                 (keyword, period_days, volume_growth, price_growth,
                  composite_score, lifecycle_stage, computed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(keyword, period_days) DO UPDATE SET
                 volume_growth = excluded.volume_growth,
                 price_growth = excluded.price_growth,
                 composite_score = excluded.composite_score,
                 lifecycle_stage = excluded.lifecycle_stage,
                 computed_at = excluded.computed_at
             WHERE excluded.computed_at > trend_scores.computed_at",
            params![
                score.keyword,
                score.period_days,
                score.volume_growth,
                score.price_growth,
                score.composite_score,
                score.lifecycle_stage.as_str(),
                to_db_timestamp(score.computed_at),
            ],
        )?;
        Ok(changed > 0)
    }

    fn score(&self, keyword: &str, period_days: u32) -> Result<Option<TrendScore>> {
        let conn = self.conn();
        let score = conn
            .query_row(
                "SELECT keyword, period_days, volume_growth, price_growth,
                        composite_score, lifecycle_stage, computed_at
                 FROM trend_scores
                 WHERE keyword = ?1 AND period_days = ?2",
                params![keyword, period_days],
                row_to_score,
            )
            .optional()?;
        Ok(score)
    }

    fn scores_for_period(&self, period_days: u32) -> Result<Vec<TrendScore>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT keyword, period_days, volume_growth, price_growth,
                    composite_score, lifecycle_stage, computed_at
             FROM trend_scores
             WHERE period_days = ?1
             ORDER BY keyword ASC",
        )?;
        let rows = stmt.query_map(params![period_days], row_to_score)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn upsert_keyword(&self, record: &KeywordRecord) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO keywords
                 (keyword, origin, status, added_at, last_searched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.keyword,
                record.origin.as_str(),
                record.status.as_str(),
                to_db_timestamp(record.added_at),
                record.last_searched_at.map(to_db_timestamp),
            ],
        )?;
        Ok(())
    }

    fn keyword(&self, keyword: &str) -> Result<Option<KeywordRecord>> {
        let conn = self.conn();
        let record = conn
            .query_row(
                "SELECT keyword, origin, status, added_at, last_searched_at
                 FROM keywords WHERE keyword = ?1",
                params![keyword],
                row_to_keyword,
            )
            .optional()?;
        Ok(record)
    }

    fn touch_keyword(&self, keyword: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE keywords SET last_searched_at = ?2, status = ?3 WHERE keyword = ?1",
            params![
                keyword,
                to_db_timestamp(at),
                KeywordStatus::Active.as_str()
            ],
        )?;
        if changed == 0 {
            return Err(Error::KeywordNotFound(keyword.to_string()));
        }
        Ok(())
    }

    fn keywords(&self) -> Result<Vec<KeywordRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT keyword, origin, status, added_at, last_searched_at
             FROM keywords ORDER BY keyword ASC",
        )?;
        let rows = stmt.query_map([], row_to_keyword)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn active_keywords(&self) -> Result<Vec<KeywordRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT keyword, origin, status, added_at, last_searched_at
             FROM keywords WHERE status = ?1 ORDER BY keyword ASC",
        )?;
        let rows = stmt.query_map(params![KeywordStatus::Active.as_str()], row_to_keyword)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn set_keyword_status(&self, keyword: &str, status: KeywordStatus) -> Result<()> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE keywords SET status = ?2 WHERE keyword = ?1",
            params![keyword, status.as_str()],
        )?;
        if changed == 0 {
            return Err(Error::KeywordNotFound(keyword.to_string()));
        }
        Ok(())
    }

    fn deactivate_keyword(&self, keyword: &str) -> Result<()> {
        let record = self
            .keyword(keyword)?
            .ok_or_else(|| Error::KeywordNotFound(keyword.to_string()))?;
        if record.origin == KeywordOrigin::Seed {
            return Err(Error::SeedProtected(keyword.to_string()));
        }
        self.set_keyword_status(keyword, KeywordStatus::Inactive)
    }
}

/// Fixed-width RFC 3339 with microseconds; sorts lexicographically
fn to_db_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_db_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::with_source(format!("bad timestamp in database: {s}"), e))
}

fn column_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn column_enum<T>(
    idx: usize,
    s: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown enum value: {s}").into(),
        )
    })
}

fn row_to_observation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Observation> {
    let source: String = row.get(1)?;
    let metric: String = row.get(2)?;
    let recorded_at: String = row.get(5)?;
    Ok(Observation {
        keyword: row.get(0)?,
        source: column_enum(1, &source, SourceKind::parse)?,
        metric: column_enum(2, &metric, Metric::parse)?,
        value: row.get(3)?,
        region: row.get(4)?,
        recorded_at: column_timestamp(5, &recorded_at)?,
    })
}

fn row_to_score(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrendScore> {
    let stage: String = row.get(5)?;
    let computed_at: String = row.get(6)?;
    Ok(TrendScore {
        keyword: row.get(0)?,
        period_days: row.get(1)?,
        volume_growth: row.get(2)?,
        price_growth: row.get(3)?,
        composite_score: row.get(4)?,
        lifecycle_stage: column_enum(5, &stage, crate::models::LifecycleStage::parse)?,
        computed_at: column_timestamp(6, &computed_at)?,
    })
}

fn row_to_keyword(row: &rusqlite::Row<'_>) -> rusqlite::Result<KeywordRecord> {
    let origin: String = row.get(1)?;
    let status: String = row.get(2)?;
    let added_at: String = row.get(3)?;
    let last_searched_at: Option<String> = row.get(4)?;
    Ok(KeywordRecord {
        keyword: row.get(0)?,
        origin: column_enum(1, &origin, KeywordOrigin::parse)?,
        status: column_enum(2, &status, KeywordStatus::parse)?,
        added_at: column_timestamp(3, &added_at)?,
        last_searched_at: last_searched_at
            .as_deref()
            .map(|s| column_timestamp(4, s))
            .transpose()?,
    })
}
