//! Configuration management for the trend analytics engine
//!
//! Settings load from a TOML file or from `TRENDSCOPE_*` environment
//! variables, with validation of the contract-level constraints.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Freshness / scrape-gating configuration
    pub freshness: FreshnessConfig,

    /// Scoring configuration
    pub scoring: ScoringConfig,

    /// Volume forecast configuration
    pub forecast: ForecastConfig,

    /// Rank forecast configuration
    pub ranking: RankingConfig,

    /// Batch recompute configuration
    pub batch: BatchConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

/// Freshness coordination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Maximum age of cached observations before a re-scrape is warranted
    pub staleness_hours: u64,

    /// Period passed to source collaborators on a scrape
    pub scrape_period_days: u32,
}

/// Scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Periods (in days) recomputed and persisted by the scrape pipeline
    pub score_periods: Vec<u32>,
}

/// Volume forecast configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Level smoothing factor for Holt's method, in (0, 1]
    pub alpha: f64,

    /// Trend smoothing factor for Holt's method, in (0, 1]
    pub beta: f64,

    /// Minimum historical points required to produce a forecast
    pub min_history: usize,

    /// Residual std-dev floor used when the fit is degenerate
    pub sigma_floor: f64,
}

/// Rank forecast configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Trailing window (in points) for the per-keyword slope fit
    pub trailing_window: usize,
}

/// Batch recompute configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Minimum pause between keywords in a batch pass, milliseconds
    pub min_pause_ms: u64,

    /// Maximum pause between keywords in a batch pass, milliseconds
    pub max_pause_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("TRENDSCOPE_SQLITE_PATH") {
            config.database.sqlite_path = path.into();
        }
        if let Some(hours) = env_parse("TRENDSCOPE_STALENESS_HOURS") {
            config.freshness.staleness_hours = hours;
        }
        if let Some(days) = env_parse("TRENDSCOPE_SCRAPE_PERIOD_DAYS") {
            config.freshness.scrape_period_days = days;
        }
        if let Some(alpha) = env_parse("TRENDSCOPE_FORECAST_ALPHA") {
            config.forecast.alpha = alpha;
        }
        if let Some(beta) = env_parse("TRENDSCOPE_FORECAST_BETA") {
            config.forecast.beta = beta;
        }
        if let Some(min_history) = env_parse("TRENDSCOPE_FORECAST_MIN_HISTORY") {
            config.forecast.min_history = min_history;
        }
        if let Some(window) = env_parse("TRENDSCOPE_RANK_WINDOW") {
            config.ranking.trailing_window = window;
        }
        if let Ok(level) = std::env::var("TRENDSCOPE_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("TRENDSCOPE_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.freshness.staleness_hours == 0 {
            anyhow::bail!("staleness_hours must be greater than 0");
        }

        if self.scoring.score_periods.is_empty() {
            anyhow::bail!("score_periods must not be empty");
        }

        for &period in &self.scoring.score_periods {
            if !(2..=365).contains(&period) {
                anyhow::bail!("score period {period} out of range (expected 2..=365)");
            }
        }

        if !(0.0..=1.0).contains(&self.forecast.alpha) || self.forecast.alpha == 0.0 {
            anyhow::bail!("forecast alpha must be in (0, 1]");
        }

        if !(0.0..=1.0).contains(&self.forecast.beta) || self.forecast.beta == 0.0 {
            anyhow::bail!("forecast beta must be in (0, 1]");
        }

        if self.forecast.min_history < 2 {
            anyhow::bail!("forecast min_history must be at least 2");
        }

        if self.forecast.sigma_floor <= 0.0 {
            anyhow::bail!("forecast sigma_floor must be positive");
        }

        if self.ranking.trailing_window < 2 {
            anyhow::bail!("ranking trailing_window must be at least 2");
        }

        if self.batch.min_pause_ms > self.batch.max_pause_ms {
            anyhow::bail!("batch min_pause_ms must not exceed max_pause_ms");
        }

        Ok(())
    }

    /// Get the staleness threshold as a Duration
    #[must_use]
    pub fn staleness_threshold(&self) -> Duration {
        Duration::from_secs(self.freshness.staleness_hours * 3600)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            freshness: FreshnessConfig::default(),
            scoring: ScoringConfig::default(),
            forecast: ForecastConfig::default(),
            ranking: RankingConfig::default(),
            batch: BatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/trends.db"),
        }
    }
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            staleness_hours: 6,
            scrape_period_days: 90,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            score_periods: vec![7, 14, 30, 60, 90],
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            alpha: 0.4,
            beta: 0.2,
            min_history: 14,
            sigma_floor: 0.5,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { trailing_window: 14 }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_pause_ms: 2_000,
            max_pause_ms: 5_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}
