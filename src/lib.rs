//! trendscope - Resale Fashion Trend Analytics Engine
//!
//! Turns raw multi-source keyword observations into trend intelligence:
//! composite scores, lifecycle stages, volume and rank forecasts,
//! correlations and seasonal profiles, behind a freshness layer that scrapes
//! upstream sources only when the cache has gone stale.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core data structures and types
//! - [`analytics`] - Pure computations: scoring, lifecycle, forecasting,
//!   ranking, correlation, seasonality
//! - [`storage`] - The trend store (SQLite and in-memory backends)
//! - [`sources`] - Upstream scraper trait
//! - [`freshness`] - Staleness gating and single-flight scrape coordination
//! - [`scheduler`] - Periodic batch recompute over the tracked set
//! - [`engine`] - High-level facade tying it all together
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use trendscope::config::Config;
//! use trendscope::engine::TrendEngine;
//! use trendscope::freshness::FreshnessCoordinator;
//! use trendscope::storage::SqliteTrendStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(SqliteTrendStore::new(&config.database.sqlite_path)?);
//!     let coordinator = Arc::new(FreshnessCoordinator::new(store.clone(), vec![], &config));
//!     let engine = TrendEngine::new(store, coordinator, &config);
//!     let result = engine.search("quiet luxury", 30).await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod engine;
pub mod error;
pub mod freshness;
pub mod models;
pub mod scheduler;
pub mod sources;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{GrowthScore, VolumeForecaster};
    pub use crate::config::Config;
    pub use crate::engine::{SearchResult, TrendEngine};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::freshness::{Freshness, FreshnessCoordinator};
    pub use crate::models::{
        Computed, LifecycleStage, Metric, Observation, SourceKind, TrendScore,
    };
    pub use crate::scheduler::{ActiveKeywordSet, BatchRecompute};
    pub use crate::sources::TrendSource;
    pub use crate::storage::{MemoryTrendStore, SqliteTrendStore, TrendStore};
}

// Direct re-exports for convenience
pub use models::{Computed, LifecycleStage, Metric, Observation, SourceKind, TrendScore};
