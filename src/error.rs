//! Unified error handling for the trendscope crate
//!
//! Recoverable analytic conditions (insufficient history, stale cache,
//! degenerate math) are **not** errors: they are expressed as typed results
//! such as [`crate::models::Computed`] and [`crate::freshness::Freshness`].
//! This module covers the remaining failures: unavailable collaborators,
//! storage faults and programming-contract violations.

use std::io;
use thiserror::Error;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Upstream data-source failures
    Source,
    /// Storage and I/O errors
    Storage,
    /// Contract violations (malformed periods, horizons)
    Contract,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the trendscope crate
#[derive(Error, Debug)]
pub enum Error {
    /// An upstream collaborator failed during a scrape
    #[error("source '{name}' unavailable: {message}")]
    SourceUnavailable { name: String, message: String },

    /// A scrape failed and no cached data has ever existed for the keyword
    #[error("no data available for keyword '{0}'")]
    NoDataAvailable(String),

    /// Keyword is not present in the tracking registry
    #[error("keyword '{0}' is not tracked")]
    KeywordNotFound(String),

    /// Seed keywords are never deletable
    #[error("seed keyword '{0}' cannot be deactivated")]
    SeedProtected(String),

    /// Contract violation: period outside the supported range
    #[error("invalid period_days: {0} (expected 2..=365)")]
    InvalidPeriod(u32),

    /// Contract violation: unsupported forecast horizon
    #[error("invalid horizon_days: {0} (expected one of 7, 14, 30)")]
    InvalidHorizon(u32),

    /// Database errors
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Check if this error is recoverable (the request can fall back or retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::SourceUnavailable { .. } => true,
            Self::Io(_) => true, // I/O errors are often transient
            Self::NoDataAvailable(_)
            | Self::KeywordNotFound(_)
            | Self::SeedProtected(_)
            | Self::InvalidPeriod(_)
            | Self::InvalidHorizon(_)
            | Self::Database(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other { .. } => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SourceUnavailable { .. } | Self::NoDataAvailable(_) => ErrorCategory::Source,
            Self::Database(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::InvalidPeriod(_) | Self::InvalidHorizon(_) => ErrorCategory::Contract,
            Self::Config(_) => ErrorCategory::Config,
            Self::KeywordNotFound(_)
            | Self::SeedProtected(_)
            | Self::Json(_)
            | Self::Other { .. } => ErrorCategory::Other,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
