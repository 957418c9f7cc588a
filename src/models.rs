// Core data structures for the trend analytics engine

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Family of data-source collaborators an observation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    SearchInterest,
    Marketplace,
    SocialMedia,
    ImageBoard,
}

impl SourceKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchInterest => "search_interest",
            Self::Marketplace => "marketplace",
            Self::SocialMedia => "social_media",
            Self::ImageBoard => "image_board",
        }
    }

    /// Create from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "search_interest" => Some(Self::SearchInterest),
            "marketplace" => Some(Self::Marketplace),
            "social_media" => Some(Self::SocialMedia),
            "image_board" => Some(Self::ImageBoard),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metric recorded by a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Search interest, already on a 0-100 scale
    SearchVolume,
    /// Average marketplace price
    AvgPrice,
    /// Marketplace items sold
    SoldCount,
    /// Social-media mentions
    MentionCount,
    /// Marketplace active listings
    ListingCount,
}

impl Metric {
    /// Metrics contributing to the combined volume series (everything but price)
    pub fn is_volume(&self) -> bool {
        !matches!(self, Self::AvgPrice)
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchVolume => "search_volume",
            Self::AvgPrice => "avg_price",
            Self::SoldCount => "sold_count",
            Self::MentionCount => "mention_count",
            Self::ListingCount => "listing_count",
        }
    }

    /// Create from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "search_volume" => Some(Self::SearchVolume),
            "avg_price" => Some(Self::AvgPrice),
            "sold_count" => Some(Self::SoldCount),
            "mention_count" => Some(Self::MentionCount),
            "listing_count" => Some(Self::ListingCount),
            _ => None,
        }
    }

    /// All metrics
    pub fn all() -> [Self; 5] {
        [
            Self::SearchVolume,
            Self::AvgPrice,
            Self::SoldCount,
            Self::MentionCount,
            Self::ListingCount,
        ]
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Single raw data point produced by a scraper collaborator
///
/// Immutable once written; the observation store is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub keyword: String,
    pub source: SourceKind,
    pub metric: Metric,
    pub value: f64,
    pub region: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(
        keyword: impl Into<String>,
        source: SourceKind,
        metric: Metric,
        value: f64,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            source,
            metric,
            value,
            region: None,
            recorded_at,
        }
    }
}

/// How a keyword entered the tracking registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordOrigin {
    Seed,
    AutoDiscovered,
    UserSearch,
}

impl KeywordOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::AutoDiscovered => "auto_discovered",
            Self::UserSearch => "user_search",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "seed" => Some(Self::Seed),
            "auto_discovered" => Some(Self::AutoDiscovered),
            "user_search" => Some(Self::UserSearch),
            _ => None,
        }
    }
}

/// Tracking status of a keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordStatus {
    Active,
    PendingReview,
    Inactive,
}

impl KeywordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PendingReview => "pending_review",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "pending_review" => Some(Self::PendingReview),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Registry entry for a tracked keyword
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub keyword: String,
    pub origin: KeywordOrigin,
    pub status: KeywordStatus,
    pub added_at: DateTime<Utc>,
    pub last_searched_at: Option<DateTime<Utc>>,
}

impl KeywordRecord {
    /// Create a record for a keyword first seen through a user search
    pub fn user_search(keyword: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            keyword: keyword.into(),
            origin: KeywordOrigin::UserSearch,
            status: KeywordStatus::Active,
            added_at: now,
            last_searched_at: Some(now),
        }
    }

    /// Create a seed record (never deletable)
    pub fn seed(keyword: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            keyword: keyword.into(),
            origin: KeywordOrigin::Seed,
            status: KeywordStatus::Active,
            added_at: now,
            last_searched_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == KeywordStatus::Active
    }
}

/// Position of a keyword in its popularity cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleStage {
    Emerging,
    Accelerating,
    Peak,
    Saturation,
    Decline,
    Dormant,
}

impl LifecycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emerging => "Emerging",
            Self::Accelerating => "Accelerating",
            Self::Peak => "Peak",
            Self::Saturation => "Saturation",
            Self::Decline => "Decline",
            Self::Dormant => "Dormant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Emerging" => Some(Self::Emerging),
            "Accelerating" => Some(Self::Accelerating),
            "Peak" => Some(Self::Peak),
            "Saturation" => Some(Self::Saturation),
            "Decline" => Some(Self::Decline),
            "Dormant" => Some(Self::Dormant),
            _ => None,
        }
    }

    /// Stages where the keyword is still gaining momentum
    pub fn is_growing(&self) -> bool {
        matches!(self, Self::Emerging | Self::Accelerating)
    }

    /// All stages
    pub fn all() -> [Self; 6] {
        [
            Self::Emerging,
            Self::Accelerating,
            Self::Peak,
            Self::Saturation,
            Self::Decline,
            Self::Dormant,
        ]
    }
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Composite trend score for one (keyword, period) pair
///
/// One logical row per (keyword, period_days); a stored row is only ever
/// replaced by a computation with a strictly newer `computed_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendScore {
    pub keyword: String,
    pub period_days: u32,
    pub volume_growth: f64,
    pub price_growth: f64,
    pub composite_score: f64,
    pub lifecycle_stage: LifecycleStage,
    pub computed_at: DateTime<Utc>,
}

/// One value of the combined daily volume series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl DailyPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Single step of a volume forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Projected volume series with a confidence band
///
/// Ephemeral: recomputed per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub keyword: String,
    pub horizon_days: u32,
    pub points: Vec<ForecastPoint>,
}

/// Warning that a keyword's lifecycle stage is about to shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageWarning {
    /// Peak or Saturation with a negative slope: transition to Decline at risk
    ImpendingDecline,
    /// Emerging or Accelerating with a negative slope: growth stage at risk
    MomentumReversal,
}

impl StageWarning {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ImpendingDecline => "negative momentum: possible transition to Decline",
            Self::MomentumReversal => "momentum reversal: growth stage at risk",
        }
    }
}

impl std::fmt::Display for StageWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Per-keyword output of the rank forecast across the tracked set
///
/// Derived jointly across the full ranked set; recomputed per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankForecast {
    pub keyword: String,
    pub current_value: f64,
    pub projected_value: f64,
    pub current_rank: usize,
    pub projected_rank: usize,
    /// Positive = improving
    pub rank_delta: i64,
    pub slope: f64,
    pub stage: LifecycleStage,
    pub stage_warning: Option<StageWarning>,
}

/// Pairwise similarity between two tracked keywords' volume series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationEdge {
    pub keyword_a: String,
    pub keyword_b: String,
    /// Pearson coefficient, always in [-1, 1]
    pub coefficient: f64,
}

/// Seasonal statistics for one calendar month
///
/// `count == 0` marks a month with no observations at all, as opposed to
/// genuine low-but-present volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyProfile {
    /// Calendar month, 1-12
    pub month: u32,
    pub label: String,
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

/// Outcome of a computation that may lack enough history
///
/// Insufficient data is a distinguished result, never a hard failure;
/// consumers pattern-match exhaustively instead of poking optional fields.
///
/// Adjacently tagged on the wire: internal tagging cannot represent
/// `Ready` payloads that serialize to non-maps (a bare stage, a number).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Computed<T> {
    Ready(T),
    InsufficientData,
}

impl<T> Computed<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::InsufficientData => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Computed<U> {
        match self {
            Self::Ready(value) => Computed::Ready(f(value)),
            Self::InsufficientData => Computed::InsufficientData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_volume_partition() {
        let volume: Vec<_> = Metric::all().into_iter().filter(Metric::is_volume).collect();
        assert_eq!(volume.len(), 4);
        assert!(!Metric::AvgPrice.is_volume());
    }

    #[test]
    fn test_metric_round_trip() {
        for metric in Metric::all() {
            assert_eq!(Metric::parse(metric.as_str()), Some(metric));
        }
        assert_eq!(Metric::parse("price_volatility"), None);
    }

    #[test]
    fn test_stage_round_trip() {
        for stage in LifecycleStage::all() {
            assert_eq!(LifecycleStage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(LifecycleStage::parse("unknown"), None);
    }

    #[test]
    fn test_keyword_record_user_search() {
        let now = Utc::now();
        let record = KeywordRecord::user_search("gorpcore", now);
        assert_eq!(record.origin, KeywordOrigin::UserSearch);
        assert!(record.is_active());
        assert_eq!(record.last_searched_at, Some(now));
    }

    #[test]
    fn test_computed_map() {
        let ready: Computed<f64> = Computed::Ready(2.0);
        assert!(matches!(ready.map(|v| v * 2.0), Computed::Ready(v) if v == 4.0));

        let missing: Computed<f64> = Computed::InsufficientData;
        assert!(!missing.is_ready());
    }

    #[test]
    fn test_computed_serde_handles_bare_payloads() {
        // A stage serializes to a bare string, which only the adjacent
        // tagging can carry
        let ready = Computed::Ready(LifecycleStage::Peak);
        let json = serde_json::to_string(&ready).unwrap();
        assert_eq!(json, r#"{"status":"ready","data":"Peak"}"#);

        let back: Computed<LifecycleStage> = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Computed::Ready(LifecycleStage::Peak)));

        let missing: Computed<LifecycleStage> = Computed::InsufficientData;
        assert_eq!(
            serde_json::to_string(&missing).unwrap(),
            r#"{"status":"insufficient_data"}"#
        );
    }

    #[test]
    fn test_trend_score_serde() {
        let score = TrendScore {
            keyword: "ballet flats".to_string(),
            period_days: 7,
            volume_growth: 12.5,
            price_growth: -3.0,
            composite_score: 6.3,
            lifecycle_stage: LifecycleStage::Accelerating,
            computed_at: Utc::now(),
        };
        let json = serde_json::to_string(&score).unwrap();
        let restored: TrendScore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.lifecycle_stage, LifecycleStage::Accelerating);
        assert_eq!(restored.composite_score, 6.3);
    }
}
