//! Analytics core: pure computations over keyword observation series
//!
//! Every submodule here is side-effect free; storage and freshness decisions
//! live elsewhere and feed these functions plain data.

pub mod correlation;
pub mod forecast;
pub mod lifecycle;
pub mod rank;
pub mod score;
pub mod seasonal;
pub mod series;

pub use correlation::{correlations, pearson};
pub use forecast::VolumeForecaster;
pub use lifecycle::{classify, classify_series, stage_inputs, StageInputs};
pub use rank::{challengers, rank_forecast, KeywordTrajectory};
pub use score::{compute_score, GrowthScore};
pub use seasonal::seasonal_profile;
pub use series::{combined_volume_series, daily_series, window_from};
