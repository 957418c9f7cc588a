//! Lifecycle stage classification
//!
//! Maps a keyword's growth trajectory and its volume level (relative to the
//! keyword's own historical maximum) to one of six lifecycle stages. The
//! classification is a pure, total function: every input maps to exactly one
//! stage, with Saturation as the default when nothing stronger matches.
//!
//! The thresholds are tunable constants, not laws of nature; recalibration
//! must preserve the ordering (first match wins) so that higher acceleration
//! never moves a keyword from a growing stage to a declining one.

use crate::analytics::series::growth_between;
use crate::models::{Computed, DailyPoint, LifecycleStage};

/// Volume percentile below which a keyword can still count as Emerging
pub const EMERGING_MAX_PERCENTILE: f64 = 0.35;

/// Minimum growth rate for Emerging
pub const EMERGING_MIN_GROWTH: f64 = 5.0;

/// Minimum growth rate for Accelerating
pub const ACCELERATING_MIN_GROWTH: f64 = 15.0;

/// Volume percentile at or above which a flat keyword is at its Peak
pub const PEAK_MIN_PERCENTILE: f64 = 0.85;

/// Half-width of the "flat" growth band used by Peak and Dormant
pub const FLAT_GROWTH_BAND: f64 = 5.0;

/// Growth rate below which a keyword is in Decline
pub const DECLINE_MAX_GROWTH: f64 = -10.0;

/// Volume percentile at or above which a flat-to-sagging keyword saturates
pub const SATURATION_MIN_PERCENTILE: f64 = 0.6;

/// Volume percentile below which a flat keyword is Dormant
pub const DORMANT_MAX_PERCENTILE: f64 = 0.1;

/// Trajectory inputs for classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageInputs {
    /// Growth rate of the latest sub-window, percent
    pub growth_rate: f64,
    /// Change in growth rate versus the prior sub-window
    pub acceleration: f64,
    /// Current volume as a fraction of the keyword's historical maximum, 0-1
    pub volume_percentile: f64,
}

/// Classify a trajectory into a lifecycle stage
///
/// Evaluated top to bottom, first match wins; the fallthrough is Saturation
/// so the function is total.
pub fn classify(inputs: StageInputs) -> LifecycleStage {
    let StageInputs {
        growth_rate,
        acceleration,
        volume_percentile,
    } = inputs;

    if volume_percentile < EMERGING_MAX_PERCENTILE
        && growth_rate > EMERGING_MIN_GROWTH
        && acceleration >= 0.0
    {
        LifecycleStage::Emerging
    } else if growth_rate > ACCELERATING_MIN_GROWTH && acceleration > 0.0 {
        LifecycleStage::Accelerating
    } else if volume_percentile >= PEAK_MIN_PERCENTILE && growth_rate.abs() <= FLAT_GROWTH_BAND {
        LifecycleStage::Peak
    } else if growth_rate < DECLINE_MAX_GROWTH && acceleration <= 0.0 {
        LifecycleStage::Decline
    } else if volume_percentile >= SATURATION_MIN_PERCENTILE
        && growth_rate >= DECLINE_MAX_GROWTH
        && growth_rate <= EMERGING_MIN_GROWTH
    {
        LifecycleStage::Saturation
    } else if volume_percentile < DORMANT_MAX_PERCENTILE && growth_rate.abs() <= FLAT_GROWTH_BAND {
        LifecycleStage::Dormant
    } else {
        LifecycleStage::Saturation
    }
}

/// Derive [`StageInputs`] from a period's combined-volume series
///
/// The period series is cut into three equal sub-windows: `growth_rate`
/// compares the last two sub-window means, `prior_growth_rate` the first
/// two, and the volume percentile relates the latest sub-window mean to
/// `all_time_max`. Requires at least 3 points.
pub fn stage_inputs(period_series: &[DailyPoint], all_time_max: f64) -> Computed<StageInputs> {
    if period_series.len() < 3 {
        return Computed::InsufficientData;
    }

    let n = period_series.len();
    let first = window_mean(&period_series[..n / 3]);
    let middle = window_mean(&period_series[n / 3..2 * n / 3]);
    let latest = window_mean(&period_series[2 * n / 3..]);

    let growth_rate = growth_between(middle, latest);
    let prior_growth_rate = growth_between(first, middle);
    let acceleration = growth_rate - prior_growth_rate;

    let volume_percentile = if all_time_max > 0.0 {
        (latest / all_time_max).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Computed::Ready(StageInputs {
        growth_rate,
        acceleration,
        volume_percentile,
    })
}

/// Classify a keyword from its period series and all-time volume series
pub fn classify_series(
    period_series: &[DailyPoint],
    all_time_series: &[DailyPoint],
) -> Computed<LifecycleStage> {
    let all_time_max = all_time_series
        .iter()
        .map(|p| p.value)
        .fold(0.0_f64, f64::max);
    stage_inputs(period_series, all_time_max).map(classify)
}

fn window_mean(points: &[DailyPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.value).sum::<f64>() / points.len() as f64
}
