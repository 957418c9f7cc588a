//! Composite trend scoring
//!
//! Derives volume growth, price growth and the weighted composite score for
//! a keyword over a period. Pure: the caller fetches observations and
//! persists the result through the freshness pipeline.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::series::{
    growth_rate, merge_mean, normalized_series, round1, split_halves,
};
use crate::models::{Computed, Metric, Observation};

/// Weight of volume growth in the composite score
pub const VOLUME_WEIGHT: f64 = 0.6;

/// Weight of price growth in the composite score
pub const PRICE_WEIGHT: f64 = 0.4;

/// Minimum points a metric needs in each half-window to be combined
const MIN_HALF_POINTS: usize = 2;

/// Growth breakdown for one (keyword, period) computation
///
/// All values are rounded to one decimal;
/// `composite = 0.6 * volume_growth + 0.4 * price_growth` always holds at
/// that precision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GrowthScore {
    pub volume_growth: f64,
    pub price_growth: f64,
    pub composite_score: f64,
}

/// Growth measurement for one metric family
#[derive(Debug, Clone, Copy, PartialEq)]
enum FamilyGrowth {
    Measured(f64),
    Excluded,
}

/// Compute the growth score for a keyword over `period_days` ending at `now`
///
/// Observations outside the window are ignored. Returns
/// `Computed::InsufficientData` when zero usable metrics remain after the
/// half-window exclusion rule.
pub fn compute_score(
    period_days: u32,
    now: DateTime<Utc>,
    observations: &[Observation],
) -> Computed<GrowthScore> {
    let window_start = now - Duration::days(i64::from(period_days));
    let midpoint = (now - Duration::seconds(i64::from(period_days) * 86_400 / 2)).date_naive();

    let windowed: Vec<Observation> = observations
        .iter()
        .filter(|o| o.recorded_at >= window_start && o.recorded_at <= now)
        .cloned()
        .collect();

    let volume = volume_family_growth(&windowed, midpoint);
    let price = family_growth(normalized_series(&windowed, Metric::AvgPrice), midpoint);

    match (volume, price) {
        (FamilyGrowth::Excluded, FamilyGrowth::Excluded) => Computed::InsufficientData,
        (volume, price) => {
            // An absent family contributes zero growth rather than excluding
            // the keyword, as long as the other family is usable.
            let volume_growth = round1(measured_or_zero(volume));
            let price_growth = round1(measured_or_zero(price));
            let composite_score =
                round1(VOLUME_WEIGHT * volume_growth + PRICE_WEIGHT * price_growth);
            Computed::Ready(GrowthScore {
                volume_growth,
                price_growth,
                composite_score,
            })
        }
    }
}

/// Combined-volume growth over the window
///
/// Each volume metric qualifies only with at least [`MIN_HALF_POINTS`] dates
/// in both halves; qualifying metrics merge into a per-date mean series
/// before the halves are compared.
fn volume_family_growth(observations: &[Observation], midpoint: NaiveDate) -> FamilyGrowth {
    let qualifying: Vec<_> = Metric::all()
        .into_iter()
        .filter(Metric::is_volume)
        .map(|metric| normalized_series(observations, metric))
        .filter(|series| {
            let (first, second) = split_halves(series, midpoint);
            first.len() >= MIN_HALF_POINTS && second.len() >= MIN_HALF_POINTS
        })
        .collect();

    if qualifying.is_empty() {
        return FamilyGrowth::Excluded;
    }

    let combined = merge_mean(&qualifying);
    let (first, second) = split_halves(&combined, midpoint);
    FamilyGrowth::Measured(growth_rate(&first, &second))
}

fn family_growth(series: Vec<crate::models::DailyPoint>, midpoint: NaiveDate) -> FamilyGrowth {
    let (first, second) = split_halves(&series, midpoint);
    if first.len() < MIN_HALF_POINTS || second.len() < MIN_HALF_POINTS {
        return FamilyGrowth::Excluded;
    }
    FamilyGrowth::Measured(growth_rate(&first, &second))
}

fn measured_or_zero(growth: FamilyGrowth) -> f64 {
    match growth {
        FamilyGrowth::Measured(value) => value,
        FamilyGrowth::Excluded => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 13, 0, 0, 0).unwrap()
    }

    /// One observation `days_ago` days before the test clock
    fn obs(metric: Metric, value: f64, days_ago: i64) -> Observation {
        Observation::new(
            "quiet luxury",
            SourceKind::SearchInterest,
            metric,
            value,
            now() - Duration::days(days_ago),
        )
    }

    /// One point per day, oldest first, ending one day before the test clock
    /// so that `values.len() == period_days` splits evenly at the midpoint
    fn search_volume_window(values: &[f64], period_days: u32) -> Vec<Observation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| obs(Metric::SearchVolume, v, i64::from(period_days) - i as i64))
            .collect()
    }

    #[test]
    fn test_rising_volume_scores_positive() {
        // 12-day window: 6 early points at 10, 6 late points at 40
        let values = [10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 40.0, 40.0, 40.0, 40.0, 40.0, 40.0];
        let observations = search_volume_window(&values, 12);

        let score = compute_score(12, now(), &observations).ready().unwrap();
        assert_eq!(score.volume_growth, 300.0);
        assert_eq!(score.price_growth, 0.0);
        assert_eq!(score.composite_score, 180.0);
    }

    #[test]
    fn test_composite_weights() {
        let mut observations = search_volume_window(
            &[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0],
            12,
        );
        // Price falling: first half around 50-60, second half around 30-40.
        // Min-max scaling changes the values but not the direction.
        for (i, price) in [60.0, 55.0, 50.0, 48.0, 40.0, 35.0, 32.0, 30.0].iter().enumerate() {
            observations.push(obs(Metric::AvgPrice, *price, 11 - (i as i64 * 11 / 7)));
        }

        let score = compute_score(12, now(), &observations).ready().unwrap();
        assert!(score.volume_growth > 0.0);
        assert!(score.price_growth < 0.0);
        let expected = round1(VOLUME_WEIGHT * score.volume_growth + PRICE_WEIGHT * score.price_growth);
        assert_eq!(score.composite_score, expected);
    }

    #[test]
    fn test_insufficient_data_when_no_metric_qualifies() {
        // A single point can never fill both halves
        let observations = vec![obs(Metric::SearchVolume, 50.0, 0)];
        assert!(!compute_score(14, now(), &observations).is_ready());
    }

    #[test]
    fn test_sparse_half_excludes_metric() {
        // sold_count has only one point in the first half: excluded.
        // search_volume qualifies, so the score still computes.
        let mut observations = search_volume_window(
            &[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0],
            12,
        );
        observations.push(obs(Metric::SoldCount, 5.0, 10));
        observations.push(obs(Metric::SoldCount, 90.0, 2));
        observations.push(obs(Metric::SoldCount, 95.0, 1));

        let score = compute_score(12, now(), &observations).ready().unwrap();
        assert_eq!(score.volume_growth, 50.0);
    }

    #[test]
    fn test_observations_outside_window_ignored() {
        let mut observations = search_volume_window(
            &[10.0, 10.0, 10.0, 10.0, 12.0, 12.0, 12.0, 12.0],
            8,
        );
        // A huge spike well before the window must not affect the score
        observations.push(obs(Metric::SearchVolume, 10_000.0, 400));

        let score = compute_score(8, now(), &observations).ready().unwrap();
        assert_eq!(score.volume_growth, 20.0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let observations = search_volume_window(
            &[5.0, 9.0, 13.0, 2.0, 44.0, 8.0, 61.0, 70.0, 9.0, 12.0, 33.0, 21.0],
            12,
        );
        let a = compute_score(12, now(), &observations).ready().unwrap();
        let b = compute_score(12, now(), &observations).ready().unwrap();
        assert_eq!(a.volume_growth.to_bits(), b.volume_growth.to_bits());
        assert_eq!(a.composite_score.to_bits(), b.composite_score.to_bits());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The composite's sign always matches the sign of the weighted blend
            #[test]
            fn composite_sign_matches_blend(
                volume_growth in -1000.0f64..1000.0,
                price_growth in -1000.0f64..1000.0,
            ) {
                let vg = round1(volume_growth);
                let pg = round1(price_growth);
                let composite = round1(VOLUME_WEIGHT * vg + PRICE_WEIGHT * pg);
                let blend = VOLUME_WEIGHT * vg + PRICE_WEIGHT * pg;
                // Rounding may flatten a tiny blend to zero but never flips sign
                if composite != 0.0 {
                    prop_assert_eq!(composite.signum(), blend.signum());
                }
            }
        }
    }
}
