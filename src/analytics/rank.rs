//! Competitive rank forecasting across the tracked keyword set
//!
//! Fits a least-squares slope to each keyword's trailing trajectory,
//! projects the value seven days out and re-ranks the whole set. Ranks are
//! always a permutation of 1..N: ties in value break by keyword alphabetical
//! order so repeated calls stay deterministic.

use crate::analytics::series::ols_slope;
use crate::models::{LifecycleStage, RankForecast, StageWarning};

/// Projection horizon for the rank forecast, independent of chart horizons
pub const RANK_HORIZON_DAYS: u32 = 7;

/// How many leaders the challengers view looks past
pub const CHALLENGER_RANK_CUTOFF: usize = 10;

/// Maximum challengers reported
pub const MAX_CHALLENGERS: usize = 3;

/// Recent trajectory of one tracked keyword
#[derive(Debug, Clone)]
pub struct KeywordTrajectory {
    pub keyword: String,
    /// Trailing combined-volume (or composite-score) points, oldest first
    pub points: Vec<f64>,
    pub stage: LifecycleStage,
}

impl KeywordTrajectory {
    pub fn new(keyword: impl Into<String>, points: Vec<f64>, stage: LifecycleStage) -> Self {
        Self {
            keyword: keyword.into(),
            points,
            stage,
        }
    }
}

/// Forecast rank movement for the full tracked set
///
/// Output is ordered by current rank; `current_rank` and `projected_rank`
/// each form a permutation of 1..N.
pub fn rank_forecast(trajectories: &[KeywordTrajectory]) -> Vec<RankForecast> {
    let mut forecasts: Vec<RankForecast> = trajectories
        .iter()
        .map(|t| {
            let slope = ols_slope(&t.points);
            let current_value = t.points.last().copied().unwrap_or(0.0);
            let projected_value = current_value + slope * f64::from(RANK_HORIZON_DAYS);
            RankForecast {
                keyword: t.keyword.clone(),
                current_value,
                projected_value,
                current_rank: 0,
                projected_rank: 0,
                rank_delta: 0,
                slope,
                stage: t.stage,
                stage_warning: warning_for(t.stage, slope),
            }
        })
        .collect();

    assign_ranks(&mut forecasts, |f| f.current_value, |f, rank| {
        f.current_rank = rank;
    });
    assign_ranks(&mut forecasts, |f| f.projected_value, |f, rank| {
        f.projected_rank = rank;
    });

    for forecast in &mut forecasts {
        forecast.rank_delta = forecast.current_rank as i64 - forecast.projected_rank as i64;
    }

    forecasts.sort_by_key(|f| f.current_rank);
    forecasts
}

/// Rising keywords currently outside the top 10, best slopes first
pub fn challengers(forecasts: &[RankForecast]) -> Vec<RankForecast> {
    let mut rising: Vec<RankForecast> = forecasts
        .iter()
        .filter(|f| f.current_rank > CHALLENGER_RANK_CUTOFF && f.slope > 0.0)
        .cloned()
        .collect();
    rising.sort_by(|a, b| {
        b.slope
            .partial_cmp(&a.slope)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    rising.truncate(MAX_CHALLENGERS);
    rising
}

/// Descending rank by value, alphabetical tiebreak
fn assign_ranks(
    forecasts: &mut [RankForecast],
    value: impl Fn(&RankForecast) -> f64,
    mut set_rank: impl FnMut(&mut RankForecast, usize),
) {
    let mut order: Vec<usize> = (0..forecasts.len()).collect();
    order.sort_by(|&a, &b| {
        value(&forecasts[b])
            .partial_cmp(&value(&forecasts[a]))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| forecasts[a].keyword.cmp(&forecasts[b].keyword))
    });
    for (rank, idx) in order.into_iter().enumerate() {
        set_rank(&mut forecasts[idx], rank + 1);
    }
}

fn warning_for(stage: LifecycleStage, slope: f64) -> Option<StageWarning> {
    if slope >= 0.0 {
        return None;
    }
    match stage {
        LifecycleStage::Peak | LifecycleStage::Saturation => Some(StageWarning::ImpendingDecline),
        LifecycleStage::Emerging | LifecycleStage::Accelerating => {
            Some(StageWarning::MomentumReversal)
        }
        LifecycleStage::Decline | LifecycleStage::Dormant => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trajectory(keyword: &str, points: &[f64], stage: LifecycleStage) -> KeywordTrajectory {
        KeywordTrajectory::new(keyword, points.to_vec(), stage)
    }

    #[test]
    fn test_ranks_are_permutations() {
        let forecasts = rank_forecast(&[
            trajectory("a", &[10.0, 12.0, 14.0], LifecycleStage::Emerging),
            trajectory("b", &[50.0, 48.0, 46.0], LifecycleStage::Peak),
            trajectory("c", &[30.0, 30.0, 30.0], LifecycleStage::Saturation),
        ]);

        let mut current: Vec<_> = forecasts.iter().map(|f| f.current_rank).collect();
        let mut projected: Vec<_> = forecasts.iter().map(|f| f.projected_rank).collect();
        current.sort_unstable();
        projected.sort_unstable();
        assert_eq!(current, vec![1, 2, 3]);
        assert_eq!(projected, vec![1, 2, 3]);
    }

    #[test]
    fn test_rising_keyword_improves_rank() {
        let forecasts = rank_forecast(&[
            trajectory("falling", &[50.0, 48.0, 46.0, 44.0], LifecycleStage::Peak),
            trajectory("rising", &[20.0, 26.0, 32.0, 38.0], LifecycleStage::Accelerating),
        ]);

        let rising = forecasts.iter().find(|f| f.keyword == "rising").unwrap();
        let falling = forecasts.iter().find(|f| f.keyword == "falling").unwrap();

        // falling leads today but the projection flips the order
        assert_eq!(falling.current_rank, 1);
        assert_eq!(rising.current_rank, 2);
        assert_eq!(rising.projected_rank, 1);
        assert_eq!(rising.rank_delta, 1);
        assert_eq!(falling.rank_delta, -1);
    }

    #[test]
    fn test_ties_break_alphabetically() {
        let forecasts = rank_forecast(&[
            trajectory("zebra print", &[10.0, 10.0], LifecycleStage::Saturation),
            trajectory("aviator glasses", &[10.0, 10.0], LifecycleStage::Saturation),
        ]);
        assert_eq!(forecasts[0].keyword, "aviator glasses");
        assert_eq!(forecasts[0].current_rank, 1);
        assert_eq!(forecasts[1].current_rank, 2);
    }

    #[test]
    fn test_peak_with_negative_slope_warns_of_decline() {
        // Trailing slope -3.2: Peak is at risk of transitioning to Decline
        let points: Vec<f64> = (0..8).map(|i| 80.0 - 3.2 * i as f64).collect();
        let forecasts = rank_forecast(&[trajectory("claw clips", &points, LifecycleStage::Peak)]);

        let forecast = &forecasts[0];
        assert!((forecast.slope - -3.2).abs() < 1e-9);
        assert_eq!(forecast.stage_warning, Some(StageWarning::ImpendingDecline));
        assert!(forecast.stage_warning.unwrap().message().contains("Decline"));
    }

    #[test]
    fn test_growth_stage_with_negative_slope_warns_of_reversal() {
        let forecasts = rank_forecast(&[trajectory(
            "ballet sneakers",
            &[30.0, 28.0, 25.0, 23.0],
            LifecycleStage::Emerging,
        )]);
        assert_eq!(
            forecasts[0].stage_warning,
            Some(StageWarning::MomentumReversal)
        );
    }

    #[test]
    fn test_declining_stage_never_warns() {
        let forecasts = rank_forecast(&[trajectory(
            "skinny jeans",
            &[30.0, 25.0, 20.0],
            LifecycleStage::Decline,
        )]);
        assert_eq!(forecasts[0].stage_warning, None);
    }

    #[test]
    fn test_challengers_filters_top_ten_and_negative_slopes() {
        let mut trajectories: Vec<KeywordTrajectory> = (0..12)
            .map(|i| {
                trajectory(
                    &format!("leader {i:02}"),
                    &[100.0 - i as f64, 100.0 - i as f64],
                    LifecycleStage::Saturation,
                )
            })
            .collect();
        // Two below the cutoff, one rising and one falling
        trajectories.push(trajectory("riser", &[1.0, 3.0, 5.0], LifecycleStage::Emerging));
        trajectories.push(trajectory("sinker", &[5.0, 3.0, 1.0], LifecycleStage::Decline));

        let forecasts = rank_forecast(&trajectories);
        let rising = challengers(&forecasts);
        assert_eq!(rising.len(), 1);
        assert_eq!(rising[0].keyword, "riser");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// For any set of trajectories the output ranks are a
            /// permutation of 1..N with no duplicates
            #[test]
            fn ranks_form_permutation(
                values in proptest::collection::vec(
                    proptest::collection::vec(0.0f64..100.0, 2..10),
                    1..20,
                )
            ) {
                let trajectories: Vec<KeywordTrajectory> = values
                    .into_iter()
                    .enumerate()
                    .map(|(i, points)| {
                        KeywordTrajectory::new(
                            format!("kw{i:03}"),
                            points,
                            LifecycleStage::Saturation,
                        )
                    })
                    .collect();

                let forecasts = rank_forecast(&trajectories);
                let n = forecasts.len();

                let mut current: Vec<_> = forecasts.iter().map(|f| f.current_rank).collect();
                let mut projected: Vec<_> = forecasts.iter().map(|f| f.projected_rank).collect();
                current.sort_unstable();
                projected.sort_unstable();
                prop_assert_eq!(current, (1..=n).collect::<Vec<_>>());
                prop_assert_eq!(projected, (1..=n).collect::<Vec<_>>());
            }
        }
    }
}
