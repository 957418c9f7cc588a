//! Short-horizon volume forecasting
//!
//! Fits a linear-trend exponential smoothing model (Holt's method) to the
//! combined volume series and projects it forward with a confidence band
//! derived from the in-sample one-step-ahead residuals. The band widens with
//! the square root of the forecast step to reflect compounding uncertainty.

use chrono::Duration;
use statrs::statistics::Statistics;

use crate::config::ForecastConfig;
use crate::error::{Error, Result};
use crate::models::{Computed, DailyPoint, ForecastPoint, ForecastSeries};

/// Supported forecast horizons, days
pub const VALID_HORIZONS: [u32; 3] = [7, 14, 30];

/// 95% confidence multiplier
const CONFIDENCE_Z: f64 = 1.96;

/// Holt linear-trend volume forecaster
#[derive(Debug, Clone)]
pub struct VolumeForecaster {
    alpha: f64,
    beta: f64,
    min_history: usize,
    sigma_floor: f64,
}

impl Default for VolumeForecaster {
    fn default() -> Self {
        Self::new(&ForecastConfig::default())
    }
}

/// Fitted smoothing state
struct HoltFit {
    level: f64,
    trend: f64,
    sigma: f64,
}

impl VolumeForecaster {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            alpha: config.alpha,
            beta: config.beta,
            min_history: config.min_history,
            sigma_floor: config.sigma_floor,
        }
    }

    /// Forecast `horizon_days` beyond the end of `series`
    ///
    /// Returns `Computed::InsufficientData` below the history precondition.
    /// An unsupported horizon is a contract violation and fails hard.
    pub fn forecast(
        &self,
        keyword: &str,
        series: &[DailyPoint],
        horizon_days: u32,
    ) -> Result<Computed<ForecastSeries>> {
        if !VALID_HORIZONS.contains(&horizon_days) {
            return Err(Error::InvalidHorizon(horizon_days));
        }

        if series.len() < self.min_history {
            tracing::debug!(
                keyword = %keyword,
                points = series.len(),
                required = self.min_history,
                "not enough history to forecast"
            );
            return Ok(Computed::InsufficientData);
        }

        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        let fit = self.fit(&values);

        let last = series[series.len() - 1];
        let points = (1..=horizon_days)
            .map(|h| {
                // The first point anchors the forecast to the last historical
                // observation so the plotted series is connected.
                let predicted = if h == 1 {
                    last.value
                } else {
                    (fit.level + fit.trend * f64::from(h - 1)).max(0.0)
                };
                let half_width = CONFIDENCE_Z * fit.sigma * f64::from(h).sqrt();
                ForecastPoint {
                    date: last.date + Duration::days(i64::from(h) - 1),
                    predicted,
                    lower: (predicted - half_width).max(0.0),
                    upper: predicted + half_width,
                }
            })
            .collect();

        Ok(Computed::Ready(ForecastSeries {
            keyword: keyword.to_string(),
            horizon_days,
            points,
        }))
    }

    /// Fit level and trend over the full series, collecting one-step-ahead
    /// residuals for the band width
    fn fit(&self, values: &[f64]) -> HoltFit {
        let first = values[0];
        if values.iter().all(|&v| v == first) {
            // Zero-variance input: flat projection with the sigma floor so
            // the band never collapses to zero width
            return HoltFit {
                level: first,
                trend: 0.0,
                sigma: self.sigma_floor,
            };
        }

        let mut level = values[0];
        let mut trend = values[1] - values[0];
        let mut residuals = Vec::with_capacity(values.len() - 1);

        for &observed in &values[1..] {
            let one_step = level + trend;
            residuals.push(observed - one_step);

            let prev_level = level;
            level = self.alpha * observed + (1.0 - self.alpha) * one_step;
            trend = self.beta * (level - prev_level) + (1.0 - self.beta) * trend;
        }

        let sigma = residuals.iter().std_dev();
        let sigma = if sigma.is_finite() && sigma > 0.0 {
            sigma
        } else {
            self.sigma_floor
        };

        HoltFit { level, trend, sigma }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> Vec<DailyPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let date =
                    NaiveDate::from_ymd_opt(2026, 2, 1).unwrap() + Duration::days(i as i64);
                DailyPoint::new(date, v)
            })
            .collect()
    }

    #[test]
    fn test_insufficient_history() {
        let forecaster = VolumeForecaster::default();
        let got = forecaster
            .forecast("mob wife aesthetic", &series(&[10.0, 12.0, 11.0]), 14)
            .unwrap();
        assert!(!got.is_ready());
    }

    #[test]
    fn test_invalid_horizon_is_contract_violation() {
        let forecaster = VolumeForecaster::default();
        let err = forecaster
            .forecast("loafers", &series(&[1.0; 20]), 9)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHorizon(9)));
    }

    #[test]
    fn test_forecast_anchored_to_last_observation() {
        let forecaster = VolumeForecaster::default();
        let history = series(&[
            10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0, 20.0, 21.0, 22.0, 23.0,
        ]);
        let forecast = forecaster.forecast("loafers", &history, 7).unwrap().ready().unwrap();

        assert_eq!(forecast.points.len(), 7);
        assert_eq!(forecast.points[0].predicted, 23.0);
        assert_eq!(forecast.points[0].date, history.last().unwrap().date);
        // Dates advance one day per step after the anchor
        assert_eq!(
            forecast.points[1].date,
            history.last().unwrap().date + Duration::days(1)
        );
    }

    #[test]
    fn test_linear_series_projects_upward() {
        let forecaster = VolumeForecaster::default();
        let history = series(&[
            10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 22.0, 24.0, 26.0, 28.0, 30.0, 32.0, 34.0, 36.0,
        ]);
        let forecast = forecaster.forecast("loafers", &history, 14).unwrap().ready().unwrap();

        let last = forecast.points.last().unwrap();
        assert!(last.predicted > 36.0, "expected growth, got {}", last.predicted);
    }

    #[test]
    fn test_band_widens_and_brackets_prediction() {
        let forecaster = VolumeForecaster::default();
        let history = series(&[
            30.0, 28.0, 33.0, 35.0, 31.0, 29.0, 36.0, 34.0, 30.0, 37.0, 33.0, 31.0, 38.0, 35.0,
        ]);
        let forecast = forecaster.forecast("loafers", &history, 30).unwrap().ready().unwrap();

        let mut prev_half_width = 0.0;
        for point in &forecast.points {
            assert!(point.lower <= point.predicted);
            assert!(point.predicted <= point.upper);
            let half_width = point.upper - point.predicted;
            assert!(
                half_width >= prev_half_width,
                "band must not narrow with horizon"
            );
            prev_half_width = half_width;
        }
    }

    #[test]
    fn test_zero_variance_input_is_flat_with_floor_band() {
        let forecaster = VolumeForecaster::default();
        let history = series(&[50.0; 20]);
        let forecast = forecaster.forecast("loafers", &history, 7).unwrap().ready().unwrap();

        for point in &forecast.points {
            assert_eq!(point.predicted, 50.0);
            assert!(point.upper > point.lower, "band must not collapse");
        }
    }

    #[test]
    fn test_lower_bound_clamped_at_zero() {
        let forecaster = VolumeForecaster::default();
        // Falling series near zero: the lower band would go negative
        let history = series(&[
            14.0, 13.0, 12.0, 11.0, 10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0,
        ]);
        let forecast = forecaster.forecast("loafers", &history, 30).unwrap().ready().unwrap();

        for point in &forecast.points {
            assert!(point.lower >= 0.0);
            assert!(point.predicted >= 0.0);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Band half-width is non-decreasing in the step and every point
            /// satisfies lower <= predicted <= upper
            #[test]
            fn band_ordering_holds(values in proptest::collection::vec(0.0f64..100.0, 14..60)) {
                let forecaster = VolumeForecaster::default();
                let history = series(&values);
                let forecast = forecaster
                    .forecast("kw", &history, 14)
                    .unwrap()
                    .ready()
                    .unwrap();

                let mut prev_half_width = 0.0;
                for point in &forecast.points {
                    prop_assert!(point.lower <= point.predicted);
                    prop_assert!(point.predicted <= point.upper);
                    let half_width = point.upper - point.predicted;
                    prop_assert!(half_width >= prev_half_width - 1e-9);
                    prev_half_width = half_width;
                }
            }
        }
    }
}
