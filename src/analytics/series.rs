//! Shared time-series primitives for the analytics core
//!
//! Everything here is pure: daily bucketing of raw observations, min-max
//! normalization to the common 0-100 scale, the combined volume series, the
//! half-window growth rate and an ordinary-least-squares slope fit.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{DailyPoint, Metric, Observation};

/// Upper bound of the common normalized scale (search interest convention)
pub const SCALE_MAX: f64 = 100.0;

/// Growth value reported when a zero baseline turns into positive volume
pub const GROWTH_CLAMP: f64 = 100.0;

/// Bucket observations of a single metric into a per-date mean series
pub fn daily_series(observations: &[Observation], metric: Metric) -> Vec<DailyPoint> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for obs in observations.iter().filter(|o| o.metric == metric) {
        let entry = buckets.entry(obs.recorded_at.date_naive()).or_insert((0.0, 0));
        entry.0 += obs.value;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(date, (sum, count))| DailyPoint::new(date, sum / count as f64))
        .collect()
}

/// Scale a series to 0-100 by its own min-max
///
/// A degenerate min-max (all values equal, or an empty series) passes the
/// values through unscaled.
pub fn min_max_normalize(points: &mut [DailyPoint]) {
    let Some(min) = points.iter().map(|p| p.value).reduce(f64::min) else {
        return;
    };
    let max = points
        .iter()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);

    let range = max - min;
    if range <= 0.0 {
        return;
    }

    for point in points.iter_mut() {
        point.value = (point.value - min) / range * SCALE_MAX;
    }
}

/// Normalized per-metric daily series
///
/// Search volume is already on the 0-100 scale and passes through; every
/// other metric is scaled by its own min-max over the supplied observations.
pub fn normalized_series(observations: &[Observation], metric: Metric) -> Vec<DailyPoint> {
    let mut series = daily_series(observations, metric);
    if metric != Metric::SearchVolume {
        min_max_normalize(&mut series);
    }
    series
}

/// Combined volume series: the per-date mean of all volume-contributing
/// metrics available that date, each normalized to the common scale
pub fn combined_volume_series(observations: &[Observation]) -> Vec<DailyPoint> {
    let per_metric: Vec<Vec<DailyPoint>> = Metric::all()
        .into_iter()
        .filter(Metric::is_volume)
        .map(|metric| normalized_series(observations, metric))
        .filter(|series| !series.is_empty())
        .collect();

    merge_mean(&per_metric)
}

/// Per-date mean across several daily series
pub fn merge_mean(series: &[Vec<DailyPoint>]) -> Vec<DailyPoint> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for points in series {
        for point in points {
            let entry = buckets.entry(point.date).or_insert((0.0, 0));
            entry.0 += point.value;
            entry.1 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(date, (sum, count))| DailyPoint::new(date, sum / count as f64))
        .collect()
}

/// Tail of a date-ordered daily series, keeping points on or after `start`
///
/// Slicing an already-normalized series preserves its scale; re-normalizing
/// the window would measure values against the window's own range instead
/// of the keyword's history.
pub fn window_from(points: &[DailyPoint], start: NaiveDate) -> &[DailyPoint] {
    let idx = points.partition_point(|p| p.date < start);
    &points[idx..]
}

/// Split a daily series at a midpoint date: first half strictly before,
/// second half on or after
pub fn split_halves(points: &[DailyPoint], midpoint: NaiveDate) -> (Vec<f64>, Vec<f64>) {
    let mut first = Vec::new();
    let mut second = Vec::new();
    for point in points {
        if point.date < midpoint {
            first.push(point.value);
        } else {
            second.push(point.value);
        }
    }
    (first, second)
}

/// Percentage growth between two half-window means
///
/// Fallback policy: a zero baseline with positive follow-up clamps to +100;
/// two zero means (or an empty half) report 0.
pub fn growth_rate(first: &[f64], second: &[f64]) -> f64 {
    if first.is_empty() || second.is_empty() {
        return 0.0;
    }
    growth_between(mean(first), mean(second))
}

/// Growth between two already-aggregated means, same fallback policy
pub fn growth_between(first_mean: f64, second_mean: f64) -> f64 {
    if first_mean == 0.0 {
        if second_mean > 0.0 {
            return GROWTH_CLAMP;
        }
        return 0.0;
    }
    (second_mean - first_mean) / first_mean * 100.0
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Ordinary-least-squares slope of a series indexed 0..n
///
/// Fewer than 2 points (or a degenerate x spread) yields a 0 slope.
pub fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let n_f64 = n as f64;
    let sum_x: f64 = (0..n).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..n).map(|i| (i as f64).powi(2)).sum();

    let denom = n_f64 * sum_x2 - sum_x * sum_x;
    if denom == 0.0 {
        return 0.0;
    }
    (n_f64 * sum_xy - sum_x * sum_y) / denom
}

/// Round to one decimal place (the precision of all reported growth values)
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use chrono::{TimeZone, Utc};

    fn obs(keyword: &str, metric: Metric, value: f64, day: u32) -> Observation {
        Observation::new(
            keyword,
            SourceKind::Marketplace,
            metric,
            value,
            Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_daily_series_averages_same_day() {
        let observations = vec![
            obs("denim maxi skirt", Metric::SoldCount, 10.0, 1),
            obs("denim maxi skirt", Metric::SoldCount, 20.0, 1),
            obs("denim maxi skirt", Metric::SoldCount, 30.0, 2),
        ];
        let series = daily_series(&observations, Metric::SoldCount);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].value, 15.0);
        assert_eq!(series[1].value, 30.0);
    }

    #[test]
    fn test_min_max_normalize() {
        let mut points = vec![
            DailyPoint::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), 10.0),
            DailyPoint::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), 50.0),
            DailyPoint::new(NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(), 30.0),
        ];
        min_max_normalize(&mut points);
        assert_eq!(points[0].value, 0.0);
        assert_eq!(points[1].value, 100.0);
        assert_eq!(points[2].value, 50.0);
    }

    #[test]
    fn test_degenerate_min_max_passes_through() {
        let mut points = vec![
            DailyPoint::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), 42.0),
            DailyPoint::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), 42.0),
        ];
        min_max_normalize(&mut points);
        assert_eq!(points[0].value, 42.0);
        assert_eq!(points[1].value, 42.0);
    }

    #[test]
    fn test_growth_rate_uneven_means() {
        // [10,12,15,40,55,60] split 3/3: first mean 12.33, second mean 51.67
        let first = [10.0, 12.0, 15.0];
        let second = [40.0, 55.0, 60.0];
        let growth = growth_rate(&first, &second);
        assert!((round1(growth) - 318.9).abs() < 1e-9, "got {growth}");
    }

    #[test]
    fn test_growth_rate_zero_baseline_clamps() {
        // [0,0,0,5,8,10]: first-half mean 0, growth clamps to +100
        assert_eq!(growth_rate(&[0.0, 0.0, 0.0], &[5.0, 8.0, 10.0]), 100.0);
    }

    #[test]
    fn test_growth_rate_both_zero() {
        assert_eq!(growth_rate(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_growth_rate_deterministic() {
        let first = [3.0, 7.5, 9.1];
        let second = [12.0, 13.4];
        let a = growth_rate(&first, &second);
        let b = growth_rate(&first, &second);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_ols_slope_linear() {
        let slope = ols_slope(&[1.0, 3.0, 5.0, 7.0]);
        assert!((slope - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_ols_slope_short_series() {
        assert_eq!(ols_slope(&[5.0]), 0.0);
        assert_eq!(ols_slope(&[]), 0.0);
    }

    #[test]
    fn test_combined_volume_series_means_across_metrics() {
        let observations = vec![
            obs("barn jacket", Metric::SearchVolume, 40.0, 1),
            obs("barn jacket", Metric::SearchVolume, 80.0, 2),
            obs("barn jacket", Metric::SoldCount, 10.0, 1),
            obs("barn jacket", Metric::SoldCount, 20.0, 2),
            // Price must not contribute to the volume series
            obs("barn jacket", Metric::AvgPrice, 55.0, 1),
        ];
        let series = combined_volume_series(&observations);
        assert_eq!(series.len(), 2);
        // sold_count normalizes to [0, 100]; day 1 = mean(40, 0), day 2 = mean(80, 100)
        assert_eq!(series[0].value, 20.0);
        assert_eq!(series[1].value, 90.0);
    }

    #[test]
    fn test_window_from_keeps_scale() {
        let points = vec![
            DailyPoint::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), 100.0),
            DailyPoint::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), 2.0),
            DailyPoint::new(NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(), 3.0),
        ];
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let window = window_from(&points, start);
        // Values pass through untouched; no re-normalization to the window
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].value, 2.0);
        assert_eq!(window[1].value, 3.0);

        assert!(window_from(&points, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()).is_empty());
        assert_eq!(window_from(&points, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()).len(), 3);
    }

    #[test]
    fn test_split_halves() {
        let points = vec![
            DailyPoint::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), 1.0),
            DailyPoint::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), 2.0),
            DailyPoint::new(NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(), 3.0),
        ];
        let midpoint = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let (first, second) = split_halves(&points, midpoint);
        assert_eq!(first, vec![1.0]);
        assert_eq!(second, vec![2.0, 3.0]);
    }
}
