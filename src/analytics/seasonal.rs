//! Seasonal profile aggregation
//!
//! Buckets a keyword's combined volume series by calendar month across all
//! available years. The profile always spans all twelve months so a consumer
//! can distinguish "no data for July" (count 0) from "July is quiet".

use chrono::Datelike;
use statrs::statistics::Statistics;

use crate::models::{DailyPoint, MonthlyProfile};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Monthly mean and spread of a daily volume series
///
/// Always returns twelve profiles in calendar order. Months with a single
/// point report a zero standard deviation; months with none report zeroed
/// statistics and `count == 0`.
pub fn seasonal_profile(series: &[DailyPoint]) -> Vec<MonthlyProfile> {
    let mut buckets: [Vec<f64>; 12] = Default::default();
    for point in series {
        buckets[point.date.month0() as usize].push(point.value);
    }

    buckets
        .iter()
        .enumerate()
        .map(|(i, values)| {
            let count = values.len();
            let mean = if count == 0 { 0.0 } else { values.mean() };
            let std_dev = if count < 2 { 0.0 } else { values.std_dev() };
            MonthlyProfile {
                month: i as u32 + 1,
                label: MONTH_LABELS[i].to_string(),
                mean,
                std_dev,
                count,
            }
        })
        .collect()
}
