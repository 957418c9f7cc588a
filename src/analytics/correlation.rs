//! Pairwise correlation between keyword volume series
//!
//! Series are inner-joined by date before the Pearson coefficient is taken,
//! so only days both keywords actually have data for contribute. Pairs with
//! fewer than five overlapping dates are dropped rather than reported with a
//! meaningless coefficient.

use std::collections::BTreeMap;

use crate::models::{CorrelationEdge, DailyPoint};

/// Minimum overlapping dates for a pair to produce an edge
pub const MIN_OVERLAP: usize = 5;

/// Pearson correlation coefficient of two equal-length samples
///
/// Returns `None` when either sample has zero variance or the inputs are
/// degenerate; a finite result is clamped to [-1, 1] against float drift.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len();
    if n < 2 {
        return None;
    }

    let n_f64 = n as f64;
    let mean_x = x.iter().sum::<f64>() / n_f64;
    let mean_y = y.iter().sum::<f64>() / n_f64;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let r = covariance / (var_x.sqrt() * var_y.sqrt());
    if !r.is_finite() {
        return None;
    }
    Some(r.clamp(-1.0, 1.0))
}

/// Correlate one keyword's volume series against every other tracked series
///
/// `series_by_keyword` must include the target keyword itself; the target is
/// never paired with itself. Edges come back strongest first (by absolute
/// coefficient), ties broken by the counterpart keyword.
pub fn correlations(
    keyword: &str,
    series_by_keyword: &BTreeMap<String, Vec<DailyPoint>>,
) -> Vec<CorrelationEdge> {
    let Some(target) = series_by_keyword.get(keyword) else {
        return Vec::new();
    };

    let mut edges: Vec<CorrelationEdge> = series_by_keyword
        .iter()
        .filter(|(other, _)| other.as_str() != keyword)
        .filter_map(|(other, series)| {
            let (x, y) = inner_join(target, series);
            if x.len() < MIN_OVERLAP {
                return None;
            }
            pearson(&x, &y).map(|coefficient| CorrelationEdge {
                keyword_a: keyword.to_string(),
                keyword_b: other.clone(),
                coefficient,
            })
        })
        .collect();

    edges.sort_by(|a, b| {
        b.coefficient
            .abs()
            .partial_cmp(&a.coefficient.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.keyword_b.cmp(&b.keyword_b))
    });
    edges
}

/// Values of both series on their shared dates, in date order
fn inner_join(a: &[DailyPoint], b: &[DailyPoint]) -> (Vec<f64>, Vec<f64>) {
    let by_date: BTreeMap<_, _> = b.iter().map(|p| (p.date, p.value)).collect();
    let mut x = Vec::new();
    let mut y = Vec::new();
    for point in a {
        if let Some(&value) = by_date.get(&point.date) {
            x.push(point.value);
            y.push(value);
        }
    }
    (x, y)
}
