use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::DataRow;

/// Multiplier applied to the inter-quartile range to place the outlier fences.
pub const FENCE_IQR_FACTOR: f64 = 1.5;

/// Numeric values of `field` in row order.
///
/// Non-numeric and missing entries are skipped. Every aggregation that reads a
/// measure column (quantiles, sum rollups) goes through this rule.
#[must_use]
pub fn numeric_values<'a>(rows: impl IntoIterator<Item = &'a DataRow>, field: &str) -> Vec<f64> {
    rows.into_iter().filter_map(|row| row.number(field)).collect()
}

/// Quantile of an ascending-sorted slice using linear interpolation at `(n - 1) * p`.
#[must_use]
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !p.is_finite() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let position = (sorted.len() - 1) as f64 * p;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Sorts finite values ascending, dropping NaN and infinities.
#[must_use]
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by_key(|value| OrderedFloat(*value));
    sorted
}

#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Five-number summary plus fences and outliers of one box-plot group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStatistics {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Smallest observed value not below `lower_fence`.
    pub whisker_low: f64,
    /// Largest observed value not above `upper_fence`.
    pub whisker_high: f64,
    pub mean: f64,
    /// Observed values strictly outside the fences, ascending.
    pub outliers: Vec<f64>,
}

impl BoxStatistics {
    /// Computes statistics over finite `values`; `None` when nothing finite remains.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        let q1 = quantile_sorted(&sorted, 0.25)?;
        let median = quantile_sorted(&sorted, 0.5)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let lower_fence = q1 - FENCE_IQR_FACTOR * iqr;
        let upper_fence = q3 + FENCE_IQR_FACTOR * iqr;

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|value| *value >= lower_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|value| *value <= upper_fence)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|value| *value < lower_fence || *value > upper_fence)
            .collect();

        Some(Self {
            count: sorted.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            q1,
            median,
            q3,
            iqr,
            lower_fence,
            upper_fence,
            whisker_low,
            whisker_high,
            mean: mean(&sorted)?,
            outliers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BoxStatistics, quantile_sorted};
    use approx::assert_abs_diff_eq;

    #[test]
    fn quantile_interpolates_between_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.5).expect("median"), 2.5);
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.25).expect("q1"), 1.75);
        assert!(quantile_sorted(&[], 0.5).is_none());
    }

    #[test]
    fn single_value_collapses_box() {
        let stats = BoxStatistics::from_values(&[7.0]).expect("stats");
        assert_eq!(stats.q1, 7.0);
        assert_eq!(stats.q3, 7.0);
        assert_eq!(stats.whisker_low, 7.0);
        assert_eq!(stats.whisker_high, 7.0);
        assert!(stats.outliers.is_empty());
    }

    #[test]
    fn whiskers_stop_at_last_value_inside_fences() {
        let stats = BoxStatistics::from_values(&[-50.0, 1.0, 2.0, 3.0, 4.0, 5.0]).expect("stats");
        assert!(stats.whisker_low >= stats.lower_fence);
        assert_eq!(stats.outliers, vec![-50.0]);
        assert_eq!(stats.whisker_high, 5.0);
    }
}
