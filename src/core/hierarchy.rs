use std::f64::consts::TAU;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{Bounds, DataRow};

/// Golden ratio aspect target used by squarified tiling.
pub const SQUARIFY_RATIO: f64 = 1.618_033_988_749_895;

/// Weighted child of the synthetic one-level root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub name: String,
    pub value: f64,
}

/// Sums `value_field` per distinct `category_field`, heaviest first.
///
/// Non-numeric values are skipped the same way quantile statistics skip
/// them; a category only appears once it has received a numeric value.
/// Ties keep first-appearance order.
#[must_use]
pub fn rollup_by_category(
    rows: &[DataRow],
    category_field: &str,
    value_field: &str,
) -> Vec<CategoryWeight> {
    let mut sums: IndexMap<String, f64> = IndexMap::new();
    for row in rows {
        let Some(value) = row.number(value_field) else {
            continue;
        };
        *sums.entry(row.text(category_field)).or_insert(0.0) += value;
    }
    let mut weights: Vec<CategoryWeight> = sums
        .into_iter()
        .map(|(name, value)| CategoryWeight { name, value })
        .collect();
    weights.sort_by(|a, b| b.value.total_cmp(&a.value));
    weights
}

/// Squarified tiling of `weights` (expected heaviest first) inside `bounds`.
///
/// Output rectangles are in input order and exactly cover `bounds` when the
/// weights are positive. Non-positive weights receive zero-area cells.
#[must_use]
pub fn squarify(weights: &[f64], bounds: Bounds) -> Vec<Bounds> {
    let values: Vec<f64> = weights.iter().map(|w| clamp_weight(*w)).collect();
    let mut out = vec![Bounds::new(bounds.x, bounds.y, 0.0, 0.0); values.len()];
    let mut remaining: f64 = values.iter().sum();
    if remaining <= 0.0 || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return out;
    }

    let (mut x0, mut y0) = (bounds.x, bounds.y);
    let (x1, y1) = (bounds.right(), bounds.bottom());
    let n = values.len();
    let mut i0 = 0;
    let mut i1 = 0;

    while i0 < n {
        if values[i0..].iter().all(|value| *value == 0.0) {
            break;
        }
        let dx = x1 - x0;
        let dy = y1 - y0;

        let mut sum = values[i1];
        i1 += 1;
        while sum == 0.0 && i1 < n {
            sum = values[i1];
            i1 += 1;
        }
        let mut min_value = sum;
        let mut max_value = sum;
        let alpha = (dy / dx).max(dx / dy) / (remaining * SQUARIFY_RATIO);
        let mut beta = sum * sum * alpha;
        let mut min_ratio = (max_value / beta).max(beta / min_value);

        while i1 < n {
            let value = values[i1];
            sum += value;
            min_value = min_value.min(value);
            max_value = max_value.max(value);
            beta = sum * sum * alpha;
            let ratio = (max_value / beta).max(beta / min_value);
            if ratio > min_ratio {
                sum -= value;
                break;
            }
            min_ratio = ratio;
            i1 += 1;
        }

        let row = i0..i1;
        if dx < dy {
            let row_bottom = if remaining > 0.0 {
                y0 + dy * sum / remaining
            } else {
                y1
            };
            lay_row_horizontally(&values, row, &mut out, x0, y0, x1, row_bottom);
            y0 = row_bottom;
        } else {
            let row_right = if remaining > 0.0 {
                x0 + dx * sum / remaining
            } else {
                x1
            };
            lay_row_vertically(&values, row, &mut out, x0, y0, row_right, y1);
            x0 = row_right;
        }
        remaining -= sum;
        i0 = i1;
    }
    out
}

/// Slice-and-dice tiling: one strip per weight along the longer side of `bounds`.
#[must_use]
pub fn slice_dice(weights: &[f64], bounds: Bounds) -> Vec<Bounds> {
    let values: Vec<f64> = weights.iter().map(|w| clamp_weight(*w)).collect();
    let mut out = vec![Bounds::new(bounds.x, bounds.y, 0.0, 0.0); values.len()];
    if values.iter().sum::<f64>() <= 0.0 {
        return out;
    }
    let all = 0..values.len();
    if bounds.width >= bounds.height {
        lay_row_horizontally(
            &values,
            all,
            &mut out,
            bounds.x,
            bounds.y,
            bounds.right(),
            bounds.bottom(),
        );
    } else {
        lay_row_vertically(
            &values,
            all,
            &mut out,
            bounds.x,
            bounds.y,
            bounds.right(),
            bounds.bottom(),
        );
    }
    out
}

fn clamp_weight(weight: f64) -> f64 {
    if weight.is_finite() { weight.max(0.0) } else { 0.0 }
}

/// Cells side by side along x, each spanning the full row height.
fn lay_row_horizontally(
    values: &[f64],
    row: std::ops::Range<usize>,
    out: &mut [Bounds],
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
) {
    let total: f64 = values[row.clone()].iter().sum();
    let scale = if total > 0.0 { (x1 - x0) / total } else { 0.0 };
    let mut cursor = x0;
    for index in row {
        let width = values[index] * scale;
        out[index] = Bounds::new(cursor, y0, width, y1 - y0);
        cursor += width;
    }
}

/// Cells stacked along y, each spanning the full column width.
fn lay_row_vertically(
    values: &[f64],
    row: std::ops::Range<usize>,
    out: &mut [Bounds],
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
) {
    let total: f64 = values[row.clone()].iter().sum();
    let scale = if total > 0.0 { (y1 - y0) / total } else { 0.0 };
    let mut cursor = y0;
    for index in row {
        let height = values[index] * scale;
        out[index] = Bounds::new(x0, cursor, x1 - x0, height);
        cursor += height;
    }
}

/// Angular partition of the full circle proportional to `weights`.
///
/// Returns `(start, end)` angles in radians, clockwise from 12 o'clock.
#[must_use]
pub fn partition_angles(weights: &[f64]) -> Vec<(f64, f64)> {
    let values: Vec<f64> = weights.iter().map(|w| clamp_weight(*w)).collect();
    let total: f64 = values.iter().sum();
    let mut cursor = 0.0;
    values
        .iter()
        .map(|value| {
            let sweep = if total > 0.0 { value / total * TAU } else { 0.0 };
            let span = (cursor, cursor + sweep);
            cursor += sweep;
            span
        })
        .collect()
}
