use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ChartConfiguration, LayoutTuning};
use crate::core::curve::{annular_sector, polar_point};
use crate::core::primitives::format_number;
use crate::core::{Bounds, DataRow, OrdinalScale, Point, partition_angles, rollup_by_category};
use crate::error::ChartResult;
use crate::layout::chrome::{
    LegendEntry, WHITE, label_color_on, push_legend, push_notice, tooltip,
};
use crate::layout::required;
use crate::render::{
    CanvasLayerKind, CirclePrimitive, Color, PathPrimitive, RenderFrame, TextHAlign,
    TextPrimitive,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    pub fraction: f64,
    /// Radians clockwise from 12 o'clock.
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: Color,
}

impl PieSlice {
    #[must_use]
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieGeometry {
    pub center: Point,
    pub radius: f64,
    pub inner_radius: f64,
    pub total: f64,
    pub slices: Vec<PieSlice>,
}

/// Resolves `innerRadius`: values below 1 are a fraction of `radius`.
pub(crate) fn resolve_inner_radius(configured: Option<f64>, radius: f64, default: f64) -> f64 {
    let value = configured.filter(|value| value.is_finite() && *value >= 0.0);
    let inner = match value {
        Some(fraction) if fraction < 1.0 => fraction * radius,
        Some(pixels) => pixels,
        None => default * radius,
    };
    inner.clamp(0.0, radius * 0.95)
}

pub fn compute_pie(
    config: &ChartConfiguration,
    rows: &[DataRow],
    plot: Bounds,
) -> ChartResult<PieGeometry> {
    let category = required(config.category_field(), "categoryField")?;
    let value = required(config.value_field(), "valueField")?;

    let mut weights = rollup_by_category(rows, category, value);
    let before = weights.len();
    weights.retain(|weight| weight.value > 0.0);
    if weights.len() < before {
        debug!(dropped = before - weights.len(), "pie dropped non-positive slices");
    }

    let radius = (plot.width.min(plot.height) / 2.0 - 10.0).max(1.0);
    let inner_radius = resolve_inner_radius(config.inner_radius, radius, 0.0);
    let total: f64 = weights.iter().map(|weight| weight.value).sum();
    let angles = partition_angles(&weights.iter().map(|weight| weight.value).collect::<Vec<_>>());
    let mut colors = OrdinalScale::new(config.palette());

    let slices = weights
        .into_iter()
        .zip(angles)
        .map(|(weight, (start_angle, end_angle))| PieSlice {
            color: colors.color(&weight.name),
            fraction: if total > 0.0 { weight.value / total } else { 0.0 },
            name: weight.name,
            value: weight.value,
            start_angle,
            end_angle,
        })
        .collect();

    Ok(PieGeometry {
        center: plot.center(),
        radius,
        inner_radius,
        total,
        slices,
    })
}

pub fn append_pie_primitives(
    frame: &mut RenderFrame,
    geometry: &PieGeometry,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
) {
    if geometry.slices.is_empty() {
        push_notice(
            frame,
            Bounds::new(
                geometry.center.x - geometry.radius,
                geometry.center.y - geometry.radius,
                geometry.radius * 2.0,
                geometry.radius * 2.0,
            ),
            "No positive values",
            tuning,
        );
        return;
    }

    let font = tuning.label_font_px;
    for slice in &geometry.slices {
        let slice_tooltip = tooltip(config, || {
            format!(
                "{}: {} ({:.1}%)",
                slice.name,
                format_number(slice.value),
                slice.fraction * 100.0
            )
        });
        if geometry.slices.len() == 1 && geometry.inner_radius <= 0.0 {
            frame.push_circle(
                CanvasLayerKind::Series,
                CirclePrimitive::new(geometry.center.x, geometry.center.y, geometry.radius, slice.color)
                    .with_tooltip(slice_tooltip),
            );
        } else {
            let outline = annular_sector(
                geometry.center,
                geometry.inner_radius,
                geometry.radius,
                slice.start_angle,
                slice.end_angle,
            );
            frame.push_path(
                CanvasLayerKind::Series,
                PathPrimitive::filled(outline, slice.color)
                    .with_stroke(1.0, WHITE)
                    .with_tooltip(slice_tooltip),
            );
        }

        if slice.sweep() >= tuning.pie_min_label_angle {
            let mid = (slice.start_angle + slice.end_angle) / 2.0;
            let label_radius = if geometry.inner_radius > 0.0 {
                (geometry.inner_radius + geometry.radius) / 2.0
            } else {
                geometry.radius * 0.65
            };
            let anchor = polar_point(geometry.center, label_radius, mid);
            frame.push_text(
                CanvasLayerKind::Overlay,
                TextPrimitive::new(
                    format!("{:.0}%", slice.fraction * 100.0),
                    anchor.x,
                    anchor.y + font * 0.35,
                    font,
                    label_color_on(slice.color),
                    TextHAlign::Center,
                ),
            );
        }
    }

    let entries: Vec<LegendEntry> = geometry
        .slices
        .iter()
        .map(|slice| LegendEntry::new(slice.name.clone(), slice.color))
        .collect();
    push_legend(frame, config, tuning, &entries);
}
