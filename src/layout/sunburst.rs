use serde::{Deserialize, Serialize};

use crate::config::{ChartConfiguration, LayoutTuning};
use crate::core::curve::{annular_sector, polar_point};
use crate::core::primitives::format_number;
use crate::core::{Bounds, DataRow, OrdinalScale, Point, partition_angles, rollup_by_category};
use crate::error::ChartResult;
use crate::layout::chrome::{
    LegendEntry, TEXT_COLOR, WHITE, fit_text, label_color_on, push_legend, tooltip,
};
use crate::layout::pie::resolve_inner_radius;
use crate::layout::required;
use crate::render::{CanvasLayerKind, Color, PathPrimitive, RenderFrame, TextHAlign, TextPrimitive};

const DEFAULT_INNER_FRACTION: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunburstArc {
    pub name: String,
    pub value: f64,
    /// Radians clockwise from 12 o'clock.
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: Color,
    pub labeled: bool,
}

impl SunburstArc {
    #[must_use]
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunburstGeometry {
    pub center: Point,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub total: f64,
    pub arcs: Vec<SunburstArc>,
}

pub fn compute_sunburst(
    config: &ChartConfiguration,
    rows: &[DataRow],
    plot: Bounds,
    tuning: &LayoutTuning,
) -> ChartResult<SunburstGeometry> {
    let category = required(config.category_field(), "categoryField")?;
    let value = required(config.value_field(), "valueField")?;

    let mut weights = rollup_by_category(rows, category, value);
    weights.retain(|weight| weight.value > 0.0);
    let outer_radius = (plot.width.min(plot.height) / 2.0 - 10.0).max(1.0);
    let inner_radius = resolve_inner_radius(config.inner_radius, outer_radius, DEFAULT_INNER_FRACTION);
    let total = weights.iter().map(|weight| weight.value).sum();
    let angles = partition_angles(&weights.iter().map(|weight| weight.value).collect::<Vec<_>>());
    let mut colors = OrdinalScale::new(config.palette());

    let arcs = weights
        .into_iter()
        .zip(angles)
        .map(|(weight, (start_angle, end_angle))| SunburstArc {
            color: colors.color(&weight.name),
            labeled: end_angle - start_angle >= tuning.sunburst_min_label_angle,
            name: weight.name,
            value: weight.value,
            start_angle,
            end_angle,
        })
        .collect();

    Ok(SunburstGeometry {
        center: plot.center(),
        inner_radius,
        outer_radius,
        total,
        arcs,
    })
}

pub fn append_sunburst_primitives(
    frame: &mut RenderFrame,
    geometry: &SunburstGeometry,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
) {
    let font = tuning.label_font_px;
    let band = geometry.outer_radius - geometry.inner_radius;
    for arc in &geometry.arcs {
        let outline = annular_sector(
            geometry.center,
            geometry.inner_radius,
            geometry.outer_radius,
            arc.start_angle,
            arc.end_angle,
        );
        frame.push_path(
            CanvasLayerKind::Series,
            PathPrimitive::filled(outline, arc.color)
                .with_stroke(1.0, WHITE)
                .with_tooltip(tooltip(config, || {
                    format!("{}: {}", arc.name, format_number(arc.value))
                })),
        );
        if !arc.labeled {
            continue;
        }
        let mid = (arc.start_angle + arc.end_angle) / 2.0;
        let anchor = polar_point(geometry.center, geometry.inner_radius + band / 2.0, mid);
        if let Some(label) = fit_text(&arc.name, font, band - 6.0) {
            frame.push_text(
                CanvasLayerKind::Overlay,
                TextPrimitive::new(
                    label,
                    anchor.x,
                    anchor.y + font * 0.35,
                    font,
                    label_color_on(arc.color),
                    TextHAlign::Center,
                ),
            );
        }
    }

    if geometry.inner_radius > font * 2.0 {
        frame.push_text(
            CanvasLayerKind::Overlay,
            TextPrimitive::new(
                format_number(geometry.total),
                geometry.center.x,
                geometry.center.y + tuning.title_font_px * 0.35,
                tuning.title_font_px,
                TEXT_COLOR,
                TextHAlign::Center,
            )
            .bold(),
        );
    }

    let entries: Vec<LegendEntry> = geometry
        .arcs
        .iter()
        .map(|arc| LegendEntry::new(arc.name.clone(), arc.color))
        .collect();
    push_legend(frame, config, tuning, &entries);
}

#[cfg(test)]
mod tests {
    use super::compute_sunburst;
    use crate::config::{ChartConfiguration, ChartType, LayoutTuning};
    use crate::core::{Bounds, DataRow};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::TAU;

    #[test]
    fn arcs_partition_the_circle_and_small_ones_lose_labels() {
        let rows = vec![
            DataRow::new().with("k", "big").with("v", 99.0),
            DataRow::new().with("k", "tiny").with("v", 1.0),
        ];
        let config = ChartConfiguration::new(ChartType::Sunburst).with_category_value("k", "v");
        let geometry = compute_sunburst(
            &config,
            &rows,
            Bounds::new(0.0, 0.0, 220.0, 220.0),
            &LayoutTuning::default(),
        )
        .expect("sunburst");
        assert_abs_diff_eq!(geometry.outer_radius, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(geometry.inner_radius, 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(geometry.arcs[1].end_angle, TAU, epsilon = 1e-12);
        assert!(geometry.arcs[0].labeled);
        assert!(!geometry.arcs[1].labeled);
        assert_eq!(geometry.total, 100.0);
    }
}
