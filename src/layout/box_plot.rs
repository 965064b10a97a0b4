use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ChartConfiguration, LayoutTuning};
use crate::core::primitives::format_number;
use crate::core::{BandScale, BoxStatistics, Bounds, DataRow, LinearScale, palette_color};
use crate::error::ChartResult;
use crate::layout::chrome::{
    AxisSide, BandAxis, TEXT_COLOR, WHITE, push_axis_titles, push_band_axis, push_value_axis,
    tooltip, value_scale,
};
use crate::layout::required;
use crate::render::{
    CanvasLayerKind, CirclePrimitive, Color, LinePrimitive, PathCommand, PathPrimitive,
    RectPrimitive, RenderFrame,
};

/// Summary box of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxGroup {
    pub name: String,
    pub stats: BoxStatistics,
    pub color: Color,
    /// Q1..Q3 rectangle in pixels.
    pub box_bounds: Bounds,
    pub center_x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotGeometry {
    pub plot: Bounds,
    pub band: BandScale,
    pub value_scale: LinearScale,
    pub groups: Vec<BoxGroup>,
}

impl BoxPlotGeometry {
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&BoxGroup> {
        self.groups.iter().find(|group| group.name == name)
    }
}

pub fn compute_box_plot(
    config: &ChartConfiguration,
    rows: &[DataRow],
    plot: Bounds,
    tuning: &LayoutTuning,
) -> ChartResult<BoxPlotGeometry> {
    let x_field = required(config.x_field(), "xAxis.field")?;
    let measure = required(config.primary_measure(), "series[0].field")?;

    let mut samples: IndexMap<String, Vec<f64>> = IndexMap::new();
    for row in rows {
        let values = samples.entry(row.text(x_field)).or_default();
        if let Some(value) = row.number(measure) {
            values.push(value);
        }
    }

    let mut stats = Vec::with_capacity(samples.len());
    for (name, values) in samples {
        match BoxStatistics::from_values(&values) {
            Some(summary) => stats.push((name, summary)),
            None => debug!(group = %name, "box plot group has no numeric values"),
        }
    }

    let low = stats
        .iter()
        .map(|(_, summary)| summary.min)
        .fold(f64::INFINITY, f64::min);
    let high = stats
        .iter()
        .map(|(_, summary)| summary.max)
        .fold(f64::NEG_INFINITY, f64::max);
    let scale = value_scale(
        low,
        high,
        config.y_axis.as_ref(),
        false,
        tuning,
        (plot.bottom(), plot.y),
    )?;
    let band = BandScale::new(
        stats.iter().map(|(name, _)| name.clone()).collect(),
        plot.x,
        plot.right(),
    )
    .with_padding(0.4, 0.2);

    let palette = config.palette();
    let groups = stats
        .into_iter()
        .enumerate()
        .map(|(index, (name, summary))| {
            let left = band.position_at(index);
            let top = scale.map(summary.q3);
            let bottom = scale.map(summary.q1);
            BoxGroup {
                box_bounds: Bounds::new(left, top.min(bottom), band.bandwidth(), (bottom - top).abs()),
                center_x: left + band.bandwidth() / 2.0,
                color: palette_color(index, palette),
                stats: summary,
                name,
            }
        })
        .collect();

    Ok(BoxPlotGeometry {
        plot,
        band,
        value_scale: scale,
        groups,
    })
}

pub fn append_box_plot_primitives(
    frame: &mut RenderFrame,
    geometry: &BoxPlotGeometry,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
) {
    let scale = geometry.value_scale;
    push_value_axis(frame, scale, geometry.plot, AxisSide::Left, config.grid, tuning);
    push_band_axis(frame, &geometry.band, geometry.plot, BandAxis::Horizontal, tuning);
    push_axis_titles(frame, config.x_axis.as_ref(), config.y_axis.as_ref(), geometry.plot, tuning);

    for group in &geometry.groups {
        let stats = &group.stats;
        let cx = group.center_x;
        let half_cap = group.box_bounds.width / 4.0;
        let whisker_low = scale.map(stats.whisker_low);
        let whisker_high = scale.map(stats.whisker_high);

        for (from, to) in [
            (scale.map(stats.q3), whisker_high),
            (scale.map(stats.q1), whisker_low),
        ] {
            frame.push_line(
                CanvasLayerKind::Series,
                LinePrimitive::new(cx, from, cx, to, 1.0, TEXT_COLOR),
            );
        }
        for y in [whisker_low, whisker_high] {
            frame.push_line(
                CanvasLayerKind::Series,
                LinePrimitive::new(cx - half_cap, y, cx + half_cap, y, 1.0, TEXT_COLOR),
            );
        }

        let summary = tooltip(config, || {
            format!(
                "{}: min {} / Q1 {} / median {} / Q3 {} / max {}",
                group.name,
                format_number(stats.whisker_low),
                format_number(stats.q1),
                format_number(stats.median),
                format_number(stats.q3),
                format_number(stats.whisker_high)
            )
        });
        let body = group.box_bounds;
        frame.push_rect(
            CanvasLayerKind::Series,
            RectPrimitive::new(body.x, body.y, body.width, body.height, group.color.with_alpha(0.35))
                .with_border(1.5, group.color)
                .with_tooltip(summary),
        );
        let median = scale.map(stats.median);
        frame.push_line(
            CanvasLayerKind::Series,
            LinePrimitive::new(body.x, median, body.right(), median, 2.0, group.color),
        );

        if config.show_mean {
            let y = scale.map(stats.mean);
            let size = 5.0;
            let diamond = vec![
                PathCommand::MoveTo { x: cx, y: y - size },
                PathCommand::LineTo { x: cx + size, y },
                PathCommand::LineTo { x: cx, y: y + size },
                PathCommand::LineTo { x: cx - size, y },
                PathCommand::Close,
            ];
            frame.push_path(
                CanvasLayerKind::Overlay,
                PathPrimitive::filled(diamond, WHITE)
                    .with_stroke(1.5, group.color)
                    .with_tooltip(tooltip(config, || {
                        format!("{} mean: {}", group.name, format_number(stats.mean))
                    })),
            );
        }

        if config.show_outliers {
            for outlier in &stats.outliers {
                frame.push_circle(
                    CanvasLayerKind::Overlay,
                    CirclePrimitive::new(cx, scale.map(*outlier), 3.5, WHITE)
                        .with_stroke(1.5, group.color)
                        .with_tooltip(tooltip(config, || {
                            format!("{} outlier: {}", group.name, format_number(*outlier))
                        })),
                );
            }
        }
    }
}
