use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ChartConfiguration, LayoutTuning};
use crate::core::primitives::format_number;
use crate::core::{BandScale, Bounds, DataRow, LinearScale};
use crate::error::ChartResult;
use crate::layout::chrome::{
    AxisSide, BandAxis, LegendEntry, MUTED_TEXT_COLOR, configured_color, push_axis_titles,
    push_band_axis, push_legend, push_value_axis, tooltip, value_scale,
};
use crate::layout::required;
use crate::render::{
    CanvasLayerKind, Color, LinePrimitive, LineStrokeStyle, RectPrimitive, RenderFrame,
};

const INCREASE_COLOR: Color = Color::rgb(0.063, 0.725, 0.506);
const DECREASE_COLOR: Color = Color::rgb(0.937, 0.267, 0.267);
const TOTAL_COLOR: Color = Color::rgb(0.231, 0.510, 0.965);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterfallKind {
    Increase,
    Decrease,
    /// The final row, which closes the running total.
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallBar {
    pub category: String,
    pub delta: f64,
    /// Running total before this row.
    pub start: f64,
    /// Running total after this row.
    pub end: f64,
    pub kind: WaterfallKind,
    pub bounds: Bounds,
}

impl WaterfallBar {
    /// `(low, high)` of the bar in value space.
    #[must_use]
    pub fn span(&self) -> (f64, f64) {
        (self.start.min(self.end), self.start.max(self.end))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallGeometry {
    pub plot: Bounds,
    pub band: BandScale,
    pub value_scale: LinearScale,
    pub bars: Vec<WaterfallBar>,
    pub final_total: f64,
}

/// Running totals per row: `(category, delta, before, after)`.
///
/// Non-numeric deltas count as zero.
#[must_use]
pub fn running_totals(rows: &[DataRow], category_field: &str, delta_field: &str) -> Vec<(String, f64, f64, f64)> {
    let mut cumulative = 0.0;
    rows.iter()
        .map(|row| {
            let delta = row.number_or_zero(delta_field);
            let before = cumulative;
            cumulative += delta;
            (row.text(category_field), delta, before, cumulative)
        })
        .collect()
}

pub fn compute_waterfall(
    config: &ChartConfiguration,
    rows: &[DataRow],
    plot: Bounds,
    tuning: &LayoutTuning,
) -> ChartResult<WaterfallGeometry> {
    let category_field = required(config.x_field(), "xAxis.field")?;
    let delta_field = required(config.primary_measure(), "series[0].field")?;

    let totals = running_totals(rows, category_field, delta_field);
    let final_total = totals.last().map_or(0.0, |(_, _, _, after)| *after);
    let low = totals
        .iter()
        .flat_map(|(_, _, before, after)| [*before, *after])
        .fold(f64::INFINITY, f64::min);
    let high = totals
        .iter()
        .flat_map(|(_, _, before, after)| [*before, *after])
        .fold(f64::NEG_INFINITY, f64::max);
    let scale = value_scale(
        low,
        high,
        config.y_axis.as_ref(),
        true,
        tuning,
        (plot.bottom(), plot.y),
    )?;
    // Categories may repeat, so bars are placed by index.
    let band = BandScale::new(
        totals.iter().map(|(category, ..)| category.clone()).collect(),
        plot.x,
        plot.right(),
    )
    .with_padding(0.3, 0.15);
    debug!(bars = totals.len(), final_total, "waterfall accumulated");

    let last = totals.len().saturating_sub(1);
    let bars = totals
        .into_iter()
        .enumerate()
        .map(|(index, (category, delta, before, after))| {
            let kind = if index == last {
                WaterfallKind::Total
            } else if delta < 0.0 {
                WaterfallKind::Decrease
            } else {
                WaterfallKind::Increase
            };
            let (top, bottom) = (scale.map(before.max(after)), scale.map(before.min(after)));
            WaterfallBar {
                bounds: Bounds::new(band.position_at(index), top, band.bandwidth(), bottom - top),
                category,
                delta,
                start: before,
                end: after,
                kind,
            }
        })
        .collect();

    Ok(WaterfallGeometry {
        plot,
        band,
        value_scale: scale,
        bars,
        final_total,
    })
}

pub fn append_waterfall_primitives(
    frame: &mut RenderFrame,
    geometry: &WaterfallGeometry,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
) {
    let increase = configured_color(config.positive_color.as_deref(), INCREASE_COLOR);
    let decrease = configured_color(config.negative_color.as_deref(), DECREASE_COLOR);
    let total = configured_color(config.total_color.as_deref(), TOTAL_COLOR);

    push_value_axis(frame, geometry.value_scale, geometry.plot, AxisSide::Left, config.grid, tuning);
    push_band_axis(frame, &geometry.band, geometry.plot, BandAxis::Horizontal, tuning);
    push_axis_titles(frame, config.x_axis.as_ref(), config.y_axis.as_ref(), geometry.plot, tuning);

    for (index, bar) in geometry.bars.iter().enumerate() {
        let color = match bar.kind {
            WaterfallKind::Increase => increase,
            WaterfallKind::Decrease => decrease,
            WaterfallKind::Total => total,
        };
        let bounds = bar.bounds;
        frame.push_rect(
            CanvasLayerKind::Series,
            RectPrimitive::new(bounds.x, bounds.y, bounds.width, bounds.height.max(1.0), color)
                .with_tooltip(tooltip(config, || {
                    format!(
                        "{}: {} (total {})",
                        bar.category,
                        format_number(bar.delta),
                        format_number(bar.end)
                    )
                })),
        );
        if index > 0 {
            let previous = &geometry.bars[index - 1];
            let y = geometry.value_scale.map(previous.end);
            frame.push_line(
                CanvasLayerKind::Overlay,
                LinePrimitive::new(previous.bounds.right(), y, bounds.x, y, 1.0, MUTED_TEXT_COLOR)
                    .with_stroke_style(LineStrokeStyle::Dashed),
            );
        }
    }

    push_legend(
        frame,
        config,
        tuning,
        &[
            LegendEntry::new("Increase", increase),
            LegendEntry::new("Decrease", decrease),
            LegendEntry::new("Total", total),
        ],
    );
}
