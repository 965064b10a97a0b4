use indexmap::{IndexMap, IndexSet};
#[cfg(feature = "parallel-layout")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ChartConfiguration, LayoutTuning};
use crate::core::primitives::format_number;
use crate::core::{BandScale, Bounds, ColorScale, DataRow};
use crate::error::ChartResult;
use crate::layout::chrome::{
    BandAxis, MUTED_TEXT_COLOR, WHITE, push_axis_titles, push_band_axis, tooltip,
};
use crate::layout::required;
use crate::render::{
    CanvasLayerKind, Color, Fill, LinearGradient, RectPrimitive, RenderFrame, TextHAlign,
    TextPrimitive,
};

const LEGEND_GRADIENT_ID: &str = "heatmap-scale";
const LEGEND_BAR_WIDTH: f64 = 200.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub x: String,
    pub y: String,
    pub value: f64,
    /// No row carried this `(x, y)` pair; `value` is 0.
    pub missing: bool,
    pub bounds: Bounds,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapGeometry {
    pub plot: Bounds,
    pub x_band: BandScale,
    pub y_band: BandScale,
    /// Row-major: every x for the first y, then the next y.
    pub cells: Vec<HeatmapCell>,
    pub color_scale: ColorScale,
}

impl HeatmapGeometry {
    #[must_use]
    pub fn cell(&self, x: &str, y: &str) -> Option<&HeatmapCell> {
        self.cells.iter().find(|cell| cell.x == x && cell.y == y)
    }

    #[must_use]
    pub fn extent(&self) -> (f64, f64) {
        self.color_scale.extent()
    }
}

pub fn compute_heatmap(
    config: &ChartConfiguration,
    rows: &[DataRow],
    plot: Bounds,
) -> ChartResult<HeatmapGeometry> {
    let x_field = required(config.x_field(), "xAxis.field")?;
    let y_field = required(config.y_field(), "yAxis.field")?;
    let value_field = required(config.primary_measure(), "series[0].field")?;

    let mut xs: IndexSet<String> = IndexSet::new();
    let mut ys: IndexSet<String> = IndexSet::new();
    let mut values: IndexMap<(usize, usize), f64> = IndexMap::new();
    let mut duplicates = 0_usize;
    for row in rows {
        let (x, _) = xs.insert_full(row.text(x_field));
        let (y, _) = ys.insert_full(row.text(y_field));
        if values.contains_key(&(x, y)) {
            duplicates += 1;
            continue;
        }
        values.insert((x, y), row.number_or_zero(value_field));
    }
    if duplicates > 0 {
        debug!(duplicates, "heatmap kept the first value of repeated cells");
    }

    let x_band = BandScale::new(xs.into_iter().collect(), plot.x, plot.right()).with_padding(0.04, 0.0);
    let y_band = BandScale::new(ys.into_iter().collect(), plot.y, plot.bottom()).with_padding(0.04, 0.0);

    let pairs: Vec<(usize, usize)> = (0..y_band.domain().len())
        .flat_map(|y| (0..x_band.domain().len()).map(move |x| (x, y)))
        .collect();
    let lookup = |&(x, y): &(usize, usize)| values.get(&(x, y)).copied();

    #[cfg(feature = "parallel-layout")]
    let observed: Vec<Option<f64>> = pairs.par_iter().map(lookup).collect();
    #[cfg(not(feature = "parallel-layout"))]
    let observed: Vec<Option<f64>> = pairs.iter().map(lookup).collect();

    let (min, max) = observed
        .iter()
        .map(|value| value.unwrap_or(0.0))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| {
            (low.min(value), high.max(value))
        });
    let color_scale = ColorScale::new(config.color_scale, min, max);

    let cells = pairs
        .iter()
        .zip(observed)
        .map(|(&(x, y), value)| HeatmapCell {
            x: x_band.domain()[x].clone(),
            y: y_band.domain()[y].clone(),
            value: value.unwrap_or(0.0),
            missing: value.is_none(),
            bounds: Bounds::new(
                x_band.position_at(x),
                y_band.position_at(y),
                x_band.bandwidth(),
                y_band.bandwidth(),
            ),
            color: color_scale.color(value.unwrap_or(0.0)),
        })
        .collect();

    Ok(HeatmapGeometry {
        plot,
        x_band,
        y_band,
        cells,
        color_scale,
    })
}

pub fn append_heatmap_primitives(
    frame: &mut RenderFrame,
    geometry: &HeatmapGeometry,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
) {
    for cell in &geometry.cells {
        let bounds = cell.bounds;
        frame.push_rect(
            CanvasLayerKind::Series,
            RectPrimitive::new(bounds.x, bounds.y, bounds.width, bounds.height, cell.color)
                .with_tooltip(tooltip(config, || {
                    let suffix = if cell.missing { " (no data)" } else { "" };
                    format!("{} / {}: {}{suffix}", cell.x, cell.y, format_number(cell.value))
                })),
        );
    }
    push_band_axis(frame, &geometry.x_band, geometry.plot, BandAxis::Horizontal, tuning);
    push_band_axis(frame, &geometry.y_band, geometry.plot, BandAxis::Vertical, tuning);
    push_axis_titles(frame, config.x_axis.as_ref(), config.y_axis.as_ref(), geometry.plot, tuning);

    if config.legend {
        push_gradient_legend(frame, geometry.color_scale, tuning);
    }
}

/// Continuous legend: a gradient bar spanning `[min, max]` with end labels.
pub(crate) fn push_gradient_legend(frame: &mut RenderFrame, scale: ColorScale, tuning: &LayoutTuning) {
    let font = tuning.label_font_px;
    let width = LEGEND_BAR_WIDTH.min(f64::from(frame.viewport.width) / 2.0);
    let x = (f64::from(frame.viewport.width) - width) / 2.0;
    let height = tuning.legend_swatch_px;
    let y = f64::from(frame.viewport.height) - tuning.legend_row_height / 2.0 - height / 2.0;

    let gradient = scale
        .stops()
        .into_iter()
        .fold(LinearGradient::horizontal(LEGEND_GRADIENT_ID, x, width, y), |gradient, (offset, color)| {
            gradient.with_stop(offset, color)
        });
    frame.add_gradient(gradient);
    frame.push_rect(
        CanvasLayerKind::Legend,
        RectPrimitive::new(x, y, width, height, WHITE)
            .with_fill(Fill::Gradient(LEGEND_GRADIENT_ID.to_owned()))
            .with_border(1.0, MUTED_TEXT_COLOR.with_alpha(0.4)),
    );
    let (min, max) = scale.extent();
    let baseline = y + height / 2.0 + font * 0.35;
    frame.push_text(
        CanvasLayerKind::Legend,
        TextPrimitive::new(format_number(min), x - 6.0, baseline, font, MUTED_TEXT_COLOR, TextHAlign::Right),
    );
    frame.push_text(
        CanvasLayerKind::Legend,
        TextPrimitive::new(format_number(max), x + width + 6.0, baseline, font, MUTED_TEXT_COLOR, TextHAlign::Left),
    );
}

#[cfg(test)]
mod tests {
    use super::compute_heatmap;
    use crate::config::{AxisConfig, ChartConfiguration, ChartType, SeriesConfig};
    use crate::core::{Bounds, ColorScaleKind, DataRow};

    fn config() -> ChartConfiguration {
        ChartConfiguration::new(ChartType::Heatmap)
            .with_x_axis(AxisConfig::new("day"))
            .with_y_axis(AxisConfig::new("hour"))
            .with_series(SeriesConfig::new("load"))
    }

    #[test]
    fn missing_cells_are_zero_and_first_duplicate_wins() {
        let rows = vec![
            DataRow::new().with("day", "mon").with("hour", "9").with("load", 4.0),
            DataRow::new().with("day", "tue").with("hour", "10").with("load", 8.0),
            DataRow::new().with("day", "mon").with("hour", "9").with("load", 100.0),
        ];
        let geometry =
            compute_heatmap(&config(), &rows, Bounds::new(0.0, 0.0, 200.0, 100.0)).expect("heatmap");
        assert_eq!(geometry.cells.len(), 4);
        assert_eq!(geometry.cell("mon", "9").expect("cell").value, 4.0);
        let gap = geometry.cell("tue", "9").expect("cell");
        assert!(gap.missing);
        assert_eq!(gap.value, 0.0);
        assert_eq!(geometry.extent(), (0.0, 8.0));
    }

    #[test]
    fn diverging_scale_is_neutral_at_the_midpoint() {
        let rows = vec![
            DataRow::new().with("day", "a").with("hour", "1").with("load", -10.0),
            DataRow::new().with("day", "b").with("hour", "1").with("load", 0.0),
            DataRow::new().with("day", "c").with("hour", "1").with("load", 10.0),
        ];
        let mut config = config();
        config.color_scale = ColorScaleKind::Diverging;
        let geometry =
            compute_heatmap(&config, &rows, Bounds::new(0.0, 0.0, 300.0, 100.0)).expect("heatmap");
        let middle = geometry.cell("b", "1").expect("cell").color;
        assert!((middle.red - middle.blue).abs() < 1e-9);
    }
}
