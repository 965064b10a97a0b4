//! Bar, column, line, area and scatter charts over a shared category axis.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{CartesianKind, ChartConfiguration, LayoutTuning};
use crate::core::curve::{monotone_curve, polyline};
use crate::core::primitives::format_number;
use crate::core::{BandScale, Bounds, DataRow, LinearScale, Point, distinct_values, palette_color};
use crate::error::{ChartError, ChartResult};
use crate::layout::chrome::{
    AxisSide, BandAxis, LegendEntry, configured_color, push_axis_titles, push_band_axis,
    push_legend, push_value_axis, tooltip,
};
use crate::layout::required;
use crate::render::{
    CanvasLayerKind, CirclePrimitive, Color, PathCommand, PathPrimitive, RectPrimitive,
    RenderFrame,
};

const IMPLICIT_STACK: &str = "__stacked";

/// One plotted datum of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianMark {
    pub category: String,
    pub value: f64,
    /// Stack baseline in data units; 0 for unstacked series.
    pub base: f64,
    /// Bar rectangle, or a zero-sized box at `point` for point marks.
    pub bounds: Bounds,
    /// Anchor of the mark's top (or right) end.
    pub point: Point,
}

impl CartesianMark {
    /// Upper end of the mark in data units.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.base + self.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianSeries {
    pub field: String,
    pub label: String,
    pub color: Color,
    pub right_axis: bool,
    pub stack: Option<String>,
    pub stroke_width: f64,
    pub fill_opacity: f64,
    pub marks: Vec<CartesianMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianGeometry {
    pub kind: CartesianKind,
    pub plot: Bounds,
    pub categories: Vec<String>,
    /// Category bands; absent when a scatter plot has a numeric x axis.
    pub band: Option<BandScale>,
    /// Numeric x axis of scatter plots.
    pub x_scale: Option<LinearScale>,
    pub value_scale: LinearScale,
    pub right_scale: Option<LinearScale>,
    pub series: Vec<CartesianSeries>,
}

impl CartesianGeometry {
    #[must_use]
    pub fn value_domain(&self) -> (f64, f64) {
        self.value_scale.domain()
    }
}

pub fn compute_cartesian(
    config: &ChartConfiguration,
    rows: &[DataRow],
    kind: CartesianKind,
    plot: Bounds,
    tuning: &LayoutTuning,
) -> ChartResult<CartesianGeometry> {
    let x_field = required(config.x_field(), "xAxis.field")?;
    if config.series.is_empty() {
        return Err(ChartError::InvalidConfig(
            "missing required binding `series`".to_owned(),
        ));
    }

    let categories = distinct_values(rows, x_field);
    let horizontal = kind == CartesianKind::Bar;
    let stackable = kind != CartesianKind::Scatter;
    let palette = config.palette();

    // Aggregate each series per category; non-numeric values are skipped.
    let mut sums: Vec<IndexMap<String, f64>> = Vec::with_capacity(config.series.len());
    for series in &config.series {
        let mut per_category = IndexMap::new();
        for row in rows {
            if let Some(value) = row.number(&series.field) {
                *per_category.entry(row.text(x_field)).or_insert(0.0) += value;
            }
        }
        sums.push(per_category);
    }

    let stacks: Vec<Option<String>> = config
        .series
        .iter()
        .map(|series| {
            if !stackable {
                return None;
            }
            series
                .stack_id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .or_else(|| config.stacked.then(|| IMPLICIT_STACK.to_owned()))
        })
        .collect();
    let right_axis: Vec<bool> = config
        .series
        .iter()
        .map(|series| !horizontal && series.uses_right_axis())
        .collect();

    // Stack baselines: positive and negative values accumulate separately.
    let mut accumulators: IndexMap<(String, bool, String), (f64, f64)> = IndexMap::new();
    let mut spans: Vec<Vec<(String, f64, f64)>> = Vec::with_capacity(sums.len());
    for (index, per_category) in sums.iter().enumerate() {
        let mut series_spans = Vec::with_capacity(categories.len());
        for category in &categories {
            let Some(value) = per_category.get(category).copied() else {
                continue;
            };
            let base = match &stacks[index] {
                Some(stack) => {
                    let key = (stack.clone(), right_axis[index], category.clone());
                    let (positive, negative) = accumulators.entry(key).or_insert((0.0, 0.0));
                    if value >= 0.0 {
                        let base = *positive;
                        *positive += value;
                        base
                    } else {
                        let base = *negative;
                        *negative += value;
                        base
                    }
                }
                None => 0.0,
            };
            series_spans.push((category.clone(), value, base));
        }
        spans.push(series_spans);
    }

    let include_zero = matches!(
        kind,
        CartesianKind::Bar | CartesianKind::Column | CartesianKind::Area
    );
    let value_range = if horizontal {
        (plot.x, plot.right())
    } else {
        (plot.bottom(), plot.y)
    };
    let extent = |right: bool| {
        let mut low = f64::INFINITY;
        let mut high = f64::NEG_INFINITY;
        for (index, series_spans) in spans.iter().enumerate() {
            if right_axis[index] != right {
                continue;
            }
            for (_, value, base) in series_spans {
                low = low.min(base.min(base + value));
                high = high.max(base.max(base + value));
            }
        }
        (low, high)
    };
    let (low, high) = extent(false);
    let value_scale = crate::layout::chrome::value_scale(
        low,
        high,
        config.y_axis.as_ref(),
        include_zero,
        tuning,
        value_range,
    )?;
    let right_scale = if right_axis.iter().any(|right| *right) {
        let (low, high) = extent(true);
        Some(crate::layout::chrome::value_scale(
            low,
            high,
            config.y_axis_right.as_ref(),
            include_zero,
            tuning,
            value_range,
        )?)
    } else {
        None
    };

    let x_scale = if kind == CartesianKind::Scatter {
        numeric_extent(rows, x_field)
            .map(|(low, high)| {
                LinearScale::from_extent(low, high)
                    .nice(tuning.tick_count)
                    .with_range(plot.x, plot.right())
            })
            .transpose()?
    } else {
        None
    };

    let band = if x_scale.is_some() {
        None
    } else {
        let (start, end) = if horizontal {
            (plot.y, plot.bottom())
        } else {
            (plot.x, plot.right())
        };
        let band = BandScale::new(categories.clone(), start, end);
        Some(match kind {
            CartesianKind::Bar | CartesianKind::Column => band.with_padding(0.2, 0.1),
            _ => band.with_padding(0.0, 0.0),
        })
    };

    // Bar groups: one slot per stack, one per unstacked series.
    let mut groups: IndexSet<String> = IndexSet::new();
    let group_of: Vec<usize> = stacks
        .iter()
        .enumerate()
        .map(|(index, stack)| {
            let key = stack
                .as_ref()
                .map_or_else(|| format!("series-{index}"), |stack| format!("stack-{stack}"));
            groups.insert_full(key).0
        })
        .collect();

    let mut series_out = Vec::with_capacity(config.series.len());
    for (index, series) in config.series.iter().enumerate() {
        let scale = if right_axis[index] {
            right_scale.unwrap_or(value_scale)
        } else {
            value_scale
        };
        let color = configured_color(series.color.as_deref(), palette_color(index, palette));
        let marks = match (kind, &band) {
            (CartesianKind::Scatter, _) => scatter_marks(
                rows,
                x_field,
                &series.field,
                scale,
                x_scale,
                band.as_ref(),
            ),
            (CartesianKind::Bar | CartesianKind::Column, Some(band)) => {
                let slot_width = band.bandwidth() / groups.len().max(1) as f64;
                spans[index]
                    .iter()
                    .filter_map(|(category, value, base)| {
                        let slot = band.position(category)? + slot_width * group_of[index] as f64;
                        let from = scale.map(*base);
                        let to = scale.map(base + value);
                        let (bounds, point) = if horizontal {
                            (
                                Bounds::new(from.min(to), slot, (to - from).abs(), slot_width),
                                Point::new(to, slot + slot_width / 2.0),
                            )
                        } else {
                            (
                                Bounds::new(slot, from.min(to), slot_width, (to - from).abs()),
                                Point::new(slot + slot_width / 2.0, to),
                            )
                        };
                        Some(CartesianMark {
                            category: category.clone(),
                            value: *value,
                            base: *base,
                            bounds,
                            point,
                        })
                    })
                    .collect()
            }
            (_, Some(band)) => spans[index]
                .iter()
                .filter_map(|(category, value, base)| {
                    let x = band.center(category)?;
                    let y = scale.map(base + value);
                    Some(CartesianMark {
                        category: category.clone(),
                        value: *value,
                        base: *base,
                        bounds: Bounds::new(x, y, 0.0, 0.0),
                        point: Point::new(x, y),
                    })
                })
                .collect(),
            (_, None) => Vec::new(),
        };
        let (default_stroke, default_opacity) = match kind {
            CartesianKind::Bar | CartesianKind::Column => (0.0, 1.0),
            CartesianKind::Line => (2.0, 1.0),
            CartesianKind::Area => (2.0, 0.3),
            CartesianKind::Scatter => (1.0, 0.7),
        };
        series_out.push(CartesianSeries {
            field: series.field.clone(),
            label: series.display_label().to_owned(),
            color,
            right_axis: right_axis[index],
            stack: stacks[index].clone(),
            stroke_width: series
                .stroke_width
                .filter(|width| width.is_finite() && *width > 0.0)
                .unwrap_or(default_stroke),
            fill_opacity: series
                .fill_opacity
                .filter(|opacity| opacity.is_finite())
                .map_or(default_opacity, |opacity| opacity.clamp(0.0, 1.0)),
            marks,
        });
    }

    debug!(
        ?kind,
        categories = categories.len(),
        series = series_out.len(),
        "cartesian layout computed"
    );
    Ok(CartesianGeometry {
        kind,
        plot,
        categories,
        band,
        x_scale,
        value_scale,
        right_scale,
        series: series_out,
    })
}

/// Extent of `field` when every present value is numeric.
fn numeric_extent(rows: &[DataRow], field: &str) -> Option<(f64, f64)> {
    let mut low = f64::INFINITY;
    let mut high = f64::NEG_INFINITY;
    let mut seen = false;
    for row in rows {
        let Some(value) = row.get(field).filter(|value| !value.is_null()) else {
            continue;
        };
        let number = value.as_number()?;
        low = low.min(number);
        high = high.max(number);
        seen = true;
    }
    seen.then_some((low, high))
}

fn scatter_marks(
    rows: &[DataRow],
    x_field: &str,
    y_field: &str,
    scale: LinearScale,
    x_scale: Option<LinearScale>,
    band: Option<&BandScale>,
) -> Vec<CartesianMark> {
    rows.iter()
        .filter_map(|row| {
            let value = row.number(y_field)?;
            let category = row.text(x_field);
            let x = match (x_scale, band) {
                (Some(x_scale), _) => x_scale.map(row.number(x_field)?),
                (None, Some(band)) => band.center(&category)?,
                (None, None) => return None,
            };
            let y = scale.map(value);
            Some(CartesianMark {
                category,
                value,
                base: 0.0,
                bounds: Bounds::new(x, y, 0.0, 0.0),
                point: Point::new(x, y),
            })
        })
        .collect()
}

pub fn append_cartesian_primitives(
    frame: &mut RenderFrame,
    geometry: &CartesianGeometry,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
) {
    let plot = geometry.plot;
    let horizontal = geometry.kind == CartesianKind::Bar;
    push_value_axis(
        frame,
        geometry.value_scale,
        plot,
        if horizontal { AxisSide::Bottom } else { AxisSide::Left },
        config.grid,
        tuning,
    );
    if let Some(right) = geometry.right_scale {
        push_value_axis(frame, right, plot, AxisSide::Right, false, tuning);
    }
    match (&geometry.band, geometry.x_scale) {
        (_, Some(x_scale)) => push_value_axis(frame, x_scale, plot, AxisSide::Bottom, false, tuning),
        (Some(band), None) => push_band_axis(
            frame,
            band,
            plot,
            if horizontal { BandAxis::Vertical } else { BandAxis::Horizontal },
            tuning,
        ),
        (None, None) => {}
    }
    if horizontal {
        push_axis_titles(frame, config.y_axis.as_ref(), config.x_axis.as_ref(), plot, tuning);
    } else {
        push_axis_titles(frame, config.x_axis.as_ref(), config.y_axis.as_ref(), plot, tuning);
    }

    for series in &geometry.series {
        let mark_tooltip = |mark: &CartesianMark| {
            tooltip(config, || {
                format!("{}: {} = {}", series.label, mark.category, format_number(mark.value))
            })
        };
        match geometry.kind {
            CartesianKind::Bar | CartesianKind::Column => {
                let fill = series.color.with_alpha(series.fill_opacity);
                for mark in &series.marks {
                    let mut rect = RectPrimitive::new(
                        mark.bounds.x,
                        mark.bounds.y,
                        mark.bounds.width,
                        mark.bounds.height,
                        fill,
                    )
                    .with_tooltip(mark_tooltip(mark));
                    if series.stroke_width > 0.0 {
                        rect = rect.with_border(series.stroke_width, series.color);
                    }
                    frame.push_rect(CanvasLayerKind::Series, rect);
                }
            }
            CartesianKind::Line | CartesianKind::Area => {
                let points: Vec<Point> = series.marks.iter().map(|mark| mark.point).collect();
                if points.is_empty() {
                    continue;
                }
                let outline = if config.smooth {
                    monotone_curve(&points)
                } else {
                    polyline(&points)
                };
                if geometry.kind == CartesianKind::Area {
                    let scale = if series.right_axis {
                        geometry.right_scale.unwrap_or(geometry.value_scale)
                    } else {
                        geometry.value_scale
                    };
                    let mut area = outline.clone();
                    for mark in series.marks.iter().rev() {
                        area.push(PathCommand::LineTo {
                            x: mark.point.x,
                            y: scale.map(mark.base),
                        });
                    }
                    area.push(PathCommand::Close);
                    frame.push_path(
                        CanvasLayerKind::Series,
                        PathPrimitive::filled(area, series.color.with_alpha(series.fill_opacity)),
                    );
                }
                if points.len() > 1 {
                    frame.push_path(
                        CanvasLayerKind::Series,
                        PathPrimitive::stroked(outline, series.stroke_width, series.color),
                    );
                }
                for mark in &series.marks {
                    frame.push_circle(
                        CanvasLayerKind::Overlay,
                        CirclePrimitive::new(mark.point.x, mark.point.y, 3.0, series.color)
                            .with_tooltip(mark_tooltip(mark)),
                    );
                }
            }
            CartesianKind::Scatter => {
                let fill = series.color.with_alpha(series.fill_opacity);
                for mark in &series.marks {
                    frame.push_circle(
                        CanvasLayerKind::Series,
                        CirclePrimitive::new(mark.point.x, mark.point.y, 4.0, fill)
                            .with_stroke(series.stroke_width, series.color)
                            .with_tooltip(mark_tooltip(mark)),
                    );
                }
            }
        }
    }

    let entries: Vec<LegendEntry> = geometry
        .series
        .iter()
        .map(|series| LegendEntry::new(series.label.clone(), series.color))
        .collect();
    push_legend(frame, config, tuning, &entries);
}

#[cfg(test)]
mod tests {
    use super::compute_cartesian;
    use crate::config::{
        AxisConfig, CartesianKind, ChartConfiguration, ChartType, LayoutTuning, SeriesConfig,
    };
    use crate::core::{Bounds, DataRow};
    use approx::assert_abs_diff_eq;

    fn rows() -> Vec<DataRow> {
        vec![
            DataRow::new().with("m", "jan").with("a", 10.0).with("b", -4.0),
            DataRow::new().with("m", "feb").with("a", 20.0).with("b", 6.0),
            DataRow::new().with("m", "jan").with("a", 5.0).with("b", "n/a"),
        ]
    }

    fn plot() -> Bounds {
        Bounds::new(0.0, 0.0, 400.0, 200.0)
    }

    #[test]
    fn columns_sum_duplicate_categories_and_grow_from_zero() {
        let config = ChartConfiguration::new(ChartType::Column)
            .with_x_axis(AxisConfig::new("m"))
            .with_series(SeriesConfig::new("a"));
        let geometry =
            compute_cartesian(&config, &rows(), CartesianKind::Column, plot(), &LayoutTuning::default())
                .expect("layout");
        let marks = &geometry.series[0].marks;
        assert_eq!(geometry.categories, vec!["jan", "feb"]);
        assert_eq!(marks[0].value, 15.0);
        assert_eq!(geometry.value_domain().0, 0.0);
        let baseline = geometry.value_scale.map(0.0);
        assert_abs_diff_eq!(marks[1].bounds.bottom(), baseline, epsilon = 1e-9);
    }

    #[test]
    fn stacking_separates_positive_and_negative_values() {
        let mut config = ChartConfiguration::new(ChartType::Column)
            .with_x_axis(AxisConfig::new("m"))
            .with_series(SeriesConfig::new("a"))
            .with_series(SeriesConfig::new("b"));
        config.stacked = true;
        let geometry =
            compute_cartesian(&config, &rows(), CartesianKind::Column, plot(), &LayoutTuning::default())
                .expect("layout");
        let b = &geometry.series[1].marks;
        // jan: b = -4 stacks below zero, feb: b = 6 stacks on top of a = 20.
        assert_eq!(b[0].base, 0.0);
        assert_eq!(b[1].base, 20.0);
        assert_eq!(b[1].end(), 26.0);
        assert!(geometry.value_domain().0 <= -4.0);
    }

    #[test]
    fn right_axis_series_get_their_own_scale() {
        let config = ChartConfiguration::new(ChartType::Line)
            .with_x_axis(AxisConfig::new("m"))
            .with_series(SeriesConfig::new("a"))
            .with_series(SeriesConfig::new("b").on_right_axis());
        let geometry =
            compute_cartesian(&config, &rows(), CartesianKind::Line, plot(), &LayoutTuning::default())
                .expect("layout");
        assert!(geometry.right_scale.is_some());
        assert!(geometry.series[1].right_axis);
    }

    #[test]
    fn scatter_uses_numeric_x_axis_when_possible() {
        let rows = vec![
            DataRow::new().with("x", 1.0).with("y", 3.0),
            DataRow::new().with("x", 4.0).with("y", 2.0),
        ];
        let config = ChartConfiguration::new(ChartType::Scatter)
            .with_x_axis(AxisConfig::new("x"))
            .with_series(SeriesConfig::new("y"));
        let geometry =
            compute_cartesian(&config, &rows, CartesianKind::Scatter, plot(), &LayoutTuning::default())
                .expect("layout");
        assert!(geometry.x_scale.is_some());
        assert!(geometry.band.is_none());
        assert!(geometry.series[0].marks[1].point.x > geometry.series[0].marks[0].point.x);
    }
}
