//! Pieces every family shares: viewport, plot area, title, legend and axes.

use crate::config::{AxisConfig, ChartConfiguration, LayoutTuning, Margin};
use crate::core::primitives::format_number;
use crate::core::{BandScale, Bounds, LinearScale, Viewport, parse_css_color};
use crate::error::ChartResult;
use crate::render::{
    CanvasLayerKind, Color, LinePrimitive, RectPrimitive, RenderFrame, TextHAlign, TextPrimitive,
};

pub(crate) const TEXT_COLOR: Color = Color::rgb(0.2, 0.22, 0.25);
pub(crate) const MUTED_TEXT_COLOR: Color = Color::rgb(0.42, 0.45, 0.5);
pub(crate) const AXIS_COLOR: Color = Color::rgb(0.6, 0.62, 0.66);
pub(crate) const GRID_COLOR: Color = Color::rgb(0.9, 0.91, 0.93);
pub(crate) const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

/// Average glyph advance as a fraction of the font size, for label fitting.
const GLYPH_WIDTH_RATIO: f64 = 0.6;

/// One swatch of a categorical legend.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

impl LegendEntry {
    #[must_use]
    pub fn new(label: impl Into<String>, color: Color) -> Self {
        Self {
            label: label.into(),
            color,
        }
    }
}

/// Output size: the configuration's explicit size, else the tuning default.
#[must_use]
pub fn resolve_viewport(config: &ChartConfiguration, tuning: &LayoutTuning) -> Viewport {
    let width = config.width.filter(|width| *width > 0);
    let height = config.height.filter(|height| *height > 0);
    Viewport::new(
        width.unwrap_or(tuning.default_width),
        height.unwrap_or(tuning.default_height),
    )
}

/// Empty frame carrying the configured background color.
#[must_use]
pub fn new_frame(config: &ChartConfiguration, viewport: Viewport) -> RenderFrame {
    let background = config
        .background_color
        .as_deref()
        .and_then(parse_css_color);
    RenderFrame::new(viewport).with_background(background)
}

/// Plot rectangle left after margins, the title line and a bottom legend row.
#[must_use]
pub fn plot_area(
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
    viewport: Viewport,
    reserve_legend: bool,
) -> Bounds {
    let margin: Margin = config.margin.unwrap_or(tuning.default_margin);
    let mut top = margin.top;
    if config.display_title().is_some() {
        top += tuning.title_font_px;
    }
    let mut bottom = margin.bottom;
    if reserve_legend && config.legend {
        bottom += tuning.legend_row_height;
    }
    let width = (f64::from(viewport.width) - margin.left - margin.right).max(1.0);
    let height = (f64::from(viewport.height) - top - bottom).max(1.0);
    Bounds::new(margin.left, top, width, height)
}

pub fn push_title(
    frame: &mut RenderFrame,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
) {
    let Some(title) = config.display_title() else {
        return;
    };
    frame.push_text(
        CanvasLayerKind::Legend,
        TextPrimitive::new(
            title,
            f64::from(frame.viewport.width) / 2.0,
            tuning.title_font_px + 6.0,
            tuning.title_font_px,
            TEXT_COLOR,
            TextHAlign::Center,
        )
        .bold(),
    );
}

/// Horizontal legend along the bottom edge, wrapping onto extra rows.
pub fn push_legend(
    frame: &mut RenderFrame,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
    entries: &[LegendEntry],
) {
    if !config.legend || entries.is_empty() {
        return;
    }
    let viewport_width = f64::from(frame.viewport.width);
    let viewport_height = f64::from(frame.viewport.height);
    let swatch = tuning.legend_swatch_px;
    let font = tuning.label_font_px;
    let row_height = tuning.legend_row_height;
    let starts = legend_row_starts(entries, viewport_width, swatch, font);
    let rows = starts.len();
    let mut row = 0;
    let mut x = 12.0;

    for (index, entry) in entries.iter().enumerate() {
        if row + 1 < rows && starts[row + 1] == index {
            row += 1;
            x = 12.0;
        }
        // The last row sits on the bottom edge.
        let y = viewport_height - row_height * (rows - row) as f64 + row_height / 2.0;
        frame.push_rect(
            CanvasLayerKind::Legend,
            RectPrimitive::new(x, y - swatch / 2.0, swatch, swatch, entry.color)
                .with_corner_radius(2.0),
        );
        if !entry.label.is_empty() {
            frame.push_text(
                CanvasLayerKind::Legend,
                TextPrimitive::new(
                    entry.label.clone(),
                    x + swatch + 4.0,
                    y + font * 0.35,
                    font,
                    TEXT_COLOR,
                    TextHAlign::Left,
                ),
            );
        }
        x += legend_entry_width(entry, swatch, font);
    }
}

/// Indices of entries that start a legend row; always begins with 0.
fn legend_row_starts(entries: &[LegendEntry], viewport_width: f64, swatch: f64, font: f64) -> Vec<usize> {
    let mut starts = vec![0];
    let mut x = 12.0;
    for (index, entry) in entries.iter().enumerate() {
        let width = legend_entry_width(entry, swatch, font);
        if index > 0 && x + width > viewport_width - 12.0 {
            starts.push(index);
            x = 12.0;
        }
        x += width;
    }
    starts
}

fn legend_entry_width(entry: &LegendEntry, swatch: f64, font: f64) -> f64 {
    swatch + 4.0 + text_width(&entry.label, font) + 14.0
}

/// Estimated rendered width of `text` at `font_px`.
#[must_use]
pub fn text_width(text: &str, font_px: f64) -> f64 {
    text.chars().count() as f64 * font_px * GLYPH_WIDTH_RATIO
}

/// Shortens `text` with an ellipsis so it fits in `max_width`.
#[must_use]
pub fn fit_text(text: &str, font_px: f64, max_width: f64) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    if text_width(text, font_px) <= max_width {
        return Some(text.to_owned());
    }
    let max_chars = (max_width / (font_px * GLYPH_WIDTH_RATIO)).floor() as usize;
    if max_chars < 2 {
        return None;
    }
    let mut fitted: String = text.chars().take(max_chars - 1).collect();
    fitted.push('…');
    Some(fitted)
}

/// Tooltip text when the configuration enables tooltips.
#[must_use]
pub fn tooltip(config: &ChartConfiguration, text: impl FnOnce() -> String) -> Option<String> {
    config.tooltip.then(text)
}

/// Black or white, whichever reads better on `fill`.
#[must_use]
pub fn label_color_on(fill: Color) -> Color {
    if fill.luminance() > 0.55 {
        TEXT_COLOR
    } else {
        WHITE
    }
}

/// Resolves a configured color string, falling back to `fallback`.
#[must_use]
pub fn configured_color(value: Option<&str>, fallback: Color) -> Color {
    value.and_then(parse_css_color).unwrap_or(fallback)
}

/// Niced value scale over `[min, max]` honoring axis bounds.
///
/// With `include_zero` the domain always contains 0 so bars grow from the baseline.
pub fn value_scale(
    min: f64,
    max: f64,
    axis: Option<&AxisConfig>,
    include_zero: bool,
    tuning: &LayoutTuning,
    range: (f64, f64),
) -> ChartResult<LinearScale> {
    let (mut low, mut high) = (min, max);
    if include_zero {
        low = low.min(0.0);
        high = high.max(0.0);
    }
    let mut scale = LinearScale::from_extent(low, high).nice(tuning.tick_count);
    let (nice_low, nice_high) = scale.domain();
    let bound_low = axis.and_then(|axis| axis.min).filter(|value| value.is_finite());
    let bound_high = axis.and_then(|axis| axis.max).filter(|value| value.is_finite());
    if bound_low.is_some() || bound_high.is_some() {
        scale = LinearScale::from_extent(
            bound_low.unwrap_or(nice_low),
            bound_high.unwrap_or(nice_high),
        );
    }
    scale.with_range(range.0, range.1)
}

/// Which edge of the plot a value axis is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSide {
    Left,
    Right,
    Bottom,
}

/// Tick labels, tick marks and the axis line of a value axis, plus grid lines.
pub fn push_value_axis(
    frame: &mut RenderFrame,
    scale: LinearScale,
    plot: Bounds,
    side: AxisSide,
    grid: bool,
    tuning: &LayoutTuning,
) {
    let font = tuning.label_font_px;
    for tick in scale.ticks(tuning.tick_count) {
        let position = scale.map(tick);
        let label = format_number(tick);
        match side {
            AxisSide::Left | AxisSide::Right => {
                if grid && side == AxisSide::Left {
                    frame.push_line(
                        CanvasLayerKind::Grid,
                        LinePrimitive::new(plot.x, position, plot.right(), position, 1.0, GRID_COLOR),
                    );
                }
                let (x, align, tick_end) = if side == AxisSide::Left {
                    (plot.x - 8.0, TextHAlign::Right, plot.x - 4.0)
                } else {
                    (plot.right() + 8.0, TextHAlign::Left, plot.right() + 4.0)
                };
                let edge = if side == AxisSide::Left { plot.x } else { plot.right() };
                frame.push_line(
                    CanvasLayerKind::Axis,
                    LinePrimitive::new(edge, position, tick_end, position, 1.0, AXIS_COLOR),
                );
                frame.push_text(
                    CanvasLayerKind::Axis,
                    TextPrimitive::new(label, x, position + font * 0.35, font, MUTED_TEXT_COLOR, align),
                );
            }
            AxisSide::Bottom => {
                if grid {
                    frame.push_line(
                        CanvasLayerKind::Grid,
                        LinePrimitive::new(position, plot.y, position, plot.bottom(), 1.0, GRID_COLOR),
                    );
                }
                frame.push_line(
                    CanvasLayerKind::Axis,
                    LinePrimitive::new(position, plot.bottom(), position, plot.bottom() + 4.0, 1.0, AXIS_COLOR),
                );
                frame.push_text(
                    CanvasLayerKind::Axis,
                    TextPrimitive::new(
                        label,
                        position,
                        plot.bottom() + 6.0 + font,
                        font,
                        MUTED_TEXT_COLOR,
                        TextHAlign::Center,
                    ),
                );
            }
        }
    }
    let line = match side {
        AxisSide::Left => LinePrimitive::new(plot.x, plot.y, plot.x, plot.bottom(), 1.0, AXIS_COLOR),
        AxisSide::Right => LinePrimitive::new(
            plot.right(),
            plot.y,
            plot.right(),
            plot.bottom(),
            1.0,
            AXIS_COLOR,
        ),
        AxisSide::Bottom => LinePrimitive::new(
            plot.x,
            plot.bottom(),
            plot.right(),
            plot.bottom(),
            1.0,
            AXIS_COLOR,
        ),
    };
    frame.push_line(CanvasLayerKind::Axis, line);
}

/// Orientation of a band (category) axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandAxis {
    /// Bands run along x, labels under the plot.
    Horizontal,
    /// Bands run along y, labels left of the plot.
    Vertical,
}

/// Category labels centered on their bands.
///
/// Horizontal labels that would collide are rotated by -45 degrees.
pub fn push_band_axis(
    frame: &mut RenderFrame,
    band: &BandScale,
    plot: Bounds,
    orientation: BandAxis,
    tuning: &LayoutTuning,
) {
    let font = tuning.label_font_px;
    let bandwidth = band.bandwidth();
    let rotate = orientation == BandAxis::Horizontal
        && band
            .domain()
            .iter()
            .any(|label| text_width(label, font) > bandwidth + 4.0);

    for (index, label) in band.domain().iter().enumerate() {
        if label.is_empty() {
            continue;
        }
        let center = band.position_at(index) + bandwidth / 2.0;
        let text = match orientation {
            BandAxis::Horizontal if rotate => TextPrimitive::new(
                label.clone(),
                center,
                plot.bottom() + 6.0 + font,
                font,
                MUTED_TEXT_COLOR,
                TextHAlign::Right,
            )
            .rotated(-45.0),
            BandAxis::Horizontal => TextPrimitive::new(
                label.clone(),
                center,
                plot.bottom() + 6.0 + font,
                font,
                MUTED_TEXT_COLOR,
                TextHAlign::Center,
            ),
            BandAxis::Vertical => TextPrimitive::new(
                label.clone(),
                plot.x - 8.0,
                center + font * 0.35,
                font,
                MUTED_TEXT_COLOR,
                TextHAlign::Right,
            ),
        };
        frame.push_text(CanvasLayerKind::Axis, text);
    }
    let line = match orientation {
        BandAxis::Horizontal => LinePrimitive::new(
            plot.x,
            plot.bottom(),
            plot.right(),
            plot.bottom(),
            1.0,
            AXIS_COLOR,
        ),
        BandAxis::Vertical => LinePrimitive::new(plot.x, plot.y, plot.x, plot.bottom(), 1.0, AXIS_COLOR),
    };
    frame.push_line(CanvasLayerKind::Axis, line);
}

/// Axis titles from `AxisConfig::label`: x under the plot, y rotated left of it.
pub fn push_axis_titles(
    frame: &mut RenderFrame,
    x_axis: Option<&AxisConfig>,
    y_axis: Option<&AxisConfig>,
    plot: Bounds,
    tuning: &LayoutTuning,
) {
    let font = tuning.label_font_px;
    if let Some(label) = x_axis
        .and_then(|axis| axis.label.as_deref())
        .filter(|label| !label.is_empty())
    {
        frame.push_text(
            CanvasLayerKind::Axis,
            TextPrimitive::new(
                label,
                plot.center().x,
                plot.bottom() + 2.0 * font + 14.0,
                font,
                TEXT_COLOR,
                TextHAlign::Center,
            ),
        );
    }
    if let Some(label) = y_axis
        .and_then(|axis| axis.label.as_deref())
        .filter(|label| !label.is_empty())
    {
        let x = (plot.x - 44.0).max(font);
        frame.push_text(
            CanvasLayerKind::Axis,
            TextPrimitive::new(label, x, plot.center().y, font, TEXT_COLOR, TextHAlign::Center)
                .rotated(-90.0),
        );
    }
}

/// Centered placeholder when a family has nothing positive to draw.
pub fn push_notice(frame: &mut RenderFrame, plot: Bounds, text: &str, tuning: &LayoutTuning) {
    frame.push_text(
        CanvasLayerKind::Overlay,
        TextPrimitive::new(
            text,
            plot.center().x,
            plot.center().y,
            tuning.label_font_px,
            MUTED_TEXT_COLOR,
            TextHAlign::Center,
        ),
    );
}
