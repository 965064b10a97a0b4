//! Two-column sankey.
//!
//! Sources sit in the left column and targets in the right one. Bands in a
//! column share the height evenly instead of being sized by flow; only link
//! widths carry the values.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ChartConfiguration, LayoutTuning};
use crate::core::curve::horizontal_link;
use crate::core::primitives::format_number;
use crate::core::{Bounds, DataRow, OrdinalScale, Point};
use crate::error::ChartResult;
use crate::layout::chrome::{TEXT_COLOR, fit_text, tooltip};
use crate::layout::required;
use crate::render::{
    CanvasLayerKind, Color, PathPrimitive, RectPrimitive, RenderFrame, TextHAlign, TextPrimitive,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SankeyColumn {
    Source,
    Target,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyNode {
    pub name: String,
    pub column: SankeyColumn,
    pub bounds: Bounds,
    pub color: Color,
}

impl SankeyNode {
    #[must_use]
    pub fn midpoint_y(&self) -> f64 {
        self.bounds.y + self.bounds.height / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyLink {
    /// Index into `SankeyGeometry::nodes`.
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub width: f64,
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyGeometry {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
    pub max_value: f64,
}

impl SankeyGeometry {
    #[must_use]
    pub fn node(&self, column: SankeyColumn, name: &str) -> Option<&SankeyNode> {
        self.nodes
            .iter()
            .find(|node| node.column == column && node.name == name)
    }
}

pub fn compute_sankey(
    config: &ChartConfiguration,
    rows: &[DataRow],
    plot: Bounds,
    tuning: &LayoutTuning,
) -> ChartResult<SankeyGeometry> {
    let source_field = required(config.x_field(), "xAxis.field")?;
    let target_field = required(config.y_field(), "yAxis.field")?;
    let value_field = required(config.primary_measure(), "series[0].field")?;
    let node_width = positive_or(config.node_width, tuning.sankey_node_width).min(plot.width / 3.0);
    let node_padding = non_negative_or(config.node_padding, tuning.sankey_node_padding);

    let mut flows = Vec::with_capacity(rows.len());
    let mut sources: IndexSet<String> = IndexSet::new();
    let mut targets: IndexSet<String> = IndexSet::new();
    for row in rows {
        let (source, target) = (row.text(source_field), row.text(target_field));
        if source.is_empty() || target.is_empty() {
            debug!(?source, ?target, "sankey row without both endpoints skipped");
            continue;
        }
        let value = match row.number(value_field) {
            Some(value) if value >= 0.0 => value,
            other => {
                warn!(?other, "sankey link value is not a non-negative number, using 0");
                0.0
            }
        };
        let (source_index, _) = sources.insert_full(source);
        let (target_index, _) = targets.insert_full(target);
        flows.push((source_index, target_index, value));
    }

    let (source_band, source_padding) = column_bands(plot.height, sources.len(), node_padding);
    let (target_band, target_padding) = column_bands(plot.height, targets.len(), node_padding);
    let min_band = source_band.min(target_band);
    let mut colors = OrdinalScale::new(config.palette());

    let mut nodes = Vec::with_capacity(sources.len() + targets.len());
    for (index, name) in sources.iter().enumerate() {
        nodes.push(SankeyNode {
            bounds: Bounds::new(
                plot.x,
                plot.y + index as f64 * (source_band + source_padding),
                node_width,
                source_band,
            ),
            color: colors.color(name),
            column: SankeyColumn::Source,
            name: name.clone(),
        });
    }
    let target_offset = nodes.len();
    for (index, name) in targets.iter().enumerate() {
        nodes.push(SankeyNode {
            bounds: Bounds::new(
                plot.right() - node_width,
                plot.y + index as f64 * (target_band + target_padding),
                node_width,
                target_band,
            ),
            color: colors.color(name),
            column: SankeyColumn::Target,
            name: name.clone(),
        });
    }

    let max_value = flows.iter().map(|(_, _, value)| *value).fold(0.0, f64::max);
    let links = flows
        .into_iter()
        .map(|(source, target, value)| {
            let source_node = &nodes[source];
            let target_node = &nodes[target_offset + target];
            let scaled = if max_value > 0.0 {
                value / max_value * min_band
            } else {
                0.0
            };
            SankeyLink {
                source,
                target: target_offset + target,
                value,
                width: scaled.max(tuning.sankey_min_link_width),
                from: Point::new(source_node.bounds.right(), source_node.midpoint_y()),
                to: Point::new(target_node.bounds.x, target_node.midpoint_y()),
            }
        })
        .collect();

    Ok(SankeyGeometry {
        nodes,
        links,
        max_value,
    })
}

/// Band height and gap for a column of `count` nodes filling `height`.
///
/// The gap shrinks when the configured padding would leave bands under one
/// pixel, so the column never grows past `height`.
fn column_bands(height: f64, count: usize, padding: f64) -> (f64, f64) {
    if count == 0 {
        return (0.0, padding);
    }
    let height = height.max(0.0);
    let n = count as f64;
    let padding = if height - padding * (n - 1.0) < n {
        padding.min(height / n / 2.0)
    } else {
        padding
    };
    (((height - padding * (n - 1.0)) / n).max(0.0), padding)
}

fn positive_or(value: Option<f64>, fallback: f64) -> f64 {
    value
        .filter(|value| value.is_finite() && *value > 0.0)
        .unwrap_or(fallback)
}

fn non_negative_or(value: Option<f64>, fallback: f64) -> f64 {
    value
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(fallback)
}

pub fn append_sankey_primitives(
    frame: &mut RenderFrame,
    geometry: &SankeyGeometry,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
) {
    let font = tuning.label_font_px;
    for link in &geometry.links {
        let source = &geometry.nodes[link.source];
        let target = &geometry.nodes[link.target];
        frame.push_path(
            CanvasLayerKind::Series,
            PathPrimitive::stroked(
                horizontal_link(link.from, link.to),
                link.width,
                source.color.with_alpha(0.4),
            )
            .with_tooltip(tooltip(config, || {
                format!("{} → {}: {}", source.name, target.name, format_number(link.value))
            })),
        );
    }

    for node in &geometry.nodes {
        let bounds = node.bounds;
        frame.push_rect(
            CanvasLayerKind::Overlay,
            RectPrimitive::new(bounds.x, bounds.y, bounds.width, bounds.height, node.color)
                .with_tooltip(tooltip(config, || node.name.clone())),
        );
        let (x, align) = match node.column {
            SankeyColumn::Source => (bounds.right() + 6.0, TextHAlign::Left),
            SankeyColumn::Target => (bounds.x - 6.0, TextHAlign::Right),
        };
        if let Some(label) = fit_text(&node.name, font, f64::from(frame.viewport.width) / 3.0) {
            frame.push_text(
                CanvasLayerKind::Axis,
                TextPrimitive::new(label, x, node.midpoint_y() + font * 0.35, font, TEXT_COLOR, align),
            );
        }
    }
}
