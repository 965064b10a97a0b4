use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ChartConfiguration, LayoutTuning, TreemapTiling};
use crate::core::primitives::format_number;
use crate::core::{Bounds, DataRow, OrdinalScale, rollup_by_category, slice_dice, squarify};
use crate::error::ChartResult;
use crate::layout::chrome::{LegendEntry, fit_text, label_color_on, push_legend, tooltip};
use crate::layout::required;
use crate::render::{CanvasLayerKind, Color, RectPrimitive, RenderFrame, TextHAlign, TextPrimitive};

/// One leaf of the single-level treemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreemapTile {
    pub name: String,
    pub value: f64,
    /// Tiling cell before padding; cells exactly cover the container.
    pub cell: Bounds,
    /// Painted rectangle, `cell` inset by the padding.
    pub bounds: Bounds,
    pub color: Color,
    pub labeled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreemapGeometry {
    pub container: Bounds,
    pub tiling: TreemapTiling,
    pub padding: f64,
    pub tiles: Vec<TreemapTile>,
}

impl TreemapGeometry {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.tiles.iter().map(|tile| tile.value).sum()
    }
}

pub fn compute_treemap(
    config: &ChartConfiguration,
    rows: &[DataRow],
    plot: Bounds,
    tuning: &LayoutTuning,
) -> ChartResult<TreemapGeometry> {
    let category = required(config.category_field(), "categoryField")?;
    let value = required(config.value_field(), "valueField")?;

    let mut weights = rollup_by_category(rows, category, value);
    weights.retain(|weight| weight.value > 0.0);
    let values: Vec<f64> = weights.iter().map(|weight| weight.value).collect();
    let cells = match config.tiling {
        TreemapTiling::Squarify => squarify(&values, plot),
        TreemapTiling::SliceDice => slice_dice(&values, plot),
    };
    let padding = config
        .padding
        .filter(|padding| padding.is_finite() && *padding >= 0.0)
        .unwrap_or(tuning.treemap_padding);
    debug!(tiles = weights.len(), tiling = ?config.tiling, padding, "treemap tiled");

    let mut colors = OrdinalScale::new(config.palette());
    let tiles = weights
        .into_iter()
        .zip(cells)
        .map(|(weight, cell)| {
            let bounds = cell.inset(padding / 2.0);
            TreemapTile {
                color: colors.color(&weight.name),
                labeled: bounds.width >= tuning.treemap_min_label_width
                    && bounds.height >= tuning.treemap_min_label_height,
                name: weight.name,
                value: weight.value,
                cell,
                bounds,
            }
        })
        .collect();

    Ok(TreemapGeometry {
        container: plot,
        tiling: config.tiling,
        padding,
        tiles,
    })
}

pub fn append_treemap_primitives(
    frame: &mut RenderFrame,
    geometry: &TreemapGeometry,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
) {
    let font = tuning.label_font_px;
    let total = geometry.total();
    for tile in &geometry.tiles {
        let bounds = tile.bounds;
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            continue;
        }
        frame.push_rect(
            CanvasLayerKind::Series,
            RectPrimitive::new(bounds.x, bounds.y, bounds.width, bounds.height, tile.color)
                .with_corner_radius(2.0)
                .with_tooltip(tooltip(config, || {
                    let share = if total > 0.0 { tile.value / total * 100.0 } else { 0.0 };
                    format!("{}: {} ({share:.1}%)", tile.name, format_number(tile.value))
                })),
        );
        if !tile.labeled {
            continue;
        }
        let text_color = label_color_on(tile.color);
        if let Some(name) = fit_text(&tile.name, font, bounds.width - 8.0) {
            frame.push_text(
                CanvasLayerKind::Overlay,
                TextPrimitive::new(name, bounds.x + 4.0, bounds.y + 4.0 + font, font, text_color, TextHAlign::Left)
                    .bold(),
            );
        }
        if bounds.height >= font * 2.0 + 12.0 {
            frame.push_text(
                CanvasLayerKind::Overlay,
                TextPrimitive::new(
                    format_number(tile.value),
                    bounds.x + 4.0,
                    bounds.y + 8.0 + font * 2.0,
                    font,
                    text_color,
                    TextHAlign::Left,
                ),
            );
        }
    }

    let entries: Vec<LegendEntry> = geometry
        .tiles
        .iter()
        .map(|tile| LegendEntry::new(tile.name.clone(), tile.color))
        .collect();
    push_legend(frame, config, tuning, &entries);
}

#[cfg(test)]
mod tests {
    use super::compute_treemap;
    use crate::config::{ChartConfiguration, ChartType, LayoutTuning, TreemapTiling};
    use crate::core::{Bounds, DataRow};

    fn rows() -> Vec<DataRow> {
        [("a", 6.0), ("b", 6.0), ("c", 4.0), ("d", 3.0), ("e", 2.0), ("f", 2.0), ("g", 1.0)]
            .into_iter()
            .map(|(name, value)| DataRow::new().with("name", name).with("size", value))
            .collect()
    }

    #[test]
    fn cells_cover_container_and_tiles_stay_inside() {
        let config = ChartConfiguration::new(ChartType::Treemap).with_category_value("name", "size");
        let container = Bounds::new(10.0, 20.0, 600.0, 400.0);
        let geometry =
            compute_treemap(&config, &rows(), container, &LayoutTuning::default()).expect("treemap");
        let covered: f64 = geometry.tiles.iter().map(|tile| tile.cell.area()).sum();
        assert!((covered - container.area()).abs() <= geometry.tiles.len() as f64);
        for tile in &geometry.tiles {
            assert!(container.contains(tile.cell, 1e-6));
            assert!(tile.cell.contains(tile.bounds, 1e-9));
        }
    }

    #[test]
    fn slice_dice_and_label_threshold() {
        let mut config =
            ChartConfiguration::new(ChartType::Treemap).with_category_value("name", "size");
        config.tiling = TreemapTiling::SliceDice;
        let geometry = compute_treemap(
            &config,
            &rows(),
            Bounds::new(0.0, 0.0, 240.0, 100.0),
            &LayoutTuning::default(),
        )
        .expect("treemap");
        assert_eq!(geometry.tiles[0].name, "a");
        // The smallest slice is 10px wide, below the label threshold.
        let last = geometry.tiles.last().expect("tile");
        assert_eq!(last.name, "g");
        assert!(!last.labeled);
        assert!(geometry.tiles[0].labeled);
    }
}
