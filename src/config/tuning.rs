use serde::{Deserialize, Serialize};

use crate::config::Margin;
use crate::error::{ChartError, ChartResult};

/// Engine-level layout constants.
///
/// Configurations override the per-chart knobs (`padding`, `nodeWidth`, ...);
/// these values fill in whatever a configuration leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutTuning {
    pub default_width: u32,
    pub default_height: u32,
    pub default_margin: Margin,
    pub title_font_px: f64,
    pub label_font_px: f64,
    pub tick_count: usize,
    pub legend_row_height: f64,
    pub legend_swatch_px: f64,
    pub treemap_padding: f64,
    pub treemap_min_label_width: f64,
    pub treemap_min_label_height: f64,
    pub sunburst_min_label_angle: f64,
    pub pie_min_label_angle: f64,
    pub geo_min_marker_radius: f64,
    pub geo_max_marker_radius: f64,
    pub geo_default_zoom: f64,
    pub sankey_node_width: f64,
    pub sankey_node_padding: f64,
    pub sankey_min_link_width: f64,
    pub gantt_task_height: f64,
    pub gantt_fallback_spacing_days: i64,
    pub gantt_fallback_span_days: i64,
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            default_width: 800,
            default_height: 400,
            default_margin: Margin::default(),
            title_font_px: 16.0,
            label_font_px: 11.0,
            tick_count: 5,
            legend_row_height: 18.0,
            legend_swatch_px: 10.0,
            treemap_padding: 2.0,
            treemap_min_label_width: 40.0,
            treemap_min_label_height: 20.0,
            sunburst_min_label_angle: 0.15,
            pie_min_label_angle: 0.2,
            geo_min_marker_radius: 5.0,
            geo_max_marker_radius: 25.0,
            geo_default_zoom: 2.0,
            sankey_node_width: 20.0,
            sankey_node_padding: 10.0,
            sankey_min_link_width: 1.0,
            gantt_task_height: 30.0,
            gantt_fallback_spacing_days: 7,
            gantt_fallback_span_days: 5,
        }
    }
}

impl LayoutTuning {
    pub fn validate(self) -> ChartResult<Self> {
        if self.default_width == 0 || self.default_height == 0 {
            return Err(ChartError::InvalidViewport {
                width: self.default_width,
                height: self.default_height,
            });
        }

        let margin = self.default_margin;
        for (name, value) in [
            ("margin.top", margin.top),
            ("margin.right", margin.right),
            ("margin.bottom", margin.bottom),
            ("margin.left", margin.left),
            ("treemap_padding", self.treemap_padding),
            ("treemap_min_label_width", self.treemap_min_label_width),
            ("treemap_min_label_height", self.treemap_min_label_height),
            ("sunburst_min_label_angle", self.sunburst_min_label_angle),
            ("pie_min_label_angle", self.pie_min_label_angle),
            ("geo_default_zoom", self.geo_default_zoom),
            ("sankey_node_padding", self.sankey_node_padding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "layout tuning `{name}` must be finite and >= 0"
                )));
            }
        }

        for (name, value) in [
            ("title_font_px", self.title_font_px),
            ("label_font_px", self.label_font_px),
            ("legend_row_height", self.legend_row_height),
            ("legend_swatch_px", self.legend_swatch_px),
            ("sankey_node_width", self.sankey_node_width),
            ("sankey_min_link_width", self.sankey_min_link_width),
            ("gantt_task_height", self.gantt_task_height),
            ("geo_min_marker_radius", self.geo_min_marker_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "layout tuning `{name}` must be finite and > 0"
                )));
            }
        }

        if !self.geo_max_marker_radius.is_finite()
            || self.geo_max_marker_radius < self.geo_min_marker_radius
        {
            return Err(ChartError::InvalidConfig(
                "geo marker radius range must be ascending".to_owned(),
            ));
        }
        if self.tick_count == 0 {
            return Err(ChartError::InvalidConfig(
                "layout tuning `tick_count` must be > 0".to_owned(),
            ));
        }
        if self.gantt_fallback_spacing_days < 0 || self.gantt_fallback_span_days <= 0 {
            return Err(ChartError::InvalidConfig(
                "gantt fallback spacing must be >= 0 and span > 0 days".to_owned(),
            ));
        }
        Ok(self)
    }
}
