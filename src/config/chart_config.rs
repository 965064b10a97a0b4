use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{ColorScaleKind, LatLng};

/// Chart-type tag of a configuration.
///
/// Unknown tags are kept verbatim in `Unsupported` so the dispatcher can
/// report them instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartType {
    Bar,
    Column,
    Line,
    Area,
    Pie,
    Scatter,
    Table,
    Heatmap,
    Treemap,
    Waterfall,
    BoxPlot,
    Sankey,
    Sunburst,
    Gantt,
    MapChoropleth,
    MapPoint,
    MapHeat,
    Unsupported(String),
}

/// Cartesian mark flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CartesianKind {
    /// Horizontal bars, categories on the vertical axis.
    Bar,
    /// Vertical bars.
    Column,
    Line,
    Area,
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoKind {
    Point,
    Heat,
    Choropleth,
}

/// Structurally distinct layout algorithm behind one or more chart types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartFamily {
    Cartesian(CartesianKind),
    Pie,
    Table,
    Heatmap,
    Treemap,
    Sunburst,
    Waterfall,
    BoxPlot,
    Sankey,
    Gantt,
    Geo(GeoKind),
}

impl ChartType {
    /// Every implemented tag, in declaration order.
    pub const SUPPORTED: [Self; 17] = [
        Self::Bar,
        Self::Column,
        Self::Line,
        Self::Area,
        Self::Pie,
        Self::Scatter,
        Self::Table,
        Self::Heatmap,
        Self::Treemap,
        Self::Waterfall,
        Self::BoxPlot,
        Self::Sankey,
        Self::Sunburst,
        Self::Gantt,
        Self::MapChoropleth,
        Self::MapPoint,
        Self::MapHeat,
    ];

    /// Parses a tag case-insensitively; `box-plot`, `box_plot` and `BOX_PLOT` are equal.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        let normalized = tag.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "BAR" => Self::Bar,
            "COLUMN" => Self::Column,
            "LINE" => Self::Line,
            "AREA" => Self::Area,
            "PIE" => Self::Pie,
            "SCATTER" => Self::Scatter,
            "TABLE" => Self::Table,
            "HEATMAP" => Self::Heatmap,
            "TREEMAP" => Self::Treemap,
            "WATERFALL" => Self::Waterfall,
            "BOX_PLOT" | "BOXPLOT" => Self::BoxPlot,
            "SANKEY" => Self::Sankey,
            "SUNBURST" => Self::Sunburst,
            "GANTT" => Self::Gantt,
            "MAP_CHOROPLETH" => Self::MapChoropleth,
            "MAP_POINT" => Self::MapPoint,
            "MAP_HEAT" => Self::MapHeat,
            _ => Self::Unsupported(tag.trim().to_owned()),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Bar => "BAR",
            Self::Column => "COLUMN",
            Self::Line => "LINE",
            Self::Area => "AREA",
            Self::Pie => "PIE",
            Self::Scatter => "SCATTER",
            Self::Table => "TABLE",
            Self::Heatmap => "HEATMAP",
            Self::Treemap => "TREEMAP",
            Self::Waterfall => "WATERFALL",
            Self::BoxPlot => "BOX_PLOT",
            Self::Sankey => "SANKEY",
            Self::Sunburst => "SUNBURST",
            Self::Gantt => "GANTT",
            Self::MapChoropleth => "MAP_CHOROPLETH",
            Self::MapPoint => "MAP_POINT",
            Self::MapHeat => "MAP_HEAT",
            Self::Unsupported(tag) => tag,
        }
    }

    /// Layout family of the tag; `None` for unsupported tags.
    #[must_use]
    pub fn family(&self) -> Option<ChartFamily> {
        let family = match self {
            Self::Bar => ChartFamily::Cartesian(CartesianKind::Bar),
            Self::Column => ChartFamily::Cartesian(CartesianKind::Column),
            Self::Line => ChartFamily::Cartesian(CartesianKind::Line),
            Self::Area => ChartFamily::Cartesian(CartesianKind::Area),
            Self::Scatter => ChartFamily::Cartesian(CartesianKind::Scatter),
            Self::Pie => ChartFamily::Pie,
            Self::Table => ChartFamily::Table,
            Self::Heatmap => ChartFamily::Heatmap,
            Self::Treemap => ChartFamily::Treemap,
            Self::Sunburst => ChartFamily::Sunburst,
            Self::Waterfall => ChartFamily::Waterfall,
            Self::BoxPlot => ChartFamily::BoxPlot,
            Self::Sankey => ChartFamily::Sankey,
            Self::Gantt => ChartFamily::Gantt,
            Self::MapPoint => ChartFamily::Geo(GeoKind::Point),
            Self::MapHeat => ChartFamily::Geo(GeoKind::Heat),
            Self::MapChoropleth => ChartFamily::Geo(GeoKind::Choropleth),
            Self::Unsupported(_) => return None,
        };
        Some(family)
    }
}

impl From<String> for ChartType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ChartType> for String {
    fn from(value: ChartType) -> Self {
        value.tag().to_owned()
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Field binding and bounds of one axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisConfig {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl AxisConfig {
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Bound field name; empty names count as unbound.
    #[must_use]
    pub fn bound_field(&self) -> Option<&str> {
        non_empty(self.field.as_deref())
    }
}

/// Which vertical axis a series is measured against.
pub const RIGHT_AXIS_ID: &str = "right";

/// One plotted measure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesConfig {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub stack_id: Option<String>,
    #[serde(default)]
    pub y_axis_id: Option<String>,
    #[serde(default)]
    pub stroke_width: Option<f64>,
    #[serde(default)]
    pub fill_opacity: Option<f64>,
}

impl SeriesConfig {
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_stack_id(mut self, stack_id: impl Into<String>) -> Self {
        self.stack_id = Some(stack_id.into());
        self
    }

    #[must_use]
    pub fn on_right_axis(mut self) -> Self {
        self.y_axis_id = Some(RIGHT_AXIS_ID.to_owned());
        self
    }

    #[must_use]
    pub fn display_label(&self) -> &str {
        non_empty(self.label.as_deref()).unwrap_or(&self.field)
    }

    #[must_use]
    pub fn uses_right_axis(&self) -> bool {
        self.y_axis_id
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(RIGHT_AXIS_ID))
    }
}

/// Outer spacing between the surface edge and the plot area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 40.0,
            right: 30.0,
            bottom: 50.0,
            left: 60.0,
        }
    }
}

impl Margin {
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// Tiling strategy of treemaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreemapTiling {
    #[default]
    Squarify,
    SliceDice,
}

/// Boundary ring of a choropleth region as `[lng, lat]` pairs.
pub type RegionRing = Vec<[f64; 2]>;

/// Immutable description of what to draw, independent of data values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfiguration {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub x_axis: Option<AxisConfig>,
    #[serde(default)]
    pub y_axis: Option<AxisConfig>,
    #[serde(default)]
    pub y_axis_right: Option<AxisConfig>,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
    #[serde(default)]
    pub category_field: Option<String>,
    #[serde(default)]
    pub value_field: Option<String>,

    #[serde(default = "default_true")]
    pub grid: bool,
    #[serde(default = "default_true")]
    pub legend: bool,
    #[serde(default = "default_true")]
    pub tooltip: bool,
    #[serde(default = "default_true")]
    pub animation: bool,
    #[serde(default)]
    pub smooth: bool,
    #[serde(default)]
    pub stacked: bool,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default)]
    pub margin: Option<Margin>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub background_color: Option<String>,

    #[serde(default)]
    pub inner_radius: Option<f64>,
    #[serde(default)]
    pub padding: Option<f64>,
    #[serde(default)]
    pub tiling: TreemapTiling,
    #[serde(default)]
    pub node_width: Option<f64>,
    #[serde(default)]
    pub node_padding: Option<f64>,
    #[serde(default)]
    pub task_height: Option<f64>,
    #[serde(default)]
    pub show_dependencies: bool,
    #[serde(default)]
    pub positive_color: Option<String>,
    #[serde(default)]
    pub negative_color: Option<String>,
    #[serde(default)]
    pub total_color: Option<String>,
    #[serde(default = "default_true")]
    pub show_mean: bool,
    #[serde(default = "default_true")]
    pub show_outliers: bool,
    #[serde(default)]
    pub color_scale: ColorScaleKind,
    #[serde(default)]
    pub map_center: Option<LatLng>,
    #[serde(default)]
    pub map_zoom: Option<f64>,
    #[serde(default)]
    pub location_field: Option<String>,
    #[serde(default)]
    pub size_field: Option<String>,
    #[serde(default)]
    pub regions: Option<IndexMap<String, RegionRing>>,
}

fn default_true() -> bool {
    true
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

impl ChartConfiguration {
    /// Minimal configuration with every display flag at its default.
    #[must_use]
    pub fn new(chart_type: ChartType) -> Self {
        Self {
            chart_type,
            title: None,
            description: None,
            x_axis: None,
            y_axis: None,
            y_axis_right: None,
            series: Vec::new(),
            category_field: None,
            value_field: None,
            grid: true,
            legend: true,
            tooltip: true,
            animation: true,
            smooth: false,
            stacked: false,
            colors: None,
            margin: None,
            width: None,
            height: None,
            background_color: None,
            inner_radius: None,
            padding: None,
            tiling: TreemapTiling::default(),
            node_width: None,
            node_padding: None,
            task_height: None,
            show_dependencies: false,
            positive_color: None,
            negative_color: None,
            total_color: None,
            show_mean: true,
            show_outliers: true,
            color_scale: ColorScaleKind::default(),
            map_center: None,
            map_zoom: None,
            location_field: None,
            size_field: None,
            regions: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_x_axis(mut self, axis: AxisConfig) -> Self {
        self.x_axis = Some(axis);
        self
    }

    #[must_use]
    pub fn with_y_axis(mut self, axis: AxisConfig) -> Self {
        self.y_axis = Some(axis);
        self
    }

    #[must_use]
    pub fn with_series(mut self, series: SeriesConfig) -> Self {
        self.series.push(series);
        self
    }

    #[must_use]
    pub fn with_category_value(
        mut self,
        category_field: impl Into<String>,
        value_field: impl Into<String>,
    ) -> Self {
        self.category_field = Some(category_field.into());
        self.value_field = Some(value_field.into());
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = Some(margin);
        self
    }

    #[must_use]
    pub fn x_field(&self) -> Option<&str> {
        self.x_axis.as_ref().and_then(AxisConfig::bound_field)
    }

    #[must_use]
    pub fn y_field(&self) -> Option<&str> {
        self.y_axis.as_ref().and_then(AxisConfig::bound_field)
    }

    /// Field of the first series, the measure of single-measure families.
    #[must_use]
    pub fn primary_measure(&self) -> Option<&str> {
        self.series
            .first()
            .and_then(|series| non_empty(Some(series.field.as_str())))
    }

    #[must_use]
    pub fn category_field(&self) -> Option<&str> {
        non_empty(self.category_field.as_deref())
    }

    #[must_use]
    pub fn value_field(&self) -> Option<&str> {
        non_empty(self.value_field.as_deref())
    }

    #[must_use]
    pub fn palette(&self) -> Option<&[String]> {
        self.colors.as_deref()
    }

    /// Title used for export filenames and host chrome.
    #[must_use]
    pub fn display_title(&self) -> Option<&str> {
        non_empty(self.title.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartConfiguration, ChartFamily, ChartType, GeoKind};

    #[test]
    fn tags_round_trip_and_unknown_tags_are_kept() {
        for chart_type in ChartType::SUPPORTED {
            assert_eq!(ChartType::parse(chart_type.tag()), chart_type);
            assert!(chart_type.family().is_some());
        }
        let unknown = ChartType::parse("radar");
        assert_eq!(unknown, ChartType::Unsupported("radar".to_owned()));
        assert!(unknown.family().is_none());
        assert_eq!(ChartType::parse("box-plot"), ChartType::BoxPlot);
    }

    #[test]
    fn configuration_deserializes_camel_case_json() {
        let config: ChartConfiguration = serde_json::from_str(
            r#"{
                "type": "MAP_HEAT",
                "xAxis": {"field": "group"},
                "series": [{"field": "value", "yAxisId": "right"}],
                "categoryField": "c",
                "mapCenter": {"lat": 1.0, "lng": 2.0},
                "colorScale": "diverging",
                "showOutliers": false
            }"#,
        )
        .expect("config");
        assert_eq!(config.chart_type.family(), Some(ChartFamily::Geo(GeoKind::Heat)));
        assert_eq!(config.x_field(), Some("group"));
        assert!(config.series[0].uses_right_axis());
        assert!(config.grid);
        assert!(!config.show_outliers);
        assert_eq!(config.primary_measure(), Some("value"));
    }

    #[test]
    fn blank_field_names_count_as_unbound() {
        let config: ChartConfiguration =
            serde_json::from_str(r#"{"type":"PIE","categoryField":"  ","valueField":"v"}"#)
                .expect("config");
        assert_eq!(config.category_field(), None);
        assert_eq!(config.value_field(), Some("v"));
    }
}
