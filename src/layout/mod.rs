//! Chart-family layout algorithms.
//!
//! Every family is a pure `compute_*` function from configuration and rows to
//! semantic geometry, plus an `append_*_primitives` painter that turns that
//! geometry into draw commands. Nothing here touches a rendering backend.

pub mod box_plot;
pub mod cartesian;
pub mod chrome;
pub mod gantt;
pub mod geo;
pub mod heatmap;
pub mod pie;
pub mod sankey;
pub mod sunburst;
pub mod table;
pub mod treemap;
pub mod waterfall;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ChartConfiguration, ChartFamily, ChartType, GeoKind, LayoutTuning};
use crate::core::{DataRow, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::render::RenderFrame;

pub use box_plot::{BoxGroup, BoxPlotGeometry};
pub use cartesian::{CartesianGeometry, CartesianMark, CartesianSeries};
pub use gantt::{GanttGeometry, GanttTask, IntervalSource};
pub use geo::{GeoGeometry, GeoMarker, MarkerPlacement};
pub use heatmap::{HeatmapCell, HeatmapGeometry};
pub use pie::{PieGeometry, PieSlice};
pub use sankey::{SankeyColumn, SankeyGeometry, SankeyLink, SankeyNode};
pub use sunburst::{SunburstArc, SunburstGeometry};
pub use table::TableGeometry;
pub use treemap::{TreemapGeometry, TreemapTile};
pub use waterfall::{WaterfallBar, WaterfallGeometry, WaterfallKind};

/// Inputs of a layout pass that do not come from the configuration.
///
/// `now` is injected so gantt fallback intervals and the today marker are
/// reproducible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutContext {
    pub now: DateTime<Utc>,
    pub tuning: LayoutTuning,
}

impl LayoutContext {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            tuning: LayoutTuning::default(),
        }
    }

    #[must_use]
    pub fn with_tuning(mut self, tuning: LayoutTuning) -> Self {
        self.tuning = tuning;
        self
    }
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// Semantic geometry of one family, kept next to the painted frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FamilyGeometry {
    Cartesian(CartesianGeometry),
    Pie(PieGeometry),
    Table(TableGeometry),
    BoxPlot(BoxPlotGeometry),
    Treemap(TreemapGeometry),
    Sunburst(SunburstGeometry),
    Sankey(SankeyGeometry),
    Gantt(GanttGeometry),
    Waterfall(WaterfallGeometry),
    Heatmap(HeatmapGeometry),
    Geo(GeoGeometry),
}

/// Fully computed, renderer-agnostic result of one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub chart_type: ChartType,
    pub viewport: Viewport,
    pub frame: RenderFrame,
    pub geometry: FamilyGeometry,
}

fn reserves_legend(family: ChartFamily) -> bool {
    match family {
        ChartFamily::Cartesian(_)
        | ChartFamily::Pie
        | ChartFamily::Treemap
        | ChartFamily::Sunburst
        | ChartFamily::Waterfall
        | ChartFamily::Heatmap
        | ChartFamily::Geo(GeoKind::Heat | GeoKind::Choropleth) => true,
        ChartFamily::Table
        | ChartFamily::BoxPlot
        | ChartFamily::Sankey
        | ChartFamily::Gantt
        | ChartFamily::Geo(GeoKind::Point) => false,
    }
}

/// Lays out `rows` for the family of `config.chart_type`.
///
/// Binding checks are the dispatcher's job; a family that still finds a
/// required field missing reports `ChartError::InvalidConfig`.
pub fn compute_layout(
    config: &ChartConfiguration,
    rows: &[DataRow],
    context: &LayoutContext,
) -> ChartResult<LayoutResult> {
    let family = config.chart_type.family().ok_or_else(|| {
        ChartError::InvalidConfig(format!("unsupported chart type `{}`", config.chart_type))
    })?;
    let tuning = context.tuning.validate()?;
    let viewport = chrome::resolve_viewport(config, &tuning);
    let plot = chrome::plot_area(config, &tuning, viewport, reserves_legend(family));
    let mut frame = chrome::new_frame(config, viewport);
    debug!(?family, rows = rows.len(), width = viewport.width, height = viewport.height, "laying out chart");

    let geometry = match family {
        ChartFamily::Cartesian(kind) => {
            let geometry = cartesian::compute_cartesian(config, rows, kind, plot, &tuning)?;
            cartesian::append_cartesian_primitives(&mut frame, &geometry, config, &tuning);
            FamilyGeometry::Cartesian(geometry)
        }
        ChartFamily::Pie => {
            let geometry = pie::compute_pie(config, rows, plot)?;
            pie::append_pie_primitives(&mut frame, &geometry, config, &tuning);
            FamilyGeometry::Pie(geometry)
        }
        ChartFamily::Table => {
            let geometry = table::compute_table(config, rows, plot, &tuning);
            table::append_table_primitives(&mut frame, &geometry, &tuning);
            FamilyGeometry::Table(geometry)
        }
        ChartFamily::BoxPlot => {
            let geometry = box_plot::compute_box_plot(config, rows, plot, &tuning)?;
            box_plot::append_box_plot_primitives(&mut frame, &geometry, config, &tuning);
            FamilyGeometry::BoxPlot(geometry)
        }
        ChartFamily::Treemap => {
            let geometry = treemap::compute_treemap(config, rows, plot, &tuning)?;
            treemap::append_treemap_primitives(&mut frame, &geometry, config, &tuning);
            FamilyGeometry::Treemap(geometry)
        }
        ChartFamily::Sunburst => {
            let geometry = sunburst::compute_sunburst(config, rows, plot, &tuning)?;
            sunburst::append_sunburst_primitives(&mut frame, &geometry, config, &tuning);
            FamilyGeometry::Sunburst(geometry)
        }
        ChartFamily::Sankey => {
            let geometry = sankey::compute_sankey(config, rows, plot, &tuning)?;
            sankey::append_sankey_primitives(&mut frame, &geometry, config, &tuning);
            FamilyGeometry::Sankey(geometry)
        }
        ChartFamily::Gantt => {
            let geometry = gantt::compute_gantt(config, rows, plot, context.now, &tuning)?;
            gantt::append_gantt_primitives(&mut frame, &geometry, config, &tuning);
            FamilyGeometry::Gantt(geometry)
        }
        ChartFamily::Waterfall => {
            let geometry = waterfall::compute_waterfall(config, rows, plot, &tuning)?;
            waterfall::append_waterfall_primitives(&mut frame, &geometry, config, &tuning);
            FamilyGeometry::Waterfall(geometry)
        }
        ChartFamily::Heatmap => {
            let geometry = heatmap::compute_heatmap(config, rows, plot)?;
            heatmap::append_heatmap_primitives(&mut frame, &geometry, config, &tuning);
            FamilyGeometry::Heatmap(geometry)
        }
        ChartFamily::Geo(kind) => {
            let geometry = geo::compute_geo(config, rows, kind, plot, &tuning)?;
            geo::append_geo_primitives(&mut frame, &geometry, config, &tuning);
            FamilyGeometry::Geo(geometry)
        }
    };

    chrome::push_title(&mut frame, config, &tuning);
    Ok(LayoutResult {
        chart_type: config.chart_type.clone(),
        viewport,
        frame,
        geometry,
    })
}

/// Required field binding, or an `InvalidConfig` naming what is missing.
pub(crate) fn required<'a>(field: Option<&'a str>, what: &str) -> ChartResult<&'a str> {
    field.ok_or_else(|| ChartError::InvalidConfig(format!("missing required binding `{what}`")))
}
