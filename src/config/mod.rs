//! Declarative chart description and engine tuning.

mod chart_config;
mod tuning;

pub use chart_config::{
    AxisConfig, CartesianKind, ChartConfiguration, ChartFamily, ChartType, GeoKind, Margin,
    RIGHT_AXIS_ID, RegionRing, SeriesConfig, TreemapTiling,
};
pub use tuning::LayoutTuning;
