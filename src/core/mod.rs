//! Geometry and statistics shared by every chart family.
//!
//! Everything here is pure: no rendering backend, no global state.

pub mod color_scale;
pub mod curve;
pub mod hierarchy;
pub mod palette;
pub mod primitives;
pub mod projection;
pub mod scale;
pub mod statistics;
pub mod time_scale;
pub mod types;
pub mod value;

pub use color_scale::{ColorScale, ColorScaleKind, HEAT_BUCKETS, heat_color};
pub use hierarchy::{CategoryWeight, partition_angles, rollup_by_category, slice_dice, squarify};
pub use palette::{DEFAULT_PALETTE, OrdinalScale, palette_color, parse_css_color};
pub use projection::{LatLng, MercatorProjection};
pub use scale::{BandScale, LinearScale, tick_step, ticks};
pub use statistics::{BoxStatistics, numeric_values, quantile_sorted};
pub use time_scale::TimeScale;
pub use types::{Bounds, Point, Viewport};
pub use value::{DataRow, DataValue, MAX_NUMERIC_MAGNITUDE, distinct_values};
