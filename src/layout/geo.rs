//! Geographic overlays on a Web-Mercator plane.
//!
//! Choropleth regions are filled from externally supplied boundary rings when
//! the configuration carries them. Without boundaries each region is drawn as
//! a point approximation: at the mean coordinate of its rows, or on an evenly
//! spaced ring around the map center when the rows have no coordinates.

use std::f64::consts::TAU;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ChartConfiguration, GeoKind, LayoutTuning};
use crate::core::curve::polygon;
use crate::core::primitives::format_number;
use crate::core::{
    Bounds, ColorScale, DataRow, LatLng, MercatorProjection, Point, Viewport,
    heat_color, palette_color,
};
use crate::error::{ChartError, ChartResult};
use crate::layout::chrome::{LegendEntry, WHITE, push_legend, tooltip};
use crate::layout::heatmap::push_gradient_legend;
use crate::render::{
    CanvasLayerKind, CirclePrimitive, Color, PathPrimitive, RectPrimitive, RenderFrame,
};

/// Latitude field candidates, in resolution order.
pub const LATITUDE_FIELDS: [&str; 3] = ["latitude", "lat", "y"];
/// Longitude field candidates, in resolution order.
pub const LONGITUDE_FIELDS: [&str; 4] = ["longitude", "lng", "x", "lon"];
/// Location key candidates when `locationField` is not configured.
pub const LOCATION_FIELDS: [&str; 4] = ["location", "region", "country", "state"];

const MAP_BACKGROUND: Color = Color::rgb(0.93, 0.95, 0.97);

/// First candidate present in any row.
#[must_use]
pub fn resolve_field(rows: &[DataRow], candidates: &[&'static str]) -> Option<&'static str> {
    candidates
        .iter()
        .copied()
        .find(|field| rows.iter().any(|row| row.contains(field)))
}

/// Latitude and longitude fields of the dataset, when both resolve.
#[must_use]
pub fn coordinate_fields(rows: &[DataRow]) -> Option<(&'static str, &'static str)> {
    Some((
        resolve_field(rows, &LATITUDE_FIELDS)?,
        resolve_field(rows, &LONGITUDE_FIELDS)?,
    ))
}

/// Region key field: `locationField`, else the first known location column present.
#[must_use]
pub fn location_field<'a>(config: &'a ChartConfiguration, rows: &[DataRow]) -> Option<&'a str> {
    config
        .location_field
        .as_deref()
        .filter(|field| !field.trim().is_empty())
        .or_else(|| resolve_field(rows, &LOCATION_FIELDS))
}

/// How a marker's position was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerPlacement {
    /// The row's own coordinate.
    Observed,
    /// Centroid of a supplied boundary ring.
    RegionPolygon,
    /// Mean coordinate of the rows grouped under one region key.
    GroupMean,
    /// Evenly spaced slot around the map center, ordered by region key.
    Ring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMarker {
    pub label: String,
    pub coord: Option<LatLng>,
    pub position: Point,
    pub radius: f64,
    pub value: Option<f64>,
    pub color: Color,
    pub placement: MarkerPlacement,
    /// Projected boundary, for `RegionPolygon` markers.
    pub polygon: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoGeometry {
    pub kind: GeoKind,
    pub plot: Bounds,
    pub center: LatLng,
    pub zoom: f64,
    pub markers: Vec<GeoMarker>,
    /// Value scale of choropleth regions.
    pub color_scale: Option<ColorScale>,
}

/// Projects into plot-local pixels, then offsets by the plot origin.
#[derive(Debug, Clone, Copy)]
struct PlotProjection {
    projection: MercatorProjection,
    plot: Bounds,
}

impl PlotProjection {
    fn new(center: LatLng, zoom: f64, plot: Bounds) -> Self {
        let viewport = Viewport::new(plot.width.max(1.0) as u32, plot.height.max(1.0) as u32);
        Self {
            projection: MercatorProjection::new(center, zoom, viewport),
            plot,
        }
    }

    fn project(self, coord: LatLng) -> Point {
        let local = self.projection.project(coord);
        Point::new(local.x + self.plot.x, local.y + self.plot.y)
    }
}

fn row_coord(row: &DataRow, fields: Option<(&str, &str)>) -> Option<LatLng> {
    let (lat, lng) = fields?;
    let coord = LatLng::new(row.number(lat)?, row.number(lng)?);
    coord.is_valid().then_some(coord)
}

fn mean_coord(coords: impl IntoIterator<Item = LatLng>) -> Option<LatLng> {
    let (count, lat, lng) = coords
        .into_iter()
        .fold((0_usize, 0.0, 0.0), |(count, lat, lng), coord| {
            (count + 1, lat + coord.lat, lng + coord.lng)
        });
    (count > 0).then(|| LatLng::new(lat / count as f64, lng / count as f64))
}

/// Value driving marker size: `sizeField`, else `valueField`, else `series[0].field`.
fn value_field(config: &ChartConfiguration) -> Option<&str> {
    config
        .size_field
        .as_deref()
        .filter(|field| !field.trim().is_empty())
        .or_else(|| config.value_field())
        .or_else(|| config.primary_measure())
}

fn radius_between(value: Option<f64>, low: f64, high: f64, tuning: &LayoutTuning) -> f64 {
    let (min_radius, max_radius) = (tuning.geo_min_marker_radius, tuning.geo_max_marker_radius);
    match value {
        Some(value) if high > low => min_radius + (value - low) / (high - low) * (max_radius - min_radius),
        _ => min_radius,
    }
}

fn extent(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| {
            (low.min(value), high.max(value))
        })
}

pub fn compute_geo(
    config: &ChartConfiguration,
    rows: &[DataRow],
    kind: GeoKind,
    plot: Bounds,
    tuning: &LayoutTuning,
) -> ChartResult<GeoGeometry> {
    let fields = coordinate_fields(rows);
    let observed: Vec<LatLng> = rows.iter().filter_map(|row| row_coord(row, fields)).collect();
    let center = config
        .map_center
        .filter(|center| center.is_valid())
        .or_else(|| mean_coord(observed.iter().copied()))
        .unwrap_or(LatLng::new(0.0, 0.0));
    let zoom = config
        .map_zoom
        .filter(|zoom| zoom.is_finite())
        .unwrap_or(tuning.geo_default_zoom);
    let projection = PlotProjection::new(center, zoom, plot);

    let (markers, color_scale) = match kind {
        GeoKind::Point => (point_markers(config, rows, fields, projection, tuning)?, None),
        GeoKind::Heat => (heat_markers(config, rows, fields, projection, tuning)?, None),
        GeoKind::Choropleth => {
            let (markers, scale) = region_markers(config, rows, fields, projection, tuning)?;
            (markers, Some(scale))
        }
    };
    debug!(?kind, markers = markers.len(), zoom, "geo overlay projected");

    Ok(GeoGeometry {
        kind,
        plot,
        center,
        zoom,
        markers,
        color_scale,
    })
}

fn missing_coordinates() -> ChartError {
    ChartError::InvalidConfig(format!(
        "missing coordinate fields: expected one of {LATITUDE_FIELDS:?} and one of {LONGITUDE_FIELDS:?}"
    ))
}

fn point_markers(
    config: &ChartConfiguration,
    rows: &[DataRow],
    fields: Option<(&'static str, &'static str)>,
    projection: PlotProjection,
    tuning: &LayoutTuning,
) -> ChartResult<Vec<GeoMarker>> {
    let fields = fields.ok_or_else(missing_coordinates)?;
    let size_field = value_field(config);
    let values: Vec<Option<f64>> = rows
        .iter()
        .map(|row| size_field.and_then(|field| row.number(field)))
        .collect();
    let (low, high) = extent(values.iter().flatten().copied());
    let palette = config.palette();

    let mut markers = Vec::with_capacity(rows.len());
    for (index, (row, value)) in rows.iter().zip(values).enumerate() {
        let Some(coord) = row_coord(row, Some(fields)) else {
            debug!(index, "geo row without a valid coordinate skipped");
            continue;
        };
        markers.push(GeoMarker {
            label: config
                .category_field()
                .map_or_else(|| format!("{:.3}, {:.3}", coord.lat, coord.lng), |field| row.text(field)),
            coord: Some(coord),
            position: projection.project(coord),
            radius: radius_between(value, low, high, tuning),
            value,
            color: palette_color(index, palette),
            placement: MarkerPlacement::Observed,
            polygon: Vec::new(),
        });
    }
    Ok(markers)
}

fn heat_markers(
    config: &ChartConfiguration,
    rows: &[DataRow],
    fields: Option<(&'static str, &'static str)>,
    projection: PlotProjection,
    tuning: &LayoutTuning,
) -> ChartResult<Vec<GeoMarker>> {
    let fields = fields.ok_or_else(missing_coordinates)?;
    let intensity_field = value_field(config);
    let max = rows
        .iter()
        .filter_map(|row| intensity_field.and_then(|field| row.number(field)))
        .fold(0.0, f64::max);

    let mut markers = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(coord) = row_coord(row, Some(fields)) else {
            continue;
        };
        let value = intensity_field.map(|field| row.number_or_zero(field));
        let intensity = match value {
            Some(value) if max > 0.0 => (value / max).clamp(0.0, 1.0),
            Some(_) => 0.0,
            None => 1.0,
        };
        let (min_radius, max_radius) = (tuning.geo_min_marker_radius, tuning.geo_max_marker_radius);
        markers.push(GeoMarker {
            label: format!("{:.0}%", intensity * 100.0),
            coord: Some(coord),
            position: projection.project(coord),
            radius: min_radius + intensity * (max_radius - min_radius),
            value: Some(intensity),
            color: heat_color(intensity).with_alpha(0.6),
            placement: MarkerPlacement::Observed,
            polygon: Vec::new(),
        });
    }
    Ok(markers)
}

fn region_markers(
    config: &ChartConfiguration,
    rows: &[DataRow],
    fields: Option<(&'static str, &'static str)>,
    projection: PlotProjection,
    tuning: &LayoutTuning,
) -> ChartResult<(Vec<GeoMarker>, ColorScale)> {
    let key_field = location_field(config, rows);
    if key_field.is_none() && fields.is_none() {
        return Err(ChartError::InvalidConfig(
            "choropleth needs a location field or coordinate fields".to_owned(),
        ));
    }
    let sum_field = value_field(config);

    struct Group {
        total: f64,
        coords: Vec<LatLng>,
    }
    let mut groups: IndexMap<String, Group> = IndexMap::new();
    for row in rows {
        let coord = row_coord(row, fields);
        let key = match (key_field, coord) {
            (Some(field), _) => row.text(field),
            (None, Some(coord)) => format!("{:.2}, {:.2}", coord.lat, coord.lng),
            (None, None) => continue,
        };
        let group = groups.entry(key).or_insert_with(|| Group {
            total: 0.0,
            coords: Vec::new(),
        });
        group.total += sum_field.map_or(1.0, |field| row.number_or_zero(field));
        group.coords.extend(coord);
    }

    let (low, high) = extent(groups.values().map(|group| group.total));
    let scale = ColorScale::new(config.color_scale, low, high);

    let regions = config.regions.as_ref();
    let mut ring_keys: Vec<&String> = groups
        .iter()
        .filter(|(key, group)| {
            group.coords.is_empty() && regions.is_none_or(|regions| !regions.contains_key(key.as_str()))
        })
        .map(|(key, _)| key)
        .collect();
    ring_keys.sort();
    if !ring_keys.is_empty() {
        warn!(regions = ring_keys.len(), "choropleth regions without boundaries or coordinates placed on a ring");
    }
    let plot = projection.plot;
    let ring_center = plot.center();
    let ring_radius = plot.width.min(plot.height) * 0.35;

    let markers = groups
        .iter()
        .map(|(key, group)| {
            let boundary = regions
                .and_then(|regions| regions.get(key.as_str()))
                .filter(|ring| ring.len() >= 3);
            let (coord, position, placement, outline) = if let Some(ring) = boundary {
                let outline: Vec<Point> = ring
                    .iter()
                    .map(|[lng, lat]| projection.project(LatLng::new(*lat, *lng)))
                    .collect();
                let centroid = mean_coord(ring.iter().map(|[lng, lat]| LatLng::new(*lat, *lng)));
                let position = Point::new(
                    outline.iter().map(|point| point.x).sum::<f64>() / outline.len() as f64,
                    outline.iter().map(|point| point.y).sum::<f64>() / outline.len() as f64,
                );
                (centroid, position, MarkerPlacement::RegionPolygon, outline)
            } else if let Some(coord) = mean_coord(group.coords.iter().copied()) {
                (Some(coord), projection.project(coord), MarkerPlacement::GroupMean, Vec::new())
            } else {
                let slot = ring_keys.iter().position(|ring_key| *ring_key == key).unwrap_or(0);
                let angle = slot as f64 / ring_keys.len().max(1) as f64 * TAU;
                let position = Point::new(
                    ring_center.x + ring_radius * angle.sin(),
                    ring_center.y - ring_radius * angle.cos(),
                );
                (None, position, MarkerPlacement::Ring, Vec::new())
            };
            GeoMarker {
                label: key.clone(),
                coord,
                position,
                radius: radius_between(Some(group.total), low, high, tuning),
                value: Some(group.total),
                color: scale.color(group.total),
                placement,
                polygon: outline,
            }
        })
        .collect();
    Ok((markers, scale))
}

pub fn append_geo_primitives(
    frame: &mut RenderFrame,
    geometry: &GeoGeometry,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
) {
    let plot = geometry.plot;
    frame.push_rect(
        CanvasLayerKind::Background,
        RectPrimitive::new(plot.x, plot.y, plot.width, plot.height, MAP_BACKGROUND)
            .with_border(1.0, MAP_BACKGROUND.lerp(Color::rgb(0.0, 0.0, 0.0), 0.15)),
    );

    for marker in &geometry.markers {
        let marker_tooltip = tooltip(config, || match marker.value {
            Some(value) => format!("{}: {}", marker.label, format_number(value)),
            None => marker.label.clone(),
        });
        if marker.polygon.is_empty() {
            let stroke = if geometry.kind == GeoKind::Heat { marker.color } else { WHITE };
            frame.push_circle(
                CanvasLayerKind::Series,
                CirclePrimitive::new(marker.position.x, marker.position.y, marker.radius, marker.color)
                    .with_stroke(1.0, stroke)
                    .with_tooltip(marker_tooltip),
            );
        } else {
            frame.push_path(
                CanvasLayerKind::Series,
                PathPrimitive::filled(polygon(&marker.polygon), marker.color)
                    .with_stroke(1.0, WHITE)
                    .with_tooltip(marker_tooltip),
            );
        }
    }

    match geometry.kind {
        GeoKind::Point => {}
        GeoKind::Heat => {
            let entries: Vec<LegendEntry> = (0..5)
                .map(|bucket| {
                    let low = bucket * 20;
                    LegendEntry::new(
                        format!("{low}–{}%", low + 20),
                        heat_color((f64::from(bucket) + 0.5) / 5.0),
                    )
                })
                .collect();
            push_legend(frame, config, tuning, &entries);
        }
        GeoKind::Choropleth => {
            if let (true, Some(scale)) = (config.legend, geometry.color_scale) {
                push_gradient_legend(frame, scale, tuning);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MarkerPlacement, compute_geo, coordinate_fields};
    use crate::config::{ChartConfiguration, ChartType, GeoKind, LayoutTuning};
    use crate::core::{Bounds, DataRow, LatLng};
    use indexmap::IndexMap;

    fn plot() -> Bounds {
        Bounds::new(0.0, 0.0, 600.0, 400.0)
    }

    #[test]
    fn coordinate_fields_follow_fallback_order() {
        let rows = vec![DataRow::new().with("y", 1.0).with("lat", 2.0).with("lon", 3.0).with("x", 4.0)];
        assert_eq!(coordinate_fields(&rows), Some(("lat", "x")));
    }

    #[test]
    fn point_radius_spans_configured_range() {
        let rows = vec![
            DataRow::new().with("lat", 10.0).with("lng", 10.0).with("v", 0.0),
            DataRow::new().with("lat", 20.0).with("lng", 20.0).with("v", 50.0),
            DataRow::new().with("lat", 30.0).with("lng", 30.0).with("v", 100.0),
            DataRow::new().with("lat", "?").with("lng", 30.0).with("v", 100.0),
        ];
        let mut config = ChartConfiguration::new(ChartType::MapPoint);
        config.value_field = Some("v".to_owned());
        let geometry =
            compute_geo(&config, &rows, GeoKind::Point, plot(), &LayoutTuning::default()).expect("geo");
        let radii: Vec<f64> = geometry.markers.iter().map(|marker| marker.radius).collect();
        assert_eq!(radii, vec![5.0, 15.0, 25.0]);
        assert_eq!(geometry.center, LatLng::new(20.0, 20.0));
    }

    #[test]
    fn heat_intensity_is_relative_to_max() {
        let rows = vec![
            DataRow::new().with("latitude", 1.0).with("longitude", 1.0).with("w", 2.0),
            DataRow::new().with("latitude", 1.0).with("longitude", 2.0).with("w", 8.0),
        ];
        let mut config = ChartConfiguration::new(ChartType::MapHeat);
        config.value_field = Some("w".to_owned());
        let geometry =
            compute_geo(&config, &rows, GeoKind::Heat, plot(), &LayoutTuning::default()).expect("geo");
        assert_eq!(geometry.markers[0].value, Some(0.25));
        assert_eq!(geometry.markers[1].radius, 25.0);
    }

    #[test]
    fn choropleth_uses_boundaries_then_means_then_ring() {
        let rows = vec![
            DataRow::new().with("region", "north").with("sales", 5.0),
            DataRow::new().with("region", "south").with("sales", 3.0),
            DataRow::new().with("region", "south").with("sales", 4.0),
            DataRow::new().with("region", "west").with("sales", 1.0).with("lat", 10.0).with("lng", 10.0),
        ];
        let mut config = ChartConfiguration::new(ChartType::MapChoropleth);
        config.value_field = Some("sales".to_owned());
        let mut regions = IndexMap::new();
        regions.insert(
            "north".to_owned(),
            vec![[0.0, 40.0], [10.0, 40.0], [10.0, 50.0], [0.0, 50.0]],
        );
        config.regions = Some(regions);
        let first =
            compute_geo(&config, &rows, GeoKind::Choropleth, plot(), &LayoutTuning::default()).expect("geo");
        let second =
            compute_geo(&config, &rows, GeoKind::Choropleth, plot(), &LayoutTuning::default()).expect("geo");
        assert_eq!(first, second);

        let placements: Vec<_> = first.markers.iter().map(|marker| marker.placement).collect();
        assert_eq!(
            placements,
            vec![MarkerPlacement::RegionPolygon, MarkerPlacement::Ring, MarkerPlacement::GroupMean]
        );
        assert_eq!(first.markers[1].value, Some(7.0));
        assert_eq!(first.markers[0].polygon.len(), 4);
    }
}
