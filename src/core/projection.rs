use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::core::{Point, Viewport};

/// Pixel size of one Web-Mercator tile at zoom 0.
pub const TILE_SIZE: f64 = 256.0;
/// Latitude limit of the square Web-Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "lon", alias = "longitude")]
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Web-Mercator projection centered on `center` at fractional `zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MercatorProjection {
    center: LatLng,
    zoom: f64,
    viewport: Viewport,
}

impl MercatorProjection {
    #[must_use]
    pub fn new(center: LatLng, zoom: f64, viewport: Viewport) -> Self {
        let zoom = if zoom.is_finite() {
            zoom.clamp(0.0, 22.0)
        } else {
            0.0
        };
        Self {
            center,
            zoom,
            viewport,
        }
    }

    #[must_use]
    pub fn center(self) -> LatLng {
        self.center
    }

    #[must_use]
    pub fn zoom(self) -> f64 {
        self.zoom
    }

    fn world_size(self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    fn world_point(self, coord: LatLng) -> Point {
        let size = self.world_size();
        let lat = coord.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (coord.lng + 180.0) / 360.0 * size;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
        Point::new(x, y)
    }

    /// Projects a coordinate into viewport pixels; the center lands mid-viewport.
    #[must_use]
    pub fn project(self, coord: LatLng) -> Point {
        let origin = self.world_point(self.center);
        let point = self.world_point(coord);
        Point::new(
            point.x - origin.x + f64::from(self.viewport.width) / 2.0,
            point.y - origin.y + f64::from(self.viewport.height) / 2.0,
        )
    }
}
