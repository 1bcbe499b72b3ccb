use glam::{DVec2, Vec2};
use std::f64::consts::PI;

use crate::error::ViewportError;
use crate::geo::LatLon;

/// Spherical Web Mercator earth radius (EPSG:3857)
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit where Web Mercator stays finite
pub const MAX_LAT: f64 = 85.051_128_78;

/// Project lat/lon to Web Mercator meters. Latitude is clamped to ±[`MAX_LAT`].
#[inline(always)]
pub fn project(lat: f64, lon: f64) -> DVec2 {
    let safe_lat = lat.clamp(-MAX_LAT, MAX_LAT);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + safe_lat.to_radians() / 2.0).tan().ln();
    DVec2::new(x, y)
}

/// Inverse of [`project`], returns (lat, lon)
pub fn unproject(p: DVec2) -> LatLon {
    let lon = (p.x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (p.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    LatLon::new(lat, lon)
}

/// The area of the world a poster shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LatLon,
    /// Horizontal half-extent in ground meters
    pub radius_m: f64,
    /// Output pixel width
    pub width: u32,
    /// Output pixel height
    pub height: u32,
}

impl Viewport {
    pub fn new(center: LatLon, radius_m: f64, width: u32, height: u32) -> Self {
        Self {
            center,
            radius_m,
            width,
            height,
        }
    }

    /// 1/cos(lat), compensates Mercator stretching away from the equator
    pub fn scale_correction(&self) -> f64 {
        1.0 / self.center.lat.clamp(-MAX_LAT, MAX_LAT).to_radians().cos()
    }

    /// Fit the viewport to the output canvas.
    ///
    /// Rejects degenerate input before anything is projected.
    pub fn fit(&self) -> Result<ViewportTransform, ViewportError> {
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(ViewportError::DegenerateRadius(self.radius_m));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ViewportError::EmptyCanvas {
                width: self.width,
                height: self.height,
            });
        }
        if !self.center.is_finite() {
            return Err(ViewportError::InvalidCenter {
                lat: self.center.lat,
                lon: self.center.lon,
            });
        }

        let center = project(self.center.lat, self.center.lon);
        let width = self.width as f64;
        let height = self.height as f64;

        let radius_x = self.radius_m * self.scale_correction();
        let radius_y = radius_x * height / width;

        // Fill the output width exactly
        let scale = width / (2.0 * radius_x);
        let offset_x = (width - 2.0 * radius_x * scale) / 2.0;
        let offset_y = (height - 2.0 * radius_y * scale) / 2.0;

        Ok(ViewportTransform {
            min_x: center.x - radius_x,
            min_y: center.y - radius_y,
            scale,
            offset_x,
            offset_y,
            height,
        })
    }
}

/// Projected meters to canvas pixels for one fitted viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub min_x: f64,
    pub min_y: f64,
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    height: f64,
}

impl ViewportTransform {
    /// Map projected meters to pixels. Pixel Y grows downward, Mercator Y grows north.
    #[inline(always)]
    pub fn meters_to_canvas(&self, p: DVec2) -> Vec2 {
        let x = (p.x - self.min_x) * self.scale + self.offset_x;
        let y = self.height - ((p.y - self.min_y) * self.scale + self.offset_y);
        Vec2::new(x as f32, y as f32)
    }

    #[inline(always)]
    pub fn to_canvas(&self, lat: f64, lon: f64) -> Vec2 {
        self.meters_to_canvas(project(lat, lon))
    }

    /// Pixel back to projected meters (used to locate viewport corners)
    pub fn canvas_to_meters(&self, px: f64, py: f64) -> DVec2 {
        let x = (px - self.offset_x) / self.scale + self.min_x;
        let y = (self.height - py - self.offset_y) / self.scale + self.min_y;
        DVec2::new(x, y)
    }
}
