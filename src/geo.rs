use serde::{Deserialize, Serialize};

/// A WGS84 coordinate as delivered by Overpass (`{"lat": .., "lon": ..}`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    #[inline(always)]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Format a coordinate the way the poster prints it: `48.8566° N / 2.3522° E`
pub fn format_coordinates(center: LatLon) -> String {
    let ns = if center.lat >= 0.0 { 'N' } else { 'S' };
    let ew = if center.lon >= 0.0 { 'E' } else { 'W' };
    format!(
        "{:.4}° {} / {:.4}° {}",
        center.lat.abs(),
        ns,
        center.lon.abs(),
        ew
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_north_east() {
        assert_eq!(
            format_coordinates(LatLon::new(48.8566, 2.3522)),
            "48.8566° N / 2.3522° E"
        );
    }

    #[test]
    fn test_format_south_west() {
        assert_eq!(
            format_coordinates(LatLon::new(-33.86882, -151.20929)),
            "33.8688° S / 151.2093° W"
        );
    }

    #[test]
    fn test_null_coord_deserializes_as_none() {
        let pts: Vec<Option<LatLon>> =
            serde_json::from_str(r#"[null, {"lat": 1.0, "lon": 1.0}]"#).unwrap();
        assert_eq!(pts, vec![None, Some(LatLon::new(1.0, 1.0))]);
    }
}
