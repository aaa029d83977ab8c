//! Region bounding box.

use burglary_map_incident_models::Coordinates;
use serde::Deserialize;

/// An axis-aligned latitude/longitude box, inclusive on all edges.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Returns `true` if `coords` lies inside (or on the edge of) the box.
    #[must_use]
    pub fn contains(&self, coords: Coordinates) -> bool {
        (self.lat_min..=self.lat_max).contains(&coords.latitude)
            && (self.lon_min..=self.lon_max).contains(&coords.longitude)
    }

    /// Center of the box, used as a focus point by providers without
    /// viewbox support.
    #[must_use]
    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            f64::midpoint(self.lat_min, self.lat_max),
            f64::midpoint(self.lon_min, self.lon_max),
        )
    }

    /// Nominatim `viewbox` parameter: `lon_min,lat_min,lon_max,lat_max`.
    #[must_use]
    pub fn viewbox_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.lon_min, self.lat_min, self.lon_max, self.lat_max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EAST_JUTLAND: BoundingBox = BoundingBox::new(55.8, 56.6, 9.5, 11.0);

    #[test]
    fn contains_inside_and_edges() {
        assert!(EAST_JUTLAND.contains(Coordinates::new(56.15, 10.2)));
        assert!(EAST_JUTLAND.contains(Coordinates::new(55.8, 9.5)));
        assert!(EAST_JUTLAND.contains(Coordinates::new(56.6, 11.0)));
    }

    #[test]
    fn rejects_outside() {
        // Copenhagen
        assert!(!EAST_JUTLAND.contains(Coordinates::new(55.68, 12.57)));
        assert!(!EAST_JUTLAND.contains(Coordinates::new(57.0, 10.0)));
    }

    #[test]
    fn viewbox_is_lon_lat_order() {
        assert_eq!(EAST_JUTLAND.viewbox_param(), "9.5,55.8,11,56.6");
    }

    #[test]
    fn center_is_midpoint() {
        let c = EAST_JUTLAND.center();
        assert!((c.latitude - 56.2).abs() < 1e-9);
        assert!((c.longitude - 10.25).abs() < 1e-9);
    }
}
