// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Geographic points and great-circle distance.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both coordinates are finite and within their ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Haversine distance to `other`, in meters.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_M * c
    }

    /// Latitude/longitude box that contains every point within `radius_m`.
    ///
    /// Used as a cheap prefilter before the exact distance check. Near the
    /// poles the longitude span widens to the full range. A box crossing the
    /// antimeridian has `min_longitude > max_longitude`.
    pub fn bounding_box(&self, radius_m: f64) -> BoundingBox {
        let lat_delta = (radius_m / EARTH_RADIUS_M).to_degrees();
        let cos_lat = self.latitude.to_radians().cos();
        let lon_delta = if cos_lat.abs() < 1e-9 {
            180.0
        } else {
            (lat_delta / cos_lat).abs()
        };
        let (min_longitude, max_longitude) = if lon_delta >= 180.0 {
            (-180.0, 180.0)
        } else {
            (
                wrap_longitude(self.longitude - lon_delta),
                wrap_longitude(self.longitude + lon_delta),
            )
        };
        BoundingBox {
            min_latitude: (self.latitude - lat_delta).max(-90.0),
            max_latitude: (self.latitude + lat_delta).min(90.0),
            min_longitude,
            max_longitude,
        }
    }
}

fn wrap_longitude(longitude: f64) -> f64 {
    if longitude < -180.0 {
        longitude + 360.0
    } else if longitude > 180.0 {
        longitude - 360.0
    } else {
        longitude
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5},{:.5}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&point.latitude)
            && self
                .longitude_ranges()
                .iter()
                .any(|(min, max)| (*min..=*max).contains(&point.longitude))
    }

    /// The longitude span as two inclusive ranges. They are equal unless
    /// the box crosses the antimeridian.
    pub fn longitude_ranges(&self) -> [(f64, f64); 2] {
        if self.min_longitude <= self.max_longitude {
            let range = (self.min_longitude, self.max_longitude);
            [range, range]
        } else {
            [(self.min_longitude, 180.0), (-180.0, self.max_longitude)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_between_cities() {
        // Mumbai to Delhi is roughly 1150 km.
        let mumbai = GeoPoint::new(19.0760, 72.8777);
        let delhi = GeoPoint::new(28.6139, 77.2090);
        let dist = mumbai.distance_m(&delhi);
        assert!(dist > 1_100_000.0 && dist < 1_200_000.0, "got {dist}");
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(-1.2921, 36.8219);
        assert!(p.distance_m(&p) < 1e-6);
    }

    #[test]
    fn validity_checks_ranges() {
        assert!(GeoPoint::new(0.0, 0.0).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn bounding_box_contains_points_within_radius() {
        let center = GeoPoint::new(-1.2921, 36.8219);
        let bbox = center.bounding_box(5_000.0);
        let near = GeoPoint::new(-1.30, 36.83);
        assert!(center.distance_m(&near) < 5_000.0);
        assert!(bbox.contains(&near));

        let far = GeoPoint::new(-1.40, 36.82);
        assert!(!bbox.contains(&far));
    }

    #[test]
    fn bounding_box_wraps_across_antimeridian() {
        let east = GeoPoint::new(-17.0, 179.99);
        let west = GeoPoint::new(-17.0, -179.99);
        assert!(east.distance_m(&west) < 5_000.0);

        let bbox = east.bounding_box(5_000.0);
        assert!(bbox.min_longitude > bbox.max_longitude);
        assert!(bbox.contains(&west));
        assert!(bbox.contains(&east));
        assert!(!bbox.contains(&GeoPoint::new(-17.0, 0.0)));
        assert!(west.bounding_box(5_000.0).contains(&east));
    }

    #[test]
    fn polar_bounding_box_spans_all_longitudes() {
        let bbox = GeoPoint::new(90.0, 10.0).bounding_box(1_000.0);
        assert_eq!(bbox.longitude_ranges(), [(-180.0, 180.0); 2]);
    }
}
