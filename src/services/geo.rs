//! Great-circle distance math shared by every search path. One formula, one
//! internal unit (kilometres); miles are derived by conversion at the
//! boundary, never by a second Earth-radius constant.

use serde::Serialize;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const KM_PER_MILE: f64 = 1.60934;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Km,
    Miles,
}

impl DistanceUnit {
    pub fn from_km(self, km: f64) -> f64 {
        match self {
            Self::Km => km,
            Self::Miles => km_to_miles(km),
        }
    }

    pub fn to_km(self, value: f64) -> f64 {
        match self {
            Self::Km => value,
            Self::Miles => miles_to_km(value),
        }
    }
}

pub fn miles_to_km(miles: f64) -> f64 {
    miles * KM_PER_MILE
}

pub fn km_to_miles(km: f64) -> f64 {
    km / KM_PER_MILE
}

pub fn in_range(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}

pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let to_rad = |deg: f64| deg.to_radians();
    let dlat = to_rad(lat2 - lat1);
    let dlon = to_rad(lon2 - lon1);
    let a = (dlat / 2.0).sin().powi(2)
        + to_rad(lat1).cos() * to_rad(lat2).cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

pub fn distance(a: Coordinates, b: Coordinates, unit: DistanceUnit) -> f64 {
    unit.from_km(haversine_km(a.latitude, a.longitude, b.latitude, b.longitude))
}

/// Coarse lat/lon window for the SQL prefilter; slightly generous near the
/// poles but never excludes a point inside the radius.
pub fn bounding_box(lat: f64, lon: f64, radius_km: f64) -> (f64, f64, f64, f64) {
    let lat_change = radius_km / 111.0;
    let lat_rad = lat.to_radians();
    let lon_change = (radius_km / 111.0) / lat_rad.cos().abs().max(0.01);

    (
        lat - lat_change,
        lat + lat_change,
        lon - lon_change,
        lon + lon_change,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELHI: Coordinates = Coordinates {
        latitude: 28.6139,
        longitude: 77.209,
    };
    const MUMBAI: Coordinates = Coordinates {
        latitude: 19.076,
        longitude: 72.8777,
    };
    const RANCHI: Coordinates = Coordinates {
        latitude: 23.3441,
        longitude: 85.3096,
    };

    #[test]
    fn distance_is_symmetric() {
        let ab = distance(DELHI, MUMBAI, DistanceUnit::Km);
        let ba = distance(MUMBAI, DELHI, DistanceUnit::Km);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn identical_points_are_zero_apart() {
        assert_eq!(distance(DELHI, DELHI, DistanceUnit::Km), 0.0);
    }

    #[test]
    fn delhi_mumbai_is_about_1150_km() {
        let d = distance(DELHI, MUMBAI, DistanceUnit::Km);
        assert!((1100.0..1200.0).contains(&d), "got {}", d);
    }

    #[test]
    fn distance_grows_with_separation() {
        let near = distance(DELHI, RANCHI, DistanceUnit::Km);
        let far = distance(DELHI, MUMBAI, DistanceUnit::Km);
        assert!(near < far);
    }

    #[test]
    fn miles_are_derived_from_km_by_conversion() {
        let km = distance(DELHI, MUMBAI, DistanceUnit::Km);
        let mi = distance(DELHI, MUMBAI, DistanceUnit::Miles);
        assert!((mi * KM_PER_MILE - km).abs() < 1e-6);
    }

    #[test]
    fn range_check_rejects_bad_coordinates() {
        assert!(in_range(0.0, 0.0));
        assert!(in_range(-90.0, 180.0));
        assert!(!in_range(90.1, 0.0));
        assert!(!in_range(0.0, -180.5));
        assert!(!in_range(f64::NAN, 0.0));
    }

    #[test]
    fn bounding_box_contains_points_inside_the_radius() {
        let (min_lat, max_lat, min_lon, max_lon) = bounding_box(23.3441, 85.3096, 30.0);
        assert!(min_lat < 23.3441 && 23.3441 < max_lat);
        assert!(min_lon < 85.3096 && 85.3096 < max_lon);
        assert!(max_lat - min_lat < 1.0);
        assert!(max_lon - min_lon < 1.2);
    }
}
