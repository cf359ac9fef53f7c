//! Great-circle distance helpers

use crate::models::GeoPoint;

/// Mean Earth radius used for all distance calculations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points, in kilometres.
#[must_use]
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARIS: GeoPoint = GeoPoint::new(48.8566, 2.3522);
    const LYON: GeoPoint = GeoPoint::new(45.7640, 4.8357);

    #[test]
    fn test_distance_to_self_is_zero() {
        assert!(haversine_km(PARIS, PARIS).abs() < f64::EPSILON);
        assert!(haversine_km(GeoPoint::default(), GeoPoint::default()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let there = haversine_km(PARIS, LYON);
        let back = haversine_km(LYON, PARIS);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        // Paris to Lyon is roughly 392 km as the crow flies.
        let distance = haversine_km(PARIS, LYON);
        assert!((distance - 392.0).abs() < 5.0, "got {distance}");
    }

    #[test]
    fn test_antipodal_distance_is_half_circumference() {
        let distance = haversine_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((distance - half).abs() < 1e-6);
    }
}
