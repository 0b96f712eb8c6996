//! Great-circle distance.

use crate::domain::GeoPoint;

/// Mean Earth radius used for all proximity decisions.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points, in kilometres.
///
/// Symmetric bit-for-bit: the latitude/longitude deltas only appear squared
/// and the cosine product commutes.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        let p = GeoPoint::new(-33.8688, 151.2093);
        assert_eq!(haversine_km(&p, &p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (GeoPoint::new(-33.8688, 151.2093), GeoPoint::new(-35.2809, 149.13)),
            (GeoPoint::new(0.0, 179.9), GeoPoint::new(0.0, -179.9)),
            (GeoPoint::new(51.5, -0.12), GeoPoint::new(-33.9, 18.4)),
        ];
        for (a, b) in pairs {
            assert_eq!(haversine_km(&a, &b), haversine_km(&b, &a));
        }
    }

    #[test]
    fn sydney_to_canberra_is_about_247_km() {
        let sydney = GeoPoint::new(-33.8688, 151.2093);
        let canberra = GeoPoint::new(-35.2809, 149.1300);
        let d = haversine_km(&sydney, &canberra);
        assert!((d - 247.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((haversine_km(&a, &b) - expected).abs() < 1e-9);
    }
}
