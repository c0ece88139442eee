//! Great-circle distance.

use autoparc_core::{round_km, Coordinates};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Straight-line distance between two points in kilometres, rounded to two
/// decimals.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    round_km(EARTH_RADIUS_KM * c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fes_to_rabat() {
        let fes = Coordinates::new(34.0371, -4.9979);
        let rabat = Coordinates::new(33.9716, -6.8498);
        let d = haversine_km(fes, rabat);
        assert!((d - 170.86).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_same_point_is_zero() {
        let p = Coordinates::new(33.5731, -7.5898);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinates::new(48.8566, 2.3522);
        let b = Coordinates::new(51.5074, -0.1278);
        assert_eq!(haversine_km(a, b), haversine_km(b, a));
        assert!((haversine_km(a, b) - 343.56).abs() < 0.5);
    }
}
