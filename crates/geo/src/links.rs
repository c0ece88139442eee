//! Google Maps links for mission routes.

use autoparc_core::Coordinates;

const MAPS_BASE: &str = "https://www.google.com/maps";

/// Directions link when both ends are known, a place link when only the
/// destination is, nothing otherwise.
pub fn maps_link(origin: Option<Coordinates>, destination: Option<Coordinates>) -> Option<String> {
    match (origin, destination) {
        (Some(o), Some(d)) => Some(format!("{MAPS_BASE}/dir/{o}/{d}")),
        (None, Some(d)) => Some(format!("{MAPS_BASE}/place/{d}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_shapes() {
        let o = Coordinates::new(34.0371, -4.9979);
        let d = Coordinates::new(33.9716, -6.8498);
        assert_eq!(
            maps_link(Some(o), Some(d)).as_deref(),
            Some("https://www.google.com/maps/dir/34.0371,-4.9979/33.9716,-6.8498")
        );
        assert_eq!(
            maps_link(None, Some(d)).as_deref(),
            Some("https://www.google.com/maps/place/33.9716,-6.8498")
        );
        assert_eq!(maps_link(Some(o), None), None);
    }
}
