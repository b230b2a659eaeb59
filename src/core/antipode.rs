//! The point on the opposite side of the globe.

use crate::core::geo::LatLng;

/// Returns the antipodal coordinate of `lat_lng`.
///
/// Latitude is mirrored through the equator and longitude is shifted by half a
/// turn toward the canonical `[-180, 180]` range. Longitudes outside that range
/// are wrapped first, so the function is total. A point on the prime meridian
/// maps to `180`.
pub fn antipode(lat_lng: LatLng) -> LatLng {
    let lng = LatLng::wrap_lng(lat_lng.lng);
    let antipode_lng = if lng > 0.0 { lng - 180.0 } else { lng + 180.0 };
    LatLng::new(-lat_lng.lat, antipode_lng)
}

impl LatLng {
    /// See [`antipode`].
    pub fn antipode(&self) -> LatLng {
        antipode(*self)
    }

    /// Whether two coordinates name the same place, treating the `-180` and
    /// `180` meridians as one.
    pub fn approx_eq(&self, other: &LatLng, tolerance: f64) -> bool {
        let lat_close = (self.lat - other.lat).abs() <= tolerance;
        let delta_lng = (self.lng - other.lng).abs() % 360.0;
        lat_close && delta_lng.min(360.0 - delta_lng) <= tolerance
    }
}
