use crate::core::geo::{CameraState, LatLng};

/// Interpolation trait for values that can be smoothly transitioned
pub trait Interpolatable {
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Interpolatable for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Interpolatable for LatLng {
    /// Longitude travels the short way round, across the antimeridian if needed
    fn lerp(&self, other: &Self, t: f64) -> Self {
        let delta_lng = LatLng::wrap_lng(other.lng - self.lng);
        LatLng::new(
            self.lat.lerp(&other.lat, t),
            LatLng::wrap_lng(self.lng + delta_lng * t),
        )
    }
}

impl Interpolatable for CameraState {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        CameraState::new(
            self.center.lerp(&other.center, t),
            self.zoom.lerp(&other.zoom, t),
        )
    }
}

/// Easing functions for camera flights
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EasingFunction {
    Linear,
    #[default]
    EaseInOutQuad,
}

impl EasingFunction {
    /// Apply the easing function to a normalized time value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [EasingFunction::Linear, EasingFunction::EaseInOutQuad] {
            assert!(easing.apply(0.0).abs() < 1e-12, "{:?}", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12, "{:?}", easing);
            assert!((easing.apply(2.0) - 1.0).abs() < 1e-12, "{:?}", easing);
        }
    }

    #[test]
    fn test_lat_lng_lerp_crosses_antimeridian() {
        let start = LatLng::new(0.0, 170.0);
        let end = LatLng::new(10.0, -170.0);
        let mid = start.lerp(&end, 0.5);

        assert!((mid.lat - 5.0).abs() < 1e-9);
        assert!((mid.lng.abs() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_camera_lerp() {
        let start = CameraState::new(LatLng::new(0.0, 0.0), 3.0);
        let end = CameraState::new(LatLng::new(20.0, 40.0), 5.0);
        let quarter = start.lerp(&end, 0.25);

        assert_eq!(quarter.center, LatLng::new(5.0, 10.0));
        assert_eq!(quarter.zoom, 3.5);
    }
}
