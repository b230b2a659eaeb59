use crate::animation::interpolation::{EasingFunction, Interpolatable};
use crate::core::geo::CameraState;

/// An in-flight camera move between two states, timed in milliseconds on
/// whatever clock the surface keeps
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTransition {
    pub from: CameraState,
    pub to: CameraState,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub easing: EasingFunction,
}

impl CameraTransition {
    pub fn new(from: CameraState, to: CameraState, start_ms: u64, duration_ms: u64) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms,
            easing: EasingFunction::default(),
        }
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// Linear progress in `[0, 1]`
    pub fn progress(&self, now_ms: u64) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms);
        (elapsed as f64 / self.duration_ms as f64).min(1.0)
    }

    pub fn is_finished(&self, now_ms: u64) -> bool {
        self.progress(now_ms) >= 1.0
    }

    /// Camera state at `now_ms`
    pub fn sample(&self, now_ms: u64) -> CameraState {
        if self.is_finished(now_ms) {
            return self.to;
        }
        let t = self.easing.apply(self.progress(now_ms));
        self.from.lerp(&self.to, t)
    }
}
