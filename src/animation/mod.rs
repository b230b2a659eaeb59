pub mod interpolation;
pub mod transitions;

// Re-export commonly used types and functions for convenience
pub use interpolation::{EasingFunction, Interpolatable};
pub use transitions::CameraTransition;
