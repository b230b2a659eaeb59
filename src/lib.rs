//! # Antipode
//!
//! Locates the viewer on a map, marks their position, and on command flies the
//! camera to the other side of the globe and marks that point too.
//!
//! The crate owns the controller logic only. The rendering engine and the
//! geolocation service are reached through the [`MapSurface`] and
//! [`GeolocationProvider`] traits; [`surface::headless`] provides an in-memory
//! engine for tests and headless runs.

pub mod animation;
pub mod core;
pub mod data;
pub mod geolocation;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod runtime;
pub mod surface;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    antipode::antipode,
    config::MapConfig,
    geo::{CameraState, LatLng},
    map::{LifecycleState, MapController},
};

pub use data::geojson::GeoJsonPointSource;

pub use geolocation::{GeolocationError, GeolocationProvider};

pub use input::events::{Command, MapEvent};

pub use layers::{
    marker::{MarkerId, MarkerRegistry, MarkerSpec},
    symbol::SymbolLayerSpec,
};

pub use runtime::{Session, SessionOutcome};

pub use surface::{
    image::{DecodedImage, ImageLoadError, ImageRef},
    FlyToOptions, InitializationError, MapSurface, SurfaceFactory, SurfaceOptions,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Initialization error: {0}")]
    Initialization(#[from] InitializationError),

    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeolocationError),

    #[error("Image load error: {0}")]
    ImageLoad(#[from] ImageLoadError),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;
