//! Prelude module for common antipode types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use antipode::prelude::*;`

pub use crate::core::{
    antipode::antipode,
    config::{AntipodeFlightConfig, LocateConfig, MapConfig, MarkerConfig},
    geo::{CameraState, LatLng},
    map::{LifecycleState, MapController},
};

pub use crate::data::geojson::GeoJsonPointSource;

pub use crate::geolocation::{
    DeferredPosition, FailedPosition, FixedPosition, GeolocationError, GeolocationProvider,
    IpGeolocation, PositionSender,
};

pub use crate::input::events::{Command, MapEvent};

pub use crate::layers::{
    marker::{MarkerId, MarkerRegistry, MarkerSpec},
    symbol::SymbolLayerSpec,
};

pub use crate::runtime::{Session, SessionOutcome};

pub use crate::surface::{
    headless::{HeadlessSurface, HeadlessSurfaceFactory},
    image::{DecodedImage, ImageLoadError, ImageRef},
    FlyToOptions, InitializationError, MapSurface, SurfaceFactory, SurfaceOptions,
};

pub use crate::{Error as MapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::future::LocalBoxFuture;
