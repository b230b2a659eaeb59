//! Workflow constants shared by the controller, its configuration and the headless surface.

/// Zoom the surface is constructed with, centered on null island.
pub const INITIAL_ZOOM: f64 = 3.0;

/// Zoom after the camera has moved to the viewer's position.
pub const LOCATED_ZOOM: f64 = 10.0;

/// Zoom at the end of an antipode flight.
pub const ANTIPODE_ZOOM: f64 = 4.0;

/// Duration of the antipode flight in milliseconds.
pub const ANTIPODE_FLIGHT_MS: u64 = 4000;

/// Engine default for `fly_to` when no duration is supplied.
pub const DEFAULT_FLIGHT_MS: u64 = 2000;

/// Style reference handed to the rendering engine.
pub const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/dark-v11";

/// Display region the surface binds to.
pub const DEFAULT_CONTAINER: &str = "map";

/// Scale applied to marker icons.
pub const MARKER_ICON_SIZE: f64 = 0.2;

/// Environment variable carrying the map-service access token.
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// Prefixes of well-formed map-service access tokens (public / secret).
pub const ACCESS_TOKEN_PREFIXES: [&str; 2] = ["pk.", "sk."];

pub const ORIGIN_IMAGE: &str = "assets/cat-1.png";
pub const DESTINATION_IMAGE: &str = "assets/cat-2.png";
