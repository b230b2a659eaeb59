//! Configuration for the map controller
//!
//! Values mirror the one workflow the controller supports: a dark map that
//! starts over null island, flies to the viewer once located, and flies to the
//! antipode on command. Everything can be loaded from JSON; the access token is
//! usually supplied through the environment at process start.

use crate::{
    core::{constants, geo::LatLng},
    surface::image::ImageRef,
    MapError, Result,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Map-service access token. Checked by the rendering engine, not here.
    pub access_token: Option<String>,
    pub container: String,
    pub style: String,
    pub initial_center: LatLng,
    pub initial_zoom: f64,
    pub attribution_control: bool,
    pub locate: LocateConfig,
    pub antipode: AntipodeFlightConfig,
    pub markers: MarkerConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            container: constants::DEFAULT_CONTAINER.to_string(),
            style: constants::DEFAULT_STYLE.to_string(),
            initial_center: LatLng::default(),
            initial_zoom: constants::INITIAL_ZOOM,
            attribution_control: false,
            locate: LocateConfig::default(),
            antipode: AntipodeFlightConfig::default(),
            markers: MarkerConfig::default(),
        }
    }
}

impl MapConfig {
    /// Default configuration with the access token taken from the environment
    pub fn from_env() -> Self {
        Self {
            access_token: token_from(std::env::var(constants::ACCESS_TOKEN_ENV).ok()),
            ..Default::default()
        }
    }

    /// Parses a JSON document; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Checks the camera and marker values. The token is left to the engine.
    pub fn validate(&self) -> Result<()> {
        if !self.initial_center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "initial center {} is out of range",
                self.initial_center
            )));
        }

        for (name, zoom) in [
            ("initial_zoom", self.initial_zoom),
            ("locate.zoom", self.locate.zoom),
            ("antipode.zoom", self.antipode.zoom),
        ] {
            if !zoom.is_finite() || zoom < 0.0 {
                return Err(MapError::Config(format!("{} must be >= 0, got {}", name, zoom)));
            }
        }

        if self.markers.icon_size.is_nan() || self.markers.icon_size <= 0.0 {
            return Err(MapError::Config(format!(
                "markers.icon_size must be positive, got {}",
                self.markers.icon_size
            )));
        }

        Ok(())
    }
}

/// Blank values count as unset
fn token_from(value: Option<String>) -> Option<String> {
    value
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Camera move performed once the viewer's position is known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateConfig {
    pub zoom: f64,
    /// Fly there when true, jump there when false.
    pub animate: bool,
    /// `None` leaves the flight duration to the engine.
    pub duration_ms: Option<u64>,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            zoom: constants::LOCATED_ZOOM,
            animate: true,
            duration_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntipodeFlightConfig {
    pub zoom: f64,
    pub duration_ms: u64,
}

impl Default for AntipodeFlightConfig {
    fn default() -> Self {
        Self {
            zoom: constants::ANTIPODE_ZOOM,
            duration_ms: constants::ANTIPODE_FLIGHT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub origin_image: ImageRef,
    pub destination_image: ImageRef,
    pub icon_size: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            origin_image: ImageRef::path(constants::ORIGIN_IMAGE),
            destination_image: ImageRef::path(constants::DESTINATION_IMAGE),
            icon_size: constants::MARKER_ICON_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_tokens_are_unset() {
        assert_eq!(token_from(None), None);
        assert_eq!(token_from(Some(String::new())), None);
        assert_eq!(token_from(Some(" \t\n".to_string())), None);
        assert_eq!(
            token_from(Some(" pk.abc \n".to_string())),
            Some("pk.abc".to_string())
        );
    }

    #[test]
    fn test_from_env_reads_token() {
        std::env::set_var(constants::ACCESS_TOKEN_ENV, "pk.from-env");
        assert_eq!(MapConfig::from_env().access_token.as_deref(), Some("pk.from-env"));

        std::env::set_var(constants::ACCESS_TOKEN_ENV, "   ");
        let config = MapConfig::from_env();
        assert_eq!(config.access_token, None);
        assert_eq!(config, MapConfig::default());

        std::env::remove_var(constants::ACCESS_TOKEN_ENV);
        assert_eq!(MapConfig::from_env().access_token, None);
    }

    #[test]
    fn test_config_with_embedded_markers_round_trips() {
        let mut config = MapConfig::default().with_access_token("pk.json");
        config.markers.origin_image = ImageRef::embedded(
            crate::surface::image::solid_png(2, [255, 140, 0, 255]).unwrap(),
        );

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(MapConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_defaults_match_workflow() {
        let config = MapConfig::default();
        assert_eq!(config.initial_center, LatLng::new(0.0, 0.0));
        assert_eq!(config.initial_zoom, 3.0);
        assert!(!config.attribution_control);
        assert_eq!(config.locate.zoom, 10.0);
        assert_eq!(config.antipode.zoom, 4.0);
        assert_eq!(config.antipode.duration_ms, 4000);
        assert_eq!(config.markers.icon_size, 0.2);
        assert_eq!(config.style, "mapbox://styles/mapbox/dark-v11");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MapConfig::from_json_str(
            r#"{ "access_token": "pk.test", "antipode": { "duration_ms": 1500 } }"#,
        )
        .unwrap();

        assert_eq!(config.access_token.as_deref(), Some("pk.test"));
        assert_eq!(config.antipode.duration_ms, 1500);
        assert_eq!(config.antipode.zoom, 4.0);
        assert_eq!(config.locate, LocateConfig::default());
    }

    #[test]
    fn test_rejects_negative_zoom() {
        let result = MapConfig::from_json_str(r#"{ "locate": { "zoom": -1.0 } }"#);
        assert!(matches!(result, Err(MapError::Config(_))));
    }

    #[test]
    fn test_rejects_out_of_range_center() {
        let result =
            MapConfig::from_json_str(r#"{ "initial_center": { "lat": 95.0, "lng": 0.0 } }"#);
        assert!(matches!(result, Err(MapError::InvalidCoordinates(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = MapConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(MapError::Serialization(_))));
    }
}
