//! Typed GeoJSON payloads handed to the rendering engine
//!
//! Only the shape the marker workflow needs is modelled: a `geojson` source
//! holding a FeatureCollection with exactly one Point feature. Positions are
//! `[lng, lat]` as GeoJSON requires.

use crate::{core::geo::LatLng, MapError, Result};
use serde::{Deserialize, Serialize};

/// GeoJSON geometry. Markers only ever need points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point { coordinates: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct GeoJsonFeature {
    pub geometry: GeoJsonGeometry,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<GeoJsonFeature>,
}

/// A `geojson` source with a single point feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "geojson")]
pub struct GeoJsonPointSource {
    data: FeatureCollection,
}

impl GeoJsonPointSource {
    /// Creates a source for `point`, rejecting coordinates outside the globe
    pub fn new(point: LatLng) -> Result<Self> {
        if !point.lat.is_finite() || !point.lng.is_finite() || !point.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "marker position {} is out of range",
                point
            )));
        }

        Ok(Self {
            data: FeatureCollection {
                features: vec![GeoJsonFeature {
                    geometry: GeoJsonGeometry::Point {
                        coordinates: point.to_position(),
                    },
                    properties: serde_json::Map::new(),
                }],
            },
        })
    }

    /// Validates a loosely-typed payload at the engine boundary
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let source: GeoJsonPointSource = serde_json::from_value(value)?;
        match source.data.features.as_slice() {
            [feature] => {
                let GeoJsonGeometry::Point { coordinates } = feature.geometry;
                Self::new(LatLng::from_position(coordinates))
            }
            features => Err(MapError::ParseError(format!(
                "point source needs exactly one feature, found {}",
                features.len()
            ))),
        }
    }

    /// The marker position
    pub fn point(&self) -> LatLng {
        self.data
            .features
            .first()
            .map(|feature| {
                let GeoJsonGeometry::Point { coordinates } = feature.geometry;
                LatLng::from_position(coordinates)
            })
            .unwrap_or_default()
    }

    pub fn data(&self) -> &FeatureCollection {
        &self.data
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
