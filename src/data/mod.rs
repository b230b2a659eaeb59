pub mod geojson;

pub use geojson::{FeatureCollection, GeoJsonFeature, GeoJsonGeometry, GeoJsonPointSource};
