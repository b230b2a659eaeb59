use crate::{
    core::geo::LatLng,
    data::geojson::GeoJsonPointSource,
    layers::symbol::SymbolLayerSpec,
    prelude::HashMap,
    surface::{image::ImageRef, MapSurface},
    Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two markers of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerId {
    /// Where the viewer is
    Origin,
    /// The antipode the camera last flew to
    Destination,
}

impl MarkerId {
    pub const ALL: [MarkerId; 2] = [MarkerId::Origin, MarkerId::Destination];

    /// Id of the point source backing the marker
    pub fn source_id(&self) -> &'static str {
        match self {
            MarkerId::Origin => "originSource",
            MarkerId::Destination => "destSource",
        }
    }

    /// Id of the symbol layer, shared with the registered image
    pub fn layer_id(&self) -> &'static str {
        match self {
            MarkerId::Origin => "originPoint",
            MarkerId::Destination => "destPoint",
        }
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerId::Origin => write!(f, "origin"),
            MarkerId::Destination => write!(f, "destination"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub id: MarkerId,
    pub image: ImageRef,
    pub position: LatLng,
}

impl MarkerSpec {
    pub fn new(id: MarkerId, image: ImageRef, position: LatLng) -> Self {
        Self {
            id,
            image,
            position,
        }
    }
}

/// Binds marker images to point symbols on a surface, one symbol per [`MarkerId`]
///
/// Placing a marker that already exists replaces its image, source and layer,
/// so repeated placements never stack symbols.
#[derive(Debug)]
pub struct MarkerRegistry {
    icon_size: f64,
    placed: HashMap<MarkerId, MarkerSpec>,
}

impl MarkerRegistry {
    pub fn new(icon_size: f64) -> Self {
        Self {
            icon_size,
            placed: HashMap::default(),
        }
    }

    /// Decodes the marker image and shows it at `spec.position`.
    ///
    /// The surface is untouched when the payloads are invalid or the image
    /// fails to load.
    pub async fn place_marker<S>(&mut self, surface: &mut S, spec: MarkerSpec) -> Result<()>
    where
        S: MapSurface + ?Sized,
    {
        let source_id = spec.id.source_id();
        let layer_id = spec.id.layer_id();

        let source = GeoJsonPointSource::new(spec.position)?;
        let layer = SymbolLayerSpec::new(layer_id, source_id, self.icon_size)?;
        let image = surface.load_image(&spec.image).await?;

        // The layer goes first, the engine won't drop a source still in use.
        if surface.has_layer(layer_id) {
            surface.remove_layer(layer_id);
        }
        if surface.has_image(layer_id) {
            surface.remove_image(layer_id);
        }
        surface.add_image(layer_id, image)?;

        if surface.has_source(source_id) {
            surface.remove_source(source_id);
        }
        surface.add_source(source_id, source)?;
        surface.add_layer(layer)?;

        log::info!("Placed {} marker at {}", spec.id, spec.position);
        self.placed.insert(spec.id, spec);
        Ok(())
    }

    /// Takes the marker off the surface. Returns whether it was placed.
    pub fn remove_marker<S>(&mut self, surface: &mut S, id: MarkerId) -> bool
    where
        S: MapSurface + ?Sized,
    {
        surface.remove_layer(id.layer_id());
        surface.remove_source(id.source_id());
        surface.remove_image(id.layer_id());
        self.placed.remove(&id).is_some()
    }

    pub fn get(&self, id: MarkerId) -> Option<&MarkerSpec> {
        self.placed.get(&id)
    }

    pub fn is_placed(&self, id: MarkerId) -> bool {
        self.placed.contains_key(&id)
    }

    /// Placed markers in [`MarkerId::ALL`] order
    pub fn placed(&self) -> impl Iterator<Item = &MarkerSpec> {
        MarkerId::ALL
            .into_iter()
            .filter_map(move |id| self.placed.get(&id))
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Forgets every marker without touching a surface, for when the surface is gone
    pub fn clear(&mut self) {
        self.placed.clear();
    }
}

impl Default for MarkerRegistry {
    fn default() -> Self {
        Self::new(crate::constants::MARKER_ICON_SIZE)
    }
}
