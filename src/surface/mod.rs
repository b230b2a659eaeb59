//! The rendering-engine boundary
//!
//! The controller never talks to a concrete map engine. It constructs one
//! through a [`SurfaceFactory`] and drives it through [`MapSurface`], handing
//! over typed payloads ([`GeoJsonPointSource`], [`SymbolLayerSpec`]) instead of
//! loose JSON.

pub mod headless;
pub mod image;

use crate::{
    core::{
        config::MapConfig,
        constants,
        geo::{CameraState, LatLng},
    },
    data::geojson::GeoJsonPointSource,
    layers::symbol::SymbolLayerSpec,
    Result,
};
use async_trait::async_trait;
use futures::future::LocalBoxFuture;

use self::image::{DecodedImage, ImageLoadError, ImageRef};

/// Construction failures. Fatal to the view.
#[derive(Debug, thiserror::Error)]
pub enum InitializationError {
    #[error("no map access token was supplied (set {})", constants::ACCESS_TOKEN_ENV)]
    MissingAccessToken,

    #[error("access token {0:?} is not a valid map access token")]
    InvalidAccessToken(String),

    #[error("invalid container: {0}")]
    InvalidContainer(String),

    #[error("rendering engine failed to start: {0}")]
    Engine(String),
}

/// Everything the engine needs to construct a surface
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    pub container: String,
    pub style: String,
    pub center: LatLng,
    pub zoom: f64,
    pub attribution_control: bool,
    pub access_token: Option<String>,
}

impl SurfaceOptions {
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            container: config.container.clone(),
            style: config.style.clone(),
            center: config.initial_center,
            zoom: config.initial_zoom,
            attribution_control: config.attribution_control,
            access_token: config.access_token.clone(),
        }
    }

    /// Checks the token the way hosted map services shape theirs
    pub fn validate_access_token(&self) -> std::result::Result<&str, InitializationError> {
        let token = self
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(InitializationError::MissingAccessToken)?;

        let well_formed = constants::ACCESS_TOKEN_PREFIXES
            .iter()
            .any(|prefix| token.len() > prefix.len() && token.starts_with(prefix));

        if well_formed {
            Ok(token)
        } else {
            Err(InitializationError::InvalidAccessToken(token.to_string()))
        }
    }

    pub fn validate_container(&self) -> std::result::Result<(), InitializationError> {
        if self.container.trim().is_empty() {
            return Err(InitializationError::InvalidContainer(
                "container id is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Camera flight request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyToOptions {
    pub center: LatLng,
    pub zoom: f64,
    /// `None` leaves the duration to the engine.
    pub duration_ms: Option<u64>,
}

impl FlyToOptions {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn target(&self) -> CameraState {
        CameraState::new(self.center, self.zoom)
    }
}

/// Builds rendering surfaces
pub trait SurfaceFactory {
    type Surface: MapSurface;

    fn create(
        &self,
        options: SurfaceOptions,
    ) -> std::result::Result<Self::Surface, InitializationError>;
}

/// A constructed map surface, driven from a single event-loop thread
///
/// `add_*` calls fail when the id is already taken, as map engines do; callers
/// wanting replace semantics check `has_*` and remove first.
#[async_trait(?Send)]
pub trait MapSurface {
    /// Resolves once, when the engine reports load-complete. Later calls
    /// return a future that never resolves.
    fn on_load(&mut self) -> LocalBoxFuture<'static, ()>;

    /// Starts an animated camera transition. Fire-and-forget; a later call
    /// replaces an in-flight one.
    fn fly_to(&mut self, options: FlyToOptions);

    /// Moves the camera without animation
    fn jump_to(&mut self, camera: CameraState);

    /// Current camera, mid-flight positions included
    fn camera(&self) -> CameraState;

    fn center(&self) -> LatLng {
        self.camera().center
    }

    /// Fetches and decodes an image
    async fn load_image(
        &self,
        image: &ImageRef,
    ) -> std::result::Result<DecodedImage, ImageLoadError>;

    fn has_image(&self, id: &str) -> bool;
    fn add_image(&mut self, id: &str, image: DecodedImage) -> Result<()>;
    fn remove_image(&mut self, id: &str) -> bool;

    fn has_source(&self, id: &str) -> bool;
    fn add_source(&mut self, id: &str, source: GeoJsonPointSource) -> Result<()>;
    fn remove_source(&mut self, id: &str) -> bool;

    fn has_layer(&self, id: &str) -> bool;
    fn add_layer(&mut self, layer: SymbolLayerSpec) -> Result<()>;
    fn remove_layer(&mut self, id: &str) -> bool;
}
