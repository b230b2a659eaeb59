//! An in-memory rendering surface
//!
//! Nothing is drawn. The surface keeps the camera, registered images, sources
//! and layers so tests and headless runs can observe exactly what a real
//! engine would have been asked to do. Flights are animated on either a manual
//! clock (advanced explicitly) or the wall clock.

use crate::{
    animation::{interpolation::EasingFunction, transitions::CameraTransition},
    core::{constants, geo::CameraState},
    data::geojson::GeoJsonPointSource,
    layers::symbol::SymbolLayerSpec,
    prelude::HashMap,
    surface::{
        image::{self, DecodedImage, ImageLoadError, ImageRef},
        FlyToOptions, InitializationError, MapSurface, SurfaceFactory, SurfaceOptions,
    },
    MapError, Result,
};
use async_trait::async_trait;
use futures::{
    channel::oneshot,
    future::{self, FutureExt, LocalBoxFuture},
};
use std::cell::Cell;

#[derive(Debug, Clone, Copy)]
enum Clock {
    Manual { now_ms: u64 },
    Wall { started: instant::Instant },
}

impl Clock {
    fn now_ms(&self) -> u64 {
        match self {
            Clock::Manual { now_ms } => *now_ms,
            Clock::Wall { started } => started.elapsed().as_millis() as u64,
        }
    }
}

/// Builds [`HeadlessSurface`]s, checking options the way a hosted engine does
#[derive(Debug, Clone)]
pub struct HeadlessSurfaceFactory {
    wall_clock: bool,
    auto_load: bool,
    easing: EasingFunction,
}

impl HeadlessSurfaceFactory {
    /// Manual clock, load event fired straight after construction
    pub fn new() -> Self {
        Self {
            wall_clock: false,
            auto_load: true,
            easing: EasingFunction::default(),
        }
    }

    pub fn with_wall_clock(mut self) -> Self {
        self.wall_clock = true;
        self
    }

    /// Easing curve of camera flights
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// Leaves the load event to [`HeadlessSurface::complete_load`]
    pub fn with_manual_load(mut self) -> Self {
        self.auto_load = false;
        self
    }
}

impl Default for HeadlessSurfaceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceFactory for HeadlessSurfaceFactory {
    type Surface = HeadlessSurface;

    fn create(
        &self,
        options: SurfaceOptions,
    ) -> std::result::Result<HeadlessSurface, InitializationError> {
        options.validate_access_token()?;
        options.validate_container()?;

        if options.style.trim().is_empty() {
            return Err(InitializationError::Engine("style reference is empty".to_string()));
        }
        if !options.center.is_valid() || !options.zoom.is_finite() || options.zoom < 0.0 {
            return Err(InitializationError::Engine(format!(
                "invalid initial camera {} @ {}",
                options.center, options.zoom
            )));
        }

        let clock = if self.wall_clock {
            Clock::Wall {
                started: instant::Instant::now(),
            }
        } else {
            Clock::Manual { now_ms: 0 }
        };

        let mut surface = HeadlessSurface::new(options, clock, self.easing);
        if self.auto_load {
            surface.complete_load();
        }

        log::debug!("Headless surface created in container '{}'", surface.options.container);
        Ok(surface)
    }
}

pub struct HeadlessSurface {
    options: SurfaceOptions,
    clock: Clock,
    easing: EasingFunction,
    camera: CameraState,
    flight: Option<CameraTransition>,
    flights: Vec<FlyToOptions>,
    load_tx: Option<oneshot::Sender<()>>,
    load_rx: Option<oneshot::Receiver<()>>,
    images: HashMap<String, DecodedImage>,
    sources: HashMap<String, GeoJsonPointSource>,
    layers: Vec<SymbolLayerSpec>,
    image_requests: Cell<usize>,
}

impl HeadlessSurface {
    fn new(options: SurfaceOptions, clock: Clock, easing: EasingFunction) -> Self {
        let (load_tx, load_rx) = oneshot::channel();
        Self {
            camera: CameraState::new(options.center, options.zoom),
            options,
            clock,
            easing,
            flight: None,
            flights: Vec::new(),
            load_tx: Some(load_tx),
            load_rx: Some(load_rx),
            images: HashMap::default(),
            sources: HashMap::default(),
            layers: Vec::new(),
            image_requests: Cell::new(0),
        }
    }

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    /// Fires the load-complete event. Only the first call has an effect.
    pub fn complete_load(&mut self) {
        if let Some(tx) = self.load_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.load_tx.is_none()
    }

    /// Moves the manual clock forward. No effect on a wall clock.
    pub fn advance(&mut self, ms: u64) {
        if let Clock::Manual { now_ms } = &mut self.clock {
            *now_ms += ms;
        }
        self.settle();
    }

    /// Lands any in-flight camera at its target
    pub fn finish_flight(&mut self) {
        if let Some(flight) = self.flight.take() {
            self.camera = flight.to;
        }
    }

    pub fn is_flying(&self) -> bool {
        self.flight
            .as_ref()
            .is_some_and(|flight| !flight.is_finished(self.clock.now_ms()))
    }

    /// Every flight requested so far, oldest first
    pub fn flights(&self) -> &[FlyToOptions] {
        &self.flights
    }

    pub fn image(&self, id: &str) -> Option<&DecodedImage> {
        self.images.get(id)
    }

    pub fn source(&self, id: &str) -> Option<&GeoJsonPointSource> {
        self.sources.get(id)
    }

    pub fn layers(&self) -> &[SymbolLayerSpec] {
        &self.layers
    }

    /// Number of `load_image` calls, failed ones included
    pub fn image_requests(&self) -> usize {
        self.image_requests.get()
    }

    fn settle(&mut self) {
        let now_ms = self.clock.now_ms();
        if self.flight.as_ref().is_some_and(|f| f.is_finished(now_ms)) {
            self.finish_flight();
        }
    }
}

#[async_trait(?Send)]
impl MapSurface for HeadlessSurface {
    fn on_load(&mut self) -> LocalBoxFuture<'static, ()> {
        match self.load_rx.take() {
            Some(rx) => async move {
                // A surface dropped before loading never reports load.
                if rx.await.is_err() {
                    future::pending::<()>().await;
                }
            }
            .boxed_local(),
            None => future::pending().boxed_local(),
        }
    }

    fn fly_to(&mut self, options: FlyToOptions) {
        let now_ms = self.clock.now_ms();
        let from = self.camera();
        let duration_ms = options.duration_ms.unwrap_or(constants::DEFAULT_FLIGHT_MS);

        self.flights.push(options);
        self.camera = from;
        self.flight = Some(
            CameraTransition::new(from, options.target(), now_ms, duration_ms)
                .with_easing(self.easing),
        );
        self.settle();
    }

    fn jump_to(&mut self, camera: CameraState) {
        self.flight = None;
        self.camera = camera;
    }

    fn camera(&self) -> CameraState {
        match &self.flight {
            Some(flight) => flight.sample(self.clock.now_ms()),
            None => self.camera,
        }
    }

    async fn load_image(
        &self,
        image_ref: &ImageRef,
    ) -> std::result::Result<DecodedImage, ImageLoadError> {
        self.image_requests.set(self.image_requests.get() + 1);
        image::load(image_ref)
    }

    fn has_image(&self, id: &str) -> bool {
        self.images.contains_key(id)
    }

    fn add_image(&mut self, id: &str, image: DecodedImage) -> Result<()> {
        if self.images.contains_key(id) {
            return Err(MapError::Layer(format!("image '{}' already exists", id)));
        }
        self.images.insert(id.to_string(), image);
        Ok(())
    }

    fn remove_image(&mut self, id: &str) -> bool {
        self.images.remove(id).is_some()
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_source(&mut self, id: &str, source: GeoJsonPointSource) -> Result<()> {
        if self.sources.contains_key(id) {
            return Err(MapError::Layer(format!("source '{}' already exists", id)));
        }
        self.sources.insert(id.to_string(), source);
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> bool {
        if self.layers.iter().any(|layer| layer.source == id) {
            log::warn!("Refusing to remove source '{}' while a layer uses it", id);
            return false;
        }
        self.sources.remove(id).is_some()
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == id)
    }

    fn add_layer(&mut self, layer: SymbolLayerSpec) -> Result<()> {
        if self.has_layer(&layer.id) {
            return Err(MapError::Layer(format!("layer '{}' already exists", layer.id)));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(MapError::Layer(format!(
                "layer '{}' references missing source '{}'",
                layer.id, layer.source
            )));
        }
        if !self.images.contains_key(&layer.layout.icon_image) {
            return Err(MapError::Layer(format!(
                "layer '{}' references missing image '{}'",
                layer.id, layer.layout.icon_image
            )));
        }
        self.layers.push(layer);
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|layer| layer.id != id);
        self.layers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{config::MapConfig, geo::LatLng};
    use crate::surface::image;
    use futures::FutureExt;

    fn surface() -> HeadlessSurface {
        let config = MapConfig::default().with_access_token("pk.test");
        HeadlessSurfaceFactory::new()
            .with_manual_load()
            .create(SurfaceOptions::from_config(&config))
            .unwrap()
    }

    #[test]
    fn test_rejects_missing_token() {
        let result = HeadlessSurfaceFactory::new().create(SurfaceOptions::from_config(
            &MapConfig::default(),
        ));
        assert!(matches!(result, Err(InitializationError::MissingAccessToken)));
    }

    #[test]
    fn test_starts_at_initial_camera() {
        let surface = surface();
        assert_eq!(surface.camera(), CameraState::new(LatLng::new(0.0, 0.0), 3.0));
        assert!(!surface.is_loaded());
    }

    #[test]
    fn test_load_event_fires_once() {
        let mut surface = surface();
        let mut first = surface.on_load();
        let mut second = surface.on_load();

        assert!((&mut first).now_or_never().is_none());
        surface.complete_load();
        assert!(first.now_or_never().is_some());
        assert!((&mut second).now_or_never().is_none());
    }

    #[test]
    fn test_flight_follows_clock() {
        let mut surface = surface();
        let target = LatLng::new(0.0, 180.0);
        surface.fly_to(FlyToOptions::new(target, 4.0).with_duration(4_000));

        assert!(surface.is_flying());
        surface.advance(2_000);
        let mid = surface.center();
        assert!(mid.lng > 0.0 && mid.lng < 180.0);

        surface.advance(2_000);
        assert!(!surface.is_flying());
        assert_eq!(surface.camera(), CameraState::new(target, 4.0));
    }

    #[test]
    fn test_flight_easing_is_configurable() {
        let config = MapConfig::default().with_access_token("pk.test");
        let options = SurfaceOptions::from_config(&config);
        let flight = FlyToOptions::new(LatLng::new(0.0, 180.0), 7.0).with_duration(4_000);

        let mut linear = HeadlessSurfaceFactory::new()
            .with_easing(EasingFunction::Linear)
            .create(options.clone())
            .unwrap();
        let mut eased = HeadlessSurfaceFactory::new().create(options).unwrap();
        linear.fly_to(flight);
        eased.fly_to(flight);
        linear.advance(1_000);
        eased.advance(1_000);

        assert!((linear.center().lng - 45.0).abs() < 1e-9);
        assert!((linear.camera().zoom - 4.0).abs() < 1e-9);
        assert!((eased.center().lng - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_later_flight_wins() {
        let mut surface = surface();
        surface.fly_to(FlyToOptions::new(LatLng::new(10.0, 10.0), 5.0).with_duration(1_000));
        surface.advance(500);
        surface.fly_to(FlyToOptions::new(LatLng::new(-20.0, -20.0), 6.0).with_duration(1_000));
        surface.advance(1_000);

        assert_eq!(surface.camera(), CameraState::new(LatLng::new(-20.0, -20.0), 6.0));
        assert_eq!(surface.flights().len(), 2);
    }

    #[test]
    fn test_layer_needs_source_and_image() {
        let mut surface = surface();
        let layer = SymbolLayerSpec::new("originPoint", "originSource", 0.2).unwrap();
        assert!(surface.add_layer(layer.clone()).is_err());

        let png = image::solid_png(2, [0, 0, 0, 255]).unwrap();
        surface.add_image("originPoint", image::decode(&png).unwrap()).unwrap();
        surface
            .add_source("originSource", GeoJsonPointSource::new(LatLng::default()).unwrap())
            .unwrap();
        surface.add_layer(layer.clone()).unwrap();

        assert!(surface.add_layer(layer).is_err());
        assert!(!surface.remove_source("originSource"));
        assert!(surface.remove_layer("originPoint"));
        assert!(surface.remove_source("originSource"));
    }
}
