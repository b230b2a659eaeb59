//! The map lifecycle controller
//!
//! Owns the one map surface of a view and sequences the workflow: construct
//! the surface, wait for it to load, locate the viewer and mark them, then fly
//! to the antipode of whatever the camera is looking at each time the user
//! asks.

use crate::{
    core::{
        antipode::antipode,
        config::MapConfig,
        geo::{CameraState, LatLng},
    },
    geolocation::{GeolocationError, GeolocationProvider},
    input::{
        events::{Command, MapEvent},
        handler::EventManager,
    },
    layers::marker::{MarkerId, MarkerRegistry, MarkerSpec},
    surface::{FlyToOptions, InitializationError, MapSurface, SurfaceFactory, SurfaceOptions},
};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// No surface exists
    Uninitialized,
    /// Surface constructed, load-complete not yet reported
    Initializing,
    /// Surface loaded; the antipode command is live
    Ready,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Uninitialized => write!(f, "uninitialized"),
            LifecycleState::Initializing => write!(f, "initializing"),
            LifecycleState::Ready => write!(f, "ready"),
        }
    }
}

pub struct MapController<S: MapSurface> {
    config: MapConfig,
    state: LifecycleState,
    surface: Option<S>,
    markers: MarkerRegistry,
    event_manager: EventManager,
}

impl<S: MapSurface> MapController<S> {
    pub fn new(config: MapConfig) -> Self {
        let markers = MarkerRegistry::new(config.markers.icon_size);
        Self {
            config,
            state: LifecycleState::Uninitialized,
            surface: None,
            markers,
            event_manager: EventManager::new(),
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LifecycleState::Ready
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Current camera, if a surface exists
    pub fn camera(&self) -> Option<CameraState> {
        self.surface.as_ref().map(|surface| surface.camera())
    }

    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    /// Register an event listener, see [`EventManager::on`]
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + 'static,
    {
        self.event_manager.on(event_type, callback);
    }

    /// Drains queued events, notifying listeners
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.event_manager.process_events()
    }

    fn transition(&mut self, to: LifecycleState) {
        let from = self.state;
        if from == to {
            return;
        }
        log::debug!("Map lifecycle {} -> {}", from, to);
        self.state = to;
        self.event_manager.emit(MapEvent::StateChanged { from, to });
    }

    /// Constructs the surface. Returns `Ok(false)` without touching anything
    /// when a surface already exists.
    pub fn initialize<F>(&mut self, factory: &F) -> Result<bool, InitializationError>
    where
        F: SurfaceFactory<Surface = S>,
    {
        if self.surface.is_some() {
            log::debug!("Map already initialized ({}), ignoring", self.state);
            return Ok(false);
        }

        let options = SurfaceOptions::from_config(&self.config);
        let surface = factory.create(options).map_err(|e| {
            log::error!("Failed to create map surface: {}", e);
            e
        })?;

        self.surface = Some(surface);
        self.transition(LifecycleState::Initializing);
        Ok(true)
    }

    /// The surface's load-complete event. `None` unless initializing.
    pub fn load_event(&mut self) -> Option<LocalBoxFuture<'static, ()>> {
        match (self.state, self.surface.as_mut()) {
            (LifecycleState::Initializing, Some(surface)) => Some(surface.on_load()),
            _ => None,
        }
    }

    /// Handles load-complete. Returns true when the map just became ready and
    /// the viewer's position should be requested.
    pub fn handle_load(&mut self) -> bool {
        if self.state != LifecycleState::Initializing {
            log::debug!("Ignoring load event while {}", self.state);
            return false;
        }
        self.transition(LifecycleState::Ready);
        true
    }

    /// Applies a geolocation outcome: fly to the viewer and mark them, or log
    /// the failure and leave the camera alone.
    pub async fn handle_position(&mut self, result: Result<LatLng, GeolocationError>) {
        if self.state != LifecycleState::Ready {
            log::debug!("Dropping stale position result while {}", self.state);
            return;
        }

        let position = match result.and_then(|position| {
            if position.is_valid() {
                Ok(position)
            } else {
                Err(GeolocationError::PositionUnavailable(format!(
                    "reported position {} is out of range",
                    position
                )))
            }
        }) {
            Ok(position) => position,
            Err(e) => {
                log::warn!("Geolocation error: {}", e);
                self.event_manager.emit(MapEvent::GeolocationFailed {
                    code: e.code(),
                    message: e.to_string(),
                });
                return;
            }
        };

        log::info!("Viewer located at {}", position);
        self.event_manager.emit(MapEvent::Located { position });

        let locate = self.config.locate.clone();
        let target = CameraState::new(position, locate.zoom);
        let duration_ms = if locate.animate {
            locate.duration_ms
        } else {
            Some(0)
        };
        self.move_camera(target, duration_ms);

        let image = self.config.markers.origin_image.clone();
        self.place_marker(MarkerSpec::new(MarkerId::Origin, image, position))
            .await;
    }

    /// Requests the viewer's position and applies it. Sequential shortcut for
    /// callers that don't need to serve commands meanwhile.
    pub async fn locate<G>(&mut self, geolocation: &G)
    where
        G: GeolocationProvider + ?Sized,
    {
        if self.state != LifecycleState::Ready {
            log::debug!("Not locating while {}", self.state);
            return;
        }
        let result = geolocation.current_position().await;
        self.handle_position(result).await;
    }

    /// Initializes, waits for load-complete, then locates the viewer
    pub async fn start<F, G>(
        &mut self,
        factory: &F,
        geolocation: &G,
    ) -> Result<(), InitializationError>
    where
        F: SurfaceFactory<Surface = S>,
        G: GeolocationProvider + ?Sized,
    {
        self.initialize(factory)?;
        if let Some(load) = self.load_event() {
            load.await;
        }
        if self.handle_load() {
            self.locate(geolocation).await;
        }
        Ok(())
    }

    /// Flies to the antipode of the current camera center and marks it.
    ///
    /// The center is read fresh on every call, so repeated calls bounce
    /// between a point and its antipode. Returns the antipode, or `None` when
    /// the map is not ready.
    pub async fn go_to_antipode(&mut self) -> Option<LatLng> {
        let center = match (self.state, self.surface.as_ref()) {
            (LifecycleState::Ready, Some(surface)) => surface.center(),
            (state, _) => {
                log::debug!("Go to antipode ignored while {}", state);
                self.event_manager.emit(MapEvent::CommandIgnored {
                    command: Command::GoToAntipode,
                    state,
                });
                return None;
            }
        };

        let target = antipode(center);
        log::info!(
            "Flying from {} to antipode {} ({:.0} km)",
            center,
            target,
            center.distance_to(&target) / 1000.0
        );

        let flight = self.config.antipode.clone();
        self.move_camera(CameraState::new(target, flight.zoom), Some(flight.duration_ms));

        let image = self.config.markers.destination_image.clone();
        self.place_marker(MarkerSpec::new(MarkerId::Destination, image, target))
            .await;

        Some(target)
    }

    /// Serves one user command
    pub async fn handle_command(&mut self, command: Command) {
        match command {
            Command::GoToAntipode => {
                self.go_to_antipode().await;
            }
            Command::Shutdown => {
                self.teardown();
            }
        }
    }

    /// Drops the surface and forgets its markers. The controller can be
    /// initialized again afterwards.
    pub fn teardown(&mut self) -> Option<S> {
        let surface = self.surface.take();
        if surface.is_some() {
            self.markers.clear();
            self.transition(LifecycleState::Uninitialized);
        }
        surface
    }

    fn move_camera(&mut self, target: CameraState, duration_ms: Option<u64>) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let from = surface.center();

        if duration_ms == Some(0) {
            surface.jump_to(target);
        } else {
            let mut options = FlyToOptions::new(target.center, target.zoom);
            options.duration_ms = duration_ms;
            surface.fly_to(options);
        }

        self.event_manager.emit(MapEvent::FlightStarted {
            from,
            to: target,
            duration_ms,
        });
    }

    async fn place_marker(&mut self, spec: MarkerSpec) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let id = spec.id;
        let position = spec.position;

        match self.markers.place_marker(surface, spec).await {
            Ok(()) => self
                .event_manager
                .emit(MapEvent::MarkerPlaced { id, position }),
            Err(e) => {
                log::error!("Failed to place {} marker: {}", id, e);
                self.event_manager.emit(MapEvent::MarkerFailed {
                    id,
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geolocation::{FailedPosition, FixedPosition},
        surface::{
            headless::{HeadlessSurface, HeadlessSurfaceFactory},
            image::{solid_png, ImageRef},
        },
    };

    fn config() -> MapConfig {
        let mut config = MapConfig::default().with_access_token("pk.test");
        config.markers.origin_image = ImageRef::embedded(solid_png(4, [255, 0, 0, 255]).unwrap());
        config.markers.destination_image =
            ImageRef::embedded(solid_png(4, [0, 0, 255, 255]).unwrap());
        config
    }

    fn controller() -> MapController<HeadlessSurface> {
        MapController::new(config())
    }

    #[test]
    fn test_initialize_transitions_to_initializing() {
        let mut map = controller();
        let factory = HeadlessSurfaceFactory::new().with_manual_load();

        assert_eq!(map.state(), LifecycleState::Uninitialized);
        assert!(map.initialize(&factory).unwrap());
        assert_eq!(map.state(), LifecycleState::Initializing);
        assert_eq!(
            map.camera(),
            Some(CameraState::new(LatLng::new(0.0, 0.0), 3.0))
        );
    }

    #[test]
    fn test_initialize_twice_is_noop() {
        let mut map = controller();
        let factory = HeadlessSurfaceFactory::new();

        assert!(map.initialize(&factory).unwrap());
        assert!(!map.initialize(&factory).unwrap());

        let changes = map
            .process_events()
            .into_iter()
            .filter(|e| matches!(e, MapEvent::StateChanged { .. }))
            .count();
        assert_eq!(changes, 1);
    }

    #[test]
    fn test_initialize_without_token_fails() {
        let mut map: MapController<HeadlessSurface> = MapController::new(MapConfig::default());
        let result = map.initialize(&HeadlessSurfaceFactory::new());

        assert!(matches!(result, Err(InitializationError::MissingAccessToken)));
        assert_eq!(map.state(), LifecycleState::Uninitialized);
        assert!(map.surface().is_none());
    }

    #[test]
    fn test_load_event_only_while_initializing() {
        let mut map = controller();
        assert!(map.load_event().is_none());
        assert!(!map.handle_load());

        map.initialize(&HeadlessSurfaceFactory::new()).unwrap();
        assert!(map.load_event().is_some());
        assert!(map.handle_load());
        assert!(map.is_ready());
        assert!(!map.handle_load());
    }

    #[tokio::test]
    async fn test_antipode_before_ready_is_ignored() {
        let mut map = controller();
        assert_eq!(map.go_to_antipode().await, None);

        map.initialize(&HeadlessSurfaceFactory::new().with_manual_load())
            .unwrap();
        assert_eq!(map.go_to_antipode().await, None);

        let surface = map.surface().unwrap();
        assert!(surface.flights().is_empty());
        assert!(surface.layers().is_empty());
        assert!(map.markers().is_empty());
    }

    #[tokio::test]
    async fn test_start_locates_and_marks_origin() {
        let mut map = controller();
        let here = LatLng::new(51.5074, -0.1278);

        map.start(&HeadlessSurfaceFactory::new(), &FixedPosition(here))
            .await
            .unwrap();

        assert!(map.is_ready());
        let surface = map.surface_mut().unwrap();
        assert_eq!(surface.flights().len(), 1);
        assert_eq!(surface.flights()[0].zoom, 10.0);
        assert_eq!(surface.flights()[0].duration_ms, None);
        surface.finish_flight();
        assert_eq!(surface.camera(), CameraState::new(here, 10.0));
        assert_eq!(map.markers().get(MarkerId::Origin).unwrap().position, here);
    }

    #[tokio::test]
    async fn test_locate_without_animation_jumps() {
        let mut config = config();
        config.locate.animate = false;
        let mut map: MapController<HeadlessSurface> = MapController::new(config);
        let here = LatLng::new(-1.2921, 36.8219);

        map.start(&HeadlessSurfaceFactory::new(), &FixedPosition(here))
            .await
            .unwrap();

        let surface = map.surface().unwrap();
        assert!(surface.flights().is_empty());
        assert_eq!(surface.camera(), CameraState::new(here, 10.0));
    }

    #[tokio::test]
    async fn test_failed_geolocation_keeps_initial_camera() {
        let mut map = controller();
        let denied = FailedPosition(GeolocationError::PermissionDenied("blocked".into()));

        map.start(&HeadlessSurfaceFactory::new(), &denied)
            .await
            .unwrap();

        assert!(map.is_ready());
        assert_eq!(
            map.camera(),
            Some(CameraState::new(LatLng::new(0.0, 0.0), 3.0))
        );
        assert!(map.markers().is_empty());
        assert!(map
            .process_events()
            .iter()
            .any(|e| matches!(e, MapEvent::GeolocationFailed { code: 1, .. })));
    }

    #[tokio::test]
    async fn test_antipode_after_failed_geolocation_uses_initial_center() {
        let mut map = controller();
        let unavailable = FailedPosition(GeolocationError::PositionUnavailable("no fix".into()));
        map.start(&HeadlessSurfaceFactory::new(), &unavailable)
            .await
            .unwrap();

        let target = map.go_to_antipode().await.unwrap();
        assert_eq!(target, LatLng::new(0.0, 180.0));

        let flight = *map.surface().unwrap().flights().last().unwrap();
        assert_eq!(flight.zoom, 4.0);
        assert_eq!(flight.duration_ms, Some(4000));
        assert!(map.markers().is_placed(MarkerId::Destination));
        assert!(!map.markers().is_placed(MarkerId::Origin));
    }

    #[tokio::test]
    async fn test_broken_origin_image_is_not_fatal() {
        let mut config = config();
        config.markers.origin_image = ImageRef::embedded(b"\x89PNG truncated".to_vec());
        let mut map: MapController<HeadlessSurface> = MapController::new(config);

        map.start(
            &HeadlessSurfaceFactory::new(),
            &FixedPosition(LatLng::new(10.0, 10.0)),
        )
        .await
        .unwrap();

        assert!(map.is_ready());
        assert!(map.markers().is_empty());
        assert!(map.surface().unwrap().layers().is_empty());
        assert!(map.go_to_antipode().await.is_some());
        assert!(map.markers().is_placed(MarkerId::Destination));
    }

    #[tokio::test]
    async fn test_teardown_then_stale_position_is_dropped() {
        let mut map = controller();
        map.initialize(&HeadlessSurfaceFactory::new()).unwrap();
        map.handle_load();

        assert!(map.teardown().is_some());
        assert_eq!(map.state(), LifecycleState::Uninitialized);

        map.handle_position(Ok(LatLng::new(5.0, 5.0))).await;
        assert!(map.markers().is_empty());
        assert_eq!(map.go_to_antipode().await, None);

        assert!(map.initialize(&HeadlessSurfaceFactory::new()).unwrap());
        assert_eq!(map.state(), LifecycleState::Initializing);
    }
}
