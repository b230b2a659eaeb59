//! Single-threaded session loop
//!
//! A [`Session`] owns the controller, the surface factory and the geolocation
//! provider, and serves the three asynchronous inputs of a map view from one
//! task: the surface's load-complete event, the geolocation answer and user
//! commands. Whatever is ready first is handled first; a pending position
//! lookup never blocks the antipode command.

use crate::{
    core::{config::MapConfig, map::MapController},
    geolocation::{GeolocationProvider, PositionResult},
    input::events::{Command, MapEvent},
    surface::SurfaceFactory,
    Result,
};
use futures::{
    future::{Fuse, FusedFuture, FutureExt, LocalBoxFuture},
    select_biased,
    stream::{Stream, StreamExt},
};

/// What a finished session leaves behind
pub struct SessionOutcome<F: SurfaceFactory> {
    pub controller: MapController<F::Surface>,
    /// Every event the controller emitted, in order
    pub events: Vec<MapEvent>,
}

pub struct Session<F: SurfaceFactory, G: GeolocationProvider> {
    controller: MapController<F::Surface>,
    factory: F,
    geolocation: G,
    events: Vec<MapEvent>,
}

impl<F, G> Session<F, G>
where
    F: SurfaceFactory,
    G: GeolocationProvider,
{
    pub fn new(config: MapConfig, factory: F, geolocation: G) -> Self {
        Self {
            controller: MapController::new(config),
            factory,
            geolocation,
            events: Vec::new(),
        }
    }

    pub fn controller(&self) -> &MapController<F::Surface> {
        &self.controller
    }

    /// For registering listeners before the session runs
    pub fn controller_mut(&mut self) -> &mut MapController<F::Surface> {
        &mut self.controller
    }

    fn flush_events(&mut self) {
        let events = self.controller.process_events();
        self.events.extend(events);
    }

    /// Runs until the command stream ends or a [`Command::Shutdown`] arrives.
    ///
    /// Fails only if the surface cannot be constructed. Geolocation and marker
    /// failures are logged and reported as events.
    pub async fn run<C>(mut self, commands: C) -> Result<SessionOutcome<F>>
    where
        C: Stream<Item = Command> + Unpin,
    {
        self.controller.initialize(&self.factory)?;
        self.flush_events();

        let mut load = match self.controller.load_event() {
            Some(load) => load.fuse(),
            None => Fuse::terminated(),
        };
        let mut locate: Fuse<LocalBoxFuture<'static, PositionResult>> = Fuse::terminated();
        let mut commands = commands.fuse();

        loop {
            select_biased! {
                () = load => {
                    if self.controller.handle_load() {
                        locate = self.geolocation.current_position().fuse();
                    }
                }
                position = locate => self.controller.handle_position(position).await,
                command = commands.next() => match command {
                    Some(Command::GoToAntipode) => {
                        self.controller.handle_command(Command::GoToAntipode).await;
                    }
                    Some(Command::Shutdown) | None => {
                        log::debug!("Command stream closed, ending session");
                        break;
                    }
                },
            }
            self.flush_events();
        }

        if !locate.is_terminated() {
            log::debug!("Session ended with a position request still pending");
        }
        self.flush_events();

        Ok(SessionOutcome {
            controller: self.controller,
            events: self.events,
        })
    }
}

#[cfg(feature = "tokio-runtime")]
impl<F, G> Session<F, G>
where
    F: SurfaceFactory,
    G: GeolocationProvider,
{
    /// Runs the session on a fresh current-thread Tokio runtime. The IP
    /// geolocation provider needs one to drive its request.
    pub fn run_blocking<C>(self, commands: C) -> Result<SessionOutcome<F>>
    where
        C: Stream<Item = Command> + Unpin,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(commands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{geo::LatLng, map::LifecycleState},
        geolocation::FixedPosition,
        surface::{headless::HeadlessSurfaceFactory, image::{solid_png, ImageRef}},
        MapError,
    };
    use futures::stream;

    fn config() -> MapConfig {
        let mut config = MapConfig::default().with_access_token("pk.test");
        let png = solid_png(2, [10, 20, 30, 255]).unwrap();
        config.markers.origin_image = ImageRef::embedded(png.clone());
        config.markers.destination_image = ImageRef::embedded(png);
        config
    }

    #[tokio::test]
    async fn test_empty_session_locates() {
        let session = Session::new(
            config(),
            HeadlessSurfaceFactory::new(),
            FixedPosition(LatLng::new(40.0, -3.7)),
        );

        let outcome = session.run(stream::empty()).await.unwrap();

        assert_eq!(outcome.controller.state(), LifecycleState::Ready);
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e, MapEvent::Located { .. })));
    }

    #[tokio::test]
    async fn test_bad_token_fails_session() {
        let session = Session::new(
            MapConfig::default().with_access_token("nope"),
            HeadlessSurfaceFactory::new(),
            FixedPosition(LatLng::default()),
        );

        let result = session.run(stream::empty()).await;
        assert!(matches!(result, Err(MapError::Initialization(_))));
    }

    #[cfg(feature = "tokio-runtime")]
    #[test]
    fn test_run_blocking() {
        let session = Session::new(
            config(),
            HeadlessSurfaceFactory::new(),
            FixedPosition(LatLng::new(-33.9249, 18.4241)),
        );

        let outcome = session
            .run_blocking(stream::iter(vec![Command::GoToAntipode]))
            .unwrap();
        assert_eq!(outcome.controller.markers().len(), 2);
    }
}
