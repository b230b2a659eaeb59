use antipode::{
    prelude::{
        Command, FailedPosition, FixedPosition, GeolocationProvider, HeadlessSurfaceFactory,
        ImageRef, IpGeolocation, LifecycleState, MapConfig, MapEvent, Session,
    },
    surface::image::solid_png,
};
use futures::channel::mpsc;
use std::{error::Error, io::BufRead};

type AppResult<T> = std::result::Result<T, Box<dyn Error>>;

/// Reads `ANTIPODE_CONFIG` (a JSON file) if set, else the environment
fn load_config() -> AppResult<MapConfig> {
    let config = match dotenv::var("ANTIPODE_CONFIG") {
        Ok(path) => {
            log::info!("Loading config from {}", path);
            let mut config = MapConfig::from_json_str(&std::fs::read_to_string(path)?)?;
            if config.access_token.is_none() {
                config.access_token = MapConfig::from_env().access_token;
            }
            config
        }
        Err(_) => MapConfig::from_env(),
    };

    with_fallback_markers(config)
}

/// Swaps missing marker pictures for flat colored squares
fn with_fallback_markers(mut config: MapConfig) -> AppResult<MapConfig> {
    if !image_exists(&config.markers.origin_image) {
        log::warn!("{} not found, using a plain origin marker", config.markers.origin_image);
        config.markers.origin_image = ImageRef::embedded(solid_png(32, [255, 140, 0, 255])?);
    }
    if !image_exists(&config.markers.destination_image) {
        log::warn!(
            "{} not found, using a plain destination marker",
            config.markers.destination_image
        );
        config.markers.destination_image = ImageRef::embedded(solid_png(32, [64, 160, 255, 255])?);
    }

    Ok(config)
}

fn image_exists(image: &ImageRef) -> bool {
    match image {
        ImageRef::Path(path) => path.exists(),
        ImageRef::Embedded(_) => true,
    }
}

fn geolocation() -> Box<dyn GeolocationProvider> {
    position_provider(dotenv::var("ANTIPODE_POSITION").ok())
}

fn position_provider(position: Option<String>) -> Box<dyn GeolocationProvider> {
    match position {
        Some(position) => match position.parse::<FixedPosition>() {
            Ok(fixed) => {
                log::info!("Using fixed position {}", fixed.0);
                Box::new(fixed)
            }
            Err(e) => {
                log::warn!("Ignoring ANTIPODE_POSITION: {}", e);
                Box::new(FailedPosition(e))
            }
        },
        None => Box::new(IpGeolocation::new()),
    }
}

/// Forwards stdin lines as commands until EOF
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<Command> {
    let (tx, rx) = mpsc::unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if tx.unbounded_send(command).is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("{}", e),
            }
        }
    });
    rx
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> AppResult<()> {
    dotenv::dotenv().ok();
    env_logger::builder()
        .filter_module("antipode", log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = load_config()?;
    let factory = HeadlessSurfaceFactory::new().with_wall_clock();
    let mut session = Session::new(config, factory, geolocation());

    let controller = session.controller_mut();
    controller.on("flightstarted", |event| {
        if let MapEvent::FlightStarted { to, duration_ms, .. } = event {
            match duration_ms {
                Some(0) => log::info!("Camera jumped to {} at zoom {:.1}", to.center, to.zoom),
                Some(ms) => log::info!("Camera flying to {} at zoom {:.1} over {} ms", to.center, to.zoom, ms),
                None => log::info!("Camera flying to {} at zoom {:.1}", to.center, to.zoom),
            }
        }
    });
    controller.on("markerplaced", |event| {
        if let MapEvent::MarkerPlaced { id, position } = event {
            log::info!("{} marker at {}", id, position);
        }
    });
    controller.on("statechanged", |event| {
        if let MapEvent::StateChanged { to: LifecycleState::Ready, .. } = event {
            log::info!("Map ready. Type 'a' to fly to the antipode, 'q' to quit.");
        }
    });

    let outcome = session.run(spawn_stdin_reader()).await?;

    let failures = outcome.events.iter().filter(|e| e.is_failure()).count();
    if let Some(camera) = outcome.controller.camera() {
        log::info!(
            "Session over at {} (zoom {:.1}), {} marker(s), {} failure(s)",
            camera.center,
            camera.zoom,
            outcome.controller.markers().len(),
            failures
        );
    }

    Ok(())
}
