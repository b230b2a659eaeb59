use crate::core::{
    geo::{CameraState, LatLng},
    map::LifecycleState,
};
use crate::layers::marker::MarkerId;
use serde::{Deserialize, Serialize};

/// Commands a user can issue to the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// The "Go to Antipode" control
    GoToAntipode,
    /// Ends the session
    Shutdown,
}

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "antipode" | "go" => Ok(Command::GoToAntipode),
            "q" | "quit" | "exit" => Ok(Command::Shutdown),
            other => Err(format!("unknown command {:?}", other)),
        }
    }
}

/// Notifications emitted by the map controller
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Lifecycle moved between states
    StateChanged {
        from: LifecycleState,
        to: LifecycleState,
    },
    /// The viewer's position is known
    Located { position: LatLng },
    /// Geolocation failed; the map stays where it is
    GeolocationFailed { code: u16, message: String },
    /// A camera move was started
    FlightStarted {
        from: LatLng,
        to: CameraState,
        duration_ms: Option<u64>,
    },
    /// A marker is now shown at `position`
    MarkerPlaced { id: MarkerId, position: LatLng },
    /// A marker could not be placed; any previous one is left as it was
    MarkerFailed { id: MarkerId, reason: String },
    /// A command arrived in a state that cannot serve it
    CommandIgnored {
        command: Command,
        state: LifecycleState,
    },
}

impl MapEvent {
    /// Name listeners subscribe with
    pub fn kind(&self) -> &'static str {
        match self {
            MapEvent::StateChanged { .. } => "statechanged",
            MapEvent::Located { .. } => "located",
            MapEvent::GeolocationFailed { .. } => "geolocationfailed",
            MapEvent::FlightStarted { .. } => "flightstarted",
            MapEvent::MarkerPlaced { .. } => "markerplaced",
            MapEvent::MarkerFailed { .. } => "markerfailed",
            MapEvent::CommandIgnored { .. } => "commandignored",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            MapEvent::GeolocationFailed { .. } | MapEvent::MarkerFailed { .. }
        )
    }
}
