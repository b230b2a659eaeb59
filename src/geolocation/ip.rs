use crate::{
    core::geo::LatLng,
    geolocation::{GeolocationError, GeolocationProvider, PositionResult},
};
use futures::future::{FutureExt, LocalBoxFuture};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://ipapi.co/json/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Approximate position from the public IP address, for hosts without a
/// positioning device. Needs a Tokio runtime to run the request.
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct IpLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
}

impl IpGeolocation {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for IpGeolocation {
    fn default() -> Self {
        Self::new()
    }
}

fn request_error(error: reqwest::Error) -> GeolocationError {
    if error.is_timeout() {
        return GeolocationError::Timeout(error.to_string());
    }
    match error.status() {
        Some(status) if status == reqwest::StatusCode::FORBIDDEN => {
            GeolocationError::PermissionDenied(error.to_string())
        }
        _ => GeolocationError::PositionUnavailable(error.to_string()),
    }
}

fn parse_location(location: IpLocation) -> PositionResult {
    match (location.latitude, location.longitude) {
        (Some(lat), Some(lng)) if LatLng::new(lat, lng).is_valid() => Ok(LatLng::new(lat, lng)),
        (Some(lat), Some(lng)) => Err(GeolocationError::PositionUnavailable(format!(
            "lookup returned out-of-range position ({}, {})",
            lat, lng
        ))),
        _ => Err(GeolocationError::PositionUnavailable(
            location
                .reason
                .unwrap_or_else(|| "lookup returned no position".to_string()),
        )),
    }
}

impl GeolocationProvider for IpGeolocation {
    fn current_position(&self) -> LocalBoxFuture<'static, PositionResult> {
        let request = self.client.get(&self.endpoint).timeout(self.timeout);
        let endpoint = self.endpoint.clone();

        async move {
            log::debug!("Looking up position from {}", endpoint);
            let response = request
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(request_error)?;
            let location: IpLocation = response.json().await.map_err(request_error)?;
            parse_location(location)
        }
        .boxed_local()
    }
}
