//! Single-shot device geolocation
//!
//! A provider hands back an owned future so the caller can keep serving other
//! events while the position is being resolved. Timeouts are the provider's
//! business; nothing here enforces one.

pub mod ip;

pub use ip::IpGeolocation;

use crate::core::geo::LatLng;
use futures::{
    channel::oneshot,
    future::{self, FutureExt, LocalBoxFuture},
};
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeolocationError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("timed out: {0}")]
    Timeout(String),
}

impl GeolocationError {
    /// Numeric code as reported by platform geolocation services
    pub fn code(&self) -> u16 {
        match self {
            GeolocationError::PermissionDenied(_) => 1,
            GeolocationError::PositionUnavailable(_) => 2,
            GeolocationError::Timeout(_) => 3,
        }
    }
}

pub type PositionResult = Result<LatLng, GeolocationError>;

pub trait GeolocationProvider {
    /// Requests the current position once
    fn current_position(&self) -> LocalBoxFuture<'static, PositionResult>;
}

impl<G: GeolocationProvider + ?Sized> GeolocationProvider for Box<G> {
    fn current_position(&self) -> LocalBoxFuture<'static, PositionResult> {
        (**self).current_position()
    }
}

/// Always reports the same position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPosition(pub LatLng);

impl GeolocationProvider for FixedPosition {
    fn current_position(&self) -> LocalBoxFuture<'static, PositionResult> {
        let position = self.0;
        let result = if position.is_valid() {
            Ok(position)
        } else {
            Err(GeolocationError::PositionUnavailable(format!(
                "configured position {} is out of range",
                position
            )))
        };
        future::ready(result).boxed_local()
    }
}

impl std::str::FromStr for FixedPosition {
    type Err = GeolocationError;

    /// Parses `"lat,lng"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GeolocationError::PositionUnavailable(format!("cannot parse {:?}", s));
        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
        Ok(FixedPosition(LatLng::new(lat, lng)))
    }
}

/// Always fails with the same error, like a denied permission prompt
#[derive(Debug, Clone, PartialEq)]
pub struct FailedPosition(pub GeolocationError);

impl GeolocationProvider for FailedPosition {
    fn current_position(&self) -> LocalBoxFuture<'static, PositionResult> {
        future::ready(Err(self.0.clone())).boxed_local()
    }
}

/// A provider whose answer is supplied later through a [`PositionSender`]
#[derive(Debug)]
pub struct DeferredPosition {
    rx: RefCell<Option<oneshot::Receiver<PositionResult>>>,
}

/// Completes the request of a [`DeferredPosition`]
#[derive(Debug)]
pub struct PositionSender(oneshot::Sender<PositionResult>);

impl PositionSender {
    /// Resolves the pending request. Returns false if nobody is waiting anymore.
    pub fn send(self, result: PositionResult) -> bool {
        self.0.send(result).is_ok()
    }
}

impl DeferredPosition {
    pub fn channel() -> (Self, PositionSender) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                rx: RefCell::new(Some(rx)),
            },
            PositionSender(tx),
        )
    }
}

impl GeolocationProvider for DeferredPosition {
    fn current_position(&self) -> LocalBoxFuture<'static, PositionResult> {
        match self.rx.borrow_mut().take() {
            Some(rx) => async move {
                rx.await.unwrap_or_else(|_| {
                    Err(GeolocationError::PositionUnavailable(
                        "position request was dropped".to_string(),
                    ))
                })
            }
            .boxed_local(),
            None => future::ready(Err(GeolocationError::PositionUnavailable(
                "position was already requested".to_string(),
            )))
            .boxed_local(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(GeolocationError::PermissionDenied(String::new()).code(), 1);
        assert_eq!(GeolocationError::PositionUnavailable(String::new()).code(), 2);
        assert_eq!(GeolocationError::Timeout(String::new()).code(), 3);
    }

    #[test]
    fn test_fixed_position() {
        let provider = FixedPosition(LatLng::new(-33.8688, 151.2093));
        let result = provider.current_position().now_or_never().unwrap();
        assert_eq!(result, Ok(LatLng::new(-33.8688, 151.2093)));

        let bogus = FixedPosition(LatLng::new(0.0, 500.0));
        assert!(bogus.current_position().now_or_never().unwrap().is_err());
    }

    #[test]
    fn test_parse_fixed_position() {
        let provider: FixedPosition = " 48.8566 , 2.3522 ".parse().unwrap();
        assert_eq!(provider.0, LatLng::new(48.8566, 2.3522));
        assert!("48.8566".parse::<FixedPosition>().is_err());
        assert!("north,east".parse::<FixedPosition>().is_err());
    }

    #[test]
    fn test_failed_position() {
        let provider = FailedPosition(GeolocationError::PermissionDenied("user said no".into()));
        let result = provider.current_position().now_or_never().unwrap();
        assert_eq!(result.unwrap_err().code(), 1);
    }

    #[test]
    fn test_deferred_position() {
        let (provider, sender) = DeferredPosition::channel();
        let mut request = provider.current_position();

        assert!((&mut request).now_or_never().is_none());
        assert!(sender.send(Ok(LatLng::new(1.0, 2.0))));
        assert_eq!(request.now_or_never(), Some(Ok(LatLng::new(1.0, 2.0))));

        let again = provider.current_position().now_or_never().unwrap();
        assert!(matches!(again, Err(GeolocationError::PositionUnavailable(_))));
    }

    #[test]
    fn test_dropped_sender_reports_unavailable() {
        let (provider, sender) = DeferredPosition::channel();
        let request = provider.current_position();
        drop(sender);

        assert!(matches!(
            request.now_or_never(),
            Some(Err(GeolocationError::PositionUnavailable(_)))
        ));
    }
}
