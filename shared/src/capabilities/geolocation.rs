use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::GeoPoint;

pub const DEFAULT_POSITION_TIMEOUT_MS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: Option<u32>,
    pub maximum_age_ms: u32,
}

impl PositionOptions {
    /// Fresh high-accuracy fix with a 10 s budget, used to fill the start field.
    #[must_use]
    pub const fn precise() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: Some(DEFAULT_POSITION_TIMEOUT_MS),
            maximum_age_ms: 0,
        }
    }
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout_ms: None,
            maximum_age_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub coords: GeoPoint,
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LocationError {
    #[error("geolocation is not supported on this device")]
    Unsupported,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("location error: {message}")]
    Unknown { message: String },
}

impl LocationError {
    /// Maps a W3C `GeolocationPositionError.code`.
    #[must_use]
    pub fn from_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            _ => Self::Unknown {
                message: message.into(),
            },
        }
    }
}

pub type LocationResult = Result<Position, LocationError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeolocationOperation {
    CurrentPosition(PositionOptions),
}

impl Operation for GeolocationOperation {
    type Output = LocationResult;
}

#[derive(Clone)]
pub struct Geolocation<Ev> {
    context: CapabilityContext<GeolocationOperation, Ev>,
}

impl<Ev> Capability<Ev> for Geolocation<Ev> {
    type Operation = GeolocationOperation;
    type MappedSelf<MappedEv> = Geolocation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Geolocation::new(self.context.map_event(f))
    }
}

impl<Ev> Geolocation<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<GeolocationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn current_position<F>(&self, options: PositionOptions, callback: F)
    where
        F: FnOnce(LocationResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(GeolocationOperation::CurrentPosition(options))
                .await;
            ctx.update_app(callback(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(LocationError::from_code(1, ""), LocationError::PermissionDenied);
        assert_eq!(LocationError::from_code(2, ""), LocationError::PositionUnavailable);
        assert_eq!(LocationError::from_code(3, ""), LocationError::Timeout);
        assert_eq!(
            LocationError::from_code(0, "kaput"),
            LocationError::Unknown {
                message: "kaput".into()
            }
        );
    }

    #[test]
    fn test_precise_options() {
        let json = serde_json::to_value(PositionOptions::precise()).unwrap();
        assert_eq!(json["enableHighAccuracy"], true);
        assert_eq!(json["timeoutMs"], 10_000);
        assert_eq!(json["maximumAgeMs"], 0);
    }
}
