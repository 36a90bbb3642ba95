use serde::{Deserialize, Serialize};

use crate::capabilities::{LocationError, MediaError};
use crate::route::gateway::{RouteFetchError, RouteQueryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    Configuration,
    Network,
    Timeout,
    RateLimited,
    ExternalService,
    MalformedResponse,
    Location,
    LocationPermissionDenied,
    LocationUnavailable,
    LocationTimeout,
    Media,
    MediaPermissionDenied,
    FeatureUnavailable,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Configuration => "CONFIG_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::RateLimited => "RATE_LIMITED",
            Self::ExternalService => "EXTERNAL_SERVICE_ERROR",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::Location => "LOCATION_ERROR",
            Self::LocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::LocationUnavailable => "LOCATION_UNAVAILABLE",
            Self::LocationTimeout => "LOCATION_TIMEOUT",
            Self::Media => "MEDIA_ERROR",
            Self::MediaPermissionDenied => "MEDIA_PERMISSION_DENIED",
            Self::FeatureUnavailable => "FEATURE_UNAVAILABLE",
        }
    }
}

/// Blocking or inline notices the shell shows to the user, keyed by their
/// translation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Notice {
    EnterStartAndEnd,
    RouteGenerationError,
    LocationRetrievalError,
    GeolocationNotSupported,
    MicPermissionDenied,
    CompanionStartError,
    MicCamPermissionRequired,
    LocationGenericError,
    LocationPermissionDenied,
    LocationUnavailable,
    LocationTimeout,
}

impl Notice {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::EnterStartAndEnd => "alerts.enterStartAndEnd",
            Self::RouteGenerationError => "alerts.routeGenerationError",
            Self::LocationRetrievalError => "alerts.locationRetrievalError",
            Self::GeolocationNotSupported => "alerts.geolocationNotSupported",
            Self::MicPermissionDenied => "alerts.micPermissionDenied",
            Self::CompanionStartError => "alerts.companionStartError",
            Self::MicCamPermissionRequired => "alerts.micCamPermissionRequired",
            Self::LocationGenericError => "alerts.locationGenericError",
            Self::LocationPermissionDenied => "alerts.locationPermissionDenied",
            Self::LocationUnavailable => "alerts.locationUnavailable",
            Self::LocationTimeout => "alerts.locationTimeout",
        }
    }

    /// English text; every locale currently shares it.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::EnterStartAndEnd => "Please enter both a starting point and a destination.",
            Self::RouteGenerationError => {
                "Sorry, we couldn't generate a route. The model may be unavailable or the request was invalid. Please try again."
            }
            Self::LocationRetrievalError => {
                "Could not retrieve your location. Please enable location services to use the SOS feature."
            }
            Self::GeolocationNotSupported => "Geolocation is not supported by this browser.",
            Self::MicPermissionDenied => {
                "Microphone permission denied. Safe Companion mode has been disabled."
            }
            Self::CompanionStartError => "Could not start Safe Companion mode. Please try again.",
            Self::MicCamPermissionRequired => {
                "Microphone and Camera permissions are required for Safe Companion mode."
            }
            Self::LocationGenericError => {
                "Could not retrieve your location. Please ensure location services are enabled and permissions are granted in your browser settings."
            }
            Self::LocationPermissionDenied => {
                "Location permission denied. Please enable it in your browser settings to use this feature."
            }
            Self::LocationUnavailable => {
                "Location information is currently unavailable. Please check your device's GPS or try again."
            }
            Self::LocationTimeout => "The request to get your location timed out. Please try again.",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// The notice shown to the user for this error.
    #[must_use]
    pub const fn notice(&self) -> Notice {
        match self.kind {
            ErrorKind::Validation => Notice::EnterStartAndEnd,
            ErrorKind::Network
            | ErrorKind::Timeout
            | ErrorKind::RateLimited
            | ErrorKind::ExternalService
            | ErrorKind::MalformedResponse
            | ErrorKind::Configuration => Notice::RouteGenerationError,
            ErrorKind::LocationPermissionDenied => Notice::LocationPermissionDenied,
            ErrorKind::LocationUnavailable => Notice::LocationUnavailable,
            ErrorKind::LocationTimeout => Notice::LocationTimeout,
            ErrorKind::Location => Notice::LocationGenericError,
            ErrorKind::FeatureUnavailable => Notice::GeolocationNotSupported,
            ErrorKind::MediaPermissionDenied => Notice::MicCamPermissionRequired,
            ErrorKind::Media => Notice::CompanionStartError,
        }
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        self.notice().message().to_string()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " ({internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<RouteQueryError> for AppError {
    fn from(e: RouteQueryError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

impl From<RouteFetchError> for AppError {
    fn from(e: RouteFetchError) -> Self {
        let kind = match &e {
            RouteFetchError::MissingApiKey | RouteFetchError::Request { .. } => {
                ErrorKind::Configuration
            }
            RouteFetchError::Transport { .. } => ErrorKind::Network,
            RouteFetchError::Timeout => ErrorKind::Timeout,
            RouteFetchError::Status { status: 429, .. } => ErrorKind::RateLimited,
            RouteFetchError::Status { .. } | RouteFetchError::NoCandidates { .. } => {
                ErrorKind::ExternalService
            }
            RouteFetchError::ResponseTooLarge { .. }
            | RouteFetchError::MalformedJson { .. }
            | RouteFetchError::Invalid(_) => ErrorKind::MalformedResponse,
        };
        AppError::new(kind, "route generation failed").with_internal(e.to_string())
    }
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        let kind = match &e {
            LocationError::Unsupported => ErrorKind::FeatureUnavailable,
            LocationError::PermissionDenied => ErrorKind::LocationPermissionDenied,
            LocationError::PositionUnavailable => ErrorKind::LocationUnavailable,
            LocationError::Timeout => ErrorKind::LocationTimeout,
            LocationError::Unknown { .. } => ErrorKind::Location,
        };
        AppError::new(kind, e.to_string())
    }
}

impl From<MediaError> for AppError {
    fn from(e: MediaError) -> Self {
        let kind = match &e {
            MediaError::PermissionDenied => ErrorKind::MediaPermissionDenied,
            MediaError::Unsupported | MediaError::DeviceUnavailable | MediaError::Failed { .. } => {
                ErrorKind::Media
            }
        };
        AppError::new(kind, e.to_string())
    }
}
