use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::capabilities::{HttpError, ValidatedUrl};

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_REGION: &str = "India";
pub const DEFAULT_EMERGENCY_NUMBER: &str = "112";
pub const DEFAULT_COUNTDOWN_SECS: u8 = 10;
pub const DEFAULT_REPORT_ACK_MS: u64 = 3_000;
pub const DEFAULT_DIAL_PREFIX: &str = "+91 ";
pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid API base URL: {0}")]
    BaseUrl(#[from] HttpError),
    #[error("model name cannot be empty")]
    EmptyModel,
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
    #[error("distress countdown must be at least one second")]
    ZeroCountdown,
    #[error("emergency number must be digits only, got '{0}'")]
    EmergencyNumber(String),
}

/// Runtime settings handed over by the shell at start-up.
///
/// The API key travels in here once and is moved into
/// [`crate::model::RuntimeSecrets`] straight away.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub api_base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
    pub region: String,
    pub emergency_number: String,
    pub distress_countdown_secs: u8,
    pub report_ack_ms: u64,
    pub dial_prefix: String,
    pub default_locale: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            region: DEFAULT_REGION.to_string(),
            emergency_number: DEFAULT_EMERGENCY_NUMBER.to_string(),
            distress_countdown_secs: DEFAULT_COUNTDOWN_SECS,
            report_ack_ms: DEFAULT_REPORT_ACK_MS,
            dial_prefix: DEFAULT_DIAL_PREFIX.to_string(),
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

// Keep the key out of logs.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("api_key_present", &self.api_key.is_some())
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("region", &self.region)
            .field("emergency_number", &self.emergency_number)
            .field("distress_countdown_secs", &self.distress_countdown_secs)
            .field("report_ack_ms", &self.report_ack_ms)
            .field("dial_prefix", &self.dial_prefix)
            .field("default_locale", &self.default_locale)
            .finish()
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ValidatedUrl::new(self.api_base_url.clone())?;
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.distress_countdown_secs == 0 {
            return Err(ConfigError::ZeroCountdown);
        }
        if self.emergency_number.is_empty()
            || !self.emergency_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ConfigError::EmergencyNumber(self.emergency_number.clone()));
        }
        Ok(())
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub fn report_ack(&self) -> Duration {
        Duration::from_millis(self.report_ack_ms)
    }

    /// `generateContent` endpoint for the configured model.
    pub fn generate_content_url(&self) -> Result<ValidatedUrl, HttpError> {
        ValidatedUrl::new(self.api_base_url.clone())?
            .join(&format!("v1beta/models/{}:generateContent", self.model.trim()))
    }
}
