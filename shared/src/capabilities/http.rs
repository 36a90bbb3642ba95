use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_RESPONSE_BODY_SIZE: usize = 8 * 1024 * 1024;

/// An outbound URL that passed scheme, host and length checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedUrl {
    url: String,
    host: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, HttpError> {
        let url = url.into();
        let parsed = Self::validate(&url)?;
        let host = parsed
            .host_str()
            .map(str::to_lowercase)
            .ok_or_else(|| HttpError::InvalidUrl {
                url: Self::truncate_url(&url),
                reason: "missing host".to_string(),
            })?;

        Ok(Self {
            url: parsed.to_string(),
            host,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Appends `segment` to the path, keeping exactly one slash between them.
    pub fn join(&self, segment: &str) -> Result<Self, HttpError> {
        let base = self.url.trim_end_matches('/');
        let segment = segment.trim_start_matches('/');
        Self::new(format!("{base}/{segment}"))
    }

    fn validate(url: &str) -> Result<Url, HttpError> {
        if url.trim().is_empty() {
            return Err(HttpError::InvalidUrl {
                url: url.to_string(),
                reason: "URL cannot be empty".to_string(),
            });
        }

        if url.len() > MAX_URL_LENGTH {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            });
        }

        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl {
            url: Self::truncate_url(url),
            reason: e.to_string(),
        })?;

        if parsed.scheme() != "https" {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!("invalid scheme '{}', only 'https' is allowed", parsed.scheme()),
            });
        }

        let Some(host) = parsed.host_str().map(str::to_lowercase) else {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "URL must have a host".to_string(),
            });
        };

        if Self::is_private_host(&host) {
            return Err(HttpError::PrivateNetworkBlocked {
                url: Self::truncate_url(url),
                host,
            });
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }

        Ok(parsed)
    }

    fn is_private_host(host: &str) -> bool {
        if matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]" | "0.0.0.0") {
            return true;
        }

        if host.ends_with(".local") || host.ends_with(".localhost") || host.ends_with(".internal")
        {
            return true;
        }

        if host.starts_with("10.") || host.starts_with("192.168.") || host.starts_with("169.254.")
        {
            return true;
        }

        host.strip_prefix("172.")
            .and_then(|rest| rest.split('.').next())
            .and_then(|octet| octet.parse::<u8>().ok())
            .is_some_and(|octet| (16..=31).contains(&octet))
    }

    fn truncate_url(url: &str) -> String {
        if url.len() <= 100 {
            url.to_string()
        } else {
            let cut = (0..=100).rev().find(|&i| url.is_char_boundary(i)).unwrap_or(0);
            format!("{}...", &url[..cut])
        }
    }
}

impl std::fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("private network access blocked: {url} resolves to {host}")]
    PrivateNetworkBlocked { url: String, host: String },

    #[error("HTTP error {status}: {message}")]
    HttpStatus { status: u16, message: String },
}

impl HttpError {
    /// Maps a non-success status to an error; `None` for 2xx.
    pub fn from_status(status: u16, body: &[u8]) -> Option<Self> {
        if (200..300).contains(&status) {
            return None;
        }
        let message = serde_json::from_slice::<ApiErrorEnvelope>(body)
            .ok()
            .map(|envelope| envelope.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("request failed with status {status}"));

        Some(Self::HttpStatus { status, message })
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}
