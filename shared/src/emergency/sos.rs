//! Manual SOS: locate, confirm, then share the position with one contact.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::share::{share_link, ShareChannel};
use crate::capabilities::{LocationError, LocationResult};
use crate::error::Notice;
use crate::geo::GeoPoint;

/// A share needs more than this many non-blank characters in the phone field.
pub const MIN_PHONE_CHARS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SosError {
    #[error("SOS has not been confirmed")]
    NotConfirmed,
    #[error("location has already been shared via {0}")]
    AlreadyShared(String),
    #[error("phone number is too short")]
    PhoneTooShort,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SosState {
    #[default]
    Idle,
    LocationRequested,
    Confirming {
        location: GeoPoint,
    },
    /// Confirmed; collecting the contact number.
    Confirmed {
        location: GeoPoint,
        phone: String,
    },
    Shared {
        location: GeoPoint,
        phone: String,
        channel: ShareChannel,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SosDirective {
    LocateDevice,
    OpenUrl(String),
    Alert(Notice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SosFlow {
    state: SosState,
    dial_prefix: String,
}

impl Default for SosFlow {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DIAL_PREFIX)
    }
}

impl SosFlow {
    #[must_use]
    pub fn new(dial_prefix: impl Into<String>) -> Self {
        Self {
            state: SosState::Idle,
            dial_prefix: dial_prefix.into(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &SosState {
        &self.state
    }

    /// SOS pressed. Ignored while a flow is already open.
    pub fn request(&mut self) -> Vec<SosDirective> {
        if self.state != SosState::Idle {
            tracing::debug!(state = ?self.state, "SOS already in progress");
            return Vec::new();
        }
        self.state = SosState::LocationRequested;
        vec![SosDirective::LocateDevice]
    }

    pub fn located(&mut self, result: LocationResult) -> Vec<SosDirective> {
        if self.state != SosState::LocationRequested {
            tracing::debug!("dropping SOS location fix, flow no longer waiting");
            return Vec::new();
        }
        match result {
            Ok(position) => {
                self.state = SosState::Confirming {
                    location: position.coords,
                };
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "SOS location failed");
                self.state = SosState::Idle;
                let notice = if e == LocationError::Unsupported {
                    Notice::GeolocationNotSupported
                } else {
                    Notice::LocationRetrievalError
                };
                vec![SosDirective::Alert(notice)]
            }
        }
    }

    pub fn confirm(&mut self) -> Result<GeoPoint, SosError> {
        let SosState::Confirming { location } = self.state else {
            return Err(SosError::NotConfirmed);
        };
        tracing::info!(lat = location.lat, lng = location.lng, "SOS alert confirmed");
        self.state = SosState::Confirmed {
            location,
            phone: self.dial_prefix.clone(),
        };
        Ok(location)
    }

    /// Cancel from the confirmation dialog, or before the fix arrived.
    pub fn cancel(&mut self) {
        if matches!(
            self.state,
            SosState::LocationRequested | SosState::Confirming { .. }
        ) {
            self.state = SosState::Idle;
        }
    }

    /// Applies an edit of the phone field; the dial prefix cannot be removed.
    pub fn edit_phone(&mut self, value: &str) {
        let prefix = self.dial_prefix.clone();
        if let SosState::Confirmed { phone, .. } = &mut self.state {
            if let Some(next) = apply_phone_edit(&prefix, value) {
                *phone = next;
            }
        }
    }

    pub fn share(&mut self, channel: ShareChannel) -> Result<Vec<SosDirective>, SosError> {
        match &self.state {
            SosState::Confirmed { location, phone } => {
                if phone.trim().chars().count() <= MIN_PHONE_CHARS {
                    return Err(SosError::PhoneTooShort);
                }
                let url = share_link(channel, phone, *location);
                self.state = SosState::Shared {
                    location: *location,
                    phone: phone.clone(),
                    channel,
                };
                Ok(vec![SosDirective::OpenUrl(url)])
            }
            SosState::Shared { channel, .. } => {
                Err(SosError::AlreadyShared(channel.label().to_string()))
            }
            _ => Err(SosError::NotConfirmed),
        }
    }

    /// Closes the flow from any state, discarding location and phone.
    pub fn close(&mut self) {
        self.state = SosState::Idle;
    }
}

/// Returns the new field value, or `None` to keep the current one.
#[must_use]
pub fn apply_phone_edit(prefix: &str, value: &str) -> Option<String> {
    if let Some(rest) = value.strip_prefix(prefix) {
        return rest
            .chars()
            .all(|c| c.is_ascii_digit())
            .then(|| value.to_string());
    }
    // Deleting into the prefix restores it.
    let prefix_head = prefix.trim_end();
    if !value.is_empty() && prefix_head.starts_with(value) {
        return Some(prefix.to_string());
    }
    None
}
