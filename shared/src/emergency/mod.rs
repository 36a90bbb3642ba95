//! Emergency signaling: the manual SOS flow, share links and Safe Companion.

pub mod companion;
pub mod share;
pub mod sos;

pub use companion::{
    ActivationId, CompanionDirective, CompanionFlow, CompanionPhase, DistressId, LocationCapture,
    Recording,
};
pub use share::{share_link, share_message, ShareChannel};
pub use sos::{SosDirective, SosError, SosFlow, SosState};

pub const LOCATION_UNAVAILABLE_TEXT: &str = "Could not retrieve location.";

impl LocationCapture {
    /// Text shown in the escalation summary. `None` while still waiting.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        match self {
            Self::Pending => None,
            Self::Captured { location } => Some(location.display_fixed()),
            Self::Unavailable => Some(LOCATION_UNAVAILABLE_TEXT.to_string()),
        }
    }
}
