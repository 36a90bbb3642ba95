//! Outbound share links for the SOS contact step.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShareChannel {
    WhatsApp,
    Sms,
}

impl ShareChannel {
    /// Label used in the "sharing initiated" summary.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WhatsApp => "WhatsApp",
            Self::Sms => "Message",
        }
    }
}

/// Digits only: `"+91 98765-43210"` -> `"919876543210"`.
#[must_use]
pub fn clean_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[must_use]
pub fn map_url(location: GeoPoint) -> String {
    format!(
        "https://www.google.com/maps?q={},{}",
        location.lat, location.lng
    )
}

#[must_use]
pub fn share_message(location: GeoPoint) -> String {
    format!(
        "Emergency! I've activated an SOS alert from AstraPath. My current location is \
         approximately {lat}, {lng}. Please track my location here: {url}",
        lat = location.lat,
        lng = location.lng,
        url = map_url(location),
    )
}

/// Percent-encodes like `encodeURIComponent`.
#[must_use]
pub fn encode_component(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%7E", "~")
}

/// Builds the deep link for `channel`. The chat link carries the digits
/// only; the SMS link keeps the number exactly as entered.
#[must_use]
pub fn share_link(channel: ShareChannel, phone: &str, location: GeoPoint) -> String {
    let body = encode_component(&share_message(location));
    match channel {
        ShareChannel::WhatsApp => format!("https://wa.me/{}?text={body}", clean_phone(phone)),
        ShareChannel::Sms => format!("sms:{phone}?body={body}"),
    }
}
