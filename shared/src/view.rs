//! Everything the shell renders, derived from the model on every render.

use serde::{Deserialize, Serialize};

use crate::emergency::{CompanionFlow, CompanionPhase, Recording, SosFlow, SosState};
use crate::error::Notice;
use crate::fake_call::{FakeCall, FakeCallState, FakeCallTone, FakeCallVoice};
use crate::locale::{Locale, LocalePack};
use crate::map::{to_geojson, MapScene};
use crate::model::Model;
use crate::presentation::{route_details, RouteDetailsState};
use crate::route::{MapView, TransportMode};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocaleOption {
    pub code: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertView {
    pub key: String,
    pub message: String,
}

impl From<Notice> for AlertView {
    fn from(notice: Notice) -> Self {
        Self {
            key: notice.key().to_string(),
            message: notice.message().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteFormView {
    pub start: String,
    pub end: String,
    pub mode: TransportMode,
    pub is_loading: bool,
    pub locating_start: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum SosView {
    Hidden,
    Locating,
    #[serde(rename_all = "camelCase")]
    Confirming { location_text: String },
    #[serde(rename_all = "camelCase")]
    Contact {
        location_text: String,
        phone: String,
        can_share: bool,
    },
    #[serde(rename_all = "camelCase")]
    Shared { channel: String, phone: String },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "dialog", rename_all = "camelCase")]
pub enum CompanionDialog {
    None,
    Disclosure,
    RequestingPermission,
    #[serde(rename_all = "camelCase")]
    CountingDown {
        remaining: u8,
        total: u8,
    },
    /// Summary of the simulated emergency actions.
    #[serde(rename_all = "camelCase")]
    Escalated {
        location_text: Option<String>,
        recording: bool,
        emergency_number: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompanionView {
    pub enabled: bool,
    pub listening: bool,
    pub dialog: CompanionDialog,
    pub keywords: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum FakeCallView {
    Idle,
    #[serde(rename_all = "camelCase")]
    Configuring {
        voice: FakeCallVoice,
        tone: FakeCallTone,
        message: String,
        scenarios: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Ringing {
        caller_name: String,
        caller_type: String,
        caller_initial: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub locale: String,
    pub locales: Vec<LocaleOption>,
    pub form: RouteFormView,
    pub details: RouteDetailsState,
    pub map_view: MapView,
    pub map: MapScene,
    /// The same scene as a GeoJSON `FeatureCollection`.
    pub map_geojson: String,
    pub sos: SosView,
    pub companion: CompanionView,
    pub fake_call: FakeCallView,
    pub alert: Option<AlertView>,
    pub saved_reports: usize,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn sos_view(sos: &SosFlow) -> SosView {
    match sos.state() {
        SosState::Idle => SosView::Hidden,
        SosState::LocationRequested => SosView::Locating,
        SosState::Confirming { location } => SosView::Confirming {
            location_text: location.display_fixed(),
        },
        SosState::Confirmed { location, phone } => SosView::Contact {
            location_text: location.display_fixed(),
            can_share: phone.trim().chars().count() > crate::emergency::sos::MIN_PHONE_CHARS,
            phone: phone.clone(),
        },
        SosState::Shared { phone, channel, .. } => SosView::Shared {
            channel: channel.label().to_string(),
            phone: phone.clone(),
        },
    }
}

fn companion_view(
    companion: &CompanionFlow,
    pack: &LocalePack,
    emergency_number: &str,
) -> CompanionView {
    let dialog = match companion.phase() {
        CompanionPhase::Inactive | CompanionPhase::Listening { .. } => CompanionDialog::None,
        CompanionPhase::Disclosure => CompanionDialog::Disclosure,
        CompanionPhase::RequestingPermission { .. } => CompanionDialog::RequestingPermission,
        CompanionPhase::CountingDown { remaining, .. } => CompanionDialog::CountingDown {
            remaining: *remaining,
            total: companion.countdown_secs(),
        },
        CompanionPhase::Escalated {
            location, recording, ..
        } => CompanionDialog::Escalated {
            location_text: location.summary(),
            recording: matches!(recording, Recording::Active(_)),
            emergency_number: emergency_number.to_string(),
        },
    };
    CompanionView {
        enabled: companion.is_enabled(),
        listening: matches!(companion.phase(), CompanionPhase::Listening { .. }),
        dialog,
        keywords: strings(pack.distress_keywords),
    }
}

fn fake_call_view(call: &FakeCall, pack: &LocalePack) -> FakeCallView {
    match call.state() {
        FakeCallState::Idle => FakeCallView::Idle,
        FakeCallState::Configuring(options) => FakeCallView::Configuring {
            voice: options.voice,
            tone: options.tone,
            message: options.message.clone(),
            scenarios: strings(pack.scenarios),
        },
        FakeCallState::Ringing { .. } => FakeCallView::Ringing {
            caller_name: pack.caller_name.to_string(),
            caller_type: pack.caller_type.to_string(),
            caller_initial: pack.caller_name.chars().take(1).collect(),
        },
    }
}

#[must_use]
pub fn view_model(model: &Model) -> ViewModel {
    let pack = model.locale.pack();
    let map = model.map.scene(model.route.as_ref());
    let map_geojson = serde_json::to_string(&to_geojson(&map)).unwrap_or_else(|e| {
        tracing::error!(error = %e, "could not encode map scene");
        String::new()
    });

    ViewModel {
        locale: model.locale.code().to_string(),
        locales: Locale::ALL
            .into_iter()
            .map(|l| LocaleOption {
                code: l.code().to_string(),
                name: l.native_name().to_string(),
            })
            .collect(),
        form: RouteFormView {
            start: model.start.clone(),
            end: model.end.clone(),
            mode: model.mode,
            is_loading: model.is_loading(),
            locating_start: model.locating_start,
        },
        details: route_details(
            model.is_loading(),
            model.error.as_ref(),
            model.route.as_ref(),
            &model.step_reports,
        ),
        map_view: model.map.view(),
        map,
        map_geojson,
        sos: sos_view(&model.sos),
        companion: companion_view(&model.companion, &pack, &model.config.emergency_number),
        fake_call: fake_call_view(&model.fake_call, &pack),
        alert: model.alert.map(AlertView::from),
        saved_reports: model.report_log.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::fixtures::sample_route;

    #[test]
    fn test_empty_model_view() {
        let view = view_model(&Model::default());
        assert_eq!(view.locale, "en");
        assert_eq!(view.locales.len(), 16);
        assert_eq!(view.details, RouteDetailsState::Empty);
        assert_eq!(view.sos, SosView::Hidden);
        assert_eq!(view.fake_call, FakeCallView::Idle);
        assert!(!view.companion.enabled);
        assert_eq!(view.companion.keywords, vec!["help", "stop", "leave me"]);
        assert!(view.map.route.is_none());
    }

    #[test]
    fn test_route_and_map_reflect_same_route() {
        let mut model = Model::default();
        model.replace_route(Some(sample_route()));
        let view = view_model(&model);
        assert!(matches!(view.details, RouteDetailsState::Loaded(_)));
        assert!(view.map.route.is_some());
        assert!(view.map_geojson.contains("FeatureCollection"));
    }

    #[test]
    fn test_alert_view_carries_key_and_text() {
        let mut model = Model::default();
        model.show_alert(Notice::GeolocationNotSupported);
        let alert = view_model(&model).alert.unwrap();
        assert_eq!(alert.key, "alerts.geolocationNotSupported");
        assert_eq!(alert.message, "Geolocation is not supported by this browser.");
    }

    #[test]
    fn test_ringing_shows_caller() {
        let mut model = Model::default();
        let pack = model.locale.pack();
        model.fake_call.open(&pack);
        model.fake_call.start(&[], &pack);
        assert_eq!(
            view_model(&model).fake_call,
            FakeCallView::Ringing {
                caller_name: "Mom".into(),
                caller_type: "Mobile".into(),
                caller_initial: "M".into(),
            }
        );
    }
}
