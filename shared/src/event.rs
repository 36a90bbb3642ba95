use serde::{Deserialize, Serialize};

use crate::capabilities::{
    KvError, LocationResult, MediaError, RecognitionEvent, RecordingId, SessionId,
    SynthesisOutput, TimerId, TimerOutput, VoiceInfo,
};
use crate::config::AppConfig;
use crate::emergency::{ActivationId, DistressId, ShareChannel};
use crate::fake_call::{FakeCallTone, FakeCallVoice};
use crate::model::RequestId;
use crate::reports::ReportKind;
use crate::route::gateway::RouteFetchError;
use crate::route::{MapView, RouteData, TransportMode};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Event {
    AppStarted(AppConfig),
    LanguageChanged(String),
    AlertDismissed,

    // Route form
    StartChanged(String),
    EndChanged(String),
    ModeChanged(TransportMode),
    FindRoute,
    UseCurrentLocation,
    MapViewChanged(MapView),

    // Step reports, keyed by 1-based step number
    ReportOpened {
        step: u32,
    },
    ReportKindSelected {
        step: u32,
        kind: ReportKind,
    },
    ReportDescriptionChanged {
        step: u32,
        description: String,
    },
    ReportCancelled {
        step: u32,
    },
    ReportSubmitted {
        step: u32,
    },

    // SOS
    SosRequested,
    SosConfirmed,
    SosCancelled,
    SosPhoneChanged(String),
    SosShare(ShareChannel),
    SosClosed,

    // Safe Companion
    CompanionToggled,
    CompanionDisclosureAccepted,
    CompanionDisclosureDeclined,
    DistressCancelled,
    DistressClosed,

    // Fake call
    FakeCallOpened,
    FakeCallClosed,
    FakeCallVoiceSelected(FakeCallVoice),
    FakeCallToneSelected(FakeCallTone),
    FakeCallScenarioSelected(String),
    FakeCallStarted,
    FakeCallDeclined,
    VoicesRequested,

    // Capability callbacks
    #[serde(skip)]
    RouteFetched {
        request_id: RequestId,
        outcome: Box<Result<RouteData, RouteFetchError>>,
    },
    #[serde(skip)]
    RouteDeadline {
        request_id: RequestId,
        output: TimerOutput,
    },
    #[serde(skip)]
    StartLocated(LocationResult),
    #[serde(skip)]
    ReportTimestamped {
        step: u32,
        instruction: String,
        kind: ReportKind,
        description: String,
        epoch_ms: i64,
    },
    #[serde(skip)]
    ReportAckElapsed {
        step: u32,
        output: TimerOutput,
    },
    #[serde(skip)]
    ReportsLoaded(Result<Option<Vec<u8>>, KvError>),
    #[serde(skip)]
    ReportsSaved(Result<(), KvError>),
    #[serde(skip)]
    SosLocated(LocationResult),
    #[serde(skip)]
    MediaAccessChecked {
        activation: ActivationId,
        result: Result<(), MediaError>,
    },
    #[serde(skip)]
    Recognition {
        session: SessionId,
        event: RecognitionEvent,
    },
    #[serde(skip)]
    DistressTick {
        timer: TimerId,
        output: TimerOutput,
    },
    #[serde(skip)]
    DistressLocated {
        distress: DistressId,
        result: LocationResult,
    },
    #[serde(skip)]
    RecordingStarted {
        recording: RecordingId,
        result: Result<RecordingId, MediaError>,
    },
    #[serde(skip)]
    FakeCallEnded(SynthesisOutput),
    #[serde(skip)]
    VoicesLoaded(Vec<VoiceInfo>),
}

impl Event {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted(_) => "app_started",
            Self::LanguageChanged(_) => "language_changed",
            Self::AlertDismissed => "alert_dismissed",
            Self::StartChanged(_) => "start_changed",
            Self::EndChanged(_) => "end_changed",
            Self::ModeChanged(_) => "mode_changed",
            Self::FindRoute => "find_route",
            Self::UseCurrentLocation => "use_current_location",
            Self::MapViewChanged(_) => "map_view_changed",
            Self::ReportOpened { .. } => "report_opened",
            Self::ReportKindSelected { .. } => "report_kind_selected",
            Self::ReportDescriptionChanged { .. } => "report_description_changed",
            Self::ReportCancelled { .. } => "report_cancelled",
            Self::ReportSubmitted { .. } => "report_submitted",
            Self::SosRequested => "sos_requested",
            Self::SosConfirmed => "sos_confirmed",
            Self::SosCancelled => "sos_cancelled",
            Self::SosPhoneChanged(_) => "sos_phone_changed",
            Self::SosShare(_) => "sos_share",
            Self::SosClosed => "sos_closed",
            Self::CompanionToggled => "companion_toggled",
            Self::CompanionDisclosureAccepted => "companion_disclosure_accepted",
            Self::CompanionDisclosureDeclined => "companion_disclosure_declined",
            Self::DistressCancelled => "distress_cancelled",
            Self::DistressClosed => "distress_closed",
            Self::FakeCallOpened => "fake_call_opened",
            Self::FakeCallClosed => "fake_call_closed",
            Self::FakeCallVoiceSelected(_) => "fake_call_voice_selected",
            Self::FakeCallToneSelected(_) => "fake_call_tone_selected",
            Self::FakeCallScenarioSelected(_) => "fake_call_scenario_selected",
            Self::FakeCallStarted => "fake_call_started",
            Self::FakeCallDeclined => "fake_call_declined",
            Self::VoicesRequested => "voices_requested",
            Self::RouteFetched { .. } => "route_fetched",
            Self::RouteDeadline { .. } => "route_deadline",
            Self::StartLocated(_) => "start_located",
            Self::ReportTimestamped { .. } => "report_timestamped",
            Self::ReportAckElapsed { .. } => "report_ack_elapsed",
            Self::ReportsLoaded(_) => "reports_loaded",
            Self::ReportsSaved(_) => "reports_saved",
            Self::SosLocated(_) => "sos_located",
            Self::MediaAccessChecked { .. } => "media_access_checked",
            Self::Recognition { .. } => "recognition",
            Self::DistressTick { .. } => "distress_tick",
            Self::DistressLocated { .. } => "distress_located",
            Self::RecordingStarted { .. } => "recording_started",
            Self::FakeCallEnded(_) => "fake_call_ended",
            Self::VoicesLoaded(_) => "voices_loaded",
        }
    }

    /// Events that come straight from the user rather than from a capability.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::AppStarted(_)
                | Self::RouteFetched { .. }
                | Self::RouteDeadline { .. }
                | Self::StartLocated(_)
                | Self::ReportTimestamped { .. }
                | Self::ReportAckElapsed { .. }
                | Self::ReportsLoaded(_)
                | Self::ReportsSaved(_)
                | Self::SosLocated(_)
                | Self::MediaAccessChecked { .. }
                | Self::Recognition { .. }
                | Self::DistressTick { .. }
                | Self::DistressLocated { .. }
                | Self::RecordingStarted { .. }
                | Self::FakeCallEnded(_)
                | Self::VoicesLoaded(_)
        )
    }
}
