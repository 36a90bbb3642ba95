//! Safe Companion: continuous keyword listening, a cancelable countdown and
//! automatic escalation.
//!
//! The flow never performs effects itself. Every transition returns the
//! [`CompanionDirective`]s the app has to carry out, and every asynchronous
//! answer (recognition events, timer ticks, location fixes, recorder
//! start-up) is matched against the ids the flow handed out. Answers for a
//! session, timer or recording the flow has moved past are dropped, which is
//! what keeps escalation to exactly one per countdown.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capabilities::{
    LocationResult, MediaError, RecognitionErrorCode, RecognitionEvent, RecordingId, SessionId,
    TimerId,
};
use crate::error::{AppError, Notice};
use crate::geo::GeoPoint;
use crate::locale::LocalePack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivationId(Uuid);

impl ActivationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActivationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies one distress trigger, so a location fix lands on the
/// countdown that asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistressId(Uuid);

impl DistressId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DistressId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LocationCapture {
    #[default]
    Pending,
    Captured {
        location: GeoPoint,
    },
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recording {
    Starting(RecordingId),
    Active(RecordingId),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CompanionPhase {
    #[default]
    Inactive,
    /// Informational disclosure shown; waiting for the user to accept.
    Disclosure,
    RequestingPermission {
        activation: ActivationId,
    },
    Listening {
        session: SessionId,
    },
    CountingDown {
        distress: DistressId,
        remaining: u8,
        tick: TimerId,
        location: LocationCapture,
    },
    Escalated {
        distress: DistressId,
        location: LocationCapture,
        recording: Recording,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanionDirective {
    CheckMediaAccess { activation: ActivationId },
    StartRecognition { session: SessionId },
    StopRecognition { session: SessionId },
    ScheduleTick { timer: TimerId },
    CancelTick { timer: TimerId },
    LocateDevice { distress: DistressId },
    StartRecording { recording: RecordingId },
    StopRecording { recording: RecordingId },
    PlaceEmergencyCall,
    Alert(Notice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanionFlow {
    phase: CompanionPhase,
    countdown_secs: u8,
}

impl Default for CompanionFlow {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_COUNTDOWN_SECS)
    }
}

impl CompanionFlow {
    #[must_use]
    pub fn new(countdown_secs: u8) -> Self {
        Self {
            phase: CompanionPhase::Inactive,
            countdown_secs: countdown_secs.max(1),
        }
    }

    #[must_use]
    pub fn phase(&self) -> &CompanionPhase {
        &self.phase
    }

    #[must_use]
    pub fn countdown_secs(&self) -> u8 {
        self.countdown_secs
    }

    /// Companion mode counts as enabled from the moment listening starts
    /// until it is switched off.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(
            self.phase,
            CompanionPhase::Listening { .. }
                | CompanionPhase::CountingDown { .. }
                | CompanionPhase::Escalated { .. }
        )
    }

    /// Header toggle: opens the disclosure when off, hard-resets when on.
    pub fn toggle(&mut self) -> Vec<CompanionDirective> {
        match self.phase {
            CompanionPhase::Inactive => {
                self.phase = CompanionPhase::Disclosure;
                Vec::new()
            }
            _ => self.deactivate(),
        }
    }

    pub fn accept_disclosure(&mut self) -> Vec<CompanionDirective> {
        if self.phase != CompanionPhase::Disclosure {
            return Vec::new();
        }
        let activation = ActivationId::new();
        self.phase = CompanionPhase::RequestingPermission { activation };
        vec![CompanionDirective::CheckMediaAccess { activation }]
    }

    pub fn decline_disclosure(&mut self) {
        if self.phase == CompanionPhase::Disclosure {
            self.phase = CompanionPhase::Inactive;
        }
    }

    pub fn media_access(
        &mut self,
        activation: ActivationId,
        result: Result<(), MediaError>,
    ) -> Vec<CompanionDirective> {
        if self.phase != (CompanionPhase::RequestingPermission { activation }) {
            tracing::debug!("dropping stale media permission answer");
            return Vec::new();
        }
        match result {
            Ok(()) => {
                tracing::info!("safe companion activated");
                self.listen()
            }
            Err(e) => {
                let error = AppError::from(e);
                tracing::warn!(error = %error, "safe companion could not open media");
                self.phase = CompanionPhase::Inactive;
                vec![CompanionDirective::Alert(error.notice())]
            }
        }
    }

    /// Hard reset to `Inactive`, releasing whatever the current phase holds.
    pub fn deactivate(&mut self) -> Vec<CompanionDirective> {
        let directives = match std::mem::take(&mut self.phase) {
            CompanionPhase::Listening { session } => {
                vec![CompanionDirective::StopRecognition { session }]
            }
            CompanionPhase::CountingDown { tick, .. } => {
                vec![CompanionDirective::CancelTick { timer: tick }]
            }
            CompanionPhase::Escalated { recording, .. } => Self::release(recording),
            CompanionPhase::Inactive
            | CompanionPhase::Disclosure
            | CompanionPhase::RequestingPermission { .. } => Vec::new(),
        };
        if !directives.is_empty() {
            tracing::info!("safe companion deactivated");
        }
        directives
    }

    pub fn recognition_event(
        &mut self,
        session: SessionId,
        event: RecognitionEvent,
        pack: &LocalePack,
    ) -> Vec<CompanionDirective> {
        let CompanionPhase::Listening { session: current } = self.phase else {
            tracing::debug!(?event, "recognition event outside listening, ignored");
            return Vec::new();
        };
        if current != session {
            tracing::debug!("recognition event from a stopped session, ignored");
            return Vec::new();
        }

        match event {
            RecognitionEvent::Result {
                transcript,
                is_final: true,
            } => match pack.matches_distress(&transcript) {
                Some(keyword) => {
                    tracing::warn!(keyword, "distress keyword detected");
                    self.trigger(current)
                }
                None => Vec::new(),
            },
            RecognitionEvent::Result { .. } => Vec::new(),
            // Ended on its own while still wanted: start a fresh session.
            RecognitionEvent::End => {
                tracing::debug!("recognition ended unexpectedly, restarting");
                self.listen()
            }
            RecognitionEvent::Error { code } => self.recognition_error(current, &code),
        }
    }

    fn recognition_error(
        &mut self,
        session: SessionId,
        code: &RecognitionErrorCode,
    ) -> Vec<CompanionDirective> {
        if !code.is_fatal() {
            tracing::debug!(?code, "transient recognition error ignored");
            return Vec::new();
        }
        tracing::error!(?code, "recognition cannot continue, disabling companion mode");
        self.phase = CompanionPhase::Inactive;
        let notice = if code.is_permission_revoked() {
            Notice::MicPermissionDenied
        } else {
            Notice::CompanionStartError
        };
        vec![
            CompanionDirective::StopRecognition { session },
            CompanionDirective::Alert(notice),
        ]
    }

    /// Restarts listening in a new language. Only a live session is
    /// restarted; paused phases pick the language up when they resume.
    pub fn language_changed(&mut self) -> Vec<CompanionDirective> {
        let CompanionPhase::Listening { session } = self.phase else {
            return Vec::new();
        };
        let mut directives = vec![CompanionDirective::StopRecognition { session }];
        directives.extend(self.listen());
        directives
    }

    fn listen(&mut self) -> Vec<CompanionDirective> {
        let session = SessionId::new();
        self.phase = CompanionPhase::Listening { session };
        vec![CompanionDirective::StartRecognition { session }]
    }

    fn trigger(&mut self, session: SessionId) -> Vec<CompanionDirective> {
        let distress = DistressId::new();
        let tick = TimerId::new();
        self.phase = CompanionPhase::CountingDown {
            distress,
            remaining: self.countdown_secs,
            tick,
            location: LocationCapture::Pending,
        };
        vec![
            CompanionDirective::StopRecognition { session },
            CompanionDirective::LocateDevice { distress },
            CompanionDirective::ScheduleTick { timer: tick },
        ]
    }

    /// One countdown second elapsed. Only the live tick timer counts.
    pub fn tick(&mut self, timer: TimerId) -> Vec<CompanionDirective> {
        let CompanionPhase::CountingDown {
            distress,
            remaining,
            tick,
            location,
        } = self.phase
        else {
            tracing::debug!("countdown tick with no countdown running");
            return Vec::new();
        };
        if tick != timer {
            tracing::debug!("stale countdown tick ignored");
            return Vec::new();
        }

        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            let tick = TimerId::new();
            self.phase = CompanionPhase::CountingDown {
                distress,
                remaining,
                tick,
                location,
            };
            return vec![CompanionDirective::ScheduleTick { timer: tick }];
        }

        tracing::warn!("distress countdown expired, escalating");
        let recording = RecordingId::new();
        self.phase = CompanionPhase::Escalated {
            distress,
            location,
            recording: Recording::Starting(recording),
        };
        vec![
            CompanionDirective::StartRecording { recording },
            CompanionDirective::PlaceEmergencyCall,
        ]
    }

    /// User cancelled the countdown: back to listening, nothing escalates.
    pub fn cancel_countdown(&mut self) -> Vec<CompanionDirective> {
        let CompanionPhase::CountingDown { tick, .. } = self.phase else {
            return Vec::new();
        };
        tracing::info!("distress countdown cancelled");
        let mut directives = vec![CompanionDirective::CancelTick { timer: tick }];
        directives.extend(self.listen());
        directives
    }

    pub fn located(&mut self, for_distress: DistressId, result: LocationResult) {
        let capture = match result {
            Ok(position) => LocationCapture::Captured {
                location: position.coords,
            },
            Err(e) => {
                tracing::warn!(error = %e, "could not capture location for distress signal");
                LocationCapture::Unavailable
            }
        };
        match &mut self.phase {
            CompanionPhase::CountingDown {
                distress, location, ..
            }
            | CompanionPhase::Escalated {
                distress, location, ..
            } if *distress == for_distress && *location == LocationCapture::Pending => {
                *location = capture;
            }
            _ => tracing::debug!("distress location arrived after the flow moved on"),
        }
    }

    pub fn recording_started(
        &mut self,
        id: RecordingId,
        result: Result<RecordingId, MediaError>,
    ) -> Vec<CompanionDirective> {
        if let CompanionPhase::Escalated { recording, .. } = &mut self.phase {
            if *recording == Recording::Starting(id) {
                match result {
                    Ok(_) => {
                        tracing::info!("emergency recording started");
                        *recording = Recording::Active(id);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "could not start emergency recording");
                        *recording = Recording::Failed;
                    }
                }
                return Vec::new();
            }
        }
        // Started after the summary closed or companion mode was switched off.
        match result {
            Ok(_) => vec![CompanionDirective::StopRecording { recording: id }],
            Err(_) => Vec::new(),
        }
    }

    /// Escalation summary closed: release the recorder and listen again.
    pub fn close_escalation(&mut self) -> Vec<CompanionDirective> {
        let CompanionPhase::Escalated { recording, .. } = self.phase else {
            return Vec::new();
        };
        let mut directives = Self::release(recording);
        directives.extend(self.listen());
        directives
    }

    fn release(recording: Recording) -> Vec<CompanionDirective> {
        match recording {
            Recording::Starting(id) | Recording::Active(id) => {
                vec![CompanionDirective::StopRecording { recording: id }]
            }
            Recording::Failed => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{LocationError, Position};
    use crate::locale::Locale;

    fn listening() -> (CompanionFlow, SessionId) {
        let mut flow = CompanionFlow::new(10);
        flow.toggle();
        let directives = flow.accept_disclosure();
        let [CompanionDirective::CheckMediaAccess { activation }] = directives[..] else {
            panic!("expected media check, got {directives:?}");
        };
        let directives = flow.media_access(activation, Ok(()));
        let [CompanionDirective::StartRecognition { session }] = directives[..] else {
            panic!("expected recognition start, got {directives:?}");
        };
        (flow, session)
    }

    fn heard(flow: &mut CompanionFlow, session: SessionId, text: &str) -> Vec<CompanionDirective> {
        flow.recognition_event(
            session,
            RecognitionEvent::Result {
                transcript: text.into(),
                is_final: true,
            },
            &Locale::En.pack(),
        )
    }

    fn current_tick(flow: &CompanionFlow) -> TimerId {
        match flow.phase() {
            CompanionPhase::CountingDown { tick, .. } => *tick,
            other => panic!("not counting down: {other:?}"),
        }
    }

    fn counting_down() -> CompanionFlow {
        let (mut flow, session) = listening();
        heard(&mut flow, session, "Somebody HELP");
        flow
    }

    #[test]
    fn test_activation_requires_disclosure_and_permission() {
        let mut flow = CompanionFlow::new(10);
        assert!(flow.toggle().is_empty());
        assert_eq!(flow.phase(), &CompanionPhase::Disclosure);
        flow.decline_disclosure();
        assert_eq!(flow.phase(), &CompanionPhase::Inactive);

        flow.toggle();
        let directives = flow.accept_disclosure();
        let [CompanionDirective::CheckMediaAccess { activation }] = directives[..] else {
            panic!("expected media check");
        };
        assert_eq!(
            flow.media_access(activation, Err(MediaError::PermissionDenied)),
            vec![CompanionDirective::Alert(Notice::MicCamPermissionRequired)]
        );
        assert_eq!(flow.phase(), &CompanionPhase::Inactive);
    }

    #[test]
    fn test_missing_device_is_a_start_failure() {
        let mut flow = CompanionFlow::new(10);
        flow.toggle();
        let directives = flow.accept_disclosure();
        let [CompanionDirective::CheckMediaAccess { activation }] = directives[..] else {
            panic!("expected media check");
        };
        assert_eq!(
            flow.media_access(activation, Err(MediaError::DeviceUnavailable)),
            vec![CompanionDirective::Alert(Notice::CompanionStartError)]
        );
        assert!(!flow.is_enabled());
    }

    #[test]
    fn test_stale_permission_answer_ignored() {
        let mut flow = CompanionFlow::new(10);
        flow.toggle();
        let directives = flow.accept_disclosure();
        let [CompanionDirective::CheckMediaAccess { activation }] = directives[..] else {
            panic!("expected media check");
        };
        flow.toggle();
        assert!(flow.media_access(activation, Ok(())).is_empty());
        assert!(!flow.is_enabled());
    }

    #[test]
    fn test_interim_and_unrelated_results_do_nothing() {
        let (mut flow, session) = listening();
        let interim = flow.recognition_event(
            session,
            RecognitionEvent::Result {
                transcript: "help".into(),
                is_final: false,
            },
            &Locale::En.pack(),
        );
        assert!(interim.is_empty());
        assert!(heard(&mut flow, session, "what a lovely evening").is_empty());
        assert!(matches!(flow.phase(), CompanionPhase::Listening { .. }));
    }

    #[test]
    fn test_keyword_pauses_listening_and_starts_countdown() {
        let (mut flow, session) = listening();
        let directives = heard(&mut flow, session, "please leave me alone");
        assert_eq!(directives[0], CompanionDirective::StopRecognition { session });
        assert!(matches!(directives[1], CompanionDirective::LocateDevice { .. }));
        assert!(matches!(directives[2], CompanionDirective::ScheduleTick { .. }));
        assert!(matches!(
            flow.phase(),
            CompanionPhase::CountingDown {
                remaining: 10,
                location: LocationCapture::Pending,
                ..
            }
        ));
    }

    #[test]
    fn test_second_keyword_during_countdown_is_ignored() {
        let (mut flow, session) = listening();
        heard(&mut flow, session, "help");
        let tick = current_tick(&flow);
        assert!(heard(&mut flow, session, "help").is_empty());
        assert_eq!(current_tick(&flow), tick);
    }

    #[test]
    fn test_countdown_escalates_exactly_once() {
        let mut flow = counting_down();
        let mut escalations = 0;
        let mut fired = Vec::new();
        for _ in 0..10 {
            let tick = current_tick(&flow);
            fired.push(tick);
            let directives = flow.tick(tick);
            escalations += directives
                .iter()
                .filter(|d| **d == CompanionDirective::PlaceEmergencyCall)
                .count();
        }
        assert_eq!(escalations, 1);
        assert!(matches!(flow.phase(), CompanionPhase::Escalated { .. }));

        // replaying every tick after escalation does nothing
        for tick in fired {
            assert!(flow.tick(tick).is_empty());
        }
    }

    #[test]
    fn test_cancel_at_any_remaining_value_prevents_escalation() {
        for ticks_before_cancel in 0..10 {
            let mut flow = counting_down();
            for _ in 0..ticks_before_cancel {
                let tick = current_tick(&flow);
                flow.tick(tick);
            }
            let tick = current_tick(&flow);
            let directives = flow.cancel_countdown();
            assert_eq!(directives[0], CompanionDirective::CancelTick { timer: tick });
            assert!(matches!(directives[1], CompanionDirective::StartRecognition { .. }));
            assert!(flow.tick(tick).is_empty());
            assert!(matches!(flow.phase(), CompanionPhase::Listening { .. }));
        }
    }

    #[test]
    fn test_toggle_off_during_countdown_cancels_timer() {
        let mut flow = counting_down();
        let tick = current_tick(&flow);
        assert_eq!(
            flow.toggle(),
            vec![CompanionDirective::CancelTick { timer: tick }]
        );
        assert_eq!(flow.phase(), &CompanionPhase::Inactive);
        assert!(flow.tick(tick).is_empty());
    }

    #[test]
    fn test_unexpected_end_restarts_but_stopped_session_does_not() {
        let (mut flow, session) = listening();
        let directives = flow.recognition_event(session, RecognitionEvent::End, &Locale::En.pack());
        let [CompanionDirective::StartRecognition { session: restarted }] = directives[..] else {
            panic!("expected restart, got {directives:?}");
        };
        assert_ne!(restarted, session);

        // the countdown stops `restarted`; its End must not restart it
        heard(&mut flow, restarted, "help");
        assert!(flow
            .recognition_event(restarted, RecognitionEvent::End, &Locale::En.pack())
            .is_empty());
    }

    #[test]
    fn test_transient_errors_ignored_permission_errors_disable() {
        let (mut flow, session) = listening();
        for code in [
            RecognitionErrorCode::NoSpeech,
            RecognitionErrorCode::AudioCapture,
            RecognitionErrorCode::Network,
        ] {
            let directives = flow.recognition_event(
                session,
                RecognitionEvent::Error { code },
                &Locale::En.pack(),
            );
            assert!(directives.is_empty());
        }
        assert!(flow.is_enabled());

        let directives = flow.recognition_event(
            session,
            RecognitionEvent::Error {
                code: RecognitionErrorCode::NotAllowed,
            },
            &Locale::En.pack(),
        );
        assert_eq!(
            directives,
            vec![
                CompanionDirective::StopRecognition { session },
                CompanionDirective::Alert(Notice::MicPermissionDenied)
            ]
        );
        assert!(!flow.is_enabled());
    }

    #[test]
    fn test_location_capture_success_and_failure() {
        let mut flow = counting_down();
        let CompanionPhase::CountingDown { distress, .. } = *flow.phase() else {
            unreachable!()
        };
        flow.located(DistressId::new(), Err(LocationError::Timeout));
        assert!(matches!(
            flow.phase(),
            CompanionPhase::CountingDown { location: LocationCapture::Pending, .. }
        ));

        flow.located(
            distress,
            Ok(Position {
                coords: GeoPoint { lat: 1.5, lng: 2.5 },
                accuracy_m: None,
            }),
        );
        assert!(matches!(
            flow.phase(),
            CompanionPhase::CountingDown { location: LocationCapture::Captured { .. }, .. }
        ));

        let mut flow = counting_down();
        let CompanionPhase::CountingDown { distress, .. } = *flow.phase() else {
            unreachable!()
        };
        flow.located(distress, Err(LocationError::PermissionDenied));
        assert!(matches!(
            flow.phase(),
            CompanionPhase::CountingDown { location: LocationCapture::Unavailable, .. }
        ));
    }

    fn escalate(flow: &mut CompanionFlow) -> RecordingId {
        let mut recording = None;
        while matches!(flow.phase(), CompanionPhase::CountingDown { .. }) {
            let tick = current_tick(flow);
            for d in flow.tick(tick) {
                if let CompanionDirective::StartRecording { recording: id } = d {
                    recording = Some(id);
                }
            }
        }
        recording.expect("escalation starts a recording")
    }

    #[test]
    fn test_close_escalation_releases_recording_and_resumes() {
        let mut flow = counting_down();
        let recording = escalate(&mut flow);
        assert!(flow.recording_started(recording, Ok(recording)).is_empty());

        let directives = flow.close_escalation();
        assert_eq!(directives[0], CompanionDirective::StopRecording { recording });
        assert!(matches!(directives[1], CompanionDirective::StartRecognition { .. }));
        assert!(flow.is_enabled());
    }

    #[test]
    fn test_recording_failure_still_escalated_and_nothing_to_release() {
        let mut flow = counting_down();
        let recording = escalate(&mut flow);
        flow.recording_started(recording, Err(MediaError::PermissionDenied));
        assert!(matches!(
            flow.phase(),
            CompanionPhase::Escalated { recording: Recording::Failed, .. }
        ));
        let directives = flow.close_escalation();
        assert!(matches!(directives[..], [CompanionDirective::StartRecognition { .. }]));
    }

    #[test]
    fn test_late_recording_after_toggle_off_is_stopped() {
        let mut flow = counting_down();
        let recording = escalate(&mut flow);
        assert_eq!(
            flow.toggle(),
            vec![CompanionDirective::StopRecording { recording }]
        );
        assert_eq!(
            flow.recording_started(recording, Ok(recording)),
            vec![CompanionDirective::StopRecording { recording }]
        );
    }

    #[test]
    fn test_language_change_restarts_only_live_session() {
        let (mut flow, session) = listening();
        let directives = flow.language_changed();
        assert_eq!(directives[0], CompanionDirective::StopRecognition { session });
        assert!(matches!(directives[1], CompanionDirective::StartRecognition { .. }));

        let mut flow = counting_down();
        assert!(flow.language_changed().is_empty());
    }
}
