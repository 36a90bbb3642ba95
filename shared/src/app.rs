use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::capabilities::{
    kv_encode, kv_from_store, Capabilities, KvKey, MediaConstraints, PositionOptions,
    RecognitionConfig, TimerOutput,
};
use crate::config::AppConfig;
use crate::emergency::{CompanionDirective, SosDirective};
use crate::error::AppError;
use crate::event::Event;
use crate::fake_call::FakeCallDirective;
use crate::locale::{validate_catalog, Locale};
use crate::model::Model;
use crate::reports::{decode_lenient, iso_timestamp, ReportError, UserReport};
use crate::route::gateway::{self, GenerateContentRequest, RouteFetchError, RouteQuery};
use crate::view::{view_model, ViewModel};

const DISTRESS_TICK: Duration = Duration::from_secs(1);

#[derive(Default)]
pub struct App;

impl App {
    fn start(mut config: AppConfig, model: &mut Model, caps: &Capabilities) {
        let api_key = config.api_key.take();
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "rejected app configuration, using defaults");
            config = AppConfig::default();
        }
        model.secrets.api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::new);
        if model.secrets.api_key.is_none() {
            tracing::warn!("no route service API key configured");
        }

        if let Err(e) = validate_catalog() {
            tracing::error!(error = %e, "locale catalog incomplete, missing entries fall back to English");
        }
        model.locale = Locale::from_tag_or_default(&config.default_locale);
        model.sos = crate::emergency::SosFlow::new(config.dial_prefix.clone());
        model.companion = crate::emergency::CompanionFlow::new(config.distress_countdown_secs);
        tracing::info!(?config, locale = %model.locale, "app started");
        model.config = config;

        caps.kv
            .get(KvKey::reports().into(), |result| Event::ReportsLoaded(kv_from_store(result)));
        caps.speech_synthesis.list_voices(Event::VoicesLoaded);
    }

    fn send_route_request(model: &mut Model, caps: &Capabilities) {
        let query = match RouteQuery::new(model.start.as_str(), model.end.as_str(), model.mode) {
            Ok(query) => query,
            Err(e) => {
                tracing::debug!(error = %e, "route form incomplete");
                model.set_error(e.into());
                return;
            }
        };

        let api_key = match &model.secrets.api_key {
            Some(key) => key.expose_secret().clone(),
            None => {
                Self::fail_route(model, RouteFetchError::MissingApiKey);
                return;
            }
        };
        let url = match model.config.generate_content_url() {
            Ok(url) => url,
            Err(e) => {
                Self::fail_route(model, RouteFetchError::Request { message: e.to_string() });
                return;
            }
        };
        let body = match serde_json::to_vec(&GenerateContentRequest::for_query(
            &query,
            &model.config.region,
        )) {
            Ok(body) => body,
            Err(e) => {
                Self::fail_route(model, RouteFetchError::Request { message: e.to_string() });
                return;
            }
        };

        if let Some(previous) = model.pending_route {
            tracing::info!(superseded = %previous.id, "new route request supersedes one in flight");
            caps.timer.cancel(previous.deadline);
        }
        Self::cancel_report_acks(model, caps);
        let pending = model.begin_route_request();
        let request_id = pending.id;
        tracing::info!(
            request = %request_id,
            mode = %query.mode,
            host = url.host(),
            "requesting route"
        );

        caps.http
            .post(url.as_str())
            .body(body)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &api_key)
            .send(move |result| Event::RouteFetched {
                request_id,
                outcome: Box::new(gateway::read_response(result)),
            });
        caps.timer.notify_after(
            pending.deadline,
            model.config.request_timeout(),
            move |output| Event::RouteDeadline { request_id, output },
        );
    }

    fn fail_route(model: &mut Model, error: RouteFetchError) {
        tracing::error!(error = %error, "route request failed");
        model.set_error(AppError::from(error));
    }

    fn cancel_report_acks(model: &Model, caps: &Capabilities) {
        for ack in model.step_reports.pending_acks() {
            caps.timer.cancel(ack);
        }
    }

    fn submit_report(step: u32, model: &mut Model, caps: &Capabilities) {
        let Some(instruction) = model
            .route
            .as_ref()
            .and_then(|r| r.steps.get(step.checked_sub(1)? as usize))
            .map(|s| s.instruction.clone())
        else {
            tracing::warn!(error = %ReportError::UnknownStep(step), "report submitted for missing step");
            return;
        };

        let ack = crate::capabilities::TimerId::new();
        let submission = match model.step_reports.submit(step, ack) {
            Ok(submission) => submission,
            Err(e) => {
                tracing::debug!(error = %e, "report not submitted");
                return;
            }
        };

        let kind = submission.kind;
        let description = submission.description;
        caps.timer.now(move |epoch_ms| Event::ReportTimestamped {
            step,
            instruction,
            kind,
            description,
            epoch_ms,
        });
        caps.timer.notify_after(ack, model.config.report_ack(), move |output| {
            Event::ReportAckElapsed { step, output }
        });
    }

    fn save_reports(model: &Model, caps: &Capabilities) {
        match kv_encode(&model.report_log.reports()) {
            Ok(bytes) => caps.kv.set(KvKey::reports().into(), bytes, |result| {
                Event::ReportsSaved(kv_from_store(result).map(|_| ()))
            }),
            Err(e) => tracing::warn!(error = %e, "could not encode report log"),
        }
    }

    fn run_sos(directives: Vec<SosDirective>, model: &mut Model, caps: &Capabilities) {
        for directive in directives {
            match directive {
                SosDirective::LocateDevice => caps
                    .geolocation
                    .current_position(PositionOptions::default(), Event::SosLocated),
                SosDirective::OpenUrl(url) => caps.launcher.open_url(url),
                SosDirective::Alert(notice) => model.show_alert(notice),
            }
        }
    }

    fn run_companion(directives: Vec<CompanionDirective>, model: &mut Model, caps: &Capabilities) {
        for directive in directives {
            match directive {
                CompanionDirective::CheckMediaAccess { activation } => caps
                    .media
                    .check_access(MediaConstraints::AUDIO_VIDEO, move |result| {
                        Event::MediaAccessChecked { activation, result }
                    }),
                CompanionDirective::StartRecognition { session } => caps.speech_recognition.start(
                    session,
                    RecognitionConfig::continuous(model.locale.code()),
                    |session, event| Event::Recognition { session, event },
                ),
                CompanionDirective::StopRecognition { session } => {
                    caps.speech_recognition.stop(session);
                }
                CompanionDirective::ScheduleTick { timer } => {
                    caps.timer.notify_after(timer, DISTRESS_TICK, move |output| {
                        Event::DistressTick { timer, output }
                    });
                }
                CompanionDirective::CancelTick { timer } => caps.timer.cancel(timer),
                CompanionDirective::LocateDevice { distress } => caps
                    .geolocation
                    .current_position(PositionOptions::precise(), move |result| {
                        Event::DistressLocated { distress, result }
                    }),
                CompanionDirective::StartRecording { recording } => caps.media.start_recording(
                    recording,
                    MediaConstraints::AUDIO_VIDEO,
                    move |result| Event::RecordingStarted { recording, result },
                ),
                CompanionDirective::StopRecording { recording } => {
                    caps.media.stop_recording(recording);
                }
                CompanionDirective::PlaceEmergencyCall => {
                    tracing::warn!(number = %model.config.emergency_number, "placing emergency call");
                    caps.launcher.dial(model.config.emergency_number.clone());
                }
                CompanionDirective::Alert(notice) => model.show_alert(notice),
            }
        }
    }

    fn run_fake_call(directives: Vec<FakeCallDirective>, caps: &Capabilities) {
        for directive in directives {
            match directive {
                FakeCallDirective::CancelSpeech => caps.speech_synthesis.cancel(),
                FakeCallDirective::Speak(utterance) => {
                    caps.speech_synthesis.speak(utterance, Event::FakeCallEnded);
                }
            }
        }
    }

    fn change_language(tag: &str, model: &mut Model, caps: &Capabilities) {
        let locale = Locale::from_tag_or_default(tag);
        if locale == model.locale {
            return;
        }
        let previous = std::mem::replace(&mut model.locale, locale);
        tracing::info!(from = %previous, to = %locale, "language changed");

        let directives = model.companion.language_changed();
        Self::run_companion(directives, model, caps);
        model.fake_call.language_changed(previous, &locale.pack());
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        tracing::debug!(
            event = event.name(),
            user = event.is_user_initiated(),
            "update"
        );

        match event {
            Event::AppStarted(config) => Self::start(config, model, caps),

            Event::LanguageChanged(tag) => Self::change_language(&tag, model, caps),

            Event::AlertDismissed => model.alert = None,

            Event::StartChanged(text) => model.start = text,
            Event::EndChanged(text) => model.end = text,
            Event::ModeChanged(mode) => model.mode = mode,

            Event::FindRoute => Self::send_route_request(model, caps),

            Event::RouteFetched {
                request_id,
                outcome,
            } => {
                let Some(pending) = model.settle_route_request(request_id) else {
                    tracing::debug!(request = %request_id, "stale route response discarded");
                    return;
                };
                caps.timer.cancel(pending.deadline);
                match *outcome {
                    Ok(route) => {
                        tracing::info!(
                            request = %request_id,
                            points = route.path.len(),
                            steps = route.steps.len(),
                            safety_points = route.safety_points.len(),
                            road_issues = route.road_issues.len(),
                            "route received"
                        );
                        model.replace_route(Some(route));
                    }
                    Err(e) => Self::fail_route(model, e),
                }
            }

            Event::RouteDeadline { request_id, output } => {
                if !matches!(output, TimerOutput::Fired { .. }) {
                    return;
                }
                if model.settle_route_request(request_id).is_some() {
                    Self::fail_route(model, RouteFetchError::Timeout);
                }
            }

            Event::UseCurrentLocation => {
                model.locating_start = true;
                caps.geolocation
                    .current_position(PositionOptions::precise(), Event::StartLocated);
            }

            Event::StartLocated(result) => {
                model.locating_start = false;
                match result {
                    Ok(position) => model.start = position.coords.display_fixed(),
                    Err(e) => {
                        tracing::warn!(error = %e, "could not locate device for start field");
                        model.show_alert(AppError::from(e).notice());
                    }
                }
            }

            Event::MapViewChanged(view) => {
                model.map.set_view(view);
            }

            Event::ReportOpened { step } => model.step_reports.open(step),
            Event::ReportKindSelected { step, kind } => model.step_reports.set_kind(step, kind),
            Event::ReportDescriptionChanged { step, description } => {
                model.step_reports.set_description(step, description);
            }
            Event::ReportCancelled { step } => model.step_reports.cancel(step),
            Event::ReportSubmitted { step } => Self::submit_report(step, model, caps),

            Event::ReportTimestamped {
                step,
                instruction,
                kind,
                description,
                epoch_ms,
            } => {
                let report = UserReport {
                    step,
                    instruction,
                    kind,
                    description,
                    timestamp: iso_timestamp(epoch_ms),
                };
                tracing::info!(step, kind = ?report.kind, "report recorded");
                if model.report_log.append(report) {
                    Self::save_reports(model, caps);
                }
            }

            Event::ReportAckElapsed { step, output } => {
                if let TimerOutput::Fired { id } = output {
                    model.step_reports.acknowledgement_elapsed(step, id);
                }
            }

            Event::ReportsLoaded(result) => {
                if model.report_log.is_loaded() {
                    return;
                }
                let stored = match result {
                    Ok(bytes) => decode_lenient(bytes.as_deref()),
                    Err(e) => {
                        tracing::warn!(error = %e, "could not read report log");
                        Vec::new()
                    }
                };
                tracing::debug!(count = stored.len(), "report log loaded");
                if model.report_log.load(stored) {
                    Self::save_reports(model, caps);
                }
            }

            Event::ReportsSaved(result) => match result {
                Ok(()) => tracing::debug!(count = model.report_log.len(), "report log saved"),
                Err(e) => tracing::warn!(error = %e, "could not save report log"),
            },

            Event::SosRequested => {
                let directives = model.sos.request();
                Self::run_sos(directives, model, caps);
            }
            Event::SosLocated(result) => {
                let directives = model.sos.located(result);
                Self::run_sos(directives, model, caps);
            }
            Event::SosConfirmed => {
                if let Err(e) = model.sos.confirm() {
                    tracing::debug!(error = %e, "SOS confirm ignored");
                }
            }
            Event::SosCancelled => model.sos.cancel(),
            Event::SosPhoneChanged(value) => model.sos.edit_phone(&value),
            Event::SosShare(channel) => match model.sos.share(channel) {
                Ok(directives) => {
                    tracing::info!(channel = channel.label(), "sharing SOS location");
                    Self::run_sos(directives, model, caps);
                }
                Err(e) => tracing::debug!(error = %e, "SOS share refused"),
            },
            Event::SosClosed => model.sos.close(),

            Event::CompanionToggled => {
                let directives = model.companion.toggle();
                Self::run_companion(directives, model, caps);
            }
            Event::CompanionDisclosureAccepted => {
                let directives = model.companion.accept_disclosure();
                Self::run_companion(directives, model, caps);
            }
            Event::CompanionDisclosureDeclined => model.companion.decline_disclosure(),
            Event::MediaAccessChecked { activation, result } => {
                let directives = model.companion.media_access(activation, result);
                Self::run_companion(directives, model, caps);
            }
            Event::Recognition { session, event } => {
                let pack = model.locale.pack();
                let directives = model.companion.recognition_event(session, event, &pack);
                Self::run_companion(directives, model, caps);
            }
            Event::DistressTick { timer, output } => match output {
                TimerOutput::Fired { id } if id == timer => {
                    let directives = model.companion.tick(id);
                    Self::run_companion(directives, model, caps);
                }
                other => tracing::debug!(?other, "distress timer did not fire"),
            },
            Event::DistressLocated { distress, result } => {
                model.companion.located(distress, result);
            }
            Event::DistressCancelled => {
                let directives = model.companion.cancel_countdown();
                Self::run_companion(directives, model, caps);
            }
            Event::RecordingStarted { recording, result } => {
                let directives = model.companion.recording_started(recording, result);
                Self::run_companion(directives, model, caps);
            }
            Event::DistressClosed => {
                let directives = model.companion.close_escalation();
                Self::run_companion(directives, model, caps);
            }

            Event::FakeCallOpened => {
                model.fake_call.open(&model.locale.pack());
                if model.voices.is_empty() {
                    caps.speech_synthesis.list_voices(Event::VoicesLoaded);
                }
            }
            Event::FakeCallClosed => model.fake_call.close(),
            Event::FakeCallVoiceSelected(voice) => model.fake_call.set_voice(voice),
            Event::FakeCallToneSelected(tone) => model.fake_call.set_tone(tone),
            Event::FakeCallScenarioSelected(message) => model.fake_call.set_message(message),
            Event::FakeCallStarted => {
                let directives = model.fake_call.start(&model.voices, &model.locale.pack());
                Self::run_fake_call(directives, caps);
            }
            Event::FakeCallDeclined => {
                let directives = model.fake_call.decline();
                Self::run_fake_call(directives, caps);
            }
            Event::FakeCallEnded(output) => model.fake_call.speech_ended(&output),
            Event::VoicesRequested => caps.speech_synthesis.list_voices(Event::VoicesLoaded),
            Event::VoicesLoaded(voices) => {
                tracing::debug!(count = voices.len(), "synthesizer voices loaded");
                model.voices = voices;
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        view_model(model)
    }
}
