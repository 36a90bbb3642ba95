//! Continuous speech recognition.
//!
//! `Start` opens a stream of [`RecognitionEvent`]s tagged with the session
//! the core created. The shell closes the stream after sending `End`.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub lang: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl RecognitionConfig {
    #[must_use]
    pub fn continuous(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            continuous: true,
            interim_results: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionEvent {
    Result { transcript: String, is_final: bool },
    Error { code: RecognitionErrorCode },
    End,
}

/// `SpeechRecognitionErrorEvent.error` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecognitionErrorCode {
    NoSpeech,
    Aborted,
    AudioCapture,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    LanguageNotSupported,
    Unsupported,
    #[serde(other)]
    Other,
}

impl RecognitionErrorCode {
    /// Permission loss; the session cannot continue.
    #[must_use]
    pub fn is_permission_revoked(&self) -> bool {
        matches!(self, Self::NotAllowed | Self::ServiceNotAllowed)
    }

    /// The recogniser could never start.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.is_permission_revoked()
            || matches!(self, Self::Unsupported | Self::LanguageNotSupported)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechRecognitionOperation {
    Start {
        session: SessionId,
        config: RecognitionConfig,
    },
    Stop {
        session: SessionId,
    },
}

impl Operation for SpeechRecognitionOperation {
    type Output = RecognitionEvent;
}

#[derive(Clone)]
pub struct SpeechRecognition<Ev> {
    context: CapabilityContext<SpeechRecognitionOperation, Ev>,
}

impl<Ev> Capability<Ev> for SpeechRecognition<Ev> {
    type Operation = SpeechRecognitionOperation;
    type MappedSelf<MappedEv> = SpeechRecognition<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        SpeechRecognition::new(self.context.map_event(f))
    }
}

impl<Ev> SpeechRecognition<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<SpeechRecognitionOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn start<F>(&self, session: SessionId, config: RecognitionConfig, callback: F)
    where
        F: Fn(SessionId, RecognitionEvent) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let mut stream =
                ctx.stream_from_shell(SpeechRecognitionOperation::Start { session, config });
            while let Some(event) = stream.next().await {
                let ended = event == RecognitionEvent::End;
                ctx.update_app(callback(session, event));
                if ended {
                    break;
                }
            }
        });
    }

    pub fn stop(&self, session: SessionId) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(SpeechRecognitionOperation::Stop { session })
                .await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_from_browser_strings() {
        let code: RecognitionErrorCode = serde_json::from_str("\"no-speech\"").unwrap();
        assert_eq!(code, RecognitionErrorCode::NoSpeech);
        let code: RecognitionErrorCode = serde_json::from_str("\"service-not-allowed\"").unwrap();
        assert!(code.is_permission_revoked());
        let code: RecognitionErrorCode = serde_json::from_str("\"bad-grammar\"").unwrap();
        assert_eq!(code, RecognitionErrorCode::Other);
        assert!(!code.is_fatal());
    }
}
