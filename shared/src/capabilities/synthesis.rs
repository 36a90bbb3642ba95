use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtteranceId(Uuid);

impl UtteranceId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UtteranceId {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry of `speechSynthesis.getVoices()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInfo {
    pub name: String,
    pub lang: String,
    pub voice_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub lang: String,
    /// `None` leaves the synthesizer's default voice in place.
    pub voice_uri: Option<String>,
    pub pitch: f32,
    pub rate: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpeechSynthesisOperation {
    ListVoices,
    Speak(Utterance),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynthesisOutput {
    Voices(Vec<VoiceInfo>),
    Finished { id: UtteranceId },
    Interrupted { id: UtteranceId },
    Failed { id: UtteranceId, message: String },
}

impl Operation for SpeechSynthesisOperation {
    type Output = SynthesisOutput;
}

#[derive(Clone)]
pub struct SpeechSynthesis<Ev> {
    context: CapabilityContext<SpeechSynthesisOperation, Ev>,
}

impl<Ev> Capability<Ev> for SpeechSynthesis<Ev> {
    type Operation = SpeechSynthesisOperation;
    type MappedSelf<MappedEv> = SpeechSynthesis<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        SpeechSynthesis::new(self.context.map_event(f))
    }
}

impl<Ev> SpeechSynthesis<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<SpeechSynthesisOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn list_voices<F>(&self, callback: F)
    where
        F: FnOnce(Vec<VoiceInfo>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let voices = match ctx
                .request_from_shell(SpeechSynthesisOperation::ListVoices)
                .await
            {
                SynthesisOutput::Voices(voices) => voices,
                other => {
                    tracing::warn!(?other, "unexpected synthesis output for ListVoices");
                    Vec::new()
                }
            };
            ctx.update_app(callback(voices));
        });
    }

    /// Speaks `utterance`; `callback` receives how the utterance ended.
    pub fn speak<F>(&self, utterance: Utterance, callback: F)
    where
        F: FnOnce(SynthesisOutput) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx
                .request_from_shell(SpeechSynthesisOperation::Speak(utterance))
                .await;
            ctx.update_app(callback(output));
        });
    }

    pub fn cancel(&self) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(SpeechSynthesisOperation::Cancel).await;
        });
    }
}
