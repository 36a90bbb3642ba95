//! Fake incoming call: a scripted message read out by the speech synthesizer.

use serde::{Deserialize, Serialize};

use crate::capabilities::{SynthesisOutput, Utterance, UtteranceId, VoiceInfo};
use crate::locale::{
    primary_subtag, Locale, LocalePack, ENGLISH_FEMALE_VOICE_HINTS, ENGLISH_MALE_VOICE_HINTS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FakeCallVoice {
    Male,
    #[default]
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FakeCallTone {
    #[default]
    Calm,
    Urgent,
}

impl FakeCallTone {
    /// `(pitch, rate)` multipliers.
    #[must_use]
    pub const fn prosody(self) -> (f32, f32) {
        match self {
            Self::Calm => (1.0, 1.0),
            Self::Urgent => (1.2, 1.1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeCallOptions {
    pub voice: FakeCallVoice,
    pub tone: FakeCallTone,
    pub message: String,
}

impl FakeCallOptions {
    /// Female, calm, reading the locale's first scenario.
    #[must_use]
    pub fn defaults_for(pack: &LocalePack) -> Self {
        Self {
            voice: FakeCallVoice::default(),
            tone: FakeCallTone::default(),
            message: pack.scenarios.first().copied().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FakeCallState {
    #[default]
    Idle,
    Configuring(FakeCallOptions),
    Ringing {
        utterance: UtteranceId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FakeCallDirective {
    CancelSpeech,
    Speak(Utterance),
}

fn gender_hints(voice: FakeCallVoice, pack: &LocalePack) -> Vec<&'static str> {
    let (english, local) = match voice {
        FakeCallVoice::Female => (ENGLISH_FEMALE_VOICE_HINTS, pack.female_voice_hints),
        FakeCallVoice::Male => (ENGLISH_MALE_VOICE_HINTS, pack.male_voice_hints),
    };
    english.iter().chain(local).copied().collect()
}

/// Picks the synthesizer voice for a call.
///
/// First choice is a voice whose name carries a hint for `voice` and whose
/// language tag contains the locale code; next any voice with the locale's
/// primary subtag. `None` keeps the synthesizer default.
#[must_use]
pub fn select_voice<'a>(
    voices: &'a [VoiceInfo],
    voice: FakeCallVoice,
    pack: &LocalePack,
) -> Option<&'a VoiceInfo> {
    let code = pack.locale.code();
    let hints = gender_hints(voice, pack);
    // "male" is a substring of "female"
    let excluded = match voice {
        FakeCallVoice::Male => gender_hints(FakeCallVoice::Female, pack),
        FakeCallVoice::Female => Vec::new(),
    };

    let by_gender = voices.iter().find(|v| {
        let name = v.name.to_lowercase();
        hints.iter().any(|h| name.contains(h))
            && !excluded.iter().any(|h| name.contains(h))
            && v.lang.to_lowercase().contains(code)
    });
    by_gender.or_else(|| voices.iter().find(|v| primary_subtag(&v.lang) == code))
}

#[must_use]
pub fn build_utterance(
    options: &FakeCallOptions,
    voices: &[VoiceInfo],
    pack: &LocalePack,
) -> Utterance {
    let (pitch, rate) = options.tone.prosody();
    Utterance {
        id: UtteranceId::new(),
        text: options.message.clone(),
        lang: pack.locale.code().to_string(),
        voice_uri: select_voice(voices, options.voice, pack).map(|v| v.voice_uri.clone()),
        pitch,
        rate,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FakeCall {
    state: FakeCallState,
}

impl FakeCall {
    #[must_use]
    pub fn state(&self) -> &FakeCallState {
        &self.state
    }

    #[must_use]
    pub fn is_ringing(&self) -> bool {
        matches!(self.state, FakeCallState::Ringing { .. })
    }

    /// Opens the setup dialog. Ignored while a call is ringing.
    pub fn open(&mut self, pack: &LocalePack) {
        if !self.is_ringing() {
            self.state = FakeCallState::Configuring(FakeCallOptions::defaults_for(pack));
        }
    }

    pub fn close(&mut self) {
        if matches!(self.state, FakeCallState::Configuring(_)) {
            self.state = FakeCallState::Idle;
        }
    }

    pub fn set_voice(&mut self, voice: FakeCallVoice) {
        if let FakeCallState::Configuring(options) = &mut self.state {
            options.voice = voice;
        }
    }

    pub fn set_tone(&mut self, tone: FakeCallTone) {
        if let FakeCallState::Configuring(options) = &mut self.state {
            options.tone = tone;
        }
    }

    pub fn set_message(&mut self, message: String) {
        if let FakeCallState::Configuring(options) = &mut self.state {
            options.message = message;
        }
    }

    /// Leaves setup and starts ringing. Any speech still playing is cut off
    /// before the call's script is spoken.
    pub fn start(&mut self, voices: &[VoiceInfo], pack: &LocalePack) -> Vec<FakeCallDirective> {
        let FakeCallState::Configuring(options) = &self.state else {
            tracing::debug!("fake call started without setup, ignored");
            return Vec::new();
        };
        let utterance = build_utterance(options, voices, pack);
        tracing::info!(
            voice = ?options.voice,
            tone = ?options.tone,
            voice_uri = utterance.voice_uri.as_deref().unwrap_or("default"),
            "fake call ringing"
        );
        self.state = FakeCallState::Ringing {
            utterance: utterance.id,
        };
        vec![
            FakeCallDirective::CancelSpeech,
            FakeCallDirective::Speak(utterance),
        ]
    }

    /// The synthesizer stopped speaking the call's script.
    pub fn speech_ended(&mut self, output: &SynthesisOutput) {
        let id = match output {
            SynthesisOutput::Finished { id } | SynthesisOutput::Interrupted { id } => *id,
            SynthesisOutput::Failed { id, message } => {
                tracing::warn!(%message, "fake call speech failed");
                *id
            }
            SynthesisOutput::Voices(_) => return,
        };
        if self.state == (FakeCallState::Ringing { utterance: id }) {
            tracing::info!("fake call ended");
            self.state = FakeCallState::Idle;
        }
    }

    pub fn decline(&mut self) -> Vec<FakeCallDirective> {
        if !self.is_ringing() {
            return Vec::new();
        }
        tracing::info!("fake call declined");
        self.state = FakeCallState::Idle;
        vec![FakeCallDirective::CancelSpeech]
    }

    /// Locale switched while configuring: the script list changes with it.
    pub fn language_changed(&mut self, previous: Locale, pack: &LocalePack) {
        if let FakeCallState::Configuring(options) = &mut self.state {
            if previous.pack().scenarios.contains(&options.message.as_str()) {
                options.message = FakeCallOptions::defaults_for(pack).message;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, lang: &str) -> VoiceInfo {
        VoiceInfo {
            name: name.into(),
            lang: lang.into(),
            voice_uri: format!("uri:{name}"),
        }
    }

    #[test]
    fn test_gender_and_language_match_wins() {
        let voices = vec![
            voice("Google UK English", "en-GB"),
            voice("Microsoft Zira", "en-US"),
            voice("Microsoft David", "en-US"),
        ];
        let pack = Locale::En.pack();
        assert_eq!(
            select_voice(&voices, FakeCallVoice::Female, &pack).map(|v| v.name.as_str()),
            Some("Microsoft Zira")
        );
        assert_eq!(
            select_voice(&voices, FakeCallVoice::Male, &pack).map(|v| v.name.as_str()),
            Some("Microsoft David")
        );
    }

    #[test]
    fn test_male_hint_does_not_match_female_names() {
        let voices = vec![voice("English Female", "en-US"), voice("English Male", "en-US")];
        let pack = Locale::En.pack();
        assert_eq!(
            select_voice(&voices, FakeCallVoice::Male, &pack).map(|v| v.name.as_str()),
            Some("English Male")
        );
    }

    #[test]
    fn test_gender_match_requires_language() {
        let voices = vec![voice("Microsoft Zira", "en-US"), voice("Amélie", "fr-CA")];
        let pack = Locale::Fr.pack();
        assert_eq!(
            select_voice(&voices, FakeCallVoice::Female, &pack).map(|v| v.name.as_str()),
            Some("Amélie")
        );
    }

    #[test]
    fn test_locale_specific_hints() {
        let voices = vec![voice("Lekha", "hi-IN"), voice("आवाज़ पुरुष", "hi-IN")];
        let pack = Locale::Hi.pack();
        assert_eq!(
            select_voice(&voices, FakeCallVoice::Male, &pack).map(|v| v.name.as_str()),
            Some("आवाज़ पुरुष")
        );
    }

    #[test]
    fn test_no_voice_keeps_default_but_tone_applies() {
        let pack = Locale::Ja.pack();
        let options = FakeCallOptions {
            voice: FakeCallVoice::Male,
            tone: FakeCallTone::Urgent,
            message: "hello".into(),
        };
        let utterance = build_utterance(&options, &[voice("Microsoft David", "en-US")], &pack);
        assert_eq!(utterance.voice_uri, None);
        assert_eq!(utterance.lang, "ja");
        assert!((utterance.pitch - 1.2).abs() < f32::EPSILON);
        assert!((utterance.rate - 1.1).abs() < f32::EPSILON);

        let calm = FakeCallOptions {
            tone: FakeCallTone::Calm,
            ..options
        };
        assert_eq!(FakeCallTone::Calm.prosody(), (1.0, 1.0));
        assert!((build_utterance(&calm, &[], &pack).rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_call_lifecycle() {
        let pack = Locale::En.pack();
        let mut call = FakeCall::default();
        call.open(&pack);
        let FakeCallState::Configuring(options) = call.state() else {
            panic!("expected setup");
        };
        assert_eq!(options.message, "I'm waiting outside, come fast.");
        assert_eq!(options.voice, FakeCallVoice::Female);

        call.set_tone(FakeCallTone::Urgent);
        let directives = call.start(&[], &pack);
        assert_eq!(directives[0], FakeCallDirective::CancelSpeech);
        let FakeCallDirective::Speak(utterance) = &directives[1] else {
            panic!("expected speak");
        };
        assert!(call.is_ringing());

        // an unrelated utterance finishing does not end the call
        call.speech_ended(&SynthesisOutput::Finished {
            id: UtteranceId::new(),
        });
        assert!(call.is_ringing());

        call.speech_ended(&SynthesisOutput::Finished { id: utterance.id });
        assert_eq!(call.state(), &FakeCallState::Idle);
    }

    #[test]
    fn test_decline_cancels_speech() {
        let pack = Locale::En.pack();
        let mut call = FakeCall::default();
        assert!(call.decline().is_empty());
        call.open(&pack);
        call.start(&[], &pack);
        assert_eq!(call.decline(), vec![FakeCallDirective::CancelSpeech]);
        assert_eq!(call.state(), &FakeCallState::Idle);
    }

    #[test]
    fn test_language_change_swaps_default_script() {
        let mut call = FakeCall::default();
        call.open(&Locale::En.pack());
        call.language_changed(Locale::En, &Locale::Hi.pack());
        let FakeCallState::Configuring(options) = call.state() else {
            panic!("expected setup");
        };
        assert_eq!(options.message, Locale::Hi.pack().scenarios[0]);

        call.set_message("custom".into());
        call.language_changed(Locale::Hi, &Locale::Fr.pack());
        let FakeCallState::Configuring(options) = call.state() else {
            panic!("expected setup");
        };
        assert_eq!(options.message, "custom");
    }
}
