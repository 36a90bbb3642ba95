mod geolocation;
mod http;
mod kv;
mod launcher;
mod media;
mod speech;
mod synthesis;
mod timer;

pub use self::geolocation::{
    Geolocation, GeolocationOperation, LocationError, LocationResult, Position, PositionOptions,
};
pub use self::http::{HttpError, ValidatedUrl, MAX_RESPONSE_BODY_SIZE};
pub use self::kv::{KvError, KvKey};
pub use self::launcher::{Launcher, LauncherOperation};
pub use self::media::{
    Media, MediaConstraints, MediaError, MediaOperation, MediaOutput, RecordingId,
};
pub use self::speech::{
    RecognitionConfig, RecognitionErrorCode, RecognitionEvent, SessionId, SpeechRecognition,
    SpeechRecognitionOperation,
};
pub use self::synthesis::{
    SpeechSynthesis, SpeechSynthesisOperation, SynthesisOutput, Utterance, UtteranceId, VoiceInfo,
};
pub use self::timer::{Timer, TimerId, TimerOperation, TimerOutput};

pub(crate) use self::kv::{decode as kv_decode, encode as kv_encode, from_store as kv_from_store};

// Crux's built-in Render is enough for view updates.
pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub timer: Timer<Event>,
    pub geolocation: Geolocation<Event>,
    pub media: Media<Event>,
    pub speech_recognition: SpeechRecognition<Event>,
    pub speech_synthesis: SpeechSynthesis<Event>,
    pub launcher: Launcher<Event>,
}
