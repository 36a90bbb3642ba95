//! Camera and microphone access.
//!
//! `CheckAccess` opens the requested tracks and stops them immediately; it
//! exists to surface the permission prompt. A recording owns its tracks
//! until `StopRecording`, at which point the shell must stop every track.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordingId(Uuid);

impl RecordingId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordingId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub const AUDIO_VIDEO: Self = Self {
        audio: true,
        video: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MediaError {
    #[error("media capture is not supported on this device")]
    Unsupported,
    #[error("camera or microphone permission denied")]
    PermissionDenied,
    #[error("no capture device available")]
    DeviceUnavailable,
    #[error("media capture failed: {message}")]
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaOperation {
    CheckAccess(MediaConstraints),
    StartRecording {
        id: RecordingId,
        constraints: MediaConstraints,
    },
    StopRecording {
        id: RecordingId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaOutput {
    AccessGranted,
    RecordingStarted { id: RecordingId },
    Failed(MediaError),
}

impl Operation for MediaOperation {
    type Output = MediaOutput;
}

#[derive(Clone)]
pub struct Media<Ev> {
    context: CapabilityContext<MediaOperation, Ev>,
}

impl<Ev> Capability<Ev> for Media<Ev> {
    type Operation = MediaOperation;
    type MappedSelf<MappedEv> = Media<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Media::new(self.context.map_event(f))
    }
}

impl<Ev> Media<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<MediaOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn check_access<F>(&self, constraints: MediaConstraints, callback: F)
    where
        F: FnOnce(Result<(), MediaError>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx
                .request_from_shell(MediaOperation::CheckAccess(constraints))
                .await
            {
                MediaOutput::AccessGranted => Ok(()),
                MediaOutput::Failed(e) => Err(e),
                other => Err(MediaError::Failed {
                    message: format!("unexpected output {other:?}"),
                }),
            };
            ctx.update_app(callback(result));
        });
    }

    pub fn start_recording<F>(&self, id: RecordingId, constraints: MediaConstraints, callback: F)
    where
        F: FnOnce(Result<RecordingId, MediaError>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx
                .request_from_shell(MediaOperation::StartRecording { id, constraints })
                .await
            {
                MediaOutput::RecordingStarted { id } => Ok(id),
                MediaOutput::Failed(e) => Err(e),
                other => Err(MediaError::Failed {
                    message: format!("unexpected output {other:?}"),
                }),
            };
            ctx.update_app(callback(result));
        });
    }

    /// Stops the recorder and releases all of its tracks.
    pub fn stop_recording(&self, id: RecordingId) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(MediaOperation::StopRecording { id }).await;
        });
    }
}
