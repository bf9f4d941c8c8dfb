//! Join/start parameters of one session.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::platform::VideoResolution;

/// Name shown to other participants when the caller gives none.
pub const DEFAULT_DISPLAY_NAME: &str = "Meeting Bot";

/// Immutable description of one session. Built by the caller, never changed
/// by the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub meeting_id: String,
    pub password: String,
    pub display_name: String,
    /// Start the meeting as its owner instead of joining it.
    pub is_start: bool,
    pub join_token: Option<String>,
    pub capture_audio: bool,
    /// Capture shared-screen content. Never a participant's camera.
    pub capture_video: bool,
}

impl SessionConfig {
    pub fn join(
        meeting_id: impl Into<String>,
        password: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            password: password.into(),
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    pub fn start(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            is_start: true,
            ..Self::default()
        }
    }

    pub fn with_join_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.join_token = (!token.is_empty()).then_some(token);
        self
    }

    pub fn with_audio(mut self, capture: bool) -> Self {
        self.capture_audio = capture;
        self
    }

    pub fn with_video(mut self, capture: bool) -> Self {
        self.capture_video = capture;
        self
    }

    pub fn is_valid_for_joining(&self) -> bool {
        !self.meeting_id.is_empty() && !self.password.is_empty() && !self.is_start
    }

    pub fn is_valid_for_starting(&self) -> bool {
        self.is_start
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_for_joining() || self.is_valid_for_starting()
    }

    pub fn uses_raw_recording(&self) -> bool {
        self.capture_audio || self.capture_video
    }
}

/// Bounded retry for raw-audio subscription while the audio transport joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_millis(500),
        }
    }
}

/// How raw recording acquires its resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordingOptions {
    pub audio_retry: RetryPolicy,
    pub video_resolution: VideoResolution,
}
