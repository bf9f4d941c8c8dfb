//! Status codes and enumerations reported by the conferencing platform.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a synchronous platform call. `Success` is the only non-error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkStatus {
    Success,
    NoImpl,
    WrongUsage,
    InvalidParameter,
    ModuleLoadFailed,
    MemoryFailed,
    ServiceFailed,
    Uninitialized,
    Unauthenticated,
    NoRecordingInProgress,
    NoPermission,
    Unknown,
    InternalError,
    TooFrequentCall,
    NotInMeeting,
    /// The audio transport has not finished joining yet. Transient.
    NotJoinAudio,
    NoShareData,
}

impl SdkStatus {
    /// Integer code used across the foreign-function boundary. Zero is success.
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::NoImpl => 1,
            Self::WrongUsage => 2,
            Self::InvalidParameter => 3,
            Self::ModuleLoadFailed => 4,
            Self::MemoryFailed => 5,
            Self::ServiceFailed => 6,
            Self::Uninitialized => 7,
            Self::Unauthenticated => 8,
            Self::NoRecordingInProgress => 9,
            Self::NoPermission => 12,
            Self::Unknown => 13,
            Self::InternalError => 15,
            Self::TooFrequentCall => 21,
            Self::NotInMeeting => 32,
            Self::NotJoinAudio => 33,
            Self::NoShareData => 34,
        }
    }

    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }
}

impl fmt::Display for SdkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Lifecycle status of the platform-side meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Idle,
    Connecting,
    WaitingForHost,
    InMeeting,
    Disconnecting,
    Reconnecting,
    Failed,
    Ended,
    Unknown,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::WaitingForHost => "waiting_for_host",
            Self::InMeeting => "in_meeting",
            Self::Disconnecting => "disconnecting",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
            Self::Ended => "ended",
            Self::Unknown => "unknown",
        }
    }

    /// Integer code used across the foreign-function boundary.
    pub fn code(&self) -> i32 {
        match self {
            Self::Idle => 0,
            Self::Connecting => 1,
            Self::WaitingForHost => 2,
            Self::InMeeting => 3,
            Self::Disconnecting => 4,
            Self::Reconnecting => 5,
            Self::Failed => 6,
            Self::Ended => 7,
            Self::Unknown => 8,
        }
    }
}

/// Outcome of SDK authentication, delivered asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    Success,
    KeyOrSecretEmpty,
    KeyOrSecretWrong,
    JwtTokenWrong,
    Overtime,
    Unknown(i32),
}

impl AuthResult {
    /// Human readable reason, used in failure logs.
    pub fn reason(&self) -> String {
        match self {
            Self::Success => "success".to_string(),
            Self::KeyOrSecretEmpty => "key or secret is empty".to_string(),
            Self::KeyOrSecretWrong => "key or secret is wrong".to_string(),
            Self::JwtTokenWrong => "JWT is invalid".to_string(),
            Self::Overtime => "operation timed out".to_string(),
            Self::Unknown(code) => format!("unknown error: {code}"),
        }
    }
}

/// State carried by a share notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingStatus {
    SelfSendBegin,
    SelfSendEnd,
    OtherShareBegin,
    OtherShareEnd,
    ViewOtherSharing,
    Pause,
    Resume,
}

/// Why the local user leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveKind {
    LeaveMeeting,
    EndMeeting,
}

/// Target resolution for raw video rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoResolution {
    #[serde(rename = "90p")]
    R90p,
    #[serde(rename = "180p")]
    R180p,
    #[serde(rename = "360p")]
    R360p,
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "1080p")]
    R1080p,
}

impl Default for VideoResolution {
    fn default() -> Self {
        Self::R720p
    }
}

/// Kind of raw stream a renderer subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawDataType {
    Video,
    Share,
}
