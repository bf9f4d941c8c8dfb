//! Session phase and point-in-time snapshots.

use serde::{Deserialize, Serialize};

/// Phase of a session lifecycle. Raw recording is an overlay on `Joined`,
/// tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Joining,
    Starting,
    Joined,
    Leaving,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Joining => "joining",
            Self::Starting => "starting",
            Self::Joined => "joined",
            Self::Leaving => "leaving",
        }
    }

    /// A join or start request is outstanding or has completed.
    pub fn is_engaged(&self) -> bool {
        matches!(self, Self::Joining | Self::Starting | Self::Joined)
    }
}

impl Default for SessionPhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Current session state, readable from any thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub joined: bool,
    pub recording: bool,
    /// Share source currently rendered, zero when none.
    pub share_source_id: u32,
    pub share_subscribed: bool,
}
