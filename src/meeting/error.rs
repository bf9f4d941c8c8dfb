//! Session error types.
//!
//! Every variant maps to a platform status so the handle layer can hand an
//! integer code across the foreign-function boundary.

use thiserror::Error;
use tracing::{debug, error};

use crate::platform::SdkStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A required collaborator is missing, or the call came in the wrong phase.
    #[error("session is not initialized")]
    Uninitialized,

    /// Join credentials are missing or malformed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Recording privilege has not been granted.
    #[error("recording privilege not granted")]
    Unauthorized,

    /// SDK authentication failed or did not complete.
    #[error("authentication failed: {0}")]
    Unauthenticated(String),

    /// The operation conflicts with the current session phase.
    #[error("wrong usage: {0}")]
    WrongUsage(String),

    /// A collaborator failed unexpectedly.
    #[error("internal error: {0}")]
    InternalError(String),

    /// The handle is not registered.
    #[error("unknown handle: {0}")]
    NotFound(u64),

    /// The platform rejected a call.
    #[error("failed to {action} with status {status}")]
    Platform {
        action: &'static str,
        status: SdkStatus,
    },
}

impl SessionError {
    pub fn status(&self) -> SdkStatus {
        match self {
            Self::Uninitialized => SdkStatus::Uninitialized,
            Self::InvalidParameter(_) => SdkStatus::InvalidParameter,
            Self::Unauthorized | Self::Unauthenticated(_) => SdkStatus::Unauthenticated,
            Self::WrongUsage(_) => SdkStatus::WrongUsage,
            Self::InternalError(_) => SdkStatus::InternalError,
            Self::NotFound(_) => SdkStatus::InvalidParameter,
            Self::Platform { status, .. } => *status,
        }
    }

    pub fn code(&self) -> i32 {
        self.status().code()
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Logs the outcome of a platform call and converts it into a result.
pub fn check(status: SdkStatus, action: &'static str) -> SessionResult<()> {
    if status.is_success() {
        debug!("{}", action);
        Ok(())
    } else {
        Err(reject(status, action))
    }
}

/// Logs a failed platform call and builds its error.
pub fn reject(status: SdkStatus, action: &'static str) -> SessionError {
    error!("failed to {} with status {}", action, status);
    SessionError::Platform { action, status }
}
