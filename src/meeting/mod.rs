//! Meeting session module.
//!
//! Joins or starts a meeting as a headless participant, follows the platform's
//! lifecycle events and captures raw audio and shared-screen video.

pub mod config;
pub mod error;
pub mod session;
pub mod status;

pub use config::{RecordingOptions, RetryPolicy, SessionConfig, DEFAULT_DISPLAY_NAME};
pub use error::{check, SessionError, SessionResult};
pub use session::Session;
pub use status::{SessionPhase, SessionSnapshot};
