//! Event adapters.
//!
//! Each adapter implements one of the platform's listener capability sets in
//! full, forwards the few events the session cares about to closures bound at
//! construction, and treats the rest as no-ops.

pub mod auth;
pub mod lifecycle;
pub mod recording;
pub mod reminder;
pub mod share;

pub use auth::AuthAdapter;
pub use lifecycle::MeetingServiceAdapter;
pub use recording::RecordingPrivilegeAdapter;
pub use reminder::ReminderAdapter;
pub use share::ShareAdapter;
