//! Service interfaces the session consumes.
//!
//! The meeting service and setting service are owned by the SDK bootstrap
//! and outlive every session; sessions only hold shared references.

use std::sync::Arc;

use super::events::{MeetingServiceEvent, RecordingCtrlEvent, ReminderEvent, ShareCtrlEvent, ShareSourceInfo};
use super::raw_data::{AudioRawHelper, RendererDelegate, VideoRenderer};
use super::status::{LeaveKind, MeetingStatus, SdkStatus};

/// Join request for a user without a platform login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinParams {
    pub meeting_number: u64,
    pub user_name: String,
    pub password: String,
    pub app_privilege_token: Option<String>,
    pub is_video_off: bool,
    pub is_audio_off: bool,
}

/// Start request for the meeting owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartParams {
    pub is_video_off: bool,
    pub is_audio_off: bool,
}

pub trait MeetingService: Send + Sync {
    /// Accepts or rejects the request; completion arrives as a status event.
    fn join(&self, params: &JoinParams) -> SdkStatus;
    fn start(&self, params: &StartParams) -> SdkStatus;
    fn leave(&self, kind: LeaveKind) -> SdkStatus;
    fn status(&self) -> MeetingStatus;
    /// Single listener slot. `None` unregisters.
    fn set_event(&self, listener: Option<Arc<dyn MeetingServiceEvent>>) -> SdkStatus;

    fn recording_controller(&self) -> Option<Arc<dyn RecordingController>>;
    fn sharing_controller(&self) -> Option<Arc<dyn SharingController>>;
    fn audio_controller(&self) -> Option<Arc<dyn AudioController>>;
    fn video_controller(&self) -> Option<Arc<dyn VideoController>>;
    fn participants_controller(&self) -> Option<Arc<dyn ParticipantsController>>;
    fn reminder_controller(&self) -> Option<Arc<dyn ReminderController>>;

    fn audio_raw_helper(&self) -> Option<Arc<dyn AudioRawHelper>>;
    fn create_renderer(
        &self,
        delegate: Arc<dyn RendererDelegate>,
    ) -> Result<Arc<dyn VideoRenderer>, SdkStatus>;
}

pub trait RecordingController: Send + Sync {
    fn can_start_raw_recording(&self) -> SdkStatus;
    fn request_local_recording_privilege(&self) -> SdkStatus;
    fn start_raw_recording(&self) -> SdkStatus;
    fn stop_raw_recording(&self) -> SdkStatus;
    fn set_event(&self, listener: Option<Arc<dyn RecordingCtrlEvent>>) -> SdkStatus;
}

pub trait SharingController: Send + Sync {
    /// Users whose shares the local user can currently view.
    fn viewable_sharing_users(&self) -> Vec<u32>;
    /// Active share sources of one user.
    fn sharing_sources(&self, user_id: u32) -> Vec<ShareSourceInfo>;
    fn set_event(&self, listener: Option<Arc<dyn ShareCtrlEvent>>) -> SdkStatus;
}

pub trait AudioController: Send + Sync {
    /// Joins the audio transport.
    fn join_voip(&self) -> SdkStatus;
    fn mute_audio(&self, user_id: u32, allow_unmute_by_self: bool) -> SdkStatus;
}

pub trait VideoController: Send + Sync {
    fn mute_video(&self) -> SdkStatus;
}

pub trait ParticipantsController: Send + Sync {
    fn my_user_id(&self) -> Option<u32>;
}

pub trait ReminderController: Send + Sync {
    fn set_event(&self, listener: Option<Arc<dyn ReminderEvent>>) -> SdkStatus;
}

pub trait SettingService: Send + Sync {
    fn audio_settings(&self) -> Option<Arc<dyn AudioSettings>>;
}

pub trait AudioSettings: Send + Sync {
    fn enable_auto_join_audio(&self, enable: bool) -> SdkStatus;
}
