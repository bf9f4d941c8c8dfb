//! Listener capability sets the platform calls back into.
//!
//! Each trait mirrors one of the platform's event interfaces. Implementors
//! must provide every method; the platform may call any of them on its own
//! threads.

use super::status::{AuthResult, MeetingStatus, SdkStatus, SharingStatus};

/// Parameters of a meeting about to start, delivered before `InMeeting`.
#[derive(Debug, Clone, Default)]
pub struct MeetingParameter {
    pub meeting_number: u64,
    pub meeting_topic: String,
    pub meeting_host: String,
    pub is_view_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsWarning {
    None,
    NetworkQualityBad,
    BusySystem,
}

/// Lifecycle events of the meeting service.
pub trait MeetingServiceEvent: Send + Sync {
    fn on_meeting_status_changed(&self, status: MeetingStatus, result: i32);
    fn on_meeting_parameter_notification(&self, param: &MeetingParameter);
    fn on_meeting_statistics_warning(&self, warning: StatisticsWarning);
    fn on_suspend_participants_activities(&self);
    fn on_ai_companion_active_change(&self, active: bool);
    fn on_meeting_topic_changed(&self, topic: &str);
    fn on_meeting_full_to_watch_live_stream(&self, live_stream_url: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingStatus {
    Start,
    Stop,
    DiskFull,
    Pause,
    Connecting,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestLocalRecordingStatus {
    Granted,
    Denied,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodingStatus {
    Start,
    Success,
    Failed,
}

/// Recording controller events.
pub trait RecordingCtrlEvent: Send + Sync {
    fn on_recording_status(&self, status: RecordingStatus);
    fn on_cloud_recording_status(&self, status: RecordingStatus);
    fn on_record_privilege_changed(&self, can_record: bool);
    fn on_local_recording_privilege_request_status(&self, status: RequestLocalRecordingStatus);
    fn on_cloud_recording_storage_full(&self, grace_period_date: i64);
    fn on_transcoding_status_changed(&self, status: TranscodingStatus, path: &str);
}

/// One share stream published by a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareSourceInfo {
    pub user_id: u32,
    pub share_source_id: u32,
    pub status: SharingStatus,
    pub is_showing_in_first_view: bool,
    pub is_showing_in_second_view: bool,
}

/// Share controller events.
pub trait ShareCtrlEvent: Send + Sync {
    fn on_sharing_status(&self, info: &ShareSourceInfo);
    fn on_failed_to_start_share(&self);
    fn on_lock_share_status(&self, locked: bool);
    fn on_share_content_notification(&self, info: &ShareSourceInfo);
    fn on_shared_video_ended(&self);
}

/// Content of a reminder dialog.
#[derive(Debug, Clone, Default)]
pub struct ReminderContent {
    pub kind: i32,
    pub title: String,
    pub content: String,
    pub is_blocking: bool,
}

/// Answers a reminder dialog on behalf of the user.
pub trait ReminderHandler {
    fn accept(&self) -> SdkStatus;
    fn ignore(&self) -> SdkStatus;
    fn decline(&self) -> SdkStatus;
}

/// Reminder controller events. Handlers may be absent.
pub trait ReminderEvent: Send + Sync {
    fn on_reminder_notify(&self, content: Option<&ReminderContent>, handler: Option<&dyn ReminderHandler>);
    fn on_enable_reminder_notify(
        &self,
        content: Option<&ReminderContent>,
        handler: Option<&dyn ReminderHandler>,
    );
}

/// Authentication service events.
pub trait AuthServiceEvent: Send + Sync {
    fn on_authentication_return(&self, result: AuthResult);
    fn on_logout(&self);
    fn on_identity_expired(&self);
}
