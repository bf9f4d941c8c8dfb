//! Recording privilege adapter.

use tracing::{debug, info, warn};

use crate::platform::{RecordingCtrlEvent, RecordingStatus, RequestLocalRecordingStatus, TranscodingStatus};

type PrivilegeCallback = Box<dyn Fn(bool) + Send + Sync>;

/// Forwards privilege grants and revocations; everything else is ignored.
pub struct RecordingPrivilegeAdapter {
    on_privilege_changed: PrivilegeCallback,
}

impl RecordingPrivilegeAdapter {
    pub fn new(on_privilege_changed: impl Fn(bool) + Send + Sync + 'static) -> Self {
        Self {
            on_privilege_changed: Box::new(on_privilege_changed),
        }
    }
}

impl RecordingCtrlEvent for RecordingPrivilegeAdapter {
    fn on_recording_status(&self, status: RecordingStatus) {
        debug!("local recording status: {:?}", status);
    }

    fn on_cloud_recording_status(&self, _status: RecordingStatus) {}

    fn on_record_privilege_changed(&self, can_record: bool) {
        info!("recording privilege changed: can_record={}", can_record);
        (self.on_privilege_changed)(can_record);
    }

    fn on_local_recording_privilege_request_status(&self, status: RequestLocalRecordingStatus) {
        match status {
            RequestLocalRecordingStatus::Granted => info!("local recording privilege granted"),
            RequestLocalRecordingStatus::Denied => warn!("local recording privilege denied"),
            RequestLocalRecordingStatus::Timeout => warn!("local recording privilege request timed out"),
        }
    }

    fn on_cloud_recording_storage_full(&self, _grace_period_date: i64) {}

    fn on_transcoding_status_changed(&self, _status: TranscodingStatus, _path: &str) {}
}
