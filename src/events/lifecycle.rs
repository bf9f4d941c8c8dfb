//! Meeting status adapter: `InMeeting` means joined, `Ended` means left.

use tracing::{debug, error, info, warn};

use crate::platform::{MeetingParameter, MeetingServiceEvent, MeetingStatus, StatisticsWarning};

type Callback = Box<dyn Fn() + Send + Sync>;

pub struct MeetingServiceAdapter {
    on_joined: Option<Callback>,
    on_left: Option<Callback>,
    on_failed: Option<Callback>,
}

impl MeetingServiceAdapter {
    pub fn new(
        on_joined: impl Fn() + Send + Sync + 'static,
        on_left: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_joined: Some(Box::new(on_joined)),
            on_left: Some(Box::new(on_left)),
            on_failed: None,
        }
    }

    /// Called when the platform gives up connecting.
    pub fn with_on_failed(mut self, on_failed: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_failed = Some(Box::new(on_failed));
        self
    }
}

impl MeetingServiceEvent for MeetingServiceAdapter {
    fn on_meeting_status_changed(&self, status: MeetingStatus, result: i32) {
        match status {
            MeetingStatus::Connecting => info!("connecting to the meeting"),
            MeetingStatus::Reconnecting => info!("reconnecting to the meeting"),
            MeetingStatus::Disconnecting => info!("disconnecting from the meeting"),
            MeetingStatus::WaitingForHost => info!("waiting for the meeting to start"),
            MeetingStatus::InMeeting => {
                info!("joined meeting");
                if let Some(on_joined) = &self.on_joined {
                    on_joined();
                }
            }
            MeetingStatus::Ended => {
                info!("meeting ended");
                if let Some(on_left) = &self.on_left {
                    on_left();
                }
            }
            MeetingStatus::Failed => {
                error!("failed to connect to the meeting (result {})", result);
                if let Some(on_failed) = &self.on_failed {
                    on_failed();
                }
            }
            MeetingStatus::Idle => debug!("meeting service idle"),
            MeetingStatus::Unknown => warn!("unknown meeting status (result {})", result),
        }
    }

    fn on_meeting_parameter_notification(&self, param: &MeetingParameter) {
        debug!(
            "meeting {} parameters: topic={:?}, host={:?}",
            param.meeting_number, param.meeting_topic, param.meeting_host
        );
    }

    fn on_meeting_statistics_warning(&self, _warning: StatisticsWarning) {}

    fn on_suspend_participants_activities(&self) {}

    fn on_ai_companion_active_change(&self, _active: bool) {}

    fn on_meeting_topic_changed(&self, _topic: &str) {}

    fn on_meeting_full_to_watch_live_stream(&self, _live_stream_url: &str) {}
}
