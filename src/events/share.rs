//! Screen-share adapter: other participants' share begin/end.

use tracing::{error, info};

use crate::platform::{ShareCtrlEvent, ShareSourceInfo, SharingStatus};

type ShareCallback = Box<dyn Fn(&ShareSourceInfo) + Send + Sync>;

pub struct ShareAdapter {
    on_share_start: ShareCallback,
    on_share_end: ShareCallback,
}

impl ShareAdapter {
    pub fn new(
        on_share_start: impl Fn(&ShareSourceInfo) + Send + Sync + 'static,
        on_share_end: impl Fn(&ShareSourceInfo) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_share_start: Box::new(on_share_start),
            on_share_end: Box::new(on_share_end),
        }
    }
}

impl ShareCtrlEvent for ShareAdapter {
    fn on_sharing_status(&self, info: &ShareSourceInfo) {
        match info.status {
            SharingStatus::OtherShareBegin => {
                info!(
                    "share {} started from user {}",
                    info.share_source_id, info.user_id
                );
                (self.on_share_start)(info);
            }
            SharingStatus::OtherShareEnd => {
                info!(
                    "share {} ended from user {}",
                    info.share_source_id, info.user_id
                );
                (self.on_share_end)(info);
            }
            SharingStatus::SelfSendBegin => info!("self share started"),
            SharingStatus::SelfSendEnd => info!("self share ended"),
            _ => {}
        }
    }

    fn on_failed_to_start_share(&self) {
        error!("failed to start share");
    }

    fn on_lock_share_status(&self, _locked: bool) {}

    fn on_share_content_notification(&self, _info: &ShareSourceInfo) {}

    fn on_shared_video_ended(&self) {}
}
