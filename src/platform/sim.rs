//! In-process simulated platform.
//!
//! Every service records the calls it receives and lets the owner script the
//! statuses it returns. Platform events are emitted either directly from the
//! calling thread (`fire_*`) or queued and delivered by [`Platform::pump_events`],
//! which is how the real platform delivers authentication results and
//! lifecycle changes.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use super::bootstrap::{AuthContext, AuthService, InitParams, NetworkConnectionHelper, Platform, ProxySettings};
use super::events::{
    AuthServiceEvent, MeetingServiceEvent, RecordingCtrlEvent, ReminderContent, ReminderEvent,
    ReminderHandler, ShareCtrlEvent, ShareSourceInfo,
};
use super::raw_data::{
    AudioRawData, AudioRawDataDelegate, AudioRawHelper, RawDataStatus, RendererDelegate,
    VideoRenderer, YuvRawData,
};
use super::services::{
    AudioController, AudioSettings, JoinParams, MeetingService, ParticipantsController,
    RecordingController, ReminderController, SettingService, SharingController, StartParams,
    VideoController,
};
use super::status::{
    AuthResult, LeaveKind, MeetingStatus, RawDataType, SdkStatus, SharingStatus, VideoResolution,
};

type PendingEvent = Box<dyn FnOnce() + Send>;

/// FIFO of events waiting for the next pump.
#[derive(Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<PendingEvent>>>,
}

impl EventQueue {
    pub fn push(&self, event: impl FnOnce() + Send + 'static) {
        self.inner.lock().push_back(Box::new(event));
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs queued events, including ones queued while draining.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.inner.lock().pop_front();
            match next {
                Some(event) => {
                    event();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

/// Simulated platform binding.
pub struct SimPlatform {
    pub meeting: Arc<SimMeetingService>,
    pub settings: Arc<SimSettingService>,
    pub auth: Arc<SimAuthService>,
    pub network: Arc<SimNetworkHelper>,
    queue: EventQueue,
    init_status: Mutex<SdkStatus>,
    init_params: Mutex<Option<InitParams>>,
    pumps: AtomicUsize,
    cleanups: AtomicUsize,
}

impl SimPlatform {
    pub fn new() -> Arc<Self> {
        let queue = EventQueue::default();
        Arc::new(Self {
            meeting: SimMeetingService::new(queue.clone()),
            settings: Arc::new(SimSettingService::default()),
            auth: Arc::new(SimAuthService::new(queue.clone())),
            network: Arc::new(SimNetworkHelper::default()),
            queue,
            init_status: Mutex::new(SdkStatus::Success),
            init_params: Mutex::new(None),
            pumps: AtomicUsize::new(0),
            cleanups: AtomicUsize::new(0),
        })
    }

    /// Admits joins, grants recording privilege on request and ends the
    /// meeting on leave, all through the event queue.
    pub fn with_auto_flow(self: Arc<Self>) -> Arc<Self> {
        self.meeting.set_auto_flow(true);
        self
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn set_init_status(&self, status: SdkStatus) {
        *self.init_status.lock() = status;
    }

    pub fn init_params(&self) -> Option<InitParams> {
        self.init_params.lock().clone()
    }

    pub fn pump_count(&self) -> usize {
        self.pumps.load(Ordering::SeqCst)
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

impl Platform for SimPlatform {
    fn init_sdk(&self, params: &InitParams) -> SdkStatus {
        *self.init_params.lock() = Some(params.clone());
        *self.init_status.lock()
    }

    fn create_setting_service(&self) -> Result<Arc<dyn SettingService>, SdkStatus> {
        Ok(self.settings.clone())
    }

    fn create_network_helper(&self) -> Result<Arc<dyn NetworkConnectionHelper>, SdkStatus> {
        Ok(self.network.clone())
    }

    fn create_meeting_service(&self) -> Result<Arc<dyn MeetingService>, SdkStatus> {
        Ok(self.meeting.clone())
    }

    fn create_auth_service(&self) -> Result<Arc<dyn AuthService>, SdkStatus> {
        Ok(self.auth.clone())
    }

    fn pump_events(&self) {
        self.pumps.fetch_add(1, Ordering::SeqCst);
        let ran = self.queue.drain();
        if ran > 0 {
            debug!("Simulated platform delivered {} events", ran);
        }
    }

    fn cleanup_sdk(&self) -> SdkStatus {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        SdkStatus::Success
    }
}

/// Meeting service with scripted statuses and call recording.
pub struct SimMeetingService {
    me: Weak<SimMeetingService>,
    queue: EventQueue,
    auto_flow: AtomicBool,
    status: Mutex<MeetingStatus>,
    join_status: Mutex<SdkStatus>,
    start_status: Mutex<SdkStatus>,
    leave_status: Mutex<SdkStatus>,
    joins: Mutex<Vec<JoinParams>>,
    starts: Mutex<Vec<StartParams>>,
    leaves: AtomicUsize,
    listener: Mutex<Option<Arc<dyn MeetingServiceEvent>>>,
    pub recording: Arc<SimRecordingController>,
    pub sharing: Arc<SimSharingController>,
    pub audio: Arc<SimAudioController>,
    pub video: Arc<SimVideoController>,
    pub participants: Arc<SimParticipantsController>,
    pub reminder: Arc<SimReminderController>,
    pub audio_helper: Arc<SimAudioHelper>,
    renderers: Mutex<Vec<Arc<SimRenderer>>>,
    renderer_status: Mutex<SdkStatus>,
}

impl SimMeetingService {
    fn new(queue: EventQueue) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            recording: SimRecordingController::new(queue.clone()),
            queue,
            auto_flow: AtomicBool::new(false),
            status: Mutex::new(MeetingStatus::Idle),
            join_status: Mutex::new(SdkStatus::Success),
            start_status: Mutex::new(SdkStatus::Success),
            leave_status: Mutex::new(SdkStatus::Success),
            joins: Mutex::new(Vec::new()),
            starts: Mutex::new(Vec::new()),
            leaves: AtomicUsize::new(0),
            listener: Mutex::new(None),
            sharing: Arc::new(SimSharingController::default()),
            audio: Arc::new(SimAudioController::default()),
            video: Arc::new(SimVideoController::default()),
            participants: Arc::new(SimParticipantsController::default()),
            reminder: Arc::new(SimReminderController::default()),
            audio_helper: Arc::new(SimAudioHelper::default()),
            renderers: Mutex::new(Vec::new()),
            renderer_status: Mutex::new(SdkStatus::Success),
        })
    }

    pub fn set_auto_flow(&self, enabled: bool) {
        self.auto_flow.store(enabled, Ordering::SeqCst);
        self.recording.auto_grant.store(enabled, Ordering::SeqCst);
    }

    pub fn set_join_status(&self, status: SdkStatus) {
        *self.join_status.lock() = status;
    }

    pub fn set_start_status(&self, status: SdkStatus) {
        *self.start_status.lock() = status;
    }

    pub fn set_leave_status(&self, status: SdkStatus) {
        *self.leave_status.lock() = status;
    }

    pub fn set_renderer_status(&self, status: SdkStatus) {
        *self.renderer_status.lock() = status;
    }

    pub fn joins(&self) -> Vec<JoinParams> {
        self.joins.lock().clone()
    }

    pub fn starts(&self) -> Vec<StartParams> {
        self.starts.lock().clone()
    }

    pub fn leave_count(&self) -> usize {
        self.leaves.load(Ordering::SeqCst)
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }

    pub fn renderers(&self) -> Vec<Arc<SimRenderer>> {
        self.renderers.lock().clone()
    }

    pub fn last_renderer(&self) -> Option<Arc<SimRenderer>> {
        self.renderers.lock().last().cloned()
    }

    /// Changes the meeting status and notifies the listener on this thread.
    pub fn fire_status(&self, status: MeetingStatus) {
        *self.status.lock() = status;
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_meeting_status_changed(status, 0);
        }
    }

    fn queue_status(&self, status: MeetingStatus) {
        let me = self.me.clone();
        self.queue.push(move || {
            if let Some(service) = me.upgrade() {
                service.fire_status(status);
            }
        });
    }
}

impl MeetingService for SimMeetingService {
    fn join(&self, params: &JoinParams) -> SdkStatus {
        self.joins.lock().push(params.clone());
        let status = *self.join_status.lock();
        if status.is_success() {
            *self.status.lock() = MeetingStatus::Connecting;
            if self.auto_flow.load(Ordering::SeqCst) {
                self.queue_status(MeetingStatus::InMeeting);
            }
        }
        status
    }

    fn start(&self, params: &StartParams) -> SdkStatus {
        self.starts.lock().push(params.clone());
        let status = *self.start_status.lock();
        if status.is_success() {
            *self.status.lock() = MeetingStatus::Connecting;
            if self.auto_flow.load(Ordering::SeqCst) {
                self.queue_status(MeetingStatus::InMeeting);
            }
        }
        status
    }

    fn leave(&self, _kind: LeaveKind) -> SdkStatus {
        self.leaves.fetch_add(1, Ordering::SeqCst);
        let status = *self.leave_status.lock();
        if status.is_success() {
            *self.status.lock() = MeetingStatus::Disconnecting;
            if self.auto_flow.load(Ordering::SeqCst) {
                self.queue_status(MeetingStatus::Ended);
            }
        }
        status
    }

    fn status(&self) -> MeetingStatus {
        *self.status.lock()
    }

    fn set_event(&self, listener: Option<Arc<dyn MeetingServiceEvent>>) -> SdkStatus {
        *self.listener.lock() = listener;
        SdkStatus::Success
    }

    fn recording_controller(&self) -> Option<Arc<dyn RecordingController>> {
        Some(self.recording.clone())
    }

    fn sharing_controller(&self) -> Option<Arc<dyn SharingController>> {
        Some(self.sharing.clone())
    }

    fn audio_controller(&self) -> Option<Arc<dyn AudioController>> {
        Some(self.audio.clone())
    }

    fn video_controller(&self) -> Option<Arc<dyn VideoController>> {
        Some(self.video.clone())
    }

    fn participants_controller(&self) -> Option<Arc<dyn ParticipantsController>> {
        Some(self.participants.clone())
    }

    fn reminder_controller(&self) -> Option<Arc<dyn ReminderController>> {
        Some(self.reminder.clone())
    }

    fn audio_raw_helper(&self) -> Option<Arc<dyn AudioRawHelper>> {
        Some(self.audio_helper.clone())
    }

    fn create_renderer(
        &self,
        delegate: Arc<dyn RendererDelegate>,
    ) -> Result<Arc<dyn VideoRenderer>, SdkStatus> {
        let status = *self.renderer_status.lock();
        if !status.is_success() {
            return Err(status);
        }
        let renderer = Arc::new(SimRenderer::new(delegate));
        self.renderers.lock().push(renderer.clone());
        Ok(renderer)
    }
}

/// Recording controller with a scripted privilege.
pub struct SimRecordingController {
    me: Weak<SimRecordingController>,
    queue: EventQueue,
    auto_grant: AtomicBool,
    can_start: Mutex<SdkStatus>,
    start_status: Mutex<SdkStatus>,
    stop_status: Mutex<SdkStatus>,
    privilege_requests: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
    listener: Mutex<Option<Arc<dyn RecordingCtrlEvent>>>,
}

impl SimRecordingController {
    fn new(queue: EventQueue) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            queue,
            auto_grant: AtomicBool::new(false),
            can_start: Mutex::new(SdkStatus::NoPermission),
            start_status: Mutex::new(SdkStatus::Success),
            stop_status: Mutex::new(SdkStatus::Success),
            privilege_requests: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            listener: Mutex::new(None),
        })
    }

    pub fn set_can_start(&self, status: SdkStatus) {
        *self.can_start.lock() = status;
    }

    pub fn set_start_status(&self, status: SdkStatus) {
        *self.start_status.lock() = status;
    }

    pub fn set_stop_status(&self, status: SdkStatus) {
        *self.stop_status.lock() = status;
    }

    pub fn privilege_request_count(&self) -> usize {
        self.privilege_requests.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Grants or revokes the privilege and notifies the listener on this thread.
    pub fn fire_privilege_changed(&self, can_record: bool) {
        self.set_can_start(if can_record {
            SdkStatus::Success
        } else {
            SdkStatus::NoPermission
        });
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_record_privilege_changed(can_record);
        }
    }
}

impl RecordingController for SimRecordingController {
    fn can_start_raw_recording(&self) -> SdkStatus {
        *self.can_start.lock()
    }

    fn request_local_recording_privilege(&self) -> SdkStatus {
        self.privilege_requests.fetch_add(1, Ordering::SeqCst);
        if self.auto_grant.load(Ordering::SeqCst) {
            let me = self.me.clone();
            self.queue.push(move || {
                if let Some(controller) = me.upgrade() {
                    controller.fire_privilege_changed(true);
                }
            });
        }
        SdkStatus::Success
    }

    fn start_raw_recording(&self) -> SdkStatus {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.start_status.lock()
    }

    fn stop_raw_recording(&self) -> SdkStatus {
        self.stops.fetch_add(1, Ordering::SeqCst);
        *self.stop_status.lock()
    }

    fn set_event(&self, listener: Option<Arc<dyn RecordingCtrlEvent>>) -> SdkStatus {
        *self.listener.lock() = listener;
        SdkStatus::Success
    }
}

/// Sharing controller tracking the active share sources.
#[derive(Default)]
pub struct SimSharingController {
    sources: Mutex<Vec<ShareSourceInfo>>,
    listener: Mutex<Option<Arc<dyn ShareCtrlEvent>>>,
}

impl SimSharingController {
    /// Registers a share that is already running, without an event.
    pub fn add_source(&self, info: ShareSourceInfo) {
        self.sources.lock().push(info);
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Updates the active sources and notifies the listener on this thread.
    pub fn fire_sharing_status(&self, info: ShareSourceInfo) {
        {
            let mut sources = self.sources.lock();
            match info.status {
                SharingStatus::OtherShareBegin | SharingStatus::SelfSendBegin => {
                    sources.retain(|s| s.share_source_id != info.share_source_id);
                    sources.push(info);
                }
                SharingStatus::OtherShareEnd | SharingStatus::SelfSendEnd => {
                    sources.retain(|s| s.share_source_id != info.share_source_id);
                }
                _ => {}
            }
        }
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_sharing_status(&info);
        }
    }
}

impl SharingController for SimSharingController {
    fn viewable_sharing_users(&self) -> Vec<u32> {
        let mut users: Vec<u32> = self.sources.lock().iter().map(|s| s.user_id).collect();
        users.dedup();
        users
    }

    fn sharing_sources(&self, user_id: u32) -> Vec<ShareSourceInfo> {
        self.sources
            .lock()
            .iter()
            .filter(|s| s.user_id == user_id)
            .copied()
            .collect()
    }

    fn set_event(&self, listener: Option<Arc<dyn ShareCtrlEvent>>) -> SdkStatus {
        *self.listener.lock() = listener;
        SdkStatus::Success
    }
}

#[derive(Default)]
pub struct SimAudioController {
    voip_joins: AtomicUsize,
    mutes: Mutex<Vec<(u32, bool)>>,
}

impl SimAudioController {
    pub fn voip_join_count(&self) -> usize {
        self.voip_joins.load(Ordering::SeqCst)
    }

    pub fn mutes(&self) -> Vec<(u32, bool)> {
        self.mutes.lock().clone()
    }
}

impl AudioController for SimAudioController {
    fn join_voip(&self) -> SdkStatus {
        self.voip_joins.fetch_add(1, Ordering::SeqCst);
        SdkStatus::Success
    }

    fn mute_audio(&self, user_id: u32, allow_unmute_by_self: bool) -> SdkStatus {
        self.mutes.lock().push((user_id, allow_unmute_by_self));
        SdkStatus::Success
    }
}

#[derive(Default)]
pub struct SimVideoController {
    mutes: AtomicUsize,
}

impl SimVideoController {
    pub fn mute_count(&self) -> usize {
        self.mutes.load(Ordering::SeqCst)
    }
}

impl VideoController for SimVideoController {
    fn mute_video(&self) -> SdkStatus {
        self.mutes.fetch_add(1, Ordering::SeqCst);
        SdkStatus::Success
    }
}

pub struct SimParticipantsController {
    my_user_id: Mutex<Option<u32>>,
}

impl Default for SimParticipantsController {
    fn default() -> Self {
        Self {
            my_user_id: Mutex::new(Some(16778240)),
        }
    }
}

impl SimParticipantsController {
    pub fn set_my_user_id(&self, user_id: Option<u32>) {
        *self.my_user_id.lock() = user_id;
    }
}

impl ParticipantsController for SimParticipantsController {
    fn my_user_id(&self) -> Option<u32> {
        *self.my_user_id.lock()
    }
}

/// What a reminder handler was told to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderAnswer {
    Accepted,
    Ignored,
    Declined,
}

#[derive(Default)]
struct RecordingReminderHandler {
    answer: Mutex<Option<ReminderAnswer>>,
}

impl ReminderHandler for RecordingReminderHandler {
    fn accept(&self) -> SdkStatus {
        *self.answer.lock() = Some(ReminderAnswer::Accepted);
        SdkStatus::Success
    }

    fn ignore(&self) -> SdkStatus {
        *self.answer.lock() = Some(ReminderAnswer::Ignored);
        SdkStatus::Success
    }

    fn decline(&self) -> SdkStatus {
        *self.answer.lock() = Some(ReminderAnswer::Declined);
        SdkStatus::Success
    }
}

#[derive(Default)]
pub struct SimReminderController {
    listener: Mutex<Option<Arc<dyn ReminderEvent>>>,
}

impl SimReminderController {
    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Shows a reminder and returns how the listener answered it.
    pub fn fire_reminder(&self, content: ReminderContent) -> Option<ReminderAnswer> {
        let handler = RecordingReminderHandler::default();
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_reminder_notify(Some(&content), Some(&handler));
        }
        let answer = *handler.answer.lock();
        answer
    }

    /// Shows an "enable reminder" prompt and returns how the listener answered it.
    pub fn fire_enable_reminder(&self, content: ReminderContent) -> Option<ReminderAnswer> {
        let handler = RecordingReminderHandler::default();
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_enable_reminder_notify(Some(&content), Some(&handler));
        }
        let answer = *handler.answer.lock();
        answer
    }
}

impl ReminderController for SimReminderController {
    fn set_event(&self, listener: Option<Arc<dyn ReminderEvent>>) -> SdkStatus {
        *self.listener.lock() = listener;
        SdkStatus::Success
    }
}

/// Raw audio helper that can refuse subscription while "audio is not joined".
#[derive(Default)]
pub struct SimAudioHelper {
    not_joined_remaining: AtomicUsize,
    failure: Mutex<Option<SdkStatus>>,
    subscribes: AtomicUsize,
    unsubscribes: AtomicUsize,
    delegate: Mutex<Option<Arc<dyn AudioRawDataDelegate>>>,
}

impl SimAudioHelper {
    /// The next `count` subscribe calls report [`SdkStatus::NotJoinAudio`].
    /// `usize::MAX` never stops.
    pub fn fail_not_joined(&self, count: usize) {
        self.not_joined_remaining.store(count, Ordering::SeqCst);
    }

    /// Every subscribe call reports `status`.
    pub fn fail_with(&self, status: SdkStatus) {
        *self.failure.lock() = Some(status);
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        self.delegate.lock().is_some()
    }

    pub fn push_mixed_audio(&self, buffer: &[u8]) {
        let delegate = self.delegate.lock().clone();
        if let Some(delegate) = delegate {
            delegate.on_mixed_audio_raw_data_received(&Self::raw(buffer));
        }
    }

    pub fn push_one_way_audio(&self, buffer: &[u8], user_id: u32) {
        let delegate = self.delegate.lock().clone();
        if let Some(delegate) = delegate {
            delegate.on_one_way_audio_raw_data_received(&Self::raw(buffer), user_id);
        }
    }

    fn raw(buffer: &[u8]) -> AudioRawData {
        AudioRawData {
            buffer: buffer.to_vec(),
            sample_rate: 32000,
            channels: 1,
        }
    }
}

impl AudioRawHelper for SimAudioHelper {
    fn subscribe(&self, delegate: Arc<dyn AudioRawDataDelegate>) -> SdkStatus {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = *self.failure.lock() {
            return status;
        }
        let remaining = self.not_joined_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != usize::MAX {
                self.not_joined_remaining.store(remaining - 1, Ordering::SeqCst);
            }
            return SdkStatus::NotJoinAudio;
        }
        *self.delegate.lock() = Some(delegate);
        SdkStatus::Success
    }

    fn unsubscribe(&self) -> SdkStatus {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        *self.delegate.lock() = None;
        SdkStatus::Success
    }
}

/// Renderer recording every subscription change.
pub struct SimRenderer {
    delegate: Arc<dyn RendererDelegate>,
    resolution: Mutex<Option<VideoResolution>>,
    subscriptions: Mutex<Vec<(u32, RawDataType)>>,
    current: Mutex<Option<u32>>,
    unsubscribes: AtomicUsize,
    destroyed: AtomicBool,
}

impl SimRenderer {
    fn new(delegate: Arc<dyn RendererDelegate>) -> Self {
        Self {
            delegate,
            resolution: Mutex::new(None),
            subscriptions: Mutex::new(Vec::new()),
            current: Mutex::new(None),
            unsubscribes: AtomicUsize::new(0),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn resolution(&self) -> Option<VideoResolution> {
        *self.resolution.lock()
    }

    pub fn subscriptions(&self) -> Vec<(u32, RawDataType)> {
        self.subscriptions.lock().clone()
    }

    pub fn current_source(&self) -> Option<u32> {
        *self.current.lock()
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Emits one I420 frame from the current source, if any.
    pub fn push_frame(&self, width: u32, height: u32, timestamp: u64) {
        let Some(source_id) = self.current_source() else {
            return;
        };
        let luma = (width * height) as usize;
        let frame = YuvRawData {
            y: vec![16; luma],
            u: vec![128; luma / 4],
            v: vec![128; luma / 4],
            width,
            height,
            source_id,
            timestamp,
        };
        self.delegate.on_raw_data_frame_received(&frame);
    }
}

impl VideoRenderer for SimRenderer {
    fn set_resolution(&self, resolution: VideoResolution) -> SdkStatus {
        *self.resolution.lock() = Some(resolution);
        SdkStatus::Success
    }

    fn subscribe(&self, source_id: u32, kind: RawDataType) -> SdkStatus {
        self.subscriptions.lock().push((source_id, kind));
        *self.current.lock() = Some(source_id);
        self.delegate.on_raw_data_status_changed(RawDataStatus::On);
        SdkStatus::Success
    }

    fn unsubscribe(&self) -> SdkStatus {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        if self.current.lock().take().is_some() {
            self.delegate.on_raw_data_status_changed(RawDataStatus::Off);
        }
        SdkStatus::Success
    }

    fn destroy(&self) -> SdkStatus {
        if !self.destroyed.swap(true, Ordering::SeqCst) {
            self.delegate.on_renderer_destroyed();
        }
        SdkStatus::Success
    }
}

#[derive(Default)]
pub struct SimSettingService {
    pub audio: Arc<SimAudioSettings>,
}

impl SettingService for SimSettingService {
    fn audio_settings(&self) -> Option<Arc<dyn AudioSettings>> {
        Some(self.audio.clone())
    }
}

#[derive(Default)]
pub struct SimAudioSettings {
    auto_join: Mutex<Vec<bool>>,
}

impl SimAudioSettings {
    pub fn auto_join_calls(&self) -> Vec<bool> {
        self.auto_join.lock().clone()
    }
}

impl AudioSettings for SimAudioSettings {
    fn enable_auto_join_audio(&self, enable: bool) -> SdkStatus {
        self.auto_join.lock().push(enable);
        SdkStatus::Success
    }
}

/// Auth service that answers through the event queue.
pub struct SimAuthService {
    queue: EventQueue,
    result: Mutex<AuthResult>,
    respond: AtomicBool,
    contexts: Mutex<Vec<AuthContext>>,
    listener: Mutex<Option<Arc<dyn AuthServiceEvent>>>,
}

impl SimAuthService {
    fn new(queue: EventQueue) -> Self {
        Self {
            queue,
            result: Mutex::new(AuthResult::Success),
            respond: AtomicBool::new(true),
            contexts: Mutex::new(Vec::new()),
            listener: Mutex::new(None),
        }
    }

    pub fn set_result(&self, result: AuthResult) {
        *self.result.lock() = result;
    }

    /// When disabled, authentication never completes.
    pub fn set_respond(&self, respond: bool) {
        self.respond.store(respond, Ordering::SeqCst);
    }

    pub fn contexts(&self) -> Vec<AuthContext> {
        self.contexts.lock().clone()
    }
}

impl AuthService for SimAuthService {
    fn set_event(&self, listener: Option<Arc<dyn AuthServiceEvent>>) -> SdkStatus {
        *self.listener.lock() = listener;
        SdkStatus::Success
    }

    fn sdk_auth(&self, context: &AuthContext) -> SdkStatus {
        self.contexts.lock().push(context.clone());
        if !self.respond.load(Ordering::SeqCst) {
            return SdkStatus::Success;
        }
        let listener = self.listener.lock().clone();
        let result = *self.result.lock();
        if let Some(listener) = listener {
            self.queue
                .push(move || listener.on_authentication_return(result));
        }
        SdkStatus::Success
    }
}

#[derive(Default)]
pub struct SimNetworkHelper {
    proxies: Mutex<Vec<ProxySettings>>,
}

impl SimNetworkHelper {
    pub fn proxies(&self) -> Vec<ProxySettings> {
        self.proxies.lock().clone()
    }
}

impl NetworkConnectionHelper for SimNetworkHelper {
    fn configure_proxy(&self, settings: &ProxySettings) -> SdkStatus {
        self.proxies.lock().push(settings.clone());
        SdkStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queue_drains_nested_events() {
        let queue = EventQueue::default();
        let counter = Arc::new(AtomicUsize::new(0));

        let inner_queue = queue.clone();
        let inner_counter = counter.clone();
        queue.push(move || {
            inner_counter.fetch_add(1, Ordering::SeqCst);
            let again = inner_counter.clone();
            inner_queue.push(move || {
                again.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(queue.drain(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_audio_helper_not_joined_countdown() {
        let helper = SimAudioHelper::default();
        helper.fail_not_joined(2);

        struct Noop;
        impl AudioRawDataDelegate for Noop {
            fn on_mixed_audio_raw_data_received(&self, _: &AudioRawData) {}
            fn on_one_way_audio_raw_data_received(&self, _: &AudioRawData, _: u32) {}
            fn on_share_audio_raw_data_received(&self, _: &AudioRawData, _: u32) {}
            fn on_one_way_interpreter_audio_raw_data_received(&self, _: &AudioRawData, _: &str) {}
        }

        let delegate: Arc<dyn AudioRawDataDelegate> = Arc::new(Noop);
        assert_eq!(helper.subscribe(delegate.clone()), SdkStatus::NotJoinAudio);
        assert_eq!(helper.subscribe(delegate.clone()), SdkStatus::NotJoinAudio);
        assert_eq!(helper.subscribe(delegate), SdkStatus::Success);
        assert_eq!(helper.subscribe_count(), 3);
        assert!(helper.is_subscribed());
    }

    #[test]
    fn test_join_with_auto_flow_queues_in_meeting() {
        let platform = SimPlatform::new().with_auto_flow();
        let params = JoinParams {
            meeting_number: 123,
            user_name: "bot".to_string(),
            password: "pw".to_string(),
            app_privilege_token: None,
            is_video_off: true,
            is_audio_off: false,
        };

        assert_eq!(platform.meeting.join(&params), SdkStatus::Success);
        assert_eq!(platform.meeting.status(), MeetingStatus::Connecting);

        platform.pump_events();
        assert_eq!(platform.meeting.status(), MeetingStatus::InMeeting);
    }
}
