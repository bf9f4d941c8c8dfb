//! Session lifecycle orchestrator.
//!
//! Drives one bot presence in a meeting:
//! idle → joining/starting → joined (→ recording) → leaving → idle
//!
//! Join and start only report whether the platform accepted the request.
//! Completion arrives later through the lifecycle adapter, which is the only
//! authority on whether the session is joined. Platform events and caller
//! commands may arrive on different threads; all state lives behind
//! `parking_lot` locks or atomics.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::events::{MeetingServiceAdapter, RecordingPrivilegeAdapter, ReminderAdapter, ShareAdapter};
use crate::platform::{
    AudioRawDataDelegate, AudioRawHelper, JoinParams, LeaveKind, MeetingService, MeetingStatus,
    RawDataType, RecordingController, ReminderController, RendererDelegate, SdkStatus,
    SettingService, ShareSourceInfo, SharingController, StartParams, VideoRenderer,
};

use super::config::{RecordingOptions, RetryPolicy, SessionConfig};
use super::error::{check, reject, SessionError, SessionResult};
use super::status::{SessionPhase, SessionSnapshot};

/// Resources held while raw recording is active (or partially started).
#[derive(Default)]
struct Capture {
    recording: bool,
    /// Set once the platform accepted a raw recording start; cleared when stopped.
    platform_recording: Option<Arc<dyn RecordingController>>,
    audio_helper: Option<Arc<dyn AudioRawHelper>>,
    renderer: Option<Arc<dyn VideoRenderer>>,
    share_source_id: u32,
    share_subscribed: bool,
}

#[derive(Default)]
struct Sinks {
    audio: Option<Arc<dyn AudioRawDataDelegate>>,
    video: Option<Arc<dyn RendererDelegate>>,
}

/// Adapters registered with the platform, with the slot each one occupies.
#[derive(Default)]
struct Listeners {
    meeting: Option<Arc<MeetingServiceAdapter>>,
    reminder: Option<(Arc<dyn ReminderController>, Arc<ReminderAdapter>)>,
    share: Option<(Arc<dyn SharingController>, Arc<ShareAdapter>)>,
    recording: Option<(Arc<dyn RecordingController>, Arc<RecordingPrivilegeAdapter>)>,
}

struct SessionInner {
    config: SessionConfig,
    meeting: Option<Arc<dyn MeetingService>>,
    settings: Option<Arc<dyn SettingService>>,
    options: Mutex<RecordingOptions>,
    phase: Mutex<SessionPhase>,
    joined: AtomicBool,
    recording: AtomicBool,
    capture: Mutex<Capture>,
    sinks: Mutex<Sinks>,
    listeners: Mutex<Listeners>,
}

/// One bot presence in a meeting. Dropping it stops recording, unregisters
/// every adapter and leaves the meeting if still joined.
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Builds a session without validating its collaborators. Operations that
    /// need a missing service fail with [`SessionError::Uninitialized`].
    pub fn new(
        config: SessionConfig,
        meeting: Option<Arc<dyn MeetingService>>,
        settings: Option<Arc<dyn SettingService>>,
    ) -> Self {
        let inner = Arc::new(SessionInner {
            config,
            meeting,
            settings,
            options: Mutex::new(RecordingOptions::default()),
            phase: Mutex::new(SessionPhase::Idle),
            joined: AtomicBool::new(false),
            recording: AtomicBool::new(false),
            capture: Mutex::new(Capture::default()),
            sinks: Mutex::new(Sinks::default()),
            listeners: Mutex::new(Listeners::default()),
        });
        inner.register_lifecycle_listener();
        Self { inner }
    }

    /// Builds a session, requiring both platform services.
    pub fn create(
        config: SessionConfig,
        meeting: Option<Arc<dyn MeetingService>>,
        settings: Option<Arc<dyn SettingService>>,
    ) -> SessionResult<Self> {
        if meeting.is_none() || settings.is_none() {
            error!("meeting service and setting service must be provided to create a session");
            return Err(SessionError::Uninitialized);
        }
        Ok(Self::new(config, meeting, settings))
    }

    pub fn with_recording_options(self, options: RecordingOptions) -> Self {
        self.set_recording_options(options);
        self
    }

    pub fn set_recording_options(&self, options: RecordingOptions) {
        *self.inner.options.lock() = options;
    }

    /// Consumer of raw audio. Takes effect at the next recording start.
    pub fn set_audio_sink(&self, sink: Arc<dyn AudioRawDataDelegate>) {
        self.inner.sinks.lock().audio = Some(sink);
    }

    /// Consumer of raw share video. Required before recording when video capture is on.
    pub fn set_video_sink(&self, sink: Arc<dyn RendererDelegate>) {
        self.inner.sinks.lock().video = Some(sink);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Requests to join as a participant without a platform login.
    pub fn join(&self) -> SessionResult<()> {
        self.inner.join()
    }

    /// Requests to start the meeting as its owner.
    pub fn start(&self) -> SessionResult<()> {
        self.inner.start()
    }

    pub fn start_or_join(&self) -> SessionResult<()> {
        if self.inner.config.is_start {
            self.start()
        } else {
            self.join()
        }
    }

    pub fn leave(&self) -> SessionResult<()> {
        self.inner.leave()
    }

    /// Starts raw capture. Blocks for up to the audio retry budget while the
    /// audio transport finishes joining.
    pub fn start_raw_recording(&self) -> SessionResult<()> {
        self.inner.start_raw_recording()
    }

    pub fn stop_raw_recording(&self) -> SessionResult<()> {
        self.inner.stop_raw_recording()
    }

    pub fn subscribe_share(&self, info: &ShareSourceInfo) {
        self.inner.subscribe_share(info);
    }

    pub fn unsubscribe_share(&self, info: &ShareSourceInfo) {
        self.inner.unsubscribe_share(info);
    }

    pub fn is_joined(&self) -> bool {
        self.inner.joined.load(Ordering::SeqCst)
    }

    pub fn is_recording(&self) -> bool {
        self.inner.recording.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> SessionPhase {
        *self.inner.phase.lock()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let capture = self.inner.capture.lock();
        SessionSnapshot {
            phase: *self.inner.phase.lock(),
            joined: self.is_joined(),
            recording: capture.recording,
            share_source_id: capture.share_source_id,
            share_subscribed: capture.share_subscribed,
        }
    }

    /// Meeting status as reported by the platform.
    pub fn platform_status(&self) -> MeetingStatus {
        self.inner
            .meeting
            .as_ref()
            .map(|meeting| meeting.status())
            .unwrap_or(MeetingStatus::Unknown)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl SessionInner {
    fn meeting_service(&self) -> SessionResult<Arc<dyn MeetingService>> {
        self.meeting.clone().ok_or_else(|| {
            error!("no meeting service available");
            SessionError::Uninitialized
        })
    }

    /// Moves to `next` unless a join or start is already outstanding.
    fn begin(&self, next: SessionPhase) -> SessionResult<SessionPhase> {
        let mut phase = self.phase.lock();
        if phase.is_engaged() {
            warn!("cannot move to {} while {}", next.as_str(), phase.as_str());
            return Err(SessionError::WrongUsage(format!(
                "session is already {}",
                phase.as_str()
            )));
        }
        let previous = *phase;
        *phase = next;
        Ok(previous)
    }

    /// Undoes `begin` unless an event has already moved the phase on.
    fn restore(&self, expected: SessionPhase, previous: SessionPhase) {
        let mut phase = self.phase.lock();
        if *phase == expected {
            *phase = previous;
        }
    }

    fn join(&self) -> SessionResult<()> {
        let meeting = self.meeting_service()?;
        let config = &self.config;

        if config.meeting_id.is_empty() || config.password.is_empty() {
            error!("a meeting id and password are required to join a meeting");
            return Err(SessionError::InvalidParameter(
                "meeting id and password are required".to_string(),
            ));
        }
        let meeting_number: u64 = config.meeting_id.trim().parse().map_err(|_| {
            error!("meeting id {:?} is not a number", config.meeting_id);
            SessionError::InvalidParameter(format!("meeting id {} is not a number", config.meeting_id))
        })?;

        let previous = self.begin(SessionPhase::Joining)?;

        if config.capture_audio {
            if let Err(e) = self.enable_auto_join_audio() {
                self.restore(SessionPhase::Joining, previous);
                return Err(e);
            }
        }

        let params = JoinParams {
            meeting_number,
            user_name: config.display_name.clone(),
            password: config.password.clone(),
            app_privilege_token: config.join_token.clone().filter(|t| !t.is_empty()),
            is_video_off: true,
            is_audio_off: false,
        };

        info!("joining meeting {} as {:?}", meeting_number, config.display_name);
        let result = check(meeting.join(&params), "join meeting");
        if result.is_err() {
            self.restore(SessionPhase::Joining, previous);
        }
        result
    }

    fn enable_auto_join_audio(&self) -> SessionResult<()> {
        let settings = self.settings.as_ref().ok_or_else(|| {
            error!("no setting service available");
            SessionError::Uninitialized
        })?;
        let audio = settings.audio_settings().ok_or_else(|| {
            error!("audio settings are unavailable");
            SessionError::InternalError("audio settings are unavailable".to_string())
        })?;
        check(audio.enable_auto_join_audio(true), "enable auto-join audio")
    }

    fn start(&self) -> SessionResult<()> {
        let meeting = self.meeting_service()?;
        let previous = self.begin(SessionPhase::Starting)?;

        let params = StartParams {
            is_video_off: true,
            is_audio_off: false,
        };
        let result = check(meeting.start(&params), "start meeting");
        if result.is_err() {
            self.restore(SessionPhase::Starting, previous);
        }
        result
    }

    fn leave(&self) -> SessionResult<()> {
        let meeting = self.meeting_service()?;

        if self.recording.load(Ordering::SeqCst) {
            if let Err(e) = self.stop_raw_recording() {
                warn!("leaving with an unclean recording stop: {}", e);
            }
        }

        check(meeting.leave(LeaveKind::LeaveMeeting), "leave meeting")?;

        let mut phase = self.phase.lock();
        if phase.is_engaged() {
            *phase = SessionPhase::Leaving;
        }
        Ok(())
    }

    fn on_session_joined(self: &Arc<Self>) {
        self.joined.store(true, Ordering::SeqCst);
        *self.phase.lock() = SessionPhase::Joined;
        info!("session joined meeting {}", self.config.meeting_id);

        let Some(meeting) = self.meeting.clone() else {
            return;
        };

        self.mute_self(meeting.as_ref());
        self.register_reminder_listener(meeting.as_ref());
        if self.config.capture_video {
            self.register_share_listener(meeting.as_ref());
        }
        if self.config.uses_raw_recording() {
            self.prepare_raw_recording(meeting.as_ref());
        }
    }

    fn on_session_left(&self) {
        self.release_capture();
        self.joined.store(false, Ordering::SeqCst);
        self.recording.store(false, Ordering::SeqCst);
        *self.phase.lock() = SessionPhase::Idle;
        info!("session left meeting {}", self.config.meeting_id);
    }

    fn on_failed(&self) {
        let mut phase = self.phase.lock();
        if matches!(*phase, SessionPhase::Joining | SessionPhase::Starting) {
            *phase = SessionPhase::Idle;
        }
    }

    fn on_recording_privilege_changed(&self, can_record: bool) {
        let result = if can_record {
            self.start_raw_recording()
        } else {
            self.stop_raw_recording()
        };
        if let Err(e) = result {
            warn!("recording privilege change not applied: {}", e);
        }
    }

    /// Joins the audio transport and silences the bot.
    fn mute_self(&self, meeting: &dyn MeetingService) {
        match meeting.audio_controller() {
            Some(audio) => {
                if check(audio.join_voip(), "join VoIP").is_ok() {
                    match meeting.participants_controller().and_then(|p| p.my_user_id()) {
                        Some(user_id) => {
                            let _ = check(audio.mute_audio(user_id, true), "mute own audio");
                        }
                        None => warn!("own participant id unknown, audio left unmuted"),
                    }
                }
            }
            None => warn!("audio controller unavailable"),
        }

        match meeting.video_controller() {
            Some(video) => {
                let _ = check(video.mute_video(), "mute own video");
            }
            None => warn!("video controller unavailable"),
        }
    }

    fn prepare_raw_recording(self: &Arc<Self>, meeting: &dyn MeetingService) {
        let Some(recording) = meeting.recording_controller() else {
            error!("recording controller unavailable, raw capture disabled");
            return;
        };
        self.register_recording_listener(recording.clone());

        if recording.can_start_raw_recording().is_success() {
            info!("local recording privilege already granted");
            if let Err(e) = self.start_raw_recording() {
                warn!("raw recording did not start: {}", e);
            }
        } else {
            let _ = check(
                recording.request_local_recording_privilege(),
                "request local recording privilege",
            );
        }
    }

    fn start_raw_recording(&self) -> SessionResult<()> {
        let meeting = self.meeting_service()?;
        let mut capture = self.capture.lock();
        if capture.recording {
            debug!("raw recording already running");
            return Ok(());
        }

        let controller = meeting.recording_controller().ok_or_else(|| {
            error!("recording controller unavailable");
            SessionError::Uninitialized
        })?;
        if !controller.can_start_raw_recording().is_success() {
            warn!("raw recording needs local recording privilege");
            return Err(SessionError::Unauthorized);
        }

        // Leftovers of an earlier partial start.
        release_resources(&mut capture);

        check(controller.start_raw_recording(), "start raw recording")?;
        capture.platform_recording = Some(controller);

        let options = *self.options.lock();
        if self.config.capture_video {
            self.start_video_capture(meeting.as_ref(), &mut capture, &options)?;
        }
        if self.config.capture_audio {
            self.start_audio_capture(meeting.as_ref(), &mut capture, options.audio_retry)?;
        }

        capture.recording = true;
        self.recording.store(true, Ordering::SeqCst);
        info!("raw recording started");
        Ok(())
    }

    fn start_video_capture(
        &self,
        meeting: &dyn MeetingService,
        capture: &mut Capture,
        options: &RecordingOptions,
    ) -> SessionResult<()> {
        let Some(sink) = self.sinks.lock().video.clone() else {
            error!("video capture requested without a video sink");
            return Err(SessionError::Uninitialized);
        };

        let renderer = meeting
            .create_renderer(sink)
            .map_err(|status| reject(status, "create raw video renderer"))?;
        capture.renderer = Some(renderer.clone());
        check(
            renderer.set_resolution(options.video_resolution),
            "set raw video resolution",
        )?;

        // Shares already in progress never send a begin event.
        if let Some(sharing) = meeting.sharing_controller() {
            for user_id in sharing.viewable_sharing_users() {
                for info in sharing.sharing_sources(user_id) {
                    subscribe_share_locked(capture, &info);
                }
            }
        }
        Ok(())
    }

    fn start_audio_capture(
        &self,
        meeting: &dyn MeetingService,
        capture: &mut Capture,
        policy: RetryPolicy,
    ) -> SessionResult<()> {
        let Some(sink) = self.sinks.lock().audio.clone() else {
            warn!("audio capture requested without an audio sink");
            return Ok(());
        };

        let helper = meeting.audio_raw_helper().ok_or_else(|| {
            error!("raw audio helper unavailable");
            SessionError::Uninitialized
        })?;
        capture.audio_helper = Some(helper.clone());
        subscribe_audio(helper.as_ref(), sink, policy)
    }

    fn stop_raw_recording(&self) -> SessionResult<()> {
        let mut capture = self.capture.lock();
        if !capture.recording {
            return Ok(());
        }

        let result = match capture.platform_recording.take() {
            Some(controller) => check(controller.stop_raw_recording(), "stop raw recording"),
            None => Err(SessionError::Uninitialized),
        };

        release_resources(&mut capture);
        capture.recording = false;
        self.recording.store(false, Ordering::SeqCst);
        info!("raw recording stopped");
        result
    }

    fn release_capture(&self) {
        let mut capture = self.capture.lock();
        release_resources(&mut capture);
        capture.recording = false;
    }

    fn subscribe_share(&self, info: &ShareSourceInfo) {
        subscribe_share_locked(&mut self.capture.lock(), info);
    }

    fn unsubscribe_share(&self, info: &ShareSourceInfo) {
        let mut capture = self.capture.lock();
        if !capture.share_subscribed || capture.share_source_id != info.share_source_id {
            return;
        }
        if let Some(renderer) = &capture.renderer {
            let _ = check(renderer.unsubscribe(), "unsubscribe from share");
        }
        capture.share_source_id = 0;
        capture.share_subscribed = false;
    }

    fn register_lifecycle_listener(self: &Arc<Self>) {
        let Some(meeting) = &self.meeting else {
            return;
        };

        let (on_joined, on_left, on_failed) = (
            Arc::downgrade(self),
            Arc::downgrade(self),
            Arc::downgrade(self),
        );
        let adapter = Arc::new(
            MeetingServiceAdapter::new(
                move || {
                    if let Some(inner) = on_joined.upgrade() {
                        inner.on_session_joined();
                    }
                },
                move || {
                    if let Some(inner) = on_left.upgrade() {
                        inner.on_session_left();
                    }
                },
            )
            .with_on_failed(move || {
                if let Some(inner) = on_failed.upgrade() {
                    inner.on_failed();
                }
            }),
        );

        if check(meeting.set_event(Some(adapter.clone())), "register meeting listener").is_ok() {
            self.listeners.lock().meeting = Some(adapter);
        }
    }

    fn register_reminder_listener(&self, meeting: &dyn MeetingService) {
        let Some(controller) = meeting.reminder_controller() else {
            warn!("reminder controller unavailable");
            return;
        };
        let adapter = Arc::new(ReminderAdapter);
        if check(controller.set_event(Some(adapter.clone())), "register reminder listener").is_ok() {
            self.listeners.lock().reminder = Some((controller, adapter));
        }
    }

    fn register_share_listener(self: &Arc<Self>, meeting: &dyn MeetingService) {
        let Some(controller) = meeting.sharing_controller() else {
            warn!("sharing controller unavailable");
            return;
        };

        let (on_start, on_end) = (Arc::downgrade(self), Arc::downgrade(self));
        let adapter = Arc::new(ShareAdapter::new(
            move |info| {
                if let Some(inner) = on_start.upgrade() {
                    inner.subscribe_share(info);
                }
            },
            move |info| {
                if let Some(inner) = on_end.upgrade() {
                    inner.unsubscribe_share(info);
                }
            },
        ));

        if check(controller.set_event(Some(adapter.clone())), "register share listener").is_ok() {
            self.listeners.lock().share = Some((controller, adapter));
        }
    }

    fn register_recording_listener(self: &Arc<Self>, controller: Arc<dyn RecordingController>) {
        let weak = Arc::downgrade(self);
        let adapter = Arc::new(RecordingPrivilegeAdapter::new(move |can_record| {
            if let Some(inner) = weak.upgrade() {
                inner.on_recording_privilege_changed(can_record);
            }
        }));

        if check(controller.set_event(Some(adapter.clone())), "register recording listener").is_ok() {
            self.listeners.lock().recording = Some((controller, adapter));
        }
    }

    fn unregister_listeners(&self) {
        let listeners = std::mem::take(&mut *self.listeners.lock());

        if let Some((controller, _adapter)) = listeners.recording {
            let _ = check(controller.set_event(None), "unregister recording listener");
        }
        if let Some((controller, _adapter)) = listeners.share {
            let _ = check(controller.set_event(None), "unregister share listener");
        }
        if let Some((controller, _adapter)) = listeners.reminder {
            let _ = check(controller.set_event(None), "unregister reminder listener");
        }
        if listeners.meeting.is_some() {
            if let Some(meeting) = &self.meeting {
                let _ = check(meeting.set_event(None), "unregister meeting listener");
            }
        }
    }

    fn teardown(&self) {
        if let Err(e) = self.stop_raw_recording() {
            warn!("raw recording did not stop cleanly: {}", e);
        }
        self.release_capture();
        self.unregister_listeners();

        let leaving = *self.phase.lock() == SessionPhase::Leaving;
        if self.joined.load(Ordering::SeqCst) && !leaving {
            if let Err(e) = self.leave() {
                warn!("failed to leave meeting during teardown: {}", e);
            }
            self.joined.store(false, Ordering::SeqCst);
        }
        debug!("session for meeting {} torn down", self.config.meeting_id);
    }
}

/// Tracks at most one primary-view share; a newer one replaces the current one.
fn subscribe_share_locked(capture: &mut Capture, info: &ShareSourceInfo) {
    let Some(renderer) = capture.renderer.clone() else {
        return;
    };
    if !info.is_showing_in_first_view {
        debug!("share {} is not in the primary view", info.share_source_id);
        return;
    }
    if capture.share_subscribed {
        if capture.share_source_id == info.share_source_id {
            return;
        }
        let _ = check(renderer.unsubscribe(), "unsubscribe from share");
        capture.share_source_id = 0;
        capture.share_subscribed = false;
    }

    if check(
        renderer.subscribe(info.share_source_id, RawDataType::Share),
        "subscribe to share",
    )
    .is_ok()
    {
        info!(
            "subscribed to share {} from user {}",
            info.share_source_id, info.user_id
        );
        capture.share_source_id = info.share_source_id;
        capture.share_subscribed = true;
    }
}

/// Unsubscribes and drops the audio helper and renderer, and stops a
/// platform recording left behind by a partial start. Safe to repeat.
fn release_resources(capture: &mut Capture) {
    if let Some(controller) = capture.platform_recording.take() {
        let _ = check(controller.stop_raw_recording(), "stop raw recording");
    }
    if let Some(helper) = capture.audio_helper.take() {
        let _ = check(helper.unsubscribe(), "unsubscribe from raw audio");
    }
    if let Some(renderer) = capture.renderer.take() {
        let _ = check(renderer.unsubscribe(), "unsubscribe from raw video");
        let _ = check(renderer.destroy(), "destroy raw video renderer");
    }
    capture.share_source_id = 0;
    capture.share_subscribed = false;
}

/// Subscribes raw audio, retrying only while the audio transport is still joining.
fn subscribe_audio(
    helper: &dyn AudioRawHelper,
    sink: Arc<dyn AudioRawDataDelegate>,
    policy: RetryPolicy,
) -> SessionResult<()> {
    let attempts = policy.attempts.max(1);
    let started = Instant::now();

    for attempt in 1..=attempts {
        let status = helper.subscribe(sink.clone());
        if status != SdkStatus::NotJoinAudio {
            return check(status, "subscribe to raw audio");
        }
        debug!(
            "audio not joined yet, subscribe attempt {}/{} deferred",
            attempt, attempts
        );
        if attempt < attempts {
            thread::sleep(policy.interval);
        }
    }

    error!(
        "gave up subscribing to raw audio after {} attempts ({:?})",
        attempts,
        started.elapsed()
    );
    Err(reject(SdkStatus::NotJoinAudio, "subscribe to raw audio"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::sim::SimPlatform;
    use crate::platform::{AudioRawData, RawDataStatus, SharingStatus, YuvRawData};
    use std::time::Duration;

    struct NullAudio;

    impl AudioRawDataDelegate for NullAudio {
        fn on_mixed_audio_raw_data_received(&self, _data: &AudioRawData) {}
        fn on_one_way_audio_raw_data_received(&self, _data: &AudioRawData, _user_id: u32) {}
        fn on_share_audio_raw_data_received(&self, _data: &AudioRawData, _user_id: u32) {}
        fn on_one_way_interpreter_audio_raw_data_received(&self, _data: &AudioRawData, _language: &str) {}
    }

    struct NullVideo;

    impl RendererDelegate for NullVideo {
        fn on_renderer_destroyed(&self) {}
        fn on_raw_data_frame_received(&self, _frame: &YuvRawData) {}
        fn on_raw_data_status_changed(&self, _status: RawDataStatus) {}
    }

    fn session_for(sim: &Arc<SimPlatform>, config: SessionConfig) -> Session {
        let meeting: Arc<dyn MeetingService> = sim.meeting.clone();
        let settings: Arc<dyn SettingService> = sim.settings.clone();
        Session::new(config, Some(meeting), Some(settings)).with_recording_options(RecordingOptions {
            audio_retry: RetryPolicy {
                attempts: 3,
                interval: Duration::from_millis(1),
            },
            ..RecordingOptions::default()
        })
    }

    fn share(source: u32, primary: bool) -> ShareSourceInfo {
        ShareSourceInfo {
            user_id: 42,
            share_source_id: source,
            status: SharingStatus::OtherShareBegin,
            is_showing_in_first_view: primary,
            is_showing_in_second_view: !primary,
        }
    }

    #[test]
    fn test_create_requires_both_services() {
        let sim = SimPlatform::new();
        let meeting: Arc<dyn MeetingService> = sim.meeting.clone();
        let result = Session::create(SessionConfig::join("1", "p", "b"), Some(meeting), None);
        assert_eq!(result.err(), Some(SessionError::Uninitialized));
    }

    #[test]
    fn test_join_rejects_missing_credentials() {
        let sim = SimPlatform::new();
        for config in [
            SessionConfig::join("", "pw", "Bot"),
            SessionConfig::join("123", "", "Bot"),
        ] {
            let session = session_for(&sim, config);
            assert!(matches!(session.join(), Err(SessionError::InvalidParameter(_))));
            assert!(!session.is_joined());
            assert_eq!(session.phase(), SessionPhase::Idle);
        }
        assert!(sim.meeting.joins().is_empty());
    }

    #[test]
    fn test_join_rejects_non_numeric_id() {
        let sim = SimPlatform::new();
        let session = session_for(&sim, SessionConfig::join("abc", "pw", "Bot"));
        assert!(matches!(session.join(), Err(SessionError::InvalidParameter(_))));
        assert!(sim.meeting.joins().is_empty());
    }

    #[test]
    fn test_join_without_meeting_service() {
        let session = Session::new(SessionConfig::join("1", "p", "b"), None, None);
        assert_eq!(session.join(), Err(SessionError::Uninitialized));
        assert_eq!(session.leave(), Err(SessionError::Uninitialized));
        assert_eq!(session.platform_status(), MeetingStatus::Unknown);
    }

    #[test]
    fn test_join_builds_request() {
        let sim = SimPlatform::new();
        let config = SessionConfig::join("123", "pw", "Bot")
            .with_join_token("token")
            .with_audio(true);
        let session = session_for(&sim, config);

        assert!(session.join().is_ok());
        assert_eq!(session.phase(), SessionPhase::Joining);
        assert!(!session.is_joined());

        let joins = sim.meeting.joins();
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].meeting_number, 123);
        assert_eq!(joins[0].user_name, "Bot");
        assert_eq!(joins[0].password, "pw");
        assert_eq!(joins[0].app_privilege_token.as_deref(), Some("token"));
        assert!(joins[0].is_video_off);
        assert!(!joins[0].is_audio_off);
        assert_eq!(sim.settings.audio.auto_join_calls(), vec![true]);
    }

    #[test]
    fn test_double_join_is_wrong_usage() {
        let sim = SimPlatform::new();
        let session = session_for(&sim, SessionConfig::join("123", "pw", "Bot"));
        assert!(session.join().is_ok());
        assert!(matches!(session.join(), Err(SessionError::WrongUsage(_))));
        assert!(matches!(session.start(), Err(SessionError::WrongUsage(_))));
        assert_eq!(sim.meeting.joins().len(), 1);
    }

    #[test]
    fn test_rejected_join_leaves_state_unchanged() {
        let sim = SimPlatform::new();
        sim.meeting.set_join_status(SdkStatus::WrongUsage);
        let session = session_for(&sim, SessionConfig::join("123", "pw", "Bot"));

        let err = session.join().unwrap_err();
        assert_eq!(err.status(), SdkStatus::WrongUsage);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(!session.is_joined());
    }

    #[test]
    fn test_start_or_join_dispatches_on_start_flag() {
        let sim = SimPlatform::new();
        let session = session_for(&sim, SessionConfig::start("Host"));
        assert!(session.start_or_join().is_ok());
        assert_eq!(sim.meeting.starts().len(), 1);
        assert!(sim.meeting.joins().is_empty());
        assert_eq!(session.phase(), SessionPhase::Starting);
    }

    #[test]
    fn test_leave_when_never_joined_still_issues_leave() {
        let sim = SimPlatform::new();
        let session = session_for(&sim, SessionConfig::join("123", "pw", "Bot"));
        assert!(session.leave().is_ok());
        assert_eq!(sim.meeting.leave_count(), 1);
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_joined_event_mutes_and_registers_listeners() {
        let sim = SimPlatform::new();
        let config = SessionConfig::join("123", "pw", "Bot").with_video(true);
        let session = session_for(&sim, config);
        session.join().unwrap();

        sim.meeting.fire_status(MeetingStatus::InMeeting);

        assert!(session.is_joined());
        assert_eq!(session.phase(), SessionPhase::Joined);
        assert_eq!(sim.meeting.audio.voip_join_count(), 1);
        assert_eq!(sim.meeting.audio.mutes(), vec![(16778240, true)]);
        assert_eq!(sim.meeting.video.mute_count(), 1);
        assert!(sim.meeting.reminder.has_listener());
        assert!(sim.meeting.sharing.has_listener());
        assert!(sim.meeting.recording.has_listener());
        assert_eq!(sim.meeting.recording.privilege_request_count(), 1);
        assert!(!session.is_recording());
    }

    #[test]
    fn test_no_capture_skips_recording_setup() {
        let sim = SimPlatform::new();
        let session = session_for(&sim, SessionConfig::join("123", "pw", "Bot"));
        session.join().unwrap();
        sim.meeting.fire_status(MeetingStatus::InMeeting);

        assert!(sim.meeting.reminder.has_listener());
        assert!(!sim.meeting.sharing.has_listener());
        assert!(!sim.meeting.recording.has_listener());
        assert_eq!(sim.meeting.recording.privilege_request_count(), 0);
    }

    #[test]
    fn test_privilege_grant_and_revoke() {
        let sim = SimPlatform::new();
        let session = session_for(&sim, SessionConfig::join("123", "pw", "Bot").with_audio(true));
        session.set_audio_sink(Arc::new(NullAudio));
        session.join().unwrap();
        sim.meeting.fire_status(MeetingStatus::InMeeting);

        sim.meeting.recording.fire_privilege_changed(true);
        assert!(session.is_recording());
        assert!(sim.meeting.audio_helper.is_subscribed());

        sim.meeting.recording.fire_privilege_changed(false);
        assert!(!session.is_recording());
        assert!(!sim.meeting.audio_helper.is_subscribed());
        assert_eq!(sim.meeting.recording.stop_count(), 1);
    }

    #[test]
    fn test_start_raw_recording_twice_is_noop() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_audio(true));
        session.set_audio_sink(Arc::new(NullAudio));

        assert!(session.start_raw_recording().is_ok());
        assert!(session.start_raw_recording().is_ok());
        assert_eq!(sim.meeting.recording.start_count(), 1);
        assert_eq!(sim.meeting.audio_helper.subscribe_count(), 1);
    }

    #[test]
    fn test_start_raw_recording_without_privilege() {
        let sim = SimPlatform::new();
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_audio(true));
        assert_eq!(session.start_raw_recording(), Err(SessionError::Unauthorized));
        assert_eq!(sim.meeting.recording.start_count(), 0);
    }

    #[test]
    fn test_partial_start_is_unwound_on_drop() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        sim.meeting.audio_helper.fail_with(SdkStatus::NoPermission);
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_audio(true));
        session.set_audio_sink(Arc::new(NullAudio));

        assert!(session.start_raw_recording().is_err());
        assert!(!session.is_recording());
        assert_eq!(sim.meeting.recording.start_count(), 1);

        drop(session);
        assert_eq!(sim.meeting.recording.stop_count(), 1);
    }

    #[test]
    fn test_retry_after_partial_start_stops_first() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        sim.meeting.audio_helper.fail_with(SdkStatus::NoPermission);
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_audio(true));
        session.set_audio_sink(Arc::new(NullAudio));
        assert!(session.start_raw_recording().is_err());

        sim.meeting.audio_helper.fail_with(SdkStatus::Success);
        assert!(session.start_raw_recording().is_ok());
        assert_eq!(sim.meeting.recording.start_count(), 2);
        assert_eq!(sim.meeting.recording.stop_count(), 1);
        assert!(session.is_recording());
    }

    #[test]
    fn test_stop_when_not_recording_is_noop() {
        let sim = SimPlatform::new();
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_audio(true));
        assert!(session.stop_raw_recording().is_ok());
        assert_eq!(sim.meeting.recording.stop_count(), 0);
        assert_eq!(sim.meeting.audio_helper.unsubscribe_count(), 0);
    }

    #[test]
    fn test_video_capture_requires_sink() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_video(true));

        assert_eq!(session.start_raw_recording(), Err(SessionError::Uninitialized));
        assert!(!session.is_recording());
        assert!(sim.meeting.renderers().is_empty());
    }

    #[test]
    fn test_existing_primary_shares_are_subscribed_on_start() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        sim.meeting.sharing.add_source(share(5, false));
        sim.meeting.sharing.add_source(share(6, true));
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_video(true));
        session.set_video_sink(Arc::new(NullVideo));

        session.start_raw_recording().unwrap();

        let renderer = sim.meeting.last_renderer().unwrap();
        assert_eq!(renderer.resolution(), Some(crate::platform::VideoResolution::R720p));
        assert_eq!(renderer.subscriptions(), vec![(6, RawDataType::Share)]);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.share_source_id, 6);
        assert!(snapshot.share_subscribed);
        assert!(snapshot.recording);
    }

    #[test]
    fn test_newer_primary_share_replaces_current() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_video(true));
        session.set_video_sink(Arc::new(NullVideo));
        session.start_raw_recording().unwrap();

        session.subscribe_share(&share(1, true));
        session.subscribe_share(&share(2, true));

        let renderer = sim.meeting.last_renderer().unwrap();
        assert_eq!(renderer.unsubscribe_count(), 1);
        assert_eq!(renderer.current_source(), Some(2));
        assert_eq!(session.snapshot().share_source_id, 2);

        session.stop_raw_recording().unwrap();
        assert!(renderer.is_destroyed());
        assert!(!session.snapshot().share_subscribed);
    }

    #[test]
    fn test_share_ignored_without_renderer() {
        let sim = SimPlatform::new();
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_video(true));
        session.subscribe_share(&share(1, true));
        assert!(!session.snapshot().share_subscribed);
    }

    #[test]
    fn test_audio_retry_until_joined() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        sim.meeting.audio_helper.fail_not_joined(2);
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_audio(true));
        session.set_audio_sink(Arc::new(NullAudio));

        assert!(session.start_raw_recording().is_ok());
        assert_eq!(sim.meeting.audio_helper.subscribe_count(), 3);
    }

    #[test]
    fn test_audio_retry_gives_up() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        sim.meeting.audio_helper.fail_not_joined(usize::MAX);
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_audio(true));
        session.set_audio_sink(Arc::new(NullAudio));

        let err = session.start_raw_recording().unwrap_err();
        assert_eq!(err.status(), SdkStatus::NotJoinAudio);
        assert_eq!(sim.meeting.audio_helper.subscribe_count(), 3);
        assert!(!session.is_recording());
    }

    #[test]
    fn test_other_audio_errors_are_not_retried() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        sim.meeting.audio_helper.fail_with(SdkStatus::NoPermission);
        let session = session_for(&sim, SessionConfig::join("1", "p", "b").with_audio(true));
        session.set_audio_sink(Arc::new(NullAudio));

        let err = session.start_raw_recording().unwrap_err();
        assert_eq!(err.status(), SdkStatus::NoPermission);
        assert_eq!(sim.meeting.audio_helper.subscribe_count(), 1);
    }

    #[test]
    fn test_partial_start_is_released_on_retry() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        sim.meeting.audio_helper.fail_with(SdkStatus::NoPermission);
        let config = SessionConfig::join("1", "p", "b").with_audio(true).with_video(true);
        let session = session_for(&sim, config);
        session.set_audio_sink(Arc::new(NullAudio));
        session.set_video_sink(Arc::new(NullVideo));

        assert!(session.start_raw_recording().is_err());
        let first = sim.meeting.last_renderer().unwrap();
        assert!(!first.is_destroyed());

        assert!(session.start_raw_recording().is_err());
        assert!(first.is_destroyed());
        assert_eq!(sim.meeting.renderers().len(), 2);
    }

    #[test]
    fn test_failed_status_returns_to_idle() {
        let sim = SimPlatform::new();
        let session = session_for(&sim, SessionConfig::join("123", "pw", "Bot"));
        session.join().unwrap();
        sim.meeting.fire_status(MeetingStatus::Failed);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.join().is_ok());
    }

    #[test]
    fn test_left_event_resets_state() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        let session = session_for(&sim, SessionConfig::join("123", "pw", "Bot").with_audio(true));
        session.set_audio_sink(Arc::new(NullAudio));
        session.join().unwrap();
        sim.meeting.fire_status(MeetingStatus::InMeeting);
        assert!(session.is_recording());

        sim.meeting.fire_status(MeetingStatus::Ended);
        assert!(!session.is_joined());
        assert!(!session.is_recording());
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(sim.meeting.audio_helper.unsubscribe_count(), 1);
    }

    #[test]
    fn test_drop_unregisters_and_leaves() {
        let sim = SimPlatform::new();
        sim.meeting.recording.set_can_start(SdkStatus::Success);
        let session = session_for(&sim, SessionConfig::join("123", "pw", "Bot").with_audio(true));
        session.set_audio_sink(Arc::new(NullAudio));
        session.join().unwrap();
        sim.meeting.fire_status(MeetingStatus::InMeeting);

        drop(session);

        assert_eq!(sim.meeting.recording.stop_count(), 1);
        assert!(!sim.meeting.has_listener());
        assert!(!sim.meeting.recording.has_listener());
        assert!(!sim.meeting.reminder.has_listener());
        assert_eq!(sim.meeting.leave_count(), 1);

        // Late events find no listener.
        sim.meeting.fire_status(MeetingStatus::Ended);
    }
}
