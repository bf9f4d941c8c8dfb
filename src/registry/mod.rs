//! Handle registry and raw-frame dispatch.
//!
//! Callers that cannot hold native references (the C surface, the CLI's
//! session table) address SDK instances and sessions by opaque integer
//! handles. Every table sits behind one lock; no platform call and no
//! consumer callback ever runs while it is held.

pub mod bridge;
pub mod stats;

pub use bridge::{AudioBridge, VideoBridge};
pub use stats::{FrameStats, MediaKind};

use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

use crate::meeting::{RecordingOptions, Session, SessionConfig, SessionError, SessionResult, SessionSnapshot};
use crate::platform::{AudioFrame, MeetingStatus, Platform, VideoFrame};
use crate::sdk::{Sdk, SdkConfig};

pub type SdkHandle = u64;
pub type SessionHandle = u64;

/// Never issued; stands for "no handle" across the C boundary.
pub const NULL_HANDLE: u64 = 0;

pub type AudioCallback = Arc<dyn Fn(SessionHandle, &AudioFrame<'_>) + Send + Sync>;
pub type VideoCallback = Arc<dyn Fn(SessionHandle, &VideoFrame<'_>) + Send + Sync>;

/// Wraps a closure as an [`AudioCallback`].
pub fn audio_callback<F>(f: F) -> AudioCallback
where
    F: Fn(SessionHandle, &AudioFrame<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a closure as a [`VideoCallback`].
pub fn video_callback<F>(f: F) -> VideoCallback
where
    F: Fn(SessionHandle, &VideoFrame<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Default)]
struct Tables {
    sdks: HashMap<SdkHandle, Arc<Sdk>>,
    sessions: HashMap<SessionHandle, Arc<Session>>,
    audio_callbacks: HashMap<SessionHandle, AudioCallback>,
    video_callbacks: HashMap<SessionHandle, VideoCallback>,
    stats: HashMap<SessionHandle, FrameStats>,
    owners: HashMap<SessionHandle, SdkHandle>,
}

pub struct Registry {
    me: Weak<Registry>,
    tables: Mutex<Tables>,
    next_handle: AtomicU64,
    recording_options: Mutex<RecordingOptions>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            tables: Mutex::new(Tables::default()),
            next_handle: AtomicU64::new(1),
            recording_options: Mutex::new(RecordingOptions::default()),
        })
    }

    fn issue_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::SeqCst)
    }

    /// Options applied to sessions created from now on.
    pub fn set_recording_options(&self, options: RecordingOptions) {
        *self.recording_options.lock() = options;
    }

    pub fn register_sdk(&self, sdk: Arc<Sdk>) -> SdkHandle {
        let handle = self.issue_handle();
        self.tables.lock().sdks.insert(handle, sdk);
        handle
    }

    /// Initializes and authenticates an SDK instance, then registers it.
    pub fn create_sdk(&self, platform: Arc<dyn Platform>, config: SdkConfig) -> SessionResult<SdkHandle> {
        let timeout = config.auth_timeout;
        let sdk = Arc::new(Sdk::new(platform, config));

        sdk.initialize()?;
        if let Err(e) = sdk.authenticate_blocking(timeout) {
            error!("failed to authenticate SDK: {}", e);
            sdk.cleanup();
            return Err(e);
        }

        let handle = self.register_sdk(sdk);
        info!("SDK {} created and authenticated", handle);
        Ok(handle)
    }

    pub fn sdk(&self, handle: SdkHandle) -> Option<Arc<Sdk>> {
        self.tables.lock().sdks.get(&handle).cloned()
    }

    /// Removes and cleans up an SDK instance. Unknown handles are ignored.
    pub fn destroy_sdk(&self, handle: SdkHandle) -> bool {
        let Some(sdk) = self.tables.lock().sdks.remove(&handle) else {
            return false;
        };
        sdk.cleanup();
        info!("SDK {} destroyed", handle);
        true
    }

    /// Builds a session on an authenticated SDK and asks it to join. On a
    /// rejected join nothing stays registered.
    ///
    /// The platform's meeting service holds a single listener, so an SDK
    /// instance carries at most one live session; a second request fails
    /// with `WrongUsage` and leaves the first session untouched.
    pub fn create_and_join(&self, sdk_handle: SdkHandle, config: SessionConfig) -> SessionResult<SessionHandle> {
        let sdk = self.sdk(sdk_handle).ok_or_else(|| {
            error!("unknown SDK handle {}", sdk_handle);
            SessionError::NotFound(sdk_handle)
        })?;
        if !sdk.is_initialized() {
            error!("SDK is not initialized");
            return Err(SessionError::Uninitialized);
        }
        if !sdk.is_authenticated() {
            error!("SDK is not authenticated");
            return Err(SessionError::Unauthenticated("SDK is not authenticated".to_string()));
        }

        let handle = self.issue_handle();
        {
            let mut tables = self.tables.lock();
            if let Some(existing) = tables
                .owners
                .iter()
                .find_map(|(session, owner)| (*owner == sdk_handle).then_some(*session))
            {
                warn!("SDK {} already drives session {}", sdk_handle, existing);
                return Err(SessionError::WrongUsage(format!(
                    "SDK {} already has session {}",
                    sdk_handle, existing
                )));
            }
            tables.owners.insert(handle, sdk_handle);
        }

        let session = match Session::create(config, sdk.meeting_service(), sdk.setting_service()) {
            Ok(session) => session.with_recording_options(*self.recording_options.lock()),
            Err(e) => {
                self.tables.lock().owners.remove(&handle);
                return Err(e);
            }
        };

        if session.config().capture_audio {
            session.set_audio_sink(Arc::new(AudioBridge::new(self.me.clone(), handle)));
        }
        if session.config().capture_video {
            session.set_video_sink(Arc::new(VideoBridge::new(self.me.clone(), handle)));
        }

        let session = Arc::new(session);
        {
            let mut tables = self.tables.lock();
            tables.sessions.insert(handle, session.clone());
            tables.stats.insert(handle, FrameStats::new());
        }

        if let Err(e) = session.start_or_join() {
            error!("failed to join meeting {}: {}", session.config().meeting_id, e);
            self.remove_session(handle);
            return Err(e);
        }

        info!("session {} created for meeting {}", handle, session.config().meeting_id);
        Ok(handle)
    }

    pub fn session(&self, handle: SessionHandle) -> Option<Arc<Session>> {
        self.tables.lock().sessions.get(&handle).cloned()
    }

    fn remove_session(&self, handle: SessionHandle) -> Option<Arc<Session>> {
        let mut tables = self.tables.lock();
        tables.audio_callbacks.remove(&handle);
        tables.video_callbacks.remove(&handle);
        tables.stats.remove(&handle);
        tables.owners.remove(&handle);
        tables.sessions.remove(&handle)
    }

    /// Leaves and releases a session. Unknown handles are ignored.
    pub fn destroy(&self, handle: SessionHandle) -> bool {
        let Some(session) = self.remove_session(handle) else {
            return false;
        };
        if let Err(e) = session.leave() {
            warn!("session {} did not leave cleanly: {}", handle, e);
        }
        drop(session);
        info!("session {} destroyed", handle);
        true
    }

    /// Registers the audio consumer of a session; `None` clears it.
    pub fn set_audio_callback(
        &self,
        handle: SessionHandle,
        callback: Option<AudioCallback>,
    ) -> SessionResult<()> {
        let mut tables = self.tables.lock();
        if !tables.sessions.contains_key(&handle) {
            return Err(SessionError::NotFound(handle));
        }
        match callback {
            Some(callback) => {
                tables.audio_callbacks.insert(handle, callback);
                debug!("audio callback set for session {}", handle);
            }
            None => {
                tables.audio_callbacks.remove(&handle);
                debug!("audio callback removed for session {}", handle);
            }
        }
        Ok(())
    }

    /// Registers the video consumer of a session; `None` clears it.
    pub fn set_video_callback(
        &self,
        handle: SessionHandle,
        callback: Option<VideoCallback>,
    ) -> SessionResult<()> {
        let mut tables = self.tables.lock();
        if !tables.sessions.contains_key(&handle) {
            return Err(SessionError::NotFound(handle));
        }
        match callback {
            Some(callback) => {
                tables.video_callbacks.insert(handle, callback);
                debug!("video callback set for session {}", handle);
            }
            None => {
                tables.video_callbacks.remove(&handle);
                debug!("video callback removed for session {}", handle);
            }
        }
        Ok(())
    }

    /// Hands an audio frame to the session's consumer. Drops it when the
    /// payload is empty or nobody is listening.
    pub fn dispatch_audio(&self, handle: SessionHandle, frame: &AudioFrame<'_>) {
        if frame.data.is_empty() {
            return;
        }
        let callback = {
            let mut tables = self.tables.lock();
            let callback = tables.audio_callbacks.get(&handle).cloned();
            if let Some(stats) = tables.stats.get_mut(&handle) {
                match &callback {
                    Some(_) => stats.record_delivered(MediaKind::Audio, frame.data.len()),
                    None => stats.record_dropped(),
                }
            }
            callback
        };

        if let Some(callback) = callback {
            deliver(handle, "audio", || callback(handle, frame));
        }
    }

    /// Hands a video frame to the session's consumer. Drops it when the
    /// frame is empty or nobody is listening.
    pub fn dispatch_video(&self, handle: SessionHandle, frame: &VideoFrame<'_>) {
        if frame.is_empty() {
            return;
        }
        let callback = {
            let mut tables = self.tables.lock();
            let callback = tables.video_callbacks.get(&handle).cloned();
            if let Some(stats) = tables.stats.get_mut(&handle) {
                match &callback {
                    Some(_) => stats.record_delivered(MediaKind::Video, frame.len()),
                    None => stats.record_dropped(),
                }
            }
            callback
        };

        if let Some(callback) = callback {
            deliver(handle, "video", || callback(handle, frame));
        }
    }

    pub fn status(&self, handle: SessionHandle) -> SessionResult<MeetingStatus> {
        self.session(handle)
            .map(|session| session.platform_status())
            .ok_or(SessionError::NotFound(handle))
    }

    pub fn snapshot(&self, handle: SessionHandle) -> SessionResult<SessionSnapshot> {
        self.session(handle)
            .map(|session| session.snapshot())
            .ok_or(SessionError::NotFound(handle))
    }

    pub fn stats(&self, handle: SessionHandle) -> Option<FrameStats> {
        self.tables.lock().stats.get(&handle).cloned()
    }

    pub fn session_handles(&self) -> Vec<SessionHandle> {
        let mut handles: Vec<_> = self.tables.lock().sessions.keys().copied().collect();
        handles.sort_unstable();
        handles
    }

    pub fn is_empty(&self) -> bool {
        let tables = self.tables.lock();
        tables.sessions.is_empty() && tables.sdks.is_empty()
    }

    /// Destroys every session, then every SDK instance.
    pub fn shutdown(&self) {
        for handle in self.session_handles() {
            self.destroy(handle);
        }
        let sdks: Vec<_> = self.tables.lock().sdks.keys().copied().collect();
        for handle in sdks {
            self.destroy_sdk(handle);
        }
    }
}

/// Consumer callbacks run on platform threads; a panic stops at this frame.
fn deliver(handle: SessionHandle, media: &str, consume: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(consume)).is_err() {
        error!("{} consumer of session {} panicked, frame discarded", media, handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::sim::SimPlatform;
    use crate::platform::{AudioFrameKind, SdkStatus};
    use std::time::Duration;

    fn authenticated(registry: &Registry) -> (Arc<SimPlatform>, SdkHandle) {
        let sim = SimPlatform::new();
        let mut config = SdkConfig::new("key", "secret");
        config.auth_timeout = Duration::from_secs(2);
        let sdk = registry.create_sdk(sim.clone(), config).unwrap();
        (sim, sdk)
    }

    fn audio_frame(data: &[u8]) -> AudioFrame<'_> {
        AudioFrame {
            kind: AudioFrameKind::Mixed,
            node_id: 0,
            data,
            sample_rate: 32000,
            channels: 1,
        }
    }

    #[test]
    fn test_handles_are_never_null() {
        let registry = Registry::new();
        let (_sim, sdk) = authenticated(&registry);
        assert_ne!(sdk, NULL_HANDLE);
        let session = registry
            .create_and_join(sdk, SessionConfig::join("123", "pw", "Bot"))
            .unwrap();
        assert_ne!(session, NULL_HANDLE);
        assert_ne!(session, sdk);
    }

    #[test]
    fn test_create_and_join_unknown_sdk() {
        let registry = Registry::new();
        let result = registry.create_and_join(99, SessionConfig::join("1", "p", "b"));
        assert_eq!(result, Err(SessionError::NotFound(99)));
    }

    #[test]
    fn test_create_and_join_requires_authentication() {
        let registry = Registry::new();
        let sim = SimPlatform::new();
        let sdk = Arc::new(Sdk::new(sim.clone(), SdkConfig::new("key", "secret")));
        sdk.initialize().unwrap();
        let handle = registry.register_sdk(sdk);

        let result = registry.create_and_join(handle, SessionConfig::join("1", "p", "b"));
        assert!(matches!(result, Err(SessionError::Unauthenticated(_))));
        assert!(registry.session_handles().is_empty());
    }

    #[test]
    fn test_rejected_join_registers_nothing() {
        let registry = Registry::new();
        let (sim, sdk) = authenticated(&registry);
        sim.meeting.set_join_status(SdkStatus::InvalidParameter);

        let result = registry.create_and_join(sdk, SessionConfig::join("123", "pw", "Bot"));
        assert!(result.is_err());
        assert!(registry.session_handles().is_empty());
        assert!(!sim.meeting.has_listener());
    }

    #[test]
    fn test_one_live_session_per_sdk() {
        let registry = Registry::new();
        let (sim, sdk) = authenticated(&registry);
        let first = registry
            .create_and_join(sdk, SessionConfig::join("123", "pw", "Bot"))
            .unwrap();

        let second = registry.create_and_join(sdk, SessionConfig::join("456", "pw", "Bot"));
        assert!(matches!(second, Err(SessionError::WrongUsage(_))));
        assert_eq!(registry.session_handles(), vec![first]);
        assert_eq!(sim.meeting.joins().len(), 1);

        // The first session still owns the meeting listener.
        assert!(sim.meeting.has_listener());
        sim.meeting.fire_status(MeetingStatus::InMeeting);
        assert!(registry.session(first).unwrap().is_joined());

        assert!(registry.destroy(first));
        let third = registry
            .create_and_join(sdk, SessionConfig::join("789", "pw", "Bot"))
            .unwrap();
        assert_ne!(third, first);
    }

    #[test]
    fn test_dispatch_without_callback_is_dropped() {
        let registry = Registry::new();
        let (_sim, sdk) = authenticated(&registry);
        let handle = registry
            .create_and_join(sdk, SessionConfig::join("123", "pw", "Bot"))
            .unwrap();

        registry.dispatch_audio(handle, &audio_frame(&[1, 2, 3]));
        registry.dispatch_audio(handle, &audio_frame(&[]));

        let stats = registry.stats(handle).unwrap();
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.frames_delivered(), 0);
    }

    #[test]
    fn test_callback_receives_frame_once() {
        let registry = Registry::new();
        let (_sim, sdk) = authenticated(&registry);
        let handle = registry
            .create_and_join(sdk, SessionConfig::join("123", "pw", "Bot"))
            .unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        registry
            .set_audio_callback(
                handle,
                Some(audio_callback(move |h, frame| {
                    sink.lock().push((h, frame.data.to_vec()));
                })),
            )
            .unwrap();

        registry.dispatch_audio(handle, &audio_frame(&[7, 8]));
        assert_eq!(*received.lock(), vec![(handle, vec![7, 8])]);
        assert_eq!(registry.stats(handle).unwrap().bytes_delivered, 2);

        registry.set_audio_callback(handle, None).unwrap();
        registry.dispatch_audio(handle, &audio_frame(&[9]));
        assert_eq!(received.lock().len(), 1);
    }

    #[test]
    fn test_callback_may_reenter_registry() {
        let registry = Registry::new();
        let (_sim, sdk) = authenticated(&registry);
        let handle = registry
            .create_and_join(sdk, SessionConfig::join("123", "pw", "Bot"))
            .unwrap();

        let reentrant = Arc::downgrade(&registry);
        registry
            .set_audio_callback(
                handle,
                Some(audio_callback(move |h, _frame| {
                    if let Some(registry) = reentrant.upgrade() {
                        let _ = registry.set_audio_callback(h, None);
                    }
                })),
            )
            .unwrap();

        registry.dispatch_audio(handle, &audio_frame(&[1]));
        registry.dispatch_audio(handle, &audio_frame(&[1]));
        let stats = registry.stats(handle).unwrap();
        assert_eq!(stats.audio_frames, 1);
        assert_eq!(stats.frames_dropped, 1);
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let registry = Registry::new();
        let (_sim, sdk) = authenticated(&registry);
        let handle = registry
            .create_and_join(sdk, SessionConfig::join("123", "pw", "Bot"))
            .unwrap();

        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        registry
            .set_audio_callback(
                handle,
                Some(audio_callback(move |_, _| {
                    *counter.lock() += 1;
                    panic!("consumer failed");
                })),
            )
            .unwrap();

        registry.dispatch_audio(handle, &audio_frame(&[1]));
        registry.dispatch_audio(handle, &audio_frame(&[2]));
        assert_eq!(*calls.lock(), 2);
        assert_eq!(registry.stats(handle).unwrap().audio_frames, 2);
    }

    #[test]
    fn test_destroy_invalidates_handle() {
        let registry = Registry::new();
        let (sim, sdk) = authenticated(&registry);
        let handle = registry
            .create_and_join(sdk, SessionConfig::join("123", "pw", "Bot"))
            .unwrap();

        assert!(registry.destroy(handle));
        assert_eq!(sim.meeting.leave_count(), 1);
        assert!(registry.session(handle).is_none());
        assert!(registry.stats(handle).is_none());
        assert_eq!(registry.status(handle), Err(SessionError::NotFound(handle)));
        assert!(registry.set_audio_callback(handle, None).is_err());
        registry.dispatch_audio(handle, &audio_frame(&[1]));

        assert!(!registry.destroy(handle));
    }

    #[test]
    fn test_status_reports_platform_status() {
        let registry = Registry::new();
        let (sim, sdk) = authenticated(&registry);
        let handle = registry
            .create_and_join(sdk, SessionConfig::join("123", "pw", "Bot"))
            .unwrap();

        assert_eq!(registry.status(handle), Ok(MeetingStatus::Connecting));
        sim.meeting.fire_status(MeetingStatus::InMeeting);
        assert_eq!(registry.status(handle), Ok(MeetingStatus::InMeeting));
        assert!(registry.snapshot(handle).unwrap().joined);
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let registry = Registry::new();
        let (sim, sdk) = authenticated(&registry);
        registry
            .create_and_join(sdk, SessionConfig::join("123", "pw", "Bot"))
            .unwrap();

        registry.shutdown();
        assert!(registry.is_empty());
        assert_eq!(sim.cleanup_count(), 1);
    }
}
