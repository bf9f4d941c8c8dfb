//! SDK bootstrap through recording and teardown on the simulated platform.

use meetbot::meeting::SessionConfig;
use meetbot::platform::sim::SimPlatform;
use meetbot::platform::{AuthResult, MeetingService, MeetingStatus, SdkStatus};
use meetbot::registry::{audio_callback, Registry, NULL_HANDLE};
use meetbot::sdk::{EventLoop, SdkConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn sdk_config() -> SdkConfig {
    let mut config = SdkConfig::new("valid-key", "valid-secret");
    config.auth_timeout = Duration::from_secs(3);
    config
}

fn wait_for(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_join_record_and_destroy() {
    let sim = SimPlatform::new();
    let registry = Registry::new();

    let sdk = registry.create_sdk(sim.clone(), sdk_config()).unwrap();
    assert!(registry.sdk(sdk).unwrap().is_authenticated());

    let session = registry
        .create_and_join(sdk, SessionConfig::join("123", "pw", "Bot").with_audio(true))
        .unwrap();
    assert_ne!(session, NULL_HANDLE);
    assert_eq!(registry.status(session), Ok(MeetingStatus::Connecting));
    assert_eq!(sim.settings.audio.auto_join_calls(), vec![true]);

    let bytes = Arc::new(AtomicUsize::new(0));
    let counter = bytes.clone();
    registry
        .set_audio_callback(
            session,
            Some(audio_callback(move |_, frame| {
                counter.fetch_add(frame.data.len(), Ordering::SeqCst);
            })),
        )
        .unwrap();

    sim.meeting.fire_status(MeetingStatus::InMeeting);
    let handle = registry.session(session).unwrap();
    assert!(handle.is_joined());
    assert!(!handle.is_recording());

    sim.meeting.recording.fire_privilege_changed(true);
    assert!(handle.is_recording());
    assert!(sim.meeting.audio_helper.is_subscribed());

    sim.meeting.audio_helper.push_mixed_audio(&[0u8; 320]);
    sim.meeting.audio_helper.push_one_way_audio(&[0u8; 160], 77);
    assert_eq!(bytes.load(Ordering::SeqCst), 480);
    assert_eq!(registry.stats(session).unwrap().audio_frames, 2);
    drop(handle);

    assert!(registry.destroy(session));
    assert_eq!(sim.meeting.recording.stop_count(), 1);
    assert_eq!(sim.meeting.leave_count(), 1);
    assert!(!sim.meeting.audio_helper.is_subscribed());
    assert!(!sim.meeting.has_listener());
    assert!(registry.session(session).is_none());

    sim.meeting.audio_helper.push_mixed_audio(&[0u8; 320]);
    assert_eq!(bytes.load(Ordering::SeqCst), 480);

    assert!(registry.destroy_sdk(sdk));
    assert_eq!(sim.cleanup_count(), 1);
}

#[test]
fn test_event_loop_drives_the_whole_flow() {
    let sim = SimPlatform::new().with_auto_flow();
    let registry = Registry::new();
    let sdk = registry.create_sdk(sim.clone(), sdk_config()).unwrap();

    let event_loop = Arc::new(EventLoop::with_interval(sim.clone(), Duration::from_millis(5)));
    let runner = {
        let event_loop = event_loop.clone();
        thread::spawn(move || event_loop.run())
    };

    let session = registry
        .create_and_join(sdk, SessionConfig::join("555", "pw", "Bot").with_audio(true))
        .unwrap();
    let handle = registry.session(session).unwrap();
    wait_for("recording", || handle.is_recording());
    assert_eq!(sim.meeting.recording.privilege_request_count(), 1);

    registry.destroy(session);
    wait_for("meeting end", || !handle.is_joined());
    assert_eq!(sim.meeting.status(), MeetingStatus::Ended);
    drop(handle);

    event_loop.stop();
    runner.join().unwrap();
    registry.shutdown();
    assert!(registry.is_empty());
}

#[test]
fn test_bad_credentials_never_yield_a_handle() {
    let sim = SimPlatform::new();
    sim.auth.set_result(AuthResult::KeyOrSecretWrong);
    let registry = Registry::new();

    let err = registry.create_sdk(sim.clone(), sdk_config()).unwrap_err();
    assert_eq!(err.status(), SdkStatus::Unauthenticated);
    assert!(err.to_string().contains("key or secret is wrong"));
    assert!(registry.is_empty());
    assert_eq!(sim.cleanup_count(), 1);
}

#[test]
fn test_rejected_join_leaves_nothing_behind() {
    let sim = SimPlatform::new();
    sim.meeting.set_join_status(SdkStatus::ServiceFailed);
    let registry = Registry::new();
    let sdk = registry.create_sdk(sim.clone(), sdk_config()).unwrap();

    let result = registry.create_and_join(sdk, SessionConfig::join("123", "pw", "Bot"));
    assert!(result.is_err());
    assert!(registry.session_handles().is_empty());
    assert!(!sim.meeting.has_listener());
}
