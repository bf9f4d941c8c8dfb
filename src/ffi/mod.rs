//! C surface over a process-wide registry.
//!
//! Handles are plain `u64` values; `0` means failure or "no handle". The host
//! installs its platform binding once with [`install_platform`] before
//! creating an SDK instance.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::ffi::{c_char, c_int, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, warn};

use crate::meeting::{SessionConfig, DEFAULT_DISPLAY_NAME};
use crate::platform::Platform;
use crate::registry::{audio_callback, video_callback, Registry, NULL_HANDLE};
use crate::sdk::{EventLoop, SdkConfig};

pub const MEETBOT_SUCCESS: c_int = 0;
pub const MEETBOT_ERROR: c_int = -1;

/// Raw audio consumer: `(session, data, length, kind, node_id)`.
/// `kind` is 0 for mixed, 1 for one-way and 2 for share audio.
pub type MeetbotAudioCallback =
    Option<extern "C" fn(u64, *const c_void, c_int, c_int, u32)>;

/// Raw I420 consumer:
/// `(session, y, u, v, width, height, buffer_len, source_id, timestamp)`.
pub type MeetbotVideoCallback = Option<
    extern "C" fn(u64, *const u8, *const u8, *const u8, u32, u32, u32, u32, u64),
>;

static REGISTRY: Lazy<Arc<Registry>> = Lazy::new(Registry::new);
static PLATFORM: Lazy<Mutex<Option<Arc<dyn Platform>>>> = Lazy::new(|| Mutex::new(None));
static EVENT_LOOP: Lazy<Mutex<Option<Arc<EventLoop>>>> = Lazy::new(|| Mutex::new(None));

/// Installs the platform binding used by every later call. A loop that is
/// already running keeps pumping the previous binding until it stops.
pub fn install_platform(platform: Arc<dyn Platform>) {
    *EVENT_LOOP.lock() = Some(Arc::new(EventLoop::new(platform.clone())));
    *PLATFORM.lock() = Some(platform);
}

pub fn registry() -> Arc<Registry> {
    REGISTRY.clone()
}

fn event_loop() -> Option<Arc<EventLoop>> {
    EVENT_LOOP.lock().clone()
}

/// Runs an entry point body, turning a panic into `fallback` so it never
/// unwinds into the host.
fn guarded<T>(entry: &'static str, fallback: T, body: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => value,
        Err(_) => {
            error!("{} panicked, returning the failure value", entry);
            fallback
        }
    }
}

/// Copies a C string. Null pointers and invalid UTF-8 yield `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn owned_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(str::to_string)
}

/// Initializes and authenticates an SDK instance.
///
/// # Safety
/// Both arguments must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn meetbot_sdk_create(key: *const c_char, secret: *const c_char) -> u64 {
    let (Some(key), Some(secret)) = (owned_str(key), owned_str(secret)) else {
        error!("SDK key and secret are required");
        return NULL_HANDLE;
    };

    guarded("meetbot_sdk_create", NULL_HANDLE, || {
        let Some(platform) = PLATFORM.lock().clone() else {
            error!("no platform binding installed");
            return NULL_HANDLE;
        };

        let config = SdkConfig::new(key, secret).with_proxy_from_env();
        match REGISTRY.create_sdk(platform, config) {
            Ok(handle) => handle,
            Err(e) => {
                error!("failed to create SDK: {}", e);
                NULL_HANDLE
            }
        }
    })
}

/// Cleans up an SDK instance and stops the event loop.
#[no_mangle]
pub extern "C" fn meetbot_sdk_destroy(handle: u64) {
    guarded("meetbot_sdk_destroy", (), || {
        if !REGISTRY.destroy_sdk(handle) {
            warn!("destroy called with unknown SDK handle {}", handle);
        }
    });
    meetbot_stop_loop();
}

/// Builds a session and asks it to join. `password` may be null (empty) and
/// `display_name` may be null (default name).
///
/// # Safety
/// The string arguments must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn meetbot_meeting_create_and_join(
    sdk: u64,
    meeting_id: *const c_char,
    password: *const c_char,
    display_name: *const c_char,
    enable_audio: c_int,
    enable_video: c_int,
) -> u64 {
    let Some(meeting_id) = owned_str(meeting_id) else {
        error!("meeting id is required");
        return NULL_HANDLE;
    };
    let password = owned_str(password).unwrap_or_default();
    let display_name = owned_str(display_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

    let config = SessionConfig::join(meeting_id, password, display_name)
        .with_audio(enable_audio != 0)
        .with_video(enable_video != 0);

    guarded("meetbot_meeting_create_and_join", NULL_HANDLE, || {
        REGISTRY.create_and_join(sdk, config).unwrap_or(NULL_HANDLE)
    })
}

/// Leaves and releases a session. Unknown handles are ignored.
#[no_mangle]
pub extern "C" fn meetbot_meeting_destroy(handle: u64) {
    guarded("meetbot_meeting_destroy", false, || REGISTRY.destroy(handle));
}

/// Platform meeting status code, or -1 for an unknown handle.
#[no_mangle]
pub extern "C" fn meetbot_meeting_get_status(handle: u64) -> c_int {
    guarded("meetbot_meeting_get_status", MEETBOT_ERROR, || match REGISTRY.status(handle) {
        Ok(status) => status.code(),
        Err(_) => MEETBOT_ERROR,
    })
}

/// Registers the raw audio consumer; a null callback clears it.
#[no_mangle]
pub extern "C" fn meetbot_meeting_set_audio_callback(
    handle: u64,
    callback: MeetbotAudioCallback,
) -> c_int {
    let callback = callback.map(|cb| {
        audio_callback(move |session, frame| {
            cb(
                session,
                frame.data.as_ptr() as *const c_void,
                frame.data.len() as c_int,
                frame.kind.code(),
                frame.node_id,
            )
        })
    });
    guarded("meetbot_meeting_set_audio_callback", MEETBOT_ERROR, || {
        match REGISTRY.set_audio_callback(handle, callback) {
            Ok(()) => MEETBOT_SUCCESS,
            Err(e) => {
                error!("failed to set audio callback: {}", e);
                MEETBOT_ERROR
            }
        }
    })
}

/// Registers the raw video consumer; a null callback clears it.
#[no_mangle]
pub extern "C" fn meetbot_meeting_set_video_callback(
    handle: u64,
    callback: MeetbotVideoCallback,
) -> c_int {
    let callback = callback.map(|cb| {
        video_callback(move |session, frame| {
            cb(
                session,
                frame.y.as_ptr(),
                frame.u.as_ptr(),
                frame.v.as_ptr(),
                frame.width,
                frame.height,
                frame.len() as u32,
                frame.source_id,
                frame.timestamp,
            )
        })
    });
    guarded("meetbot_meeting_set_video_callback", MEETBOT_ERROR, || {
        match REGISTRY.set_video_callback(handle, callback) {
            Ok(()) => MEETBOT_SUCCESS,
            Err(e) => {
                error!("failed to set video callback: {}", e);
                MEETBOT_ERROR
            }
        }
    })
}

/// Pumps platform events until [`meetbot_stop_loop`] is called.
#[no_mangle]
pub extern "C" fn meetbot_run_loop() {
    guarded("meetbot_run_loop", (), || match event_loop() {
        Some(event_loop) => event_loop.run(),
        None => error!("no platform binding installed, nothing to run"),
    })
}

/// Wakes the event loop and makes [`meetbot_run_loop`] return. Safe to call
/// from any thread.
#[no_mangle]
pub extern "C" fn meetbot_stop_loop() {
    guarded("meetbot_stop_loop", (), || {
        if let Some(event_loop) = event_loop() {
            event_loop.stop();
        }
    })
}
